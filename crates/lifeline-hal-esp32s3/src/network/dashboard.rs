//! Dashboard client: POSTs relayed alerts over the station link.
//!
//! One short-lived connection per alert. Failures are logged and the alert
//! is not retried; the receiver keeps it in its local history either way.

use core::net::Ipv4Addr;

use embassy_net::{IpAddress, IpEndpoint, Stack, dns::DnsQueryType, tcp::TcpSocket};
use embassy_time::{Duration, WithTimeout};
use heapless::String;
use lifeline_core::relay::{DashboardPush, response_status};
use log::{debug, info, warn};

use super::{NetworkChannels, portal_http::write_all};

const REQUEST_BYTES: usize = 384;
const SOCKET_BYTES: usize = 512;
const CONNECT_TIMEOUT_SECS: u64 = 5;
const IO_TIMEOUT_SECS: u64 = 5;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct DashboardConfig {
    pub host: &'static str,
    pub port: u16,
    pub path: &'static str,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum DashboardError {
    Offline,
    Resolve,
    Connect,
    Io,
    RequestTooLarge,
    BadResponse,
}

/// Drains the push queue forever.
pub async fn dashboard_loop(
    stack: Stack<'_>,
    channels: &'static NetworkChannels,
    config: DashboardConfig,
) -> ! {
    info!(
        "relay: dashboard http://{}:{}{}",
        config.host, config.port, config.path
    );

    loop {
        let push = channels.next_push().await;
        match post_alert(stack, config, &push).await {
            Ok(status) if (200..300).contains(&status) => {
                debug!("relay: id={} accepted status={}", push.did, status);
            }
            Ok(status) => warn!("relay: id={} rejected status={}", push.did, status),
            Err(err) => warn!(
                "relay: id={} failed: {:?} (dropped so far={})",
                push.did,
                err,
                channels.dropped_pushes()
            ),
        }
    }
}

async fn post_alert(
    stack: Stack<'_>,
    config: DashboardConfig,
    push: &DashboardPush,
) -> Result<u16, DashboardError> {
    if !stack.is_config_up() {
        return Err(DashboardError::Offline);
    }

    let address = resolve(stack, config.host).await?;

    let mut request: String<REQUEST_BYTES> = String::new();
    push.write_request(config.host, config.path, &mut request)
        .map_err(|_| DashboardError::RequestTooLarge)?;

    let mut rx_buf = [0u8; SOCKET_BYTES];
    let mut tx_buf = [0u8; SOCKET_BYTES];
    let mut socket = TcpSocket::new(stack, &mut rx_buf, &mut tx_buf);
    socket.set_timeout(Some(Duration::from_secs(IO_TIMEOUT_SECS)));

    socket
        .connect(IpEndpoint::new(address, config.port))
        .with_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
        .await
        .map_err(|_| DashboardError::Connect)?
        .map_err(|_| DashboardError::Connect)?;

    let result = exchange(&mut socket, request.as_bytes()).await;
    socket.close();
    socket.abort();
    result
}

async fn exchange(socket: &mut TcpSocket<'_>, request: &[u8]) -> Result<u16, DashboardError> {
    write_all(socket, request)
        .await
        .map_err(|_| DashboardError::Io)?;

    // The status line is all we look at.
    let mut head = [0u8; 64];
    let mut total = 0usize;
    while total < head.len() {
        let n = socket
            .read(&mut head[total..])
            .await
            .map_err(|_| DashboardError::Io)?;
        if n == 0 {
            break;
        }
        total += n;
        if head[..total].contains(&b'\r') {
            break;
        }
    }

    response_status(&head[..total]).ok_or(DashboardError::BadResponse)
}

async fn resolve(stack: Stack<'_>, host: &str) -> Result<IpAddress, DashboardError> {
    if let Ok(addr) = host.parse::<Ipv4Addr>() {
        return Ok(IpAddress::Ipv4(addr));
    }

    let addrs = stack
        .dns_query(host, DnsQueryType::A)
        .await
        .map_err(|_| DashboardError::Resolve)?;
    addrs.first().copied().ok_or(DashboardError::Resolve)
}
