//! Setup portal HTTP server on the access-point stack.
//!
//! Requests are parsed here but answered by the receiver state machine:
//! each one is published as [`NetworkEvent::Request`] and the worker waits
//! for the matching [`PortalResponse`].

use embassy_net::{Stack, tcp::TcpSocket};
use embassy_time::{Duration, Timer, WithTimeout};
use heapless::String;
use lifeline_core::{
    network::NetworkEvent,
    provisioning::portal::{self, PortalParseError, PortalResponse, Status},
};
use log::{debug, info, warn};

use super::NetworkChannels;

pub const HTTP_PORT: u16 = 80;
const REQUEST_BYTES: usize = 1024;
const SOCKET_TIMEOUT_SECS: u64 = 10;
const RESPONSE_TIMEOUT_MS: u64 = 2_000;
const HEAD_BYTES: usize = 160;

const BAD_REQUEST: PortalResponse = PortalResponse::text(Status::BadRequest, "bad request");
const NO_ANSWER: PortalResponse =
    PortalResponse::text(Status::InternalError, "receiver did not answer");

/// Serves one connection at a time, forever.
pub async fn portal_http_loop(stack: Stack<'_>, channels: &'static NetworkChannels) -> ! {
    let mut rx_buf = [0u8; REQUEST_BYTES];
    let mut tx_buf = [0u8; REQUEST_BYTES];

    info!("portal: http worker on port {}", HTTP_PORT);

    loop {
        stack.wait_config_up().await;

        let mut socket = TcpSocket::new(stack, &mut rx_buf, &mut tx_buf);
        socket.set_timeout(Some(Duration::from_secs(SOCKET_TIMEOUT_SECS)));

        match socket.accept(HTTP_PORT).await {
            Ok(()) => {
                if let Err(err) = handle_connection(&mut socket, channels).await {
                    warn!("portal: connection error: {:?}", err);
                }
                socket.close();
                let _ = socket.flush().await;
            }
            Err(err) => {
                warn!("portal: accept error: {:?}", err);
                Timer::after_millis(200).await;
            }
        }

        socket.abort();
    }
}

async fn handle_connection(
    socket: &mut TcpSocket<'_>,
    channels: &'static NetworkChannels,
) -> Result<(), embassy_net::tcp::Error> {
    let mut buf = [0u8; REQUEST_BYTES];
    let mut total = 0usize;

    let request = loop {
        let n = socket.read(&mut buf[total..]).await?;
        if n == 0 {
            if total == 0 {
                return Ok(());
            }
            // Peer closed mid-request.
            return write_response(socket, &BAD_REQUEST).await;
        }
        total += n;

        match portal::parse_request(&buf[..total]) {
            Ok(request) => break request,
            Err(PortalParseError::Incomplete) if total < buf.len() => continue,
            Err(err) => {
                debug!("portal: unparseable request: {:?}", err);
                return write_response(socket, &BAD_REQUEST).await;
            }
        }
    };

    channels.discard_stale_responses();
    channels.publish(NetworkEvent::Request(request));

    let response = match channels
        .next_response()
        .with_timeout(Duration::from_millis(RESPONSE_TIMEOUT_MS))
        .await
    {
        Ok(response) => response,
        Err(_) => {
            warn!("portal: no response from receiver");
            NO_ANSWER
        }
    };

    write_response(socket, &response).await
}

async fn write_response(
    socket: &mut TcpSocket<'_>,
    response: &PortalResponse,
) -> Result<(), embassy_net::tcp::Error> {
    let mut head: String<HEAD_BYTES> = String::new();
    // Head fits: the longest content type and reason are fixed strings.
    let _ = response.write_head(&mut head);

    write_all(socket, head.as_bytes()).await?;
    write_all(socket, response.body.as_bytes()).await
}

pub(crate) async fn write_all(
    socket: &mut TcpSocket<'_>,
    mut bytes: &[u8],
) -> Result<(), embassy_net::tcp::Error> {
    while !bytes.is_empty() {
        let n = socket.write(bytes).await?;
        if n == 0 {
            return Err(embassy_net::tcp::Error::ConnectionReset);
        }
        bytes = &bytes[n..];
    }
    Ok(())
}

