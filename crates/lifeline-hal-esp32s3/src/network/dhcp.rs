//! Minimal DHCP responder for phones joining the setup access point.
//!
//! Hands out addresses from a small pool on the portal subnet and names the
//! portal itself as router and DNS server. Only DISCOVER and REQUEST are
//! answered; everything else is ignored.

use core::net::Ipv4Addr;

use embassy_net::{
    IpAddress, IpEndpoint, Stack,
    udp::{PacketMetadata, UdpSocket},
};
use embassy_time::Timer;
use log::{debug, info, warn};

pub const DHCP_SERVER_PORT: u16 = 67;
pub const DHCP_CLIENT_PORT: u16 = 68;
pub const LEASE_POOL: usize = 8;
const LEASE_SECS: u32 = 3_600;

const PACKET_BYTES: usize = 576;
const FIXED_HEADER_LEN: usize = 236;
const MAGIC_COOKIE: [u8; 4] = [0x63, 0x82, 0x53, 0x63];

const OP_BOOTREQUEST: u8 = 1;
const OP_BOOTREPLY: u8 = 2;

const OPT_PAD: u8 = 0;
const OPT_SUBNET_MASK: u8 = 1;
const OPT_ROUTER: u8 = 3;
const OPT_DNS: u8 = 6;
const OPT_REQUESTED_IP: u8 = 50;
const OPT_LEASE_TIME: u8 = 51;
const OPT_MESSAGE_TYPE: u8 = 53;
const OPT_SERVER_ID: u8 = 54;
const OPT_END: u8 = 255;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum MessageType {
    Discover,
    Offer,
    Request,
    Ack,
    Nak,
}

impl MessageType {
    fn from_raw(raw: u8) -> Option<Self> {
        match raw {
            1 => Some(Self::Discover),
            3 => Some(Self::Request),
            _ => None,
        }
    }

    const fn raw(self) -> u8 {
        match self {
            Self::Discover => 1,
            Self::Offer => 2,
            Self::Request => 3,
            Self::Ack => 5,
            Self::Nak => 6,
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct ClientMessage {
    kind: MessageType,
    xid: [u8; 4],
    flags: [u8; 2],
    chaddr: [u8; 16],
    requested: Option<Ipv4Addr>,
}

#[derive(Clone, Copy, Debug, Default)]
struct Lease {
    mac: [u8; 6],
    in_use: bool,
}

/// Lease table; slot `i` owns `first_host + i`.
struct LeaseTable {
    server: Ipv4Addr,
    first_host: u8,
    slots: [Lease; LEASE_POOL],
    next_evict: usize,
}

impl LeaseTable {
    fn new(server: Ipv4Addr) -> Self {
        let last = server.octets()[3];
        Self {
            server,
            first_host: last.wrapping_add(1),
            slots: [Lease::default(); LEASE_POOL],
            next_evict: 0,
        }
    }

    fn address_of(&self, slot: usize) -> Ipv4Addr {
        let [a, b, c, _] = self.server.octets();
        Ipv4Addr::new(a, b, c, self.first_host.wrapping_add(slot as u8))
    }

    fn slot_of(&self, addr: Ipv4Addr) -> Option<usize> {
        let [a, b, c, d] = addr.octets();
        let [sa, sb, sc, _] = self.server.octets();
        if (a, b, c) != (sa, sb, sc) {
            return None;
        }
        let slot = d.wrapping_sub(self.first_host) as usize;
        (slot < LEASE_POOL).then_some(slot)
    }

    /// Existing lease for `mac`, else a free slot, else the oldest one.
    fn assign(&mut self, mac: [u8; 6]) -> Ipv4Addr {
        if let Some(slot) = self.slots.iter().position(|l| l.in_use && l.mac == mac) {
            return self.address_of(slot);
        }

        let slot = match self.slots.iter().position(|l| !l.in_use) {
            Some(slot) => slot,
            None => {
                let slot = self.next_evict;
                self.next_evict = (self.next_evict + 1) % LEASE_POOL;
                slot
            }
        };
        self.slots[slot] = Lease { mac, in_use: true };
        self.address_of(slot)
    }

    fn confirms(&self, mac: [u8; 6], addr: Ipv4Addr) -> bool {
        self.slot_of(addr)
            .is_some_and(|slot| self.slots[slot].in_use && self.slots[slot].mac == mac)
    }
}

/// Answers DHCP on the access-point stack forever.
pub async fn dhcp_server_loop(stack: Stack<'_>, server: Ipv4Addr) -> ! {
    let mut rx_meta = [PacketMetadata::EMPTY; 4];
    let mut tx_meta = [PacketMetadata::EMPTY; 4];
    let mut rx_buffer = [0u8; PACKET_BYTES * 2];
    let mut tx_buffer = [0u8; PACKET_BYTES * 2];

    let mut socket = UdpSocket::new(
        stack,
        &mut rx_meta,
        &mut rx_buffer,
        &mut tx_meta,
        &mut tx_buffer,
    );

    while let Err(err) = socket.bind(DHCP_SERVER_PORT) {
        warn!("dhcp: bind failed: {:?}", err);
        Timer::after_secs(1).await;
    }
    info!("dhcp: serving {} leases after {}", LEASE_POOL, server);

    let mut leases = LeaseTable::new(server);
    let mut request = [0u8; PACKET_BYTES];
    let mut reply = [0u8; PACKET_BYTES];

    loop {
        let len = match socket.recv_from(&mut request).await {
            Ok((len, _meta)) => len,
            Err(err) => {
                warn!("dhcp: recv failed: {:?}", err);
                continue;
            }
        };

        let Some(message) = parse_client_message(&request[..len]) else {
            continue;
        };

        let mut mac = [0u8; 6];
        mac.copy_from_slice(&message.chaddr[..6]);

        let (kind, yiaddr) = match message.kind {
            MessageType::Discover => (MessageType::Offer, leases.assign(mac)),
            MessageType::Request => {
                let wanted = message.requested.unwrap_or(Ipv4Addr::UNSPECIFIED);
                if leases.confirms(mac, wanted) {
                    (MessageType::Ack, wanted)
                } else if message.requested.is_none() {
                    // Renewals carry the address in ciaddr instead of option 50.
                    (MessageType::Ack, leases.assign(mac))
                } else {
                    (MessageType::Nak, Ipv4Addr::UNSPECIFIED)
                }
            }
            _ => continue,
        };

        let reply_len = build_reply(&message, kind, yiaddr, server, &mut reply);
        debug!("dhcp: {:?} -> {:?} {}", message.kind, kind, yiaddr);

        let broadcast = IpEndpoint::new(IpAddress::v4(255, 255, 255, 255), DHCP_CLIENT_PORT);
        if let Err(err) = socket.send_to(&reply[..reply_len], broadcast).await {
            warn!("dhcp: send failed: {:?}", err);
        }
    }
}

fn parse_client_message(packet: &[u8]) -> Option<ClientMessage> {
    if packet.len() < FIXED_HEADER_LEN + MAGIC_COOKIE.len() || packet[0] != OP_BOOTREQUEST {
        return None;
    }
    if packet[FIXED_HEADER_LEN..FIXED_HEADER_LEN + 4] != MAGIC_COOKIE {
        return None;
    }

    let mut kind = None;
    let mut requested = None;
    let mut options = &packet[FIXED_HEADER_LEN + 4..];

    while let Some((&code, rest)) = options.split_first() {
        match code {
            OPT_PAD => {
                options = rest;
                continue;
            }
            OPT_END => break,
            _ => {}
        }

        let (&len, rest) = rest.split_first()?;
        let len = len as usize;
        if rest.len() < len {
            return None;
        }
        let (value, rest) = rest.split_at(len);

        match code {
            OPT_MESSAGE_TYPE if len == 1 => kind = MessageType::from_raw(value[0]),
            OPT_REQUESTED_IP if len == 4 => {
                requested = Some(Ipv4Addr::new(value[0], value[1], value[2], value[3]))
            }
            _ => {}
        }
        options = rest;
    }

    let mut xid = [0u8; 4];
    xid.copy_from_slice(&packet[4..8]);
    let mut flags = [0u8; 2];
    flags.copy_from_slice(&packet[10..12]);
    let mut chaddr = [0u8; 16];
    chaddr.copy_from_slice(&packet[28..44]);

    Some(ClientMessage {
        kind: kind?,
        xid,
        flags,
        chaddr,
        requested,
    })
}

fn build_reply(
    message: &ClientMessage,
    kind: MessageType,
    yiaddr: Ipv4Addr,
    server: Ipv4Addr,
    out: &mut [u8; PACKET_BYTES],
) -> usize {
    out.fill(0);
    out[0] = OP_BOOTREPLY;
    out[1] = 1; // ethernet
    out[2] = 6;
    out[4..8].copy_from_slice(&message.xid);
    out[10..12].copy_from_slice(&message.flags);
    out[16..20].copy_from_slice(&yiaddr.octets());
    out[20..24].copy_from_slice(&server.octets());
    out[28..44].copy_from_slice(&message.chaddr);
    out[FIXED_HEADER_LEN..FIXED_HEADER_LEN + 4].copy_from_slice(&MAGIC_COOKIE);

    let mut at = FIXED_HEADER_LEN + 4;
    let mut put = |code: u8, value: &[u8]| {
        out[at] = code;
        out[at + 1] = value.len() as u8;
        out[at + 2..at + 2 + value.len()].copy_from_slice(value);
        at += 2 + value.len();
    };

    put(OPT_MESSAGE_TYPE, &[kind.raw()]);
    put(OPT_SERVER_ID, &server.octets());
    if kind != MessageType::Nak {
        put(OPT_LEASE_TIME, &LEASE_SECS.to_be_bytes());
        put(OPT_SUBNET_MASK, &[255, 255, 255, 0]);
        put(OPT_ROUTER, &server.octets());
        put(OPT_DNS, &server.octets());
    }

    out[at] = OPT_END;
    at + 1
}
