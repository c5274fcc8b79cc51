//! Plumbing between the receiver UI loop and the async network workers.
//!
//! The UI side owns a [`NetworkBridge`]; the WiFi control loop, portal HTTP
//! server and dashboard client hold `&'static NetworkChannels`. Nothing
//! here blocks the UI: every UI-side operation is a `try_*` on a channel.

pub mod dashboard;
pub mod dhcp;
pub mod portal_http;

use core::sync::atomic::{AtomicU32, Ordering};

use embassy_sync::{blocking_mutex::raw::CriticalSectionRawMutex, channel::Channel};
use lifeline_core::{
    network::{NetworkAction, NetworkEvent, NetworkLink},
    provisioning::portal::PortalResponse,
    relay::DashboardPush,
};
use log::warn;

pub const ACTION_QUEUE_DEPTH: usize = 4;
pub const EVENT_QUEUE_DEPTH: usize = 4;
pub const PUSH_QUEUE_DEPTH: usize = 8;

type RawMutex = CriticalSectionRawMutex;

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum BridgeError {
    QueueFull,
}

/// Static channel set shared by the UI loop and the network workers.
pub struct NetworkChannels {
    actions: Channel<RawMutex, NetworkAction, ACTION_QUEUE_DEPTH>,
    events: Channel<RawMutex, NetworkEvent, EVENT_QUEUE_DEPTH>,
    responses: Channel<RawMutex, PortalResponse, 1>,
    pushes: Channel<RawMutex, DashboardPush, PUSH_QUEUE_DEPTH>,
    dropped_pushes: AtomicU32,
}

impl NetworkChannels {
    pub const fn new() -> Self {
        Self {
            actions: Channel::new(),
            events: Channel::new(),
            responses: Channel::new(),
            pushes: Channel::new(),
            dropped_pushes: AtomicU32::new(0),
        }
    }

    /// Next action for the WiFi control loop.
    pub async fn next_action(&self) -> NetworkAction {
        self.actions.receive().await
    }

    /// Reports a link or portal event to the UI loop.
    pub fn publish(&self, event: NetworkEvent) {
        if self.events.try_send(event).is_err() {
            warn!("net: event queue full, event dropped");
        }
    }

    /// Drops any response left over from an abandoned request.
    pub fn discard_stale_responses(&self) {
        while self.responses.try_receive().is_ok() {}
    }

    pub async fn next_response(&self) -> PortalResponse {
        self.responses.receive().await
    }

    pub async fn next_push(&self) -> DashboardPush {
        self.pushes.receive().await
    }

    pub fn dropped_pushes(&self) -> u32 {
        self.dropped_pushes.load(Ordering::Acquire)
    }
}

impl Default for NetworkChannels {
    fn default() -> Self {
        Self::new()
    }
}

/// UI-side [`NetworkLink`] implementation.
pub struct NetworkBridge {
    channels: &'static NetworkChannels,
}

impl NetworkBridge {
    pub const fn new(channels: &'static NetworkChannels) -> Self {
        Self { channels }
    }
}

impl NetworkLink for NetworkBridge {
    type Error = BridgeError;

    fn apply(&mut self, action: NetworkAction) -> Result<(), Self::Error> {
        self.channels
            .actions
            .try_send(action)
            .map_err(|_| BridgeError::QueueFull)
    }

    fn poll_event(&mut self) -> Result<Option<NetworkEvent>, Self::Error> {
        Ok(self.channels.events.try_receive().ok())
    }

    fn respond(&mut self, response: PortalResponse) -> Result<(), Self::Error> {
        self.channels
            .responses
            .try_send(response)
            .map_err(|_| BridgeError::QueueFull)
    }

    fn relay_alert(&mut self, push: DashboardPush) -> Result<(), Self::Error> {
        self.channels.pushes.try_send(push).map_err(|_| {
            self.channels.dropped_pushes.fetch_add(1, Ordering::AcqRel);
            BridgeError::QueueFull
        })
    }
}
