//! Seam between the receiver state machine and the WiFi/HTTP side.

use crate::{
    provisioning::{
        WifiCredentials,
        portal::{PortalRequest, PortalResponse},
    },
    relay::DashboardPush,
};

/// Work the board must carry out on behalf of the provisioning manager.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum NetworkAction {
    ConnectStation(WifiCredentials),
    StopStation,
    StartPortal,
    StopPortal,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum NetworkEvent {
    LinkUp,
    LinkFailed,
    LinkLost,
    Request(PortalRequest),
}

/// Coarse status shown as a badge on the receiver idle screen.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum LinkStatus {
    Offline,
    Connecting,
    Online,
    Portal,
}

impl LinkStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Offline => "WiFi off",
            Self::Connecting => "WiFi ...",
            Self::Online => "WiFi ok",
            Self::Portal => "Setup AP",
        }
    }
}

/// Polled network collaborator.
///
/// Implementations hand work to background tasks and must not block.
pub trait NetworkLink {
    type Error;

    fn apply(&mut self, action: NetworkAction) -> Result<(), Self::Error>;
    fn poll_event(&mut self) -> Result<Option<NetworkEvent>, Self::Error>;
    /// Answers the request most recently returned by `poll_event`.
    fn respond(&mut self, response: PortalResponse) -> Result<(), Self::Error>;
    fn relay_alert(&mut self, push: DashboardPush) -> Result<(), Self::Error>;
}
