//! WiFi provisioning for the receiver.
//!
//! The manager decides when the station link is attempted and when the
//! setup portal runs. It never touches the radio itself; every decision is
//! queued as a [`NetworkAction`] for the board to carry out, and link
//! outcomes come back as [`NetworkEvent`]s.

pub mod portal;

use heapless::{Deque, String};
use log::{debug, info, warn};

use crate::network::{LinkStatus, NetworkAction, NetworkEvent};
use portal::{FormError, Method, PortalRequest, PortalResponse, Status};

pub const SSID_BYTES: usize = 32;
pub const PASSWORD_BYTES: usize = 64;
const ACTION_QUEUE_DEPTH: usize = 6;

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct WifiCredentials {
    pub ssid: String<SSID_BYTES>,
    pub password: String<PASSWORD_BYTES>,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CredentialsError {
    EmptySsid,
    TooLong,
}

impl WifiCredentials {
    pub fn new(ssid: &str, password: &str) -> Result<Self, CredentialsError> {
        if ssid.is_empty() {
            return Err(CredentialsError::EmptySsid);
        }
        Ok(Self {
            ssid: String::try_from(ssid).map_err(|_| CredentialsError::TooLong)?,
            password: String::try_from(password).map_err(|_| CredentialsError::TooLong)?,
        })
    }
}

/// Abstract credential persistence backend.
pub trait CredentialStore {
    type Error;

    fn load(&mut self) -> Result<Option<WifiCredentials>, Self::Error>;
    fn save(&mut self, credentials: &WifiCredentials) -> Result<(), Self::Error>;
}

/// `None` stands in for a board without usable storage: nothing is ever
/// loaded and saves fail with `None`.
impl<S> CredentialStore for Option<S>
where
    S: CredentialStore,
{
    type Error = Option<S::Error>;

    fn load(&mut self) -> Result<Option<WifiCredentials>, Self::Error> {
        match self {
            Some(store) => store.load().map_err(Some),
            None => Ok(None),
        }
    }

    fn save(&mut self, credentials: &WifiCredentials) -> Result<(), Self::Error> {
        match self {
            Some(store) => store.save(credentials).map_err(Some),
            None => Err(None),
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ProvisioningConfig {
    pub connect_timeout_ms: u64,
    pub portal_timeout_ms: u64,
    /// Start the portal at boot when nothing is stored.
    pub open_portal_when_unconfigured: bool,
    pub restart_delay_ms: u64,
}

impl Default for ProvisioningConfig {
    fn default() -> Self {
        Self {
            connect_timeout_ms: 15_000,
            portal_timeout_ms: 180_000,
            open_portal_when_unconfigured: false,
            restart_delay_ms: 1_500,
        }
    }
}

/// Where the portal returns to when it closes.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ResumeTarget {
    Unconfigured,
    Station,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ProvisioningState {
    Unconfigured,
    Connecting {
        deadline_ms: u64,
        /// Operator asked for this attempt; failure falls back to the portal.
        explicit: bool,
    },
    Connected,
    PortalActive {
        since_ms: u64,
        last_activity_ms: u64,
        resume: ResumeTarget,
    },
}

pub struct ProvisioningManager {
    config: ProvisioningConfig,
    state: ProvisioningState,
    credentials: Option<WifiCredentials>,
    actions: Deque<NetworkAction, ACTION_QUEUE_DEPTH>,
    restart_at_ms: Option<u64>,
}

impl ProvisioningManager {
    pub const fn new(config: ProvisioningConfig) -> Self {
        Self {
            config,
            state: ProvisioningState::Unconfigured,
            credentials: None,
            actions: Deque::new(),
            restart_at_ms: None,
        }
    }

    pub const fn state(&self) -> ProvisioningState {
        self.state
    }

    pub fn credentials(&self) -> Option<&WifiCredentials> {
        self.credentials.as_ref()
    }

    pub fn is_portal_active(&self) -> bool {
        matches!(self.state, ProvisioningState::PortalActive { .. })
    }

    pub fn link_status(&self) -> LinkStatus {
        match self.state {
            ProvisioningState::Unconfigured => LinkStatus::Offline,
            ProvisioningState::Connecting { .. } => LinkStatus::Connecting,
            ProvisioningState::Connected => LinkStatus::Online,
            ProvisioningState::PortalActive { .. } => LinkStatus::Portal,
        }
    }

    /// Next queued instruction for the network side.
    pub fn next_action(&mut self) -> Option<NetworkAction> {
        self.actions.pop_front()
    }

    /// Oldest queued instruction, left in place until the board accepts it.
    pub fn peek_action(&self) -> Option<&NetworkAction> {
        self.actions.front()
    }

    pub fn boot<S: CredentialStore>(&mut self, store: &mut S, now_ms: u64) {
        self.credentials = match store.load() {
            Ok(credentials) => credentials,
            Err(_) => {
                warn!("provisioning: credential store unreadable, treating as empty");
                None
            }
        };

        if self.credentials.is_some() {
            self.start_connect(false, now_ms);
        } else if self.config.open_portal_when_unconfigured {
            info!("provisioning: no credentials, opening portal");
            self.open_portal(now_ms);
        } else {
            info!("provisioning: no credentials stored");
            self.state = ProvisioningState::Unconfigured;
        }
    }

    /// Operator-requested reconnect. A failure here falls back to the portal.
    pub fn reconnect(&mut self, now_ms: u64) {
        if self.credentials.is_some() {
            self.start_connect(true, now_ms);
        } else {
            self.open_portal(now_ms);
        }
    }

    pub fn on_network_event(&mut self, event: &NetworkEvent, now_ms: u64) {
        match (event, self.state) {
            (NetworkEvent::LinkUp, ProvisioningState::Connecting { .. }) => {
                info!("provisioning: station connected");
                self.state = ProvisioningState::Connected;
            }
            // A connect that outlived its deadline; the station stays down.
            (
                NetworkEvent::LinkUp,
                ProvisioningState::Unconfigured
                | ProvisioningState::PortalActive {
                    resume: ResumeTarget::Unconfigured,
                    ..
                },
            ) => {
                warn!("provisioning: late station link, stopping it");
                self.queue(NetworkAction::StopStation);
            }
            (NetworkEvent::LinkFailed, ProvisioningState::Connecting { explicit, .. }) => {
                self.connect_failed(explicit, now_ms);
            }
            (NetworkEvent::LinkLost, ProvisioningState::Connected) => {
                warn!("provisioning: station link lost, reconnecting");
                self.start_connect(false, now_ms);
            }
            (NetworkEvent::Request(_), ProvisioningState::PortalActive { .. }) => {
                self.note_activity(now_ms);
            }
            (event, state) => {
                debug!("provisioning: ignored {:?} in {:?}", event, state);
            }
        }
    }

    /// Evaluates connect and portal timeouts.
    pub fn tick(&mut self, now_ms: u64) {
        match self.state {
            ProvisioningState::Connecting {
                deadline_ms,
                explicit,
            } if now_ms >= deadline_ms => {
                warn!("provisioning: connect timed out");
                self.connect_failed(explicit, now_ms);
            }
            ProvisioningState::PortalActive {
                last_activity_ms, ..
            } if now_ms.saturating_sub(last_activity_ms) >= self.config.portal_timeout_ms => {
                info!("provisioning: portal idle timeout");
                self.close_portal(now_ms);
            }
            _ => {}
        }
    }

    pub fn open_portal(&mut self, now_ms: u64) {
        if self.is_portal_active() {
            return;
        }

        let resume = match self.state {
            ProvisioningState::Connected | ProvisioningState::Connecting { .. }
                if self.credentials.is_some() =>
            {
                ResumeTarget::Station
            }
            _ => ResumeTarget::Unconfigured,
        };
        self.state = ProvisioningState::PortalActive {
            since_ms: now_ms,
            last_activity_ms: now_ms,
            resume,
        };
        self.queue(NetworkAction::StartPortal);
        info!("provisioning: portal active resume={:?}", resume);
    }

    /// Returns to whatever was running before the portal opened.
    pub fn close_portal(&mut self, now_ms: u64) {
        let ProvisioningState::PortalActive { resume, .. } = self.state else {
            return;
        };

        self.queue(NetworkAction::StopPortal);
        match resume {
            ResumeTarget::Station if self.credentials.is_some() => {
                self.start_connect(false, now_ms)
            }
            _ => self.state = ProvisioningState::Unconfigured,
        }
        info!("provisioning: portal closed");
    }

    pub fn note_activity(&mut self, now_ms: u64) {
        if let ProvisioningState::PortalActive {
            ref mut last_activity_ms,
            ..
        } = self.state
        {
            *last_activity_ms = now_ms;
        }
    }

    /// Serves one portal request.
    pub fn handle_request<S: CredentialStore>(
        &mut self,
        request: &PortalRequest,
        store: &mut S,
        now_ms: u64,
    ) -> PortalResponse {
        self.note_activity(now_ms);
        debug!("portal: {:?} {}", request.method, request.path.as_str());

        match (request.path.as_str(), request.method) {
            ("/", Method::Get) => PortalResponse::html(Status::Ok, portal::FORM_PAGE),
            ("/save", Method::Post) => self.save_from_form(&request.body, store, now_ms),
            ("/" | "/save", _) => PortalResponse::text(Status::BadRequest, "unsupported method"),
            _ => PortalResponse::text(Status::NotFound, "not found"),
        }
    }

    fn save_from_form<S: CredentialStore>(
        &mut self,
        body: &str,
        store: &mut S,
        now_ms: u64,
    ) -> PortalResponse {
        let credentials = match parse_credentials(body) {
            Ok(credentials) => credentials,
            Err(err) => {
                warn!("portal: rejected form: {:?}", err);
                return PortalResponse::text(Status::BadRequest, "ssid is required");
            }
        };

        if store.save(&credentials).is_err() {
            warn!("portal: saving credentials failed");
            return PortalResponse::text(Status::InternalError, "could not save credentials");
        }

        info!("portal: saved ssid={}", credentials.ssid.as_str());
        self.credentials = Some(credentials);
        self.restart_at_ms = Some(now_ms + self.config.restart_delay_ms);
        PortalResponse::html(Status::Ok, portal::SAVED_PAGE)
    }

    pub const fn restart_scheduled(&self) -> bool {
        self.restart_at_ms.is_some()
    }

    /// True once, when a scheduled restart is due.
    pub fn take_restart_due(&mut self, now_ms: u64) -> bool {
        match self.restart_at_ms {
            Some(at) if now_ms >= at => {
                self.restart_at_ms = None;
                true
            }
            _ => false,
        }
    }

    fn start_connect(&mut self, explicit: bool, now_ms: u64) {
        let Some(credentials) = self.credentials.clone() else {
            self.state = ProvisioningState::Unconfigured;
            return;
        };
        info!(
            "provisioning: connecting ssid={} explicit={}",
            credentials.ssid.as_str(),
            explicit
        );
        self.state = ProvisioningState::Connecting {
            deadline_ms: now_ms + self.config.connect_timeout_ms,
            explicit,
        };
        self.queue(NetworkAction::ConnectStation(credentials));
    }

    fn connect_failed(&mut self, explicit: bool, now_ms: u64) {
        self.queue(NetworkAction::StopStation);
        if explicit {
            warn!("provisioning: reconnect failed, opening portal");
            self.state = ProvisioningState::Unconfigured;
            self.open_portal(now_ms);
        } else {
            warn!("provisioning: connect failed");
            self.state = ProvisioningState::Unconfigured;
        }
    }

    fn queue(&mut self, action: NetworkAction) {
        if self.actions.is_full() {
            let _ = self.actions.pop_front();
        }
        let _ = self.actions.push_back(action);
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FormRejection {
    Form(FormError),
    Credentials(CredentialsError),
}

fn parse_credentials(body: &str) -> Result<WifiCredentials, FormRejection> {
    let mut ssid: String<SSID_BYTES> = String::new();
    let mut password: String<PASSWORD_BYTES> = String::new();
    portal::form_value(body, "ssid", &mut ssid).map_err(FormRejection::Form)?;
    portal::form_value(body, "password", &mut password).map_err(FormRejection::Form)?;
    WifiCredentials::new(ssid.trim(), password.as_str()).map_err(FormRejection::Credentials)
}

#[cfg(test)]
mod tests;
