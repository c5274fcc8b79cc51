//! Base receiver: decode incoming alerts, show and log them, relay them
//! upstream, and host the WiFi setup portal on demand.

use log::{debug, info, warn};

use super::{ANIM_ALERT_FLASH_MS, ANIM_SCREEN_MS, BOOT_SCREEN_MS, TickResult};
use crate::{
    feedback::{Effect, EffectQueue, TonePattern},
    history::{AlertHistory, AlertRecord, HISTORY_CAPACITY},
    input::{
        ButtonEdge, InputEvent, InputProvider,
        dispatch::{Command, ScreenKind, dispatch},
        hold::{HoldDetector, HoldEvent, PORTAL_HOLD_MS},
    },
    network::{LinkStatus, NetworkEvent, NetworkLink},
    packet::{self, DecodeOptions, Packet},
    provisioning::{CredentialStore, ProvisioningConfig, ProvisioningManager, ProvisioningState},
    radio::PacketSource,
    relay::DashboardPush,
    render::{AlertRowView, AnimationKind, AnimationSpec, Screen},
    text_policy::{device_label, rssi_label},
};

/// RSSI recorded for packets injected over the debug channel.
pub const SIMULATED_RSSI: i16 = 0;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ReceiverConfig {
    pub boot_ms: u64,
    pub alert_display_ms: u64,
    pub hold_ms: u64,
    pub decode: DecodeOptions,
    pub provisioning: ProvisioningConfig,
    pub ap_ssid: &'static str,
    pub portal_address: &'static str,
}

impl Default for ReceiverConfig {
    fn default() -> Self {
        Self {
            boot_ms: BOOT_SCREEN_MS,
            alert_display_ms: 10_000,
            hold_ms: PORTAL_HOLD_MS,
            decode: DecodeOptions::default(),
            provisioning: ProvisioningConfig::default(),
            ap_ssid: "Lifeline-Setup",
            portal_address: "192.168.4.1",
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum UiState {
    Boot { until_ms: Option<u64> },
    Idle,
    Alert { record: AlertRecord, until_ms: u64 },
    Portal,
}

pub struct ReceiverApp<IN, PK, ST, NET>
where
    IN: InputProvider,
    PK: PacketSource,
    ST: CredentialStore,
    NET: NetworkLink,
{
    input: IN,
    /// `None` when the radio failed to initialise.
    packets: Option<PK>,
    store: ST,
    network: NET,
    config: ReceiverConfig,
    ui: UiState,
    pending_redraw: bool,
    transition: Option<AnimationSpec>,
    history: AlertHistory,
    provisioning: ProvisioningManager,
    hold: HoldDetector,
    last_hold_pct: Option<u8>,
    last_portal_remaining_s: u32,
    effects: EffectQueue,
    started: bool,
    input_fault_logged: bool,
    radio_fault_logged: bool,
    network_fault_logged: bool,
    network_backlogged: bool,
}

include!("view.rs");
include!("input.rs");
include!("runtime.rs");

#[cfg(test)]
mod tests;
