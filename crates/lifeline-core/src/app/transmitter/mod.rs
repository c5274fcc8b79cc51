//! Field transmitter: pick an alert, confirm it, send it, report the outcome.

use log::{debug, info, warn};

use super::{
    ANIM_MENU_MS, ANIM_SCREEN_MS, BOOT_SCREEN_MS, TickResult, rotate_ccw, rotate_cw,
};
use crate::{
    catalog::{ALERT_COUNT, AlertCode},
    feedback::{Effect, EffectQueue, TonePattern},
    input::{
        InputEvent, InputProvider,
        dispatch::{Command, ScreenKind, dispatch},
    },
    radio::{RadioLink, RadioProfile},
    render::{AnimationKind, AnimationSpec, MenuItemView, Screen, TransmitterStats},
    retry::{MAX_RETRY_ATTEMPTS, RetryController},
    text_policy::{device_label, fraction_label},
};

const MAX_MENU_PAGE: usize = 8;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct TransmitterConfig {
    pub device_id: u16,
    pub boot_ms: u64,
    /// How long a successful result stays up before the menu returns.
    pub success_hold_ms: u64,
    pub menu_page_size: u8,
    pub profile: RadioProfile,
}

impl Default for TransmitterConfig {
    fn default() -> Self {
        Self {
            device_id: 1,
            boot_ms: BOOT_SCREEN_MS,
            success_hold_ms: 2_500,
            menu_page_size: 5,
            profile: RadioProfile::default(),
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum UiState {
    Boot {
        until_ms: Option<u64>,
    },
    Menu {
        cursor: u8,
        scroll: u8,
    },
    Confirm {
        alert: AlertCode,
    },
    Sending {
        alert: AlertCode,
    },
    Result {
        alert: AlertCode,
        success: bool,
        since_ms: u64,
    },
    SystemInfo {
        return_cursor: u8,
    },
    Manual {
        page: u8,
        return_cursor: u8,
    },
}

pub struct TransmitterApp<IN, RL>
where
    IN: InputProvider,
    RL: RadioLink,
{
    input: IN,
    /// `None` when the radio failed to initialise; sending is disabled.
    radio: Option<RL>,
    config: TransmitterConfig,
    ui: UiState,
    pending_redraw: bool,
    transition: Option<AnimationSpec>,
    retry: RetryController,
    effects: EffectQueue,
    started_ms: Option<u64>,
    input_fault_logged: bool,
}

include!("view.rs");
include!("input.rs");
include!("runtime.rs");

const MANUAL_PAGES: [&[&str]; 4] = [
    &[
        "Pick an alert with A / B",
        "or press its number 1-9, 0.",
        "# opens the confirm screen.",
    ],
    &[
        "Confirm with #, cancel with *.",
        "The alert is sent once over",
        "LoRa. No reply is expected.",
    ],
    &[
        "If sending fails, # retries",
        "up to three attempts in total.",
        "* gives up and returns.",
    ],
    &[
        "C shows device and radio info.",
        "Keep the antenna upright and",
        "clear of metal when sending.",
    ],
];

#[cfg(test)]
mod tests;
