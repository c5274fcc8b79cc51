//! App-level view models and animation metadata.

use crate::{
    catalog::{AlertCode, AlertDescriptor},
    network::LinkStatus,
    radio::RadioProfile,
};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum AnimationKind {
    SlideLeft,
    SlideRight,
    Fade,
    /// Inverted flashing for incoming alerts.
    Flash,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct AnimationFrame {
    pub kind: AnimationKind,
    /// 0..=100
    pub progress_pct: u8,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct AnimationSpec {
    pub kind: AnimationKind,
    pub start_ms: u64,
    pub duration_ms: u16,
}

impl AnimationSpec {
    pub const fn new(kind: AnimationKind, start_ms: u64, duration_ms: u16) -> Self {
        Self {
            kind,
            start_ms,
            duration_ms,
        }
    }

    pub fn frame(self, now_ms: u64) -> Option<AnimationFrame> {
        let duration = self.duration_ms.max(1) as u64;
        let elapsed = now_ms.saturating_sub(self.start_ms);
        if elapsed >= duration {
            return None;
        }

        let progress = ((elapsed * 100) / duration).min(100) as u8;
        Some(AnimationFrame {
            kind: self.kind,
            progress_pct: progress,
        })
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct MenuItemView {
    pub code: AlertCode,
    pub descriptor: &'static AlertDescriptor,
}

impl Default for MenuItemView {
    fn default() -> Self {
        Self {
            code: AlertCode::EMERGENCY,
            descriptor: AlertCode::EMERGENCY.descriptor(),
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct AlertRowView {
    pub descriptor: &'static AlertDescriptor,
    pub device_id: u16,
    pub rssi: i16,
    pub age_ms: u64,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct TransmitterStats {
    pub device_id: u16,
    pub radio_ok: bool,
    pub total_transmissions: u32,
    pub successful_transmissions: u32,
    pub profile: RadioProfile,
    pub uptime_ms: u64,
}

/// App-level view model consumed by board/HAL renderer.
pub enum Screen<'a> {
    Boot {
        title: &'a str,
        subtitle: &'a str,
        status: &'a str,
    },
    Menu {
        title: &'a str,
        items: &'a [MenuItemView],
        cursor: usize,
        position: &'a str,
        radio_ok: bool,
        animation: Option<AnimationFrame>,
    },
    Confirm {
        alert: &'static AlertDescriptor,
        device: &'a str,
        radio_ok: bool,
        animation: Option<AnimationFrame>,
    },
    Sending {
        alert: &'static AlertDescriptor,
        /// One-based.
        attempt: u8,
        max_attempts: u8,
    },
    TransmitResult {
        alert: &'static AlertDescriptor,
        success: bool,
        attempt: u8,
        max_attempts: u8,
        can_retry: bool,
        animation: Option<AnimationFrame>,
    },
    SystemInfo {
        stats: TransmitterStats,
    },
    Manual {
        title: &'a str,
        lines: &'a [&'a str],
        position: &'a str,
    },
    Idle {
        title: &'a str,
        recent: &'a [AlertRowView],
        total_received: u32,
        link: LinkStatus,
        radio_ok: bool,
        hold_pct: Option<u8>,
    },
    Alert {
        alert: &'static AlertDescriptor,
        device: &'a str,
        rssi: &'a str,
        link: LinkStatus,
        hold_pct: Option<u8>,
        animation: Option<AnimationFrame>,
    },
    Portal {
        ap_ssid: &'a str,
        address: &'a str,
        /// Seconds left before the portal closes on its own.
        remaining_s: u32,
        saved: bool,
        hold_pct: Option<u8>,
    },
}
