//! Transceiver state machines for the field transmitter and the base receiver.

pub mod receiver;
pub mod transmitter;

pub use receiver::{ReceiverApp, ReceiverConfig};
pub use transmitter::{TransmitterApp, TransmitterConfig};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TickResult {
    NoRender,
    RenderRequested,
}

pub(crate) const BOOT_SCREEN_MS: u64 = 2_000;
pub(crate) const ANIM_MENU_MS: u16 = 140;
pub(crate) const ANIM_SCREEN_MS: u16 = 200;
pub(crate) const ANIM_ALERT_FLASH_MS: u16 = 1_500;

pub(crate) fn rotate_cw(current: u8, total: u8) -> u8 {
    if total == 0 { 0 } else { (current + 1) % total }
}

pub(crate) fn rotate_ccw(current: u8, total: u8) -> u8 {
    if total == 0 {
        0
    } else if current == 0 {
        total - 1
    } else {
        current - 1
    }
}
