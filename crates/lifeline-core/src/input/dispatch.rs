//! Maps raw input events to screen-specific commands.
//!
//! Keypad legend on the transmitter: `A` previous, `B` next, `C` system
//! info, `D` manual, `#` select/confirm/retry, `*` cancel/menu, digits
//! pick one of the first ten alerts directly. On the receiver idle screen
//! `D` retries the stored WiFi network.

use super::{ButtonEdge, InputEvent, Key};
use crate::packet::Packet;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ScreenKind {
    Boot,
    Menu,
    Confirm,
    Sending,
    ResultSuccess,
    ResultFailure { can_retry: bool },
    SystemInfo,
    Manual,
    Idle,
    Alert,
    Portal,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Command {
    Previous,
    Next,
    SelectIndex(u8),
    SelectHighlighted,
    OpenSystemInfo,
    OpenManual,
    Confirm,
    Cancel,
    Retry,
    BackToMenu,
    PagePrevious,
    PageNext,
    InjectPacket(Packet),
    DismissAlert,
    ReconnectWifi,
    PortalButton(ButtonEdge),
}

/// Keypad digits 1..=9 map to entries 0..=8 and 0 maps to entry 9.
pub const fn digit_to_index(digit: u8) -> Option<u8> {
    match digit {
        0 => Some(9),
        1..=9 => Some(digit - 1),
        _ => None,
    }
}

pub fn dispatch(event: InputEvent, screen: ScreenKind) -> Option<Command> {
    match screen {
        ScreenKind::Boot | ScreenKind::Sending | ScreenKind::ResultSuccess => None,
        ScreenKind::Menu => match event {
            InputEvent::Key(Key::A) => Some(Command::Previous),
            InputEvent::Key(Key::B) => Some(Command::Next),
            InputEvent::Key(Key::C) => Some(Command::OpenSystemInfo),
            InputEvent::Key(Key::D) => Some(Command::OpenManual),
            InputEvent::Key(Key::Hash) => Some(Command::SelectHighlighted),
            InputEvent::Key(Key::Digit(digit)) => digit_to_index(digit).map(Command::SelectIndex),
            InputEvent::Shortcut(code) => Some(Command::SelectIndex(code.index())),
            _ => None,
        },
        ScreenKind::Confirm => match event {
            InputEvent::Key(Key::Hash) => Some(Command::Confirm),
            InputEvent::Key(Key::Star) => Some(Command::Cancel),
            _ => None,
        },
        ScreenKind::ResultFailure { can_retry } => match event {
            InputEvent::Key(Key::Hash) if can_retry => Some(Command::Retry),
            InputEvent::Key(Key::Star) => Some(Command::BackToMenu),
            _ => None,
        },
        ScreenKind::SystemInfo => match event {
            InputEvent::Key(_) => Some(Command::BackToMenu),
            _ => None,
        },
        ScreenKind::Manual => match event {
            InputEvent::Key(Key::A) => Some(Command::PagePrevious),
            InputEvent::Key(Key::B) => Some(Command::PageNext),
            InputEvent::Key(Key::Hash | Key::Star) => Some(Command::BackToMenu),
            _ => None,
        },
        ScreenKind::Idle => match event {
            InputEvent::Key(Key::D) => Some(Command::ReconnectWifi),
            other => receiver_common(other),
        },
        ScreenKind::Portal => receiver_common(event),
        ScreenKind::Alert => match event {
            InputEvent::Key(Key::Hash) => Some(Command::DismissAlert),
            other => receiver_common(other),
        },
    }
}

fn receiver_common(event: InputEvent) -> Option<Command> {
    match event {
        InputEvent::SimulatedPacket(packet) => Some(Command::InjectPacket(packet)),
        InputEvent::PortalButton(edge) => Some(Command::PortalButton(edge)),
        _ => None,
    }
}
