//! Text commands from the serial debug channel.
//!
//! One command per line:
//! - a digit, `#` or `*` acts like the keypad key
//! - a letter `A`..=`O` selects that alert directly
//! - `prev`, `next`, `info`, `manual` stand in for keypad `A`..`D`;
//!   `wifi` is another name for `D`
//! - `<id>,<code>` (optionally `TX` prefixed) injects a received packet

use heapless::Vec;
use log::{debug, warn};

use super::{InputEvent, Key};
use crate::{catalog::AlertCode, packet};

pub const DEBUG_LINE_BYTES: usize = 32;

pub fn parse_debug_line(line: &str) -> Option<InputEvent> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    if line.contains(',') {
        return match packet::decode(line) {
            Ok(packet) => Some(InputEvent::SimulatedPacket(packet)),
            Err(err) => {
                warn!("debug-in: rejected packet {:?}: {:?}", line, err);
                None
            }
        };
    }

    let mut chars = line.chars();
    if let (Some(ch), None) = (chars.next(), chars.next()) {
        return match ch {
            '0'..='9' => Some(InputEvent::Key(Key::Digit(ch as u8 - b'0'))),
            '#' => Some(InputEvent::Key(Key::Hash)),
            '*' => Some(InputEvent::Key(Key::Star)),
            _ => AlertCode::from_letter(ch).map(InputEvent::Shortcut),
        };
    }

    let key = if line.eq_ignore_ascii_case("prev") {
        Key::A
    } else if line.eq_ignore_ascii_case("next") {
        Key::B
    } else if line.eq_ignore_ascii_case("info") {
        Key::C
    } else if line.eq_ignore_ascii_case("manual") || line.eq_ignore_ascii_case("wifi") {
        Key::D
    } else {
        debug!("debug-in: unknown command {:?}", line);
        return None;
    };
    Some(InputEvent::Key(key))
}

/// Accumulates serial bytes into lines.
#[derive(Debug, Default)]
pub struct DebugLineBuffer {
    bytes: Vec<u8, DEBUG_LINE_BYTES>,
    overflowed: bool,
}

impl DebugLineBuffer {
    pub const fn new() -> Self {
        Self {
            bytes: Vec::new(),
            overflowed: false,
        }
    }

    /// Feeds one byte; yields an event when it completes a valid line.
    /// Lines longer than the buffer are dropped whole.
    pub fn push_byte(&mut self, byte: u8) -> Option<InputEvent> {
        match byte {
            b'\n' | b'\r' => {
                let overflowed = core::mem::replace(&mut self.overflowed, false);
                let event = if overflowed {
                    warn!("debug-in: line too long, dropped");
                    None
                } else {
                    core::str::from_utf8(&self.bytes)
                        .ok()
                        .and_then(parse_debug_line)
                };
                self.bytes.clear();
                event
            }
            _ => {
                if self.bytes.push(byte).is_err() {
                    self.overflowed = true;
                }
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packet::Packet;

    fn feed(buffer: &mut DebugLineBuffer, text: &[u8]) -> std::vec::Vec<InputEvent> {
        text.iter().filter_map(|b| buffer.push_byte(*b)).collect()
    }

    #[test]
    fn single_characters_map_to_keys_and_shortcuts() {
        assert_eq!(parse_debug_line("7"), Some(InputEvent::Key(Key::Digit(7))));
        assert_eq!(parse_debug_line("#"), Some(InputEvent::Key(Key::Hash)));
        assert_eq!(
            parse_debug_line("c"),
            Some(InputEvent::Shortcut(AlertCode::clamped(2)))
        );
        assert_eq!(parse_debug_line("Q"), None);
        assert_eq!(parse_debug_line("next"), Some(InputEvent::Key(Key::B)));
        assert_eq!(parse_debug_line("WiFi"), Some(InputEvent::Key(Key::D)));
    }

    #[test]
    fn pairs_become_simulated_packets() {
        assert_eq!(
            parse_debug_line("TX015,B"),
            Some(InputEvent::SimulatedPacket(Packet::new(
                15,
                AlertCode::clamped(1)
            )))
        );
        assert_eq!(parse_debug_line("15,"), None);
    }

    #[test]
    fn buffer_splits_on_any_line_ending() {
        let mut buffer = DebugLineBuffer::new();
        let events = feed(&mut buffer, b"1\r\n\r\n#\n");
        assert_eq!(
            events,
            [InputEvent::Key(Key::Digit(1)), InputEvent::Key(Key::Hash)]
        );
    }

    #[test]
    fn overlong_lines_are_dropped_whole() {
        let mut buffer = DebugLineBuffer::new();
        let mut long = std::vec![b'9'; DEBUG_LINE_BYTES + 4];
        long.push(b'\n');
        assert!(feed(&mut buffer, &long).is_empty());
        assert_eq!(feed(&mut buffer, b"3\n"), [InputEvent::Key(Key::Digit(3))]);
    }
}
