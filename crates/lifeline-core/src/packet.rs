//! Wire codec for alert packets.
//!
//! A packet is plain ASCII: `TX` + zero-padded three digit device id + `,` +
//! one letter `A`..=`O` naming the alert, e.g. `TX003,A`. Decoding is more
//! forgiving than encoding: the prefix is optional, the code may be given as
//! a decimal number and surrounding whitespace is ignored, so serial bench
//! input uses the same path as radio frames.

use core::fmt::Write;

use heapless::String;
use log::warn;

use crate::catalog::{ALERT_COUNT, AlertCode, AlertDescriptor};

pub const PACKET_PREFIX: &str = "TX";
pub const MAX_DEVICE_ID: u16 = 999;
pub const MIN_DEVICE_ID: u16 = 1;
/// Enough for the longest encoded packet plus slack for bench input.
pub const PACKET_CAPACITY: usize = 16;

pub type PacketString = String<PACKET_CAPACITY>;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum EncodeError {
    DeviceIdOutOfRange,
    AlertCodeOutOfRange,
    Overflow,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DecodeError {
    /// No separator, an empty field, or a code token that is neither a
    /// letter nor a number.
    Malformed,
    InvalidDeviceId,
    AlertCodeOutOfRange,
}

/// What to do with device ids that are not a plain number in range.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum DeviceIdPolicy {
    /// Digits only, and within `MIN_DEVICE_ID..=MAX_DEVICE_ID`; `TX000`
    /// and `TX1000` are rejected like `TXabc`.
    #[default]
    Strict,
    /// Parse leading digits and treat anything else as id 0. Deployed
    /// receivers behaved this way, so mixed fleets may need it.
    LegacyZero,
}

/// What to do with alert codes past the end of the catalog.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum CodeRangePolicy {
    #[default]
    ClampToOther,
    Reject,
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct DecodeOptions {
    pub device_id: DeviceIdPolicy,
    pub code_range: CodeRangePolicy,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Packet {
    pub device_id: u16,
    pub alert_code: AlertCode,
}

impl Packet {
    pub const fn new(device_id: u16, alert_code: AlertCode) -> Self {
        Self {
            device_id,
            alert_code,
        }
    }

    pub fn descriptor(&self) -> &'static AlertDescriptor {
        self.alert_code.descriptor()
    }

    pub fn encode(&self) -> Result<PacketString, EncodeError> {
        encode(self.device_id, self.alert_code.index())
    }
}

pub fn encode(device_id: u16, alert_code: u8) -> Result<PacketString, EncodeError> {
    if !(MIN_DEVICE_ID..=MAX_DEVICE_ID).contains(&device_id) {
        return Err(EncodeError::DeviceIdOutOfRange);
    }
    let code = AlertCode::new(alert_code).ok_or(EncodeError::AlertCodeOutOfRange)?;

    let mut out = PacketString::new();
    write!(out, "{}{:03},{}", PACKET_PREFIX, device_id, code.letter())
        .map_err(|_| EncodeError::Overflow)?;
    Ok(out)
}

pub fn decode(raw: &str) -> Result<Packet, DecodeError> {
    decode_with(raw, DecodeOptions::default())
}

/// Radio payload entry point. Non UTF-8 frames are malformed.
pub fn decode_frame(bytes: &[u8], options: DecodeOptions) -> Result<Packet, DecodeError> {
    let raw = core::str::from_utf8(bytes).map_err(|_| DecodeError::Malformed)?;
    decode_with(raw, options)
}

pub fn decode_with(raw: &str, options: DecodeOptions) -> Result<Packet, DecodeError> {
    let trimmed = raw.trim();
    let body = trimmed
        .strip_prefix(PACKET_PREFIX)
        .or_else(|| trimmed.strip_prefix("tx"))
        .unwrap_or(trimmed);

    let (id_token, code_token) = body.split_once(',').ok_or(DecodeError::Malformed)?;
    let id_token = id_token.trim();
    let code_token = code_token.trim();
    if id_token.is_empty() || code_token.is_empty() {
        return Err(DecodeError::Malformed);
    }

    let alert_code = parse_code(code_token, options.code_range)?;
    let device_id = parse_device_id(id_token, options.device_id)?;

    Ok(Packet {
        device_id,
        alert_code,
    })
}

fn parse_device_id(token: &str, policy: DeviceIdPolicy) -> Result<u16, DecodeError> {
    match policy {
        DeviceIdPolicy::Strict => {
            if !token.bytes().all(|b| b.is_ascii_digit()) {
                return Err(DecodeError::InvalidDeviceId);
            }
            let value = parse_decimal(token).ok_or(DecodeError::InvalidDeviceId)?;
            if value < MIN_DEVICE_ID as u32 || value > MAX_DEVICE_ID as u32 {
                return Err(DecodeError::InvalidDeviceId);
            }
            Ok(value as u16)
        }
        DeviceIdPolicy::LegacyZero => {
            let digits_end = token
                .bytes()
                .position(|b| !b.is_ascii_digit())
                .unwrap_or(token.len());
            let value = parse_decimal(&token[..digits_end]).unwrap_or(0);
            Ok(value.min(u16::MAX as u32) as u16)
        }
    }
}

fn parse_code(token: &str, policy: CodeRangePolicy) -> Result<AlertCode, DecodeError> {
    let mut chars = token.chars();
    let raw = match (chars.next(), chars.next()) {
        (Some(letter), None) if letter.is_ascii_alphabetic() => {
            (letter.to_ascii_uppercase() as u8 - b'A') as u32
        }
        _ if token.bytes().all(|b| b.is_ascii_digit()) => {
            // Saturate absurd digit strings so they still count as out of range.
            parse_decimal(token).unwrap_or(u32::MAX)
        }
        _ => return Err(DecodeError::Malformed),
    };

    if raw < ALERT_COUNT as u32 {
        return Ok(AlertCode::clamped(raw));
    }

    match policy {
        CodeRangePolicy::ClampToOther => {
            warn!("packet: alert code {} out of range, using OTHER", raw);
            Ok(AlertCode::OTHER)
        }
        CodeRangePolicy::Reject => Err(DecodeError::AlertCodeOutOfRange),
    }
}

fn parse_decimal(digits: &str) -> Option<u32> {
    if digits.is_empty() {
        return None;
    }
    let mut value = 0u32;
    for b in digits.bytes() {
        value = value
            .checked_mul(10)?
            .checked_add((b - b'0') as u32)?;
    }
    Some(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_zero_padded_id_and_letter() {
        assert_eq!(encode(3, 0).unwrap().as_str(), "TX003,A");
        assert_eq!(encode(999, 14).unwrap().as_str(), "TX999,O");
        assert_eq!(encode(42, 5).unwrap().as_str(), "TX042,F");
    }

    #[test]
    fn encode_rejects_out_of_range_inputs() {
        assert_eq!(encode(0, 1), Err(EncodeError::DeviceIdOutOfRange));
        assert_eq!(encode(1000, 1), Err(EncodeError::DeviceIdOutOfRange));
        assert_eq!(encode(5, 15), Err(EncodeError::AlertCodeOutOfRange));
    }

    #[test]
    fn encoded_packets_decode_back() {
        for device_id in [MIN_DEVICE_ID, 7, 500, MAX_DEVICE_ID] {
            for code in AlertCode::all() {
                let wire = encode(device_id, code.index()).unwrap();
                assert_eq!(decode(&wire), Ok(Packet::new(device_id, code)));
            }
        }
    }

    #[test]
    fn numeric_code_past_catalog_clamps_to_other() {
        let packet = decode("TX007,99").unwrap();
        assert_eq!(packet.device_id, 7);
        assert_eq!(packet.alert_code, AlertCode::OTHER);
        assert_eq!(packet.descriptor().long_name, "OTHER EMERGENCY");

        let letter = decode("TX007,Z").unwrap();
        assert_eq!(letter.alert_code, AlertCode::OTHER);
    }

    #[test]
    fn reject_policy_refuses_out_of_range_codes() {
        let options = DecodeOptions {
            code_range: CodeRangePolicy::Reject,
            ..DecodeOptions::default()
        };
        assert_eq!(
            decode_with("TX007,99", options),
            Err(DecodeError::AlertCodeOutOfRange)
        );
    }

    #[test]
    fn garbage_and_missing_fields_are_malformed() {
        assert_eq!(decode("garbage"), Err(DecodeError::Malformed));
        assert_eq!(decode("TX007"), Err(DecodeError::Malformed));
        assert_eq!(decode("TX007,"), Err(DecodeError::Malformed));
        assert_eq!(decode(",A"), Err(DecodeError::Malformed));
        assert_eq!(decode("TX007,AB"), Err(DecodeError::Malformed));
        assert_eq!(decode(""), Err(DecodeError::Malformed));
    }

    #[test]
    fn prefix_case_and_whitespace_are_optional() {
        assert_eq!(decode("12,c\r\n"), Ok(Packet::new(12, AlertCode::clamped(2))));
        assert_eq!(decode("  TX012 , 2 "), Ok(Packet::new(12, AlertCode::clamped(2))));
    }

    #[test]
    fn device_id_policy_controls_non_numeric_ids() {
        assert_eq!(decode("TXabc,A"), Err(DecodeError::InvalidDeviceId));
        assert_eq!(decode("TX000,A"), Err(DecodeError::InvalidDeviceId));
        assert_eq!(decode("TX1000,A"), Err(DecodeError::InvalidDeviceId));
        assert_eq!(decode("TX999,A"), Ok(Packet::new(999, AlertCode::EMERGENCY)));

        let legacy = DecodeOptions {
            device_id: DeviceIdPolicy::LegacyZero,
            ..DecodeOptions::default()
        };
        assert_eq!(decode_with("TXabc,A", legacy).unwrap().device_id, 0);
        assert_eq!(decode_with("TX12x,A", legacy).unwrap().device_id, 12);
        assert_eq!(decode_with("TX000,A", legacy).unwrap().device_id, 0);
    }

    #[test]
    fn invalid_utf8_frames_are_malformed() {
        assert_eq!(
            decode_frame(&[0xff, 0xfe, b','], DecodeOptions::default()),
            Err(DecodeError::Malformed)
        );
        assert!(decode_frame(b"TX001,B", DecodeOptions::default()).is_ok());
    }
}
