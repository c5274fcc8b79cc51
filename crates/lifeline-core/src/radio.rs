//! Radio seams used by the transmitter and receiver state machines.

use heapless::Vec;

/// Largest payload the receiver keeps from one frame.
pub const MAX_FRAME_BYTES: usize = 64;

/// Blocking transmit primitive. One call is one packet on air.
pub trait RadioLink {
    type Error;

    fn transmit(&mut self, payload: &[u8]) -> Result<(), Self::Error>;
}

/// A frame as it came off the air, with receiver-side signal strength.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct RawFrame {
    pub bytes: Vec<u8, MAX_FRAME_BYTES>,
    pub rssi: i16,
}

impl RawFrame {
    /// Copies at most [`MAX_FRAME_BYTES`]; the rest is dropped.
    pub fn from_slice(payload: &[u8], rssi: i16) -> Self {
        let take = payload.len().min(MAX_FRAME_BYTES);
        let mut bytes = Vec::new();
        let _ = bytes.extend_from_slice(&payload[..take]);
        Self { bytes, rssi }
    }
}

/// Polled receive buffer.
pub trait PacketSource {
    type Error;

    fn poll_frame(&mut self) -> Result<Option<RawFrame>, Self::Error>;
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SpreadingFactor {
    Sf7,
    Sf8,
    Sf9,
    Sf10,
    Sf11,
    Sf12,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Bandwidth {
    Khz125,
    Khz250,
    Khz500,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CodingRate {
    Cr4_5,
    Cr4_6,
    Cr4_7,
    Cr4_8,
}

/// Link parameters both ends must agree on.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct RadioProfile {
    pub frequency_hz: u32,
    pub spreading_factor: SpreadingFactor,
    pub bandwidth: Bandwidth,
    pub coding_rate: CodingRate,
    pub tx_power_dbm: i8,
    pub preamble_len: u16,
}

impl Default for RadioProfile {
    fn default() -> Self {
        Self {
            frequency_hz: 433_000_000,
            spreading_factor: SpreadingFactor::Sf9,
            bandwidth: Bandwidth::Khz125,
            coding_rate: CodingRate::Cr4_5,
            tx_power_dbm: 17,
            preamble_len: 8,
        }
    }
}

impl RadioProfile {
    pub const MIN_TX_POWER_DBM: i8 = 2;
    pub const MAX_TX_POWER_DBM: i8 = 20;

    pub fn with_frequency_hz(mut self, frequency_hz: u32) -> Self {
        self.frequency_hz = frequency_hz;
        self
    }

    pub fn with_tx_power_dbm(mut self, dbm: i8) -> Self {
        self.tx_power_dbm = dbm.clamp(Self::MIN_TX_POWER_DBM, Self::MAX_TX_POWER_DBM);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn oversized_frames_are_truncated() {
        let payload = [b'x'; MAX_FRAME_BYTES + 10];
        let frame = RawFrame::from_slice(&payload, -90);
        assert_eq!(frame.bytes.len(), MAX_FRAME_BYTES);
        assert_eq!(frame.rssi, -90);
    }

    #[test]
    fn tx_power_is_clamped_to_chip_range() {
        let profile = RadioProfile::default().with_tx_power_dbm(30);
        assert_eq!(profile.tx_power_dbm, RadioProfile::MAX_TX_POWER_DBM);
    }
}
