//! Bounded log of received alerts, oldest first.

use heapless::Vec;

use crate::{catalog::AlertCode, packet::Packet};

pub const HISTORY_CAPACITY: usize = 10;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct AlertRecord {
    pub device_id: u16,
    pub alert_code: AlertCode,
    pub rssi: i16,
    pub received_at_ms: u64,
}

impl AlertRecord {
    pub const fn from_packet(packet: Packet, rssi: i16, received_at_ms: u64) -> Self {
        Self {
            device_id: packet.device_id,
            alert_code: packet.alert_code,
            rssi,
            received_at_ms,
        }
    }
}

#[derive(Debug, Default)]
pub struct AlertHistory {
    records: Vec<AlertRecord, HISTORY_CAPACITY>,
    total_received: u32,
}

impl AlertHistory {
    pub const fn new() -> Self {
        Self {
            records: Vec::new(),
            total_received: 0,
        }
    }

    /// Appends a record, dropping the oldest one when full.
    pub fn push(&mut self, record: AlertRecord) {
        if self.records.is_full() {
            self.records.remove(0);
        }
        // Cannot fail: a slot was freed above.
        let _ = self.records.push(record);
        self.total_received = self.total_received.saturating_add(1);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub const fn capacity(&self) -> usize {
        HISTORY_CAPACITY
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &AlertRecord> {
        self.records.iter()
    }

    pub fn latest(&self) -> Option<&AlertRecord> {
        self.records.last()
    }

    pub fn get(&self, index: usize) -> Option<&AlertRecord> {
        self.records.get(index)
    }

    /// Lifetime count, including evicted records.
    pub const fn total_received(&self) -> u32 {
        self.total_received
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(device_id: u16) -> AlertRecord {
        AlertRecord {
            device_id,
            alert_code: AlertCode::EMERGENCY,
            rssi: -70,
            received_at_ms: device_id as u64 * 100,
        }
    }

    #[test]
    fn keeps_last_ten_in_arrival_order() {
        let mut history = AlertHistory::new();
        for id in 1..=15 {
            history.push(record(id));
        }

        assert_eq!(history.len(), HISTORY_CAPACITY);
        let ids: std::vec::Vec<u16> = history.iter().map(|r| r.device_id).collect();
        assert_eq!(ids, (6..=15).collect::<std::vec::Vec<u16>>());
        assert_eq!(history.latest().map(|r| r.device_id), Some(15));
        assert_eq!(history.total_received(), 15);
    }

    #[test]
    fn duplicates_are_kept() {
        let mut history = AlertHistory::new();
        history.push(record(4));
        history.push(record(4));
        assert_eq!(history.len(), 2);
    }
}
