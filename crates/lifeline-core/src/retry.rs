//! Operator-driven retry bookkeeping for outgoing alerts.

use log::{info, warn};

use crate::{catalog::AlertCode, packet, radio::RadioLink};

pub const MAX_RETRY_ATTEMPTS: u8 = 3;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct TransmissionAttempt {
    pub alert_code: AlertCode,
    /// Zero-based.
    pub attempt_number: u8,
    pub succeeded: bool,
}

#[derive(Debug, Default)]
pub struct RetryController {
    attempts_made: u8,
    total_transmissions: u32,
    successful_transmissions: u32,
    last: Option<TransmissionAttempt>,
}

impl RetryController {
    pub const fn new() -> Self {
        Self {
            attempts_made: 0,
            total_transmissions: 0,
            successful_transmissions: 0,
            last: None,
        }
    }

    /// Starts a fresh sequence for a newly confirmed alert.
    pub fn begin(&mut self) {
        self.attempts_made = 0;
        self.last = None;
    }

    /// Drops the current sequence without touching the lifetime counters.
    pub fn abandon(&mut self) {
        if let Some(last) = self.last {
            info!(
                "retry: abandoned alert={} after {} attempt(s)",
                last.alert_code.descriptor().short_name,
                self.attempts_made
            );
        }
        self.begin();
    }

    /// Encodes and sends one packet. Returns whether the radio accepted it.
    ///
    /// Refuses once [`MAX_RETRY_ATTEMPTS`] have been spent. A packet that
    /// cannot be encoded never reaches the radio and is not counted.
    pub fn attempt<R: RadioLink>(
        &mut self,
        radio: &mut R,
        device_id: u16,
        alert_code: AlertCode,
    ) -> bool {
        if self.attempts_made >= MAX_RETRY_ATTEMPTS {
            warn!("retry: attempt budget exhausted");
            return false;
        }

        let payload = match packet::encode(device_id, alert_code.index()) {
            Ok(payload) => payload,
            Err(err) => {
                warn!("retry: cannot encode packet: {:?}", err);
                return false;
            }
        };

        let succeeded = radio.transmit(payload.as_bytes()).is_ok();
        let attempt_number = self.attempts_made;
        self.attempts_made += 1;
        self.total_transmissions = self.total_transmissions.saturating_add(1);
        if succeeded {
            self.successful_transmissions = self.successful_transmissions.saturating_add(1);
        }
        self.last = Some(TransmissionAttempt {
            alert_code,
            attempt_number,
            succeeded,
        });

        info!(
            "retry: sent {} attempt={}/{} ok={}",
            payload.as_str(),
            attempt_number + 1,
            MAX_RETRY_ATTEMPTS,
            succeeded
        );
        succeeded
    }

    /// Zero-based index of the latest attempt, 0 before the first one.
    pub fn attempt_number(&self) -> u8 {
        self.attempts_made.saturating_sub(1)
    }

    pub const fn attempts_made(&self) -> u8 {
        self.attempts_made
    }

    pub fn can_retry(&self) -> bool {
        self.attempt_number() < MAX_RETRY_ATTEMPTS - 1
    }

    pub const fn last_attempt(&self) -> Option<TransmissionAttempt> {
        self.last
    }

    pub const fn total_transmissions(&self) -> u32 {
        self.total_transmissions
    }

    pub const fn successful_transmissions(&self) -> u32 {
        self.successful_transmissions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FakeRadio {
        fail: bool,
        sent: std::vec::Vec<std::string::String>,
    }

    impl RadioLink for FakeRadio {
        type Error = ();

        fn transmit(&mut self, payload: &[u8]) -> Result<(), Self::Error> {
            self.sent
                .push(std::string::String::from_utf8_lossy(payload).into_owned());
            if self.fail { Err(()) } else { Ok(()) }
        }
    }

    #[test]
    fn three_failures_exhaust_retries() {
        let mut radio = FakeRadio {
            fail: true,
            sent: std::vec::Vec::new(),
        };
        let mut retry = RetryController::new();
        retry.begin();

        assert!(!retry.attempt(&mut radio, 3, AlertCode::EMERGENCY));
        assert!(retry.can_retry());
        assert!(!retry.attempt(&mut radio, 3, AlertCode::EMERGENCY));
        assert!(retry.can_retry());
        assert!(!retry.attempt(&mut radio, 3, AlertCode::EMERGENCY));
        assert!(!retry.can_retry());
        assert_eq!(retry.attempt_number(), 2);

        // Budget is spent; the radio is not touched again.
        assert!(!retry.attempt(&mut radio, 3, AlertCode::EMERGENCY));
        assert_eq!(radio.sent.len(), 3);
        assert_eq!(retry.total_transmissions(), 3);
        assert_eq!(retry.successful_transmissions(), 0);
    }

    #[test]
    fn counters_survive_new_sequences() {
        let mut radio = FakeRadio {
            fail: false,
            sent: std::vec::Vec::new(),
        };
        let mut retry = RetryController::new();
        retry.begin();
        assert!(retry.attempt(&mut radio, 12, AlertCode::OTHER));
        retry.begin();
        assert!(retry.attempt(&mut radio, 12, AlertCode::OTHER));

        assert_eq!(radio.sent, ["TX012,O", "TX012,O"]);
        assert_eq!(retry.attempt_number(), 0);
        assert_eq!(retry.total_transmissions(), 2);
        assert_eq!(retry.successful_transmissions(), 2);
    }

    #[test]
    fn invalid_device_id_never_reaches_radio() {
        let mut radio = FakeRadio {
            fail: false,
            sent: std::vec::Vec::new(),
        };
        let mut retry = RetryController::new();
        assert!(!retry.attempt(&mut radio, 0, AlertCode::EMERGENCY));
        assert!(radio.sent.is_empty());
        assert_eq!(retry.total_transmissions(), 0);
    }
}
