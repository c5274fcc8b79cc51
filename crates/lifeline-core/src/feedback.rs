//! Fire-and-forget side effects requested by the state machines.

use heapless::Deque;
use log::warn;

use crate::catalog::Priority;

pub const EFFECT_QUEUE_DEPTH: usize = 8;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ToneStep {
    /// 0 is a rest.
    pub freq_hz: u16,
    pub duration_ms: u16,
}

const fn tone(freq_hz: u16, duration_ms: u16) -> ToneStep {
    ToneStep {
        freq_hz,
        duration_ms,
    }
}

const fn rest(duration_ms: u16) -> ToneStep {
    tone(0, duration_ms)
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TonePattern {
    Critical,
    High,
    Notice,
    Sending,
    SendOk,
    SendFailed,
    PortalOpened,
}

impl TonePattern {
    pub const fn for_priority(priority: Priority) -> Self {
        match priority {
            Priority::Critical => Self::Critical,
            Priority::High => Self::High,
            Priority::Medium | Priority::Ok | Priority::Info => Self::Notice,
        }
    }

    pub fn steps(self) -> &'static [ToneStep] {
        match self {
            Self::Critical => CRITICAL_STEPS,
            Self::High => HIGH_STEPS,
            Self::Notice => NOTICE_STEPS,
            Self::Sending => SENDING_STEPS,
            Self::SendOk => SEND_OK_STEPS,
            Self::SendFailed => SEND_FAILED_STEPS,
            Self::PortalOpened => PORTAL_OPENED_STEPS,
        }
    }
}

const CRITICAL_STEPS: &[ToneStep] = &[
    tone(2_800, 150),
    rest(60),
    tone(2_800, 150),
    rest(60),
    tone(2_800, 150),
    rest(60),
    tone(2_800, 400),
];
const HIGH_STEPS: &[ToneStep] = &[tone(2_200, 200), rest(100), tone(2_200, 200)];
const NOTICE_STEPS: &[ToneStep] = &[tone(1_800, 120)];
const SENDING_STEPS: &[ToneStep] = &[tone(1_500, 60)];
const SEND_OK_STEPS: &[ToneStep] = &[tone(1_500, 80), rest(40), tone(2_400, 120)];
const SEND_FAILED_STEPS: &[ToneStep] = &[tone(600, 350)];
const PORTAL_OPENED_STEPS: &[ToneStep] = &[tone(1_200, 100), rest(50), tone(1_600, 100)];

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Effect {
    Tone(TonePattern),
    /// Reboot so freshly saved credentials take effect.
    Restart,
}

/// Bounded queue; the oldest effect is dropped when full.
#[derive(Debug, Default)]
pub struct EffectQueue {
    pending: Deque<Effect, EFFECT_QUEUE_DEPTH>,
}

impl EffectQueue {
    pub const fn new() -> Self {
        Self {
            pending: Deque::new(),
        }
    }

    pub fn push(&mut self, effect: Effect) {
        if self.pending.is_full() {
            warn!("effects: queue full, dropping oldest");
            let _ = self.pending.pop_front();
        }
        let _ = self.pending.push_back(effect);
    }

    pub fn pop(&mut self) -> Option<Effect> {
        self.pending.pop_front()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn priorities_pick_distinct_patterns() {
        assert_eq!(TonePattern::for_priority(Priority::Critical), TonePattern::Critical);
        assert_eq!(TonePattern::for_priority(Priority::High), TonePattern::High);
        assert_eq!(TonePattern::for_priority(Priority::Info), TonePattern::Notice);
        assert_ne!(
            TonePattern::Critical.steps(),
            TonePattern::High.steps()
        );
    }

    #[test]
    fn every_pattern_starts_and_ends_audible() {
        for pattern in [
            TonePattern::Critical,
            TonePattern::High,
            TonePattern::Notice,
            TonePattern::Sending,
            TonePattern::SendOk,
            TonePattern::SendFailed,
            TonePattern::PortalOpened,
        ] {
            let steps = pattern.steps();
            assert!(steps.first().is_some_and(|step| step.freq_hz != 0), "{:?}", pattern);
            assert!(steps.last().is_some_and(|step| step.freq_hz != 0), "{:?}", pattern);
        }
        assert_eq!(TonePattern::Critical.steps().len(), 7);
    }

    #[test]
    fn full_queue_drops_oldest() {
        let mut queue = EffectQueue::new();
        queue.push(Effect::Restart);
        for _ in 0..EFFECT_QUEUE_DEPTH {
            queue.push(Effect::Tone(TonePattern::Notice));
        }
        assert_eq!(queue.len(), EFFECT_QUEUE_DEPTH);
        assert_eq!(queue.pop(), Some(Effect::Tone(TonePattern::Notice)));
    }
}
