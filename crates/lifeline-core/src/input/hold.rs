//! Long-press tracking for the portal button.

use super::ButtonEdge;

pub const PORTAL_HOLD_MS: u64 = 3_000;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum HoldEvent {
    Idle,
    Started,
    /// 0..=99 while the button is still short of the threshold.
    Progress { pct: u8 },
    Completed,
    /// Released early; any progress indicator should roll back.
    Cancelled,
}

#[derive(Clone, Copy, Debug)]
pub struct HoldDetector {
    hold_ms: u64,
    pressed_since: Option<u64>,
    fired: bool,
}

impl HoldDetector {
    pub const fn new(hold_ms: u64) -> Self {
        Self {
            hold_ms: if hold_ms == 0 { 1 } else { hold_ms },
            pressed_since: None,
            fired: false,
        }
    }

    pub fn on_edge(&mut self, edge: ButtonEdge, now_ms: u64) -> HoldEvent {
        match edge {
            ButtonEdge::Pressed => {
                if self.pressed_since.is_some() {
                    return HoldEvent::Idle;
                }
                self.pressed_since = Some(now_ms);
                self.fired = false;
                HoldEvent::Started
            }
            ButtonEdge::Released => {
                let was_pending = self.pressed_since.is_some() && !self.fired;
                self.pressed_since = None;
                self.fired = false;
                if was_pending {
                    HoldEvent::Cancelled
                } else {
                    HoldEvent::Idle
                }
            }
        }
    }

    /// Fires [`HoldEvent::Completed`] once per press.
    pub fn poll(&mut self, now_ms: u64) -> HoldEvent {
        let Some(since) = self.pressed_since else {
            return HoldEvent::Idle;
        };
        if self.fired {
            return HoldEvent::Idle;
        }

        let elapsed = now_ms.saturating_sub(since);
        if elapsed >= self.hold_ms {
            self.fired = true;
            return HoldEvent::Completed;
        }
        HoldEvent::Progress {
            pct: ((elapsed * 100) / self.hold_ms) as u8,
        }
    }

    /// Progress for rendering, `None` when nothing is being held.
    pub fn progress_pct(&self, now_ms: u64) -> Option<u8> {
        let since = self.pressed_since?;
        if self.fired {
            return None;
        }
        Some(((now_ms.saturating_sub(since) * 100) / self.hold_ms).min(100) as u8)
    }
}

impl Default for HoldDetector {
    fn default() -> Self {
        Self::new(PORTAL_HOLD_MS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_hold_completes_once() {
        let mut hold = HoldDetector::default();
        assert_eq!(hold.on_edge(ButtonEdge::Pressed, 1_000), HoldEvent::Started);
        assert_eq!(hold.poll(2_500), HoldEvent::Progress { pct: 50 });
        assert_eq!(hold.poll(4_000), HoldEvent::Completed);
        assert_eq!(hold.poll(9_000), HoldEvent::Idle);
        assert_eq!(hold.on_edge(ButtonEdge::Released, 9_100), HoldEvent::Idle);
    }

    #[test]
    fn early_release_cancels() {
        let mut hold = HoldDetector::default();
        hold.on_edge(ButtonEdge::Pressed, 0);
        assert_eq!(hold.poll(2_999), HoldEvent::Progress { pct: 99 });
        assert_eq!(hold.on_edge(ButtonEdge::Released, 2_999), HoldEvent::Cancelled);
        assert_eq!(hold.progress_pct(3_500), None);
        assert_eq!(hold.poll(3_500), HoldEvent::Idle);
    }
}
