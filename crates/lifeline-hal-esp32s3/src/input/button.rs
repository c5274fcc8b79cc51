use embedded_hal::digital::InputPin;

use lifeline_core::input::{ButtonEdge, InputEvent, InputProvider};

#[derive(Debug, Clone, Copy)]
pub struct ButtonConfig {
    active_low: bool,
    debounce_polls: u8,
}

impl Default for ButtonConfig {
    fn default() -> Self {
        Self {
            active_low: true,
            debounce_polls: 3,
        }
    }
}

impl ButtonConfig {
    pub const fn with_active_low(mut self, active_low: bool) -> Self {
        self.active_low = active_low;
        self
    }

    pub const fn with_debounce_polls(mut self, debounce_polls: u8) -> Self {
        self.debounce_polls = debounce_polls;
        self
    }
}

/// Debounced portal button reporting both edges, so the core can time
/// the long press.
#[derive(Debug)]
pub struct PortalButton<PIN> {
    pin: PIN,
    config: ButtonConfig,
    raw: bool,
    stable: bool,
    stable_count: u8,
}

impl<PIN> PortalButton<PIN>
where
    PIN: InputPin,
{
    pub fn new(mut pin: PIN, config: ButtonConfig) -> Result<Self, PIN::Error> {
        let pressed = pressed_from_level(pin.is_high()?, config.active_low);

        Ok(Self {
            pin,
            config,
            raw: pressed,
            stable: pressed,
            stable_count: 0,
        })
    }
}

impl<PIN> InputProvider for PortalButton<PIN>
where
    PIN: InputPin,
{
    type Error = PIN::Error;

    fn poll_event(&mut self) -> Result<Option<InputEvent>, Self::Error> {
        let pressed = pressed_from_level(self.pin.is_high()?, self.config.active_low);

        if pressed == self.raw {
            self.stable_count = self.stable_count.saturating_add(1);
        } else {
            self.raw = pressed;
            self.stable_count = 0;
        }

        let threshold = self.config.debounce_polls.max(1);
        if self.stable_count < threshold || self.stable == self.raw {
            return Ok(None);
        }

        self.stable = self.raw;
        let edge = if self.stable {
            ButtonEdge::Pressed
        } else {
            ButtonEdge::Released
        };
        Ok(Some(InputEvent::PortalButton(edge)))
    }
}

#[inline]
fn pressed_from_level(high: bool, active_low: bool) -> bool {
    if active_low { !high } else { high }
}
