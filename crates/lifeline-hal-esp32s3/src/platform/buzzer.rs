use embedded_hal::digital::OutputPin;
use lifeline_core::feedback::{ToneStep, TonePattern};

/// Non-blocking pattern player for an active buzzer.
///
/// An active buzzer has a fixed pitch, so only the on/off timing of each
/// step is honoured. A new pattern replaces whatever is playing.
#[derive(Debug)]
pub struct Buzzer<PIN> {
    pin: PIN,
    steps: &'static [ToneStep],
    index: usize,
    step_until_ms: u64,
}

impl<PIN> Buzzer<PIN>
where
    PIN: OutputPin,
{
    pub fn new(mut pin: PIN) -> Result<Self, PIN::Error> {
        pin.set_low()?;
        Ok(Self {
            pin,
            steps: &[],
            index: 0,
            step_until_ms: 0,
        })
    }

    pub fn play(&mut self, pattern: TonePattern, now_ms: u64) -> Result<(), PIN::Error> {
        self.steps = pattern.steps();
        self.index = 0;
        self.start_step(now_ms)
    }

    pub fn is_playing(&self) -> bool {
        self.index < self.steps.len()
    }

    /// Advances the pattern; call every loop iteration.
    pub fn poll(&mut self, now_ms: u64) -> Result<(), PIN::Error> {
        if !self.is_playing() || now_ms < self.step_until_ms {
            return Ok(());
        }

        self.index += 1;
        self.start_step(now_ms)
    }

    fn start_step(&mut self, now_ms: u64) -> Result<(), PIN::Error> {
        let Some(step) = self.steps.get(self.index) else {
            return self.pin.set_low();
        };

        self.step_until_ms = now_ms + step.duration_ms as u64;
        if step.freq_hz == 0 {
            self.pin.set_low()
        } else {
            self.pin.set_high()
        }
    }
}
