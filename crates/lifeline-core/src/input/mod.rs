//! Input abstraction layer.

pub mod debug_line;
pub mod dispatch;
pub mod hold;

use crate::{catalog::AlertCode, packet::Packet};

/// Keys of the 4x4 membrane keypad.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Key {
    Digit(u8),
    A,
    B,
    C,
    D,
    Star,
    Hash,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ButtonEdge {
    Pressed,
    Released,
}

/// Logical events consumed by the transceiver apps.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum InputEvent {
    Key(Key),
    /// Debug channel letter picking a catalog entry directly.
    Shortcut(AlertCode),
    /// Debug channel packet injected as if it had been received.
    SimulatedPacket(Packet),
    PortalButton(ButtonEdge),
}

/// Polled input provider.
pub trait InputProvider {
    type Error;

    fn poll_event(&mut self) -> Result<Option<InputEvent>, Self::Error>;
}

/// Polls `first` until it runs dry, then `second`.
pub struct ChainedInput<A, B> {
    first: A,
    second: B,
}

impl<A, B> ChainedInput<A, B> {
    pub const fn new(first: A, second: B) -> Self {
        Self { first, second }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ChainedInputError<EA, EB> {
    First(EA),
    Second(EB),
}

impl<A, B> InputProvider for ChainedInput<A, B>
where
    A: InputProvider,
    B: InputProvider,
{
    type Error = ChainedInputError<A::Error, B::Error>;

    /// A failing `first` does not starve `second`; its error is reported
    /// only when `second` has nothing to offer.
    fn poll_event(&mut self) -> Result<Option<InputEvent>, Self::Error> {
        match self.first.poll_event() {
            Ok(Some(event)) => Ok(Some(event)),
            Ok(None) => self.second.poll_event().map_err(ChainedInputError::Second),
            Err(err) => match self.second.poll_event() {
                Ok(Some(event)) => Ok(Some(event)),
                Ok(None) | Err(_) => Err(ChainedInputError::First(err)),
            },
        }
    }
}

/// An absent source never yields events.
impl<P> InputProvider for Option<P>
where
    P: InputProvider,
{
    type Error = P::Error;

    fn poll_event(&mut self) -> Result<Option<InputEvent>, Self::Error> {
        match self {
            Some(provider) => provider.poll_event(),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Scripted(&'static [InputEvent]);

    impl InputProvider for Scripted {
        type Error = ();

        fn poll_event(&mut self) -> Result<Option<InputEvent>, Self::Error> {
            let Some((first, rest)) = self.0.split_first() else {
                return Ok(None);
            };
            self.0 = rest;
            Ok(Some(*first))
        }
    }

    #[test]
    fn chained_input_drains_first_source_before_second() {
        let mut input = ChainedInput::new(
            Scripted(&[InputEvent::Key(Key::A)]),
            Some(Scripted(&[InputEvent::Key(Key::Hash)])),
        );
        assert_eq!(input.poll_event(), Ok(Some(InputEvent::Key(Key::A))));
        assert_eq!(input.poll_event(), Ok(Some(InputEvent::Key(Key::Hash))));
        assert_eq!(input.poll_event(), Ok(None));

        let mut missing: ChainedInput<Scripted, Option<Scripted>> =
            ChainedInput::new(Scripted(&[]), None);
        assert_eq!(missing.poll_event(), Ok(None));
    }

    struct Broken;

    impl InputProvider for Broken {
        type Error = u8;

        fn poll_event(&mut self) -> Result<Option<InputEvent>, Self::Error> {
            Err(7)
        }
    }

    #[test]
    fn faulty_first_source_does_not_silence_second() {
        let mut input = ChainedInput::new(
            Broken,
            Scripted(&[InputEvent::Key(Key::Star), InputEvent::Key(Key::Digit(3))]),
        );
        assert_eq!(input.poll_event(), Ok(Some(InputEvent::Key(Key::Star))));
        assert_eq!(input.poll_event(), Ok(Some(InputEvent::Key(Key::Digit(3)))));
        assert_eq!(input.poll_event(), Err(ChainedInputError::First(7)));
    }
}
