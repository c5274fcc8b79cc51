use embedded_io::{Read, ReadReady};

use lifeline_core::input::{InputEvent, InputProvider, debug_line::DebugLineBuffer};

/// Debug console reader: turns typed lines into input events.
///
/// Only bytes that are already buffered are consumed, so polling never
/// blocks the UI loop.
pub struct SerialLineInput<U> {
    uart: U,
    lines: DebugLineBuffer,
}

impl<U> SerialLineInput<U>
where
    U: Read + ReadReady,
{
    pub const fn new(uart: U) -> Self {
        Self {
            uart,
            lines: DebugLineBuffer::new(),
        }
    }
}

impl<U> InputProvider for SerialLineInput<U>
where
    U: Read + ReadReady,
{
    type Error = U::Error;

    fn poll_event(&mut self) -> Result<Option<InputEvent>, Self::Error> {
        let mut byte = [0u8; 1];

        while self.uart.read_ready()? {
            if self.uart.read(&mut byte)? == 0 {
                break;
            }
            if let Some(event) = self.lines.push_byte(byte[0]) {
                return Ok(Some(event));
            }
        }

        Ok(None)
    }
}
