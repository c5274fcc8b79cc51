use embedded_hal::digital::{InputPin, OutputPin};

use lifeline_core::input::{InputEvent, InputProvider, Key};

pub const KEYPAD_ROWS: usize = 4;
pub const KEYPAD_COLS: usize = 4;

// Membrane layout, row-major as printed on the pad.
const LAYOUT: [[Key; KEYPAD_COLS]; KEYPAD_ROWS] = [
    [Key::Digit(1), Key::Digit(2), Key::Digit(3), Key::A],
    [Key::Digit(4), Key::Digit(5), Key::Digit(6), Key::B],
    [Key::Digit(7), Key::Digit(8), Key::Digit(9), Key::C],
    [Key::Star, Key::Digit(0), Key::Hash, Key::D],
];

#[derive(Debug, Clone, Copy)]
pub struct KeypadConfig {
    debounce_scans: u8,
}

impl Default for KeypadConfig {
    fn default() -> Self {
        Self { debounce_scans: 3 }
    }
}

impl KeypadConfig {
    pub const fn with_debounce_scans(mut self, debounce_scans: u8) -> Self {
        self.debounce_scans = debounce_scans;
        self
    }
}

#[derive(Debug)]
pub enum KeypadError<RowErr, ColErr> {
    Row(RowErr),
    Col(ColErr),
}

type KeypadResult<RowErr, ColErr, T> = Result<T, KeypadError<RowErr, ColErr>>;

/// 4x4 matrix scanner.
///
/// Rows are driven low one at a time and columns are read with pull-ups, so
/// a pressed key reads low. Only one key is reported at a time; the first hit
/// in scan order wins.
#[derive(Debug)]
pub struct KeypadInput<ROW, COL> {
    rows: [ROW; KEYPAD_ROWS],
    cols: [COL; KEYPAD_COLS],
    config: KeypadConfig,
    raw: Option<Key>,
    stable: Option<Key>,
    stable_count: u8,
}

impl<ROW, COL> KeypadInput<ROW, COL>
where
    ROW: OutputPin,
    COL: InputPin,
{
    pub fn new(
        mut rows: [ROW; KEYPAD_ROWS],
        cols: [COL; KEYPAD_COLS],
        config: KeypadConfig,
    ) -> KeypadResult<ROW::Error, COL::Error, Self> {
        for row in rows.iter_mut() {
            row.set_high().map_err(KeypadError::Row)?;
        }

        Ok(Self {
            rows,
            cols,
            config,
            raw: None,
            stable: None,
            stable_count: 0,
        })
    }

    fn scan(&mut self) -> KeypadResult<ROW::Error, COL::Error, Option<Key>> {
        let mut hit = None;

        for (r, row) in self.rows.iter_mut().enumerate() {
            row.set_low().map_err(KeypadError::Row)?;
            for (c, col) in self.cols.iter_mut().enumerate() {
                if hit.is_none() && col.is_low().map_err(KeypadError::Col)? {
                    hit = Some(LAYOUT[r][c]);
                }
            }
            row.set_high().map_err(KeypadError::Row)?;
        }

        Ok(hit)
    }
}

impl<ROW, COL> InputProvider for KeypadInput<ROW, COL>
where
    ROW: OutputPin,
    COL: InputPin,
{
    type Error = KeypadError<ROW::Error, COL::Error>;

    fn poll_event(&mut self) -> Result<Option<InputEvent>, Self::Error> {
        let key = self.scan()?;

        if key == self.raw {
            self.stable_count = self.stable_count.saturating_add(1);
        } else {
            self.raw = key;
            self.stable_count = 0;
        }

        let threshold = self.config.debounce_scans.max(1);
        if self.stable_count >= threshold && self.stable != self.raw {
            self.stable = self.raw;
            // Key-down only; releases carry no meaning for the apps.
            if let Some(key) = self.stable {
                return Ok(Some(InputEvent::Key(key)));
            }
        }

        Ok(None)
    }
}
