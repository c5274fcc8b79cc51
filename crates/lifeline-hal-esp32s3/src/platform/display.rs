use embedded_graphics::{
    Pixel,
    pixelcolor::{IntoStorage, Rgb565},
    prelude::*,
    primitives::{PointsIter, Rectangle},
};
use embedded_hal::{delay::DelayNs, digital::OutputPin};

pub const WIDTH: u16 = 320;
pub const HEIGHT: u16 = 480;

const CMD_SOFT_RESET: u8 = 0x01;
const CMD_SLEEP_OUT: u8 = 0x11;
const CMD_DISPLAY_ON: u8 = 0x29;
const CMD_COLUMN_ADDR: u8 = 0x2A;
const CMD_PAGE_ADDR: u8 = 0x2B;
const CMD_MEMORY_WRITE: u8 = 0x2C;
const CMD_MEMORY_ACCESS: u8 = 0x36;
const CMD_PIXEL_FORMAT: u8 = 0x3A;

const PIXEL_FORMAT_16BPP: u8 = 0x55;
// Portrait, BGR panel order.
const MEMORY_ACCESS_PORTRAIT: u8 = 0x48;

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum DisplayError<DataErr, WrErr, DcErr, CsErr, RstErr> {
    Data(DataErr),
    Wr(WrErr),
    Dc(DcErr),
    Cs(CsErr),
    Rst(RstErr),
}

pub type Ili9488Error<DATA, WR, DC, CS, RST> = DisplayError<
    <DATA as embedded_hal::digital::ErrorType>::Error,
    <WR as embedded_hal::digital::ErrorType>::Error,
    <DC as embedded_hal::digital::ErrorType>::Error,
    <CS as embedded_hal::digital::ErrorType>::Error,
    <RST as embedded_hal::digital::ErrorType>::Error,
>;

/// ILI9488 on an 8080-style 8-bit parallel bus, bit-banged over GPIO.
///
/// RD is expected to be tied high; the panel is never read back.
#[derive(Debug)]
pub struct Ili9488<DATA, WR, DC, CS, RST> {
    data: [DATA; 8],
    wr: WR,
    dc: DC,
    cs: CS,
    rst: RST,
}

impl<DATA, WR, DC, CS, RST> Ili9488<DATA, WR, DC, CS, RST>
where
    DATA: OutputPin,
    WR: OutputPin,
    DC: OutputPin,
    CS: OutputPin,
    RST: OutputPin,
{
    /// `data[0]` is D0.
    pub fn new(data: [DATA; 8], wr: WR, dc: DC, cs: CS, rst: RST) -> Self {
        Self {
            data,
            wr,
            dc,
            cs,
            rst,
        }
    }

    /// Hardware reset followed by the 16-bit portrait init sequence.
    pub fn initialize<D>(
        &mut self,
        delay: &mut D,
    ) -> Result<(), Ili9488Error<DATA, WR, DC, CS, RST>>
    where
        D: DelayNs,
    {
        self.cs.set_high().map_err(DisplayError::Cs)?;
        self.wr.set_high().map_err(DisplayError::Wr)?;

        self.rst.set_high().map_err(DisplayError::Rst)?;
        delay.delay_ms(50);
        self.rst.set_low().map_err(DisplayError::Rst)?;
        delay.delay_ms(150);
        self.rst.set_high().map_err(DisplayError::Rst)?;
        delay.delay_ms(150);

        self.command(CMD_SOFT_RESET, &[])?;
        delay.delay_ms(150);
        self.command(CMD_SLEEP_OUT, &[])?;
        delay.delay_ms(150);
        self.command(CMD_PIXEL_FORMAT, &[PIXEL_FORMAT_16BPP])?;
        self.command(CMD_MEMORY_ACCESS, &[MEMORY_ACCESS_PORTRAIT])?;
        self.command(CMD_DISPLAY_ON, &[])?;
        delay.delay_ms(50);

        Ok(())
    }

    fn command(
        &mut self,
        cmd: u8,
        params: &[u8],
    ) -> Result<(), Ili9488Error<DATA, WR, DC, CS, RST>> {
        self.cs.set_low().map_err(DisplayError::Cs)?;
        self.dc.set_low().map_err(DisplayError::Dc)?;
        self.write_byte(cmd)?;
        self.dc.set_high().map_err(DisplayError::Dc)?;
        for byte in params {
            self.write_byte(*byte)?;
        }
        self.cs.set_high().map_err(DisplayError::Cs)
    }

    fn write_byte(&mut self, byte: u8) -> Result<(), Ili9488Error<DATA, WR, DC, CS, RST>> {
        for (bit, pin) in self.data.iter_mut().enumerate() {
            if (byte >> bit) & 0x01 != 0 {
                pin.set_high().map_err(DisplayError::Data)?;
            } else {
                pin.set_low().map_err(DisplayError::Data)?;
            }
        }
        self.wr.set_low().map_err(DisplayError::Wr)?;
        self.wr.set_high().map_err(DisplayError::Wr)
    }

    fn set_window(
        &mut self,
        x0: u16,
        y0: u16,
        x1: u16,
        y1: u16,
    ) -> Result<(), Ili9488Error<DATA, WR, DC, CS, RST>> {
        let [x0h, x0l] = x0.to_be_bytes();
        let [x1h, x1l] = x1.to_be_bytes();
        let [y0h, y0l] = y0.to_be_bytes();
        let [y1h, y1l] = y1.to_be_bytes();
        self.command(CMD_COLUMN_ADDR, &[x0h, x0l, x1h, x1l])?;
        self.command(CMD_PAGE_ADDR, &[y0h, y0l, y1h, y1l])
    }

    /// Streams `colors` into the window opened by `set_window`.
    fn write_pixels<I>(&mut self, colors: I) -> Result<(), Ili9488Error<DATA, WR, DC, CS, RST>>
    where
        I: IntoIterator<Item = Rgb565>,
    {
        self.cs.set_low().map_err(DisplayError::Cs)?;
        self.dc.set_low().map_err(DisplayError::Dc)?;
        self.write_byte(CMD_MEMORY_WRITE)?;
        self.dc.set_high().map_err(DisplayError::Dc)?;
        for color in colors {
            let [hi, lo] = color.into_storage().to_be_bytes();
            self.write_byte(hi)?;
            self.write_byte(lo)?;
        }
        self.cs.set_high().map_err(DisplayError::Cs)
    }

    /// Visible part of `area`, as inclusive panel coordinates.
    fn clip(&self, area: &Rectangle) -> Option<(u16, u16, u16, u16)> {
        let area = area.intersection(&self.bounding_box());
        let bottom_right = area.bottom_right()?;
        Some((
            area.top_left.x as u16,
            area.top_left.y as u16,
            bottom_right.x as u16,
            bottom_right.y as u16,
        ))
    }
}

impl<DATA, WR, DC, CS, RST> OriginDimensions for Ili9488<DATA, WR, DC, CS, RST> {
    fn size(&self) -> Size {
        Size::new(WIDTH as u32, HEIGHT as u32)
    }
}

impl<DATA, WR, DC, CS, RST> DrawTarget for Ili9488<DATA, WR, DC, CS, RST>
where
    DATA: OutputPin,
    WR: OutputPin,
    DC: OutputPin,
    CS: OutputPin,
    RST: OutputPin,
{
    type Color = Rgb565;
    type Error = Ili9488Error<DATA, WR, DC, CS, RST>;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, color) in pixels {
            if point.x < 0 || point.y < 0 || point.x >= WIDTH as i32 || point.y >= HEIGHT as i32 {
                continue;
            }
            let (x, y) = (point.x as u16, point.y as u16);
            self.set_window(x, y, x, y)?;
            self.write_pixels(core::iter::once(color))?;
        }
        Ok(())
    }

    fn fill_contiguous<I>(&mut self, area: &Rectangle, colors: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Self::Color>,
    {
        let drawable = area.intersection(&self.bounding_box());
        if drawable != *area {
            // Partially off-screen: fall back to per-pixel clipping.
            return self.draw_iter(
                area.points()
                    .zip(colors)
                    .map(|(point, color)| Pixel(point, color)),
            );
        }

        let Some((x0, y0, x1, y1)) = self.clip(area) else {
            return Ok(());
        };
        self.set_window(x0, y0, x1, y1)?;
        let count = area.size.width as usize * area.size.height as usize;
        self.write_pixels(colors.into_iter().take(count))
    }

    fn fill_solid(&mut self, area: &Rectangle, color: Self::Color) -> Result<(), Self::Error> {
        let Some((x0, y0, x1, y1)) = self.clip(area) else {
            return Ok(());
        };
        let count = (x1 - x0 + 1) as usize * (y1 - y0 + 1) as usize;
        self.set_window(x0, y0, x1, y1)?;
        self.write_pixels(core::iter::repeat_n(color, count))
    }

    fn clear(&mut self, color: Self::Color) -> Result<(), Self::Error> {
        let area = self.bounding_box();
        self.fill_solid(&area, color)
    }
}
