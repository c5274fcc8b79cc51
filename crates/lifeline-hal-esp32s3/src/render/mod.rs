pub mod screens;

use embedded_graphics::{draw_target::DrawTarget, pixelcolor::Rgb565};
use lifeline_core::render::Screen;

pub trait FrameRenderer {
    fn render<D>(&mut self, screen: Screen<'_>, target: &mut D) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = Rgb565>;
}
