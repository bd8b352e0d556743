//! One-wire RGB pixel interface, used by the RGB status LED

use crate::platform::Result;
use rgb::RGB8;

/// Single addressable RGB pixel (WS2812-class)
pub trait PixelInterface {
    /// Latch one color onto the pixel.
    fn write(&mut self, color: RGB8) -> Result<()>;
}
