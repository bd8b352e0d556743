//! Status indicator
//!
//! One LED reflecting coarse device state: either a scalar output (with
//! optional inverted polarity) or a 3-color pixel. The connectivity state
//! machine owns the blink period; the RGB variant additionally supports a
//! "breathing" brightness modulation from a 48-step half-sine table.

use crate::platform::traits::{GpioInterface, PixelInterface};
use crate::platform::Result;
use rgb::RGB8;

/// Steps in the breathing table
pub const BREATHE_STEPS: usize = 48;

/// Half-sine brightness table, one full breath per sweep
static BREATHE_TABLE: [u8; BREATHE_STEPS] = [
    0, 17, 34, 51, 67, 84, 100, 115, 130, 144, 158, 171, 183, 195, 205, 215, 224, 231, 238, 244,
    248, 251, 254, 255, 255, 254, 251, 248, 244, 238, 231, 224, 215, 205, 195, 183, 171, 158, 144,
    130, 115, 100, 84, 67, 51, 34, 17, 0,
];

/// Placeholder pixel for scalar-only builds
pub struct NoPixel;

impl PixelInterface for NoPixel {
    fn write(&mut self, _color: RGB8) -> Result<()> {
        Ok(())
    }
}

/// Placeholder output for RGB-only builds
pub struct NoGpio;

impl GpioInterface for NoGpio {
    fn set_high(&mut self) {}
    fn set_low(&mut self) {}
    fn is_set_high(&self) -> bool {
        false
    }
}

enum Driver<G, P> {
    Scalar { pin: G, inverted: bool },
    Rgb { pixel: P, last: Option<RGB8> },
}

/// Scalar or RGB status LED
pub struct StatusLed<G: GpioInterface, P: PixelInterface> {
    driver: Driver<G, P>,
    color: RGB8,
    on: bool,
    blink_ms: u32,
    breathe_step_ms: u32,
}

impl<G: GpioInterface> StatusLed<G, NoPixel> {
    /// Scalar LED on `pin`; `inverted` when the LED is active-low
    pub fn scalar(pin: G, inverted: bool) -> Self {
        Self::with_driver(Driver::Scalar { pin, inverted })
    }
}

impl<P: PixelInterface> StatusLed<NoGpio, P> {
    /// RGB LED behind a one-wire pixel
    pub fn rgb(pixel: P) -> Self {
        Self::with_driver(Driver::Rgb { pixel, last: None })
    }
}

impl<G: GpioInterface, P: PixelInterface> StatusLed<G, P> {
    fn with_driver(driver: Driver<G, P>) -> Self {
        Self {
            driver,
            color: RGB8::new(0, 255, 0),
            on: false,
            blink_ms: 0,
            breathe_step_ms: 0,
        }
    }

    /// Apply the initial (off) state to the hardware
    pub fn begin(&mut self) {
        self.on = false;
        self.apply(false, 255);
    }

    /// Turn the LED on (steady unless a blink period is set)
    pub fn set_on(&mut self) {
        self.on = true;
    }

    /// Turn the LED off
    pub fn set_off(&mut self) {
        self.on = false;
    }

    /// Flip the logical state
    pub fn toggle(&mut self) {
        self.on = !self.on;
    }

    /// Whether the LED is logically on
    pub fn is_on(&self) -> bool {
        self.on
    }

    /// Set the RGB color (ignored by the scalar variant)
    pub fn set_color(&mut self, color: RGB8) {
        self.color = color;
    }

    /// Blink with the given full period; 0 disables blinking
    pub fn set_blink_ms(&mut self, period_ms: u32) {
        self.blink_ms = period_ms;
    }

    /// Breathe with the given per-step interval; 0 disables breathing
    pub fn set_breathe(&mut self, step_ms: u32) {
        self.breathe_step_ms = step_ms;
    }

    /// Drive the hardware; call once per tick
    pub fn tick(&mut self, now_ms: u64) {
        let mut lit = self.on;
        if lit && self.blink_ms > 0 {
            let half = (self.blink_ms / 2).max(1) as u64;
            lit = (now_ms / half) % 2 == 0;
        }
        let brightness = if self.breathe_step_ms > 0 {
            BREATHE_TABLE[(now_ms / self.breathe_step_ms as u64) as usize % BREATHE_STEPS]
        } else {
            255
        };
        self.apply(lit, brightness);
    }

    fn apply(&mut self, lit: bool, brightness: u8) {
        match &mut self.driver {
            Driver::Scalar { pin, inverted } => {
                let level = lit != *inverted;
                if level {
                    pin.set_high();
                } else {
                    pin.set_low();
                }
            }
            Driver::Rgb { pixel, last } => {
                let color = if lit {
                    scale(self.color, brightness)
                } else {
                    RGB8::new(0, 0, 0)
                };
                if *last != Some(color) {
                    let _ = pixel.write(color);
                    *last = Some(color);
                }
            }
        }
    }
}

fn scale(color: RGB8, brightness: u8) -> RGB8 {
    let s = brightness as u16;
    RGB8::new(
        ((color.r as u16 * s) / 255) as u8,
        ((color.g as u16 * s) / 255) as u8,
        ((color.b as u16 * s) / 255) as u8,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::mock::{MockGpio, MockPixel};

    #[test]
    fn scalar_blinks_at_the_requested_period() {
        let mut led = StatusLed::scalar(MockGpio::new(), false);
        led.set_on();
        led.set_blink_ms(1000);

        led.tick(0);
        led.tick(250);
        led.tick(500);
        led.tick(750);
        led.tick(1000);

        let Driver::Scalar { pin, .. } = &led.driver else {
            unreachable!()
        };
        assert_eq!(pin.transitions, [true, true, false, false, true]);
    }

    #[test]
    fn inverted_polarity_drives_low_when_on() {
        let mut led = StatusLed::scalar(MockGpio::new(), true);
        led.set_on();
        led.tick(0);
        let Driver::Scalar { pin, .. } = &led.driver else {
            unreachable!()
        };
        assert!(!pin.is_set_high());
    }

    #[test]
    fn rgb_breathing_sweeps_brightness() {
        let mut led = StatusLed::rgb(MockPixel::new());
        led.set_color(RGB8::new(255, 0, 0));
        led.set_on();
        led.set_breathe(10);

        led.tick(0); // table[0] = 0
        led.tick(230); // table[23] = 255
        let Driver::Rgb { pixel, .. } = &led.driver else {
            unreachable!()
        };
        assert_eq!(pixel.writes[0], RGB8::new(0, 0, 0));
        assert_eq!(pixel.writes[1], RGB8::new(255, 0, 0));
    }

    #[test]
    fn rgb_skips_redundant_writes() {
        let mut led = StatusLed::rgb(MockPixel::new());
        led.set_on();
        led.tick(0);
        led.tick(1);
        led.tick(2);
        let Driver::Rgb { pixel, .. } = &led.driver else {
            unreachable!()
        };
        assert_eq!(pixel.writes.len(), 1);
    }
}
