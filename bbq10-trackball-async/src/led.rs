//! Trackball backlight.
//!
//! The 303TRACKBA1 has a red, a green, a blue and a white LED, each sunk by
//! an active-low line.

use embedded_hal::digital::OutputPin;

/// Backlight colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Color {
    /// Red only.
    Red,
    /// Green only.
    Green,
    /// Blue only.
    Blue,
    /// White only.
    White,
    /// Every LED on.
    All,
    /// Backlight off.
    Off,
}

impl Color {
    /// LED states as `[blue, red, green, white]`, `true` = lit.
    const fn lit(self) -> [bool; 4] {
        match self {
            Self::Red => [false, true, false, false],
            Self::Green => [false, false, true, false],
            Self::Blue => [true, false, false, false],
            Self::White => [false, false, false, true],
            Self::All => [true, true, true, true],
            Self::Off => [false, false, false, false],
        }
    }
}

/// The four backlight LED lines.
pub struct TrackballLed<P> {
    /// Lines in `[blue, red, green, white]` order.
    pins: [P; 4],
    color: Color,
}

impl<P: OutputPin> TrackballLed<P> {
    /// Creates a new `TrackballLed`.
    ///
    /// # Arguments
    ///
    /// * `blue`, `red`, `green`, `white` - The active-low LED lines.
    pub fn new(blue: P, red: P, green: P, white: P) -> Self {
        Self {
            pins: [blue, red, green, white],
            color: Color::Off,
        }
    }

    /// The colour last set.
    pub fn color(&self) -> Color {
        self.color
    }

    /// Switches the backlight to `color`.
    pub fn set(&mut self, color: Color) -> Result<(), P::Error> {
        for (pin, lit) in self.pins.iter_mut().zip(color.lit()) {
            if lit {
                pin.set_low()?;
            } else {
                pin.set_high()?;
            }
        }
        self.color = color;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use core::cell::Cell;
    use core::convert::Infallible;

    use embedded_hal::digital::ErrorType;

    use super::*;

    struct Line<'a>(&'a Cell<bool>);

    impl ErrorType for Line<'_> {
        type Error = Infallible;
    }

    impl OutputPin for Line<'_> {
        fn set_low(&mut self) -> Result<(), Self::Error> {
            self.0.set(false);
            Ok(())
        }

        fn set_high(&mut self) -> Result<(), Self::Error> {
            self.0.set(true);
            Ok(())
        }
    }

    #[test]
    fn colors_drive_active_low_lines() {
        let levels: [Cell<bool>; 4] = Default::default();
        let [blue, red, green, white] = &levels;
        let mut led = TrackballLed::new(Line(blue), Line(red), Line(green), Line(white));
        let high = || levels.each_ref().map(|level| level.get());

        led.set(Color::All).unwrap();
        assert_eq!(high(), [false, false, false, false]);

        led.set(Color::Red).unwrap();
        assert_eq!(high(), [true, false, true, true]);

        led.set(Color::White).unwrap();
        assert_eq!(high(), [true, true, true, false]);

        led.set(Color::Off).unwrap();
        assert_eq!(high(), [true, true, true, true]);
        assert_eq!(led.color(), Color::Off);
    }
}
