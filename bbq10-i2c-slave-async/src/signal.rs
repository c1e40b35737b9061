//! Data-ready notification lines.
//!
//! Each register has its own line to the host. After publishing a value the
//! firmware pulses the line high; the host reads on the rising edge.

use embedded_hal::digital::OutputPin;
use embedded_hal_async::delay::DelayNs;

/// Default pulse width in microseconds.
pub const DEFAULT_PULSE_US: u32 = 1_000;

/// Drives one data-ready line.
pub struct ReadySignal<P, D> {
    pin: P,
    delay: D,
    pulse_us: u32,
}

impl<P, D> ReadySignal<P, D>
where
    P: OutputPin,
    D: DelayNs,
{
    /// Creates a new `ReadySignal` with the default 1 ms pulse.
    pub fn new(pin: P, delay: D) -> Self {
        Self::with_pulse_width(pin, delay, DEFAULT_PULSE_US)
    }

    /// Creates a new `ReadySignal` with a custom pulse width.
    pub fn with_pulse_width(pin: P, delay: D, pulse_us: u32) -> Self {
        Self {
            pin,
            delay,
            pulse_us,
        }
    }

    /// Drives the line to its idle (low) level.
    pub fn init(&mut self) -> Result<(), P::Error> {
        self.pin.set_low()
    }

    /// Emits one rising edge followed by the return to idle.
    pub async fn pulse(&mut self) -> Result<(), P::Error> {
        self.pin.set_high()?;
        self.delay.delay_us(self.pulse_us).await;
        self.pin.set_low()
    }
}
