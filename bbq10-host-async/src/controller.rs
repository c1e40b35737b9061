//! Reader tasks that turn register reads into input events.

use core::fmt::{self, Debug};

use bbq10_protocol::{
    PayloadError, RegisterSelect, TrackballPayload, KEYBOARD_REGISTER_LEN, SLAVE_ADDRESS,
    TRACKBALL_REGISTER_LEN,
};
use embassy_time::Duration;
use embedded_hal_async::delay::DelayNs;
use embedded_hal_async::digital::Wait;
use embedded_hal_async::i2c::{I2c, SevenBitAddress};

use crate::decoder::{decode_keyboard, decode_trackball, KeyboardEvent, MotionSteps};
use crate::keycode::{Button, KeyCode, KeyStroke, RelAxis};

/// The OS input layer.
pub trait InputSink {
    /// Reports a key going down or up.
    fn report_key(&mut self, key: KeyCode, pressed: bool);

    /// Reports a pointer button going down or up.
    fn report_button(&mut self, button: Button, pressed: bool);

    /// Reports relative motion on one axis.
    fn report_rel(&mut self, axis: RelAxis, value: i32);

    /// Ends a group of reports.
    fn sync(&mut self);
}

/// Host side tuning.
#[derive(Debug, Clone, Copy)]
pub struct HostConfig {
    /// 7-bit address of the bridge.
    pub address: u8,
    /// How long a tapped key or button is held down.
    pub press_duration: Duration,
    /// Pause after each motion step.
    pub step_delay: Duration,
}

impl HostConfig {
    /// Address `0x52`, 9 ms key presses, 300 µs between motion steps.
    pub const DEFAULT: Self = Self {
        address: SLAVE_ADDRESS,
        press_duration: Duration::from_millis(9),
        step_delay: Duration::from_micros(300),
    };
}

impl Default for HostConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Errors of the reader tasks.
pub enum HostError<TI2CERR, TPINERR> {
    /// The register read failed.
    Bus(TI2CERR),
    /// Waiting for the data-ready line failed.
    Pin(TPINERR),
    /// The keyboard register held a character with no key.
    UnknownCharacter(u8),
    /// The trackball register read was malformed.
    Payload(PayloadError),
}

impl<TI2CERR: Debug, TPINERR: Debug> Debug for HostError<TI2CERR, TPINERR> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bus(err) => write!(f, "Bus({err:?})"),
            Self::Pin(err) => write!(f, "Pin({err:?})"),
            Self::UnknownCharacter(ch) => write!(f, "UnknownCharacter({ch:#04x})"),
            Self::Payload(err) => write!(f, "Payload({err:?})"),
        }
    }
}

impl<TI2CERR, TPINERR> From<PayloadError> for HostError<TI2CERR, TPINERR> {
    fn from(err: PayloadError) -> Self {
        Self::Payload(err)
    }
}

fn as_micros(duration: Duration) -> u32 {
    u32::try_from(duration.as_micros()).unwrap_or(u32::MAX)
}

/// Reads the keyboard register on every rising edge of its ready line and
/// taps the matching key.
pub struct KeyboardReader<I2C, IRQ, D, S> {
    i2c: I2C,
    irq: IRQ,
    delay: D,
    sink: S,
    config: HostConfig,
}

impl<I2C, IRQ, D, S> KeyboardReader<I2C, IRQ, D, S>
where
    I2C: I2c<SevenBitAddress>,
    IRQ: Wait,
    D: DelayNs,
    S: InputSink,
{
    /// Creates a new `KeyboardReader`.
    ///
    /// # Arguments
    ///
    /// * `i2c` - The bus the bridge sits on.
    /// * `irq` - The keyboard data-ready line.
    /// * `delay` - Delay used to hold keys down.
    /// * `sink` - Where key events go.
    /// * `config` - Timing and address.
    pub fn new(i2c: I2C, irq: IRQ, delay: D, sink: S, config: HostConfig) -> Self {
        Self {
            i2c,
            irq,
            delay,
            sink,
            config,
        }
    }

    /// The event sink.
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Reads the keyboard register.
    pub async fn read(&mut self) -> Result<u8, HostError<I2C::Error, IRQ::Error>> {
        let mut value = [0u8; KEYBOARD_REGISTER_LEN];
        self.i2c
            .write_read(
                self.config.address,
                &[RegisterSelect::Keyboard.into()],
                &mut value,
            )
            .await
            .map_err(HostError::Bus)?;
        Ok(value[0])
    }

    /// Taps the key for `value`.
    pub async fn emit(
        &mut self,
        value: u8,
    ) -> Result<KeyStroke, HostError<I2C::Error, IRQ::Error>> {
        let stroke = match decode_keyboard(value) {
            KeyboardEvent::Stroke(stroke) => stroke,
            KeyboardEvent::Unknown(ch) => return Err(HostError::UnknownCharacter(ch)),
        };
        log::debug!("key {value:#04x} -> {stroke:?}");

        if stroke.shift {
            self.sink.report_key(KeyCode::LeftShift, true);
            self.sink.sync();
        }

        self.sink.report_key(stroke.code, true);
        self.sink.sync();
        self.delay.delay_us(as_micros(self.config.press_duration)).await;
        self.sink.report_key(stroke.code, false);
        self.sink.sync();

        if stroke.shift {
            self.sink.report_key(KeyCode::LeftShift, false);
            self.sink.sync();
        }

        Ok(stroke)
    }

    /// Waits for the next data-ready edge, reads the key and taps it.
    pub async fn next(&mut self) -> Result<KeyStroke, HostError<I2C::Error, IRQ::Error>> {
        self.irq.wait_for_rising_edge().await.map_err(HostError::Pin)?;
        let value = self.read().await?;
        self.emit(value).await
    }

    /// Serves key events forever, logging and dropping failures.
    pub async fn run(&mut self) -> ! {
        loop {
            if let Err(err) = self.next().await {
                log::error!("Dropping key: {err:?}");
            }
        }
    }
}

/// Reads the trackball register on every rising edge of its ready line and
/// replays it as pointer events.
pub struct TrackballReader<I2C, IRQ, D, S> {
    i2c: I2C,
    irq: IRQ,
    delay: D,
    sink: S,
    config: HostConfig,
}

impl<I2C, IRQ, D, S> TrackballReader<I2C, IRQ, D, S>
where
    I2C: I2c<SevenBitAddress>,
    IRQ: Wait,
    D: DelayNs,
    S: InputSink,
{
    /// Creates a new `TrackballReader`.
    ///
    /// # Arguments
    ///
    /// * `i2c` - The bus the bridge sits on.
    /// * `irq` - The trackball data-ready line.
    /// * `delay` - Delay used for clicks and between motion steps.
    /// * `sink` - Where pointer events go.
    /// * `config` - Timing and address.
    pub fn new(i2c: I2C, irq: IRQ, delay: D, sink: S, config: HostConfig) -> Self {
        Self {
            i2c,
            irq,
            delay,
            sink,
            config,
        }
    }

    /// The event sink.
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Reads the trackball register.
    pub async fn read(
        &mut self,
    ) -> Result<[u8; TRACKBALL_REGISTER_LEN], HostError<I2C::Error, IRQ::Error>> {
        let mut value = [0u8; TRACKBALL_REGISTER_LEN];
        self.i2c
            .write_read(
                self.config.address,
                &[RegisterSelect::Trackball.into()],
                &mut value,
            )
            .await
            .map_err(HostError::Bus)?;
        Ok(value)
    }

    /// Decodes `bytes` and replays them.
    pub async fn emit(
        &mut self,
        bytes: &[u8],
    ) -> Result<TrackballPayload, HostError<I2C::Error, IRQ::Error>> {
        let payload = decode_trackball(bytes)?;

        match payload {
            TrackballPayload::Click => {
                log::debug!("trackball click");
                self.sink.report_button(Button::Left, true);
                self.sink.sync();
                self.delay.delay_us(as_micros(self.config.press_duration)).await;
                self.sink.report_button(Button::Left, false);
                self.sink.sync();
            }
            TrackballPayload::Motion { dx, dy } => {
                log::trace!("trackball motion ({dx}, {dy})");
                let step_delay = as_micros(self.config.step_delay);
                for step in MotionSteps::new(dx, dy) {
                    self.sink.report_rel(RelAxis::X, i32::from(step.x));
                    self.sink.report_rel(RelAxis::Y, i32::from(step.y));
                    self.sink.sync();
                    self.delay.delay_us(step_delay).await;
                }
            }
        }

        Ok(payload)
    }

    /// Waits for the next data-ready edge, reads the register and replays it.
    pub async fn next(&mut self) -> Result<TrackballPayload, HostError<I2C::Error, IRQ::Error>> {
        self.irq.wait_for_rising_edge().await.map_err(HostError::Pin)?;
        let bytes = self.read().await?;
        self.emit(&bytes).await
    }

    /// Serves pointer events forever, logging and dropping failures.
    pub async fn run(&mut self) -> ! {
        loop {
            if let Err(err) = self.next().await {
                log::error!("Dropping trackball report: {err:?}");
            }
        }
    }
}
