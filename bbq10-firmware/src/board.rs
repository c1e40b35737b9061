//! Pin assignment of the bridge board.
//!
//! | Signal                       | GPIO                         |
//! |------------------------------|------------------------------|
//! | matrix rows 0..7 (inputs)    | 1, 2, 4, 5, 6, 7, 15         |
//! | matrix columns 0..5 (outputs)| 16, 17, 18, 8, 9             |
//! | trackball up/down/left/right | 10, 11, 12, 13               |
//! | trackball button             | 14                           |
//! | LED blue/red/green/white     | 21, 38, 39, 40               |
//! | keyboard / trackball ready   | 41, 42                       |
//! | I2C SDA / SCL                | 47, 48                       |

use bbq10_keyboard_async::matrix::{COLS, ROWS};
use esp_hal::{
    gpio::{Input, InputConfig, Level, Output, OutputConfig, Pull},
    i2c::master::{Config, ConfigError, I2c},
    peripherals::Peripherals,
    time::Rate,
    Blocking,
};

/// Trackball direction inputs.
pub struct TrackballPins {
    /// Pulses when the ball rolls up.
    pub up: Input<'static>,
    /// Pulses when the ball rolls down.
    pub down: Input<'static>,
    /// Pulses when the ball rolls left.
    pub left: Input<'static>,
    /// Pulses when the ball rolls right.
    pub right: Input<'static>,
    /// The ball's push button, active-low.
    pub button: Input<'static>,
}

/// Everything the firmware drives.
pub struct Board {
    /// Matrix rows with pull-ups.
    pub rows: [Input<'static>; ROWS],
    /// Matrix columns, idle high.
    pub cols: [Output<'static>; COLS],
    /// Trackball sensors.
    pub trackball: TrackballPins,
    /// Backlight lines in `[blue, red, green, white]` order, idle off.
    pub leds: [Output<'static>; 4],
    /// Keyboard data-ready line.
    pub keyboard_ready: Output<'static>,
    /// Trackball data-ready line.
    pub trackball_ready: Output<'static>,
    /// I2C0, routed to the bus pins. Switched to slave mode by
    /// [`crate::slave`].
    pub i2c: I2c<'static, Blocking>,
}

impl Board {
    /// Claims and configures the pins.
    pub fn new(p: Peripherals) -> Result<Self, ConfigError> {
        let pull_up = InputConfig::default().with_pull(Pull::Up);

        let rows = [
            Input::new(p.GPIO1, pull_up),
            Input::new(p.GPIO2, pull_up),
            Input::new(p.GPIO4, pull_up),
            Input::new(p.GPIO5, pull_up),
            Input::new(p.GPIO6, pull_up),
            Input::new(p.GPIO7, pull_up),
            Input::new(p.GPIO15, pull_up),
        ];
        let cols = [
            Output::new(p.GPIO16, Level::High, OutputConfig::default()),
            Output::new(p.GPIO17, Level::High, OutputConfig::default()),
            Output::new(p.GPIO18, Level::High, OutputConfig::default()),
            Output::new(p.GPIO8, Level::High, OutputConfig::default()),
            Output::new(p.GPIO9, Level::High, OutputConfig::default()),
        ];

        let trackball = TrackballPins {
            up: Input::new(p.GPIO10, pull_up),
            down: Input::new(p.GPIO11, pull_up),
            left: Input::new(p.GPIO12, pull_up),
            right: Input::new(p.GPIO13, pull_up),
            button: Input::new(p.GPIO14, pull_up),
        };

        let leds = [
            Output::new(p.GPIO21, Level::High, OutputConfig::default()),
            Output::new(p.GPIO38, Level::High, OutputConfig::default()),
            Output::new(p.GPIO39, Level::High, OutputConfig::default()),
            Output::new(p.GPIO40, Level::High, OutputConfig::default()),
        ];

        let keyboard_ready = Output::new(p.GPIO41, Level::Low, OutputConfig::default());
        let trackball_ready = Output::new(p.GPIO42, Level::Low, OutputConfig::default());

        let config = Config::default().with_frequency(Rate::from_khz(100));
        let i2c = I2c::new(p.I2C0, config)?
            .with_sda(p.GPIO47)
            .with_scl(p.GPIO48);

        Ok(Self {
            rows,
            cols,
            trackball,
            leds,
            keyboard_ready,
            trackball_ready,
            i2c,
        })
    }
}
