//! Core implementation of the BBQ10 keyboard scanner.
//!
//! [`KeyboardScanner`] holds the scan state machine and does no I/O, so it can
//! be fed samples from anywhere. [`Keyboard`] couples it with a [`Matrix`].

use embassy_time::{Duration, Instant};
use embedded_hal::digital::{InputPin, OutputPin};
use embedded_hal_async::delay::DelayNs;

use crate::keymap::{self, Key, ALT_CELL, LEFT_SHIFT_CELL, RIGHT_SHIFT_CELL, SYM_CELL};
use crate::matrix::{KeyMatrixState, Matrix, MatrixError, COLS, ROWS};

/// Tuning parameters of the scanner.
#[derive(Debug, Clone, Copy)]
pub struct ScanConfig {
    /// Time a column is held low before the rows are read, in microseconds.
    pub settle_delay_us: u32,
    /// Number of scans a key must stay held before a repeat is produced.
    pub hold_threshold: u8,
    /// Minimum time between two caps lock toggles.
    pub caps_lock_debounce: Duration,
}

impl ScanConfig {
    /// The values used on the BBQ10 board: 1 ms settle time, repeat after
    /// 50 scans, 500 ms caps lock debounce.
    pub const DEFAULT: Self = Self {
        settle_delay_us: 1_000,
        hold_threshold: 50,
        caps_lock_debounce: Duration::from_millis(500),
    };
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Modifier state.
///
/// `alt`, `left_shift` and `right_shift` are latched while their key is held
/// and cleared once a character has been resolved. `caps_lock` is sticky.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    /// Alt layer requested.
    pub alt: bool,
    /// Left Shift latched.
    pub left_shift: bool,
    /// Right Shift latched.
    pub right_shift: bool,
    /// Caps lock active.
    pub caps_lock: bool,
}

impl Modifiers {
    /// Returns `true` if letters should be upper-case.
    pub fn is_upper_case(&self) -> bool {
        self.left_shift || self.right_shift || self.caps_lock
    }

    fn clear_latches(&mut self) {
        self.alt = false;
        self.left_shift = false;
        self.right_shift = false;
    }
}

/// Outcome of a single scan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanReport {
    /// A character key changed state, or a held key is due for a repeat.
    pub changed: bool,
    /// The change was produced by press-and-hold.
    pub repeat: bool,
}

/// A resolved key press, ready to be published.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    /// ASCII character of the key.
    pub key: u8,
    /// `true` if this is an auto-repeat of a held key.
    pub repeat: bool,
}

/// Debounce, hold and modifier state machine of the keyboard.
#[derive(Debug, Clone)]
pub struct KeyboardScanner {
    config: ScanConfig,
    state: KeyMatrixState,
    modifiers: Modifiers,
    hold_counter: u16,
    report: ScanReport,
    last_caps_toggle: Option<Instant>,
}

impl KeyboardScanner {
    /// Creates a scanner with every key released.
    pub const fn new(config: ScanConfig) -> Self {
        Self {
            config,
            state: KeyMatrixState::new(),
            modifiers: Modifiers {
                alt: false,
                left_shift: false,
                right_shift: false,
                caps_lock: false,
            },
            hold_counter: 0,
            report: ScanReport {
                changed: false,
                repeat: false,
            },
            last_caps_toggle: None,
        }
    }

    /// The most recent matrix sample.
    pub fn state(&self) -> &KeyMatrixState {
        &self.state
    }

    /// Current modifier state.
    pub fn modifiers(&self) -> Modifiers {
        self.modifiers
    }

    /// Returns `true` if the last scan asked for a key to be resolved.
    pub fn is_key_changed(&self) -> bool {
        self.report.changed
    }

    /// Feeds one matrix sample taken at `now` into the state machine.
    ///
    /// Only character keys set `changed`. Modifier keys update the latches
    /// and never produce a change on their own.
    pub fn update(&mut self, sample: &KeyMatrixState, now: Instant) -> ScanReport {
        let sym_was_pressed = self.state.is_pressed(SYM_CELL.0, SYM_CELL.1);
        let mut changed = false;
        let mut char_key_held = false;

        for row in 0..ROWS {
            for col in 0..COLS {
                let pressed = sample.is_pressed(row, col);
                let is_char = matches!(keymap::base(row, col), Key::Char(_));

                if pressed != self.state.is_pressed(row, col) {
                    self.state.set(row, col, pressed);
                    changed |= is_char;
                }
                char_key_held |= pressed && is_char;
            }
        }

        let mut repeat = false;
        if !char_key_held {
            changed = false;
            self.hold_counter = 0;
        } else {
            self.hold_counter = self.hold_counter.saturating_add(1);
            if self.hold_counter > u16::from(self.config.hold_threshold) {
                log::trace!("press-and-hold repeat");
                changed = true;
                repeat = true;
                self.hold_counter = 0;
            }
        }

        self.update_modifiers(sym_was_pressed, now);

        self.report = ScanReport { changed, repeat };
        self.report
    }

    fn update_modifiers(&mut self, sym_was_pressed: bool, now: Instant) {
        let pressed = |(row, col): (usize, usize)| self.state.is_pressed(row, col);

        if pressed(ALT_CELL) {
            self.modifiers.alt = true;
        } else if pressed(RIGHT_SHIFT_CELL) {
            self.modifiers.right_shift = true;
        } else if pressed(LEFT_SHIFT_CELL) {
            self.modifiers.left_shift = true;
        }

        // Sym is edge-detected independently of Alt and Shift.
        if pressed(SYM_CELL) && !sym_was_pressed {
            let settled = self.last_caps_toggle.map_or(true, |last| {
                now.checked_duration_since(last)
                    .map_or(false, |elapsed| elapsed >= self.config.caps_lock_debounce)
            });
            if settled {
                self.modifiers.caps_lock = !self.modifiers.caps_lock;
                self.last_caps_toggle = Some(now);
                log::debug!("caps lock {}", if self.modifiers.caps_lock { "on" } else { "off" });
            }
        }
    }

    /// Resolves the pressed character keys into one character.
    ///
    /// The last pressed key in column-major order wins. Alt selects the
    /// alternate layer, Shift or caps lock selects upper case. Resolving a
    /// character consumes the Alt and Shift latches.
    pub fn find_key(&mut self) -> Option<u8> {
        let mut result = None;

        for (row, col) in self.state.pressed_cells() {
            let Key::Char(base) = keymap::base(row, col) else {
                continue;
            };

            let ch = if self.modifiers.alt {
                keymap::alt(row, col).unwrap_or(base.to_ascii_lowercase())
            } else if self.modifiers.is_upper_case() {
                base.to_ascii_uppercase()
            } else {
                base.to_ascii_lowercase()
            };
            result = Some(ch);
        }

        if result.is_some() {
            self.modifiers.clear_latches();
        }
        result
    }

    /// Runs [`Self::update`] and, on a change, [`Self::find_key`].
    pub fn process(&mut self, sample: &KeyMatrixState, now: Instant) -> Option<KeyEvent> {
        let report = self.update(sample, now);
        if !report.changed {
            return None;
        }
        self.find_key().map(|key| KeyEvent {
            key,
            repeat: report.repeat,
        })
    }
}

impl Default for KeyboardScanner {
    fn default() -> Self {
        Self::new(ScanConfig::DEFAULT)
    }
}

/// A BBQ10 keyboard wired to GPIOs.
pub struct Keyboard<R, C, D> {
    matrix: Matrix<R, C, D>,
    scanner: KeyboardScanner,
}

impl<R, C, D, TPINERR> Keyboard<R, C, D>
where
    TPINERR: core::fmt::Debug,
    R: InputPin<Error = TPINERR>,
    C: OutputPin<Error = TPINERR>,
    D: DelayNs,
{
    /// Creates a new `Keyboard`.
    ///
    /// # Arguments
    ///
    /// * `rows` - The seven row inputs, with pull-ups enabled.
    /// * `cols` - The five column outputs.
    /// * `delay` - Delay provider for the column settle time.
    /// * `config` - Scanner tuning.
    pub fn new(rows: [R; ROWS], cols: [C; COLS], delay: D, config: ScanConfig) -> Self {
        Self {
            matrix: Matrix::new(rows, cols, delay, config.settle_delay_us),
            scanner: KeyboardScanner::new(config),
        }
    }

    /// Puts the column outputs into their idle (high) state.
    pub fn init(&mut self) -> Result<(), MatrixError<TPINERR>> {
        self.matrix.init().map_err(|err| {
            log::warn!("Error initializing keyboard matrix: {err:?}");
            err
        })
    }

    /// Samples the matrix and updates the scan state.
    pub async fn scan(&mut self, now: Instant) -> Result<ScanReport, MatrixError<TPINERR>> {
        let sample = self.matrix.sample().await.map_err(|err| {
            log::warn!("Error sampling keyboard matrix: {err:?}");
            err
        })?;
        Ok(self.scanner.update(&sample, now))
    }

    /// See [`KeyboardScanner::find_key`].
    pub fn find_key(&mut self) -> Option<u8> {
        self.scanner.find_key()
    }

    /// Returns `true` if the last scan asked for a key to be resolved.
    pub fn is_key_changed(&self) -> bool {
        self.scanner.is_key_changed()
    }

    /// Current modifier state.
    pub fn modifiers(&self) -> Modifiers {
        self.scanner.modifiers()
    }

    /// Scans once and returns the resolved key, if the scan produced one.
    pub async fn poll(&mut self, now: Instant) -> Result<Option<KeyEvent>, MatrixError<TPINERR>> {
        let sample = self.matrix.sample().await.map_err(|err| {
            log::warn!("Error sampling keyboard matrix: {err:?}");
            err
        })?;
        Ok(self.scanner.process(&sample, now))
    }
}
