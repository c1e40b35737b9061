//! Accelerated motion accumulator and button debouncer.

use core::cell::RefCell;

use bbq10_protocol::TrackballPayload;
use embassy_sync::blocking_mutex::{raw::CriticalSectionRawMutex, Mutex};
use embassy_time::{Duration, Instant};

/// Direction reported by one of the four motion pins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Ball rolled up, decreases `dy`.
    Up,
    /// Ball rolled down, increases `dy`.
    Down,
    /// Ball rolled left, increases `dx`.
    Left,
    /// Ball rolled right, decreases `dx`.
    Right,
}

/// Motion and button state collected since the previous read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TrackballDelta {
    /// Horizontal motion.
    pub dx: i16,
    /// Vertical motion.
    pub dy: i16,
    /// The button was pressed.
    pub button: bool,
}

impl TrackballDelta {
    /// Returns `true` if there is neither motion nor a click to report.
    pub fn is_empty(&self) -> bool {
        self.dx == 0 && self.dy == 0 && !self.button
    }

    /// The register value to publish, `None` if there is nothing to report.
    ///
    /// A click takes precedence; motion collected in the same window is
    /// dropped.
    pub fn to_payload(self) -> Option<TrackballPayload> {
        if self.button {
            if self.dx != 0 || self.dy != 0 {
                log::debug!("dropping ({}, {}) in favour of click", self.dx, self.dy);
            }
            Some(TrackballPayload::Click)
        } else if self.dx != 0 || self.dy != 0 {
            Some(TrackballPayload::Motion {
                dx: self.dx,
                dy: self.dy,
            })
        } else {
            None
        }
    }
}

/// Trackball tuning.
#[derive(Debug, Clone, Copy)]
pub struct TrackballConfig {
    /// Units added per pulse before acceleration.
    pub base_step: i16,
    /// Button edges closer together than this are ignored.
    pub button_debounce: Duration,
    /// Swap the sign of `dx`.
    pub invert_x: bool,
    /// Swap the sign of `dy`.
    pub invert_y: bool,
}

impl TrackballConfig {
    /// 10 units per pulse, 20 ms button debounce, no inversion.
    pub const DEFAULT: Self = Self {
        base_step: 10,
        button_debounce: Duration::from_millis(20),
        invert_x: false,
        invert_y: false,
    };
}

impl Default for TrackballConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Acceleration multiplier in tenths for an axis that has already
/// accumulated `magnitude` units.
///
/// | accumulated (in base steps) | multiplier |
/// |-----------------------------|------------|
/// | ≥ 7                         | ×7         |
/// | ≥ 5                         | ×5         |
/// | ≥ 3                         | ×3         |
/// | ≥ 2                         | ×2         |
/// | ≥ 1                         | ×1.3       |
/// | < 1                         | ×1         |
pub fn acceleration_tenths(magnitude: u16, base_step: u16) -> u16 {
    let steps = |n: u16| base_step.saturating_mul(n);

    if magnitude >= steps(7) {
        70
    } else if magnitude >= steps(5) {
        50
    } else if magnitude >= steps(3) {
        30
    } else if magnitude >= steps(2) {
        20
    } else if magnitude >= steps(1) {
        13
    } else {
        10
    }
}

/// Size of the next step on an axis that currently holds `accumulated`.
pub fn accelerated_step(accumulated: i16, base_step: i16) -> i16 {
    let base = base_step.unsigned_abs();
    let tenths = acceleration_tenths(accumulated.unsigned_abs(), base);
    let step = u32::from(base) * u32::from(tenths) / 10;
    i16::try_from(step).unwrap_or(i16::MAX)
}

#[derive(Debug)]
struct AccumulatorState {
    dx: i16,
    dy: i16,
    button: bool,
    last_button_edge: Option<Instant>,
}

/// Accumulates trackball pulses until they are drained by [`Self::get_deltas`].
///
/// All methods take `&self` and run inside a critical section, so the
/// accumulator can be shared between interrupt handlers, tasks and the reader
/// through a `static`.
pub struct TrackballAccumulator {
    config: TrackballConfig,
    state: Mutex<CriticalSectionRawMutex, RefCell<AccumulatorState>>,
}

impl TrackballAccumulator {
    /// Creates an empty accumulator.
    pub const fn new(config: TrackballConfig) -> Self {
        Self {
            config,
            state: Mutex::new(RefCell::new(AccumulatorState {
                dx: 0,
                dy: 0,
                button: false,
                last_button_edge: None,
            })),
        }
    }

    /// The configuration in use.
    pub fn config(&self) -> &TrackballConfig {
        &self.config
    }

    /// Records one pulse on a direction pin.
    pub fn on_motion(&self, direction: Direction) {
        let base_step = self.config.base_step;
        let (invert_x, invert_y) = (self.config.invert_x, self.config.invert_y);

        self.state.lock(|state| {
            let mut state = state.borrow_mut();
            let (axis, positive, invert) = match direction {
                Direction::Up => (&mut state.dy, false, invert_y),
                Direction::Down => (&mut state.dy, true, invert_y),
                Direction::Left => (&mut state.dx, true, invert_x),
                Direction::Right => (&mut state.dx, false, invert_x),
            };

            let step = accelerated_step(*axis, base_step);
            *axis = if positive != invert {
                axis.saturating_add(step)
            } else {
                axis.saturating_sub(step)
            };
        });
    }

    /// Records an edge on the button pin at `now`.
    ///
    /// Returns `true` if the edge opens a debounce window. The caller then
    /// samples the pin once [`TrackballConfig::button_debounce`] has passed
    /// and hands the level to [`Self::on_button_settled`]. Edges inside the
    /// window of the previous accepted edge are ignored.
    pub fn on_button_edge(&self, now: Instant) -> bool {
        let debounce = self.config.button_debounce;

        self.state.lock(|state| {
            let mut state = state.borrow_mut();
            let settled = state.last_button_edge.map_or(true, |last| {
                now.checked_duration_since(last)
                    .map_or(false, |elapsed| elapsed >= debounce)
            });

            if settled {
                state.last_button_edge = Some(now);
            }
            settled
        })
    }

    /// Records the button level sampled when a debounce window expired.
    ///
    /// The button is active-low. A press stays pending until it is drained.
    pub fn on_button_settled(&self, level_low: bool) {
        self.state.lock(|state| {
            state.borrow_mut().button |= level_low;
        });
        log::trace!("trackball button {}", if level_low { "down" } else { "up" });
    }

    /// Returns the motion and button state and resets it, in one critical
    /// section.
    pub fn get_deltas(&self) -> TrackballDelta {
        self.state.lock(|state| {
            let mut state = state.borrow_mut();
            let delta = TrackballDelta {
                dx: state.dx,
                dy: state.dy,
                button: state.button,
            };
            state.dx = 0;
            state.dy = 0;
            state.button = false;
            delta
        })
    }
}

impl Default for TrackballAccumulator {
    fn default() -> Self {
        Self::new(TrackballConfig::DEFAULT)
    }
}
