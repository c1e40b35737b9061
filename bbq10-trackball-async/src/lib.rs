//! A `no_std` driver for the BlackBerry 303TRACKBA1 trackball.
//!
//! The trackball reports motion as pulses on four direction pins (up, down,
//! left, right) and has a push button and an RGB + white backlight. This crate
//! accumulates the pulses into accelerated `(dx, dy)` deltas that can be
//! drained atomically from another execution context, and drives the
//! backlight.
//!
//! # Usage
//!
//! The accumulator is meant to live in a `static` and be fed from the
//! tasks or interrupt handlers that watch the direction pins.
//!
//! ```ignore
//! use bbq10_trackball_async::accumulator::{Direction, TrackballAccumulator, TrackballConfig};
//! use embassy_time::Instant;
//!
//! static TRACKBALL: TrackballAccumulator = TrackballAccumulator::new(TrackballConfig::DEFAULT);
//!
//! #[embassy_executor::task]
//! async fn watch_left(mut pin: esp_hal::gpio::Input<'static>) {
//!     loop {
//!         pin.wait_for_falling_edge().await;
//!         TRACKBALL.on_motion(Direction::Left);
//!     }
//! }
//!
//! // Elsewhere:
//! let delta = TRACKBALL.get_deltas();
//! ```

#![no_std]

#[cfg(test)]
extern crate std;

pub mod accumulator;
pub mod led;
