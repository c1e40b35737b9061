//! An asynchronous, `no_std` scanner for the BlackBerry Q10 keyboard matrix.
//!
//! The keyboard is a passive 7×5 switch matrix wired straight to GPIOs: five
//! column outputs and seven row inputs with pull-ups. This crate drives the
//! matrix, tracks modifier keys (Alt, both Shifts, Sym as caps lock), handles
//! press-and-hold repeat and turns the pressed cells into one ASCII character
//! per scan.
//!
//! # Usage
//!
//! Any pins implementing the `embedded-hal` digital traits and any
//! `embedded-hal-async` delay can be used.
//!
//! ```ignore
//! # #![no_std]
//! # #![no_main]
//! # use esp_hal::gpio::{Input, InputConfig, Level, Output, OutputConfig, Pull};
//! # use embassy_time::{Delay, Duration, Instant, Timer};
//! use bbq10_keyboard_async::keyboard::{Keyboard, ScanConfig};
//!
//! # async fn run(rows: [Input<'static>; 7], cols: [Output<'static>; 5]) {
//! let mut keyboard = Keyboard::new(rows, cols, Delay, ScanConfig::default());
//! keyboard.init().unwrap();
//!
//! loop {
//!     if let Ok(Some(event)) = keyboard.poll(Instant::now()).await {
//!         // log::info!("Key: {:?}", event);
//!     }
//!     Timer::after(Duration::from_millis(5)).await;
//! }
//! # }
//! ```

#![no_std]

#[cfg(test)]
extern crate std;

pub mod keyboard;
pub mod keymap;
pub mod matrix;
