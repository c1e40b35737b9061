//! Host side of the BBQ10 keyboard/trackball bridge.
//!
//! The bridge raises one of two data-ready lines after it updates a register.
//! [`controller::KeyboardReader`] and [`controller::TrackballReader`] wait for
//! those edges, read the register over I2C and replay it into an
//! [`controller::InputSink`] as Linux-style key, button and relative-motion
//! events.
//!
//! # Usage
//!
//! ```ignore
//! # #![no_std]
//! # #![no_main]
//! # use esp_hal::gpio::{Input, InputConfig};
//! # use esp_hal::i2c::master::I2c;
//! # use embassy_time::Delay;
//! use bbq10_host_async::bus::SharedI2cDevice;
//! use bbq10_host_async::controller::{HostConfig, KeyboardReader, TrackballReader};
//!
//! # async fn run(i2c: I2c<'static, esp_hal::Async>, kbd_irq: Input<'static>, tb_irq: Input<'static>,
//! #              keys: impl bbq10_host_async::controller::InputSink,
//! #              pointer: impl bbq10_host_async::controller::InputSink) {
//! let keyboard_bus = SharedI2cDevice::new(i2c);
//! let trackball_bus = keyboard_bus.share();
//!
//! let mut keyboard = KeyboardReader::new(keyboard_bus, kbd_irq, Delay, keys, HostConfig::default());
//! let mut trackball = TrackballReader::new(trackball_bus, tb_irq, Delay, pointer, HostConfig::default());
//!
//! embassy_futures::join::join(keyboard.run(), trackball.run()).await;
//! # }
//! ```

#![no_std]

extern crate alloc;

#[cfg(test)]
extern crate std;

pub mod bus;
pub mod controller;
pub mod decoder;
pub mod device;
pub mod keycode;
