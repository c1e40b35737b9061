//! The I2C slave side of the BBQ10 keyboard/trackball bridge.
//!
//! The bridge exposes two read-only registers at address `0x52`: the last
//! key (`0x10`, one byte) and the last trackball report (`0x20`, four bytes).
//! Producers publish into [`registers::SharedRegisters`], pulse a
//! [`signal::ReadySignal`] and the [`responder::Responder`] serves the reads.
//!
//! `embedded-hal` has no I2C target traits, so the responder is written
//! against [`responder::SlavePeripheral`]. The peripheral adapter turns
//! hardware interrupts into [`responder::BusEvent`]s.
//!
//! # Usage
//!
//! ```ignore
//! # #![no_std]
//! # #![no_main]
//! use bbq10_i2c_slave_async::registers::SharedRegisters;
//! use bbq10_i2c_slave_async::responder::{Responder, ResponderConfig};
//!
//! static REGISTERS: SharedRegisters = SharedRegisters::new();
//!
//! # fn run(peripheral: impl bbq10_i2c_slave_async::responder::SlavePeripheral) {
//! let mut responder = Responder::new(peripheral, &REGISTERS, ResponderConfig::default());
//! responder.start().unwrap();
//!
//! // In the I2C interrupt:
//! // responder.handle(event)
//!
//! // In the keyboard task:
//! // REGISTERS.wait_idle().await;
//! // REGISTERS.set_keyboard(b'a');
//! // keyboard_ready.pulse().await;
//! # }
//! ```

#![no_std]

#[cfg(test)]
extern crate std;

pub mod err;
pub mod registers;
pub mod responder;
pub mod signal;
