//! ESP32-S3 firmware of the BBQ10 keyboard/trackball bridge.
//!
//! Scans the keyboard matrix, accumulates trackball motion and serves both as
//! I2C slave registers at `0x52`.

#![no_std]

pub mod board;
pub mod slave;
