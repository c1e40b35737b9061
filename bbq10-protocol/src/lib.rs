//! Register map and wire format of the BBQ10 keyboard/trackball I2C bridge.
//!
//! The microcontroller answers as an I2C slave at [`SLAVE_ADDRESS`]. A bus
//! master first writes a one-byte register select code, then reads the
//! selected register in a second transaction:
//!
//! | select | read length | content                                   |
//! |--------|-------------|-------------------------------------------|
//! | `0x10` | 1           | last decoded key character, `0x00` if none |
//! | `0x20` | 4           | `dxHi, dxLo, dyHi, dyLo` or `0xFF` ×4 click |
//!
//! Both sides of the bus use the types in this crate, so the firmware and the
//! host decoder cannot drift apart.

#![no_std]

use core::fmt;

/// 7-bit I2C address of the bridge.
pub const SLAVE_ADDRESS: u8 = 0x52;

/// Value of the keyboard register when no key has been decoded.
pub const KEY_NONE: u8 = 0x00;

/// Length of the keyboard register in bytes.
pub const KEYBOARD_REGISTER_LEN: usize = 1;

/// Length of the trackball register in bytes.
pub const TRACKBALL_REGISTER_LEN: usize = 4;

/// Reserved trackball register content signalling a button click.
pub const CLICK_SENTINEL: [u8; TRACKBALL_REGISTER_LEN] = [0xFF; TRACKBALL_REGISTER_LEN];

/// Register select codes written by the bus master.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterSelect {
    /// One byte, the current key character.
    Keyboard = 0x10,
    /// Four bytes, the trackball delta or the click sentinel.
    Trackball = 0x20,
}

impl RegisterSelect {
    /// Number of bytes a read of this register returns.
    pub const fn len(self) -> usize {
        match self {
            Self::Keyboard => KEYBOARD_REGISTER_LEN,
            Self::Trackball => TRACKBALL_REGISTER_LEN,
        }
    }
}

impl From<RegisterSelect> for u8 {
    fn from(reg: RegisterSelect) -> Self {
        reg as u8
    }
}

/// A select byte that does not name a register.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnknownRegister(pub u8);

impl TryFrom<u8> for RegisterSelect {
    type Error = UnknownRegister;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0x10 => Ok(Self::Keyboard),
            0x20 => Ok(Self::Trackball),
            other => Err(UnknownRegister(other)),
        }
    }
}

/// Errors decoding a trackball register read.
#[derive(Clone, Copy, PartialEq, Eq)]
pub enum PayloadError {
    /// The read returned this many bytes instead of four.
    Length(usize),
}

impl fmt::Debug for PayloadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Length(len) => write!(
                f,
                "Length(expected {TRACKBALL_REGISTER_LEN} bytes, got {len})"
            ),
        }
    }
}

/// Content of the trackball register.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackballPayload {
    /// Relative motion accumulated since the previous read.
    Motion {
        /// Horizontal delta.
        dx: i16,
        /// Vertical delta.
        dy: i16,
    },
    /// The trackball button was clicked.
    Click,
}

impl TrackballPayload {
    /// Encodes the payload into the four register bytes.
    ///
    /// `(-1, -1)` shares its bit pattern with [`CLICK_SENTINEL`], so it is sent
    /// as `(-1, 0)`. The host never sees a motion that reads back as a click.
    pub fn encode(self) -> [u8; TRACKBALL_REGISTER_LEN] {
        match self {
            Self::Click => CLICK_SENTINEL,
            Self::Motion { dx, dy } => {
                let dy = if dx == -1 && dy == -1 {
                    log::debug!("motion (-1, -1) collides with the click sentinel, sending (-1, 0)");
                    0
                } else {
                    dy
                };
                let [dx_hi, dx_lo] = dx.to_be_bytes();
                let [dy_hi, dy_lo] = dy.to_be_bytes();
                [dx_hi, dx_lo, dy_hi, dy_lo]
            }
        }
    }

    /// Decodes a trackball register read.
    pub fn decode(bytes: &[u8]) -> Result<Self, PayloadError> {
        let bytes: [u8; TRACKBALL_REGISTER_LEN] = bytes
            .try_into()
            .map_err(|_| PayloadError::Length(bytes.len()))?;

        if bytes == CLICK_SENTINEL {
            return Ok(Self::Click);
        }

        Ok(Self::Motion {
            dx: i16::from_be_bytes([bytes[0], bytes[1]]),
            dy: i16::from_be_bytes([bytes[2], bytes[3]]),
        })
    }
}
