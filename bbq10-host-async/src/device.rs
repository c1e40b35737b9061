//! Identities of the two input devices the host exposes.

use crate::keycode::{Button, KeyCode, RelAxis};

/// `BUS_I2C` from `linux/input.h`.
pub const BUS_I2C: u16 = 0x18;

/// Input device id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputId {
    /// Bus type.
    pub bustype: u16,
    /// Vendor id.
    pub vendor: u16,
    /// Product id.
    pub product: u16,
    /// Version.
    pub version: u16,
}

/// Static description of an input device.
#[derive(Debug, Clone, Copy)]
pub struct DeviceIdentity {
    /// Human readable name.
    pub name: &'static str,
    /// Physical path.
    pub phys: &'static str,
    /// Device id.
    pub id: InputId,
    /// Auto-repeat is handled by the input layer.
    pub key_repeat: bool,
    /// Keys the device can report.
    pub keys: &'static [KeyCode],
    /// Buttons the device can report.
    pub buttons: &'static [Button],
    /// Relative axes the device can report.
    pub axes: &'static [RelAxis],
}

impl DeviceIdentity {
    /// Returns `true` if the device advertises `key`.
    pub fn supports_key(&self, key: KeyCode) -> bool {
        self.keys.contains(&key)
    }
}

const KEYBOARD_KEYS: [KeyCode; 47] = {
    let mut keys = [KeyCode::Space; 47];
    let mut i = 0;
    while i < KeyCode::ALPHABET.len() {
        keys[i] = KeyCode::ALPHABET[i];
        i += 1;
    }
    let mut j = 0;
    while j < KeyCode::NUMBERS.len() {
        keys[i + j] = KeyCode::NUMBERS[j];
        j += 1;
    }
    let mut k = 0;
    while k < KeyCode::SPECIAL.len() {
        keys[i + j + k] = KeyCode::SPECIAL[k];
        k += 1;
    }
    keys
};

/// The keyboard device.
pub const KEYBOARD: DeviceIdentity = DeviceIdentity {
    name: "BBQ10 Keyboard",
    phys: "i2c/bbq10",
    id: InputId {
        bustype: BUS_I2C,
        vendor: 0x0001,
        product: 0x0001,
        version: 0x0100,
    },
    key_repeat: true,
    keys: &KEYBOARD_KEYS,
    buttons: &[],
    axes: &[],
};

/// The pointer device.
pub const TRACKBALL: DeviceIdentity = DeviceIdentity {
    name: "BBQ10 Trackball",
    phys: "i2c/bbq10-trackball",
    id: InputId {
        bustype: BUS_I2C,
        vendor: 0x0001,
        product: 0x0002,
        version: 0x0100,
    },
    key_repeat: false,
    keys: &[],
    buttons: &[Button::Left, Button::Right],
    axes: &[RelAxis::X, RelAxis::Y],
};
