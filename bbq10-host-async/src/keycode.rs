//! Linux input event codes and the character table.

/// Key codes, numbered as in `linux/input-event-codes.h`.
#[repr(u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum KeyCode {
    Num1 = 2,
    Num2 = 3,
    Num3 = 4,
    Num4 = 5,
    Num5 = 6,
    Num6 = 7,
    Num7 = 8,
    Num8 = 9,
    Num9 = 10,
    Num0 = 11,
    Minus = 12,
    Equal = 13,
    Backspace = 14,
    Q = 16,
    W = 17,
    E = 18,
    R = 19,
    T = 20,
    Y = 21,
    U = 22,
    I = 23,
    O = 24,
    P = 25,
    Enter = 28,
    A = 30,
    S = 31,
    D = 32,
    F = 33,
    G = 34,
    H = 35,
    J = 36,
    K = 37,
    L = 38,
    Semicolon = 39,
    Apostrophe = 40,
    LeftShift = 42,
    Z = 44,
    X = 45,
    C = 46,
    V = 47,
    B = 48,
    N = 49,
    M = 50,
    Comma = 51,
    Dot = 52,
    Slash = 53,
    Space = 57,
}

impl KeyCode {
    /// `a` to `z`.
    pub const ALPHABET: [KeyCode; 26] = [
        Self::A,
        Self::B,
        Self::C,
        Self::D,
        Self::E,
        Self::F,
        Self::G,
        Self::H,
        Self::I,
        Self::J,
        Self::K,
        Self::L,
        Self::M,
        Self::N,
        Self::O,
        Self::P,
        Self::Q,
        Self::R,
        Self::S,
        Self::T,
        Self::U,
        Self::V,
        Self::W,
        Self::X,
        Self::Y,
        Self::Z,
    ];

    /// `0` to `9`.
    pub const NUMBERS: [KeyCode; 10] = [
        Self::Num0,
        Self::Num1,
        Self::Num2,
        Self::Num3,
        Self::Num4,
        Self::Num5,
        Self::Num6,
        Self::Num7,
        Self::Num8,
        Self::Num9,
    ];

    /// Punctuation and control keys the keyboard device advertises.
    pub const SPECIAL: [KeyCode; 11] = [
        Self::Space,
        Self::Enter,
        Self::Backspace,
        Self::LeftShift,
        Self::Dot,
        Self::Comma,
        Self::Slash,
        Self::Semicolon,
        Self::Apostrophe,
        Self::Minus,
        Self::Equal,
    ];

    /// The raw event code.
    pub const fn code(self) -> u16 {
        self as u16
    }
}

impl From<KeyCode> for u16 {
    fn from(key: KeyCode) -> Self {
        key.code()
    }
}

/// Pointer buttons.
#[repr(u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Button {
    /// `BTN_LEFT`.
    Left = 0x110,
    /// `BTN_RIGHT`.
    Right = 0x111,
}

impl From<Button> for u16 {
    fn from(button: Button) -> Self {
        button as u16
    }
}

/// Relative axes.
#[repr(u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelAxis {
    /// `REL_X`.
    X = 0x00,
    /// `REL_Y`.
    Y = 0x01,
}

impl From<RelAxis> for u16 {
    fn from(axis: RelAxis) -> Self {
        axis as u16
    }
}

/// A key to tap, possibly with left shift held around it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyStroke {
    /// The key.
    pub code: KeyCode,
    /// Bracket the key with a synthetic left-shift press.
    pub shift: bool,
}

impl KeyStroke {
    const fn plain(code: KeyCode) -> Self {
        Self { code, shift: false }
    }

    const fn shifted(code: KeyCode) -> Self {
        Self { code, shift: true }
    }
}

/// Maps a character from the keyboard register to a key stroke.
///
/// Returns `None` for characters that have no key, including `0x00`.
pub fn decode_char(ch: u8) -> Option<KeyStroke> {
    let stroke = match ch {
        b'a'..=b'z' => KeyStroke::plain(KeyCode::ALPHABET[usize::from(ch - b'a')]),
        b'A'..=b'Z' => KeyStroke::shifted(KeyCode::ALPHABET[usize::from(ch - b'A')]),
        b'0'..=b'9' => KeyStroke::plain(KeyCode::NUMBERS[usize::from(ch - b'0')]),
        b' ' => KeyStroke::plain(KeyCode::Space),
        b'\n' => KeyStroke::plain(KeyCode::Enter),
        // The keyboard sends carriage return for its backspace key.
        b'\r' => KeyStroke::plain(KeyCode::Backspace),
        b'.' => KeyStroke::plain(KeyCode::Dot),
        b',' => KeyStroke::plain(KeyCode::Comma),
        b'/' => KeyStroke::plain(KeyCode::Slash),
        b';' => KeyStroke::plain(KeyCode::Semicolon),
        b'\'' => KeyStroke::plain(KeyCode::Apostrophe),
        b'-' => KeyStroke::plain(KeyCode::Minus),
        b'!' => KeyStroke::shifted(KeyCode::Num1),
        b'@' => KeyStroke::shifted(KeyCode::Num2),
        b'#' => KeyStroke::shifted(KeyCode::Num3),
        b'$' => KeyStroke::shifted(KeyCode::Num4),
        b'_' => KeyStroke::shifted(KeyCode::Minus),
        b'+' => KeyStroke::shifted(KeyCode::Equal),
        b':' => KeyStroke::shifted(KeyCode::Semicolon),
        b'"' => KeyStroke::shifted(KeyCode::Apostrophe),
        b'?' => KeyStroke::shifted(KeyCode::Slash),
        b'(' => KeyStroke::shifted(KeyCode::Num9),
        b')' => KeyStroke::shifted(KeyCode::Num0),
        b'*' => KeyStroke::shifted(KeyCode::Num8),
        _ => return None,
    };
    Some(stroke)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn letters() {
        assert_eq!(decode_char(b'a'), Some(KeyStroke::plain(KeyCode::A)));
        assert_eq!(decode_char(b'q'), Some(KeyStroke::plain(KeyCode::Q)));
        assert_eq!(decode_char(b'Z'), Some(KeyStroke::shifted(KeyCode::Z)));

        for (i, ch) in (b'a'..=b'z').enumerate() {
            let lower = decode_char(ch).unwrap();
            let upper = decode_char(ch.to_ascii_uppercase()).unwrap();
            assert_eq!(lower.code, KeyCode::ALPHABET[i]);
            assert_eq!(upper.code, lower.code);
            assert!(!lower.shift && upper.shift);
        }
    }

    #[test]
    fn digits() {
        assert_eq!(decode_char(b'1').unwrap().code.code(), 2);
        assert_eq!(decode_char(b'9').unwrap().code.code(), 10);
        assert_eq!(decode_char(b'0').unwrap().code.code(), 11);
        assert!((b'0'..=b'9').all(|ch| !decode_char(ch).unwrap().shift));
    }

    #[test]
    fn punctuation() {
        let expected = [
            (b' ', KeyCode::Space, false),
            (b'\n', KeyCode::Enter, false),
            (b'\r', KeyCode::Backspace, false),
            (b'.', KeyCode::Dot, false),
            (b',', KeyCode::Comma, false),
            (b'/', KeyCode::Slash, false),
            (b';', KeyCode::Semicolon, false),
            (b'\'', KeyCode::Apostrophe, false),
            (b'-', KeyCode::Minus, false),
            (b'!', KeyCode::Num1, true),
            (b'@', KeyCode::Num2, true),
            (b'#', KeyCode::Num3, true),
            (b'$', KeyCode::Num4, true),
            (b'_', KeyCode::Minus, true),
            (b'+', KeyCode::Equal, true),
            (b':', KeyCode::Semicolon, true),
            (b'"', KeyCode::Apostrophe, true),
            (b'?', KeyCode::Slash, true),
            (b'(', KeyCode::Num9, true),
            (b')', KeyCode::Num0, true),
            (b'*', KeyCode::Num8, true),
        ];
        for (ch, code, shift) in expected {
            assert_eq!(decode_char(ch), Some(KeyStroke { code, shift }), "{:?}", ch as char);
        }
    }

    #[test]
    fn unknown() {
        for ch in [0x00, b'%', b'&', b'~', b'<', b'=', 0x7F, 0xFF] {
            assert_eq!(decode_char(ch), None);
        }
    }

    #[test]
    fn raw_codes() {
        assert_eq!(u16::from(KeyCode::LeftShift), 42);
        assert_eq!(u16::from(KeyCode::Space), 57);
        assert_eq!(u16::from(Button::Left), 0x110);
        assert_eq!(u16::from(RelAxis::Y), 1);
    }
}
