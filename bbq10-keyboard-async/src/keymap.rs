//! Key tables of the BBQ10 matrix.
//!
//! Letters are stored upper-case; the resolver in [`crate::keyboard`] picks
//! the case from the shift and caps lock state.

use crate::matrix::{COLS, ROWS};

/// Meaning of a matrix cell on the base layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    /// A key producing this ASCII byte.
    Char(u8),
    /// The Alt key, selects the alternate layer for the next key.
    Alt,
    /// The left Shift key.
    LeftShift,
    /// The right Shift key.
    RightShift,
    /// The Sym key, toggles caps lock.
    Sym,
    /// No switch at this position.
    Unused,
}

impl Key {
    /// Returns `true` for Alt, both Shifts and Sym.
    pub const fn is_modifier(self) -> bool {
        matches!(
            self,
            Self::Alt | Self::LeftShift | Self::RightShift | Self::Sym
        )
    }
}

/// Enter.
pub const ENTER: u8 = b'\n';
/// Backspace, sent as carriage return.
pub const BACKSPACE: u8 = b'\r';

/// Matrix position of the Alt key.
pub const ALT_CELL: (usize, usize) = (4, 0);
/// Matrix position of the right Shift key.
pub const RIGHT_SHIFT_CELL: (usize, usize) = (3, 2);
/// Matrix position of the left Shift key.
pub const LEFT_SHIFT_CELL: (usize, usize) = (6, 1);
/// Matrix position of the Sym key.
pub const SYM_CELL: (usize, usize) = (2, 0);

const fn c(ch: u8) -> Key {
    Key::Char(ch)
}

/// Base layer, indexed `[row][col]`.
pub const BASE_LAYER: [[Key; COLS]; ROWS] = [
    [c(b'Q'), c(b'E'), c(b'R'), c(b'U'), c(b'O')],
    [c(b'W'), c(b'S'), c(b'G'), c(b'H'), c(b'L')],
    [Key::Sym, c(b'D'), c(b'T'), c(b'Y'), c(b'I')],
    [c(b'A'), c(b'P'), Key::RightShift, c(ENTER), c(BACKSPACE)],
    [Key::Alt, c(b'X'), c(b'V'), c(b'B'), c(b'$')],
    [c(b' '), c(b'Z'), c(b'C'), c(b'N'), c(b'M')],
    [Key::Unused, Key::LeftShift, c(b'F'), c(b'J'), c(b'K')],
];

/// Alternate (Alt) layer, indexed `[row][col]`. `0` means the cell has no
/// alternate character and falls back to the base layer.
pub const ALT_LAYER: [[u8; COLS]; ROWS] = [
    [b'#', b'2', b'3', b'_', b'+'],
    [b'1', b'4', b'/', b':', b'"'],
    [0, b'5', b'(', b')', b'-'],
    [b'*', b'@', 0, 0, 0],
    [0, b'8', b'?', b'!', 0],
    [0, b'7', b'9', b',', b'.'],
    [b'0', 0, b'6', b';', b'\''],
];

/// Base layer meaning of the cell at `row`/`col`.
pub fn base(row: usize, col: usize) -> Key {
    BASE_LAYER[row][col]
}

/// Alternate layer character of the cell at `row`/`col`, if it has one.
pub fn alt(row: usize, col: usize) -> Option<u8> {
    match ALT_LAYER[row][col] {
        0 => None,
        ch => Some(ch),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn modifier_cells_match_table() {
        assert_eq!(base(ALT_CELL.0, ALT_CELL.1), Key::Alt);
        assert_eq!(base(RIGHT_SHIFT_CELL.0, RIGHT_SHIFT_CELL.1), Key::RightShift);
        assert_eq!(base(LEFT_SHIFT_CELL.0, LEFT_SHIFT_CELL.1), Key::LeftShift);
        assert_eq!(base(SYM_CELL.0, SYM_CELL.1), Key::Sym);
    }

    #[test]
    fn every_letter_appears_once() {
        for letter in b'A'..=b'Z' {
            let count = BASE_LAYER
                .iter()
                .flatten()
                .filter(|&&key| key == Key::Char(letter))
                .count();
            assert_eq!(count, 1, "letter {}", letter as char);
        }
    }

    #[test]
    fn alt_layer_lookup() {
        assert_eq!(alt(0, 1), Some(b'2'));
        assert_eq!(alt(6, 4), Some(b'\''));
        assert_eq!(alt(3, 3), None);
        // The unused cell still has an alternate entry.
        assert_eq!(base(6, 0), Key::Unused);
        assert_eq!(alt(6, 0), Some(b'0'));
    }
}
