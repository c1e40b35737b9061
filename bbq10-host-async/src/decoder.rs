//! Turns register payloads into input events.

use bbq10_protocol::{PayloadError, TrackballPayload};

use crate::keycode::{decode_char, KeyStroke};

/// What a keyboard register read turns into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyboardEvent {
    /// Tap this key.
    Stroke(KeyStroke),
    /// The character has no key.
    Unknown(u8),
}

/// Decodes a keyboard register read.
pub fn decode_keyboard(value: u8) -> KeyboardEvent {
    decode_char(value).map_or(KeyboardEvent::Unknown(value), KeyboardEvent::Stroke)
}

/// Decodes a trackball register read.
pub fn decode_trackball(bytes: &[u8]) -> Result<TrackballPayload, PayloadError> {
    TrackballPayload::decode(bytes)
}

/// A unit motion step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Step {
    /// -1, 0 or 1.
    pub x: i8,
    /// -1, 0 or 1.
    pub y: i8,
}

/// Splits a motion into unit steps.
///
/// A `(dx, dy)` motion yields `max(|dx|, |dy|)` steps. Each axis moves by
/// one in its own direction until it is used up and by zero afterwards.
#[derive(Debug, Clone)]
pub struct MotionSteps {
    remaining_x: u16,
    remaining_y: u16,
    sign_x: i8,
    sign_y: i8,
}

impl MotionSteps {
    /// Creates the step sequence for `(dx, dy)`.
    pub fn new(dx: i16, dy: i16) -> Self {
        Self {
            remaining_x: dx.unsigned_abs(),
            remaining_y: dy.unsigned_abs(),
            sign_x: dx.signum() as i8,
            sign_y: dy.signum() as i8,
        }
    }
}

impl Iterator for MotionSteps {
    type Item = Step;

    fn next(&mut self) -> Option<Step> {
        if self.remaining_x == 0 && self.remaining_y == 0 {
            return None;
        }

        let mut step = Step { x: 0, y: 0 };
        if self.remaining_x > 0 {
            step.x = self.sign_x;
            self.remaining_x -= 1;
        }
        if self.remaining_y > 0 {
            step.y = self.sign_y;
            self.remaining_y -= 1;
        }
        Some(step)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let len = usize::from(self.remaining_x.max(self.remaining_y));
        (len, Some(len))
    }
}

impl ExactSizeIterator for MotionSteps {}

#[cfg(test)]
mod tests {
    use std::vec::Vec;

    use bbq10_protocol::CLICK_SENTINEL;

    use super::*;
    use crate::keycode::KeyCode;

    #[test]
    fn five_by_minus_two() {
        let steps: Vec<_> = MotionSteps::new(5, -2).collect();
        assert_eq!(steps.len(), 5);
        assert!(steps.iter().all(|step| step.x == 1));
        assert_eq!(
            steps.iter().map(|step| step.y).collect::<Vec<_>>(),
            [-1, -1, 0, 0, 0]
        );
    }

    #[test]
    fn step_count_is_max_magnitude() {
        for (dx, dy) in [(0, 0), (3, 0), (0, -7), (-4, 4), (1, -9), (i16::MIN, 1)] {
            let steps = MotionSteps::new(dx, dy);
            let expected = usize::from(dx.unsigned_abs().max(dy.unsigned_abs()));
            assert_eq!(steps.len(), expected);

            let (sx, sy) = steps.fold((0i32, 0i32), |(sx, sy), step| {
                (sx + i32::from(step.x), sy + i32::from(step.y))
            });
            assert_eq!((sx, sy), (i32::from(dx), i32::from(dy)));
        }
    }

    #[test]
    fn sentinel_is_one_click() {
        assert_eq!(decode_trackball(&CLICK_SENTINEL), Ok(TrackballPayload::Click));
        assert_eq!(
            decode_trackball(&[0x00, 0x05, 0xFF, 0xFE]),
            Ok(TrackballPayload::Motion { dx: 5, dy: -2 })
        );
    }

    #[test]
    fn short_read_is_rejected() {
        assert_eq!(decode_trackball(&[0xFF; 3]), Err(PayloadError::Length(3)));
    }

    #[test]
    fn keyboard_values() {
        assert_eq!(decode_keyboard(0x00), KeyboardEvent::Unknown(0x00));
        assert_eq!(
            decode_keyboard(b'?'),
            KeyboardEvent::Stroke(KeyStroke {
                code: KeyCode::Slash,
                shift: true
            })
        );
    }
}
