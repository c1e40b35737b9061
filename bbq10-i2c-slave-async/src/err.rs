//! Bus error flags and responder errors.

use core::fmt::{self, Debug};

/// A single bus error condition.
#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BusErrorBit {
    /// Misplaced start or stop condition.
    BitError = 1 << 0,
    /// Lost arbitration to another master.
    ArbitrationLost = 1 << 1,
    /// The master did not acknowledge a byte it was not expected to NACK.
    AckFailure = 1 << 2,
    /// Receive overrun or transmit underrun.
    Overrun = 1 << 3,
}

/// Set of bus error conditions reported together by the peripheral.
#[derive(Copy, Clone, Default, PartialEq, Eq)]
pub struct BusErrorFlags {
    inner: u8,
}

impl BusErrorFlags {
    /// No error.
    pub const fn none() -> Self {
        Self { inner: 0 }
    }

    /// Adds an error condition.
    pub const fn combine(self, bit: BusErrorBit) -> Self {
        Self {
            inner: self.inner | bit as u8,
        }
    }

    /// Returns `true` if no condition is set.
    pub const fn is_empty(self) -> bool {
        self.inner == 0
    }

    /// Returns `true` if `bit` is set.
    pub const fn contains(self, bit: BusErrorBit) -> bool {
        self.inner & bit as u8 != 0
    }

    /// Returns `true` on a bit error.
    pub const fn bit_error(self) -> bool {
        self.contains(BusErrorBit::BitError)
    }

    /// Returns `true` on lost arbitration.
    pub const fn arbitration_lost(self) -> bool {
        self.contains(BusErrorBit::ArbitrationLost)
    }

    /// Returns `true` on an acknowledge failure.
    pub const fn ack_failure(self) -> bool {
        self.contains(BusErrorBit::AckFailure)
    }

    /// Returns `true` on overrun/underrun.
    pub const fn overrun(self) -> bool {
        self.contains(BusErrorBit::Overrun)
    }
}

impl From<BusErrorFlags> for u8 {
    fn from(flags: BusErrorFlags) -> Self {
        flags.inner
    }
}

impl From<BusErrorBit> for BusErrorFlags {
    fn from(bit: BusErrorBit) -> Self {
        Self::none().combine(bit)
    }
}

impl Debug for BusErrorFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BusErrorFlags")
            .field("bit_error", &self.bit_error())
            .field("arbitration_lost", &self.arbitration_lost())
            .field("ack_failure", &self.ack_failure())
            .field("overrun", &self.overrun())
            .finish()
    }
}

/// The main error type of the responder.
pub enum ResponderError<TPERR> {
    /// The peripheral failed to (re)initialize or to arm a transfer.
    Peripheral(TPERR),
}

impl<TPERR: Debug> Debug for ResponderError<TPERR> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Peripheral(err) => write!(f, "Peripheral({err:?})"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_combine() {
        let flags = BusErrorFlags::none()
            .combine(BusErrorBit::ArbitrationLost)
            .combine(BusErrorBit::Overrun);

        assert!(!flags.is_empty());
        assert!(flags.arbitration_lost() && flags.overrun());
        assert!(!flags.bit_error() && !flags.ack_failure());
        assert_eq!(u8::from(flags), 0b1010);
        assert!(BusErrorFlags::default().is_empty());
    }
}
