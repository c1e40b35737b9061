//! Register file shared between the scan tasks and the responder.

use core::cell::RefCell;
use core::sync::atomic::{AtomicBool, Ordering};

use bbq10_protocol::{RegisterSelect, TrackballPayload, KEY_NONE, TRACKBALL_REGISTER_LEN};
use embassy_sync::blocking_mutex::{raw::CriticalSectionRawMutex, Mutex};

/// Bytes handed to the peripheral for one read transaction.
pub type TxFrame = heapless::Vec<u8, TRACKBALL_REGISTER_LEN>;

#[derive(Debug, Clone, Copy)]
struct RegisterFile {
    keyboard: u8,
    trackball: [u8; TRACKBALL_REGISTER_LEN],
}

/// The keyboard and trackball registers plus the transaction-busy flag.
///
/// Producers wait for [`Self::wait_idle`] before publishing so that a value
/// never changes underneath a transaction in flight. Register access itself
/// runs inside a critical section, so a transmit frame is always a consistent
/// snapshot.
pub struct SharedRegisters {
    file: Mutex<CriticalSectionRawMutex, RefCell<RegisterFile>>,
    busy: AtomicBool,
}

impl SharedRegisters {
    /// Creates a register file holding no key and no motion.
    pub const fn new() -> Self {
        Self {
            file: Mutex::new(RefCell::new(RegisterFile {
                keyboard: KEY_NONE,
                trackball: [0; TRACKBALL_REGISTER_LEN],
            })),
            busy: AtomicBool::new(false),
        }
    }

    /// Publishes the latest key.
    pub fn set_keyboard(&self, key: u8) {
        self.file.lock(|file| file.borrow_mut().keyboard = key);
    }

    /// Publishes the latest trackball report.
    pub fn set_trackball(&self, payload: TrackballPayload) {
        let bytes = payload.encode();
        self.file.lock(|file| file.borrow_mut().trackball = bytes);
    }

    /// Current keyboard register.
    pub fn keyboard(&self) -> u8 {
        self.file.lock(|file| file.borrow().keyboard)
    }

    /// Current trackball register.
    pub fn trackball(&self) -> [u8; TRACKBALL_REGISTER_LEN] {
        self.file.lock(|file| file.borrow().trackball)
    }

    /// Bytes to transmit for a read of `register`.
    pub fn snapshot(&self, register: RegisterSelect) -> TxFrame {
        let file = self.file.lock(|file| *file.borrow());
        let bytes: &[u8] = match register {
            RegisterSelect::Keyboard => core::slice::from_ref(&file.keyboard),
            RegisterSelect::Trackball => &file.trackball,
        };
        // Neither register is longer than the frame.
        TxFrame::from_slice(bytes).unwrap_or_default()
    }

    /// Returns `true` while a transaction is in progress.
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    pub(crate) fn set_busy(&self, busy: bool) {
        self.busy.store(busy, Ordering::Release);
    }

    /// Waits until no transaction is in progress.
    pub async fn wait_idle(&self) {
        while self.is_busy() {
            embassy_futures::yield_now().await;
        }
    }
}

impl Default for SharedRegisters {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_empty() {
        let registers = SharedRegisters::new();
        assert_eq!(registers.snapshot(RegisterSelect::Keyboard).as_slice(), [KEY_NONE]);
        assert_eq!(registers.snapshot(RegisterSelect::Trackball).as_slice(), [0, 0, 0, 0]);
        assert!(!registers.is_busy());
    }

    #[test]
    fn snapshots_follow_updates() {
        let registers = SharedRegisters::new();
        registers.set_keyboard(b'q');
        registers.set_trackball(TrackballPayload::Motion { dx: 5, dy: -2 });

        assert_eq!(registers.snapshot(RegisterSelect::Keyboard).as_slice(), b"q");
        assert_eq!(
            registers.snapshot(RegisterSelect::Trackball).as_slice(),
            [0x00, 0x05, 0xFF, 0xFE]
        );

        registers.set_trackball(TrackballPayload::Click);
        assert_eq!(registers.trackball(), bbq10_protocol::CLICK_SENTINEL);
        assert_eq!(registers.keyboard(), b'q');
    }

    #[test]
    fn wait_idle_returns_once_released() {
        let registers = SharedRegisters::new();
        embassy_futures::block_on(registers.wait_idle());

        registers.set_busy(true);
        let mut wait = core::pin::pin!(registers.wait_idle());
        assert!(embassy_futures::poll_once(wait.as_mut()).is_pending());

        registers.set_busy(false);
        assert!(embassy_futures::poll_once(wait.as_mut()).is_ready());
    }
}
