//! Shared I2C bus for the two reader tasks.

use alloc::rc::Rc;

use embassy_sync::{blocking_mutex::raw::CriticalSectionRawMutex, rwlock::RwLock};
use embedded_hal::i2c::{Operation, SevenBitAddress};
use embedded_hal_async::i2c::{self, I2c};

/// The bus handle both readers hold.
pub type SharedBus<BUS> = Rc<RwLock<CriticalSectionRawMutex, BUS>>;

/// `RwLock`-based shared bus [`I2c`] device.
///
/// The keyboard and trackball readers each hold one and talk to the same
/// slave. Each transaction holds the write lock, so a select write and its
/// read are never interleaved with the other reader's.
pub struct SharedI2cDevice<BUS> {
    bus: SharedBus<BUS>,
}

impl<BUS> SharedI2cDevice<BUS>
where
    BUS: I2c<SevenBitAddress>,
{
    /// Wraps `bus` for sharing.
    pub fn new(bus: BUS) -> Self {
        Self::from_shared(Rc::new(RwLock::new(bus)))
    }

    /// Creates a device on an already shared bus.
    pub fn from_shared(bus: SharedBus<BUS>) -> Self {
        Self { bus }
    }

    /// Another device on the same bus.
    pub fn share(&self) -> Self {
        Self::from_shared(Rc::clone(&self.bus))
    }
}

impl<BUS> i2c::ErrorType for SharedI2cDevice<BUS>
where
    BUS: I2c<SevenBitAddress>,
{
    type Error = BUS::Error;
}

impl<BUS> I2c for SharedI2cDevice<BUS>
where
    BUS: I2c<SevenBitAddress>,
{
    async fn transaction(
        &mut self,
        address: SevenBitAddress,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        let mut bus = self.bus.write().await;
        let result = bus.transaction(address, operations).await;

        if let Err(err) = &result {
            log::warn!("I2C transaction with {address:#04x} failed: {err:?}");
        }

        result
    }
}

#[cfg(test)]
pub(crate) mod fake {
    //! Scripted I2C slave.

    use core::cell::RefCell;
    use std::rc::Rc;
    use std::vec::Vec;

    use embedded_hal::i2c::{ErrorKind, ErrorType, Operation};
    use embedded_hal_async::i2c::I2c;

    /// Records writes and answers reads from the selected register.
    #[derive(Default)]
    pub struct FakeState {
        pub keyboard: u8,
        pub trackball: Vec<u8>,
        pub writes: Vec<(u8, Vec<u8>)>,
        pub fail: Option<ErrorKind>,
        selected: u8,
    }

    #[derive(Clone, Default)]
    pub struct FakeI2c(pub Rc<RefCell<FakeState>>);

    impl ErrorType for FakeI2c {
        type Error = ErrorKind;
    }

    impl I2c for FakeI2c {
        async fn transaction(
            &mut self,
            address: u8,
            operations: &mut [Operation<'_>],
        ) -> Result<(), Self::Error> {
            let mut state = self.0.borrow_mut();
            if let Some(err) = state.fail {
                return Err(err);
            }

            for op in operations {
                match op {
                    Operation::Write(bytes) => {
                        state.writes.push((address, bytes.to_vec()));
                        if let Some(&select) = bytes.first() {
                            state.selected = select;
                        }
                    }
                    Operation::Read(buf) => {
                        let source = match state.selected {
                            0x10 => std::vec![state.keyboard],
                            0x20 => state.trackball.clone(),
                            _ => std::vec![0x00],
                        };
                        for (dst, src) in buf.iter_mut().zip(source.iter().chain([0u8; 8].iter())) {
                            *dst = *src;
                        }
                    }
                }
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use std::vec;

    use embedded_hal::i2c::ErrorKind;

    use super::fake::FakeI2c;
    use super::*;

    #[test]
    fn devices_share_one_bus() {
        let fake = FakeI2c::default();
        fake.0.borrow_mut().keyboard = b'k';

        let mut keyboard = SharedI2cDevice::new(fake.clone());
        let mut trackball = keyboard.share();

        let mut key = [0u8; 1];
        embassy_futures::block_on(keyboard.write_read(0x52, &[0x10], &mut key)).unwrap();
        assert_eq!(key, *b"k");

        fake.0.borrow_mut().trackball = vec![0, 1, 0, 2];
        let mut motion = [0u8; 4];
        embassy_futures::block_on(trackball.write_read(0x52, &[0x20], &mut motion)).unwrap();
        assert_eq!(motion, [0, 1, 0, 2]);

        assert_eq!(
            fake.0.borrow().writes,
            vec![(0x52, vec![0x10]), (0x52, vec![0x20])]
        );
    }

    #[test]
    fn errors_pass_through() {
        let fake = FakeI2c::default();
        fake.0.borrow_mut().fail = Some(ErrorKind::Bus);

        let mut device = SharedI2cDevice::new(fake);
        let mut buf = [0u8; 1];
        assert_eq!(
            embassy_futures::block_on(device.write_read(0x52, &[0x10], &mut buf)),
            Err(ErrorKind::Bus)
        );
    }
}
