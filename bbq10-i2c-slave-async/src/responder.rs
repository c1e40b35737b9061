//! I2C slave transaction state machine.
//!
//! A master selects a register with a one-byte write and then reads it:
//!
//! ```text
//! S 0x52+W [0x10|0x20] (Sr|P S) 0x52+R <1 or 4 bytes> P
//! ```
//!
//! The selection persists, so repeated reads return the same register.

use core::fmt::Debug;

use bbq10_protocol::{RegisterSelect, KEY_NONE, SLAVE_ADDRESS};

use crate::err::{BusErrorFlags, ResponderError};
use crate::registers::SharedRegisters;

/// Direction of a transfer, seen from the master.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferDirection {
    /// Master writes, slave receives.
    Write,
    /// Master reads, slave transmits.
    Read,
}

/// Bus events reported by the peripheral adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusEvent {
    /// Our address was matched.
    AddressMatched(TransferDirection),
    /// A byte armed with [`SlavePeripheral::arm_receive`] arrived.
    ByteReceived(u8),
    /// The armed transfer finished (stop or NACK after the last byte).
    TransferComplete,
    /// The peripheral left listen mode.
    ListenComplete,
    /// The peripheral flagged a bus error.
    Error(BusErrorFlags),
}

/// Received bytes one interrupt can carry, the RX FIFO depth of the slave
/// controller.
pub const MAX_RX_BYTES: usize = 32;

/// Capacity of [`BusEvents`]: every received byte plus a transfer end and an
/// address match.
pub const BUS_EVENTS_CAPACITY: usize = MAX_RX_BYTES + 2;

/// The events decoded from one interrupt, in delivery order.
pub type BusEvents = heapless::Vec<BusEvent, BUS_EVENTS_CAPACITY>;

/// Orders the events of one interrupt for [`Responder::handle`].
///
/// Bytes of a finished write come before the address match of the read that
/// follows it. Bytes past [`MAX_RX_BYTES`] are dropped; the transfer end and
/// the address match always fit, so a stretched clock is always released.
pub fn collect_events(
    received: impl IntoIterator<Item = u8>,
    transfer_complete: bool,
    address_matched: Option<TransferDirection>,
) -> BusEvents {
    let mut events = BusEvents::new();
    let mut push = |event: BusEvent| {
        if events.push(event).is_err() {
            log::error!("Dropped bus event {event:?}");
        }
    };

    for (index, byte) in received.into_iter().enumerate() {
        if index < MAX_RX_BYTES {
            push(BusEvent::ByteReceived(byte));
        } else {
            log::trace!("dropping extra byte {byte:#04x}");
        }
    }
    if transfer_complete {
        push(BusEvent::TransferComplete);
    }
    if let Some(direction) = address_matched {
        push(BusEvent::AddressMatched(direction));
    }

    events
}

/// Responder state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    /// Listening for our address.
    Idle,
    /// Address matched, transfer about to be armed.
    AddressMatched(TransferDirection),
    /// Waiting for the register-select byte.
    Receiving,
    /// A register snapshot is being clocked out.
    Transmitting {
        /// The register being read, `None` if nothing valid was selected.
        register: Option<RegisterSelect>,
        /// Bytes armed.
        len: usize,
    },
    /// A bus error was seen and recovery has not completed.
    Error(BusErrorFlags),
}

/// Low-level I2C slave peripheral operations.
pub trait SlavePeripheral {
    /// The peripheral error type.
    type Error: Debug;

    /// Configures the peripheral as a slave at `address` (7-bit).
    fn init(&mut self, address: u8) -> Result<(), Self::Error>;

    /// Disables the peripheral.
    fn deinit(&mut self) -> Result<(), Self::Error>;

    /// Clears latched error flags.
    fn clear_errors(&mut self, flags: BusErrorFlags);

    /// Starts listening for address matches.
    fn listen(&mut self) -> Result<(), Self::Error>;

    /// Arms reception of `len` bytes.
    fn arm_receive(&mut self, len: usize) -> Result<(), Self::Error>;

    /// Arms transmission of `bytes`.
    fn arm_transmit(&mut self, bytes: &[u8]) -> Result<(), Self::Error>;
}

/// Responder configuration.
#[derive(Debug, Clone, Copy)]
pub struct ResponderConfig {
    /// 7-bit slave address.
    pub address: u8,
}

impl Default for ResponderConfig {
    fn default() -> Self {
        Self {
            address: SLAVE_ADDRESS,
        }
    }
}

/// Serves register reads out of a [`SharedRegisters`].
pub struct Responder<'a, P> {
    peripheral: P,
    registers: &'a SharedRegisters,
    config: ResponderConfig,
    state: State,
    selected: Option<RegisterSelect>,
}

impl<'a, P, E> Responder<'a, P>
where
    P: SlavePeripheral<Error = E>,
    E: Debug,
{
    /// Creates a new `Responder`.
    ///
    /// # Arguments
    ///
    /// * `peripheral` - The I2C slave peripheral.
    /// * `registers` - The register file to serve.
    /// * `config` - Slave address.
    pub fn new(peripheral: P, registers: &'a SharedRegisters, config: ResponderConfig) -> Self {
        Self {
            peripheral,
            registers,
            config,
            state: State::Idle,
            selected: None,
        }
    }

    /// Initializes the peripheral and starts listening.
    pub fn start(&mut self) -> Result<(), ResponderError<E>> {
        self.peripheral
            .init(self.config.address)
            .and_then(|()| self.peripheral.listen())
            .map_err(ResponderError::Peripheral)?;
        self.state = State::Idle;
        log::info!("I2C slave listening at {:#04x}", self.config.address);
        Ok(())
    }

    /// Current state.
    pub fn state(&self) -> State {
        self.state
    }

    /// The register last selected by the master.
    pub fn selected(&self) -> Option<RegisterSelect> {
        self.selected
    }

    /// The underlying peripheral.
    pub fn peripheral(&self) -> &P {
        &self.peripheral
    }

    /// The underlying peripheral.
    pub fn peripheral_mut(&mut self) -> &mut P {
        &mut self.peripheral
    }

    /// Advances the state machine by one bus event.
    ///
    /// Meant to be called from the peripheral's interrupt handler.
    pub fn handle(&mut self, event: BusEvent) -> Result<(), ResponderError<E>> {
        if let BusEvent::Error(flags) = event {
            return self.recover(flags);
        }
        if let State::Error(flags) = self.state {
            // Previous recovery failed, retry before serving anything.
            self.recover(flags)?;
        }

        match event {
            BusEvent::AddressMatched(direction) => self.on_address_matched(direction),
            BusEvent::ByteReceived(byte) => {
                self.on_byte_received(byte);
                Ok(())
            }
            BusEvent::TransferComplete => {
                if self.state != State::Idle {
                    log::trace!("transfer complete in {:?}", self.state);
                }
                self.finish();
                Ok(())
            }
            BusEvent::ListenComplete => {
                self.finish();
                self.peripheral.listen().map_err(ResponderError::Peripheral)
            }
            BusEvent::Error(_) => Ok(()),
        }
    }

    fn on_address_matched(&mut self, direction: TransferDirection) -> Result<(), ResponderError<E>> {
        if self.state != State::Idle {
            log::debug!("repeated start in {:?}", self.state);
        }
        self.registers.set_busy(true);
        self.state = State::AddressMatched(direction);

        match direction {
            TransferDirection::Write => {
                self.peripheral
                    .arm_receive(1)
                    .map_err(|err| ResponderError::Peripheral(self.abort(err)))?;
                self.state = State::Receiving;
            }
            TransferDirection::Read => {
                let frame = match self.selected {
                    Some(register) => self.registers.snapshot(register),
                    None => {
                        let mut frame = crate::registers::TxFrame::new();
                        // Capacity is at least one byte.
                        let _ = frame.push(KEY_NONE);
                        frame
                    }
                };
                self.peripheral
                    .arm_transmit(&frame)
                    .map_err(|err| ResponderError::Peripheral(self.abort(err)))?;
                self.state = State::Transmitting {
                    register: self.selected,
                    len: frame.len(),
                };
            }
        }
        Ok(())
    }

    fn on_byte_received(&mut self, byte: u8) {
        if self.state != State::Receiving {
            log::warn!("Unexpected byte {byte:#04x} in {:?}", self.state);
            return;
        }

        self.selected = match RegisterSelect::try_from(byte) {
            Ok(register) => Some(register),
            Err(err) => {
                log::warn!("Master selected {err:?}");
                None
            }
        };
        self.finish();
    }

    fn finish(&mut self) {
        self.state = State::Idle;
        self.registers.set_busy(false);
    }

    fn abort(&mut self, err: E) -> E {
        log::warn!("Failed to arm transfer: {err:?}");
        self.finish();
        err
    }

    fn recover(&mut self, flags: BusErrorFlags) -> Result<(), ResponderError<E>> {
        log::warn!("I2C bus error: {flags:?}");
        self.state = State::Error(flags);
        self.registers.set_busy(false);

        let address = self.config.address;
        let peripheral = &mut self.peripheral;
        critical_section::with(|_| {
            peripheral.clear_errors(flags);
            peripheral.deinit()?;
            peripheral.init(address)?;
            peripheral.listen()
        })
        .map_err(ResponderError::Peripheral)?;

        self.state = State::Idle;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::vec::Vec;

    use bbq10_protocol::{TrackballPayload, CLICK_SENTINEL};

    use super::*;
    use crate::err::BusErrorBit;

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Call {
        Init(u8),
        Deinit,
        ClearErrors(BusErrorFlags),
        Listen,
        ArmReceive(usize),
        ArmTransmit(Vec<u8>),
    }

    #[derive(Debug, PartialEq, Eq)]
    struct MockError;

    #[derive(Default)]
    struct MockPeripheral {
        calls: Vec<Call>,
        fail_init: bool,
    }

    impl MockPeripheral {
        fn take(&mut self) -> Vec<Call> {
            core::mem::take(&mut self.calls)
        }
    }

    impl SlavePeripheral for MockPeripheral {
        type Error = MockError;

        fn init(&mut self, address: u8) -> Result<(), Self::Error> {
            self.calls.push(Call::Init(address));
            if self.fail_init {
                return Err(MockError);
            }
            Ok(())
        }

        fn deinit(&mut self) -> Result<(), Self::Error> {
            self.calls.push(Call::Deinit);
            Ok(())
        }

        fn clear_errors(&mut self, flags: BusErrorFlags) {
            self.calls.push(Call::ClearErrors(flags));
        }

        fn listen(&mut self) -> Result<(), Self::Error> {
            self.calls.push(Call::Listen);
            Ok(())
        }

        fn arm_receive(&mut self, len: usize) -> Result<(), Self::Error> {
            self.calls.push(Call::ArmReceive(len));
            Ok(())
        }

        fn arm_transmit(&mut self, bytes: &[u8]) -> Result<(), Self::Error> {
            self.calls.push(Call::ArmTransmit(bytes.to_vec()));
            Ok(())
        }
    }

    fn started(registers: &SharedRegisters) -> Responder<'_, MockPeripheral> {
        let mut responder =
            Responder::new(MockPeripheral::default(), registers, ResponderConfig::default());
        responder.start().unwrap();
        assert_eq!(responder.peripheral_mut().take(), [Call::Init(0x52), Call::Listen]);
        responder
    }

    fn select(responder: &mut Responder<'_, MockPeripheral>, code: u8) {
        responder
            .handle(BusEvent::AddressMatched(TransferDirection::Write))
            .unwrap();
        assert_eq!(responder.state(), State::Receiving);
        responder.handle(BusEvent::ByteReceived(code)).unwrap();
    }

    fn read(responder: &mut Responder<'_, MockPeripheral>) -> Vec<u8> {
        responder
            .handle(BusEvent::AddressMatched(TransferDirection::Read))
            .unwrap();
        let calls = responder.peripheral_mut().take();
        responder.handle(BusEvent::TransferComplete).unwrap();
        match calls.as_slice() {
            [Call::ArmTransmit(bytes)] => bytes.clone(),
            other => panic!("unexpected calls {other:?}"),
        }
    }

    #[test]
    fn keyboard_read() {
        let registers = SharedRegisters::new();
        registers.set_keyboard(b'q');
        let mut responder = started(&registers);

        select(&mut responder, 0x10);
        assert_eq!(responder.peripheral_mut().take(), [Call::ArmReceive(1)]);
        assert_eq!(responder.selected(), Some(RegisterSelect::Keyboard));
        assert!(!registers.is_busy());

        responder
            .handle(BusEvent::AddressMatched(TransferDirection::Read))
            .unwrap();
        assert!(registers.is_busy());
        assert_eq!(
            responder.state(),
            State::Transmitting {
                register: Some(RegisterSelect::Keyboard),
                len: 1
            }
        );
        assert_eq!(responder.peripheral_mut().take(), [Call::ArmTransmit(b"q".to_vec())]);

        responder.handle(BusEvent::TransferComplete).unwrap();
        assert_eq!(responder.state(), State::Idle);
        assert!(!registers.is_busy());
    }

    #[test]
    fn trackball_read_and_persistent_selection() {
        let registers = SharedRegisters::new();
        registers.set_trackball(TrackballPayload::Motion { dx: 5, dy: -2 });
        let mut responder = started(&registers);

        select(&mut responder, 0x20);
        responder.peripheral_mut().take();
        assert_eq!(read(&mut responder), [0x00, 0x05, 0xFF, 0xFE]);

        registers.set_trackball(TrackballPayload::Click);
        assert_eq!(read(&mut responder), CLICK_SENTINEL);
    }

    #[test]
    fn unknown_or_missing_selection_reads_zero() {
        let registers = SharedRegisters::new();
        registers.set_keyboard(b'a');
        let mut responder = started(&registers);

        assert_eq!(read(&mut responder), [0x00]);

        select(&mut responder, 0x30);
        responder.peripheral_mut().take();
        assert_eq!(responder.selected(), None);
        assert_eq!(read(&mut responder), [0x00]);
    }

    #[test]
    fn repeated_start_switches_to_read() {
        let registers = SharedRegisters::new();
        registers.set_keyboard(b'z');
        let mut responder = started(&registers);

        responder
            .handle(BusEvent::AddressMatched(TransferDirection::Write))
            .unwrap();
        responder.handle(BusEvent::ByteReceived(0x10)).unwrap();
        responder.peripheral_mut().take();
        // No stop between the select byte and the read.
        assert_eq!(read(&mut responder), b"z");
    }

    #[test]
    fn stray_byte_is_ignored() {
        let registers = SharedRegisters::new();
        let mut responder = started(&registers);
        select(&mut responder, 0x20);

        responder.handle(BusEvent::ByteReceived(0x10)).unwrap();
        assert_eq!(responder.selected(), Some(RegisterSelect::Trackball));
        assert_eq!(responder.state(), State::Idle);
    }

    #[test]
    fn bus_error_recovers_to_idle() {
        let registers = SharedRegisters::new();
        registers.set_keyboard(b'x');
        let mut responder = started(&registers);

        responder
            .handle(BusEvent::AddressMatched(TransferDirection::Write))
            .unwrap();
        assert!(registers.is_busy());
        responder.peripheral_mut().take();

        let flags = BusErrorFlags::from(BusErrorBit::ArbitrationLost);
        responder.handle(BusEvent::Error(flags)).unwrap();

        assert_eq!(
            responder.peripheral_mut().take(),
            [
                Call::ClearErrors(flags),
                Call::Deinit,
                Call::Init(0x52),
                Call::Listen
            ]
        );
        assert_eq!(responder.state(), State::Idle);
        assert!(!registers.is_busy());

        // A fresh transaction works after recovery.
        select(&mut responder, 0x10);
        responder.peripheral_mut().take();
        assert_eq!(read(&mut responder), b"x");
    }

    #[test]
    fn failed_recovery_is_retried() {
        let registers = SharedRegisters::new();
        let mut responder = started(&registers);

        responder.peripheral_mut().fail_init = true;
        let flags = BusErrorFlags::from(BusErrorBit::BitError);
        assert!(responder.handle(BusEvent::Error(flags)).is_err());
        assert_eq!(responder.state(), State::Error(flags));
        assert!(!registers.is_busy());

        responder.peripheral_mut().fail_init = false;
        responder.peripheral_mut().take();
        responder
            .handle(BusEvent::AddressMatched(TransferDirection::Write))
            .unwrap();
        assert_eq!(
            responder.peripheral_mut().take(),
            [
                Call::ClearErrors(flags),
                Call::Deinit,
                Call::Init(0x52),
                Call::Listen,
                Call::ArmReceive(1)
            ]
        );
        assert_eq!(responder.state(), State::Receiving);
    }

    #[test]
    fn control_events_survive_a_full_fifo() {
        let events = collect_events(0..40, true, Some(TransferDirection::Read));

        assert_eq!(events.len(), BUS_EVENTS_CAPACITY);
        assert_eq!(events[0], BusEvent::ByteReceived(0));
        assert_eq!(events[MAX_RX_BYTES - 1], BusEvent::ByteReceived(31));
        assert_eq!(
            &events[MAX_RX_BYTES..],
            [
                BusEvent::TransferComplete,
                BusEvent::AddressMatched(TransferDirection::Read)
            ]
        );
    }

    #[test]
    fn one_interrupt_selects_then_reads() {
        let registers = SharedRegisters::new();
        registers.set_keyboard(b'z');
        let mut responder = started(&registers);
        responder
            .handle(BusEvent::AddressMatched(TransferDirection::Write))
            .unwrap();
        responder.peripheral_mut().take();

        for event in collect_events([0x10], true, Some(TransferDirection::Read)) {
            responder.handle(event).unwrap();
        }

        assert_eq!(responder.peripheral_mut().take(), [Call::ArmTransmit(b"z".to_vec())]);
        assert_eq!(
            responder.state(),
            State::Transmitting {
                register: Some(RegisterSelect::Keyboard),
                len: 1
            }
        );
        assert!(registers.is_busy());
    }

    #[test]
    fn listen_complete_relistens() {
        let registers = SharedRegisters::new();
        let mut responder = started(&registers);

        responder.handle(BusEvent::ListenComplete).unwrap();
        assert_eq!(responder.peripheral_mut().take(), [Call::Listen]);
        assert_eq!(responder.state(), State::Idle);
    }
}
