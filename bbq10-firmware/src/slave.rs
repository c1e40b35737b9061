//! I2C0 as a slave.
//!
//! esp-hal only ships a master driver. The pins and peripheral clock are set
//! up through it (see [`crate::board::Board`]) and this module switches the
//! controller into slave mode at register level.
//!
//! Clock stretching on address match gives the responder time to fill the
//! TX FIFO before the first bit of a read goes out.

use core::cell::RefCell;
use core::convert::Infallible;

use bbq10_i2c_slave_async::{
    err::{BusErrorBit, BusErrorFlags},
    registers::SharedRegisters,
    responder::{
        collect_events, BusEvent, BusEvents, Responder, ResponderConfig, SlavePeripheral,
        TransferDirection, MAX_RX_BYTES,
    },
};
use embassy_sync::blocking_mutex::{raw::CriticalSectionRawMutex, Mutex};
use esp_hal::{handler, interrupt::Priority, peripherals::I2C0};

const RXFIFO_WM: u32 = 1 << 0;
const RXFIFO_OVF: u32 = 1 << 2;
const ARBITRATION_LOST: u32 = 1 << 5;
const TRANS_COMPLETE: u32 = 1 << 7;
const TIME_OUT: u32 = 1 << 8;
const TXFIFO_OVF: u32 = 1 << 11;
const RXFIFO_UDF: u32 = 1 << 12;
const SCL_ST_TO: u32 = 1 << 13;
const SLAVE_STRETCH: u32 = 1 << 16;

const OVERRUN: u32 = RXFIFO_OVF | TXFIFO_OVF | RXFIFO_UDF;
const ERRORS: u32 = ARBITRATION_LOST | TIME_OUT | SCL_ST_TO | OVERRUN;
const LISTEN: u32 = RXFIFO_WM | TRANS_COMPLETE | SLAVE_STRETCH | ERRORS;
const ALL: u32 = 0x3_FFFF;

/// `SR.STRETCH_CAUSE` when the stretch follows an address match.
const STRETCH_ADDRESS_MATCH: u8 = 0;

/// Registers served to the host.
pub static REGISTERS: SharedRegisters = SharedRegisters::new();

type SlaveResponder = Responder<'static, EspI2cSlave>;

static RESPONDER: Mutex<CriticalSectionRawMutex, RefCell<Option<SlaveResponder>>> =
    Mutex::new(RefCell::new(None));

/// Register-level handle to I2C0 in slave mode.
pub struct EspI2cSlave {
    _private: (),
}

impl EspI2cSlave {
    fn reset_fifos() {
        let regs = I2C0::regs();
        regs.fifo_conf()
            .modify(|_, w| w.rx_fifo_rst().set_bit().tx_fifo_rst().set_bit());
        regs.fifo_conf()
            .modify(|_, w| w.rx_fifo_rst().clear_bit().tx_fifo_rst().clear_bit());
    }

    fn release_stretch() {
        I2C0::regs()
            .scl_stretch_conf()
            .modify(|_, w| w.slave_scl_stretch_clr().set_bit());
    }

    /// Reads and acknowledges pending interrupts and turns them into bus
    /// events.
    fn take_events() -> BusEvents {
        let regs = I2C0::regs();
        let status = regs.int_st().read().bits();
        regs.int_clr().write(|w| unsafe { w.bits(status) });

        if status & ERRORS != 0 {
            let mut flags = BusErrorFlags::none();
            if status & ARBITRATION_LOST != 0 {
                flags = flags.combine(BusErrorBit::ArbitrationLost);
            }
            if status & (TIME_OUT | SCL_ST_TO) != 0 {
                flags = flags.combine(BusErrorBit::BitError);
            }
            if status & OVERRUN != 0 {
                flags = flags.combine(BusErrorBit::Overrun);
            }
            return BusEvents::from_slice(&[BusEvent::Error(flags)]).unwrap_or_default();
        }

        let sr = regs.sr().read();

        let pending = if status & (RXFIFO_WM | TRANS_COMPLETE) != 0 {
            usize::from(sr.rxfifo_cnt().bits()).min(MAX_RX_BYTES)
        } else {
            0
        };
        let received = (0..pending).map(|_| regs.data().read().fifo_rdata().bits());

        let address_matched = (status & SLAVE_STRETCH != 0
            && sr.stretch_cause().bits() == STRETCH_ADDRESS_MATCH)
            .then(|| {
                if sr.slave_rw().bit_is_set() {
                    TransferDirection::Read
                } else {
                    TransferDirection::Write
                }
            });

        collect_events(received, status & TRANS_COMPLETE != 0, address_matched)
    }
}

impl SlavePeripheral for EspI2cSlave {
    type Error = Infallible;

    fn init(&mut self, address: u8) -> Result<(), Self::Error> {
        let regs = I2C0::regs();
        regs.ctr().modify(|_, w| {
            w.ms_mode()
                .clear_bit()
                .slv_tx_auto_start_en()
                .set_bit()
        });
        regs.slave_addr().write(|w| {
            unsafe { w.slave_addr().bits(u16::from(address)) }
                .addr_10bit_en()
                .clear_bit()
        });
        regs.fifo_conf().modify(|_, w| {
            unsafe { w.rxfifo_wm_thrhd().bits(1) }
                .nonfifo_en()
                .clear_bit()
                .fifo_addr_cfg_en()
                .clear_bit()
        });
        Self::reset_fifos();
        regs.scl_stretch_conf()
            .modify(|_, w| w.slave_scl_stretch_en().set_bit());
        regs.ctr().modify(|_, w| w.conf_upgate().set_bit());
        Ok(())
    }

    fn deinit(&mut self) -> Result<(), Self::Error> {
        let regs = I2C0::regs();
        regs.int_ena().write(|w| unsafe { w.bits(0) });
        regs.scl_stretch_conf()
            .modify(|_, w| w.slave_scl_stretch_en().clear_bit());
        Self::reset_fifos();
        Ok(())
    }

    fn clear_errors(&mut self, flags: BusErrorFlags) {
        log::debug!("clearing {flags:?}");
        I2C0::regs().int_clr().write(|w| unsafe { w.bits(ERRORS) });
    }

    fn listen(&mut self) -> Result<(), Self::Error> {
        let regs = I2C0::regs();
        regs.int_clr().write(|w| unsafe { w.bits(ALL) });
        regs.int_ena().write(|w| unsafe { w.bits(LISTEN) });
        Ok(())
    }

    fn arm_receive(&mut self, len: usize) -> Result<(), Self::Error> {
        log::trace!("receiving {len} byte(s)");
        Self::release_stretch();
        Ok(())
    }

    fn arm_transmit(&mut self, bytes: &[u8]) -> Result<(), Self::Error> {
        let regs = I2C0::regs();
        regs.fifo_conf().modify(|_, w| w.tx_fifo_rst().set_bit());
        regs.fifo_conf().modify(|_, w| w.tx_fifo_rst().clear_bit());
        for &byte in bytes {
            regs.data().write(|w| unsafe { w.fifo_rdata().bits(byte) });
        }
        Self::release_stretch();
        Ok(())
    }
}

/// Puts I2C0 into slave mode and starts serving [`REGISTERS`].
pub fn start(i2c: &mut esp_hal::i2c::master::I2c<'static, esp_hal::Blocking>, config: ResponderConfig) {
    i2c.set_interrupt_handler(i2c_slave_interrupt);

    RESPONDER.lock(|cell| {
        let mut slot = cell.borrow_mut();
        let responder = slot.insert(Responder::new(EspI2cSlave { _private: () }, &REGISTERS, config));
        if let Err(err) = responder.start() {
            log::error!("Failed to start I2C slave: {err:?}");
        }
    });
}

/// Bound above the GPIO interrupts so bus events are never delayed by
/// trackball pulses.
#[handler(priority = Priority::Priority3)]
fn i2c_slave_interrupt() {
    let events = EspI2cSlave::take_events();

    RESPONDER.lock(|cell| {
        let mut responder = cell.borrow_mut();
        let Some(responder) = responder.as_mut() else {
            return;
        };
        for event in events {
            if let Err(err) = responder.handle(event) {
                log::warn!("I2C slave event {event:?} failed: {err:?}");
            }
        }
    });
}
