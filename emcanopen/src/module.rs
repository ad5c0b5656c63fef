use core::cell::RefCell;

use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use emcanopen_driver::config::BitRate;
use emcanopen_driver::emergency::Emergency;
use emcanopen_driver::periphery::{ErrorFlags, Notifications, Periphery};

use crate::error::Error;
use crate::rx::RxSlot;
use crate::tx::TxSlot;

/// CAN module object
///
/// Owns the receive and transmit slot arrays, the lifecycle flags and the
/// peripheral handle. One instance per CAN interface; the application's
/// interrupt handlers resolve their own instance and call
/// [`on_frame_received`](Self::on_frame_received) and
/// [`on_mailbox_free`](Self::on_mailbox_free) on it.
///
/// All methods take `&self`; state shared between the interrupt and task
/// contexts lives behind a critical-section mutex and is only held for short,
/// bounded sections. Receive handlers and fault reports are invoked with the
/// lock released.
pub struct CanModule<'a, P: Periphery> {
    pub(crate) shared: Mutex<CriticalSectionRawMutex, RefCell<Shared<'a, P>>>,
    pub(crate) em: &'a (dyn Emergency + Sync),
}

pub(crate) struct Shared<'a, P> {
    pub(crate) periphery: P,
    pub(crate) rx: &'a mut [RxSlot<'a>],
    pub(crate) tx: &'a mut [TxSlot],
    /// Gate for interrupt-driven operation.
    pub(crate) normal_mode: bool,
    pub(crate) use_hardware_filters: bool,
    /// A sync-tagged frame occupies a mailbox and may need cancellation.
    pub(crate) sync_inhibit: bool,
    /// The bootup frame has not left the module yet.
    pub(crate) first_tx_message: bool,
    pub(crate) pending_tx_count: u16,
    pub(crate) last_error_flags: ErrorFlags,
}

impl<'a, P: Periphery> CanModule<'a, P> {
    /// Creates the module and initializes the periphery.
    ///
    /// Clears every slot, stops the peripheral and programs its timing for
    /// `bit_rate_kbit`. The peripheral stays stopped afterwards; call
    /// [`set_normal_mode`](Self::set_normal_mode) to start operation.
    pub fn new(
        mut periphery: P,
        rx: &'a mut [RxSlot<'a>],
        tx: &'a mut [TxSlot],
        bit_rate_kbit: u16,
        em: &'a (dyn Emergency + Sync),
    ) -> Result<Self, Error> {
        let bit_rate = BitRate::from_kbit(bit_rate_kbit).ok_or(Error::IllegalBaudrate)?;

        for slot in rx.iter_mut() {
            slot.clear();
        }
        for slot in tx.iter_mut() {
            slot.clear();
        }

        periphery.stop();
        periphery.apply_timing(&bit_rate.timing())?;

        Ok(Self {
            shared: Mutex::new(RefCell::new(Shared {
                periphery,
                rx,
                tx,
                normal_mode: false,
                use_hardware_filters: false,
                sync_inhibit: false,
                first_tx_message: true,
                pending_tx_count: 0,
                last_error_flags: ErrorFlags::NONE,
            })),
            em,
        })
    }

    /// Returns the module to the configured state, e.g. on a communication
    /// reset.
    ///
    /// Clears every slot's match and full state, resets counters and flags
    /// and reprograms the stopped peripheral, as on creation. Receive
    /// handlers and transmit headers must be configured again afterwards.
    pub fn reinit(&self, bit_rate_kbit: u16) -> Result<(), Error> {
        let bit_rate = BitRate::from_kbit(bit_rate_kbit).ok_or(Error::IllegalBaudrate)?;

        self.shared.lock(|cell| {
            let mut shared = cell.borrow_mut();
            let shared = &mut *shared;

            for slot in shared.rx.iter_mut() {
                slot.clear();
            }
            for slot in shared.tx.iter_mut() {
                slot.clear();
            }
            shared.normal_mode = false;
            shared.use_hardware_filters = false;
            shared.sync_inhibit = false;
            shared.first_tx_message = true;
            shared.pending_tx_count = 0;
            shared.last_error_flags = ErrorFlags::NONE;

            shared.periphery.stop();
            shared.periphery.apply_timing(&bit_rate.timing())?;
            Ok(())
        })
    }

    /// Starts the peripheral and enables its receive and mailbox-empty
    /// notifications.
    ///
    /// The module enters normal (interrupt-driven) operation only if both
    /// steps succeed; on a hardware error the caller is free to retry.
    pub fn set_normal_mode(&self) -> Result<(), Error> {
        self.shared.lock(|cell| {
            let mut shared = cell.borrow_mut();

            shared.periphery.start()?;
            shared.periphery.activate_notifications(
                Notifications::RX_FIFO0_MESSAGE_PENDING
                    | Notifications::RX_FIFO1_MESSAGE_PENDING
                    | Notifications::TX_MAILBOX_EMPTY,
            )?;
            shared.normal_mode = true;
            Ok(())
        })
    }

    /// Stops the peripheral. Idempotent; the module stays valid and can be
    /// re-enabled with [`set_normal_mode`](Self::set_normal_mode).
    pub fn disable(&self) {
        self.shared.lock(|cell| {
            let mut shared = cell.borrow_mut();
            shared.normal_mode = false;
            shared.periphery.stop();
        });
    }

    /// Selects between hardware acceptance filtering and the accept-all
    /// pass-through used with software filtering. Takes effect for subsequent
    /// [`configure_rx`](Self::configure_rx) calls.
    pub fn set_hardware_filtering(&self, enable: bool) {
        self.shared.lock(|cell| {
            cell.borrow_mut().use_hardware_filters = enable;
        });
    }
}
