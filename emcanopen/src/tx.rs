use emcanopen_core::{CobId, EmergencyCode, FaultCode};
use emcanopen_driver::frame::{Data, DataLength, Frame};
use emcanopen_driver::periphery::{Periphery, PeripheryError};

use crate::error::Error;
use crate::module::CanModule;

/// One transmit slot
///
/// `full` marks a frame that is queued but not yet handed to a hardware
/// mailbox. At most one frame per slot is in flight at any time.
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TxSlot {
    pub(crate) cob_id: CobId,
    pub(crate) data: Data,
    pub(crate) sync_frame: bool,
    pub(crate) full: bool,
}

impl TxSlot {
    pub const fn new() -> Self {
        Self {
            cob_id: CobId::new_truncating(0, false),
            data: Data::new_zeros(DataLength::ZERO),
            sync_frame: false,
            full: false,
        }
    }

    pub(crate) fn clear(&mut self) {
        *self = Self::new();
    }
}

impl Default for TxSlot {
    fn default() -> Self {
        Self::new()
    }
}

/// Token for a configured transmit slot
///
/// Only [`CanModule::configure_tx`] creates handles, so a handle's index is
/// always in range for the module that issued it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TxHandle(pub(crate) usize);

enum SendOutcome {
    Done,
    BadLength,
    Overflow { report: Option<CobId> },
    Hardware(PeripheryError),
}

impl<'a, P: Periphery> CanModule<'a, P> {
    /// Configures the transmit slot at `index` and returns its handle.
    ///
    /// Sets the slot's identifier, RTR flag, payload length and sync tag and
    /// marks it not full. A frame still queued in the slot is discarded
    /// without adjusting the pending count; the drain recovers the count on
    /// its next fruitless scan.
    pub fn configure_tx(
        &self,
        index: usize,
        ident: u16,
        rtr: bool,
        length: usize,
        sync_frame: bool,
    ) -> Result<TxHandle, Error> {
        let cob_id = CobId::new(ident, rtr).ok_or(Error::IllegalArgument)?;
        let length = DataLength::new(length).ok_or(Error::IllegalArgument)?;

        self.shared.lock(|cell| {
            let mut shared = cell.borrow_mut();

            let slot = shared.tx.get_mut(index).ok_or(Error::IllegalArgument)?;
            slot.cob_id = cob_id;
            slot.data = Data::new_zeros(length);
            slot.sync_frame = sync_frame;
            slot.full = false;

            Ok(TxHandle(index))
        })
    }

    /// Queues a frame for transmission. Never blocks.
    ///
    /// `payload` must match the slot's configured length. If a hardware
    /// mailbox is free and nothing else is pending, the frame goes straight
    /// to the mailbox; a failure of the hardware handoff is surfaced as
    /// [`Error::Hardware`] and the frame is not requeued. Otherwise the slot
    /// is marked full and waits for a mailbox-free drain.
    ///
    /// Calling `send` while the slot is still full is an overflow: the queued
    /// frame stays untouched, [`Error::TxOverflow`] is returned and a fault
    /// is reported, except while the bootup frame has not left the module.
    pub fn send(&self, handle: TxHandle, payload: &[u8]) -> Result<(), Error> {
        let outcome = self.shared.lock(|cell| {
            let mut shared = cell.borrow_mut();
            let shared = &mut *shared;

            let slot = &mut shared.tx[handle.0];
            if payload.len() != slot.data.length().as_usize() {
                return SendOutcome::BadLength;
            }
            if slot.full {
                let report = (!shared.first_tx_message).then_some(slot.cob_id);
                return SendOutcome::Overflow { report };
            }
            slot.data.copy_from_slice(payload);

            if shared.pending_tx_count == 0 && shared.periphery.free_mailbox_count() > 0 {
                shared.sync_inhibit = slot.sync_frame;
                let frame = Frame::new(slot.cob_id, slot.data);
                // The mailbox id is not tracked; completion arrives as a
                // mailbox-free notification.
                match shared.periphery.add_message(&frame) {
                    Ok(_) => SendOutcome::Done,
                    Err(e) => SendOutcome::Hardware(e),
                }
            } else {
                slot.full = true;
                shared.pending_tx_count += 1;
                SendOutcome::Done
            }
        });

        match outcome {
            SendOutcome::Done => Ok(()),
            SendOutcome::BadLength => Err(Error::IllegalArgument),
            SendOutcome::Overflow { report } => {
                if let Some(cob_id) = report {
                    self.em.report(
                        FaultCode::CanTxOverflow,
                        EmergencyCode::CanOverrun,
                        cob_id.into_bits().into(),
                    );
                }
                Err(Error::TxOverflow)
            }
            SendOutcome::Hardware(e) => Err(Error::Hardware(e)),
        }
    }

    /// Mailbox-free event entry point.
    ///
    /// No-op while no mailbox is free. Otherwise the bootup and inhibit
    /// state is cleared and the first full slot in array order is handed to
    /// the hardware; lower indices win over insertion order. A failed
    /// handoff leaves the slot queued for the next drain.
    pub fn on_mailbox_free(&self) {
        let healed = self.shared.lock(|cell| {
            let mut shared = cell.borrow_mut();
            let shared = &mut *shared;

            if !shared.normal_mode || shared.periphery.free_mailbox_count() == 0 {
                return false;
            }

            // The bootup frame left the module; clear the previous frame's
            // inhibit state.
            shared.first_tx_message = false;
            shared.sync_inhibit = false;

            if shared.pending_tx_count == 0 {
                return false;
            }

            for slot in shared.tx.iter_mut() {
                if slot.full {
                    shared.sync_inhibit = slot.sync_frame;
                    let frame = Frame::new(slot.cob_id, slot.data);
                    if shared.periphery.add_message(&frame).is_ok() {
                        slot.full = false;
                        shared.pending_tx_count = shared.pending_tx_count.saturating_sub(1);
                    }
                    return false;
                }
            }

            // Counter said frames were pending but no slot is full.
            shared.pending_tx_count = 0;
            true
        });

        if healed {
            warn!("pending TX count diverged from slot flags, reset to 0");
        }
    }

    /// Discards queued and in-flight sync-tagged frames, e.g. when the
    /// synchronization window resets.
    ///
    /// Clears the inhibit state of an in-flight sync frame and every full
    /// sync-tagged slot, decrementing the pending count per removal. If
    /// anything was discarded, one fault is reported with the deletion count
    /// as auxiliary data.
    pub fn clear_pending_sync_frames(&self) {
        let deleted = self.shared.lock(|cell| {
            let mut shared = cell.borrow_mut();
            let shared = &mut *shared;

            let mut deleted: u32 = 0;
            if shared.sync_inhibit {
                shared.sync_inhibit = false;
                deleted += 1;
            }
            if shared.pending_tx_count != 0 {
                for slot in shared.tx.iter_mut() {
                    if slot.full && slot.sync_frame {
                        slot.full = false;
                        shared.pending_tx_count = shared.pending_tx_count.saturating_sub(1);
                        deleted += 1;
                    }
                }
            }
            deleted
        });

        if deleted != 0 {
            self.em.report(
                FaultCode::TxOutsideSyncWindow,
                EmergencyCode::Communication,
                deleted,
            );
        }
    }
}
