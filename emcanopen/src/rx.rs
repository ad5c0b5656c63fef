use emcanopen_core::{AcceptanceMask, CobId};
use emcanopen_driver::frame::Frame;
use emcanopen_driver::periphery::{FilterConfig, Periphery, RxFifo};

use crate::error::Error;
use crate::module::CanModule;

/// Receiver of frames matched to a configured slot
///
/// `on_frame` runs synchronously in the receive interrupt context and must
/// neither block nor allocate. It may call back into the owning module, e.g.
/// to queue a response with [`CanModule::send`].
pub trait RxHandler {
    fn on_frame(&self, frame: &Frame);
}

impl<F: Fn(&Frame)> RxHandler for F {
    fn on_frame(&self, frame: &Frame) {
        self(frame)
    }
}

/// One receive filter slot
///
/// A cleared slot has no handler and takes no part in matching.
#[derive(Clone, Copy)]
pub struct RxSlot<'a> {
    pub(crate) pattern: CobId,
    pub(crate) mask: AcceptanceMask,
    pub(crate) handler: Option<&'a (dyn RxHandler + Sync)>,
}

impl RxSlot<'_> {
    pub const fn new() -> Self {
        Self {
            pattern: CobId::new_truncating(0, false),
            mask: AcceptanceMask::NONE,
            handler: None,
        }
    }

    pub(crate) fn clear(&mut self) {
        *self = Self::new();
    }
}

impl Default for RxSlot<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a, P: Periphery> CanModule<'a, P> {
    /// Installs a receive filter and handler at `index`, overwriting any
    /// prior configuration of that slot.
    ///
    /// The identifier and mask are packed together with the RTR flag; the
    /// RTR position of the mask is always compared. With hardware filtering
    /// enabled the slot's pattern is also programmed into the filter bank
    /// matching its index; otherwise a single accept-all bank keeps every
    /// frame flowing into the FIFO and matching happens at dispatch time.
    pub fn configure_rx(
        &self,
        index: usize,
        ident: u16,
        mask: u16,
        rtr: bool,
        handler: &'a (dyn RxHandler + Sync),
    ) -> Result<(), Error> {
        let pattern = CobId::new(ident, rtr).ok_or(Error::IllegalArgument)?;
        let mask = AcceptanceMask::new_truncating(mask);

        self.shared.lock(|cell| {
            let mut shared = cell.borrow_mut();
            let shared = &mut *shared;

            let slot = shared.rx.get_mut(index).ok_or(Error::IllegalArgument)?;
            slot.pattern = pattern;
            slot.mask = mask;
            slot.handler = Some(handler);

            let (bank, filter) = if shared.use_hardware_filters {
                (index, FilterConfig::Match { pattern, mask })
            } else {
                (0, FilterConfig::AcceptAll)
            };
            shared.periphery.set_filter(bank, filter)?;
            Ok(())
        })
    }

    /// Receive event entry point.
    ///
    /// Takes the pending frame out of `fifo` and scans the configured receive
    /// slots in array order; the first slot whose pattern matches under its
    /// mask terminates the scan. A frame matching no slot is dropped
    /// silently. Performs no allocation and no blocking; the matched handler
    /// runs after the critical section is released so it may call back into
    /// the module.
    pub fn on_frame_received(&self, fifo: RxFifo) {
        let matched = self.shared.lock(|cell| {
            let mut shared = cell.borrow_mut();
            let shared = &mut *shared;

            if !shared.normal_mode {
                return None;
            }
            let frame = shared.periphery.get_message(fifo)?;

            let slot = shared.rx.iter().find(|slot| {
                slot.handler.is_some() && frame.cob_id.matches(slot.pattern, slot.mask)
            })?;
            slot.handler.map(|handler| (handler, frame))
        });

        if let Some((handler, frame)) = matched {
            handler.on_frame(&frame);
        }
    }
}
