use emcanopen_core::{EmergencyCode, FaultCode};
use emcanopen_driver::periphery::{ErrorFlags, Periphery, PeripheryError};

use crate::module::CanModule;

/// Errors returned by CAN module operations
///
/// Fault conditions detected during normal operation (bus-off, warning,
/// passive, receive overflow, sync-window violations) are not errors in this
/// sense; they are reported through the emergency seam instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// An index or value outside the configured range was passed.
    IllegalArgument,
    /// The requested bit rate is not in the supported set.
    IllegalBaudrate,
    /// An underlying peripheral call failed. The operation is not retried.
    Hardware(PeripheryError),
    /// The transmit slot still holds a frame that was never flushed.
    TxOverflow,
}

impl From<PeripheryError> for Error {
    fn from(value: PeripheryError) -> Self {
        Error::Hardware(value)
    }
}

impl<'a, P: Periphery> CanModule<'a, P> {
    /// Periodic error supervision.
    ///
    /// Compares the peripheral's current error status against the last
    /// observed one and converts transitions into discrete fault events; an
    /// unchanged status produces no report at all, so a persistent condition
    /// is reported exactly once. Bus-off takes precedence over the warning
    /// and passive evaluation; receive FIFO overruns are evaluated
    /// independently.
    pub fn check_errors(&self) {
        let changed = self.shared.lock(|cell| {
            let mut shared = cell.borrow_mut();

            let flags = shared.periphery.error_flags();
            if flags == shared.last_error_flags {
                return None;
            }
            shared.last_error_flags = flags;
            Some((flags, shared.first_tx_message))
        });
        let Some((flags, first_tx_message)) = changed else {
            return;
        };

        let aux = flags.into_bits();
        if flags.contains(ErrorFlags::BUS_OFF) {
            self.em
                .report(FaultCode::CanTxBusOff, EmergencyCode::BusOffRecovered, aux);
        } else {
            self.em.reset(FaultCode::CanTxBusOff, aux);

            // An empty status is the peripheral's no-error indication.
            if flags.contains(ErrorFlags::WARNING) {
                self.em
                    .report(FaultCode::CanBusWarning, EmergencyCode::NoError, aux);
            } else {
                self.em.reset(FaultCode::CanBusWarning, aux);
            }

            if flags.contains(ErrorFlags::PASSIVE) {
                // Suppressed while the bootup frame is still on the way out.
                if !first_tx_message {
                    self.em
                        .report(FaultCode::CanTxBusPassive, EmergencyCode::CanPassive, aux);
                }
            } else if self.em.is_active(FaultCode::CanTxBusPassive) {
                self.em.reset(FaultCode::CanTxBusPassive, aux);
                self.em.reset(FaultCode::CanTxOverflow, aux);
            }
        }

        if flags.intersects(ErrorFlags::RX_FIFO0_OVERRUN | ErrorFlags::RX_FIFO1_OVERRUN) {
            // The equality guard above already suppresses repeats.
            self.em
                .report(FaultCode::CanRxOverflow, EmergencyCode::CanOverrun, aux);
        }
    }
}
