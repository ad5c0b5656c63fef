//! Fault reporting seam towards the emergency subsystem
//!
//! The CAN module is a producer of discrete, edge-triggered fault events; it
//! never stores them itself. The emergency subsystem owns the error status
//! storage and the emergency message production.

use emcanopen_core::{EmergencyCode, FaultCode};

/// Consumer of fault condition reports
///
/// Methods take `&self` and may be called from interrupt context as well as
/// from the supervision task, so implementations must use interior
/// synchronization (an atomic status word is sufficient). Reporting an
/// already-active fault or resetting an inactive one is a no-op on the
/// consumer side.
pub trait Emergency {
    /// Marks a fault condition active and classifies it with a CiA 301
    /// emergency error code. `aux` carries condition-specific detail, e.g.
    /// the affected identifier or the raw error status.
    fn report(&self, code: FaultCode, class: EmergencyCode, aux: u32);

    /// Marks a fault condition inactive.
    fn reset(&self, code: FaultCode, aux: u32);

    /// Whether a fault condition is currently marked active.
    fn is_active(&self, code: FaultCode) -> bool;
}
