//! CAN peripheral abstraction consumed by the CAN module
//!
//! Implementations wrap a concrete peripheral (bxCAN, FDCAN, a test double)
//! and expose the small surface the module needs: lifecycle control, mailbox
//! access, receive FIFO access and the raw error status. Register and
//! bit-timing programming details stay behind this trait.

use crate::config::NominalBitTiming;
use crate::frame::Frame;
use emcanopen_core::{AcceptanceMask, CobId};

/// Generic failure of an underlying peripheral call
///
/// The module surfaces it to the caller without retrying.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PeripheryError;

/// Hardware receive FIFO selector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RxFifo {
    Fifo0,
    Fifo1,
}

/// Identifier of the hardware transmit mailbox a frame was placed into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Mailbox(u8);

impl Mailbox {
    pub const fn new(value: u8) -> Self {
        Self(value)
    }

    pub const fn into_u8(self) -> u8 {
        self.0
    }
}

impl From<Mailbox> for u8 {
    fn from(value: Mailbox) -> Self {
        value.into_u8()
    }
}

/// A set of peripheral event notifications
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Notifications(u8);

impl Notifications {
    pub const NONE: Self = Self(0);

    pub const RX_FIFO0_MESSAGE_PENDING: Self = Self(1 << 0);
    pub const RX_FIFO1_MESSAGE_PENDING: Self = Self(1 << 1);
    pub const TX_MAILBOX_EMPTY: Self = Self(1 << 2);

    pub const fn into_bits(self) -> u8 {
        self.0
    }

    pub const fn is_empty(&self) -> bool {
        self.0 == Self::NONE.0
    }

    pub const fn contains(&self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl Default for Notifications {
    fn default() -> Self {
        Self::NONE
    }
}

impl core::ops::BitOr for Notifications {
    type Output = Notifications;
    fn bitor(self, rhs: Self) -> Self::Output {
        Self(self.0 | rhs.0)
    }
}

impl core::ops::BitAnd for Notifications {
    type Output = Notifications;
    fn bitand(self, rhs: Self) -> Self::Output {
        Self(self.0 & rhs.0)
    }
}

/// Raw error status of the peripheral, level-triggered
///
/// An empty set means the peripheral reports no error condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ErrorFlags(u32);

impl ErrorFlags {
    pub const NONE: Self = Self(0);

    /// Error counters reached the warning level.
    pub const WARNING: Self = Self(1 << 0);
    /// The peripheral is in error-passive state.
    pub const PASSIVE: Self = Self(1 << 1);
    /// The peripheral is in bus-off state.
    pub const BUS_OFF: Self = Self(1 << 2);
    /// Receive FIFO 0 overran and dropped a frame.
    pub const RX_FIFO0_OVERRUN: Self = Self(1 << 3);
    /// Receive FIFO 1 overran and dropped a frame.
    pub const RX_FIFO1_OVERRUN: Self = Self(1 << 4);

    pub const fn from_bits_truncating(bits: u32) -> Self {
        Self(bits & 0x1f)
    }

    pub const fn into_bits(self) -> u32 {
        self.0
    }

    pub const fn is_empty(&self) -> bool {
        self.0 == Self::NONE.0
    }

    pub const fn contains(&self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn intersects(&self, other: Self) -> bool {
        self.0 & other.0 != 0
    }
}

impl Default for ErrorFlags {
    fn default() -> Self {
        Self::NONE
    }
}

impl core::ops::BitOr for ErrorFlags {
    type Output = ErrorFlags;
    fn bitor(self, rhs: Self) -> Self::Output {
        Self(self.0 | rhs.0)
    }
}

impl core::ops::BitAnd for ErrorFlags {
    type Output = ErrorFlags;
    fn bitand(self, rhs: Self) -> Self::Output {
        Self(self.0 & rhs.0)
    }
}

/// Configuration of one hardware acceptance filter bank
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FilterConfig {
    /// Pass every frame through to the receive FIFO. Used while filtering is
    /// done in software.
    AcceptAll,
    /// Pass frames whose identifier/RTR matches the pattern under the mask.
    Match {
        pattern: CobId,
        mask: AcceptanceMask,
    },
}

/// The CAN peripheral surface consumed by the CAN module
///
/// Methods taking `&mut self` are only invoked with the module's shared-state
/// lock held, so implementations need no interior synchronization of their
/// own. None of the methods may block.
pub trait Periphery {
    /// Stops peripheral operation. Infallible and idempotent.
    fn stop(&mut self);

    /// Programs bit timing and re-initializes the stopped peripheral.
    fn apply_timing(&mut self, timing: &NominalBitTiming) -> Result<(), PeripheryError>;

    /// Starts peripheral operation.
    fn start(&mut self) -> Result<(), PeripheryError>;

    /// Enables delivery of the given event notifications.
    fn activate_notifications(&mut self, set: Notifications) -> Result<(), PeripheryError>;

    /// Programs one acceptance filter bank.
    fn set_filter(&mut self, bank: usize, filter: FilterConfig) -> Result<(), PeripheryError>;

    /// Number of transmit mailboxes currently free.
    fn free_mailbox_count(&self) -> usize;

    /// Hands a frame to a free transmit mailbox.
    fn add_message(&mut self, frame: &Frame) -> Result<Mailbox, PeripheryError>;

    /// Takes the next pending frame out of a receive FIFO, if any.
    fn get_message(&mut self, fifo: RxFifo) -> Option<Frame>;

    /// Current raw error status.
    fn error_flags(&self) -> ErrorFlags;
}
