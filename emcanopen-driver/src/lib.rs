//! Emcanopen driver interface
//!
//! The crate provides the interfaces between the Emcanopen CAN module and its
//! collaborators. Limited scope facilitates compatibility across versions.
//! Peripheral implementations should depend on this crate. Emcanopen stack
//! users should depend on the `emcanopen` crate instead.
//!
//! Two seams are defined here:
//! * [`periphery::Periphery`] is implemented by a CAN peripheral backend. It
//!   covers lifecycle control (stop, timing, start, notifications), hardware
//!   acceptance filters, transmit mailboxes, receive FIFOs and the raw error
//!   status. The CAN module calls it with its own shared-state lock held, so
//!   a backend is free of synchronization concerns but must never block.
//! * [`emergency::Emergency`] is implemented by the emergency subsystem. The
//!   CAN module turns the peripheral's level-triggered error status into
//!   discrete, de-duplicated fault events and pushes them through this trait,
//!   from interrupt as well as task context.
//!
//! [`frame`] defines the classic CAN frame object exchanged across both
//! seams, and [`config`] the supported bit rates with their nominal bit
//! timing.

#![no_std]

// This mod MUST go first, so that the others see its macros.
pub(crate) mod fmt;

pub mod config;
pub mod emergency;
pub mod frame;
pub mod periphery;
