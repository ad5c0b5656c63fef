//! # Emcanopen CAN module
//!
//! This library provides the data-plane of a CAN peripheral driver underlying
//! a CANopen protocol stack: it decides which received frames matter, queues
//! outgoing frames against a small fixed number of hardware transmit
//! mailboxes, and turns raw peripheral error flags into discrete,
//! edge-triggered fault events. It uses user-provided slot arrays and
//! performs no dynamic memory allocation.
//!
//! The library is designed for a bare preemptive-interrupt model: a
//! frame-received/mailbox-empty interrupt context and a cooperative task
//! context share one [`CanModule`], with all shared-state updates confined to
//! short critical sections.
//!
//! ## Architecture
//!
//! ```text
//!              ┌────────────┐   report/reset   ┌───────────┐
//!              │ CanModule  ├─────────────────►│ Emergency │
//!              └─┬────────┬─┘                  └───────────┘
//!     RX slots   │        │   TX slots
//! ┌──────────────┴─┐    ┌─┴───────────────┐
//! │ match + handle │    │ queue + drain   │
//! └──────┬─────────┘    └────────┬────────┘
//!        ▲                       ▼
//!      ┌─┴───────────────────────┴─┐
//!      │         Periphery         │
//!      └───────────────────────────┘
//! ```
//!
//! Components:
//! * [`CanModule`] owns the receive and transmit slot arrays, the lifecycle
//!   flags and the peripheral handle. It is created once at system start with
//!   caller-owned arrays and never reallocates.
//! * Receive slots pair an identifier/mask pattern with a handler. An
//!   incoming frame is matched in array order, first match wins, and the
//!   handler runs synchronously in the interrupt context.
//! * Transmit slots hold one frame each. [`CanModule::send`] dispatches to a
//!   free hardware mailbox immediately when possible and queues otherwise;
//!   a mailbox-free notification drains the queue in array order.
//! * [`CanModule::check_errors`] debounces the peripheral's level-triggered
//!   error status into one fault event per transition.
//!
//! The hardware itself stays behind the [`periphery::Periphery`] trait and
//! fault events flow into the [`emergency::Emergency`] trait; both are
//! defined in the `emcanopen-driver` interface crate.

#![no_std]

pub use emcanopen_core as core;
pub use emcanopen_driver::{config, emergency, frame, periphery};

// This mod MUST go first, so that the others see its macros.
pub(crate) mod fmt;

mod error;
mod module;
mod rx;
mod tx;

pub use error::Error;
pub use module::CanModule;
pub use rx::{RxHandler, RxSlot};
pub use tx::{TxHandle, TxSlot};
