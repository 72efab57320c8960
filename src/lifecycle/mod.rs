//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Cancellation (cancel.rs):
//!     CancelHandle::cancel → every CancelSignal observes it
//!
//! Signals (signals.rs):
//!     SIGINT (Ctrl-C) → CancelHandle::cancel
//! ```
//!
//! # Design Decisions
//! - Cancellation is level-triggered: a late subscriber still sees it
//! - The transfer pipeline only checks it where stopping is safe
//!   (before broadcast, between receipt polls)

pub mod cancel;
pub mod signals;

pub use cancel::{CancelHandle, CancelSignal};
