//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Transfer pipeline produces:
//!     → logging.rs (structured log events)
//!     → metrics.rs (counters)
//! ```
//!
//! # Design Decisions
//! - Structured logging with the transaction hash as the correlation field
//! - Key material never reaches a log line or a metric label
//! - Metrics are cheap (atomic increments); without an installed recorder they are no-ops

pub mod logging;
pub mod metrics;
