//! Observability for txstate
//!
//! - Structured logging (JSON lines)
//! - Typed lifecycle events
//! - Passive protocol counters
//!
//! Observability is read-only: nothing here feeds back into the
//! transactional protocol.

mod events;
mod logger;
mod metrics;

pub use events::Event;
pub use logger::{LogBuffer, LogTarget, Logger, Severity};
pub use metrics::{MetricsSnapshot, StateMetrics};
