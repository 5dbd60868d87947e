//! Log consumption
//!
//! One logical consumer loop pulls change-events off the durable log and
//! feeds the dispatcher. The broker itself stays behind the [`LogConsumer`]
//! trait; the relay assumes an ordered, at-least-once log and nothing more.

pub mod log;
pub mod runner;

pub use log::{InMemoryConsumer, InMemoryLog, LogConsumer, LogError, LogRecord};
pub use runner::{IngestLoop, IngestPhase};
