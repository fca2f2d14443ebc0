//! Verdict history: where finished checks are recorded and listed from.

mod error;
mod sink;
mod types;

pub use error::{HistoryError, Result};
pub use sink::{JsonlHistory, MemoryHistory, VerdictSink};
pub use types::HistoryEntry;
