//! Trait seams for external collaborators

mod sink;

pub use sink::{SinkError, TransactionSink};
