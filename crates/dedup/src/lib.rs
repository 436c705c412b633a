//! Transaction deduplication
//!
//! Recognizes repeat submissions of the same real-world transaction with
//! three checks in fixed order, cheapest and most certain first: external
//! reference id, content hash of (vendor, amount, date), then time-windowed
//! similarity. The recent-history buffer is bounded by capacity and age;
//! check-and-insert is one atomic operation under a single lock.

pub mod engine;

pub use engine::{DedupDecision, DedupEngine, DedupRecord, DuplicateMatch};
