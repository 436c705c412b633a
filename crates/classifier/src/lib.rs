//! Message classification for the SMS transaction pipeline
//!
//! Three layers, cheapest first:
//! - [`scorer`]: pure per-class scoring over weighted marker tables
//! - [`prefilter`]: classification with strong-pattern short circuit, sender
//!   boost, tie-break and sanity rules, plus the downstream extraction gate
//! - [`router`]: ordered keyword precedence mapping a message to its payment
//!   channel

pub mod keywords;
pub mod prefilter;
pub mod router;
pub mod scorer;

pub use prefilter::PreFilter;
pub use router::route;
pub use scorer::{score_all, ClassScores};
