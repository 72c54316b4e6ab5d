//! Shared test doubles for the Codetrail crates.

mod clock;
mod repository;
mod sink;

pub use clock::FixedClock;
pub use repository::{FailingActivityRepository, InMemoryActivityRepository};
pub use sink::{FlakySink, RecordingSink};
