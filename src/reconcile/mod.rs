//! Match reconciliation engine
//!
//! Team resolution, ledger reconciliation, season markers and forecast scoring.

pub mod directory;
pub mod reconciler;
pub mod scoring;
pub mod seasons;

pub use directory::{Resolution, TeamDirectory, UnresolvedReason};
pub use reconciler::{IncomingMatch, Outcome, Reconciler, SkipReason};
pub use seasons::SeasonTracker;
