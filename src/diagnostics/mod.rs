//! Diagnostics returned alongside segmentation results.
//!
//! [`SearchReport`] describes how the branch-and-bound search progressed:
//! node counters, the trace of best energies and a timing breakdown of the
//! phases of the run.

pub mod search;
pub mod timing;

pub use search::SearchReport;
pub use timing::{StageTiming, TimingBreakdown};
