//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `RunPhase`: the phases of a crawl run and their legal transitions
//! - `RunState`: per-run bookkeeping (current page, pages visited, page limit)

mod run_phase;
mod run_state;

// Re-export main types
pub use run_phase::RunPhase;
pub use run_state::{PaginationStop, RunState};
