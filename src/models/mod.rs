//! Core data models for match ingestion and statistics.

mod category;
mod game;
mod league;
mod region;
mod stats;

pub use category::*;
pub use game::*;
pub use league::*;
pub use region::*;
pub use stats::*;
