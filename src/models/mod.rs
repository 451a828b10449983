//! Core data models for the results engine.

mod ids;
mod issue;
mod match_record;
mod placement;
mod player;
mod rating;
mod round_stage;
mod tournament;

pub use ids::*;
pub use issue::*;
pub use match_record::*;
pub use placement::*;
pub use player::*;
pub use rating::*;
pub use round_stage::*;
pub use tournament::*;
