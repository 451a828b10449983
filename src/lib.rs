//! # Results Engine
//!
//! Derives player statistics, rating history and tournament standings from
//! recorded matches.
//!
//! ## Architecture
//!
//! - **models**: Core data structures (players, matches, tournaments, placements)
//! - **calculate**: Pure statistics and standings computation
//! - **storage**: Filesystem data lake operations (JSONL, derived documents)
//! - **recalculate**: Orchestrator that recomputes and persists derived data
//! - **config**: Configuration loading and validation

pub mod calculate;
pub mod config;
pub mod models;
pub mod recalculate;
pub mod storage;

pub use models::*;
