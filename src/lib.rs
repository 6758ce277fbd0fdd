//! Matchbook - match lifecycle engine for a dating service
//!
//! This library tracks pairwise "like" signals between two parties and
//! promotes a pair to a confirmed match exactly once both parties have
//! expressed interest. Transport, auth and profile data are the caller's
//! concern; the engine is handed already-validated party identifiers.

pub mod config;
pub mod core;
pub mod models;
pub mod services;

// Re-export commonly used types
pub use crate::core::{MatchError, MatchService};
pub use models::{
    ConfirmedInsert, ConfirmedPairing, LikeOutcome, PairingFamily, Slot, TentativePairing,
};
pub use services::{MatchStore, MemoryStore, PostgresStore, StoreError};
