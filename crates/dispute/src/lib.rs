//! # Relay Disputes
//!
//! Anyone can challenge a stored header by pointing at it and its parent. A dispute re-runs the
//! structural rules and a proof-of-work check, and removes the header with all its descendants if
//! either fails.
//!
//! Disputes come in two tiers:
//! - the lightweight tier checks PoW against a single sampled dataset access. Since a sample can
//!   be wrong, it only gives the removed headers' bonds back to their submitters;
//! - the full tier authenticates every dataset access and is conclusive, so it hands the removed
//!   headers' bonds over to the disputer.

pub mod code;
pub mod engine;
pub mod errors;

pub use code::{DisputeReport, DisputeTier, ReturnCode};
pub use engine::DisputeEngine;
pub use errors::DisputeError;
