//! # ethrelay
//!
//! A relay that lets one chain trust the headers of a proof-of-work chain without trusting the
//! parties that submit them.
//!
//! Submitters bond stake to every header they submit. Headers are accepted optimistically and
//! anyone can dispute them; a dispute that proves a header invalid removes it together with
//! everything built on top of it. Once a header is old enough and buried deep enough in the
//! heaviest branch, clients pay a fee to check transaction and receipt inclusion proofs against
//! it.
//!
//! [`RelayState`] is the whole relay as a state machine driven by explicit timestamps.
//! [`SharedRelay`] serializes access to one from many callers.

pub mod errors;
pub mod shared;
pub mod state;
pub mod verify;

#[cfg(test)]
mod tests;

pub use errors::{FeeError, RelayError};
pub use ethrelay_common::logging;
pub use shared::SharedRelay;
pub use state::{RelayState, Submission};
pub use verify::{Payment, VerificationResult};
