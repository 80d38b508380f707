//! # Relay Stake Ledger
//!
//! Submitting a header to the relay bonds a fixed amount of the submitter's deposited stake to
//! that header until the header's lock period elapses. A header that is shown to be invalid
//! during a dispute either gives its bond back (lightweight dispute) or hands it over to the
//! disputer (full dispute).
//!
//! The ledger never stores the locked amount. It keeps the list of bonds per submitter and
//! derives the locked amount on demand from the bonds whose header is still present and still
//! locked, so bonds expire and bonds of pruned headers disappear without any bookkeeping.
//!
//! The ledger also collects the verification fees forwarded to header submitters.

pub mod errors;
pub mod ledger;

pub use errors::StakeError;
pub use ledger::{Bond, StakeAccount, StakeLedger};
