//! This crate contains the parameters that dictate the behavior of the relay: how long submitted
//! headers stay locked, how much stake a header is bonded with, and the subset of the source
//! chain's header-validity rules that the relay re-derives.
//!
//! All relays that must agree on the state of the header tree have to be configured with the same
//! parameters.

mod default;
pub mod chain;
pub mod errors;
pub mod relay;
pub mod stake;
