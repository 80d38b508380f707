//! Scenario tests of the composed relay.

mod concurrency;
mod stake;
