//! # Relay Header Tree
//!
//! The relay stores every submitted header in a tree rooted at a trusted genesis header. Each
//! header records who submitted it, until when it is locked, and where it sits in the fork
//! bookkeeping. The tree keeps a list of endpoints (headers without children) and tracks the
//! endpoint with the highest total difficulty, which is the tip of the longest chain.
//!
//! Headers are only ever removed as whole subtrees, by disputes proving one of them invalid.

pub mod errors;
pub mod metadata;
pub mod tree;
pub mod validation;

pub use errors::{PruneError, QueryError, SubmitError};
pub use metadata::{HeaderMetadata, PrunedHeader};
pub use tree::HeaderTree;
pub use validation::{check_header, Violation};
