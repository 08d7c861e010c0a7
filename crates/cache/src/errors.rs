//! Error handling for the cache engine
//!
//! Two taxonomies are kept apart: [`ValidationError`] for caller mistakes,
//! which are returned immediately and never retried, and [`CacheError`] for
//! operational failures, which the engine logs and absorbs on the hot path.

mod conversions;
mod recovery;
mod types;
mod validation;

pub use recovery::RecoveryHint;
pub use types::*;
pub use validation::ValidationError;
