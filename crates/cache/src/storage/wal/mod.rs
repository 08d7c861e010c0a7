//! Write-Ahead Log for crash recovery
//!
//! Every durable mutation is appended here before it is applied in memory.
//! Sequence numbers give a total order across shards.

mod append;
mod operations;
mod replay;
mod writer;

pub use operations::{WalOperation, WalRecord};
pub use replay::ReplayStats;
pub use writer::{WalStats, WriteAheadLog};

#[cfg(test)]
mod tests;
