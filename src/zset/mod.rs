//! Ordered tree engine
//!
//! Score-ranked membership for sorted sets: insert-or-update, score lookup
//! and rank queries over a B+tree keyed by `(score, member)`.
//! Independent of the dictionary engine and of command handling.

mod entry;
mod node;
mod tree;

pub use entry::Entry;
pub use tree::{AddOutcome, Iter, ScoreTree, TreeStats};
