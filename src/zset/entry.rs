//! Score/member pair stored in the ordered tree

use std::cmp::Ordering;
use std::fmt;

/// A member of the sorted set with its score
///
/// Ordering is by score, then by member on score ties. Scores compare with
/// `f64::total_cmp`, so the order stays total even for NaN.
#[derive(Debug, Clone)]
pub struct Entry {
    /// The score
    pub score: f64,

    /// The member name (unique within a tree)
    pub member: String,
}

impl Entry {
    /// Create a new entry
    pub fn new(score: f64, member: impl Into<String>) -> Self {
        Entry {
            score,
            member: member.into(),
        }
    }

    /// Approximate heap + inline size of this entry in bytes
    pub fn memory_usage(&self) -> usize {
        std::mem::size_of::<Entry>() + self.member.len()
    }
}

impl Ord for Entry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.score
            .total_cmp(&other.score)
            .then_with(|| self.member.cmp(&other.member))
    }
}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Entry {}

impl fmt::Display for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.score, self.member)
    }
}
