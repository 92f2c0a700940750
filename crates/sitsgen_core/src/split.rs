//! Experiment subsets.

use serde::{Deserialize, Serialize};

/// Names one of the index subsets an experiment partitions its dataset into.
///
/// # Example
///
/// ```rust
/// use sitsgen_core::Split;
///
/// assert_eq!(Split::Valid.index(), 1);
/// assert_eq!(Split::Test.to_string(), "test");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Split {
    /// Subset the reference classifier is fitted on.
    #[default]
    Train,
    /// Subset accuracy and confusion matrix are reported on.
    Valid,
    /// Held-out subset used to score generative models.
    Test,
}

impl Split {
    /// All splits in index order.
    pub const ALL: [Split; 3] = [Split::Train, Split::Valid, Split::Test];

    /// Position of this split in a ratio list (0=Train, 1=Valid, 2=Test).
    #[must_use]
    pub const fn index(&self) -> usize {
        match self {
            Split::Train => 0,
            Split::Valid => 1,
            Split::Test => 2,
        }
    }
}

impl std::fmt::Display for Split {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Split::Train => write!(f, "train"),
            Split::Valid => write!(f, "valid"),
            Split::Test => write!(f, "test"),
        }
    }
}
