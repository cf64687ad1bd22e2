//! Formation-order classification results.

use std::collections::BTreeMap;

use crate::contact::ClusterId;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Inferred order in which clusters became stably formed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ClassificationResult {
    /// Stably formed clusters, earliest-forming first.
    pub order: Vec<ClusterId>,
    /// Break index of every cluster in `order`: the first window of its
    /// final uninterrupted formed run.
    pub break_indices: BTreeMap<ClusterId, usize>,
    /// Clusters not formed in the final window, ascending.
    pub never_formed: Vec<ClusterId>,
}

impl ClassificationResult {
    /// Returns the break index of a stably formed cluster.
    #[must_use]
    pub fn break_index(&self, cluster: ClusterId) -> Option<usize> {
        self.break_indices.get(&cluster).copied()
    }

    /// Returns the 0-based formation rank of a cluster.
    #[must_use]
    pub fn rank(&self, cluster: ClusterId) -> Option<usize> {
        self.order.iter().position(|&c| c == cluster)
    }

    /// Returns true if the cluster never stabilised.
    #[must_use]
    pub fn is_never_formed(&self, cluster: ClusterId) -> bool {
        self.never_formed.contains(&cluster)
    }
}
