//! Per-frame contact formation records.

use std::collections::BTreeMap;

use crate::contact::ClusterId;
use crate::frame::ResidueIndex;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Which native contacts are formed in one frame, with derived fractions.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FrameContactRecord {
    /// Frame number this record was derived from.
    pub frame: u64,
    /// Formed native contacts as `(i, j)` pairs, in map order.
    pub formed: Vec<(ResidueIndex, ResidueIndex)>,
    /// Fraction of all native contacts formed (Q).
    pub q: f64,
    /// Filling fraction of every retained cluster.
    pub cluster_filling: BTreeMap<ClusterId, f64>,
}

impl FrameContactRecord {
    /// Returns the number of formed contacts.
    #[must_use]
    pub fn formed_count(&self) -> usize {
        self.formed.len()
    }

    /// Returns the filling fraction of a cluster, or 0.0 if the record has no entry for it.
    #[must_use]
    pub fn filling(&self, cluster: ClusterId) -> f64 {
        self.cluster_filling.get(&cluster).copied().unwrap_or(0.0)
    }
}
