//! Windowed summary types.

use std::collections::BTreeMap;

use crate::contact::ClusterId;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Aggregated cluster filling over a run of consecutive frames.
///
/// Windows partition the trajectory without gaps. The last window of a
/// trajectory whose length is not a multiple of the window size is shorter;
/// its values are means over the frames it actually holds.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SummaryWindow {
    /// Position of the window in the trajectory, starting at 0.
    pub index: usize,
    /// Frame number of the first frame in the window.
    pub first_frame: u64,
    /// Number of frames aggregated into this window.
    pub frame_count: usize,
    /// True if `values` hold 0/1 after a binarization cutoff.
    pub binarized: bool,
    /// Mean (or binarized) filling per cluster.
    pub values: BTreeMap<ClusterId, f64>,
}

impl SummaryWindow {
    /// Returns the value of a cluster, if present.
    #[must_use]
    pub fn value(&self, cluster: ClusterId) -> Option<f64> {
        self.values.get(&cluster).copied()
    }

    /// Returns true if the window holds fewer than `window_size` frames.
    #[must_use]
    pub fn is_partial(&self, window_size: usize) -> bool {
        self.frame_count < window_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_window() {
        let window = SummaryWindow {
            index: 2,
            first_frame: 20,
            frame_count: 3,
            binarized: false,
            values: BTreeMap::from([(1, 0.25)]),
        };
        assert!(window.is_partial(10));
        assert!(!window.is_partial(3));
        assert_eq!(window.value(1), Some(0.25));
        assert_eq!(window.value(2), None);
    }
}
