//! Centered running averages over per-frame records.
#![allow(clippy::cast_precision_loss)]

use std::collections::{BTreeMap, BTreeSet};

use foldpath_core::{ClusterId, Error, FrameContactRecord, Result, SmoothingConfig};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Running-average values for one frame.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SmoothedRecord {
    /// Frame number of the window centre.
    pub frame: u64,
    /// Mean Q over the window.
    pub q_smooth: f64,
    /// Mean filling per cluster over the window.
    pub cluster_smooth: BTreeMap<ClusterId, f64>,
}

/// Prefix sums of one series; `sum(a, b)` covers `[a, b)`.
struct PrefixSum(Vec<f64>);

impl PrefixSum {
    fn new(values: impl Iterator<Item = f64>) -> Self {
        let mut sums = vec![0.0];
        let mut total = 0.0;
        for value in values {
            total += value;
            sums.push(total);
        }
        Self(sums)
    }

    fn mean(&self, start: usize, end: usize) -> f64 {
        (self.0[end] - self.0[start]) / (end - start) as f64
    }
}

/// Smooths Q and every cluster's filling with a centered running mean.
///
/// Record `n` averages records `n - W/2 ..= n + W/2`, clamped to the
/// trajectory, so edge frames average over fewer records. Records are
/// ordered by frame number first; clusters absent from a record count as 0.
///
/// # Errors
/// Returns `Error::Configuration` for a zero window and `Error::Format`
/// when there are no records.
pub fn smooth(
    records: &[FrameContactRecord],
    config: &SmoothingConfig,
) -> Result<Vec<SmoothedRecord>> {
    config.validate()?;
    if records.is_empty() {
        return Err(Error::Format("no frame records to smooth".to_string()));
    }

    let mut sorted: Vec<&FrameContactRecord> = records.iter().collect();
    sorted.sort_by_key(|record| record.frame);

    let clusters: BTreeSet<ClusterId> = sorted
        .iter()
        .flat_map(|record| record.cluster_filling.keys().copied())
        .collect();
    let q_sums = PrefixSum::new(sorted.iter().map(|record| record.q));
    let cluster_sums: Vec<(ClusterId, PrefixSum)> = clusters
        .iter()
        .map(|&cluster| {
            let sums = PrefixSum::new(sorted.iter().map(|record| record.filling(cluster)));
            (cluster, sums)
        })
        .collect();

    let half = config.window_size / 2;
    let total = sorted.len();
    let smoothed = sorted
        .iter()
        .enumerate()
        .map(|(n, record)| {
            let start = n.saturating_sub(half);
            let end = (n + half + 1).min(total);
            SmoothedRecord {
                frame: record.frame,
                q_smooth: q_sums.mean(start, end),
                cluster_smooth: cluster_sums
                    .iter()
                    .map(|(cluster, sums)| (*cluster, sums.mean(start, end)))
                    .collect(),
            }
        })
        .collect();

    log::debug!(
        "smoothed {total} records over {} clusters with window {}",
        clusters.len(),
        config.window_size
    );
    Ok(smoothed)
}
