//! Formation-order inference from binarized window summaries.
//!
//! Conceptually the windows are scanned from the end of the trajectory
//! backward. For every cluster formed in the final window, the first 1→0
//! transition met on the way back marks its break: the break index is the
//! later window of that transition, i.e. the start of the cluster's final
//! uninterrupted formed run. A cluster formed in every window has break
//! index 0. Clusters are ranked by ascending break index, ties by ascending
//! id; clusters unformed in the final window are reported separately.
//! Break indices count windows from the first one observed, so a slice of a
//! longer summary still ranks an always-formed cluster at 0.
//!
//! When a cluster flips 1→0→1 several times, only the last run counts: the
//! earlier flips lie behind the first backward transition. The same answer
//! is computed here in a single forward pass by tracking where each
//! cluster's current run of 1s began.
#![allow(clippy::float_cmp)]

use std::collections::BTreeMap;

use foldpath_core::{ClassificationResult, ClusterId, Error, Result, SummaryWindow, UNASSIGNED};
use log::{debug, info};

/// Streaming formation-order classifier.
#[derive(Debug, Clone)]
pub struct FormationOrderClassifier {
    /// Position of the first window in the current formed run, per cluster.
    run_start: BTreeMap<ClusterId, Option<usize>>,
    last_index: Option<usize>,
    observed: usize,
}

impl FormationOrderClassifier {
    /// Creates a classifier for the given cluster ids. Cluster 0 is ignored.
    pub fn new<I>(clusters: I) -> Self
    where
        I: IntoIterator<Item = ClusterId>,
    {
        let run_start = clusters
            .into_iter()
            .filter(|&cluster| cluster != UNASSIGNED)
            .map(|cluster| (cluster, None))
            .collect();
        Self {
            run_start,
            last_index: None,
            observed: 0,
        }
    }

    /// Returns true until the first window is observed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.last_index.is_none()
    }

    /// Feeds the next window.
    ///
    /// Known clusters missing from the window count as unformed.
    ///
    /// # Errors
    /// Returns `Error::Format` if the window index does not increase or a
    /// value is neither 0 nor 1.
    pub fn observe(&mut self, window: &SummaryWindow) -> Result<()> {
        if let Some(last) = self.last_index {
            if window.index <= last {
                return Err(Error::Format(format!(
                    "window {} follows window {last}; windows must be in increasing order",
                    window.index
                )));
            }
        }
        if let Some((cluster, value)) = window
            .values
            .iter()
            .find(|(_, &value)| value != 0.0 && value != 1.0)
        {
            return Err(Error::Format(format!(
                "window {} cluster {cluster} has non-binary value {value}; \
                 classification requires a binarized summary",
                window.index
            )));
        }

        for (cluster, start) in &mut self.run_start {
            let formed = window.value(*cluster) == Some(1.0);
            match (formed, *start) {
                (true, None) => *start = Some(self.observed),
                (false, _) => *start = None,
                (true, Some(_)) => {}
            }
        }
        self.last_index = Some(window.index);
        self.observed += 1;
        Ok(())
    }

    /// Produces the formation order.
    #[must_use]
    pub fn finish(self) -> ClassificationResult {
        let mut stable: Vec<(usize, ClusterId)> = Vec::new();
        let mut never_formed = Vec::new();

        for (cluster, start) in self.run_start {
            match start {
                Some(break_index) => stable.push((break_index, cluster)),
                None => never_formed.push(cluster),
            }
        }
        stable.sort_unstable();

        for &(break_index, cluster) in &stable {
            debug!("cluster {cluster} stably formed from window {break_index}");
        }
        info!(
            "formation order over {} windows: {} stable, {} never stably formed",
            self.observed,
            stable.len(),
            never_formed.len()
        );

        ClassificationResult {
            order: stable.iter().map(|&(_, cluster)| cluster).collect(),
            break_indices: stable
                .iter()
                .map(|&(break_index, cluster)| (cluster, break_index))
                .collect(),
            never_formed,
        }
    }
}

/// Classifies a window sequence against a known cluster set.
///
/// # Errors
/// Returns `Error::Format` for unordered or non-binary windows.
pub fn classify<'a, W, C>(windows: W, clusters: C) -> Result<ClassificationResult>
where
    W: IntoIterator<Item = &'a SummaryWindow>,
    C: IntoIterator<Item = ClusterId>,
{
    let mut classifier = FormationOrderClassifier::new(clusters);
    for window in windows {
        classifier.observe(window)?;
    }
    Ok(classifier.finish())
}

/// Classifies windows using every nonzero cluster id that appears in them.
///
/// # Errors
/// Returns `Error::Format` for unordered or non-binary windows.
pub fn classify_windows(windows: &[SummaryWindow]) -> Result<ClassificationResult> {
    let clusters: std::collections::BTreeSet<ClusterId> = windows
        .iter()
        .flat_map(|window| window.values.keys().copied())
        .collect();
    classify(windows, clusters)
}
