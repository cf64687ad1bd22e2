//! Per-frame native contact evaluation.
#![allow(clippy::cast_precision_loss)]

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};

use foldpath_core::{
    ClusterId, EvaluatorConfig, Frame, FrameContactRecord, NativeContactMap, Result,
};
use log::{debug, warn};
use rayon::prelude::*;

/// Decides which native contacts are formed in a frame.
///
/// A contact `(i, j, r)` is formed when both residues are present and their
/// distance is at most `cutoff_distance * r`. Residues missing from a frame
/// make the contact unformed.
#[derive(Debug)]
pub struct FrameEvaluator {
    map: NativeContactMap,
    config: EvaluatorConfig,
    cluster_sizes: BTreeMap<ClusterId, usize>,
    // Missing termini repeat every frame; warn on the first only
    missing_reported: AtomicBool,
}

impl Clone for FrameEvaluator {
    fn clone(&self) -> Self {
        Self {
            map: self.map.clone(),
            config: self.config.clone(),
            cluster_sizes: self.cluster_sizes.clone(),
            missing_reported: AtomicBool::new(self.missing_reported.load(Ordering::Relaxed)),
        }
    }
}

impl FrameEvaluator {
    /// Creates an evaluator for a clustered contact map.
    ///
    /// # Errors
    /// Returns `Error::Configuration` if the cutoff multiplier is not positive.
    pub fn new(map: NativeContactMap, config: EvaluatorConfig) -> Result<Self> {
        config.validate()?;
        let cluster_sizes = map.cluster_sizes();
        Ok(Self {
            map,
            config,
            cluster_sizes,
            missing_reported: AtomicBool::new(false),
        })
    }

    /// Returns the contact map being evaluated.
    #[must_use]
    pub fn map(&self) -> &NativeContactMap {
        &self.map
    }

    /// Returns the evaluator configuration.
    #[must_use]
    pub fn config(&self) -> &EvaluatorConfig {
        &self.config
    }

    /// Returns the size of every retained cluster.
    #[must_use]
    pub fn cluster_sizes(&self) -> &BTreeMap<ClusterId, usize> {
        &self.cluster_sizes
    }

    /// Evaluates one frame.
    #[must_use]
    pub fn evaluate(&self, frame: &Frame) -> FrameContactRecord {
        let mut formed = Vec::new();
        let mut cluster_counts: BTreeMap<ClusterId, usize> = BTreeMap::new();
        let mut missing = 0usize;

        for contact in &self.map {
            let (Some(a), Some(b)) = (frame.get(contact.i), frame.get(contact.j)) else {
                missing += 1;
                continue;
            };
            if a.distance(b) <= self.config.cutoff_distance * contact.r {
                formed.push(contact.pair());
                if contact.is_clustered() {
                    *cluster_counts.entry(contact.cluster).or_insert(0) += 1;
                }
            }
        }

        if missing > 0 {
            self.report_missing(frame.number, missing);
        }

        let q = formed.len() as f64 / self.map.len() as f64;
        let cluster_filling = self
            .cluster_sizes
            .iter()
            .map(|(&cluster, &size)| {
                let count = cluster_counts.get(&cluster).copied().unwrap_or(0);
                (cluster, count as f64 / size as f64)
            })
            .collect();

        FrameContactRecord {
            frame: frame.number,
            formed,
            q,
            cluster_filling,
        }
    }

    /// Logs absent residues; returns `true` if this call emitted the warning.
    fn report_missing(&self, frame: u64, missing: usize) -> bool {
        if self.missing_reported.swap(true, Ordering::Relaxed) {
            debug!("frame {frame}: {missing} native contacts reference absent residues");
            false
        } else {
            warn!(
                "frame {frame}: {missing} native contacts reference residues absent from the frame \
                 (further frames are logged at debug level)"
            );
            true
        }
    }

    /// Evaluates a batch of frames in parallel, keeping input order.
    #[must_use]
    pub fn evaluate_all(&self, frames: &[Frame]) -> Vec<FrameContactRecord> {
        if frames.len() < 2 {
            return frames.iter().map(|frame| self.evaluate(frame)).collect();
        }
        frames.par_iter().map(|frame| self.evaluate(frame)).collect()
    }
}
