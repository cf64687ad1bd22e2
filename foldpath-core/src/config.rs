//! Configuration for the analysis components.
//!
//! Every component receives its configuration explicitly; nothing here is
//! global. Constructors call `validate()` so bad values are reported before
//! any frame is processed.

use crate::{Error, Result};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Configuration for contact clustering.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ClustererConfig {
    /// Target number of clusters (K).
    pub cluster_count: usize,
    /// Minimum contacts for a cluster to be retained (S).
    pub min_cluster_size: usize,
}

impl Default for ClustererConfig {
    fn default() -> Self {
        Self {
            cluster_count: 10,
            min_cluster_size: 5,
        }
    }
}

impl ClustererConfig {
    /// Creates a clustering configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the target cluster count.
    #[must_use]
    pub fn with_cluster_count(mut self, count: usize) -> Self {
        self.cluster_count = count;
        self
    }

    /// Sets the minimum cluster size.
    #[must_use]
    pub fn with_min_cluster_size(mut self, size: usize) -> Self {
        self.min_cluster_size = size;
        self
    }

    /// Checks that K and S are at least 1.
    ///
    /// # Errors
    /// Returns `Error::Configuration` on invalid values.
    pub fn validate(&self) -> Result<()> {
        if self.cluster_count == 0 {
            return Err(Error::config("cluster_count must be at least 1"));
        }
        if self.min_cluster_size == 0 {
            return Err(Error::config("min_cluster_size must be at least 1"));
        }
        Ok(())
    }
}

/// Configuration for per-frame contact evaluation.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct EvaluatorConfig {
    /// Multiplier applied to the native distance; values above 1 tolerate
    /// thermal fluctuation.
    pub cutoff_distance: f64,
}

impl Default for EvaluatorConfig {
    fn default() -> Self {
        Self {
            cutoff_distance: 1.2,
        }
    }
}

impl EvaluatorConfig {
    /// Creates an evaluator configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the native distance multiplier.
    #[must_use]
    pub fn with_cutoff_distance(mut self, cutoff: f64) -> Self {
        self.cutoff_distance = cutoff;
        self
    }

    /// Checks that the multiplier is positive and finite.
    ///
    /// # Errors
    /// Returns `Error::Configuration` on invalid values.
    pub fn validate(&self) -> Result<()> {
        if !(self.cutoff_distance.is_finite() && self.cutoff_distance > 0.0) {
            return Err(Error::config(format!(
                "cutoff_distance must be positive, got {}",
                self.cutoff_distance
            )));
        }
        Ok(())
    }
}

/// Configuration for windowed summaries.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SummaryConfig {
    /// Frames per window (W).
    pub window_size: usize,
    /// Optional binarization cutoff (B) in [0, 1].
    pub binarize_cutoff: Option<f64>,
}

impl Default for SummaryConfig {
    fn default() -> Self {
        Self {
            window_size: 10_000,
            binarize_cutoff: None,
        }
    }
}

impl SummaryConfig {
    /// Creates a summary configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the window size.
    #[must_use]
    pub fn with_window_size(mut self, size: usize) -> Self {
        self.window_size = size;
        self
    }

    /// Enables binarization at the given cutoff.
    #[must_use]
    pub fn with_binarize_cutoff(mut self, cutoff: f64) -> Self {
        self.binarize_cutoff = Some(cutoff);
        self
    }

    /// Checks W >= 1 and B within [0, 1].
    ///
    /// # Errors
    /// Returns `Error::Configuration` on invalid values.
    pub fn validate(&self) -> Result<()> {
        if self.window_size == 0 {
            return Err(Error::config("window_size must be at least 1"));
        }
        if let Some(cutoff) = self.binarize_cutoff {
            if !(0.0..=1.0).contains(&cutoff) {
                return Err(Error::config(format!(
                    "binarize_cutoff must lie in [0, 1], got {cutoff}"
                )));
            }
        }
        Ok(())
    }
}

/// Configuration for centered running-average smoothing.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SmoothingConfig {
    /// Width of the running window in frames.
    pub window_size: usize,
}

impl Default for SmoothingConfig {
    fn default() -> Self {
        Self { window_size: 100 }
    }
}

impl SmoothingConfig {
    /// Creates a smoothing configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the running window width.
    #[must_use]
    pub fn with_window_size(mut self, size: usize) -> Self {
        self.window_size = size;
        self
    }

    /// Checks the window is at least one frame wide.
    ///
    /// # Errors
    /// Returns `Error::Configuration` on invalid values.
    pub fn validate(&self) -> Result<()> {
        if self.window_size == 0 {
            return Err(Error::config("smoothing window_size must be at least 1"));
        }
        Ok(())
    }
}

/// Full analysis configuration, as loaded by front ends.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct AnalysisConfig {
    /// Contact clustering parameters.
    pub clusterer: ClustererConfig,
    /// Frame evaluation parameters.
    pub evaluator: EvaluatorConfig,
    /// Window summary parameters.
    pub summary: SummaryConfig,
    /// Running-average parameters.
    pub smoothing: SmoothingConfig,
    /// Hard stop after this many frames (`None` = whole trajectory).
    pub max_frames: Option<usize>,
}

impl AnalysisConfig {
    /// Creates an analysis configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Caps the number of frames consumed.
    #[must_use]
    pub fn with_max_frames(mut self, max_frames: usize) -> Self {
        self.max_frames = Some(max_frames);
        self
    }

    /// Validates every section.
    ///
    /// # Errors
    /// Returns the first `Error::Configuration` found.
    pub fn validate(&self) -> Result<()> {
        self.clusterer.validate()?;
        self.evaluator.validate()?;
        self.summary.validate()?;
        self.smoothing.validate()?;
        if self.max_frames == Some(0) {
            return Err(Error::config("max_frames must be at least 1"));
        }
        Ok(())
    }
}
