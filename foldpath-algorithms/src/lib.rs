//! foldpath-algorithms: Analysis stages for native contact formation.
//!
//! This crate provides the stages of the analysis:
//! - **Clusterer** - Union-Find grouping of adjacent contacts, merged to K
//! - **Evaluator** - Per-frame contact formation, Q and cluster filling
//! - **Summarizer** - Fixed-size window means with optional binarization
//! - **Classifier** - Formation order from the final stable runs
//!
#![warn(missing_docs)]

mod classify;
mod clusterer;
mod evaluator;
mod processing;
mod smoothing;
mod summarize;

pub use classify::{classify, classify_windows, FormationOrderClassifier};
pub use clusterer::ContactClusterer;
pub use evaluator::FrameEvaluator;
pub use processing::{EvaluatedFrames, DEFAULT_CHUNK_SIZE};
pub use smoothing::{smooth, SmoothedRecord};
pub use summarize::{summarize, SummaryWindows, WindowAccumulator};

// Re-export the configuration types each stage consumes
pub use foldpath_core::{ClustererConfig, EvaluatorConfig, SmoothingConfig, SummaryConfig};
