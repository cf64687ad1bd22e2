//! foldpath-core: Core types for native contact formation analysis.
//!
//! This crate provides the data model shared by the analysis components:
//! residue coordinates and frames, the native contact map, per-frame
//! records, windowed summaries and formation-order results.
//!

pub mod classification;
pub mod config;
pub mod contact;
pub mod error;
pub mod frame;
pub mod record;
pub mod summary;

pub use classification::ClassificationResult;
pub use config::{AnalysisConfig, ClustererConfig, EvaluatorConfig, SmoothingConfig, SummaryConfig};
pub use contact::{ClusterId, ContactRow, NativeContact, NativeContactMap, UNASSIGNED};
pub use error::{Error, Result};
pub use frame::{Coordinate, Frame, FrameSource, ResidueIndex};
pub use record::FrameContactRecord;
pub use summary::SummaryWindow;
