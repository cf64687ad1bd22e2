//! Residue coordinates and trajectory frames.

use std::collections::HashMap;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Index of a residue (monomer position) along the chain.
pub type ResidueIndex = u32;

/// Position of one residue in one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Coordinate {
    /// X position.
    pub x: f64,
    /// Y position.
    pub y: f64,
    /// Z position.
    pub z: f64,
}

impl Coordinate {
    /// Creates a new coordinate.
    #[inline]
    #[must_use]
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Computes the squared Euclidean distance to another coordinate.
    #[inline]
    #[must_use]
    pub fn distance_squared(&self, other: &Self) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        dx * dx + dy * dy + dz * dz
    }

    /// Computes the Euclidean distance to another coordinate.
    #[inline]
    #[must_use]
    pub fn distance(&self, other: &Self) -> f64 {
        self.distance_squared(other).sqrt()
    }
}

/// One trajectory snapshot: a frame number and one coordinate per observed residue.
///
/// Residues that the trajectory omits (termini, unresolved loops) are simply
/// absent from the mapping.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Frame {
    /// Frame number, increasing along the trajectory.
    pub number: u64,
    coordinates: HashMap<ResidueIndex, Coordinate>,
}

impl Frame {
    /// Creates an empty frame.
    #[must_use]
    pub fn new(number: u64) -> Self {
        Self {
            number,
            coordinates: HashMap::new(),
        }
    }

    /// Creates an empty frame with room for `capacity` residues.
    #[must_use]
    pub fn with_capacity(number: u64, capacity: usize) -> Self {
        Self {
            number,
            coordinates: HashMap::with_capacity(capacity),
        }
    }

    /// Sets the coordinate of a residue, replacing any previous value.
    pub fn insert(&mut self, residue: ResidueIndex, coordinate: Coordinate) {
        self.coordinates.insert(residue, coordinate);
    }

    /// Returns the coordinate of a residue, if the frame observed it.
    #[inline]
    #[must_use]
    pub fn get(&self, residue: ResidueIndex) -> Option<&Coordinate> {
        self.coordinates.get(&residue)
    }

    /// Returns the number of residues observed in this frame.
    #[must_use]
    pub fn len(&self) -> usize {
        self.coordinates.len()
    }

    /// Returns true if the frame holds no coordinates.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.coordinates.is_empty()
    }

    /// Returns an iterator over `(residue, coordinate)` pairs in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = (ResidueIndex, &Coordinate)> {
        self.coordinates.iter().map(|(&residue, coord)| (residue, coord))
    }
}

impl FromIterator<(ResidueIndex, Coordinate)> for Frame {
    fn from_iter<I: IntoIterator<Item = (ResidueIndex, Coordinate)>>(iter: I) -> Self {
        Self {
            number: 0,
            coordinates: iter.into_iter().collect(),
        }
    }
}

/// A lazily produced, finite sequence of frames in increasing frame order.
///
/// `None` means the trajectory is exhausted; `Some(Err(_))` means the
/// underlying source is malformed. Implementors must be able to stop after a
/// caller-supplied number of frames.
pub trait FrameSource<E>: Iterator<Item = std::result::Result<Frame, E>> {
    /// Limits the source to at most `max_frames` further frames.
    #[must_use]
    fn with_max_frames(self, max_frames: usize) -> Self
    where
        Self: Sized;
}
