//! Streaming helpers that connect a frame source to the evaluator.

use std::collections::VecDeque;

use foldpath_core::{Frame, FrameContactRecord};

use crate::evaluator::FrameEvaluator;

/// Default number of frames evaluated per parallel batch.
pub const DEFAULT_CHUNK_SIZE: usize = 256;

/// Iterator adapter turning frame results into contact records.
///
/// Frames are pulled in chunks and evaluated in parallel; records come out
/// in input order. A source error is yielded after the records of the frames
/// read before it, and iteration ends there. `max_frames` is a hard stop: no
/// frame beyond it is requested from the source.
pub struct EvaluatedFrames<'a, I, E> {
    frames: I,
    evaluator: &'a FrameEvaluator,
    chunk_size: usize,
    remaining: Option<usize>,
    pending: VecDeque<FrameContactRecord>,
    pending_error: Option<E>,
    finished: bool,
}

impl<'a, I, E> EvaluatedFrames<'a, I, E>
where
    I: Iterator<Item = Result<Frame, E>>,
{
    /// Wraps a frame iterator.
    pub fn new(frames: I, evaluator: &'a FrameEvaluator) -> Self {
        Self {
            frames,
            evaluator,
            chunk_size: DEFAULT_CHUNK_SIZE,
            remaining: None,
            pending: VecDeque::new(),
            pending_error: None,
            finished: false,
        }
    }

    /// Stops after `max_frames` frames.
    #[must_use]
    pub fn with_max_frames(mut self, max_frames: Option<usize>) -> Self {
        self.remaining = max_frames;
        self
    }

    /// Sets the parallel batch size (at least 1).
    #[must_use]
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    fn fill(&mut self) {
        let mut chunk = Vec::with_capacity(self.chunk_size);
        while chunk.len() < self.chunk_size {
            if self.remaining == Some(0) {
                self.finished = true;
                break;
            }
            match self.frames.next() {
                Some(Ok(frame)) => {
                    if let Some(remaining) = self.remaining.as_mut() {
                        *remaining -= 1;
                    }
                    chunk.push(frame);
                }
                Some(Err(err)) => {
                    self.pending_error = Some(err);
                    self.finished = true;
                    break;
                }
                None => {
                    self.finished = true;
                    break;
                }
            }
        }
        self.pending.extend(self.evaluator.evaluate_all(&chunk));
    }
}

impl<I, E> Iterator for EvaluatedFrames<'_, I, E>
where
    I: Iterator<Item = Result<Frame, E>>,
{
    type Item = Result<FrameContactRecord, E>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(record) = self.pending.pop_front() {
                return Some(Ok(record));
            }
            if let Some(err) = self.pending_error.take() {
                return Some(Err(err));
            }
            if self.finished {
                return None;
            }
            self.fill();
        }
    }
}

impl FrameEvaluator {
    /// Evaluates a stream of frames lazily, see [`EvaluatedFrames`].
    pub fn evaluate_stream<I, E>(&self, frames: I) -> EvaluatedFrames<'_, I::IntoIter, E>
    where
        I: IntoIterator<Item = Result<Frame, E>>,
    {
        EvaluatedFrames::new(frames.into_iter(), self)
    }
}
