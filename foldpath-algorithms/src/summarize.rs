//! Fixed-size window aggregation of per-frame cluster filling.
//!
//! Records are consumed one at a time in frame order. Each window holds the
//! arithmetic mean of every cluster's filling over its frames, optionally
//! binarized against a cutoff. A trajectory whose length is not a multiple
//! of the window size ends with a shorter, partial window; this truncation
//! is reported through `SummaryWindow::frame_count` and logged.
#![allow(clippy::cast_precision_loss)]

use std::collections::BTreeMap;

use foldpath_core::{ClusterId, Error, FrameContactRecord, Result, SummaryConfig, SummaryWindow};
use log::warn;

/// Push-style window builder.
#[derive(Debug, Clone)]
pub struct WindowAccumulator {
    config: SummaryConfig,
    next_index: usize,
    first_frame: u64,
    frame_count: usize,
    sums: BTreeMap<ClusterId, f64>,
    last_frame: Option<u64>,
}

impl WindowAccumulator {
    /// Creates an accumulator.
    ///
    /// # Errors
    /// Returns `Error::Configuration` if W is 0 or B lies outside [0, 1].
    pub fn new(config: SummaryConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            next_index: 0,
            first_frame: 0,
            frame_count: 0,
            sums: BTreeMap::new(),
            last_frame: None,
        })
    }

    /// Returns the summary configuration.
    #[must_use]
    pub fn config(&self) -> &SummaryConfig {
        &self.config
    }

    /// Adds one record; returns the window it completes, if any.
    ///
    /// # Errors
    /// Returns `Error::Format` if the record's frame number does not exceed
    /// the previous one.
    pub fn push(&mut self, record: &FrameContactRecord) -> Result<Option<SummaryWindow>> {
        if let Some(last) = self.last_frame {
            if record.frame <= last {
                return Err(Error::Format(format!(
                    "frame {} arrived after frame {last}; records must be in increasing frame order",
                    record.frame
                )));
            }
        }
        self.last_frame = Some(record.frame);

        if self.frame_count == 0 {
            self.first_frame = record.frame;
        }
        for (&cluster, &filling) in &record.cluster_filling {
            *self.sums.entry(cluster).or_insert(0.0) += filling;
        }
        self.frame_count += 1;

        if self.frame_count == self.config.window_size {
            Ok(Some(self.emit()))
        } else {
            Ok(None)
        }
    }

    /// Flushes the trailing partial window, if any frames are pending.
    pub fn finish(&mut self) -> Option<SummaryWindow> {
        if self.frame_count == 0 {
            return None;
        }
        warn!(
            "final window {} holds {} of {} frames; its values are means over the frames present",
            self.next_index, self.frame_count, self.config.window_size
        );
        Some(self.emit())
    }

    fn emit(&mut self) -> SummaryWindow {
        let frame_count = self.frame_count;
        let cutoff = self.config.binarize_cutoff;
        let values = std::mem::take(&mut self.sums)
            .into_iter()
            .map(|(cluster, sum)| {
                let mean = sum / frame_count as f64;
                let value = match cutoff {
                    Some(cutoff) if mean >= cutoff => 1.0,
                    Some(_) => 0.0,
                    None => mean,
                };
                (cluster, value)
            })
            .collect();

        let window = SummaryWindow {
            index: self.next_index,
            first_frame: self.first_frame,
            frame_count,
            binarized: cutoff.is_some(),
            values,
        };
        self.next_index += 1;
        self.frame_count = 0;
        window
    }
}

/// Iterator adapter turning a record stream into summary windows.
///
/// Yields `Err` once (and then stops) if records arrive out of order.
pub struct SummaryWindows<I> {
    records: I,
    accumulator: WindowAccumulator,
    done: bool,
}

impl<I> SummaryWindows<I>
where
    I: Iterator<Item = FrameContactRecord>,
{
    /// Wraps a record iterator.
    ///
    /// # Errors
    /// Returns `Error::Configuration` for an invalid summary configuration.
    pub fn new<R>(records: R, config: SummaryConfig) -> Result<Self>
    where
        R: IntoIterator<Item = FrameContactRecord, IntoIter = I>,
    {
        Ok(Self {
            records: records.into_iter(),
            accumulator: WindowAccumulator::new(config)?,
            done: false,
        })
    }
}

impl<I> Iterator for SummaryWindows<I>
where
    I: Iterator<Item = FrameContactRecord>,
{
    type Item = Result<SummaryWindow>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        for record in self.records.by_ref() {
            match self.accumulator.push(&record) {
                Ok(Some(window)) => return Some(Ok(window)),
                Ok(None) => {}
                Err(err) => {
                    self.done = true;
                    return Some(Err(err));
                }
            }
        }
        self.done = true;
        self.accumulator.finish().map(Ok)
    }
}

/// Summarizes a record sequence into windows.
///
/// # Errors
/// Returns configuration or ordering errors.
pub fn summarize<I>(records: I, config: &SummaryConfig) -> Result<Vec<SummaryWindow>>
where
    I: IntoIterator<Item = FrameContactRecord>,
{
    SummaryWindows::new(records, config.clone())?.collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn record(frame: u64, fillings: &[(ClusterId, f64)]) -> FrameContactRecord {
        FrameContactRecord {
            frame,
            formed: Vec::new(),
            q: 0.0,
            cluster_filling: fillings.iter().copied().collect(),
        }
    }

    fn series(values: &[f64]) -> Vec<FrameContactRecord> {
        values
            .iter()
            .enumerate()
            .map(|(n, &v)| record(n as u64, &[(1, v)]))
            .collect()
    }

    #[test]
    fn test_window_means() {
        let config = SummaryConfig::new().with_window_size(2);
        let windows = summarize(series(&[0.0, 1.0, 0.5, 0.5]), &config).unwrap();

        assert_eq!(windows.len(), 2);
        assert_relative_eq!(windows[0].values[&1], 0.5);
        assert_relative_eq!(windows[1].values[&1], 0.5);
        assert_eq!(windows[1].index, 1);
        assert_eq!(windows[1].first_frame, 2);
        assert!(!windows[0].binarized);
    }

    #[test]
    fn test_partial_final_window() {
        let config = SummaryConfig::new().with_window_size(3);
        let windows = summarize(series(&[1.0, 1.0, 1.0, 0.2, 0.4]), &config).unwrap();

        assert_eq!(windows.len(), 2);
        assert_eq!(windows[1].frame_count, 2);
        assert!(windows[1].is_partial(3));
        assert_relative_eq!(windows[1].values[&1], 0.3, epsilon = 1e-12);
    }

    #[test]
    fn test_window_size_one_is_identity() {
        let records = vec![
            record(0, &[(1, 0.25), (2, 1.0)]),
            record(1, &[(1, 0.75), (2, 0.0)]),
        ];
        let config = SummaryConfig::new().with_window_size(1);
        let windows = summarize(records.clone(), &config).unwrap();

        for (window, record) in windows.iter().zip(&records) {
            assert_eq!(window.values, record.cluster_filling);
            assert_eq!(window.first_frame, record.frame);
        }
    }

    #[test]
    fn test_binarization() {
        let config = SummaryConfig::new()
            .with_window_size(2)
            .with_binarize_cutoff(0.5);
        let windows = summarize(series(&[0.25, 0.75, 0.2, 0.6]), &config).unwrap();

        assert!(windows[0].binarized);
        assert_relative_eq!(windows[0].values[&1], 1.0); // mean 0.5 >= 0.5
        assert_relative_eq!(windows[1].values[&1], 0.0); // mean 0.4
    }

    #[test]
    fn test_binarization_monotone_in_cutoff() {
        let values = [0.1, 0.9, 0.35, 0.45, 0.8, 0.6, 0.0, 0.05];
        let at = |cutoff: f64| {
            let config = SummaryConfig::new()
                .with_window_size(2)
                .with_binarize_cutoff(cutoff);
            summarize(series(&values), &config)
                .unwrap()
                .into_iter()
                .map(|w| w.values[&1])
                .collect::<Vec<_>>()
        };
        let cutoffs = [0.0, 0.1, 0.3, 0.4, 0.5, 0.7, 1.0];
        for pair in cutoffs.windows(2) {
            let low = at(pair[0]);
            let high = at(pair[1]);
            assert!(low.iter().zip(&high).all(|(l, h)| h <= l));
        }
    }

    #[test]
    fn test_out_of_order_frames_rejected() {
        let records = vec![record(5, &[(1, 1.0)]), record(5, &[(1, 1.0)])];
        let config = SummaryConfig::new().with_window_size(4);
        let mut windows = SummaryWindows::new(records, config).unwrap();

        assert!(matches!(windows.next(), Some(Err(Error::Format(_)))));
        assert!(windows.next().is_none());
    }

    #[test]
    fn test_absent_cluster_counts_as_zero() {
        let records = vec![record(0, &[(1, 1.0)]), record(1, &[(1, 1.0), (2, 1.0)])];
        let config = SummaryConfig::new().with_window_size(2);
        let windows = summarize(records, &config).unwrap();
        assert_relative_eq!(windows[0].values[&2], 0.5);
    }

    #[test]
    fn test_empty_input() {
        let config = SummaryConfig::new().with_window_size(3);
        assert!(summarize(Vec::new(), &config).unwrap().is_empty());
    }

    #[test]
    fn test_push_interface() {
        let mut acc = WindowAccumulator::new(SummaryConfig::new().with_window_size(2)).unwrap();
        assert!(acc.push(&record(0, &[(1, 1.0)])).unwrap().is_none());
        let window = acc.push(&record(1, &[(1, 0.0)])).unwrap().unwrap();
        assert_eq!(window.frame_count, 2);
        assert!(acc.finish().is_none());
    }

    #[test]
    fn test_invalid_config() {
        assert!(WindowAccumulator::new(SummaryConfig::new().with_window_size(0)).is_err());
        assert!(WindowAccumulator::new(SummaryConfig::new().with_binarize_cutoff(2.0)).is_err());
    }
}
