//! CSV persistence for per-frame records, window summaries and smoothed series.
//!
//! Per-frame CSV columns are `frame,contacts,q,contact_list,clusters_filling`
//! with the formed contacts written as `[(i, j), ...]` and the filling map
//! as `{c: f, ...}`. Both are parsed back on reading.
#![allow(clippy::float_cmp)]

use std::collections::{BTreeMap, BTreeSet};
use std::io::{Read, Write};

use foldpath_algorithms::SmoothedRecord;
use foldpath_core::{ClusterId, FrameContactRecord, ResidueIndex, SummaryWindow};
use log::info;

use crate::{Error, Result};

const FRAME_HEADER: [&str; 5] = ["frame", "contacts", "q", "contact_list", "clusters_filling"];
const CLUSTER_PREFIX: &str = "cluster_";

fn format_contact_list(pairs: &[(ResidueIndex, ResidueIndex)]) -> String {
    let items: Vec<String> = pairs.iter().map(|(i, j)| format!("({i}, {j})")).collect();
    format!("[{}]", items.join(", "))
}

fn format_filling(filling: &BTreeMap<ClusterId, f64>) -> String {
    let items: Vec<String> = filling.iter().map(|(c, f)| format!("{c}: {f}")).collect();
    format!("{{{}}}", items.join(", "))
}

fn parse_contact_list(line: usize, text: &str) -> Result<Vec<(ResidueIndex, ResidueIndex)>> {
    let invalid = || Error::at_line(line, format!("invalid contact list '{text}'"));
    let inner = text
        .trim()
        .strip_prefix('[')
        .and_then(|s| s.strip_suffix(']'))
        .ok_or_else(invalid)?;

    let mut pairs = Vec::new();
    for item in inner.split(')') {
        let item = item.trim().trim_start_matches(',').trim();
        if item.is_empty() {
            continue;
        }
        let (i, j) = item
            .strip_prefix('(')
            .and_then(|body| body.split_once(','))
            .ok_or_else(invalid)?;
        let i = i.trim().parse().map_err(|_| invalid())?;
        let j = j.trim().parse().map_err(|_| invalid())?;
        pairs.push((i, j));
    }
    Ok(pairs)
}

fn parse_filling(line: usize, text: &str) -> Result<BTreeMap<ClusterId, f64>> {
    let invalid = || Error::at_line(line, format!("invalid cluster filling '{text}'"));
    let inner = text
        .trim()
        .strip_prefix('{')
        .and_then(|s| s.strip_suffix('}'))
        .ok_or_else(invalid)?;

    inner
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(|item| -> Result<(ClusterId, f64)> {
            let (cluster, value) = item.split_once(':').ok_or_else(invalid)?;
            let cluster = cluster.trim().parse().map_err(|_| invalid())?;
            let value = value.trim().parse().map_err(|_| invalid())?;
            Ok((cluster, value))
        })
        .collect()
}

fn field<'r>(record: &'r csv::StringRecord, idx: usize, name: &str) -> Result<&'r str> {
    record.get(idx).ok_or_else(|| {
        Error::at_line(record_line(record), format!("missing column '{name}'"))
    })
}

fn record_line(record: &csv::StringRecord) -> usize {
    record
        .position()
        .and_then(|p| usize::try_from(p.line()).ok())
        .unwrap_or(0)
}

/// Streaming writer for per-frame records.
pub struct FrameRecordWriter<W: Write> {
    csv: csv::Writer<W>,
    written: usize,
}

impl<W: Write> FrameRecordWriter<W> {
    /// Creates a writer and emits the header.
    ///
    /// # Errors
    /// Returns `Error::Csv` if the header cannot be written.
    pub fn new(writer: W) -> Result<Self> {
        let mut csv = csv::Writer::from_writer(writer);
        csv.write_record(FRAME_HEADER)?;
        Ok(Self { csv, written: 0 })
    }

    /// Appends one record.
    ///
    /// # Errors
    /// Returns `Error::Csv` if writing fails.
    pub fn write(&mut self, record: &FrameContactRecord) -> Result<()> {
        self.csv.write_record([
            record.frame.to_string(),
            record.formed_count().to_string(),
            record.q.to_string(),
            format_contact_list(&record.formed),
            format_filling(&record.cluster_filling),
        ])?;
        self.written += 1;
        Ok(())
    }

    /// Returns the number of records written.
    #[must_use]
    pub fn written(&self) -> usize {
        self.written
    }

    /// Flushes buffered output.
    ///
    /// # Errors
    /// Returns `Error::Io` if flushing fails.
    pub fn flush(&mut self) -> Result<()> {
        self.csv.flush()?;
        Ok(())
    }
}

/// Writes all per-frame records.
///
/// # Errors
/// Returns `Error::Csv` or `Error::Io` if writing fails.
pub fn write_frame_records<W: Write>(writer: W, records: &[FrameContactRecord]) -> Result<()> {
    let mut out = FrameRecordWriter::new(writer)?;
    for record in records {
        out.write(record)?;
    }
    out.flush()
}

/// Reads per-frame records written by [`write_frame_records`].
///
/// # Errors
/// Returns `Error::InvalidFormat` for unparseable fields or a contact count
/// that disagrees with the contact list.
pub fn read_frame_records<R: Read>(reader: R) -> Result<Vec<FrameContactRecord>> {
    let mut csv = csv::Reader::from_reader(reader);
    let mut records = Vec::new();
    for row in csv.records() {
        let row = row?;
        let line = record_line(&row);
        let parse_err = |name: &str| Error::at_line(line, format!("cannot parse {name}"));

        let frame: u64 = field(&row, 0, "frame")?
            .trim()
            .parse()
            .map_err(|_| parse_err("frame"))?;
        let contacts: usize = field(&row, 1, "contacts")?
            .trim()
            .parse()
            .map_err(|_| parse_err("contacts"))?;
        let q: f64 = field(&row, 2, "q")?
            .trim()
            .parse()
            .map_err(|_| parse_err("q"))?;
        let formed = parse_contact_list(line, field(&row, 3, "contact_list")?)?;
        let cluster_filling = parse_filling(line, field(&row, 4, "clusters_filling")?)?;

        if formed.len() != contacts {
            return Err(Error::at_line(
                line,
                format!("contacts is {contacts} but the list holds {}", formed.len()),
            ));
        }
        records.push(FrameContactRecord {
            frame,
            formed,
            q,
            cluster_filling,
        });
    }
    info!("read {} frame records", records.len());
    Ok(records)
}

fn cluster_columns<'a>(values: impl Iterator<Item = &'a BTreeMap<ClusterId, f64>>) -> Vec<ClusterId> {
    values
        .flat_map(BTreeMap::keys)
        .copied()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Writes window summaries as `window,frame,frames,cluster_<c>...`.
///
/// Clusters missing from a window are written as 0.
///
/// # Errors
/// Returns `Error::Csv` or `Error::Io` if writing fails.
pub fn write_summary<W: Write>(writer: W, windows: &[SummaryWindow]) -> Result<()> {
    let clusters = cluster_columns(windows.iter().map(|w| &w.values));
    let mut csv = csv::Writer::from_writer(writer);

    let mut header = vec!["window".to_string(), "frame".to_string(), "frames".to_string()];
    header.extend(clusters.iter().map(|c| format!("{CLUSTER_PREFIX}{c}")));
    csv.write_record(&header)?;

    for window in windows {
        let mut row = vec![
            window.index.to_string(),
            window.first_frame.to_string(),
            window.frame_count.to_string(),
        ];
        row.extend(
            clusters
                .iter()
                .map(|&c| window.value(c).unwrap_or(0.0).to_string()),
        );
        csv.write_record(&row)?;
    }
    csv.flush()?;
    Ok(())
}

/// Reads window summaries written by [`write_summary`].
///
/// A missing `window` column numbers windows by row and a missing `frames`
/// column leaves `frame_count` at 0. A window is marked binarized when all
/// of its values are exactly 0 or 1.
///
/// # Errors
/// Returns `Error::InvalidFormat` if the `frame` column is absent or a value
/// cannot be parsed.
pub fn read_summary<R: Read>(reader: R) -> Result<Vec<SummaryWindow>> {
    let mut csv = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let headers = csv.headers()?.clone();

    let column = |name: &str| headers.iter().position(|h| h == name);
    let frame_col = column("frame")
        .ok_or_else(|| Error::InvalidFormat("summary has no 'frame' column".to_string()))?;
    let window_col = column("window");
    let frames_col = column("frames");
    let cluster_cols: Vec<(usize, ClusterId)> = headers
        .iter()
        .enumerate()
        .filter_map(|(idx, name)| {
            let id = name.strip_prefix(CLUSTER_PREFIX)?.parse().ok()?;
            Some((idx, id))
        })
        .collect();

    let mut windows = Vec::new();
    for (row_idx, row) in csv.records().enumerate() {
        let row = row?;
        let line = record_line(&row);
        let get = |idx: usize, name: &str| field(&row, idx, name);
        let parse_err = |name: &str| Error::at_line(line, format!("cannot parse {name}"));

        let index: usize = match window_col {
            Some(idx) => get(idx, "window")?.parse().map_err(|_| parse_err("window"))?,
            None => row_idx,
        };
        let first_frame: u64 = get(frame_col, "frame")?
            .parse()
            .map_err(|_| parse_err("frame"))?;
        let frame_count: usize = match frames_col {
            Some(idx) => get(idx, "frames")?.parse().map_err(|_| parse_err("frames"))?,
            None => 0,
        };
        let values = cluster_cols
            .iter()
            .map(|&(idx, cluster)| -> Result<(ClusterId, f64)> {
                let value: f64 = get(idx, "cluster")?
                    .parse()
                    .map_err(|_| parse_err(&format!("{CLUSTER_PREFIX}{cluster}")))?;
                Ok((cluster, value))
            })
            .collect::<Result<BTreeMap<_, _>>>()?;
        let binarized = values.values().all(|&v| v == 0.0 || v == 1.0);

        windows.push(SummaryWindow {
            index,
            first_frame,
            frame_count,
            binarized,
            values,
        });
    }
    info!("read {} summary windows", windows.len());
    Ok(windows)
}

/// Writes smoothed series as `frame,q_smooth,cluster_<c>_smooth...`.
///
/// # Errors
/// Returns `Error::Csv` or `Error::Io` if writing fails.
pub fn write_smoothed<W: Write>(writer: W, records: &[SmoothedRecord]) -> Result<()> {
    let clusters = cluster_columns(records.iter().map(|r| &r.cluster_smooth));
    let mut csv = csv::Writer::from_writer(writer);

    let mut header = vec!["frame".to_string(), "q_smooth".to_string()];
    header.extend(clusters.iter().map(|c| format!("{CLUSTER_PREFIX}{c}_smooth")));
    csv.write_record(&header)?;

    for record in records {
        let mut row = vec![record.frame.to_string(), record.q_smooth.to_string()];
        row.extend(clusters.iter().map(|c| {
            record
                .cluster_smooth
                .get(c)
                .copied()
                .unwrap_or(0.0)
                .to_string()
        }));
        csv.write_record(&row)?;
    }
    csv.flush()?;
    Ok(())
}
