//! Lazy multi-model PDB trajectory reader.
//!
//! Only `CA` atoms are kept; each residue is represented by its alpha carbon.
//! Models are delimited by `MODEL n` / `ENDMDL`. A file without any `MODEL`
//! record is read as a single frame numbered 1.

use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::path::Path;

use foldpath_core::{Coordinate, Frame, FrameSource, ResidueIndex};
use log::{debug, warn};

use crate::{Error, Result};

/// Frame number assigned to single-model files.
const SINGLE_MODEL_FRAME: u64 = 1;

/// Streams frames from PDB text.
pub struct PdbFrameReader<R> {
    lines: Lines<R>,
    line_number: usize,
    current: Option<Frame>,
    saw_model: bool,
    last_frame: Option<u64>,
    emitted: usize,
    max_frames: Option<usize>,
    finished: bool,
}

impl PdbFrameReader<BufReader<File>> {
    /// Opens a PDB file.
    ///
    /// # Errors
    /// Returns `Error::Io` if the file cannot be opened.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(Self::new(crate::open(path)?))
    }
}

impl<R: BufRead> PdbFrameReader<R> {
    /// Wraps a buffered reader.
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            line_number: 0,
            current: None,
            saw_model: false,
            last_frame: None,
            emitted: 0,
            max_frames: None,
            finished: false,
        }
    }

    /// Returns the number of frames yielded so far.
    #[must_use]
    pub fn frames_read(&self) -> usize {
        self.emitted
    }

    fn fail(&mut self, err: Error) -> Option<Result<Frame>> {
        self.finished = true;
        Some(Err(err))
    }

    fn emit(&mut self, frame: Frame) -> Option<Result<Frame>> {
        if let Some(last) = self.last_frame {
            if frame.number <= last {
                let err = Error::at_line(
                    self.line_number,
                    format!(
                        "model {} follows model {last}; frame numbers must increase",
                        frame.number
                    ),
                );
                return self.fail(err);
            }
        }
        self.last_frame = Some(frame.number);
        self.emitted += 1;
        debug!("read frame {} with {} residues", frame.number, frame.len());
        Some(Ok(frame))
    }

    fn parse_model(&self, line: &str) -> Result<u64> {
        line.split_whitespace()
            .nth(1)
            .and_then(|number| number.parse().ok())
            .ok_or_else(|| Error::at_line(self.line_number, format!("invalid MODEL record '{line}'")))
    }
}

/// Extracts `(residue, coordinate)` from a `CA` ATOM record.
///
/// Uses fixed PDB columns: atom name 12..16, residue number 22..26 and
/// coordinates 30..38, 38..46, 46..54. Returns `None` for non-CA atoms and
/// records that cannot be parsed.
fn parse_ca_atom(line: &str) -> Option<(ResidueIndex, Coordinate)> {
    if line.len() < 54 || line.get(12..16)?.trim() != "CA" {
        return None;
    }
    let residue = line.get(22..26)?.trim().parse().ok()?;
    let x = line.get(30..38)?.trim().parse().ok()?;
    let y = line.get(38..46)?.trim().parse().ok()?;
    let z = line.get(46..54)?.trim().parse().ok()?;
    Some((residue, Coordinate::new(x, y, z)))
}

impl<R: BufRead> Iterator for PdbFrameReader<R> {
    type Item = Result<Frame>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        if self.max_frames.is_some_and(|max| self.emitted >= max) {
            self.finished = true;
            return None;
        }

        loop {
            let line = match self.lines.next() {
                Some(Ok(line)) => line,
                Some(Err(err)) => return self.fail(err.into()),
                None => {
                    self.finished = true;
                    // A final model without ENDMDL, or a single-model file
                    return match self.current.take() {
                        Some(frame) if !frame.is_empty() => self.emit(frame),
                        _ => None,
                    };
                }
            };
            self.line_number += 1;

            if line.starts_with("MODEL") {
                let number = match self.parse_model(&line) {
                    Ok(number) => number,
                    Err(err) => return self.fail(err),
                };
                self.saw_model = true;
                if let Some(previous) = self.current.replace(Frame::new(number)) {
                    warn!(
                        "line {}: model {} has no ENDMDL record",
                        self.line_number, previous.number
                    );
                    return self.emit(previous);
                }
            } else if line.starts_with("ENDMDL") {
                if let Some(frame) = self.current.take() {
                    return self.emit(frame);
                }
            } else if line.starts_with("ATOM") {
                let Some((residue, coordinate)) = parse_ca_atom(&line) else {
                    continue;
                };
                if self.current.is_none() && !self.saw_model {
                    self.current = Some(Frame::new(SINGLE_MODEL_FRAME));
                }
                // Atoms between ENDMDL and the next MODEL belong to no frame
                if let Some(frame) = self.current.as_mut() {
                    frame.insert(residue, coordinate);
                }
            }
        }
    }
}

impl<R: BufRead> FrameSource<Error> for PdbFrameReader<R> {
    fn with_max_frames(mut self, max_frames: usize) -> Self {
        self.max_frames = Some(max_frames);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn atom(serial: usize, name: &str, residue: i32, x: f64, y: f64, z: f64) -> String {
        format!(
            "ATOM  {serial:>5} {name:<4} ALA A{residue:>4}    {x:>8.3}{y:>8.3}{z:>8.3}  1.00  0.00           C"
        )
    }

    fn model(number: u64, atoms: &[(i32, f64)]) -> String {
        let mut text = format!("MODEL     {number:>4}\n");
        for (serial, &(residue, x)) in atoms.iter().enumerate() {
            text.push_str(&atom(serial * 2 + 1, "N", residue, 0.0, 0.0, 0.0));
            text.push('\n');
            text.push_str(&atom(serial * 2 + 2, "CA", residue, x, 1.0, 2.0));
            text.push('\n');
        }
        text.push_str("ENDMDL\n");
        text
    }

    fn read_all(text: &str) -> Vec<Result<Frame>> {
        PdbFrameReader::new(text.as_bytes()).collect()
    }

    #[test]
    fn test_parse_ca_atom_columns() {
        let line = atom(2, "CA", 17, 1.5, -2.25, 30.125);
        let (residue, coordinate) = parse_ca_atom(&line).unwrap();
        assert_eq!(residue, 17);
        assert_relative_eq!(coordinate.x, 1.5);
        assert_relative_eq!(coordinate.y, -2.25);
        assert_relative_eq!(coordinate.z, 30.125);

        assert!(parse_ca_atom(&atom(1, "N", 17, 0.0, 0.0, 0.0)).is_none());
        assert!(parse_ca_atom(&atom(1, "CA", -3, 0.0, 0.0, 0.0)).is_none());
        assert!(parse_ca_atom("ATOM      1  CA  ALA").is_none());
    }

    #[test]
    fn test_multi_model() {
        let text = model(1, &[(1, 0.0), (2, 3.8)]) + &model(2, &[(1, 0.5), (2, 4.0), (3, 7.0)]);
        let frames: Vec<Frame> = read_all(&text).into_iter().map(|f| f.unwrap()).collect();

        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].number, 1);
        assert_eq!(frames[0].len(), 2);
        assert_eq!(frames[1].len(), 3);
        assert_relative_eq!(frames[1].get(2).unwrap().x, 4.0);
    }

    #[test]
    fn test_single_model_without_markers() {
        let text = format!(
            "HEADER    TEST\n{}\n{}\nEND\n",
            atom(1, "CA", 5, 1.0, 0.0, 0.0),
            atom(2, "CA", 6, 2.0, 0.0, 0.0)
        );
        let frames = read_all(&text);
        assert_eq!(frames.len(), 1);
        let frame = frames[0].as_ref().unwrap();
        assert_eq!(frame.number, 1);
        assert_eq!(frame.len(), 2);
    }

    #[test]
    fn test_missing_final_endmdl() {
        let text = model(1, &[(1, 0.0)]) + "MODEL        2\n" + &atom(1, "CA", 1, 9.0, 0.0, 0.0);
        let frames = read_all(&text);
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[1].as_ref().unwrap().number, 2);
    }

    #[test]
    fn test_malformed_model_is_error() {
        let text = model(1, &[(1, 0.0)]) + "MODEL    two\n" + &model(3, &[(1, 0.0)]);
        let frames = read_all(&text);
        assert_eq!(frames.len(), 2);
        assert!(frames[0].is_ok());
        assert!(matches!(frames[1], Err(Error::InvalidFormat(_))));
    }

    #[test]
    fn test_non_increasing_models_rejected() {
        let text = model(2, &[(1, 0.0)]) + &model(2, &[(1, 0.0)]);
        let frames = read_all(&text);
        assert!(frames[0].is_ok());
        assert!(matches!(frames[1], Err(Error::InvalidFormat(_))));
    }

    #[test]
    fn test_max_frames() {
        let text: String = (1..=5).map(|n| model(n, &[(1, 0.0)])).collect();
        let reader = PdbFrameReader::new(text.as_bytes()).with_max_frames(3);
        let frames: Vec<_> = reader.collect::<Result<_>>().unwrap();
        assert_eq!(frames.len(), 3);
        assert_eq!(frames.last().map(|f: &Frame| f.number), Some(3));
    }

    #[test]
    fn test_empty_input() {
        assert!(read_all("").is_empty());
    }
}
