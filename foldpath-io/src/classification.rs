//! Formation-order persistence.
//!
//! The text layout is line oriented:
//!
//! ```text
//! 3,1,2
//! cluster,break_index
//! 3,0
//! 1,2
//! 2,5
//! never_formed: 4,5
//! ```

use std::io::{Read, Write};

use foldpath_core::ClassificationResult;

use crate::Result;

fn join<T: ToString>(items: &[T]) -> String {
    items.iter().map(ToString::to_string).collect::<Vec<_>>().join(",")
}

/// Writes the formation order as text.
///
/// # Errors
/// Returns `Error::Io` if writing fails.
pub fn write_classification_text<W: Write>(
    mut writer: W,
    result: &ClassificationResult,
) -> Result<()> {
    writeln!(writer, "{}", join(&result.order))?;
    writeln!(writer, "cluster,break_index")?;
    for &cluster in &result.order {
        if let Some(index) = result.break_index(cluster) {
            writeln!(writer, "{cluster},{index}")?;
        }
    }
    writeln!(writer, "never_formed: {}", join(&result.never_formed))?;
    writer.flush()?;
    Ok(())
}

/// Writes the classification as pretty-printed JSON.
///
/// # Errors
/// Returns `Error::Json` or `Error::Io` if writing fails.
pub fn write_classification_json<W: Write>(
    mut writer: W,
    result: &ClassificationResult,
) -> Result<()> {
    serde_json::to_writer_pretty(&mut writer, result)?;
    writeln!(writer)?;
    writer.flush()?;
    Ok(())
}

/// Reads a classification written by [`write_classification_json`].
///
/// # Errors
/// Returns `Error::Json` for malformed input.
pub fn read_classification_json<R: Read>(reader: R) -> Result<ClassificationResult> {
    Ok(serde_json::from_reader(reader)?)
}
