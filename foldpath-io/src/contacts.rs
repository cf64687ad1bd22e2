//! Native contact tables.
//!
//! Two layouts are supported: the raw whitespace table that feeds the
//! clusterer (`i j r6 r12 [r]`, `#` comments allowed) and the clustered map
//! CSV with header `i,j,r6,r12,r,cluster`.

use std::io::{BufRead, Read, Write};

use foldpath_core::{ContactRow, NativeContact, NativeContactMap, ResidueIndex};
use log::info;

use crate::{Error, Result};

fn parse_field<T: std::str::FromStr>(line: usize, name: &str, value: &str) -> Result<T> {
    value
        .parse()
        .map_err(|_| Error::at_line(line, format!("cannot parse {name} from '{value}'")))
}

/// Reads a raw contact table into an unclustered map.
///
/// Each non-blank line holds `i j r6 r12` and optionally `r`. When `r` is
/// absent it is derived from the coefficients as `10 * sqrt(6/5 * r12/r6)`.
///
/// # Errors
/// Returns `Error::InvalidFormat` for rows with the wrong column count or
/// unparseable numbers, and `Error::CoreError` when the rows do not form a
/// valid map.
pub fn read_raw_contacts<R: BufRead>(reader: R) -> Result<NativeContactMap> {
    let mut rows = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let number = idx + 1;
        let content = line.split('#').next().unwrap_or_default().trim();
        if content.is_empty() {
            continue;
        }

        let fields: Vec<&str> = content.split_whitespace().collect();
        if !(4..=5).contains(&fields.len()) {
            return Err(Error::at_line(
                number,
                format!("expected 'i j r6 r12 [r]', found {} columns", fields.len()),
            ));
        }
        let i: ResidueIndex = parse_field(number, "i", fields[0])?;
        let j: ResidueIndex = parse_field(number, "j", fields[1])?;
        let r6: f64 = parse_field(number, "r6", fields[2])?;
        let r12: f64 = parse_field(number, "r12", fields[3])?;
        let r = match fields.get(4) {
            Some(value) => parse_field(number, "r", value)?,
            None => NativeContact::native_distance_from_coefficients(r6, r12),
        };
        rows.push(ContactRow::new(i, j, r6, r12, r));
    }

    let map = NativeContactMap::from_rows(rows)?;
    info!("read {} native contacts", map.len());
    Ok(map)
}

/// Reads a clustered contact map CSV.
///
/// # Errors
/// Returns `Error::Csv` for malformed rows and `Error::CoreError` when the
/// contacts do not form a valid map.
pub fn read_contact_map<R: Read>(reader: R) -> Result<NativeContactMap> {
    let mut csv = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let contacts = csv
        .deserialize::<NativeContact>()
        .collect::<std::result::Result<Vec<_>, _>>()?;
    let map = NativeContactMap::from_contacts(contacts)?;
    info!(
        "read contact map: {} contacts in {} clusters",
        map.len(),
        map.cluster_ids().len()
    );
    Ok(map)
}

/// Writes a contact map as CSV with header `i,j,r6,r12,r,cluster`.
///
/// # Errors
/// Returns `Error::Csv` or `Error::Io` if writing fails.
pub fn write_contact_map<W: Write>(writer: W, map: &NativeContactMap) -> Result<()> {
    let mut csv = csv::Writer::from_writer(writer);
    for contact in map {
        csv.serialize(contact)?;
    }
    csv.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use foldpath_core::UNASSIGNED;

    #[test]
    fn test_read_raw_contacts() {
        let input = "\
# i j r6 r12 r
1 10 0.5 0.25 5.0

2 11 0.5 0.25 5.5  # trailing comment
12 3 0.5 0.25 4.0
";
        let map = read_raw_contacts(input.as_bytes()).unwrap();
        assert_eq!(map.len(), 3);
        assert_eq!(map.contacts()[2].pair(), (3, 12));
        assert_relative_eq!(map.contacts()[1].r, 5.5);
        assert!(map.iter().all(|c| c.cluster == UNASSIGNED));
    }

    #[test]
    fn test_raw_contacts_derive_distance() {
        let map = read_raw_contacts("4 9 6.0 5.0\n".as_bytes()).unwrap();
        assert_relative_eq!(map.contacts()[0].r, 10.0, epsilon = 1e-12);
    }

    #[test]
    fn test_raw_contacts_errors() {
        let err = read_raw_contacts("1 2 0.5\n".as_bytes()).unwrap_err();
        assert!(matches!(err, Error::InvalidFormat(ref msg) if msg.starts_with("line 1")));

        let err = read_raw_contacts("1 x 0.5 0.5 5.0\n".as_bytes()).unwrap_err();
        assert!(matches!(err, Error::InvalidFormat(_)));

        let err = read_raw_contacts("3 3 0.5 0.5 5.0\n".as_bytes()).unwrap_err();
        assert!(matches!(
            err,
            Error::CoreError(foldpath_core::Error::Format(_))
        ));

        let err = read_raw_contacts("# nothing\n".as_bytes()).unwrap_err();
        assert!(matches!(err, Error::CoreError(foldpath_core::Error::EmptyMap)));
    }

    #[test]
    fn test_contact_map_round_trip() {
        let map = NativeContactMap::from_contacts(vec![
            NativeContact::new(1, 10, 0.5, 0.25, 5.0).with_cluster(1),
            NativeContact::new(40, 50, 0.125, 0.75, 6.25),
        ])
        .unwrap();

        let mut buffer = Vec::new();
        write_contact_map(&mut buffer, &map).unwrap();
        let text = String::from_utf8(buffer.clone()).unwrap();
        assert!(text.starts_with("i,j,r6,r12,r,cluster\n"));

        let restored = read_contact_map(buffer.as_slice()).unwrap();
        assert_eq!(restored, map);
    }

    #[test]
    fn test_contact_map_missing_column() {
        let input = "i,j,r6,r12,cluster\n1,2,0.5,0.5,1\n";
        assert!(matches!(
            read_contact_map(input.as_bytes()),
            Err(Error::Csv(_))
        ));
    }
}
