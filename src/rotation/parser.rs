//! Reader for PLATES4 rotation files (`.rot`).
//!
//! Each record is one line of whitespace-separated fields:
//!
//! ```text
//! movingPlateId time poleLatitude poleLongitude angleDegrees fixedPlateId comment...
//! ```
//!
//! Times are in Ma, angles in signed degrees, and the comment runs to the end
//! of the line (a leading `!` marker is stripped).

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info, warn};

use super::sequence::RotationSample;
use super::store::RotationStore;
use crate::ids::PlateId;

/// Moving plate id used for comment records.
pub const COMMENT_PLATE_ID: u32 = 999;

/// Errors that can occur while reading rotation files.
#[derive(Error, Debug)]
pub enum RotationFileError {
    #[error("IO error reading '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Malformed rotation record at {}:{line}: {reason}", .path.display())]
    Malformed {
        path: PathBuf,
        line: usize,
        reason: String,
    },
}

/// Counts gathered while reading rotation records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParseStats {
    /// Records added to the store.
    pub records: usize,
    /// Records skipped because their moving plate is [`COMMENT_PLATE_ID`].
    pub comment_records: usize,
    /// Records dropped because their plate already had the same record at
    /// that time.
    pub duplicates: usize,
    /// Records kept as the second half of a crossover.
    pub crossovers: usize,
}

impl ParseStats {
    fn absorb(&mut self, other: ParseStats) {
        self.records += other.records;
        self.comment_records += other.comment_records;
        self.duplicates += other.duplicates;
        self.crossovers += other.crossovers;
    }
}

/// Parses one record line.
///
/// Returns `Ok(None)` for blank lines and comment records.
pub fn parse_record(line: &str) -> Result<Option<RotationSample>, String> {
    let mut rest = line.trim();
    if rest.is_empty() {
        return Ok(None);
    }

    let mut fields = [""; 6];
    for (i, field) in fields.iter_mut().enumerate() {
        rest = rest.trim_start();
        if rest.is_empty() {
            return Err(format!("expected 6 fields, found {}", i));
        }
        let end = rest.find(char::is_whitespace).unwrap_or(rest.len());
        *field = &rest[..end];
        rest = &rest[end..];
    }

    let moving: u32 = parse_field(fields[0], "moving plate id")?;
    if moving == COMMENT_PLATE_ID {
        return Ok(None);
    }
    let time: f64 = parse_field(fields[1], "time")?;
    let lat: f64 = parse_field(fields[2], "pole latitude")?;
    let lon: f64 = parse_field(fields[3], "pole longitude")?;
    let angle: f64 = parse_field(fields[4], "angle")?;
    let fixed: u32 = parse_field(fields[5], "fixed plate id")?;

    if !time.is_finite() || time < 0.0 {
        return Err(format!("time must be finite and >= 0, got {}", time));
    }
    if !lat.is_finite() || lat.abs() > 90.0 {
        return Err(format!("pole latitude out of range: {}", lat));
    }
    if !lon.is_finite() || !angle.is_finite() {
        return Err("pole longitude and angle must be finite".to_string());
    }
    if moving == fixed {
        return Err(format!("plate {} is fixed to itself", moving));
    }

    let comment = rest.trim();
    let comment = comment.strip_prefix('!').unwrap_or(comment).trim();

    let sample = RotationSample::from_pole(PlateId(moving), time, lat, lon, angle, PlateId(fixed));
    Ok(Some(if comment.is_empty() {
        sample
    } else {
        sample.with_comment(comment)
    }))
}

fn parse_field<T: std::str::FromStr>(text: &str, name: &str) -> Result<T, String> {
    text.parse()
        .map_err(|_| format!("invalid {} '{}'", name, text))
}

/// Parses rotation records from text into `store`.
///
/// `source` is only used to label errors. Two records for one moving plate at
/// the same time with different fixed plates form a crossover and are both
/// kept. A record repeating an existing time and fixed plate is dropped, and
/// the first record read wins.
pub fn parse_rotation_str(
    text: &str,
    source: &Path,
    store: &mut RotationStore,
) -> Result<ParseStats, RotationFileError> {
    let mut stats = ParseStats::default();

    for (idx, line) in text.lines().enumerate() {
        let line_no = idx + 1;
        let malformed = |reason: String| RotationFileError::Malformed {
            path: source.to_path_buf(),
            line: line_no,
            reason,
        };

        let sample = match parse_record(line).map_err(malformed)? {
            Some(sample) => sample,
            None => {
                if !line.trim().is_empty() {
                    stats.comment_records += 1;
                }
                continue;
            }
        };

        let existing = store.sequence(sample.moving_plate);
        if existing.is_some_and(|seq| seq.is_duplicate(&sample)) {
            warn!(
                "Dropping duplicate rotation for plate {} at {} Ma ({}:{})",
                sample.moving_plate,
                sample.time,
                source.display(),
                line_no
            );
            stats.duplicates += 1;
            continue;
        }
        if existing.is_some_and(|seq| seq.has_sample_at(sample.time)) {
            debug!(
                "Crossover for plate {} at {} Ma now fixed to {} ({}:{})",
                sample.moving_plate,
                sample.time,
                sample.fixed_plate,
                source.display(),
                line_no
            );
            stats.crossovers += 1;
        }

        store
            .insert(sample)
            .map_err(|e| malformed(e.to_string()))?;
        stats.records += 1;
    }

    debug!(
        "Parsed {} rotation records from {} ({} comments, {} duplicates, {} crossovers)",
        stats.records,
        source.display(),
        stats.comment_records,
        stats.duplicates,
        stats.crossovers
    );
    Ok(stats)
}

/// Reads one rotation file into `store`.
pub fn load_rotation_file(path: &Path, store: &mut RotationStore) -> Result<ParseStats, RotationFileError> {
    let text = std::fs::read_to_string(path).map_err(|source| RotationFileError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_rotation_str(&text, path, store)
}

/// Reads several rotation files into one store, in the order given.
pub fn load_rotation_files<P: AsRef<Path>>(paths: &[P]) -> Result<(RotationStore, ParseStats), RotationFileError> {
    let mut store = RotationStore::new();
    let mut stats = ParseStats::default();
    for path in paths {
        stats.absorb(load_rotation_file(path.as_ref(), &mut store)?);
    }
    info!(
        "Loaded {} rotation records for {} moving plates from {} file(s)",
        stats.records,
        store.len(),
        paths.len()
    );
    Ok((store, stats))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::FiniteRotation;
    use std::io::Write;
    use tempfile::tempdir;

    const SAMPLE_ROT: &str = "\
801   0.0   90.0    0.0    0.0  000 ! Australia-Antarctica present day
801  10.0   90.0    0.0   20.0  000 ! test pole
999   0.0    0.0    0.0    0.0  999 ! comment record

802  0.0  0.0  0.0  0.0 801
802  5.5 -12.25 45.5 -3.75 801 no bang comment
";

    #[test]
    fn test_parse_record_fields() {
        let sample = parse_record("801 10.0 90.0 0.0 20.0 000 ! test pole")
            .unwrap()
            .unwrap();
        assert_eq!(sample.moving_plate, PlateId(801));
        assert_eq!(sample.fixed_plate, PlateId(0));
        assert_eq!(sample.time, 10.0);
        assert_eq!(sample.comment.as_deref(), Some("test pole"));
        assert!(sample
            .rotation
            .approx_eq(&FiniteRotation::from_pole_and_angle(90.0, 0.0, 20.0), 1e-15));
    }

    #[test]
    fn test_parse_record_skips_blank_and_comment_records() {
        assert!(parse_record("   ").unwrap().is_none());
        assert!(parse_record("999 0.0 0.0 0.0 0.0 999 !header").unwrap().is_none());
    }

    #[test]
    fn test_parse_record_errors() {
        assert!(parse_record("801 10.0 90.0 0.0").is_err());
        assert!(parse_record("801 ten 90.0 0.0 20.0 000").is_err());
        assert!(parse_record("801 -1.0 90.0 0.0 20.0 000").is_err());
        assert!(parse_record("801 1.0 95.0 0.0 20.0 000").is_err());
        assert!(parse_record("801 1.0 45.0 0.0 20.0 801").is_err());
        assert!(parse_record("-801 1.0 45.0 0.0 20.0 000").is_err());
    }

    #[test]
    fn test_parse_rotation_str() {
        let mut store = RotationStore::new();
        let stats = parse_rotation_str(SAMPLE_ROT, Path::new("sample.rot"), &mut store).unwrap();

        assert_eq!(stats.records, 4);
        assert_eq!(stats.comment_records, 1);
        assert_eq!(store.moving_plates(), vec![PlateId(801), PlateId(802)]);

        let seq = store.sequence(PlateId(802)).unwrap();
        assert_eq!(seq.samples()[1].comment.as_deref(), Some("no bang comment"));
        assert_eq!(seq.samples()[1].fixed_plate, PlateId(801));
    }

    #[test]
    fn test_duplicate_record_keeps_first() {
        let text = "801 10.0 0.0 0.0 5.0 802\n801 10.0 0.0 0.0 7.0 802\n";
        let mut store = RotationStore::new();
        let stats = parse_rotation_str(text, Path::new("dup.rot"), &mut store).unwrap();

        assert_eq!(stats.records, 1);
        assert_eq!(stats.duplicates, 1);
        let seq = store.sequence(PlateId(801)).unwrap();
        assert!(seq.samples()[0]
            .rotation
            .approx_eq(&FiniteRotation::from_pole_and_angle(0.0, 0.0, 5.0), 1e-15));
    }

    #[test]
    fn test_crossover_records_are_both_kept() {
        let text = "\
801  0.0 0.0 0.0 0.0 802
801 50.0 0.0 0.0 5.0 802 ! end of 802 segment
801 50.0 10.0 20.0 8.0 000 ! crossover to 000
801 100.0 10.0 20.0 12.0 000
";
        let mut store = RotationStore::new();
        let stats = parse_rotation_str(text, Path::new("cross.rot"), &mut store).unwrap();

        assert_eq!(stats.records, 4);
        assert_eq!(stats.crossovers, 1);
        assert_eq!(stats.duplicates, 0);
        let fixed: Vec<PlateId> = store
            .sequence(PlateId(801))
            .unwrap()
            .samples()
            .iter()
            .map(|s| s.fixed_plate)
            .collect();
        assert_eq!(fixed, vec![PlateId(802), PlateId(802), PlateId(0), PlateId(0)]);
    }

    #[test]
    fn test_malformed_line_reports_location() {
        let text = "801 0.0 0.0 0.0 0.0 000\n801 x 0.0 0.0 0.0 000\n";
        let mut store = RotationStore::new();
        match parse_rotation_str(text, Path::new("bad.rot"), &mut store) {
            Err(RotationFileError::Malformed { line, path, .. }) => {
                assert_eq!(line, 2);
                assert_eq!(path, PathBuf::from("bad.rot"));
            }
            other => panic!("expected malformed error, got {:?}", other),
        }
    }

    #[test]
    fn test_load_rotation_files() {
        let dir = tempdir().unwrap();
        let a = dir.path().join("a.rot");
        let b = dir.path().join("b.rot");
        std::fs::File::create(&a)
            .unwrap()
            .write_all(b"801 0.0 0.0 0.0 0.0 000\n801 10.0 90.0 0.0 20.0 000\n")
            .unwrap();
        std::fs::File::create(&b)
            .unwrap()
            .write_all(b"802 0.0 0.0 0.0 0.0 801\n")
            .unwrap();

        let (store, stats) = load_rotation_files(&[a, b]).unwrap();
        assert_eq!(stats.records, 3);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempdir().unwrap();
        let result = load_rotation_files(&[dir.path().join("missing.rot")]);
        assert!(matches!(result, Err(RotationFileError::Io { .. })));
    }
}
