//! Schedule files.
//!
//! Every record starts with `start end`. Blank lines and lines starting
//! with `#` are skipped. Any problem is reported with the file and the
//! 1-based line number.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

use edgefix_core::{EdgefixError, Edges, FrameRange, Result};

/// One record kind of a schedule file.
pub trait ZoneRecord: Sized {
    /// Name used in log and error messages.
    const KIND: &'static str;

    /// Build a record from its range and the fields after it.
    fn from_fields(range: FrameRange, rest: &[&str]) -> std::result::Result<Self, String>;

    fn range(&self) -> FrameRange;
}

/// Parse a non-negative integer field.
fn field(value: &str, name: &str) -> std::result::Result<u32, String> {
    value
        .parse()
        .map_err(|_| format!("{name} `{value}` is not a non-negative integer"))
}

/// `start end left right top bottom [fill_left fill_right fill_top fill_bottom]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CropZone {
    pub range: FrameRange,
    pub crop: Edges<u32>,
    pub fill: Edges<u32>,
}

impl ZoneRecord for CropZone {
    const KIND: &'static str = "crop";

    fn from_fields(range: FrameRange, rest: &[&str]) -> std::result::Result<Self, String> {
        if rest.len() != 4 && rest.len() != 8 {
            return Err(format!(
                "expected 6 or 10 fields, found {}",
                rest.len() + 2
            ));
        }
        let edges = |at: usize| -> std::result::Result<Edges<u32>, String> {
            Ok(Edges::new(
                field(rest[at], "left")?,
                field(rest[at + 1], "right")?,
                field(rest[at + 2], "top")?,
                field(rest[at + 3], "bottom")?,
            ))
        };
        let crop = edges(0)?;
        let fill = if rest.len() == 8 { edges(4)? } else { Edges::default() };
        Ok(Self { range, crop, fill })
    }

    fn range(&self) -> FrameRange {
        self.range
    }
}

/// `start end strength`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebandZone {
    pub range: FrameRange,
    pub strength: u32,
}

impl ZoneRecord for DebandZone {
    const KIND: &'static str = "deband";

    fn from_fields(range: FrameRange, rest: &[&str]) -> std::result::Result<Self, String> {
        let strength = rest.first().ok_or("missing strength")?;
        Ok(Self {
            range,
            strength: field(strength, "strength")?,
        })
    }

    fn range(&self) -> FrameRange {
        self.range
    }
}

/// `start end ...`; trailing fields are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractZone {
    pub range: FrameRange,
}

impl ZoneRecord for ExtractZone {
    const KIND: &'static str = "extract";

    fn from_fields(range: FrameRange, _rest: &[&str]) -> std::result::Result<Self, String> {
        Ok(Self { range })
    }

    fn range(&self) -> FrameRange {
        self.range
    }
}

/// A parsed schedule, zones in file order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schedule<Z> {
    /// Where the zones came from, for messages
    pub path: PathBuf,
    pub zones: Vec<Z>,
}

impl<Z: ZoneRecord> Schedule<Z> {
    /// Schedule built in code rather than read from a file.
    pub fn from_zones(zones: Vec<Z>) -> Self {
        Self {
            path: PathBuf::from("<memory>"),
            zones,
        }
    }

    /// Parse schedule text. `path` only labels errors.
    pub fn parse(path: impl Into<PathBuf>, content: &str) -> Result<Self> {
        let path = path.into();
        let mut zones = Vec::new();

        for (number, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let at = |reason: String| EdgefixError::Schedule {
                path: path.clone(),
                line: number + 1,
                reason,
            };
            let fields: Vec<&str> = line.split_whitespace().collect();
            if fields.len() < 2 {
                return Err(at(format!("expected `start end`, found `{line}`")));
            }
            let start = field(fields[0], "start").map_err(at)?;
            let end = field(fields[1], "end").map_err(at)?;
            if start > end {
                return Err(at(format!("range [{start} {end}] ends before it starts")));
            }
            let range = FrameRange { start, end };
            zones.push(Z::from_fields(range, &fields[2..]).map_err(at)?);
        }

        info!(
            kind = Z::KIND,
            path = %path.display(),
            zones = zones.len(),
            "parsed schedule"
        );
        Ok(Self { path, zones })
    }

    /// Read and parse a schedule file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => {
                EdgefixError::NotFound(format!("{} schedule {}", Z::KIND, path.display()))
            }
            _ => EdgefixError::Io(e),
        })?;
        Self::parse(path, &content)
    }

    pub fn len(&self) -> usize {
        self.zones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Z> {
        self.zones.iter()
    }

    /// Ranges in file order.
    pub fn ranges(&self) -> impl Iterator<Item = FrameRange> + '_ {
        self.zones.iter().map(ZoneRecord::range)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn crop(content: &str) -> Result<Schedule<CropZone>> {
        Schedule::parse("crop.txt", content)
    }

    #[test]
    fn test_crop_rows() {
        let s = crop("0 99 10 10 10 10\n\n# credits\n100 120 1 2 3 4 1 0 0 2\n").unwrap();
        assert_eq!(s.len(), 2);
        assert_eq!(s.zones[0].crop, Edges::uniform(10));
        assert_eq!(s.zones[0].fill, Edges::uniform(0));
        assert_eq!(s.zones[1].range, FrameRange { start: 100, end: 120 });
        assert_eq!(s.zones[1].crop, Edges::new(1, 2, 3, 4));
        assert_eq!(s.zones[1].fill, Edges::new(1, 0, 0, 2));
    }

    #[test]
    fn test_wrong_field_count_names_line() {
        let err = crop("0 9 2 2 2 2\n10 19 2 2 2\n").unwrap_err();
        assert!(err.is_configuration());
        match err {
            EdgefixError::Schedule { line, reason, .. } => {
                assert_eq!(line, 2);
                assert!(reason.contains("6 or 10"));
            }
            other => panic!("unexpected error {other:?}"),
        }
        assert!(crop("0 9 2 2 2 2 1 1\n").is_err());
    }

    #[test]
    fn test_bad_values() {
        assert!(crop("0 9 -2 2 2 2\n").is_err());
        assert!(crop("0 9 2.5 2 2 2\n").is_err());
        let err = crop("20 10 0 0 0 0\n").unwrap_err();
        assert!(err.to_string().contains("ends before it starts"));
    }

    #[test]
    fn test_deband_and_extract_rows() {
        let d: Schedule<DebandZone> = Schedule::parse("deband.txt", "5 10 48\n").unwrap();
        assert_eq!(d.zones[0].strength, 48);
        assert!(Schedule::<DebandZone>::parse("deband.txt", "5 10\n").is_err());

        let e: Schedule<ExtractZone> = Schedule::parse("extract.txt", "0 4 note\n10 12\n").unwrap();
        let ranges: Vec<_> = e.ranges().collect();
        assert_eq!(ranges, vec![FrameRange { start: 0, end: 4 }, FrameRange { start: 10, end: 12 }]);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "0 9 2 2 0 0").unwrap();
        let s = Schedule::<CropZone>::load(file.path()).unwrap();
        assert_eq!(s.path, file.path());
        assert_eq!(s.zones[0].crop, Edges::new(2, 2, 0, 0));
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = Schedule::<CropZone>::load(&dir.path().join("absent.txt")).unwrap_err();
        assert!(matches!(err, EdgefixError::NotFound(_)));
        assert!(err.is_configuration());
    }
}
