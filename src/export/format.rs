//! Output format selection.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::writer::ExportError;

/// Text formats for reconstructed geometries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportFormat {
    /// `lon lat` lines, segments separated by `>`.
    #[default]
    Xy,
    /// As `Xy`, with a `>` metadata header before every segment.
    Gmt,
}

impl ExportFormat {
    /// File extension without the dot.
    pub const fn extension(self) -> &'static str {
        match self {
            ExportFormat::Xy => "xy",
            ExportFormat::Gmt => "gmt",
        }
    }

    /// Infers the format from the extension of `path`.
    pub fn from_path(path: &Path) -> Result<Self, ExportError> {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        ext.parse().map_err(|_| ExportError::FileFormat {
            specifier: path.display().to_string(),
        })
    }
}

impl FromStr for ExportFormat {
    type Err = ExportError;

    /// Accepts `xy` or `gmt`, case-insensitive, with an optional leading dot.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let name = trimmed.strip_prefix('.').unwrap_or(trimmed);
        if name.eq_ignore_ascii_case("xy") {
            Ok(ExportFormat::Xy)
        } else if name.eq_ignore_ascii_case("gmt") {
            Ok(ExportFormat::Gmt)
        } else {
            Err(ExportError::FileFormat { specifier: s.to_string() })
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_specifiers() {
        assert_eq!("xy".parse::<ExportFormat>().unwrap(), ExportFormat::Xy);
        assert_eq!(".GMT".parse::<ExportFormat>().unwrap(), ExportFormat::Gmt);
        assert!(matches!(
            "shp".parse::<ExportFormat>(),
            Err(ExportError::FileFormat { specifier }) if specifier == "shp"
        ));
        assert!("".parse::<ExportFormat>().is_err());
    }

    #[test]
    fn test_from_path() {
        assert_eq!(ExportFormat::from_path(Path::new("out/recon.xy")).unwrap(), ExportFormat::Xy);
        assert_eq!(ExportFormat::from_path(Path::new("recon.gmt")).unwrap(), ExportFormat::Gmt);
        assert!(ExportFormat::from_path(Path::new("recon")).is_err());
        assert!(ExportFormat::from_path(Path::new("recon.kml")).is_err());
    }
}
