//! Writers for the `.xy` and `.gmt` text formats.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use thiserror::Error;
use tracing::info;

use super::format::ExportFormat;
use crate::geometry::{GeometryOnSphere, PointOnSphere};
use crate::reconstruct::ReconstructedFeatureGeometry;

/// Errors that can occur during export.
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Unsupported export format '{specifier}': expected 'xy' or 'gmt'")]
    FileFormat { specifier: String },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Counts of what an export wrote.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportSummary {
    pub format: ExportFormat,
    /// Segments written, one per reconstructed geometry.
    pub segments: usize,
    /// Coordinate lines written, including repeated polygon closing vertices.
    pub points: usize,
}

/// Writes reconstructed geometries in input order to any sink.
pub fn write_geometries<W: Write>(
    writer: &mut W,
    geometries: &[ReconstructedFeatureGeometry<'_>],
    format: ExportFormat,
) -> Result<ExportSummary, ExportError> {
    let mut summary = ExportSummary {
        format,
        segments: 0,
        points: 0,
    };

    for (i, rfg) in geometries.iter().enumerate() {
        match format {
            ExportFormat::Xy => {
                if i > 0 {
                    writeln!(writer, ">")?;
                }
            }
            ExportFormat::Gmt => {
                writeln!(
                    writer,
                    "> featureId={} featureType={} plateId={}",
                    rfg.feature.id(),
                    rfg.feature.feature_type(),
                    rfg.plate_id
                )?;
            }
        }
        summary.points += write_segment(writer, &rfg.reconstructed)?;
        summary.segments += 1;
    }

    writer.flush()?;
    Ok(summary)
}

/// Writes reconstructed geometries to `path`.
///
/// The destination is created or truncated. On failure the caller's
/// geometries are untouched, so the export can be retried.
pub fn export(
    geometries: &[ReconstructedFeatureGeometry<'_>],
    format: ExportFormat,
    path: &Path,
) -> Result<ExportSummary, ExportError> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    let summary = write_geometries(&mut writer, geometries, format)?;
    info!(
        "Exported {} geometries ({} points) to {}",
        summary.segments,
        summary.points,
        path.display()
    );
    Ok(summary)
}

fn write_segment<W: Write>(writer: &mut W, geometry: &GeometryOnSphere) -> std::io::Result<usize> {
    let points = geometry.points();
    for p in points {
        write_point(writer, p)?;
    }
    let closes_ring = matches!(geometry, GeometryOnSphere::Polygon(_))
        && points.first().map(PointOnSphere::position) != points.last().map(PointOnSphere::position);
    if closes_ring {
        write_point(writer, &points[0])?;
    }
    Ok(points.len() + usize::from(closes_ring))
}

fn write_point<W: Write>(writer: &mut W, point: &PointOnSphere) -> std::io::Result<()> {
    let ll = point.to_lat_lon();
    writeln!(writer, "{} {}", format_degrees(ll.lon), format_degrees(ll.lat))
}

/// Six decimals, without a `-0.000000` for values that round to zero.
fn format_degrees(value: f64) -> String {
    let rounded = (value * 1e6).round() / 1e6 + 0.0;
    format!("{:.6}", rounded)
}
