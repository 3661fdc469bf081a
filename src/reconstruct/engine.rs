//! Per-feature reconstruction on top of a rotation model.

use rayon::prelude::*;
use thiserror::Error;
use tracing::{info, warn};

use super::config::ReconstructConfig;
use super::request::ReconstructError;
use crate::export::ExportSummary;
use crate::feature::{Feature, FeatureError, FeatureTimeModel};
use crate::geometry::{apply_rotation, FiniteRotation, GeometryError, GeometryOnSphere};
use crate::ids::{FeatureId, PlateId, QualifiedName};
use crate::rotation::{RotationError, RotationModel};

/// Why a single feature could not be reconstructed.
///
/// These never abort a request; they are recorded in the report.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FeatureReconstructionError {
    #[error(transparent)]
    Feature(#[from] FeatureError),
    #[error(transparent)]
    Rotation(#[from] RotationError),
    #[error(transparent)]
    Geometry(#[from] GeometryError),
}

/// One geometry property of a feature moved to its position at the
/// reconstruction time.
#[derive(Debug, Clone, PartialEq)]
pub struct ReconstructedFeatureGeometry<'f> {
    pub feature: &'f Feature,
    /// Name of the geometry property this was read from.
    pub property: &'f QualifiedName,
    pub present_day: &'f GeometryOnSphere,
    pub rotation: FiniteRotation,
    pub plate_id: PlateId,
    pub reconstructed: GeometryOnSphere,
}

/// What happened to one feature.
#[derive(Debug, Clone, PartialEq)]
pub enum FeatureStatus {
    /// All geometries were reconstructed.
    Reconstructed { geometries: usize },
    /// The time lies outside the feature's valid-time window.
    NotValidAtTime,
    Failed(FeatureReconstructionError),
}

/// The outcome for one input feature.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureOutcome<'f> {
    pub feature: &'f Feature,
    pub status: FeatureStatus,
}

/// Results of reconstructing a feature set, in input order.
#[derive(Debug, Clone)]
pub struct ReconstructionReport<'f> {
    time: f64,
    anchor: PlateId,
    geometries: Vec<ReconstructedFeatureGeometry<'f>>,
    outcomes: Vec<FeatureOutcome<'f>>,
}

impl<'f> ReconstructionReport<'f> {
    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn anchor(&self) -> PlateId {
        self.anchor
    }

    /// Reconstructed geometries of all successful features, in input order.
    pub fn geometries(&self) -> &[ReconstructedFeatureGeometry<'f>] {
        &self.geometries
    }

    /// One outcome per input feature, in input order.
    pub fn outcomes(&self) -> &[FeatureOutcome<'f>] {
        &self.outcomes
    }

    /// Features that failed, with their errors.
    pub fn failures(&self) -> impl Iterator<Item = (&'f Feature, &FeatureReconstructionError)> + '_ {
        self.outcomes.iter().filter_map(|o| match &o.status {
            FeatureStatus::Failed(e) => Some((o.feature, e)),
            _ => None,
        })
    }

    /// Aggregate counts, detached from the borrowed features.
    pub fn summary(&self) -> ReconstructionSummary {
        let mut summary = ReconstructionSummary {
            time: self.time,
            anchor: self.anchor,
            features: self.outcomes.len(),
            reconstructed: 0,
            not_valid: 0,
            failures: Vec::new(),
            geometries: self.geometries.len(),
            export: None,
        };
        for outcome in &self.outcomes {
            match &outcome.status {
                FeatureStatus::Reconstructed { .. } => summary.reconstructed += 1,
                FeatureStatus::NotValidAtTime => summary.not_valid += 1,
                FeatureStatus::Failed(e) => summary.failures.push((outcome.feature.id().clone(), e.clone())),
            }
        }
        summary
    }
}

/// Aggregate result of a reconstruction request.
#[derive(Debug, Clone, PartialEq)]
pub struct ReconstructionSummary {
    pub time: f64,
    pub anchor: PlateId,
    /// Number of input features.
    pub features: usize,
    pub reconstructed: usize,
    pub not_valid: usize,
    pub failures: Vec<(FeatureId, FeatureReconstructionError)>,
    /// Number of reconstructed geometries.
    pub geometries: usize,
    /// Set once the geometries have been written.
    pub export: Option<ExportSummary>,
}

impl ReconstructionSummary {
    pub fn failed(&self) -> usize {
        self.failures.len()
    }
}

/// Reconstructs features against one rotation model.
#[derive(Debug, Clone, Copy)]
pub struct Reconstructor<'m> {
    model: &'m RotationModel,
    time_model: FeatureTimeModel,
    parallel: bool,
}

impl<'m> Reconstructor<'m> {
    pub fn new(model: &'m RotationModel, config: &ReconstructConfig) -> Self {
        Self {
            model,
            time_model: FeatureTimeModel::new(config.missing_plate_id),
            parallel: config.parallel,
        }
    }

    /// Reconstructs every geometry of one feature.
    ///
    /// Returns `Ok(None)` when the feature is not valid at `time`.
    pub fn reconstruct_feature<'f>(
        &self,
        feature: &'f Feature,
        time: f64,
        anchor: PlateId,
    ) -> Result<Option<Vec<ReconstructedFeatureGeometry<'f>>>, FeatureReconstructionError> {
        let (plate_id, valid) = self.time_model.effective_plate_and_validity(feature, time)?;
        if !valid {
            return Ok(None);
        }

        let present: Vec<_> = feature.geometries().collect();
        if present.is_empty() {
            return Ok(Some(Vec::new()));
        }

        let rotation = self.model.rotation(plate_id, time, anchor)?;
        present
            .into_iter()
            .map(|(property, present_day)| {
                apply_rotation(&rotation, present_day).map(|reconstructed| ReconstructedFeatureGeometry {
                    feature,
                    property,
                    present_day,
                    rotation,
                    plate_id,
                    reconstructed,
                })
            })
            .collect::<Result<Vec<_>, GeometryError>>()
            .map(Some)
            .map_err(FeatureReconstructionError::from)
    }

    /// Reconstructs `features` at `time` relative to `anchor`.
    ///
    /// Per-feature failures are recorded in the report; only an invalid time
    /// fails the whole call.
    pub fn reconstruct<'f>(
        &self,
        features: &'f [Feature],
        time: f64,
        anchor: PlateId,
    ) -> Result<ReconstructionReport<'f>, ReconstructError> {
        if !time.is_finite() || time < 0.0 {
            return Err(ReconstructError::NegativeTime(time));
        }

        let run = |feature: &'f Feature| (feature, self.reconstruct_feature(feature, time, anchor));
        // Indexed collect keeps input order regardless of completion order.
        let results: Vec<_> = if self.parallel {
            features.par_iter().map(run).collect()
        } else {
            features.iter().map(run).collect()
        };

        let mut geometries = Vec::new();
        let mut outcomes = Vec::with_capacity(results.len());
        for (feature, result) in results {
            let status = match result {
                Ok(Some(reconstructed)) => {
                    let count = reconstructed.len();
                    geometries.extend(reconstructed);
                    FeatureStatus::Reconstructed { geometries: count }
                }
                Ok(None) => FeatureStatus::NotValidAtTime,
                Err(e) => {
                    warn!("Feature {} not reconstructed: {}", feature.id(), e);
                    FeatureStatus::Failed(e)
                }
            };
            outcomes.push(FeatureOutcome { feature, status });
        }

        let report = ReconstructionReport {
            time,
            anchor,
            geometries,
            outcomes,
        };
        let summary = report.summary();
        info!(
            "Reconstructed {} of {} features at {} Ma (anchor {}): {} geometries, {} not valid, {} failed",
            summary.reconstructed,
            summary.features,
            time,
            anchor,
            summary.geometries,
            summary.not_valid,
            summary.failed()
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feature::TimePeriod;
    use crate::geometry::{PointOnSphere, PolygonOnSphere, PolylineOnSphere};
    use crate::rotation::{RotationConfig, RotationSample, RotationStore};

    const P000: PlateId = PlateId(0);
    const P801: PlateId = PlateId(801);

    fn model() -> RotationModel {
        let store = RotationStore::from_samples(vec![
            RotationSample::from_pole(P801, 0.0, 90.0, 0.0, 0.0, P000),
            RotationSample::from_pole(P801, 10.0, 90.0, 0.0, 20.0, P000),
        ])
        .unwrap();
        RotationModel::build(store, RotationConfig::default()).unwrap()
    }

    fn point_feature(id: &str, plate: Option<PlateId>, lat: f64, lon: f64) -> Feature {
        let feature = Feature::new(FeatureId::new(id).unwrap(), QualifiedName::gpml("Coastline"))
            .with_geometry("position", PointOnSphere::from_lat_lon(lat, lon).unwrap());
        match plate {
            Some(p) => feature.with_plate_id(p),
            None => feature,
        }
    }

    #[test]
    fn test_reconstruct_point_at_midpoint() {
        let model = model();
        let reconstructor = Reconstructor::new(&model, &ReconstructConfig::default());
        let feature = point_feature("a", Some(P801), 0.0, 0.0);

        let result = reconstructor.reconstruct_feature(&feature, 5.0, P000).unwrap().unwrap();
        assert_eq!(result.len(), 1);
        let ll = result[0].reconstructed.points()[0].to_lat_lon();
        assert!(ll.lat.abs() < 1e-9);
        assert!((ll.lon - 10.0).abs() < 1e-9);
        assert_eq!(result[0].plate_id, P801);
        assert_eq!(result[0].property.as_str(), "gpml:position");
    }

    #[test]
    fn test_present_day_is_unchanged() {
        let model = model();
        let reconstructor = Reconstructor::new(&model, &ReconstructConfig::default());
        let feature = point_feature("a", Some(P801), 12.0, 34.0);

        let result = reconstructor.reconstruct_feature(&feature, 0.0, P000).unwrap().unwrap();
        assert_eq!(&result[0].reconstructed, result[0].present_day);
    }

    #[test]
    fn test_invalid_window_yields_no_geometry_and_no_error() {
        let model = model();
        let reconstructor = Reconstructor::new(&model, &ReconstructConfig::default());
        let feature = point_feature("young", Some(P801), 0.0, 0.0).with_valid_time(TimePeriod::new(3.0, 0.0));

        assert_eq!(reconstructor.reconstruct_feature(&feature, 5.0, P000).unwrap(), None);

        let features = vec![feature];
        let report = reconstructor.reconstruct(&features, 5.0, P000).unwrap();
        assert!(report.geometries().is_empty());
        assert_eq!(report.outcomes()[0].status, FeatureStatus::NotValidAtTime);
        assert_eq!(report.failures().count(), 0);
    }

    #[test]
    fn test_partial_failure_keeps_order() {
        let model = model();
        let features = vec![
            point_feature("a", Some(P801), 0.0, 0.0),
            point_feature("missing", Some(PlateId(999)), 0.0, 0.0),
            point_feature("default", None, 10.0, 10.0),
            point_feature("b", Some(P801), 0.0, 30.0),
        ];

        for parallel in [true, false] {
            let config = ReconstructConfig {
                parallel,
                ..Default::default()
            };
            let report = Reconstructor::new(&model, &config)
                .reconstruct(&features, 5.0, P000)
                .unwrap();

            let ids: Vec<&str> = report.geometries().iter().map(|g| g.feature.id().as_str()).collect();
            assert_eq!(ids, vec!["a", "default", "b"]);

            let failures: Vec<_> = report.failures().collect();
            assert_eq!(failures.len(), 1);
            assert_eq!(failures[0].0.id().as_str(), "missing");
            assert_eq!(
                failures[0].1,
                &FeatureReconstructionError::Rotation(RotationError::MissingRotationSequence { plate: PlateId(999) })
            );

            let summary = report.summary();
            assert_eq!(summary.features, 4);
            assert_eq!(summary.reconstructed, 3);
            assert_eq!(summary.failed(), 1);
            assert_eq!(summary.geometries, 3);
        }
    }

    #[test]
    fn test_missing_plate_id_rejected_by_strict_config() {
        let model = model();
        let features = vec![point_feature("no-plate", None, 0.0, 0.0)];
        let report = Reconstructor::new(&model, &ReconstructConfig::strict())
            .reconstruct(&features, 5.0, P000)
            .unwrap();
        assert!(matches!(
            report.outcomes()[0].status,
            FeatureStatus::Failed(FeatureReconstructionError::Feature(_))
        ));
    }

    #[test]
    fn test_degenerate_geometry_fails_feature() {
        let model = model();
        let json = r#"{"polygon": [{"lat": 0.0, "lon": 0.0}, {"lat": 1.0, "lon": 1.0}]}"#;
        let degenerate: GeometryOnSphere = serde_json::from_str(json).unwrap();
        let feature = Feature::new(FeatureId::new("bad").unwrap(), QualifiedName::gpml("Coastline"))
            .with_plate_id(P801)
            .with_geometry("outlineOf", degenerate);

        let err = Reconstructor::new(&model, &ReconstructConfig::default())
            .reconstruct_feature(&feature, 5.0, P000)
            .unwrap_err();
        assert!(matches!(
            err,
            FeatureReconstructionError::Geometry(GeometryError::InvalidGeometryTopology { .. })
        ));
    }

    #[test]
    fn test_all_geometries_share_rotation() {
        let model = model();
        let line = PolylineOnSphere::new(vec![
            PointOnSphere::from_lat_lon(0.0, 0.0).unwrap(),
            PointOnSphere::from_lat_lon(0.0, 5.0).unwrap(),
        ])
        .unwrap();
        let polygon = PolygonOnSphere::new(vec![
            PointOnSphere::from_lat_lon(0.0, 0.0).unwrap(),
            PointOnSphere::from_lat_lon(0.0, 5.0).unwrap(),
            PointOnSphere::from_lat_lon(5.0, 0.0).unwrap(),
        ])
        .unwrap();
        let feature = Feature::new(FeatureId::new("multi").unwrap(), QualifiedName::gpml("Coastline"))
            .with_plate_id(P801)
            .with_geometry("centerLineOf", line)
            .with_geometry("outlineOf", polygon);

        let result = Reconstructor::new(&model, &ReconstructConfig::default())
            .reconstruct_feature(&feature, 10.0, P000)
            .unwrap()
            .unwrap();
        assert_eq!(result.len(), 2);
        assert_eq!(result[0].rotation, result[1].rotation);
        assert_eq!(result[1].reconstructed.points().len(), 3);
    }

    #[test]
    fn test_negative_time_is_fatal() {
        let model = model();
        let features: Vec<Feature> = Vec::new();
        let err = Reconstructor::new(&model, &ReconstructConfig::default())
            .reconstruct(&features, -1.0, P000)
            .unwrap_err();
        assert!(matches!(err, ReconstructError::NegativeTime(t) if t == -1.0));
    }
}
