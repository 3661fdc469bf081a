//! Reconstruction over a range of times.

use std::path::PathBuf;

use tracing::{debug, info};

use super::cancel::CancellationToken;
use super::utility::{Utility, UtilityError, UtilityOutcome, UtilityParams};
use crate::export::export;
use crate::reconstruct::ReconstructionContext;

/// Upper bound on the number of frames one sweep may visit.
pub const MAX_SWEEP_FRAMES: usize = 100_000;

/// One reconstructed time step of a sweep.
#[derive(Debug, Clone, PartialEq)]
pub struct SweepFrame {
    pub time: f64,
    pub geometries: usize,
    pub failed: usize,
    /// File written for this frame, if an output directory was given.
    pub output: Option<PathBuf>,
}

/// Reconstructs all loaded features at evenly spaced times.
///
/// Parameters (Ma): `start` (default 0), `end` (default 100), `step`
/// (default 10). The sweep runs from `start` towards `end` and always
/// includes `end`. The cancellation token is checked before each frame, and
/// the rotation cache is cleared after each one.
#[derive(Debug, Clone, Copy, Default)]
pub struct TimeSweep;

impl TimeSweep {
    /// The times a sweep visits for `params`.
    pub fn frame_times(&self, params: &UtilityParams) -> Result<Vec<f64>, UtilityError> {
        let start = params.get_param("start", 0.0);
        let end = params.get_param("end", 100.0);
        let step = params.get_param("step", 10.0);

        for (name, value) in [("start", start), ("end", end)] {
            if !value.is_finite() || value < 0.0 {
                return Err(UtilityError::InvalidParameter {
                    name: name.to_string(),
                    reason: format!("must be finite and >= 0, got {}", value),
                });
            }
        }
        if !step.is_finite() || step <= 0.0 {
            return Err(UtilityError::InvalidParameter {
                name: "step".to_string(),
                reason: format!("must be finite and > 0, got {}", step),
            });
        }

        let direction = if end >= start { 1.0 } else { -1.0 };
        let span = (end - start).abs();
        let whole_steps = (span / step + 1e-9).floor();
        if !whole_steps.is_finite() || whole_steps >= MAX_SWEEP_FRAMES as f64 {
            return Err(UtilityError::InvalidParameter {
                name: "step".to_string(),
                reason: format!(
                    "{} Ma over {} Ma needs more than {} frames",
                    step, span, MAX_SWEEP_FRAMES
                ),
            });
        }
        let whole_steps = whole_steps as usize;
        let mut times: Vec<f64> = (0..=whole_steps)
            .map(|i| start + direction * step * i as f64)
            .collect();
        if times.last().is_some_and(|&t| (t - end).abs() > 1e-9) {
            times.push(end);
        }
        Ok(times)
    }

    /// Runs the sweep, calling `on_frame` after each completed frame.
    pub fn run_with_callback<F>(
        &self,
        context: &ReconstructionContext,
        params: &UtilityParams,
        cancel: &CancellationToken,
        mut on_frame: F,
    ) -> Result<UtilityOutcome, UtilityError>
    where
        F: FnMut(&SweepFrame),
    {
        let times = self.frame_times(params)?;
        if let Some(dir) = &params.output_dir {
            std::fs::create_dir_all(dir)?;
        }

        let mut outcome = UtilityOutcome::default();
        for time in times {
            if cancel.is_cancelled() {
                info!("Sweep cancelled after {} frames", outcome.steps);
                outcome.cancelled = true;
                break;
            }

            let report = context.reconstruct(time, params.anchor)?;
            let output = match &params.output_dir {
                Some(dir) => {
                    let path = dir.join(format!("reconstructed_{:.2}Ma.{}", time, params.format.extension()));
                    export(report.geometries(), params.format, &path)?;
                    Some(path)
                }
                None => None,
            };

            let frame = SweepFrame {
                time,
                geometries: report.geometries().len(),
                failed: report.failures().count(),
                output,
            };
            context.model().clear_cache();
            debug!("Sweep frame at {} Ma: {} geometries", frame.time, frame.geometries);
            on_frame(&frame);
            outcome.steps += 1;
        }
        Ok(outcome)
    }
}

impl Utility for TimeSweep {
    fn name(&self) -> &str {
        "sweep"
    }

    fn description(&self) -> &str {
        "Reconstruct all features at evenly spaced times"
    }

    fn run(
        &self,
        context: &ReconstructionContext,
        params: &UtilityParams,
        cancel: &CancellationToken,
    ) -> Result<UtilityOutcome, UtilityError> {
        self.run_with_callback(context, params, cancel, |_| {})
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::ExportFormat;
    use crate::feature::{Feature, FeatureCollection};
    use crate::geometry::PointOnSphere;
    use crate::ids::{FeatureId, PlateId, QualifiedName};
    use crate::reconstruct::ReconstructConfig;
    use crate::rotation::{RotationSample, RotationStore};
    use tempfile::tempdir;

    fn context() -> ReconstructionContext {
        let store = RotationStore::from_samples(vec![
            RotationSample::from_pole(PlateId(801), 0.0, 90.0, 0.0, 0.0, PlateId(0)),
            RotationSample::from_pole(PlateId(801), 100.0, 90.0, 0.0, 50.0, PlateId(0)),
        ])
        .unwrap();
        let features: FeatureCollection = vec![Feature::new(
            FeatureId::new("f").unwrap(),
            QualifiedName::gpml("Coastline"),
        )
        .with_plate_id(PlateId(801))
        .with_geometry("position", PointOnSphere::from_lat_lon(0.0, 0.0).unwrap())]
        .into_iter()
        .collect();
        ReconstructionContext::new(store, features, ReconstructConfig::default()).unwrap()
    }

    fn params(start: f64, end: f64, step: f64) -> UtilityParams {
        let mut params = UtilityParams::default();
        params.set_param("start", start).set_param("end", end).set_param("step", step);
        params
    }

    #[test]
    fn test_frame_times() {
        let sweep = TimeSweep;
        assert_eq!(sweep.frame_times(&params(0.0, 30.0, 10.0)).unwrap(), vec![0.0, 10.0, 20.0, 30.0]);
        assert_eq!(sweep.frame_times(&params(0.0, 25.0, 10.0)).unwrap(), vec![0.0, 10.0, 20.0, 25.0]);
        assert_eq!(sweep.frame_times(&params(20.0, 0.0, 10.0)).unwrap(), vec![20.0, 10.0, 0.0]);
        assert_eq!(sweep.frame_times(&params(5.0, 5.0, 1.0)).unwrap(), vec![5.0]);
        assert!(sweep.frame_times(&params(0.0, 10.0, 0.0)).is_err());
        assert!(sweep.frame_times(&params(-1.0, 10.0, 1.0)).is_err());
    }

    #[test]
    fn test_frame_count_is_bounded() {
        let sweep = TimeSweep;
        for step in [1e-300, 1e-6] {
            match sweep.frame_times(&params(0.0, 100.0, step)) {
                Err(UtilityError::InvalidParameter { name, .. }) => assert_eq!(name, "step"),
                other => panic!("expected invalid step, got {:?}", other),
            }
        }
        let times = sweep.frame_times(&params(0.0, 100.0, 0.01)).unwrap();
        assert_eq!(times.len(), 10_001);
    }

    #[test]
    fn test_sweep_clears_rotation_cache() {
        let ctx = context();
        ctx.reconstruct(5.0, PlateId(0)).unwrap();
        assert_eq!(ctx.model().cached_rotations(), 1);

        let outcome = TimeSweep.run(&ctx, &params(0.0, 100.0, 10.0), &CancellationToken::new()).unwrap();
        assert_eq!(outcome.steps, 11);
        assert_eq!(ctx.model().cached_rotations(), 0);
    }

    #[test]
    fn test_sweep_writes_frames() {
        let dir = tempdir().unwrap();
        let mut p = params(0.0, 100.0, 50.0);
        p.output_dir = Some(dir.path().join("frames"));
        p.format = ExportFormat::Gmt;

        let mut frames = Vec::new();
        let outcome = TimeSweep
            .run_with_callback(&context(), &p, &CancellationToken::new(), |f| frames.push(f.clone()))
            .unwrap();

        assert_eq!(outcome, UtilityOutcome { steps: 3, cancelled: false });
        assert_eq!(frames.iter().map(|f| f.time).collect::<Vec<_>>(), vec![0.0, 50.0, 100.0]);
        for frame in &frames {
            assert_eq!(frame.geometries, 1);
            assert!(frame.output.as_ref().unwrap().exists());
        }
        assert!(frames[1].output.as_ref().unwrap().ends_with("reconstructed_50.00Ma.gmt"));
    }

    #[test]
    fn test_cancel_stops_before_next_frame() {
        let token = CancellationToken::new();
        let stopper = token.clone();
        let outcome = TimeSweep
            .run_with_callback(&context(), &params(0.0, 100.0, 10.0), &token, |frame| {
                if frame.time >= 20.0 {
                    stopper.cancel();
                }
            })
            .unwrap();
        assert_eq!(outcome, UtilityOutcome { steps: 3, cancelled: true });
    }

    #[test]
    fn test_already_cancelled_runs_nothing() {
        let token = CancellationToken::new();
        token.cancel();
        let outcome = TimeSweep.run(&context(), &params(0.0, 100.0, 10.0), &token).unwrap();
        assert_eq!(outcome.steps, 0);
        assert!(outcome.cancelled);
    }

    #[test]
    fn test_out_of_range_frames_fail_features_not_sweep() {
        let outcome = TimeSweep.run(&context(), &params(90.0, 110.0, 10.0), &CancellationToken::new());
        assert_eq!(outcome.unwrap().steps, 3);
    }
}
