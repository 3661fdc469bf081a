//! Rotation samples and per-plate rotation sequences.

use super::config::TimeRangePolicy;
use super::error::RotationError;
use crate::geometry::FiniteRotation;
use crate::ids::PlateId;

/// One total reconstruction pole: the rotation of `moving_plate` relative to
/// `fixed_plate` at `time` Ma.
#[derive(Debug, Clone, PartialEq)]
pub struct RotationSample {
    pub moving_plate: PlateId,
    /// Time in millions of years before present.
    pub time: f64,
    pub rotation: FiniteRotation,
    pub fixed_plate: PlateId,
    pub comment: Option<String>,
}

impl RotationSample {
    /// Creates a sample from a rotation.
    pub fn new(moving_plate: PlateId, time: f64, rotation: FiniteRotation, fixed_plate: PlateId) -> Self {
        Self {
            moving_plate,
            time,
            rotation,
            fixed_plate,
            comment: None,
        }
    }

    /// Creates a sample from a pole (lat, lon) and angle, all in degrees.
    pub fn from_pole(
        moving_plate: PlateId,
        time: f64,
        pole_lat: f64,
        pole_lon: f64,
        angle_deg: f64,
        fixed_plate: PlateId,
    ) -> Self {
        Self::new(
            moving_plate,
            time,
            FiniteRotation::from_pole_and_angle(pole_lat, pole_lon, angle_deg),
            fixed_plate,
        )
    }

    /// Attaches a free-text comment.
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }
}

/// Result of looking up a time within a single sequence.
#[derive(Debug, Clone, Copy)]
pub enum SequenceLookup<'a> {
    /// The time coincides with a stored sample.
    Exact(&'a RotationSample),
    /// The time lies outside the sequence and was clamped to an endpoint.
    Clamped(&'a RotationSample),
    /// The time lies strictly between two consecutive samples.
    Between {
        younger: &'a RotationSample,
        older: &'a RotationSample,
        /// `(time - younger.time) / (older.time - younger.time)`, in (0, 1).
        fraction: f64,
    },
}

/// Time-ordered samples for one moving plate.
///
/// Sample times are non-decreasing. A time repeats only at a crossover, where
/// two records with different fixed plates share a time: the first closes the
/// younger segment and the second opens the older one. The fixed plate never
/// names the moving plate itself.
#[derive(Debug, Clone, PartialEq)]
pub struct RotationSequence {
    moving_plate: PlateId,
    samples: Vec<RotationSample>,
}

impl RotationSequence {
    /// Creates an empty sequence.
    pub fn new(moving_plate: PlateId) -> Self {
        Self {
            moving_plate,
            samples: Vec::new(),
        }
    }

    /// Builds a sequence from samples in any order.
    pub fn from_samples(
        moving_plate: PlateId,
        samples: impl IntoIterator<Item = RotationSample>,
    ) -> Result<Self, RotationError> {
        let mut sequence = Self::new(moving_plate);
        for sample in samples {
            sequence.insert(sample)?;
        }
        Ok(sequence)
    }

    /// Returns the moving plate of this sequence.
    pub fn moving_plate(&self) -> PlateId {
        self.moving_plate
    }

    /// Returns the samples ordered by time.
    pub fn samples(&self) -> &[RotationSample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Returns `(youngest, oldest)` sample times.
    pub fn time_span(&self) -> Option<(f64, f64)> {
        match (self.samples.first(), self.samples.last()) {
            (Some(first), Some(last)) => Some((first.time, last.time)),
            _ => None,
        }
    }

    /// True if a sample exists at exactly `time`.
    pub fn has_sample_at(&self, time: f64) -> bool {
        self.samples
            .binary_search_by(|s| s.time.total_cmp(&time))
            .is_ok()
    }

    /// True if inserting `sample` would repeat a record already held: a sample
    /// at the same time with the same fixed plate, or a third record at a
    /// crossover time.
    pub fn is_duplicate(&self, sample: &RotationSample) -> bool {
        let at_time = self.samples_at(sample.time);
        at_time.len() >= 2 || at_time.iter().any(|s| s.fixed_plate == sample.fixed_plate)
    }

    fn samples_at(&self, time: f64) -> &[RotationSample] {
        let start = self.samples.partition_point(|s| s.time < time);
        let end = self.samples.partition_point(|s| s.time <= time);
        &self.samples[start..end]
    }

    /// Inserts a sample, keeping times ordered.
    ///
    /// A second sample at an existing time with a different fixed plate forms a
    /// crossover. It is placed on the side whose neighbouring sample shares its
    /// fixed plate, and after the existing record otherwise.
    ///
    /// # Errors
    /// Fails with `InvalidSample` for a foreign moving plate, a negative or
    /// non-finite time, or a duplicate record (see [`Self::is_duplicate`]), and
    /// with `CyclicPlateCircuit` when the sample is fixed to its own moving
    /// plate.
    pub fn insert(&mut self, sample: RotationSample) -> Result<(), RotationError> {
        let (plate, time) = (sample.moving_plate, sample.time);
        let invalid = move |reason: &str| RotationError::InvalidSample {
            plate,
            time,
            reason: reason.to_string(),
        };

        if sample.moving_plate != self.moving_plate {
            return Err(invalid("sample belongs to another moving plate"));
        }
        if !sample.time.is_finite() || sample.time < 0.0 {
            return Err(invalid("time must be finite and >= 0"));
        }
        if sample.fixed_plate == sample.moving_plate {
            return Err(RotationError::CyclicPlateCircuit {
                plate: sample.moving_plate,
                time: sample.time,
            });
        }

        if self.is_duplicate(&sample) {
            return Err(invalid("a sample already exists at this time"));
        }

        let start = self.samples.partition_point(|s| s.time < sample.time);
        let end = self.samples.partition_point(|s| s.time <= sample.time);
        let idx = if start == end {
            start
        } else {
            let existing = self.samples[start].fixed_plate;
            let younger = start.checked_sub(1).map(|i| self.samples[i].fixed_plate);
            let older = self.samples.get(end).map(|s| s.fixed_plate);
            let closes_younger_segment = younger == Some(sample.fixed_plate)
                || (younger != Some(existing) && older == Some(existing));
            if closes_younger_segment {
                start
            } else {
                end
            }
        };
        self.samples.insert(idx, sample);
        Ok(())
    }

    /// Locates `time` within the sequence.
    ///
    /// At a crossover time the younger segment's record is returned, and each
    /// side of the crossover interpolates within its own segment.
    ///
    /// # Errors
    /// `MissingRotationSequence` for an empty sequence; `TimeOutOfRange` for a
    /// time outside the sequence under [`TimeRangePolicy::Fail`].
    pub fn lookup(&self, time: f64, policy: TimeRangePolicy) -> Result<SequenceLookup<'_>, RotationError> {
        let (Some(first), Some(last)) = (self.samples.first(), self.samples.last()) else {
            return Err(RotationError::MissingRotationSequence {
                plate: self.moving_plate,
            });
        };

        let idx = self.samples.partition_point(|s| s.time < time);
        if let Some(sample) = self.samples.get(idx) {
            if sample.time == time {
                return Ok(SequenceLookup::Exact(sample));
            }
        }

        if idx == 0 || idx == self.samples.len() {
            return match policy {
                TimeRangePolicy::Fail => Err(RotationError::TimeOutOfRange {
                    plate: self.moving_plate,
                    time,
                    youngest: first.time,
                    oldest: last.time,
                }),
                TimeRangePolicy::Clamp => Ok(SequenceLookup::Clamped(if idx == 0 { first } else { last })),
            };
        }

        let younger = &self.samples[idx - 1];
        let older = &self.samples[idx];
        let fraction = (time - younger.time) / (older.time - younger.time);
        Ok(SequenceLookup::Between {
            younger,
            older,
            fraction,
        })
    }

    /// The fixed plate in effect at `time`, or `None` outside the sequence
    /// under [`TimeRangePolicy::Fail`].
    ///
    /// Between two samples naming different fixed plates, the sample nearest
    /// `time` decides; ties go to the younger sample.
    pub fn fixed_plate_at(&self, time: f64, policy: TimeRangePolicy) -> Option<PlateId> {
        match self.lookup(time, policy).ok()? {
            SequenceLookup::Exact(s) | SequenceLookup::Clamped(s) => Some(s.fixed_plate),
            SequenceLookup::Between {
                younger,
                older,
                fraction,
            } => Some(if fraction <= 0.5 {
                younger.fixed_plate
            } else {
                older.fixed_plate
            }),
        }
    }
}
