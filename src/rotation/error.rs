//! Errors raised while resolving rotations.

use thiserror::Error;

use crate::ids::PlateId;

/// Errors that can occur while looking up or composing rotations.
///
/// Values are cheap to clone so that cached failures can be handed to every
/// caller that asks for the same key.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RotationError {
    #[error("No rotation sequence for plate {plate}")]
    MissingRotationSequence { plate: PlateId },
    #[error("Plate circuit from plate {moving} never reaches anchor plate {anchor} at {time} Ma")]
    DisconnectedPlateCircuit {
        moving: PlateId,
        anchor: PlateId,
        time: f64,
    },
    #[error("Cyclic plate circuit: plate {plate} revisited at {time} Ma")]
    CyclicPlateCircuit { plate: PlateId, time: f64 },
    #[error("Time {time} Ma is outside the rotation sequence of plate {plate} ({youngest}-{oldest} Ma)")]
    TimeOutOfRange {
        plate: PlateId,
        time: f64,
        youngest: f64,
        oldest: f64,
    },
    #[error("Invalid reconstruction time {time}: must be finite and >= 0")]
    InvalidTime { time: f64 },
    #[error("Invalid rotation sample for plate {plate} at {time} Ma: {reason}")]
    InvalidSample {
        plate: PlateId,
        time: f64,
        reason: String,
    },
}
