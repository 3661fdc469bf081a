//! Plate circuits: composing edge rotations along the fixed-plate hierarchy.
//!
//! Each plate's fixed plate is resolved at the query time, so a circuit may
//! take a different route at different times. The rotation of a moving plate
//! relative to an anchor is found by walking both plates towards the root of
//! the hierarchy until their chains meet at a common plate `C`:
//!
//! ```text
//! R(moving -> anchor) = R(anchor -> C)^-1 ∘ R(moving -> C)
//! ```

use std::collections::{HashMap, HashSet};

use tracing::debug;

use super::error::RotationError;
use super::model::{Edge, EdgeRotation, RotationModel};
use crate::geometry::FiniteRotation;
use crate::ids::PlateId;

/// Maximum nesting of re-parenting lookups before a circuit is treated as cyclic.
pub const MAX_REFRAME_DEPTH: usize = 8;

/// One plate on a chain, with the accumulated rotation from the chain start.
#[derive(Debug, Clone, Copy)]
struct Link {
    plate: PlateId,
    from_start: FiniteRotation,
}

/// Resolver for rotations between arbitrary plates of a [`RotationModel`].
#[derive(Debug, Clone, Copy)]
pub struct PlateCircuit<'m> {
    model: &'m RotationModel,
    depth: usize,
}

impl<'m> PlateCircuit<'m> {
    pub fn new(model: &'m RotationModel) -> Self {
        Self { model, depth: 0 }
    }

    /// Rotation of `moving` relative to `anchor` at `time`.
    ///
    /// # Errors
    /// - `MissingRotationSequence` if a plate on either chain is unknown.
    /// - `DisconnectedPlateCircuit` if the chains never meet.
    /// - `CyclicPlateCircuit` if a chain revisits a plate.
    /// - `TimeOutOfRange` from any edge lookup under the fail policy.
    pub fn composed_rotation(
        &self,
        moving: PlateId,
        time: f64,
        anchor: PlateId,
    ) -> Result<FiniteRotation, RotationError> {
        if moving == anchor {
            return Ok(FiniteRotation::IDENTITY);
        }

        let moving_chain = self.chain(moving, time, |plate| plate == anchor)?;
        if let Some(link) = moving_chain.iter().find(|l| l.plate == anchor) {
            return Ok(link.from_start);
        }

        let on_moving_chain: HashMap<PlateId, FiniteRotation> =
            moving_chain.iter().map(|l| (l.plate, l.from_start)).collect();
        let anchor_chain = self.chain(anchor, time, |plate| on_moving_chain.contains_key(&plate))?;

        let Some(common) = anchor_chain
            .iter()
            .find(|l| on_moving_chain.contains_key(&l.plate))
        else {
            return Err(RotationError::DisconnectedPlateCircuit { moving, anchor, time });
        };

        debug!(
            "Plate circuit {} -> {} at {} Ma meets at plate {}",
            moving, anchor, time, common.plate
        );
        let moving_to_common = on_moving_chain[&common.plate];
        Ok(compose(&common.from_start.inverse(), &moving_to_common))
    }

    /// Rotation of `plate` relative to its fixed plate at `time`, with
    /// re-parented intervals resolved. `None` for root plates.
    pub fn edge(&self, plate: PlateId, time: f64) -> Result<Option<EdgeRotation>, RotationError> {
        match self.model.lookup_edge(plate, time)? {
            Edge::Root => Ok(None),
            Edge::Direct(edge) => Ok(Some(edge)),
            Edge::Reparented { near, far, weight } => {
                let nested = self.nested(plate, time)?;
                let fixed = near.fixed_plate;
                // Express the far sample relative to the near sample's fixed
                // plate, using the hierarchy at the far sample's own time.
                let bridge = nested.composed_rotation(far.fixed_plate, far.time, fixed)?;
                let far_rotation = compose(&bridge, &far.rotation);
                debug!(
                    "Plate {} re-parented between {} and {} Ma; using fixed plate {}",
                    plate,
                    near.time.min(far.time),
                    near.time.max(far.time),
                    fixed
                );
                Ok(Some(EdgeRotation {
                    moving_plate: plate,
                    fixed_plate: fixed,
                    rotation: near.rotation.slerp(&far_rotation, weight),
                }))
            }
        }
    }

    /// Plates visited walking from `moving` to the root of its hierarchy at `time`.
    pub fn path(&self, moving: PlateId, time: f64) -> Result<Vec<PlateId>, RotationError> {
        Ok(self
            .chain(moving, time, |_| false)?
            .into_iter()
            .map(|l| l.plate)
            .collect())
    }

    /// Walks fixed-plate edges from `start` until a root plate or until `stop`
    /// accepts a plate.
    fn chain(
        &self,
        start: PlateId,
        time: f64,
        stop: impl Fn(PlateId) -> bool,
    ) -> Result<Vec<Link>, RotationError> {
        let mut links = vec![Link {
            plate: start,
            from_start: FiniteRotation::IDENTITY,
        }];
        let mut visited = HashSet::from([start]);
        let mut current = links[0];

        while !stop(current.plate) {
            let Some(edge) = self.edge(current.plate, time)? else {
                break;
            };
            if !visited.insert(edge.fixed_plate) {
                return Err(RotationError::CyclicPlateCircuit {
                    plate: edge.fixed_plate,
                    time,
                });
            }
            current = Link {
                plate: edge.fixed_plate,
                from_start: compose(&edge.rotation, &current.from_start),
            };
            links.push(current);
        }

        debug!("Walked {} edges from plate {} at {} Ma", links.len() - 1, start, time);
        Ok(links)
    }

    fn nested(&self, plate: PlateId, time: f64) -> Result<Self, RotationError> {
        if self.depth >= MAX_REFRAME_DEPTH {
            return Err(RotationError::CyclicPlateCircuit { plate, time });
        }
        Ok(Self {
            model: self.model,
            depth: self.depth + 1,
        })
    }
}

/// `after ∘ first`, passing the other operand through untouched when one side
/// is the exact identity so stored samples are returned bit-for-bit.
fn compose(after: &FiniteRotation, first: &FiniteRotation) -> FiniteRotation {
    if *first == FiniteRotation::IDENTITY {
        *after
    } else if *after == FiniteRotation::IDENTITY {
        *first
    } else {
        after.compose(first)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rotation::{RotationConfig, RotationSample, RotationStore};
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    const P000: PlateId = PlateId(0);
    const P801: PlateId = PlateId(801);
    const P802: PlateId = PlateId(802);
    const EPS: f64 = 1e-12;

    fn model(samples: Vec<RotationSample>) -> RotationModel {
        RotationModel::build(RotationStore::from_samples(samples).unwrap(), RotationConfig::default()).unwrap()
    }

    fn random_pole(rng: &mut ChaCha8Rng) -> (f64, f64, f64) {
        (
            rng.random::<f64>() * 180.0 - 90.0,
            rng.random::<f64>() * 360.0 - 180.0,
            rng.random::<f64>() * 60.0 - 30.0,
        )
    }

    /// 801 -> 802 -> 000, plus 803 -> 000 and 804 -> 803, all sampled at 0 and 50 Ma.
    fn hierarchy(rng: &mut ChaCha8Rng) -> RotationModel {
        let mut samples = Vec::new();
        for (moving, fixed) in [(801, 802), (802, 0), (803, 0), (804, 803)] {
            samples.push(RotationSample::from_pole(PlateId(moving), 0.0, 0.0, 0.0, 0.0, PlateId(fixed)));
            let (lat, lon, angle) = random_pole(rng);
            samples.push(RotationSample::from_pole(PlateId(moving), 50.0, lat, lon, angle, PlateId(fixed)));
        }
        model(samples)
    }

    #[test]
    fn test_composed_rotation_applies_moving_edge_first() {
        let r1 = FiniteRotation::from_pole_and_angle(10.0, 20.0, 15.0);
        let r2 = FiniteRotation::from_pole_and_angle(-35.0, 140.0, 25.0);
        let model = model(vec![
            RotationSample::new(P801, 10.0, r1, P802),
            RotationSample::new(P802, 10.0, r2, P000),
        ]);

        let composed = PlateCircuit::new(&model).composed_rotation(P801, 10.0, P000).unwrap();
        assert!(composed.approx_eq(&r2.compose(&r1), EPS));
        assert_eq!(PlateCircuit::new(&model).path(P801, 10.0).unwrap(), vec![P801, P802, P000]);
    }

    #[test]
    fn test_plate_relative_to_itself_is_identity() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let model = hierarchy(&mut rng);
        let circuit = PlateCircuit::new(&model);
        for plate in [P000, P801, P802, PlateId(803), PlateId(804)] {
            assert_eq!(circuit.composed_rotation(plate, 25.0, plate).unwrap(), FiniteRotation::IDENTITY);
        }
    }

    #[test]
    fn test_reverse_circuit_is_inverse() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let model = hierarchy(&mut rng);
        let circuit = PlateCircuit::new(&model);
        let plates = [P000, P801, P802, PlateId(803), PlateId(804)];

        for &a in &plates {
            for &b in &plates {
                let forward = circuit.composed_rotation(a, 33.0, b).unwrap();
                let backward = circuit.composed_rotation(b, 33.0, a).unwrap();
                assert!(forward.compose(&backward).is_identity(1e-10), "{} <-> {}", a, b);
            }
        }
    }

    #[test]
    fn test_anchor_substitutability() {
        let mut rng = ChaCha8Rng::seed_from_u64(17);
        for _ in 0..10 {
            let model = hierarchy(&mut rng);
            let circuit = PlateCircuit::new(&model);
            let time = rng.random::<f64>() * 50.0;
            let (p, a, b) = (P801, PlateId(804), P802);

            let direct = circuit.composed_rotation(p, time, b).unwrap();
            let via_a = circuit
                .composed_rotation(b, time, a)
                .unwrap()
                .inverse()
                .compose(&circuit.composed_rotation(p, time, a).unwrap());
            assert!(direct.approx_eq(&via_a, 1e-10));
        }
    }

    #[test]
    fn test_non_ancestor_anchor_meets_at_common_plate() {
        let r801 = FiniteRotation::from_pole_and_angle(30.0, 60.0, 12.0);
        let r802 = FiniteRotation::from_pole_and_angle(-10.0, -45.0, 7.0);
        let model = model(vec![
            RotationSample::new(P801, 20.0, r801, P000),
            RotationSample::new(P802, 20.0, r802, P000),
        ]);

        let r = PlateCircuit::new(&model).composed_rotation(P801, 20.0, P802).unwrap();
        assert!(r.approx_eq(&r802.inverse().compose(&r801), EPS));
    }

    #[test]
    fn test_anchor_above_moving_plate_stops_early() {
        let r1 = FiniteRotation::from_pole_and_angle(10.0, 20.0, 15.0);
        let model = model(vec![
            RotationSample::new(P801, 10.0, r1, P802),
            RotationSample::from_pole(P802, 10.0, 0.0, 0.0, 5.0, P000),
        ]);
        assert_eq!(PlateCircuit::new(&model).composed_rotation(P801, 10.0, P802).unwrap(), r1);
    }

    #[test]
    fn test_disconnected_circuit() {
        let model = model(vec![
            RotationSample::from_pole(P801, 0.0, 0.0, 0.0, 1.0, P000),
            RotationSample::from_pole(PlateId(901), 0.0, 0.0, 0.0, 1.0, PlateId(900)),
        ]);
        let err = PlateCircuit::new(&model)
            .composed_rotation(P801, 0.0, PlateId(901))
            .unwrap_err();
        assert_eq!(
            err,
            RotationError::DisconnectedPlateCircuit {
                moving: P801,
                anchor: PlateId(901),
                time: 0.0
            }
        );
    }

    #[test]
    fn test_unknown_plate_is_missing_sequence() {
        let model = model(vec![RotationSample::from_pole(P801, 0.0, 0.0, 0.0, 1.0, P000)]);
        let circuit = PlateCircuit::new(&model);
        assert_eq!(
            circuit.composed_rotation(PlateId(123), 0.0, P000).unwrap_err(),
            RotationError::MissingRotationSequence { plate: PlateId(123) }
        );
        assert_eq!(
            circuit.composed_rotation(P801, 0.0, PlateId(123)).unwrap_err(),
            RotationError::MissingRotationSequence { plate: PlateId(123) }
        );
    }

    #[test]
    fn test_cycle_detected_during_walk() {
        let store = RotationStore::from_samples(vec![
            RotationSample::from_pole(P801, 0.0, 0.0, 0.0, 1.0, P802),
            RotationSample::from_pole(P802, 0.0, 0.0, 0.0, 1.0, P801),
        ])
        .unwrap();
        let config = RotationConfig {
            validate_hierarchy: false,
            ..Default::default()
        };
        let model = RotationModel::build(store, config).unwrap();

        let err = PlateCircuit::new(&model).composed_rotation(P801, 0.0, P000).unwrap_err();
        assert!(matches!(err, RotationError::CyclicPlateCircuit { plate, .. } if plate == P801));
    }

    #[test]
    fn test_out_of_range_edge_fails_circuit() {
        let model = model(vec![
            RotationSample::from_pole(P801, 0.0, 0.0, 0.0, 0.0, P802),
            RotationSample::from_pole(P801, 40.0, 0.0, 0.0, 10.0, P802),
            RotationSample::from_pole(P802, 0.0, 0.0, 0.0, 0.0, P000),
            RotationSample::from_pole(P802, 10.0, 90.0, 0.0, 20.0, P000),
        ]);
        let err = PlateCircuit::new(&model).composed_rotation(P801, 15.0, P000).unwrap_err();
        assert!(matches!(err, RotationError::TimeOutOfRange { plate, .. } if plate == P802));
    }

    fn reparented_model() -> (RotationModel, [FiniteRotation; 3]) {
        let r_a = FiniteRotation::from_pole_and_angle(20.0, 30.0, 8.0);
        let r_b = FiniteRotation::from_pole_and_angle(-15.0, 110.0, 14.0);
        let r_c = FiniteRotation::from_pole_and_angle(60.0, -20.0, 11.0);
        let model = model(vec![
            RotationSample::new(P801, 0.0, FiniteRotation::IDENTITY, P802),
            RotationSample::new(P801, 10.0, r_a, P802),
            RotationSample::new(P801, 20.0, r_b, P000),
            RotationSample::new(P802, 0.0, FiniteRotation::IDENTITY, P000),
            RotationSample::new(P802, 20.0, r_c, P000),
        ]);
        (model, [r_a, r_b, r_c])
    }

    #[test]
    fn test_reparented_interval_uses_nearer_fixed_plate() {
        let (model, [r_a, r_b, r_c]) = reparented_model();
        let circuit = PlateCircuit::new(&model);

        // Nearer the 10 Ma sample: fixed to 802, far sample re-expressed via 802 at 20 Ma.
        let edge = circuit.edge(P801, 12.0).unwrap().unwrap();
        assert_eq!(edge.fixed_plate, P802);
        let expected = r_a.slerp(&r_c.inverse().compose(&r_b), 0.2);
        assert!(edge.rotation.approx_eq(&expected, EPS));

        // Nearer the 20 Ma sample: fixed to 000, far sample re-expressed via 802 at 10 Ma.
        let edge = circuit.edge(P801, 18.0).unwrap().unwrap();
        assert_eq!(edge.fixed_plate, P000);
        let r802_at_10 = FiniteRotation::IDENTITY.slerp(&r_c, 0.5);
        let expected = r_b.slerp(&r802_at_10.compose(&r_a), 0.2);
        assert!(edge.rotation.approx_eq(&expected, EPS));

        // Midpoint tie goes to the younger sample.
        assert_eq!(circuit.edge(P801, 15.0).unwrap().unwrap().fixed_plate, P802);
    }
}
