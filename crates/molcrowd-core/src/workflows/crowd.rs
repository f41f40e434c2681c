use nalgebra::{Point3, UnitQuaternion};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument};

use crate::core::lattice::LatticeRef;
use crate::core::models::occupant::Occupant;
use crate::core::utils::geometry::random_rotation;
use crate::engine::arena::PackedSphereArena;
use crate::engine::crowding::{self, Crowder, CrowdingParams, CrowdingStats, EnergyModel};
use crate::engine::error::EngineError;
use crate::engine::progress::{Progress, ProgressReporter};

/// How many instances of a crowder species to place.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Population {
    /// A fixed instance count.
    Count { count: usize },
    /// A fraction of the arena capacity left after subject placement.
    Proportion { proportion: f64 },
}

impl Population {
    pub fn resolve(&self, capacity: usize) -> usize {
        match *self {
            Population::Count { count } => count,
            Population::Proportion { proportion } => (proportion * capacity as f64) as usize,
        }
    }
}

/// One crowder species in a scenario.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CrowderSpec {
    #[serde(flatten)]
    pub population: Population,
    /// Bounding radius of the species, used when deriving the packing radius.
    pub radius: Option<f64>,
}

/// A complete crowding scenario description.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrowdingConfig {
    pub arena_radius: f64,
    pub centre: Point3<f64>,
    /// Packing radius override; when absent it is derived from the largest
    /// crowder radius, falling back to the arena radius.
    pub grain_radius: Option<f64>,
    pub crowders: Vec<CrowderSpec>,
    pub mc: CrowdingParams,
}

impl CrowdingConfig {
    /// The packing radius the arena will be built with.
    pub fn packing_radius(&self) -> f64 {
        let mut a = self.grain_radius.unwrap_or(0.0);
        if a == 0.0 {
            a = self
                .crowders
                .iter()
                .filter_map(|spec| spec.radius)
                .fold(0.0, f64::max);
        }
        if a == 0.0 || a > self.arena_radius {
            a = self.arena_radius;
        }
        a
    }
}

/// A persistent body whose placement survives the whole run.
///
/// Vertices come from the caller's mesh provider; only the surface they trace
/// is marked in the arena.
#[derive(Debug, Clone)]
pub struct Subject {
    pub id: u32,
    pub kind: i32,
    pub vertices: Vec<Point3<f64>>,
}

#[derive(Debug, Clone)]
pub struct CrowdingOutcome {
    pub arena: PackedSphereArena,
    pub crowders: Vec<Crowder>,
    pub stats: CrowdingStats,
}

/// Executes one crowding scenario.
///
/// Builds the arena, inserts every subject surface (a collision here abandons
/// the scenario), fills the remaining capacity with crowders at random
/// vacancies, and runs the Metropolis search. Crowder kinds are `-(1 +
/// species index)`; crowder ids continue after the highest subject id.
#[instrument(skip_all, name = "crowding_workflow")]
pub fn run<E: EnergyModel, R: Rng>(
    config: &CrowdingConfig,
    subjects: &[Subject],
    energy: &mut E,
    rng: &mut R,
    reporter: &ProgressReporter,
) -> Result<CrowdingOutcome, EngineError> {
    if !(config.arena_radius > 0.0) {
        return Err(EngineError::Config(format!(
            "arena radius must be positive, got {}",
            config.arena_radius
        )));
    }

    reporter.report(Progress::PhaseStart {
        name: "Arena construction",
    });
    let a = config.packing_radius();
    let mut arena = PackedSphereArena::new(a, config.arena_radius, config.centre);
    info!(
        packing_radius = a,
        capacity = arena.capacity(),
        "arena initialised"
    );
    reporter.report(Progress::PhaseFinish);

    reporter.report(Progress::PhaseStart {
        name: "Subject placement",
    });
    for subject in subjects {
        debug!(subject = subject.id, kind = subject.kind, "placing subject");
        arena
            .insert_surface(
                subject.vertices.iter().copied(),
                Occupant::new(subject.kind, subject.id),
            )
            .map_err(|source| {
                error!(subject = subject.id, %source, "abandoning scenario");
                EngineError::SubjectPlacement {
                    id: subject.id,
                    source,
                }
            })?;
    }
    reporter.report(Progress::PhaseFinish);

    reporter.report(Progress::PhaseStart {
        name: "Crowder population",
    });
    // The vacant capacity left by the subjects bounds the crowd.
    let climit = arena.capacity();
    let counts: Vec<usize> = config
        .crowders
        .iter()
        .map(|spec| spec.population.resolve(climit))
        .collect();
    let requested: usize = counts.iter().sum();
    info!(capacity = climit, requested, "populating crowders");

    let mut crowders: Vec<Crowder> = Vec::with_capacity(requested);
    let mut next_id = subjects.iter().map(|s| s.id + 1).max().unwrap_or(0);
    for (species, count) in counts.iter().enumerate() {
        let kind = -1 - species as i32;
        for _ in 0..*count {
            let occupant = Occupant::new(kind, next_id);
            let Some((location, cell)) = place_at_random_vacancy(&mut arena, energy, rng, occupant)?
            else {
                error!(placed = crowders.len(), requested, "no more room for crowders");
                return Err(EngineError::CrowdOverflow {
                    placed: crowders.len(),
                    requested,
                });
            };
            let rotation = if config.mc.rotate_crowders {
                random_rotation(rng)
            } else {
                UnitQuaternion::identity()
            };
            energy.apply_move(next_id, location, rotation);
            crowders.push(Crowder {
                id: next_id,
                kind,
                location,
                rotation,
                cell,
            });
            next_id += 1;
        }
    }
    reporter.report(Progress::PhaseFinish);

    let stats = crowding::run(&mut arena, &mut crowders, &config.mc, energy, rng, reporter)?;

    Ok(CrowdingOutcome {
        arena,
        crowders,
        stats,
    })
}

// Draw vacancies until one is not interior to a subject; claimed vacancies
// are marked with the claiming identity and the draw repeated against the
// refreshed capacity. `None` means the arena is full.
fn place_at_random_vacancy<E: EnergyModel, R: Rng>(
    arena: &mut PackedSphereArena,
    energy: &mut E,
    rng: &mut R,
    occupant: Occupant,
) -> Result<Option<(Point3<f64>, LatticeRef)>, EngineError> {
    let mut vc = arena.capacity();
    while vc > 0 {
        let v = rng.gen_range(0..vc);
        let Some(target) = arena.vacancy(v) else { break };
        let center = arena.location_of(target);
        if let Some(claim) = energy.interior_occupant(&center) {
            debug!(at = ?target, claim = %claim, "vacancy claimed as subject interior");
            arena.occupy(target, claim)?;
            vc = arena.capacity();
            continue;
        }
        let location = arena.occupy(target, occupant)?;
        return Ok(Some((location, target)));
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::crowding::NullEnergy;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn base_config() -> CrowdingConfig {
        CrowdingConfig {
            arena_radius: 6.0,
            centre: Point3::origin(),
            grain_radius: Some(1.0),
            crowders: vec![CrowderSpec {
                population: Population::Count { count: 5 },
                radius: Some(1.0),
            }],
            mc: CrowdingParams {
                iterations: Some(20),
                warmup: Some(0),
                ..CrowdingParams::default()
            },
        }
    }

    fn subject_at_origin() -> Subject {
        Subject {
            id: 0,
            kind: 1,
            vertices: vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(0.5, 0.0, 0.0),
                Point3::new(0.0, 2.0, 0.1),
            ],
        }
    }

    #[test]
    fn scenario_places_subjects_and_crowders_then_searches() {
        let config = base_config();
        let subjects = [subject_at_origin()];
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let reporter = ProgressReporter::new();

        let outcome = run(&config, &subjects, &mut NullEnergy, &mut rng, &reporter).unwrap();

        assert_eq!(outcome.crowders.len(), 5);
        assert!(outcome.crowders.iter().all(|c| c.kind == -1));
        assert_eq!(
            outcome.crowders.iter().map(|c| c.id).collect::<Vec<_>>(),
            vec![1, 2, 3, 4, 5]
        );
        // subject surface still marked after the search
        assert!(outcome.arena.is_occupied(&Point3::origin()));
        assert_eq!(
            outcome.stats.accepted + outcome.stats.rejected,
            20
        );
        // every crowder's bookkeeping points at a cell its identity holds
        let mut arena = outcome.arena.clone();
        for crowder in &outcome.crowders {
            arena
                .occupy(crowder.cell, Occupant::new(crowder.kind, crowder.id))
                .unwrap();
        }
    }

    #[test]
    fn colliding_subjects_abandon_the_scenario() {
        let config = base_config();
        let mut second = subject_at_origin();
        second.id = 1;
        let subjects = [subject_at_origin(), second];
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let reporter = ProgressReporter::new();

        let err = run(&config, &subjects, &mut NullEnergy, &mut rng, &reporter).unwrap_err();
        assert!(matches!(err, EngineError::SubjectPlacement { id: 1, .. }));
    }

    #[test]
    fn proportions_resolve_against_post_subject_capacity() {
        let mut config = base_config();
        config.crowders = vec![CrowderSpec {
            population: Population::Proportion { proportion: 0.25 },
            radius: None,
        }];
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        let reporter = ProgressReporter::new();

        let probe = PackedSphereArena::new(1.0, 6.0, Point3::origin());
        let expected = probe.capacity() / 4;

        let outcome = run(&config, &[], &mut NullEnergy, &mut rng, &reporter).unwrap();
        assert_eq!(outcome.crowders.len(), expected);
    }

    #[test]
    fn packing_radius_derivation_follows_the_fallback_chain() {
        let mut config = base_config();
        config.grain_radius = Some(2.0);
        assert_eq!(config.packing_radius(), 2.0);

        config.grain_radius = None;
        config.crowders[0].radius = Some(1.5);
        assert_eq!(config.packing_radius(), 1.5);

        config.crowders[0].radius = None;
        assert_eq!(config.packing_radius(), config.arena_radius);

        // oversized grains collapse to the arena radius
        config.grain_radius = Some(50.0);
        assert_eq!(config.packing_radius(), config.arena_radius);
    }

    #[test]
    fn an_overfull_request_is_reported_not_looped() {
        let mut config = base_config();
        config.arena_radius = 2.0;
        config.crowders = vec![CrowderSpec {
            population: Population::Count { count: 100_000 },
            radius: None,
        }];
        let mut rng = ChaCha8Rng::seed_from_u64(6);
        let reporter = ProgressReporter::new();

        let err = run(&config, &[], &mut NullEnergy, &mut rng, &reporter).unwrap_err();
        assert!(matches!(err, EngineError::CrowdOverflow { .. }));
    }

    /// Claims everything near the origin as subject interior.
    struct OriginBlob {
        radius: f64,
    }

    impl EnergyModel for OriginBlob {
        fn apply_move(&mut self, _id: u32, _location: Point3<f64>, _rotation: UnitQuaternion<f64>) {
        }

        fn energy(&mut self) -> f64 {
            0.0
        }

        fn interior_occupant(&self, location: &Point3<f64>) -> Option<Occupant> {
            (location.coords.norm() < self.radius).then_some(Occupant::new(1, 0))
        }
    }

    #[test]
    fn interior_claims_keep_crowders_out_of_subjects() {
        let mut config = base_config();
        config.mc.iterations = Some(80);
        let mut energy = OriginBlob { radius: 3.0 };
        let mut rng = ChaCha8Rng::seed_from_u64(8);
        let reporter = ProgressReporter::new();

        let outcome = run(&config, &[], &mut energy, &mut rng, &reporter).unwrap();

        for crowder in &outcome.crowders {
            assert!(
                crowder.location.coords.norm() >= 3.0,
                "crowder {} ended inside the claimed blob",
                crowder.id
            );
        }
        // claimed cells carry the claiming identity
        assert!(
            outcome
                .arena
                .occupied()
                .any(|(_, _, occupant)| occupant == Occupant::new(1, 0))
        );
    }

    #[test]
    fn a_non_positive_arena_radius_is_rejected() {
        let mut config = base_config();
        config.arena_radius = 0.0;
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let reporter = ProgressReporter::new();
        let err = run(&config, &[], &mut NullEnergy, &mut rng, &reporter).unwrap_err();
        assert!(matches!(err, EngineError::Config(_)));
    }
}
