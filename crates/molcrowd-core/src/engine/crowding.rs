use nalgebra::{Point3, UnitQuaternion};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use super::arena::PackedSphereArena;
use super::error::EngineError;
use super::progress::{Progress, ProgressReporter};
use crate::core::lattice::LatticeRef;
use crate::core::models::occupant::{MoveTarget, Occupant};
use crate::core::utils::geometry::random_rotation;

/// Gas constant in kJ K^-1 mol^-1, matching the units the energy evaluator
/// reports in.
pub const GAS_CONSTANT_KJ_MOL_K: f64 = 0.0083144598;

const DEFAULT_TEMPERATURE_K: f64 = 300.0;

/// The external energy evaluator the Monte Carlo search is driven by.
///
/// The arena has no dependency on the evaluator beyond this seam: the driver
/// reports every (proposed or reverted) rigid-body move to it and asks for the
/// system energy afterwards. Implementations typically wrap a boundary-element
/// or grid solver holding the actual molecular models.
pub trait EnergyModel {
    /// Repositions body `id` to `location` with an incremental `rotation`.
    /// Also issued once per crowder at initial placement.
    fn apply_move(&mut self, id: u32, location: Point3<f64>, rotation: UnitQuaternion<f64>);

    /// Energy of the current configuration.
    fn energy(&mut self) -> f64;

    /// Lets the evaluator claim a vacancy whose center falls inside a subject
    /// body. The driver occupies such cells with the returned identity and
    /// redraws, so subject interiors are marked lazily as the search probes
    /// them. The default claims nothing.
    fn interior_occupant(&self, _location: &Point3<f64>) -> Option<Occupant> {
        None
    }
}

/// The evaluator used when no solver is attached: every configuration has
/// zero energy, so every proposal is accepted and the search produces
/// unbiased random crowding configurations.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullEnergy;

impl EnergyModel for NullEnergy {
    fn apply_move(&mut self, _id: u32, _location: Point3<f64>, _rotation: UnitQuaternion<f64>) {}

    fn energy(&mut self) -> f64 {
        0.0
    }
}

/// Tuning of the Metropolis-Hastings search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrowdingParams {
    /// Boltzmann factor denominator `RT` in kJ/mol.
    pub rt: f64,
    /// Iteration budget; defaults to 40 per crowder.
    pub iterations: Option<usize>,
    /// Iterations discarded before the energy trace is recorded; defaults to
    /// 10 per crowder.
    pub warmup: Option<usize>,
    /// Whether to propose a fresh uniform random orientation with each move.
    pub rotate_crowders: bool,
}

impl Default for CrowdingParams {
    fn default() -> Self {
        Self {
            rt: GAS_CONSTANT_KJ_MOL_K * DEFAULT_TEMPERATURE_K,
            iterations: None,
            warmup: None,
            rotate_crowders: true,
        }
    }
}

/// Placement bookkeeping for one crowder instance.
///
/// The driver keeps the last accepted location, orientation, and cell of
/// every crowder so a rejected proposal can be compensated exactly.
#[derive(Debug, Clone, PartialEq)]
pub struct Crowder {
    pub id: u32,
    pub kind: i32,
    pub location: Point3<f64>,
    pub rotation: UnitQuaternion<f64>,
    pub cell: LatticeRef,
}

/// What the search did and where it ended.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrowdingStats {
    pub accepted: usize,
    pub rejected: usize,
    pub final_energy: f64,
    /// Post-warmup energy after each iteration.
    pub energy_trace: Vec<f64>,
}

/// Runs the Metropolis-Hastings crowding search over the arena.
///
/// Each iteration proposes relocating one uniformly chosen crowder to a
/// uniformly chosen vacancy (rotating in place when the arena is full),
/// reports the move to the energy model, and accepts it with probability
/// `min(1, exp((E_old - E_new) / RT))`. A rejected proposal is compensated:
/// the crowder is moved back to its captured cell and the energy model is
/// told to undo the rigid-body move.
#[instrument(skip_all, name = "crowding_search")]
pub fn run<E: EnergyModel, R: Rng>(
    arena: &mut PackedSphereArena,
    crowders: &mut [Crowder],
    params: &CrowdingParams,
    energy: &mut E,
    rng: &mut R,
    reporter: &ProgressReporter,
) -> Result<CrowdingStats, EngineError> {
    let n = crowders.len();
    let iterations = params.iterations.unwrap_or(40 * n);
    let warmup = params.warmup.unwrap_or(10 * n);

    let mut this_energy = energy.energy();
    info!(crowders = n, iterations, warmup, initial_energy = this_energy, "starting MC");

    let mut stats = CrowdingStats {
        accepted: 0,
        rejected: 0,
        final_energy: this_energy,
        energy_trace: Vec::new(),
    };
    if n == 0 {
        return Ok(stats);
    }

    reporter.report(Progress::SweepStart {
        total_steps: iterations as u64,
    });

    for it in 0..iterations {
        let c = rng.gen_range(0..n);

        // Find a vacancy that is not interior to a subject; claimed cells are
        // marked with the claiming identity and the draw repeated. With no
        // room left the proposal degrades to a rotation in place.
        let mut proposal = None;
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
            let moved = arena.move_occupant(crowders[c].cell, MoveTarget::Explicit(target))?;
            proposal = Some(moved);
            break;
        }
        let (location, cell) = proposal.unwrap_or((crowders[c].location, crowders[c].cell));

        let rotation = if params.rotate_crowders {
            random_rotation(rng)
        } else {
            UnitQuaternion::identity()
        };
        debug!(
            iteration = it,
            crowder = crowders[c].id,
            from = ?crowders[c].cell,
            to = ?cell,
            "propose move"
        );
        energy.apply_move(crowders[c].id, location, rotation);

        let next_energy = energy.energy();
        let reject = next_energy >= this_energy
            && ((this_energy - next_energy) / params.rt).exp() <= rng.gen_range(0.0..1.0);
        if reject {
            if cell != crowders[c].cell {
                arena.move_occupant(cell, MoveTarget::Explicit(crowders[c].cell))?;
            }
            energy.apply_move(crowders[c].id, crowders[c].location, rotation.inverse());
            stats.rejected += 1;
            debug!(iteration = it, energy = next_energy, "move rejected");
        } else {
            this_energy = next_energy;
            crowders[c].location = location;
            crowders[c].cell = cell;
            crowders[c].rotation = rotation * crowders[c].rotation;
            stats.accepted += 1;
            debug!(iteration = it, energy = next_energy, "move accepted");
        }

        if it >= warmup {
            stats.energy_trace.push(this_energy);
        }
        reporter.report(Progress::SweepIncrement);
    }

    reporter.report(Progress::SweepFinish);
    stats.final_energy = this_energy;
    info!(
        accepted = stats.accepted,
        rejected = stats.rejected,
        final_energy = stats.final_energy,
        "MC finished"
    );
    Ok(stats)
}
