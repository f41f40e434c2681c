use thiserror::Error;

use crate::core::lattice::LatticeRef;
use crate::core::models::occupant::Occupant;

/// Failures of arena mutation operations.
///
/// Collisions and capacity exhaustion are recoverable: the Monte Carlo
/// driver catches them, logs, and retries with a different target or
/// abandons the placement attempt. Out-of-range lookups are not errors; query
/// operations return `Option`/`false` for those.
#[derive(Debug, Error, PartialEq)]
pub enum ArenaError {
    #[error("collision at {at:?}: cell held by {held}, refused {proposed}")]
    Collision {
        at: LatticeRef,
        held: Occupant,
        proposed: Occupant,
    },

    #[error("no room left: vacancy index {index} with only {capacity} vacant cells")]
    NoRoom { index: usize, capacity: usize },

    #[error("no occupant to move at {at:?}")]
    VacantSource { at: LatticeRef },
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("arena operation failed: {source}")]
    Arena {
        #[from]
        source: ArenaError,
    },

    #[error("failed to place subject {id}: {source}")]
    SubjectPlacement {
        id: u32,
        #[source]
        source: ArenaError,
    },

    #[error("no room left for crowders: placed {placed} of {requested}")]
    CrowdOverflow { placed: usize, requested: usize },

    #[error("invalid crowding configuration: {0}")]
    Config(String),
}
