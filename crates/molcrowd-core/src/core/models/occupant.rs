use crate::core::lattice::LatticeRef;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity tag of a body holding a lattice cell.
///
/// The arena treats `kind` as an opaque label and only ever compares it for
/// equality; by convention callers use positive kinds for subjects (fixed
/// bodies whose placement persists across a run) and negative kinds for
/// crowders (bulk bodies re-proposed by the Monte Carlo driver). `id`
/// distinguishes instances of the same kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Occupant {
    pub kind: i32,
    pub id: u32,
}

impl Occupant {
    pub fn new(kind: i32, id: u32) -> Self {
        Self { kind, id }
    }
}

impl fmt::Display for Occupant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "kind {} id {}", self.kind, self.id)
    }
}

/// Destination addressing for [`PackedSphereArena::move_occupant`].
///
/// `Vacant(v)` selects the `v`-th currently vacant cell, letting the caller
/// supply the randomness while the arena supplies the enumeration; `Explicit`
/// names the destination cell directly.
///
/// [`PackedSphereArena::move_occupant`]: crate::engine::arena::PackedSphereArena::move_occupant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveTarget {
    Vacant(usize),
    Explicit(LatticeRef),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn occupant_equality_is_structural() {
        assert_eq!(Occupant::new(1, 0), Occupant::new(1, 0));
        assert_ne!(Occupant::new(1, 0), Occupant::new(1, 1));
        assert_ne!(Occupant::new(-1, 0), Occupant::new(1, 0));
    }

    #[test]
    fn occupant_display_names_both_fields() {
        assert_eq!(Occupant::new(-2, 7).to_string(), "kind -2 id 7");
    }
}
