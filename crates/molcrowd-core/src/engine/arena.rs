use std::collections::BTreeMap;

use nalgebra::Point3;
use tracing::{debug, trace, warn};

use super::error::ArenaError;
use crate::core::lattice::{HcpGeometry, LatticeRef};
use crate::core::models::occupant::{MoveTarget, Occupant};

#[derive(Debug, Clone)]
struct Cell {
    center: Point3<f64>,
    occupant: Option<Occupant>,
}

/// A bounded spatial arena of hexagonally close-packed spheres, each a space
/// in which one rigid body can sit (and rotate freely) without risk of
/// collision.
///
/// Cells are keyed by [`LatticeRef`] in a single ordered map holding the
/// sphere center and the occupant in lockstep. The arena is seeded with every
/// cell inside the requested spherical boundary and grows on demand when an
/// occupant needs a cell beyond it; cells are never removed, only vacated.
///
/// Collision semantics are sphere-based: a body is detected through the cells
/// its surface occupies, so two bodies meeting in the gap space between
/// spheres go undetected. This is an intentional approximation.
#[derive(Debug, Clone)]
pub struct PackedSphereArena {
    geometry: HcpGeometry,
    radius: f64,
    cells: BTreeMap<LatticeRef, Cell>,
    volume: f64,
    per_sphere_volume: f64,
}

impl PackedSphereArena {
    /// Builds an arena of packing radius `a` filling a sphere of radius `size`
    /// around `centre`.
    ///
    /// `size` is clamped to at least `a`. The volume equivalent of one packed
    /// sphere is `4 * sqrt(2) * a^3`, the volume its cell accounts for in a
    /// perfect close packing.
    pub fn new(a: f64, size: f64, centre: Point3<f64>) -> Self {
        let radius = size.max(a);
        let geometry = HcpGeometry::new(a, centre);
        let per_sphere_volume = 4.0 * 2.0f64.sqrt() * a * a * a;

        let mut cells = BTreeMap::new();
        for r in geometry.refs_within(radius) {
            let center = geometry.location_of(r);
            cells.insert(
                r,
                Cell {
                    center,
                    occupant: None,
                },
            );
        }
        let volume = cells.len() as f64 * per_sphere_volume;
        debug!(
            a,
            radius,
            cells = cells.len(),
            "packed sphere arena initialised"
        );

        Self {
            geometry,
            radius,
            cells,
            volume,
            per_sphere_volume,
        }
    }

    /// The packing radius `a`.
    pub fn sphere_radius(&self) -> f64 {
        self.geometry.sphere_radius()
    }

    /// The nominal boundary radius used to seed construction. Occupants may
    /// sit beyond it once the arena has grown.
    pub fn radius(&self) -> f64 {
        self.radius
    }

    pub fn centre(&self) -> Point3<f64> {
        self.geometry.centre()
    }

    /// Total volume equivalent of all realized cells. Never decreases.
    pub fn volume(&self) -> f64 {
        self.volume
    }

    /// Number of realized cells, vacant or not.
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Number of currently vacant cells.
    pub fn capacity(&self) -> usize {
        self.cells
            .values()
            .filter(|cell| cell.occupant.is_none())
            .count()
    }

    /// Vacates every cell. Cells stay realized.
    pub fn clear(&mut self) {
        self.clear_matching(None, None);
    }

    /// Vacates every cell whose occupant matches both filters; a `None` filter
    /// matches any value. Vacant cells are untouched.
    pub fn clear_matching(&mut self, kind: Option<i32>, id: Option<u32>) {
        for cell in self.cells.values_mut() {
            if let Some(occupant) = cell.occupant {
                if kind.is_none_or(|k| occupant.kind == k) && id.is_none_or(|i| occupant.id == i) {
                    cell.occupant = None;
                }
            }
        }
    }

    /// Whether the cell nearest to a 3-D position is occupied.
    ///
    /// Positions resolving to unrealized cells read as vacant. Note that the
    /// occupation region is the sphere: positions in the gap space between
    /// spheres report the occupancy of the nearest sphere regardless.
    pub fn is_occupied(&self, location: &Point3<f64>) -> bool {
        let r = self.geometry.nearest_ref(location);
        self.cells
            .get(&r)
            .is_some_and(|cell| cell.occupant.is_some())
    }

    /// The `v`-th vacant cell, or `None` when `v` is out of range.
    ///
    /// The enumeration follows the cell map's ref order; it is deterministic
    /// but shifts as cells are occupied and vacated, so an index is only
    /// meaningful against the current state.
    pub fn vacancy(&self, v: usize) -> Option<LatticeRef> {
        self.cells
            .iter()
            .filter(|(_, cell)| cell.occupant.is_none())
            .nth(v)
            .map(|(r, _)| *r)
    }

    /// The Cartesian center of a cell, realized or not.
    pub fn location_of(&self, r: LatticeRef) -> Point3<f64> {
        match self.cells.get(&r) {
            Some(cell) => cell.center,
            None => self.geometry.location_of(r),
        }
    }

    /// The nearest cell ref to a 3-D position, realized or not.
    pub fn nearest_ref(&self, location: &Point3<f64>) -> LatticeRef {
        self.geometry.nearest_ref(location)
    }

    /// Marks a cell as held by `occupant`, realizing it first if needed.
    ///
    /// Re-occupying a cell with the identity already holding it succeeds as a
    /// no-op, so several vertices of one body may map to one cell. A cell held
    /// by a different identity refuses the occupation and is left unchanged.
    ///
    /// # Arguments
    ///
    /// * `at` - The cell to occupy; unrealized refs grow the arena.
    /// * `occupant` - The identity taking the cell.
    ///
    /// # Return
    ///
    /// The cell's Cartesian center, or [`ArenaError::Collision`].
    pub fn occupy(&mut self, at: LatticeRef, occupant: Occupant) -> Result<Point3<f64>, ArenaError> {
        self.realize(at);
        let cell = self.cells.get_mut(&at).unwrap();
        match cell.occupant {
            Some(held) if held != occupant => {
                warn!(at = ?at, held = %held, proposed = %occupant, "occupancy collision");
                Err(ArenaError::Collision {
                    at,
                    held,
                    proposed: occupant,
                })
            }
            Some(_) => Ok(cell.center),
            None => {
                debug!(at = ?at, occupant = %occupant, "occupy");
                cell.occupant = Some(occupant);
                Ok(cell.center)
            }
        }
    }

    /// Moves the occupant of `from` to a destination cell.
    ///
    /// The source is vacated before the destination check, so a move onto the
    /// source cell itself never trips the collision check. The move is atomic:
    /// when the destination refuses (collision, or a vacancy index out of
    /// range), the source occupant is restored and the arena is left exactly
    /// as it was.
    ///
    /// # Arguments
    ///
    /// * `from` - The cell currently holding the occupant.
    /// * `target` - Destination addressing, see [`MoveTarget`].
    ///
    /// # Return
    ///
    /// The destination's Cartesian center and ref. Fails with
    /// [`ArenaError::VacantSource`] when `from` holds no occupant,
    /// [`ArenaError::NoRoom`] when a vacancy index is out of range, or
    /// [`ArenaError::Collision`] from the destination occupation.
    pub fn move_occupant(
        &mut self,
        from: LatticeRef,
        target: MoveTarget,
    ) -> Result<(Point3<f64>, LatticeRef), ArenaError> {
        let occupant = self
            .cells
            .get_mut(&from)
            .and_then(|cell| cell.occupant.take())
            .ok_or(ArenaError::VacantSource { at: from })?;

        let attempt = match target {
            MoveTarget::Explicit(to) => Ok(to),
            MoveTarget::Vacant(v) => self.vacancy(v).ok_or_else(|| {
                debug!(index = v, occupant = %occupant, "no room left for move");
                ArenaError::NoRoom {
                    index: v,
                    capacity: self.capacity(),
                }
            }),
        }
        .and_then(|to| self.occupy(to, occupant).map(|center| (center, to)));

        if attempt.is_err() {
            if let Some(cell) = self.cells.get_mut(&from) {
                cell.occupant = Some(occupant);
            }
        }
        attempt
    }

    /// Occupies every cell overlapped by a rigid body's surface.
    ///
    /// Each vertex resolves to its nearest cell and occupies it only when the
    /// vertex genuinely lies inside that cell's sphere; vertices falling in
    /// the gap space between spheres are skipped. A triangle edge slicing
    /// through a sphere it has no vertex in therefore goes unmarked, a rare
    /// and accepted miss. Only the surface is marked, not the interior;
    /// callers needing interior exclusion must check separately.
    ///
    /// Vertices outside the arena boundary grow the arena as needed. A
    /// collision with a different occupant aborts the insertion; cells already
    /// marked by earlier vertices stay marked.
    pub fn insert_surface<I>(&mut self, vertices: I, occupant: Occupant) -> Result<(), ArenaError>
    where
        I: IntoIterator<Item = Point3<f64>>,
    {
        debug!(occupant = %occupant, "insert surface");
        for vertex in vertices {
            let r = self.geometry.nearest_ref(&vertex);
            let separation = (vertex - self.location_of(r)).norm();
            if separation <= self.geometry.sphere_radius() {
                self.occupy(r, occupant)?;
            } else {
                trace!(at = ?r, separation, "vertex in gap space, skipped");
            }
        }
        Ok(())
    }

    /// All occupied cells as `(ref, center, occupant)`, in ref order.
    ///
    /// Together with [`Self::sphere_radius`] this is the complete feed for
    /// diagnostic exporters.
    pub fn occupied(&self) -> impl Iterator<Item = (LatticeRef, Point3<f64>, Occupant)> + '_ {
        self.cells
            .iter()
            .filter_map(|(r, cell)| cell.occupant.map(|occupant| (*r, cell.center, occupant)))
    }

    fn realize(&mut self, at: LatticeRef) {
        if self.cells.contains_key(&at) {
            return;
        }
        let center = self.geometry.location_of(at);
        debug!(at = ?at, x = center.x, y = center.y, z = center.z, "realized cell");
        self.cells.insert(
            at,
            Cell {
                center,
                occupant: None,
            },
        );
        self.volume += self.per_sphere_volume;
    }
}
