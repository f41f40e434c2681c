use itertools::iproduct;
use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};

/// Index of one sphere position in a hexagonally close-packed lattice.
///
/// A ref addresses a cell by `(sphere, row, layer)` counts away from the
/// lattice centre; any triple of integers is a valid address whether or not
/// the corresponding cell has been realized in an arena. Equality is
/// structural, and the derived `Ord` (lexicographic) gives cell maps a
/// deterministic iteration order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct LatticeRef {
    pub sphere: i32,
    pub row: i32,
    pub layer: i32,
}

impl LatticeRef {
    pub fn new(sphere: i32, row: i32, layer: i32) -> Self {
        Self { sphere, row, layer }
    }
}

// Euclidean so negative rows and layers alternate with the same phase as
// positive ones.
fn parity(n: i32) -> i32 {
    n.rem_euclid(2)
}

// Floor division of a coordinate into 2*radius-wide slots, offset by one radius.
fn int_ref(coord: f64, radius: f64) -> i32 {
    ((coord + radius) / (2.0 * radius)).floor() as i32
}

/// The coordinate system of a hexagonally close-packed sphere lattice.
///
/// Provides the deterministic bijection between integer lattice refs and
/// Cartesian sphere centers, the inverse nearest-ref search, and enumeration
/// of the refs whose spheres fall inside a spherical boundary. The geometry
/// is stateless: it realizes nothing and can be queried for any ref.
#[derive(Debug, Clone)]
pub struct HcpGeometry {
    /// Packing radius `a` of the equal spheres.
    a: f64,
    /// Half row spacing, `sqrt(3)/2 * a`.
    ry: f64,
    /// Half layer spacing, `sqrt(2/3) * a`.
    rz: f64,
    centre: Point3<f64>,
}

impl HcpGeometry {
    /// Creates the lattice coordinate system for packing radius `a` around `centre`.
    pub fn new(a: f64, centre: Point3<f64>) -> Self {
        Self {
            a,
            ry: 3.0f64.sqrt() / 2.0 * a,
            rz: (2.0f64 / 3.0).sqrt() * a,
            centre,
        }
    }

    /// The packing radius `a`.
    pub fn sphere_radius(&self) -> f64 {
        self.a
    }

    pub fn centre(&self) -> Point3<f64> {
        self.centre
    }

    /// Converts a lattice ref to the Cartesian center of its sphere.
    ///
    /// This is the closed-form lattice formula; it does not require (or check)
    /// that the ref has been realized anywhere, and calling it twice for the
    /// same ref returns bit-identical values.
    ///
    /// # Arguments
    ///
    /// * `r` - The lattice ref to locate.
    ///
    /// # Return
    ///
    /// The Cartesian center of the sphere addressed by `r`.
    pub fn location_of(&self, r: LatticeRef) -> Point3<f64> {
        let a = self.a;
        self.centre
            + Vector3::new(
                (2 * r.sphere + parity(r.layer + r.row)) as f64 * a,
                3.0f64.sqrt() * (r.row as f64 + parity(r.layer) as f64 / 3.0) * a,
                2.0 * self.rz * r.layer as f64,
            )
    }

    /// Finds the lattice ref whose sphere center is nearest to a point.
    ///
    /// A first approximation is obtained by slotting each coordinate into its
    /// row/layer spacing; because that division truncates while the lattice
    /// offsets alternate by parity, the true nearest cell can sit one step up
    /// in any axis, so the 2x2x2 block of candidate refs is scanned for the
    /// minimum squared distance. Exact ties keep the first minimum in scan
    /// order, an arbitrary but deterministic tie-break.
    ///
    /// # Arguments
    ///
    /// * `p` - The Cartesian point to resolve.
    ///
    /// # Return
    ///
    /// The ref of the nearest sphere center. The ref is an address: it need
    /// not be realized in any arena.
    pub fn nearest_ref(&self, p: &Point3<f64>) -> LatticeRef {
        let a = self.a;
        let sqrt3 = 3.0f64.sqrt();
        let layer = int_ref(p.z - self.centre.z - (a - self.rz), self.rz);
        let row = int_ref(
            p.y - self.centre.y - (a - self.ry) - sqrt3 * parity(layer) as f64 * a / 3.0,
            self.ry,
        );
        let sphere = int_ref(p.x - self.centre.x - parity(layer + row) as f64 * a, a);

        let mut best = LatticeRef::new(sphere, row, layer);
        let mut min_d2 = 3.0 * a * a;
        for (l, r, s) in iproduct!(
            [layer, layer + 1],
            [row, row + 1],
            [sphere, sphere + 1]
        ) {
            let candidate = LatticeRef::new(s, r, l);
            let d2 = (p - self.location_of(candidate)).norm_squared();
            if d2 < min_d2 {
                best = candidate;
                min_d2 = d2;
            }
        }
        best
    }

    /// Lattice extents `[spheres, rows, layers]` covering a target radius.
    ///
    /// Each count is the target radius plus one half-spacing, less a small
    /// tolerance against boundary exclusion, divided into full spacings.
    pub fn extents(&self, size: f64) -> [i32; 3] {
        fn extent(half: f64, size: f64) -> i32 {
            ((half + size - 1e-3) / (2.0 * half)) as i32
        }
        [
            extent(self.a, size),
            extent(self.ry, size),
            extent(self.rz, size),
        ]
    }

    /// Enumerates the refs whose sphere centers lie within `size` of the centre.
    ///
    /// Rows and layers run symmetrically about the centre. Spheres are walked
    /// outward from zero and the mirror ref `(-sphere, row, layer)` is emitted
    /// on the strength of the positive candidate's distance test, making the
    /// enumeration reflection-symmetric in the sphere index.
    pub fn refs_within(&self, size: f64) -> Vec<LatticeRef> {
        let [psx, psy, psz] = self.extents(size);
        let mut refs = Vec::new();
        for (layer, row) in iproduct!((1 - psz)..psz, (1 - psy)..psy) {
            for sphere in 0..psx {
                let candidate = LatticeRef::new(sphere, row, layer);
                if (self.location_of(candidate) - self.centre).norm() > size {
                    continue;
                }
                refs.push(candidate);
                if sphere > 0 {
                    refs.push(LatticeRef::new(-sphere, row, layer));
                }
            }
        }
        refs
    }
}
