//! Hierarchical cell ids on the cube-projected sphere.
//!
//! The sphere is split into six cube faces; each face is a quadtree of up to
//! 30 levels. A cell id packs the face (3 bits) and the Morton-interleaved
//! quadtree path (2 bits per level) into a `u64`, with a trailing sentinel
//! bit marking the level. The packing gives two properties the spatial index
//! relies on:
//!
//! - ids of all descendants of a cell form one contiguous range
//!   (`range_min..=range_max`), so a sorted slice of leaf ids can be range
//!   queried per cell with two binary searches;
//! - `parent`/`children` are pure bit arithmetic.
//!
//! Every cell also yields a bounding cap (center point plus maximal corner
//! angle), which is what turns the id hierarchy into a metric tree for the
//! closest-edge search.

use super::{Angle, Point};

/// Deepest quadtree level. Leaf cells at level 30 are ~2 cm across, far
/// below the precision of the input data.
pub const MAX_LEVEL: u8 = 30;

const FACE_SHIFT: u32 = 61;
const NUM_FACES: u64 = 6;
const MAX_SIZE: u32 = 1 << MAX_LEVEL;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CellId(u64);

impl CellId {
    /// The level-0 cell covering an entire cube face (0..6).
    pub fn from_face(face: u8) -> CellId {
        debug_assert!((face as u64) < NUM_FACES);
        CellId(((face as u64) << FACE_SHIFT) | (1 << (FACE_SHIFT - 1)))
    }

    /// The leaf cell containing `p`.
    pub fn from_point(p: &Point) -> CellId {
        let (face, u, v) = face_uv(p);
        CellId::from_face_ij(face, st_to_ij(uv_to_st(u)), st_to_ij(uv_to_st(v)))
    }

    fn from_face_ij(face: u8, i: u32, j: u32) -> CellId {
        let pos = (spread_bits(i as u64) << 1) | spread_bits(j as u64);
        CellId(((face as u64) << FACE_SHIFT) | (pos << 1) | 1)
    }

    pub fn face(&self) -> u8 {
        (self.0 >> FACE_SHIFT) as u8
    }

    pub fn level(&self) -> u8 {
        MAX_LEVEL - (self.0.trailing_zeros() / 2) as u8
    }

    pub fn is_leaf(&self) -> bool {
        self.0 & 1 == 1
    }

    fn lsb(&self) -> u64 {
        self.0 & self.0.wrapping_neg()
    }

    /// Ancestor at the given level. `level` must not exceed `self.level()`.
    pub fn parent(&self, level: u8) -> CellId {
        debug_assert!(level <= self.level());
        let lsb = 1u64 << (2 * (MAX_LEVEL - level) as u32);
        CellId((self.0 & lsb.wrapping_neg()) | lsb)
    }

    /// The four children, in ascending id order.
    pub fn children(&self) -> [CellId; 4] {
        debug_assert!(!self.is_leaf());
        let lsb = self.lsb();
        let base = self.0 - lsb + (lsb >> 2);
        [
            CellId(base),
            CellId(base + (lsb >> 1)),
            CellId(base + lsb),
            CellId(base + (lsb >> 1) * 3),
        ]
    }

    /// Smallest leaf id contained in this cell.
    pub fn range_min(&self) -> CellId {
        CellId(self.0 - self.lsb() + 1)
    }

    /// Largest leaf id contained in this cell.
    pub fn range_max(&self) -> CellId {
        CellId(self.0 + self.lsb() - 1)
    }

    pub fn contains(&self, other: &CellId) -> bool {
        self.range_min() <= *other && *other <= self.range_max()
    }

    /// Bounding cap: the cell center and the largest angular distance from
    /// the center to a corner. Every point of the cell lies within the cap
    /// (the gnomonic projection maps the cell to a planar rectangle, and the
    /// angular distance to a fixed point is maximized at a rectangle vertex).
    pub fn cap(&self) -> (Point, Angle) {
        let level = self.level();
        let leaf = self.range_min();
        let pos = (leaf.0 & ((1 << FACE_SHIFT) - 1)) >> 1;
        let i0 = compact_bits(pos >> 1);
        let j0 = compact_bits(pos);
        let size = 1u32 << (MAX_LEVEL - level);
        // Align to the cell's own grid; range_min's leaf coordinates are
        // already the minimal corner.
        let (u0, v0) = (ij_to_uv(i0), ij_to_uv(j0));
        let (u1, v1) = (ij_to_uv(i0 + size), ij_to_uv(j0 + size));

        let face = self.face();
        let center = face_uv_to_point(face, (u0 + u1) / 2.0, (v0 + v1) / 2.0);
        let mut radius = Angle(0.0);
        for (u, v) in [(u0, v0), (u0, v1), (u1, v0), (u1, v1)] {
            let corner = face_uv_to_point(face, u, v);
            let a = center.angle(&corner);
            if a > radius {
                radius = a;
            }
        }
        (center, radius)
    }
}

/// Projects a unit vector to (face, u, v) with u, v in [-1, 1].
///
/// The face is the cube side pierced by the ray through `p`: the axis with
/// the largest absolute component, offset by 3 for negative direction.
fn face_uv(p: &Point) -> (u8, f64, f64) {
    let comps = [p.x, p.y, p.z];
    let mut axis = 0;
    if comps[1].abs() > comps[axis].abs() {
        axis = 1;
    }
    if comps[2].abs() > comps[axis].abs() {
        axis = 2;
    }
    let major = comps[axis];
    let u = comps[(axis + 1) % 3] / major.abs();
    let v = comps[(axis + 2) % 3] / major.abs();
    let face = axis as u8 + if major < 0.0 { 3 } else { 0 };
    (face, u, v)
}

fn face_uv_to_point(face: u8, u: f64, v: f64) -> Point {
    let axis = (face % 3) as usize;
    let sign = if face >= 3 { -1.0 } else { 1.0 };
    let mut comps = [0.0f64; 3];
    comps[axis] = sign;
    comps[(axis + 1) % 3] = u;
    comps[(axis + 2) % 3] = v;
    Point::new(comps[0], comps[1], comps[2]).normalized()
}

fn uv_to_st(u: f64) -> f64 {
    (u + 1.0) / 2.0
}

fn st_to_ij(s: f64) -> u32 {
    let i = (s * MAX_SIZE as f64).floor();
    i.clamp(0.0, (MAX_SIZE - 1) as f64) as u32
}

fn ij_to_uv(i: u32) -> f64 {
    2.0 * (i as f64 / MAX_SIZE as f64) - 1.0
}

/// Spreads the low 32 bits of `x` into the even bit positions.
fn spread_bits(x: u64) -> u64 {
    let mut x = x & 0xffff_ffff;
    x = (x | (x << 16)) & 0x0000_ffff_0000_ffff;
    x = (x | (x << 8)) & 0x00ff_00ff_00ff_00ff;
    x = (x | (x << 4)) & 0x0f0f_0f0f_0f0f_0f0f;
    x = (x | (x << 2)) & 0x3333_3333_3333_3333;
    x = (x | (x << 1)) & 0x5555_5555_5555_5555;
    x
}

/// Inverse of [`spread_bits`]: collects the even bit positions.
fn compact_bits(x: u64) -> u32 {
    let mut x = x & 0x5555_5555_5555_5555;
    x = (x | (x >> 1)) & 0x3333_3333_3333_3333;
    x = (x | (x >> 2)) & 0x0f0f_0f0f_0f0f_0f0f;
    x = (x | (x >> 4)) & 0x00ff_00ff_00ff_00ff;
    x = (x | (x >> 8)) & 0x0000_ffff_0000_ffff;
    x = (x | (x >> 16)) & 0x0000_0000_ffff_ffff;
    x as u32
}
