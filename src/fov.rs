//! Recursive shadow-casting field of view.
//!
//! The circle around the origin is split into eight 45° octants. One sweep routine
//! walks a canonical octant row by row and [`OCTANT_TRANSFORMS`] maps its `(dx, dy)`
//! onto each real octant. Opaque cells narrow the visible slope window; entering a
//! blocked run recurses into the rows behind it with the narrowed window.

use macroquad::math::{IVec2, UVec2};

/// Per-octant transform, one column per octant: rows are `xx`, `xy`, `yx`, `yy`.
/// A canonical offset `(dx, dy)` maps to `(dx*xx + dy*xy, dx*yx + dy*yy)`.
pub const OCTANT_TRANSFORMS: [[i32; 8]; 4] = [
    [1, 0, 0, -1, -1, 0, 0, 1],
    [0, 1, -1, 0, 0, -1, 1, 0],
    [0, 1, 1, 0, 0, -1, -1, 0],
    [1, 0, 0, 1, -1, 0, 0, -1],
];

/// Octants that report the axis cells they share with a neighbour. Diagonal cells are
/// reported by the even octants.
const AXIS_OWNERS: [bool; 8] = [true, true, true, false, true, false, false, false];

#[derive(Debug, Clone, Copy)]
struct Octant {
    index: usize,
    xx: i64,
    xy: i64,
    yx: i64,
    yy: i64,
}

impl Octant {
    fn new(index: usize) -> Self {
        let index = index % 8;
        Octant {
            index,
            xx: OCTANT_TRANSFORMS[0][index] as i64,
            xy: OCTANT_TRANSFORMS[1][index] as i64,
            yx: OCTANT_TRANSFORMS[2][index] as i64,
            yy: OCTANT_TRANSFORMS[3][index] as i64,
        }
    }

    /// Whether this octant reports the cell at column `dx` of row `row`. Cells on the
    /// shared edges belong to exactly one of the two octants touching them.
    fn reports(&self, dx: i64, row: i64) -> bool {
        if dx == 0 {
            AXIS_OWNERS[self.index]
        } else if dx == -row {
            self.index % 2 == 0
        } else {
            true
        }
    }
}

/// Field-of-view query around one origin.
///
/// Holds no state between calls and never mutates the grid, so independent origins can
/// be computed concurrently against shared read-only data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShadowCaster {
    /// Viewer cell.
    pub origin: IVec2,
    /// Cells at squared distance `radius²` or more are not reported.
    pub radius: u32,
    /// Accepted for callers that pass it; it does not change the sweep.
    pub overshoot: u32,
    /// Grid size in tiles; cells outside `0..bounds` are never queried or reported.
    pub bounds: UVec2,
}

impl ShadowCaster {
    /// A caster with no overshoot.
    pub fn new(origin: IVec2, radius: u32, bounds: UVec2) -> Self {
        ShadowCaster {
            origin,
            radius,
            overshoot: 0,
            bounds,
        }
    }

    /// Sets the overshoot.
    pub fn with_overshoot(mut self, overshoot: u32) -> Self {
        self.overshoot = overshoot;
        self
    }

    /// Sweeps all eight octants.
    ///
    /// Every cell strictly inside the radius that is not in shadow is passed to
    /// `mark_visible`. The origin itself is not reported; callers mark it if they want it.
    pub fn compute<O, M>(&self, is_opaque: O, mut mark_visible: M)
    where
        O: Fn(i32, i32) -> bool,
        M: FnMut(i32, i32),
    {
        for octant in 0..8 {
            self.cast_octant(octant, &is_opaque, &mut mark_visible);
        }
    }

    /// Sweeps a single octant (`0..8`, taken modulo 8).
    pub fn cast_octant<O, M>(&self, octant: usize, is_opaque: &O, mark_visible: &mut M)
    where
        O: Fn(i32, i32) -> bool,
        M: FnMut(i32, i32),
    {
        self.cast_light(&Octant::new(octant), 1, 1.0, 0.0, is_opaque, mark_visible);
    }

    fn cast_light<O, M>(
        &self,
        octant: &Octant,
        row: i64,
        mut start: f64,
        end: f64,
        is_opaque: &O,
        mark_visible: &mut M,
    ) where
        O: Fn(i32, i32) -> bool,
        M: FnMut(i32, i32),
    {
        if start < end {
            return;
        }

        let radius = self.radius as i64;
        let radius_sq = radius * radius;
        let mut new_start = 0.0;

        for j in row..=radius {
            let dy = -j;
            let mut blocked = false;

            for dx in -j..=0 {
                let l_slope = (dx as f64 - 0.5) / (dy as f64 + 0.5);
                let r_slope = (dx as f64 + 0.5) / (dy as f64 - 0.5);
                if start < r_slope {
                    continue;
                }
                if end > l_slope {
                    break;
                }

                let x = self.origin.x as i64 + dx * octant.xx + dy * octant.xy;
                let y = self.origin.y as i64 + dx * octant.yx + dy * octant.yy;
                let Some((x, y)) = self.cell(x, y) else {
                    continue;
                };

                if dx * dx + dy * dy < radius_sq && octant.reports(dx, j) {
                    mark_visible(x, y);
                }

                let opaque = is_opaque(x, y);
                if blocked {
                    if opaque {
                        new_start = r_slope;
                    } else {
                        blocked = false;
                        start = new_start;
                    }
                } else if opaque && j < radius {
                    blocked = true;
                    self.cast_light(octant, j + 1, start, l_slope, is_opaque, mark_visible);
                    new_start = r_slope;
                }
            }

            if blocked {
                break;
            }
        }
    }

    /// Signed bounds check; `None` for anything off the grid.
    fn cell(&self, x: i64, y: i64) -> Option<(i32, i32)> {
        if x < 0 || y < 0 || x >= self.bounds.x as i64 || y >= self.bounds.y as i64 {
            return None;
        }
        Some((i32::try_from(x).ok()?, i32::try_from(y).ok()?))
    }
}
