//! Spatial grid of units for nearest-target and overlap queries.
//!
//! Rebuilt once per tick from the mirrored units; bullets query it for homing
//! targets and direct-hit candidates.

use std::collections::HashMap;

use bevy_ecs::entity::Entity;

use crate::components::Team;

/// Cell size in world units (eight tiles).
const CELL_SIZE: f32 = 64.0;

/// A unit entry in the grid.
#[derive(Debug, Clone)]
pub struct SpatialEntry {
    pub entity: Entity,
    pub runtime_id: u64,
    pub team: Team,
    pub x: f32,
    pub y: f32,
    /// Collision diameter.
    pub hit_size: f32,
    pub flying: bool,
}

/// A spatial hash grid for O(1) cell lookup of nearby units.
#[derive(Default)]
pub struct SpatialGrid {
    cells: HashMap<(i32, i32), Vec<SpatialEntry>>,
    len: usize,
}

impl SpatialGrid {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an entry into the grid.
    pub fn insert(&mut self, entry: SpatialEntry) {
        let key = cell_key(entry.x, entry.y);
        self.cells.entry(key).or_default().push(entry);
        self.len += 1;
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Find an entry by runtime id.
    pub fn get(&self, runtime_id: u64) -> Option<&SpatialEntry> {
        self.cells
            .values()
            .flatten()
            .find(|e| e.runtime_id == runtime_id)
    }

    /// Drop an entry (a unit that died mid-tick). Returns `true` if found.
    pub fn remove(&mut self, runtime_id: u64) -> bool {
        for cell in self.cells.values_mut() {
            if let Some(i) = cell.iter().position(|e| e.runtime_id == runtime_id) {
                cell.swap_remove(i);
                self.len -= 1;
                return true;
            }
        }
        false
    }

    /// Nearest entry within `max_dist` of `(x, y)` accepted by `filter`.
    ///
    /// Ties go to the lower runtime id so results do not depend on hash order.
    pub fn nearest(
        &self,
        x: f32,
        y: f32,
        max_dist: f32,
        filter: impl Fn(&SpatialEntry) -> bool,
    ) -> Option<(&SpatialEntry, f32)> {
        let max_dist_sq = max_dist * max_dist;
        let mut best: Option<(&SpatialEntry, f32)> = None;

        for e in self.candidates(x, y, max_dist) {
            if !filter(e) {
                continue;
            }
            let d_sq = dist_sq(x, y, e.x, e.y);
            if d_sq > max_dist_sq {
                continue;
            }
            let dist = d_sq.sqrt();
            let better = match best {
                None => true,
                Some((b, b_dist)) => {
                    dist < b_dist || (dist == b_dist && e.runtime_id < b.runtime_id)
                }
            };
            if better {
                best = Some((e, dist));
            }
        }

        best
    }

    /// Entries whose hit circle overlaps a circle of `radius` at `(x, y)`,
    /// ordered by runtime id.
    pub fn overlapping(&self, x: f32, y: f32, radius: f32) -> Vec<&SpatialEntry> {
        self.swept(x, y, x, y, radius)
    }

    /// Entries touched by a circle of `radius` moving from `(x0, y0)` to
    /// `(x1, y1)`, in the order the path reaches them (ties by runtime id).
    pub fn swept(&self, x0: f32, y0: f32, x1: f32, y1: f32, radius: f32) -> Vec<&SpatialEntry> {
        let (dx, dy) = (x1 - x0, y1 - y0);
        let len_sq = dx * dx + dy * dy;
        // Widest unit we might touch is unknown up front, so scan one extra cell.
        let reach = len_sq.sqrt() / 2.0 + radius + CELL_SIZE;

        let mut hits: Vec<(f32, &SpatialEntry)> = self
            .candidates((x0 + x1) / 2.0, (y0 + y1) / 2.0, reach)
            .into_iter()
            .filter_map(|e| {
                let t = if len_sq > 0.0 {
                    (((e.x - x0) * dx + (e.y - y0) * dy) / len_sq).clamp(0.0, 1.0)
                } else {
                    0.0
                };
                let touch = radius + e.hit_size / 2.0;
                (dist_sq(x0 + dx * t, y0 + dy * t, e.x, e.y) <= touch * touch).then_some((t, e))
            })
            .collect();
        hits.sort_by(|a, b| {
            a.0.total_cmp(&b.0)
                .then(a.1.runtime_id.cmp(&b.1.runtime_id))
        });
        hits.into_iter().map(|(_, e)| e).collect()
    }

    /// Entries in the cells within `reach` of `(x, y)`. Falls back to every
    /// entry once the square of cells outnumbers the occupied ones.
    fn candidates(&self, x: f32, y: f32, reach: f32) -> Vec<&SpatialEntry> {
        let span = (reach / CELL_SIZE).ceil();
        let side = 2.0 * f64::from(span) + 1.0;
        if !span.is_finite() || side * side > self.cells.len() as f64 {
            return self.cells.values().flatten().collect();
        }

        let span = span as i64;
        let (cx, cy) = cell_key(x, y);
        let mut found = Vec::new();
        for dx in -span..=span {
            for dy in -span..=span {
                let (Ok(kx), Ok(ky)) = (
                    i32::try_from(i64::from(cx) + dx),
                    i32::try_from(i64::from(cy) + dy),
                ) else {
                    continue;
                };
                if let Some(cell) = self.cells.get(&(kx, ky)) {
                    found.extend(cell);
                }
            }
        }
        found
    }
}

/// Compute the cell key for a world position.
fn cell_key(x: f32, y: f32) -> (i32, i32) {
    ((x / CELL_SIZE).floor() as i32, (y / CELL_SIZE).floor() as i32)
}

fn dist_sq(x1: f32, y1: f32, x2: f32, y2: f32) -> f32 {
    let dx = x2 - x1;
    let dy = y2 - y1;
    dx * dx + dy * dy
}
