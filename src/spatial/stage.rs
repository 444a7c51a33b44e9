//! A single collision layer.
//!
//! A [`Stage`] owns the bodies of one independently rendered layer together
//! with their grid index and the narrow phase used to confirm candidates. It
//! offers the two searches used by the runtime:
//!
//! - [`Stage::search_skip`] – the `(k+1)`-th qualifying collision in scan order,
//!   used for movement blocking and "is there another body under this one"
//!   probes;
//! - [`Stage::search_touch`] – the visible, unclaimed hit with the highest actor
//!   id, used for pointer dispatch so the most recently created actor wins.
//!
//! Both searches re-index a member probe whose bounds changed before scanning,
//! so a stale index can never be read.

use log::debug;
use rustc_hash::{FxHashMap, FxHashSet};

use super::grid::{CellRange, DEFAULT_CELL_SIZE, SpatialGrid};
use super::narrow::{AabbNarrowPhase, NarrowPhase};
use super::{ActorId, Body, Category, Hit, Probe};

pub struct Stage {
    grid: SpatialGrid,
    bodies: FxHashMap<ActorId, Body>,
    narrow: Box<dyn NarrowPhase + Send + Sync>,
}

impl Default for Stage {
    fn default() -> Self {
        Self::new(DEFAULT_CELL_SIZE, DEFAULT_CELL_SIZE)
    }
}

impl std::fmt::Debug for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Stage")
            .field("grid", &self.grid)
            .field("bodies", &self.bodies.len())
            .finish()
    }
}

impl Stage {
    pub fn new(cell_width: f32, cell_height: f32) -> Self {
        Self {
            grid: SpatialGrid::new(cell_width, cell_height),
            bodies: FxHashMap::default(),
            narrow: Box::new(AabbNarrowPhase),
        }
    }

    /// Replace the narrow phase used to confirm broad-phase candidates.
    pub fn with_narrow_phase(mut self, narrow: impl NarrowPhase + Send + Sync + 'static) -> Self {
        self.narrow = Box::new(narrow);
        self
    }

    /// Insert or update a body and refresh its cells.
    pub fn upsert(&mut self, body: Body) {
        self.grid.insert(body.id, &body.bounds);
        self.bodies.insert(body.id, body);
    }

    /// Remove a body. Returns `false` if it was not on this stage.
    pub fn remove(&mut self, id: ActorId) -> bool {
        self.grid.remove(id);
        self.bodies.remove(&id).is_some()
    }

    /// Drop every body for which `keep` returns `false`.
    pub fn retain(&mut self, mut keep: impl FnMut(ActorId) -> bool) {
        let gone: Vec<ActorId> = self.bodies.keys().copied().filter(|id| !keep(*id)).collect();
        for id in gone {
            self.remove(id);
        }
    }

    pub fn contains(&self, id: ActorId) -> bool {
        self.bodies.contains_key(&id)
    }

    pub fn body(&self, id: ActorId) -> Option<&Body> {
        self.bodies.get(&id)
    }

    pub fn grid(&self) -> &SpatialGrid {
        &self.grid
    }

    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    pub fn clear(&mut self) {
        self.grid.clear();
        self.bodies.clear();
    }

    /// Cells to scan for `probe`, indexing it on demand.
    ///
    /// A member probe whose bounds differ from the stored ones, or that has no
    /// cells yet, is re-indexed first. A non-member probe is ranged without
    /// being inserted.
    fn probe_range(&mut self, probe: &Probe) -> CellRange {
        if let Some(id) = probe.id {
            if let Some(body) = self.bodies.get(&id).copied() {
                if body.bounds != probe.bounds || self.grid.range_of(id).is_none() {
                    self.upsert(Body {
                        bounds: probe.bounds,
                        ..body
                    });
                }
                if let Some(range) = self.grid.range_of(id) {
                    return range;
                }
            }
        }
        self.grid.range_for(&probe.bounds)
    }

    /// Visit each distinct candidate in scan order until `visit` returns
    /// `false`. Candidates that fail the mask, are the probe itself, or whose
    /// narrow phase errors out are skipped.
    fn scan(
        &mut self,
        probe: &Probe,
        mask: Option<Category>,
        mut visit: impl FnMut(&Body, Hit) -> bool,
    ) {
        let range = self.probe_range(probe);
        let mut seen: FxHashSet<ActorId> = FxHashSet::default();
        for key in range.cells() {
            for id in self.grid.cell(key) {
                if Some(*id) == probe.id || !seen.insert(*id) {
                    continue;
                }
                let Some(body) = self.bodies.get(id) else {
                    continue;
                };
                if !body.category.passes(mask) {
                    continue;
                }
                let contact = match self.narrow.collide(&probe.bounds, &body.bounds) {
                    Ok(Some(contact)) => contact,
                    Ok(None) => continue,
                    Err(e) => {
                        debug!("narrow phase failed for {}: {}", body.id, e);
                        continue;
                    }
                };
                let hit = Hit {
                    actor: *id,
                    contact,
                };
                if !visit(body, hit) {
                    return;
                }
            }
        }
    }

    /// Return the `(skip + 1)`-th qualifying collision for `probe`.
    pub fn search_skip(&mut self, probe: &Probe, mask: Option<Category>, skip: usize) -> Option<Hit> {
        let mut remaining = skip;
        let mut found = None;
        self.scan(probe, mask, |_, hit| {
            if remaining == 0 {
                found = Some(hit);
                false
            } else {
                remaining -= 1;
                true
            }
        });
        found
    }

    /// First qualifying collision, equivalent to `search_skip(probe, mask, 0)`.
    pub fn search(&mut self, probe: &Probe, mask: Option<Category>) -> Option<Hit> {
        self.search_skip(probe, mask, 0)
    }

    /// Every qualifying collision in scan order.
    pub fn search_all(&mut self, probe: &Probe, mask: Option<Category>) -> Vec<Hit> {
        let mut hits = Vec::new();
        self.scan(probe, mask, |_, hit| {
            hits.push(hit);
            true
        });
        hits
    }

    /// Return the visible, unclaimed hit with the highest actor id.
    pub fn search_touch(
        &mut self,
        probe: &Probe,
        mask: Option<Category>,
        claimed: &FxHashSet<ActorId>,
    ) -> Option<Hit> {
        let mut best: Option<Hit> = None;
        self.scan(probe, mask, |body, hit| {
            if body.visible
                && !claimed.contains(&hit.actor)
                && best.is_none_or(|b| hit.actor > b.actor)
            {
                best = Some(hit);
            }
            true
        });
        best
    }
}
