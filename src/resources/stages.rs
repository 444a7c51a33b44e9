//! Stage registry and pointer-touch routing.
//!
//! A [`Stages`] resource owns one [`Stage`] per layer. Touches are offered
//! to the stages in `touch_order` and stop at the first stage with a hit;
//! when no stage hits, the report names the last stage in the order with no
//! actor. An actor hit by a touch stays claimed for that touch identifier
//! until [`Stages::release`], so two fingers never grab the same actor.

use arrayvec::ArrayVec;
use bevy_ecs::prelude::Resource;
use glam::Vec2;
use log::{debug, warn};
use rustc_hash::{FxHashMap, FxHashSet};

use crate::resources::runtimeconfig::{DEFAULT_TOUCH_STAGES, RuntimeConfig};
use crate::spatial::grid::DEFAULT_CELL_SIZE;
use crate::spatial::{ActorId, Category, Hit, Probe, Stage};

pub const MAX_STAGES: usize = 8;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct StageId(pub u8);

/// Pointer identifier, as given by the input layer.
pub type TouchId = u32;

/// Outcome of routing one touch.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TouchReport {
    pub identifier: TouchId,
    /// Stage that answered. `None` only when no stage in the order exists.
    pub stage: Option<StageId>,
    pub hit: Option<Hit>,
}

#[derive(Resource, Debug)]
pub struct Stages {
    stages: FxHashMap<StageId, Stage>,
    cell_width: f32,
    cell_height: f32,
    touch_order: ArrayVec<StageId, MAX_STAGES>,
    touch_mask: Option<Category>,
    claims: FxHashMap<TouchId, ActorId>,
    claimed: FxHashSet<ActorId>,
}

impl Default for Stages {
    fn default() -> Self {
        Self::new(DEFAULT_CELL_SIZE, DEFAULT_CELL_SIZE)
    }
}

impl Stages {
    pub fn new(cell_width: f32, cell_height: f32) -> Self {
        Self {
            stages: FxHashMap::default(),
            cell_width,
            cell_height,
            touch_order: DEFAULT_TOUCH_STAGES.into_iter().collect(),
            touch_mask: Some(Category::UI),
            claims: FxHashMap::default(),
            claimed: FxHashSet::default(),
        }
    }

    pub fn from_config(config: &RuntimeConfig) -> Self {
        let mut stages = Self::new(config.cell_width, config.cell_height);
        stages.set_touch_order(&config.touch_stages, config.touch_mask);
        stages
    }

    pub fn stage(&self, id: StageId) -> Option<&Stage> {
        self.stages.get(&id)
    }

    /// The stage `id`, created empty on first use.
    pub fn stage_mut(&mut self, id: StageId) -> &mut Stage {
        let (w, h) = (self.cell_width, self.cell_height);
        self.stages.entry(id).or_insert_with(|| Stage::new(w, h))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (StageId, &mut Stage)> {
        self.stages.iter_mut().map(|(id, stage)| (*id, stage))
    }

    /// Remove `actor` from every stage and drop its touch claim.
    pub fn remove_actor(&mut self, actor: ActorId) -> bool {
        let mut removed = false;
        for stage in self.stages.values_mut() {
            removed |= stage.remove(actor);
        }
        if self.claimed.remove(&actor) {
            self.claims.retain(|_, a| *a != actor);
        }
        removed
    }

    // --- touch routing ----------------------------------------------------

    /// Set the stages touches are offered to, highest priority first.
    /// Extra entries beyond [`MAX_STAGES`] are dropped.
    pub fn set_touch_order(&mut self, order: &[StageId], mask: Option<Category>) {
        if order.len() > MAX_STAGES {
            warn!(
                "touch order has {} stages, keeping the first {}",
                order.len(),
                MAX_STAGES
            );
        }
        self.touch_order = order.iter().copied().take(MAX_STAGES).collect();
        self.touch_mask = mask;
    }

    pub fn touch_order(&self) -> &[StageId] {
        &self.touch_order
    }

    pub fn touch_mask(&self) -> Option<Category> {
        self.touch_mask
    }

    /// Stop offering touches to `id`. The stage itself keeps its actors.
    pub fn remove_collision_layer(&mut self, id: StageId) -> bool {
        match self.touch_order.iter().position(|s| *s == id) {
            Some(index) => {
                self.touch_order.remove(index);
                true
            }
            None => false,
        }
    }

    /// Route a touch at `point` through the touch order and claim the hit.
    pub fn touch(&mut self, identifier: TouchId, point: Vec2) -> TouchReport {
        let probe = Probe::point(point.x, point.y);
        let mask = self.touch_mask;
        let mut answered = None;
        for id in self.touch_order.clone() {
            let Some(stage) = self.stages.get_mut(&id) else {
                continue;
            };
            answered = Some(id);
            if let Some(hit) = stage.search_touch(&probe, mask, &self.claimed) {
                self.claim(identifier, hit.actor);
                return TouchReport {
                    identifier,
                    stage: Some(id),
                    hit: Some(hit),
                };
            }
        }
        debug!("touch {} at {:?} hit nothing", identifier, point);
        TouchReport {
            identifier,
            stage: answered,
            hit: None,
        }
    }

    pub fn claim(&mut self, identifier: TouchId, actor: ActorId) {
        if let Some(previous) = self.claims.insert(identifier, actor) {
            self.claimed.remove(&previous);
        }
        self.claimed.insert(actor);
    }

    pub fn claimed_by(&self, identifier: TouchId) -> Option<ActorId> {
        self.claims.get(&identifier).copied()
    }

    pub fn is_claimed(&self, actor: ActorId) -> bool {
        self.claimed.contains(&actor)
    }

    /// End a touch. Returns the actor it was holding.
    pub fn release(&mut self, identifier: TouchId) -> Option<ActorId> {
        let actor = self.claims.remove(&identifier)?;
        self.claimed.remove(&actor);
        Some(actor)
    }
}
