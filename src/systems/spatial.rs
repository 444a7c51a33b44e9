use bevy_ecs::prelude::*;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::components::actor::Actor;
use crate::components::boxcollider::BoxCollider;
use crate::components::mapposition::MapPosition;
use crate::components::stagemember::{CollisionCategory, StageMember};
use crate::components::visibility::Hidden;
use crate::resources::stages::{StageId, Stages};
use crate::spatial::{ActorId, Body};

/// Mirror actor bounds into their stages and drop actors that are gone.
///
/// An actor whose bounds did not change keeps its grid cells untouched.
pub fn sync_spatial_index(
    mut stages: ResMut<Stages>,
    query: Query<(
        &Actor,
        &MapPosition,
        &BoxCollider,
        &StageMember,
        Option<&CollisionCategory>,
        Has<Hidden>,
    )>,
) {
    let mut live: FxHashMap<StageId, FxHashSet<ActorId>> = FxHashMap::default();
    for (actor, position, collider, member, category, hidden) in query.iter() {
        let mut body = Body::new(actor.id, collider.aabb(position.pos))
            .with_category(category.map(|c| c.0).unwrap_or_default());
        if hidden {
            body = body.hidden();
        }
        stages.stage_mut(member.0).upsert(body);
        live.entry(member.0).or_default().insert(actor.id);
    }
    for (id, stage) in stages.iter_mut() {
        let keep = live.get(&id);
        stage.retain(|actor| keep.is_some_and(|k| k.contains(&actor)));
    }
}
