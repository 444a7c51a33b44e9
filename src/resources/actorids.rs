use bevy_ecs::prelude::Resource;

use crate::spatial::ActorId;

/// Hands out actor ids in creation order. Ids are never reused.
#[derive(Resource, Debug, Default)]
pub struct ActorIds {
    next: u32,
}

impl ActorIds {
    pub fn allocate(&mut self) -> ActorId {
        self.next += 1;
        ActorId(self.next)
    }

    pub fn last(&self) -> Option<ActorId> {
        (self.next > 0).then_some(ActorId(self.next))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_grow() {
        let mut ids = ActorIds::default();
        assert_eq!(ids.last(), None);
        let a = ids.allocate();
        let b = ids.allocate();
        assert!(b > a);
        assert_eq!(ids.last(), Some(b));
    }
}
