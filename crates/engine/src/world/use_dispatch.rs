use super::effects::EffectId;
use super::entity::{Entity, EntityId};
use super::{SimError, SpawnOptions, World};

/// View handed to an item's use effect: the item, its holder, and the nearest
/// qualifying target if one was in reach.
pub struct UseContext<'a> {
    world: &'a mut World,
    item: EntityId,
    holder: EntityId,
    target: Option<EntityId>,
}

impl<'a> UseContext<'a> {
    pub(crate) fn new(
        world: &'a mut World,
        item: EntityId,
        holder: EntityId,
        target: Option<EntityId>,
    ) -> Self {
        Self {
            world,
            item,
            holder,
            target,
        }
    }

    fn now(&self) -> f64 {
        self.world.time()
    }

    fn target_entity(&self) -> Option<&Entity> {
        self.target.and_then(|id| self.world.find_entity(id))
    }

    fn target_entity_mut(&mut self) -> Option<&mut Entity> {
        let target = self.target?;
        self.world.find_entity_mut(target)
    }

    /// True when a target is in reach and is of the given kind.
    pub fn target_is(&self, kind: &str) -> bool {
        self.target_entity().is_some_and(|target| target.kind == kind)
    }

    pub fn target_health(&self) -> Option<f32> {
        self.target_entity().map(|target| target.health)
    }

    pub fn target_has_effect(&self, effect: EffectId) -> bool {
        let now = self.now();
        self.target_entity()
            .is_some_and(|target| target.has_effect(effect, now))
    }

    /// Queued until the target's next update.
    pub fn damage_target(&mut self, amount: f32) {
        if let Some(target) = self.target_entity_mut() {
            target.incoming_damage += amount;
        }
    }

    pub fn add_target_effect(&mut self, effect: EffectId, duration_seconds: f64) {
        let now = self.now();
        if let Some(target) = self.target_entity_mut() {
            target.add_effect(effect, duration_seconds, now);
        }
    }

    pub fn destroy_target(&mut self) {
        if let Some(target) = self.target_entity_mut() {
            target.destroy();
        }
    }

    pub fn redefine_item(&mut self, kind: &str) -> Result<(), SimError> {
        self.world
            .redefine(self.item, kind, SpawnOptions::default())
    }

    pub fn destroy_item(&mut self) {
        self.world.destroy(self.item);
    }

    /// First slot of the holder's inventory holding an entity of `kind`.
    pub fn holder_item_of_kind(&self, kind: &str) -> Option<EntityId> {
        let holder = self.world.find_entity(self.holder)?;
        holder
            .inventory
            .iter()
            .flatten()
            .copied()
            .find(|id| {
                self.world
                    .find_entity(*id)
                    .is_some_and(|entity| entity.kind == kind)
            })
    }

    pub fn redefine(&mut self, id: EntityId, kind: &str) -> Result<(), SimError> {
        self.world.redefine(id, kind, SpawnOptions::default())
    }
}
