mod collision;
mod controller;
mod effects;
mod entity;
mod snapshot;
mod use_dispatch;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use thiserror::Error;
use tracing::{debug, error, info};

use crate::content::{DefDatabase, EntityDef};
use crate::math::Vec2;

pub use collision::{collide_pair, Body};
pub use controller::{
    Controller, WaypointController, DEFAULT_ARRIVAL_DISTANCE_SQ, DEFAULT_WAYPOINT_PICK_CHANCE,
};
pub use effects::{EffectId, EffectSet, EFFECT_BOUND, EFFECT_PERMANENT, EFFECT_UNCONSCIOUS};
pub use entity::{
    Control, Entity, EntityId, EntityIdAllocator, InventoryPoint, SpawnOptions,
};
pub use snapshot::{EntitySnapshot, WorldSnapshot};
pub use use_dispatch::UseContext;

pub type SimRng = ChaCha8Rng;

pub const DEFAULT_TICK_SECONDS: f64 = 0.04;
pub const DEFAULT_WORLD_SEED: u64 = 0x7e4d_e4c1_e5;
/// Reach of pickup and use hit-tests, measured from the holder's inventory point.
pub const PICKUP_RADIUS: f32 = 50.0;
/// Speed given to a dropped item along the holder's facing.
pub const DROP_IMPULSE: f32 = 25.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionTuning {
    pub acceleration: f32,
    /// Fraction of velocity applied to position each tick.
    pub integration: f32,
    /// Velocity multiplier applied after integration.
    pub drag: f32,
}

impl Default for MotionTuning {
    fn default() -> Self {
        Self {
            acceleration: 3.0,
            integration: 0.5,
            drag: 0.75,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorldConfig {
    pub tick_seconds: f64,
    pub seed: u64,
    pub tuning: MotionTuning,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            tick_seconds: DEFAULT_TICK_SECONDS,
            seed: DEFAULT_WORLD_SEED,
            tuning: MotionTuning::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimError {
    #[error(
        "unsupported collision between '{first}' and '{second}'; only circles and immovable rects can collide"
    )]
    UnsupportedCollision { first: String, second: String },
    #[error("unknown entity kind '{kind}'")]
    UnknownKind { kind: String },
}

/// Owns every live entity and advances them one fixed tick at a time.
#[derive(Debug)]
pub struct World {
    config: WorldConfig,
    defs: DefDatabase,
    allocator: EntityIdAllocator,
    entities: Vec<Entity>,
    time: f64,
    rng: SimRng,
}

impl World {
    pub fn new(defs: DefDatabase, config: WorldConfig) -> Self {
        Self {
            config,
            defs,
            allocator: EntityIdAllocator::default(),
            entities: Vec::new(),
            time: 0.0,
            rng: SimRng::seed_from_u64(config.seed),
        }
    }

    /// Simulated seconds elapsed; effect expiry is measured against this.
    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Live entities in insertion order.
    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn find_entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.iter().find(|entity| entity.id == id)
    }

    pub fn find_entity_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.iter_mut().find(|entity| entity.id == id)
    }

    pub fn entity_def(&self, entity: &Entity) -> Option<&EntityDef> {
        self.defs.entity_def(entity.def_id)
    }

    pub fn spawn(&mut self, kind: &str, options: SpawnOptions) -> Result<EntityId, SimError> {
        let def = self
            .defs
            .entity_def_by_name(kind)
            .ok_or_else(|| SimError::UnknownKind {
                kind: kind.to_string(),
            })?;
        let id = self.allocator.allocate();
        self.entities.push(Entity::new(id, def, &options));
        debug!(entity_id = id.0, kind, "entity_spawned");
        Ok(id)
    }

    /// Swaps the definition of a live entity in place. Items pushed out of a
    /// shrinking inventory are released at the holder's position.
    pub fn redefine(
        &mut self,
        id: EntityId,
        kind: &str,
        options: SpawnOptions,
    ) -> Result<(), SimError> {
        let def = self
            .defs
            .entity_def_by_name(kind)
            .ok_or_else(|| SimError::UnknownKind {
                kind: kind.to_string(),
            })?;
        let Some(entity) = self.entities.iter_mut().find(|entity| entity.id == id) else {
            return Ok(());
        };
        let previous_kind = std::mem::take(&mut entity.kind);
        let released = entity.define(def, &options);
        let position = entity.position;
        debug!(
            entity_id = id.0,
            from = %previous_kind,
            to = kind,
            "entity_redefined"
        );

        for item_id in released {
            if let Some(item) = self.find_entity_mut(item_id) {
                item.owner = None;
                item.position = position;
            }
        }
        Ok(())
    }

    pub fn set_controller(&mut self, id: EntityId, controller: Box<dyn Controller>) -> bool {
        match self.find_entity_mut(id) {
            Some(entity) => {
                entity.controller = Some(controller);
                true
            }
            None => false,
        }
    }

    pub fn set_control(&mut self, id: EntityId, control: Control) {
        if let Some(entity) = self.find_entity_mut(id) {
            entity.control = control;
        }
    }

    pub fn add_effect(&mut self, id: EntityId, effect: EffectId, duration_seconds: f64) {
        let now = self.time;
        if let Some(entity) = self.find_entity_mut(id) {
            entity.add_effect(effect, duration_seconds, now);
        }
    }

    pub fn has_effect(&self, id: EntityId, effect: EffectId) -> bool {
        self.find_entity(id)
            .is_some_and(|entity| entity.has_effect(effect, self.time))
    }

    /// Marks for removal at the end of the next update.
    pub fn destroy(&mut self, id: EntityId) {
        if let Some(entity) = self.find_entity_mut(id) {
            entity.destroy();
        }
    }

    pub fn inventory_point(&self, id: EntityId) -> Option<InventoryPoint> {
        let entity = self.find_entity(id)?;
        let def = self.entity_def(entity)?;
        Some(entity.inventory_point(def))
    }

    pub fn active_item(&self, holder: EntityId) -> Option<EntityId> {
        self.find_entity(holder)?.active_item()
    }

    /// Puts `item` into the holder's first free slot, taking it away from any
    /// other holder. Returns whether the holder now carries the item.
    pub fn grab(&mut self, holder: EntityId, item: EntityId, make_active: bool) -> bool {
        if holder == item {
            return false;
        }
        let Some(item_owner) = self.find_entity(item).map(|entity| entity.owner) else {
            return false;
        };
        let Some(holder_entity) = self.find_entity(holder) else {
            return false;
        };
        if holder_entity.owner == Some(item) {
            return false;
        }
        let existing_slot = holder_entity.slot_of(item);
        let Some(slot) = existing_slot.or_else(|| holder_entity.first_free_slot()) else {
            return false;
        };

        if existing_slot.is_none() {
            if let Some(previous) = item_owner {
                self.detach(previous, item);
            }
            if let Some(holder_entity) = self.find_entity_mut(holder) {
                holder_entity.inventory[slot] = Some(item);
            }
            if let Some(item_entity) = self.find_entity_mut(item) {
                item_entity.owner = Some(holder);
                item_entity.velocity = Vec2::ZERO;
            }
            debug!(holder = holder.0, item = item.0, slot, "item_grabbed");
        }
        if make_active {
            if let Some(holder_entity) = self.find_entity_mut(holder) {
                holder_entity.inventory_active_index = slot;
            }
        }
        true
    }

    /// Drops `item`, or the active item when `None`, at the holder's inventory
    /// point with an outward push. Returns false when nothing was dropped.
    pub fn drop_item(&mut self, holder: EntityId, item: Option<EntityId>) -> bool {
        let Some(holder_entity) = self.find_entity(holder) else {
            return false;
        };
        let Some(item) = item.or_else(|| holder_entity.active_item()) else {
            return false;
        };
        let Some(slot) = holder_entity.slot_of(item) else {
            return false;
        };
        let drop_at = self
            .entity_def(holder_entity)
            .map(|def| holder_entity.inventory_point(def).position)
            .unwrap_or(holder_entity.position);
        let impulse = Vec2::from_angle(holder_entity.angle) * DROP_IMPULSE;

        if let Some(holder_entity) = self.find_entity_mut(holder) {
            holder_entity.inventory[slot] = None;
        }
        if let Some(item_entity) = self.find_entity_mut(item) {
            item_entity.owner = None;
            item_entity.position = drop_at;
            item_entity.velocity = impulse;
        }
        debug!(holder = holder.0, item = item.0, slot, "item_dropped");
        true
    }

    /// Out-of-range indices are ignored.
    pub fn select_slot(&mut self, holder: EntityId, index: usize) -> bool {
        match self.find_entity_mut(holder) {
            Some(entity) if index < entity.inventory.len() => {
                entity.inventory_active_index = index;
                true
            }
            _ => false,
        }
    }

    /// Nearest unowned, placed, item-bearing entity within `radius` of `point`.
    pub fn nearest_loose_item(
        &self,
        point: Vec2,
        radius: f32,
        exclude: EntityId,
    ) -> Option<EntityId> {
        self.nearest_where(point, radius, |entity| {
            entity.id != exclude
                && self
                    .entity_def(entity)
                    .is_some_and(|def| def.is_item())
        })
    }

    /// Nearest unowned, placed, movable body within `radius` of `point`,
    /// skipping `exclude`. Loose items and immovable scenery never qualify;
    /// effects still check the target's kind themselves.
    pub fn nearest_use_target(
        &self,
        point: Vec2,
        radius: f32,
        exclude: &[EntityId],
    ) -> Option<EntityId> {
        self.nearest_where(point, radius, |entity| {
            !exclude.contains(&entity.id)
                && self
                    .entity_def(entity)
                    .is_some_and(|def| !def.is_item() && def.mass().is_some())
        })
    }

    fn nearest_where(
        &self,
        point: Vec2,
        radius: f32,
        accept: impl Fn(&Entity) -> bool,
    ) -> Option<EntityId> {
        let radius_sq = radius * radius;
        self.entities
            .iter()
            .filter(|entity| entity.owner.is_none() && entity.position.is_finite())
            .map(|entity| (entity, entity.position.distance_squared(point)))
            .filter(|(entity, distance_sq)| *distance_sq <= radius_sq && accept(entity))
            .min_by(|(_, left), (_, right)| left.total_cmp(right))
            .map(|(entity, _)| entity.id)
    }

    /// Picks up the nearest loose item in reach of the holder's inventory
    /// point and makes it active.
    pub fn pick_up_nearest(&mut self, holder: EntityId) -> Option<EntityId> {
        let point = self.inventory_point(holder)?;
        let item = self.nearest_loose_item(point.position, PICKUP_RADIUS, holder)?;
        if !self.grab(holder, item, true) {
            return None;
        }
        info!(holder = holder.0, item = item.0, "item_picked_up");
        Some(item)
    }

    /// Runs the active item's use effect against the nearest target in reach.
    /// Returns false when the holder has no usable active item.
    pub fn use_active_item(&mut self, holder: EntityId) -> Result<bool, SimError> {
        let Some(item) = self.active_item(holder) else {
            return Ok(false);
        };
        let Some((item_kind, use_effect)) = self.find_entity(item).and_then(|entity| {
            let def = self.entity_def(entity)?;
            Some((entity.kind.clone(), def.use_effect?))
        }) else {
            return Ok(false);
        };
        let Some(point) = self.inventory_point(holder) else {
            return Ok(false);
        };
        let target = self.nearest_use_target(point.position, PICKUP_RADIUS, &[holder, item]);

        let mut context = UseContext::new(self, item, holder, target);
        use_effect(&mut context)?;
        info!(
            holder = holder.0,
            item = item.0,
            item_kind = %item_kind,
            target = ?target.map(|id| id.0),
            "item_used"
        );
        Ok(true)
    }

    /// Advances one fixed tick. A collision error aborts the tick before
    /// cleanup runs.
    pub fn update(&mut self) -> Result<(), SimError> {
        self.time += self.config.tick_seconds;
        let now = self.time;
        let tuning = self.config.tuning;
        for entity in &mut self.entities {
            entity.update(now, &tuning, &mut self.rng);
        }

        self.resolve_collisions()?;
        self.carry_held_items();
        self.cleanup();
        Ok(())
    }

    fn resolve_collisions(&mut self) -> Result<(), SimError> {
        let mut fixed = Vec::new();
        let mut dynamic = Vec::new();
        for (index, entity) in self.entities.iter().enumerate() {
            if entity.owner.is_some() || !entity.position.is_finite() {
                continue;
            }
            let Some(physics) = self.entity_def(entity).and_then(|def| def.physics) else {
                continue;
            };
            if physics.is_fixed() {
                fixed.push(index);
            } else {
                dynamic.push(index);
            }
        }

        for &fixed_index in &fixed {
            for &dynamic_index in &dynamic {
                self.collide_indices(fixed_index, dynamic_index)?;
            }
        }
        for &first in &dynamic {
            for &second in &dynamic {
                if self.entities[first].id > self.entities[second].id {
                    self.collide_indices(first, second)?;
                }
            }
        }
        Ok(())
    }

    fn collide_indices(&mut self, first: usize, second: usize) -> Result<(), SimError> {
        let (a, b) = pair_mut(&mut self.entities, first, second);
        let (Some(a_def), Some(b_def)) =
            (self.defs.entity_def(a.def_id), self.defs.entity_def(b.def_id))
        else {
            return Ok(());
        };
        collide_pair(
            Body {
                entity: a,
                def: a_def,
            },
            Body {
                entity: b,
                def: b_def,
            },
            &mut self.rng,
        )
        .inspect_err(|err| error!(error = %err, "collision_config_invalid"))
    }

    fn carry_held_items(&mut self) {
        for index in 0..self.entities.len() {
            let Some(owner) = self.entities[index].owner else {
                continue;
            };
            let Some(position) = self.find_entity(owner).map(|holder| holder.position) else {
                continue;
            };
            let item = &mut self.entities[index];
            item.position = position;
            item.velocity = Vec2::ZERO;
        }
    }

    fn detach(&mut self, holder: EntityId, item: EntityId) {
        if let Some(holder_entity) = self.find_entity_mut(holder) {
            if let Some(slot) = holder_entity.slot_of(item) {
                holder_entity.inventory[slot] = None;
            }
        }
        if let Some(item_entity) = self.find_entity_mut(item) {
            item_entity.owner = None;
        }
    }

    fn cleanup(&mut self) {
        let doomed = self
            .entities
            .iter()
            .filter(|entity| entity.incoming_destruction)
            .map(|entity| entity.id)
            .collect::<Vec<_>>();
        if doomed.is_empty() {
            return;
        }

        for id in doomed {
            let (held, owner) = match self.find_entity(id) {
                Some(entity) => (
                    entity.inventory.iter().flatten().copied().collect::<Vec<_>>(),
                    entity.owner,
                ),
                None => continue,
            };
            for item in held {
                self.drop_item(id, Some(item));
            }
            if let Some(owner) = owner {
                self.detach(owner, id);
            }
            debug!(entity_id = id.0, "entity_destroyed");
        }
        self.entities.retain(|entity| !entity.incoming_destruction);
    }

    pub fn snapshot(&self) -> WorldSnapshot {
        WorldSnapshot {
            time: self.time,
            entities: self
                .entities
                .iter()
                .map(|entity| EntitySnapshot {
                    id: entity.id,
                    kind: entity.kind.clone(),
                    position: entity.position,
                    angle: entity.angle,
                    health: entity.health,
                    owner: entity.owner,
                    inventory: entity.inventory.clone(),
                    inventory_active_index: entity.inventory_active_index,
                    effects: entity
                        .effects
                        .active(self.time)
                        .into_iter()
                        .map(EffectId::name)
                        .collect(),
                })
                .collect(),
        }
    }
}

fn pair_mut<T>(items: &mut [T], first: usize, second: usize) -> (&mut T, &mut T) {
    if first < second {
        let (head, tail) = items.split_at_mut(second);
        (&mut head[first], &mut tail[0])
    } else {
        let (head, tail) = items.split_at_mut(first);
        (&mut tail[0], &mut head[second])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{EntityDef, InventoryAnchor, PhysicsDef, Shape};

    fn poke(context: &mut UseContext<'_>) -> Result<(), SimError> {
        if context.target_is("dummy") {
            context.damage_target(0.5);
            context.redefine_item("used_poker")?;
        }
        Ok(())
    }

    fn test_defs() -> DefDatabase {
        DefDatabase::from_entity_defs(vec![
            EntityDef::new("holder")
                .with_physics(PhysicsDef::dynamic(Shape::Circle, 50.0))
                .with_size(56.0)
                .with_inventory(2, InventoryAnchor::new(30.0, 0.0, 0.0)),
            EntityDef::new("dummy")
                .with_physics(PhysicsDef::dynamic(Shape::Circle, 50.0))
                .with_size(56.0),
            EntityDef::new("wall").with_physics(PhysicsDef::fixed(Shape::Rect)),
            EntityDef::new("crate").with_physics(PhysicsDef::dynamic(Shape::Rect, 10.0)),
            EntityDef::new("pebble").with_item("Pebble"),
            EntityDef::new("poker").with_item("Poker").with_use_effect(poke),
            EntityDef::new("used_poker").with_item("Used Poker"),
        ])
        .expect("defs")
    }

    fn world() -> World {
        World::new(test_defs(), WorldConfig::default())
    }

    fn assert_vec2_close(actual: Vec2, expected: Vec2) {
        assert!(
            actual.distance_squared(expected) < 0.0001,
            "expected {expected:?}, got {actual:?}"
        );
    }

    #[test]
    fn spawn_rejects_unknown_kind() {
        let mut world = world();
        let err = world
            .spawn("dragon", SpawnOptions::default())
            .expect_err("unknown");
        assert_eq!(
            err,
            SimError::UnknownKind {
                kind: "dragon".to_string()
            }
        );
    }

    #[test]
    fn ids_are_not_reused_after_removal() {
        let mut world = world();
        let first = world.spawn("pebble", SpawnOptions::at(0.0, 0.0)).expect("spawn");
        world.destroy(first);
        world.update().expect("update");
        let second = world.spawn("pebble", SpawnOptions::at(0.0, 0.0)).expect("spawn");
        assert!(second > first);
        assert!(world.find_entity(first).is_none());
    }

    #[test]
    fn grab_then_drop_lands_item_at_inventory_point() {
        let mut world = world();
        let holder = world
            .spawn("holder", SpawnOptions::at(100.0, 100.0).with_angle(0.5))
            .expect("holder");
        let pebble = world.spawn("pebble", SpawnOptions::default()).expect("pebble");

        assert!(world.grab(holder, pebble, true));
        assert_eq!(world.find_entity(pebble).expect("pebble").owner, Some(holder));
        assert_eq!(world.active_item(holder), Some(pebble));

        let expected = world.inventory_point(holder).expect("point").position;
        assert!(world.drop_item(holder, None));

        let item = world.find_entity(pebble).expect("pebble");
        assert_eq!(item.owner, None);
        assert_eq!(item.position, expected);
        assert_vec2_close(item.velocity, Vec2::from_angle(0.5) * DROP_IMPULSE);
        assert!(world
            .find_entity(holder)
            .expect("holder")
            .inventory
            .iter()
            .all(Option::is_none));
    }

    #[test]
    fn grab_without_free_slot_is_a_no_op() {
        let mut world = world();
        let holder = world.spawn("holder", SpawnOptions::at(0.0, 0.0)).expect("holder");
        let items = (0..3)
            .map(|_| world.spawn("pebble", SpawnOptions::default()).expect("pebble"))
            .collect::<Vec<_>>();

        assert!(world.grab(holder, items[0], false));
        assert!(world.grab(holder, items[1], false));
        assert!(!world.grab(holder, items[2], false));
        assert_eq!(world.find_entity(items[2]).expect("pebble").owner, None);
    }

    #[test]
    fn grab_moves_item_between_holders() {
        let mut world = world();
        let first = world.spawn("holder", SpawnOptions::at(0.0, 0.0)).expect("first");
        let second = world.spawn("holder", SpawnOptions::at(200.0, 0.0)).expect("second");
        let pebble = world.spawn("pebble", SpawnOptions::default()).expect("pebble");

        world.grab(first, pebble, false);
        assert!(world.grab(second, pebble, false));

        assert_eq!(world.find_entity(pebble).expect("pebble").owner, Some(second));
        assert_eq!(world.find_entity(first).expect("first").slot_of(pebble), None);
        assert_eq!(world.find_entity(second).expect("second").slot_of(pebble), Some(0));
    }

    #[test]
    fn drop_of_unheld_item_is_a_no_op() {
        let mut world = world();
        let holder = world.spawn("holder", SpawnOptions::at(0.0, 0.0)).expect("holder");
        let pebble = world.spawn("pebble", SpawnOptions::at(5.0, 5.0)).expect("pebble");

        assert!(!world.drop_item(holder, Some(pebble)));
        assert!(!world.drop_item(holder, None));
        assert_eq!(
            world.find_entity(pebble).expect("pebble").position,
            Vec2::new(5.0, 5.0)
        );
    }

    #[test]
    fn select_slot_ignores_out_of_range() {
        let mut world = world();
        let holder = world.spawn("holder", SpawnOptions::at(0.0, 0.0)).expect("holder");
        assert!(world.select_slot(holder, 1));
        assert!(!world.select_slot(holder, 2));
        assert_eq!(
            world.find_entity(holder).expect("holder").inventory_active_index,
            1
        );
    }

    #[test]
    fn destroying_holder_releases_everything_it_carried() {
        let mut world = world();
        let holder = world.spawn("holder", SpawnOptions::at(0.0, 0.0)).expect("holder");
        let a = world.spawn("pebble", SpawnOptions::default()).expect("a");
        let b = world.spawn("pebble", SpawnOptions::default()).expect("b");
        world.grab(holder, a, false);
        world.grab(holder, b, false);

        world.destroy(holder);
        world.update().expect("update");

        assert!(world.find_entity(holder).is_none());
        for item in [a, b] {
            let entity = world.find_entity(item).expect("item survives");
            assert_eq!(entity.owner, None);
            assert!(entity.position.is_finite());
        }
    }

    #[test]
    fn destroyed_held_item_is_detached_from_holder() {
        let mut world = world();
        let holder = world.spawn("holder", SpawnOptions::at(0.0, 0.0)).expect("holder");
        let pebble = world.spawn("pebble", SpawnOptions::default()).expect("pebble");
        world.grab(holder, pebble, true);

        world.destroy(pebble);
        world.update().expect("update");

        assert!(world.find_entity(pebble).is_none());
        assert_eq!(world.active_item(holder), None);
    }

    #[test]
    fn update_never_moves_fixed_bodies() {
        let mut world = world();
        let wall = world
            .spawn("wall", SpawnOptions::at(0.0, 0.0).with_rect(200.0, 20.0))
            .expect("wall");
        let body = world.spawn("dummy", SpawnOptions::at(0.0, 20.0)).expect("dummy");

        world.update().expect("update");

        assert_eq!(
            world.find_entity(wall).expect("wall").position,
            Vec2::new(0.0, 0.0)
        );
        assert!(world.find_entity(body).expect("dummy").position.y >= 38.0 - 0.001);
    }

    #[test]
    fn massed_rect_aborts_the_tick() {
        let mut world = world();
        world
            .spawn("crate", SpawnOptions::at(0.0, 0.0).with_rect(20.0, 20.0))
            .expect("crate");
        world.spawn("dummy", SpawnOptions::at(5.0, 0.0)).expect("dummy");

        assert!(matches!(
            world.update(),
            Err(SimError::UnsupportedCollision { .. })
        ));
    }

    #[test]
    fn held_items_skip_collision_and_follow_holder() {
        let mut world = world();
        let holder = world.spawn("holder", SpawnOptions::at(0.0, 0.0)).expect("holder");
        let other = world.spawn("holder", SpawnOptions::default()).expect("other");
        world.grab(holder, other, false);

        world.update().expect("update");

        let holder_position = world.find_entity(holder).expect("holder").position;
        assert_eq!(holder_position, Vec2::new(0.0, 0.0));
        assert_eq!(world.find_entity(other).expect("other").position, holder_position);
    }

    #[test]
    fn health_stays_in_unit_range() {
        let mut world = world();
        let dummy = world.spawn("dummy", SpawnOptions::at(0.0, 0.0)).expect("dummy");
        for damage in [0.3, 5.0, -9.0, 0.25] {
            world.find_entity_mut(dummy).expect("dummy").incoming_damage += damage;
            world.update().expect("update");
            let health = world.find_entity(dummy).expect("dummy").health;
            assert!((0.0..=1.0).contains(&health));
        }
    }

    #[test]
    fn effects_follow_the_simulation_clock() {
        let mut world = World::new(
            test_defs(),
            WorldConfig {
                tick_seconds: 1.0,
                ..WorldConfig::default()
            },
        );
        let dummy = world.spawn("dummy", SpawnOptions::at(0.0, 0.0)).expect("dummy");
        world.add_effect(dummy, EFFECT_UNCONSCIOUS, 2.0);

        world.update().expect("update");
        assert!(world.has_effect(dummy, EFFECT_UNCONSCIOUS));
        world.update().expect("update");
        assert!(!world.has_effect(dummy, EFFECT_UNCONSCIOUS));
    }

    #[test]
    fn pick_up_takes_nearest_loose_item() {
        let mut world = world();
        let holder = world.spawn("holder", SpawnOptions::at(0.0, 0.0)).expect("holder");
        let far = world.spawn("pebble", SpawnOptions::at(60.0, 0.0)).expect("far");
        let near = world.spawn("pebble", SpawnOptions::at(35.0, 0.0)).expect("near");
        world.spawn("pebble", SpawnOptions::at(500.0, 0.0)).expect("out of reach");

        assert_eq!(world.pick_up_nearest(holder), Some(near));
        assert_eq!(world.active_item(holder), Some(near));
        assert_eq!(world.pick_up_nearest(holder), Some(far));
        assert_eq!(world.pick_up_nearest(holder), None);
    }

    #[test]
    fn use_runs_effect_against_nearest_target() {
        let mut world = world();
        let holder = world.spawn("holder", SpawnOptions::at(0.0, 0.0)).expect("holder");
        let dummy = world.spawn("dummy", SpawnOptions::at(60.0, 0.0)).expect("dummy");
        let poker = world.spawn("poker", SpawnOptions::default()).expect("poker");
        world.grab(holder, poker, true);

        assert!(world.use_active_item(holder).expect("use"));
        assert_eq!(world.find_entity(poker).expect("poker").kind, "used_poker");
        assert_eq!(world.find_entity(dummy).expect("dummy").incoming_damage, 0.5);

        assert!(!world.use_active_item(holder).expect("no handler"));
    }

    #[test]
    fn use_target_skips_loose_items_and_scenery() {
        let mut world = world();
        let holder = world.spawn("holder", SpawnOptions::at(0.0, 0.0)).expect("holder");
        let dummy = world.spawn("dummy", SpawnOptions::at(60.0, 0.0)).expect("dummy");
        world.spawn("pebble", SpawnOptions::at(32.0, 0.0)).expect("pebble");
        world
            .spawn("wall", SpawnOptions::at(30.0, 10.0).with_rect(4.0, 4.0))
            .expect("wall");
        let poker = world.spawn("poker", SpawnOptions::default()).expect("poker");
        world.grab(holder, poker, true);

        let hand = world.inventory_point(holder).expect("hand").position;
        assert_eq!(
            world.nearest_use_target(hand, PICKUP_RADIUS, &[holder, poker]),
            Some(dummy)
        );
        assert!(world.use_active_item(holder).expect("use"));
        assert_eq!(world.find_entity(dummy).expect("dummy").incoming_damage, 0.5);
    }

    #[test]
    fn use_without_target_leaves_item_unchanged() {
        let mut world = world();
        let holder = world.spawn("holder", SpawnOptions::at(0.0, 0.0)).expect("holder");
        let poker = world.spawn("poker", SpawnOptions::default()).expect("poker");
        world.grab(holder, poker, true);

        assert!(world.use_active_item(holder).expect("use"));
        assert_eq!(world.find_entity(poker).expect("poker").kind, "poker");
    }

    #[test]
    fn same_seed_replays_coincident_separation() {
        let run = || {
            let mut world = world();
            world.spawn("dummy", SpawnOptions::at(0.0, 0.0)).expect("a");
            world.spawn("dummy", SpawnOptions::at(0.0, 0.0)).expect("b");
            world.update().expect("update");
            world.snapshot()
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn snapshot_serializes_active_effects_and_ownership() {
        let mut world = world();
        let holder = world.spawn("holder", SpawnOptions::at(0.0, 0.0)).expect("holder");
        let pebble = world.spawn("pebble", SpawnOptions::default()).expect("pebble");
        world.grab(holder, pebble, false);
        world.add_effect(holder, EFFECT_BOUND, EFFECT_PERMANENT);

        let snapshot = world.snapshot();
        assert_eq!(snapshot.entity(pebble).expect("pebble").owner, Some(holder));
        assert_eq!(snapshot.entity(holder).expect("holder").effects, vec!["bound"]);

        let json = snapshot.to_json_pretty().expect("json");
        assert!(json.contains("\"bound\""));
        assert!(json.contains("\"holder\""));
    }
}
