use serde::Serialize;

use super::controller::Controller;
use super::effects::{EffectId, EffectSet, EFFECT_BOUND, EFFECT_UNCONSCIOUS};
use super::{MotionTuning, SimRng};
use crate::content::{EntityDef, EntityDefId};
use crate::math::Vec2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct EntityId(pub u64);

#[derive(Debug, Default)]
pub struct EntityIdAllocator {
    next: u64,
}

impl EntityIdAllocator {
    pub fn allocate(&mut self) -> EntityId {
        let id = EntityId(self.next);
        self.next = self.next.saturating_add(1);
        id
    }
}

/// Per-tick intent. Set by input for the player and by a [`Controller`]
/// for AI entities.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Control {
    pub move_intent: Vec2,
    pub aim: Vec2,
}

/// Overrides applied by [`super::World::spawn`] and, for the size fields,
/// by [`super::World::redefine`].
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SpawnOptions {
    pub position: Option<Vec2>,
    pub angle: Option<f32>,
    pub size: Option<f32>,
    pub width: Option<f32>,
    pub height: Option<f32>,
}

impl SpawnOptions {
    pub fn at(x: f32, y: f32) -> Self {
        Self {
            position: Some(Vec2::new(x, y)),
            ..Self::default()
        }
    }

    pub fn with_angle(mut self, angle: f32) -> Self {
        self.angle = Some(angle);
        self
    }

    pub fn with_size(mut self, size: f32) -> Self {
        self.size = Some(size);
        self
    }

    pub fn with_rect(mut self, width: f32, height: f32) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InventoryPoint {
    pub position: Vec2,
    pub angle: f32,
}

#[derive(Debug)]
pub struct Entity {
    pub id: EntityId,
    pub def_id: EntityDefId,
    pub kind: String,
    /// `NaN` until placed.
    pub position: Vec2,
    pub velocity: Vec2,
    pub angle: f32,
    /// Circle diameter or rect width after overrides.
    pub size: f32,
    pub height: f32,
    pub health: f32,
    pub incoming_damage: f32,
    pub incoming_destruction: bool,
    pub control: Control,
    pub controller: Option<Box<dyn Controller>>,
    pub effects: EffectSet,
    pub owner: Option<EntityId>,
    pub inventory: Vec<Option<EntityId>>,
    pub inventory_active_index: usize,
}

impl Entity {
    pub(crate) fn new(id: EntityId, def: &EntityDef, options: &SpawnOptions) -> Self {
        let mut entity = Self {
            id,
            def_id: def.id,
            kind: def.def_name.clone(),
            position: options.position.unwrap_or(Vec2::NAN),
            velocity: Vec2::ZERO,
            angle: options.angle.unwrap_or(0.0),
            size: 0.0,
            height: 0.0,
            health: 1.0,
            incoming_damage: 0.0,
            incoming_destruction: false,
            control: Control::default(),
            controller: None,
            effects: EffectSet::default(),
            owner: None,
            inventory: Vec::new(),
            inventory_active_index: 0,
        };
        entity.define(def, options);
        entity
    }

    /// Rebinds the definition. Position and angle are construction-only, so an
    /// item changing state keeps its place in the world and in its holder.
    /// Returns items that no longer fit in a smaller inventory.
    pub(crate) fn define(&mut self, def: &EntityDef, options: &SpawnOptions) -> Vec<EntityId> {
        self.def_id = def.id;
        self.kind.clone_from(&def.def_name);
        self.size = options.width.or(options.size).unwrap_or(def.size);
        self.height = options.height.unwrap_or(def.height);

        let mut released = Vec::new();
        if def.inventory_size < self.inventory.len() {
            released.extend(self.inventory.drain(def.inventory_size..).flatten());
        } else {
            self.inventory.resize(def.inventory_size, None);
        }
        if self.inventory_active_index >= self.inventory.len() {
            self.inventory_active_index = 0;
        }
        released
    }

    pub fn radius(&self) -> f32 {
        self.size * 0.5
    }

    pub fn is_alive(&self) -> bool {
        self.health > 0.0
    }

    pub fn has_effect(&self, effect: EffectId, now: f64) -> bool {
        self.effects.has(effect, now)
    }

    pub fn add_effect(&mut self, effect: EffectId, duration_seconds: f64, now: f64) {
        self.effects.add(effect, duration_seconds, now);
    }

    pub fn destroy(&mut self) {
        self.incoming_destruction = true;
    }

    pub fn active_item(&self) -> Option<EntityId> {
        self.inventory
            .get(self.inventory_active_index)
            .copied()
            .flatten()
    }

    pub fn slot_of(&self, item: EntityId) -> Option<usize> {
        self.inventory.iter().position(|slot| *slot == Some(item))
    }

    pub fn first_free_slot(&self) -> Option<usize> {
        self.inventory.iter().position(Option::is_none)
    }

    pub fn inventory_point(&self, def: &EntityDef) -> InventoryPoint {
        let anchor = def.inventory_anchor;
        InventoryPoint {
            position: self.position + anchor.offset.rotated(self.angle),
            angle: self.angle + anchor.angle,
        }
    }

    pub(crate) fn update(&mut self, now: f64, tuning: &MotionTuning, rng: &mut SimRng) {
        self.health = (self.health - self.incoming_damage).clamp(0.0, 1.0);
        self.incoming_damage = 0.0;

        if !self.has_effect(EFFECT_UNCONSCIOUS, now) && self.is_alive() {
            if let Some(controller) = self.controller.as_mut() {
                self.control = controller.process(self.position, rng);
            }
            if !self.has_effect(EFFECT_BOUND, now) {
                let intent = self.control.move_intent;
                let normalized = intent * (1.0 / intent.length().max(1.0));
                self.velocity += normalized * tuning.acceleration;
                if !self.control.aim.is_zero() {
                    self.angle = self.control.aim.angle();
                }
            }
        }

        self.position += self.velocity * tuning.integration;
        self.velocity = self.velocity * tuning.drag;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{InventoryAnchor, PhysicsDef, Shape};
    use rand::SeedableRng;

    fn character_def() -> EntityDef {
        EntityDef::new("player")
            .with_physics(PhysicsDef::dynamic(Shape::Circle, 50.0))
            .with_size(56.0)
            .with_inventory(3, InventoryAnchor::new(30.0, 22.0, 0.0))
    }

    fn rng() -> SimRng {
        SimRng::seed_from_u64(7)
    }

    #[test]
    fn allocator_ids_never_repeat() {
        let mut allocator = EntityIdAllocator::default();
        let first = allocator.allocate();
        let second = allocator.allocate();
        assert_eq!(first, EntityId(0));
        assert_eq!(second, EntityId(1));
    }

    #[test]
    fn unplaced_entity_has_nan_position() {
        let entity = Entity::new(EntityId(0), &character_def(), &SpawnOptions::default());
        assert!(!entity.position.is_finite());
        assert_eq!(entity.inventory.len(), 3);
        assert_eq!(entity.size, 56.0);
    }

    #[test]
    fn explicit_width_overrides_definition_size() {
        let def = EntityDef::new("wall").with_physics(PhysicsDef::fixed(Shape::Rect));
        let entity = Entity::new(
            EntityId(0),
            &def,
            &SpawnOptions::at(0.0, 0.0).with_rect(400.0, 20.0),
        );
        assert_eq!(entity.size, 400.0);
        assert_eq!(entity.height, 20.0);
    }

    #[test]
    fn redefine_keeps_position_and_angle() {
        let syringe = EntityDef::new("syringe_m99").with_item("Syringe of M99");
        let used = EntityDef::new("syringe").with_item("Syringe");
        let mut entity = Entity::new(
            EntityId(4),
            &syringe,
            &SpawnOptions::at(10.0, 20.0).with_angle(1.0),
        );
        entity.define(&used, &SpawnOptions::at(99.0, 99.0).with_angle(3.0));

        assert_eq!(entity.kind, "syringe");
        assert_eq!(entity.position, Vec2::new(10.0, 20.0));
        assert_eq!(entity.angle, 1.0);
    }

    #[test]
    fn shrinking_inventory_releases_overflow() {
        let mut entity = Entity::new(EntityId(0), &character_def(), &SpawnOptions::default());
        entity.inventory[2] = Some(EntityId(9));
        let smaller = character_def().with_inventory(1, InventoryAnchor::default());
        let released = entity.define(&smaller, &SpawnOptions::default());
        assert_eq!(released, vec![EntityId(9)]);
        assert_eq!(entity.inventory.len(), 1);
    }

    #[test]
    fn diagonal_intent_is_normalized_before_acceleration() {
        let tuning = MotionTuning::default();
        let mut entity = Entity::new(EntityId(0), &character_def(), &SpawnOptions::at(0.0, 0.0));
        entity.control.move_intent = Vec2::new(1.0, 1.0);
        entity.update(0.0, &tuning, &mut rng());

        let expected = tuning.acceleration * std::f32::consts::FRAC_1_SQRT_2 * tuning.drag;
        assert!((entity.velocity.x - expected).abs() < 0.0001);
        assert!((entity.velocity.y - expected).abs() < 0.0001);
    }

    #[test]
    fn damage_is_clamped_and_reset_every_tick() {
        let mut entity = Entity::new(EntityId(0), &character_def(), &SpawnOptions::at(0.0, 0.0));
        entity.incoming_damage = 3.5;
        entity.update(0.0, &MotionTuning::default(), &mut rng());
        assert_eq!(entity.health, 0.0);
        assert_eq!(entity.incoming_damage, 0.0);

        entity.incoming_damage = -4.0;
        entity.update(0.0, &MotionTuning::default(), &mut rng());
        assert_eq!(entity.health, 1.0);
    }

    #[test]
    fn unconscious_entity_ignores_intent_but_keeps_drifting() {
        let tuning = MotionTuning::default();
        let mut entity = Entity::new(EntityId(0), &character_def(), &SpawnOptions::at(0.0, 0.0));
        entity.add_effect(EFFECT_UNCONSCIOUS, 300.0, 0.0);
        entity.velocity = Vec2::new(4.0, 0.0);
        entity.control = Control {
            move_intent: Vec2::new(0.0, 1.0),
            aim: Vec2::new(0.0, 1.0),
        };
        entity.update(1.0, &tuning, &mut rng());

        assert_eq!(entity.position, Vec2::new(4.0 * tuning.integration, 0.0));
        assert_eq!(entity.velocity, Vec2::new(4.0 * tuning.drag, 0.0));
        assert_eq!(entity.angle, 0.0);
    }

    #[test]
    fn bound_entity_cannot_move_or_turn() {
        let mut entity = Entity::new(EntityId(0), &character_def(), &SpawnOptions::at(5.0, 5.0));
        entity.add_effect(EFFECT_BOUND, f64::INFINITY, 0.0);
        entity.control = Control {
            move_intent: Vec2::new(1.0, 0.0),
            aim: Vec2::new(0.0, -1.0),
        };
        entity.update(1.0, &MotionTuning::default(), &mut rng());
        assert_eq!(entity.position, Vec2::new(5.0, 5.0));
        assert_eq!(entity.angle, 0.0);
    }

    #[test]
    fn inventory_point_rotates_with_entity() {
        let def = character_def();
        let entity = Entity::new(
            EntityId(0),
            &def,
            &SpawnOptions::at(100.0, 100.0).with_angle(std::f32::consts::FRAC_PI_2),
        );
        let point = entity.inventory_point(&def);
        assert!((point.position.x - 78.0).abs() < 0.001);
        assert!((point.position.y - 130.0).abs() < 0.001);
        assert!((point.angle - std::f32::consts::FRAC_PI_2).abs() < 0.0001);
    }
}
