//! The kind catalog. Every entity in a run is one of these definitions, and
//! item state changes (a syringe filling with blood) are swaps between them.

use engine::{
    ContentError, DefDatabase, EntityDef, InventoryAnchor, PhysicsDef, RenderLayer, Shape,
};

use super::effects;

pub(crate) const KIND_PLAYER: &str = "player";
pub(crate) const KIND_ENEMY: &str = "enemy";
pub(crate) const KIND_WALL: &str = "wall";
pub(crate) const KIND_COUCH: &str = "couch";
pub(crate) const KIND_TABLE: &str = "table";
pub(crate) const KIND_KNIFE: &str = "knife";
pub(crate) const KIND_SYRINGE: &str = "syringe";
pub(crate) const KIND_SYRINGE_M99: &str = "syringe_m99";
pub(crate) const KIND_SYRINGE_BLOOD: &str = "syringe_blood";
pub(crate) const KIND_SMELLING_SALT: &str = "smelling_salt";
pub(crate) const KIND_PLASTIC_WRAP: &str = "plastic_wrap";
pub(crate) const KIND_PLASTIC_BAG: &str = "plastic_bag";
pub(crate) const KIND_BODY_BAG: &str = "body_bag";
pub(crate) const KIND_SLIDE: &str = "slide";
pub(crate) const KIND_SLIDE_BLOOD: &str = "slide_blood";

const CHARACTER_MASS: f32 = 50.0;
const CHARACTER_SIZE: f32 = 56.0;
const ITEM_SIZE: f32 = 16.0;

pub(crate) fn build_def_database() -> Result<DefDatabase, ContentError> {
    DefDatabase::from_entity_defs(entity_defs())
}

fn entity_defs() -> Vec<EntityDef> {
    vec![
        character(KIND_PLAYER, 8, InventoryAnchor::new(30.0, 22.0, 0.0))
            .with_color([223, 151, 120, 255]),
        character(KIND_ENEMY, 2, InventoryAnchor::new(30.0, 18.0, 0.0))
            .with_color([239, 202, 184, 255]),
        EntityDef::new(KIND_WALL)
            .with_physics(PhysicsDef::fixed(Shape::Rect))
            .with_render_layer(RenderLayer::Background)
            .with_color([153, 153, 153, 255]),
        EntityDef::new(KIND_COUCH)
            .with_physics(PhysicsDef::fixed(Shape::Rect))
            .with_rect_size(50.0, 90.0)
            .with_render_layer(RenderLayer::Furniture)
            .with_color([118, 3, 13, 255]),
        EntityDef::new(KIND_TABLE)
            .with_physics(PhysicsDef::fixed(Shape::Circle))
            .with_size(90.0)
            .with_render_layer(RenderLayer::Furniture)
            .with_color([110, 51, 0, 255]),
        item(KIND_KNIFE, "Hunting Knife", [238, 238, 238, 255])
            .with_use_effect(effects::use_knife),
        item(KIND_SYRINGE_M99, "Syringe of M99", [153, 0, 153, 255])
            .with_use_effect(effects::use_sedative_syringe),
        item(KIND_SYRINGE, "Syringe", [221, 221, 221, 255])
            .with_use_effect(effects::use_empty_syringe),
        item(KIND_SYRINGE_BLOOD, "Syringe of Blood", [204, 0, 0, 255])
            .with_use_effect(effects::use_blood_syringe),
        item(KIND_SMELLING_SALT, "Smelling Salt", [255, 255, 255, 255])
            .with_use_effect(effects::use_smelling_salt),
        item(KIND_PLASTIC_WRAP, "Plastic Wrap", [221, 221, 221, 255])
            .with_use_effect(effects::use_plastic_wrap),
        item(KIND_PLASTIC_BAG, "Plastic Bag", [34, 34, 34, 255])
            .with_use_effect(effects::use_plastic_bag),
        item(KIND_BODY_BAG, "Filled Body Bag", [90, 20, 20, 255]),
        item(KIND_SLIDE, "Empty Blood Slide", [204, 204, 204, 255]),
        item(KIND_SLIDE_BLOOD, "Filled Blood Slide", [204, 0, 0, 255]),
    ]
}

fn character(kind: &str, inventory_size: usize, anchor: InventoryAnchor) -> EntityDef {
    EntityDef::new(kind)
        .with_physics(PhysicsDef::dynamic(Shape::Circle, CHARACTER_MASS))
        .with_size(CHARACTER_SIZE)
        .with_inventory(inventory_size, anchor)
        .with_render_layer(RenderLayer::Character)
}

fn item(kind: &str, display_name: &str, color: [u8; 4]) -> EntityDef {
    EntityDef::new(kind)
        .with_item(display_name)
        .with_size(ITEM_SIZE)
        .with_render_layer(RenderLayer::Item)
        .with_color(color)
}
