use std::collections::HashMap;
use std::fmt;

use super::types::{ContentError, InventoryAnchor, PhysicsDef, RenderLayer, UseEffectFn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntityDefId(pub u32);

/// Immutable per-kind template. Every entity of a kind reads the same record;
/// redefining an entity only swaps which record it points at.
#[derive(Clone)]
pub struct EntityDef {
    pub id: EntityDefId,
    pub def_name: String,
    pub physics: Option<PhysicsDef>,
    /// Circle diameter or rect width.
    pub size: f32,
    /// Rect height. Unused for circles.
    pub height: f32,
    pub inventory_size: usize,
    pub inventory_anchor: InventoryAnchor,
    /// Display name. Only kinds with an item name can be picked up.
    pub item: Option<String>,
    pub use_effect: Option<UseEffectFn>,
    pub render_layer: RenderLayer,
    pub color: [u8; 4],
}

impl EntityDef {
    pub fn new(def_name: impl Into<String>) -> Self {
        Self {
            id: EntityDefId(0),
            def_name: def_name.into(),
            physics: None,
            size: 0.0,
            height: 0.0,
            inventory_size: 0,
            inventory_anchor: InventoryAnchor::default(),
            item: None,
            use_effect: None,
            render_layer: RenderLayer::default(),
            color: [200, 200, 200, 255],
        }
    }

    pub fn with_physics(mut self, physics: PhysicsDef) -> Self {
        self.physics = Some(physics);
        self
    }

    pub fn with_size(mut self, size: f32) -> Self {
        self.size = size;
        self
    }

    pub fn with_rect_size(mut self, width: f32, height: f32) -> Self {
        self.size = width;
        self.height = height;
        self
    }

    pub fn with_inventory(mut self, inventory_size: usize, anchor: InventoryAnchor) -> Self {
        self.inventory_size = inventory_size;
        self.inventory_anchor = anchor;
        self
    }

    pub fn with_item(mut self, display_name: impl Into<String>) -> Self {
        self.item = Some(display_name.into());
        self
    }

    pub fn with_use_effect(mut self, use_effect: UseEffectFn) -> Self {
        self.use_effect = Some(use_effect);
        self
    }

    pub fn with_render_layer(mut self, render_layer: RenderLayer) -> Self {
        self.render_layer = render_layer;
        self
    }

    pub fn with_color(mut self, color: [u8; 4]) -> Self {
        self.color = color;
        self
    }

    pub fn is_item(&self) -> bool {
        self.item.is_some()
    }

    pub fn mass(&self) -> Option<f32> {
        self.physics.and_then(|physics| physics.mass)
    }

    fn validate(&self) -> Result<(), ContentError> {
        if self.def_name.trim().is_empty() {
            return Err(ContentError::EmptyDefName);
        }
        if let Some(mass) = self.mass() {
            if !mass.is_finite() || mass <= 0.0 {
                return Err(ContentError::InvalidMass {
                    def_name: self.def_name.clone(),
                    mass,
                });
            }
        }
        for (field, value) in [("size", self.size), ("height", self.height)] {
            if !value.is_finite() || value < 0.0 {
                return Err(ContentError::InvalidDimension {
                    def_name: self.def_name.clone(),
                    field,
                    value,
                });
            }
        }
        Ok(())
    }
}

impl fmt::Debug for EntityDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityDef")
            .field("id", &self.id)
            .field("def_name", &self.def_name)
            .field("physics", &self.physics)
            .field("size", &self.size)
            .field("height", &self.height)
            .field("inventory_size", &self.inventory_size)
            .field("item", &self.item)
            .field("has_use_effect", &self.use_effect.is_some())
            .field("render_layer", &self.render_layer)
            .finish()
    }
}

#[derive(Debug, Default, Clone)]
pub struct DefDatabase {
    entity_defs: Vec<EntityDef>,
    entity_ids_by_name: HashMap<String, EntityDefId>,
}

impl DefDatabase {
    pub fn from_entity_defs(mut entity_defs: Vec<EntityDef>) -> Result<Self, ContentError> {
        let mut entity_ids_by_name = HashMap::with_capacity(entity_defs.len());
        for (idx, def) in entity_defs.iter_mut().enumerate() {
            def.validate()?;
            let id = EntityDefId(idx as u32);
            def.id = id;
            if entity_ids_by_name
                .insert(def.def_name.clone(), id)
                .is_some()
            {
                return Err(ContentError::DuplicateDef {
                    def_name: def.def_name.clone(),
                });
            }
        }
        Ok(Self {
            entity_defs,
            entity_ids_by_name,
        })
    }

    pub fn entity_def_id_by_name(&self, name: &str) -> Option<EntityDefId> {
        self.entity_ids_by_name.get(name).copied()
    }

    pub fn entity_def(&self, id: EntityDefId) -> Option<&EntityDef> {
        self.entity_defs.get(id.0 as usize)
    }

    pub fn entity_def_by_name(&self, name: &str) -> Option<&EntityDef> {
        self.entity_def_id_by_name(name)
            .and_then(|id| self.entity_def(id))
    }

    pub fn entity_defs(&self) -> &[EntityDef] {
        &self.entity_defs
    }
}
