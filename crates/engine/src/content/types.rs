use serde::Serialize;
use thiserror::Error;

use crate::math::Vec2;
use crate::world::{SimError, UseContext};

/// Item behavior attached to a definition. Runs against the item's current
/// holder and the resolved target, and must leave no state outside the world.
/// Unmet preconditions return `Ok(())` without touching anything.
pub type UseEffectFn = fn(&mut UseContext<'_>) -> Result<(), SimError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Shape {
    Circle,
    Rect,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhysicsDef {
    pub shape: Shape,
    /// `None` marks an immovable body.
    pub mass: Option<f32>,
}

impl PhysicsDef {
    pub const fn fixed(shape: Shape) -> Self {
        Self { shape, mass: None }
    }

    pub const fn dynamic(shape: Shape, mass: f32) -> Self {
        Self {
            shape,
            mass: Some(mass),
        }
    }

    pub fn is_fixed(&self) -> bool {
        self.mass.is_none()
    }
}

/// Draw order, back to front.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum RenderLayer {
    #[default]
    Background,
    Furniture,
    Item,
    Character,
}

/// Local offset and angle of the "hand" that holds the active item.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct InventoryAnchor {
    pub offset: Vec2,
    pub angle: f32,
}

impl InventoryAnchor {
    pub const fn new(x: f32, y: f32, angle: f32) -> Self {
        Self {
            offset: Vec2::new(x, y),
            angle,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ContentError {
    #[error("entity def name cannot be empty")]
    EmptyDefName,
    #[error("duplicate entity def '{def_name}'; each kind may be registered only once")]
    DuplicateDef { def_name: String },
    #[error("entity def '{def_name}' has invalid mass {mass}; mass must be finite and positive")]
    InvalidMass { def_name: String, mass: f32 },
    #[error("entity def '{def_name}' has invalid {field} {value}; expected a finite value >= 0")]
    InvalidDimension {
        def_name: String,
        field: &'static str,
        value: f32,
    },
}
