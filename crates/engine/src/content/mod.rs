mod database;
mod types;

pub use database::{DefDatabase, EntityDef, EntityDefId};
pub use types::{ContentError, InventoryAnchor, PhysicsDef, RenderLayer, Shape, UseEffectFn};
