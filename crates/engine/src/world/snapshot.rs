use serde::Serialize;

use super::entity::EntityId;
use crate::math::Vec2;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorldSnapshot {
    pub time: f64,
    pub entities: Vec<EntitySnapshot>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntitySnapshot {
    pub id: EntityId,
    pub kind: String,
    pub position: Vec2,
    pub angle: f32,
    pub health: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<EntityId>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub inventory: Vec<Option<EntityId>>,
    pub inventory_active_index: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub effects: Vec<&'static str>,
}

impl WorldSnapshot {
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn entity(&self, id: EntityId) -> Option<&EntitySnapshot> {
        self.entities.iter().find(|entity| entity.id == id)
    }
}
