pub mod app;
pub mod content;
pub mod math;
pub mod world;

pub use app::{
    run_app, screen_to_world, world_to_screen, AppError, Camera2D,
    InputAction, InputSnapshot, LoopConfig, LoopMetricsSnapshot, Renderer, Scene, SceneCommand,
    Viewport, SLOT_KEY_COUNT, SLOW_FRAME_ENV_VAR,
};
pub use content::{
    ContentError, DefDatabase, EntityDef, EntityDefId, InventoryAnchor, PhysicsDef, RenderLayer,
    Shape, UseEffectFn,
};
pub use math::Vec2;
pub use world::{
    Control, Controller, EffectId, Entity, EntityId, EntitySnapshot, InventoryPoint,
    MotionTuning, SimError, SpawnOptions, UseContext, WaypointController, World, WorldConfig,
    WorldSnapshot, DEFAULT_WORLD_SEED, EFFECT_BOUND, EFFECT_PERMANENT, EFFECT_UNCONSCIOUS,
    PICKUP_RADIUS,
};
