mod input;
mod loop_runner;
mod metrics;
mod rendering;
mod scene;

pub use input::{InputAction, SLOT_KEY_COUNT};
pub use loop_runner::{run_app, AppError, LoopConfig, SLOW_FRAME_ENV_VAR};
pub use metrics::LoopMetricsSnapshot;
pub use rendering::{screen_to_world, world_to_screen, Renderer, Viewport};
pub use scene::{Camera2D, InputSnapshot, Scene, SceneCommand};
