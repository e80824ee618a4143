use crate::app::Camera2D;
use crate::math::Vec2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub fn center(self) -> Vec2 {
        Vec2::new(self.width as f32 * 0.5, self.height as f32 * 0.5)
    }
}

/// World space is y-down like the screen, so only offset and zoom differ.
pub fn world_to_screen(world: Vec2, camera: &Camera2D, viewport: Viewport) -> Vec2 {
    (world - camera.position) * camera.effective_zoom() + viewport.center()
}

pub fn screen_to_world(screen: Vec2, camera: &Camera2D, viewport: Viewport) -> Vec2 {
    (screen - viewport.center()) * (1.0 / camera.effective_zoom()) + camera.position
}
