use super::input::{ActionStates, InputAction, PressEdges};
use crate::math::Vec2;
use crate::world::{EntityId, SimError, World};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneCommand {
    None,
    Quit,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct InputSnapshot {
    quit_requested: bool,
    actions: ActionStates,
    presses: PressEdges,
    cursor_position_px: Option<Vec2>,
    window_width: u32,
    window_height: u32,
}

impl InputSnapshot {
    pub fn empty() -> Self {
        Self::default()
    }

    pub(crate) fn new(
        quit_requested: bool,
        actions: ActionStates,
        presses: PressEdges,
        cursor_position_px: Option<Vec2>,
        window_width: u32,
        window_height: u32,
    ) -> Self {
        Self {
            quit_requested,
            actions,
            presses,
            cursor_position_px,
            window_width,
            window_height,
        }
    }

    pub fn quit_requested(&self) -> bool {
        self.quit_requested
    }

    pub fn is_down(&self, action: InputAction) -> bool {
        self.actions.is_down(action)
    }

    /// Unnormalized axes from held movement keys; each component is -1, 0 or 1.
    pub fn movement_axes(&self) -> Vec2 {
        let axis = |negative: InputAction, positive: InputAction| {
            let mut value = 0.0;
            if self.is_down(negative) {
                value -= 1.0;
            }
            if self.is_down(positive) {
                value += 1.0;
            }
            value
        };
        Vec2::new(
            axis(InputAction::MoveLeft, InputAction::MoveRight),
            axis(InputAction::MoveUp, InputAction::MoveDown),
        )
    }

    pub fn cursor_position_px(&self) -> Option<Vec2> {
        self.cursor_position_px
    }

    pub fn window_size(&self) -> (u32, u32) {
        (self.window_width, self.window_height)
    }

    /// Zero-based slot chosen by a digit key this tick.
    pub fn selected_slot(&self) -> Option<usize> {
        self.presses.select_slot
    }

    pub fn drop_pressed(&self) -> bool {
        self.presses.drop
    }

    pub fn pick_up_pressed(&self) -> bool {
        self.presses.pick_up
    }

    pub fn use_pressed(&self) -> bool {
        self.presses.use_item
    }

    pub fn dump_state_pressed(&self) -> bool {
        self.presses.dump_state
    }

    pub fn with_quit_requested(mut self, quit_requested: bool) -> Self {
        self.quit_requested = quit_requested;
        self
    }

    pub fn with_action_down(mut self, action: InputAction, is_down: bool) -> Self {
        self.actions.set(action, is_down);
        self
    }

    pub fn with_cursor_position_px(mut self, cursor_position_px: Option<Vec2>) -> Self {
        self.cursor_position_px = cursor_position_px;
        self
    }

    pub fn with_window_size(mut self, window_size: (u32, u32)) -> Self {
        self.window_width = window_size.0;
        self.window_height = window_size.1;
        self
    }

    pub fn with_selected_slot(mut self, slot: Option<usize>) -> Self {
        self.presses.select_slot = slot;
        self
    }

    pub fn with_drop_pressed(mut self, pressed: bool) -> Self {
        self.presses.drop = pressed;
        self
    }

    pub fn with_pick_up_pressed(mut self, pressed: bool) -> Self {
        self.presses.pick_up = pressed;
        self
    }

    pub fn with_use_pressed(mut self, pressed: bool) -> Self {
        self.presses.use_item = pressed;
        self
    }

    pub fn with_dump_state_pressed(mut self, pressed: bool) -> Self {
        self.presses.dump_state = pressed;
        self
    }
}

const CAMERA_ZOOM_DEFAULT: f32 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera2D {
    pub position: Vec2,
    pub zoom: f32,
}

impl Default for Camera2D {
    fn default() -> Self {
        Self {
            position: Vec2::ZERO,
            zoom: CAMERA_ZOOM_DEFAULT,
        }
    }
}

impl Camera2D {
    /// Falls back to 1.0 for a zero, negative or non-finite zoom.
    pub fn effective_zoom(&self) -> f32 {
        if self.zoom.is_finite() && self.zoom > 0.0 {
            self.zoom
        } else {
            CAMERA_ZOOM_DEFAULT
        }
    }

    /// Centres on `target` unless it has not been placed yet.
    pub fn follow(&mut self, target: Vec2) {
        if target.is_finite() {
            self.position = target;
        }
    }
}

/// A playable scene. The scene owns its [`World`]; the loop runner ticks it,
/// reads it back for drawing, and stops on a fatal simulation error.
pub trait Scene {
    fn load(&mut self) -> Result<(), SimError>;
    fn update(&mut self, input: &InputSnapshot) -> Result<SceneCommand, SimError>;
    fn world(&self) -> &World;
    fn camera(&self) -> &Camera2D;
    /// Entity whose inventory is shown on screen.
    fn focus(&self) -> Option<EntityId> {
        None
    }
    fn unload(&mut self) {}
    fn debug_title(&self) -> Option<String> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opposing_keys_cancel_out() {
        let input = InputSnapshot::empty()
            .with_action_down(InputAction::MoveLeft, true)
            .with_action_down(InputAction::MoveRight, true)
            .with_action_down(InputAction::MoveUp, true);
        assert_eq!(input.movement_axes(), Vec2::new(0.0, -1.0));
    }

    #[test]
    fn diagonal_axes_are_left_unnormalized() {
        let input = InputSnapshot::empty()
            .with_action_down(InputAction::MoveDown, true)
            .with_action_down(InputAction::MoveRight, true);
        assert_eq!(input.movement_axes(), Vec2::new(1.0, 1.0));
    }

    #[test]
    fn presses_default_to_released() {
        let input = InputSnapshot::empty();
        assert_eq!(input.selected_slot(), None);
        assert!(!input.drop_pressed());
        assert!(!input.pick_up_pressed());
        assert!(!input.use_pressed());
        assert!(!input.dump_state_pressed());
    }

    #[test]
    fn degenerate_camera_zoom_falls_back_to_one() {
        let mut camera = Camera2D {
            zoom: 0.0,
            ..Camera2D::default()
        };
        assert_eq!(camera.effective_zoom(), 1.0);
        camera.zoom = f32::NAN;
        assert_eq!(camera.effective_zoom(), 1.0);
        camera.zoom = 1.5;
        assert_eq!(camera.effective_zoom(), 1.5);
    }

    #[test]
    fn camera_ignores_unplaced_target() {
        let mut camera = Camera2D::default();
        camera.follow(Vec2::new(3.0, 4.0));
        camera.follow(Vec2::NAN);
        assert_eq!(camera.position, Vec2::new(3.0, 4.0));
    }
}
