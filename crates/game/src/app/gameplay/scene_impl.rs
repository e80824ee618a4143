use engine::{
    screen_to_world, Camera2D, Control, EntityId, InputSnapshot, Scene, SceneCommand, SimError,
    Vec2, Viewport, World,
};
use tracing::{debug, info, warn};

use super::populate::populate;

/// The single playable room. Input is turned into world commands for the
/// player; everything else is simulated by the world itself.
pub(crate) struct GameplayScene {
    world: World,
    camera: Camera2D,
    player: Option<EntityId>,
}

impl GameplayScene {
    pub(crate) fn new(world: World) -> Self {
        Self {
            world,
            camera: Camera2D::default(),
            player: None,
        }
    }

    #[cfg(test)]
    pub(crate) fn player(&self) -> Option<EntityId> {
        self.player
    }

    fn apply_input(&mut self, player: EntityId, input: &InputSnapshot) -> Result<(), SimError> {
        let Some(player_position) = self.world.find_entity(player).map(|entity| entity.position)
        else {
            return Ok(());
        };
        let aim = self
            .cursor_world_position(input)
            .map(|cursor| cursor - player_position)
            .unwrap_or(Vec2::ZERO);
        self.world.set_control(
            player,
            Control {
                move_intent: input.movement_axes(),
                aim,
            },
        );

        if let Some(slot) = input.selected_slot() {
            if !self.world.select_slot(player, slot) {
                debug!(slot, "slot_out_of_range");
            }
        }
        if input.drop_pressed() {
            self.world.drop_item(player, None);
        }
        if input.pick_up_pressed() {
            self.world.pick_up_nearest(player);
        }
        if input.use_pressed() {
            self.world.use_active_item(player)?;
        }
        if input.dump_state_pressed() {
            self.dump_state();
        }
        Ok(())
    }

    fn cursor_world_position(&self, input: &InputSnapshot) -> Option<Vec2> {
        let cursor = input.cursor_position_px()?;
        let (width, height) = input.window_size();
        if width == 0 || height == 0 {
            return None;
        }
        Some(screen_to_world(cursor, &self.camera, Viewport { width, height }))
    }

    fn dump_state(&self) {
        match self.world.snapshot().to_json_pretty() {
            Ok(json) => info!(state = %json, "world_state"),
            Err(err) => warn!(error = %err, "world_state_serialize_failed"),
        }
    }

    fn follow_player(&mut self) {
        if let Some(position) = self
            .player
            .and_then(|player| self.world.find_entity(player))
            .map(|entity| entity.position)
        {
            self.camera.follow(position);
        }
    }

    fn active_item_name(&self) -> Option<&str> {
        let item = self.world.active_item(self.player?)?;
        let entity = self.world.find_entity(item)?;
        self.world.entity_def(entity)?.item.as_deref()
    }
}

impl Scene for GameplayScene {
    fn load(&mut self) -> Result<(), SimError> {
        let player = populate(&mut self.world)?;
        self.player = Some(player);
        self.follow_player();
        Ok(())
    }

    fn update(&mut self, input: &InputSnapshot) -> Result<SceneCommand, SimError> {
        if input.quit_requested() {
            return Ok(SceneCommand::Quit);
        }
        if let Some(player) = self.player {
            self.apply_input(player, input)?;
        }
        self.world.update()?;
        self.follow_player();
        Ok(SceneCommand::None)
    }

    fn world(&self) -> &World {
        &self.world
    }

    fn camera(&self) -> &Camera2D {
        &self.camera
    }

    fn focus(&self) -> Option<EntityId> {
        self.player
    }

    fn unload(&mut self) {
        info!(
            time_seconds = self.world.time(),
            entity_count = self.world.entity_count(),
            "scene_unloaded"
        );
    }

    fn debug_title(&self) -> Option<String> {
        Some(format!(
            "Homicidal Tendencies | t={:.1}s | holding: {}",
            self.world.time(),
            self.active_item_name().unwrap_or("nothing")
        ))
    }
}
