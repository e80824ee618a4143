use std::f32::consts::{FRAC_PI_2, PI};

use engine::{EntityId, SimError, SpawnOptions, Vec2, WaypointController, World};
use tracing::{info, warn};

use super::definitions::{
    KIND_COUCH, KIND_ENEMY, KIND_KNIFE, KIND_PLASTIC_BAG, KIND_PLASTIC_WRAP, KIND_PLAYER,
    KIND_SLIDE, KIND_SYRINGE_M99, KIND_TABLE, KIND_WALL,
};

/// `(x, y, width, height)` of each wall segment. The room spans 1600x900 with
/// a partition closing off the enemy's half.
const WALLS: [(f32, f32, f32, f32); 5] = [
    (800.0, 20.0, 1600.0, 40.0),
    (800.0, 880.0, 1600.0, 40.0),
    (20.0, 450.0, 40.0, 900.0),
    (1580.0, 450.0, 40.0, 900.0),
    (1000.0, 300.0, 40.0, 520.0),
];

const ENEMY_SPAWN: Vec2 = Vec2::new(1300.0, 250.0);
const ENEMY_WAYPOINTS: [Vec2; 5] = [
    Vec2::new(1150.0, 150.0),
    Vec2::new(1450.0, 150.0),
    Vec2::new(1450.0, 760.0),
    Vec2::new(1150.0, 760.0),
    Vec2::new(1300.0, 420.0),
];
const PLAYER_SPAWN: Vec2 = Vec2::new(400.0, 450.0);

/// Builds the starting room and returns the player.
pub(crate) fn populate(world: &mut World) -> Result<EntityId, SimError> {
    for (x, y, width, height) in WALLS {
        world.spawn(KIND_WALL, SpawnOptions::at(x, y).with_rect(width, height))?;
    }
    world.spawn(KIND_TABLE, SpawnOptions::at(1300.0, 620.0))?;
    world.spawn(KIND_COUCH, SpawnOptions::at(1420.0, 620.0))?;
    world.spawn(KIND_COUCH, SpawnOptions::at(1300.0, 510.0).with_angle(FRAC_PI_2))?;

    let enemy = world.spawn(
        KIND_ENEMY,
        SpawnOptions::at(ENEMY_SPAWN.x, ENEMY_SPAWN.y).with_angle(PI),
    )?;
    world.set_controller(
        enemy,
        Box::new(WaypointController::new(ENEMY_WAYPOINTS.to_vec())),
    );
    give(world, enemy, KIND_KNIFE, true)?;

    let player = world.spawn(KIND_PLAYER, SpawnOptions::at(PLAYER_SPAWN.x, PLAYER_SPAWN.y))?;
    give(world, player, KIND_KNIFE, false)?;
    give(world, player, KIND_SYRINGE_M99, true)?;
    give(world, player, KIND_PLASTIC_WRAP, false)?;
    give(world, player, KIND_SLIDE, false)?;
    give(world, player, KIND_PLASTIC_BAG, false)?;

    info!(
        player = player.0,
        enemy = enemy.0,
        entity_count = world.entity_count(),
        "world_populated"
    );
    Ok(player)
}

/// Spawns an unplaced item straight into `holder`'s inventory.
fn give(
    world: &mut World,
    holder: EntityId,
    kind: &str,
    make_active: bool,
) -> Result<EntityId, SimError> {
    let item = world.spawn(kind, SpawnOptions::default())?;
    if !world.grab(holder, item, make_active) {
        warn!(holder = holder.0, item = item.0, kind, "starting_item_not_held");
    }
    Ok(item)
}
