use std::fmt;

use rand::Rng;

use super::entity::Control;
use super::SimRng;
use crate::math::Vec2;

/// AI strategy owned by an entity. Runs once per tick while the entity is
/// conscious and alive, and replaces its control intent.
pub trait Controller: fmt::Debug {
    fn process(&mut self, position: Vec2, rng: &mut SimRng) -> Control;
}

pub const DEFAULT_WAYPOINT_PICK_CHANCE: f64 = 0.02;
pub const DEFAULT_ARRIVAL_DISTANCE_SQ: f32 = 100.0;

/// Loiters until a per-tick roll picks a random waypoint, walks there, and
/// goes idle again on arrival.
#[derive(Debug, Clone)]
pub struct WaypointController {
    waypoints: Vec<Vec2>,
    current: Option<usize>,
    pick_chance: f64,
    arrival_distance_sq: f32,
}

impl WaypointController {
    pub fn new(waypoints: Vec<Vec2>) -> Self {
        Self {
            waypoints,
            current: None,
            pick_chance: DEFAULT_WAYPOINT_PICK_CHANCE,
            arrival_distance_sq: DEFAULT_ARRIVAL_DISTANCE_SQ,
        }
    }

    pub fn with_pick_chance(mut self, pick_chance: f64) -> Self {
        self.pick_chance = pick_chance.clamp(0.0, 1.0);
        self
    }

    pub fn current_waypoint(&self) -> Option<Vec2> {
        self.current.and_then(|index| self.waypoints.get(index).copied())
    }
}

impl Controller for WaypointController {
    fn process(&mut self, position: Vec2, rng: &mut SimRng) -> Control {
        if self.current.is_none() && !self.waypoints.is_empty() && rng.random_bool(self.pick_chance)
        {
            self.current = Some(rng.random_range(0..self.waypoints.len()));
        }

        let Some(waypoint) = self.current_waypoint() else {
            return Control::default();
        };
        let toward = waypoint - position;
        if toward.length_squared() < self.arrival_distance_sq {
            self.current = None;
            return Control::default();
        }
        Control {
            move_intent: toward,
            aim: toward,
        }
    }
}
