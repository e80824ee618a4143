use std::f32::consts::TAU;

use rand::Rng;

use super::entity::Entity;
use super::{SimError, SimRng};
use crate::content::{EntityDef, Shape};
use crate::math::Vec2;

/// One side of a collision pair: the mutable body plus its definition.
pub struct Body<'a> {
    pub entity: &'a mut Entity,
    pub def: &'a EntityDef,
}

impl Body<'_> {
    fn shape(&self) -> Option<Shape> {
        self.def.physics.map(|physics| physics.shape)
    }

    fn mass(&self) -> Option<f32> {
        self.def.mass()
    }
}

/// Separates two overlapping bodies by moving positions only. Rects are only
/// supported as immovable sources against a circle.
pub fn collide_pair(a: Body<'_>, b: Body<'_>, rng: &mut SimRng) -> Result<(), SimError> {
    match (a.shape(), b.shape()) {
        (Some(Shape::Circle), Some(Shape::Circle)) => {
            collide_circles(a, b, rng);
            Ok(())
        }
        (Some(Shape::Rect), Some(Shape::Circle)) if a.mass().is_none() => {
            collide_rect_circle(a.entity, b.entity);
            Ok(())
        }
        (Some(Shape::Circle), Some(Shape::Rect)) if b.mass().is_none() => {
            collide_rect_circle(b.entity, a.entity);
            Ok(())
        }
        (Some(_), Some(_)) => Err(SimError::UnsupportedCollision {
            first: a.entity.kind.clone(),
            second: b.entity.kind.clone(),
        }),
        _ => Ok(()),
    }
}

fn collide_circles(a: Body<'_>, b: Body<'_>, rng: &mut SimRng) {
    let reach = a.entity.radius() + b.entity.radius();
    let delta = b.entity.position - a.entity.position;
    let distance_sq = delta.length_squared();
    if distance_sq >= reach * reach {
        return;
    }

    let distance = distance_sq.sqrt();
    let push = reach - distance;
    let direction = if distance > 0.0 {
        delta * (1.0 / distance)
    } else {
        Vec2::from_angle(rng.random_range(0.0..TAU))
    };

    // Each side moves by the other side's share of the total mass.
    let (a_share, b_share) = match (a.mass(), b.mass()) {
        (Some(a_mass), Some(b_mass)) => {
            let total = a_mass + b_mass;
            (b_mass / total, a_mass / total)
        }
        (Some(_), None) => (1.0, 0.0),
        (None, Some(_)) => (0.0, 1.0),
        (None, None) => (0.0, 0.0),
    };

    a.entity.position -= direction * (push * a_share);
    b.entity.position += direction * (push * b_share);
}

/// Pushes the circle out of an immovable rect. A centre inside the rect leaves
/// through the nearest edge; when the x and y edges are equally near, the y edge
/// wins.
fn collide_rect_circle(rect: &Entity, circle: &mut Entity) {
    let half = Vec2::new(rect.size * 0.5, rect.height * 0.5);
    let radius = circle.radius();
    let local = (circle.position - rect.position).rotated(-rect.angle);
    let closest = Vec2::new(local.x.clamp(-half.x, half.x), local.y.clamp(-half.y, half.y));
    let offset = local - closest;

    let resolved = if offset.is_zero() {
        // Centre is inside. Ties go to the y edge.
        let gap_x = half.x - local.x.abs();
        let gap_y = half.y - local.y.abs();
        if gap_x < gap_y {
            Vec2::new((half.x + radius).copysign(local.x), local.y)
        } else {
            Vec2::new(local.x, (half.y + radius).copysign(local.y))
        }
    } else {
        let distance_sq = offset.length_squared();
        if distance_sq >= radius * radius {
            return;
        }
        closest + offset * (radius / distance_sq.sqrt())
    };

    circle.position = rect.position + resolved.rotated(rect.angle);
}
