use std::sync::Arc;

use pixels::{Error, Pixels, SurfaceTexture};
use winit::window::Window;

use crate::app::Camera2D;
use crate::content::{EntityDef, RenderLayer, Shape};
use crate::math::Vec2;
use crate::world::{Entity, EntityId, World, EFFECT_BOUND, EFFECT_UNCONSCIOUS};

use super::transform::{world_to_screen, Viewport};

const CLEAR_COLOR: [u8; 4] = [46, 44, 52, 255];
const OUTLINE_COLOR: [u8; 4] = [68, 68, 68, 255];
const FACING_COLOR: [u8; 4] = [20, 20, 20, 255];
const BOUND_COLOR: [u8; 4] = [221, 221, 221, 255];
const SLOT_COLOR: [u8; 4] = [30, 30, 36, 255];
const SLOT_ACTIVE_COLOR: [u8; 4] = [255, 210, 70, 255];
const OUTLINE_PX: f32 = 2.0;
/// Drawn radius for entities whose definition has no size, i.e. items.
const ITEM_RADIUS_PX: f32 = 8.0;
const SLOT_SIZE_PX: i32 = 36;
const SLOT_GAP_PX: i32 = 6;
const SLOT_MARGIN_PX: i32 = 16;

pub struct Renderer {
    window: Arc<Window>,
    pixels: Pixels<'static>,
    viewport: Viewport,
    draw_order: Vec<usize>,
}

impl Renderer {
    pub fn new(window: Arc<Window>) -> Result<Self, Error> {
        let size = window.inner_size();
        let pixels = Self::build_pixels(Arc::clone(&window), size.width, size.height)?;
        Ok(Self {
            window,
            pixels,
            viewport: Viewport {
                width: size.width,
                height: size.height,
            },
            draw_order: Vec::new(),
        })
    }

    pub fn resize(&mut self, width: u32, height: u32) -> Result<(), Error> {
        if width == 0 || height == 0 {
            return Ok(());
        }
        self.pixels = Self::build_pixels(Arc::clone(&self.window), width, height)?;
        self.viewport = Viewport { width, height };
        Ok(())
    }

    fn build_pixels(
        window: Arc<Window>,
        width: u32,
        height: u32,
    ) -> Result<Pixels<'static>, Error> {
        let surface = SurfaceTexture::new(width, height, window);
        Pixels::new(width, height, surface)
    }

    /// Draws placed entities back to front, each holder's active item at its
    /// inventory point, and the focus entity's inventory strip.
    pub(crate) fn render_world(
        &mut self,
        world: &World,
        camera: &Camera2D,
        focus: Option<EntityId>,
    ) -> Result<(), Error> {
        let viewport = self.viewport;
        let canvas_width = viewport.width;
        let canvas_height = viewport.height;
        collect_draw_order(world, &mut self.draw_order);

        let frame = self.pixels.frame_mut();
        for pixel in frame.chunks_exact_mut(4) {
            pixel.copy_from_slice(&CLEAR_COLOR);
        }
        let mut canvas = Canvas {
            frame,
            width: canvas_width,
            height: canvas_height,
        };

        let zoom = camera.effective_zoom();
        for &index in &self.draw_order {
            let entity = &world.entities()[index];
            let Some(def) = world.entity_def(entity) else {
                continue;
            };
            let center = world_to_screen(entity.position, camera, viewport);
            draw_entity(&mut canvas, entity, def, center, zoom, world.time());

            if let Some(item_def) = entity
                .active_item()
                .and_then(|id| world.find_entity(id))
                .and_then(|item| world.entity_def(item))
            {
                let point = entity.inventory_point(def);
                let at = world_to_screen(point.position, camera, viewport);
                draw_item_marker(&mut canvas, item_def, at, zoom);
            }
        }

        if let Some(holder) = focus.and_then(|id| world.find_entity(id)) {
            draw_inventory_strip(&mut canvas, world, holder);
        }

        self.pixels.render()
    }
}

struct Canvas<'a> {
    frame: &'a mut [u8],
    width: u32,
    height: u32,
}

impl Canvas<'_> {
    fn put(&mut self, x: i32, y: i32, color: [u8; 4]) {
        write_pixel_rgba_clipped(self.frame, self.width as usize, x, y, color);
    }

    fn fill_rect_px(&mut self, left: i32, top: i32, size: i32, color: [u8; 4]) {
        let right = (left + size).min(self.width as i32);
        let bottom = (top + size).min(self.height as i32);
        for y in top.max(0)..bottom {
            for x in left.max(0)..right {
                self.put(x, y, color);
            }
        }
    }

    fn fill_disc(&mut self, center: Vec2, radius: f32, color: [u8; 4]) {
        self.fill_where(center, radius, color, |offset| {
            offset.length_squared() <= radius * radius
        });
    }

    fn fill_ring(&mut self, center: Vec2, radius: f32, thickness: f32, color: [u8; 4]) {
        let inner = (radius - thickness).max(0.0);
        self.fill_where(center, radius, color, |offset| {
            let distance_sq = offset.length_squared();
            distance_sq <= radius * radius && distance_sq >= inner * inner
        });
    }

    fn fill_rotated_rect(&mut self, center: Vec2, half: Vec2, angle: f32, color: [u8; 4]) {
        let reach = half.length();
        self.fill_where(center, reach, color, |offset| {
            point_in_rotated_rect(offset, half, angle)
        });
    }

    fn fill_where(
        &mut self,
        center: Vec2,
        reach: f32,
        color: [u8; 4],
        inside: impl Fn(Vec2) -> bool,
    ) {
        if !center.is_finite() {
            return;
        }
        let min_x = ((center.x - reach).floor() as i32).max(0);
        let max_x = ((center.x + reach).ceil() as i32).min(self.width as i32 - 1);
        let min_y = ((center.y - reach).floor() as i32).max(0);
        let max_y = ((center.y + reach).ceil() as i32).min(self.height as i32 - 1);
        for y in min_y..=max_y {
            for x in min_x..=max_x {
                let offset = Vec2::new(x as f32 + 0.5, y as f32 + 0.5) - center;
                if inside(offset) {
                    self.put(x, y, color);
                }
            }
        }
    }

    fn line(&mut self, from: Vec2, to: Vec2, color: [u8; 4]) {
        let steps = (to - from).length().ceil().max(1.0) as i32;
        for step in 0..=steps {
            let t = step as f32 / steps as f32;
            let point = from + (to - from) * t;
            self.put(point.x.round() as i32, point.y.round() as i32, color);
        }
    }
}

fn draw_entity(
    canvas: &mut Canvas<'_>,
    entity: &Entity,
    def: &EntityDef,
    center: Vec2,
    zoom: f32,
    now: f64,
) {
    let shape = def.physics.map(|physics| physics.shape);
    let mut color = def.color;
    if !entity.is_alive() || entity.has_effect(EFFECT_UNCONSCIOUS, now) {
        color = dim(color);
    }

    match shape {
        Some(Shape::Rect) => {
            let half = Vec2::new(entity.size * 0.5, entity.height * 0.5) * zoom;
            canvas.fill_rotated_rect(center, half, entity.angle, OUTLINE_COLOR);
            let inner = Vec2::new(
                (half.x - OUTLINE_PX).max(0.0),
                (half.y - OUTLINE_PX).max(0.0),
            );
            canvas.fill_rotated_rect(center, inner, entity.angle, color);
        }
        Some(Shape::Circle) => {
            let radius = entity.radius() * zoom;
            canvas.fill_disc(center, radius, color);
            canvas.fill_ring(center, radius, OUTLINE_PX, OUTLINE_COLOR);
            if def.render_layer == RenderLayer::Character {
                let tip = center + Vec2::from_angle(entity.angle) * radius;
                canvas.line(center, tip, FACING_COLOR);
            }
            if entity.has_effect(EFFECT_BOUND, now) {
                let band = Vec2::new(radius * 0.35, radius * 0.95);
                canvas.fill_rotated_rect(center, band, entity.angle, BOUND_COLOR);
            }
        }
        None => draw_item_marker(canvas, def, center, zoom),
    }
}

fn draw_item_marker(canvas: &mut Canvas<'_>, def: &EntityDef, center: Vec2, zoom: f32) {
    let radius = ITEM_RADIUS_PX * zoom;
    canvas.fill_disc(center, radius, def.color);
    canvas.fill_ring(center, radius, OUTLINE_PX, OUTLINE_COLOR);
}

fn draw_inventory_strip(canvas: &mut Canvas<'_>, world: &World, holder: &Entity) {
    let slots = holder.inventory.len() as i32;
    if slots == 0 {
        return;
    }
    let strip_width = slots * SLOT_SIZE_PX + (slots - 1) * SLOT_GAP_PX;
    let left = (canvas.width as i32 - strip_width) / 2;
    let top = canvas.height as i32 - SLOT_MARGIN_PX - SLOT_SIZE_PX;

    for (slot, item) in holder.inventory.iter().enumerate() {
        let x = left + slot as i32 * (SLOT_SIZE_PX + SLOT_GAP_PX);
        if slot == holder.inventory_active_index {
            canvas.fill_rect_px(x - 2, top - 2, SLOT_SIZE_PX + 4, SLOT_ACTIVE_COLOR);
        }
        canvas.fill_rect_px(x, top, SLOT_SIZE_PX, SLOT_COLOR);

        let Some(item_def) = item
            .and_then(|id| world.find_entity(id))
            .and_then(|item| world.entity_def(item))
        else {
            continue;
        };
        let inset = SLOT_SIZE_PX / 4;
        canvas.fill_rect_px(x + inset, top + inset, SLOT_SIZE_PX - inset * 2, item_def.color);
    }
}

/// Placed, unowned entities sorted back to front by layer, then by id.
fn collect_draw_order(world: &World, out: &mut Vec<usize>) {
    out.clear();
    for (index, entity) in world.entities().iter().enumerate() {
        if entity.owner.is_none() && entity.position.is_finite() {
            out.push(index);
        }
    }
    let layer_of = |index: usize| {
        let entity = &world.entities()[index];
        world
            .entity_def(entity)
            .map(|def| def.render_layer)
            .unwrap_or_default()
    };
    out.sort_by(|left, right| {
        layer_of(*left)
            .cmp(&layer_of(*right))
            .then_with(|| world.entities()[*left].id.cmp(&world.entities()[*right].id))
    });
}

fn point_in_rotated_rect(offset: Vec2, half: Vec2, angle: f32) -> bool {
    let local = offset.rotated(-angle);
    local.x.abs() <= half.x && local.y.abs() <= half.y
}

fn dim(color: [u8; 4]) -> [u8; 4] {
    [color[0] / 2, color[1] / 2, color[2] / 2, color[3]]
}

fn write_pixel_rgba_clipped(frame: &mut [u8], width: usize, x: i32, y: i32, color: [u8; 4]) {
    if x < 0 || y < 0 || x as usize >= width {
        return;
    }
    let Some(byte_offset) = (y as usize)
        .checked_mul(width)
        .and_then(|row| row.checked_add(x as usize))
        .and_then(|pixel| pixel.checked_mul(4))
    else {
        return;
    };
    let Some(end) = byte_offset.checked_add(4) else {
        return;
    };
    if end > frame.len() {
        return;
    }
    frame[byte_offset..end].copy_from_slice(&color);
}
