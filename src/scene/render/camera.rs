use std::f32::consts::PI;

use glam::{Mat4, Vec2, Vec3};

const FOV_Y: f32 = 0.15 * PI;
const NEAR: f32 = 3.0;
const FAR: f32 = 100.0;
const DISTANCE: f32 = 5.0;
const SCROLL_FACTOR: f32 = 0.005;

/// Fixed perspective looking down -Z at the model, nudged by page scroll.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub projection: Mat4,
    pub view: Mat4,
}

impl Camera {
    pub fn new(width: u32, height: u32, scroll: Vec2) -> Self {
        let aspect = width.max(1) as f32 / height.max(1) as f32;
        let projection = Mat4::perspective_rh_gl(FOV_Y, aspect, NEAR, FAR);
        let view = Mat4::from_translation(Vec3::new(
            SCROLL_FACTOR * -scroll.x,
            SCROLL_FACTOR * scroll.y,
            -DISTANCE,
        ));
        Self { projection, view }
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection * self.view
    }
}
