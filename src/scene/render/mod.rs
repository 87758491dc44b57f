//! CPU rendition of the background renderer: a lit scene pass into an
//! offscreen framebuffer followed by the ordered-dither pass.

mod camera;
mod dither;
mod framebuffer;
mod raster;
mod spin;

use glam::{Mat3, Mat4, Vec2, Vec3, Vec4};
use image::RgbaImage;
use metrics::counter;
use tracing::{debug, instrument};

pub use camera::Camera;
pub use dither::{BAYER_8X8, DitherPass, Inks, count_ink, luminance, threshold_texture};
pub use framebuffer::Framebuffer;
pub use raster::{ClipVertex, RasterStats};
pub use spin::Spin;

use super::{error::SceneError, graph::Scene};

const BASE_SHADE: f32 = 0.9;
const AMBIENT: f32 = 0.15;
const LIGHT_DIRECTION: Vec3 = Vec3::new(0.5, 0.7, 1.0);

#[derive(Debug, Clone, PartialEq)]
pub struct RenderOptions {
    pub width: u32,
    pub height: u32,
    pub frames: u32,
    pub dark: bool,
    pub scroll: Vec2,
    /// Timestamp of the first frame in milliseconds.
    pub start_ms: f64,
    /// Time between frames in milliseconds.
    pub frame_ms: f64,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            width: 640,
            height: 480,
            frames: 1,
            dark: false,
            scroll: Vec2::ZERO,
            start_ms: 0.0,
            frame_ms: 1000.0 / 60.0,
        }
    }
}

/// Geometry of one primitive prepared for drawing.
#[derive(Debug, Clone)]
struct Batch {
    world: Mat4,
    positions: Vec<Vec3>,
    normals: Option<Vec<Vec3>>,
    triangles: Vec<[u32; 3]>,
}

/// Owns the prepared geometry and render targets across frames.
pub struct Renderer {
    camera: Camera,
    spin: Spin,
    framebuffer: Framebuffer,
    dither: DitherPass,
    batches: Vec<Batch>,
}

impl Renderer {
    /// Read and validate every drawable primitive once.
    pub fn new(scene: &Scene, options: &RenderOptions) -> Result<Self, SceneError> {
        let mut batches = Vec::new();

        for call in scene.draw_calls() {
            for primitive in &call.mesh.primitives {
                let Some(position) = primitive.attribute("POSITION") else {
                    debug!(
                        target = "stipple::scene::render",
                        mesh = %call.mesh.id,
                        "Skipping primitive without POSITION"
                    );
                    continue;
                };
                let positions = position.read_vec3()?;

                let normals = match primitive.attribute("NORMAL") {
                    Some(normal) => {
                        let normals = normal.read_vec3()?;
                        (normals.len() == positions.len()).then_some(normals)
                    }
                    None => None,
                };

                let sequence = match primitive.indices.as_ref() {
                    Some(indices) => indices.read_indices()?,
                    None => (0..positions.len() as u32).collect(),
                };
                if let Some(bad) = sequence
                    .iter()
                    .find(|index| **index as usize >= positions.len())
                {
                    return Err(SceneError::out_of_bounds(
                        "mesh",
                        &call.mesh.id,
                        format!("index {bad} exceeds {} vertices", positions.len()),
                    ));
                }

                let triangles = primitive.mode.triangles(&sequence);
                if triangles.is_empty() {
                    continue;
                }

                batches.push(Batch {
                    world: call.world,
                    positions,
                    normals,
                    triangles,
                });
            }
        }

        debug!(
            target = "stipple::scene::render",
            batches = batches.len(),
            "Prepared scene geometry"
        );

        Ok(Self {
            camera: Camera::new(options.width, options.height, options.scroll),
            spin: Spin::default(),
            framebuffer: Framebuffer::new(options.width, options.height),
            dither: DitherPass::new(Inks::for_mode(options.dark)),
            batches,
        })
    }

    /// Advance the spin and run the scene pass for a frame at `now_ms`.
    pub fn frame(&mut self, now_ms: f64) -> RasterStats {
        self.spin.advance(now_ms);
        self.framebuffer.clear();

        let view_projection = self.camera.view_projection();
        let spin = self.spin.matrix();
        let light = LIGHT_DIRECTION.normalize();
        let mut stats = RasterStats::default();

        for batch in &self.batches {
            let modelview = spin * batch.world;
            let normal_matrix = Mat3::from_mat4(modelview).inverse().transpose();
            let clip_from_model = view_projection * modelview;

            for triangle in &batch.triangles {
                let corners = triangle.map(|index| batch.positions[index as usize]);
                let face_normal = (corners[1] - corners[0]).cross(corners[2] - corners[0]);

                let vertices = [0, 1, 2].map(|corner| {
                    let normal = batch
                        .normals
                        .as_ref()
                        .map(|normals| normals[triangle[corner] as usize])
                        .unwrap_or(face_normal);
                    ClipVertex {
                        position: clip_from_model * corners[corner].extend(1.0),
                        color: shade(normal_matrix * normal, light),
                    }
                });

                raster::draw_triangle(&mut self.framebuffer, vertices, &mut stats);
            }
        }

        stats
    }

    pub fn framebuffer(&self) -> &Framebuffer {
        &self.framebuffer
    }

    /// Run the dither pass over the last frame.
    pub fn present(&self) -> Result<RgbaImage, SceneError> {
        self.dither.apply(&self.framebuffer)
    }
}

fn shade(normal: Vec3, light: Vec3) -> Vec4 {
    let lambert = normal.normalize_or_zero().dot(light).max(0.0);
    let value = BASE_SHADE * (AMBIENT + (1.0 - AMBIENT) * lambert);
    Vec4::new(value, value, value, 1.0)
}

/// Render `options.frames` frames and return the last one after dithering.
#[instrument(skip(scene), fields(nodes = scene.nodes.len()))]
pub fn render_frames(scene: &Scene, options: &RenderOptions) -> Result<RgbaImage, SceneError> {
    let mut renderer = Renderer::new(scene, options)?;

    for frame in 0..options.frames.max(1) {
        let stats = renderer.frame(options.start_ms + f64::from(frame) * options.frame_ms);
        counter!("stipple_scene_frames_total").increment(1);
        debug!(
            target = "stipple::scene::render",
            frame,
            fragments = stats.fragments,
            culled = stats.culled,
            clipped = stats.clipped,
            "Rendered scene pass"
        );
    }

    renderer.present()
}
