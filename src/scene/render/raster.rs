//! Triangle setup and scan conversion for the scene pass.

use glam::{Vec2, Vec4};

use super::framebuffer::Framebuffer;

const W_EPSILON: f32 = 1e-5;

/// A vertex after the vertex stage: clip-space position plus shaded colour.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClipVertex {
    pub position: Vec4,
    pub color: Vec4,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RasterStats {
    pub culled: usize,
    pub clipped: usize,
    pub fragments: usize,
}

/// Signed area of a triangle in normalised device coordinates. Positive
/// when the vertices wind counter-clockwise.
pub fn signed_area(a: Vec2, b: Vec2, c: Vec2) -> f32 {
    (b - a).perp_dot(c - a) * 0.5
}

/// Scan convert one triangle. Back faces and triangles crossing the eye
/// plane are dropped.
pub fn draw_triangle(
    framebuffer: &mut Framebuffer,
    vertices: [ClipVertex; 3],
    stats: &mut RasterStats,
) {
    if vertices.iter().any(|vertex| vertex.position.w <= W_EPSILON) {
        stats.clipped += 1;
        return;
    }

    let ndc = vertices.map(|vertex| vertex.position.truncate() / vertex.position.w);
    if signed_area(ndc[0].truncate(), ndc[1].truncate(), ndc[2].truncate()) <= 0.0 {
        stats.culled += 1;
        return;
    }

    let width = framebuffer.width() as f32;
    let height = framebuffer.height() as f32;
    let screen = ndc.map(|point| {
        Vec2::new(
            (point.x * 0.5 + 0.5) * width,
            (0.5 - point.y * 0.5) * height,
        )
    });
    let depth = ndc.map(|point| point.z * 0.5 + 0.5);

    let area = edge(screen[0], screen[1], screen[2]);
    if area.abs() <= f32::EPSILON {
        return;
    }

    let min = screen[0].min(screen[1]).min(screen[2]).max(Vec2::ZERO);
    let max = screen[0]
        .max(screen[1])
        .max(screen[2])
        .min(Vec2::new(width, height));
    if min.x >= max.x || min.y >= max.y {
        return;
    }

    let (x0, y0) = (min.x.floor() as u32, min.y.floor() as u32);
    let (x1, y1) = (max.x.ceil() as u32, max.y.ceil() as u32);

    for y in y0..y1.min(framebuffer.height()) {
        for x in x0..x1.min(framebuffer.width()) {
            let centre = Vec2::new(x as f32 + 0.5, y as f32 + 0.5);
            let weights = [
                edge(screen[1], screen[2], centre) / area,
                edge(screen[2], screen[0], centre) / area,
                edge(screen[0], screen[1], centre) / area,
            ];
            if weights.iter().any(|weight| *weight < 0.0) {
                continue;
            }

            let z = weights[0] * depth[0] + weights[1] * depth[1] + weights[2] * depth[2];
            if !(0.0..=1.0).contains(&z) {
                continue;
            }

            let color = vertices[0].color * weights[0]
                + vertices[1].color * weights[1]
                + vertices[2].color * weights[2];
            if framebuffer.write(x, y, z, color) {
                stats.fragments += 1;
            }
        }
    }
}

fn edge(a: Vec2, b: Vec2, p: Vec2) -> f32 {
    (b - a).perp_dot(p - a)
}

#[cfg(test)]
mod tests {
    use super::*;

    const WHITE: Vec4 = Vec4::new(1.0, 1.0, 1.0, 1.0);
    const BLACK: Vec4 = Vec4::new(0.0, 0.0, 0.0, 1.0);

    fn vertex(x: f32, y: f32, z: f32, color: Vec4) -> ClipVertex {
        ClipVertex {
            position: Vec4::new(x, y, z, 1.0),
            color,
        }
    }

    fn full_screen(color: Vec4, z: f32) -> [ClipVertex; 3] {
        [
            vertex(-1.0, -1.0, z, color),
            vertex(3.0, -1.0, z, color),
            vertex(-1.0, 3.0, z, color),
        ]
    }

    #[test]
    fn counter_clockwise_triangles_cover_the_screen() {
        let mut framebuffer = Framebuffer::new(4, 4);
        let mut stats = RasterStats::default();
        draw_triangle(&mut framebuffer, full_screen(BLACK, 0.0), &mut stats);

        assert_eq!(stats.fragments, 16);
        assert_eq!(framebuffer.color(3, 3), BLACK);
    }

    #[test]
    fn clockwise_triangles_are_culled() {
        let mut framebuffer = Framebuffer::new(4, 4);
        let mut stats = RasterStats::default();
        let [a, b, c] = full_screen(BLACK, 0.0);
        draw_triangle(&mut framebuffer, [a, c, b], &mut stats);

        assert_eq!(stats.culled, 1);
        assert_eq!(stats.fragments, 0);
    }

    #[test]
    fn nearer_fragments_win() {
        let mut framebuffer = Framebuffer::new(2, 2);
        let mut stats = RasterStats::default();
        draw_triangle(&mut framebuffer, full_screen(BLACK, -0.5), &mut stats);
        draw_triangle(&mut framebuffer, full_screen(WHITE, 0.5), &mut stats);

        assert_eq!(framebuffer.color(0, 0), BLACK);
        assert!((framebuffer.depth(0, 0) - 0.25).abs() < 1e-6);
    }

    #[test]
    fn triangles_behind_the_eye_are_dropped() {
        let mut framebuffer = Framebuffer::new(2, 2);
        let mut stats = RasterStats::default();
        let mut vertices = full_screen(BLACK, 0.0);
        vertices[1].position.w = -1.0;
        draw_triangle(&mut framebuffer, vertices, &mut stats);

        assert_eq!(stats.clipped, 1);
    }

    #[test]
    fn top_of_ndc_is_the_first_row() {
        let mut framebuffer = Framebuffer::new(2, 2);
        let mut stats = RasterStats::default();
        // Covers only y > 0 in NDC.
        draw_triangle(
            &mut framebuffer,
            [
                vertex(-1.0, 0.0, 0.0, BLACK),
                vertex(3.0, 0.0, 0.0, BLACK),
                vertex(-1.0, 4.0, 0.0, BLACK),
            ],
            &mut stats,
        );

        assert_eq!(framebuffer.color(0, 0), BLACK);
        assert_ne!(framebuffer.color(0, 1), BLACK);
    }
}
