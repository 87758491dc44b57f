use glam::Vec4;

const CLEAR_COLOR: Vec4 = Vec4::new(1.0, 1.0, 1.0, 0.0);
const CLEAR_DEPTH: f32 = 1.0;

/// Offscreen colour and depth targets of the scene pass.
#[derive(Debug, Clone)]
pub struct Framebuffer {
    width: u32,
    height: u32,
    color: Vec<Vec4>,
    depth: Vec<f32>,
}

impl Framebuffer {
    pub fn new(width: u32, height: u32) -> Self {
        let len = width as usize * height as usize;
        Self {
            width,
            height,
            color: vec![CLEAR_COLOR; len],
            depth: vec![CLEAR_DEPTH; len],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn clear(&mut self) {
        self.color.fill(CLEAR_COLOR);
        self.depth.fill(CLEAR_DEPTH);
    }

    pub fn color(&self, x: u32, y: u32) -> Vec4 {
        self.color[self.index(x, y)]
    }

    pub fn depth(&self, x: u32, y: u32) -> f32 {
        self.depth[self.index(x, y)]
    }

    /// Depth-tested (less or equal) write with premultiplied "over" blending.
    /// Returns whether the fragment passed.
    pub fn write(&mut self, x: u32, y: u32, depth: f32, color: Vec4) -> bool {
        let index = self.index(x, y);
        if depth > self.depth[index] {
            return false;
        }

        self.depth[index] = depth;
        let dst = self.color[index];
        self.color[index] = color + dst * (1.0 - color.w);
        true
    }

    pub fn pixels(&self) -> impl Iterator<Item = (u32, u32, Vec4)> + '_ {
        let width = self.width;
        self.color.iter().enumerate().map(move |(index, color)| {
            let index = index as u32;
            (index % width, index / width, *color)
        })
    }

    fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn depth_test_is_less_or_equal() {
        let mut framebuffer = Framebuffer::new(2, 2);
        let red = Vec4::new(1.0, 0.0, 0.0, 1.0);
        let blue = Vec4::new(0.0, 0.0, 1.0, 1.0);

        assert!(framebuffer.write(1, 1, 0.5, red));
        assert!(!framebuffer.write(1, 1, 0.6, blue));
        assert!(framebuffer.write(1, 1, 0.5, blue));
        assert_eq!(framebuffer.color(1, 1), blue);
    }

    #[test]
    fn opaque_fragments_replace_the_clear_colour() {
        let mut framebuffer = Framebuffer::new(1, 1);
        let grey = Vec4::new(0.5, 0.5, 0.5, 1.0);
        framebuffer.write(0, 0, 0.0, grey);
        assert_eq!(framebuffer.color(0, 0), grey);

        framebuffer.clear();
        assert_eq!(framebuffer.color(0, 0), CLEAR_COLOR);
        assert_eq!(framebuffer.depth(0, 0), CLEAR_DEPTH);
    }
}
