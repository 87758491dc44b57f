//! Ordered-dither post-process: two inks chosen by a Bayer threshold.

use glam::Vec4;
use image::{Rgba, RgbaImage};

use super::framebuffer::Framebuffer;
use crate::scene::error::SceneError;

/// Classic 8×8 Bayer pattern with values 1..=64.
pub const BAYER_8X8: [u8; 64] = [
    1, 49, 13, 61, 4, 52, 16, 64, //
    33, 17, 45, 29, 36, 20, 48, 32, //
    9, 57, 5, 53, 12, 60, 8, 56, //
    41, 25, 37, 21, 44, 28, 40, 24, //
    3, 51, 15, 63, 2, 50, 14, 62, //
    35, 19, 47, 31, 34, 18, 46, 30, //
    11, 59, 7, 55, 10, 58, 6, 54, //
    43, 27, 39, 23, 42, 26, 38, 22, //
];

const LIGHT: [u8; 3] = [255, 255, 255];
const DARK: [u8; 3] = [0, 0, 0];

/// The Bayer pattern scaled onto 0..=255, as uploaded to the threshold texture.
pub fn threshold_texture() -> [u8; 64] {
    BAYER_8X8.map(|value| (u32::from(value) * 255 / 65) as u8)
}

/// Rec. 709 luma of a linear colour, scaled to 0..=255.
pub fn luminance(color: Vec4) -> f32 {
    (0.2126 * color.x + 0.7152 * color.y + 0.0722 * color.z) * 255.0
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Inks {
    pub light: [u8; 3],
    pub dark: [u8; 3],
}

impl Inks {
    pub fn for_mode(dark_mode: bool) -> Self {
        if dark_mode {
            Self {
                light: DARK,
                dark: LIGHT,
            }
        } else {
            Self {
                light: LIGHT,
                dark: DARK,
            }
        }
    }
}

pub struct DitherPass {
    thresholds: [u8; 64],
    inks: Inks,
}

impl DitherPass {
    pub fn new(inks: Inks) -> Self {
        Self {
            thresholds: threshold_texture(),
            inks,
        }
    }

    pub fn threshold(&self, x: u32, y: u32) -> u8 {
        self.thresholds[((y % 8) * 8 + x % 8) as usize]
    }

    pub fn shade(&self, x: u32, y: u32, color: Vec4) -> [u8; 4] {
        let ink = if luminance(color) >= f32::from(self.threshold(x, y)) {
            self.inks.light
        } else {
            self.inks.dark
        };
        let alpha = (color.w.clamp(0.0, 1.0) * 255.0).round() as u8;
        [ink[0], ink[1], ink[2], alpha]
    }

    pub fn apply(&self, framebuffer: &Framebuffer) -> Result<RgbaImage, SceneError> {
        let pixels: Vec<[u8; 4]> = framebuffer
            .pixels()
            .map(|(x, y, color)| self.shade(x, y, color))
            .collect();

        RgbaImage::from_raw(
            framebuffer.width(),
            framebuffer.height(),
            bytemuck::cast_slice::<[u8; 4], u8>(&pixels).to_vec(),
        )
        .ok_or_else(|| {
            SceneError::out_of_bounds(
                "framebuffer",
                "dither",
                format!(
                    "{} pixels do not fill {}x{}",
                    pixels.len(),
                    framebuffer.width(),
                    framebuffer.height()
                ),
            )
        })
    }
}

/// Count of pixels drawn in the given ink, ignoring alpha.
pub fn count_ink(image: &RgbaImage, ink: [u8; 3]) -> usize {
    image
        .pixels()
        .filter(|Rgba([r, g, b, _])| [*r, *g, *b] == ink)
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thresholds_are_scaled_bayer_values() {
        let thresholds = threshold_texture();
        assert_eq!(thresholds[0], 3);
        assert_eq!(thresholds[7], 251);
        assert_eq!(thresholds.iter().copied().max(), Some(251));
    }

    #[test]
    fn white_is_always_light_and_black_always_dark() {
        let pass = DitherPass::new(Inks::for_mode(false));
        for y in 0..8 {
            for x in 0..8 {
                assert_eq!(pass.shade(x, y, Vec4::ONE)[..3], LIGHT);
                assert_eq!(pass.shade(x, y, Vec4::new(0.0, 0.0, 0.0, 1.0))[..3], DARK);
            }
        }
    }

    #[test]
    fn mid_grey_produces_a_mix_and_keeps_alpha() {
        let mut framebuffer = Framebuffer::new(8, 8);
        for y in 0..8 {
            for x in 0..8 {
                framebuffer.write(x, y, 0.0, Vec4::new(0.5, 0.5, 0.5, 1.0));
            }
        }
        let image = DitherPass::new(Inks::for_mode(false))
            .apply(&framebuffer)
            .expect("image");

        let light = count_ink(&image, LIGHT);
        let dark = count_ink(&image, DARK);
        assert_eq!(light + dark, 64);
        assert!(light > 16 && dark > 16);
        assert!(image.pixels().all(|pixel| pixel.0[3] == 255));
    }

    #[test]
    fn dark_mode_swaps_inks() {
        let pass = DitherPass::new(Inks::for_mode(true));
        assert_eq!(pass.shade(0, 0, Vec4::ONE)[..3], DARK);
        assert_eq!(pass.shade(0, 0, Vec4::new(0.0, 0.0, 0.0, 0.0)), [255, 255, 255, 0]);
    }
}
