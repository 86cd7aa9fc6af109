use serde::{Deserialize, Serialize};

/// A linear RGBA color with components in `[0, 1]`.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct RgbaColor {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl RgbaColor {
    pub const WHITE: Self = Self::rgb(1.0, 1.0, 1.0);
    pub const BLACK: Self = Self::rgb(0.0, 0.0, 0.0);
    pub const RED: Self = Self::rgb(1.0, 0.0, 0.0);
    pub const GRAY: Self = Self::rgb(0.5, 0.5, 0.5);

    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    /// Decodes a packed `0xRRGGBB` integer as stored in home documents.
    pub fn from_packed_rgb(rgb: u32) -> Self {
        Self::rgb(
            ((rgb >> 16) & 0xFF) as f32 / 255.0,
            ((rgb >> 8) & 0xFF) as f32 / 255.0,
            (rgb & 0xFF) as f32 / 255.0,
        )
    }

    /// Encodes the color back to `0xRRGGBB`, dropping alpha.
    pub fn to_packed_rgb(&self) -> u32 {
        let channel = |c: f32| ((c.clamp(0.0, 1.0) * 255.0).round() as u32) & 0xFF;
        (channel(self.r) << 16) | (channel(self.g) << 8) | channel(self.b)
    }

    /// Component-wise product, used to tint a light by the environment light color.
    pub fn modulate(&self, other: &RgbaColor) -> Self {
        Self {
            r: self.r * other.r,
            g: self.g * other.g,
            b: self.b * other.b,
            a: self.a * other.a,
        }
    }

    pub fn with_alpha(mut self, a: f32) -> Self {
        self.a = a;
        self
    }
}

impl Default for RgbaColor {
    fn default() -> Self {
        Self::WHITE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_packed_rgb_decoding() {
        let color = RgbaColor::from_packed_rgb(0xFF8000);
        assert_eq!(color.r, 1.0);
        assert!((color.g - 128.0 / 255.0).abs() < 1e-6);
        assert_eq!(color.b, 0.0);
        assert_eq!(color.a, 1.0);
        assert_eq!(color.to_packed_rgb(), 0xFF8000);
    }

    #[test]
    fn test_modulate() {
        let light = RgbaColor::rgb(0.9, 0.9, 0.9);
        let tint = RgbaColor::rgb(1.0, 0.5, 0.0);
        let tinted = light.modulate(&tint);
        assert!((tinted.r - 0.9).abs() < 1e-6);
        assert!((tinted.g - 0.45).abs() < 1e-6);
        assert_eq!(tinted.b, 0.0);
    }
}
