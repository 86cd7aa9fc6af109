use cgmath::{InnerSpace, Vector3};

use crate::common::RgbaColor;

/// A light source attached to a scene node.
#[derive(Debug, Clone, PartialEq)]
pub enum Light {
    /// Parallel rays travelling along `direction`.
    Directional {
        color: RgbaColor,
        direction: Vector3<f32>,
    },
    /// Uniform light reaching every surface.
    Ambient { color: RgbaColor },
}

impl Light {
    pub fn directional(color: RgbaColor, direction: Vector3<f32>) -> Self {
        Self::Directional {
            color,
            direction: direction.normalize(),
        }
    }

    pub fn ambient(color: RgbaColor) -> Self {
        Self::Ambient { color }
    }

    pub fn color(&self) -> RgbaColor {
        match self {
            Self::Directional { color, .. } | Self::Ambient { color } => *color,
        }
    }

    pub fn set_color(&mut self, new_color: RgbaColor) {
        match self {
            Self::Directional { color, .. } | Self::Ambient { color } => *color = new_color,
        }
    }

    pub fn is_ambient(&self) -> bool {
        matches!(self, Self::Ambient { .. })
    }
}
