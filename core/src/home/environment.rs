use serde::{Deserialize, Serialize};

use super::event::EnvironmentProperty;

/// Sky, ground and lighting settings of a home.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Environment {
    pub sky_color: u32,
    pub sky_texture: Option<String>,
    pub ground_color: u32,
    pub ground_texture: Option<String>,
    pub light_color: u32,
    /// Transparency of walls, `0` opaque.
    pub walls_alpha: f32,
    pub background_image_visible_on_ground_3d: bool,
    pub all_levels_visible: bool,
}

impl Environment {
    /// Returns whether two environments differ on `property`.
    pub(crate) fn differs(&self, other: &Environment, property: EnvironmentProperty) -> bool {
        match property {
            EnvironmentProperty::SkyColor => self.sky_color != other.sky_color,
            EnvironmentProperty::SkyTexture => self.sky_texture != other.sky_texture,
            EnvironmentProperty::GroundColor => self.ground_color != other.ground_color,
            EnvironmentProperty::GroundTexture => self.ground_texture != other.ground_texture,
            EnvironmentProperty::LightColor => self.light_color != other.light_color,
            EnvironmentProperty::WallsAlpha => self.walls_alpha != other.walls_alpha,
            EnvironmentProperty::BackgroundImageVisibleOnGround3D => {
                self.background_image_visible_on_ground_3d != other.background_image_visible_on_ground_3d
            }
            EnvironmentProperty::AllLevelsVisible => self.all_levels_visible != other.all_levels_visible,
        }
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self {
            sky_color: 0xCCE4FC,
            sky_texture: None,
            ground_color: 0xA8553F,
            ground_texture: None,
            light_color: 0xD0D0D0,
            walls_alpha: 0.0,
            background_image_visible_on_ground_3d: false,
            all_levels_visible: false,
        }
    }
}

/// Length unit used to format dimension lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LengthUnit {
    Millimeter,
    Centimeter,
    Meter,
    Inch,
}

impl LengthUnit {
    /// Formats a length given in centimeters.
    pub fn format(self, centimeters: f32) -> String {
        match self {
            Self::Millimeter => format!("{:.0} mm", centimeters * 10.0),
            Self::Centimeter => format!("{:.1} cm", centimeters),
            Self::Meter => format!("{:.3} m", centimeters / 100.0),
            Self::Inch => format!("{:.1}\"", centimeters / 2.54),
        }
    }
}

/// User preferences the 3D view depends on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preferences {
    pub unit: LengthUnit,
    pub default_font_name: Option<String>,
    pub editing_in_3d_enabled: bool,
    pub navigation_panel_visible: bool,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            unit: LengthUnit::Centimeter,
            default_font_name: None,
            editing_in_3d_enabled: false,
            navigation_panel_visible: false,
        }
    }
}
