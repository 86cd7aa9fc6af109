use serde::{Deserialize, Serialize};

use super::event::{CameraProperty, LevelProperty, PropertyValue};

/// A storey of the home.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Level {
    pub name: String,
    pub elevation: f32,
    pub floor_thickness: f32,
    pub height: f32,
    pub visible: bool,
    pub viewable: bool,
    pub elevation_index: i32,
    pub background_image: Option<String>,
}

impl Level {
    pub fn new(name: impl Into<String>, elevation: f32, floor_thickness: f32, height: f32) -> Self {
        Self {
            name: name.into(),
            elevation,
            floor_thickness,
            height,
            visible: true,
            viewable: true,
            elevation_index: 0,
            background_image: None,
        }
    }

    /// Items of a level are displayed only when it is both viewable and visible.
    pub fn is_viewable_and_visible(&self) -> bool {
        self.viewable && self.visible
    }

    pub fn property_value(&self, property: LevelProperty) -> PropertyValue {
        match property {
            LevelProperty::Name => PropertyValue::Text(Some(self.name.clone())),
            LevelProperty::Elevation => PropertyValue::Float(self.elevation),
            LevelProperty::Height => PropertyValue::Float(self.height),
            LevelProperty::FloorThickness => PropertyValue::Float(self.floor_thickness),
            LevelProperty::Visible => PropertyValue::Bool(self.visible),
            LevelProperty::Viewable => PropertyValue::Bool(self.viewable),
            LevelProperty::BackgroundImage => PropertyValue::Text(self.background_image.clone()),
            LevelProperty::ElevationIndex => PropertyValue::Float(self.elevation_index as f32),
        }
    }
}

/// The two cameras a home keeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CameraKind {
    /// Aerial view turning around the home.
    Top,
    /// Virtual visitor walking in the home.
    Observer,
}

/// Camera location and orientation in plan coordinates; `z` is the eye elevation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub yaw: f32,
    pub pitch: f32,
    /// Horizontal field of view in radians, zero meaning "use the default".
    pub field_of_view: f32,
}

impl Camera {
    pub fn new(x: f32, y: f32, z: f32, yaw: f32, pitch: f32, field_of_view: f32) -> Self {
        Self { x, y, z, yaw, pitch, field_of_view }
    }

    pub fn property_value(&self, property: CameraProperty) -> f32 {
        match property {
            CameraProperty::X => self.x,
            CameraProperty::Y => self.y,
            CameraProperty::Z => self.z,
            CameraProperty::Yaw => self.yaw,
            CameraProperty::Pitch => self.pitch,
            CameraProperty::FieldOfView => self.field_of_view,
        }
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(50.0, 1050.0, 1010.0, std::f32::consts::PI / 4.0 * 7.0, std::f32::consts::PI / 16.0, 63f32.to_radians())
    }
}
