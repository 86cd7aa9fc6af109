use serde::{Deserialize, Serialize};

use crate::common::{polygon_bounds, rectangle_intersects_polygon, rotated_rectangle, Point2, Rect2};

use super::event::{
    DimensionLineProperty, LabelProperty, PieceProperty, PolylineProperty, PropertyValue, RoomProperty,
    WallProperty,
};
use super::{LevelId, ObjectId};

/// Discriminant of [`HomeItem`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObjectKind {
    Wall,
    Room,
    Piece,
    FurnitureGroup,
    Polyline,
    DimensionLine,
    Label,
}

impl ObjectKind {
    pub fn is_furniture(self) -> bool {
        matches!(self, Self::Piece | Self::FurnitureGroup)
    }
}

/// A wall segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wall {
    pub x_start: f32,
    pub y_start: f32,
    pub x_end: f32,
    pub y_end: f32,
    pub thickness: f32,
    /// Height at start; the home default wall height applies when unset.
    pub height: Option<f32>,
    /// Height at end for sloping walls.
    pub height_at_end: Option<f32>,
    pub wall_at_start: Option<ObjectId>,
    pub wall_at_end: Option<ObjectId>,
    pub left_side_color: Option<u32>,
    pub right_side_color: Option<u32>,
    pub pattern: Option<String>,
    pub level: Option<LevelId>,
}

impl Wall {
    pub fn new(x_start: f32, y_start: f32, x_end: f32, y_end: f32, thickness: f32) -> Self {
        Self {
            x_start,
            y_start,
            x_end,
            y_end,
            thickness,
            height: None,
            height_at_end: None,
            wall_at_start: None,
            wall_at_end: None,
            left_side_color: None,
            right_side_color: None,
            pattern: None,
            level: None,
        }
    }

    pub fn with_height(mut self, height: f32) -> Self {
        self.height = Some(height);
        self
    }

    pub fn at_level(mut self, level: Option<LevelId>) -> Self {
        self.level = level;
        self
    }

    pub fn length(&self) -> f32 {
        (self.x_end - self.x_start).hypot(self.y_end - self.y_start)
    }

    /// Outline of the wall in plan: the segment widened by its thickness.
    pub fn points(&self) -> [Point2; 4] {
        let length = self.length();
        let angle = (self.y_end - self.y_start).atan2(self.x_end - self.x_start);
        let x = (self.x_start + self.x_end) / 2.0;
        let y = (self.y_start + self.y_end) / 2.0;
        rotated_rectangle(x, y, length, self.thickness, angle)
    }

    /// Returns `true` if the wall outline crosses the given plan rectangle.
    pub fn intersects_rectangle(&self, rect: &Rect2) -> bool {
        rectangle_intersects_polygon(rect, &self.points())
    }

    pub fn property_value(&self, property: WallProperty) -> PropertyValue {
        use WallProperty::*;
        match property {
            XStart => PropertyValue::Float(self.x_start),
            YStart => PropertyValue::Float(self.y_start),
            XEnd => PropertyValue::Float(self.x_end),
            YEnd => PropertyValue::Float(self.y_end),
            Thickness => PropertyValue::Float(self.thickness),
            Height => PropertyValue::OptFloat(self.height),
            HeightAtEnd => PropertyValue::OptFloat(self.height_at_end),
            WallAtStart => PropertyValue::Item(self.wall_at_start),
            WallAtEnd => PropertyValue::Item(self.wall_at_end),
            LeftSideColor => PropertyValue::Color(self.left_side_color),
            RightSideColor => PropertyValue::Color(self.right_side_color),
            Pattern => PropertyValue::Text(self.pattern.clone()),
            Level => PropertyValue::Level(self.level),
        }
    }
}

/// A room floor/ceiling polygon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Room {
    pub name: Option<String>,
    pub points: Vec<Point2>,
    pub floor_visible: bool,
    pub ceiling_visible: bool,
    pub floor_color: Option<u32>,
    pub floor_texture: Option<String>,
    pub floor_shininess: f32,
    pub ceiling_color: Option<u32>,
    pub ceiling_texture: Option<String>,
    pub ceiling_shininess: f32,
    pub ceiling_flat: bool,
    pub level: Option<LevelId>,
}

impl Room {
    pub fn new(points: Vec<Point2>) -> Self {
        Self {
            name: None,
            points,
            floor_visible: true,
            ceiling_visible: true,
            floor_color: None,
            floor_texture: None,
            floor_shininess: 0.0,
            ceiling_color: None,
            ceiling_texture: None,
            ceiling_shininess: 0.0,
            ceiling_flat: false,
            level: None,
        }
    }

    pub fn at_level(mut self, level: Option<LevelId>) -> Self {
        self.level = level;
        self
    }

    /// Center of the room bounding rectangle.
    pub fn center(&self) -> Point2 {
        polygon_bounds(&self.points)
            .map(|r| [(r.min_x + r.max_x) / 2.0, (r.min_y + r.max_y) / 2.0])
            .unwrap_or([0.0, 0.0])
    }

    pub fn property_value(&self, property: RoomProperty) -> PropertyValue {
        use RoomProperty::*;
        match property {
            Name => PropertyValue::Text(self.name.clone()),
            Points => PropertyValue::Points(self.points.clone()),
            FloorVisible => PropertyValue::Bool(self.floor_visible),
            CeilingVisible => PropertyValue::Bool(self.ceiling_visible),
            FloorColor => PropertyValue::Color(self.floor_color),
            FloorTexture => PropertyValue::Text(self.floor_texture.clone()),
            FloorShininess => PropertyValue::Float(self.floor_shininess),
            CeilingColor => PropertyValue::Color(self.ceiling_color),
            CeilingTexture => PropertyValue::Text(self.ceiling_texture.clone()),
            CeilingShininess => PropertyValue::Float(self.ceiling_shininess),
            CeilingFlat => PropertyValue::Bool(self.ceiling_flat),
            Level => PropertyValue::Level(self.level),
        }
    }
}

/// A single piece of furniture, door or window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Piece {
    pub name: String,
    pub x: f32,
    pub y: f32,
    pub elevation: f32,
    pub angle: f32,
    pub roll: f32,
    pub pitch: f32,
    pub width: f32,
    pub depth: f32,
    pub height: f32,
    pub door_or_window: bool,
    /// SVG path of the hole cut in the upper floor by a staircase.
    pub staircase_cut_out_shape: Option<String>,
    /// SVG path of the opening cut in walls by a door or window.
    pub cut_out_shape: Option<String>,
    pub visible: bool,
    pub model: Option<String>,
    pub model_mirrored: bool,
    pub color: Option<u32>,
    pub texture: Option<String>,
    pub shininess: f32,
    pub power: f32,
    pub level: Option<LevelId>,
}

impl Piece {
    pub fn new(name: impl Into<String>, x: f32, y: f32, width: f32, depth: f32, height: f32) -> Self {
        Self {
            name: name.into(),
            x,
            y,
            elevation: 0.0,
            angle: 0.0,
            roll: 0.0,
            pitch: 0.0,
            width,
            depth,
            height,
            door_or_window: false,
            staircase_cut_out_shape: None,
            cut_out_shape: None,
            visible: true,
            model: None,
            model_mirrored: false,
            color: None,
            texture: None,
            shininess: 0.0,
            power: 0.0,
            level: None,
        }
    }

    pub fn door_or_window(mut self) -> Self {
        self.door_or_window = true;
        self
    }

    pub fn staircase(mut self, cut_out_shape: impl Into<String>) -> Self {
        self.staircase_cut_out_shape = Some(cut_out_shape.into());
        self
    }

    pub fn at_level(mut self, level: Option<LevelId>) -> Self {
        self.level = level;
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn is_staircase(&self) -> bool {
        self.staircase_cut_out_shape.is_some()
    }

    /// Plan footprint corners.
    pub fn points(&self) -> [Point2; 4] {
        rotated_rectangle(self.x, self.y, self.width_in_plan(), self.depth_in_plan(), self.angle)
    }

    /// Extents of the piece once rotated by its pitch and roll, in its own frame.
    fn rotated_extents(&self) -> (f32, f32, f32) {
        if self.roll == 0.0 && self.pitch == 0.0 {
            return (self.width, self.depth, self.height);
        }
        let (sin_pitch, cos_pitch) = self.pitch.sin_cos();
        let (sin_roll, cos_roll) = self.roll.sin_cos();
        // Pitch turns around the width axis, roll around the depth axis
        let width = self.width * cos_roll.abs() + self.height * sin_roll.abs();
        let height_after_roll = self.width * sin_roll.abs() + self.height * cos_roll.abs();
        let depth = self.depth * cos_pitch.abs() + height_after_roll * sin_pitch.abs();
        let height = self.depth * sin_pitch.abs() + height_after_roll * cos_pitch.abs();
        (width, depth, height)
    }

    pub fn width_in_plan(&self) -> f32 {
        self.rotated_extents().0
    }

    pub fn depth_in_plan(&self) -> f32 {
        self.rotated_extents().1
    }

    pub fn height_in_plan(&self) -> f32 {
        self.rotated_extents().2
    }

    pub fn property_value(&self, property: PieceProperty) -> PropertyValue {
        use PieceProperty::*;
        match property {
            Name => PropertyValue::Text(Some(self.name.clone())),
            X => PropertyValue::Float(self.x),
            Y => PropertyValue::Float(self.y),
            Elevation => PropertyValue::Float(self.elevation),
            Angle => PropertyValue::Float(self.angle),
            Roll => PropertyValue::Float(self.roll),
            Pitch => PropertyValue::Float(self.pitch),
            Width => PropertyValue::Float(self.width),
            Depth => PropertyValue::Float(self.depth),
            Height => PropertyValue::Float(self.height),
            StaircaseCutOutShape => PropertyValue::Text(self.staircase_cut_out_shape.clone()),
            CutOutShape => PropertyValue::Text(self.cut_out_shape.clone()),
            Visible => PropertyValue::Bool(self.visible),
            Model => PropertyValue::Text(self.model.clone()),
            ModelMirrored => PropertyValue::Bool(self.model_mirrored),
            Color => PropertyValue::Color(self.color),
            Texture => PropertyValue::Text(self.texture.clone()),
            Shininess => PropertyValue::Float(self.shininess),
            Power => PropertyValue::Float(self.power),
            Level => PropertyValue::Level(self.level),
        }
    }

    /// Writes back a float geometry value, used to rebuild the footprint a
    /// piece had before a move.
    pub fn with_float_property(mut self, property: PieceProperty, value: f32) -> Self {
        match property {
            PieceProperty::X => self.x = value,
            PieceProperty::Y => self.y = value,
            PieceProperty::Angle => self.angle = value,
            PieceProperty::Roll => self.roll = value,
            PieceProperty::Pitch => self.pitch = value,
            PieceProperty::Width => self.width = value,
            PieceProperty::Depth => self.depth = value,
            PieceProperty::Height => self.height = value,
            PieceProperty::Elevation => self.elevation = value,
            _ => {}
        }
        self
    }
}

/// A group of furniture. It has no visual representation of its own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FurnitureGroup {
    pub name: String,
    pub children: Vec<ObjectId>,
    pub visible: bool,
    pub level: Option<LevelId>,
}

/// A free polyline drawn in plan, optionally displayed in 3D.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Polyline {
    pub points: Vec<Point2>,
    pub thickness: f32,
    pub closed: bool,
    pub color: u32,
    pub elevation: f32,
    pub visible_in_3d: bool,
    pub level: Option<LevelId>,
}

impl Polyline {
    pub fn new(points: Vec<Point2>) -> Self {
        Self {
            points,
            thickness: 1.0,
            closed: false,
            color: 0x000000,
            elevation: 0.0,
            visible_in_3d: false,
            level: None,
        }
    }

    pub fn property_value(&self, property: PolylineProperty) -> PropertyValue {
        use PolylineProperty::*;
        match property {
            Points => PropertyValue::Points(self.points.clone()),
            Thickness => PropertyValue::Float(self.thickness),
            Closed => PropertyValue::Bool(self.closed),
            Color => PropertyValue::Color(Some(self.color)),
            Elevation => PropertyValue::Float(self.elevation),
            VisibleIn3D => PropertyValue::Bool(self.visible_in_3d),
            Level => PropertyValue::Level(self.level),
        }
    }
}

/// A measurement line between two plan points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DimensionLine {
    pub x_start: f32,
    pub y_start: f32,
    pub x_end: f32,
    pub y_end: f32,
    pub offset: f32,
    pub elevation_start: f32,
    pub elevation_end: f32,
    pub visible_in_3d: bool,
    pub level: Option<LevelId>,
}

impl DimensionLine {
    pub fn new(x_start: f32, y_start: f32, x_end: f32, y_end: f32, offset: f32) -> Self {
        Self {
            x_start,
            y_start,
            x_end,
            y_end,
            offset,
            elevation_start: 0.0,
            elevation_end: 0.0,
            visible_in_3d: false,
            level: None,
        }
    }

    pub fn length(&self) -> f32 {
        (self.x_end - self.x_start).hypot(self.y_end - self.y_start)
    }

    pub fn property_value(&self, property: DimensionLineProperty) -> PropertyValue {
        use DimensionLineProperty::*;
        match property {
            XStart => PropertyValue::Float(self.x_start),
            YStart => PropertyValue::Float(self.y_start),
            XEnd => PropertyValue::Float(self.x_end),
            YEnd => PropertyValue::Float(self.y_end),
            Offset => PropertyValue::Float(self.offset),
            ElevationStart => PropertyValue::Float(self.elevation_start),
            ElevationEnd => PropertyValue::Float(self.elevation_end),
            VisibleIn3D => PropertyValue::Bool(self.visible_in_3d),
            Level => PropertyValue::Level(self.level),
        }
    }
}

/// A text label. Labels with a pitch are displayed in 3D.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Label {
    pub text: String,
    pub x: f32,
    pub y: f32,
    pub pitch: Option<f32>,
    pub elevation: f32,
    pub color: Option<u32>,
    pub level: Option<LevelId>,
}

impl Label {
    pub fn new(text: impl Into<String>, x: f32, y: f32) -> Self {
        Self {
            text: text.into(),
            x,
            y,
            pitch: None,
            elevation: 0.0,
            color: None,
            level: None,
        }
    }

    pub fn property_value(&self, property: LabelProperty) -> PropertyValue {
        use LabelProperty::*;
        match property {
            Text => PropertyValue::Text(Some(self.text.clone())),
            X => PropertyValue::Float(self.x),
            Y => PropertyValue::Float(self.y),
            Pitch => PropertyValue::OptFloat(self.pitch),
            Elevation => PropertyValue::Float(self.elevation),
            Color => PropertyValue::Color(self.color),
            Level => PropertyValue::Level(self.level),
        }
    }
}

/// Any item of a home displayed in 3D.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum HomeItem {
    Wall(Wall),
    Room(Room),
    Piece(Piece),
    FurnitureGroup(FurnitureGroup),
    Polyline(Polyline),
    DimensionLine(DimensionLine),
    Label(Label),
}

impl HomeItem {
    pub fn kind(&self) -> ObjectKind {
        match self {
            Self::Wall(_) => ObjectKind::Wall,
            Self::Room(_) => ObjectKind::Room,
            Self::Piece(_) => ObjectKind::Piece,
            Self::FurnitureGroup(_) => ObjectKind::FurnitureGroup,
            Self::Polyline(_) => ObjectKind::Polyline,
            Self::DimensionLine(_) => ObjectKind::DimensionLine,
            Self::Label(_) => ObjectKind::Label,
        }
    }

    pub fn level(&self) -> Option<LevelId> {
        match self {
            Self::Wall(wall) => wall.level,
            Self::Room(room) => room.level,
            Self::Piece(piece) => piece.level,
            Self::FurnitureGroup(group) => group.level,
            Self::Polyline(polyline) => polyline.level,
            Self::DimensionLine(line) => line.level,
            Self::Label(label) => label.level,
        }
    }

    pub fn as_wall(&self) -> Option<&Wall> {
        match self {
            Self::Wall(wall) => Some(wall),
            _ => None,
        }
    }

    pub fn as_room(&self) -> Option<&Room> {
        match self {
            Self::Room(room) => Some(room),
            _ => None,
        }
    }

    pub fn as_piece(&self) -> Option<&Piece> {
        match self {
            Self::Piece(piece) => Some(piece),
            _ => None,
        }
    }
}
