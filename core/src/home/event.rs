use serde::{Deserialize, Serialize};

use crate::common::Point2;

use super::items::ObjectKind;
use super::{CameraKind, LevelId, ObjectId};

/// Value carried by a property change notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PropertyValue {
    None,
    Float(f32),
    OptFloat(Option<f32>),
    Bool(bool),
    Color(Option<u32>),
    Text(Option<String>),
    Points(Vec<Point2>),
    Level(Option<LevelId>),
    Item(Option<ObjectId>),
}

impl PropertyValue {
    pub fn as_float(&self) -> Option<f32> {
        match self {
            Self::Float(value) => Some(*value),
            Self::OptFloat(value) => *value,
            _ => None,
        }
    }

    pub fn as_points(&self) -> Option<&[Point2]> {
        match self {
            Self::Points(points) => Some(points),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WallProperty {
    XStart,
    YStart,
    XEnd,
    YEnd,
    Thickness,
    Height,
    HeightAtEnd,
    WallAtStart,
    WallAtEnd,
    LeftSideColor,
    RightSideColor,
    Pattern,
    Level,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RoomProperty {
    Name,
    Points,
    FloorVisible,
    CeilingVisible,
    FloorColor,
    FloorTexture,
    FloorShininess,
    CeilingColor,
    CeilingTexture,
    CeilingShininess,
    CeilingFlat,
    Level,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PieceProperty {
    Name,
    X,
    Y,
    Elevation,
    Angle,
    Roll,
    Pitch,
    Width,
    Depth,
    Height,
    StaircaseCutOutShape,
    CutOutShape,
    Visible,
    Model,
    ModelMirrored,
    Color,
    Texture,
    Shininess,
    Power,
    Level,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PolylineProperty {
    Points,
    Thickness,
    Closed,
    Color,
    Elevation,
    VisibleIn3D,
    Level,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DimensionLineProperty {
    XStart,
    YStart,
    XEnd,
    YEnd,
    Offset,
    ElevationStart,
    ElevationEnd,
    VisibleIn3D,
    Level,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LabelProperty {
    Text,
    X,
    Y,
    Pitch,
    Elevation,
    Color,
    Level,
}

/// Property of one home item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ItemProperty {
    Wall(WallProperty),
    Room(RoomProperty),
    Piece(PieceProperty),
    Polyline(PolylineProperty),
    DimensionLine(DimensionLineProperty),
    Label(LabelProperty),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LevelProperty {
    Name,
    Elevation,
    Height,
    FloorThickness,
    Visible,
    Viewable,
    BackgroundImage,
    ElevationIndex,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EnvironmentProperty {
    SkyColor,
    SkyTexture,
    GroundColor,
    GroundTexture,
    LightColor,
    WallsAlpha,
    BackgroundImageVisibleOnGround3D,
    AllLevelsVisible,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CameraProperty {
    X,
    Y,
    Z,
    Yaw,
    Pitch,
    FieldOfView,
}

/// Properties of the home itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HomeProperty {
    /// The active camera switched between top and observer.
    Camera,
    BackgroundImage,
    WallHeight,
    SelectedLevel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PreferenceProperty {
    Unit,
    DefaultFontName,
    EditingIn3DEnabled,
    NavigationPanelVisible,
}

/// Whether an item entered or left a collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CollectionChange {
    /// Added at the given position of its collection, or appended.
    Added { index: Option<usize> },
    Deleted,
}

/// Notification fired by [`super::Home`] after every mutation.
#[derive(Debug, Clone, PartialEq)]
pub enum HomeEvent {
    /// An item entered or left one of the home collections. Furniture in a
    /// group is reported through its top-level group.
    Collection {
        kind: ObjectKind,
        item: ObjectId,
        change: CollectionChange,
    },
    ItemChanged {
        item: ObjectId,
        property: ItemProperty,
        old: PropertyValue,
        new: PropertyValue,
    },
    LevelCollection {
        level: LevelId,
        change: CollectionChange,
    },
    LevelChanged {
        level: LevelId,
        property: LevelProperty,
        old: PropertyValue,
        new: PropertyValue,
    },
    EnvironmentChanged { property: EnvironmentProperty },
    HomeChanged { property: HomeProperty },
    CameraChanged {
        camera: CameraKind,
        property: CameraProperty,
    },
    SelectionChanged {
        old: Vec<ObjectId>,
        new: Vec<ObjectId>,
    },
    PreferenceChanged { property: PreferenceProperty },
}

/// Channel a listener subscribes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListenerKind {
    WallCollection,
    RoomCollection,
    FurnitureCollection,
    PolylineCollection,
    DimensionLineCollection,
    LabelCollection,
    WallProperty,
    RoomProperty,
    FurnitureProperty,
    PolylineProperty,
    DimensionLineProperty,
    LabelProperty,
    LevelCollection,
    LevelProperty,
    Environment,
    Home,
    Camera,
    Selection,
    Preferences,
}

impl HomeEvent {
    /// Returns the channel this event is delivered on.
    pub fn listener_kind(&self) -> ListenerKind {
        match self {
            Self::Collection { kind, .. } => match kind {
                ObjectKind::Wall => ListenerKind::WallCollection,
                ObjectKind::Room => ListenerKind::RoomCollection,
                ObjectKind::Piece | ObjectKind::FurnitureGroup => ListenerKind::FurnitureCollection,
                ObjectKind::Polyline => ListenerKind::PolylineCollection,
                ObjectKind::DimensionLine => ListenerKind::DimensionLineCollection,
                ObjectKind::Label => ListenerKind::LabelCollection,
            },
            Self::ItemChanged { property, .. } => match property {
                ItemProperty::Wall(_) => ListenerKind::WallProperty,
                ItemProperty::Room(_) => ListenerKind::RoomProperty,
                ItemProperty::Piece(_) => ListenerKind::FurnitureProperty,
                ItemProperty::Polyline(_) => ListenerKind::PolylineProperty,
                ItemProperty::DimensionLine(_) => ListenerKind::DimensionLineProperty,
                ItemProperty::Label(_) => ListenerKind::LabelProperty,
            },
            Self::LevelCollection { .. } => ListenerKind::LevelCollection,
            Self::LevelChanged { .. } => ListenerKind::LevelProperty,
            Self::EnvironmentChanged { .. } => ListenerKind::Environment,
            Self::HomeChanged { .. } => ListenerKind::Home,
            Self::CameraChanged { .. } => ListenerKind::Camera,
            Self::SelectionChanged { .. } => ListenerKind::Selection,
            Self::PreferenceChanged { .. } => ListenerKind::Preferences,
        }
    }
}
