//! In-memory home model observed by the 3D view.
//!
//! The 3D engine never owns this data: it reads it from listener callbacks
//! and from deferred tasks. Every mutation goes through a [`Home`] method that
//! fires a [`HomeEvent`] to the listeners registered for its channel.

mod environment;
mod event;
mod items;
mod level;

use std::collections::HashMap;
use std::rc::Rc;

pub use environment::{Environment, LengthUnit, Preferences};
pub use event::{
    CameraProperty, CollectionChange, DimensionLineProperty, EnvironmentProperty, HomeEvent, HomeProperty,
    ItemProperty, LabelProperty, LevelProperty, ListenerKind, PieceProperty, PolylineProperty,
    PreferenceProperty, PropertyValue, RoomProperty, WallProperty,
};
pub use items::{
    DimensionLine, FurnitureGroup, HomeItem, Label, ObjectKind, Piece, Polyline, Room, Wall,
};
pub use level::{Camera, CameraKind, Level};

/// Identity of a home item.
pub type ObjectId = u32;

/// Identity of a level.
pub type LevelId = u32;

/// Handle returned by [`Home::add_listener`].
pub type ListenerId = u32;

/// Callback notified of home mutations.
pub type HomeListener = Rc<dyn Fn(&Home, &HomeEvent)>;

/// Default wall height, in centimeters.
pub const DEFAULT_WALL_HEIGHT: f32 = 250.0;

/// Generates a `modify_*` method applying `update` to one item kind and
/// firing a change event when the observed property value changed.
macro_rules! item_modifier {
    ($(#[$doc:meta])* $name:ident, $variant:ident, $item:ty, $property:ident) => {
        $(#[$doc])*
        pub fn $name(&mut self, id: ObjectId, property: $property, update: impl FnOnce(&mut $item)) -> bool {
            let Some(HomeItem::$variant(item)) = self.items.get_mut(&id) else {
                return false;
            };
            let old = item.property_value(property);
            update(item);
            let new = item.property_value(property);
            if old != new {
                self.fire(HomeEvent::ItemChanged {
                    item: id,
                    property: ItemProperty::$variant(property),
                    old,
                    new,
                });
            }
            true
        }
    };
}

/// A home design: walls, rooms, furniture, annotations, levels and cameras.
pub struct Home {
    items: HashMap<ObjectId, HomeItem>,
    walls: Vec<ObjectId>,
    rooms: Vec<ObjectId>,
    furniture: Vec<ObjectId>,
    polylines: Vec<ObjectId>,
    dimension_lines: Vec<ObjectId>,
    labels: Vec<ObjectId>,

    levels: HashMap<LevelId, Level>,
    level_order: Vec<LevelId>,
    selected_level: Option<LevelId>,

    top_camera: Camera,
    observer_camera: Camera,
    active_camera: CameraKind,

    environment: Environment,
    preferences: Preferences,
    selected_items: Vec<ObjectId>,
    wall_height: f32,
    background_image: Option<String>,
    structure: Option<String>,

    listeners: Vec<(ListenerId, ListenerKind, HomeListener)>,
    next_listener_id: ListenerId,
    next_object_id: ObjectId,
    next_level_id: LevelId,
}

impl Default for Home {
    fn default() -> Self {
        Self::new()
    }
}

impl Home {
    pub fn new() -> Self {
        Self {
            items: HashMap::new(),
            walls: Vec::new(),
            rooms: Vec::new(),
            furniture: Vec::new(),
            polylines: Vec::new(),
            dimension_lines: Vec::new(),
            labels: Vec::new(),
            levels: HashMap::new(),
            level_order: Vec::new(),
            selected_level: None,
            top_camera: Camera::default(),
            observer_camera: Camera::new(50.0, 50.0, 170.0, 7.0 * std::f32::consts::FRAC_PI_4, std::f32::consts::PI / 16.0, 63f32.to_radians()),
            active_camera: CameraKind::Top,
            environment: Environment::default(),
            preferences: Preferences::default(),
            selected_items: Vec::new(),
            wall_height: DEFAULT_WALL_HEIGHT,
            background_image: None,
            structure: None,
            listeners: Vec::new(),
            next_listener_id: 0,
            next_object_id: 0,
            next_level_id: 0,
        }
    }

    // ========== Listeners ==========

    /// Registers `listener` on one notification channel.
    pub fn add_listener<F>(&mut self, kind: ListenerKind, listener: F) -> ListenerId
    where
        F: Fn(&Home, &HomeEvent) + 'static,
    {
        let id = self.next_listener_id;
        self.next_listener_id += 1;
        self.listeners.push((id, kind, Rc::new(listener)));
        id
    }

    /// Returns `false` if no listener had this id.
    pub fn remove_listener(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(listener_id, _, _)| *listener_id != id);
        self.listeners.len() != before
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    fn fire(&self, event: HomeEvent) {
        let kind = event.listener_kind();
        let targets: Vec<HomeListener> = self
            .listeners
            .iter()
            .filter(|(_, listener_kind, _)| *listener_kind == kind)
            .map(|(_, _, listener)| listener.clone())
            .collect();
        for listener in targets {
            listener(self, &event);
        }
    }

    // ========== Items ==========

    pub fn item(&self, id: ObjectId) -> Option<&HomeItem> {
        self.items.get(&id)
    }

    pub fn wall(&self, id: ObjectId) -> Option<&Wall> {
        self.items.get(&id).and_then(HomeItem::as_wall)
    }

    pub fn room(&self, id: ObjectId) -> Option<&Room> {
        self.items.get(&id).and_then(HomeItem::as_room)
    }

    pub fn piece(&self, id: ObjectId) -> Option<&Piece> {
        self.items.get(&id).and_then(HomeItem::as_piece)
    }

    pub fn walls(&self) -> &[ObjectId] {
        &self.walls
    }

    pub fn rooms(&self) -> &[ObjectId] {
        &self.rooms
    }

    /// Top-level furniture: pieces and groups, not the pieces nested in groups.
    pub fn furniture(&self) -> &[ObjectId] {
        &self.furniture
    }

    pub fn polylines(&self) -> &[ObjectId] {
        &self.polylines
    }

    pub fn dimension_lines(&self) -> &[ObjectId] {
        &self.dimension_lines
    }

    pub fn labels(&self) -> &[ObjectId] {
        &self.labels
    }

    /// The single pieces of `id`: the piece itself, or every piece nested in a group.
    pub fn furniture_pieces(&self, id: ObjectId) -> Vec<ObjectId> {
        let mut pieces = Vec::new();
        self.collect_pieces(id, &mut pieces);
        pieces
    }

    fn collect_pieces(&self, id: ObjectId, pieces: &mut Vec<ObjectId>) {
        match self.items.get(&id) {
            Some(HomeItem::Piece(_)) => pieces.push(id),
            Some(HomeItem::FurnitureGroup(group)) => {
                for &child in &group.children {
                    self.collect_pieces(child, pieces);
                }
            }
            _ => {}
        }
    }

    /// Every single piece of the home, groups flattened.
    pub fn all_pieces(&self) -> Vec<ObjectId> {
        self.furniture.iter().flat_map(|&id| self.furniture_pieces(id)).collect()
    }

    pub fn contains_door_or_window(&self, id: ObjectId) -> bool {
        self.furniture_pieces(id)
            .iter()
            .any(|&piece| self.piece(piece).is_some_and(|p| p.door_or_window))
    }

    pub fn contains_staircase(&self, id: ObjectId) -> bool {
        self.furniture_pieces(id)
            .iter()
            .any(|&piece| self.piece(piece).is_some_and(Piece::is_staircase))
    }

    fn allocate(&mut self, item: HomeItem) -> ObjectId {
        let id = self.next_object_id;
        self.next_object_id += 1;
        self.items.insert(id, item);
        id
    }

    fn collection_mut(&mut self, kind: ObjectKind) -> &mut Vec<ObjectId> {
        match kind {
            ObjectKind::Wall => &mut self.walls,
            ObjectKind::Room => &mut self.rooms,
            ObjectKind::Piece | ObjectKind::FurnitureGroup => &mut self.furniture,
            ObjectKind::Polyline => &mut self.polylines,
            ObjectKind::DimensionLine => &mut self.dimension_lines,
            ObjectKind::Label => &mut self.labels,
        }
    }

    fn add_item(&mut self, item: HomeItem, index: Option<usize>) -> ObjectId {
        let kind = item.kind();
        let id = self.allocate(item);
        let collection = self.collection_mut(kind);
        match index {
            Some(index) if index <= collection.len() => collection.insert(index, id),
            _ => collection.push(id),
        }
        self.fire(HomeEvent::Collection {
            kind,
            item: id,
            change: CollectionChange::Added { index },
        });
        id
    }

    pub fn add_wall(&mut self, wall: Wall) -> ObjectId {
        self.add_item(HomeItem::Wall(wall), None)
    }

    pub fn add_room(&mut self, room: Room) -> ObjectId {
        self.add_item(HomeItem::Room(room), None)
    }

    /// Inserts a room at `index` in the room list, which is also its drawing order.
    pub fn add_room_at(&mut self, room: Room, index: usize) -> ObjectId {
        self.add_item(HomeItem::Room(room), Some(index))
    }

    pub fn add_piece(&mut self, piece: Piece) -> ObjectId {
        self.add_item(HomeItem::Piece(piece), None)
    }

    /// Adds a group made of `pieces`, returning the group id.
    pub fn add_furniture_group(&mut self, name: impl Into<String>, pieces: Vec<Piece>) -> ObjectId {
        let level = pieces.first().and_then(|piece| piece.level);
        let children = pieces
            .into_iter()
            .map(|piece| self.allocate(HomeItem::Piece(piece)))
            .collect();
        self.add_item(
            HomeItem::FurnitureGroup(FurnitureGroup {
                name: name.into(),
                children,
                visible: true,
                level,
            }),
            None,
        )
    }

    /// Adds a group nesting existing top-level furniture, which leaves the
    /// furniture list without firing deletions.
    pub fn group_furniture(&mut self, name: impl Into<String>, members: Vec<ObjectId>) -> ObjectId {
        self.furniture.retain(|id| !members.contains(id));
        let level = members.first().and_then(|&id| self.items.get(&id)).and_then(HomeItem::level);
        self.add_item(
            HomeItem::FurnitureGroup(FurnitureGroup {
                name: name.into(),
                children: members,
                visible: true,
                level,
            }),
            None,
        )
    }

    pub fn add_polyline(&mut self, polyline: Polyline) -> ObjectId {
        self.add_item(HomeItem::Polyline(polyline), None)
    }

    pub fn add_dimension_line(&mut self, line: DimensionLine) -> ObjectId {
        self.add_item(HomeItem::DimensionLine(line), None)
    }

    pub fn add_label(&mut self, label: Label) -> ObjectId {
        self.add_item(HomeItem::Label(label), None)
    }

    /// Deletes a top-level item. Pieces nested in a deleted group go with it.
    ///
    /// Returns `false` when `id` is not a top-level item.
    pub fn delete_item(&mut self, id: ObjectId) -> bool {
        let Some(kind) = self.items.get(&id).map(HomeItem::kind) else {
            return false;
        };
        let collection = self.collection_mut(kind);
        let Some(position) = collection.iter().position(|&item| item == id) else {
            return false;
        };
        collection.remove(position);

        if self.selected_items.contains(&id) {
            let remaining = self.selected_items.iter().copied().filter(|&item| item != id).collect();
            self.set_selected_items(remaining);
        }

        self.fire(HomeEvent::Collection {
            kind,
            item: id,
            change: CollectionChange::Deleted,
        });
        self.drop_item(id);
        true
    }

    fn drop_item(&mut self, id: ObjectId) {
        if let Some(HomeItem::FurnitureGroup(group)) = self.items.remove(&id) {
            for child in group.children {
                self.drop_item(child);
            }
        }
    }

    item_modifier!(
        /// Applies `update` to a wall and notifies a change of `property`.
        modify_wall, Wall, Wall, WallProperty
    );
    item_modifier!(
        /// Applies `update` to a room and notifies a change of `property`.
        modify_room, Room, Room, RoomProperty
    );
    item_modifier!(
        /// Applies `update` to a single piece, nested in a group or not.
        modify_piece, Piece, Piece, PieceProperty
    );
    item_modifier!(modify_polyline, Polyline, Polyline, PolylineProperty);
    item_modifier!(modify_dimension_line, DimensionLine, DimensionLine, DimensionLineProperty);
    item_modifier!(modify_label, Label, Label, LabelProperty);

    // ========== Levels ==========

    pub fn add_level(&mut self, level: Level) -> LevelId {
        let id = self.next_level_id;
        self.next_level_id += 1;
        self.levels.insert(id, level);
        self.sort_levels();
        if self.selected_level.is_none() {
            self.selected_level = Some(id);
        }
        self.fire(HomeEvent::LevelCollection {
            level: id,
            change: CollectionChange::Added { index: None },
        });
        id
    }

    pub fn delete_level(&mut self, id: LevelId) -> bool {
        if self.levels.remove(&id).is_none() {
            return false;
        }
        self.level_order.retain(|&level| level != id);
        if self.selected_level == Some(id) {
            self.selected_level = self.level_order.first().copied();
        }
        self.fire(HomeEvent::LevelCollection {
            level: id,
            change: CollectionChange::Deleted,
        });
        true
    }

    pub fn modify_level(&mut self, id: LevelId, property: LevelProperty, update: impl FnOnce(&mut Level)) -> bool {
        let Some(level) = self.levels.get_mut(&id) else {
            return false;
        };
        let old = level.property_value(property);
        update(level);
        let new = level.property_value(property);
        if old != new {
            self.sort_levels();
            self.fire(HomeEvent::LevelChanged { level: id, property, old, new });
        }
        true
    }

    fn sort_levels(&mut self) {
        let levels = &self.levels;
        let mut order: Vec<LevelId> = levels.keys().copied().collect();
        order.sort_by(|a, b| {
            let (la, lb) = (&levels[a], &levels[b]);
            la.elevation
                .total_cmp(&lb.elevation)
                .then(la.elevation_index.cmp(&lb.elevation_index))
                .then(a.cmp(b))
        });
        self.level_order = order;
    }

    pub fn level(&self, id: LevelId) -> Option<&Level> {
        self.levels.get(&id)
    }

    /// Levels sorted by elevation then elevation index.
    pub fn levels(&self) -> &[LevelId] {
        &self.level_order
    }

    pub fn last_level(&self) -> Option<LevelId> {
        self.level_order.last().copied()
    }

    pub fn selected_level(&self) -> Option<LevelId> {
        self.selected_level
    }

    pub fn set_selected_level(&mut self, level: Option<LevelId>) {
        if self.selected_level != level {
            self.selected_level = level;
            self.fire(HomeEvent::HomeChanged { property: HomeProperty::SelectedLevel });
        }
    }

    /// Elevation of an optional level, `0` for items without level.
    pub fn level_elevation(&self, level: Option<LevelId>) -> f32 {
        level.and_then(|id| self.levels.get(&id)).map_or(0.0, |level| level.elevation)
    }

    /// Items without level are always displayed.
    pub fn is_level_viewable(&self, level: Option<LevelId>) -> bool {
        match level {
            None => true,
            Some(id) => self.levels.get(&id).is_some_and(Level::is_viewable_and_visible),
        }
    }

    /// Elevation of a piece bottom relative to the ground.
    pub fn piece_ground_elevation(&self, piece: &Piece) -> f32 {
        piece.elevation + self.level_elevation(piece.level)
    }

    pub fn wall_height_or_default(&self, wall: &Wall) -> f32 {
        wall.height.unwrap_or(self.wall_height)
    }

    /// Returns `true` if `wall` stands at `level` or crosses its floor.
    pub fn wall_is_at_level(&self, wall: &Wall, level: LevelId) -> bool {
        if wall.level == Some(level) {
            return true;
        }
        let (Some(wall_level), Some(target)) = (wall.level.and_then(|id| self.levels.get(&id)), self.levels.get(&level))
        else {
            return false;
        };
        let top = wall_level.elevation + self.wall_height_or_default(wall).max(wall.height_at_end.unwrap_or(0.0));
        wall_level.elevation < target.elevation && top > target.elevation
    }

    // ========== Cameras ==========

    /// The camera currently used by the 3D view.
    pub fn camera(&self) -> &Camera {
        self.camera_of(self.active_camera)
    }

    pub fn camera_of(&self, kind: CameraKind) -> &Camera {
        match kind {
            CameraKind::Top => &self.top_camera,
            CameraKind::Observer => &self.observer_camera,
        }
    }

    pub fn active_camera(&self) -> CameraKind {
        self.active_camera
    }

    pub fn set_active_camera(&mut self, kind: CameraKind) {
        if self.active_camera != kind {
            self.active_camera = kind;
            self.fire(HomeEvent::HomeChanged { property: HomeProperty::Camera });
        }
    }

    /// Applies `update` to a camera and notifies each changed property.
    pub fn modify_camera(&mut self, kind: CameraKind, update: impl FnOnce(&mut Camera)) {
        let camera = match kind {
            CameraKind::Top => &mut self.top_camera,
            CameraKind::Observer => &mut self.observer_camera,
        };
        let old = *camera;
        update(camera);
        let new = *camera;
        for property in [
            CameraProperty::X,
            CameraProperty::Y,
            CameraProperty::Z,
            CameraProperty::Yaw,
            CameraProperty::Pitch,
            CameraProperty::FieldOfView,
        ] {
            if old.property_value(property) != new.property_value(property) {
                self.fire(HomeEvent::CameraChanged { camera: kind, property });
            }
        }
    }

    // ========== Environment, preferences, selection ==========

    pub fn environment(&self) -> &Environment {
        &self.environment
    }

    pub fn modify_environment(&mut self, update: impl FnOnce(&mut Environment)) {
        let old = self.environment.clone();
        update(&mut self.environment);
        for property in [
            EnvironmentProperty::SkyColor,
            EnvironmentProperty::SkyTexture,
            EnvironmentProperty::GroundColor,
            EnvironmentProperty::GroundTexture,
            EnvironmentProperty::LightColor,
            EnvironmentProperty::WallsAlpha,
            EnvironmentProperty::BackgroundImageVisibleOnGround3D,
            EnvironmentProperty::AllLevelsVisible,
        ] {
            if old.differs(&self.environment, property) {
                self.fire(HomeEvent::EnvironmentChanged { property });
            }
        }
    }

    pub fn preferences(&self) -> &Preferences {
        &self.preferences
    }

    pub fn modify_preferences(&mut self, update: impl FnOnce(&mut Preferences)) {
        let old = self.preferences.clone();
        update(&mut self.preferences);
        let new = &self.preferences;
        let changes = [
            (PreferenceProperty::Unit, old.unit != new.unit),
            (PreferenceProperty::DefaultFontName, old.default_font_name != new.default_font_name),
            (PreferenceProperty::EditingIn3DEnabled, old.editing_in_3d_enabled != new.editing_in_3d_enabled),
            (PreferenceProperty::NavigationPanelVisible, old.navigation_panel_visible != new.navigation_panel_visible),
        ];
        for (property, changed) in changes {
            if changed {
                self.fire(HomeEvent::PreferenceChanged { property });
            }
        }
    }

    pub fn selected_items(&self) -> &[ObjectId] {
        &self.selected_items
    }

    pub fn set_selected_items(&mut self, items: Vec<ObjectId>) {
        if items != self.selected_items {
            let old = std::mem::replace(&mut self.selected_items, items.clone());
            self.fire(HomeEvent::SelectionChanged { old, new: items });
        }
    }

    // ========== Home properties ==========

    /// Default height of walls without their own height.
    pub fn wall_height(&self) -> f32 {
        self.wall_height
    }

    pub fn set_wall_height(&mut self, height: f32) {
        if self.wall_height != height {
            self.wall_height = height;
            self.fire(HomeEvent::HomeChanged { property: HomeProperty::WallHeight });
        }
    }

    pub fn background_image(&self) -> Option<&str> {
        self.background_image.as_deref()
    }

    pub fn set_background_image(&mut self, image: Option<String>) {
        if self.background_image != image {
            self.background_image = image;
            self.fire(HomeEvent::HomeChanged { property: HomeProperty::BackgroundImage });
        }
    }

    /// Imported model replacing the generated ground, if any.
    pub fn structure(&self) -> Option<&str> {
        self.structure.as_deref()
    }

    pub fn set_structure(&mut self, structure: Option<String>) {
        self.structure = structure;
    }
}
