//! Keeps the scene of a home in step with the home model.
//!
//! Collection changes add and remove subtrees at once. Property changes are
//! turned into a set of items to update, following the visual dependencies
//! between items (openings cut in walls, staircases cut in ceilings, rooms
//! sharing a floor), and that set is flushed once on the next tick.

use std::cell::{Ref, RefCell};
use std::rc::{Rc, Weak};

use crate::common::{polygon_bounds, polygons_intersect, Point2};
use crate::home::{
    CameraProperty, CollectionChange, EnvironmentProperty, Home, HomeEvent, HomeItem, HomeProperty, ItemProperty,
    LevelId, LevelProperty, ListenerId, ListenerKind, ObjectId, PieceProperty, PreferenceProperty,
    RoomProperty, WallProperty,
};
use crate::object3d::{Object3D, Object3DFactory};
use crate::scene::{NodeId, Scene};
use crate::scene_builder::{update_background, update_ground_background_visibility, update_light_colors, HomeScene};
use crate::tasks::TaskQueue;
use crate::view_controller::ViewController;

/// Tolerance used to match room elevations across levels.
const LEVEL_ELEVATION_TOLERANCE: f32 = 1e-5;

/// Tracked items and their subtrees, in insertion order.
///
/// `items[i]` is displayed by `objects[i]`, and an item appears at most once.
#[derive(Default)]
pub struct ObjectRegistry {
    items: Vec<ObjectId>,
    objects: Vec<Box<dyn Object3D>>,
}

impl ObjectRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `item`, unless it is already tracked.
    pub fn insert(&mut self, item: ObjectId, object: Box<dyn Object3D>) -> bool {
        if self.contains(item) {
            return false;
        }
        self.items.push(item);
        self.objects.push(object);
        true
    }

    pub fn remove(&mut self, item: ObjectId) -> Option<Box<dyn Object3D>> {
        let index = self.position(item)?;
        self.items.remove(index);
        Some(self.objects.remove(index))
    }

    fn position(&self, item: ObjectId) -> Option<usize> {
        self.items.iter().position(|&id| id == item)
    }

    pub fn contains(&self, item: ObjectId) -> bool {
        self.position(item).is_some()
    }

    pub fn get(&self, item: ObjectId) -> Option<&dyn Object3D> {
        self.position(item).map(|index| self.objects[index].as_ref())
    }

    pub fn get_mut(&mut self, item: ObjectId) -> Option<&mut Box<dyn Object3D>> {
        let index = self.position(item)?;
        self.objects.get_mut(index)
    }

    /// Root node of the subtree displaying `item`.
    pub fn node_of(&self, item: ObjectId) -> Option<NodeId> {
        self.get(item).map(|object| object.node())
    }

    /// The item whose subtree is rooted at `node`.
    pub fn item_of_node(&self, node: NodeId) -> Option<ObjectId> {
        self.objects.iter().position(|object| object.node() == node).map(|index| self.items[index])
    }

    pub fn items(&self) -> &[ObjectId] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    fn clear(&mut self) {
        self.items.clear();
        self.objects.clear();
    }
}

struct SyncState {
    home_scene: HomeScene,
    /// Items waiting for the next flush, `None` when no flush is scheduled.
    pending: Option<Vec<ObjectId>>,
    ground_update_pending: bool,
    camera_update_pending: bool,
    listeners: Vec<ListenerId>,
}

/// Owner of the home scene, updating it from home notifications.
pub struct Synchronizer {
    home: Weak<RefCell<Home>>,
    state: RefCell<SyncState>,
    factory: Rc<dyn Object3DFactory>,
    view: Rc<RefCell<ViewController>>,
    tasks: TaskQueue,
    this: Weak<Synchronizer>,
}

type Handler = fn(&Synchronizer, &Home, &HomeEvent);

impl Synchronizer {
    pub fn new(
        home: &Rc<RefCell<Home>>,
        home_scene: HomeScene,
        factory: Rc<dyn Object3DFactory>,
        view: Rc<RefCell<ViewController>>,
        tasks: TaskQueue,
    ) -> Rc<Self> {
        Rc::new_cyclic(|this| Self {
            home: Rc::downgrade(home),
            state: RefCell::new(SyncState {
                home_scene,
                pending: None,
                ground_update_pending: false,
                camera_update_pending: false,
                listeners: Vec::new(),
            }),
            factory,
            view,
            tasks,
            this: this.clone(),
        })
    }

    /// Registers the home listeners keeping the scene up to date.
    pub fn install(self: &Rc<Self>, home: &mut Home) {
        let handlers: [(ListenerKind, Handler); 19] = [
            (ListenerKind::WallCollection, Self::on_wall_collection),
            (ListenerKind::RoomCollection, Self::on_room_collection),
            (ListenerKind::FurnitureCollection, Self::on_furniture_collection),
            (ListenerKind::PolylineCollection, Self::on_annotation_collection),
            (ListenerKind::DimensionLineCollection, Self::on_annotation_collection),
            (ListenerKind::LabelCollection, Self::on_annotation_collection),
            (ListenerKind::WallProperty, Self::on_wall_changed),
            (ListenerKind::RoomProperty, Self::on_room_changed),
            (ListenerKind::FurnitureProperty, Self::on_piece_changed),
            (ListenerKind::PolylineProperty, Self::on_annotation_changed),
            (ListenerKind::DimensionLineProperty, Self::on_annotation_changed),
            (ListenerKind::LabelProperty, Self::on_annotation_changed),
            (ListenerKind::LevelCollection, Self::on_level_collection),
            (ListenerKind::LevelProperty, Self::on_level_changed),
            (ListenerKind::Environment, Self::on_environment_changed),
            (ListenerKind::Home, Self::on_home_changed),
            (ListenerKind::Camera, Self::on_camera_changed),
            (ListenerKind::Selection, Self::on_selection_changed),
            (ListenerKind::Preferences, Self::on_preferences_changed),
        ];
        let ids: Vec<ListenerId> = handlers
            .into_iter()
            .map(|(kind, handler)| {
                let this = Rc::downgrade(self);
                home.add_listener(kind, move |home, event| {
                    if let Some(sync) = this.upgrade() {
                        handler(&sync, home, event);
                    }
                })
            })
            .collect();
        self.state.borrow_mut().listeners.extend(ids);
    }

    /// Removes the home listeners and every tracked subtree.
    pub fn dispose(&self, home: &mut Home) {
        let mut state = self.state.borrow_mut();
        for id in state.listeners.drain(..) {
            home.remove_listener(id);
        }
        let state = &mut *state;
        for &item in state.home_scene.registry.items() {
            if let Some(node) = state.home_scene.registry.node_of(item) {
                state.home_scene.scene.remove_node(node);
            }
        }
        state.home_scene.registry.clear();
        state.pending = None;
    }

    pub fn scene(&self) -> Ref<'_, Scene> {
        Ref::map(self.state.borrow(), |state| &state.home_scene.scene)
    }

    pub fn home_scene(&self) -> Ref<'_, HomeScene> {
        Ref::map(self.state.borrow(), |state| &state.home_scene)
    }

    pub fn tracked_objects(&self) -> Vec<ObjectId> {
        self.state.borrow().home_scene.registry.items().to_vec()
    }

    pub fn object3d_node(&self, item: ObjectId) -> Option<NodeId> {
        self.state.borrow().home_scene.registry.node_of(item)
    }

    /// Number of updates the subtree of `item` went through.
    pub fn update_count(&self, item: ObjectId) -> Option<u32> {
        self.state.borrow().home_scene.registry.get(item).map(|object| object.update_count())
    }

    pub fn ground_update_count(&self) -> u32 {
        self.state.borrow().home_scene.ground.update_count()
    }

    /// Items waiting for the next flush, in scheduling order.
    pub fn pending_updates(&self) -> Vec<ObjectId> {
        self.state.borrow().pending.clone().unwrap_or_default()
    }

    /// Finds the tracked item owning `node` by walking up its ancestors.
    pub fn item_at_node(&self, node: NodeId) -> Option<ObjectId> {
        let state = self.state.borrow();
        let scene = &state.home_scene.scene;
        let mut current = Some(node);
        while let Some(id) = current {
            if let Some(item) = state.home_scene.registry.item_of_node(id) {
                return Some(item);
            }
            current = scene.get_node(id).and_then(|node| node.parent());
        }
        None
    }

    // ========== Structural changes ==========

    /// Builds the subtree of `item` and inserts it in the home tree at
    /// `index`, or last. Groups contribute their pieces only.
    pub fn add_object(&self, home: &Home, item: ObjectId, index: Option<usize>) {
        if matches!(home.item(item), Some(HomeItem::FurnitureGroup(_))) {
            for piece in home.furniture_pieces(item) {
                self.add_object(home, piece, None);
            }
            return;
        }
        let mut state = self.state.borrow_mut();
        let state = &mut *state;
        let home_scene = &mut state.home_scene;
        if home_scene.registry.contains(item) {
            return;
        }
        match self
            .factory
            .create_object3d(home, item, &mut home_scene.scene, home_scene.home_root, index)
        {
            Ok(object) => {
                home_scene.registry.insert(item, object);
            }
            Err(error) => log::warn!("Failed to create 3D object of item {}: {}", item, error),
        }
    }

    /// Detaches the subtree of `item`, or of the pieces of a group.
    /// Untracked items are ignored.
    pub fn delete_object(&self, home: &Home, item: ObjectId) {
        if matches!(home.item(item), Some(HomeItem::FurnitureGroup(_))) {
            for piece in home.furniture_pieces(item) {
                self.delete_object(home, piece);
            }
            return;
        }
        let mut state = self.state.borrow_mut();
        let state = &mut *state;
        if let Some(object) = state.home_scene.registry.remove(item) {
            state.home_scene.scene.remove_node(object.node());
            if let Some(pending) = state.pending.as_mut() {
                pending.retain(|&id| id != item);
            }
        }
    }

    // ========== Coalesced updates ==========

    /// Adds `items` to the pending set, scheduling a flush on the next tick
    /// when the set was empty.
    pub fn schedule_update(&self, items: impl IntoIterator<Item = ObjectId>) {
        let needs_flush = {
            let mut state = self.state.borrow_mut();
            let needs_flush = state.pending.is_none();
            let pending = state.pending.get_or_insert_with(Vec::new);
            for item in items {
                if !pending.contains(&item) {
                    pending.push(item);
                }
            }
            needs_flush
        };
        if needs_flush {
            self.post_flush();
        }
        self.view.borrow_mut().invalidate_bounds();
    }

    fn post_flush(&self) {
        let this = self.this.clone();
        self.tasks.invoke_later(move || {
            if let Some(sync) = this.upgrade() {
                sync.flush();
            }
        });
    }

    /// Updates every pending item still tracked.
    fn flush(&self) {
        let Some(home) = self.home.upgrade() else {
            self.state.borrow_mut().pending = None;
            return;
        };
        let Ok(home) = home.try_borrow() else {
            log::debug!("Home busy, postponing 3D update");
            self.post_flush();
            return;
        };
        let mut state = self.state.borrow_mut();
        let state = &mut *state;
        let Some(pending) = state.pending.take() else {
            return;
        };
        log::debug!("Updating {} 3D objects", pending.len());
        let HomeScene { scene, registry, .. } = &mut state.home_scene;
        for item in pending {
            // Deleted since it was scheduled
            let Some(object) = registry.get_mut(item) else {
                continue;
            };
            if let Err(error) = object.update(&home, scene) {
                log::warn!("Failed to update 3D object of item {}: {}", item, error);
            }
        }
    }

    fn schedule_ground_update(&self) {
        {
            let mut state = self.state.borrow_mut();
            if state.ground_update_pending {
                return;
            }
            state.ground_update_pending = true;
        }
        let this = self.this.clone();
        self.tasks.invoke_later(move || {
            if let Some(sync) = this.upgrade() {
                sync.update_ground();
            }
        });
    }

    fn update_ground(&self) {
        let Some(home) = self.home.upgrade() else {
            return;
        };
        let Ok(home) = home.try_borrow() else {
            self.state.borrow_mut().ground_update_pending = false;
            self.schedule_ground_update();
            return;
        };
        let mut state = self.state.borrow_mut();
        let state = &mut *state;
        state.ground_update_pending = false;
        let HomeScene { scene, ground, .. } = &mut state.home_scene;
        if let Err(error) = ground.update(&home, scene) {
            log::warn!("Failed to update ground: {}", error);
        }
    }

    fn schedule_camera_update(&self) {
        {
            let mut state = self.state.borrow_mut();
            if state.camera_update_pending {
                return;
            }
            state.camera_update_pending = true;
        }
        let this = self.this.clone();
        self.tasks.invoke_later(move || {
            if let Some(sync) = this.upgrade() {
                sync.update_camera();
            }
        });
    }

    fn update_camera(&self) {
        let Some(home) = self.home.upgrade() else {
            return;
        };
        let Ok(home) = home.try_borrow() else {
            self.state.borrow_mut().camera_update_pending = false;
            self.schedule_camera_update();
            return;
        };
        self.state.borrow_mut().camera_update_pending = false;
        let camera = *home.camera();
        self.view.borrow_mut().update_projection(&camera, &home);
        ViewController::update_view_transform(&self.view, &camera, true, &self.tasks);
    }

    // ========== Dependency helpers ==========

    fn schedule_walls(&self, home: &Home) {
        self.schedule_update(home.walls().to_vec());
    }

    fn schedule_rooms(&self, home: &Home) {
        self.schedule_update(home.rooms().to_vec());
    }

    /// Schedules `wall` and the walls joined at its ends.
    fn schedule_wall_and_neighbours(&self, home: &Home, wall: ObjectId) {
        let mut walls = vec![wall];
        if let Some(joined) = home.wall(wall) {
            walls.extend(joined.wall_at_start);
            walls.extend(joined.wall_at_end);
        }
        self.schedule_update(walls);
    }

    /// Walls joined to `wall`, either through its own ends or through theirs.
    fn joined_walls(home: &Home, wall: ObjectId) -> Vec<ObjectId> {
        let mut walls: Vec<ObjectId> = home
            .wall(wall)
            .map(|joined| joined.wall_at_start.into_iter().chain(joined.wall_at_end).collect())
            .unwrap_or_default();
        for &other in home.walls() {
            let joins_wall = home
                .wall(other)
                .is_some_and(|candidate| candidate.wall_at_start == Some(wall) || candidate.wall_at_end == Some(wall));
            if other != wall && joins_wall && !walls.contains(&other) {
                walls.push(other);
            }
        }
        walls.retain(|&other| other != wall);
        walls
    }

    /// Schedules the walls crossing the bounds of the given footprints.
    fn schedule_intersecting_walls(&self, home: &Home, footprints: &[[Point2; 4]]) {
        let pending_walls = self
            .state
            .borrow()
            .pending
            .as_ref()
            .map_or(0, |pending| pending.iter().filter(|&&id| home.wall(id).is_some()).count());
        if pending_walls == home.walls().len() {
            return;
        }
        let corners: Vec<Point2> = footprints.iter().flatten().copied().collect();
        let Some(bounds) = polygon_bounds(&corners) else {
            return;
        };
        let walls: Vec<ObjectId> = home
            .walls()
            .iter()
            .copied()
            .filter(|&id| home.wall(id).is_some_and(|wall| wall.intersects_rectangle(&bounds)))
            .collect();
        self.schedule_update(walls);
    }

    /// Schedules `items` and the pieces of the groups among them.
    fn schedule_items_and_groups(&self, home: &Home, items: &[ObjectId]) {
        let mut expanded = items.to_vec();
        for &item in items {
            if matches!(home.item(item), Some(HomeItem::FurnitureGroup(_))) {
                expanded.extend(home.furniture_pieces(item));
            }
        }
        self.schedule_update(expanded);
    }

    fn is_below_ground(home: &Home, level: Option<LevelId>) -> bool {
        level.is_some() && home.level_elevation(level) < 0.0
    }

    // ========== Collection listeners ==========

    fn on_wall_collection(&self, home: &Home, event: &HomeEvent) {
        let HomeEvent::Collection { item, change, .. } = event else {
            return;
        };
        // Joins are read before the deleted wall leaves the home
        let neighbours = Self::joined_walls(home, *item);
        match change {
            CollectionChange::Added { .. } => self.add_object(home, *item, None),
            CollectionChange::Deleted => self.delete_object(home, *item),
        }
        self.schedule_update(neighbours);
        self.schedule_rooms(home);
        self.schedule_ground_update();
    }

    fn on_room_collection(&self, home: &Home, event: &HomeEvent) {
        let HomeEvent::Collection { item, change, .. } = event else {
            return;
        };
        match change {
            CollectionChange::Added { index } => {
                let child_index = index.and_then(|_| self.room_child_index(home, *item));
                self.add_object(home, *item, child_index);
            }
            CollectionChange::Deleted => self.delete_object(home, *item),
        }
        self.schedule_rooms(home);
        self.schedule_ground_update();
    }

    /// Position in the home tree matching the position of `room` in the
    /// room list: before the next tracked room, or after the previous one.
    fn room_child_index(&self, home: &Home, room: ObjectId) -> Option<usize> {
        let rooms = home.rooms();
        let position = rooms.iter().position(|&id| id == room)?;
        let state = self.state.borrow();
        let registry = &state.home_scene.registry;
        let scene = &state.home_scene.scene;
        if let Some(next) = rooms[position + 1..].iter().find_map(|&id| registry.node_of(id)) {
            return scene.child_index(next);
        }
        rooms[..position]
            .iter()
            .rev()
            .find_map(|&id| registry.node_of(id))
            .and_then(|previous| scene.child_index(previous))
            .map(|index| index + 1)
    }

    fn on_furniture_collection(&self, home: &Home, event: &HomeEvent) {
        let HomeEvent::Collection { item, change, .. } = event else {
            return;
        };
        match change {
            CollectionChange::Added { .. } => self.add_object(home, *item, None),
            CollectionChange::Deleted => self.delete_object(home, *item),
        }
        if home.contains_door_or_window(*item) {
            let footprints: Vec<[Point2; 4]> = home
                .furniture_pieces(*item)
                .iter()
                .filter_map(|&id| home.piece(id))
                .map(|piece| piece.points())
                .collect();
            self.schedule_intersecting_walls(home, &footprints);
        } else if home.contains_staircase(*item) {
            self.schedule_rooms(home);
        } else {
            self.view.borrow_mut().invalidate_bounds();
        }
        self.schedule_ground_update();
    }

    fn on_annotation_collection(&self, home: &Home, event: &HomeEvent) {
        let HomeEvent::Collection { item, change, .. } = event else {
            return;
        };
        match change {
            CollectionChange::Added { .. } => self.add_object(home, *item, None),
            CollectionChange::Deleted => self.delete_object(home, *item),
        }
    }

    fn on_level_collection(&self, home: &Home, _event: &HomeEvent) {
        self.schedule_rooms(home);
    }

    // ========== Property listeners ==========

    fn on_wall_changed(&self, home: &Home, event: &HomeEvent) {
        let HomeEvent::ItemChanged {
            item,
            property: ItemProperty::Wall(property),
            ..
        } = event
        else {
            return;
        };
        if *property == WallProperty::Pattern {
            return;
        }
        let Some(wall) = home.wall(*item) else {
            return;
        };
        self.schedule_wall_and_neighbours(home, *item);
        let at_last_level = home.last_level().is_some_and(|level| home.wall_is_at_level(wall, level));
        if wall.level.is_none() || at_last_level {
            self.schedule_rooms(home);
        }
        if Self::is_below_ground(home, wall.level) {
            self.schedule_ground_update();
        }
    }

    fn on_room_changed(&self, home: &Home, event: &HomeEvent) {
        let HomeEvent::ItemChanged {
            item,
            property: ItemProperty::Room(property),
            old,
            new,
        } = event
        else {
            return;
        };
        match property {
            RoomProperty::FloorColor
            | RoomProperty::FloorTexture
            | RoomProperty::FloorShininess
            | RoomProperty::CeilingColor
            | RoomProperty::CeilingTexture
            | RoomProperty::CeilingShininess
            | RoomProperty::CeilingFlat => self.schedule_update([*item]),
            RoomProperty::FloorVisible | RoomProperty::CeilingVisible | RoomProperty::Level => {
                self.schedule_rooms(home);
                self.schedule_ground_update();
            }
            RoomProperty::Points => {
                let busy = self.state.borrow().pending.as_ref().is_some_and(|pending| !pending.is_empty());
                if busy {
                    // Over-invalidate rather than searching overlaps among many pending rooms
                    self.schedule_rooms(home);
                } else {
                    self.schedule_update([*item]);
                    let old_points = old.as_points().unwrap_or_default();
                    let new_points = new.as_points().unwrap_or_default();
                    self.schedule_update(Self::overlapping_rooms(home, *item, old_points, new_points));
                }
                self.schedule_ground_update();
            }
            RoomProperty::Name => {}
        }
    }

    /// Rooms whose floor or ceiling touches the changed room, at levels
    /// sharing its top, overlapping its old or new polygon.
    fn overlapping_rooms(home: &Home, updated: ObjectId, old: &[Point2], new: &[Point2]) -> Vec<ObjectId> {
        let updated_level = home
            .room(updated)
            .and_then(|room| room.level)
            .and_then(|id| home.level(id));
        home.rooms()
            .iter()
            .copied()
            .filter(|&id| id != updated)
            .filter(|&id| {
                let Some(room) = home.room(id) else {
                    return false;
                };
                let room_level = room.level.and_then(|level| home.level(level));
                let qualifies = match (updated_level, room_level) {
                    (_, None) => true,
                    (None, Some(_)) => false,
                    (Some(updated_level), Some(room_level)) => {
                        let top = updated_level.elevation + updated_level.height;
                        (top - (room_level.elevation + room_level.height)).abs() < LEVEL_ELEVATION_TOLERANCE
                            || (top - (room_level.elevation - room_level.floor_thickness)).abs()
                                < LEVEL_ELEVATION_TOLERANCE
                    }
                };
                qualifies && (polygons_intersect(&room.points, new) || polygons_intersect(&room.points, old))
            })
            .collect()
    }

    fn on_piece_changed(&self, home: &Home, event: &HomeEvent) {
        let HomeEvent::ItemChanged {
            item,
            property: ItemProperty::Piece(property),
            old,
            ..
        } = event
        else {
            return;
        };
        match property {
            PieceProperty::X
            | PieceProperty::Y
            | PieceProperty::Angle
            | PieceProperty::Roll
            | PieceProperty::Pitch
            | PieceProperty::Width
            | PieceProperty::Depth => self.update_piece_geometry(home, *item, old.as_float().map(|value| (*property, value))),
            PieceProperty::Height
            | PieceProperty::Elevation
            | PieceProperty::Model
            | PieceProperty::ModelMirrored
            | PieceProperty::StaircaseCutOutShape
            | PieceProperty::Visible
            | PieceProperty::Level => self.update_piece_geometry(home, *item, None),
            PieceProperty::CutOutShape => {
                if let Some(piece) = home.piece(*item).filter(|piece| piece.door_or_window) {
                    self.schedule_intersecting_walls(home, &[piece.points()]);
                }
            }
            PieceProperty::Color | PieceProperty::Texture | PieceProperty::Shininess | PieceProperty::Power => {
                self.schedule_update([*item])
            }
            PieceProperty::Name => {}
        }
    }

    /// Schedules a piece whose shape or location changed, with the walls
    /// or rooms it cuts. `previous` rebuilds the footprint before a move.
    fn update_piece_geometry(&self, home: &Home, item: ObjectId, previous: Option<(PieceProperty, f32)>) {
        self.schedule_update([item]);
        let Some(piece) = home.piece(item) else {
            return;
        };
        if piece.door_or_window {
            let mut footprints = vec![piece.points()];
            if let Some((property, value)) = previous {
                footprints.push(piece.clone().with_float_property(property, value).points());
            }
            self.schedule_intersecting_walls(home, &footprints);
        } else if piece.is_staircase() {
            self.schedule_rooms(home);
        }
        if Self::is_below_ground(home, piece.level) {
            self.schedule_ground_update();
        }
    }

    fn on_annotation_changed(&self, _home: &Home, event: &HomeEvent) {
        if let HomeEvent::ItemChanged { item, .. } = event {
            self.schedule_update([*item]);
        }
    }

    fn on_level_changed(&self, home: &Home, event: &HomeEvent) {
        let HomeEvent::LevelChanged { level, property, .. } = event else {
            return;
        };
        match property {
            LevelProperty::Visible | LevelProperty::Viewable => {
                let items: Vec<ObjectId> = self
                    .tracked_objects()
                    .into_iter()
                    .filter(|&id| match home.item(id) {
                        Some(HomeItem::Room(_)) => true,
                        Some(HomeItem::Wall(wall)) => home.wall_is_at_level(wall, *level),
                        Some(item) => item.level() == Some(*level),
                        None => false,
                    })
                    .collect();
                self.schedule_update(items);
                self.schedule_ground_update();
            }
            LevelProperty::Elevation => {
                self.schedule_update(self.tracked_objects());
                self.schedule_ground_update();
            }
            LevelProperty::BackgroundImage => self.schedule_ground_update(),
            LevelProperty::FloorThickness => {
                self.schedule_walls(home);
                self.schedule_rooms(home);
            }
            LevelProperty::Height => self.schedule_rooms(home),
            LevelProperty::Name | LevelProperty::ElevationIndex => {}
        }
    }

    fn on_environment_changed(&self, home: &Home, event: &HomeEvent) {
        let HomeEvent::EnvironmentChanged { property } = event else {
            return;
        };
        match property {
            EnvironmentProperty::WallsAlpha => {
                self.schedule_walls(home);
                self.schedule_rooms(home);
            }
            EnvironmentProperty::SkyColor | EnvironmentProperty::SkyTexture => self.refresh_background(home),
            EnvironmentProperty::GroundColor | EnvironmentProperty::GroundTexture => {
                self.refresh_background(home);
                self.schedule_ground_update();
            }
            EnvironmentProperty::BackgroundImageVisibleOnGround3D => self.schedule_ground_update(),
            EnvironmentProperty::LightColor => {
                let mut state = self.state.borrow_mut();
                let home_scene = &mut state.home_scene;
                update_light_colors(home, &mut home_scene.scene, &home_scene.lights);
            }
            EnvironmentProperty::AllLevelsVisible => {}
        }
    }

    fn refresh_background(&self, home: &Home) {
        let mut state = self.state.borrow_mut();
        let home_scene = &mut state.home_scene;
        update_background(home, &mut home_scene.scene, &home_scene.background);
    }

    fn refresh_ground_background_visibility(&self, home: &Home) {
        let mut state = self.state.borrow_mut();
        let home_scene = &mut state.home_scene;
        update_ground_background_visibility(home, &mut home_scene.scene, &home_scene.background);
    }

    fn on_home_changed(&self, home: &Home, event: &HomeEvent) {
        let HomeEvent::HomeChanged { property } = event else {
            return;
        };
        match property {
            HomeProperty::Camera => {
                let camera = *home.camera();
                self.view.borrow_mut().update_projection(&camera, home);
                ViewController::update_view_transform(&self.view, &camera, false, &self.tasks);
                self.refresh_ground_background_visibility(home);
            }
            HomeProperty::BackgroundImage => self.schedule_ground_update(),
            HomeProperty::WallHeight => self.schedule_walls(home),
            HomeProperty::SelectedLevel => {}
        }
    }

    fn on_camera_changed(&self, home: &Home, event: &HomeEvent) {
        let HomeEvent::CameraChanged { camera, property } = event else {
            return;
        };
        if *camera != home.active_camera() {
            return;
        }
        if *property == CameraProperty::Z {
            self.refresh_ground_background_visibility(home);
        }
        self.schedule_camera_update();
    }

    fn on_selection_changed(&self, home: &Home, event: &HomeEvent) {
        let HomeEvent::SelectionChanged { old, new } = event else {
            return;
        };
        self.schedule_items_and_groups(home, old);
        self.schedule_items_and_groups(home, new);
    }

    fn on_preferences_changed(&self, home: &Home, event: &HomeEvent) {
        let HomeEvent::PreferenceChanged { property } = event else {
            return;
        };
        match property {
            PreferenceProperty::Unit | PreferenceProperty::DefaultFontName => {
                self.schedule_update(home.dimension_lines().to_vec())
            }
            PreferenceProperty::EditingIn3DEnabled => {
                let selected = home.selected_items().to_vec();
                self.schedule_items_and_groups(home, &selected);
            }
            PreferenceProperty::NavigationPanelVisible => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ViewConfig;
    use crate::home::{Camera, CameraKind, DimensionLine, Level, LengthUnit, Piece, Room, Wall};
    use crate::object3d::{BoxModelLoader, DefaultObject3DFactory, ModelLoader};
    use crate::scene::NodeKind;
    use crate::scene_builder::build_home_scene;
    use std::time::Duration;

    struct Fixture {
        home: Rc<RefCell<Home>>,
        sync: Rc<Synchronizer>,
        view: Rc<RefCell<ViewController>>,
        tasks: TaskQueue,
    }

    impl Fixture {
        fn new(home: Home) -> Self {
            let home = Rc::new(RefCell::new(home));
            let loader: Rc<dyn ModelLoader> = Rc::new(BoxModelLoader);
            let factory = Rc::new(DefaultObject3DFactory::new(loader.clone()));
            let home_scene = build_home_scene(&home.borrow(), factory.as_ref(), loader).unwrap();
            let view = Rc::new(RefCell::new(ViewController::new(ViewConfig::default(), 400, 300)));
            let tasks = TaskQueue::new();
            let sync = Synchronizer::new(&home, home_scene, factory, view.clone(), tasks.clone());
            sync.install(&mut home.borrow_mut());
            Self { home, sync, view, tasks }
        }

        fn flush(&self) {
            self.tasks.run_until_idle();
        }

        fn count(&self, item: ObjectId) -> u32 {
            self.sync.update_count(item).unwrap()
        }
    }

    fn square(x: f32, y: f32, size: f32) -> Vec<Point2> {
        vec![[x, y], [x + size, y], [x + size, y + size], [x, y + size]]
    }

    // ===== Registry Tests =====

    #[test]
    fn test_registry_add_group_and_delete() {
        let fixture = Fixture::new(Home::new());
        let wall = fixture.home.borrow_mut().add_wall(Wall::new(0.0, 0.0, 100.0, 0.0, 10.0));
        assert_eq!(fixture.sync.tracked_objects(), vec![wall]);

        let group = fixture.home.borrow_mut().add_furniture_group(
            "set",
            vec![
                Piece::new("table", 300.0, 300.0, 100.0, 60.0, 75.0),
                Piece::new("chair", 350.0, 350.0, 40.0, 40.0, 80.0),
            ],
        );
        let pieces = fixture.home.borrow().furniture_pieces(group);
        assert_eq!(fixture.sync.tracked_objects().len(), 3);
        assert!(fixture.sync.object3d_node(group).is_none());
        assert!(pieces.iter().all(|&piece| fixture.sync.object3d_node(piece).is_some()));

        fixture.home.borrow_mut().delete_item(group);
        assert_eq!(fixture.sync.tracked_objects(), vec![wall]);
    }

    #[test]
    fn test_registry_nodes_stay_paired() {
        let fixture = Fixture::new(Home::new());
        let first = fixture.home.borrow_mut().add_wall(Wall::new(0.0, 0.0, 100.0, 0.0, 10.0));
        let second = fixture.home.borrow_mut().add_wall(Wall::new(100.0, 0.0, 100.0, 100.0, 10.0));
        fixture.home.borrow_mut().delete_item(first);

        let node = fixture.sync.object3d_node(second).unwrap();
        assert_eq!(fixture.sync.item_at_node(node), Some(second));
        assert!(fixture.sync.object3d_node(first).is_none());
    }

    #[test]
    fn test_grouping_existing_furniture_keeps_one_subtree() {
        let fixture = Fixture::new(Home::new());
        let a = fixture.home.borrow_mut().add_piece(Piece::new("a", 0.0, 0.0, 10.0, 10.0, 10.0));
        let b = fixture.home.borrow_mut().add_piece(Piece::new("b", 50.0, 0.0, 10.0, 10.0, 10.0));
        fixture.home.borrow_mut().group_furniture("ab", vec![a, b]);
        assert_eq!(fixture.sync.tracked_objects(), vec![a, b]);
    }

    #[test]
    fn test_room_inserted_at_index() {
        let fixture = Fixture::new(Home::new());
        let first = fixture.home.borrow_mut().add_room(Room::new(square(0.0, 0.0, 100.0)));
        let second = fixture.home.borrow_mut().add_room(Room::new(square(200.0, 0.0, 100.0)));
        let inserted = fixture.home.borrow_mut().add_room_at(Room::new(square(400.0, 0.0, 100.0)), 1);

        let scene = fixture.sync.scene();
        let index_of = |item| scene.child_index(fixture.sync.object3d_node(item).unwrap()).unwrap();
        assert!(index_of(first) < index_of(inserted));
        assert!(index_of(inserted) < index_of(second));
    }

    // ===== Coalescing Tests =====

    #[test]
    fn test_many_changes_one_update() {
        let fixture = Fixture::new(Home::new());
        let piece = fixture.home.borrow_mut().add_piece(Piece::new("lamp", 0.0, 0.0, 20.0, 20.0, 150.0));
        fixture.flush();
        let before = fixture.count(piece);

        for x in 1..=5 {
            fixture.home.borrow_mut().modify_piece(piece, PieceProperty::X, |p| p.x = x as f32);
        }
        assert_eq!(fixture.tasks.pending_ticks(), 1);
        assert_eq!(fixture.sync.pending_updates(), vec![piece]);
        fixture.flush();
        assert_eq!(fixture.count(piece), before + 1);
        assert!(fixture.sync.pending_updates().is_empty());

        // Nothing pending, nothing updated
        fixture.flush();
        assert_eq!(fixture.count(piece), before + 1);
    }

    #[test]
    fn test_update_is_idempotent() {
        let mut home = Home::new();
        let wall = home.add_wall(Wall::new(0.0, 0.0, 300.0, 0.0, 10.0));
        let fixture = Fixture::new(home);
        let node = fixture.sync.object3d_node(wall).unwrap();

        fixture.sync.schedule_update([wall]);
        fixture.flush();
        let first: Vec<String> = {
            let scene = fixture.sync.scene();
            scene.descendants(node).iter().filter_map(|&id| scene.get_node(id)?.name.clone()).collect()
        };
        fixture.sync.schedule_update([wall]);
        fixture.flush();
        let scene = fixture.sync.scene();
        let second: Vec<String> = scene.descendants(node).iter().filter_map(|&id| scene.get_node(id)?.name.clone()).collect();
        assert_eq!(first, second);
        assert_eq!(fixture.sync.object3d_node(wall), Some(node));
    }

    #[test]
    fn test_deleted_before_flush_is_skipped() {
        let fixture = Fixture::new(Home::new());
        let piece = fixture.home.borrow_mut().add_piece(Piece::new("box", 0.0, 0.0, 20.0, 20.0, 20.0));
        fixture.home.borrow_mut().modify_piece(piece, PieceProperty::Height, |p| p.height = 40.0);
        assert!(fixture.sync.pending_updates().contains(&piece));

        fixture.home.borrow_mut().delete_item(piece);
        assert!(!fixture.sync.pending_updates().contains(&piece));
        fixture.flush();
        assert!(fixture.sync.update_count(piece).is_none());
    }

    #[test]
    fn test_schedule_invalidates_bounds() {
        let fixture = Fixture::new(Home::new());
        let piece = fixture.home.borrow_mut().add_piece(Piece::new("box", 0.0, 0.0, 20.0, 20.0, 20.0));
        {
            let home = fixture.home.borrow();
            fixture.view.borrow_mut().update_projection(home.camera(), &home);
        }
        fixture.home.borrow_mut().modify_piece(piece, PieceProperty::Color, |p| p.color = Some(0xFF0000));
        assert!(!fixture.view.borrow().bounds_cached());
    }

    // ===== Dependency Tests =====

    #[test]
    fn test_door_moved_into_wall_updates_it() {
        let mut home = Home::new();
        let wall = home.add_wall(Wall::new(0.0, 0.0, 500.0, 0.0, 10.0));
        let far_wall = home.add_wall(Wall::new(0.0, 1000.0, 500.0, 1000.0, 10.0));
        let door = home.add_piece(Piece::new("door", 250.0, 300.0, 90.0, 10.0, 210.0).door_or_window());
        let fixture = Fixture::new(home);

        fixture.home.borrow_mut().modify_piece(door, PieceProperty::Y, |p| p.y = 0.0);
        let pending = fixture.sync.pending_updates();
        assert!(pending.contains(&door));
        assert!(pending.contains(&wall));
        assert!(!pending.contains(&far_wall));
    }

    #[test]
    fn test_door_moved_out_of_wall_updates_it() {
        let mut home = Home::new();
        let wall = home.add_wall(Wall::new(0.0, 0.0, 500.0, 0.0, 10.0));
        let door = home.add_piece(Piece::new("door", 250.0, 0.0, 90.0, 10.0, 210.0).door_or_window());
        let fixture = Fixture::new(home);

        fixture.home.borrow_mut().modify_piece(door, PieceProperty::X, |p| p.x = 2000.0);
        assert!(fixture.sync.pending_updates().contains(&wall));
    }

    #[test]
    fn test_staircase_cut_out_updates_rooms() {
        let mut home = Home::new();
        let rooms = [
            home.add_room(Room::new(square(0.0, 0.0, 100.0))),
            home.add_room(Room::new(square(500.0, 500.0, 100.0))),
        ];
        let stairs = home.add_piece(Piece::new("stairs", 50.0, 50.0, 80.0, 200.0, 300.0).staircase("M0,0 L1,0 L1,1 Z"));
        let fixture = Fixture::new(home);

        fixture
            .home
            .borrow_mut()
            .modify_piece(stairs, PieceProperty::StaircaseCutOutShape, |p| p.staircase_cut_out_shape = Some("M0,0 L1,1 Z".to_string()));
        let pending = fixture.sync.pending_updates();
        assert!(rooms.iter().all(|room| pending.contains(room)));
    }

    #[test]
    fn test_wall_change_updates_neighbours_and_rooms() {
        let mut home = Home::new();
        let first = home.add_wall(Wall::new(0.0, 0.0, 100.0, 0.0, 10.0));
        let second = home.add_wall(Wall::new(100.0, 0.0, 100.0, 100.0, 10.0));
        let lonely = home.add_wall(Wall::new(500.0, 500.0, 600.0, 500.0, 10.0));
        home.modify_wall(first, WallProperty::WallAtEnd, |w| w.wall_at_end = Some(second));
        let room = home.add_room(Room::new(square(0.0, 0.0, 100.0)));
        let fixture = Fixture::new(home);

        fixture.home.borrow_mut().modify_wall(first, WallProperty::Thickness, |w| w.thickness = 20.0);
        let pending = fixture.sync.pending_updates();
        assert!(pending.contains(&first));
        assert!(pending.contains(&second));
        assert!(!pending.contains(&lonely));
        assert!(pending.contains(&room));
    }

    #[test]
    fn test_wall_added_updates_joined_wall() {
        let mut home = Home::new();
        let first = home.add_wall(Wall::new(0.0, 0.0, 100.0, 0.0, 10.0));
        let lonely = home.add_wall(Wall::new(500.0, 500.0, 600.0, 500.0, 10.0));
        let fixture = Fixture::new(home);

        let mut joined = Wall::new(100.0, 0.0, 100.0, 100.0, 10.0);
        joined.wall_at_start = Some(first);
        let second = fixture.home.borrow_mut().add_wall(joined);
        let pending = fixture.sync.pending_updates();
        assert!(pending.contains(&first));
        assert!(!pending.contains(&lonely));
        assert!(fixture.sync.object3d_node(second).is_some());
    }

    #[test]
    fn test_wall_deleted_updates_joined_walls() {
        let mut home = Home::new();
        let first = home.add_wall(Wall::new(0.0, 0.0, 100.0, 0.0, 10.0));
        let second = home.add_wall(Wall::new(100.0, 0.0, 100.0, 100.0, 10.0));
        let third = home.add_wall(Wall::new(-100.0, 0.0, 0.0, 0.0, 10.0));
        home.modify_wall(first, WallProperty::WallAtEnd, |w| w.wall_at_end = Some(second));
        home.modify_wall(third, WallProperty::WallAtEnd, |w| w.wall_at_end = Some(first));
        let fixture = Fixture::new(home);
        let before = (fixture.count(second), fixture.count(third));

        fixture.home.borrow_mut().delete_item(first);
        let pending = fixture.sync.pending_updates();
        assert!(pending.contains(&second));
        assert!(pending.contains(&third));
        assert!(!pending.contains(&first));

        fixture.flush();
        assert_eq!((fixture.count(second), fixture.count(third)), (before.0 + 1, before.1 + 1));
    }

    #[test]
    fn test_wall_pattern_is_ignored() {
        let mut home = Home::new();
        let wall = home.add_wall(Wall::new(0.0, 0.0, 100.0, 0.0, 10.0));
        let fixture = Fixture::new(home);
        fixture.home.borrow_mut().modify_wall(wall, WallProperty::Pattern, |w| w.pattern = Some("hatch".to_string()));
        assert!(fixture.sync.pending_updates().is_empty());
    }

    #[test]
    fn test_room_points_update_overlapping_rooms() {
        let mut home = Home::new();
        let moved = home.add_room(Room::new(square(0.0, 0.0, 100.0)));
        let neighbour = home.add_room(Room::new(square(150.0, 0.0, 100.0)));
        let distant = home.add_room(Room::new(square(1000.0, 1000.0, 100.0)));
        let fixture = Fixture::new(home);

        fixture.home.borrow_mut().modify_room(moved, RoomProperty::Points, |r| r.points = square(120.0, 0.0, 100.0));
        let pending = fixture.sync.pending_updates();
        assert!(pending.contains(&moved));
        assert!(pending.contains(&neighbour));
        assert!(!pending.contains(&distant));
        fixture.flush();
        assert_eq!(fixture.sync.ground_update_count(), 1);
    }

    #[test]
    fn test_room_points_with_pending_updates_all_rooms() {
        let mut home = Home::new();
        let moved = home.add_room(Room::new(square(0.0, 0.0, 100.0)));
        let distant = home.add_room(Room::new(square(1000.0, 1000.0, 100.0)));
        let label = home.add_label(crate::home::Label::new("x", 0.0, 0.0));
        let fixture = Fixture::new(home);

        fixture.sync.schedule_update([label]);
        fixture.home.borrow_mut().modify_room(moved, RoomProperty::Points, |r| r.points = square(10.0, 0.0, 100.0));
        assert!(fixture.sync.pending_updates().contains(&distant));
    }

    #[test]
    fn test_room_overlap_requires_adjacent_level() {
        let mut home = Home::new();
        let ground_floor = home.add_level(Level::new("0", 0.0, 12.0, 250.0));
        let upper_floor = home.add_level(Level::new("1", 262.0, 12.0, 250.0));
        let far_floor = home.add_level(Level::new("2", 1000.0, 12.0, 250.0));
        let moved = home.add_room(Room::new(square(0.0, 0.0, 100.0)).at_level(Some(ground_floor)));
        let above = home.add_room(Room::new(square(0.0, 0.0, 100.0)).at_level(Some(upper_floor)));
        let far = home.add_room(Room::new(square(0.0, 0.0, 100.0)).at_level(Some(far_floor)));
        let fixture = Fixture::new(home);

        fixture.home.borrow_mut().modify_room(moved, RoomProperty::Points, |r| r.points = square(10.0, 10.0, 100.0));
        let pending = fixture.sync.pending_updates();
        assert!(pending.contains(&above));
        assert!(!pending.contains(&far));
    }

    #[test]
    fn test_room_color_updates_room_only() {
        let mut home = Home::new();
        let room = home.add_room(Room::new(square(0.0, 0.0, 100.0)));
        let other = home.add_room(Room::new(square(0.0, 0.0, 100.0)));
        let fixture = Fixture::new(home);

        fixture.home.borrow_mut().modify_room(room, RoomProperty::FloorColor, |r| r.floor_color = Some(0x00FF00));
        assert_eq!(fixture.sync.pending_updates(), vec![room]);
        assert!(!fixture.sync.pending_updates().contains(&other));
    }

    #[test]
    fn test_level_elevation_updates_everything() {
        let mut home = Home::new();
        let level = home.add_level(Level::new("0", 0.0, 12.0, 250.0));
        let wall = home.add_wall(Wall::new(0.0, 0.0, 100.0, 0.0, 10.0));
        let piece = home.add_piece(Piece::new("box", 0.0, 0.0, 20.0, 20.0, 20.0).at_level(Some(level)));
        let fixture = Fixture::new(home);

        fixture.home.borrow_mut().modify_level(level, LevelProperty::Elevation, |l| l.elevation = 100.0);
        let pending = fixture.sync.pending_updates();
        assert!(pending.contains(&wall));
        assert!(pending.contains(&piece));
    }

    #[test]
    fn test_level_visibility_updates_its_items_and_rooms() {
        let mut home = Home::new();
        let level = home.add_level(Level::new("0", 0.0, 12.0, 250.0));
        let other_level = home.add_level(Level::new("1", 262.0, 12.0, 250.0));
        let piece = home.add_piece(Piece::new("box", 0.0, 0.0, 20.0, 20.0, 20.0).at_level(Some(level)));
        let other_piece = home.add_piece(Piece::new("box", 0.0, 0.0, 20.0, 20.0, 20.0).at_level(Some(other_level)));
        let room = home.add_room(Room::new(square(0.0, 0.0, 100.0)).at_level(Some(other_level)));
        let fixture = Fixture::new(home);

        fixture.home.borrow_mut().modify_level(level, LevelProperty::Viewable, |l| l.viewable = false);
        let pending = fixture.sync.pending_updates();
        assert!(pending.contains(&piece));
        assert!(pending.contains(&room));
        assert!(!pending.contains(&other_piece));
    }

    #[test]
    fn test_selecting_group_updates_its_pieces() {
        let mut home = Home::new();
        let group = home.add_furniture_group(
            "set",
            vec![
                Piece::new("table", 0.0, 0.0, 100.0, 60.0, 75.0),
                Piece::new("chair", 50.0, 50.0, 40.0, 40.0, 80.0),
            ],
        );
        let pieces = home.furniture_pieces(group);
        let fixture = Fixture::new(home);

        fixture.home.borrow_mut().set_selected_items(vec![group]);
        let pending = fixture.sync.pending_updates();
        assert!(pieces.iter().all(|piece| pending.contains(piece)));
        fixture.flush();
        assert!(pieces.iter().all(|&piece| fixture.count(piece) == 1));
    }

    #[test]
    fn test_unit_change_updates_dimension_lines() {
        let mut home = Home::new();
        let line = home.add_dimension_line(DimensionLine::new(0.0, 0.0, 100.0, 0.0, 20.0));
        let fixture = Fixture::new(home);
        fixture.home.borrow_mut().modify_preferences(|preferences| preferences.unit = LengthUnit::Meter);
        assert_eq!(fixture.sync.pending_updates(), vec![line]);
    }

    // ===== Environment Tests =====

    #[test]
    fn test_ground_updates_coalesce() {
        let fixture = Fixture::new(Home::new());
        fixture.home.borrow_mut().modify_environment(|environment| environment.ground_color = 0x00FF00);
        fixture.home.borrow_mut().set_background_image(Some("plan.png".to_string()));
        fixture.home.borrow_mut().modify_environment(|environment| environment.background_image_visible_on_ground_3d = true);
        fixture.flush();
        assert_eq!(fixture.sync.ground_update_count(), 1);
    }

    #[test]
    fn test_light_color_tints_lights() {
        let fixture = Fixture::new(Home::new());
        fixture.home.borrow_mut().modify_environment(|environment| environment.light_color = 0x000000);
        let home_scene = fixture.sync.home_scene();
        for light in &home_scene.lights {
            let node = home_scene.scene.get_node(light.node).unwrap();
            let NodeKind::Light(light) = node.kind() else {
                panic!("not a light");
            };
            assert_eq!(light.color(), crate::common::RgbaColor::rgb(0.0, 0.0, 0.0));
        }
    }

    // ===== Camera Tests =====

    #[test]
    fn test_camera_change_animates_next_tick() {
        let fixture = Fixture::new(Home::new());
        fixture
            .home
            .borrow_mut()
            .modify_camera(CameraKind::Top, |camera| *camera = Camera::new(100.0, 200.0, 300.0, 0.5, 0.3, 1.0));
        assert!(fixture.view.borrow().applied_pose().is_none());

        fixture.flush();
        fixture.tasks.run_frames_until_idle(Duration::from_millis(16));
        let pose = fixture.view.borrow().applied_pose().unwrap();
        assert_eq!(pose, crate::view_controller::CameraPose::from_camera(fixture.home.borrow().camera()));
    }

    #[test]
    fn test_camera_switch_applies_at_once() {
        let fixture = Fixture::new(Home::new());
        fixture
            .home
            .borrow_mut()
            .modify_camera(CameraKind::Observer, |camera| camera.z = -20.0);
        // Inactive camera: nothing to do
        assert_eq!(fixture.tasks.pending_ticks(), 0);

        fixture.home.borrow_mut().set_active_camera(CameraKind::Observer);
        let pose = fixture.view.borrow().applied_pose().unwrap();
        assert_eq!(pose, crate::view_controller::CameraPose::from_camera(fixture.home.borrow().camera()));
        let ground_plane = fixture.sync.home_scene().background.ground_plane;
        assert!(!fixture.sync.scene().is_visible(ground_plane));
    }

    // ===== Lifecycle Tests =====

    #[test]
    fn test_dispose_removes_listeners_and_subtrees() {
        let mut home = Home::new();
        home.add_wall(Wall::new(0.0, 0.0, 100.0, 0.0, 10.0));
        let fixture = Fixture::new(home);
        assert!(fixture.home.borrow().listener_count() > 0);

        fixture.sync.dispose(&mut fixture.home.borrow_mut());
        assert_eq!(fixture.home.borrow().listener_count(), 0);
        assert!(fixture.sync.tracked_objects().is_empty());
        let home_root = fixture.sync.home_scene().home_root;
        assert!(fixture.sync.scene().get_node(home_root).unwrap().children().is_empty());

        // Later changes are not observed
        fixture.home.borrow_mut().add_wall(Wall::new(0.0, 0.0, 100.0, 0.0, 10.0));
        assert!(fixture.sync.tracked_objects().is_empty());
    }
}
