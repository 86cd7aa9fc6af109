use std::cell::{Ref, RefCell};
use std::rc::Rc;

use cgmath::Point3;

use crate::config::Component3DConfig;
use crate::controller::EditingController;
use crate::event::{CanvasBounds, EventContext, InputDispatcher, InputEvent, ItemPicker};
use crate::gesture::{GestureEngine, LongTouchOverlay};
use crate::home::{CameraKind, Home, ObjectId};
use crate::keyboard::KeyboardActionMap;
use crate::object3d::{ModelLoader, Object3DFactory};
use crate::operator::{BuiltinOperatorId, GestureOperator, KeyboardOperator, OperatorManager};
use crate::scene::{pick_closest_shape, NodeId, Scene, View};
use crate::scene_builder::build_home_scene;
use crate::sync::Synchronizer;
use crate::tasks::TaskQueue;
use crate::view_controller::ViewController;

/// 3D view of a home: the scene kept in sync with the home, the camera
/// driving the view and, with an editing controller, the input handling.
///
/// Deferred work (coalesced updates, animation frames, long touch timers)
/// runs on the [`TaskQueue`] given at creation, which the host pumps.
pub struct HomeComponent3D {
    home: Rc<RefCell<Home>>,
    sync: Rc<Synchronizer>,
    view: Rc<RefCell<ViewController>>,
    tasks: TaskQueue,
    dispatcher: InputDispatcher,
    operators: OperatorManager,
    gesture: Option<Rc<GestureEngine>>,
    canvas: CanvasBounds,
    focused: bool,
    disposed: bool,
}

impl HomeComponent3D {
    /// Builds the 3D view of `home`.
    ///
    /// Without a `controller` the view only displays the home and follows
    /// its camera.
    pub fn new(
        home: Rc<RefCell<Home>>,
        config: Component3DConfig,
        factory: Rc<dyn Object3DFactory>,
        loader: Rc<dyn ModelLoader>,
        tasks: TaskQueue,
        controller: Option<Rc<RefCell<dyn EditingController>>>,
    ) -> anyhow::Result<Self> {
        config.validate()?;
        let Component3DConfig {
            platform,
            gesture,
            view: view_config,
            keyboard,
        } = config;

        // Sized once the host lays the canvas out
        let view = Rc::new(RefCell::new(ViewController::new(view_config, 0, 0)));
        let sync = {
            let home_ref = home.borrow();
            let home_scene = build_home_scene(&home_ref, factory.as_ref(), loader)?;
            let camera = *home_ref.camera();
            let mut controller = view.borrow_mut();
            controller.update_projection(&camera, &home_ref);
            controller.apply_camera(&camera);
            Synchronizer::new(&home, home_scene, factory, view.clone(), tasks.clone())
        };
        sync.install(&mut home.borrow_mut());

        let mut dispatcher = InputDispatcher::new();
        let mut operators = OperatorManager::new();
        let mut gesture_engine = None;
        if let Some(controller) = controller {
            let engine = GestureEngine::new(controller.clone(), tasks.clone(), gesture, platform);
            gesture_engine = Some(engine.clone());
            operators.push_back(
                Box::new(GestureOperator::new(BuiltinOperatorId::Gesture.into(), engine)),
                &mut dispatcher,
            );
            operators.push_back(
                Box::new(KeyboardOperator::new(
                    BuiltinOperatorId::Keyboard.into(),
                    KeyboardActionMap::new(platform, keyboard),
                    controller,
                )),
                &mut dispatcher,
            );
        }

        log::info!(
            "3D view created with {} objects and {} operators",
            sync.tracked_objects().len(),
            operators.len()
        );
        Ok(Self {
            home,
            sync,
            view,
            tasks,
            dispatcher,
            operators,
            gesture: gesture_engine,
            canvas: CanvasBounds::default(),
            focused: false,
            disposed: false,
        })
    }

    /// Feeds a host event to the operators.
    ///
    /// Returns `true` when the event was consumed; for a context menu event
    /// this means the host must not show the menu.
    pub fn dispatch_input(&mut self, event: &InputEvent) -> bool {
        let (editing_in_3d_enabled, observer_camera_active) = {
            let home = self.home.borrow();
            (
                home.preferences().editing_in_3d_enabled,
                home.active_camera() == CameraKind::Observer,
            )
        };
        let picker = ScenePicker {
            sync: &self.sync,
            view: &self.view,
        };
        let mut ctx = EventContext {
            canvas: self.canvas,
            focused: self.focused,
            now: self.tasks.now(),
            editing_in_3d_enabled,
            observer_camera_active,
            picker: &picker,
        };
        self.dispatcher.dispatch(event, &mut ctx)
    }

    pub fn set_focused(&mut self, focused: bool) {
        self.focused = focused;
    }

    /// Moves the canvas in client space, keeping its size.
    pub fn set_canvas_location(&mut self, left: f32, top: f32) {
        self.canvas.left = left;
        self.canvas.top = top;
    }

    /// Resizes the canvas and the projection.
    pub fn set_canvas_size(&mut self, width: u32, height: u32) {
        self.canvas.width = width as f32;
        self.canvas.height = height as f32;
        let home = self.home.borrow();
        let mut view = self.view.borrow_mut();
        view.set_size(width, height);
        view.update_projection(home.camera(), &home);
    }

    pub fn canvas(&self) -> CanvasBounds {
        self.canvas
    }

    /// Returns the closest home item displayed at client coordinates `(x, y)`.
    pub fn get_closest_item_at(&self, x: f32, y: f32) -> Option<ObjectId> {
        let (canvas_x, canvas_y) = self.canvas.to_canvas(x, y);
        closest_item_at(&self.sync, &self.view, canvas_x, canvas_y)
    }

    /// Returns the closest home item displayed at canvas coordinates `(x, y)`.
    pub fn get_closest_selectable_item_at(&self, x: f32, y: f32) -> Option<ObjectId> {
        self.get_closest_item_at(x + self.canvas.left, y + self.canvas.top)
    }

    /// Maps canvas coordinates to a point of the virtual world, in plan
    /// coordinates `[x, y, elevation]`.
    pub fn convert_pixel_location_to_virtual_world(&self, x: f32, y: f32) -> Option<[f32; 3]> {
        let point = self.view.borrow().view().pixel_to_world(x, y)?;
        Some([point.x, point.z, point.y])
    }

    /// Returns the plan point at `elevation` on the line joining the camera
    /// eye and the canvas location `(x, y)`.
    ///
    /// A line heading to the sky is mirrored to head to the ground.
    pub fn get_virtual_world_point_at(&self, x: f32, y: f32, elevation: f32) -> Option<[f32; 3]> {
        let point = self.view.borrow().view().pixel_to_world(x, y)?;
        let camera = *self.home.borrow().camera();
        let eye = Point3::new(camera.x, camera.z, camera.y);
        let mut direction = point - eye;
        if direction.y > 0.0 {
            direction.y = -direction.y;
        }
        if direction.y == 0.0 {
            return None;
        }
        let t = (elevation - point.y) / direction.y;
        Some([point.x + t * direction.x, point.z + t * direction.z, elevation])
    }

    pub fn scene(&self) -> Ref<'_, Scene> {
        self.sync.scene()
    }

    pub fn view(&self) -> Ref<'_, View> {
        Ref::map(self.view.borrow(), ViewController::view)
    }

    pub fn view_controller(&self) -> &Rc<RefCell<ViewController>> {
        &self.view
    }

    pub fn synchronizer(&self) -> &Rc<Synchronizer> {
        &self.sync
    }

    pub fn tracked_objects(&self) -> Vec<ObjectId> {
        self.sync.tracked_objects()
    }

    pub fn object3d_node(&self, item: ObjectId) -> Option<NodeId> {
        self.sync.object3d_node(item)
    }

    pub fn operators(&self) -> &OperatorManager {
        &self.operators
    }

    pub fn dispatcher(&self) -> &InputDispatcher {
        &self.dispatcher
    }

    /// Long touch countdown to draw over the canvas, if any.
    pub fn long_touch_overlay(&self) -> Option<LongTouchOverlay> {
        self.gesture
            .as_ref()
            .map(|engine| engine.long_touch_overlay())
            .filter(|overlay| overlay.visible)
    }

    /// Removes the home listeners, the input callbacks and the home subtrees.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;
        self.operators.clear(&mut self.dispatcher);
        self.sync.dispose(&mut self.home.borrow_mut());
        self.gesture = None;
        log::info!("3D view disposed");
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }
}

/// Item lookup handed to the gesture logic through the event context.
struct ScenePicker<'a> {
    sync: &'a Synchronizer,
    view: &'a RefCell<ViewController>,
}

impl ItemPicker for ScenePicker<'_> {
    fn closest_selectable_item_at(&self, x: f32, y: f32) -> Option<ObjectId> {
        closest_item_at(self.sync, self.view, x, y)
    }
}

/// Casts a ray through canvas coordinates and returns the item owning the
/// nearest shape of the home tree.
fn closest_item_at(sync: &Synchronizer, view: &RefCell<ViewController>, x: f32, y: f32) -> Option<ObjectId> {
    let ray = view.borrow().view().pick_ray(x, y)?;
    let node = {
        let home_scene = sync.home_scene();
        pick_closest_shape(&home_scene.scene, home_scene.home_root, &ray)?.node_id
    };
    sync.item_at_node(node)
}
