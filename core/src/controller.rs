//! Editing controller interface driven by gestures and keyboard actions.

use std::cell::RefCell;
use std::f32::consts::FRAC_PI_2;
use std::rc::Rc;

use crate::home::Home;
use crate::input::{PointerType, PressFlags};

/// Lowest eye elevation above the first level.
const MIN_EYE_ELEVATION: f32 = 10.0;

/// Receiver of the high level actions the 3D view derives from raw input.
///
/// The controller decides whether a press starts an edit or not, and
/// reports it through [`EditingController::is_editing_state`], which tells
/// the gesture engine to forward moves instead of navigating.
pub trait EditingController {
    fn press_mouse(&mut self, x: f32, y: f32, click_count: u32, flags: PressFlags, pointer_type: PointerType);
    fn move_mouse(&mut self, x: f32, y: f32);
    fn release_mouse(&mut self, x: f32, y: f32);
    /// Moves the camera forward, or backward for a negative delta.
    fn move_camera(&mut self, delta: f32);
    /// Moves the camera to the right, or to the left for a negative delta.
    fn move_camera_sideways(&mut self, delta: f32);
    fn elevate_camera(&mut self, delta: f32);
    fn rotate_camera_yaw(&mut self, delta: f32);
    fn rotate_camera_pitch(&mut self, delta: f32);
    /// Cancels the current operation.
    fn escape(&mut self);
    fn set_alignment_activated(&mut self, activated: bool);
    fn set_duplication_activated(&mut self, activated: bool);
    fn toggle_magnetism(&mut self, toggled: bool);
    fn is_editing_state(&self) -> bool;
}

/// Controller navigating the active camera like a visitor walking in the
/// home. It never enters an editing state, so every drag navigates.
pub struct ObserverNavigator {
    home: Rc<RefCell<Home>>,
    alignment_activated: bool,
    duplication_activated: bool,
    magnetism_toggled: bool,
}

impl ObserverNavigator {
    pub fn new(home: Rc<RefCell<Home>>) -> Self {
        Self {
            home,
            alignment_activated: false,
            duplication_activated: false,
            magnetism_toggled: false,
        }
    }

    pub fn is_alignment_activated(&self) -> bool {
        self.alignment_activated
    }

    pub fn is_duplication_activated(&self) -> bool {
        self.duplication_activated
    }

    pub fn is_magnetism_toggled(&self) -> bool {
        self.magnetism_toggled
    }

    fn min_elevation(home: &Home) -> f32 {
        let first_level = home.levels().first().copied();
        MIN_EYE_ELEVATION + home.level_elevation(first_level)
    }
}

impl EditingController for ObserverNavigator {
    fn press_mouse(&mut self, _x: f32, _y: f32, _click_count: u32, _flags: PressFlags, _pointer_type: PointerType) {}

    fn move_mouse(&mut self, _x: f32, _y: f32) {}

    fn release_mouse(&mut self, _x: f32, _y: f32) {}

    fn move_camera(&mut self, delta: f32) {
        let mut home = self.home.borrow_mut();
        let kind = home.active_camera();
        home.modify_camera(kind, |camera| {
            camera.x -= camera.yaw.sin() * delta;
            camera.y += camera.yaw.cos() * delta;
        });
    }

    fn move_camera_sideways(&mut self, delta: f32) {
        let mut home = self.home.borrow_mut();
        let kind = home.active_camera();
        home.modify_camera(kind, |camera| {
            camera.x -= camera.yaw.cos() * delta;
            camera.y -= camera.yaw.sin() * delta;
        });
    }

    fn elevate_camera(&mut self, delta: f32) {
        let mut home = self.home.borrow_mut();
        let kind = home.active_camera();
        let min_elevation = Self::min_elevation(&home);
        home.modify_camera(kind, |camera| {
            camera.z = (camera.z + delta).max(min_elevation);
        });
    }

    fn rotate_camera_yaw(&mut self, delta: f32) {
        let mut home = self.home.borrow_mut();
        let kind = home.active_camera();
        home.modify_camera(kind, |camera| camera.yaw += delta);
    }

    fn rotate_camera_pitch(&mut self, delta: f32) {
        let mut home = self.home.borrow_mut();
        let kind = home.active_camera();
        home.modify_camera(kind, |camera| {
            camera.pitch = (camera.pitch + delta).clamp(-FRAC_PI_2, FRAC_PI_2);
        });
    }

    fn escape(&mut self) {
        log::debug!("Escape while navigating");
    }

    fn set_alignment_activated(&mut self, activated: bool) {
        self.alignment_activated = activated;
    }

    fn set_duplication_activated(&mut self, activated: bool) {
        self.duplication_activated = activated;
    }

    fn toggle_magnetism(&mut self, toggled: bool) {
        self.magnetism_toggled = toggled;
    }

    fn is_editing_state(&self) -> bool {
        false
    }
}
