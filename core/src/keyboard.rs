//! Key strokes bound to camera and editing actions.

use std::collections::HashMap;

use crate::config::KeyboardConfig;
use crate::controller::EditingController;
use crate::input::{Key, KeyEvent, KeyStroke, ModifierSet, NamedKey, PlatformFamily};

const UP: Key = Key::Named(NamedKey::ArrowUp);
const DOWN: Key = Key::Named(NamedKey::ArrowDown);
const LEFT: Key = Key::Named(NamedKey::ArrowLeft);
const RIGHT: Key = Key::Named(NamedKey::ArrowRight);
const PAGE_UP: Key = Key::Named(NamedKey::PageUp);
const PAGE_DOWN: Key = Key::Named(NamedKey::PageDown);
const HOME: Key = Key::Named(NamedKey::Home);
const END: Key = Key::Named(NamedKey::End);
const ESCAPE: Key = Key::Named(NamedKey::Escape);
const SHIFT_KEY: Key = Key::Named(NamedKey::Shift);
const CONTROL_KEY: Key = Key::Named(NamedKey::Control);
const ALT_KEY: Key = Key::Named(NamedKey::Alt);
const META_KEY: Key = Key::Named(NamedKey::Meta);

const NONE: ModifierSet = ModifierSet::empty();
const SHIFT: ModifierSet = ModifierSet::SHIFT;
const CONTROL: ModifierSet = ModifierSet::CONTROL;
const ALT: ModifierSet = ModifierSet::ALT;
const META: ModifierSet = ModifierSet::META;

/// Action triggered by a key stroke.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyboardAction {
    MoveCameraForward,
    MoveCameraFastForward,
    MoveCameraBackward,
    MoveCameraFastBackward,
    MoveCameraLeft,
    MoveCameraFastLeft,
    MoveCameraRight,
    MoveCameraFastRight,
    ElevateCameraUp,
    ElevateCameraFastUp,
    ElevateCameraDown,
    ElevateCameraFastDown,
    RotateCameraYawLeft,
    RotateCameraYawFastLeft,
    RotateCameraYawRight,
    RotateCameraYawFastRight,
    RotateCameraPitchUp,
    RotateCameraPitchFastUp,
    RotateCameraPitchDown,
    RotateCameraPitchFastDown,
    Escape,
    ActivateAlignment,
    DeactivateAlignment,
    ActivateDuplication,
    DeactivateDuplication,
    ToggleMagnetismOn,
    ToggleMagnetismOff,
}

/// Ordered list of bindings; a later binding of the same stroke wins.
struct Bindings(Vec<(KeyStroke, KeyboardAction)>);

impl Bindings {
    fn pressed(&mut self, modifiers: ModifierSet, key: Key, action: KeyboardAction) {
        self.0.push((KeyStroke::pressed(modifiers, key), action));
    }

    fn released(&mut self, modifiers: ModifierSet, key: Key, action: KeyboardAction) {
        self.0.push((KeyStroke::released(modifiers, key), action));
    }
}

/// Maps key strokes to [`KeyboardAction`]s and runs them against an
/// [`EditingController`].
pub struct KeyboardActionMap {
    input_map: HashMap<KeyStroke, KeyboardAction>,
    config: KeyboardConfig,
}

impl KeyboardActionMap {
    pub fn new(platform: PlatformFamily, config: KeyboardConfig) -> Self {
        let bindings = Self::bindings(platform);
        Self {
            input_map: bindings.0.into_iter().collect(),
            config,
        }
    }

    fn bindings(platform: PlatformFamily) -> Bindings {
        use KeyboardAction::*;

        let mut map = Bindings(Vec::new());
        let w = Key::Character('W');
        let s = Key::Character('S');
        let a = Key::Character('A');
        let d = Key::Character('D');

        // Alt is tolerated on UP and DOWN so forward moves alternate with
        // sideways moves without releasing it.
        map.pressed(SHIFT, UP, MoveCameraFastForward);
        map.pressed(ALT | SHIFT, UP, MoveCameraFastForward);
        map.pressed(SHIFT, w, MoveCameraFastForward);
        map.pressed(NONE, UP, MoveCameraForward);
        map.pressed(ALT, UP, MoveCameraForward);
        map.pressed(NONE, w, MoveCameraForward);
        map.pressed(SHIFT, DOWN, MoveCameraFastBackward);
        map.pressed(ALT | SHIFT, DOWN, MoveCameraFastBackward);
        map.pressed(SHIFT, s, MoveCameraFastBackward);
        map.pressed(NONE, DOWN, MoveCameraBackward);
        map.pressed(ALT, DOWN, MoveCameraBackward);
        map.pressed(NONE, s, MoveCameraBackward);
        map.pressed(ALT | SHIFT, LEFT, MoveCameraFastLeft);
        map.pressed(ALT, LEFT, MoveCameraLeft);
        map.pressed(ALT | SHIFT, RIGHT, MoveCameraFastRight);
        map.pressed(ALT, RIGHT, MoveCameraRight);
        map.pressed(SHIFT, LEFT, RotateCameraYawFastLeft);
        map.pressed(SHIFT, a, RotateCameraYawFastLeft);
        map.pressed(NONE, LEFT, RotateCameraYawLeft);
        map.pressed(NONE, a, RotateCameraYawLeft);
        map.pressed(SHIFT, RIGHT, RotateCameraYawFastRight);
        map.pressed(SHIFT, d, RotateCameraYawFastRight);
        map.pressed(NONE, RIGHT, RotateCameraYawRight);
        map.pressed(NONE, d, RotateCameraYawRight);
        map.pressed(SHIFT, PAGE_UP, RotateCameraPitchFastUp);
        map.pressed(NONE, PAGE_UP, RotateCameraPitchUp);
        map.pressed(SHIFT, PAGE_DOWN, RotateCameraPitchFastDown);
        map.pressed(NONE, PAGE_DOWN, RotateCameraPitchDown);
        map.pressed(SHIFT, HOME, ElevateCameraFastUp);
        map.pressed(NONE, HOME, ElevateCameraUp);
        map.pressed(SHIFT, END, ElevateCameraFastDown);
        map.pressed(NONE, END, ElevateCameraDown);

        // Duplication
        match platform {
            PlatformFamily::MacOs => {
                map.pressed(ALT, ALT_KEY, ActivateDuplication);
                map.released(NONE, ALT_KEY, DeactivateDuplication);
                map.pressed(SHIFT | ALT, ALT_KEY, ActivateDuplication);
                map.released(SHIFT, ALT_KEY, DeactivateDuplication);
                map.pressed(META | ALT, ALT_KEY, ActivateDuplication);
                map.released(META, ALT_KEY, DeactivateDuplication);
                map.pressed(SHIFT | META | ALT, ALT_KEY, ActivateDuplication);
                map.released(SHIFT | META, ALT_KEY, DeactivateDuplication);
            }
            PlatformFamily::Windows | PlatformFamily::Other => {
                map.pressed(CONTROL, CONTROL_KEY, ActivateDuplication);
                map.released(NONE, CONTROL_KEY, DeactivateDuplication);
                map.pressed(SHIFT | CONTROL, CONTROL_KEY, ActivateDuplication);
                map.released(SHIFT, CONTROL_KEY, DeactivateDuplication);
                map.pressed(META | CONTROL, CONTROL_KEY, ActivateDuplication);
                map.released(META, CONTROL_KEY, DeactivateDuplication);
                map.pressed(SHIFT | META | CONTROL, CONTROL_KEY, ActivateDuplication);
                map.released(SHIFT | META, CONTROL_KEY, DeactivateDuplication);
            }
        }

        // Magnetism
        match platform {
            PlatformFamily::Windows => {
                map.pressed(ALT, ALT_KEY, ToggleMagnetismOn);
                map.released(NONE, ALT_KEY, ToggleMagnetismOff);
                map.pressed(SHIFT | ALT, ALT_KEY, ToggleMagnetismOn);
                map.released(SHIFT, ALT_KEY, ToggleMagnetismOff);
                map.pressed(CONTROL | ALT, ALT_KEY, ToggleMagnetismOn);
                map.released(CONTROL, ALT_KEY, ToggleMagnetismOff);
                map.pressed(SHIFT | CONTROL | ALT, ALT_KEY, ToggleMagnetismOn);
                map.released(SHIFT | CONTROL, ALT_KEY, ToggleMagnetismOff);
            }
            PlatformFamily::MacOs => {
                map.pressed(META, META_KEY, ToggleMagnetismOn);
                map.released(NONE, META_KEY, ToggleMagnetismOff);
                map.pressed(SHIFT | META, META_KEY, ToggleMagnetismOn);
                map.released(SHIFT, META_KEY, ToggleMagnetismOff);
                map.pressed(ALT | META, META_KEY, ToggleMagnetismOn);
                map.released(ALT, META_KEY, ToggleMagnetismOff);
                map.pressed(SHIFT | ALT | META, META_KEY, ToggleMagnetismOn);
                map.released(SHIFT | ALT, META_KEY, ToggleMagnetismOff);
            }
            PlatformFamily::Other => {
                map.pressed(SHIFT | ALT, ALT_KEY, ToggleMagnetismOn);
                map.pressed(ALT | SHIFT, SHIFT_KEY, ToggleMagnetismOn);
                map.released(ALT, SHIFT_KEY, ToggleMagnetismOff);
                map.released(SHIFT, ALT_KEY, ToggleMagnetismOff);
                map.pressed(CONTROL | SHIFT | ALT, ALT_KEY, ToggleMagnetismOn);
                map.pressed(CONTROL | ALT | SHIFT, SHIFT_KEY, ToggleMagnetismOn);
                map.released(CONTROL | ALT, SHIFT_KEY, ToggleMagnetismOff);
                map.released(CONTROL | SHIFT, ALT_KEY, ToggleMagnetismOff);
            }
        }

        // Alignment
        map.pressed(SHIFT, SHIFT_KEY, ActivateAlignment);
        map.released(NONE, SHIFT_KEY, DeactivateAlignment);
        match platform {
            PlatformFamily::Windows => {
                map.pressed(CONTROL | SHIFT, SHIFT_KEY, ActivateAlignment);
                map.released(CONTROL, SHIFT_KEY, DeactivateAlignment);
                map.pressed(ALT | SHIFT, SHIFT_KEY, ActivateAlignment);
                map.released(ALT, SHIFT_KEY, DeactivateAlignment);
            }
            PlatformFamily::MacOs => {
                map.pressed(ALT | SHIFT, SHIFT_KEY, ActivateAlignment);
                map.released(ALT, SHIFT_KEY, DeactivateAlignment);
                map.pressed(META | SHIFT, SHIFT_KEY, ActivateAlignment);
                map.released(META, SHIFT_KEY, DeactivateAlignment);
            }
            PlatformFamily::Other => {
                map.pressed(CONTROL | SHIFT, SHIFT_KEY, ActivateAlignment);
                map.released(CONTROL, SHIFT_KEY, DeactivateAlignment);
                // Releasing alt while shift stays down goes back to alignment.
                map.released(SHIFT, ALT_KEY, ActivateAlignment);
                map.released(CONTROL | SHIFT, ALT_KEY, ActivateAlignment);
            }
        }
        map
    }

    /// The action bound to `stroke`, if any.
    ///
    /// Pressing escape cancels whatever modifiers are held.
    pub fn action_for(&self, stroke: &KeyStroke) -> Option<KeyboardAction> {
        if stroke.pressed && stroke.key == ESCAPE {
            return Some(KeyboardAction::Escape);
        }
        self.input_map.get(stroke).copied()
    }

    pub fn len(&self) -> usize {
        self.input_map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.input_map.is_empty()
    }

    /// Runs the action bound to the key event.
    ///
    /// Returns `true` when a binding matched, `false` lets the event through.
    pub fn handle(&self, event: &KeyEvent, controller: &mut dyn EditingController) -> bool {
        match self.action_for(&KeyStroke::for_event(event)) {
            Some(action) => {
                self.perform(action, controller);
                true
            }
            None => false,
        }
    }

    pub fn perform(&self, action: KeyboardAction, controller: &mut dyn EditingController) {
        use KeyboardAction::*;

        let config = &self.config;
        match action {
            MoveCameraForward => controller.move_camera(config.move_delta),
            MoveCameraFastForward => controller.move_camera(config.fast_move_delta),
            MoveCameraBackward => controller.move_camera(-config.move_delta),
            MoveCameraFastBackward => controller.move_camera(-config.fast_move_delta),
            MoveCameraLeft => controller.move_camera_sideways(-config.sideways_delta),
            MoveCameraFastLeft => controller.move_camera_sideways(-config.fast_sideways_delta),
            MoveCameraRight => controller.move_camera_sideways(config.sideways_delta),
            MoveCameraFastRight => controller.move_camera_sideways(config.fast_sideways_delta),
            ElevateCameraUp => controller.elevate_camera(config.elevate_delta),
            ElevateCameraFastUp => controller.elevate_camera(config.fast_elevate_delta),
            ElevateCameraDown => controller.elevate_camera(-config.elevate_delta),
            ElevateCameraFastDown => controller.elevate_camera(-config.fast_elevate_delta),
            RotateCameraYawLeft => controller.rotate_camera_yaw(-config.yaw_delta),
            RotateCameraYawFastLeft => controller.rotate_camera_yaw(-config.fast_yaw_delta),
            RotateCameraYawRight => controller.rotate_camera_yaw(config.yaw_delta),
            RotateCameraYawFastRight => controller.rotate_camera_yaw(config.fast_yaw_delta),
            RotateCameraPitchUp => controller.rotate_camera_pitch(-config.pitch_delta),
            RotateCameraPitchFastUp => controller.rotate_camera_pitch(-config.fast_pitch_delta),
            RotateCameraPitchDown => controller.rotate_camera_pitch(config.pitch_delta),
            RotateCameraPitchFastDown => controller.rotate_camera_pitch(config.fast_pitch_delta),
            Escape => controller.escape(),
            ActivateAlignment => controller.set_alignment_activated(true),
            DeactivateAlignment => controller.set_alignment_activated(false),
            ActivateDuplication => controller.set_duplication_activated(true),
            DeactivateDuplication => controller.set_duplication_activated(false),
            ToggleMagnetismOn => controller.toggle_magnetism(true),
            ToggleMagnetismOff => controller.toggle_magnetism(false),
        }
    }
}
