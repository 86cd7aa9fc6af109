//! Gesture state machine turning mouse and touch streams into editing
//! controller calls.
//!
//! Mouse presses, single finger touches and pointer emulated touches all end
//! up as press / move / release notifications. Drags outside an editing state
//! navigate the camera, two finger pinches dolly it, and a still finger over
//! a selectable item arms a long touch that emulates the alignment modifier.

use std::cell::RefCell;
use std::rc::{Rc, Weak};
use std::time::Duration;

use crate::common::Point2;
use crate::config::GestureConfig;
use crate::controller::EditingController;
use crate::event::{EventContext, InputEvent, TouchEvent};
use crate::input::{Modifiers, MouseButton, PlatformFamily, PointerType, PressFlags, TouchPoint};
use crate::tasks::{TaskQueue, TimerId};

/// Countdown displayed while a long touch is being confirmed.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LongTouchOverlay {
    pub visible: bool,
    /// Touch location in canvas coordinates.
    pub anchor: Point2,
    /// Task queue time at which the countdown started.
    pub start: Duration,
    pub duration: Duration,
}

impl LongTouchOverlay {
    /// Countdown progress in `[0, 1]` at time `now`.
    pub fn progress(&self, now: Duration) -> f32 {
        if self.duration.is_zero() {
            return 1.0;
        }
        (now.saturating_sub(self.start).as_secs_f32() / self.duration.as_secs_f32()).min(1.0)
    }
}

/// Observable state of the current interaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GesturePhase {
    Idle,
    /// Pressed without moving yet.
    Pressed,
    Dragging,
    /// A still touch waits for the long touch countdown.
    LongPressPending,
    /// The long touch emulates the alignment modifier.
    LongPressActive,
    Pinching,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TouchPhase {
    Started,
    Moved,
    Ended,
}

#[derive(Default)]
struct GestureState {
    initial_location: Option<Point2>,
    last_location: Option<Point2>,
    action_started_in_view: bool,
    /// Fingers are down; mouse events are ignored meanwhile.
    touch_stream: bool,
    context_menu_shown: bool,
    suppress_context_menu: bool,
    /// Whether the last accepted touch sample came from a touch start.
    last_sample_was_start: bool,
    last_touches: Vec<TouchPoint>,
    pinch_distance: Option<f32>,
    first_touch_time: Option<Duration>,
    long_touch_timer: Option<TimerId>,
    long_touch_post_task: Option<TimerId>,
    long_touch_start: Option<Duration>,
    long_touch_activated: bool,
    double_long_touch_activated: bool,
    overlay: LongTouchOverlay,
}

pub struct GestureEngine {
    state: RefCell<GestureState>,
    controller: Rc<RefCell<dyn EditingController>>,
    tasks: TaskQueue,
    config: GestureConfig,
    platform: PlatformFamily,
    this: Weak<GestureEngine>,
}

impl GestureEngine {
    pub fn new(
        controller: Rc<RefCell<dyn EditingController>>,
        tasks: TaskQueue,
        config: GestureConfig,
        platform: PlatformFamily,
    ) -> Rc<Self> {
        Rc::new_cyclic(|this| Self {
            state: RefCell::new(GestureState::default()),
            controller,
            tasks,
            config,
            platform,
            this: this.clone(),
        })
    }

    pub fn phase(&self) -> GesturePhase {
        let state = self.state.borrow();
        if !state.action_started_in_view {
            GesturePhase::Idle
        } else if state.pinch_distance.is_some() {
            GesturePhase::Pinching
        } else if state.long_touch_activated {
            GesturePhase::LongPressActive
        } else if state.long_touch_timer.is_some() {
            GesturePhase::LongPressPending
        } else if state.initial_location.is_some() {
            GesturePhase::Pressed
        } else {
            GesturePhase::Dragging
        }
    }

    pub fn long_touch_overlay(&self) -> LongTouchOverlay {
        self.state.borrow().overlay
    }

    /// Handles a mouse, touch or context menu event.
    ///
    /// Returns `true` when the event was consumed. For a context menu event,
    /// `true` means the host must not display the menu.
    pub fn handle(&self, event: &InputEvent, ctx: &EventContext<'_>) -> bool {
        match event {
            InputEvent::MousePressed { x, y, button, modifiers } => self.mouse_pressed(*x, *y, *button, modifiers, 1, ctx),
            InputEvent::MouseDoubleClicked { x, y, button, modifiers } => self.mouse_double_clicked(*x, *y, *button, modifiers, ctx),
            InputEvent::MouseMoved { x, y, buttons_down, modifiers } => self.mouse_moved(*x, *y, *buttons_down, modifiers, ctx),
            InputEvent::MouseReleased { x, y, button, .. } => self.mouse_released(*x, *y, *button, ctx),
            InputEvent::MouseWheel { x, y, delta_y, modifiers } => self.mouse_wheel(*x, *y, *delta_y, modifiers, ctx),
            InputEvent::ContextMenu { x, y } => self.context_menu(*x, *y, ctx),
            InputEvent::TouchStarted(touch) => self.touch_started(touch, ctx),
            InputEvent::TouchMoved(touch) => self.touch_moved(touch, ctx),
            InputEvent::TouchEnded(touch) => self.touch_ended(touch, ctx),
            _ => false,
        }
    }

    // ========== Mouse ==========

    fn mouse_pressed(
        &self,
        x: f32,
        y: f32,
        button: MouseButton,
        modifiers: &Modifiers,
        click_count: u32,
        ctx: &EventContext<'_>,
    ) -> bool {
        let (x, y) = ctx.canvas.to_canvas(x, y);
        if !ctx.canvas.contains(x, y) {
            return false;
        }
        let mut state = self.state.borrow_mut();
        if !state.touch_stream && !state.context_menu_shown && button == MouseButton::Left {
            state.initial_location = Some([x, y]);
            state.last_location = Some([x, y]);
            state.action_started_in_view = true;
            let flags = PressFlags::from_modifiers(self.platform, modifiers);
            self.controller
                .borrow_mut()
                .press_mouse(x, y, click_count, flags, PointerType::Mouse);
        }
        true
    }

    fn mouse_double_clicked(
        &self,
        x: f32,
        y: f32,
        button: MouseButton,
        modifiers: &Modifiers,
        ctx: &EventContext<'_>,
    ) -> bool {
        if !self.mouse_pressed(x, y, button, modifiers, 2, ctx) {
            return false;
        }
        self.state.borrow_mut().action_started_in_view = false;
        true
    }

    fn mouse_moved(&self, x: f32, y: f32, buttons_down: bool, modifiers: &Modifiers, ctx: &EventContext<'_>) -> bool {
        let mut state = self.state.borrow_mut();
        if state.touch_stream || state.context_menu_shown {
            return false;
        }
        let (x, y) = ctx.canvas.to_canvas(x, y);
        if state.initial_location.is_some_and(|initial| initial != [x, y]) {
            state.initial_location = None;
        }

        if state.initial_location.is_none()
            && (!buttons_down && ctx.canvas.contains(x, y) || state.action_started_in_view)
        {
            if self.controller.borrow().is_editing_state() {
                self.controller.borrow_mut().move_mouse(x, y);
            } else if state.action_started_in_view && ctx.focused {
                if let Some([last_x, last_y]) = state.last_location {
                    self.navigate(x, y, last_x, last_y, modifiers.alt, modifiers.shift);
                }
            }
        }
        state.last_location = Some([x, y]);
        state.action_started_in_view
    }

    fn mouse_released(&self, x: f32, y: f32, button: MouseButton, ctx: &EventContext<'_>) -> bool {
        let mut state = self.state.borrow_mut();
        let mut handled = false;
        if !state.touch_stream {
            if let Some(last) = state.last_location {
                if state.action_started_in_view && ctx.focused && button == MouseButton::Left {
                    let [x, y] = if state.context_menu_shown {
                        state.initial_location.unwrap_or(last)
                    } else {
                        let (x, y) = ctx.canvas.to_canvas(x, y);
                        [x, y]
                    };
                    self.controller.borrow_mut().release_mouse(x, y);
                    handled = true;
                }
                state.initial_location = None;
                state.last_location = None;
                state.action_started_in_view = false;
            }
        }
        state.context_menu_shown = false;
        handled
    }

    fn mouse_wheel(&self, x: f32, y: f32, delta_y: f32, modifiers: &Modifiers, ctx: &EventContext<'_>) -> bool {
        let (x, y) = ctx.canvas.to_canvas(x, y);
        if !ctx.canvas.contains(x, y) {
            return false;
        }
        if !self.controller.borrow().is_editing_state() {
            self.zoom_camera(delta_y / self.config.wheel_delta_divisor, modifiers.shift);
        }
        true
    }

    fn context_menu(&self, x: f32, y: f32, ctx: &EventContext<'_>) -> bool {
        let (x, y) = ctx.canvas.to_canvas(x, y);
        if !ctx.canvas.contains(x, y) {
            return false;
        }
        let mut state = self.state.borrow_mut();
        if state.suppress_context_menu {
            state.suppress_context_menu = false;
            log::debug!("Context menu suppressed after a long touch");
            return true;
        }
        state.context_menu_shown = true;
        false
    }

    // ========== Touch ==========

    fn touch_started(&self, event: &TouchEvent, ctx: &EventContext<'_>) -> bool {
        let mut state = self.state.borrow_mut();
        state.touch_stream = true;
        state.suppress_context_menu = false;
        let (touch, _) = self.normalize_touches(&mut state, TouchPhase::Started, event);
        self.stop_long_touch(&mut state);

        if event.target_touches.len() == 1 {
            let Some(touch) = touch else {
                return true;
            };
            let (x, y) = ctx.canvas.to_canvas(touch.x, touch.y);
            let double_tap = match (state.initial_location, state.first_touch_time) {
                (Some([initial_x, initial_y]), Some(first)) => {
                    (x - initial_x).hypot(y - initial_y) < self.config.double_tap_radius
                        && ctx.now.saturating_sub(first) <= self.config.double_touch_delay()
                }
                _ => false,
            };
            let click_count = if double_tap {
                state.first_touch_time = None;
                state.initial_location = None;
                2
            } else {
                state.first_touch_time = Some(ctx.now);
                state.initial_location = Some([x, y]);
                1
            };

            state.long_touch_activated = false;
            state.double_long_touch_activated = false;
            state.long_touch_start = None;
            state.pinch_distance = None;
            state.last_location = Some([x, y]);
            state.action_started_in_view = true;

            if ctx.editing_in_3d_enabled
                && click_count == 1
                && ctx.picker.closest_selectable_item_at(x, y).is_some()
            {
                let engine = self.this.clone();
                let timer = self.tasks.schedule(self.config.long_touch_delay(), move || {
                    if let Some(engine) = engine.upgrade() {
                        engine.start_long_touch_countdown(x, y);
                    }
                });
                state.long_touch_timer = Some(timer);
                state.long_touch_start = Some(ctx.now);
            }

            let flags = PressFlags::from_modifiers(self.platform, &event.modifiers);
            self.controller
                .borrow_mut()
                .press_mouse(x, y, click_count, flags, PointerType::Touch);
        } else {
            if state.long_touch_activated && event.target_touches.len() == 2 {
                state.double_long_touch_activated = true;
                self.controller.borrow_mut().set_duplication_activated(true);
            } else {
                self.controller.borrow_mut().escape();
            }

            if let [first, second] = event.target_touches.as_slice() {
                state.action_started_in_view = true;
                state.initial_location = None;
                state.pinch_distance = Some(first.distance_to(second));
            }
        }
        true
    }

    fn touch_moved(&self, event: &TouchEvent, ctx: &EventContext<'_>) -> bool {
        let mut state = self.state.borrow_mut();
        if !state.action_started_in_view {
            return false;
        }
        let (touch, updated) = self.normalize_touches(&mut state, TouchPhase::Moved, event);
        if !updated {
            return true;
        }
        state.initial_location = None;

        match event.target_touches.as_slice() {
            [_] => {
                self.stop_long_touch(&mut state);
                let Some(touch) = touch else {
                    return true;
                };
                let (x, y) = ctx.canvas.to_canvas(touch.x, touch.y);
                if self.controller.borrow().is_editing_state() {
                    if !state.double_long_touch_activated {
                        self.controller.borrow_mut().move_mouse(x, y);
                    }
                } else if let Some([last_x, last_y]) = state.last_location {
                    if ctx.observer_camera_active {
                        self.navigate(-x, -y, -last_x, -last_y, false, false);
                    } else {
                        self.navigate(x, y, last_x, last_y, false, false);
                    }
                }
                state.last_location = Some([x, y]);
            }
            [first, second] => {
                let Some(last_distance) = state.pinch_distance else {
                    return true;
                };
                if self.controller.borrow().is_editing_state() {
                    let (x, y) = ctx.canvas.to_canvas(second.x, second.y);
                    self.controller.borrow_mut().move_mouse(x, y);
                } else if last_distance > 0.0 {
                    let distance = first.distance_to(second);
                    let scale = distance / last_distance;
                    self.zoom_camera((1.0 - scale) * self.config.pinch_zoom_factor, false);
                    state.pinch_distance = Some(distance);
                }
            }
            _ => {}
        }
        true
    }

    fn touch_ended(&self, event: &TouchEvent, ctx: &EventContext<'_>) -> bool {
        let mut state = self.state.borrow_mut();
        if event.target_touches.is_empty() {
            state.touch_stream = false;
        }
        if !state.action_started_in_view {
            return false;
        }
        let (touch, _) = self.normalize_touches(&mut state, TouchPhase::Ended, event);

        match event.target_touches.as_slice() {
            [] => {
                self.stop_long_touch(&mut state);
                let release = state
                    .last_location
                    .or_else(|| touch.map(|t| {
                        let (x, y) = ctx.canvas.to_canvas(t.x, t.y);
                        [x, y]
                    }));
                if let Some([x, y]) = release {
                    self.controller.borrow_mut().release_mouse(x, y);
                }
                if self.is_long_touch(&state, ctx.now) {
                    state.suppress_context_menu = true;
                }
                state.action_started_in_view = false;

                if state.long_touch_activated {
                    state.long_touch_activated = false;
                    self.controller.borrow_mut().set_alignment_activated(false);
                }
                if state.double_long_touch_activated {
                    state.double_long_touch_activated = false;
                    self.controller.borrow_mut().set_duplication_activated(false);
                }
            }
            [_] => {
                if let Some(touch) = touch {
                    let (x, y) = ctx.canvas.to_canvas(touch.x, touch.y);
                    state.last_location = Some([x, y]);
                }
            }
            [first, second] => {
                if state.pinch_distance.is_some() {
                    state.pinch_distance = Some(first.distance_to(second));
                }
            }
            _ => {}
        }
        true
    }

    /// Picks the touch sample an event stands for.
    ///
    /// A single finger staying within the jitter threshold of the previous
    /// sample reuses it verbatim. Returns the touch when exactly one is
    /// considered, and whether the sample was updated.
    fn normalize_touches(
        &self,
        state: &mut GestureState,
        phase: TouchPhase,
        event: &TouchEvent,
    ) -> (Option<TouchPoint>, bool) {
        let threshold = if state.last_sample_was_start {
            self.config.touch_start_jitter
        } else {
            self.config.touch_jitter
        };
        let previous = state.last_touches.first().copied();
        let within_jitter = |touch: &TouchPoint| previous.is_some_and(|p| p.distance_to(touch) < threshold);

        let reuse = match phase {
            TouchPhase::Started => false,
            TouchPhase::Moved => event.target_touches.len() == 1 && within_jitter(&event.target_touches[0]),
            TouchPhase::Ended => {
                event.target_touches.is_empty() && event.changed_touches.first().is_some_and(within_jitter)
            }
        };

        if reuse {
            let single = match state.last_touches.as_slice() {
                [touch] => Some(*touch),
                _ => None,
            };
            return (single, false);
        }

        state.last_sample_was_start = phase == TouchPhase::Started;
        state.last_touches = if event.target_touches.is_empty() {
            event.changed_touches.clone()
        } else {
            event.target_touches.clone()
        };
        let single = match state.last_touches.as_slice() {
            [touch] => Some(*touch),
            _ => None,
        };
        (single, true)
    }

    fn start_long_touch_countdown(&self, x: f32, y: f32) {
        let mut state = self.state.borrow_mut();
        let duration = self.config.long_touch_duration();
        state.overlay = LongTouchOverlay {
            visible: true,
            anchor: [x, y],
            start: self.tasks.now(),
            duration,
        };
        let engine = self.this.clone();
        let post_task = self.tasks.schedule(duration, move || {
            if let Some(engine) = engine.upgrade() {
                engine.activate_long_touch();
            }
        });
        state.long_touch_post_task = Some(post_task);
        log::debug!("Long touch countdown started at ({}, {})", x, y);
    }

    fn activate_long_touch(&self) {
        let mut state = self.state.borrow_mut();
        state.long_touch_post_task = None;
        state.long_touch_activated = true;
        self.controller.borrow_mut().set_alignment_activated(true);
    }

    /// Cancels an armed long touch and hides its countdown.
    fn stop_long_touch(&self, state: &mut GestureState) {
        if let Some(timer) = state.long_touch_timer.take() {
            self.tasks.cancel(timer);
            state.overlay.visible = false;
            if let Some(post_task) = state.long_touch_post_task.take() {
                self.tasks.cancel(post_task);
            }
        }
    }

    fn is_long_touch(&self, state: &GestureState, now: Duration) -> bool {
        state.long_touch_start.is_some_and(|start| {
            now.saturating_sub(start) > self.config.long_touch_delay() + self.config.long_touch_duration()
        })
    }

    fn zoom_camera(&self, delta: f32, fast: bool) {
        let mut delta = -self.config.wheel_move_factor * delta;
        if fast {
            delta *= self.config.fast_multiplier;
        }
        self.controller.borrow_mut().move_camera(delta);
    }

    fn navigate(&self, x: f32, y: f32, last_x: f32, last_y: f32, alt: bool, shift: bool) {
        if x == last_x && y == last_y {
            return;
        }
        let fast = if shift { self.config.fast_multiplier } else { 1.0 };
        let mut controller = self.controller.borrow_mut();
        if alt {
            controller.move_camera(self.config.mouse_move_factor * (last_y - y) * fast);
        } else {
            controller.rotate_camera_yaw(self.config.rotation_factor * (x - last_x) * fast);
            controller.rotate_camera_pitch(self.config.rotation_factor * (y - last_y));
        }
    }
}
