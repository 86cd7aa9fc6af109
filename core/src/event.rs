use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use crate::home::ObjectId;
use crate::input::{KeyEvent, Modifiers, MouseButton, PointerType, TouchPoint};

/// Location and size of the canvas in client coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CanvasBounds {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

impl CanvasBounds {
    pub fn new(left: f32, top: f32, width: f32, height: f32) -> Self {
        Self { left, top, width, height }
    }

    /// Converts client coordinates to canvas coordinates.
    pub fn to_canvas(&self, x: f32, y: f32) -> (f32, f32) {
        (x - self.left, y - self.top)
    }

    /// Tests canvas coordinates against the canvas area.
    pub fn contains(&self, canvas_x: f32, canvas_y: f32) -> bool {
        canvas_x >= 0.0 && canvas_x < self.width && canvas_y >= 0.0 && canvas_y < self.height
    }
}

/// Looks up the home item displayed under a canvas location.
pub trait ItemPicker {
    fn closest_selectable_item_at(&self, x: f32, y: f32) -> Option<ObjectId>;
}

/// Context passed to event callbacks.
///
/// It carries a snapshot of the component state the gesture logic reads, so
/// callbacks never need to borrow the home while the editing controller
/// mutates it.
pub struct EventContext<'c> {
    pub canvas: CanvasBounds,
    /// Whether the canvas owns the keyboard focus.
    pub focused: bool,
    /// Current time of the task queue clock.
    pub now: Duration,
    pub editing_in_3d_enabled: bool,
    pub observer_camera_active: bool,
    pub picker: &'c dyn ItemPicker,
}

/// Unique identifier for a registered callback.
pub type CallbackId = u32;

/// Callbacks return `true` to stop event propagation or `false` to let the
/// next callback registered for the same kind process the event.
type InputCallback = Box<dyn for<'c> Fn(&InputEvent, &mut EventContext<'c>) -> bool>;

/// Touch list event, in client coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct TouchEvent {
    /// Fingers still on the surface.
    pub target_touches: Vec<TouchPoint>,
    /// Fingers that changed with this event.
    pub changed_touches: Vec<TouchPoint>,
    pub modifiers: Modifiers,
}

/// Unified pointer event, in client coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct PointerEvent {
    pub pointer_id: u32,
    pub pointer_type: PointerType,
    pub x: f32,
    pub y: f32,
    pub button: MouseButton,
    /// Whether any button is held during a move.
    pub buttons_down: bool,
    pub modifiers: Modifiers,
}

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum InputKind {
    #[cfg(test)]
    /// Event kind used for testing
    Test,
    MousePressed,
    MouseDoubleClicked,
    MouseMoved,
    MouseReleased,
    MouseWheel,
    ContextMenu,
    TouchStarted,
    TouchMoved,
    TouchEnded,
    PointerDown,
    PointerMove,
    PointerUp,
    KeyboardInput,
}

/// Input events, coordinates in client space.
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    #[cfg(test)]
    /// Event used for testing
    Test,
    MousePressed {
        x: f32,
        y: f32,
        button: MouseButton,
        modifiers: Modifiers,
    },
    MouseDoubleClicked {
        x: f32,
        y: f32,
        button: MouseButton,
        modifiers: Modifiers,
    },
    /// The mouse moved anywhere in the window, inside the canvas or not.
    MouseMoved {
        x: f32,
        y: f32,
        buttons_down: bool,
        modifiers: Modifiers,
    },
    MouseReleased {
        x: f32,
        y: f32,
        button: MouseButton,
        modifiers: Modifiers,
    },
    MouseWheel {
        x: f32,
        y: f32,
        /// Vertical wheel delta in pixels.
        delta_y: f32,
        modifiers: Modifiers,
    },
    /// The host is about to show a context menu.
    ContextMenu { x: f32, y: f32 },
    TouchStarted(TouchEvent),
    TouchMoved(TouchEvent),
    TouchEnded(TouchEvent),
    PointerDown(PointerEvent),
    PointerMove(PointerEvent),
    PointerUp(PointerEvent),
    KeyboardInput(KeyEvent),
}

impl InputEvent {
    /// Returns the [`InputKind`] discriminant for this event.
    pub fn kind(&self) -> InputKind {
        match self {
            Self::MousePressed { .. } => InputKind::MousePressed,
            Self::MouseDoubleClicked { .. } => InputKind::MouseDoubleClicked,
            Self::MouseMoved { .. } => InputKind::MouseMoved,
            Self::MouseReleased { .. } => InputKind::MouseReleased,
            Self::MouseWheel { .. } => InputKind::MouseWheel,
            Self::ContextMenu { .. } => InputKind::ContextMenu,
            Self::TouchStarted(_) => InputKind::TouchStarted,
            Self::TouchMoved(_) => InputKind::TouchMoved,
            Self::TouchEnded(_) => InputKind::TouchEnded,
            Self::PointerDown(_) => InputKind::PointerDown,
            Self::PointerMove(_) => InputKind::PointerMove,
            Self::PointerUp(_) => InputKind::PointerUp,
            Self::KeyboardInput(_) => InputKind::KeyboardInput,
            #[cfg(test)]
            Self::Test => InputKind::Test,
        }
    }
}

/// Turns pointer events into mouse events or into touch lists, for hosts
/// that only deliver pointer events.
///
/// Touch lists are ordered by pointer id.
#[derive(Debug, Default)]
pub struct PointerTouchAdapter {
    touches: BTreeMap<u32, TouchPoint>,
}

impl PointerTouchAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of non-mouse pointers currently down.
    pub fn active_pointers(&self) -> usize {
        self.touches.len()
    }

    /// Returns the mouse or touch event equivalent to a pointer event, or
    /// `None` for other events.
    pub fn convert(&mut self, event: &InputEvent) -> Option<InputEvent> {
        match event {
            InputEvent::PointerDown(pointer) if pointer.pointer_type == PointerType::Mouse => Some(InputEvent::MousePressed {
                x: pointer.x,
                y: pointer.y,
                button: pointer.button,
                modifiers: pointer.modifiers,
            }),
            InputEvent::PointerMove(pointer) if pointer.pointer_type == PointerType::Mouse => Some(InputEvent::MouseMoved {
                x: pointer.x,
                y: pointer.y,
                buttons_down: pointer.buttons_down,
                modifiers: pointer.modifiers,
            }),
            InputEvent::PointerUp(pointer) if pointer.pointer_type == PointerType::Mouse => Some(InputEvent::MouseReleased {
                x: pointer.x,
                y: pointer.y,
                button: pointer.button,
                modifiers: pointer.modifiers,
            }),
            InputEvent::PointerDown(pointer) => {
                let touch = self.track(pointer);
                Some(InputEvent::TouchStarted(self.touch_event(touch, pointer.modifiers)))
            }
            InputEvent::PointerMove(pointer) => {
                let touch = self.track(pointer);
                Some(InputEvent::TouchMoved(self.touch_event(touch, pointer.modifiers)))
            }
            InputEvent::PointerUp(pointer) => {
                let touch = self
                    .touches
                    .remove(&pointer.pointer_id)
                    .unwrap_or_else(|| TouchPoint::new(pointer.pointer_id, pointer.x, pointer.y));
                Some(InputEvent::TouchEnded(self.touch_event(touch, pointer.modifiers)))
            }
            _ => None,
        }
    }

    fn track(&mut self, pointer: &PointerEvent) -> TouchPoint {
        let touch = TouchPoint::new(pointer.pointer_id, pointer.x, pointer.y);
        self.touches.insert(pointer.pointer_id, touch);
        touch
    }

    fn touch_event(&self, changed: TouchPoint, modifiers: Modifiers) -> TouchEvent {
        TouchEvent {
            target_touches: self.touches.values().copied().collect(),
            changed_touches: vec![changed],
            modifiers,
        }
    }
}

/// Input dispatcher that manages callbacks for different event kinds.
///
/// Callbacks are registered by [`InputKind`] and invoked when matching events
/// are dispatched. Multiple callbacks can be registered for the same kind,
/// and they are called until one returns `true`.
///
/// Pointer events are first converted by a [`PointerTouchAdapter`] and the
/// converted event is dispatched before the pointer event itself.
pub struct InputDispatcher {
    callback_map: HashMap<InputKind, Vec<(CallbackId, InputCallback)>>,
    next_id: u32,
    pointer_adapter: PointerTouchAdapter,
}

impl Default for InputDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl InputDispatcher {
    pub fn new() -> Self {
        Self {
            callback_map: HashMap::new(),
            next_id: 0,
            pointer_adapter: PointerTouchAdapter::new(),
        }
    }

    /// Registers a callback for a specific event kind.
    ///
    /// Returns a [`CallbackId`] that can be used to unregister or reorder this callback.
    pub fn register<F>(&mut self, kind: InputKind, callback: F) -> CallbackId
    where
        F: for<'c> Fn(&InputEvent, &mut EventContext<'c>) -> bool + 'static,
    {
        let id = self.next_id;
        self.next_id += 1;

        self.callback_map
            .entry(kind)
            .or_default()
            .push((id, Box::new(callback)));

        id
    }

    /// Returns `true` if the callback was found and removed, `false` otherwise.
    pub fn unregister(&mut self, id: CallbackId) -> bool {
        for callbacks in self.callback_map.values_mut() {
            if let Some(pos) = callbacks.iter().position(|(cid, _)| *cid == id) {
                let _ = callbacks.remove(pos);
                return true;
            }
        }
        false
    }

    /// Number of registered callbacks, all kinds included.
    pub fn callback_count(&self) -> usize {
        self.callback_map.values().map(Vec::len).sum()
    }

    /// Reorders callbacks for a specific event kind.
    ///
    /// Callbacks not mentioned in `ids` stay at the end in their current order.
    /// IDs that don't exist are ignored.
    ///
    /// Returns `true` if the event kind exists, `false` otherwise.
    pub fn reorder_kind(&mut self, kind: InputKind, ids: &[CallbackId]) -> bool {
        if let Some(callbacks) = self.callback_map.get_mut(&kind) {
            let mut reordered = Vec::new();

            for &id in ids {
                if let Some(pos) = callbacks.iter().position(|(cid, _)| *cid == id) {
                    reordered.push(callbacks.remove(pos));
                }
            }

            reordered.append(callbacks);

            *callbacks = reordered;
            true
        } else {
            false
        }
    }

    /// Applies the same reordering to every registered event kind.
    pub fn reorder(&mut self, ids: &[CallbackId]) {
        let kinds: Vec<InputKind> = self.callback_map.keys().copied().collect();
        for kind in kinds {
            self.reorder_kind(kind, ids);
        }
    }

    /// Dispatches an event to all registered callbacks for its kind.
    ///
    /// Returns `true` if a callback consumed the event or its converted form.
    pub fn dispatch(&mut self, event: &InputEvent, ctx: &mut EventContext<'_>) -> bool {
        let converted = self.process_event(event, ctx);
        let handled = self.dispatch_to_callbacks(event, ctx);
        converted || handled
    }

    fn dispatch_to_callbacks(&self, event: &InputEvent, ctx: &mut EventContext<'_>) -> bool {
        if let Some(callbacks) = self.callback_map.get(&event.kind()) {
            for (_id, callback) in callbacks {
                if callback(event, ctx) {
                    return true;
                }
            }
        }
        false
    }

    fn process_event(&mut self, event: &InputEvent, ctx: &mut EventContext<'_>) -> bool {
        match self.pointer_adapter.convert(event) {
            Some(converted) => {
                log::trace!("Pointer event converted to {:?}", converted.kind());
                self.dispatch_to_callbacks(&converted, ctx)
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    // ===== Helper Functions =====

    struct NoItems;

    impl ItemPicker for NoItems {
        fn closest_selectable_item_at(&self, _x: f32, _y: f32) -> Option<ObjectId> {
            None
        }
    }

    fn context(picker: &dyn ItemPicker) -> EventContext<'_> {
        EventContext {
            canvas: CanvasBounds::new(0.0, 0.0, 800.0, 600.0),
            focused: true,
            now: Duration::ZERO,
            editing_in_3d_enabled: false,
            observer_camera_active: false,
            picker,
        }
    }

    fn pointer(id: u32, pointer_type: PointerType, x: f32, y: f32) -> PointerEvent {
        PointerEvent {
            pointer_id: id,
            pointer_type,
            x,
            y,
            button: MouseButton::Left,
            buttons_down: true,
            modifiers: Modifiers::NONE,
        }
    }

    // ===== InputDispatcher Tests =====

    #[test]
    fn test_dispatcher_new() {
        let dispatcher = InputDispatcher::new();
        assert_eq!(dispatcher.callback_map.len(), 0);
        assert_eq!(dispatcher.next_id, 0);
    }

    #[test]
    fn test_dispatcher_register_multiple_same_kind() {
        let mut dispatcher = InputDispatcher::new();

        let id1 = dispatcher.register(InputKind::KeyboardInput, |_event, _ctx| false);
        let id2 = dispatcher.register(InputKind::KeyboardInput, |_event, _ctx| false);
        let id3 = dispatcher.register(InputKind::MouseWheel, |_event, _ctx| false);

        assert_eq!((id1, id2, id3), (0, 1, 2));
        assert_eq!(dispatcher.callback_map[&InputKind::KeyboardInput].len(), 2);
        assert_eq!(dispatcher.callback_count(), 3);
    }

    #[test]
    fn test_dispatcher_unregister() {
        let mut dispatcher = InputDispatcher::new();
        let id = dispatcher.register(InputKind::MouseMoved, |_event, _ctx| false);

        assert!(dispatcher.unregister(id));
        assert_eq!(dispatcher.callback_count(), 0);
        assert!(!dispatcher.unregister(id));
        assert!(!dispatcher.unregister(999));
    }

    #[test]
    fn test_dispatcher_dispatch_no_callbacks() {
        let mut dispatcher = InputDispatcher::new();
        let mut ctx = context(&NoItems);
        assert!(!dispatcher.dispatch(&InputEvent::Test, &mut ctx));
    }

    #[test]
    fn test_dispatcher_dispatch_stop_propagation() {
        let mut dispatcher = InputDispatcher::new();
        let counter = Rc::new(Cell::new(0));

        let c1 = Rc::clone(&counter);
        dispatcher.register(InputKind::Test, move |_event, _ctx| {
            c1.set(c1.get() + 1);
            false
        });

        let c2 = Rc::clone(&counter);
        dispatcher.register(InputKind::Test, move |_event, _ctx| {
            c2.set(c2.get() + 10);
            true
        });

        let c3 = Rc::clone(&counter);
        dispatcher.register(InputKind::Test, move |_event, _ctx| {
            c3.set(c3.get() + 100);
            false
        });

        let mut ctx = context(&NoItems);
        let result = dispatcher.dispatch(&InputEvent::Test, &mut ctx);

        assert_eq!(counter.get(), 11);
        assert!(result);
    }

    #[test]
    fn test_dispatcher_reorder_kind() {
        let mut dispatcher = InputDispatcher::new();

        let id1 = dispatcher.register(InputKind::ContextMenu, |_event, _ctx| false);
        let id2 = dispatcher.register(InputKind::ContextMenu, |_event, _ctx| false);
        let id3 = dispatcher.register(InputKind::ContextMenu, |_event, _ctx| false);

        assert!(dispatcher.reorder_kind(InputKind::ContextMenu, &[id3, 999, id1]));

        let ids: Vec<CallbackId> = dispatcher.callback_map[&InputKind::ContextMenu]
            .iter()
            .map(|(id, _)| *id)
            .collect();
        assert_eq!(ids, vec![id3, id1, id2]);
        assert!(!dispatcher.reorder_kind(InputKind::TouchMoved, &[id1]));
    }

    #[test]
    fn test_dispatcher_reorder_all() {
        let mut dispatcher = InputDispatcher::new();

        let id1 = dispatcher.register(InputKind::MousePressed, |_event, _ctx| false);
        let id2 = dispatcher.register(InputKind::MousePressed, |_event, _ctx| false);
        let id3 = dispatcher.register(InputKind::KeyboardInput, |_event, _ctx| false);
        let id4 = dispatcher.register(InputKind::KeyboardInput, |_event, _ctx| false);

        dispatcher.reorder(&[id2, id4, id1, id3]);

        let mouse: Vec<CallbackId> = dispatcher.callback_map[&InputKind::MousePressed].iter().map(|(id, _)| *id).collect();
        let keys: Vec<CallbackId> = dispatcher.callback_map[&InputKind::KeyboardInput].iter().map(|(id, _)| *id).collect();
        assert_eq!(mouse, vec![id2, id1]);
        assert_eq!(keys, vec![id4, id3]);
    }

    #[test]
    fn test_mouse_pointer_dispatched_as_mouse_event() {
        let mut dispatcher = InputDispatcher::new();
        let pressed = Rc::new(Cell::new(false));
        let sink = pressed.clone();
        dispatcher.register(InputKind::MousePressed, move |event, _ctx| {
            sink.set(matches!(event, InputEvent::MousePressed { x, .. } if *x == 12.0));
            true
        });

        let mut ctx = context(&NoItems);
        let event = InputEvent::PointerDown(pointer(1, PointerType::Mouse, 12.0, 4.0));
        assert!(dispatcher.dispatch(&event, &mut ctx));
        assert!(pressed.get());
    }

    #[test]
    fn test_touch_pointers_dispatched_as_touch_lists() {
        let mut dispatcher = InputDispatcher::new();
        let counts = Rc::new(RefCell::new(Vec::new()));
        for kind in [InputKind::TouchStarted, InputKind::TouchMoved, InputKind::TouchEnded] {
            let sink = counts.clone();
            dispatcher.register(kind, move |event, _ctx| {
                let touches = match event {
                    InputEvent::TouchStarted(touch) | InputEvent::TouchMoved(touch) | InputEvent::TouchEnded(touch) => touch,
                    _ => return false,
                };
                sink.borrow_mut().push((event.kind(), touches.target_touches.len()));
                true
            });
        }

        let mut ctx = context(&NoItems);
        dispatcher.dispatch(&InputEvent::PointerDown(pointer(7, PointerType::Touch, 0.0, 0.0)), &mut ctx);
        dispatcher.dispatch(&InputEvent::PointerDown(pointer(3, PointerType::Touch, 10.0, 0.0)), &mut ctx);
        dispatcher.dispatch(&InputEvent::PointerMove(pointer(7, PointerType::Touch, 1.0, 0.0)), &mut ctx);
        dispatcher.dispatch(&InputEvent::PointerUp(pointer(7, PointerType::Touch, 1.0, 0.0)), &mut ctx);

        assert_eq!(
            *counts.borrow(),
            vec![
                (InputKind::TouchStarted, 1),
                (InputKind::TouchStarted, 2),
                (InputKind::TouchMoved, 2),
                (InputKind::TouchEnded, 1),
            ]
        );
    }

    // ===== PointerTouchAdapter Tests =====

    #[test]
    fn test_adapter_orders_touches_by_pointer_id() {
        let mut adapter = PointerTouchAdapter::new();
        adapter.convert(&InputEvent::PointerDown(pointer(9, PointerType::Pen, 5.0, 5.0)));
        let converted = adapter.convert(&InputEvent::PointerDown(pointer(2, PointerType::Touch, 1.0, 1.0)));

        let Some(InputEvent::TouchStarted(touch)) = converted else {
            panic!("expected a touch start");
        };
        let ids: Vec<u32> = touch.target_touches.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![2, 9]);
        assert_eq!(touch.changed_touches, vec![TouchPoint::new(2, 1.0, 1.0)]);
    }

    #[test]
    fn test_adapter_release_reports_last_location() {
        let mut adapter = PointerTouchAdapter::new();
        adapter.convert(&InputEvent::PointerDown(pointer(1, PointerType::Touch, 5.0, 5.0)));
        adapter.convert(&InputEvent::PointerMove(pointer(1, PointerType::Touch, 8.0, 5.0)));
        let converted = adapter.convert(&InputEvent::PointerUp(pointer(1, PointerType::Touch, 9.0, 5.0)));

        let Some(InputEvent::TouchEnded(touch)) = converted else {
            panic!("expected a touch end");
        };
        assert!(touch.target_touches.is_empty());
        assert_eq!(touch.changed_touches, vec![TouchPoint::new(1, 8.0, 5.0)]);
        assert_eq!(adapter.active_pointers(), 0);
    }

    #[test]
    fn test_adapter_ignores_other_events() {
        let mut adapter = PointerTouchAdapter::new();
        assert!(adapter.convert(&InputEvent::ContextMenu { x: 0.0, y: 0.0 }).is_none());
    }
}
