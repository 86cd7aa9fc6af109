use std::rc::Rc;

use crate::event::{CallbackId, InputDispatcher, InputKind};
use crate::gesture::GestureEngine;
use crate::operator::{Operator, OperatorId};

const GESTURE_KINDS: [InputKind; 9] = [
    InputKind::MousePressed,
    InputKind::MouseDoubleClicked,
    InputKind::MouseMoved,
    InputKind::MouseReleased,
    InputKind::MouseWheel,
    InputKind::ContextMenu,
    InputKind::TouchStarted,
    InputKind::TouchMoved,
    InputKind::TouchEnded,
];

/// Operator feeding mouse, touch and context menu events to a [`GestureEngine`].
///
/// Pointer events reach it already converted by the dispatcher.
pub struct GestureOperator {
    id: OperatorId,
    engine: Rc<GestureEngine>,
    callback_ids: Vec<CallbackId>,
}

impl GestureOperator {
    pub fn new(id: OperatorId, engine: Rc<GestureEngine>) -> Self {
        Self {
            id,
            engine,
            callback_ids: Vec::new(),
        }
    }

    pub fn engine(&self) -> &Rc<GestureEngine> {
        &self.engine
    }
}

impl Operator for GestureOperator {
    fn activate(&mut self, dispatcher: &mut InputDispatcher) {
        for kind in GESTURE_KINDS {
            let engine = self.engine.clone();
            let id = dispatcher.register(kind, move |event, ctx| engine.handle(event, ctx));
            self.callback_ids.push(id);
        }
    }

    fn deactivate(&mut self, dispatcher: &mut InputDispatcher) {
        for id in &self.callback_ids {
            dispatcher.unregister(*id);
        }
        self.callback_ids.clear();
    }

    fn id(&self) -> OperatorId {
        self.id
    }

    fn name(&self) -> &str {
        "Gesture"
    }

    fn callback_ids(&self) -> &[CallbackId] {
        &self.callback_ids
    }

    fn is_active(&self) -> bool {
        !self.callback_ids.is_empty()
    }
}
