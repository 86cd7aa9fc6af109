use std::cell::RefCell;
use std::rc::Rc;

use crate::controller::EditingController;
use crate::event::{CallbackId, InputDispatcher, InputEvent, InputKind};
use crate::keyboard::KeyboardActionMap;
use crate::operator::{Operator, OperatorId};

/// Operator running keyboard actions while the canvas has the focus.
pub struct KeyboardOperator {
    id: OperatorId,
    actions: Rc<KeyboardActionMap>,
    controller: Rc<RefCell<dyn EditingController>>,
    callback_ids: Vec<CallbackId>,
}

impl KeyboardOperator {
    pub fn new(id: OperatorId, actions: KeyboardActionMap, controller: Rc<RefCell<dyn EditingController>>) -> Self {
        Self {
            id,
            actions: Rc::new(actions),
            controller,
            callback_ids: Vec::new(),
        }
    }
}

impl Operator for KeyboardOperator {
    fn activate(&mut self, dispatcher: &mut InputDispatcher) {
        let actions = self.actions.clone();
        let controller = self.controller.clone();
        let keyboard_callback = dispatcher.register(InputKind::KeyboardInput, move |event, ctx| {
            let InputEvent::KeyboardInput(key_event) = event else {
                return false;
            };
            if !ctx.focused {
                return false;
            }
            actions.handle(key_event, &mut *controller.borrow_mut())
        });
        self.callback_ids = vec![keyboard_callback];
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
        "Keyboard"
    }

    fn callback_ids(&self) -> &[CallbackId] {
        &self.callback_ids
    }

    fn is_active(&self) -> bool {
        !self.callback_ids.is_empty()
    }
}
