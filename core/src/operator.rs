mod gesture;
mod keyboard;

pub use gesture::GestureOperator;
pub use keyboard::KeyboardOperator;

use crate::event::{CallbackId, InputDispatcher};

/// Unique identifier for an operator.
pub type OperatorId = u32;

/// Identifiers for the operators installed by the 3D component
pub enum BuiltinOperatorId {
    Gesture = 0,
    Keyboard = 1,
}

impl From<BuiltinOperatorId> for OperatorId {
    fn from(id: BuiltinOperatorId) -> Self {
        id as OperatorId
    }
}

/// Operators turn input events into editing controller calls. They register
/// callbacks with the [`InputDispatcher`] when activated and unregister them
/// when deactivated.
///
/// Ordering is managed by the [`OperatorManager`]: operators earlier in the
/// stack receive events first.
pub trait Operator {
    /// Registers the operator callbacks and keeps their ids.
    fn activate(&mut self, dispatcher: &mut InputDispatcher);

    /// Unregisters every callback registered by `activate`.
    fn deactivate(&mut self, dispatcher: &mut InputDispatcher);

    fn id(&self) -> OperatorId;

    fn name(&self) -> &str;

    /// Returns an empty slice if the operator is not active.
    fn callback_ids(&self) -> &[CallbackId];

    fn is_active(&self) -> bool;
}

/// Ordered collection of active operators.
pub struct OperatorManager {
    operators: Vec<Box<dyn Operator>>,
}

impl OperatorManager {
    pub(crate) fn new() -> Self {
        Self {
            operators: Vec::new(),
        }
    }

    /// Adds an operator with the lowest priority, activating it if needed.
    pub fn push_back(&mut self, mut operator: Box<dyn Operator>, dispatcher: &mut InputDispatcher) {
        if !operator.is_active() {
            operator.activate(dispatcher);
        }
        self.operators.push(operator);
        self.reorder_callbacks(dispatcher);
    }

    /// Deactivates and drops every operator.
    pub fn clear(&mut self, dispatcher: &mut InputDispatcher) {
        for mut operator in self.operators.drain(..) {
            if operator.is_active() {
                operator.deactivate(dispatcher);
            }
            log::debug!("Operator {} removed", operator.name());
        }
    }

    /// Makes the dispatcher call callbacks in operator order.
    fn reorder_callbacks(&self, dispatcher: &mut InputDispatcher) {
        let ordered_ids: Vec<CallbackId> = self
            .operators
            .iter()
            .flat_map(|op| op.callback_ids().iter().copied())
            .collect();
        dispatcher.reorder(&ordered_ids);
    }

    pub fn len(&self) -> usize {
        self.operators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operators.is_empty()
    }

    /// Iterates over the operators in priority order.
    pub fn iter(&self) -> impl Iterator<Item = &dyn Operator> {
        self.operators.iter().map(|op| op.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::InputKind;
    use std::cell::Cell;
    use std::rc::Rc;

    /// Operator registering one test callback that records its id.
    struct MockOperator {
        id: OperatorId,
        name: String,
        callbacks: Vec<CallbackId>,
        activate_count: Rc<Cell<u32>>,
        deactivate_count: Rc<Cell<u32>>,
        last_called: Rc<Cell<Option<OperatorId>>>,
    }

    impl MockOperator {
        fn boxed(id: OperatorId, counts: &Counters) -> Box<Self> {
            Box::new(Self {
                id,
                name: format!("Op{id}"),
                callbacks: Vec::new(),
                activate_count: counts.activate.clone(),
                deactivate_count: counts.deactivate.clone(),
                last_called: counts.last_called.clone(),
            })
        }
    }

    impl Operator for MockOperator {
        fn activate(&mut self, dispatcher: &mut InputDispatcher) {
            let id = self.id;
            let last_called = self.last_called.clone();
            self.callbacks.push(dispatcher.register(InputKind::Test, move |_event, _ctx| {
                last_called.set(Some(id));
                true
            }));
            self.activate_count.set(self.activate_count.get() + 1);
        }

        fn deactivate(&mut self, dispatcher: &mut InputDispatcher) {
            for id in self.callbacks.drain(..) {
                dispatcher.unregister(id);
            }
            self.deactivate_count.set(self.deactivate_count.get() + 1);
        }

        fn id(&self) -> OperatorId {
            self.id
        }

        fn name(&self) -> &str {
            &self.name
        }

        fn callback_ids(&self) -> &[CallbackId] {
            &self.callbacks
        }

        fn is_active(&self) -> bool {
            !self.callbacks.is_empty()
        }
    }

    #[derive(Default)]
    struct Counters {
        activate: Rc<Cell<u32>>,
        deactivate: Rc<Cell<u32>>,
        last_called: Rc<Cell<Option<OperatorId>>>,
    }

    struct NoItems;

    impl crate::event::ItemPicker for NoItems {
        fn closest_selectable_item_at(&self, _x: f32, _y: f32) -> Option<crate::home::ObjectId> {
            None
        }
    }

    fn dispatch_test_event(dispatcher: &mut InputDispatcher) -> bool {
        let mut ctx = crate::event::EventContext {
            canvas: crate::event::CanvasBounds::new(0.0, 0.0, 100.0, 100.0),
            focused: true,
            now: std::time::Duration::ZERO,
            editing_in_3d_enabled: false,
            observer_camera_active: false,
            picker: &NoItems,
        };
        dispatcher.dispatch(&crate::event::InputEvent::Test, &mut ctx)
    }

    // ===== OperatorManager Tests =====

    #[test]
    fn test_operator_manager_new() {
        let manager = OperatorManager::new();
        assert!(manager.is_empty());
        assert_eq!(manager.iter().count(), 0);
    }

    #[test]
    fn test_push_back_order() {
        let mut manager = OperatorManager::new();
        let mut dispatcher = InputDispatcher::new();
        let counts = Counters::default();

        manager.push_back(MockOperator::boxed(2, &counts), &mut dispatcher);
        manager.push_back(MockOperator::boxed(1, &counts), &mut dispatcher);
        manager.push_back(MockOperator::boxed(3, &counts), &mut dispatcher);

        let ids: Vec<OperatorId> = manager.iter().map(|op| op.id()).collect();
        assert_eq!(ids, vec![2, 1, 3]);
        assert_eq!(manager.len(), 3);
        assert_eq!(counts.activate.get(), 3);
        assert_eq!(dispatcher.callback_count(), 3);
    }

    #[test]
    fn test_first_operator_receives_events_first() {
        let mut manager = OperatorManager::new();
        let mut dispatcher = InputDispatcher::new();
        let counts = Counters::default();

        manager.push_back(MockOperator::boxed(2, &counts), &mut dispatcher);
        manager.push_back(MockOperator::boxed(1, &counts), &mut dispatcher);
        assert!(dispatch_test_event(&mut dispatcher));
        assert_eq!(counts.last_called.get(), Some(2));
    }

    #[test]
    fn test_clear_empties_dispatcher() {
        let mut manager = OperatorManager::new();
        let mut dispatcher = InputDispatcher::new();
        let counts = Counters::default();

        manager.push_back(MockOperator::boxed(1, &counts), &mut dispatcher);
        manager.push_back(MockOperator::boxed(2, &counts), &mut dispatcher);
        assert_eq!(dispatcher.callback_count(), 2);

        manager.clear(&mut dispatcher);
        assert!(manager.is_empty());
        assert_eq!(counts.deactivate.get(), 2);
        assert_eq!(dispatcher.callback_count(), 0);
        assert!(!dispatch_test_event(&mut dispatcher));
    }

    #[test]
    fn test_builtin_ids() {
        assert_eq!(OperatorId::from(BuiltinOperatorId::Gesture), 0);
        assert_eq!(OperatorId::from(BuiltinOperatorId::Keyboard), 1);
    }
}
