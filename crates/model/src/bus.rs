//! Change notifications for interactive edits.
//!
//! Editors subscribe to a [`NotificationBus`] to react to single-node edits
//! (refreshing a tree label, cascading a rename). Bulk construction of a
//! document must not fire these listeners, so revival takes a
//! [`Suppression`] guard for its whole duration. The guard disables and
//! locks the bus and gives it back in `Drop`, which runs on every exit path.

use std::cell::{Cell, RefCell};

use serde_json::Value;

use crate::error::ModelError;

/// An edit published to subscribers.
#[derive(Debug, Clone, PartialEq)]
pub enum ChangeEvent {
    NodeCreated {
        global_id: String,
        entity: &'static str,
    },
    PropertyChanged {
        global_id: String,
        property: String,
        old_value: Value,
        new_value: Value,
    },
    ChildAdded {
        parent: String,
        child: String,
    },
    ChildRemoved {
        parent: String,
        child: String,
        entity: &'static str,
    },
}

/// Handle returned by [`NotificationBus::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListenerId(usize);

type Listener = Box<dyn FnMut(&ChangeEvent)>;

/// Single-threaded publish/subscribe hub for [`ChangeEvent`]s.
#[derive(Default)]
pub struct NotificationBus {
    listeners: RefCell<Vec<(ListenerId, Listener)>>,
    next_id: Cell<usize>,
    suppressed: Cell<usize>,
}

impl std::fmt::Debug for NotificationBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationBus")
            .field("listeners", &self.listeners.borrow().len())
            .field("suppressed", &self.suppressed.get())
            .finish()
    }
}

impl NotificationBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(
        &self,
        listener: impl FnMut(&ChangeEvent) + 'static,
    ) -> Result<ListenerId, ModelError> {
        if self.is_locked() {
            return Err(ModelError::BusLocked);
        }
        let id = ListenerId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        self.listeners.borrow_mut().push((id, Box::new(listener)));
        Ok(id)
    }

    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.borrow_mut();
        let before = listeners.len();
        listeners.retain(|(listener_id, _)| *listener_id != id);
        listeners.len() != before
    }

    /// Deliver an event to every listener unless notifications are suppressed.
    pub fn publish(&self, event: ChangeEvent) {
        if !self.is_enabled() {
            return;
        }
        for (_, listener) in self.listeners.borrow_mut().iter_mut() {
            listener(&event);
        }
    }

    /// Disable and lock the bus until the returned guard is dropped.
    /// Guards nest; the bus comes back once the outermost one is released.
    pub fn suppress(&self) -> Suppression<'_> {
        self.suppressed.set(self.suppressed.get() + 1);
        tracing::trace!(depth = self.suppressed.get(), "notifications suppressed");
        Suppression { bus: self }
    }

    pub fn is_enabled(&self) -> bool {
        self.suppressed.get() == 0
    }

    pub fn is_locked(&self) -> bool {
        self.suppressed.get() > 0
    }
}

/// Scope during which a [`NotificationBus`] neither delivers events nor
/// accepts new listeners.
#[must_use = "notifications are restored as soon as the guard is dropped"]
pub struct Suppression<'a> {
    bus: &'a NotificationBus,
}

impl Drop for Suppression<'_> {
    fn drop(&mut self) {
        let depth = self.bus.suppressed.get().saturating_sub(1);
        self.bus.suppressed.set(depth);
        tracing::trace!(depth, "notification suppression released");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    fn recorder(bus: &NotificationBus) -> Rc<RefCell<Vec<ChangeEvent>>> {
        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&events);
        bus.subscribe(move |event| sink.borrow_mut().push(event.clone()))
            .unwrap();
        events
    }

    fn created(id: &str) -> ChangeEvent {
        ChangeEvent::NodeCreated {
            global_id: id.to_string(),
            entity: "Study",
        }
    }

    #[test]
    fn delivers_events_to_listeners() {
        let bus = NotificationBus::new();
        let events = recorder(&bus);
        bus.publish(created("Study:A"));
        assert_eq!(events.borrow().len(), 1);
    }

    #[test]
    fn suppression_drops_events_and_locks_registration() {
        let bus = NotificationBus::new();
        let events = recorder(&bus);
        {
            let _guard = bus.suppress();
            assert!(!bus.is_enabled());
            bus.publish(created("Study:A"));
            assert_eq!(bus.subscribe(|_| {}), Err(ModelError::BusLocked));
        }
        assert!(bus.is_enabled());
        assert!(!bus.is_locked());
        bus.publish(created("Study:B"));
        assert_eq!(*events.borrow(), vec![created("Study:B")]);
    }

    #[test]
    fn nested_guards_release_in_order() {
        let bus = NotificationBus::new();
        let outer = bus.suppress();
        let inner = bus.suppress();
        drop(inner);
        assert!(bus.is_locked());
        drop(outer);
        assert!(bus.is_enabled());
    }

    #[test]
    fn guard_is_released_on_early_return() {
        fn fails(bus: &NotificationBus) -> Result<(), ModelError> {
            let _guard = bus.suppress();
            Err(ModelError::RootRemoval)?;
            Ok(())
        }
        let bus = NotificationBus::new();
        assert!(fails(&bus).is_err());
        assert!(bus.is_enabled());
    }

    #[test]
    fn unsubscribe_stops_delivery() {
        let bus = NotificationBus::new();
        let events = Rc::new(RefCell::new(0));
        let sink = Rc::clone(&events);
        let id = bus.subscribe(move |_| *sink.borrow_mut() += 1).unwrap();
        bus.publish(created("Study:A"));
        assert!(bus.unsubscribe(id));
        bus.publish(created("Study:A"));
        assert_eq!(*events.borrow(), 1);
        assert!(!bus.unsubscribe(id));
    }
}
