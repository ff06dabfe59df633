//! Editor-side subscription to image-selected events.

use std::cell::Cell;
use std::rc::Rc;

use smol_str::SmolStr;

use super::bus::{EventBus, EventKind, OverlayEvent, SubscriptionId};

/// Editor side of the image picker: holds at most one image-selected
/// subscription and forwards the chosen path.
pub struct OverlayController {
    bus: EventBus,
    subscription: Cell<Option<SubscriptionId>>,
    on_selected: Rc<dyn Fn(SmolStr)>,
}

impl OverlayController {
    pub fn new(bus: EventBus, on_selected: impl Fn(SmolStr) + 'static) -> Self {
        Self {
            bus,
            subscription: Cell::new(None),
            on_selected: Rc::new(on_selected),
        }
    }

    /// Start listening. A no-op returning false if already listening.
    pub fn register(&self) -> bool {
        if self.subscription.get().is_some() {
            tracing::trace!(target: "scrivo::overlay", "controller already registered");
            return false;
        }
        let on_selected = self.on_selected.clone();
        let id = self.bus.subscribe(EventKind::ImageSelected, move |event| {
            if let OverlayEvent::ImageSelected(path) = event {
                on_selected(path.clone());
            }
        });
        self.subscription.set(Some(id));
        true
    }

    /// Stop listening. A no-op returning false if not listening.
    pub fn unregister(&self) -> bool {
        match self.subscription.take() {
            Some(id) => self.bus.unsubscribe(id),
            None => false,
        }
    }

    pub fn is_registered(&self) -> bool {
        self.subscription.get().is_some()
    }
}

impl Drop for OverlayController {
    fn drop(&mut self) {
        self.unregister();
    }
}

impl std::fmt::Debug for OverlayController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OverlayController")
            .field("subscription", &self.subscription.get())
            .finish()
    }
}
