//! In-process publish/subscribe between the editor and floating panels.
//!
//! A bus is an ordinary value: whoever needs to talk over it is handed a
//! clone. Handlers run synchronously inside [`EventBus::publish`] and may
//! publish, subscribe or unsubscribe themselves.

use std::cell::RefCell;
use std::rc::Rc;

use smol_str::SmolStr;

/// Navigation keys forwarded to a panel while it owns them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HotKey {
    ArrowUp,
    ArrowDown,
    Enter,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OverlayEvent {
    /// The path text of the image under the caret, whenever it changes.
    ImageSourceChanged(SmolStr),
    OverlayClose,
    /// A panel picked a replacement path.
    ImageSelected(SmolStr),
    OverlayHotkey(HotKey),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    ImageSourceChanged,
    OverlayClose,
    ImageSelected,
    OverlayHotkey,
}

impl OverlayEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            OverlayEvent::ImageSourceChanged(_) => EventKind::ImageSourceChanged,
            OverlayEvent::OverlayClose => EventKind::OverlayClose,
            OverlayEvent::ImageSelected(_) => EventKind::ImageSelected,
            OverlayEvent::OverlayHotkey(_) => EventKind::OverlayHotkey,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Handler = Rc<dyn Fn(&OverlayEvent)>;

#[derive(Default)]
struct BusInner {
    next_id: u64,
    handlers: Vec<(SubscriptionId, EventKind, Handler)>,
}

#[derive(Clone, Default)]
pub struct EventBus(Rc<RefCell<BusInner>>);

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(
        &self,
        kind: EventKind,
        handler: impl Fn(&OverlayEvent) + 'static,
    ) -> SubscriptionId {
        let mut inner = self.0.borrow_mut();
        inner.next_id += 1;
        let id = SubscriptionId(inner.next_id);
        inner.handlers.push((id, kind, Rc::new(handler)));
        id
    }

    /// Returns false if `id` was not subscribed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut inner = self.0.borrow_mut();
        let before = inner.handlers.len();
        inner.handlers.retain(|(sub, _, _)| *sub != id);
        inner.handlers.len() != before
    }

    pub fn is_subscribed(&self, id: SubscriptionId) -> bool {
        self.0.borrow().handlers.iter().any(|(sub, _, _)| *sub == id)
    }

    pub fn subscriber_count(&self, kind: EventKind) -> usize {
        self.0
            .borrow()
            .handlers
            .iter()
            .filter(|(_, k, _)| *k == kind)
            .count()
    }

    /// Deliver `event` to its subscribers, returning how many ran.
    pub fn publish(&self, event: &OverlayEvent) -> usize {
        let kind = event.kind();
        let targets: Vec<(SubscriptionId, Handler)> = self
            .0
            .borrow()
            .handlers
            .iter()
            .filter(|(_, k, _)| *k == kind)
            .map(|(id, _, handler)| (*id, handler.clone()))
            .collect();
        tracing::trace!(target: "scrivo::overlay", ?event, subscribers = targets.len(), "publish");

        let mut delivered = 0;
        for (id, handler) in targets {
            // An earlier handler may have unsubscribed this one.
            if self.is_subscribed(id) {
                handler(event);
                delivered += 1;
            }
        }
        delivered
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("handlers", &self.0.borrow().handlers.len())
            .finish()
    }
}
