//! Model of the floating "pick an image" panel.
//!
//! The panel only talks over the bus: it opens and filters on
//! image-source-changed, closes on overlay-close, moves its cursor on
//! hotkeys and publishes image-selected on Enter.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use smol_str::SmolStr;

use super::bus::{EventBus, EventKind, HotKey, OverlayEvent, SubscriptionId};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PickerState {
    pub open: bool,
    pub query: SmolStr,
    pub items: Vec<SmolStr>,
    pub cursor: usize,
}

struct PickerInner {
    bus: EventBus,
    candidates: Vec<SmolStr>,
    state: RefCell<PickerState>,
    subscriptions: RefCell<Vec<SubscriptionId>>,
}

impl PickerInner {
    fn filter(&self, query: &str) -> Vec<SmolStr> {
        let needle = query.to_lowercase();
        self.candidates
            .iter()
            .filter(|c| c.to_lowercase().contains(&needle))
            .cloned()
            .collect()
    }

    fn handle(&self, event: &OverlayEvent) {
        match event {
            OverlayEvent::ImageSourceChanged(src) => {
                let items = self.filter(src);
                *self.state.borrow_mut() = PickerState {
                    open: true,
                    query: src.clone(),
                    items,
                    cursor: 0,
                };
            }
            OverlayEvent::OverlayClose => {
                *self.state.borrow_mut() = PickerState::default();
            }
            OverlayEvent::OverlayHotkey(key) => {
                let chosen = {
                    let mut state = self.state.borrow_mut();
                    if !state.open || state.items.is_empty() {
                        return;
                    }
                    match key {
                        HotKey::ArrowUp => {
                            state.cursor = state.cursor.saturating_sub(1);
                            None
                        }
                        HotKey::ArrowDown => {
                            state.cursor = (state.cursor + 1).min(state.items.len() - 1);
                            None
                        }
                        HotKey::Enter => state.items.get(state.cursor).cloned(),
                    }
                };
                if let Some(path) = chosen {
                    tracing::debug!(target: "scrivo::overlay", %path, "picker selected image");
                    self.bus.publish(&OverlayEvent::ImageSelected(path));
                }
            }
            OverlayEvent::ImageSelected(_) => {}
        }
    }
}

impl Drop for PickerInner {
    fn drop(&mut self) {
        for id in self.subscriptions.get_mut().drain(..) {
            self.bus.unsubscribe(id);
        }
    }
}

#[derive(Clone)]
pub struct ImagePicker(Rc<PickerInner>);

impl ImagePicker {
    /// Subscribe a picker offering `candidates` to `bus`.
    pub fn attach(bus: &EventBus, candidates: impl IntoIterator<Item = SmolStr>) -> Self {
        let inner = Rc::new(PickerInner {
            bus: bus.clone(),
            candidates: candidates.into_iter().collect(),
            state: RefCell::new(PickerState::default()),
            subscriptions: RefCell::new(Vec::new()),
        });
        let ids = [
            EventKind::ImageSourceChanged,
            EventKind::OverlayClose,
            EventKind::OverlayHotkey,
        ]
        .into_iter()
        .map(|kind| {
            let weak: Weak<PickerInner> = Rc::downgrade(&inner);
            bus.subscribe(kind, move |event| {
                if let Some(picker) = weak.upgrade() {
                    picker.handle(event);
                }
            })
        })
        .collect();
        *inner.subscriptions.borrow_mut() = ids;
        Self(inner)
    }

    /// Stop listening; the panel keeps its last state.
    pub fn detach(&self) {
        for id in self.0.subscriptions.borrow_mut().drain(..) {
            self.0.bus.unsubscribe(id);
        }
    }

    pub fn state(&self) -> PickerState {
        self.0.state.borrow().clone()
    }

    /// The currently highlighted candidate.
    pub fn highlighted(&self) -> Option<SmolStr> {
        let state = self.0.state.borrow();
        state.items.get(state.cursor).cloned()
    }
}

impl std::fmt::Debug for ImagePicker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("ImagePicker").field(&self.state()).finish()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;

    fn attach_picker(bus: &EventBus) -> ImagePicker {
        ImagePicker::attach(
            bus,
            ["img/cat.png", "img/Cathedral.jpg", "img/dog.gif"].map(SmolStr::new),
        )
    }

    #[test]
    fn opens_and_filters_case_insensitively() {
        let bus = EventBus::new();
        let picker = attach_picker(&bus);
        bus.publish(&OverlayEvent::ImageSourceChanged("CAT".into()));
        let state = picker.state();
        assert!(state.open);
        assert_eq!(state.items, vec!["img/cat.png", "img/Cathedral.jpg"]);

        bus.publish(&OverlayEvent::OverlayClose);
        assert_eq!(picker.state(), PickerState::default());
    }

    #[test]
    fn hotkeys_move_and_confirm() {
        let bus = EventBus::new();
        let picker = attach_picker(&bus);
        let selected = Rc::new(RefCell::new(Vec::new()));
        let sink = selected.clone();
        bus.subscribe(EventKind::ImageSelected, move |event| {
            sink.borrow_mut().push(event.clone())
        });

        // Closed panel ignores keys.
        bus.publish(&OverlayEvent::OverlayHotkey(HotKey::Enter));
        assert!(selected.borrow().is_empty());

        bus.publish(&OverlayEvent::ImageSourceChanged("img/".into()));
        bus.publish(&OverlayEvent::OverlayHotkey(HotKey::ArrowUp));
        assert_eq!(picker.state().cursor, 0);
        for _ in 0..5 {
            bus.publish(&OverlayEvent::OverlayHotkey(HotKey::ArrowDown));
        }
        assert_eq!(picker.state().cursor, 2);
        bus.publish(&OverlayEvent::OverlayHotkey(HotKey::ArrowUp));
        assert_eq!(picker.highlighted().as_deref(), Some("img/Cathedral.jpg"));

        bus.publish(&OverlayEvent::OverlayHotkey(HotKey::Enter));
        assert_eq!(
            *selected.borrow(),
            vec![OverlayEvent::ImageSelected("img/Cathedral.jpg".into())]
        );
    }

    #[test]
    fn detach_and_drop_unsubscribe() {
        let bus = EventBus::new();
        let picker = attach_picker(&bus);
        assert_eq!(bus.subscriber_count(EventKind::OverlayHotkey), 1);
        picker.detach();
        assert_eq!(bus.subscriber_count(EventKind::OverlayHotkey), 0);

        let other = attach_picker(&bus);
        drop(other);
        assert_eq!(bus.subscriber_count(EventKind::ImageSourceChanged), 0);
    }
}
