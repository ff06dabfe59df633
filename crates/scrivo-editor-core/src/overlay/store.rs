//! Shared overlay state with change watchers.

use std::cell::RefCell;
use std::ops::Range;
use std::rc::Rc;

use smol_str::SmolStr;

use crate::types::Rect;

/// What the editor tells floating panels about the image under the caret.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct OverlayState {
    /// The caret is inside an image's path text.
    pub caret_in_image: bool,
    /// Byte range of that path text.
    pub active_range: Option<Range<usize>>,
    pub src: SmolStr,
    /// Last reported screen box of the image preview.
    pub anchor: Option<Rect>,
}

type Watcher = Rc<dyn Fn(&OverlayState, &OverlayState)>;

#[derive(Default)]
struct StoreInner {
    state: RefCell<OverlayState>,
    watchers: RefCell<Vec<Watcher>>,
}

#[derive(Clone, Default)]
pub struct OverlayStore(Rc<StoreInner>);

impl OverlayStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> OverlayState {
        self.0.state.borrow().clone()
    }

    /// Run `effect(old, new)` whenever the selected part of the state
    /// changes. Watchers run in registration order.
    pub fn watch<T, S, E>(&self, selector: S, effect: E)
    where
        T: PartialEq + 'static,
        S: Fn(&OverlayState) -> T + 'static,
        E: Fn(&T, &T) + 'static,
    {
        let watcher: Watcher = Rc::new(move |old, new| {
            let (before, after) = (selector(old), selector(new));
            if before != after {
                effect(&before, &after);
            }
        });
        self.0.watchers.borrow_mut().push(watcher);
    }

    /// Mutate the state; watchers see the change once `f` returns.
    /// Returns whether anything changed.
    pub fn update(&self, f: impl FnOnce(&mut OverlayState)) -> bool {
        let (old, new) = {
            let mut state = self.0.state.borrow_mut();
            let old = state.clone();
            f(&mut state);
            (old, state.clone())
        };
        if old == new {
            return false;
        }
        let watchers = self.0.watchers.borrow().clone();
        for watcher in watchers {
            watcher(&old, &new);
        }
        true
    }
}

impl std::fmt::Debug for OverlayStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OverlayStore")
            .field("state", &*self.0.state.borrow())
            .field("watchers", &self.0.watchers.borrow().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;

    #[test]
    fn watchers_fire_on_selected_changes_only() {
        let store = OverlayStore::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = log.clone();
        store.watch(
            |s| s.caret_in_image,
            move |old, new| sink.borrow_mut().push((*old, *new)),
        );

        assert!(store.update(|s| s.src = "a.png".into()));
        assert!(store.update(|s| s.caret_in_image = true));
        assert!(!store.update(|s| s.caret_in_image = true));
        assert!(store.update(|s| s.caret_in_image = false));
        assert_eq!(*log.borrow(), vec![(false, true), (true, false)]);
    }

    #[test]
    fn watcher_may_update_the_store() {
        let store = OverlayStore::new();
        let inner = store.clone();
        store.watch(
            |s| s.caret_in_image,
            move |_, now| {
                if !*now {
                    inner.update(|s| s.anchor = None);
                }
            },
        );
        store.update(|s| {
            s.caret_in_image = true;
            s.anchor = Some(Rect::default());
        });
        store.update(|s| s.caret_in_image = false);
        assert_eq!(store.get().anchor, None);
    }
}
