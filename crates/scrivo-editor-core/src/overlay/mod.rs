//! Overlay state synchronisation.
//!
//! The editor publishes what it knows about the image under the caret into
//! an [`OverlayStore`]; watchers on the store translate changes into bus
//! events, keymap swaps and controller registration. Panels such as the
//! [`ImagePicker`] see only the [`EventBus`].

pub mod bus;
pub mod controller;
pub mod picker;
pub mod store;

pub use bus::{EventBus, EventKind, HotKey, OverlayEvent, SubscriptionId};
pub use controller::OverlayController;
pub use picker::{ImagePicker, PickerState};
pub use store::{OverlayState, OverlayStore};
