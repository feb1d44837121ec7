//! Document lifecycle events
//!
//! The host pushes create/delete/rename notifications onto a
//! [`DocumentEventBus`]; review sessions subscribe instead of being called
//! back directly.

mod bus;
mod event;

pub use bus::{DocumentEventBus, DocumentSubscriber};
pub use event::DocumentEvent;
