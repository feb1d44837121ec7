//! Core types for ingrain.

mod document;
mod message;
mod record;

pub use document::*;
pub use message::*;
pub use record::*;
