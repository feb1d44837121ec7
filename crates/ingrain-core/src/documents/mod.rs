//! Document collaborators: the catalog a session selects from, and an
//! in-memory [`DocumentSource`](crate::traits::DocumentSource).

mod catalog;
mod memory;

pub use catalog::DocumentCatalog;
pub use memory::MemoryDocumentSource;
