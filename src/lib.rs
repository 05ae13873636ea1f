// ============================================================================
// Entity Access Library
// ============================================================================

pub mod core;
pub mod interface;
pub mod prelude;
pub mod query;
pub mod state;
pub mod store;

// Re-export main types for convenience
pub use core::{Entity, EntityError, PatchError, Record, Result, StoreError};
pub use interface::{EntityClient, EntityStateFinder, EntityStateUpdater};
pub use query::{
    DeleteCommand, Filter, IdQuery, IdUpdateCommand, IdsQuery, InsertCommand, MultiInsertCommand,
    MultiUpdateCommand, Patch, SingleInsertCommand, UpdateCommand, WhereQuery,
};
pub use state::{EntityPool, UpdateOperation};

// Re-export store backend
pub use store::{
    ClientConfig, DocumentEntityClient, DocumentStore, MemoryDocumentStore, MultiGetPolicy,
};
