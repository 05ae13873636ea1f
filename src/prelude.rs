//! Glob-importable entry points.
//!
//! ```
//! use entity_access::prelude::*;
//!
//! let query = WhereQuery::new("users", Filter::eq("name", "Alice")).limit(1);
//! assert_eq!(query.limit, Some(1));
//! ```

pub use crate::core::{Entity, EntityError, Record, Result};
pub use crate::interface::{EntityClient, EntityStateFinder, EntityStateUpdater};
pub use crate::query::{
    DeleteCommand, Filter, IdQuery, IdUpdateCommand, IdsQuery, InsertCommand, MultiInsertCommand,
    MultiUpdateCommand, Patch, SingleInsertCommand, UpdateCommand, WhereQuery,
};
pub use crate::state::{EntityPool, UpdateOperation};
pub use crate::store::{ClientConfig, DocumentEntityClient, MemoryDocumentStore, MultiGetPolicy};
