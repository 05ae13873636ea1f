//! Document-store backend.
//!
//! - `collection.rs` - Collection and store handle contracts
//! - `id_mapper.rs` - `id` / native key translation
//! - `config.rs` - Adapter configuration
//! - `adapter.rs` - [`EntityClient`](crate::interface::EntityClient) over a store
//! - `memory.rs` - In-process store implementation

pub mod adapter;
pub mod collection;
pub mod config;
pub mod id_mapper;
pub mod memory;

pub use adapter::DocumentEntityClient;
pub use collection::{
    DeleteResult, DocumentCollection, DocumentStore, FindOptions, InsertManyResult,
    InsertOneResult, UpdateResult,
};
pub use config::{ClientConfig, MultiGetPolicy};
pub use id_mapper::IdMapper;
pub use memory::{MemoryCollection, MemoryDocumentStore};
