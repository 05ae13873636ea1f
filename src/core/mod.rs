pub mod entity;
pub mod error;

pub use entity::{Entity, Record};
pub use error::{EntityError, PatchError, Result, StoreError, StoreResult};
