//! In-memory entity state.
//!
//! An [`EntityPool`] is an immutable snapshot that the finder reads and the
//! updater describes changes against. Changes take effect only when an
//! [`UpdateOperation`] is applied, which yields a new snapshot.

mod finder;
pub mod operation;
pub mod pool;
mod reducer;
mod updater;

pub use operation::{Selector, UpdateOperation};
pub use pool::{EntitiesById, EntityPool};
