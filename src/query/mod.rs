//! Generic query and command vocabulary.
//!
//! - `filter.rs` - Filter predicate tree and its JSON form
//! - `evaluator.rs` - Record matching for filters
//! - `query.rs` - Read queries
//! - `command.rs` - Write commands
//! - `patch.rs` - Update documents carried by update commands

pub mod command;
mod evaluator;
pub mod filter;
pub mod patch;
#[allow(clippy::module_inception)]
pub mod query;

pub use command::{
    DeleteCommand, IdDeleteCommand, IdUpdateCommand, InsertCommand, MultiDeleteCommand,
    MultiInsertCommand, MultiUpdateCommand, SingleInsertCommand, UpdateCommand,
};
pub use filter::{FieldFilter, Filter, Operator, Pattern, Predicate};
pub use patch::Patch;
pub use query::{IdQuery, IdsQuery, WhereQuery};
