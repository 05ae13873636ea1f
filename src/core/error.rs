use thiserror::Error;

/// Errors surfaced by the entity read/write contract.
#[derive(Error, Debug)]
pub enum EntityError {
    /// A read or update that requires at least one matching record found none.
    #[error("\"{operation}\" failed. Could not find any entity with the given query: {context}")]
    NotFound {
        operation: &'static str,
        context: String,
    },

    #[error("Invalid command: {0}")]
    InvalidCommand(String),

    #[error("Invalid filter: {0}")]
    InvalidFilter(String),

    #[error("Invalid update operation: {0}")]
    InvalidOperation(#[from] PatchError),

    #[error("Entity of type '{0}' has no id")]
    MissingId(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Store driver errors pass through untouched.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl EntityError {
    pub fn not_found(operation: &'static str, context: impl Into<String>) -> Self {
        Self::NotFound {
            operation,
            context: context.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

impl From<serde_json::Error> for EntityError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Errors raised by a document collection handle.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Duplicate key '{key}' in collection '{collection}'")]
    DuplicateKey { collection: String, key: String },

    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    #[error("Malformed update document: {0}")]
    MalformedUpdate(#[from] PatchError),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Errors raised while applying a patch document to a record.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PatchError {
    #[error("unsupported update operator '{0}'")]
    UnsupportedOperator(String),

    #[error("operand of '{0}' must be an object")]
    InvalidOperand(String),

    #[error("cannot apply $inc to non-numeric field '{0}'")]
    NotNumeric(String),

    #[error("cannot apply $push to non-array field '{0}'")]
    NotArray(String),

    #[error("cannot traverse non-object value at '{0}'")]
    NotObject(String),

    #[error("field '{0}' is the identifier and cannot be modified")]
    IdentifierChange(String),
}

pub type Result<T> = std::result::Result<T, EntityError>;

pub type StoreResult<T> = std::result::Result<T, StoreError>;
