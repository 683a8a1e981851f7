//! Common error types used across the workspace.
//!
//! Each layer defines its own typed errors and converts into [`BillHubError`]
//! via `#[from]` (or an explicit `From` impl for boxed storage errors).

/// Top-level error for domain and application operations.
#[derive(Debug, thiserror::Error)]
pub enum BillHubError {
    /// A domain invariant or request precondition failed.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A referenced entity does not exist.
    #[error(transparent)]
    NotFound(#[from] NotFoundError),

    /// A persistence operation failed.
    #[error("storage error: {0}")]
    Storage(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Domain invariant violations.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// A required name field was empty.
    #[error("name must not be empty")]
    EmptyName,

    /// A required identifier was missing from the request.
    #[error("missing required identifier: {0}")]
    MissingId(&'static str),

    /// A tenant has no subscription package assigned.
    #[error("tenant has no subscription package")]
    NoPackage,

    /// An identifier could not be parsed.
    #[error("malformed identifier: {0}")]
    MalformedId(String),
}

/// A lookup for a specific entity came back empty.
#[derive(Debug, thiserror::Error)]
#[error("{entity} not found: {id}")]
pub struct NotFoundError {
    /// Entity kind (e.g. `"Tenant"`).
    pub entity: &'static str,
    /// The identifier that was looked up.
    pub id: String,
}
