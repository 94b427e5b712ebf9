//! Error types for kernel operations.

use crate::query::QueryError;
use crate::resolver::ResolverError;

/// Collaborator failures that abort a whole command.
///
/// Normal negative outcomes ("no match", "no updates") are data, never
/// errors.
#[derive(Debug, thiserror::Error)]
pub enum KernelError {
    #[error(transparent)]
    Query(#[from] QueryError),

    #[error(transparent)]
    Resolver(#[from] ResolverError),
}
