//! Result alias for shared error handling.

use crate::errors::ErrorEnvelope;

/// Shared result type used across port and adapter boundaries.
pub type Result<T, E = ErrorEnvelope> = std::result::Result<T, E>;
