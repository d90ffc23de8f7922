//! Errors raised while wiring models to components.

use thiserror::Error;

/// Errors from provider construction, connector mount, and config loading.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConnectError {
    /// A models provider must wrap exactly one child.
    #[error("models provider requires exactly one child, found {found}")]
    ChildCount { found: usize },
    /// A model named in the type constraints is missing or has the wrong type.
    #[error("\"{key}\" model found on models map does not match type required ({expected})")]
    TypeMismatch { key: String, expected: &'static str },
    /// A connector configuration document could not be parsed.
    #[error("invalid connector config: {0}")]
    Config(String),
}

/// Result alias used across the workspace.
pub type Result<T, E = ConnectError> = std::result::Result<T, E>;
