//! Errors raised by mapping registries

use thiserror::Error;

/// Which argument of a type-erased call failed to downcast.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueRole {
    Key,
    Source,
    Target,
}

impl std::fmt::Display for ValueRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Key => write!(f, "key"),
            Self::Source => write!(f, "source"),
            Self::Target => write!(f, "target"),
        }
    }
}

/// Errors that can occur in mapping operations
#[derive(Debug, Error)]
pub enum MappingError {
    /// A type-erased call was handed a value of the wrong concrete type.
    /// This is a wiring defect in the caller, never a data problem.
    #[error("type mismatch in {registry}: {role} is not a {expected}")]
    TypeMismatch {
        registry: String,
        role: ValueRole,
        expected: &'static str,
    },

    #[error("invalid source data: {0}")]
    InvalidSource(String),

    #[error("mapping failed in {registry}: {message}")]
    Failed { registry: String, message: String },

    #[error(transparent)]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

impl MappingError {
    pub fn failed(registry: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Failed {
            registry: registry.into(),
            message: message.into(),
        }
    }

    /// True for the programmer-error class of failure.
    pub fn is_type_mismatch(&self) -> bool {
        matches!(self, Self::TypeMismatch { .. })
    }
}

/// Result type for mapping operations
pub type MappingResult<T> = Result<T, MappingError>;
