//! Error types for permission resolution

use crate::types::CircleId;
use thiserror::Error;

/// Permission resolution errors
#[derive(Debug, Error)]
pub enum AuthzError {
    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Permission key that is neither `action:object` nor `scope:action:object`
    #[error("Invalid permission key: {0}")]
    InvalidKey(String),

    /// Permission record whose fields disagree with each other
    #[error("Invalid permission: {0}")]
    InvalidPermission(String),

    /// Circle referenced by a membership or parent link but not present in the hierarchy
    #[error("Dangling circle reference: {0}")]
    DanglingCircle(CircleId),

    /// Database error
    #[error("Database error: {0}")]
    DatabaseError(String),

    /// Non-database store failure
    #[error("Store error: {0}")]
    StoreError(String),

    /// A store fetch did not complete within the configured timeout
    #[error("Timed out fetching {0}")]
    Timeout(&'static str),

    /// Bad configuration value
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type for permission resolution
pub type Result<T> = std::result::Result<T, AuthzError>;
