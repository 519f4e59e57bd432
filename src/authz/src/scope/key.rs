/// Permission key parsing and candidate derivation
///
/// Turns the string a caller asks about into the ordered list of combined
/// keys to look up.

use super::types::PermissionScope;
use crate::error::{AuthzError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How malformed keys are handled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyParsing {
    /// Anything that is not `action:object` or `scope:action:object` is
    /// looked up verbatim
    #[default]
    Lenient,
    /// Malformed keys are rejected
    Strict,
}

/// A permission key as asked for by a caller
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PermissionKey {
    /// `scope:action:object`, only that exact scope is searched
    Scoped {
        scope: PermissionScope,
        action: String,
        object: String,
    },
    /// `action:object`, every scope is searched in priority order
    Unscoped { action: String, object: String },
    /// Anything else, looked up as-is
    Literal(String),
}

impl PermissionKey {
    /// Parse a key, falling back to [`PermissionKey::Literal`] for anything malformed
    pub fn parse(s: &str) -> Self {
        let segments: Vec<&str> = s.split(':').collect();

        match segments.as_slice() {
            [action, object] => Self::Unscoped {
                action: (*action).to_string(),
                object: (*object).to_string(),
            },
            [scope, action, object] => match scope.parse::<PermissionScope>() {
                Ok(scope) => Self::Scoped {
                    scope,
                    action: (*action).to_string(),
                    object: (*object).to_string(),
                },
                Err(_) => Self::Literal(s.to_string()),
            },
            _ => Self::Literal(s.to_string()),
        }
    }

    /// Parse a key, rejecting literals and empty segments
    pub fn parse_strict(s: &str) -> Result<Self> {
        if s.split(':').any(str::is_empty) {
            return Err(AuthzError::InvalidKey(format!(
                "'{}' has an empty segment",
                s
            )));
        }

        match Self::parse(s) {
            Self::Literal(raw) => Err(AuthzError::InvalidKey(format!(
                "'{}' is neither action:object nor scope:action:object",
                raw
            ))),
            key => Ok(key),
        }
    }

    /// Parse according to the given mode
    pub fn parse_with(s: &str, mode: KeyParsing) -> Result<Self> {
        match mode {
            KeyParsing::Lenient => Ok(Self::parse(s)),
            KeyParsing::Strict => Self::parse_strict(s),
        }
    }

    /// Explicit scope, if the key carries one
    pub fn scope(&self) -> Option<PermissionScope> {
        match self {
            Self::Scoped { scope, .. } => Some(*scope),
            _ => None,
        }
    }

    /// Combined keys to look up, highest priority first
    pub fn candidates(&self) -> Vec<String> {
        match self {
            Self::Scoped {
                scope,
                action,
                object,
            } => vec![format!("{}:{}:{}", scope, action, object)],
            Self::Unscoped { action, object } => PermissionScope::PRIORITY
                .iter()
                .map(|scope| format!("{}:{}:{}", scope, action, object))
                .collect(),
            Self::Literal(raw) => vec![raw.clone()],
        }
    }
}

impl FromStr for PermissionKey {
    type Err = AuthzError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse_strict(s)
    }
}

impl fmt::Display for PermissionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scoped {
                scope,
                action,
                object,
            } => write!(f, "{}:{}:{}", scope, action, object),
            Self::Unscoped { action, object } => write!(f, "{}:{}", action, object),
            Self::Literal(raw) => f.write_str(raw),
        }
    }
}
