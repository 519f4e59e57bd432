/// Permission scope tiers
///
/// Scopes are ordered by priority: a `global` grant always wins over a
/// `local` or `join_request` grant of the same action and object.

use crate::error::AuthzError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Scope a permission applies in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionScope {
    /// Organization-wide
    Global,
    /// Limited to the circle's own body
    Local,
    /// Membership-request context
    JoinRequest,
}

impl PermissionScope {
    /// All scopes, highest priority first
    pub const PRIORITY: [PermissionScope; 3] = [
        PermissionScope::Global,
        PermissionScope::Local,
        PermissionScope::JoinRequest,
    ];

    /// Wire name used in combined keys
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Global => "global",
            Self::Local => "local",
            Self::JoinRequest => "join_request",
        }
    }
}

impl FromStr for PermissionScope {
    type Err = AuthzError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "global" => Ok(Self::Global),
            "local" => Ok(Self::Local),
            "join_request" => Ok(Self::JoinRequest),
            other => Err(AuthzError::InvalidInput(format!(
                "Unknown permission scope: '{}'",
                other
            ))),
        }
    }
}

impl fmt::Display for PermissionScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
