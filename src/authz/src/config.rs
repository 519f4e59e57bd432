//! Resolver and store configuration
//!
//! Environment variables:
//! - `AUTHZ_STRICT_KEYS` - reject malformed permission keys (default: false)
//! - `AUTHZ_REJECT_DANGLING_CIRCLES` - fail loads that reference unknown circles (default: false)
//! - `AUTHZ_LOADED_SCOPES` - comma-separated scopes loaded for non-superadmins (default: global)
//! - `AUTHZ_FETCH_TIMEOUT_MS` - per-fetch timeout in milliseconds (default: none)
//! - `DATABASE_URL` - PostgreSQL connection string
//! - `DB_MAX_CONNECTIONS` - pool size (default: 25)
//! - `DB_MIN_CONNECTIONS` - idle connections kept open (default: 5)
//! - `DB_ACQUIRE_TIMEOUT_SECS` - connection acquire timeout (default: 3)

use crate::error::{AuthzError, Result};
use crate::scope::{KeyParsing, PermissionScope};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// What to do with circles referenced but missing from the hierarchy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DanglingCirclePolicy {
    /// Keep the circle in the resolved set as an unexpandable leaf
    #[default]
    Retain,
    /// Fail the load with [`AuthzError::DanglingCircle`]
    Reject,
}

/// Permission resolver configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// Handling of keys that are neither `action:object` nor `scope:action:object`
    pub key_parsing: KeyParsing,

    /// Handling of dangling circle references
    pub dangling_circles: DanglingCirclePolicy,

    /// Scopes fetched for non-superadmin principals
    pub loaded_scopes: Vec<PermissionScope>,

    /// Upper bound on each store fetch
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fetch_timeout: Option<Duration>,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            key_parsing: KeyParsing::Lenient,
            dangling_circles: DanglingCirclePolicy::Retain,
            loaded_scopes: vec![PermissionScope::Global],
            fetch_timeout: None,
        }
    }
}

impl ResolverConfig {
    /// Read configuration from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(value) = lookup("AUTHZ_STRICT_KEYS") {
            if parse_bool("AUTHZ_STRICT_KEYS", &value)? {
                config.key_parsing = KeyParsing::Strict;
            }
        }

        if let Some(value) = lookup("AUTHZ_REJECT_DANGLING_CIRCLES") {
            if parse_bool("AUTHZ_REJECT_DANGLING_CIRCLES", &value)? {
                config.dangling_circles = DanglingCirclePolicy::Reject;
            }
        }

        if let Some(value) = lookup("AUTHZ_LOADED_SCOPES") {
            let scopes = value
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(|s| {
                    s.parse::<PermissionScope>()
                        .map_err(|e| AuthzError::Config(format!("AUTHZ_LOADED_SCOPES: {}", e)))
                })
                .collect::<Result<Vec<_>>>()?;

            if scopes.is_empty() {
                return Err(AuthzError::Config(
                    "AUTHZ_LOADED_SCOPES must name at least one scope".to_string(),
                ));
            }
            config.loaded_scopes = scopes;
        }

        if let Some(value) = lookup("AUTHZ_FETCH_TIMEOUT_MS") {
            let millis = parse_u64("AUTHZ_FETCH_TIMEOUT_MS", &value)?;
            config.fetch_timeout = Some(Duration::from_millis(millis));
        }

        Ok(config)
    }
}

/// PostgreSQL store configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// PostgreSQL connection string
    pub database_url: String,

    /// Maximum pool size
    pub max_connections: u32,

    /// Idle connections kept open
    pub min_connections: u32,

    /// How long to wait for a pooled connection
    pub acquire_timeout: Duration,
}

impl StoreConfig {
    /// Configuration with default pool settings
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            max_connections: 25,
            min_connections: 5,
            acquire_timeout: Duration::from_secs(3),
        }
    }

    /// Read configuration from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL")
            .ok_or_else(|| AuthzError::Config("DATABASE_URL is not set".to_string()))?;
        let mut config = Self::new(database_url);

        if let Some(value) = lookup("DB_MAX_CONNECTIONS") {
            config.max_connections = parse_u32("DB_MAX_CONNECTIONS", &value)?;
        }
        if let Some(value) = lookup("DB_MIN_CONNECTIONS") {
            config.min_connections = parse_u32("DB_MIN_CONNECTIONS", &value)?;
        }
        if let Some(value) = lookup("DB_ACQUIRE_TIMEOUT_SECS") {
            config.acquire_timeout = Duration::from_secs(parse_u64("DB_ACQUIRE_TIMEOUT_SECS", &value)?);
        }

        if config.min_connections > config.max_connections {
            return Err(AuthzError::Config(format!(
                "DB_MIN_CONNECTIONS ({}) exceeds DB_MAX_CONNECTIONS ({})",
                config.min_connections, config.max_connections
            )));
        }

        Ok(config)
    }
}

fn parse_bool(name: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => Err(AuthzError::Config(format!("{}: expected a boolean, got '{}'", name, other))),
    }
}

fn parse_u64(name: &str, value: &str) -> Result<u64> {
    value
        .trim()
        .parse()
        .map_err(|e| AuthzError::Config(format!("{}: {}", name, e)))
}

fn parse_u32(name: &str, value: &str) -> Result<u32> {
    value
        .trim()
        .parse()
        .map_err(|e| AuthzError::Config(format!("{}: {}", name, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ResolverConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, ResolverConfig::default());
        assert_eq!(config.loaded_scopes, vec![PermissionScope::Global]);
        assert_eq!(config.key_parsing, KeyParsing::Lenient);
        assert_eq!(config.dangling_circles, DanglingCirclePolicy::Retain);
        assert!(config.fetch_timeout.is_none());
    }

    #[test]
    fn test_resolver_overrides() {
        let config = ResolverConfig::from_lookup(lookup(&[
            ("AUTHZ_STRICT_KEYS", "true"),
            ("AUTHZ_REJECT_DANGLING_CIRCLES", "1"),
            ("AUTHZ_LOADED_SCOPES", "global, local,join_request"),
            ("AUTHZ_FETCH_TIMEOUT_MS", "250"),
        ]))
        .unwrap();

        assert_eq!(config.key_parsing, KeyParsing::Strict);
        assert_eq!(config.dangling_circles, DanglingCirclePolicy::Reject);
        assert_eq!(config.loaded_scopes, PermissionScope::PRIORITY.to_vec());
        assert_eq!(config.fetch_timeout, Some(Duration::from_millis(250)));
    }

    #[test]
    fn test_resolver_bad_values() {
        assert!(matches!(
            ResolverConfig::from_lookup(lookup(&[("AUTHZ_STRICT_KEYS", "maybe")])),
            Err(AuthzError::Config(_))
        ));
        assert!(ResolverConfig::from_lookup(lookup(&[("AUTHZ_LOADED_SCOPES", "regional")])).is_err());
        assert!(ResolverConfig::from_lookup(lookup(&[("AUTHZ_LOADED_SCOPES", " , ")])).is_err());
        assert!(ResolverConfig::from_lookup(lookup(&[("AUTHZ_FETCH_TIMEOUT_MS", "-5")])).is_err());
    }

    #[test]
    fn test_store_config() {
        assert!(StoreConfig::from_lookup(lookup(&[])).is_err());

        let config = StoreConfig::from_lookup(lookup(&[
            ("DATABASE_URL", "postgresql://localhost/core"),
            ("DB_MAX_CONNECTIONS", "10"),
        ]))
        .unwrap();
        assert_eq!(config.max_connections, 10);
        assert_eq!(config.min_connections, 5);
        assert_eq!(config.acquire_timeout, Duration::from_secs(3));

        let result = StoreConfig::from_lookup(lookup(&[
            ("DATABASE_URL", "postgresql://localhost/core"),
            ("DB_MAX_CONNECTIONS", "2"),
        ]));
        assert!(result.is_err());
    }
}
