#![forbid(unsafe_code)]

//! Offline worker protocol: cache naming and the page → worker message.
//!
//! The deployed version lives only in the cache name, `<prefix>-v<version>`.
//! When a new worker activates, every cache sharing the prefix with a
//! different version is stale and gets purged; caches with other prefixes
//! belong to someone else and are left alone.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::UpdateConfig;

/// Versioned cache identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CacheVersion {
    pub prefix: String,
    pub version: u32,
}

impl CacheVersion {
    #[must_use]
    pub fn new(prefix: impl Into<String>, version: u32) -> Self {
        Self {
            prefix: prefix.into(),
            version,
        }
    }

    #[must_use]
    pub fn from_config(config: &UpdateConfig) -> Self {
        Self::new(config.cache_prefix.clone(), config.cache_version)
    }

    /// Full cache name, e.g. `tactile-v3`.
    #[must_use]
    pub fn cache_name(&self) -> String {
        format!("{}-v{}", self.prefix, self.version)
    }

    /// Parse a cache name produced by [`cache_name`](Self::cache_name).
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        let (prefix, version) = name.rsplit_once("-v")?;
        if prefix.is_empty() {
            return None;
        }
        let version = version.parse().ok()?;
        Some(Self::new(prefix, version))
    }

    /// Names from `existing` that belong to an older or newer deployment of
    /// this app and should be deleted.
    pub fn stale_caches<'a, I>(&self, existing: I) -> Vec<&'a str>
    where
        I: IntoIterator<Item = &'a str>,
    {
        existing
            .into_iter()
            .filter(|name| {
                Self::parse(name).is_some_and(|other| {
                    other.prefix == self.prefix && other.version != self.version
                })
            })
            .collect()
    }
}

impl fmt::Display for CacheVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-v{}", self.prefix, self.version)
    }
}

/// Message posted from the page to a worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkerMessage {
    /// Activate the waiting worker immediately.
    SkipWaiting,
}

impl WorkerMessage {
    /// Wire form, e.g. `{"type":"SKIP_WAITING"}`.
    #[must_use]
    pub fn to_json(self) -> String {
        match self {
            Self::SkipWaiting => r#"{"type":"SKIP_WAITING"}"#.to_owned(),
        }
    }

    /// Recognize a message received by the worker. Anything else is `None`.
    #[must_use]
    pub fn parse(data: &str) -> Option<Self> {
        serde_json::from_str(data).ok()
    }
}
