//! Persistent ISIN-to-secid cache.
//!
//! The on-disk format is a JSON object mapping public identifiers to
//! pipe-delimited `internalId|kind|domain` strings, pretty-printed with
//! sorted keys. In memory the composite string is only touched at the
//! storage boundary; callers work with [`SecidEntry`].

use std::collections::BTreeMap;
use std::path::Path;

use crate::error::ClassifyError;

/// Default cache file name, relative to the working directory.
pub const CACHE_FILE: &str = "isin2secid.json";

/// A resolved identifier: the provider's internal id, the security kind,
/// and the market domain the resolution used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecidEntry {
    pub secid: String,
    pub kind: String,
    pub domain: String,
}

impl SecidEntry {
    /// The sentinel returned when the provider does not know an identifier.
    pub fn not_found() -> Self {
        Self {
            secid: String::new(),
            kind: String::new(),
            domain: String::new(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.secid.is_empty()
    }

    /// Parses a persisted composite string. Only strings with exactly three
    /// non-empty parts are valid; anything else counts as a cache miss.
    fn from_cached(raw: &str) -> Option<Self> {
        let parts: Vec<&str> = raw.split('|').collect();
        if parts.len() != 3 || parts.iter().any(|p| p.is_empty()) {
            return None;
        }
        Some(Self {
            secid: parts[0].to_string(),
            kind: parts[1].to_string(),
            domain: parts[2].to_string(),
        })
    }

    fn to_cached(&self) -> String {
        format!("{}|{}|{}", self.secid, self.kind, self.domain)
    }
}

/// In-memory identifier cache with explicit load/save lifecycle.
#[derive(Debug, Default)]
pub struct SecidCache {
    entries: BTreeMap<String, String>,
}

impl SecidCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads the cache from `path`. A missing file yields an empty cache;
    /// a malformed file is logged and yields an empty cache. Never fatal.
    pub fn load(path: &Path) -> Self {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Self::new(),
            Err(e) => {
                tracing::warn!("could not read cache file {}: {}", path.display(), e);
                return Self::new();
            }
        };
        match serde_json::from_str::<BTreeMap<String, String>>(&raw) {
            Ok(entries) => Self { entries },
            Err(e) => {
                tracing::warn!("invalid cache file {}: {}", path.display(), e);
                Self::new()
            }
        }
    }

    /// Writes the whole cache to `path`, replacing any previous content.
    pub fn save(&self, path: &Path) -> Result<(), ClassifyError> {
        let json = serde_json::to_string_pretty(&self.entries)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Returns the cached entry for `isin`, if present and well-formed.
    /// Malformed entries are treated as misses and refreshed in place on
    /// the next insert.
    pub fn get(&self, isin: &str) -> Option<SecidEntry> {
        self.entries.get(isin).and_then(|raw| SecidEntry::from_cached(raw))
    }

    pub fn insert(&mut self, isin: &str, entry: &SecidEntry) {
        self.entries.insert(isin.to_string(), entry.to_cached());
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
