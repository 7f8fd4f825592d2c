//! Snapshot stores: the lookup contract between backends and cached list data.
//!
//! The per-source ETL jobs (ZIP/PDF extraction, CSV parsing, HTML scraping)
//! run out-of-band and leave JSON snapshots behind; backends only ever read
//! those snapshots through [`Snapshot::get`]. An assessment never triggers a
//! download.

use crate::error::Result;
use crate::identity::{normalize_name, NormalizedIdentity};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tracing::info;

/// How a snapshot entry matched the queried identity.
///
/// ISSN matches are exact registry identifiers; name matches go through
/// normalization and carry lower confidence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchMethod {
    Issn,
    Name,
}

impl MatchMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchMethod::Issn => "issn",
            MatchMethod::Name => "name",
        }
    }
}

/// An entry addressable by venue name and optionally by ISSN.
pub trait Keyed {
    fn name(&self) -> &str;
    fn issn(&self) -> Option<&str>;
}

/// Membership entry of a binary (predatory or vetted) list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListEntry {
    pub name: String,
    #[serde(default)]
    pub issn: Option<String>,
    /// Free-form annotation from the source list (e.g. "hijacked")
    #[serde(default)]
    pub note: Option<String>,
}

impl Keyed for ListEntry {
    fn name(&self) -> &str {
        &self.name
    }
    fn issn(&self) -> Option<&str> {
        self.issn.as_deref()
    }
}

/// Placement on a ranked list (e.g. CORE), with its rank label.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankEntry {
    pub name: String,
    #[serde(default)]
    pub issn: Option<String>,
    /// Rank label as published by the list ("A*", "A", "B", ...)
    pub rank: String,
}

impl Keyed for RankEntry {
    fn name(&self) -> &str {
        &self.name
    }
    fn issn(&self) -> Option<&str> {
        self.issn.as_deref()
    }
}

/// Retraction counts for one venue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetractionRecord {
    pub name: String,
    #[serde(default)]
    pub issn: Option<String>,
    /// All-time retraction count
    pub total: u64,
    /// Retractions within the recency window (last two years at ETL time)
    #[serde(default)]
    pub recent: u64,
}

impl Keyed for RetractionRecord {
    fn name(&self) -> &str {
        &self.name
    }
    fn issn(&self) -> Option<&str> {
        self.issn.as_deref()
    }
}

/// Read-only, in-memory view of one source's snapshot.
///
/// Entries are indexed by normalized name and by ISSN at load time; lookups
/// prefer the ISSN index.
pub struct Snapshot<T> {
    by_name: HashMap<String, T>,
    by_issn: HashMap<String, T>,
}

impl<T: Keyed + Clone> Snapshot<T> {
    pub fn from_entries(entries: Vec<T>) -> Self {
        let mut by_name = HashMap::new();
        let mut by_issn = HashMap::new();
        for entry in entries {
            if let Some(issn) = entry.issn() {
                by_issn.insert(issn.to_uppercase(), entry.clone());
            }
            by_name.insert(normalize_name(entry.name()), entry);
        }
        Self { by_name, by_issn }
    }

    /// Look up an identity, trying ISSN first, then normalized name.
    pub fn get(&self, identity: &NormalizedIdentity) -> Option<(&T, MatchMethod)> {
        if let Some(issn) = &identity.issn {
            if let Some(entry) = self.by_issn.get(issn) {
                return Some((entry, MatchMethod::Issn));
            }
        }
        self.by_name
            .get(&identity.normalized_name)
            .map(|entry| (entry, MatchMethod::Name))
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}

impl<T: Keyed + Clone + DeserializeOwned> Snapshot<T> {
    /// Load a JSON snapshot file written by an ETL job (a JSON array of entries).
    pub fn load_json(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let entries: Vec<T> = serde_json::from_str(&raw)?;
        info!(path = %path.display(), entries = entries.len(), "Loaded snapshot");
        Ok(Self::from_entries(entries))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::normalize;
    use std::io::Write;

    fn snapshot() -> Snapshot<ListEntry> {
        Snapshot::from_entries(vec![
            ListEntry {
                name: "Journal of Chemistry".to_string(),
                issn: Some("2049-3630".to_string()),
                note: None,
            },
            ListEntry {
                name: "Annals of Medicine".to_string(),
                issn: None,
                note: Some("hijacked".to_string()),
            },
        ])
    }

    #[test]
    fn test_issn_match_preferred_over_name() {
        let snap = snapshot();
        let (id, _) = normalize("Totally Different Name", Some("2049-3630")).unwrap();
        let (entry, method) = snap.get(&id).expect("should match by issn");
        assert_eq!(entry.name, "Journal of Chemistry");
        assert_eq!(method, MatchMethod::Issn);
    }

    #[test]
    fn test_name_match_uses_normalization() {
        let snap = snapshot();
        let (id, _) = normalize("  ANNALS OF MEDICINE!! ", None).unwrap();
        let (entry, method) = snap.get(&id).expect("should match by name");
        assert_eq!(entry.note.as_deref(), Some("hijacked"));
        assert_eq!(method, MatchMethod::Name);
    }

    #[test]
    fn test_miss_returns_none() {
        let snap = snapshot();
        let (id, _) = normalize("Unlisted Venue", None).unwrap();
        assert!(snap.get(&id).is_none());
    }

    #[test]
    fn test_load_json_snapshot() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        write!(
            file,
            r#"[{{"name": "Fake Science Letters", "issn": "0028-0836"}}]"#
        )
        .expect("write");

        let snap: Snapshot<ListEntry> = Snapshot::load_json(file.path()).expect("load");
        assert_eq!(snap.len(), 1);
        let (id, _) = normalize("fake science letters", None).unwrap();
        assert!(snap.get(&id).is_some());
    }
}
