//! Ranked-list backend (e.g. CORE conference rankings).
//!
//! Only allow-listed rank labels count as legitimate signal; anything else is
//! dropped as a miss. The rank scales the backend weight rather than acting
//! as a binary cutoff, so an "A*" placement carries more weight than a "C".

use super::{ISSN_MATCH_CONFIDENCE, NAME_MATCH_CONFIDENCE};
use crate::backend::Backend;
use crate::error::{BackendError, GuardError, Result};
use crate::evidence::{Evidence, EvidenceKind};
use crate::identity::NormalizedIdentity;
use crate::store::{MatchMethod, RankEntry, Snapshot};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::debug;

/// Default rank-label weight multipliers, best rank first.
pub const DEFAULT_RANK_MULTIPLIERS: &[(&str, f64)] = &[
    ("A*", 1.0),
    ("A", 0.9),
    ("B", 0.75),
    ("C", 0.6),
];

/// Backend over a ranked-list snapshot with an allow-listed label set.
pub struct RankedListBackend {
    source_id: String,
    weight: f64,
    /// Accepted labels and their weight multipliers; other labels are misses
    multipliers: Vec<(String, f64)>,
    snapshot: Arc<Snapshot<RankEntry>>,
}

impl RankedListBackend {
    pub fn new(
        source_id: &str,
        weight: f64,
        snapshot: Arc<Snapshot<RankEntry>>,
    ) -> Result<Self> {
        Self::with_multipliers(
            source_id,
            weight,
            DEFAULT_RANK_MULTIPLIERS
                .iter()
                .map(|(label, m)| (label.to_string(), *m))
                .collect(),
            snapshot,
        )
    }

    pub fn with_multipliers(
        source_id: &str,
        weight: f64,
        multipliers: Vec<(String, f64)>,
        snapshot: Arc<Snapshot<RankEntry>>,
    ) -> Result<Self> {
        if !(0.0..=1.0).contains(&weight) || weight == 0.0 {
            return Err(GuardError::Config(format!(
                "backend '{}' weight {} outside (0, 1]",
                source_id, weight
            )));
        }
        if multipliers.iter().any(|(_, m)| *m <= 0.0 || *m > 1.0) {
            return Err(GuardError::Config(format!(
                "backend '{}' has a rank multiplier outside (0, 1]",
                source_id
            )));
        }
        Ok(Self {
            source_id: source_id.to_string(),
            weight,
            multipliers,
            snapshot,
        })
    }

    fn multiplier_for(&self, label: &str) -> Option<f64> {
        self.multipliers
            .iter()
            .find(|(accepted, _)| accepted.eq_ignore_ascii_case(label))
            .map(|(_, m)| *m)
    }
}

#[async_trait]
impl Backend for RankedListBackend {
    fn source_id(&self) -> &str {
        &self.source_id
    }

    fn evidence_kind(&self) -> EvidenceKind {
        EvidenceKind::RankedList
    }

    fn weight(&self) -> f64 {
        self.weight
    }

    async fn lookup(
        &self,
        identity: &NormalizedIdentity,
    ) -> std::result::Result<Option<Evidence>, BackendError> {
        let Some((entry, method)) = self.snapshot.get(identity) else {
            return Ok(None);
        };

        let Some(multiplier) = self.multiplier_for(&entry.rank) else {
            debug!(
                source = %self.source_id,
                rank = %entry.rank,
                "Rank label not allow-listed, dropping"
            );
            return Ok(None);
        };

        let confidence = match method {
            MatchMethod::Issn => ISSN_MATCH_CONFIDENCE,
            MatchMethod::Name => NAME_MATCH_CONFIDENCE,
        };

        let mut metadata = Map::new();
        metadata.insert("rank".to_string(), Value::String(entry.rank.clone()));
        metadata.insert(
            "matched_by".to_string(),
            Value::String(method.as_str().to_string()),
        );

        Ok(Some(Evidence {
            source_id: self.source_id.clone(),
            kind: EvidenceKind::RankedList,
            weight: self.weight * multiplier,
            confidence,
            metadata,
            matched_identity: entry.name.clone(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::normalize;

    fn backend() -> RankedListBackend {
        let snapshot = Arc::new(Snapshot::from_entries(vec![
            RankEntry {
                name: "Conference on Computer Vision".to_string(),
                issn: None,
                rank: "A*".to_string(),
            },
            RankEntry {
                name: "Workshop on Applied Heuristics".to_string(),
                issn: None,
                rank: "Unranked".to_string(),
            },
            RankEntry {
                name: "Symposium on Data Systems".to_string(),
                issn: None,
                rank: "C".to_string(),
            },
        ]));
        RankedListBackend::new("core-rankings", 0.8, snapshot).expect("valid backend")
    }

    #[tokio::test]
    async fn test_top_rank_keeps_full_backend_weight() {
        let backend = backend();
        let (id, _) = normalize("Conference on Computer Vision", None).unwrap();
        let ev = backend.lookup(&id).await.unwrap().expect("hit");
        assert_eq!(ev.kind, EvidenceKind::RankedList);
        assert!((ev.weight - 0.8).abs() < 1e-9);
        assert_eq!(ev.metadata["rank"], "A*");
    }

    #[tokio::test]
    async fn test_low_rank_scales_weight_down() {
        let backend = backend();
        let (id, _) = normalize("Symposium on Data Systems", None).unwrap();
        let ev = backend.lookup(&id).await.unwrap().expect("hit");
        assert!((ev.weight - 0.8 * 0.6).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_unlisted_label_is_a_miss() {
        let backend = backend();
        let (id, _) = normalize("Workshop on Applied Heuristics", None).unwrap();
        assert!(backend.lookup(&id).await.unwrap().is_none());
    }
}
