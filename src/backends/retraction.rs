//! Retraction-count backend (quality indicator).
//!
//! Never classifies a venue on its own; it attaches raw retraction counts as
//! metadata and the reconciler interprets them, optionally rate-enriched with
//! publication volume.

use super::{ISSN_MATCH_CONFIDENCE, NAME_MATCH_CONFIDENCE};
use crate::backend::Backend;
use crate::error::{BackendError, GuardError, Result};
use crate::evidence::{Evidence, EvidenceKind};
use crate::identity::NormalizedIdentity;
use crate::store::{MatchMethod, RetractionRecord, Snapshot};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::sync::Arc;

/// Metadata key carrying the all-time retraction count
pub const META_TOTAL_RETRACTIONS: &str = "total_retractions";

/// Metadata key carrying the recent-window retraction count
pub const META_RECENT_RETRACTIONS: &str = "recent_retractions";

/// Backend over a retraction-count snapshot.
pub struct RetractionBackend {
    source_id: String,
    weight: f64,
    snapshot: Arc<Snapshot<RetractionRecord>>,
}

impl RetractionBackend {
    pub fn new(
        source_id: &str,
        weight: f64,
        snapshot: Arc<Snapshot<RetractionRecord>>,
    ) -> Result<Self> {
        if !(0.0..=1.0).contains(&weight) || weight == 0.0 {
            return Err(GuardError::Config(format!(
                "backend '{}' weight {} outside (0, 1]",
                source_id, weight
            )));
        }
        Ok(Self {
            source_id: source_id.to_string(),
            weight,
            snapshot,
        })
    }
}

#[async_trait]
impl Backend for RetractionBackend {
    fn source_id(&self) -> &str {
        &self.source_id
    }

    fn evidence_kind(&self) -> EvidenceKind {
        EvidenceKind::QualityIndicator
    }

    fn weight(&self) -> f64 {
        self.weight
    }

    async fn lookup(
        &self,
        identity: &NormalizedIdentity,
    ) -> std::result::Result<Option<Evidence>, BackendError> {
        let Some((record, method)) = self.snapshot.get(identity) else {
            return Ok(None);
        };

        let confidence = match method {
            MatchMethod::Issn => ISSN_MATCH_CONFIDENCE,
            MatchMethod::Name => NAME_MATCH_CONFIDENCE,
        };

        let mut metadata = Map::new();
        metadata.insert(
            META_TOTAL_RETRACTIONS.to_string(),
            Value::from(record.total),
        );
        metadata.insert(
            META_RECENT_RETRACTIONS.to_string(),
            Value::from(record.recent),
        );
        metadata.insert(
            "matched_by".to_string(),
            Value::String(method.as_str().to_string()),
        );

        Ok(Some(Evidence {
            source_id: self.source_id.clone(),
            kind: EvidenceKind::QualityIndicator,
            weight: self.weight,
            confidence,
            metadata,
            matched_identity: record.name.clone(),
        }))
    }
}
