//! Binary membership-list backend.
//!
//! Wraps one predatory or vetted list snapshot. A hit classifies the venue
//! directly (the evidence kind is the backend's configured kind); ISSN
//! matches carry higher confidence than normalized-name matches.

use super::{ISSN_MATCH_CONFIDENCE, NAME_MATCH_CONFIDENCE};
use crate::backend::Backend;
use crate::error::{BackendError, GuardError, Result};
use crate::evidence::{Evidence, EvidenceKind};
use crate::identity::NormalizedIdentity;
use crate::store::{ListEntry, MatchMethod, Snapshot};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::debug;

/// Backend over a binary (predatory or vetted) list snapshot.
pub struct BinaryListBackend {
    source_id: String,
    kind: EvidenceKind,
    weight: f64,
    snapshot: Arc<Snapshot<ListEntry>>,
}

impl BinaryListBackend {
    /// `kind` must be [`EvidenceKind::Predatory`] or [`EvidenceKind::Legitimate`].
    pub fn new(
        source_id: &str,
        kind: EvidenceKind,
        weight: f64,
        snapshot: Arc<Snapshot<ListEntry>>,
    ) -> Result<Self> {
        if !matches!(kind, EvidenceKind::Predatory | EvidenceKind::Legitimate) {
            return Err(GuardError::Config(format!(
                "binary list backend '{}' requires a binary evidence kind, got {:?}",
                source_id, kind
            )));
        }
        if !(0.0..=1.0).contains(&weight) || weight == 0.0 {
            return Err(GuardError::Config(format!(
                "backend '{}' weight {} outside (0, 1]",
                source_id, weight
            )));
        }
        Ok(Self {
            source_id: source_id.to_string(),
            kind,
            weight,
            snapshot,
        })
    }
}

#[async_trait]
impl Backend for BinaryListBackend {
    fn source_id(&self) -> &str {
        &self.source_id
    }

    fn evidence_kind(&self) -> EvidenceKind {
        self.kind
    }

    fn weight(&self) -> f64 {
        self.weight
    }

    async fn lookup(
        &self,
        identity: &NormalizedIdentity,
    ) -> std::result::Result<Option<Evidence>, BackendError> {
        let Some((entry, method)) = self.snapshot.get(identity) else {
            debug!(source = %self.source_id, name = %identity.normalized_name, "No list match");
            return Ok(None);
        };

        let confidence = match method {
            MatchMethod::Issn => ISSN_MATCH_CONFIDENCE,
            MatchMethod::Name => NAME_MATCH_CONFIDENCE,
        };

        let mut metadata = Map::new();
        metadata.insert(
            "matched_by".to_string(),
            Value::String(method.as_str().to_string()),
        );
        if let Some(note) = &entry.note {
            metadata.insert("note".to_string(), Value::String(note.clone()));
        }

        debug!(
            source = %self.source_id,
            matched = %entry.name,
            method = method.as_str(),
            "List match"
        );

        Ok(Some(Evidence {
            source_id: self.source_id.clone(),
            kind: self.kind,
            weight: self.weight,
            confidence,
            metadata,
            matched_identity: entry.name.clone(),
        }))
    }
}
