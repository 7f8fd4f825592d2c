//! Evidence records and per-backend dispatch outcomes.
//!
//! An [`Evidence`] is produced by exactly one backend per lookup and never
//! mutated afterwards; ownership flows backend → dispatcher → reconciler.
//! A [`BackendOutcome`] records success, miss, fault, or timeout uniformly so
//! the reconciler can report partial-data conditions.

use crate::error::BackendError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::Duration;

/// Category tag distinguishing binary classifications from advisory signals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvidenceKind {
    /// Binary classification: the venue appears on a predatory list
    Predatory,
    /// Binary classification: the venue appears on a vetted/legitimate list
    Legitimate,
    /// Advisory signal (e.g. retraction counts); never classifies on its own
    QualityIndicator,
    /// Placement on an allow-listed ranked list, treated as legitimate signal
    RankedList,
}

/// One piece of evidence from one backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Evidence {
    /// Backend that produced this record
    pub source_id: String,
    pub kind: EvidenceKind,
    /// Source trust weight in (0, 1]
    pub weight: f64,
    /// Match confidence in [0, 1]
    pub confidence: f64,
    /// Source-specific payload (rank label, retraction counts, match method)
    pub metadata: Map<String, Value>,
    /// The entry the backend actually matched, for audit
    pub matched_identity: String,
}

impl Evidence {
    /// Weight and confidence inside their declared ranges.
    ///
    /// Malformed records are dropped by the reconciler with a warning rather
    /// than failing the assessment.
    pub fn is_well_formed(&self) -> bool {
        self.weight > 0.0 && self.weight <= 1.0 && (0.0..=1.0).contains(&self.confidence)
    }
}

/// Fault category on a [`BackendOutcome`], mirrored from [`BackendError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendErrorKind {
    Timeout,
    Unavailable,
    MalformedData,
}

impl From<&BackendError> for BackendErrorKind {
    fn from(err: &BackendError) -> Self {
        match err {
            BackendError::Timeout(_) => BackendErrorKind::Timeout,
            BackendError::Unavailable(_) => BackendErrorKind::Unavailable,
            BackendError::MalformedData(_) => BackendErrorKind::MalformedData,
        }
    }
}

/// Result of querying one backend during one dispatch.
///
/// Exactly one per registered backend per dispatch, in registry order.
/// `evidence` and `error` are never both set: a miss is `(None, None)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendOutcome {
    pub source_id: String,
    pub evidence: Option<Evidence>,
    pub error: Option<BackendErrorKind>,
    /// Wall time spent on this backend's lookup
    pub elapsed: Duration,
}

impl BackendOutcome {
    pub fn success(source_id: &str, evidence: Option<Evidence>, elapsed: Duration) -> Self {
        Self {
            source_id: source_id.to_string(),
            evidence,
            error: None,
            elapsed,
        }
    }

    pub fn failure(source_id: &str, kind: BackendErrorKind, elapsed: Duration) -> Self {
        Self {
            source_id: source_id.to_string(),
            evidence: None,
            error: Some(kind),
            elapsed,
        }
    }
}
