//! The immutable assessment output record.

use crate::evidence::Evidence;
use crate::identity::NormalizedIdentity;
use serde::Serialize;
use std::time::Duration;

/// Final coarse classification of an assessed identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Verdict {
    Legitimate,
    Predatory,
    /// No backend recognized the venue (distinct from "could not check")
    Unknown,
    /// Every backend failed, so nothing could be checked
    InsufficientData,
}

impl Verdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::Legitimate => "LEGITIMATE",
            Verdict::Predatory => "PREDATORY",
            Verdict::Unknown => "UNKNOWN",
            Verdict::InsufficientData => "INSUFFICIENT_DATA",
        }
    }
}

/// One assessment's complete, immutable output.
///
/// `contributing_evidence` is the exact evidence set that influenced the
/// verdict, confidence, or warnings, for audit. `failed_backends` lets the
/// caller tell "no evidence found" apart from "could not check".
#[derive(Debug, Clone, Serialize)]
pub struct AssessmentResult {
    pub identity: NormalizedIdentity,
    pub verdict: Verdict,
    /// Aggregate confidence in [0, 1]
    pub confidence: f64,
    /// Human-readable reasoning, deterministic order
    pub reasons: Vec<String>,
    pub warnings: Vec<String>,
    pub contributing_evidence: Vec<Evidence>,
    /// Source ids of backends that errored or timed out, registry order
    pub failed_backends: Vec<String>,
    pub elapsed: Duration,
}

impl AssessmentResult {
    /// Construct with the confidence invariant enforced (clamped into [0, 1]).
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        identity: NormalizedIdentity,
        verdict: Verdict,
        confidence: f64,
        reasons: Vec<String>,
        warnings: Vec<String>,
        contributing_evidence: Vec<Evidence>,
        failed_backends: Vec<String>,
        elapsed: Duration,
    ) -> Self {
        debug_assert!(
            (0.0..=1.0).contains(&confidence),
            "confidence {} outside [0, 1]",
            confidence
        );
        Self {
            identity,
            verdict,
            confidence: confidence.clamp(0.0, 1.0),
            reasons,
            warnings,
            contributing_evidence,
            failed_backends,
            elapsed,
        }
    }
}
