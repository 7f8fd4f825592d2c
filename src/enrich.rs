//! Rate-context enrichment for count-bearing quality indicators.
//!
//! Absolute retraction counts mean little without volume: 25 retractions is
//! catastrophic for a venue publishing 500 papers and noise for one
//! publishing 400k. The enricher converts counts into rates via an injected
//! publication-volume lookup and falls back to fixed count thresholds when no
//! volume data is available. Volume failures never propagate; enrichment
//! fails open.

use crate::backends::retraction::{META_RECENT_RETRACTIONS, META_TOTAL_RETRACTIONS};
use crate::evidence::Evidence;
use crate::identity::NormalizedIdentity;
use async_trait::async_trait;
use serde::Serialize;
use tracing::debug;

/// Discrete risk level derived from a retraction rate or count.
///
/// Ordered so that tier comparisons read naturally (`tier >= Moderate`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskTier {
    Note,
    Low,
    Moderate,
    High,
    Critical,
}

impl RiskTier {
    /// Tiers that count as "high-risk" for cross-validation
    pub fn is_high_risk(&self) -> bool {
        *self >= RiskTier::Moderate
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskTier::Note => "NOTE",
            RiskTier::Low => "LOW",
            RiskTier::Moderate => "MODERATE",
            RiskTier::High => "HIGH",
            RiskTier::Critical => "CRITICAL",
        }
    }
}

/// Rate tier thresholds, percent of overall publication volume
const RATE_TIERS: &[(f64, RiskTier)] = &[
    (1.0, RiskTier::Critical),
    (0.3, RiskTier::High),
    (0.15, RiskTier::Moderate),
    (0.08, RiskTier::Low),
];

/// Count fallback thresholds: (total, recent) minimums per tier
const COUNT_TIERS: &[(u64, u64, RiskTier)] = &[
    (21, 10, RiskTier::Critical),
    (11, 5, RiskTier::High),
    (6, 3, RiskTier::Moderate),
];

/// LOW requires this many total retractions (no recent-count shortcut)
const LOW_TOTAL_MIN: u64 = 3;

/// External publication-volume collaborator.
///
/// Network-backed implementations apply their own cache/TTL and surface every
/// failure as `None`; the core never sees a volume error.
#[async_trait]
pub trait PublicationLookup: Send + Sync {
    async fn publication_count(&self, identity: &NormalizedIdentity) -> Option<u64>;
}

/// Volume lookup that never has data; count-threshold fallback always applies.
///
/// Used for offline runs and as a test stand-in.
pub struct NullVolume;

#[async_trait]
impl PublicationLookup for NullVolume {
    async fn publication_count(&self, _identity: &NormalizedIdentity) -> Option<u64> {
        None
    }
}

/// Transient rate context for one count-bearing evidence record.
///
/// Discarded once its tier has been folded into the assessment.
#[derive(Debug, Clone, Serialize)]
pub struct RateContext {
    pub total_count: u64,
    pub recent_count: u64,
    pub publication_count: Option<u64>,
    /// Overall retraction rate, percent of publication volume
    pub rate_overall: Option<f64>,
    /// Recent-window retraction rate, percent of publication volume
    pub rate_recent: Option<f64>,
}

impl RateContext {
    /// Build from raw counts plus an optional publication volume.
    pub fn new(total_count: u64, recent_count: u64, publication_count: Option<u64>) -> Self {
        let rate = |count: u64| {
            publication_count
                .filter(|volume| *volume > 0)
                .map(|volume| count as f64 / volume as f64 * 100.0)
        };
        Self {
            total_count,
            recent_count,
            publication_count,
            rate_overall: rate(total_count),
            rate_recent: rate(recent_count),
        }
    }

    /// Resolve the risk tier: rate thresholds when volume is known,
    /// count thresholds otherwise. `None` means no measurable risk.
    pub fn tier(&self) -> Option<RiskTier> {
        if let Some(rate) = self.rate_overall {
            for (floor, tier) in RATE_TIERS {
                if rate >= *floor {
                    return Some(*tier);
                }
            }
            return (rate > 0.0).then_some(RiskTier::Note);
        }

        for (total_min, recent_min, tier) in COUNT_TIERS {
            if self.total_count >= *total_min || self.recent_count >= *recent_min {
                return Some(*tier);
            }
        }
        if self.total_count >= LOW_TOTAL_MIN {
            return Some(RiskTier::Low);
        }
        (self.total_count > 0).then_some(RiskTier::Note)
    }
}

/// Pull retraction counts out of a quality-indicator evidence record.
///
/// `None` when the record carries no count metadata (the reconciler treats
/// that as malformed and warns).
pub fn counts_from(evidence: &Evidence) -> Option<(u64, u64)> {
    let total = evidence.metadata.get(META_TOTAL_RETRACTIONS)?.as_u64()?;
    let recent = evidence
        .metadata
        .get(META_RECENT_RETRACTIONS)
        .and_then(|v| v.as_u64())
        .unwrap_or(0);
    Some((total, recent))
}

/// Enrich one count-bearing evidence record with publication-volume context.
///
/// Fails open: a lookup miss just leaves the rates unset and tier resolution
/// falls back to count thresholds.
pub async fn enrich(
    evidence: &Evidence,
    identity: &NormalizedIdentity,
    lookup: &dyn PublicationLookup,
) -> Option<RateContext> {
    let (total, recent) = counts_from(evidence)?;
    let volume = lookup.publication_count(identity).await;
    if volume.is_none() {
        debug!(
            source = %evidence.source_id,
            "No publication volume, falling back to count thresholds"
        );
    }
    Some(RateContext::new(total, recent, volume))
}
