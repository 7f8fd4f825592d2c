//! The assessment entry point: normalize, dispatch, enrich, reconcile.
//!
//! The one call the presentation layer consumes. Only identity validation can
//! fail; every backend or enrichment problem is folded into the result as an
//! outcome, reason, or warning.

use crate::assessment::AssessmentResult;
use crate::backend::{RegisteredBackend, DEFAULT_GLOBAL_TIMEOUT};
use crate::dispatch::dispatch;
use crate::enrich::{enrich, PublicationLookup, RateContext};
use crate::error::Result;
use crate::evidence::EvidenceKind;
use crate::identity::normalize;
use crate::score::reconcile;
use futures::future::join_all;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::info;

/// Configured assessment engine: backend registry plus volume lookup.
///
/// Built once at startup; safe to share and to run concurrent assessments
/// against (each dispatch is independent).
pub struct Assessor {
    backends: Vec<RegisteredBackend>,
    volume: Arc<dyn PublicationLookup>,
    global_timeout: Duration,
}

impl Assessor {
    pub fn new(backends: Vec<RegisteredBackend>, volume: Arc<dyn PublicationLookup>) -> Self {
        Self {
            backends,
            volume,
            global_timeout: DEFAULT_GLOBAL_TIMEOUT,
        }
    }

    pub fn with_global_timeout(mut self, global_timeout: Duration) -> Self {
        self.global_timeout = global_timeout;
        self
    }

    pub fn backend_count(&self) -> usize {
        self.backends.len()
    }

    /// Assess one venue. Fails only on invalid input identity.
    pub async fn assess(&self, raw_name: &str, issn: Option<&str>) -> Result<AssessmentResult> {
        let started = Instant::now();
        let (identity, warnings) = normalize(raw_name, issn)?;

        info!(
            name = %identity.normalized_name,
            issn = identity.issn.as_deref().unwrap_or("-"),
            backends = self.backends.len(),
            "Assessing venue"
        );

        let outcomes = dispatch(&identity, &self.backends, self.global_timeout).await;

        // Rate-enrich count-bearing quality indicators before scoring;
        // the volume lookup fails open so this can only add context
        let enriched = join_all(
            outcomes
                .iter()
                .filter_map(|o| o.evidence.as_ref())
                .filter(|e| e.kind == EvidenceKind::QualityIndicator)
                .map(|evidence| {
                    let identity = &identity;
                    async move {
                        let context = enrich(evidence, identity, self.volume.as_ref()).await;
                        (evidence.source_id.clone(), context)
                    }
                }),
        )
        .await;
        let mut rate_contexts: HashMap<String, RateContext> = HashMap::new();
        for (source_id, context) in enriched {
            if let Some(context) = context {
                rate_contexts.insert(source_id, context);
            }
        }

        let reconciliation = reconcile(&outcomes, &rate_contexts, warnings);

        let result = AssessmentResult::new(
            identity,
            reconciliation.verdict,
            reconciliation.confidence,
            reconciliation.reasons,
            reconciliation.warnings,
            reconciliation.contributing_evidence,
            reconciliation.failed_backends,
            started.elapsed(),
        );

        info!(
            verdict = result.verdict.as_str(),
            confidence = result.confidence,
            failed_backends = result.failed_backends.len(),
            elapsed_ms = result.elapsed.as_millis() as u64,
            "Assessment complete"
        );

        Ok(result)
    }
}
