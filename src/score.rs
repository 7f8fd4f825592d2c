//! Evidence reconciliation and confidence scoring.
//!
//! Runs once per assessment, synchronously, over the dispatcher's outcomes:
//! partition evidence by kind, pick a tentative verdict, combine confidences,
//! cross-validate against quality indicators, and emit reasons in a fixed
//! order (binary classifications, ranked lists, quality cross-validation,
//! backend failures) so identical inputs always produce identical output.
//!
//! Aggregate confidence uses the noisy-OR combination over evidence in the
//! verdict direction: `1 - prod(1 - weight_i * confidence_i)`. Corroborating
//! sources can only raise it and it never exceeds 1.0.

use crate::assessment::Verdict;
use crate::enrich::RateContext;
use crate::evidence::{BackendOutcome, Evidence, EvidenceKind};
use std::collections::HashMap;
use tracing::{debug, warn};

/// Minimum confidence for predatory evidence to set the verdict.
///
/// Tuning parameter, not a structural invariant.
pub const PREDATORY_ACCEPT_FLOOR: f64 = 0.5;

/// Confidence added when a high-risk quality indicator corroborates a
/// predatory classification. Tuning parameter.
pub const CORROBORATION_BOOST: f64 = 0.05;

/// Everything the reconciler decides; the assessor folds this into an
/// [`AssessmentResult`](crate::assessment::AssessmentResult) with timing.
#[derive(Debug)]
pub struct Reconciliation {
    pub verdict: Verdict,
    pub confidence: f64,
    pub reasons: Vec<String>,
    pub warnings: Vec<String>,
    pub contributing_evidence: Vec<Evidence>,
    pub failed_backends: Vec<String>,
}

/// Combine backend outcomes into one verdict with confidence and reasoning.
///
/// `rate_contexts` maps quality-indicator source ids to their enriched rate
/// context. `prior_warnings` carries non-fatal normalization warnings through
/// to the result. Never fails on malformed individual evidence; such records
/// are dropped with a warning.
pub fn reconcile(
    outcomes: &[BackendOutcome],
    rate_contexts: &HashMap<String, RateContext>,
    prior_warnings: Vec<String>,
) -> Reconciliation {
    let mut warnings = prior_warnings;

    // Partition well-formed evidence by kind, keeping outcome order
    let mut predatory = Vec::new();
    let mut legitimate = Vec::new();
    let mut ranked = Vec::new();
    let mut quality = Vec::new();
    for outcome in outcomes {
        let Some(evidence) = &outcome.evidence else {
            continue;
        };
        if !evidence.is_well_formed() {
            warn!(source = %evidence.source_id, "Dropping malformed evidence");
            warnings.push(format!(
                "{}: malformed evidence record dropped (weight/confidence out of range)",
                evidence.source_id
            ));
            continue;
        }
        match evidence.kind {
            EvidenceKind::Predatory => predatory.push(evidence),
            EvidenceKind::Legitimate => legitimate.push(evidence),
            EvidenceKind::RankedList => ranked.push(evidence),
            EvidenceKind::QualityIndicator => quality.push(evidence),
        }
    }

    let failed_backends: Vec<String> = outcomes
        .iter()
        .filter(|o| o.error.is_some())
        .map(|o| o.source_id.clone())
        .collect();

    // Tentative verdict: accepted predatory evidence wins over legitimate
    // signal; quality indicators alone never classify
    let accepted_predatory: Vec<&Evidence> = predatory
        .iter()
        .copied()
        .filter(|e| e.confidence >= PREDATORY_ACCEPT_FLOOR)
        .collect();
    let has_evidence =
        !predatory.is_empty() || !legitimate.is_empty() || !ranked.is_empty() || !quality.is_empty();

    let verdict = if !accepted_predatory.is_empty() {
        Verdict::Predatory
    } else if !legitimate.is_empty() || !ranked.is_empty() {
        Verdict::Legitimate
    } else if !has_evidence && !failed_backends.is_empty() && failed_backends.len() == outcomes.len()
    {
        Verdict::InsufficientData
    } else {
        Verdict::Unknown
    };

    let mut confidence = match verdict {
        Verdict::Predatory => noisy_or(&predatory),
        Verdict::Legitimate => {
            let direction: Vec<&Evidence> =
                legitimate.iter().chain(ranked.iter()).copied().collect();
            noisy_or(&direction)
        }
        Verdict::Unknown | Verdict::InsufficientData => 0.0,
    };

    let mut reasons = Vec::new();
    let mut contributing: Vec<Evidence> = Vec::new();

    // 1. Binary classifications
    for evidence in &predatory {
        if evidence.confidence >= PREDATORY_ACCEPT_FLOOR {
            reasons.push(format!(
                "{}: listed as predatory (matched '{}', confidence {:.2})",
                evidence.source_id, evidence.matched_identity, evidence.confidence
            ));
        } else {
            reasons.push(format!(
                "{}: predatory signal below acceptance floor (confidence {:.2}), not decisive",
                evidence.source_id, evidence.confidence
            ));
        }
        contributing.push((*evidence).clone());
    }
    for evidence in &legitimate {
        if verdict == Verdict::Predatory {
            reasons.push(format!(
                "{}: conflicting legitimate listing (matched '{}', confidence {:.2}) outweighed by predatory evidence",
                evidence.source_id, evidence.matched_identity, evidence.confidence
            ));
        } else {
            reasons.push(format!(
                "{}: listed as legitimate (matched '{}', confidence {:.2})",
                evidence.source_id, evidence.matched_identity, evidence.confidence
            ));
        }
        contributing.push((*evidence).clone());
    }

    // 2. Ranked-list evidence
    for evidence in &ranked {
        let rank = evidence
            .metadata
            .get("rank")
            .and_then(|v| v.as_str())
            .unwrap_or("?");
        if verdict == Verdict::Predatory {
            reasons.push(format!(
                "{}: conflicting ranked-list placement '{}' outweighed by predatory evidence",
                evidence.source_id, rank
            ));
        } else {
            reasons.push(format!(
                "{}: ranked '{}' (effective weight {:.2})",
                evidence.source_id, rank, evidence.weight
            ));
        }
        contributing.push((*evidence).clone());
    }

    // 3. Quality-indicator cross-validation
    for evidence in &quality {
        let Some(context) = rate_contexts.get(&evidence.source_id) else {
            warnings.push(format!(
                "{}: quality indicator carries no usable count data, ignored",
                evidence.source_id
            ));
            continue;
        };
        contributing.push((*evidence).clone());

        let Some(tier) = context.tier() else {
            debug!(source = %evidence.source_id, "No measurable retraction risk");
            continue;
        };

        let rate_note = match context.rate_overall {
            Some(rate) => format!("{:.3}% of {} publications", rate, context.publication_count.unwrap_or(0)),
            None => format!("{} total, {} recent (no volume data)", context.total_count, context.recent_count),
        };

        if tier.is_high_risk() {
            match verdict {
                Verdict::Predatory => {
                    confidence = (confidence + CORROBORATION_BOOST).min(1.0);
                    reasons.push(format!(
                        "{}: retraction risk {} ({}) corroborates predatory classification",
                        evidence.source_id,
                        tier.as_str(),
                        rate_note
                    ));
                }
                Verdict::Legitimate => {
                    // Quality indicators never override a binary classification
                    warnings.push(format!(
                        "{}: elevated retraction risk {} ({}) despite legitimate listing",
                        evidence.source_id,
                        tier.as_str(),
                        rate_note
                    ));
                }
                Verdict::Unknown | Verdict::InsufficientData => {
                    warnings.push(format!(
                        "{}: elevated retraction risk {} ({}) for an otherwise unrecognized venue, caution advised",
                        evidence.source_id,
                        tier.as_str(),
                        rate_note
                    ));
                }
            }
        } else {
            reasons.push(format!(
                "{}: retraction activity {} ({}) within normal range",
                evidence.source_id,
                tier.as_str(),
                rate_note
            ));
        }
    }

    // 4. Backend-failure notices
    for outcome in outcomes {
        if let Some(kind) = outcome.error {
            reasons.push(format!("{}: backend failed ({:?}), not consulted", outcome.source_id, kind));
        }
    }

    debug!(
        verdict = verdict.as_str(),
        confidence = confidence,
        contributing = contributing.len(),
        failed = failed_backends.len(),
        "Reconciliation complete"
    );

    Reconciliation {
        verdict,
        confidence,
        reasons,
        warnings,
        contributing_evidence: contributing,
        failed_backends,
    }
}

/// Noisy-OR combination of `weight * confidence` contributions.
///
/// Monotonically non-decreasing in the number of corroborating sources,
/// capped at 1.0.
fn noisy_or(evidence: &[&Evidence]) -> f64 {
    if evidence.is_empty() {
        return 0.0;
    }
    let miss_product: f64 = evidence
        .iter()
        .map(|e| 1.0 - (e.weight * e.confidence).clamp(0.0, 1.0))
        .product();
    (1.0 - miss_product).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::retraction::{META_RECENT_RETRACTIONS, META_TOTAL_RETRACTIONS};
    use crate::evidence::BackendErrorKind;
    use serde_json::{Map, Value};
    use std::time::Duration;

    fn evidence(source: &str, kind: EvidenceKind, weight: f64, confidence: f64) -> Evidence {
        Evidence {
            source_id: source.to_string(),
            kind,
            weight,
            confidence,
            metadata: Map::new(),
            matched_identity: "venue".to_string(),
        }
    }

    fn success(source: &str, evidence: Option<Evidence>) -> BackendOutcome {
        BackendOutcome::success(source, evidence, Duration::from_millis(5))
    }

    fn failure(source: &str, kind: BackendErrorKind) -> BackendOutcome {
        BackendOutcome::failure(source, kind, Duration::from_millis(5))
    }

    fn retraction_evidence(source: &str, total: u64, recent: u64) -> Evidence {
        let mut metadata = Map::new();
        metadata.insert(META_TOTAL_RETRACTIONS.to_string(), Value::from(total));
        metadata.insert(META_RECENT_RETRACTIONS.to_string(), Value::from(recent));
        Evidence {
            source_id: source.to_string(),
            kind: EvidenceKind::QualityIndicator,
            weight: 0.7,
            confidence: 0.9,
            metadata,
            matched_identity: "venue".to_string(),
        }
    }

    #[test]
    fn test_single_legitimate_source_keeps_its_confidence() {
        // The reputable-journal scenario: predatory lists miss, one vetted
        // list hits at 0.95, retraction activity is NOTE-tier
        let retraction = retraction_evidence("retraction-watch", 153, 19);
        let outcomes = vec![
            success("predatory-list", None),
            success(
                "vetted-list",
                Some(evidence("vetted-list", EvidenceKind::Legitimate, 1.0, 0.95)),
            ),
            success("retraction-watch", Some(retraction)),
        ];
        let mut contexts = HashMap::new();
        contexts.insert(
            "retraction-watch".to_string(),
            RateContext::new(153, 19, Some(446_231)),
        );

        let rec = reconcile(&outcomes, &contexts, vec![]);
        assert_eq!(rec.verdict, Verdict::Legitimate);
        assert!((rec.confidence - 0.95).abs() < 1e-9);
        assert!(rec.warnings.is_empty());
        assert_eq!(rec.failed_backends.len(), 0);
        // vetted listing + within-normal-range retraction note
        assert!(rec.reasons[0].contains("vetted-list"));
    }

    #[test]
    fn test_binary_conflict_resolves_predatory_with_reason() {
        let outcomes = vec![
            success(
                "predatory-list",
                Some(evidence("predatory-list", EvidenceKind::Predatory, 1.0, 0.8)),
            ),
            success(
                "vetted-list",
                Some(evidence("vetted-list", EvidenceKind::Legitimate, 0.5, 0.6)),
            ),
        ];

        let rec = reconcile(&outcomes, &HashMap::new(), vec![]);
        assert_eq!(rec.verdict, Verdict::Predatory);
        assert!((rec.confidence - 0.8).abs() < 1e-9);
        assert!(rec
            .reasons
            .iter()
            .any(|r| r.contains("conflicting legitimate listing")));
        assert_eq!(rec.contributing_evidence.len(), 2);
    }

    #[test]
    fn test_high_risk_indicator_warns_but_never_downgrades_legitimate() {
        let outcomes = vec![
            success(
                "vetted-list",
                Some(evidence("vetted-list", EvidenceKind::Legitimate, 1.0, 0.9)),
            ),
            success("retraction-watch", Some(retraction_evidence("retraction-watch", 50, 10))),
        ];
        let mut contexts = HashMap::new();
        // 5% retraction rate at 1000 publications: CRITICAL
        contexts.insert(
            "retraction-watch".to_string(),
            RateContext::new(50, 10, Some(1000)),
        );

        let rec = reconcile(&outcomes, &contexts, vec![]);
        assert_eq!(rec.verdict, Verdict::Legitimate);
        assert!((rec.confidence - 0.9).abs() < 1e-9, "confidence must be unchanged");
        assert_eq!(rec.warnings.len(), 1);
        assert!(rec.warnings[0].contains("retraction"));
    }

    #[test]
    fn test_high_risk_indicator_boosts_predatory() {
        let outcomes = vec![
            success(
                "predatory-list",
                Some(evidence("predatory-list", EvidenceKind::Predatory, 1.0, 0.8)),
            ),
            success("retraction-watch", Some(retraction_evidence("retraction-watch", 25, 12))),
        ];
        let mut contexts = HashMap::new();
        contexts.insert("retraction-watch".to_string(), RateContext::new(25, 12, None));

        let rec = reconcile(&outcomes, &contexts, vec![]);
        assert_eq!(rec.verdict, Verdict::Predatory);
        assert!((rec.confidence - (0.8 + CORROBORATION_BOOST)).abs() < 1e-9);
        assert!(rec
            .reasons
            .iter()
            .any(|r| r.contains("corroborates predatory classification")));
    }

    #[test]
    fn test_quality_only_high_risk_stays_unknown_with_warning() {
        let outcomes = vec![
            success("predatory-list", None),
            success("retraction-watch", Some(retraction_evidence("retraction-watch", 30, 2))),
        ];
        let mut contexts = HashMap::new();
        contexts.insert("retraction-watch".to_string(), RateContext::new(30, 2, None));

        let rec = reconcile(&outcomes, &contexts, vec![]);
        assert_eq!(rec.verdict, Verdict::Unknown);
        assert_eq!(rec.confidence, 0.0);
        assert!(rec.warnings.iter().any(|w| w.contains("caution")));
    }

    #[test]
    fn test_more_corroboration_never_decreases_confidence() {
        let base = vec![success(
            "a",
            Some(evidence("a", EvidenceKind::Legitimate, 1.0, 0.9)),
        )];
        let rec_one = reconcile(&base, &HashMap::new(), vec![]);

        // A second corroborating source with much lower confidence
        let mut extended = base.clone();
        extended.push(success(
            "b",
            Some(evidence("b", EvidenceKind::Legitimate, 0.5, 0.3)),
        ));
        let rec_two = reconcile(&extended, &HashMap::new(), vec![]);

        assert_eq!(rec_two.verdict, Verdict::Legitimate);
        assert!(rec_two.confidence >= rec_one.confidence);
        assert!(rec_two.confidence <= 1.0);
    }

    #[test]
    fn test_all_backends_errored_is_insufficient_data() {
        let outcomes = vec![
            failure("a", BackendErrorKind::Timeout),
            failure("b", BackendErrorKind::Unavailable),
            failure("c", BackendErrorKind::MalformedData),
        ];

        let rec = reconcile(&outcomes, &HashMap::new(), vec![]);
        assert_eq!(rec.verdict, Verdict::InsufficientData);
        assert_eq!(rec.confidence, 0.0);
        assert_eq!(rec.failed_backends, vec!["a", "b", "c"]);
        assert_eq!(rec.reasons.len(), 3); // one failure notice each
    }

    #[test]
    fn test_all_misses_is_unknown_with_zero_confidence() {
        let outcomes = vec![success("a", None), success("b", None)];
        let rec = reconcile(&outcomes, &HashMap::new(), vec![]);
        assert_eq!(rec.verdict, Verdict::Unknown);
        assert_eq!(rec.confidence, 0.0);
        assert!(rec.failed_backends.is_empty());
        assert!(rec.contributing_evidence.is_empty());
    }

    #[test]
    fn test_partial_failure_still_classifies() {
        let outcomes = vec![
            success(
                "a",
                Some(evidence("a", EvidenceKind::Legitimate, 1.0, 0.9)),
            ),
            failure("b", BackendErrorKind::Timeout),
        ];

        let rec = reconcile(&outcomes, &HashMap::new(), vec![]);
        assert_eq!(rec.verdict, Verdict::Legitimate);
        assert_eq!(rec.failed_backends, vec!["b"]);
        // failure notice comes after the classification reason
        assert!(rec.reasons.last().map(|r| r.contains("backend failed")).unwrap_or(false));
    }

    #[test]
    fn test_malformed_evidence_dropped_with_warning() {
        let outcomes = vec![
            success(
                "bad",
                Some(evidence("bad", EvidenceKind::Predatory, 1.5, 0.9)),
            ),
            success(
                "good",
                Some(evidence("good", EvidenceKind::Legitimate, 1.0, 0.8)),
            ),
        ];

        let rec = reconcile(&outcomes, &HashMap::new(), vec![]);
        assert_eq!(rec.verdict, Verdict::Legitimate);
        assert!(rec.warnings.iter().any(|w| w.contains("malformed")));
        assert_eq!(rec.contributing_evidence.len(), 1);
    }

    #[test]
    fn test_below_floor_predatory_is_not_decisive() {
        let outcomes = vec![
            success(
                "weak",
                Some(evidence("weak", EvidenceKind::Predatory, 1.0, 0.3)),
            ),
            success(
                "vetted-list",
                Some(evidence("vetted-list", EvidenceKind::Legitimate, 1.0, 0.9)),
            ),
        ];

        let rec = reconcile(&outcomes, &HashMap::new(), vec![]);
        assert_eq!(rec.verdict, Verdict::Legitimate);
        assert!(rec
            .reasons
            .iter()
            .any(|r| r.contains("below acceptance floor")));
    }

    #[test]
    fn test_ranked_list_alone_classifies_legitimate() {
        let mut ranked = evidence("core", EvidenceKind::RankedList, 0.72, 0.85);
        ranked
            .metadata
            .insert("rank".to_string(), Value::String("A".to_string()));
        let outcomes = vec![success("core", Some(ranked))];

        let rec = reconcile(&outcomes, &HashMap::new(), vec![]);
        assert_eq!(rec.verdict, Verdict::Legitimate);
        assert!((rec.confidence - 0.72 * 0.85).abs() < 1e-9);
        assert!(rec.reasons[0].contains("ranked 'A'"));
    }

    #[test]
    fn test_prior_warnings_are_preserved_first() {
        let outcomes = vec![success("a", None)];
        let rec = reconcile(
            &outcomes,
            &HashMap::new(),
            vec!["ISSN '1234-5678' failed validation".to_string()],
        );
        assert_eq!(rec.warnings[0], "ISSN '1234-5678' failed validation");
    }
}
