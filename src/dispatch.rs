//! Concurrent fan-out of one identity query across all registered backends.
//!
//! One spawned task per backend, each bounded by its own timeout, the whole
//! dispatch additionally bounded by a global timeout. Backend faults never
//! abort siblings; the returned outcomes preserve registry order regardless
//! of completion order so assessments stay deterministic.

use crate::backend::RegisteredBackend;
use crate::evidence::{BackendErrorKind, BackendOutcome};
use crate::identity::NormalizedIdentity;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Query every backend concurrently and collect one outcome per backend.
///
/// Never fails wholesale: even when every backend errors, the full outcome
/// set comes back and the caller decides what that means for the verdict.
/// Backends still outstanding when `global_timeout` elapses are aborted and
/// recorded as timeouts; already-completed outcomes are preserved.
pub async fn dispatch(
    identity: &NormalizedIdentity,
    backends: &[RegisteredBackend],
    global_timeout: Duration,
) -> Vec<BackendOutcome> {
    let started = Instant::now();
    let deadline = tokio::time::Instant::now() + global_timeout;

    debug!(
        name = %identity.normalized_name,
        backends = backends.len(),
        "Dispatching to backends"
    );

    // Launch all lookups before awaiting any of them
    let handles: Vec<(String, tokio::task::JoinHandle<BackendOutcome>)> = backends
        .iter()
        .map(|registered| {
            let backend = registered.backend.clone();
            let timeout = registered.timeout;
            let identity = identity.clone();
            let source_id = backend.source_id().to_string();
            let task_source = source_id.clone();

            let handle = tokio::spawn(async move {
                let start = Instant::now();
                match tokio::time::timeout(timeout, backend.lookup(&identity)).await {
                    Ok(Ok(evidence)) => {
                        BackendOutcome::success(&task_source, evidence, start.elapsed())
                    }
                    Ok(Err(err)) => {
                        warn!(source = %task_source, error = %err, "Backend lookup failed");
                        BackendOutcome::failure(&task_source, (&err).into(), start.elapsed())
                    }
                    Err(_) => {
                        warn!(
                            source = %task_source,
                            timeout_ms = timeout.as_millis() as u64,
                            "Backend lookup timed out"
                        );
                        BackendOutcome::failure(&task_source, BackendErrorKind::Timeout, timeout)
                    }
                }
            });

            (source_id, handle)
        })
        .collect();

    // Collect in registry order; abandon whatever the global deadline cuts off
    let mut outcomes = Vec::with_capacity(handles.len());
    for (source_id, mut handle) in handles {
        let outcome = match tokio::time::timeout_at(deadline, &mut handle).await {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(join_err)) => {
                warn!(source = %source_id, error = %join_err, "Backend task aborted");
                BackendOutcome::failure(&source_id, BackendErrorKind::Unavailable, started.elapsed())
            }
            Err(_) => {
                handle.abort();
                warn!(source = %source_id, "Global dispatch timeout reached");
                BackendOutcome::failure(&source_id, BackendErrorKind::Timeout, started.elapsed())
            }
        };
        outcomes.push(outcome);
    }

    debug!(
        total = outcomes.len(),
        with_evidence = outcomes.iter().filter(|o| o.evidence.is_some()).count(),
        failed = outcomes.iter().filter(|o| o.error.is_some()).count(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Dispatch complete"
    );

    outcomes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{Backend, RegisteredBackend};
    use crate::error::BackendError;
    use crate::evidence::{Evidence, EvidenceKind};
    use crate::identity::normalize;
    use async_trait::async_trait;
    use serde_json::Map;
    use std::sync::Arc;

    enum StubBehavior {
        Hit,
        Miss,
        Fail,
        Sleep(Duration),
    }

    struct StubBackend {
        id: String,
        behavior: StubBehavior,
    }

    impl StubBackend {
        fn registered(id: &str, behavior: StubBehavior, timeout: Duration) -> RegisteredBackend {
            RegisteredBackend::with_timeout(
                Arc::new(StubBackend {
                    id: id.to_string(),
                    behavior,
                }),
                timeout,
            )
        }
    }

    #[async_trait]
    impl Backend for StubBackend {
        fn source_id(&self) -> &str {
            &self.id
        }

        fn evidence_kind(&self) -> EvidenceKind {
            EvidenceKind::Legitimate
        }

        fn weight(&self) -> f64 {
            1.0
        }

        async fn lookup(
            &self,
            identity: &NormalizedIdentity,
        ) -> Result<Option<Evidence>, BackendError> {
            match &self.behavior {
                StubBehavior::Hit => Ok(Some(Evidence {
                    source_id: self.id.clone(),
                    kind: EvidenceKind::Legitimate,
                    weight: 1.0,
                    confidence: 0.9,
                    metadata: Map::new(),
                    matched_identity: identity.normalized_name.clone(),
                })),
                StubBehavior::Miss => Ok(None),
                StubBehavior::Fail => {
                    Err(BackendError::Unavailable("stub outage".to_string()))
                }
                StubBehavior::Sleep(duration) => {
                    tokio::time::sleep(*duration).await;
                    Ok(None)
                }
            }
        }
    }

    fn identity() -> NormalizedIdentity {
        let (id, _) = normalize("Nature", Some("0028-0836")).expect("valid identity");
        id
    }

    #[tokio::test]
    async fn test_outcomes_preserve_registry_order() {
        let backends = vec![
            StubBackend::registered("slow", StubBehavior::Sleep(Duration::from_millis(50)), Duration::from_secs(1)),
            StubBackend::registered("fast", StubBehavior::Hit, Duration::from_secs(1)),
            StubBackend::registered("miss", StubBehavior::Miss, Duration::from_secs(1)),
        ];

        let outcomes = dispatch(&identity(), &backends, Duration::from_secs(5)).await;
        let ids: Vec<&str> = outcomes.iter().map(|o| o.source_id.as_str()).collect();
        assert_eq!(ids, vec!["slow", "fast", "miss"]);
    }

    #[tokio::test]
    async fn test_one_timeout_does_not_block_siblings() {
        let backends = vec![
            StubBackend::registered("a", StubBehavior::Hit, Duration::from_secs(1)),
            StubBackend::registered(
                "b",
                StubBehavior::Sleep(Duration::from_secs(30)),
                Duration::from_millis(20),
            ),
            StubBackend::registered("c", StubBehavior::Hit, Duration::from_secs(1)),
        ];

        let outcomes = dispatch(&identity(), &backends, Duration::from_secs(5)).await;
        assert_eq!(outcomes.len(), 3);
        assert!(outcomes[0].evidence.is_some());
        assert_eq!(outcomes[1].error, Some(BackendErrorKind::Timeout));
        assert!(outcomes[2].evidence.is_some());
    }

    #[tokio::test]
    async fn test_backend_fault_becomes_outcome() {
        let backends = vec![
            StubBackend::registered("down", StubBehavior::Fail, Duration::from_secs(1)),
            StubBackend::registered("up", StubBehavior::Hit, Duration::from_secs(1)),
        ];

        let outcomes = dispatch(&identity(), &backends, Duration::from_secs(5)).await;
        assert_eq!(outcomes[0].error, Some(BackendErrorKind::Unavailable));
        assert!(outcomes[1].evidence.is_some());
    }

    #[tokio::test]
    async fn test_all_failures_still_return_full_outcome_set() {
        let backends = vec![
            StubBackend::registered("x", StubBehavior::Fail, Duration::from_secs(1)),
            StubBackend::registered("y", StubBehavior::Fail, Duration::from_secs(1)),
        ];

        let outcomes = dispatch(&identity(), &backends, Duration::from_secs(5)).await;
        assert_eq!(outcomes.len(), 2);
        assert!(outcomes.iter().all(|o| o.error.is_some()));
    }

    #[tokio::test]
    async fn test_global_timeout_preserves_completed_outcomes() {
        let backends = vec![
            StubBackend::registered("quick", StubBehavior::Hit, Duration::from_secs(10)),
            StubBackend::registered(
                "stuck",
                StubBehavior::Sleep(Duration::from_secs(60)),
                Duration::from_secs(10),
            ),
        ];

        let outcomes = dispatch(&identity(), &backends, Duration::from_millis(100)).await;
        assert_eq!(outcomes.len(), 2);
        assert!(outcomes[0].evidence.is_some());
        assert_eq!(outcomes[1].error, Some(BackendErrorKind::Timeout));
    }
}
