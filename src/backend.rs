//! The uniform backend contract and the startup-time registry.
//!
//! Every evidence source — predatory lists, vetted lists, ranked lists,
//! retraction data — implements [`Backend`]. The registry is a plain vector
//! built once at process start and passed by reference into each dispatch;
//! it is never mutated while a dispatch is in flight.

use crate::error::BackendError;
use crate::evidence::{Evidence, EvidenceKind};
use crate::identity::NormalizedIdentity;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// Default per-backend lookup deadline
pub const DEFAULT_BACKEND_TIMEOUT: Duration = Duration::from_secs(5);

/// Default whole-dispatch deadline
pub const DEFAULT_GLOBAL_TIMEOUT: Duration = Duration::from_secs(15);

/// One evidence source.
///
/// `lookup` returns `Ok(None)` for "not found"; it errs only for genuine
/// fault conditions (unreachable store, uninterpretable data). Implementations
/// receive an immutable identity and share no mutable state with siblings.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Stable identifier used in outcomes, reasons, and logs
    fn source_id(&self) -> &str;

    /// The kind of evidence this backend emits
    fn evidence_kind(&self) -> EvidenceKind;

    /// Source trust weight in (0, 1]
    fn weight(&self) -> f64;

    async fn lookup(
        &self,
        identity: &NormalizedIdentity,
    ) -> Result<Option<Evidence>, BackendError>;
}

/// A backend plus its dispatch-time budget.
#[derive(Clone)]
pub struct RegisteredBackend {
    pub backend: Arc<dyn Backend>,
    pub timeout: Duration,
}

impl RegisteredBackend {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self {
            backend,
            timeout: DEFAULT_BACKEND_TIMEOUT,
        }
    }

    pub fn with_timeout(backend: Arc<dyn Backend>, timeout: Duration) -> Self {
        Self { backend, timeout }
    }
}

impl std::fmt::Debug for RegisteredBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisteredBackend")
            .field("source_id", &self.backend.source_id())
            .field("kind", &self.backend.evidence_kind())
            .field("weight", &self.backend.weight())
            .field("timeout", &self.timeout)
            .finish()
    }
}
