//! # scholarguard
//!
//! Journal & Conference Legitimacy Checker - Multi-Source Evidence Aggregation
//!
//! ## Modules
//!
//! - [`identity`] - Venue name/ISSN normalization
//! - [`backend`] - The uniform backend contract and registry
//! - [`backends`] - Concrete list/rank/retraction backends
//! - [`dispatch`] - Concurrent fan-out with per-backend isolation
//! - [`score`] - Evidence reconciliation and confidence scoring
//! - [`enrich`] - Retraction-rate context from publication volume
//! - [`assess`] - The `Assessor` entry point
//! - [`error`] - Custom error types
//!
//! ## Usage
//!
//! ```rust,no_run
//! use scholarguard::assess::Assessor;
//! use scholarguard::enrich::NullVolume;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let assessor = Assessor::new(vec![], Arc::new(NullVolume));
//!     let result = assessor.assess("Nature", Some("0028-0836")).await?;
//!     println!("{} ({:.2})", result.verdict.as_str(), result.confidence);
//!     Ok(())
//! }
//! ```

pub mod assess;
pub mod assessment;
pub mod backend;
pub mod backends;
pub mod dispatch;
pub mod enrich;
pub mod error;
pub mod evidence;
pub mod identity;
pub mod openalex;
pub mod score;
pub mod store;

pub use error::{GuardError, Result};
