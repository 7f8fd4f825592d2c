//! Concrete backend implementations over snapshot stores.
//!
//! - [`binary_list`] - predatory / vetted membership lists
//! - [`ranked_list`] - allow-listed ranked lists (rank scales the weight)
//! - [`retraction`] - retraction counts as a quality indicator

pub mod binary_list;
pub mod ranked_list;
pub mod retraction;

pub use binary_list::BinaryListBackend;
pub use ranked_list::RankedListBackend;
pub use retraction::RetractionBackend;

/// Confidence attached to an exact ISSN match
pub const ISSN_MATCH_CONFIDENCE: f64 = 0.95;

/// Confidence attached to a normalized-name match
pub const NAME_MATCH_CONFIDENCE: f64 = 0.85;
