//! Domain models for condition resolution and pathway enrichment.

mod condition;
mod knowledge;
mod pathway;

pub use condition::*;
pub use knowledge::*;
pub use pathway::*;

/// Evidence level reported by the generic fallback pathway.
pub const GENERIC_EVIDENCE_LEVEL: &str = "Generic";
