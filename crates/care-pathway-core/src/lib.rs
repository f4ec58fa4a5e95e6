//! Care Pathway Core Library
//!
//! Maps free-text medical queries to canonical conditions and expands them
//! into evidence-tagged, region-adjusted clinical pathways.
//!
//! # Architecture
//!
//! ```text
//! "mal de dos depuis trois semaines"
//!                 │
//!                 ▼
//!        ConditionResolver ──── ConditionCatalog
//!   Exact → Fuzzy → Regex → [Entity] → Contextual
//!                 │
//!        (condition, confidence)
//!                 │
//!                 ▼
//!        PathwayEnricher ────── KnowledgeStore
//!   protocol selection + regional overlay   (loaded once, read-only)
//!                 │
//!                 ▼
//!        MedicationFilter
//!   pregnancy / renal insufficiency avoid-lists
//! ```
//!
//! # Core Principle
//!
//! **Every call returns a well-formed result.** Unknown conditions degrade to
//! a generic pathway (`evidence_level == "Generic"`), unresolved queries are
//! a normal outcome, and load failures never escape initialization.
//!
//! # Modules
//!
//! - [`catalog`]: Static condition catalog
//! - [`resolver`]: Matching cascade
//! - [`knowledge`]: Pathology knowledge store and loader
//! - [`enricher`]: Protocol selection and regional enrichment
//! - [`medication`]: Contraindication filtering
//! - [`planner`]: End-to-end pipeline
//! - [`config`]: Startup configuration

pub mod catalog;
pub mod config;
pub mod enricher;
pub mod knowledge;
pub mod medication;
pub mod models;
pub mod planner;
pub mod resolver;

// Re-export commonly used types
pub use catalog::ConditionCatalog;
pub use config::EngineConfig;
pub use enricher::PathwayEnricher;
pub use knowledge::{KnowledgeStore, LoadReport};
pub use medication::MedicationFilter;
pub use models::{
    ClinicalPathwayResult, ExtractedCondition, MatchedBy, Medication, PathologyKnowledge,
    PatientProfile, Resolution, Severity,
};
pub use planner::{CarePlan, CarePlanner};
pub use resolver::{ConditionResolver, Entity, EntityRecognizer};

// UniFFI setup - using proc macros
uniffi::setup_scaffolding!();

use std::collections::HashMap;
use std::sync::Arc;

// =========================================================================
// FFI Error Type
// =========================================================================

#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum CarePathwayError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Initialization error: {0}")]
    InitializationError(String),
}

impl From<config::ConfigError> for CarePathwayError {
    fn from(e: config::ConfigError) -> Self {
        CarePathwayError::ConfigError(e.to_string())
    }
}

impl From<serde_json::Error> for CarePathwayError {
    fn from(e: serde_json::Error) -> Self {
        CarePathwayError::SerializationError(e.to_string())
    }
}

impl From<resolver::ResolverError> for CarePathwayError {
    fn from(e: resolver::ResolverError) -> Self {
        CarePathwayError::InitializationError(e.to_string())
    }
}

// =========================================================================
// Factory Functions (exported to FFI)
// =========================================================================

/// Load the knowledge base at `knowledge_dir` and build an engine.
#[uniffi::export]
pub fn open_engine(
    knowledge_dir: String,
    default_region: String,
) -> Result<Arc<CarePathwayEngine>, CarePathwayError> {
    let config = EngineConfig::new(knowledge_dir.into(), default_region)?;
    Ok(Arc::new(CarePathwayEngine::from_config(&config)?))
}

/// Build an engine from `CARE_PATHWAY_*` environment variables.
#[uniffi::export]
pub fn open_engine_with_defaults() -> Result<Arc<CarePathwayEngine>, CarePathwayError> {
    let config = EngineConfig::from_env()?;
    Ok(Arc::new(CarePathwayEngine::from_config(&config)?))
}

// =========================================================================
// Main API Object
// =========================================================================

/// Read-only engine; safe to call from many threads at once.
#[derive(uniffi::Object)]
pub struct CarePathwayEngine {
    planner: CarePlanner,
    store: Arc<KnowledgeStore>,
    default_region: String,
}

impl CarePathwayEngine {
    /// Load the store and assemble the pipeline.
    pub fn from_config(config: &EngineConfig) -> Result<Self, CarePathwayError> {
        let (store, _report) = KnowledgeStore::load(config.knowledge_dir());
        let resolver = ConditionResolver::french()?;
        Ok(Self::from_parts(
            Arc::new(resolver),
            Arc::new(store),
            config.default_region(),
        ))
    }

    /// Assemble from already-built components.
    pub fn from_parts(
        resolver: Arc<ConditionResolver>,
        store: Arc<KnowledgeStore>,
        default_region: &str,
    ) -> Self {
        Self {
            planner: CarePlanner::new(resolver, Arc::clone(&store)),
            store,
            default_region: default_region.to_string(),
        }
    }

    pub fn planner(&self) -> &CarePlanner {
        &self.planner
    }

    fn region_or_default(&self, region: Option<String>) -> String {
        region
            .filter(|r| !r.trim().is_empty())
            .unwrap_or_else(|| self.default_region.clone())
    }
}

#[uniffi::export]
impl CarePathwayEngine {
    // =========================================================================
    // Resolution
    // =========================================================================

    /// Resolve free text to a condition. `None` when unresolved.
    pub fn resolve(&self, query: String) -> Option<FfiExtractedCondition> {
        self.planner
            .resolver()
            .resolve(&query)
            .into_option()
            .map(|e| e.into())
    }

    /// Canonical ids the resolver can produce.
    pub fn supported_conditions(&self) -> Vec<String> {
        self.planner.resolver().catalog().list_supported_conditions()
    }

    // =========================================================================
    // Pathways
    // =========================================================================

    /// Build the enriched pathway. `region` defaults to the configured region.
    pub fn build_pathway(
        &self,
        condition: String,
        severity: String,
        region: Option<String>,
    ) -> FfiClinicalPathway {
        let region = self.region_or_default(region);
        self.planner
            .enricher()
            .build_pathway(&condition, Severity::parse(&severity), &region)
            .into()
    }

    /// Safe first-line medications for a patient profile.
    pub fn filter_medications(
        &self,
        condition: String,
        pregnant: Option<bool>,
        renal_insufficiency: Option<bool>,
    ) -> Vec<FfiMedication> {
        let profile = PatientProfile {
            pregnant,
            renal_insufficiency,
        };
        self.planner
            .medication_filter()
            .filter_medications(&condition, &profile)
            .into_iter()
            .map(|m| m.into())
            .collect()
    }

    /// Run the full pipeline and return the plan as JSON. `None` when unresolved.
    pub fn plan_json(
        &self,
        query: String,
        severity: String,
        region: Option<String>,
        pregnant: Option<bool>,
        renal_insufficiency: Option<bool>,
    ) -> Result<Option<String>, CarePathwayError> {
        let region = self.region_or_default(region);
        let profile = PatientProfile {
            pregnant,
            renal_insufficiency,
        };
        self.planner
            .plan(&query, Severity::parse(&severity), &region, &profile)
            .map(|plan| serde_json::to_string(&plan))
            .transpose()
            .map_err(CarePathwayError::from)
    }

    // =========================================================================
    // Knowledge
    // =========================================================================

    pub fn knowledge_confidence(&self, condition: String) -> f64 {
        self.store.get_knowledge_confidence(&condition)
    }

    /// Quality indicators as a JSON object.
    pub fn quality_indicators_json(&self, condition: String) -> String {
        serde_json::Value::Object(self.store.get_quality_indicators(&condition)).to_string()
    }

    /// SHA-256 fingerprint of the loaded knowledge snapshot.
    pub fn knowledge_fingerprint(&self) -> String {
        self.store.fingerprint().to_string()
    }
}

// =========================================================================
// FFI Types
// =========================================================================

/// FFI-safe extracted condition.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiExtractedCondition {
    pub condition: String,
    pub primary_label: String,
    pub confidence: f64,
    pub category: String,
    pub icd10: Option<String>,
    pub matched_by: String,
}

impl From<ExtractedCondition> for FfiExtractedCondition {
    fn from(e: ExtractedCondition) -> Self {
        Self {
            category: e.category.as_str().to_string(),
            matched_by: e.matched_by.as_str().to_string(),
            condition: e.condition,
            primary_label: e.primary_label,
            confidence: e.confidence,
            icd10: e.icd10,
        }
    }
}

/// FFI-safe pathway step.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiPathwayStep {
    pub key: String,
    pub action: String,
    pub timing: String,
    pub rationale: String,
    pub cost_estimate: HashMap<String, f64>,
    pub wait_time: Option<String>,
}

/// FFI-safe clinical pathway.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiClinicalPathway {
    pub condition: String,
    pub steps: Vec<FfiPathwayStep>,
    pub evidence_level: String,
    pub source: String,
    pub confidence: f64,
    pub last_updated: Option<String>,
    pub region: String,
    pub is_generic: bool,
}

impl From<ClinicalPathwayResult> for FfiClinicalPathway {
    fn from(result: ClinicalPathwayResult) -> Self {
        let is_generic = result.is_generic();
        Self {
            steps: result
                .pathway
                .into_iter()
                .map(|(key, step)| FfiPathwayStep {
                    key,
                    action: step.action,
                    timing: step.timing,
                    rationale: step.rationale,
                    cost_estimate: step.cost_estimate.into_iter().collect(),
                    wait_time: step.wait_time,
                })
                .collect(),
            condition: result.condition,
            evidence_level: result.evidence_level,
            source: result.source,
            confidence: result.confidence,
            last_updated: result.last_updated,
            region: result.region,
            is_generic,
        }
    }
}

/// FFI-safe medication; metadata travels as a JSON object.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiMedication {
    pub name: String,
    pub details_json: String,
}

impl From<Medication> for FfiMedication {
    fn from(m: Medication) -> Self {
        Self {
            name: m.name,
            details_json: serde_json::Value::Object(m.details).to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> CarePathwayEngine {
        let dir = config::resolve_knowledge_dir(None).unwrap();
        let config = EngineConfig::new(dir, "paris".into()).unwrap();
        CarePathwayEngine::from_config(&config).unwrap()
    }

    #[test]
    fn test_ffi_resolve() {
        let resolved = engine()
            .resolve("Mon diabète de type 2 n'est pas bien contrôlé".into())
            .unwrap();
        assert_eq!(resolved.condition, "diabete_type2");
        assert_eq!(resolved.matched_by, "exact");
        assert_eq!(resolved.category, "endocrine");
        assert_eq!(resolved.icd10.as_deref(), Some("E11"));
    }

    #[test]
    fn test_ffi_default_region() {
        let pathway = engine().build_pathway("hypertension".into(), "standard".into(), None);
        assert_eq!(pathway.region, "paris");
        assert!(!pathway.is_generic);
    }

    #[test]
    fn test_ffi_unknown_condition() {
        let pathway = engine().build_pathway("zona".into(), "standard".into(), Some("lyon".into()));
        assert!(pathway.is_generic);
        assert_eq!(pathway.steps.len(), 1);
        assert_eq!(pathway.steps[0].cost_estimate["consultation"], 25.0);
    }

    #[test]
    fn test_ffi_plan_json() {
        let engine = engine();
        let json = engine
            .plan_json("J'ai une cystite".into(), "standard".into(), None, Some(true), None)
            .unwrap()
            .unwrap();
        let plan: CarePlan = serde_json::from_str(&json).unwrap();
        assert_eq!(plan.extraction.condition, "infection_urinaire");

        assert!(engine
            .plan_json("bonjour".into(), "standard".into(), None, None, None)
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_ffi_fingerprint() {
        assert_eq!(engine().knowledge_fingerprint().len(), 64);
    }
}
