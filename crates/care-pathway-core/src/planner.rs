//! End-to-end planning: resolve → enrich → filter.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::enricher::PathwayEnricher;
use crate::knowledge::KnowledgeStore;
use crate::medication::MedicationFilter;
use crate::models::{
    ClinicalPathwayResult, ExtractedCondition, Medication, PathwaySummary, PatientProfile,
    Severity,
};
use crate::resolver::ConditionResolver;

/// Number of medication options surfaced in a plan.
pub const MAX_MEDICATION_OPTIONS: usize = 3;

/// Everything the caller needs for one query.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CarePlan {
    pub extraction: ExtractedCondition,
    pub pathway: ClinicalPathwayResult,
    pub summary: PathwaySummary,
    pub medications: Vec<Medication>,
    pub quality_indicators: serde_json::Map<String, serde_json::Value>,
}

/// Runs the full pipeline over shared, read-only components.
pub struct CarePlanner {
    resolver: Arc<ConditionResolver>,
    store: Arc<KnowledgeStore>,
    enricher: PathwayEnricher,
    filter: MedicationFilter,
}

impl CarePlanner {
    pub fn new(resolver: Arc<ConditionResolver>, store: Arc<KnowledgeStore>) -> Self {
        Self {
            enricher: PathwayEnricher::new(Arc::clone(&store)),
            filter: MedicationFilter::new(Arc::clone(&store)),
            resolver,
            store,
        }
    }

    /// Plan care for a free-text query. `None` when no condition is found.
    pub fn plan(
        &self,
        query: &str,
        severity: Severity,
        region: &str,
        profile: &PatientProfile,
    ) -> Option<CarePlan> {
        let extraction = self.resolver.resolve(query).into_option()?;
        let condition = extraction.condition.as_str();

        let pathway = self.enricher.build_pathway(condition, severity, region);
        let summary = PathwaySummary::from_result(&pathway);
        let medications = self
            .filter
            .top_options(condition, profile, MAX_MEDICATION_OPTIONS);
        let quality_indicators = self.store.get_quality_indicators(condition);

        Some(CarePlan {
            extraction,
            pathway,
            summary,
            medications,
            quality_indicators,
        })
    }

    pub fn resolver(&self) -> &ConditionResolver {
        &self.resolver
    }

    pub fn enricher(&self) -> &PathwayEnricher {
        &self.enricher
    }

    pub fn medication_filter(&self) -> &MedicationFilter {
        &self.filter
    }
}
