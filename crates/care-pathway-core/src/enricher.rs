//! Pathway enrichment: protocol selection plus regional overlay.

use std::sync::Arc;

use tracing::debug;

use crate::knowledge::{KnowledgeStore, DEFAULT_KNOWLEDGE_CONFIDENCE};
use crate::models::{
    ClinicalPathwayResult, CostMap, PathwayStep, RegionalData, Severity, StepMap,
    GENERIC_EVIDENCE_LEVEL,
};

/// Wait time used for consultations when the region has no data.
pub const DEFAULT_GP_AVAILABILITY: &str = "2-3 jours";

const DEFAULT_EVIDENCE_LEVEL: &str = "C";
const DEFAULT_SOURCE: &str = "Clinical guidelines";

/// Builds enriched clinical pathways from the knowledge store.
#[derive(Debug, Clone)]
pub struct PathwayEnricher {
    store: Arc<KnowledgeStore>,
}

impl PathwayEnricher {
    pub fn new(store: Arc<KnowledgeStore>) -> Self {
        Self { store }
    }

    /// Build the pathway for a condition, severity and region.
    ///
    /// Unknown conditions yield [`default_pathway`].
    pub fn build_pathway(
        &self,
        condition: &str,
        severity: Severity,
        region: &str,
    ) -> ClinicalPathwayResult {
        let Some(knowledge) = self.store.get_pathology_info(condition) else {
            debug!(condition, "No knowledge for condition, using default pathway");
            return default_pathway(condition);
        };

        let clinical = &knowledge.clinical_pathway;
        let protocol = match (&clinical.emergency_protocol, severity.is_emergency()) {
            (Some(emergency), true) => emergency,
            (None, true) => {
                debug!(condition, "No emergency protocol, using standard protocol");
                &clinical.standard_protocol
            }
            (_, false) => &clinical.standard_protocol,
        };

        let regional = knowledge.regional_data.get(&region.to_lowercase());
        if regional.is_none() {
            debug!(condition, region, "No regional data for region");
        }

        ClinicalPathwayResult {
            condition: condition.to_string(),
            pathway: enrich_steps(protocol, regional),
            evidence_level: clinical
                .evidence_level
                .clone()
                .unwrap_or_else(|| DEFAULT_EVIDENCE_LEVEL.to_string()),
            source: clinical
                .source
                .clone()
                .unwrap_or_else(|| DEFAULT_SOURCE.to_string()),
            confidence: knowledge
                .overall_confidence()
                .unwrap_or(DEFAULT_KNOWLEDGE_CONFIDENCE),
            last_updated: clinical.last_updated.clone(),
            region: region.to_string(),
        }
    }

    pub fn store(&self) -> &KnowledgeStore {
        &self.store
    }
}

/// Overlay regional data on a copy of `protocol`.
///
/// Consultation steps get the region's GP wait time. Costs present in both
/// the step and the region take the regional amount; other costs are kept.
/// Applying the same region twice gives the same result.
pub fn enrich_steps(protocol: &StepMap, regional: Option<&RegionalData>) -> StepMap {
    protocol
        .iter()
        .map(|(key, step)| (key.clone(), enrich_step(step, regional)))
        .collect()
}

fn enrich_step(step: &PathwayStep, regional: Option<&RegionalData>) -> PathwayStep {
    let mut enriched = step.clone();

    if enriched.is_consultation() {
        let wait = regional
            .and_then(|r| r.gp_availability.clone())
            .unwrap_or_else(|| DEFAULT_GP_AVAILABILITY.to_string());
        enriched.wait_time = Some(wait);
    }

    if let Some(regional) = regional {
        for (cost_type, amount) in enriched.cost_estimate.iter_mut() {
            if let Some(regional_amount) = regional.average_cost.get(cost_type) {
                *amount = *regional_amount;
            }
        }
    }

    enriched
}

/// Generic single-step pathway for conditions without knowledge.
pub fn default_pathway(condition: &str) -> ClinicalPathwayResult {
    let mut cost_estimate = CostMap::new();
    cost_estimate.insert("consultation".to_string(), 25.00);

    let mut pathway = StepMap::new();
    pathway.insert(
        "step_1".to_string(),
        PathwayStep {
            action: "Consultation médecin généraliste".to_string(),
            timing: "2-3 jours".to_string(),
            rationale: "Évaluation initiale et diagnostic".to_string(),
            cost_estimate,
            wait_time: None,
        },
    );

    ClinicalPathwayResult {
        condition: condition.to_string(),
        pathway,
        evidence_level: GENERIC_EVIDENCE_LEVEL.to_string(),
        source: "Default protocol".to_string(),
        confidence: 0.5,
        last_updated: None,
        region: "general".to_string(),
    }
}
