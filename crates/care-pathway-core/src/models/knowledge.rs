//! Typed pathology knowledge documents.
//!
//! One document per condition, deserialized once at load time and shared
//! read-only afterwards.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Cost type → amount (e.g., "consultation" → 25.0).
pub type CostMap = BTreeMap<String, f64>;

/// Step key (e.g., "step_1") → step.
pub type StepMap = BTreeMap<String, PathwayStep>;

/// A complete pathology knowledge document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PathologyKnowledge {
    pub pathology: Pathology,
    pub clinical_pathway: ClinicalPathway,
    #[serde(default)]
    pub regional_data: BTreeMap<String, RegionalData>,
    #[serde(default)]
    pub medications: Medications,
    #[serde(default)]
    pub contraindications: BTreeMap<String, Contraindication>,
    /// Opaque quality metrics, passed through to callers
    #[serde(default)]
    pub quality_indicators: serde_json::Map<String, serde_json::Value>,
    #[serde(default)]
    pub confidence_score: Option<ConfidenceScore>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Pathology {
    pub name: String,
    #[serde(default)]
    pub aliases: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClinicalPathway {
    pub standard_protocol: StepMap,
    #[serde(default)]
    pub emergency_protocol: Option<StepMap>,
    #[serde(default)]
    pub evidence_level: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub last_updated: Option<String>,
}

/// A single recommended care step.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PathwayStep {
    pub action: String,
    pub timing: String,
    #[serde(default)]
    pub rationale: String,
    #[serde(default)]
    pub cost_estimate: CostMap,
    /// Regional wait time, filled in during enrichment
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wait_time: Option<String>,
}

impl PathwayStep {
    /// Whether the step is a consultation (case-insensitive).
    pub fn is_consultation(&self) -> bool {
        self.action.to_lowercase().contains("consultation")
    }

    /// Sum of all cost estimates for the step.
    pub fn total_cost(&self) -> f64 {
        self.cost_estimate.values().sum()
    }
}

/// Location-specific availability and cost data.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RegionalData {
    #[serde(default)]
    pub gp_availability: Option<String>,
    #[serde(default)]
    pub average_cost: CostMap,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Medications {
    #[serde(default)]
    pub first_line: Vec<Medication>,
}

/// A medication option; everything beyond the name is kept as metadata.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Medication {
    pub name: String,
    #[serde(flatten)]
    pub details: serde_json::Map<String, serde_json::Value>,
}

impl Medication {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            details: serde_json::Map::new(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Contraindication {
    #[serde(default)]
    pub avoid: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ConfidenceScore {
    #[serde(default)]
    pub overall: Option<f64>,
}

impl PathologyKnowledge {
    /// Check constraints serde cannot express.
    pub fn validate(&self) -> Result<(), String> {
        if self.pathology.name.trim().is_empty() {
            return Err("pathology.name is empty".into());
        }

        if let Some(overall) = self.overall_confidence() {
            if !(0.0..=1.0).contains(&overall) {
                return Err(format!("confidence_score.overall out of range: {}", overall));
            }
        }

        let protocols = std::iter::once(&self.clinical_pathway.standard_protocol)
            .chain(self.clinical_pathway.emergency_protocol.iter());
        for protocol in protocols {
            for (key, step) in protocol {
                if let Some((cost_type, amount)) = step
                    .cost_estimate
                    .iter()
                    .find(|(_, amount)| !amount.is_finite() || **amount < 0.0)
                {
                    return Err(format!("{}: invalid cost {} = {}", key, cost_type, amount));
                }
            }
        }

        for (region, data) in &self.regional_data {
            if data.average_cost.values().any(|a| !a.is_finite() || *a < 0.0) {
                return Err(format!("regional_data.{}: invalid average cost", region));
            }
        }

        Ok(())
    }

    pub fn overall_confidence(&self) -> Option<f64> {
        self.confidence_score.as_ref().and_then(|c| c.overall)
    }

    /// Avoid-list for a contraindication flag (empty when absent).
    pub fn avoid_list(&self, flag: &str) -> &[String] {
        self.contraindications
            .get(flag)
            .map(|c| c.avoid.as_slice())
            .unwrap_or(&[])
    }
}
