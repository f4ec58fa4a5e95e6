//! Enriched pathway and patient safety models.

use serde::{Deserialize, Serialize};

use super::knowledge::StepMap;

/// Share of the total cost left to the patient after reimbursement.
pub const PATIENT_COST_SHARE: f64 = 0.30;

/// Severity tier requested by the caller.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    #[default]
    Standard,
    Emergency,
    Simple,
    Compliquee,
    Recidivante,
}

impl Severity {
    /// Parse a severity string; anything unrecognized is `Standard`.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "emergency" => Severity::Emergency,
            "simple" => Severity::Simple,
            "compliquée" | "compliquee" => Severity::Compliquee,
            "récidivante" | "recidivante" => Severity::Recidivante,
            _ => Severity::Standard,
        }
    }

    /// Only the emergency tier selects the emergency protocol.
    pub fn is_emergency(self) -> bool {
        matches!(self, Severity::Emergency)
    }
}

/// Result of enriching a condition's pathway for a region.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClinicalPathwayResult {
    pub condition: String,
    /// Enriched copy of the selected protocol
    pub pathway: StepMap,
    pub evidence_level: String,
    pub source: String,
    pub confidence: f64,
    pub last_updated: Option<String>,
    pub region: String,
}

impl ClinicalPathwayResult {
    /// Whether this is the generic fallback rather than real knowledge.
    pub fn is_generic(&self) -> bool {
        self.evidence_level == super::GENERIC_EVIDENCE_LEVEL
    }
}

/// Patient safety flags used for medication filtering.
///
/// Missing flags count as false.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PatientProfile {
    #[serde(default)]
    pub pregnant: Option<bool>,
    #[serde(default)]
    pub renal_insufficiency: Option<bool>,
}

impl PatientProfile {
    pub fn pregnant() -> Self {
        Self {
            pregnant: Some(true),
            ..Self::default()
        }
    }

    pub fn renal_insufficiency() -> Self {
        Self {
            renal_insufficiency: Some(true),
            ..Self::default()
        }
    }

    pub fn is_pregnant(&self) -> bool {
        self.pregnant.unwrap_or(false)
    }

    pub fn has_renal_insufficiency(&self) -> bool {
        self.renal_insufficiency.unwrap_or(false)
    }
}

/// A numbered, costed step for presentation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SummaryStep {
    pub step: u32,
    pub action: String,
    pub timing: String,
    pub rationale: String,
    pub cost: f64,
    pub wait_time: Option<String>,
}

/// Flattened view of a pathway with cost totals.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PathwaySummary {
    pub steps: Vec<SummaryStep>,
    pub total_estimated_cost: f64,
    pub patient_cost: f64,
}

impl PathwaySummary {
    /// Summarize an enriched pathway.
    ///
    /// Steps are ordered by the number in their `step_N` key; keys without a
    /// number follow in map order.
    pub fn from_result(result: &ClinicalPathwayResult) -> Self {
        let mut numbered: Vec<(u32, &str, &super::PathwayStep)> = Vec::new();
        let mut next_unnumbered = result.pathway.len() as u32;

        for (key, step) in &result.pathway {
            let number = key
                .rsplit('_')
                .next()
                .and_then(|n| n.parse::<u32>().ok())
                .unwrap_or_else(|| {
                    next_unnumbered += 1;
                    next_unnumbered
                });
            numbered.push((number, key, step));
        }
        numbered.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(b.1)));

        let steps: Vec<SummaryStep> = numbered
            .into_iter()
            .map(|(number, _, step)| SummaryStep {
                step: number,
                action: step.action.clone(),
                timing: step.timing.clone(),
                rationale: step.rationale.clone(),
                cost: step.total_cost(),
                wait_time: step.wait_time.clone(),
            })
            .collect();

        let total_estimated_cost: f64 = steps.iter().map(|s| s.cost).sum();

        Self {
            steps,
            total_estimated_cost,
            patient_cost: total_estimated_cost * PATIENT_COST_SHARE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CostMap, PathwayStep};

    fn step(action: &str, cost: f64) -> PathwayStep {
        let mut cost_estimate = CostMap::new();
        cost_estimate.insert("consultation".into(), cost);
        PathwayStep {
            action: action.into(),
            timing: "J0".into(),
            rationale: String::new(),
            cost_estimate,
            wait_time: None,
        }
    }

    #[test]
    fn test_severity_parse() {
        assert_eq!(Severity::parse("emergency"), Severity::Emergency);
        assert_eq!(Severity::parse("Compliquée"), Severity::Compliquee);
        assert_eq!(Severity::parse("recidivante"), Severity::Recidivante);
        assert_eq!(Severity::parse("simple"), Severity::Simple);
        assert_eq!(Severity::parse("whatever"), Severity::Standard);
        assert_eq!(Severity::parse("urgence"), Severity::Standard);
        assert!(!Severity::Compliquee.is_emergency());
    }

    #[test]
    fn test_profile_defaults() {
        let profile: PatientProfile = serde_json::from_str("{}").unwrap();
        assert!(!profile.is_pregnant());
        assert!(!profile.has_renal_insufficiency());
        assert!(PatientProfile::pregnant().is_pregnant());
    }

    #[test]
    fn test_summary_orders_by_step_number() {
        let mut pathway = StepMap::new();
        pathway.insert("step_10".into(), step("Suivi", 10.0));
        pathway.insert("step_2".into(), step("Analyse", 20.0));
        pathway.insert("step_1".into(), step("Consultation", 25.0));

        let result = ClinicalPathwayResult {
            condition: "x".into(),
            pathway,
            evidence_level: "A".into(),
            source: "HAS".into(),
            confidence: 0.9,
            last_updated: None,
            region: "paris".into(),
        };

        let summary = PathwaySummary::from_result(&result);
        let order: Vec<u32> = summary.steps.iter().map(|s| s.step).collect();
        assert_eq!(order, vec![1, 2, 10]);
        assert!((summary.total_estimated_cost - 55.0).abs() < 1e-9);
        assert!((summary.patient_cost - 16.5).abs() < 1e-9);
    }
}
