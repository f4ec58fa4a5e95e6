//! Contraindication-aware medication filtering.

use std::sync::Arc;

use crate::knowledge::KnowledgeStore;
use crate::models::{Medication, PathologyKnowledge, PatientProfile};

/// Contraindication key for pregnancy.
pub const PREGNANCY: &str = "pregnancy";

/// Contraindication key for renal insufficiency.
pub const RENAL_INSUFFICIENCY: &str = "renal_insufficiency";

/// Filters first-line medications against a patient profile.
#[derive(Debug, Clone)]
pub struct MedicationFilter {
    store: Arc<KnowledgeStore>,
}

impl MedicationFilter {
    pub fn new(store: Arc<KnowledgeStore>) -> Self {
        Self { store }
    }

    /// First-line medications for `condition` that are safe for `profile`.
    ///
    /// Unknown conditions yield an empty list. Order is preserved.
    pub fn filter_medications(&self, condition: &str, profile: &PatientProfile) -> Vec<Medication> {
        self.store
            .get_pathology_info(condition)
            .map(|knowledge| safe_medications(knowledge, profile))
            .unwrap_or_default()
    }

    /// The first `limit` safe options.
    pub fn top_options(
        &self,
        condition: &str,
        profile: &PatientProfile,
        limit: usize,
    ) -> Vec<Medication> {
        let mut options = self.filter_medications(condition, profile);
        options.truncate(limit);
        options
    }
}

/// Apply the profile's flags to a document's first-line list.
///
/// A medication is dropped only when a flag is set and the medication is on
/// that flag's avoid-list.
pub fn safe_medications(
    knowledge: &PathologyKnowledge,
    profile: &PatientProfile,
) -> Vec<Medication> {
    let pregnancy_avoid = knowledge.avoid_list(PREGNANCY);
    let renal_avoid = knowledge.avoid_list(RENAL_INSUFFICIENCY);

    knowledge
        .medications
        .first_line
        .iter()
        .filter(|med| !(profile.is_pregnant() && pregnancy_avoid.contains(&med.name)))
        .filter(|med| !(profile.has_renal_insufficiency() && renal_avoid.contains(&med.name)))
        .cloned()
        .collect()
}
