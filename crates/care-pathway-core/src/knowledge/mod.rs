//! Read-only pathology knowledge store.
//!
//! Loaded once at startup from a directory of JSON documents, then frozen.
//! Each document is indexed under its filename stem and every alias, all
//! normalized (lower-case, spaces → underscores).

mod loader;

pub use loader::*;

use std::collections::{BTreeSet, HashMap};
use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info};

use crate::models::PathologyKnowledge;

/// Confidence reported for conditions without knowledge.
pub const UNKNOWN_KNOWLEDGE_CONFIDENCE: f64 = 0.3;

/// Confidence reported when a document carries no overall score.
pub const DEFAULT_KNOWLEDGE_CONFIDENCE: f64 = 0.7;

/// Normalize a condition name or alias into an index key.
pub fn normalize_key(name: &str) -> String {
    name.trim().to_lowercase().replace(' ', "_")
}

/// In-memory index of pathology knowledge.
#[derive(Debug, Clone, Default)]
pub struct KnowledgeStore {
    /// Keys in insertion order; containment fallback scans this order
    entries: Vec<(String, Arc<PathologyKnowledge>)>,
    by_key: HashMap<String, usize>,
    fingerprint: String,
}

impl KnowledgeStore {
    /// A store with no documents. Every lookup misses.
    pub fn empty() -> Self {
        Self {
            fingerprint: fingerprint(std::iter::empty()),
            ..Self::default()
        }
    }

    /// Load all documents under `dir`.
    pub fn load(dir: &Path) -> (Self, LoadReport) {
        let (documents, report) = load_directory(dir);
        let mut store = Self::from_documents(
            documents
                .into_iter()
                .map(|d| (d.key, d.knowledge))
                .collect(),
        );
        store.fingerprint = report.fingerprint.clone();
        (store, report)
    }

    /// Index already-parsed documents keyed by their canonical name.
    pub fn from_documents(documents: Vec<(String, PathologyKnowledge)>) -> Self {
        let mut store = Self::empty();
        for (key, knowledge) in documents {
            store.insert(&key, knowledge);
        }
        store
    }

    fn insert(&mut self, key: &str, knowledge: PathologyKnowledge) {
        let aliases: Vec<String> = knowledge.pathology.aliases.clone();
        let shared = Arc::new(knowledge);

        for name in std::iter::once(key.to_string()).chain(aliases) {
            let normalized = normalize_key(&name);
            if normalized.is_empty() {
                continue;
            }
            match self.by_key.get(&normalized) {
                // Later documents take over a key, keeping its scan position.
                Some(&i) => self.entries[i].1 = Arc::clone(&shared),
                None => {
                    self.by_key.insert(normalized.clone(), self.entries.len());
                    self.entries.push((normalized, Arc::clone(&shared)));
                }
            }
        }
    }

    /// Look up a condition by name or alias.
    ///
    /// Exact key match first, then the first key (in index order) that
    /// contains the normalized input or is contained in it.
    pub fn get_pathology_info(&self, condition: &str) -> Option<&PathologyKnowledge> {
        let normalized = normalize_key(condition);
        if normalized.is_empty() {
            return None;
        }

        if let Some(&i) = self.by_key.get(&normalized) {
            return Some(&self.entries[i].1);
        }

        let found = self
            .entries
            .iter()
            .find(|(key, _)| key.contains(&normalized) || normalized.contains(key.as_str()));
        if let Some((key, _)) = found {
            debug!(condition, matched_key = %key, "Knowledge matched by containment");
        }
        found.map(|(_, knowledge)| knowledge.as_ref())
    }

    /// Quality metrics for a condition; empty when unknown.
    pub fn get_quality_indicators(
        &self,
        condition: &str,
    ) -> serde_json::Map<String, serde_json::Value> {
        self.get_pathology_info(condition)
            .map(|k| k.quality_indicators.clone())
            .unwrap_or_default()
    }

    /// How much the store trusts its knowledge about a condition.
    pub fn get_knowledge_confidence(&self, condition: &str) -> f64 {
        match self.get_pathology_info(condition) {
            None => UNKNOWN_KNOWLEDGE_CONFIDENCE,
            Some(k) => k.overall_confidence().unwrap_or(DEFAULT_KNOWLEDGE_CONFIDENCE),
        }
    }

    /// Distinct pathology names, sorted.
    pub fn list_supported_conditions(&self) -> Vec<String> {
        self.entries
            .iter()
            .map(|(_, k)| k.pathology.name.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Record caller feedback about a condition. Logged only; knowledge is never mutated.
    pub fn record_feedback(&self, condition: &str, feedback: &serde_json::Value) {
        info!(condition, %feedback, "Feedback received");
    }

    /// Fingerprint of the loaded snapshot.
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    /// Number of indexed keys (names and aliases).
    pub fn key_count(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
