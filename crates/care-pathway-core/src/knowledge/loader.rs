//! Directory loading for pathology documents.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::{error, info, warn};

use crate::models::PathologyKnowledge;

/// Errors for a single knowledge document. Contained by the loader.
#[derive(Error, Debug)]
pub enum KnowledgeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid document: {0}")]
    Invalid(String),
}

pub type KnowledgeResult<T> = Result<T, KnowledgeError>;

/// A parsed document with the key derived from its filename.
#[derive(Debug, Clone)]
pub struct LoadedDocument {
    pub key: String,
    pub knowledge: PathologyKnowledge,
    /// SHA-256 of the raw file bytes (hex)
    pub digest: String,
}

/// A file that was skipped during loading.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SkippedDocument {
    pub file: String,
    pub reason: String,
}

/// What happened during a load.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct LoadReport {
    pub directory: PathBuf,
    pub loaded: Vec<String>,
    pub skipped: Vec<SkippedDocument>,
    pub loaded_at: DateTime<Utc>,
    /// SHA-256 over the digests of every loaded document, in load order
    pub fingerprint: String,
    pub directory_found: bool,
}

/// Parse and validate one document from its raw bytes.
pub fn parse_document(bytes: &[u8]) -> KnowledgeResult<PathologyKnowledge> {
    let knowledge: PathologyKnowledge = serde_json::from_slice(bytes)?;
    knowledge.validate().map_err(KnowledgeError::Invalid)?;
    Ok(knowledge)
}

fn read_document(path: &Path) -> KnowledgeResult<(PathologyKnowledge, String)> {
    let bytes = fs::read(path)?;
    let knowledge = parse_document(&bytes)?;
    Ok((knowledge, hex::encode(Sha256::digest(&bytes))))
}

/// Combine per-document digests into one snapshot fingerprint.
pub fn fingerprint<'a>(digests: impl IntoIterator<Item = &'a str>) -> String {
    let mut hasher = Sha256::new();
    for digest in digests {
        hasher.update(digest.as_bytes());
    }
    hex::encode(hasher.finalize())
}

/// Load every `*.json` document under `dir`, sorted by filename.
///
/// Never fails: a missing directory yields no documents and a warning,
/// unreadable or invalid files are skipped and logged.
pub fn load_directory(dir: &Path) -> (Vec<LoadedDocument>, LoadReport) {
    let mut documents = Vec::new();
    let mut skipped = Vec::new();

    let entries = match fs::read_dir(dir) {
        Ok(entries) => Some(entries),
        Err(e) => {
            warn!(directory = %dir.display(), error = %e, "Knowledge base directory not found");
            None
        }
    };
    let directory_found = entries.is_some();

    let mut paths: Vec<PathBuf> = entries
        .into_iter()
        .flatten()
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext == "json"))
        .collect();
    paths.sort();

    for path in paths {
        let file = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();

        match read_document(&path) {
            Ok((knowledge, digest)) => documents.push(LoadedDocument {
                key: stem,
                knowledge,
                digest,
            }),
            Err(e) => {
                error!(file = %path.display(), error = %e, "Failed to load knowledge document");
                skipped.push(SkippedDocument {
                    file,
                    reason: e.to_string(),
                });
            }
        }
    }

    let report = LoadReport {
        directory: dir.to_path_buf(),
        loaded: documents.iter().map(|d| format!("{}.json", d.key)).collect(),
        skipped,
        loaded_at: Utc::now(),
        fingerprint: fingerprint(documents.iter().map(|d| d.digest.as_str())),
        directory_found,
    };

    info!(
        directory = %dir.display(),
        loaded = report.loaded.len(),
        skipped = report.skipped.len(),
        fingerprint = %report.fingerprint,
        "Knowledge base loaded"
    );

    (documents, report)
}
