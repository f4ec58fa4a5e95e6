//! Engine configuration.
//!
//! Resolved once at process startup and passed into the engine, so request
//! handling never reads the environment.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Environment variable overriding the knowledge directory.
pub const KNOWLEDGE_DIR_ENV: &str = "CARE_PATHWAY_KNOWLEDGE_DIR";

/// Environment variable overriding the default region.
pub const DEFAULT_REGION_ENV: &str = "CARE_PATHWAY_DEFAULT_REGION";

/// Knowledge directory, relative to the working directory or an ancestor of the crate.
pub const KNOWLEDGE_DIR: &str = "knowledge_base/pathologies";

pub const DEFAULT_REGION: &str = "paris";

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("Knowledge directory override is not a directory: {0}")]
    NotADirectory(PathBuf),

    #[error("Could not locate knowledge_base/pathologies directory")]
    KnowledgeDirNotFound,

    #[error("Default region cannot be empty")]
    EmptyRegion,
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Engine configuration resolved at startup.
#[derive(Clone, Debug, PartialEq)]
pub struct EngineConfig {
    knowledge_dir: PathBuf,
    default_region: String,
}

impl EngineConfig {
    pub fn new(knowledge_dir: PathBuf, default_region: String) -> ConfigResult<Self> {
        let default_region = default_region.trim().to_string();
        if default_region.is_empty() {
            return Err(ConfigError::EmptyRegion);
        }
        Ok(Self {
            knowledge_dir,
            default_region,
        })
    }

    /// Build from `CARE_PATHWAY_*` environment variables.
    pub fn from_env() -> ConfigResult<Self> {
        let override_dir = std::env::var_os(KNOWLEDGE_DIR_ENV).map(PathBuf::from);
        let region =
            std::env::var(DEFAULT_REGION_ENV).unwrap_or_else(|_| DEFAULT_REGION.to_string());
        Self::new(resolve_knowledge_dir(override_dir)?, region)
    }

    pub fn knowledge_dir(&self) -> &Path {
        &self.knowledge_dir
    }

    pub fn default_region(&self) -> &str {
        &self.default_region
    }
}

/// Locate the knowledge directory.
///
/// An override must be an existing directory. Otherwise `knowledge_base/pathologies`
/// is searched relative to the working directory, then up from `CARGO_MANIFEST_DIR`.
pub fn resolve_knowledge_dir(override_dir: Option<PathBuf>) -> ConfigResult<PathBuf> {
    if let Some(dir) = override_dir {
        if dir.is_dir() {
            return Ok(dir);
        }
        return Err(ConfigError::NotADirectory(dir));
    }

    let cwd_relative = PathBuf::from(KNOWLEDGE_DIR);
    if cwd_relative.is_dir() {
        return Ok(cwd_relative);
    }

    let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));
    manifest_dir
        .ancestors()
        .map(|ancestor| ancestor.join(KNOWLEDGE_DIR))
        .find(|candidate| candidate.is_dir())
        .ok_or(ConfigError::KnowledgeDirNotFound)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_finds_shipped_knowledge_dir() {
        let dir = resolve_knowledge_dir(None).unwrap();
        assert!(dir.ends_with(KNOWLEDGE_DIR));
    }

    #[test]
    fn test_override_must_exist() {
        let missing = PathBuf::from("/no/such/knowledge");
        assert_eq!(
            resolve_knowledge_dir(Some(missing.clone())),
            Err(ConfigError::NotADirectory(missing))
        );

        let dir = tempfile::tempdir().unwrap();
        assert_eq!(
            resolve_knowledge_dir(Some(dir.path().to_path_buf())).unwrap(),
            dir.path()
        );
    }

    #[test]
    fn test_empty_region_rejected() {
        assert_eq!(
            EngineConfig::new(PathBuf::from("."), "  ".into()),
            Err(ConfigError::EmptyRegion)
        );
        let config = EngineConfig::new(PathBuf::from("."), " Lyon ".into()).unwrap();
        assert_eq!(config.default_region(), "Lyon");
    }
}
