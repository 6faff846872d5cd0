use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::Result;
use serde::Deserialize;
use tracing::{info, warn};

use crate::chunking::ChunkConfig;
use crate::cli::IngestArgs;
use crate::util::read_json;

/// Who may read which source document. Loaded from a JSON file of the form
/// `{"default_users": [...], "documents": {"<filename>": [...]}}`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AccessPolicy {
    #[serde(default)]
    pub default_users: Vec<String>,
    #[serde(default)]
    pub documents: BTreeMap<String, Vec<String>>,
}

impl AccessPolicy {
    pub fn load(path: &Path) -> Result<Self> {
        let policy: Self = read_json(path)?;
        info!(
            path = %path.display(),
            documents = policy.documents.len(),
            default_users = policy.default_users.len(),
            "loaded access policy"
        );
        Ok(policy)
    }

    pub fn allowed_users_for(&self, filename: &str) -> Vec<String> {
        self.documents
            .get(filename)
            .unwrap_or(&self.default_users)
            .clone()
    }
}

/// Process-wide settings, resolved once from the command line and passed by
/// reference to every collaborator.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub project_id: String,
    pub data_dir: PathBuf,
    pub cache_root: PathBuf,
    pub manifest_dir: PathBuf,
    pub db_path: PathBuf,
    pub bucket_root: PathBuf,
    pub chunking: ChunkConfig,
    pub access: AccessPolicy,
}

impl AppConfig {
    pub fn from_ingest_args(args: &IngestArgs) -> Result<Self> {
        let access = match &args.acl_path {
            Some(path) => AccessPolicy::load(path)?,
            None => {
                warn!("no access policy given; documents default to an empty user list");
                AccessPolicy::default()
            }
        };

        Ok(Self {
            project_id: args.project_id.clone(),
            data_dir: args.data_dir.clone(),
            cache_root: args.cache_root.clone(),
            manifest_dir: args.cache_root.join("manifests"),
            db_path: args
                .db_path
                .clone()
                .unwrap_or_else(|| default_db_path(&args.cache_root)),
            bucket_root: args
                .bucket_root
                .clone()
                .unwrap_or_else(|| args.cache_root.join("objects")),
            chunking: args.chunking.to_config(),
            access,
        })
    }
}

pub fn default_db_path(cache_root: &Path) -> PathBuf {
    cache_root.join("govchunk_index.sqlite")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn access_policy_falls_back_to_default_users() {
        let policy: AccessPolicy = serde_json::from_str(
            r#"{
                "default_users": ["Records Office"],
                "documents": {"Board_Minutes_Jan_2026.pdf": ["Chair", "Secretary"]}
            }"#,
        )
        .expect("policy parses");

        assert_eq!(
            policy.allowed_users_for("Board_Minutes_Jan_2026.pdf"),
            vec!["Chair".to_string(), "Secretary".to_string()]
        );
        assert_eq!(
            policy.allowed_users_for("Code of Conduct.pdf"),
            vec!["Records Office".to_string()]
        );
    }

    #[test]
    fn empty_access_policy_denies_by_default() {
        let policy = AccessPolicy::default();

        assert!(policy.allowed_users_for("anything.txt").is_empty());
    }
}
