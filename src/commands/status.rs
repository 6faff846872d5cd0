use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::cli::StatusArgs;
use crate::commands::inventory;
use crate::config::default_db_path;
use crate::model::{DocumentInventoryManifest, IngestRunManifest};
use crate::store::SqliteStore;
use crate::util::read_json;

pub fn run(args: StatusArgs) -> Result<()> {
    let manifest_dir = args.cache_root.join("manifests");
    let inventory_path = inventory::default_manifest_path(&manifest_dir);
    let db_path = args
        .db_path
        .clone()
        .unwrap_or_else(|| default_db_path(&args.cache_root));

    info!(cache_root = %args.cache_root.display(), "status requested");

    match latest_ingest_manifest(&manifest_dir)? {
        Some(path) => {
            let manifest: IngestRunManifest = read_json(&path)?;
            info!(
                path = %path.display(),
                run_id = %manifest.run_id,
                project_id = %manifest.project_id,
                status = %manifest.status,
                started_at = %manifest.started_at,
                updated_at = %manifest.updated_at,
                documents = manifest.counts.document_count,
                chunked = manifest.counts.chunked_document_count,
                failed = manifest.counts.failed_document_count,
                chunks_written = manifest.counts.chunks_written,
                "loaded latest ingest run manifest"
            );
            for summary in manifest
                .documents
                .iter()
                .filter(|summary| summary.failed_stage.is_some())
            {
                warn!(
                    filename = %summary.filename,
                    doc_id = %summary.doc_id,
                    stage = %summary.failed_stage.as_deref().unwrap_or_default(),
                    reason = %summary.failure_reason.as_deref().unwrap_or_default(),
                    "document failed in last run"
                );
            }
        }
        None => warn!(path = %manifest_dir.display(), "no ingest run manifest found"),
    }

    if inventory_path.exists() {
        let inventory: DocumentInventoryManifest = read_json(&inventory_path)?;
        info!(
            generated_at = %inventory.generated_at,
            document_count = inventory.document_count,
            source = %inventory.source_directory,
            "loaded inventory manifest"
        );
    } else {
        warn!(path = %inventory_path.display(), "inventory manifest missing");
    }

    if db_path.exists() {
        let store = SqliteStore::open_read_only(&db_path)?;
        info!(
            path = %db_path.display(),
            schema_version = %store.schema_version()?.unwrap_or_default(),
            docs = store.count_documents()?,
            chunks = store.count_chunks()?,
            "database status"
        );
        for (status, count) in store.count_documents_by_status()? {
            info!(status = %status, count, "documents by status");
        }
    } else {
        warn!(path = %db_path.display(), "database file missing");
    }

    Ok(())
}

/// Newest `ingest_run_*.json` in `manifest_dir`. The compact UTC timestamp
/// in the name sorts chronologically.
fn latest_ingest_manifest(manifest_dir: &Path) -> Result<Option<PathBuf>> {
    if !manifest_dir.exists() {
        return Ok(None);
    }

    let entries = fs::read_dir(manifest_dir)
        .with_context(|| format!("failed to read {}", manifest_dir.display()))?;

    let mut latest: Option<PathBuf> = None;
    for entry in entries {
        let entry =
            entry.with_context(|| format!("failed to read entry in {}", manifest_dir.display()))?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if !(name.starts_with("ingest_run_") && name.ends_with(".json")) {
            continue;
        }

        let path = entry.path();
        if latest.as_ref().is_none_or(|current| path > *current) {
            latest = Some(path);
        }
    }

    Ok(latest)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn latest_ingest_manifest_picks_newest_timestamp() {
        let dir = tempfile::tempdir().expect("tempdir");
        for name in [
            "ingest_run_20260105T100000Z.json",
            "ingest_run_20260107T090000Z.json",
            "document_inventory.json",
            "ingest_run_20260106T235959Z.json",
        ] {
            fs::write(dir.path().join(name), "{}").expect("write");
        }

        let latest = latest_ingest_manifest(dir.path()).expect("scan");

        assert_eq!(
            latest,
            Some(dir.path().join("ingest_run_20260107T090000Z.json"))
        );
    }

    #[test]
    fn missing_manifest_dir_has_no_latest_run() {
        let dir = tempfile::tempdir().expect("tempdir");

        let latest = latest_ingest_manifest(&dir.path().join("absent")).expect("scan");

        assert_eq!(latest, None);
    }
}
