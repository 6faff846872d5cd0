use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use crate::cli::InventoryArgs;
use crate::commands::ingest::is_supported_document;
use crate::model::{DocType, DocumentEntry, DocumentInventoryManifest};
use crate::util::{now_utc_string, sha256_file, write_json_pretty};

pub fn run(args: InventoryArgs) -> Result<()> {
    let manifest = build_manifest(&args.data_dir)?;

    if args.dry_run {
        info!(
            document_count = manifest.document_count,
            source = %manifest.source_directory,
            "inventory dry-run complete"
        );
        return Ok(());
    }

    let manifest_path = args
        .manifest_path
        .unwrap_or_else(|| default_manifest_path(&args.cache_root.join("manifests")));

    write_json_pretty(&manifest_path, &manifest)?;
    info!(path = %manifest_path.display(), "wrote inventory manifest");
    info!(document_count = manifest.document_count, "inventory completed");

    Ok(())
}

pub fn default_manifest_path(manifest_dir: &Path) -> PathBuf {
    manifest_dir.join("document_inventory.json")
}

pub fn build_manifest(data_dir: &Path) -> Result<DocumentInventoryManifest> {
    let mut paths = discover_documents(data_dir)?;
    paths.sort();

    if paths.is_empty() {
        warn!(data_dir = %data_dir.display(), "no supported documents found");
    }

    let documents = paths
        .iter()
        .map(|path| describe_document(path))
        .collect::<Result<Vec<_>>>()?;

    Ok(DocumentInventoryManifest {
        manifest_version: 1,
        generated_at: now_utc_string(),
        source_directory: data_dir.display().to_string(),
        document_count: documents.len(),
        documents,
    })
}

pub fn describe_document(path: &Path) -> Result<DocumentEntry> {
    let filename = path
        .file_name()
        .and_then(|name| name.to_str())
        .map(ToOwned::to_owned)
        .with_context(|| format!("invalid UTF-8 filename: {}", path.display()))?;
    let bytes = fs::metadata(path)
        .with_context(|| format!("failed to stat {}", path.display()))?
        .len();

    Ok(DocumentEntry {
        doc_type: DocType::from_filename(&filename),
        content_type: mime_guess::from_path(path)
            .first_or_octet_stream()
            .essence_str()
            .to_string(),
        sha256: sha256_file(path)?,
        bytes,
        filename,
    })
}

fn discover_documents(data_dir: &Path) -> Result<Vec<PathBuf>> {
    let mut documents = Vec::new();

    let entries =
        fs::read_dir(data_dir).with_context(|| format!("failed to read {}", data_dir.display()))?;

    for entry in entries {
        let entry =
            entry.with_context(|| format!("failed to read entry in {}", data_dir.display()))?;
        let path = entry.path();

        if !entry
            .file_type()
            .with_context(|| format!("failed to inspect file type: {}", path.display()))?
            .is_file()
        {
            continue;
        }

        let hidden = entry.file_name().to_string_lossy().starts_with('.');
        if hidden || !is_supported_document(&path) {
            debug!(path = %path.display(), "skipping file");
            continue;
        }

        documents.push(path);
    }

    Ok(documents)
}
