use std::path::Path;

use anyhow::{Result, bail};
use chrono::Utc;
use tracing::{error, info, warn};

use super::extract::LocalTextExtractor;
use super::pipeline::{DocumentFailure, ingest_document};
use crate::chunking::Chunker;
use crate::cli::IngestArgs;
use crate::commands::inventory;
use crate::config::AppConfig;
use crate::model::{
    DocumentInventoryManifest, DocumentIngestSummary, DocumentStatus, IngestCounts, IngestPaths,
    IngestRunManifest,
};
use crate::store::{DB_SCHEMA_VERSION, LocalObjectStore, SqliteStore};
use crate::util::{
    ensure_directory, now_utc_string, read_json, utc_compact_string, write_json_pretty,
};

pub fn run(args: IngestArgs) -> Result<()> {
    let started_ts = Utc::now();
    let started_at = now_utc_string();
    let run_id = format!("run-{}", utc_compact_string(started_ts));

    let config = AppConfig::from_ingest_args(&args)?;
    ensure_directory(&config.manifest_dir)?;

    let inventory_manifest_path = args
        .inventory_manifest_path
        .clone()
        .unwrap_or_else(|| inventory::default_manifest_path(&config.manifest_dir));
    let ingest_manifest_path = args.ingest_manifest_path.clone().unwrap_or_else(|| {
        config.manifest_dir.join(format!(
            "ingest_run_{}.json",
            utc_compact_string(started_ts)
        ))
    });

    info!(
        project_id = %config.project_id,
        data_dir = %config.data_dir.display(),
        run_id = %run_id,
        "starting ingest"
    );

    let inventory = load_or_refresh_inventory(
        &config.data_dir,
        &inventory_manifest_path,
        args.refresh_inventory,
    )?;
    if inventory.documents.is_empty() {
        warn!(data_dir = %config.data_dir.display(), "no documents to ingest");
        return Ok(());
    }

    let mut store = SqliteStore::open(&config.db_path)?;
    let objects = LocalObjectStore::new(&config.bucket_root)?;
    let extractor = LocalTextExtractor;
    let chunker = Chunker::new(config.chunking)?;
    info!(
        db_path = %config.db_path.display(),
        bucket_root = %objects.root().display(),
        max_chars = chunker.config().max_chars,
        min_chars = chunker.config().min_chars,
        overlap_sentences = chunker.config().overlap_sentences,
        "collaborators ready"
    );

    let mut counts = IngestCounts {
        document_count: inventory.documents.len(),
        ..IngestCounts::default()
    };
    let mut summaries = Vec::<DocumentIngestSummary>::with_capacity(inventory.documents.len());
    let mut warnings = Vec::<String>::new();

    for entry in &inventory.documents {
        match ingest_document(
            &config,
            &chunker,
            entry,
            &mut store,
            &objects,
            &extractor,
        ) {
            Ok(outcome) => {
                counts.chunked_document_count += 1;
                counts.page_count += outcome.page_count;
                counts.empty_page_count += outcome.empty_page_count;
                counts.chunks_written += outcome.chunk_count;
                summaries.push(DocumentIngestSummary {
                    filename: entry.filename.clone(),
                    doc_id: outcome.doc_id,
                    status: DocumentStatus::Chunked,
                    page_count: outcome.page_count,
                    chunk_count: outcome.chunk_count,
                    failed_stage: None,
                    failure_reason: None,
                });
            }
            Err(failure) => {
                error!(
                    filename = %entry.filename,
                    doc_id = %failure.doc_id,
                    stage = failure.stage.as_str(),
                    error = %format!("{:#}", failure.error),
                    "document ingest failed"
                );
                counts.failed_document_count += 1;
                warnings.push(format!("{}: {failure}", entry.filename));
                summaries.push(failed_summary(&entry.filename, failure));
            }
        }
    }

    counts.docs_total = store.count_documents()?;
    counts.chunks_total = store.count_chunks()?;
    let failed_document_count = counts.failed_document_count;

    let manifest = IngestRunManifest {
        manifest_version: 1,
        run_id,
        project_id: config.project_id.clone(),
        db_schema_version: DB_SCHEMA_VERSION.to_string(),
        status: if failed_document_count == 0 {
            "completed".to_string()
        } else {
            "completed_with_failures".to_string()
        },
        started_at,
        updated_at: now_utc_string(),
        command: render_ingest_command(&args),
        chunking: *chunker.config(),
        paths: IngestPaths {
            data_dir: config.data_dir.display().to_string(),
            cache_root: config.cache_root.display().to_string(),
            manifest_dir: config.manifest_dir.display().to_string(),
            inventory_manifest_path: inventory_manifest_path.display().to_string(),
            db_path: config.db_path.display().to_string(),
            bucket_root: objects.root().display().to_string(),
        },
        counts,
        documents: summaries,
        warnings,
    };

    write_json_pretty(&ingest_manifest_path, &manifest)?;
    info!(path = %ingest_manifest_path.display(), "wrote ingest run manifest");
    info!(
        docs = manifest.counts.docs_total,
        chunks = manifest.counts.chunks_total,
        failed = failed_document_count,
        "ingest completed"
    );

    if failed_document_count > 0 {
        bail!(
            "{} of {} documents failed to ingest; see {}",
            failed_document_count,
            manifest.counts.document_count,
            ingest_manifest_path.display()
        );
    }

    Ok(())
}

fn failed_summary(filename: &str, failure: DocumentFailure) -> DocumentIngestSummary {
    DocumentIngestSummary {
        filename: filename.to_string(),
        failed_stage: Some(failure.stage.as_str().to_string()),
        failure_reason: Some(format!("{:#}", failure.error)),
        doc_id: failure.doc_id,
        status: DocumentStatus::Failed,
        page_count: 0,
        chunk_count: 0,
    }
}

fn load_or_refresh_inventory(
    data_dir: &Path,
    inventory_manifest_path: &Path,
    refresh_inventory: bool,
) -> Result<DocumentInventoryManifest> {
    if !refresh_inventory && inventory_manifest_path.exists() {
        let manifest: DocumentInventoryManifest = read_json(inventory_manifest_path)?;
        if manifest.source_directory == data_dir.display().to_string() {
            info!(
                path = %inventory_manifest_path.display(),
                document_count = manifest.document_count,
                "loaded existing inventory manifest"
            );
            return Ok(manifest);
        }

        warn!(
            path = %inventory_manifest_path.display(),
            source = %manifest.source_directory,
            "inventory manifest covers another directory; rebuilding"
        );
    }

    let manifest = inventory::build_manifest(data_dir)?;
    write_json_pretty(inventory_manifest_path, &manifest)?;
    info!(
        path = %inventory_manifest_path.display(),
        document_count = manifest.document_count,
        "refreshed inventory manifest"
    );
    Ok(manifest)
}

pub(super) fn render_ingest_command(args: &IngestArgs) -> String {
    let mut command = vec![
        "govchunk".to_string(),
        "ingest".to_string(),
        "--data-dir".to_string(),
        args.data_dir.display().to_string(),
        "--cache-root".to_string(),
        args.cache_root.display().to_string(),
        "--project-id".to_string(),
        args.project_id.clone(),
    ];

    if let Some(path) = &args.db_path {
        command.push("--db-path".to_string());
        command.push(path.display().to_string());
    }
    if let Some(path) = &args.bucket_root {
        command.push("--bucket-root".to_string());
        command.push(path.display().to_string());
    }
    if let Some(path) = &args.acl_path {
        command.push("--acl-path".to_string());
        command.push(path.display().to_string());
    }
    if let Some(path) = &args.inventory_manifest_path {
        command.push("--inventory-manifest-path".to_string());
        command.push(path.display().to_string());
    }
    if let Some(path) = &args.ingest_manifest_path {
        command.push("--ingest-manifest-path".to_string());
        command.push(path.display().to_string());
    }
    if args.refresh_inventory {
        command.push("--refresh-inventory".to_string());
    }

    command.push("--max-chars".to_string());
    command.push(args.chunking.max_chars.to_string());
    command.push("--min-chars".to_string());
    command.push(args.chunking.min_chars.to_string());
    command.push("--overlap-sentences".to_string());
    command.push(args.chunking.overlap_sentences.to_string());

    command.join(" ")
}
