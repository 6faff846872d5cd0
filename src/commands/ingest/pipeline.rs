use std::fmt;
use std::fs;

use anyhow::{Context, Error};
use tracing::{info, warn};

use super::extract::TextExtractor;
use crate::chunking::{Chunk, Chunker};
use crate::config::AppConfig;
use crate::model::{
    ChunkRecord, ChunkSource, DocumentEntry, DocumentPatch, DocumentRecord, DocumentStatus,
};
use crate::store::{DocumentStore, ObjectStore};
use crate::util::{now_utc_string, sha256_hex};

const DOC_ID_HEX_CHARS: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestStage {
    Register,
    Store,
    Extract,
    Chunk,
}

impl IngestStage {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Register => "register",
            Self::Store => "store",
            Self::Extract => "extract",
            Self::Chunk => "chunk",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentOutcome {
    pub doc_id: String,
    pub object_uri: String,
    pub page_count: usize,
    pub empty_page_count: usize,
    pub chunk_count: usize,
}

/// A document that stopped at `stage`. Nothing was written for it past the
/// last completed stage and its record is marked failed.
#[derive(Debug)]
pub struct DocumentFailure {
    pub doc_id: String,
    pub stage: IngestStage,
    pub error: Error,
}

impl fmt::Display for DocumentFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} stage failed for {}: {:#}",
            self.stage.as_str(),
            self.doc_id,
            self.error
        )
    }
}

impl std::error::Error for DocumentFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(self.error.as_ref())
    }
}

pub fn document_id(project_id: &str, filename: &str) -> String {
    let mut digest = sha256_hex(format!("{project_id}:{filename}").as_bytes());
    digest.truncate(DOC_ID_HEX_CHARS);
    format!("doc-{digest}")
}

pub fn object_path(doc_id: &str, filename: &str) -> String {
    format!("raw/{doc_id}/{filename}")
}

/// Runs one document through register, store, extract and chunk, updating
/// its status after each stage.
pub fn ingest_document(
    config: &AppConfig,
    chunker: &Chunker,
    entry: &DocumentEntry,
    store: &mut dyn DocumentStore,
    objects: &dyn ObjectStore,
    extractor: &dyn TextExtractor,
) -> Result<DocumentOutcome, DocumentFailure> {
    let doc_id = document_id(&config.project_id, &entry.filename);
    let allowed_users = config.access.allowed_users_for(&entry.filename);

    let record = DocumentRecord {
        project_id: config.project_id.clone(),
        doc_id: doc_id.clone(),
        source_filename: entry.filename.clone(),
        sha256: entry.sha256.clone(),
        content_type: entry.content_type.clone(),
        doc_type: entry.doc_type,
        allowed_users: allowed_users.clone(),
        ingested_at: now_utc_string(),
    };
    store
        .create_document_record(&record)
        .map_err(|error| DocumentFailure {
            doc_id: doc_id.clone(),
            stage: IngestStage::Register,
            error,
        })?;

    let staged = run_stages(
        config,
        chunker,
        entry,
        &doc_id,
        &allowed_users,
        store,
        objects,
        extractor,
    );

    match staged {
        Ok(outcome) => {
            info!(
                filename = %entry.filename,
                doc_id = %outcome.doc_id,
                pages = outcome.page_count,
                chunks = outcome.chunk_count,
                object_uri = %outcome.object_uri,
                "ingested document"
            );
            Ok(outcome)
        }
        Err((stage, error)) => {
            let patch = DocumentPatch {
                failed_stage: Some(stage.as_str().to_string()),
                failure_reason: Some(format!("{error:#}")),
                ..DocumentPatch::status(DocumentStatus::Failed)
            };
            if let Err(mark_error) =
                store.update_document_record(&config.project_id, &doc_id, &patch)
            {
                warn!(
                    doc_id = %doc_id,
                    error = %mark_error,
                    "failed to mark document as failed"
                );
            }

            Err(DocumentFailure {
                doc_id,
                stage,
                error,
            })
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn run_stages(
    config: &AppConfig,
    chunker: &Chunker,
    entry: &DocumentEntry,
    doc_id: &str,
    allowed_users: &[String],
    store: &mut dyn DocumentStore,
    objects: &dyn ObjectStore,
    extractor: &dyn TextExtractor,
) -> Result<DocumentOutcome, (IngestStage, Error)> {
    let project_id = config.project_id.as_str();
    let path = config.data_dir.join(&entry.filename);

    let raw_bytes = fs::read(&path)
        .with_context(|| format!("failed to read {}", path.display()))
        .map_err(|error| (IngestStage::Store, error))?;
    let sha256 = sha256_hex(&raw_bytes);
    if sha256 != entry.sha256 {
        warn!(
            filename = %entry.filename,
            inventory_sha256 = %entry.sha256,
            sha256 = %sha256,
            "file changed since inventory; recording hash of ingested bytes"
        );
    }
    let object_uri = objects
        .upload_bytes(&object_path(doc_id, &entry.filename), &raw_bytes)
        .map_err(|error| (IngestStage::Store, error))?;
    store
        .update_document_record(
            project_id,
            doc_id,
            &DocumentPatch {
                sha256: Some(sha256),
                object_uri: Some(object_uri.clone()),
                ..DocumentPatch::status(DocumentStatus::Stored)
            },
        )
        .map_err(|error| (IngestStage::Store, error))?;

    let pages = extractor
        .extract(&path, &raw_bytes)
        .map_err(|error| (IngestStage::Extract, error))?;
    let empty_page_count = pages
        .iter()
        .filter(|page| page.text.trim().is_empty())
        .count();
    store
        .update_document_record(
            project_id,
            doc_id,
            &DocumentPatch {
                page_count: Some(pages.len()),
                ..DocumentPatch::status(DocumentStatus::Extracted)
            },
        )
        .map_err(|error| (IngestStage::Extract, error))?;

    let chunks = chunker.chunk_pages(doc_id, &pages);
    let records = enrich_chunks(
        chunks,
        project_id,
        doc_id,
        allowed_users,
        &entry.filename,
        &object_uri,
    );
    let chunk_count = store
        .write_chunks(project_id, doc_id, &records)
        .map_err(|error| (IngestStage::Chunk, error))?;
    store
        .update_document_record(
            project_id,
            doc_id,
            &DocumentPatch {
                chunk_count: Some(chunk_count),
                ..DocumentPatch::status(DocumentStatus::Chunked)
            },
        )
        .map_err(|error| (IngestStage::Chunk, error))?;

    Ok(DocumentOutcome {
        doc_id: doc_id.to_string(),
        object_uri,
        page_count: pages.len(),
        empty_page_count,
        chunk_count,
    })
}

pub fn enrich_chunks(
    chunks: Vec<Chunk>,
    project_id: &str,
    doc_id: &str,
    allowed_users: &[String],
    filename: &str,
    object_uri: &str,
) -> Vec<ChunkRecord> {
    chunks
        .into_iter()
        .map(|chunk| ChunkRecord {
            chunk,
            doc_id: doc_id.to_string(),
            project_id: project_id.to_string(),
            allowed_users: allowed_users.to_vec(),
            source_filename: filename.to_string(),
            source: ChunkSource {
                filename: filename.to_string(),
                object_uri: object_uri.to_string(),
            },
        })
        .collect()
}
