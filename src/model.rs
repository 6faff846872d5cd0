use serde::{Deserialize, Serialize};

use crate::chunking::{Chunk, ChunkConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocType {
    Minutes,
    Coi,
    Policy,
}

impl DocType {
    pub fn from_filename(filename: &str) -> Self {
        if filename.contains("Board_Minutes") {
            Self::Minutes
        } else if filename.contains("COI") {
            Self::Coi
        } else {
            Self::Policy
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Minutes => "minutes",
            Self::Coi => "coi",
            Self::Policy => "policy",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentStatus {
    New,
    Stored,
    Extracted,
    Chunked,
    Failed,
}

impl DocumentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Stored => "stored",
            Self::Extracted => "extracted",
            Self::Chunked => "chunked",
            Self::Failed => "failed",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentEntry {
    pub filename: String,
    pub doc_type: DocType,
    pub content_type: String,
    pub bytes: u64,
    pub sha256: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentInventoryManifest {
    pub manifest_version: u32,
    pub generated_at: String,
    pub source_directory: String,
    pub document_count: usize,
    pub documents: Vec<DocumentEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DocumentRecord {
    pub project_id: String,
    pub doc_id: String,
    pub source_filename: String,
    pub sha256: String,
    pub content_type: String,
    pub doc_type: DocType,
    pub allowed_users: Vec<String>,
    pub ingested_at: String,
}

/// Partial document update; `None` fields are left as stored.
#[derive(Debug, Clone, Default)]
pub struct DocumentPatch {
    pub status: Option<DocumentStatus>,
    pub sha256: Option<String>,
    pub object_uri: Option<String>,
    pub page_count: Option<usize>,
    pub chunk_count: Option<usize>,
    pub failed_stage: Option<String>,
    pub failure_reason: Option<String>,
}

impl DocumentPatch {
    pub fn status(status: DocumentStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkSource {
    pub filename: String,
    pub object_uri: String,
}

/// A chunk enriched with the provenance and access fields the chunker never
/// sets itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkRecord {
    #[serde(flatten)]
    pub chunk: Chunk,
    pub doc_id: String,
    pub project_id: String,
    pub allowed_users: Vec<String>,
    pub source_filename: String,
    pub source: ChunkSource,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestPaths {
    pub data_dir: String,
    pub cache_root: String,
    pub manifest_dir: String,
    pub inventory_manifest_path: String,
    pub db_path: String,
    pub bucket_root: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IngestCounts {
    pub document_count: usize,
    pub chunked_document_count: usize,
    pub failed_document_count: usize,
    pub page_count: usize,
    pub empty_page_count: usize,
    pub chunks_written: usize,
    pub docs_total: i64,
    pub chunks_total: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentIngestSummary {
    pub filename: String,
    pub doc_id: String,
    pub status: DocumentStatus,
    pub page_count: usize,
    pub chunk_count: usize,
    pub failed_stage: Option<String>,
    pub failure_reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestRunManifest {
    pub manifest_version: u32,
    pub run_id: String,
    pub project_id: String,
    pub db_schema_version: String,
    pub status: String,
    pub started_at: String,
    pub updated_at: String,
    pub command: String,
    pub chunking: ChunkConfig,
    pub paths: IngestPaths,
    pub counts: IngestCounts,
    pub documents: Vec<DocumentIngestSummary>,
    pub warnings: Vec<String>,
}
