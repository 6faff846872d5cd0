//! Persistence collaborators used by the ingest pipeline.
//!
//! The chunking engine never touches these; ingest drives them through the
//! traits below so the SQLite and local-directory backends can be replaced.

use anyhow::Result;

use crate::model::{ChunkRecord, DocumentPatch, DocumentRecord};

mod object;
mod sqlite;
#[cfg(test)]
mod tests;

pub use object::LocalObjectStore;
pub use sqlite::{DB_SCHEMA_VERSION, SqliteStore};

pub trait DocumentStore {
    /// Inserts or resets the document record with status `new` and drops any
    /// chunks stored for it by an earlier run.
    fn create_document_record(&mut self, record: &DocumentRecord) -> Result<()>;

    fn update_document_record(
        &mut self,
        project_id: &str,
        doc_id: &str,
        patch: &DocumentPatch,
    ) -> Result<()>;

    /// Replaces the document's chunk set in a single transaction.
    fn write_chunks(
        &mut self,
        project_id: &str,
        doc_id: &str,
        chunks: &[ChunkRecord],
    ) -> Result<usize>;
}

pub trait ObjectStore {
    /// Stores `data` under `object_path` and returns its URI.
    fn upload_bytes(&self, object_path: &str, data: &[u8]) -> Result<String>;
}
