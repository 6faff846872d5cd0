use std::path::Path;

use anyhow::{Context, Result, bail};
use rusqlite::{Connection, OpenFlags, OptionalExtension, params};

use super::DocumentStore;
use crate::model::{ChunkRecord, DocumentPatch, DocumentRecord, DocumentStatus};
use crate::util::{ensure_directory, now_utc_string};

pub const DB_SCHEMA_VERSION: &str = "0.1.0";

#[derive(Debug)]
pub struct SqliteStore {
    connection: Connection,
}

impl SqliteStore {
    pub fn open(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            ensure_directory(parent)?;
        }

        let connection = Connection::open(db_path)
            .with_context(|| format!("failed to open {}", db_path.display()))?;
        configure_connection(&connection)?;
        Self::with_connection(connection)
    }

    /// Opens an existing database for reporting. The schema is neither
    /// created nor touched and every write fails.
    pub fn open_read_only(db_path: &Path) -> Result<Self> {
        let connection = Connection::open_with_flags(
            db_path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .with_context(|| format!("failed to open {} read-only", db_path.display()))?;
        Ok(Self { connection })
    }

    #[cfg(test)]
    pub fn open_in_memory() -> Result<Self> {
        let connection = Connection::open_in_memory().context("failed to open in-memory db")?;
        Self::with_connection(connection)
    }

    fn with_connection(connection: Connection) -> Result<Self> {
        ensure_schema(&connection)?;
        Ok(Self { connection })
    }

    pub fn count_documents(&self) -> Result<i64> {
        count_rows(&self.connection, "SELECT COUNT(*) FROM documents")
    }

    pub fn count_chunks(&self) -> Result<i64> {
        count_rows(&self.connection, "SELECT COUNT(*) FROM chunks")
    }

    pub fn count_documents_by_status(&self) -> Result<Vec<(String, i64)>> {
        let mut statement = self.connection.prepare(
            "
            SELECT status, COUNT(*)
            FROM documents
            GROUP BY status
            ORDER BY status ASC
            ",
        )?;

        let rows = statement
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<rusqlite::Result<Vec<(String, i64)>>>()?;
        Ok(rows)
    }

    pub fn schema_version(&self) -> Result<Option<String>> {
        let version = self
            .connection
            .query_row(
                "SELECT value FROM metadata WHERE key = 'db_schema_version'",
                [],
                |row| row.get(0),
            )
            .optional()?;
        Ok(version)
    }

    #[cfg(test)]
    pub fn document_status(
        &self,
        project_id: &str,
        doc_id: &str,
    ) -> Result<Option<DocumentStatusRow>> {
        let row = self
            .connection
            .query_row(
                "
                SELECT status, sha256, object_uri, page_count, chunk_count, failed_stage,
                  failure_reason
                FROM documents
                WHERE project_id = ?1 AND doc_id = ?2
                ",
                params![project_id, doc_id],
                |row| {
                    Ok(DocumentStatusRow {
                        status: row.get(0)?,
                        sha256: row.get(1)?,
                        object_uri: row.get(2)?,
                        page_count: row.get(3)?,
                        chunk_count: row.get(4)?,
                        failed_stage: row.get(5)?,
                        failure_reason: row.get(6)?,
                    })
                },
            )
            .optional()?;
        Ok(row)
    }

    #[cfg(test)]
    pub fn load_chunks(&self, project_id: &str, doc_id: &str) -> Result<Vec<ChunkRecord>> {
        let mut statement = self.connection.prepare(
            "
            SELECT record_json
            FROM chunks
            WHERE project_id = ?1 AND doc_id = ?2
            ORDER BY ordinal ASC
            ",
        )?;

        let mut rows = statement.query(params![project_id, doc_id])?;
        let mut out = Vec::<ChunkRecord>::new();
        while let Some(row) = rows.next()? {
            let raw: String = row.get(0)?;
            out.push(serde_json::from_str(&raw).context("failed to parse stored chunk record")?);
        }
        Ok(out)
    }
}

#[cfg(test)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentStatusRow {
    pub status: String,
    pub sha256: String,
    pub object_uri: Option<String>,
    pub page_count: Option<i64>,
    pub chunk_count: Option<i64>,
    pub failed_stage: Option<String>,
    pub failure_reason: Option<String>,
}

impl DocumentStore for SqliteStore {
    fn create_document_record(&mut self, record: &DocumentRecord) -> Result<()> {
        let allowed_users = serde_json::to_string(&record.allowed_users)
            .context("failed to serialize allowed users")?;
        let updated_at = now_utc_string();

        let transaction = self
            .connection
            .transaction()
            .context("failed to start document transaction")?;

        // a re-registered document starts with no chunks
        transaction
            .execute(
                "DELETE FROM chunks WHERE project_id = ?1 AND doc_id = ?2",
                params![record.project_id, record.doc_id],
            )
            .with_context(|| format!("failed to clear chunks for {}", record.doc_id))?;

        transaction
            .execute(
                "
                INSERT INTO documents(
                  project_id, doc_id, source_filename, sha256, content_type, doc_type,
                  allowed_users, ingested_at, status, object_uri, page_count, chunk_count,
                  failed_stage, failure_reason, updated_at
                )
                VALUES(?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, NULL, NULL, NULL, NULL, NULL, ?10)
                ON CONFLICT(project_id, doc_id) DO UPDATE SET
                  source_filename=excluded.source_filename,
                  sha256=excluded.sha256,
                  content_type=excluded.content_type,
                  doc_type=excluded.doc_type,
                  allowed_users=excluded.allowed_users,
                  ingested_at=excluded.ingested_at,
                  status=excluded.status,
                  object_uri=NULL,
                  page_count=NULL,
                  chunk_count=NULL,
                  failed_stage=NULL,
                  failure_reason=NULL,
                  updated_at=excluded.updated_at
                ",
                params![
                    record.project_id,
                    record.doc_id,
                    record.source_filename,
                    record.sha256,
                    record.content_type,
                    record.doc_type.as_str(),
                    allowed_users,
                    record.ingested_at,
                    DocumentStatus::New.as_str(),
                    updated_at,
                ],
            )
            .with_context(|| format!("failed to upsert document {}", record.doc_id))?;

        transaction
            .commit()
            .with_context(|| format!("failed to commit document {}", record.doc_id))?;

        Ok(())
    }

    fn update_document_record(
        &mut self,
        project_id: &str,
        doc_id: &str,
        patch: &DocumentPatch,
    ) -> Result<()> {
        let updated = self
            .connection
            .execute(
                "
                UPDATE documents SET
                  status = COALESCE(?3, status),
                  object_uri = COALESCE(?4, object_uri),
                  page_count = COALESCE(?5, page_count),
                  chunk_count = COALESCE(?6, chunk_count),
                  failed_stage = COALESCE(?7, failed_stage),
                  failure_reason = COALESCE(?8, failure_reason),
                  sha256 = COALESCE(?9, sha256),
                  updated_at = ?10
                WHERE project_id = ?1 AND doc_id = ?2
                ",
                params![
                    project_id,
                    doc_id,
                    patch.status.map(DocumentStatus::as_str),
                    patch.object_uri,
                    patch.page_count.map(|value| value as i64),
                    patch.chunk_count.map(|value| value as i64),
                    patch.failed_stage,
                    patch.failure_reason,
                    patch.sha256,
                    now_utc_string(),
                ],
            )
            .with_context(|| format!("failed to update document {doc_id}"))?;

        if updated == 0 {
            bail!("document {doc_id} not found in project {project_id}");
        }
        Ok(())
    }

    fn write_chunks(
        &mut self,
        project_id: &str,
        doc_id: &str,
        chunks: &[ChunkRecord],
    ) -> Result<usize> {
        let transaction = self
            .connection
            .transaction()
            .context("failed to start chunk transaction")?;

        transaction
            .execute(
                "DELETE FROM chunks WHERE project_id = ?1 AND doc_id = ?2",
                params![project_id, doc_id],
            )
            .with_context(|| format!("failed to clear chunks for {doc_id}"))?;

        {
            let mut statement = transaction.prepare(
                "
                INSERT INTO chunks(
                  project_id, doc_id, chunk_id, ordinal, page_start, page_end, title, text,
                  allowed_users, source_filename, object_uri, record_json
                )
                VALUES(?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
                ",
            )?;

            for record in chunks {
                let allowed_users = serde_json::to_string(&record.allowed_users)
                    .context("failed to serialize allowed users")?;
                let record_json =
                    serde_json::to_string(record).context("failed to serialize chunk record")?;

                statement
                    .execute(params![
                        project_id,
                        doc_id,
                        record.chunk.chunk_id,
                        record.chunk.ordinal,
                        record.chunk.page_start,
                        record.chunk.page_end,
                        record.chunk.title,
                        record.chunk.text,
                        allowed_users,
                        record.source_filename,
                        record.source.object_uri,
                        record_json,
                    ])
                    .with_context(|| {
                        format!(
                            "failed to insert chunk {} for {doc_id}",
                            record.chunk.chunk_id
                        )
                    })?;
            }
        }

        transaction
            .commit()
            .with_context(|| format!("failed to commit chunks for {doc_id}"))?;

        Ok(chunks.len())
    }
}

fn configure_connection(connection: &Connection) -> Result<()> {
    connection
        .pragma_update(None, "journal_mode", "WAL")
        .context("failed to set journal_mode=WAL")?;
    connection
        .pragma_update(None, "synchronous", "NORMAL")
        .context("failed to set synchronous=NORMAL")?;
    Ok(())
}

fn ensure_schema(connection: &Connection) -> Result<()> {
    connection
        .execute_batch(
            "
            CREATE TABLE IF NOT EXISTS metadata (
              key TEXT PRIMARY KEY,
              value TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS documents (
              project_id TEXT NOT NULL,
              doc_id TEXT NOT NULL,
              source_filename TEXT NOT NULL,
              sha256 TEXT NOT NULL,
              content_type TEXT NOT NULL,
              doc_type TEXT NOT NULL,
              allowed_users TEXT NOT NULL,
              ingested_at TEXT NOT NULL,
              status TEXT NOT NULL,
              object_uri TEXT,
              page_count INTEGER,
              chunk_count INTEGER,
              failed_stage TEXT,
              failure_reason TEXT,
              updated_at TEXT NOT NULL,
              PRIMARY KEY(project_id, doc_id)
            );

            CREATE TABLE IF NOT EXISTS chunks (
              project_id TEXT NOT NULL,
              doc_id TEXT NOT NULL,
              chunk_id TEXT NOT NULL,
              ordinal INTEGER NOT NULL,
              page_start INTEGER NOT NULL,
              page_end INTEGER NOT NULL,
              title TEXT,
              text TEXT NOT NULL,
              allowed_users TEXT NOT NULL,
              source_filename TEXT NOT NULL,
              object_uri TEXT NOT NULL,
              record_json TEXT NOT NULL,
              PRIMARY KEY(project_id, doc_id, chunk_id),
              FOREIGN KEY(project_id, doc_id) REFERENCES documents(project_id, doc_id)
            );

            CREATE INDEX IF NOT EXISTS idx_chunks_doc_ordinal ON chunks(project_id, doc_id, ordinal);
            CREATE INDEX IF NOT EXISTS idx_documents_status ON documents(status);
            ",
        )
        .context("failed to initialize schema")?;

    connection
        .execute(
            "
            INSERT INTO metadata(key, value) VALUES('db_schema_version', ?1)
            ON CONFLICT(key) DO UPDATE SET value=excluded.value
            ",
            params![DB_SCHEMA_VERSION],
        )
        .context("failed to record schema version")?;

    Ok(())
}

fn count_rows(connection: &Connection, sql: &str) -> Result<i64> {
    let count = connection.query_row(sql, [], |row| row.get(0))?;
    Ok(count)
}
