use super::*;
use crate::chunking::Chunk;
use crate::model::{ChunkSource, DocType, DocumentStatus};

fn document(doc_id: &str) -> DocumentRecord {
    DocumentRecord {
        project_id: "orion".to_string(),
        doc_id: doc_id.to_string(),
        source_filename: "Board_Minutes_Jan_2026.txt".to_string(),
        sha256: "abc123".to_string(),
        content_type: "text/plain".to_string(),
        doc_type: DocType::Minutes,
        allowed_users: vec!["Chair".to_string()],
        ingested_at: "2026-01-05T10:00:00Z".to_string(),
    }
}

fn chunk_record(doc_id: &str, ordinal: u32, text: &str) -> ChunkRecord {
    ChunkRecord {
        chunk: Chunk {
            chunk_id: format!("{doc_id}-{ordinal:03}"),
            ordinal,
            page_start: 1,
            page_end: 1,
            title: (ordinal == 1).then(|| "BOARD RESOLUTIONS".to_string()),
            text: text.to_string(),
        },
        doc_id: doc_id.to_string(),
        project_id: "orion".to_string(),
        allowed_users: vec!["Chair".to_string()],
        source_filename: "Board_Minutes_Jan_2026.txt".to_string(),
        source: ChunkSource {
            filename: "Board_Minutes_Jan_2026.txt".to_string(),
            object_uri: "file:///bucket/raw/doc/Board_Minutes_Jan_2026.txt".to_string(),
        },
    }
}

#[test]
fn schema_records_version() {
    let store = SqliteStore::open_in_memory().expect("store opens");

    assert_eq!(
        store.schema_version().expect("version query"),
        Some(DB_SCHEMA_VERSION.to_string())
    );
}

#[test]
fn document_patch_updates_only_given_fields() {
    let mut store = SqliteStore::open_in_memory().expect("store opens");
    store
        .create_document_record(&document("doc-a"))
        .expect("document created");

    store
        .update_document_record(
            "orion",
            "doc-a",
            &DocumentPatch {
                status: Some(DocumentStatus::Stored),
                object_uri: Some("file:///bucket/raw/doc-a/x".to_string()),
                ..DocumentPatch::default()
            },
        )
        .expect("stored patch");
    store
        .update_document_record(
            "orion",
            "doc-a",
            &DocumentPatch {
                page_count: Some(3),
                ..DocumentPatch::status(DocumentStatus::Extracted)
            },
        )
        .expect("extracted patch");

    let row = store
        .document_status("orion", "doc-a")
        .expect("status query")
        .expect("document exists");
    assert_eq!(row.status, "extracted");
    assert_eq!(row.object_uri.as_deref(), Some("file:///bucket/raw/doc-a/x"));
    assert_eq!(row.page_count, Some(3));
    assert_eq!(row.chunk_count, None);
}

#[test]
fn updating_unknown_document_fails() {
    let mut store = SqliteStore::open_in_memory().expect("store opens");

    let result = store.update_document_record(
        "orion",
        "missing",
        &DocumentPatch::status(DocumentStatus::Chunked),
    );

    assert!(result.is_err());
}

#[test]
fn write_chunks_replaces_previous_set() {
    let mut store = SqliteStore::open_in_memory().expect("store opens");
    store
        .create_document_record(&document("doc-a"))
        .expect("document created");

    let first = vec![
        chunk_record("doc-a", 1, "one"),
        chunk_record("doc-a", 2, "two"),
        chunk_record("doc-a", 3, "three"),
    ];
    assert_eq!(
        store
            .write_chunks("orion", "doc-a", &first)
            .expect("first write"),
        3
    );

    let second = vec![chunk_record("doc-a", 1, "one"), chunk_record("doc-a", 2, "two")];
    store
        .write_chunks("orion", "doc-a", &second)
        .expect("second write");

    let stored = store.load_chunks("orion", "doc-a").expect("chunks load");
    assert_eq!(stored, second);
    assert_eq!(store.count_chunks().expect("count"), 2);
}

#[test]
fn failed_chunk_write_leaves_previous_set_intact() {
    let mut store = SqliteStore::open_in_memory().expect("store opens");
    store
        .create_document_record(&document("doc-a"))
        .expect("document created");
    let first_set = vec![chunk_record("doc-a", 1, "one")];
    store
        .write_chunks("orion", "doc-a", &first_set)
        .expect("first write");

    // duplicate chunk ids violate the primary key half way through
    let broken = vec![
        chunk_record("doc-a", 1, "one"),
        chunk_record("doc-a", 2, "two"),
        chunk_record("doc-a", 2, "two again"),
    ];
    assert!(store.write_chunks("orion", "doc-a", &broken).is_err());

    let stored = store.load_chunks("orion", "doc-a").expect("chunks load");
    assert_eq!(stored, first_set);
}

#[test]
fn documents_are_counted_by_status() {
    let mut store = SqliteStore::open_in_memory().expect("store opens");
    for doc_id in ["doc-a", "doc-b", "doc-c"] {
        store
            .create_document_record(&document(doc_id))
            .expect("document created");
    }
    store
        .update_document_record("orion", "doc-b", &DocumentPatch::status(DocumentStatus::Chunked))
        .expect("patch");

    assert_eq!(store.count_documents().expect("count"), 3);
    assert_eq!(
        store.count_documents_by_status().expect("grouped count"),
        vec![("chunked".to_string(), 1), ("new".to_string(), 2)]
    );
}

#[test]
fn local_object_store_writes_under_root() {
    let dir = tempfile::tempdir().expect("tempdir");
    let objects = LocalObjectStore::new(&dir.path().join("bucket")).expect("bucket opens");

    let uri = objects
        .upload_bytes("raw/doc-a/minutes.txt", b"page text")
        .expect("upload");

    let stored = objects.root().join("raw/doc-a/minutes.txt");
    assert_eq!(std::fs::read(&stored).expect("object exists"), b"page text");
    assert_eq!(uri, format!("file://{}", stored.display()));
}

#[test]
fn local_object_store_rejects_escaping_paths() {
    let dir = tempfile::tempdir().expect("tempdir");
    let objects = LocalObjectStore::new(dir.path()).expect("bucket opens");

    assert!(objects.upload_bytes("../outside.txt", b"x").is_err());
    assert!(objects.upload_bytes("/etc/passwd", b"x").is_err());
}

#[test]
fn registering_again_drops_earlier_chunks() {
    let mut store = SqliteStore::open_in_memory().expect("store opens");
    store
        .create_document_record(&document("doc-a"))
        .expect("document created");
    store
        .write_chunks("orion", "doc-a", &[chunk_record("doc-a", 1, "one")])
        .expect("chunks written");

    store
        .create_document_record(&document("doc-a"))
        .expect("document registered again");

    assert!(store.load_chunks("orion", "doc-a").expect("chunks load").is_empty());
    let row = store
        .document_status("orion", "doc-a")
        .expect("status query")
        .expect("document exists");
    assert_eq!(row.status, "new");
    assert_eq!(row.chunk_count, None);
}

#[test]
fn patch_can_replace_document_hash() {
    let mut store = SqliteStore::open_in_memory().expect("store opens");
    store
        .create_document_record(&document("doc-a"))
        .expect("document created");

    store
        .update_document_record(
            "orion",
            "doc-a",
            &DocumentPatch {
                sha256: Some("def456".to_string()),
                ..DocumentPatch::status(DocumentStatus::Stored)
            },
        )
        .expect("patch");

    let row = store
        .document_status("orion", "doc-a")
        .expect("status query")
        .expect("document exists");
    assert_eq!(row.sha256, "def456");
}

#[test]
fn read_only_open_leaves_store_untouched() {
    let dir = tempfile::tempdir().expect("tempdir");
    let db_path = dir.path().join("govchunk_index.sqlite");
    {
        let mut store = SqliteStore::open(&db_path).expect("store opens");
        store
            .create_document_record(&document("doc-a"))
            .expect("document created");
    }
    {
        let connection = rusqlite::Connection::open(&db_path).expect("raw connection");
        connection
            .execute(
                "UPDATE metadata SET value = '0.0.1' WHERE key = 'db_schema_version'",
                [],
            )
            .expect("version rewritten");
    }

    let mut store = SqliteStore::open_read_only(&db_path).expect("read-only open");

    assert_eq!(
        store.schema_version().expect("version query"),
        Some("0.0.1".to_string())
    );
    assert_eq!(store.count_documents().expect("count"), 1);
    assert!(store.create_document_record(&document("doc-b")).is_err());
}
