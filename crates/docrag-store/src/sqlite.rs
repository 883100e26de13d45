//! SQLite-based storage implementation.

use std::path::Path;
use std::str::FromStr;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rusqlite::{params, params_from_iter, Connection, OpenFlags, OptionalExtension, Row};
use tracing::{debug, info};
use ulid::Ulid;

use docrag_core::{
    Chunk, ChunkStore, Document, DocumentStatus, DocumentStore, RagError, Result, StatusExtra,
};

use crate::schema::{SCHEMA, SCHEMA_VERSION};

/// SQLite-based store implementing both [`DocumentStore`] and
/// [`ChunkStore`].
///
/// Uses a blocking Mutex for thread-safe access; operations are short
/// single-statement transactions so holding the lock across a call is
/// acceptable.
pub struct SqliteStore {
    /// Connection wrapped in blocking Mutex.
    conn: Arc<Mutex<Connection>>,
}

// Manually implement Send + Sync since Connection is protected by Mutex
unsafe impl Send for SqliteStore {}
unsafe impl Sync for SqliteStore {}

/// Encode an embedding as a little-endian f32 blob.
fn encode_embedding(embedding: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(embedding.len() * 4);
    for v in embedding {
        bytes.extend_from_slice(&v.to_le_bytes());
    }
    bytes
}

/// Decode a little-endian f32 blob back into an embedding.
fn decode_embedding(bytes: &[u8]) -> Result<Vec<f32>> {
    if bytes.len() % 4 != 0 {
        return Err(RagError::database(format!(
            "Corrupt embedding blob: {} bytes is not a multiple of 4",
            bytes.len()
        )));
    }
    Ok(bytes
        .chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect())
}

impl SqliteStore {
    /// Open or create a database at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_CREATE
                | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(|e| RagError::database(format!("Failed to open database: {}", e)))?;

        let store = Self::init(conn)?;
        info!("Database opened at {:?}", path);
        Ok(store)
    }

    /// Open an in-memory database (for testing).
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| RagError::database(format!("Failed to open in-memory database: {}", e)))?;

        Self::init(conn)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute_batch(
            r#"
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA busy_timeout = 30000;
            PRAGMA foreign_keys = ON;
            "#,
        )
        .map_err(|e| RagError::database(format!("Failed to configure connection: {}", e)))?;

        conn.execute_batch(SCHEMA)
            .map_err(|e| RagError::database(format!("Failed to initialize schema: {}", e)))?;

        conn.pragma_update(None, "user_version", SCHEMA_VERSION)
            .map_err(|e| RagError::database(format!("Failed to set schema version: {}", e)))?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Execute a blocking operation on the connection.
    fn with_conn<F, R>(&self, f: F) -> Result<R>
    where
        F: FnOnce(&Connection) -> Result<R>,
    {
        let conn = self
            .conn
            .lock()
            .map_err(|e| RagError::database(e.to_string()))?;
        f(&conn)
    }
}

/// Parse a stored ULID column, mapping corruption to a row-level error.
fn parse_ulid(column: usize, value: &str) -> rusqlite::Result<Ulid> {
    Ulid::from_str(value).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(column, rusqlite::types::Type::Text, Box::new(e))
    })
}

fn row_to_document(row: &Row<'_>) -> rusqlite::Result<(Document, String)> {
    let id: String = row.get(0)?;
    let status: String = row.get(3)?;
    Ok((
        Document {
            id: parse_ulid(0, &id)?,
            filename: row.get(1)?,
            url: row.get(2)?,
            status: DocumentStatus::Pending, // patched from the status string below
            error_message: row.get(4)?,
            size: row.get::<_, i64>(5)? as u64,
            total_chunks: row.get::<_, i64>(6)? as u32,
            created_at: row.get::<_, i64>(7)? as u64,
        },
        status,
    ))
}

fn row_to_chunk(row: &Row<'_>) -> rusqlite::Result<Chunk> {
    let doc_id: String = row.get(1)?;
    let embedding: Option<Vec<u8>> = row.get(8)?;
    Ok(Chunk {
        id: row.get(0)?,
        doc_id: parse_ulid(1, &doc_id)?,
        page: row.get::<_, i64>(2)? as u32,
        chunk_index: row.get::<_, i64>(3)? as u32,
        content: row.get(4)?,
        filename: row.get(5)?,
        source_url: row.get(6)?,
        section: row.get(7)?,
        // Corrupt blobs are dropped rather than failing the whole read;
        // the backfill will recompute them.
        embedding: embedding.and_then(|b| decode_embedding(&b).ok()),
    })
}

const DOCUMENT_COLUMNS: &str =
    "id, filename, url, status, error_message, size, total_chunks, created_at";

const CHUNK_COLUMNS: &str =
    "id, doc_id, page, chunk_index, content, filename, source_url, section, embedding";

fn id_placeholders(count: usize) -> String {
    (1..=count)
        .map(|i| format!("?{}", i))
        .collect::<Vec<_>>()
        .join(", ")
}

#[async_trait]
impl DocumentStore for SqliteStore {
    async fn insert_document(&self, doc: Document) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                r#"
                INSERT INTO documents (id, filename, url, status, error_message,
                                       size, total_chunks, created_at)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                "#,
                params![
                    doc.id.to_string(),
                    doc.filename,
                    doc.url,
                    doc.status.to_string(),
                    doc.error_message,
                    doc.size as i64,
                    doc.total_chunks as i64,
                    doc.created_at as i64,
                ],
            )
            .map_err(|e| RagError::database(format!("Failed to insert document: {}", e)))?;

            debug!("Inserted document: {}", doc.id);
            Ok(())
        })
    }

    async fn get_documents(
        &self,
        ids: &[Ulid],
        status: Option<DocumentStatus>,
    ) -> Result<Vec<Document>> {
        let id_strings: Vec<String> = ids.iter().map(|id| id.to_string()).collect();

        self.with_conn(|conn| {
            // Empty `ids` means all documents.
            let mut sql = format!("SELECT {} FROM documents", DOCUMENT_COLUMNS);
            let mut clauses = Vec::new();
            if !id_strings.is_empty() {
                clauses.push(format!("id IN ({})", id_placeholders(id_strings.len())));
            }
            if status.is_some() {
                clauses.push(format!("status = ?{}", id_strings.len() + 1));
            }
            if !clauses.is_empty() {
                sql.push_str(" WHERE ");
                sql.push_str(&clauses.join(" AND "));
            }
            sql.push_str(" ORDER BY created_at");

            let mut bindings = id_strings.clone();
            if let Some(s) = status {
                bindings.push(s.to_string());
            }

            let mut stmt = conn
                .prepare(&sql)
                .map_err(|e| RagError::database(e.to_string()))?;

            let docs = stmt
                .query_map(params_from_iter(bindings.iter()), row_to_document)
                .map_err(|e| RagError::database(e.to_string()))?
                .collect::<std::result::Result<Vec<_>, _>>()
                .map_err(|e| RagError::database(e.to_string()))?;

            docs.into_iter()
                .map(|(mut doc, status)| {
                    doc.status = DocumentStatus::from_str(&status)
                        .map_err(RagError::database)?;
                    Ok(doc)
                })
                .collect()
        })
    }

    async fn update_status(
        &self,
        id: Ulid,
        status: DocumentStatus,
        extra: StatusExtra,
    ) -> Result<()> {
        let id_string = id.to_string();

        self.with_conn(|conn| {
            let current: Option<String> = conn
                .query_row(
                    "SELECT status FROM documents WHERE id = ?1",
                    params![id_string],
                    |row| row.get(0),
                )
                .optional()
                .map_err(|e| RagError::database(e.to_string()))?;

            let current = current.ok_or_else(|| RagError::DocumentNotFound {
                id: id_string.clone(),
            })?;
            let current = DocumentStatus::from_str(&current).map_err(RagError::database)?;

            if !current.can_transition(status) {
                return Err(RagError::InvalidTransition {
                    id: id_string.clone(),
                    from: current.to_string(),
                    to: status.to_string(),
                });
            }

            conn.execute(
                r#"
                UPDATE documents
                SET status = ?1,
                    total_chunks = COALESCE(?2, total_chunks),
                    error_message = ?3
                WHERE id = ?4
                "#,
                params![
                    status.to_string(),
                    extra.total_chunks.map(|n| n as i64),
                    extra.error_message,
                    id_string,
                ],
            )
            .map_err(|e| RagError::database(e.to_string()))?;

            debug!("Document {} moved to {}", id_string, status);
            Ok(())
        })
    }

    async fn delete_document(&self, id: Ulid) -> Result<()> {
        let id_string = id.to_string();

        self.with_conn(|conn| {
            let deleted = conn
                .execute("DELETE FROM documents WHERE id = ?1", params![id_string])
                .map_err(|e| RagError::database(e.to_string()))?;

            if deleted == 0 {
                return Err(RagError::DocumentNotFound { id: id_string });
            }

            debug!("Deleted document: {}", id_string);
            Ok(())
        })
    }
}

#[async_trait]
impl ChunkStore for SqliteStore {
    async fn get_chunks(&self, doc_ids: &[Ulid]) -> Result<Vec<Chunk>> {
        if doc_ids.is_empty() {
            return Ok(Vec::new());
        }
        let id_strings: Vec<String> = doc_ids.iter().map(|id| id.to_string()).collect();

        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {} FROM chunks WHERE doc_id IN ({}) ORDER BY doc_id, page, chunk_index",
                CHUNK_COLUMNS,
                id_placeholders(id_strings.len())
            );

            let mut stmt = conn
                .prepare(&sql)
                .map_err(|e| RagError::database(e.to_string()))?;

            let chunks = stmt
                .query_map(params_from_iter(id_strings.iter()), row_to_chunk)
                .map_err(|e| RagError::database(e.to_string()))?
                .collect::<std::result::Result<Vec<_>, _>>()
                .map_err(|e| RagError::database(e.to_string()))?;

            Ok(chunks)
        })
    }

    async fn put_chunks(&self, chunks: &[Chunk]) -> Result<()> {
        self.with_conn(|conn| {
            for chunk in chunks {
                conn.execute(
                    r#"
                    INSERT INTO chunks (id, doc_id, page, chunk_index, content,
                                        filename, source_url, section, embedding)
                    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                    ON CONFLICT(id) DO UPDATE SET
                        content = excluded.content,
                        filename = excluded.filename,
                        source_url = excluded.source_url,
                        section = excluded.section,
                        embedding = COALESCE(excluded.embedding, chunks.embedding)
                    "#,
                    params![
                        chunk.id,
                        chunk.doc_id.to_string(),
                        chunk.page as i64,
                        chunk.chunk_index as i64,
                        chunk.content,
                        chunk.filename,
                        chunk.source_url,
                        chunk.section,
                        chunk.embedding.as_deref().map(encode_embedding),
                    ],
                )
                .map_err(|e| RagError::database(format!("Failed to insert chunk: {}", e)))?;
            }

            debug!("Persisted {} chunks", chunks.len());
            Ok(())
        })
    }

    async fn update_chunk_embedding(&self, chunk_id: &str, embedding: &[f32]) -> Result<()> {
        let blob = encode_embedding(embedding);

        self.with_conn(|conn| {
            conn.execute(
                "UPDATE chunks SET embedding = ?1 WHERE id = ?2",
                params![blob, chunk_id],
            )
            .map_err(|e| RagError::database(e.to_string()))?;
            Ok(())
        })
    }

    async fn delete_chunks(&self, doc_id: Ulid) -> Result<()> {
        let id_string = doc_id.to_string();

        self.with_conn(|conn| {
            conn.execute(
                "DELETE FROM chunks WHERE doc_id = ?1",
                params![id_string],
            )
            .map_err(|e| RagError::database(e.to_string()))?;
            Ok(())
        })
    }
}
