//! SQLite-backed chunk collection with exact cosine search
//!
//! Vectors are stored as little-endian f32 blobs next to the chunk text and
//! its metadata. Queries scan the collection and rank every row, which is
//! fast enough for the few tens of thousands of chunks a legal corpus yields.

use async_trait::async_trait;
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::providers::VectorStoreProvider;
use crate::types::{Chunk, RetrievalHit};

/// Database file created inside the persistence directory
pub const DB_FILE_NAME: &str = "legal_rag.sqlite3";

/// Persistent vector collection
#[derive(Clone)]
pub struct SqliteVectorStore {
    conn: Arc<Mutex<Connection>>,
    collection: String,
}

impl SqliteVectorStore {
    /// Open the collection under `persist_dir`, creating it if needed
    pub fn open<P: AsRef<Path>>(persist_dir: P, collection: &str) -> Result<Self> {
        let dir = persist_dir.as_ref();
        std::fs::create_dir_all(dir)?;

        let path = dir.join(DB_FILE_NAME);
        let conn = Connection::open(&path)
            .map_err(|e| Error::vector_db(format!("Failed to open {}: {}", path.display(), e)))?;

        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
            collection: collection.to_string(),
        };

        store.migrate()?;
        tracing::info!(
            "Opened collection '{}' at {} ({} chunks)",
            store.collection,
            dir.display(),
            store.len()?
        );
        Ok(store)
    }

    /// Drop everything under `persist_dir`, then open a fresh collection
    pub fn recreate<P: AsRef<Path>>(persist_dir: P, collection: &str) -> Result<Self> {
        let dir = persist_dir.as_ref();
        if dir.exists() {
            tracing::info!("Removing existing vector store at {}", dir.display());
            std::fs::remove_dir_all(dir)?;
        }
        Self::open(dir, collection)
    }

    /// Create an in-memory store (for testing)
    pub fn in_memory(collection: &str) -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| Error::vector_db(format!("Failed to open in-memory database: {}", e)))?;

        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
            collection: collection.to_string(),
        };

        store.migrate()?;
        Ok(store)
    }

    /// Run database migrations
    fn migrate(&self) -> Result<()> {
        let conn = self.conn.lock();

        conn.execute_batch(
            r#"
            PRAGMA journal_mode=WAL;
            PRAGMA synchronous=NORMAL;
            PRAGMA temp_store=MEMORY;
            "#,
        )?;

        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS collections (
                name TEXT PRIMARY KEY,
                dimensions INTEGER
            );

            CREATE TABLE IF NOT EXISTS chunks (
                collection TEXT NOT NULL,
                id TEXT NOT NULL,
                text TEXT NOT NULL,
                source TEXT,
                file TEXT,
                embedding BLOB NOT NULL,
                PRIMARY KEY (collection, id)
            );

            CREATE INDEX IF NOT EXISTS idx_chunks_file ON chunks(collection, file);
            "#,
        )?;

        conn.execute(
            "INSERT OR IGNORE INTO collections (name, dimensions) VALUES (?1, NULL)",
            params![self.collection],
        )?;

        Ok(())
    }

    /// Dimension fixed by the first inserted vector
    pub fn dimensions(&self) -> Result<Option<usize>> {
        let conn = self.conn.lock();
        Self::dimensions_locked(&conn, &self.collection)
    }

    fn dimensions_locked(conn: &Connection, collection: &str) -> Result<Option<usize>> {
        let dims: Option<Option<i64>> = conn
            .query_row(
                "SELECT dimensions FROM collections WHERE name = ?1",
                params![collection],
                |row| row.get(0),
            )
            .optional()?;
        Ok(dims.flatten().map(|d| d as usize))
    }

    /// Insert or overwrite chunks by id
    pub fn upsert(&self, chunks: &[Chunk], embeddings: &[Vec<f32>]) -> Result<usize> {
        self.write(None, chunks, embeddings)
    }

    /// Delete every chunk of `file`, then insert `chunks`, in one transaction
    pub fn replace(&self, file: &str, chunks: &[Chunk], embeddings: &[Vec<f32>]) -> Result<usize> {
        self.write(Some(file), chunks, embeddings)
    }

    fn write(&self, replace_file: Option<&str>, chunks: &[Chunk], embeddings: &[Vec<f32>]) -> Result<usize> {
        if chunks.len() != embeddings.len() {
            return Err(Error::vector_db(format!(
                "Got {} chunks but {} embeddings",
                chunks.len(),
                embeddings.len()
            )));
        }

        let mut conn = self.conn.lock();
        let mut dims = Self::dimensions_locked(&conn, &self.collection)?;
        for embedding in embeddings {
            match dims {
                Some(d) if d != embedding.len() => {
                    return Err(Error::vector_db(format!(
                        "Embedding has {} dimensions, collection '{}' expects {}",
                        embedding.len(),
                        self.collection,
                        d
                    )));
                }
                Some(_) => {}
                None if embedding.is_empty() => {
                    return Err(Error::vector_db("Cannot store an empty embedding"));
                }
                None => dims = Some(embedding.len()),
            }
        }

        let tx = conn.transaction()?;
        let mut removed = 0;
        if let Some(file) = replace_file {
            removed = tx.execute(
                "DELETE FROM chunks WHERE collection = ?1 AND file = ?2",
                params![self.collection, file],
            )?;
        }
        if let Some(d) = dims {
            tx.execute(
                "UPDATE collections SET dimensions = ?2 WHERE name = ?1",
                params![self.collection, d as i64],
            )?;
        }
        {
            let mut stmt = tx.prepare(
                "INSERT INTO chunks (collection, id, text, source, file, embedding)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                 ON CONFLICT(collection, id) DO UPDATE SET
                    text = excluded.text,
                    source = excluded.source,
                    file = excluded.file,
                    embedding = excluded.embedding",
            )?;
            for (chunk, embedding) in chunks.iter().zip(embeddings) {
                stmt.execute(params![
                    self.collection,
                    chunk.id,
                    chunk.text,
                    chunk.metadata.source,
                    chunk.metadata.file,
                    encode_vector(embedding),
                ])?;
            }
        }
        tx.commit()?;

        if removed > 0 {
            tracing::debug!("Replaced {} stale chunks of {:?}", removed, replace_file);
        }
        Ok(chunks.len())
    }

    /// Up to `k` nearest rows by ascending cosine distance
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<RetrievalHit>> {
        if k == 0 {
            return Ok(Vec::new());
        }

        let conn = self.conn.lock();
        if let Some(d) = Self::dimensions_locked(&conn, &self.collection)? {
            if d != query.len() {
                return Err(Error::vector_db(format!(
                    "Query has {} dimensions, collection '{}' expects {}",
                    query.len(),
                    self.collection,
                    d
                )));
            }
        }

        let mut stmt = conn.prepare(
            "SELECT text, source, file, embedding FROM chunks WHERE collection = ?1",
        )?;
        let rows = stmt.query_map(params![self.collection], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, Option<String>>(1)?,
                row.get::<_, Option<String>>(2)?,
                row.get::<_, Vec<u8>>(3)?,
            ))
        })?;

        let mut scored = Vec::new();
        for row in rows {
            let (text, source, file, blob) = row?;
            let distance = cosine_distance(query, &decode_vector(&blob));
            scored.push((distance, text, source, file));
        }

        scored.sort_by(|a, b| a.0.total_cmp(&b.0));
        scored.truncate(k);

        Ok(scored
            .into_iter()
            .map(|(distance, text, source, file)| RetrievalHit::new(text, source, file, distance))
            .collect())
    }

    /// Number of chunks in the collection
    pub fn len(&self) -> Result<usize> {
        let conn = self.conn.lock();
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM chunks WHERE collection = ?1",
            params![self.collection],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    /// Remove every chunk and forget the dimension
    pub fn clear(&self) -> Result<()> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM chunks WHERE collection = ?1", params![self.collection])?;
        tx.execute(
            "UPDATE collections SET dimensions = NULL WHERE name = ?1",
            params![self.collection],
        )?;
        tx.commit()?;
        Ok(())
    }

    /// Run a synchronous store operation on the blocking pool
    async fn blocking<T, F>(&self, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(SqliteVectorStore) -> Result<T> + Send + 'static,
    {
        let store = self.clone();
        tokio::task::spawn_blocking(move || f(store))
            .await
            .map_err(|e| Error::Internal(format!("Task join error: {}", e)))?
    }
}

#[async_trait]
impl VectorStoreProvider for SqliteVectorStore {
    async fn add(&self, chunks: &[Chunk], embeddings: &[Vec<f32>]) -> Result<()> {
        let chunks = chunks.to_vec();
        let embeddings = embeddings.to_vec();
        self.blocking(move |store| store.upsert(&chunks, &embeddings).map(|_| ()))
            .await
    }

    async fn replace_file(
        &self,
        file: &str,
        chunks: &[Chunk],
        embeddings: &[Vec<f32>],
    ) -> Result<usize> {
        let file = file.to_string();
        let chunks = chunks.to_vec();
        let embeddings = embeddings.to_vec();
        self.blocking(move |store| store.replace(&file, &chunks, &embeddings))
            .await
    }

    async fn query(&self, embedding: &[f32], k: usize) -> Result<Vec<RetrievalHit>> {
        let query = embedding.to_vec();
        self.blocking(move |store| store.search(&query, k)).await
    }

    async fn count(&self) -> Result<usize> {
        self.blocking(|store| store.len()).await
    }

    async fn reset(&self) -> Result<()> {
        self.blocking(|store| store.clear()).await
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(self.blocking(|store| store.len()).await.is_ok())
    }

    fn name(&self) -> &str {
        "sqlite"
    }
}

/// Cosine distance `1 - cos(a, b)`; 1.0 when either vector has zero norm
pub fn cosine_distance(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 1.0;
    }

    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 1.0;
    }
    1.0 - dot / (norm_a.sqrt() * norm_b.sqrt())
}

fn encode_vector(v: &[f32]) -> Vec<u8> {
    v.iter().flat_map(|x| x.to_le_bytes()).collect()
}

fn decode_vector(blob: &[u8]) -> Vec<f32> {
    blob.chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect()
}
