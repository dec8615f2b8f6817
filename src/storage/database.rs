use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use clap::ValueEnum;
use log::{debug, info};
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{params, OptionalExtension};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::network::{Event, InferenceMode, Net, NetDocument, StateProbabilities};

/// Runs on every pooled connection; the pragma is per connection.
fn enable_foreign_keys(conn: &mut rusqlite::Connection) -> rusqlite::Result<()> {
    conn.pragma_update(None, "foreign_keys", "ON")
}

/// One answered query, as kept in the `queries` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryRecord {
    pub id: String,
    pub title: String,
    pub node: String,
    pub evidence: Event,
    pub mode: InferenceMode,
    pub samples: usize,
    pub result: StateProbabilities,
    pub created_at: DateTime<Utc>,
}

/// NetworkStore keeps network documents and a log of query results in SQLite.
pub struct NetworkStore {
    /// Connection pool for SQLite
    pool: Pool<SqliteConnectionManager>,
}

impl NetworkStore {
    /// Create a store backed by an in-memory SQLite database
    pub fn new_in_memory() -> Result<Self> {
        // Every in-memory connection is its own database, so the pool holds one.
        let manager = SqliteConnectionManager::memory().with_init(enable_foreign_keys);
        let pool = Pool::builder()
            .max_size(1)
            .build(manager)
            .context("Failed to create connection pool")?;

        let store = Self { pool };
        store.initialize_schema()?;
        Ok(store)
    }

    /// Create a store backed by a SQLite database file
    pub fn new(path: &str) -> Result<Self> {
        let manager = SqliteConnectionManager::file(path).with_init(enable_foreign_keys);
        let pool = Pool::builder()
            .max_size(10) // Maximum connections in the pool
            .build(manager)
            .context("Failed to create connection pool")?;

        let store = Self { pool };
        store.initialize_schema()?;
        Ok(store)
    }

    fn initialize_schema(&self) -> Result<()> {
        let conn = self.pool.get()
            .context("Failed to get connection from pool")?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS networks (
                title TEXT PRIMARY KEY,
                document TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )",
            [],
        )
        .context("Failed to create networks table")?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS queries (
                id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                node TEXT NOT NULL,
                evidence TEXT NOT NULL,
                mode TEXT NOT NULL,
                samples INTEGER NOT NULL,
                result TEXT NOT NULL,
                created_at TEXT NOT NULL,
                FOREIGN KEY (title) REFERENCES networks (title)
            )",
            [],
        )
        .context("Failed to create queries table")?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_queries_title ON queries (title)",
            [],
        )
        .context("Failed to create query title index")?;

        // WAL only takes effect for file databases
        let _ = conn.pragma_update(None, "journal_mode", "WAL")
            .context("Failed to enable WAL mode");

        Ok(())
    }

    /// Execute a function within a transaction
    ///
    /// The transaction is committed if the closure returns Ok and rolled
    /// back when it is dropped otherwise.
    pub fn with_transaction<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&rusqlite::Transaction) -> Result<T>,
    {
        let mut conn = self.pool.get()
            .context("Failed to get connection from pool")?;

        let tx = conn.transaction()?;
        let value = f(&tx)?;
        tx.commit()?;
        Ok(value)
    }

    /// Store a network under its title, replacing any earlier version
    pub fn save_net(&self, net: &Net) -> Result<()> {
        self.save_document(&NetDocument::from_net(net))
    }

    pub fn save_document(&self, document: &NetDocument) -> Result<()> {
        let conn = self.pool.get()
            .context("Failed to get connection from pool")?;

        let json = serde_json::to_string(document)
            .context("Failed to serialize network document")?;
        let now = Utc::now().to_rfc3339();

        conn.execute(
            "INSERT INTO networks (title, document, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?3)
             ON CONFLICT (title) DO UPDATE SET
                document = excluded.document,
                updated_at = excluded.updated_at",
            params![document.title, json, now],
        )
        .context("Failed to save network")?;

        info!("Saved network '{}' ({} nodes)", document.title, document.nodes.len());
        Ok(())
    }

    pub fn load_document(&self, title: &str) -> Result<Option<NetDocument>> {
        let conn = self.pool.get()
            .context("Failed to get connection from pool")?;

        let mut stmt = conn.prepare("SELECT document FROM networks WHERE title = ?1")?;
        let mut rows = stmt.query(params![title])?;

        if let Some(row) = rows.next()? {
            let json: String = row.get(0)?;
            let document = serde_json::from_str(&json)
                .context("Failed to deserialize network document")?;
            Ok(Some(document))
        } else {
            Ok(None)
        }
    }

    /// Load and rebuild a network
    pub fn load_net(&self, title: &str) -> Result<Option<Net>> {
        match self.load_document(title)? {
            Some(document) => {
                let net = document
                    .into_net()
                    .with_context(|| format!("Stored network '{}' is malformed", title))?;
                Ok(Some(net))
            }
            None => Ok(None),
        }
    }

    /// Titles of every stored network, sorted
    pub fn list_titles(&self) -> Result<Vec<String>> {
        let conn = self.pool.get()
            .context("Failed to get connection from pool")?;

        let mut stmt = conn.prepare("SELECT title FROM networks ORDER BY title")?;
        let titles = stmt
            .query_map([], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<String>>>()
            .context("Failed to list networks")?;
        Ok(titles)
    }

    /// Delete a network together with its logged queries
    pub fn delete_net(&self, title: &str) -> Result<bool> {
        self.with_transaction(|tx| {
            let exists: bool = tx
                .query_row("SELECT 1 FROM networks WHERE title = ?1", params![title], |_| {
                    Ok(true)
                })
                .optional()?
                .unwrap_or(false);

            if !exists {
                return Ok(false);
            }

            tx.execute("DELETE FROM queries WHERE title = ?1", params![title])
                .context("Failed to delete logged queries")?;

            tx.execute("DELETE FROM networks WHERE title = ?1", params![title])
                .context("Failed to delete network")?;

            Ok(true)
        })
    }

    /// Log the answer to a query against a stored network
    pub fn record_query(
        &self,
        net: &Net,
        node: &str,
        result: &StateProbabilities,
    ) -> Result<QueryRecord> {
        let record = QueryRecord {
            id: Uuid::new_v4().to_string(),
            title: net.title().to_string(),
            node: node.to_string(),
            evidence: net.evidence().clone(),
            mode: net.config().mode,
            samples: net.config().samples,
            result: result.clone(),
            created_at: Utc::now(),
        };

        let conn = self.pool.get()
            .context("Failed to get connection from pool")?;

        let evidence_json = serde_json::to_string(&record.evidence)
            .context("Failed to serialize evidence")?;
        let result_json = serde_json::to_string(&record.result)
            .context("Failed to serialize query result")?;

        conn.execute(
            "INSERT INTO queries (id, title, node, evidence, mode, samples, result, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                record.id,
                record.title,
                record.node,
                evidence_json,
                record.mode.to_string(),
                record.samples as i64,
                result_json,
                record.created_at.to_rfc3339(),
            ],
        )
        .context("Failed to insert query")?;

        debug!("Logged query {} on '{}'", record.id, record.title);
        Ok(record)
    }

    /// Logged queries for a network, oldest first
    pub fn queries_for(&self, title: &str) -> Result<Vec<QueryRecord>> {
        let conn = self.pool.get()
            .context("Failed to get connection from pool")?;

        let mut stmt = conn.prepare(
            "SELECT id, title, node, evidence, mode, samples, result, created_at
             FROM queries WHERE title = ?1 ORDER BY created_at, rowid",
        )?;
        let rows = stmt
            .query_map(params![title], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                    row.get::<_, i64>(5)?,
                    row.get::<_, String>(6)?,
                    row.get::<_, String>(7)?,
                ))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()
            .context("Failed to read logged queries")?;

        let mut records = Vec::with_capacity(rows.len());
        for (id, title, node, evidence, mode, samples, result, created_at) in rows {
            records.push(QueryRecord {
                id,
                title,
                node,
                evidence: serde_json::from_str(&evidence)
                    .context("Failed to deserialize evidence")?,
                mode: InferenceMode::from_str(&mode, true).map_err(|e| anyhow!(e))?,
                samples: samples as usize,
                result: serde_json::from_str(&result)
                    .context("Failed to deserialize query result")?,
                created_at: DateTime::parse_from_rfc3339(&created_at)
                    .context("Failed to parse query timestamp")?
                    .with_timezone(&Utc),
            });
        }
        Ok(records)
    }
}
