/// Relational review index
///
/// Maps DIDs to the reviews they wrote or received, records the update chain
/// between review versions, and caches review records and DID documents.
/// Works on SQLite and PostgreSQL through sqlx's `Any` driver; all statements
/// stick to the SQL both dialects accept.
///
/// Review rows are written here as records are fetched from IPFS. DID
/// documents are not: `did_documents` belongs to the Chlu Collector sharing
/// the database, and `put_did_document` is its write path.
use crate::{
    error::{GatewayError, GatewayResult},
    store::{IdentityDocument, ReviewRecord, ReviewSummary},
};
use chrono::Utc;
use sqlx::{any::AnyPoolOptions, AnyPool, Row};
use std::time::Duration;
use tracing::{debug, info};

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS review_records (
        multihash TEXT PRIMARY KEY,
        document TEXT NOT NULL,
        author_did TEXT,
        subject_did TEXT,
        created_at TEXT NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_review_records_author ON review_records (author_did)",
    "CREATE INDEX IF NOT EXISTS idx_review_records_subject ON review_records (subject_did)",
    r#"
    CREATE TABLE IF NOT EXISTS review_record_updates (
        from_multihash TEXT PRIMARY KEY,
        to_multihash TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS did_documents (
        did TEXT PRIMARY KEY,
        document TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )
    "#,
];

/// Index connection options
#[derive(Debug, Clone)]
pub struct IndexOptions {
    pub max_connections: u32,
    pub acquire_timeout: Duration,
    /// Allow schema creation and caching; off when another process owns the index
    pub enable_writes: bool,
}

impl Default for IndexOptions {
    fn default() -> Self {
        Self {
            max_connections: 10,
            acquire_timeout: Duration::from_secs(30),
            enable_writes: true,
        }
    }
}

/// Review index backed by a shared connection pool
#[derive(Clone)]
pub struct SqlIndex {
    pool: AnyPool,
    enable_writes: bool,
}

impl SqlIndex {
    /// Connect to `database_url` (`sqlite://...` or `postgres://...`)
    pub async fn connect(database_url: &str, options: IndexOptions) -> GatewayResult<Self> {
        sqlx::any::install_default_drivers();

        let pool = AnyPoolOptions::new()
            .max_connections(options.max_connections)
            .acquire_timeout(options.acquire_timeout)
            .connect(database_url)
            .await?;

        Ok(Self {
            pool,
            enable_writes: options.enable_writes,
        })
    }

    pub fn writes_enabled(&self) -> bool {
        self.enable_writes
    }

    /// Create tables when this process is allowed to write
    pub async fn ensure_schema(&self) -> GatewayResult<()> {
        if !self.enable_writes {
            debug!("Index writes disabled, skipping schema creation");
            return Ok(());
        }

        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }

        info!("Review index schema ready");
        Ok(())
    }

    /// Test database connection
    pub async fn ping(&self) -> GatewayResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }

    /// Next version of `multihash`, one hop along the update chain
    pub async fn next_version_of(&self, multihash: &str) -> GatewayResult<Option<String>> {
        let row = sqlx::query(
            "SELECT to_multihash FROM review_record_updates WHERE from_multihash = $1",
        )
        .bind(multihash)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(row.try_get("to_multihash")?)),
            None => Ok(None),
        }
    }

    /// Cached copy of a review record
    pub async fn get_review_record(&self, multihash: &str) -> GatewayResult<Option<ReviewRecord>> {
        let row = sqlx::query("SELECT document FROM review_records WHERE multihash = $1")
            .bind(multihash)
            .fetch_optional(&self.pool)
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let document: String = row.try_get("document")?;
        let value = serde_json::from_str(&document)?;
        ReviewRecord::from_value(value).map(Some).ok_or_else(|| {
            GatewayError::Storage(format!("Indexed review record {} is not an object", multihash))
        })
    }

    /// Index a review record, linking it to the version it amends
    ///
    /// Records are immutable, so an existing row is left alone.
    pub async fn put_review_record(&self, multihash: &str, record: &ReviewRecord) -> GatewayResult<()> {
        if !self.enable_writes {
            return Ok(());
        }

        let document = serde_json::to_string(record)?;
        let now = Utc::now().to_rfc3339();

        sqlx::query(
            r#"
            INSERT INTO review_records (multihash, document, author_did, subject_did, created_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (multihash) DO NOTHING
            "#,
        )
        .bind(multihash)
        .bind(document)
        .bind(record.author_did().map(str::to_string))
        .bind(record.subject_did().map(str::to_string))
        .bind(now)
        .execute(&self.pool)
        .await?;

        if let Some(previous) = record.previous_version() {
            self.put_update(previous, multihash).await?;
        }

        Ok(())
    }

    /// Record that `to` supersedes `from`
    pub async fn put_update(&self, from: &str, to: &str) -> GatewayResult<()> {
        if !self.enable_writes {
            return Ok(());
        }

        sqlx::query(
            r#"
            INSERT INTO review_record_updates (from_multihash, to_multihash)
            VALUES ($1, $2)
            ON CONFLICT (from_multihash) DO UPDATE SET to_multihash = excluded.to_multihash
            "#,
        )
        .bind(from)
        .bind(to)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn get_did_document(&self, did: &str) -> GatewayResult<Option<IdentityDocument>> {
        let row = sqlx::query("SELECT document FROM did_documents WHERE did = $1")
            .bind(did)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => {
                let document: String = row.try_get("document")?;
                Ok(Some(serde_json::from_str(&document)?))
            }
            None => Ok(None),
        }
    }

    /// Upsert a DID document, as the collector does on every DID it publishes
    pub async fn put_did_document(&self, did: &str, document: &IdentityDocument) -> GatewayResult<()> {
        if !self.enable_writes {
            return Ok(());
        }

        let document = serde_json::to_string(document)?;
        let now = Utc::now().to_rfc3339();

        sqlx::query(
            r#"
            INSERT INTO did_documents (did, document, updated_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (did) DO UPDATE SET
                document = excluded.document,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(did)
        .bind(document)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Original (non-update) reviews authored by `did`
    pub async fn reviews_written_by(&self, did: &str) -> GatewayResult<Vec<ReviewSummary>> {
        self.list_reviews("author_did", did).await
    }

    /// Original (non-update) reviews whose subject is `did`
    pub async fn reviews_about(&self, did: &str) -> GatewayResult<Vec<ReviewSummary>> {
        self.list_reviews("subject_did", did).await
    }

    async fn list_reviews(&self, column: &'static str, did: &str) -> GatewayResult<Vec<ReviewSummary>> {
        // column is one of two literals, never caller input
        let sql = format!(
            r#"
            SELECT multihash, author_did, subject_did, created_at
            FROM review_records
            WHERE {column} = $1
              AND multihash NOT IN (SELECT to_multihash FROM review_record_updates)
            ORDER BY created_at ASC, multihash ASC
            "#
        );

        let rows = sqlx::query(&sql).bind(did).fetch_all(&self.pool).await?;

        rows.iter()
            .map(|row| -> GatewayResult<ReviewSummary> {
                Ok(ReviewSummary {
                    multihash: row.try_get("multihash")?,
                    latest_version: None,
                    author_did: row.try_get("author_did")?,
                    subject_did: row.try_get("subject_did")?,
                    created_at: Some(row.try_get("created_at")?),
                })
            })
            .collect()
    }
}
