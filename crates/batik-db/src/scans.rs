//! Scan history repository implementation.

use async_trait::async_trait;
use sqlx::{Pool, Postgres};
use tracing::debug;
use uuid::Uuid;

use batik_core::{
    Error, NewScanRecord, Result, ScanOrder, ScanQuery, ScanRecord, ScanRepository,
};

use crate::escape_like;

const SCAN_COLUMNS: &str = "id, user_id, motif_id, motif_name, provinsi, description, occasion, \
                            confidence_score, image_url, created_at";

/// Owner scope plus the optional province filter ($2) and OR-search ($3).
const SCAN_FILTER: &str = r#"
    user_id = $1
    AND ($2::text IS NULL OR provinsi ILIKE '%' || $2 || '%' ESCAPE '\')
    AND ($3::text IS NULL
         OR motif_name ILIKE '%' || $3 || '%' ESCAPE '\'
         OR provinsi ILIKE '%' || $3 || '%' ESCAPE '\'
         OR description ILIKE '%' || $3 || '%' ESCAPE '\')
"#;

/// PostgreSQL implementation of ScanRepository.
pub struct PgScanRepository {
    pool: Pool<Postgres>,
}

impl PgScanRepository {
    /// Create a new PgScanRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

fn order_clause(order: ScanOrder) -> &'static str {
    match order {
        ScanOrder::NewestFirst => "created_at DESC, id DESC",
        ScanOrder::OldestFirst => "created_at ASC, id ASC",
    }
}

#[async_trait]
impl ScanRepository for PgScanRepository {
    async fn insert(&self, record: NewScanRecord) -> Result<ScanRecord> {
        let id = Uuid::now_v7();

        let sql = format!(
            r#"
            INSERT INTO scan_history
                (id, user_id, motif_id, motif_name, provinsi, description, occasion,
                 confidence_score, image_url)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {SCAN_COLUMNS}
            "#
        );

        let row = sqlx::query_as::<_, ScanRecord>(&sql)
            .bind(id)
            .bind(record.owner_id)
            .bind(&record.motif_id)
            .bind(&record.motif_name)
            .bind(&record.province)
            .bind(&record.description)
            .bind(&record.occasion)
            .bind(i16::from(record.confidence))
            .bind(&record.image_url)
            .fetch_one(&self.pool)
            .await
            .map_err(Error::Database)?;

        debug!(
            subsystem = "db",
            component = "scans",
            op = "insert",
            scan_id = %row.id,
            owner_id = %row.owner_id,
            "Inserted scan record"
        );
        Ok(row)
    }

    async fn query(&self, query: &ScanQuery) -> Result<(Vec<ScanRecord>, u64)> {
        let province = query.province.as_deref().map(escape_like);
        let search = query.search.as_deref().map(escape_like);

        // Count and page must see the same snapshot.
        let mut tx = self.pool.begin().await.map_err(Error::Database)?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ, READ ONLY")
            .execute(&mut *tx)
            .await
            .map_err(Error::Database)?;

        let count_sql = format!("SELECT COUNT(*) FROM scan_history WHERE {SCAN_FILTER}");
        let total: i64 = sqlx::query_scalar(&count_sql)
            .bind(query.owner_id)
            .bind(&province)
            .bind(&search)
            .fetch_one(&mut *tx)
            .await
            .map_err(Error::Database)?;

        // LIMIT NULL means no limit.
        let page_sql = format!(
            "SELECT {SCAN_COLUMNS} FROM scan_history WHERE {SCAN_FILTER} \
             ORDER BY {} LIMIT $4 OFFSET $5",
            order_clause(query.order)
        );
        let rows = sqlx::query_as::<_, ScanRecord>(&page_sql)
            .bind(query.owner_id)
            .bind(&province)
            .bind(&search)
            .bind(query.limit.map(|l| l as i64))
            .bind(query.offset as i64)
            .fetch_all(&mut *tx)
            .await
            .map_err(Error::Database)?;

        tx.commit().await.map_err(Error::Database)?;

        Ok((rows, total.max(0) as u64))
    }

    async fn fetch(&self, owner_id: Uuid, id: Uuid) -> Result<ScanRecord> {
        let sql = format!("SELECT {SCAN_COLUMNS} FROM scan_history WHERE id = $1 AND user_id = $2");
        sqlx::query_as::<_, ScanRecord>(&sql)
            .bind(id)
            .bind(owner_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)?
            .ok_or_else(|| Error::NotFound("History not found".to_string()))
    }

    async fn delete(&self, owner_id: Uuid, id: Uuid) -> Result<ScanRecord> {
        let sql = format!(
            "DELETE FROM scan_history WHERE id = $1 AND user_id = $2 RETURNING {SCAN_COLUMNS}"
        );
        sqlx::query_as::<_, ScanRecord>(&sql)
            .bind(id)
            .bind(owner_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)?
            .ok_or_else(|| Error::NotFound("History not found".to_string()))
    }

    async fn delete_all(&self, owner_id: Uuid) -> Result<Vec<ScanRecord>> {
        let sql = format!("DELETE FROM scan_history WHERE user_id = $1 RETURNING {SCAN_COLUMNS}");
        let rows = sqlx::query_as::<_, ScanRecord>(&sql)
            .bind(owner_id)
            .fetch_all(&self.pool)
            .await
            .map_err(Error::Database)?;

        debug!(
            subsystem = "db",
            component = "scans",
            op = "delete_all",
            owner_id = %owner_id,
            result_count = rows.len(),
            "Deleted scan records"
        );
        Ok(rows)
    }
}
