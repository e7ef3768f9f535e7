use async_trait::async_trait;
use serde_json::Value;
use sqlx::migrate::Migrator;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::{PgPool, Postgres, QueryBuilder};
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, instrument};

use super::{
    Collection, Direction, Document, DocumentStore, FieldDelta, Filter, OrderBy, StoredDocument,
};
use crate::config::DatabaseConfig;
use crate::error::{StoreError, StoreResult};

pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Document store backed by a single JSONB table in PostgreSQL
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Build a pool from configuration and wrap it
    pub async fn connect(config: &DatabaseConfig) -> StoreResult<Self> {
        // Statement cache disabled for PgBouncer transaction mode
        let options = PgConnectOptions::from_str(&config.url)?.statement_cache_capacity(0);

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(600))
            .connect_with(options)
            .await?;

        Ok(Self::new(pool))
    }

    pub async fn migrate(&self) -> StoreResult<()> {
        MIGRATOR
            .run(&self.pool)
            .await
            .map_err(|e| StoreError::Backend(format!("migration failed: {}", e)))
    }
}

/// `SELECT id, data` for one collection. Collection and keys are inlined so
/// the planner can match the partial expression indexes from the migrations.
fn select_query(
    collection: Collection,
    filter: &Filter,
    order_by: Option<&OrderBy>,
) -> QueryBuilder<'static, Postgres> {
    let mut builder = QueryBuilder::new(format!(
        "SELECT id, data FROM documents WHERE collection = {}",
        sql_literal(collection.as_str())
    ));

    if let Filter::FieldEquals { field, value } = filter {
        builder.push(format!(" AND data ->> {}", sql_literal(field)));
        match json_text(value) {
            Some(text) => {
                builder.push(" = ");
                builder.push_bind(text);
            }
            None => {
                builder.push(" IS NULL");
            }
        }
    }

    if let Some(order) = order_by {
        builder.push(format!(" ORDER BY data ->> {}", sql_literal(&order.field)));
        builder.push(match order.direction {
            Direction::Ascending => " ASC",
            Direction::Descending => " DESC",
        });
    }

    builder
}

/// Quote as a SQL string literal
fn sql_literal(raw: &str) -> String {
    format!("'{}'", raw.replace('\'', "''"))
}

/// Text form of a value as `->>` renders it; JSON null reads as SQL NULL
fn json_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn into_document(collection: Collection, id: &str, value: Value) -> StoreResult<Document> {
    match value {
        Value::Object(map) => Ok(map),
        other => Err(StoreError::Malformed {
            collection: collection.to_string(),
            id: id.to_string(),
            reason: format!("expected object, found {}", other),
        }),
    }
}

#[async_trait]
impl DocumentStore for PostgresStore {
    #[instrument(skip(self))]
    async fn get(&self, collection: Collection, id: &str) -> StoreResult<Option<Document>> {
        let row: Option<Value> = sqlx::query_scalar(
            r#"
            SELECT data FROM documents
            WHERE collection = $1 AND id = $2
            "#,
        )
        .bind(collection.as_str())
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|data| into_document(collection, id, data))
            .transpose()
    }

    #[instrument(skip(self))]
    async fn query(
        &self,
        collection: Collection,
        filter: &Filter,
        order_by: Option<&OrderBy>,
    ) -> StoreResult<Vec<StoredDocument>> {
        let mut builder = select_query(collection, filter, order_by);
        let rows: Vec<(String, Value)> = builder
            .build_query_as::<(String, Value)>()
            .fetch_all(&self.pool)
            .await?;
        debug!(%collection, matched = rows.len(), "postgres query");

        rows.into_iter()
            .map(|(id, data)| {
                let data = into_document(collection, &id, data)?;
                Ok(StoredDocument { id, data })
            })
            .collect()
    }

    #[instrument(skip(self, data))]
    async fn create(
        &self,
        collection: Collection,
        id: Option<&str>,
        data: Document,
    ) -> StoreResult<String> {
        let id = id
            .map(str::to_string)
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

        // createdAt uses the same fixed-width format as clock::format_timestamp
        let inserted: Option<String> = sqlx::query_scalar(
            r#"
            INSERT INTO documents (collection, id, data)
            VALUES (
                $1,
                $2,
                jsonb_set(
                    $3::jsonb,
                    '{createdAt}',
                    to_jsonb(to_char(NOW() AT TIME ZONE 'UTC', 'YYYY-MM-DD"T"HH24:MI:SS.US"Z"'))
                )
            )
            ON CONFLICT (collection, id) DO NOTHING
            RETURNING id
            "#,
        )
        .bind(collection.as_str())
        .bind(&id)
        .bind(Value::Object(data))
        .fetch_optional(&self.pool)
        .await?;

        inserted.ok_or(StoreError::AlreadyExists {
            collection: collection.to_string(),
            id,
        })
    }

    #[instrument(skip(self))]
    async fn update(
        &self,
        collection: Collection,
        id: &str,
        deltas: &[FieldDelta],
    ) -> StoreResult<()> {
        let mut tx = self.pool.begin().await?;

        for delta in deltas {
            let result = sqlx::query(
                r#"
                UPDATE documents
                SET data = jsonb_set(
                    data,
                    ARRAY[$3::text],
                    to_jsonb(COALESCE((data ->> $3)::bigint, 0) + $4)
                )
                WHERE collection = $1 AND id = $2
                "#,
            )
            .bind(collection.as_str())
            .bind(id)
            .bind(&delta.field)
            .bind(delta.delta)
            .execute(&mut *tx)
            .await?;

            if result.rows_affected() == 0 {
                // Dropping tx rolls back any earlier deltas
                return Err(StoreError::NotFound {
                    collection: collection.to_string(),
                    id: id.to_string(),
                });
            }
        }

        tx.commit().await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete(&self, collection: Collection, id: &str) -> StoreResult<()> {
        sqlx::query(
            r#"
            DELETE FROM documents
            WHERE collection = $1 AND id = $2
            "#,
        )
        .bind(collection.as_str())
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn comment_query_matches_the_comments_index() {
        let filter = Filter::field_equals("postId", "p1");
        let order = OrderBy::descending("createdAt");
        let builder = select_query(Collection::Comments, &filter, Some(&order));

        assert_eq!(
            builder.sql(),
            "SELECT id, data FROM documents WHERE collection = 'comments' \
             AND data ->> 'postId' = $1 ORDER BY data ->> 'createdAt' DESC"
        );
    }

    #[test]
    fn keys_are_quoted_and_null_compares_with_is_null() {
        let filter = Filter::field_equals("it's", Value::Null);
        let builder = select_query(Collection::Posts, &filter, None);

        assert_eq!(
            builder.sql(),
            "SELECT id, data FROM documents WHERE collection = 'posts' \
             AND data ->> 'it''s' IS NULL"
        );
    }

    #[test]
    fn values_bind_in_their_text_form() {
        assert_eq!(json_text(&json!("abc")), Some("abc".to_string()));
        assert_eq!(json_text(&json!(5)), Some("5".to_string()));
        assert_eq!(json_text(&json!(true)), Some("true".to_string()));
        assert_eq!(json_text(&Value::Null), None);
    }
}
