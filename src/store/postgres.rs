use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Row};

use super::{DocumentStore, FieldUpdate, StoreError};

pub type DbPool = Arc<PgPool>;

pub async fn create_pool(database_url: &str) -> Result<DbPool, sqlx::Error> {
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await?;

    Ok(Arc::new(pool))
}

pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

/// Postgres adapter storing each document as one JSONB row.
///
/// Partial updates compile to a single UPDATE statement built from nested
/// `jsonb_set` expressions, so every `update_by_id` call is atomic at the
/// row level regardless of how many fields it touches.
pub struct PgDocumentStore {
    pool: DbPool,
}

impl PgDocumentStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    async fn get_by_id(&self, collection: &str, id: &str) -> Result<Option<Value>, StoreError> {
        let row = sqlx::query("SELECT doc FROM documents WHERE collection = $1 AND id = $2")
            .bind(collection)
            .bind(id)
            .fetch_optional(self.pool.as_ref())
            .await?;

        Ok(row.map(|r| r.get::<Value, _>("doc")))
    }

    async fn set_by_id(&self, collection: &str, id: &str, doc: Value) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO documents (collection, id, doc)
            VALUES ($1, $2, $3)
            ON CONFLICT (collection, id) DO UPDATE SET doc = EXCLUDED.doc
            "#,
        )
        .bind(collection)
        .bind(id)
        .bind(doc)
        .execute(self.pool.as_ref())
        .await?;

        Ok(())
    }

    async fn update_by_id(
        &self,
        collection: &str,
        id: &str,
        updates: &[FieldUpdate],
    ) -> Result<(), StoreError> {
        // Field names are crate-internal constants, never user input, so
        // splicing them into the expression is safe.
        let mut expr = String::from("doc");
        let mut args: Vec<Value> = Vec::new();

        for update in updates {
            let placeholder = args.len() + 3; // $1 = collection, $2 = id
            match update {
                FieldUpdate::Set { field, value } => {
                    expr = format!("jsonb_set({expr}, '{{{field}}}', ${placeholder}::jsonb, true)");
                    args.push(value.clone());
                }
                FieldUpdate::ArrayAppend { field, value } => {
                    // The appended element is bound as a one-element array so
                    // `||` is always array concatenation.
                    expr = format!(
                        "jsonb_set({expr}, '{{{field}}}', \
                         COALESCE({expr}->'{field}', '[]'::jsonb) || ${placeholder}::jsonb, true)"
                    );
                    args.push(Value::Array(vec![value.clone()]));
                }
            }
        }

        let sql = format!("UPDATE documents SET doc = {expr} WHERE collection = $1 AND id = $2");
        let mut query = sqlx::query(&sql).bind(collection).bind(id);
        for arg in args {
            query = query.bind(arg);
        }

        let result = query.execute(self.pool.as_ref()).await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::Missing {
                collection: collection.to_string(),
                id: id.to_string(),
            });
        }

        Ok(())
    }

    async fn query(
        &self,
        collection: &str,
        filters: &[(&str, Value)],
    ) -> Result<Vec<Value>, StoreError> {
        let mut predicate = serde_json::Map::new();
        for (field, value) in filters {
            predicate.insert((*field).to_string(), value.clone());
        }

        let rows = sqlx::query("SELECT doc FROM documents WHERE collection = $1 AND doc @> $2")
            .bind(collection)
            .bind(Value::Object(predicate))
            .fetch_all(self.pool.as_ref())
            .await?;

        Ok(rows.into_iter().map(|r| r.get::<Value, _>("doc")).collect())
    }
}
