//! Schemaless document store on top of SQLite.
//!
//! Each collection is a table of JSON documents keyed by their `_id`. Queries
//! reach into documents with SQLite's JSON functions, so filters and sorts run
//! in the database instead of in handlers.

use rusqlite::functions::FunctionFlags;
use rusqlite::types::{Value as SqlValue, ValueRef};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};
use serde_json::{Map, Value};
use std::sync::Arc;
use tokio::sync::{Mutex, OnceCell};
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::{Config, DeployTarget};
use crate::error::{AppError, AppResult};
use crate::models::results::{DeleteResult, InsertOneResult, UpdateResult};

/// Name of the identifier field carried by every document.
pub const ID: &str = "_id";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collection {
    Users,
    Reviews,
    Favorites,
}

impl Collection {
    pub const ALL: [Collection; 3] = [
        Collection::Users,
        Collection::Reviews,
        Collection::Favorites,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Collection::Users => "users",
            Collection::Reviews => "reviews",
            Collection::Favorites => "favorites",
        }
    }
}

/// Document filter, matched against top-level fields.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Filter {
    #[default]
    All,
    /// Field equals value. `null` also matches a missing field.
    Eq(String, Value),
    /// Field is a string containing the needle, ignoring case.
    ContainsIgnoreCase(String, String),
}

impl Filter {
    pub fn eq(field: &str, value: impl Into<Value>) -> Self {
        Filter::Eq(field.to_string(), value.into())
    }

    pub fn contains_ignore_case(field: &str, needle: &str) -> Self {
        Filter::ContainsIgnoreCase(field.to_string(), needle.to_string())
    }

    // Placeholders are positional, so params must be pushed in clause order.
    fn to_sql(&self, params: &mut Vec<SqlValue>) -> String {
        match self {
            Filter::All => "1".to_string(),
            Filter::Eq(field, Value::Null) => {
                params.push(json_path(field));
                "json_extract(doc, ?) IS NULL".to_string()
            }
            Filter::Eq(field, Value::Bool(b)) => {
                params.push(json_path(field));
                params.push(SqlValue::Text(b.to_string()));
                "json_type(doc, ?) = ?".to_string()
            }
            Filter::Eq(field, Value::Number(n)) => {
                // json_extract yields 1/0 for booleans, so the type must be checked too.
                params.push(json_path(field));
                params.push(json_path(field));
                params.push(match n.as_i64() {
                    Some(i) => SqlValue::Integer(i),
                    None => SqlValue::Real(n.as_f64().unwrap_or(f64::NAN)),
                });
                "(json_type(doc, ?) IN ('integer', 'real') AND json_extract(doc, ?) = ?)"
                    .to_string()
            }
            Filter::Eq(field, Value::String(s)) => {
                params.push(json_path(field));
                params.push(json_path(field));
                params.push(SqlValue::Text(s.clone()));
                "(json_type(doc, ?) = 'text' AND json_extract(doc, ?) = ?)".to_string()
            }
            Filter::Eq(field, nested) => {
                params.push(json_path(field));
                params.push(json_path(field));
                params.push(SqlValue::Text(nested.to_string()));
                "(json_type(doc, ?) IN ('array', 'object') AND json_extract(doc, ?) = json(?))"
                    .to_string()
            }
            Filter::ContainsIgnoreCase(field, needle) => {
                params.push(json_path(field));
                params.push(json_path(field));
                params.push(SqlValue::Text(needle.to_lowercase()));
                "(json_type(doc, ?) = 'text' AND instr(casefold(json_extract(doc, ?)), ?) > 0)"
                    .to_string()
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Sort {
    pub field: String,
    pub order: SortOrder,
}

impl Sort {
    pub fn descending(field: &str) -> Self {
        Self {
            field: field.to_string(),
            order: SortOrder::Descending,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct FindOptions {
    pub filter: Filter,
    pub sort: Option<Sort>,
    pub limit: Option<usize>,
}

impl FindOptions {
    pub fn filter(filter: Filter) -> Self {
        Self {
            filter,
            ..Default::default()
        }
    }

    pub fn sort(mut self, sort: Sort) -> Self {
        self.sort = Some(sort);
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

fn json_path(field: &str) -> SqlValue {
    SqlValue::Text(format!("$.\"{field}\""))
}

/// 24 hex characters, the same shape as a document-database object id.
pub fn new_object_id() -> String {
    let mut id = Uuid::new_v4().simple().to_string();
    id.truncate(24);
    id
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// Define a struct to represent a database connection
#[derive(Debug)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    // Create a new database connection
    pub fn new(db_path: &str) -> Result<Self, rusqlite::Error> {
        let conn = Connection::open(db_path)?;

        // Unicode-aware lowercase; SQLite's lower() only folds ASCII.
        conn.create_scalar_function(
            "casefold",
            1,
            FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
            |ctx| {
                Ok(match ctx.get_raw(0) {
                    ValueRef::Text(bytes) => Some(String::from_utf8_lossy(bytes).to_lowercase()),
                    _ => None,
                })
            },
        )?;

        info!("Database connection established at: {}", db_path);
        Ok(Database {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    // Create one table per collection
    pub async fn create_schema(&self) -> Result<(), rusqlite::Error> {
        let conn = self.conn.lock().await;

        for collection in Collection::ALL {
            conn.execute_batch(&format!(
                "CREATE TABLE IF NOT EXISTS {name} (
                    seq INTEGER PRIMARY KEY AUTOINCREMENT,
                    id TEXT NOT NULL UNIQUE,
                    doc TEXT NOT NULL
                );",
                name = collection.name()
            ))
            .map_err(|e| {
                tracing::error!("Failed creating {} table: {}", collection.name(), e);
                e
            })?;
        }
        Ok(())
    }

    /// Insert a JSON object, assigning an `_id` unless it already has one.
    pub async fn insert_one(
        &self,
        collection: Collection,
        document: Value,
    ) -> AppResult<InsertOneResult> {
        let mut doc = match document {
            Value::Object(map) => map,
            other => {
                return Err(AppError::BadRequest(format!(
                    "expected a JSON object, got {}",
                    value_kind(&other)
                )))
            }
        };

        let id = match doc.get(ID) {
            Some(Value::String(id)) => id.clone(),
            Some(other) => {
                return Err(AppError::BadRequest(format!(
                    "{ID} must be a string, got {}",
                    value_kind(other)
                )))
            }
            None => {
                let id = new_object_id();
                doc.insert(ID.to_string(), Value::String(id.clone()));
                id
            }
        };

        let text = serde_json::to_string(&doc)?;
        let conn = self.conn.lock().await;
        conn.execute(
            &format!("INSERT INTO {} (id, doc) VALUES (?, ?)", collection.name()),
            params![&id, &text],
        )?;

        debug!(collection = collection.name(), id = %id, "document inserted");
        Ok(InsertOneResult::new(id))
    }

    pub async fn find_by_id(&self, collection: Collection, id: &str) -> AppResult<Option<Value>> {
        let conn = self.conn.lock().await;
        let text: Option<String> = conn
            .query_row(
                &format!("SELECT doc FROM {} WHERE id = ?", collection.name()),
                [id],
                |row| row.get(0),
            )
            .optional()?;

        Ok(text.map(|t| serde_json::from_str(&t)).transpose()?)
    }

    /// First document matching the filter, in insertion order.
    pub async fn find_one(
        &self,
        collection: Collection,
        filter: Filter,
    ) -> AppResult<Option<Value>> {
        let mut docs = self
            .find(collection, FindOptions::filter(filter).limit(1))
            .await?;
        Ok(docs.pop())
    }

    pub async fn find(
        &self,
        collection: Collection,
        options: FindOptions,
    ) -> AppResult<Vec<Value>> {
        let mut params = Vec::new();
        let where_clause = options.filter.to_sql(&mut params);

        let order_clause = match &options.sort {
            Some(sort) => {
                params.push(json_path(&sort.field));
                let direction = match sort.order {
                    SortOrder::Ascending => "ASC",
                    SortOrder::Descending => "DESC",
                };
                format!("json_extract(doc, ?) {direction}, seq ASC")
            }
            None => "seq ASC".to_string(),
        };

        // Negative LIMIT means no limit in SQLite.
        let limit = options
            .limit
            .map(|l| i64::try_from(l).unwrap_or(i64::MAX))
            .unwrap_or(-1);
        params.push(SqlValue::Integer(limit));

        let sql = format!(
            "SELECT doc FROM {} WHERE {} ORDER BY {} LIMIT ?",
            collection.name(),
            where_clause,
            order_clause
        );

        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(params.iter()), |row| row.get::<_, String>(0))?;

        let mut docs = Vec::new();
        for row in rows {
            docs.push(serde_json::from_str(&row?)?);
        }

        debug!(collection = collection.name(), count = docs.len(), "documents fetched");
        Ok(docs)
    }

    /// Apply a `$set` of top-level fields to the document with the given id.
    pub async fn update_one(
        &self,
        collection: Collection,
        id: &str,
        set: Map<String, Value>,
    ) -> AppResult<UpdateResult> {
        if set.contains_key(ID) {
            return Err(AppError::BadRequest(format!("{ID} is immutable")));
        }

        let mut conn = self.conn.lock().await;
        let tx = conn.transaction()?;

        let current: Option<String> = tx
            .query_row(
                &format!("SELECT doc FROM {} WHERE id = ?", collection.name()),
                [id],
                |row| row.get(0),
            )
            .optional()?;

        let Some(current) = current else {
            return Ok(UpdateResult::new(0, 0));
        };

        let original: Map<String, Value> = serde_json::from_str(&current)?;
        let mut updated = original.clone();
        updated.extend(set);

        if updated == original {
            return Ok(UpdateResult::new(1, 0));
        }

        tx.execute(
            &format!("UPDATE {} SET doc = ? WHERE id = ?", collection.name()),
            params![serde_json::to_string(&updated)?, id],
        )?;
        tx.commit()?;

        debug!(collection = collection.name(), id = %id, "document updated");
        Ok(UpdateResult::new(1, 1))
    }

    pub async fn delete_one(&self, collection: Collection, id: &str) -> AppResult<DeleteResult> {
        let conn = self.conn.lock().await;
        let deleted = conn.execute(
            &format!("DELETE FROM {} WHERE id = ?", collection.name()),
            [id],
        )?;

        debug!(collection = collection.name(), id = %id, deleted, "document delete");
        Ok(DeleteResult::new(deleted as u64))
    }

    pub async fn count(&self, collection: Collection) -> AppResult<u64> {
        let conn = self.conn.lock().await;
        let count: i64 = conn.query_row(
            &format!("SELECT COUNT(*) FROM {}", collection.name()),
            [],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }
}

async fn open_database(path: &str) -> Result<Database, rusqlite::Error> {
    let db = Database::new(path)?;
    db.create_schema().await?;
    Ok(db)
}

/// Handle to the database shared by all workers.
///
/// Either attached up front, or on the first request that needs it. A failed
/// lazy attach is reported to that request and retried on the next one.
#[derive(Debug)]
pub struct Store {
    path: String,
    cell: OnceCell<Database>,
}

impl Store {
    /// Open the database now.
    pub async fn connect(path: &str) -> Result<Self, rusqlite::Error> {
        let db = open_database(path).await?;
        Ok(Self {
            path: path.to_string(),
            cell: OnceCell::new_with(Some(db)),
        })
    }

    /// Defer opening the database until first use.
    pub fn lazy(path: &str) -> Self {
        Self {
            path: path.to_string(),
            cell: OnceCell::new(),
        }
    }

    pub async fn for_target(config: &Config) -> Result<Self, rusqlite::Error> {
        match config.deploy_target {
            DeployTarget::Local => Self::connect(&config.database_path).await,
            DeployTarget::Platform => Ok(Self::lazy(&config.database_path)),
        }
    }

    pub fn is_attached(&self) -> bool {
        self.cell.initialized()
    }

    pub async fn database(&self) -> AppResult<&Database> {
        let db = self
            .cell
            .get_or_try_init(|| async {
                info!(path = %self.path, "Attaching database");
                open_database(&self.path).await
            })
            .await?;
        Ok(db)
    }
}
