use super::TodoStore;
use core::str::FromStr;
use core::time::Duration;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use todo_core::{Error, Result, proto::Todo};

// Primary result codes for a busy, locked, or unopenable database.
const SQLITE_BUSY: i32 = 5;
const SQLITE_LOCKED: i32 = 6;
const SQLITE_CANTOPEN: i32 = 14;

const CREATE_TABLE: &str = r#"CREATE TABLE IF NOT EXISTS todos (
    id TEXT PRIMARY KEY NOT NULL,
    title TEXT NOT NULL,
    description TEXT NOT NULL DEFAULT '',
    completed BOOLEAN NOT NULL DEFAULT 0
)"#;

/// Connection settings for [`SqlStore`].
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub database_url: String,
    pub max_connections: u32,
    pub acquire_timeout: Duration,
}

impl StoreConfig {
    /// A private in-memory database. Each pool connection would see its own
    /// database, so the pool is pinned to a single long-lived connection.
    pub fn in_memory() -> Self {
        Self {
            database_url: "sqlite::memory:".to_string(),
            max_connections: 1,
            acquire_timeout: Duration::from_secs(3),
        }
    }

    fn is_in_memory(&self) -> bool {
        self.database_url.contains(":memory:") || self.database_url.contains("mode=memory")
    }
}

#[derive(sqlx::FromRow)]
struct TodoRow {
    id: String,
    title: String,
    description: String,
    completed: bool,
}

impl From<TodoRow> for Todo {
    fn from(row: TodoRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            description: row.description,
            completed: row.completed,
        }
    }
}

/// [`TodoStore`] over a single SQLite table, `todos`.
#[derive(Debug, Clone)]
pub struct SqlStore {
    pool: SqlitePool,
}

impl SqlStore {
    /// Opens the pool described by `config` and creates the `todos` table if
    /// it does not exist yet.
    pub async fn connect(config: &StoreConfig) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(&config.database_url)
            .map_err(|e| Error::invalid_argument(format!("database url: {e}")))?
            .create_if_missing(true);

        let mut pool_options = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.acquire_timeout);
        if config.is_in_memory() {
            pool_options = pool_options
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None);
        }

        let pool = pool_options
            .connect_with(options)
            .await
            .map_err(|e| classify(e, ""))?;

        tracing::debug!(
            max_connections = config.max_connections,
            "Connected to {}",
            config.database_url
        );

        let store = Self::from_pool(pool);
        store.create_table().await?;
        Ok(store)
    }

    /// Wraps an existing pool. The table is not created.
    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create_table(&self) -> Result<()> {
        sqlx::query(CREATE_TABLE)
            .execute(&self.pool)
            .await
            .map_err(|e| classify(e, ""))?;
        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[tonic::async_trait]
impl TodoStore for SqlStore {
    async fn insert(&self, item: Todo) -> Result<()> {
        sqlx::query("INSERT INTO todos (id, title, description, completed) VALUES (?, ?, ?, ?)")
            .bind(&item.id)
            .bind(&item.title)
            .bind(&item.description)
            .bind(item.completed)
            .execute(&self.pool)
            .await
            .map_err(|e| classify(e, &item.id))?;
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Todo> {
        sqlx::query_as::<_, TodoRow>(
            "SELECT id, title, description, completed FROM todos WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| classify(e, id))?
        .map(Todo::from)
        .ok_or_else(|| Error::not_found(id))
    }

    async fn list(&self, limit: Option<u32>, completed: bool) -> Result<Vec<Todo>> {
        // SQLite treats a negative LIMIT as no limit.
        let limit = limit.map_or(-1, i64::from);
        let rows = sqlx::query_as::<_, TodoRow>(
            "SELECT id, title, description, completed FROM todos \
             WHERE completed = ? ORDER BY rowid LIMIT ?",
        )
        .bind(completed)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| classify(e, ""))?;

        Ok(rows.into_iter().map(Todo::from).collect())
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let rows_affected = sqlx::query("DELETE FROM todos WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| classify(e, id))?
            .rows_affected();

        if rows_affected == 0 {
            return Err(Error::not_found(id));
        }
        Ok(())
    }
}

/// Sorts a driver error into the service taxonomy. `id` names the record the
/// statement targeted, if any.
fn classify(err: sqlx::Error, id: &str) -> Error {
    match &err {
        sqlx::Error::RowNotFound => Error::not_found(id),
        sqlx::Error::Database(db) if db.is_unique_violation() => Error::Conflict { id: id.to_string() },
        sqlx::Error::Database(db) if is_transient(db.code().as_deref()) => Error::StoreUnavailable {
            context: err.to_string(),
        },
        sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed
        | sqlx::Error::Io(_)
        | sqlx::Error::Tls(_) => Error::StoreUnavailable {
            context: err.to_string(),
        },
        _ => Error::Internal {
            context: err.to_string(),
        },
    }
}

/// SQLite reports extended result codes; the low byte is the primary code.
fn is_transient(code: Option<&str>) -> bool {
    code.and_then(|c| c.parse::<i32>().ok())
        .is_some_and(|c| matches!(c & 0xff, SQLITE_BUSY | SQLITE_LOCKED | SQLITE_CANTOPEN))
}
