//! SQLite backend — single database file, WAL journal, inline migrations.
//!
//! Domain aggregates (tasks, agents, checkpoints) are stored as JSON
//! documents with the queried columns lifted out. Every mutation is a
//! single-row write; there are no transactions spanning multiple steps of
//! the runtime loop, so a crash mid-iteration can leave a task
//! `in_progress` — a deliberate carry-over, see DESIGN.md.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Row, SqlitePool};
use std::str::FromStr;
use tracing::info;

use devsquad_core::{
    ActionRecord, AgentId, AgentInstance, AgentStatus, ApiContract, Artifact, Checkpoint, Decision,
    MemoryNote, ProjectManifest, StatusChange, StoreError, Task, TaskId, TaskStatus,
};

use crate::{apply_status, ProjectStore};

/// A SQLite-backed `ProjectStore`.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open (or create) the database at `path`.
    ///
    /// Pass `":memory:"` for an in-process ephemeral database (tests).
    pub async fn new(path: &str) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str(path)
            .map_err(|e| StoreError::Storage(format!("Invalid SQLite path: {e}")))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .pragma("foreign_keys", "ON");

        // In-memory databases are per-connection; a multi-connection pool
        // would hand out empty databases without the schema.
        let max_connections = if path.contains(":memory:") { 1 } else { 4 };
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await
            .map_err(|e| StoreError::Storage(format!("Failed to open SQLite: {e}")))?;

        let store = Self { pool };
        store.run_migrations().await?;
        info!("SQLite store initialized at {path}");
        Ok(store)
    }

    async fn run_migrations(&self) -> Result<(), StoreError> {
        let statements = [
            r#"
            CREATE TABLE IF NOT EXISTS tasks (
                id          TEXT PRIMARY KEY,
                status      TEXT NOT NULL,
                data        TEXT NOT NULL,
                updated_at  TEXT NOT NULL
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS status_changes (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                task_id     TEXT NOT NULL,
                from_status TEXT NOT NULL,
                to_status   TEXT NOT NULL,
                changed_at  TEXT NOT NULL
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS agents (
                id          TEXT PRIMARY KEY,
                status      TEXT NOT NULL,
                data        TEXT NOT NULL,
                created_at  TEXT NOT NULL
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS actions (
                id                TEXT PRIMARY KEY,
                agent_id          TEXT NOT NULL,
                tool_name         TEXT NOT NULL,
                arguments_summary TEXT NOT NULL,
                success           INTEGER NOT NULL,
                timestamp         TEXT NOT NULL
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS checkpoints (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                agent_id    TEXT NOT NULL,
                data        TEXT NOT NULL,
                created_at  TEXT NOT NULL
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS artifacts (
                path        TEXT PRIMARY KEY,
                content     TEXT NOT NULL,
                version     INTEGER NOT NULL,
                updated_at  TEXT NOT NULL
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS decisions (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                title       TEXT NOT NULL,
                body        TEXT NOT NULL,
                created_at  TEXT NOT NULL
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS api_contracts (
                name        TEXT PRIMARY KEY,
                definition  TEXT NOT NULL
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS memory_notes (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                content     TEXT NOT NULL,
                importance  REAL NOT NULL,
                created_at  TEXT NOT NULL
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS manifest (
                id          INTEGER PRIMARY KEY CHECK (id = 1),
                data        TEXT NOT NULL
            )
            "#,
        ];

        for stmt in statements {
            sqlx::query(stmt)
                .execute(&self.pool)
                .await
                .map_err(|e| StoreError::MigrationFailed(e.to_string()))?;
        }
        Ok(())
    }

    fn decode<T: serde::de::DeserializeOwned>(raw: &str) -> Result<T, StoreError> {
        serde_json::from_str(raw).map_err(|e| StoreError::Storage(format!("Corrupt record: {e}")))
    }

    fn encode<T: serde::Serialize>(value: &T) -> Result<String, StoreError> {
        serde_json::to_string(value).map_err(|e| StoreError::Storage(e.to_string()))
    }
}

#[async_trait]
impl ProjectStore for SqliteStore {
    async fn insert_task(&self, task: Task) -> Result<(), StoreError> {
        sqlx::query("INSERT OR REPLACE INTO tasks (id, status, data, updated_at) VALUES (?, ?, ?, ?)")
            .bind(task.id.to_string())
            .bind(task.status.as_str())
            .bind(Self::encode(&task)?)
            .bind(task.updated_at.to_rfc3339())
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::Storage(e.to_string()))?;
        Ok(())
    }

    async fn task(&self, id: &TaskId) -> Result<Task, StoreError> {
        let row = sqlx::query("SELECT data FROM tasks WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StoreError::Storage(e.to_string()))?
            .ok_or_else(|| StoreError::TaskNotFound(id.to_string()))?;
        Self::decode(row.get::<String, _>("data").as_str())
    }

    async fn update_task(&self, task: &Task) -> Result<(), StoreError> {
        let result = sqlx::query("UPDATE tasks SET status = ?, data = ?, updated_at = ? WHERE id = ?")
            .bind(task.status.as_str())
            .bind(Self::encode(task)?)
            .bind(task.updated_at.to_rfc3339())
            .bind(task.id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::Storage(e.to_string()))?;
        if result.rows_affected() == 0 {
            return Err(StoreError::TaskNotFound(task.id.to_string()));
        }
        Ok(())
    }

    async fn set_task_status(&self, id: &TaskId, status: TaskStatus) -> Result<Task, StoreError> {
        let mut task = self.task(id).await?;
        let change = apply_status(&mut task, status)?;
        self.update_task(&task).await?;

        sqlx::query(
            "INSERT INTO status_changes (task_id, from_status, to_status, changed_at) VALUES (?, ?, ?, ?)",
        )
        .bind(change.task_id.to_string())
        .bind(change.from.as_str())
        .bind(change.to.as_str())
        .bind(change.changed_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Storage(e.to_string()))?;

        Ok(task)
    }

    async fn status_changes(&self, id: &TaskId) -> Result<Vec<StatusChange>, StoreError> {
        let rows = sqlx::query(
            "SELECT task_id, from_status, to_status, changed_at FROM status_changes WHERE task_id = ? ORDER BY id",
        )
        .bind(id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StoreError::Storage(e.to_string()))?;

        rows.into_iter()
            .map(|row| {
                let from = TaskStatus::parse(&row.get::<String, _>("from_status"))
                    .ok_or_else(|| StoreError::Storage("bad from_status".into()))?;
                let to = TaskStatus::parse(&row.get::<String, _>("to_status"))
                    .ok_or_else(|| StoreError::Storage("bad to_status".into()))?;
                let changed_at = DateTime::parse_from_rfc3339(&row.get::<String, _>("changed_at"))
                    .map_err(|e| StoreError::Storage(e.to_string()))?
                    .with_timezone(&Utc);
                Ok(StatusChange {
                    task_id: TaskId::from(&row.get::<String, _>("task_id")),
                    from,
                    to,
                    changed_at,
                })
            })
            .collect()
    }

    async fn insert_agent(&self, agent: AgentInstance) -> Result<(), StoreError> {
        sqlx::query("INSERT OR REPLACE INTO agents (id, status, data, created_at) VALUES (?, ?, ?, ?)")
            .bind(agent.id.to_string())
            .bind(agent.status.as_str())
            .bind(Self::encode(&agent)?)
            .bind(agent.created_at.to_rfc3339())
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::Storage(e.to_string()))?;
        Ok(())
    }

    async fn agent(&self, id: &AgentId) -> Result<AgentInstance, StoreError> {
        let row = sqlx::query("SELECT data FROM agents WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StoreError::Storage(e.to_string()))?
            .ok_or_else(|| StoreError::AgentNotFound(id.to_string()))?;
        Self::decode(row.get::<String, _>("data").as_str())
    }

    async fn update_agent(&self, agent: &AgentInstance) -> Result<(), StoreError> {
        let result = sqlx::query("UPDATE agents SET status = ?, data = ? WHERE id = ?")
            .bind(agent.status.as_str())
            .bind(Self::encode(agent)?)
            .bind(agent.id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::Storage(e.to_string()))?;
        if result.rows_affected() == 0 {
            return Err(StoreError::AgentNotFound(agent.id.to_string()));
        }
        Ok(())
    }

    async fn set_agent_status(&self, id: &AgentId, status: AgentStatus) -> Result<(), StoreError> {
        let mut agent = self.agent(id).await?;
        agent.status = status;
        agent.updated_at = Utc::now();
        self.update_agent(&agent).await
    }

    async fn agents(&self) -> Result<Vec<AgentInstance>, StoreError> {
        let rows = sqlx::query("SELECT data FROM agents ORDER BY created_at")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StoreError::Storage(e.to_string()))?;
        rows.into_iter()
            .map(|row| Self::decode(row.get::<String, _>("data").as_str()))
            .collect()
    }

    async fn append_action(&self, record: ActionRecord) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO actions (id, agent_id, tool_name, arguments_summary, success, timestamp) VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&record.id)
        .bind(record.agent_id.to_string())
        .bind(&record.tool_name)
        .bind(&record.arguments_summary)
        .bind(record.success as i32)
        .bind(record.timestamp.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Storage(e.to_string()))?;
        Ok(())
    }

    async fn recent_actions(
        &self,
        since: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<ActionRecord>, StoreError> {
        let rows = sqlx::query(
            "SELECT id, agent_id, tool_name, arguments_summary, success, timestamp
             FROM actions WHERE timestamp >= ? ORDER BY timestamp DESC LIMIT ?",
        )
        .bind(since.to_rfc3339())
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StoreError::Storage(e.to_string()))?;

        rows.into_iter()
            .map(|row| {
                let timestamp = DateTime::parse_from_rfc3339(&row.get::<String, _>("timestamp"))
                    .map_err(|e| StoreError::Storage(e.to_string()))?
                    .with_timezone(&Utc);
                Ok(ActionRecord {
                    id: row.get("id"),
                    agent_id: AgentId::from(&row.get::<String, _>("agent_id")),
                    tool_name: row.get("tool_name"),
                    arguments_summary: row.get("arguments_summary"),
                    success: row.get::<i32, _>("success") != 0,
                    timestamp,
                })
            })
            .collect()
    }

    async fn write_checkpoint(&self, checkpoint: Checkpoint) -> Result<(), StoreError> {
        sqlx::query("INSERT INTO checkpoints (agent_id, data, created_at) VALUES (?, ?, ?)")
            .bind(checkpoint.agent_id.to_string())
            .bind(Self::encode(&checkpoint)?)
            .bind(checkpoint.created_at.to_rfc3339())
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::Storage(e.to_string()))?;
        Ok(())
    }

    async fn checkpoint_count(&self, agent_id: &AgentId) -> Result<usize, StoreError> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM checkpoints WHERE agent_id = ?")
            .bind(agent_id.to_string())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| StoreError::Storage(e.to_string()))?;
        Ok(row.get::<i64, _>("n") as usize)
    }

    async fn artifact(&self, path: &str) -> Result<Option<Artifact>, StoreError> {
        let row = sqlx::query("SELECT path, content, version, updated_at FROM artifacts WHERE path = ?")
            .bind(path)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StoreError::Storage(e.to_string()))?;
        row.map(|row| {
            let updated_at = DateTime::parse_from_rfc3339(&row.get::<String, _>("updated_at"))
                .map_err(|e| StoreError::Storage(e.to_string()))?
                .with_timezone(&Utc);
            Ok(Artifact {
                path: row.get("path"),
                content: row.get("content"),
                version: row.get::<i64, _>("version") as u32,
                updated_at,
            })
        })
        .transpose()
    }

    async fn upsert_artifact(&self, artifact: Artifact) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT OR REPLACE INTO artifacts (path, content, version, updated_at) VALUES (?, ?, ?, ?)",
        )
        .bind(&artifact.path)
        .bind(&artifact.content)
        .bind(artifact.version as i64)
        .bind(artifact.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Storage(e.to_string()))?;
        Ok(())
    }

    async fn remove_artifact(&self, path: &str) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM artifacts WHERE path = ?")
            .bind(path)
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::Storage(e.to_string()))?;
        Ok(())
    }

    async fn artifacts(&self) -> Result<Vec<Artifact>, StoreError> {
        let rows =
            sqlx::query("SELECT path, content, version, updated_at FROM artifacts ORDER BY updated_at DESC")
                .fetch_all(&self.pool)
                .await
                .map_err(|e| StoreError::Storage(e.to_string()))?;
        rows.into_iter()
            .map(|row| {
                let updated_at = DateTime::parse_from_rfc3339(&row.get::<String, _>("updated_at"))
                    .map_err(|e| StoreError::Storage(e.to_string()))?
                    .with_timezone(&Utc);
                Ok(Artifact {
                    path: row.get("path"),
                    content: row.get("content"),
                    version: row.get::<i64, _>("version") as u32,
                    updated_at,
                })
            })
            .collect()
    }

    async fn add_decision(&self, decision: Decision) -> Result<(), StoreError> {
        sqlx::query("INSERT INTO decisions (title, body, created_at) VALUES (?, ?, ?)")
            .bind(&decision.title)
            .bind(&decision.body)
            .bind(decision.created_at.to_rfc3339())
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::Storage(e.to_string()))?;
        Ok(())
    }

    async fn recent_decisions(&self, limit: usize) -> Result<Vec<Decision>, StoreError> {
        let rows = sqlx::query(
            "SELECT title, body, created_at FROM decisions ORDER BY created_at DESC LIMIT ?",
        )
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StoreError::Storage(e.to_string()))?;
        rows.into_iter()
            .map(|row| {
                let created_at = DateTime::parse_from_rfc3339(&row.get::<String, _>("created_at"))
                    .map_err(|e| StoreError::Storage(e.to_string()))?
                    .with_timezone(&Utc);
                Ok(Decision {
                    title: row.get("title"),
                    body: row.get("body"),
                    created_at,
                })
            })
            .collect()
    }

    async fn api_contracts(&self) -> Result<Vec<ApiContract>, StoreError> {
        let rows = sqlx::query("SELECT name, definition FROM api_contracts ORDER BY name")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StoreError::Storage(e.to_string()))?;
        Ok(rows
            .into_iter()
            .map(|row| ApiContract {
                name: row.get("name"),
                definition: row.get("definition"),
            })
            .collect())
    }

    async fn add_api_contract(&self, contract: ApiContract) -> Result<(), StoreError> {
        sqlx::query("INSERT OR REPLACE INTO api_contracts (name, definition) VALUES (?, ?)")
            .bind(&contract.name)
            .bind(&contract.definition)
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::Storage(e.to_string()))?;
        Ok(())
    }

    async fn add_memory(&self, memory: MemoryNote) -> Result<(), StoreError> {
        sqlx::query("INSERT INTO memory_notes (content, importance, created_at) VALUES (?, ?, ?)")
            .bind(&memory.content)
            .bind(memory.importance as f64)
            .bind(memory.created_at.to_rfc3339())
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::Storage(e.to_string()))?;
        Ok(())
    }

    async fn memories(&self, limit: usize) -> Result<Vec<MemoryNote>, StoreError> {
        let rows = sqlx::query(
            "SELECT content, importance, created_at FROM memory_notes
             ORDER BY importance DESC, created_at DESC LIMIT ?",
        )
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StoreError::Storage(e.to_string()))?;
        rows.into_iter()
            .map(|row| {
                let created_at = DateTime::parse_from_rfc3339(&row.get::<String, _>("created_at"))
                    .map_err(|e| StoreError::Storage(e.to_string()))?
                    .with_timezone(&Utc);
                Ok(MemoryNote {
                    content: row.get("content"),
                    importance: row.get::<f64, _>("importance") as f32,
                    created_at,
                })
            })
            .collect()
    }

    async fn manifest(&self) -> Result<Option<ProjectManifest>, StoreError> {
        let row = sqlx::query("SELECT data FROM manifest WHERE id = 1")
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StoreError::Storage(e.to_string()))?;
        row.map(|row| Self::decode(row.get::<String, _>("data").as_str()))
            .transpose()
    }

    async fn set_manifest(&self, manifest: ProjectManifest) -> Result<(), StoreError> {
        sqlx::query("INSERT OR REPLACE INTO manifest (id, data) VALUES (1, ?)")
            .bind(Self::encode(&manifest)?)
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::Storage(e.to_string()))?;
        Ok(())
    }
}
