//! Task repository trait and implementation
//!
//! Task rows are the only window pollers have into a running scan. A task
//! is created before the scan is enqueued; its `created_at` is the sweep
//! cutoff for that scan.

use crate::error::Result;
use crate::models::Task;
use async_trait::async_trait;
use sqlx::SqlitePool;

/// Repository interface for scan tasks
#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// Create a task in its initial state
    async fn create(&self, server_id: i64, name: &str, now: i64) -> Result<Task>;

    /// Replace the task's progress message
    async fn set_message(&self, task_id: i64, message: &str, now: i64) -> Result<()>;

    /// Mark the task completed with a final message
    async fn complete(&self, task_id: i64, message: &str, now: i64) -> Result<()>;

    /// Mark the task failed with an error message
    async fn fail(&self, task_id: i64, message: &str, now: i64) -> Result<()>;

    /// Find a task by id
    async fn find_by_id(&self, task_id: i64) -> Result<Option<Task>>;

    /// Tasks that are neither completed nor failed, oldest first
    async fn active(&self, server_id: i64) -> Result<Vec<Task>>;
}

/// SQLite implementation of TaskRepository
pub struct SqliteTaskRepository {
    pool: SqlitePool,
}

impl SqliteTaskRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TaskRepository for SqliteTaskRepository {
    async fn create(&self, server_id: i64, name: &str, now: i64) -> Result<Task> {
        let task = sqlx::query_as::<_, Task>(
            r#"
            INSERT INTO tasks (server_id, name, created_at, updated_at)
            VALUES (?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(server_id)
        .bind(name)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        Ok(task)
    }

    async fn set_message(&self, task_id: i64, message: &str, now: i64) -> Result<()> {
        sqlx::query("UPDATE tasks SET message = ?, updated_at = ? WHERE id = ?")
            .bind(message)
            .bind(now)
            .bind(task_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn complete(&self, task_id: i64, message: &str, now: i64) -> Result<()> {
        sqlx::query(
            "UPDATE tasks SET message = ?, is_completed = 1, updated_at = ? WHERE id = ?",
        )
        .bind(message)
        .bind(now)
        .bind(task_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn fail(&self, task_id: i64, message: &str, now: i64) -> Result<()> {
        sqlx::query(
            "UPDATE tasks SET message = ?, is_completed = 1, is_error = 1, updated_at = ? WHERE id = ?",
        )
        .bind(message)
        .bind(now)
        .bind(task_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_by_id(&self, task_id: i64) -> Result<Option<Task>> {
        let task = sqlx::query_as::<_, Task>("SELECT * FROM tasks WHERE id = ?")
            .bind(task_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(task)
    }

    async fn active(&self, server_id: i64) -> Result<Vec<Task>> {
        let tasks = sqlx::query_as::<_, Task>(
            r#"
            SELECT * FROM tasks
            WHERE server_id = ? AND is_completed = 0 AND is_error = 0
            ORDER BY created_at
            "#,
        )
        .bind(server_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(tasks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, insert_test_server};

    #[tokio::test]
    async fn test_create_starts_pending() {
        let pool = create_test_pool().await.unwrap();
        let (server_id, _) = insert_test_server(&pool).await;
        let repo = SqliteTaskRepository::new(pool);

        let task = repo.create(server_id, "Full scan", 1000).await.unwrap();
        assert!(!task.is_completed);
        assert!(!task.is_error);
        assert_eq!(task.created_at, 1000);
        assert!(task.message.is_none());
    }

    #[tokio::test]
    async fn test_message_and_lifecycle_updates() {
        let pool = create_test_pool().await.unwrap();
        let (server_id, _) = insert_test_server(&pool).await;
        let repo = SqliteTaskRepository::new(pool);

        let task = repo.create(server_id, "Full scan", 1000).await.unwrap();

        repo.set_message(task.id, "Scanning genres", 1100).await.unwrap();
        let task = repo.find_by_id(task.id).await.unwrap().unwrap();
        assert_eq!(task.message.as_deref(), Some("Scanning genres"));
        assert!(!task.is_completed);

        repo.complete(task.id, "Completed", 1500).await.unwrap();
        let task = repo.find_by_id(task.id).await.unwrap().unwrap();
        assert!(task.is_completed);
        assert!(!task.is_error);
        // The cutoff never moves
        assert_eq!(task.created_at, 1000);
    }

    #[tokio::test]
    async fn test_fail_sets_both_flags() {
        let pool = create_test_pool().await.unwrap();
        let (server_id, _) = insert_test_server(&pool).await;
        let repo = SqliteTaskRepository::new(pool);

        let task = repo.create(server_id, "Full scan", 1000).await.unwrap();
        repo.fail(task.id, "Connection refused", 1200).await.unwrap();

        let task = repo.find_by_id(task.id).await.unwrap().unwrap();
        assert!(task.is_completed);
        assert!(task.is_error);
        assert_eq!(task.message.as_deref(), Some("Connection refused"));
    }

    #[tokio::test]
    async fn test_active_excludes_finished_tasks() {
        let pool = create_test_pool().await.unwrap();
        let (server_id, _) = insert_test_server(&pool).await;
        let repo = SqliteTaskRepository::new(pool);

        let done = repo.create(server_id, "Old scan", 1000).await.unwrap();
        repo.complete(done.id, "Completed", 1100).await.unwrap();
        let failed = repo.create(server_id, "Bad scan", 2000).await.unwrap();
        repo.fail(failed.id, "Broken", 2100).await.unwrap();
        let running = repo.create(server_id, "Current scan", 3000).await.unwrap();

        let active = repo.active(server_id).await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, running.id);
    }
}
