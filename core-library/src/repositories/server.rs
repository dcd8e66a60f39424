//! Server repository trait and implementation

use crate::error::Result;
use crate::models::{NewServer, Server, ServerFolder};
use async_trait::async_trait;
use sqlx::SqlitePool;

/// Repository interface for servers and their library folders
#[async_trait]
pub trait ServerRepository: Send + Sync {
    /// Register a remote server
    async fn create_server(&self, server: &NewServer, now: i64) -> Result<Server>;

    /// Register a library folder discovered on a server
    async fn create_server_folder(
        &self,
        server_id: i64,
        remote_id: &str,
        name: &str,
        now: i64,
    ) -> Result<ServerFolder>;

    /// Find a server by id
    async fn find_by_id(&self, server_id: i64) -> Result<Option<Server>>;

    /// Update the stored session credential for a server
    async fn set_credentials(
        &self,
        server_id: i64,
        token: &str,
        remote_user_id: Option<&str>,
        now: i64,
    ) -> Result<()>;

    /// Enabled library folders for a server, in creation order
    async fn folders_for_server(&self, server_id: i64) -> Result<Vec<ServerFolder>>;

    /// Stamp a library folder as scanned
    async fn set_last_scanned(&self, server_folder_id: i64, scanned_at: i64) -> Result<()>;
}

/// SQLite implementation of ServerRepository
pub struct SqliteServerRepository {
    pool: SqlitePool,
}

impl SqliteServerRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ServerRepository for SqliteServerRepository {
    async fn create_server(&self, server: &NewServer, now: i64) -> Result<Server> {
        let server = sqlx::query_as::<_, Server>(
            r#"
            INSERT INTO servers (name, url, server_type, username, token, remote_user_id, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(&server.name)
        .bind(&server.url)
        .bind(&server.server_type)
        .bind(&server.username)
        .bind(&server.token)
        .bind(&server.remote_user_id)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        Ok(server)
    }

    async fn create_server_folder(
        &self,
        server_id: i64,
        remote_id: &str,
        name: &str,
        now: i64,
    ) -> Result<ServerFolder> {
        let folder = sqlx::query_as::<_, ServerFolder>(
            r#"
            INSERT INTO server_folders (server_id, remote_id, name, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(remote_id, server_id) DO UPDATE SET
                name = excluded.name,
                updated_at = excluded.updated_at
            RETURNING *
            "#,
        )
        .bind(server_id)
        .bind(remote_id)
        .bind(name)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        Ok(folder)
    }

    async fn find_by_id(&self, server_id: i64) -> Result<Option<Server>> {
        let server = sqlx::query_as::<_, Server>("SELECT * FROM servers WHERE id = ?")
            .bind(server_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(server)
    }

    async fn set_credentials(
        &self,
        server_id: i64,
        token: &str,
        remote_user_id: Option<&str>,
        now: i64,
    ) -> Result<()> {
        sqlx::query(
            "UPDATE servers SET token = ?, remote_user_id = ?, updated_at = ? WHERE id = ?",
        )
        .bind(token)
        .bind(remote_user_id)
        .bind(now)
        .bind(server_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn folders_for_server(&self, server_id: i64) -> Result<Vec<ServerFolder>> {
        let folders = sqlx::query_as::<_, ServerFolder>(
            "SELECT * FROM server_folders WHERE server_id = ? AND enabled = 1 ORDER BY id",
        )
        .bind(server_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(folders)
    }

    async fn set_last_scanned(&self, server_folder_id: i64, scanned_at: i64) -> Result<()> {
        sqlx::query(
            "UPDATE server_folders SET last_scanned_at = ?, updated_at = ? WHERE id = ?",
        )
        .bind(scanned_at)
        .bind(scanned_at)
        .bind(server_folder_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::create_test_pool;

    fn new_server() -> NewServer {
        NewServer {
            name: "Home".to_string(),
            url: "http://localhost:8096".to_string(),
            server_type: "jellyfin".to_string(),
            username: "admin".to_string(),
            token: "token".to_string(),
            remote_user_id: Some("user-1".to_string()),
        }
    }

    #[tokio::test]
    async fn test_create_and_find_server() {
        let pool = create_test_pool().await.unwrap();
        let repo = SqliteServerRepository::new(pool);

        let created = repo.create_server(&new_server(), 1000).await.unwrap();
        let found = repo.find_by_id(created.id).await.unwrap().unwrap();

        assert_eq!(found.name, "Home");
        assert_eq!(found.server_type, "jellyfin");
        assert_eq!(found.remote_user_id.as_deref(), Some("user-1"));
    }

    #[tokio::test]
    async fn test_create_server_folder_upserts_by_remote_id() {
        let pool = create_test_pool().await.unwrap();
        let repo = SqliteServerRepository::new(pool);

        let server = repo.create_server(&new_server(), 1000).await.unwrap();
        let a = repo
            .create_server_folder(server.id, "lib-1", "Music", 1000)
            .await
            .unwrap();
        let b = repo
            .create_server_folder(server.id, "lib-1", "Music (renamed)", 2000)
            .await
            .unwrap();

        assert_eq!(a.id, b.id);
        assert_eq!(b.name, "Music (renamed)");

        let folders = repo.folders_for_server(server.id).await.unwrap();
        assert_eq!(folders.len(), 1);
    }

    #[tokio::test]
    async fn test_set_last_scanned() {
        let pool = create_test_pool().await.unwrap();
        let repo = SqliteServerRepository::new(pool);

        let server = repo.create_server(&new_server(), 1000).await.unwrap();
        let folder = repo
            .create_server_folder(server.id, "lib-1", "Music", 1000)
            .await
            .unwrap();
        assert!(folder.last_scanned_at.is_none());

        repo.set_last_scanned(folder.id, 5000).await.unwrap();
        let folders = repo.folders_for_server(server.id).await.unwrap();
        assert_eq!(folders[0].last_scanned_at, Some(5000));
    }

    #[tokio::test]
    async fn test_set_credentials() {
        let pool = create_test_pool().await.unwrap();
        let repo = SqliteServerRepository::new(pool);

        let server = repo.create_server(&new_server(), 1000).await.unwrap();
        repo.set_credentials(server.id, "fresh-token", Some("user-2"), 2000)
            .await
            .unwrap();

        let server = repo.find_by_id(server.id).await.unwrap().unwrap();
        assert_eq!(server.token, "fresh-token");
        assert_eq!(server.remote_user_id.as_deref(), Some("user-2"));
    }
}
