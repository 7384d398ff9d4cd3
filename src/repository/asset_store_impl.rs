// ==========================================
// 表格列映射导入 - 资产存储实现
// ==========================================
// 职责: 以 file 表保存二进制资产（使用 rusqlite）
// ==========================================

use crate::db::{configure_sqlite_connection, open_sqlite_connection};
use crate::repository::asset_store::{AssetStore, NewAsset};
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;
use uuid::Uuid;

// ==========================================
// SqliteAssetStore
// ==========================================
pub struct SqliteAssetStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteAssetStore {
    /// 创建新的 Store 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建（会再次应用统一 PRAGMA，幂等）
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> RepositoryResult<Self> {
        {
            let guard = conn
                .lock()
                .map_err(|e| RepositoryError::LockError(e.to_string()))?;
            configure_sqlite_connection(&guard)?;
        }

        Ok(Self { conn })
    }

    fn lock(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 资产总数
    pub fn count(&self) -> RepositoryResult<usize> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM file", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// 查询资产的 (file_type, is_private)
    pub fn metadata(&self, reference: &str) -> RepositoryResult<Option<(String, bool)>> {
        let conn = self.lock()?;
        let meta = conn
            .query_row(
                "SELECT file_type, is_private FROM file WHERE file_url = ?1",
                params![reference],
                |row| Ok((row.get::<_, String>(0)?, row.get::<_, bool>(1)?)),
            )
            .optional()?;
        Ok(meta)
    }
}

impl AssetStore for SqliteAssetStore {
    fn store(&self, asset: NewAsset<'_>) -> RepositoryResult<String> {
        let conn = self.lock()?;
        let name = Uuid::new_v4().to_string();
        let file_url = asset.file_url();

        conn.execute(
            r#"
            INSERT INTO file (
                name, file_name, file_url, file_type, is_private, file_size, content, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
            params![
                name,
                asset.file_name,
                file_url,
                asset.file_type,
                asset.is_private,
                asset.content.len() as i64,
                asset.content,
                Utc::now(),
            ],
        )?;

        debug!(file_url = %file_url, size = asset.content.len(), "资产已保存");
        Ok(file_url)
    }

    fn fetch(&self, reference: &str) -> RepositoryResult<Option<Vec<u8>>> {
        let conn = self.lock()?;
        let content = conn
            .query_row(
                "SELECT content FROM file WHERE file_url = ?1",
                params![reference],
                |row| row.get::<_, Vec<u8>>(0),
            )
            .optional()?;
        Ok(content)
    }
}
