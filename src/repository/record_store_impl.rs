// ==========================================
// 表格列映射导入 - 记录存储实现
// ==========================================
// 职责: 实现目标记录持久化（使用 rusqlite）
// 约束: 每次调用独立落库，不做批量
// ==========================================

use crate::db::{configure_sqlite_connection, open_sqlite_connection};
use crate::domain::record::Record;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::record_store::{RecordStore, StoredRecord};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;
use uuid::Uuid;

type RawRow = (
    String,
    String,
    Option<String>,
    Option<String>,
    Option<i64>,
    String,
    DateTime<Utc>,
);

fn decode_row(raw: RawRow) -> RepositoryResult<StoredRecord> {
    let (name, doctype, parent, parentfield, idx, data, created_at) = raw;
    let value: serde_json::Value = serde_json::from_str(&data)?;
    let record = Record::from_json(value).ok_or_else(|| RepositoryError::FieldValueError {
        field: "data".to_string(),
        message: format!("记录 {} 的 data 不是 JSON 对象", name),
    })?;

    Ok(StoredRecord {
        name,
        doctype,
        parent,
        parentfield,
        idx,
        record,
        created_at,
    })
}

// ==========================================
// SqliteRecordStore
// ==========================================
pub struct SqliteRecordStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteRecordStore {
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

    /// 以指定记录名新建独立记录（用于预置父记录等场景）
    pub fn insert_record_with_name(
        &self,
        doctype: &str,
        name: &str,
        record: &Record,
    ) -> RepositoryResult<String> {
        let conn = self.lock()?;
        let data = serde_json::to_string(&record.to_json())?;
        let now = Utc::now();

        conn.execute(
            r#"
            INSERT INTO record (name, doctype, data, created_at, modified_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![name, doctype, data, now, now],
        )?;

        debug!(doctype = %doctype, name = %name, "记录已新建");
        Ok(name.to_string())
    }

    /// 父记录最近一次保存时间
    pub fn modified_at(&self, doctype: &str, name: &str) -> RepositoryResult<Option<DateTime<Utc>>> {
        let conn = self.lock()?;
        let modified = conn
            .query_row(
                "SELECT modified_at FROM record WHERE doctype = ?1 AND name = ?2",
                params![doctype, name],
                |row| row.get::<_, DateTime<Utc>>(0),
            )
            .optional()?;
        Ok(modified)
    }
}

impl RecordStore for SqliteRecordStore {
    fn insert_record(&self, doctype: &str, record: &Record) -> RepositoryResult<String> {
        let name = Uuid::new_v4().to_string();
        self.insert_record_with_name(doctype, &name, record)
    }

    fn append_child(
        &self,
        parent_doctype: &str,
        parent: &str,
        child_field: &str,
        record: &Record,
    ) -> RepositoryResult<String> {
        let mut conn = self.lock()?;
        let tx = conn
            .transaction()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        // 加载父记录
        let exists = tx
            .query_row(
                "SELECT 1 FROM record WHERE doctype = ?1 AND name = ?2",
                params![parent_doctype, parent],
                |_row| Ok(true),
            )
            .optional()?
            .unwrap_or(false);

        if !exists {
            return Err(RepositoryError::NotFound {
                entity: parent_doctype.to_string(),
                id: parent.to_string(),
            });
        }

        // 追加到子表末尾
        let idx: i64 = tx.query_row(
            r#"
            SELECT COALESCE(MAX(idx), 0) + 1 FROM child_record
            WHERE parent_doctype = ?1 AND parent = ?2 AND parentfield = ?3
            "#,
            params![parent_doctype, parent, child_field],
            |row| row.get(0),
        )?;

        let name = Uuid::new_v4().to_string();
        let data = serde_json::to_string(&record.to_json())?;
        let now = Utc::now();

        tx.execute(
            r#"
            INSERT INTO child_record (
                name, parent_doctype, parent, parentfield, idx, data, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![name, parent_doctype, parent, child_field, idx, data, now],
        )?;

        // 保存父记录
        tx.execute(
            "UPDATE record SET modified_at = ?1 WHERE doctype = ?2 AND name = ?3",
            params![now, parent_doctype, parent],
        )?;

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        debug!(
            parent_doctype = %parent_doctype,
            parent = %parent,
            child_field = %child_field,
            idx = idx,
            "子表行已追加"
        );
        Ok(name)
    }

    fn get_record(&self, doctype: &str, name: &str) -> RepositoryResult<Option<StoredRecord>> {
        let conn = self.lock()?;
        let raw = conn
            .query_row(
                r#"
                SELECT name, doctype, data, created_at FROM record
                WHERE doctype = ?1 AND name = ?2
                "#,
                params![doctype, name],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        None,
                        None,
                        None,
                        row.get::<_, String>(2)?,
                        row.get::<_, DateTime<Utc>>(3)?,
                    ))
                },
            )
            .optional()?;

        raw.map(decode_row).transpose()
    }

    fn list_records(&self, doctype: &str) -> RepositoryResult<Vec<StoredRecord>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT name, doctype, data, created_at FROM record
            WHERE doctype = ?1
            ORDER BY rowid
            "#,
        )?;

        let rows = stmt.query_map(params![doctype], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                None,
                None,
                None,
                row.get::<_, String>(2)?,
                row.get::<_, DateTime<Utc>>(3)?,
            ))
        })?;

        let mut records = Vec::new();
        for row in rows {
            records.push(decode_row(row?)?);
        }
        Ok(records)
    }

    fn list_children(
        &self,
        parent_doctype: &str,
        parent: &str,
        child_field: &str,
    ) -> RepositoryResult<Vec<StoredRecord>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT name, parent_doctype, parent, parentfield, idx, data, created_at
            FROM child_record
            WHERE parent_doctype = ?1 AND parent = ?2 AND parentfield = ?3
            ORDER BY idx
            "#,
        )?;

        let rows = stmt.query_map(params![parent_doctype, parent, child_field], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                Some(row.get::<_, String>(2)?),
                Some(row.get::<_, String>(3)?),
                Some(row.get::<_, i64>(4)?),
                row.get::<_, String>(5)?,
                row.get::<_, DateTime<Utc>>(6)?,
            ))
        })?;

        let mut records = Vec::new();
        for row in rows {
            records.push(decode_row(row?)?);
        }
        Ok(records)
    }
}
