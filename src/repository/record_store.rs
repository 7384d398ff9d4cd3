// ==========================================
// 表格列映射导入 - 记录存储 Trait
// ==========================================
// 职责: 定义目标记录的持久化接口（不包含实现）
// 红线: Repository 不含业务规则，只做数据 CRUD
// ==========================================

use crate::domain::record::Record;
use crate::repository::error::RepositoryResult;
use chrono::{DateTime, Utc};
use serde::Serialize;

// ==========================================
// StoredRecord - 已落库记录（独立记录或子表行）
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredRecord {
    pub name: String,
    pub doctype: String,
    pub parent: Option<String>,      // 子表行: 父记录名
    pub parentfield: Option<String>, // 子表行: 子表字段名
    pub idx: Option<i64>,            // 子表行: 1 起的行序
    pub record: Record,
    pub created_at: DateTime<Utc>,
}

// ==========================================
// RecordStore Trait
// ==========================================
// 实现者: SqliteRecordStore（使用 rusqlite）
pub trait RecordStore: Send + Sync {
    /// 新建一条 doctype 类型的独立记录
    ///
    /// # 返回
    /// - Ok(String): 新记录名
    fn insert_record(&self, doctype: &str, record: &Record) -> RepositoryResult<String>;

    /// 在父记录的子表中追加一行并保存父记录
    ///
    /// # 参数
    /// - parent_doctype: 父记录类型
    /// - parent: 父记录名
    /// - child_field: 子表字段名
    ///
    /// # 返回
    /// - Ok(String): 子表行名
    /// - Err(NotFound): 父记录不存在
    fn append_child(
        &self,
        parent_doctype: &str,
        parent: &str,
        child_field: &str,
        record: &Record,
    ) -> RepositoryResult<String>;

    fn get_record(&self, doctype: &str, name: &str) -> RepositoryResult<Option<StoredRecord>>;

    /// 按创建顺序列出 doctype 的全部独立记录
    fn list_records(&self, doctype: &str) -> RepositoryResult<Vec<StoredRecord>>;

    /// 按 idx 顺序列出子表行
    fn list_children(
        &self,
        parent_doctype: &str,
        parent: &str,
        child_field: &str,
    ) -> RepositoryResult<Vec<StoredRecord>>;
}
