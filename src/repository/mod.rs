// ==========================================
// 表格列映射导入 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// 职责: 目标记录 / 子表行 / 二进制资产的持久化
// 约束: 所有查询使用参数化,防止 SQL 注入
// ==========================================

pub mod asset_store;
pub mod asset_store_impl;
pub mod error;
pub mod record_store;
pub mod record_store_impl;

// 重导出核心仓储
pub use asset_store::{AssetStore, NewAsset};
pub use asset_store_impl::SqliteAssetStore;
pub use error::{RepositoryError, RepositoryResult};
pub use record_store::{RecordStore, StoredRecord};
pub use record_store_impl::SqliteRecordStore;
