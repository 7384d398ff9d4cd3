// ==========================================
// 表格列映射导入 - 核心库
// ==========================================
// 职责: 按列映射将表格数据行写入目标记录
// 技术栈: Rust + SQLite
// 插入模式: 独立记录 / 父记录子表行
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 映射配置、表格数据、记录
pub mod domain;

// 数据仓储层 - 记录 / 资产持久化
pub mod repository;

// 导入层 - 读取、映射、构建、插入
pub mod importer;

// 配置层 - 映射配置与运行环境
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一）
pub mod db;

// 日志系统
pub mod logging;

// ==========================================
// 重导出核心类型
// ==========================================

pub use config::{AppConfig, ColumnMapperConfig};
pub use domain::{
    CellValue, FieldMapping, FieldType, ImportSummary, InsertMode, IntersectedField, Record,
    RowOutcome,
};
pub use importer::{ColumnMapper, ImportError, ImportResult, UniversalSheetReader};
pub use repository::{AssetStore, RecordStore, SqliteAssetStore, SqliteRecordStore};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "表格列映射导入";
