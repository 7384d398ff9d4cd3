// ==========================================
// 表格列映射导入 - 配置层
// ==========================================
// 职责: 列映射与运行参数（JSON） / 运行环境（环境变量）
// ==========================================

pub mod app_config;
pub mod mapper_config;

pub use app_config::{get_default_db_path, AppConfig, DB_PATH_ENV};
pub use mapper_config::ColumnMapperConfig;
