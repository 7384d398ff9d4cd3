// ==========================================
// 表格列映射导入 - 运行环境配置
// ==========================================
// 数据库路径优先级: 显式参数 > COLUMN_MAPPER_DB_PATH > 用户数据目录
// ==========================================

use std::path::PathBuf;

/// 数据库路径环境变量
pub const DB_PATH_ENV: &str = "COLUMN_MAPPER_DB_PATH";

const APP_DIR_NAME: &str = "column-mapper";
const DB_FILE_NAME: &str = "column_mapper.db";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub db_path: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            db_path: get_default_db_path(),
        }
    }

    /// 显式指定路径时覆盖环境配置
    pub fn with_db_path(mut self, db_path: Option<String>) -> Self {
        if let Some(path) = db_path.filter(|p| !p.trim().is_empty()) {
            self.db_path = path;
        }
        self
    }
}

/// 获取默认数据库路径
pub fn get_default_db_path() -> String {
    if let Ok(path) = std::env::var(DB_PATH_ENV) {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from(format!("./{}", DB_FILE_NAME));

    if let Some(data_dir) = dirs::data_dir() {
        let dir = data_dir.join(APP_DIR_NAME);
        // 目录创建失败时回退到当前目录
        if std::fs::create_dir_all(&dir).is_ok() {
            path = dir.join(DB_FILE_NAME);
        }
    }

    path.to_string_lossy().to_string()
}
