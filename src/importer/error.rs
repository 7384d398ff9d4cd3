// ==========================================
// 表格列映射导入 - 导入模块错误类型
// ==========================================
// 工具: thiserror 派生宏
// 传播: 不做重试，交由调用方处理
// ==========================================

use crate::repository::RepositoryError;
use thiserror::Error;

/// 导入模块错误类型
#[derive(Error, Debug)]
pub enum ImportError {
    // ===== 文件相关错误 =====
    #[error("文件不存在: {0}")]
    FileNotFound(String),

    #[error("文件格式不支持: {0}（仅支持 .xlsx/.csv）")]
    UnsupportedFormat(String),

    /// 无法读取/解析的表格文件（在处理任何行之前终止）
    #[error("表格文件解析失败: {0}")]
    FileFormat(String),

    // ===== 图片相关错误 =====
    /// 嵌入图片无法解码（记录构建时降级为 null）
    #[error("图片解码失败 ({content_ref}): {message}")]
    Decode {
        content_ref: String,
        message: String,
    },

    // ===== 持久化错误 =====
    #[error("持久化失败: {0}")]
    Storage(#[from] RepositoryError),

    // ===== 配置错误 =====
    #[error("配置错误: {0}")]
    Configuration(String),

    // ===== 行级错误 =====
    /// 某行插入失败，之前已插入的行不回滚
    #[error("第 {row} 行导入失败（此前已插入 {inserted} 行）: {source}")]
    RowFailed {
        row: usize,
        inserted: usize,
        #[source]
        source: Box<ImportError>,
    },

    // ===== 通用错误 =====
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ImportError {
    pub fn decode(content_ref: impl Into<String>, message: impl ToString) -> Self {
        ImportError::Decode {
            content_ref: content_ref.into(),
            message: message.to_string(),
        }
    }

    pub fn is_decode(&self) -> bool {
        matches!(self, ImportError::Decode { .. })
    }
}

// 实现 From<std::io::Error>
impl From<std::io::Error> for ImportError {
    fn from(err: std::io::Error) -> Self {
        ImportError::FileFormat(err.to_string())
    }
}

// 实现 From<calamine::XlsxError>
impl From<calamine::XlsxError> for ImportError {
    fn from(err: calamine::XlsxError) -> Self {
        ImportError::FileFormat(err.to_string())
    }
}

// 实现 From<zip::result::ZipError>
impl From<zip::result::ZipError> for ImportError {
    fn from(err: zip::result::ZipError) -> Self {
        ImportError::FileFormat(err.to_string())
    }
}

// 实现 From<roxmltree::Error>
impl From<roxmltree::Error> for ImportError {
    fn from(err: roxmltree::Error) -> Self {
        ImportError::FileFormat(format!("XML 解析失败: {}", err))
    }
}

// 实现 From<csv::Error>
impl From<csv::Error> for ImportError {
    fn from(err: csv::Error) -> Self {
        ImportError::FileFormat(err.to_string())
    }
}

// 实现 From<image::ImageError>
impl From<image::ImageError> for ImportError {
    fn from(err: image::ImageError) -> Self {
        ImportError::decode("unknown", err)
    }
}

/// Result 类型别名
pub type ImportResult<T> = Result<T, ImportError>;
