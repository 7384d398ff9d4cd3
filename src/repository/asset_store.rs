// ==========================================
// 表格列映射导入 - 资产存储 Trait
// ==========================================
// 职责: 定义二进制资产（图片/源文件）的持久化接口
// 红线: 只做存取，不负责命名与格式识别
// ==========================================

use crate::repository::error::RepositoryResult;

/// 公开资产 URL 前缀
pub const PUBLIC_FILE_PREFIX: &str = "/files/";

/// 私有资产 URL 前缀
pub const PRIVATE_FILE_PREFIX: &str = "/private/files/";

// ==========================================
// NewAsset - 待落库资产
// ==========================================
#[derive(Debug, Clone, Copy)]
pub struct NewAsset<'a> {
    pub file_name: &'a str,
    pub file_type: &'a str, // 扩展名（png / jpg ...）
    pub content: &'a [u8],
    pub is_private: bool,
}

impl<'a> NewAsset<'a> {
    pub fn file_url(&self) -> String {
        let prefix = if self.is_private {
            PRIVATE_FILE_PREFIX
        } else {
            PUBLIC_FILE_PREFIX
        };
        format!("{}{}", prefix, self.file_name)
    }
}

// ==========================================
// AssetStore Trait
// ==========================================
// 实现者: SqliteAssetStore（使用 rusqlite）
pub trait AssetStore: Send + Sync {
    /// 保存资产
    ///
    /// # 返回
    /// - Ok(String): 资产引用（file_url），可直接作为字段值
    fn store(&self, asset: NewAsset<'_>) -> RepositoryResult<String>;

    /// 按引用读取资产内容
    ///
    /// # 返回
    /// - Ok(None): 引用不存在
    fn fetch(&self, reference: &str) -> RepositoryResult<Option<Vec<u8>>>;
}
