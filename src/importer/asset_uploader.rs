// ==========================================
// 表格列映射导入 - 资产上传
// ==========================================
// 职责: 生成随机文件名并将图片字节保存为公开资产
// 约束: 失败不重试，直接向上传播（StorageError）
// ==========================================

use crate::importer::error::ImportResult;
use crate::importer::image_extractor::{format_extension, ExtractedImage};
use crate::repository::asset_store::{AssetStore, NewAsset};
use image::ImageFormat;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

/// 生成的文件名前缀
pub const FILE_NAME_PREFIX: &str = "new_file";

pub struct AssetUploader {
    store: Arc<dyn AssetStore>,
}

impl AssetUploader {
    pub fn new(store: Arc<dyn AssetStore>) -> Self {
        Self { store }
    }

    /// 上传字节，返回资产引用（可直接作为 Image 字段值）
    pub fn upload(&self, bytes: &[u8], format: ImageFormat) -> ImportResult<String> {
        let extension = format_extension(format);
        let file_name = generate_file_name(extension);

        let reference = self.store.store(NewAsset {
            file_name: &file_name,
            file_type: extension,
            content: bytes,
            is_private: false,
        })?;

        debug!(file_name = %file_name, reference = %reference, size = bytes.len(), "图片已上传");
        Ok(reference)
    }

    pub fn upload_image(&self, image: &ExtractedImage) -> ImportResult<String> {
        self.upload(&image.bytes, image.format)
    }
}

/// 随机、抗碰撞的文件名: new_file<uuid>.<ext>
fn generate_file_name(extension: &str) -> String {
    format!("{}{}.{}", FILE_NAME_PREFIX, Uuid::new_v4().simple(), extension)
}
