// ==========================================
// 表格列映射导入 - 嵌入图片提取
// ==========================================
// 职责: 读取嵌入图片字节并识别真实格式（不信任文件名）
// 约束: 读取前将内容流复位到起点，保证可重复提取
// ==========================================

use crate::domain::sheet::EmbeddedImage;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::sheet_reader::SheetHandle;
use image::{ImageFormat, ImageReader};
use std::io::{Cursor, Read, Seek, SeekFrom};

// ==========================================
// ExtractedImage - 已解码图片
// ==========================================
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedImage {
    pub bytes: Vec<u8>,
    pub format: ImageFormat,
    pub width: u32,
    pub height: u32,
}

impl ExtractedImage {
    /// 格式对应的文件扩展名（png / jpg / gif ...）
    pub fn extension(&self) -> &'static str {
        format_extension(self.format)
    }
}

pub fn format_extension(format: ImageFormat) -> &'static str {
    format.extensions_str().first().copied().unwrap_or("bin")
}

// ==========================================
// ImageExtractor
// ==========================================
pub struct ImageExtractor;

impl ImageExtractor {
    /// 提取单张图片
    ///
    /// # 返回
    /// - Ok(ExtractedImage): 原始字节 + 识别出的格式
    /// - Err(Decode): 内容不是有效图片
    pub fn extract(&self, image: &EmbeddedImage) -> ImportResult<ExtractedImage> {
        let mut cursor = Cursor::new(&image.binary_content[..]);

        // 复位后读取全部字节
        cursor.seek(SeekFrom::Start(0))?;
        let mut bytes = Vec::with_capacity(image.binary_content.len());
        cursor.read_to_end(&mut bytes)?;

        // 复位后按内容识别格式
        cursor.seek(SeekFrom::Start(0))?;
        let reader = ImageReader::new(cursor)
            .with_guessed_format()
            .map_err(|e| ImportError::decode(&image.content_ref, e))?;

        let format = reader.format().ok_or_else(|| {
            ImportError::decode(&image.content_ref, "无法识别的图片格式")
        })?;

        // 只解析图片头，校验内容有效
        let (width, height) = reader
            .into_dimensions()
            .map_err(|e| ImportError::decode(&image.content_ref, e))?;

        Ok(ExtractedImage {
            bytes,
            format,
            width,
            height,
        })
    }

    /// 提取锚定在 (row, col) 的图片
    ///
    /// # 返回
    /// - Ok(None): 该位置无图片（稀疏图片列的正常情况）
    pub fn extract_at(
        &self,
        sheet: &SheetHandle,
        row: usize,
        col: usize,
    ) -> ImportResult<Option<ExtractedImage>> {
        match sheet.image_at(row, col) {
            Some(image) => self.extract(image).map(Some),
            None => Ok(None),
        }
    }
}
