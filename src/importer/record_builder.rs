// ==========================================
// 表格列映射导入 - 记录构建器
// ==========================================
// 职责: 数据行 + 交集字段 → 目标记录
// 规则:
// - 标量字段: 原样取 row[column_index]（null 原样透传）
// - Image 字段: 按 (row_index, column_index) 查找锚定图片 → 上传 → 存引用
//   无图片 → null；图片无法解码 → 告警后降级为 null
// - 同一 target_field 多次出现时后写覆盖
// ==========================================

use crate::domain::field::IntersectedField;
use crate::domain::record::{CellValue, Record};
use crate::domain::sheet::SheetRow;
use crate::importer::asset_uploader::AssetUploader;
use crate::importer::error::ImportResult;
use crate::importer::image_extractor::ImageExtractor;
use crate::importer::sheet_reader::SheetHandle;
use tracing::{debug, warn};

/// 单行图片处理计数
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImageStats {
    pub uploaded: usize,
    pub missing: usize,
    pub decode_failures: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BuiltRecord {
    pub record: Record,
    pub images: ImageStats,
}

pub struct RecordBuilder<'a> {
    sheet: &'a SheetHandle,
    extractor: ImageExtractor,
    uploader: &'a AssetUploader,
}

impl<'a> RecordBuilder<'a> {
    pub fn new(sheet: &'a SheetHandle, uploader: &'a AssetUploader) -> Self {
        Self {
            sheet,
            extractor: ImageExtractor,
            uploader,
        }
    }

    /// 构建单行记录
    ///
    /// # 参数
    /// - row: 数据行
    /// - row_index: 数据行号（首个数据行为 1，与图片锚点行一致）
    /// - fields: 交集字段（表头列顺序）
    ///
    /// # 返回
    /// - Err(Storage): 图片上传失败
    pub fn build(
        &self,
        row: &SheetRow,
        row_index: usize,
        fields: &[IntersectedField],
    ) -> ImportResult<BuiltRecord> {
        let mut record = Record::new();
        let mut images = ImageStats::default();

        for field in fields {
            let value = if field.field_type.is_image() {
                self.image_value(row_index, field, &mut images)?
            } else {
                row.get(field.column_index).clone()
            };

            if record.set(field.target_field.clone(), value).is_some() {
                debug!(
                    row_index = row_index,
                    target_field = %field.target_field,
                    "目标字段重复，后写覆盖"
                );
            }
        }

        Ok(BuiltRecord { record, images })
    }

    fn image_value(
        &self,
        row_index: usize,
        field: &IntersectedField,
        images: &mut ImageStats,
    ) -> ImportResult<CellValue> {
        match self
            .extractor
            .extract_at(self.sheet, row_index, field.column_index)
        {
            Ok(Some(image)) => {
                let reference = self.uploader.upload_image(&image)?;
                images.uploaded += 1;
                Ok(CellValue::String(reference))
            }
            Ok(None) => {
                images.missing += 1;
                Ok(CellValue::Null)
            }
            Err(e) if e.is_decode() => {
                warn!(
                    row_index = row_index,
                    column_index = field.column_index,
                    target_field = %field.target_field,
                    error = %e,
                    "图片无法解码，按无图片处理"
                );
                images.decode_failures += 1;
                Ok(CellValue::Null)
            }
            Err(e) => Err(e),
        }
    }
}
