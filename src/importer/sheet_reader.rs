// ==========================================
// 表格列映射导入 - 表格读取接口
// ==========================================
// 职责: 打开表格来源，暴露表头 / 数据行 / 按锚点查找嵌入图片
// 约束: 一次导入只打开一个 SheetHandle，表头读取、行遍历、图片查找共用
// ==========================================

use crate::domain::sheet::{EmbeddedImage, SheetRow};
use crate::importer::error::{ImportError, ImportResult};
use std::path::Path;

// ==========================================
// SourceFile - 已解析的表格来源
// ==========================================
// 本地路径或资产存储中的文件，统一读入内存
#[derive(Debug, Clone)]
pub struct SourceFile {
    name: String,
    bytes: Vec<u8>,
}

impl SourceFile {
    /// 从本地路径读取
    pub fn from_path<P: AsRef<Path>>(path: P) -> ImportResult<Self> {
        let path = path.as_ref();

        // 检查文件存在
        if !path.is_file() {
            return Err(ImportError::FileNotFound(path.display().to_string()));
        }

        let bytes = std::fs::read(path)?;
        Ok(Self {
            name: path.display().to_string(),
            bytes,
        })
    }

    pub fn from_bytes(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// 小写扩展名（无扩展名时为空串）
    pub fn extension(&self) -> String {
        Path::new(&self.name)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase()
    }
}

// ==========================================
// SheetHandle - 已打开的工作表
// ==========================================
// 行号约定: 与 0 起的工作表行号一致
//   第 0 行为表头，首个数据行 row_index = 1
//   图片锚点 (anchor_row, anchor_col) 直接与 (row_index, column_index) 比较
#[derive(Debug, Clone, Default)]
pub struct SheetHandle {
    sheet_name: String,
    headers: Vec<String>,
    rows: Vec<SheetRow>,
    images: Vec<EmbeddedImage>,
}

impl SheetHandle {
    pub fn new(
        sheet_name: impl Into<String>,
        headers: Vec<String>,
        rows: Vec<Vec<crate::domain::record::CellValue>>,
        images: Vec<EmbeddedImage>,
    ) -> Self {
        let width = headers.len();
        Self {
            sheet_name: sheet_name.into(),
            rows: rows
                .into_iter()
                .map(|cells| SheetRow::new(cells, width))
                .collect(),
            headers,
            images,
        }
    }

    pub fn sheet_name(&self) -> &str {
        &self.sheet_name
    }

    /// 表头（首行单元格值的字符串形式）
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// 数据行（跳过表头），产出 (row_index, row)
    pub fn rows(&self) -> impl Iterator<Item = (usize, &SheetRow)> + '_ {
        self.rows.iter().enumerate().map(|(idx, row)| (idx + 1, row))
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// 查找锚定在 (row, col) 的第一张图片
    ///
    /// 每次调用都线性扫描全部图片，不建索引（大表格时需关注）
    pub fn image_at(&self, row: usize, col: usize) -> Option<&EmbeddedImage> {
        self.images.iter().find(|img| img.is_anchored_at(row, col))
    }

    pub fn images(&self) -> &[EmbeddedImage] {
        &self.images
    }
}

// ==========================================
// SheetReader Trait
// ==========================================
// 实现者: XlsxSheetReader, CsvSheetReader, UniversalSheetReader
pub trait SheetReader: Send + Sync {
    /// 打开来源的活动工作表
    ///
    /// # 返回
    /// - Ok(SheetHandle): 表头 + 数据行 + 嵌入图片
    /// - Err(FileFormat): 不是可读的表格
    fn open(&self, source: &SourceFile) -> ImportResult<SheetHandle>;
}
