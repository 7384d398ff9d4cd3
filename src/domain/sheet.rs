// ==========================================
// 表格列映射导入 - 表格数据类型
// ==========================================
// 职责: 数据行 / 嵌入图片
// 约束: 行、列、锚点坐标均为 0 起；第 0 行为表头
// ==========================================

use crate::domain::record::CellValue;
use std::sync::Arc;

static NULL_CELL: CellValue = CellValue::Null;

// ==========================================
// SheetRow - 数据行
// ==========================================
// 长度与表头宽度一致（不足补 null，超出截断）
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SheetRow {
    cells: Vec<CellValue>,
}

impl SheetRow {
    pub fn new(mut cells: Vec<CellValue>, width: usize) -> Self {
        cells.resize(width, CellValue::Null);
        Self { cells }
    }

    /// 取列值；越界视为 null
    pub fn get(&self, column_index: usize) -> &CellValue {
        self.cells.get(column_index).unwrap_or(&NULL_CELL)
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

}

// ==========================================
// EmbeddedImage - 嵌入图片
// ==========================================
// 锚点取左上角单元格 (xdr:from)
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddedImage {
    pub anchor_row: usize,
    pub anchor_col: usize,
    pub binary_content: Arc<[u8]>,
    pub content_ref: String, // 包内部件名，如 xl/media/image1.png
}

impl EmbeddedImage {
    pub fn new(
        anchor_row: usize,
        anchor_col: usize,
        binary_content: impl Into<Arc<[u8]>>,
        content_ref: impl Into<String>,
    ) -> Self {
        Self {
            anchor_row,
            anchor_col,
            binary_content: binary_content.into(),
            content_ref: content_ref.into(),
        }
    }

    pub fn is_anchored_at(&self, row: usize, col: usize) -> bool {
        self.anchor_row == row && self.anchor_col == col
    }
}
