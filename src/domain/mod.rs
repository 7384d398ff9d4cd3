// ==========================================
// 表格列映射导入 - 领域模型层
// ==========================================
// 职责: 映射配置、表格数据、目标记录、导入结果
// 红线: 不含数据访问逻辑,不含导入流程逻辑
// ==========================================

pub mod field;
pub mod record;
pub mod sheet;

// 重导出核心类型
pub use field::{FieldMapping, FieldType, IntersectedField, IMAGE_FIELD_TYPE};
pub use record::{
    CellValue, ImportSummary, InsertMode, Record, RowOutcome, STANDALONE_DOCUMENT_TYPE,
};
pub use sheet::{EmbeddedImage, SheetRow};
