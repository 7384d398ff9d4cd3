// ==========================================
// 表格列映射导入 - 导入层
// ==========================================
// 职责: 表格读取 → 列映射 → 记录构建（含图片上传） → 插入
// 支持: Excel (.xlsx，含嵌入图片), CSV
// ==========================================

// 模块声明
pub mod asset_uploader;
pub mod column_mapper;
pub mod drawing;
pub mod error;
pub mod field_mapper;
pub mod file_parser;
pub mod image_extractor;
pub mod insertion;
pub mod record_builder;
pub mod sheet_reader;

// 重导出核心类型
pub use asset_uploader::AssetUploader;
pub use column_mapper::ColumnMapper;
pub use error::{ImportError, ImportResult};
pub use field_mapper::{intersect, FieldMapper};
pub use file_parser::{CsvSheetReader, UniversalSheetReader, XlsxSheetReader};
pub use image_extractor::{ExtractedImage, ImageExtractor};
pub use insertion::InsertionStrategy;
pub use record_builder::{BuiltRecord, ImageStats, RecordBuilder};

// 重导出 Trait 接口
pub use sheet_reader::{SheetHandle, SheetReader, SourceFile};
