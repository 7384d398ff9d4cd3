// ==========================================
// 表格列映射导入 - 字段映射领域类型
// ==========================================
// 职责: 列映射配置项 / 字段类型 / 交集字段
// 红线: 映射配置在一次导入内不可变
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

/// 图片字段类型名（配置中的字面值）
pub const IMAGE_FIELD_TYPE: &str = "Image";

// ==========================================
// 字段类型 (Field Type)
// ==========================================
// "Image" → 从嵌入图片提取并上传
// 其他任意字符串 → 标量类型，原样取单元格值
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FieldType {
    Image,
    Scalar(String),
}

impl FieldType {
    pub fn is_image(&self) -> bool {
        matches!(self, FieldType::Image)
    }
}

impl From<String> for FieldType {
    fn from(value: String) -> Self {
        if value == IMAGE_FIELD_TYPE {
            FieldType::Image
        } else {
            FieldType::Scalar(value)
        }
    }
}

impl From<&str> for FieldType {
    fn from(value: &str) -> Self {
        FieldType::from(value.to_string())
    }
}

impl From<FieldType> for String {
    fn from(value: FieldType) -> Self {
        value.to_string()
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldType::Image => write!(f, "{}", IMAGE_FIELD_TYPE),
            FieldType::Scalar(kind) => write!(f, "{}", kind),
        }
    }
}

// ==========================================
// FieldMapping - 列映射配置项
// ==========================================
// 来源: 外部配置（JSON）
// 约束: source_column_name 在同一映射集合内应唯一
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldMapping {
    #[serde(alias = "file_field")]
    pub source_column_name: String, // 表头列名
    pub target_field: String,       // 目标记录字段
    pub field_type: FieldType,      // 字段类型
}

impl FieldMapping {
    pub fn new(
        source_column_name: impl Into<String>,
        target_field: impl Into<String>,
        field_type: impl Into<FieldType>,
    ) -> Self {
        Self {
            source_column_name: source_column_name.into(),
            target_field: target_field.into(),
            field_type: field_type.into(),
        }
    }
}

// ==========================================
// IntersectedField - 交集字段
// ==========================================
// 每次导入按实际表头派生
// 顺序: 表头列顺序（不是映射声明顺序）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntersectedField {
    pub column_index: usize, // 表头中的列位置（0 起）
    pub target_field: String,
    pub field_type: FieldType,
}
