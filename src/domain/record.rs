// ==========================================
// 表格列映射导入 - 记录与导入结果
// ==========================================
// 职责: 行记录 / 插入模式 / 导入汇总
// 红线: Record 每行新建，交给插入策略后即丢弃
// ==========================================

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 单元格值（标量 / null / 资产引用字符串）
pub type CellValue = serde_json::Value;

/// document_type 取该值时走独立记录模式
pub const STANDALONE_DOCUMENT_TYPE: &str = "Table";

// ==========================================
// Record - 目标记录
// ==========================================
// 键: target_field
// 同一 target_field 重复出现时后写覆盖（按表头列顺序）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record {
    fields: BTreeMap<String, CellValue>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// 写入字段，返回被覆盖的旧值
    pub fn set(&mut self, target_field: impl Into<String>, value: CellValue) -> Option<CellValue> {
        self.fields.insert(target_field.into(), value)
    }

    pub fn get(&self, target_field: &str) -> Option<&CellValue> {
        self.fields.get(target_field)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &CellValue)> {
        self.fields.iter()
    }

    /// 转为 JSON 对象（落库用）
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::Value::Object(
            self.fields
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        )
    }

    pub fn from_json(value: serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::Object(map) => Some(Self {
                fields: map.into_iter().collect(),
            }),
            _ => None,
        }
    }
}

impl FromIterator<(String, CellValue)> for Record {
    fn from_iter<I: IntoIterator<Item = (String, CellValue)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}

// ==========================================
// InsertMode - 插入模式
// ==========================================
// Standalone: 每行新建一条 target 类型记录
// ChildOfParent: 每行追加为 parent 记录 child_field 子表的一行
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InsertMode {
    Standalone {
        target: String,
    },
    ChildOfParent {
        target: String,
        parent: String,
        child_field: String,
    },
}

impl InsertMode {
    pub fn target(&self) -> &str {
        match self {
            InsertMode::Standalone { target } => target,
            InsertMode::ChildOfParent { target, .. } => target,
        }
    }
}

// ==========================================
// RowOutcome - 单行导入结果
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowOutcome {
    pub row_index: usize,    // 数据行号（与图片锚点行一致，首个数据行为 1）
    pub record_name: String, // 新建记录名 / 子表行名
    pub images_uploaded: usize,
}

// ==========================================
// ImportSummary - 导入汇总
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportSummary {
    pub run_id: String,
    pub source_file: String,
    pub intersected_fields: usize,
    pub total_rows: usize,          // 已处理的数据行（不含表头）
    pub inserted: usize,            // 成功插入行数
    pub images_uploaded: usize,
    pub images_missing: usize,      // 图片列无锚定图片
    pub image_decode_failures: usize,
    pub outcomes: Vec<RowOutcome>,
    pub elapsed_ms: u64,
}

impl ImportSummary {
    /// 无交集字段时的空运行
    pub fn is_noop(&self) -> bool {
        self.intersected_fields == 0
    }
}
