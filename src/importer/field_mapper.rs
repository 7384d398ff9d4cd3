// ==========================================
// 表格列映射导入 - 字段映射器实现
// ==========================================
// 职责: 声明的列映射 ∩ 实际表头 → 有序交集字段
// 规则:
// - 按表头列顺序输出，携带列位置
// - 无映射的表头静默跳过
// - 无对应表头的映射静默不用
// ==========================================

use crate::domain::field::{FieldMapping, FieldType, IntersectedField};
use std::collections::HashMap;
use tracing::warn;

pub struct FieldMapper {
    lookup: HashMap<String, (String, FieldType)>,
}

impl FieldMapper {
    /// 由映射表构建查找表（源列名 → (目标字段, 字段类型)）
    ///
    /// 源列名重复时后声明者生效
    pub fn new(mappings: &[FieldMapping]) -> Self {
        let mut lookup = HashMap::with_capacity(mappings.len());

        for mapping in mappings {
            let key = mapping.source_column_name.trim().to_string();
            let previous = lookup.insert(
                key,
                (mapping.target_field.clone(), mapping.field_type.clone()),
            );
            if previous.is_some() {
                warn!(
                    source_column = %mapping.source_column_name,
                    "源列名重复声明，以最后一条为准"
                );
            }
        }

        Self { lookup }
    }

    /// 计算交集字段
    pub fn intersect(&self, headers: &[String]) -> Vec<IntersectedField> {
        headers
            .iter()
            .enumerate()
            .filter_map(|(column_index, header)| {
                self.lookup
                    .get(header.trim())
                    .map(|(target_field, field_type)| IntersectedField {
                        column_index,
                        target_field: target_field.clone(),
                        field_type: field_type.clone(),
                    })
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.lookup.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lookup.is_empty()
    }
}

/// 便捷函数: intersect(headers, mappings)
pub fn intersect(headers: &[String], mappings: &[FieldMapping]) -> Vec<IntersectedField> {
    FieldMapper::new(mappings).intersect(headers)
}
