// ==========================================
// 表格列映射导入 - 映射配置
// ==========================================
// 来源: JSON 文件 / 字符串
// 字段:
// - source_file: 本地路径或资产引用（/files/...）
// - document_type: "Table" → 独立记录；其他 → 追加为父记录子表行
// - ref_doctype: 目标类型（子表模式下为父记录类型）
// - ref_doc / doc_field: 子表模式下的父记录名 / 子表字段名
// - field_mapper: 列映射列表
// ==========================================

use crate::domain::field::FieldMapping;
use crate::domain::record::{InsertMode, STANDALONE_DOCUMENT_TYPE};
use crate::importer::error::{ImportError, ImportResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnMapperConfig {
    pub source_file: String,
    pub document_type: String,
    pub ref_doctype: String,

    #[serde(default)]
    pub ref_doc: Option<String>,

    #[serde(default)]
    pub doc_field: Option<String>,

    #[serde(default)]
    pub field_mapper: Vec<FieldMapping>,
}

impl ColumnMapperConfig {
    /// 从 JSON 文件加载
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> ImportResult<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(ImportError::FileNotFound(path.display().to_string()));
        }

        let raw = std::fs::read_to_string(path)
            .map_err(|e| ImportError::Configuration(format!("读取配置失败: {}", e)))?;
        Self::from_json_str(&raw)
    }

    pub fn from_json_str(raw: &str) -> ImportResult<Self> {
        let config: Self = serde_json::from_str(raw)
            .map_err(|e| ImportError::Configuration(format!("配置 JSON 无效: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// 基础校验（不校验插入模式参数，交由 insert_mode 处理）
    pub fn validate(&self) -> ImportResult<()> {
        if self.source_file.trim().is_empty() {
            return Err(ImportError::Configuration("source_file 不能为空".to_string()));
        }
        if self.ref_doctype.trim().is_empty() {
            return Err(ImportError::Configuration("ref_doctype 不能为空".to_string()));
        }
        if let Some(mapping) = self
            .field_mapper
            .iter()
            .find(|m| m.source_column_name.trim().is_empty() || m.target_field.trim().is_empty())
        {
            return Err(ImportError::Configuration(format!(
                "列映射缺少源列名或目标字段: {:?}",
                mapping
            )));
        }
        Ok(())
    }

    /// 解析插入模式
    ///
    /// # 返回
    /// - Err(Configuration): 子表模式缺少 ref_doc 或 doc_field
    pub fn insert_mode(&self) -> ImportResult<InsertMode> {
        if self.document_type == STANDALONE_DOCUMENT_TYPE {
            return Ok(InsertMode::Standalone {
                target: self.ref_doctype.clone(),
            });
        }

        let parent = non_blank(self.ref_doc.as_deref()).ok_or_else(|| {
            ImportError::Configuration(format!(
                "document_type={} 需要指定父记录 ref_doc",
                self.document_type
            ))
        })?;
        let child_field = non_blank(self.doc_field.as_deref()).ok_or_else(|| {
            ImportError::Configuration(format!(
                "document_type={} 需要指定子表字段 doc_field",
                self.document_type
            ))
        })?;

        Ok(InsertMode::ChildOfParent {
            target: self.ref_doctype.clone(),
            parent: parent.to_string(),
            child_field: child_field.to_string(),
        })
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
