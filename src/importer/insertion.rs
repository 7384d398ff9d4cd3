// ==========================================
// 表格列映射导入 - 插入策略
// ==========================================
// Standalone: 新建 target 类型记录并保存
// ChildOfParent: 加载父记录，在子表末尾追加一行并保存父记录
// 约束: 每行一次持久化调用，不批量；失败直接向上传播
// ==========================================

use crate::domain::record::{InsertMode, Record};
use crate::importer::error::ImportResult;
use crate::repository::record_store::RecordStore;
use std::sync::Arc;

pub struct InsertionStrategy {
    store: Arc<dyn RecordStore>,
    mode: InsertMode,
}

impl InsertionStrategy {
    pub fn new(store: Arc<dyn RecordStore>, mode: InsertMode) -> Self {
        Self { store, mode }
    }

    /// 插入单条记录
    ///
    /// # 返回
    /// - Ok(String): 新记录名或子表行名
    /// - Err(Storage): 持久化失败 / 父记录不存在
    pub fn insert(&self, record: &Record) -> ImportResult<String> {
        let name = match &self.mode {
            InsertMode::Standalone { target } => self.store.insert_record(target, record)?,
            InsertMode::ChildOfParent {
                target,
                parent,
                child_field,
            } => self
                .store
                .append_child(target, parent, child_field, record)?,
        };
        Ok(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::importer::error::ImportError;
    use crate::repository::error::{RepositoryError, RepositoryResult};
    use crate::repository::record_store::StoredRecord;
    use serde_json::json;
    use std::sync::Mutex;

    // 记录每次调用，校验模式分发
    #[derive(Default)]
    struct CallLog {
        calls: Mutex<Vec<String>>,
    }

    impl RecordStore for CallLog {
        fn insert_record(&self, doctype: &str, record: &Record) -> RepositoryResult<String> {
            self.calls
                .lock()
                .unwrap()
                .push(format!("insert:{}:{}", doctype, record.to_json()));
            Ok("REC-1".to_string())
        }

        fn append_child(
            &self,
            parent_doctype: &str,
            parent: &str,
            child_field: &str,
            _record: &Record,
        ) -> RepositoryResult<String> {
            if parent == "MISSING" {
                return Err(RepositoryError::NotFound {
                    entity: parent_doctype.to_string(),
                    id: parent.to_string(),
                });
            }
            self.calls
                .lock()
                .unwrap()
                .push(format!("append:{}:{}:{}", parent_doctype, parent, child_field));
            Ok("ROW-1".to_string())
        }

        fn get_record(&self, _: &str, _: &str) -> RepositoryResult<Option<StoredRecord>> {
            Ok(None)
        }

        fn list_records(&self, _: &str) -> RepositoryResult<Vec<StoredRecord>> {
            Ok(Vec::new())
        }

        fn list_children(&self, _: &str, _: &str, _: &str) -> RepositoryResult<Vec<StoredRecord>> {
            Ok(Vec::new())
        }
    }

    fn record() -> Record {
        vec![("full_name".to_string(), json!("Alice"))]
            .into_iter()
            .collect()
    }

    #[test]
    fn test_standalone_creates_record() {
        let log = Arc::new(CallLog::default());
        let strategy = InsertionStrategy::new(
            log.clone(),
            InsertMode::Standalone {
                target: "Person".to_string(),
            },
        );

        assert_eq!(strategy.insert(&record()).unwrap(), "REC-1");
        assert_eq!(
            log.calls.lock().unwrap().as_slice(),
            &[r#"insert:Person:{"full_name":"Alice"}"#.to_string()]
        );
    }

    #[test]
    fn test_child_of_parent_appends() {
        let log = Arc::new(CallLog::default());
        let strategy = InsertionStrategy::new(
            log.clone(),
            InsertMode::ChildOfParent {
                target: "Order".to_string(),
                parent: "ORD-001".to_string(),
                child_field: "items".to_string(),
            },
        );

        strategy.insert(&record()).unwrap();
        strategy.insert(&record()).unwrap();

        // 每行一次持久化调用
        assert_eq!(
            log.calls.lock().unwrap().as_slice(),
            &[
                "append:Order:ORD-001:items".to_string(),
                "append:Order:ORD-001:items".to_string()
            ]
        );
    }

    #[test]
    fn test_missing_parent_propagates() {
        let strategy = InsertionStrategy::new(
            Arc::new(CallLog::default()),
            InsertMode::ChildOfParent {
                target: "Order".to_string(),
                parent: "MISSING".to_string(),
                child_field: "items".to_string(),
            },
        );

        let result = strategy.insert(&record());
        assert!(matches!(
            result,
            Err(ImportError::Storage(RepositoryError::NotFound { .. }))
        ));
    }
}
