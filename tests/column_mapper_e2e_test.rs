// ==========================================
// 端到端集成测试 - 表格列映射导入
// ==========================================
// 测试目标: 真实 xlsx/csv 文件 → ColumnMapper → SQLite
// 覆盖范围: 独立记录、图片列、子表追加、空运行、行号约定、
//           图片解码降级、来源取自资产存储、中途持久化失败
// ==========================================


use column_mapper::config::ColumnMapperConfig;
use column_mapper::domain::{FieldMapping, Record};
use column_mapper::importer::{ColumnMapper, ImportError, UniversalSheetReader};
use column_mapper::logging;
use column_mapper::repository::{
    AssetStore, NewAsset, RecordStore, RepositoryError, RepositoryResult, SqliteAssetStore,
    SqliteRecordStore, StoredRecord,
};
use serde_json::json;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::TempDir;
use test_helpers::*;

// ==========================================
// 测试辅助函数
// ==========================================

fn standalone_config(source: &str, mappings: Vec<FieldMapping>) -> ColumnMapperConfig {
    ColumnMapperConfig {
        source_file: source.to_string(),
        document_type: "Table".to_string(),
        ref_doctype: "Person".to_string(),
        ref_doc: None,
        doc_field: None,
        field_mapper: mappings,
    }
}

fn child_config(source: &str, parent: &str, mappings: Vec<FieldMapping>) -> ColumnMapperConfig {
    ColumnMapperConfig {
        source_file: source.to_string(),
        document_type: "Child".to_string(),
        ref_doctype: "Order".to_string(),
        ref_doc: Some(parent.to_string()),
        doc_field: Some("items".to_string()),
        field_mapper: mappings,
    }
}

fn path_str(path: &Path) -> String {
    path.to_string_lossy().to_string()
}

fn run(
    config: ColumnMapperConfig,
    records: Arc<dyn RecordStore>,
    assets: Arc<SqliteAssetStore>,
) -> Result<column_mapper::ImportSummary, ImportError> {
    ColumnMapper::new(config, Box::new(UniversalSheetReader), records, assets).import_data()
}

// 第 N 次插入起失败的记录存储
struct FailingRecordStore {
    inner: Arc<SqliteRecordStore>,
    fail_from_call: usize,
    calls: AtomicUsize,
}

impl RecordStore for FailingRecordStore {
    fn insert_record(&self, doctype: &str, record: &Record) -> RepositoryResult<String> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if call >= self.fail_from_call {
            return Err(RepositoryError::DatabaseQueryError("disk I/O error".to_string()));
        }
        self.inner.insert_record(doctype, record)
    }

    fn append_child(
        &self,
        parent_doctype: &str,
        parent: &str,
        child_field: &str,
        record: &Record,
    ) -> RepositoryResult<String> {
        self.inner
            .append_child(parent_doctype, parent, child_field, record)
    }

    fn get_record(&self, doctype: &str, name: &str) -> RepositoryResult<Option<StoredRecord>> {
        self.inner.get_record(doctype, name)
    }

    fn list_records(&self, doctype: &str) -> RepositoryResult<Vec<StoredRecord>> {
        self.inner.list_records(doctype)
    }

    fn list_children(
        &self,
        parent_doctype: &str,
        parent: &str,
        child_field: &str,
    ) -> RepositoryResult<Vec<StoredRecord>> {
        self.inner.list_children(parent_doctype, parent, child_field)
    }
}

// ==========================================
// 测试用例 1: 独立记录，图片列未映射
// ==========================================

#[test]
fn test_standalone_scalar_columns() {
    logging::init_test();

    let dir = TempDir::new().unwrap();
    let (_db_file, db_path) = create_test_db().unwrap();
    let (records, assets) = open_stores(&db_path).unwrap();

    // Photo 列有图片但未映射
    let xlsx = people_xlsx(&dir, vec![(1, 1, png_bytes(4, 4, [0, 255, 0]))]).unwrap();
    let config = standalone_config(
        &path_str(&xlsx),
        vec![
            FieldMapping::new("Name", "full_name", "Data"),
            FieldMapping::new("Age", "years", "Int"),
        ],
    );

    let summary = run(config, records.clone(), assets.clone()).unwrap();

    assert_eq!(summary.intersected_fields, 2);
    assert_eq!(summary.inserted, 2);
    assert_eq!(summary.images_uploaded, 0);
    assert_eq!(assets.count().unwrap(), 0);

    let stored = records.list_records("Person").unwrap();
    assert_eq!(stored.len(), 2);
    assert_eq!(stored[0].record.to_json(), json!({"full_name": "Alice", "years": 30}));
    assert_eq!(stored[1].record.to_json(), json!({"full_name": "Bob", "years": 25}));
}

// ==========================================
// 测试用例 2: 图片列上传并回写引用
// ==========================================

#[test]
fn test_image_column_uploads_and_references() {
    logging::init_test();

    let dir = TempDir::new().unwrap();
    let (_db_file, db_path) = create_test_db().unwrap();
    let (records, assets) = open_stores(&db_path).unwrap();

    let png = png_bytes(3, 5, [255, 0, 0]);
    let xlsx = people_xlsx(&dir, vec![(1, 1, png.clone())]).unwrap();
    let config = standalone_config(
        &path_str(&xlsx),
        vec![
            FieldMapping::new("Name", "full_name", "Data"),
            FieldMapping::new("Photo", "avatar", "Image"),
        ],
    );

    let summary = run(config, records.clone(), assets.clone()).unwrap();
    assert_eq!(summary.images_uploaded, 1);
    assert_eq!(summary.images_missing, 1);
    // 首个数据行（row_index=1）即图片锚点行
    assert_eq!(summary.outcomes[0].row_index, 1);
    assert_eq!(summary.outcomes[0].images_uploaded, 1);

    let stored = records.list_records("Person").unwrap();
    let reference = stored[0]
        .record
        .get("avatar")
        .and_then(|v| v.as_str())
        .unwrap()
        .to_string();
    assert!(reference.starts_with("/files/new_file"));
    assert!(reference.ends_with(".png"));
    assert_eq!(stored[1].record.get("avatar"), Some(&json!(null)));

    // 取回内容与嵌入图片逐字节一致
    let fetched = assets.fetch(&reference).unwrap().unwrap();
    assert_eq!(fetched, png);
    assert_eq!(assets.count().unwrap(), 1);
}

// ==========================================
// 测试用例 3: 子表追加
// ==========================================

#[test]
fn test_child_rows_appended_in_source_order() {
    let dir = TempDir::new().unwrap();
    let (_db_file, db_path) = create_test_db().unwrap();
    let (records, assets) = open_stores(&db_path).unwrap();

    let parent: Record = vec![("customer".to_string(), json!("ACME"))]
        .into_iter()
        .collect();
    records
        .insert_record_with_name("Order", "ORD-001", &parent)
        .unwrap();
    let modified_before = records.modified_at("Order", "ORD-001").unwrap().unwrap();

    let xlsx = people_xlsx(&dir, vec![]).unwrap();
    let config = child_config(
        &path_str(&xlsx),
        "ORD-001",
        vec![
            FieldMapping::new("Name", "item_name", "Data"),
            FieldMapping::new("Age", "qty", "Int"),
        ],
    );

    let summary = run(config, records.clone(), assets).unwrap();
    assert_eq!(summary.inserted, 2);

    let children = records.list_children("Order", "ORD-001", "items").unwrap();
    assert_eq!(children.len(), 2);
    assert_eq!(children[0].idx, Some(1));
    assert_eq!(children[0].record.to_json(), json!({"item_name": "Alice", "qty": 30}));
    assert_eq!(children[1].idx, Some(2));
    assert_eq!(children[1].record.to_json(), json!({"item_name": "Bob", "qty": 25}));

    // 父记录已保存，自身字段不变
    let modified_after = records.modified_at("Order", "ORD-001").unwrap().unwrap();
    assert!(modified_after >= modified_before);
    let parent_after = records.get_record("Order", "ORD-001").unwrap().unwrap();
    assert_eq!(parent_after.record, parent);
    // 子表行不作为独立记录出现
    assert_eq!(records.list_records("Order").unwrap().len(), 1);
}

// ==========================================
// 测试用例 4: 无交集 → 空运行
// ==========================================

#[test]
fn test_no_matching_headers_is_noop() {
    let dir = TempDir::new().unwrap();
    let (_db_file, db_path) = create_test_db().unwrap();
    let (records, assets) = open_stores(&db_path).unwrap();

    let xlsx = people_xlsx(&dir, vec![(1, 1, png_bytes(2, 2, [1, 2, 3]))]).unwrap();
    let config = standalone_config(
        &path_str(&xlsx),
        vec![FieldMapping::new("Email", "email", "Data")],
    );

    let summary = run(config, records.clone(), assets.clone()).unwrap();
    assert!(summary.is_noop());
    assert_eq!(summary.inserted, 0);
    assert!(summary.outcomes.is_empty());
    assert!(records.list_records("Person").unwrap().is_empty());
    assert_eq!(assets.count().unwrap(), 0);
}

// ==========================================
// 测试用例 5: 行号约定
// ==========================================

#[test]
fn test_header_row_image_never_matched() {
    let dir = TempDir::new().unwrap();
    let (_db_file, db_path) = create_test_db().unwrap();
    let (records, assets) = open_stores(&db_path).unwrap();

    // 图片锚定在表头行 (0, 1) 与第二个数据行 (2, 1)
    let xlsx = people_xlsx(
        &dir,
        vec![
            (0, 1, png_bytes(2, 2, [9, 9, 9])),
            (2, 1, png_bytes(2, 2, [7, 7, 7])),
        ],
    )
    .unwrap();
    let config = standalone_config(
        &path_str(&xlsx),
        vec![
            FieldMapping::new("Name", "full_name", "Data"),
            FieldMapping::new("Photo", "avatar", "Image"),
        ],
    );

    let summary = run(config, records.clone(), assets.clone()).unwrap();
    assert_eq!(summary.images_uploaded, 1);

    let stored = records.list_records("Person").unwrap();
    assert_eq!(stored[0].record.get("avatar"), Some(&json!(null)));
    assert!(stored[1].record.get("avatar").and_then(|v| v.as_str()).is_some());
    assert_eq!(assets.count().unwrap(), 1);
}

#[test]
fn test_image_only_row_after_last_cell_is_imported() {
    let dir = TempDir::new().unwrap();
    let (_db_file, db_path) = create_test_db().unwrap();
    let (records, assets) = open_stores(&db_path).unwrap();

    // 第 3 行只有图片，没有任何单元格
    let xlsx = people_xlsx(&dir, vec![(3, 1, png_bytes(2, 2, [5, 5, 5]))]).unwrap();
    let config = standalone_config(
        &path_str(&xlsx),
        vec![
            FieldMapping::new("Name", "full_name", "Data"),
            FieldMapping::new("Photo", "avatar", "Image"),
        ],
    );

    let summary = run(config, records.clone(), assets).unwrap();
    assert_eq!(summary.inserted, 3);
    assert_eq!(summary.outcomes[2].row_index, 3);

    let stored = records.list_records("Person").unwrap();
    assert_eq!(stored[2].record.get("full_name"), Some(&json!(null)));
    assert!(stored[2].record.get("avatar").and_then(|v| v.as_str()).is_some());
}

// ==========================================
// 测试用例 6: 图片无法解码 → null
// ==========================================

#[test]
fn test_undecodable_image_becomes_null() {
    let dir = TempDir::new().unwrap();
    let (_db_file, db_path) = create_test_db().unwrap();
    let (records, assets) = open_stores(&db_path).unwrap();

    let original = people_xlsx(&dir, vec![(1, 1, png_bytes(2, 2, [0, 0, 0]))]).unwrap();
    let corrupted = dir.path().join("corrupted.xlsx");
    replace_media(&original, &corrupted, b"not an image at all").unwrap();

    let config = standalone_config(
        &path_str(&corrupted),
        vec![
            FieldMapping::new("Name", "full_name", "Data"),
            FieldMapping::new("Photo", "avatar", "Image"),
        ],
    );

    let summary = run(config, records.clone(), assets.clone()).unwrap();
    assert_eq!(summary.inserted, 2);
    assert_eq!(summary.image_decode_failures, 1);
    assert_eq!(summary.images_uploaded, 0);

    let stored = records.list_records("Person").unwrap();
    assert_eq!(stored[0].record.get("full_name"), Some(&json!("Alice")));
    assert_eq!(stored[0].record.get("avatar"), Some(&json!(null)));
    assert_eq!(assets.count().unwrap(), 0);
}

// ==========================================
// 测试用例 7: 来源文件取自资产存储
// ==========================================

#[test]
fn test_source_resolved_from_asset_store() {
    let dir = TempDir::new().unwrap();
    let (_db_file, db_path) = create_test_db().unwrap();
    let (records, assets) = open_stores(&db_path).unwrap();

    let xlsx = people_xlsx(&dir, vec![]).unwrap();
    let content = std::fs::read(&xlsx).unwrap();
    let reference = assets
        .store(NewAsset {
            file_name: "people_upload.xlsx",
            file_type: "xlsx",
            content: &content,
            is_private: true,
        })
        .unwrap();
    assert_eq!(reference, "/private/files/people_upload.xlsx");

    let config = standalone_config(&reference, vec![FieldMapping::new("Name", "full_name", "Data")]);
    let summary = run(config, records.clone(), assets).unwrap();

    assert_eq!(summary.source_file, reference);
    assert_eq!(summary.inserted, 2);
}

#[test]
fn test_unknown_asset_reference_is_file_not_found() {
    let (_db_file, db_path) = create_test_db().unwrap();
    let (records, assets) = open_stores(&db_path).unwrap();

    let config = standalone_config(
        "/files/missing.xlsx",
        vec![FieldMapping::new("Name", "full_name", "Data")],
    );
    let result = run(config, records.clone(), assets);

    assert!(matches!(result, Err(ImportError::FileNotFound(_))));
    assert!(records.list_records("Person").unwrap().is_empty());
}

// ==========================================
// 测试用例 8: 中途持久化失败
// ==========================================

#[test]
fn test_storage_failure_mid_run_keeps_earlier_rows() {
    let dir = TempDir::new().unwrap();
    let (_db_file, db_path) = create_test_db().unwrap();
    let (records, assets) = open_stores(&db_path).unwrap();

    let failing = Arc::new(FailingRecordStore {
        inner: records.clone(),
        fail_from_call: 2,
        calls: AtomicUsize::new(0),
    });

    let xlsx = people_xlsx(&dir, vec![]).unwrap();
    let config = standalone_config(&path_str(&xlsx), vec![FieldMapping::new("Name", "full_name", "Data")]);

    match run(config, failing, assets) {
        Err(ImportError::RowFailed {
            row,
            inserted,
            source,
        }) => {
            assert_eq!(row, 2);
            assert_eq!(inserted, 1);
            assert!(matches!(*source, ImportError::Storage(_)));
        }
        other => panic!("expected RowFailed, got {:?}", other),
    }

    // 已插入行不回滚
    let stored = records.list_records("Person").unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].record.get("full_name"), Some(&json!("Alice")));
}

#[test]
fn test_missing_parent_fails_first_row() {
    let dir = TempDir::new().unwrap();
    let (_db_file, db_path) = create_test_db().unwrap();
    let (records, assets) = open_stores(&db_path).unwrap();

    let xlsx = people_xlsx(&dir, vec![]).unwrap();
    let config = child_config(
        &path_str(&xlsx),
        "ORD-404",
        vec![FieldMapping::new("Name", "item_name", "Data")],
    );

    let err = run(config, records, assets).unwrap_err();
    match err {
        ImportError::RowFailed { row, inserted, source } => {
            assert_eq!((row, inserted), (1, 0));
            assert!(matches!(
                *source,
                ImportError::Storage(RepositoryError::NotFound { .. })
            ));
        }
        other => panic!("expected RowFailed, got {:?}", other),
    }
}

// ==========================================
// 测试用例 9: CSV 来源 / 不支持的格式
// ==========================================

#[test]
fn test_csv_source() {
    let dir = TempDir::new().unwrap();
    let (_db_file, db_path) = create_test_db().unwrap();
    let (records, assets) = open_stores(&db_path).unwrap();

    let csv = write_csv(&dir, "people.csv", "Name,Photo,Age\nAlice,,30\n,,\nBob,,25\n").unwrap();
    let config = standalone_config(
        &path_str(&csv),
        vec![
            FieldMapping::new("Name", "full_name", "Data"),
            FieldMapping::new("Photo", "avatar", "Image"),
        ],
    );

    let summary = run(config, records.clone(), assets).unwrap();
    assert_eq!(summary.inserted, 3);
    assert_eq!(summary.images_missing, 3);

    // 空白行同样插入，字段为 null
    let stored = records.list_records("Person").unwrap();
    assert_eq!(stored[1].record.to_json(), json!({"full_name": null, "avatar": null}));
    assert_eq!(stored[2].record.to_json(), json!({"full_name": "Bob", "avatar": null}));
}

#[test]
fn test_unsupported_extension() {
    let dir = TempDir::new().unwrap();
    let (_db_file, db_path) = create_test_db().unwrap();
    let (records, assets) = open_stores(&db_path).unwrap();

    let txt = write_csv(&dir, "people.txt", "Name\nAlice\n").unwrap();
    let config = standalone_config(&path_str(&txt), vec![FieldMapping::new("Name", "full_name", "Data")]);

    let result = run(config, records, assets);
    assert!(matches!(result, Err(ImportError::UnsupportedFormat(_))));
}

#[test]
fn test_config_from_json_end_to_end() {
    let dir = TempDir::new().unwrap();
    let (_db_file, db_path) = create_test_db().unwrap();
    let (records, assets) = open_stores(&db_path).unwrap();

    let xlsx = people_xlsx(&dir, vec![]).unwrap();
    let raw = json!({
        "source_file": path_str(&xlsx),
        "document_type": "Table",
        "ref_doctype": "Person",
        "field_mapper": [
            {"file_field": "Age", "target_field": "years", "field_type": "Int"}
        ]
    })
    .to_string();

    let config = ColumnMapperConfig::from_json_str(&raw).unwrap();
    let summary = run(config, records.clone(), assets).unwrap();

    assert_eq!(summary.inserted, 2);
    let stored = records.list_records("Person").unwrap();
    assert_eq!(stored[0].record.to_json(), json!({"years": 30}));
}
