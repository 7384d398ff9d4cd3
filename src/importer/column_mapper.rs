// ==========================================
// 表格列映射导入 - 导入入口
// ==========================================
// 流程:
// 1. 解析插入模式（子表模式参数缺失直接失败）
// 2. 打开来源的活动工作表，读取表头
// 3. 表头 ∩ 列映射 → 交集字段（为空则空运行）
// 4. 逐行: 构建记录（图片上传） → 插入
// 约束:
// - 单线程顺序处理，每行一次持久化调用
// - 某行失败立即终止，已插入行不回滚
// - 来源文件与工作表在一次运行内只解析一次
// ==========================================

use crate::config::mapper_config::ColumnMapperConfig;
use crate::domain::record::{ImportSummary, RowOutcome};
use crate::importer::asset_uploader::AssetUploader;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::field_mapper::FieldMapper;
use crate::importer::insertion::InsertionStrategy;
use crate::importer::record_builder::RecordBuilder;
use crate::importer::sheet_reader::{SheetHandle, SheetReader, SourceFile};
use crate::repository::asset_store::{AssetStore, PRIVATE_FILE_PREFIX, PUBLIC_FILE_PREFIX};
use crate::repository::record_store::RecordStore;
use std::cell::OnceCell;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

// ==========================================
// ColumnMapper
// ==========================================
pub struct ColumnMapper {
    config: ColumnMapperConfig,
    reader: Box<dyn SheetReader>,
    record_store: Arc<dyn RecordStore>,
    asset_store: Arc<dyn AssetStore>,
}

impl ColumnMapper {
    pub fn new(
        config: ColumnMapperConfig,
        reader: Box<dyn SheetReader>,
        record_store: Arc<dyn RecordStore>,
        asset_store: Arc<dyn AssetStore>,
    ) -> Self {
        Self {
            config,
            reader,
            record_store,
            asset_store,
        }
    }

    pub fn config(&self) -> &ColumnMapperConfig {
        &self.config
    }

    /// 执行导入
    ///
    /// # 返回
    /// - Ok(ImportSummary): 全部行处理完成（含空运行）
    /// - Err(Configuration): 子表模式缺少父记录 / 子表字段
    /// - Err(FileNotFound / UnsupportedFormat / FileFormat): 来源无法读取，未处理任何行
    /// - Err(RowFailed): 某行构建或插入失败，携带已插入行数
    #[instrument(
        skip(self),
        fields(
            source_file = %self.config.source_file,
            ref_doctype = %self.config.ref_doctype,
            document_type = %self.config.document_type
        )
    )]
    pub fn import_data(&self) -> ImportResult<ImportSummary> {
        let started = Instant::now();
        let mode = self.config.insert_mode()?;

        let run = ImportRun::new(self);
        info!(run_id = %run.run_id, mode = ?mode, "开始导入");

        let sheet = run.sheet()?;
        let fields = FieldMapper::new(&self.config.field_mapper).intersect(sheet.headers());

        let mut summary = ImportSummary {
            run_id: run.run_id.clone(),
            source_file: self.config.source_file.clone(),
            intersected_fields: fields.len(),
            ..Default::default()
        };

        if fields.is_empty() {
            warn!(
                headers = ?sheet.headers(),
                mappings = self.config.field_mapper.len(),
                "表头与列映射无交集，跳过导入"
            );
            summary.elapsed_ms = elapsed_ms(started);
            return Ok(summary);
        }
        debug!(fields = ?fields, "交集字段");

        let uploader = AssetUploader::new(self.asset_store.clone());
        let builder = RecordBuilder::new(sheet, &uploader);
        let strategy = InsertionStrategy::new(self.record_store.clone(), mode);

        // 每个数据行插入一次，空白行同样插入（字段为 null）
        for (row_index, row) in sheet.rows() {
            summary.total_rows += 1;

            let result = builder.build(row, row_index, &fields).and_then(|built| {
                strategy
                    .insert(&built.record)
                    .map(|record_name| (record_name, built.images))
            });

            match result {
                Ok((record_name, images)) => {
                    debug!(row_index = row_index, record_name = %record_name, "行已导入");
                    summary.inserted += 1;
                    summary.images_uploaded += images.uploaded;
                    summary.images_missing += images.missing;
                    summary.image_decode_failures += images.decode_failures;
                    summary.outcomes.push(RowOutcome {
                        row_index,
                        record_name,
                        images_uploaded: images.uploaded,
                    });
                }
                Err(e) => {
                    error!(
                        row_index = row_index,
                        inserted = summary.inserted,
                        error = %e,
                        "行导入失败，终止"
                    );
                    return Err(ImportError::RowFailed {
                        row: row_index,
                        inserted: summary.inserted,
                        source: Box::new(e),
                    });
                }
            }
        }

        summary.elapsed_ms = elapsed_ms(started);
        info!(
            inserted = summary.inserted,
            images_uploaded = summary.images_uploaded,
            image_decode_failures = summary.image_decode_failures,
            elapsed_ms = summary.elapsed_ms,
            "导入完成"
        );
        Ok(summary)
    }

    /// 解析来源: 资产引用 → 资产存储；否则按本地路径读取
    fn resolve_source(&self) -> ImportResult<SourceFile> {
        let reference = self.config.source_file.trim();

        if is_asset_reference(reference) {
            let bytes = self
                .asset_store
                .fetch(reference)?
                .ok_or_else(|| ImportError::FileNotFound(reference.to_string()))?;
            debug!(reference = %reference, size = bytes.len(), "来源文件取自资产存储");
            return Ok(SourceFile::from_bytes(reference, bytes));
        }

        SourceFile::from_path(reference)
    }
}

fn is_asset_reference(reference: &str) -> bool {
    reference.starts_with(PUBLIC_FILE_PREFIX) || reference.starts_with(PRIVATE_FILE_PREFIX)
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}

// ==========================================
// ImportRun - 单次导入的临时状态
// ==========================================
// 来源文件与工作表首次访问时解析，之后复用
struct ImportRun<'a> {
    mapper: &'a ColumnMapper,
    run_id: String,
    source: OnceCell<SourceFile>,
    sheet: OnceCell<SheetHandle>,
}

impl<'a> ImportRun<'a> {
    fn new(mapper: &'a ColumnMapper) -> Self {
        Self {
            mapper,
            run_id: Uuid::new_v4().to_string(),
            source: OnceCell::new(),
            sheet: OnceCell::new(),
        }
    }

    fn source(&self) -> ImportResult<&SourceFile> {
        if let Some(source) = self.source.get() {
            return Ok(source);
        }
        let resolved = self.mapper.resolve_source()?;
        Ok(self.source.get_or_init(|| resolved))
    }

    fn sheet(&self) -> ImportResult<&SheetHandle> {
        if let Some(sheet) = self.sheet.get() {
            return Ok(sheet);
        }
        let source = self.source()?;
        let opened = self.mapper.reader.open(source)?;
        debug!(
            source = %source.name(),
            sheet = %opened.sheet_name(),
            rows = opened.row_count(),
            "工作表已打开"
        );
        Ok(self.sheet.get_or_init(|| opened))
    }
}
