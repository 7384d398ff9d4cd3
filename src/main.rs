// ==========================================
// 表格列映射导入 - 命令行入口
// ==========================================
// 用法:
//   column-mapper <config.json> [db_path]
// 输出: 导入汇总（JSON，stdout）；日志写 stderr
// ==========================================

use anyhow::{bail, Context, Result};
use column_mapper::config::{AppConfig, ColumnMapperConfig};
use column_mapper::db::{init_schema, open_sqlite_connection};
use column_mapper::importer::{ColumnMapper, UniversalSheetReader};
use column_mapper::repository::{SqliteAssetStore, SqliteRecordStore};
use column_mapper::{logging, APP_NAME, VERSION};
use std::sync::{Arc, Mutex};

fn main() -> Result<()> {
    logging::init();

    let mut args = std::env::args().skip(1);
    let Some(config_path) = args.next() else {
        bail!("用法: column-mapper <config.json> [db_path]");
    };

    tracing::info!("{} v{}", APP_NAME, VERSION);

    let config = ColumnMapperConfig::load_from_path(&config_path)
        .with_context(|| format!("加载映射配置失败: {}", config_path))?;
    let app_config = AppConfig::from_env().with_db_path(args.next());
    tracing::info!("使用数据库: {}", app_config.db_path);

    let conn = open_sqlite_connection(&app_config.db_path)
        .with_context(|| format!("打开数据库失败: {}", app_config.db_path))?;
    init_schema(&conn).context("初始化数据库 schema 失败")?;
    let conn = Arc::new(Mutex::new(conn));

    let record_store = Arc::new(SqliteRecordStore::from_connection(conn.clone())?);
    let asset_store = Arc::new(SqliteAssetStore::from_connection(conn)?);

    let mapper = ColumnMapper::new(
        config,
        Box::new(UniversalSheetReader),
        record_store,
        asset_store,
    );

    let summary = mapper.import_data().context("导入失败")?;
    println!("{}", serde_json::to_string_pretty(&summary)?);

    Ok(())
}
