// ==========================================
// 表格列映射导入 - 表格读取器实现
// ==========================================
// 支持: Excel (.xlsx，含锚定图片) / CSV (.csv，无图片)
// 约束: 只读活动工作表，首行为表头
// ==========================================

use crate::domain::record::CellValue;
use crate::importer::drawing::read_active_sheet;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::sheet_reader::{SheetHandle, SheetReader, SourceFile};
use calamine::{Data, Reader, Xlsx};
use chrono::{Duration, NaiveDate, NaiveDateTime, Timelike};
use csv::ReaderBuilder;
use std::io::Cursor;
use tracing::debug;

// ==========================================
// 单元格值转换
// ==========================================

/// calamine 单元格 → CellValue
///
/// - 空 → null
/// - 整数值的浮点 → 整数（Excel 数值统一按浮点存储）
/// - 日期 → ISO-8601 字符串
/// - 错误单元格 → 错误文本（如 #DIV/0!）
pub fn cell_to_value(cell: &Data) -> CellValue {
    match cell {
        Data::Empty => CellValue::Null,
        Data::String(s) => CellValue::String(s.clone()),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::Int(i) => CellValue::from(*i),
        Data::Float(f) => float_to_value(*f),
        Data::DateTime(dt) => {
            if dt.is_datetime() {
                excel_serial_to_iso(dt.as_f64())
                    .map(CellValue::String)
                    .unwrap_or_else(|| float_to_value(dt.as_f64()))
            } else {
                float_to_value(dt.as_f64())
            }
        }
        Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::String(s.clone()),
        Data::Error(e) => CellValue::String(e.to_string()),
    }
}

fn float_to_value(f: f64) -> CellValue {
    if f.is_finite() && f.fract() == 0.0 && f.abs() < 9.0e15 {
        CellValue::from(f as i64)
    } else {
        serde_json::Number::from_f64(f)
            .map(CellValue::Number)
            .unwrap_or(CellValue::Null)
    }
}

/// Excel 序列日期（1900 日期系统）→ ISO-8601
fn excel_serial_to_iso(serial: f64) -> Option<String> {
    let base: NaiveDateTime = NaiveDate::from_ymd_opt(1899, 12, 30)?.and_hms_opt(0, 0, 0)?;
    let millis = (serial * 86_400_000.0).round() as i64;
    let datetime = base.checked_add_signed(Duration::milliseconds(millis))?;

    if datetime.num_seconds_from_midnight() == 0 && datetime.nanosecond() == 0 {
        Some(datetime.format("%Y-%m-%d").to_string())
    } else {
        Some(datetime.format("%Y-%m-%d %H:%M:%S").to_string())
    }
}

/// 表头文本：字符串去首尾空白，其他类型字符串化
fn header_text(value: &CellValue) -> String {
    match value {
        CellValue::Null => String::new(),
        CellValue::String(s) => s.trim().to_string(),
        other => other.to_string(),
    }
}

// ==========================================
// Excel Reader 实现
// ==========================================
pub struct XlsxSheetReader;

impl SheetReader for XlsxSheetReader {
    fn open(&self, source: &SourceFile) -> ImportResult<SheetHandle> {
        // 活动工作表 + 锚定图片
        let active = read_active_sheet(source.bytes())?;

        // 单元格
        let mut workbook: Xlsx<_> = Xlsx::new(Cursor::new(source.bytes()))?;
        let range = workbook.worksheet_range(&active.name)?;

        let Some((end_row, end_col)) = range.end() else {
            debug!(sheet = %active.name, "工作表为空");
            return Ok(SheetHandle::new(active.name, Vec::new(), Vec::new(), active.images));
        };

        // 按绝对坐标取值，保证列号与图片锚点列一致
        let read_row = |row: u32| -> Vec<CellValue> {
            (0..=end_col)
                .map(|col| range.get_value((row, col)).map(cell_to_value).unwrap_or(CellValue::Null))
                .collect()
        };

        let headers: Vec<String> = read_row(0).iter().map(header_text).collect();
        // 仅含图片的尾部行不在单元格区域内，按最大锚点行补齐
        let last_row = active
            .images
            .iter()
            .filter_map(|img| u32::try_from(img.anchor_row).ok())
            .fold(end_row, u32::max);
        let rows: Vec<Vec<CellValue>> = (1..=last_row).map(read_row).collect();

        debug!(
            sheet = %active.name,
            columns = headers.len(),
            rows = rows.len(),
            images = active.images.len(),
            "Excel 工作表读取完成"
        );

        Ok(SheetHandle::new(active.name, headers, rows, active.images))
    }
}

// ==========================================
// CSV Reader 实现
// ==========================================
pub struct CsvSheetReader;

impl SheetReader for CsvSheetReader {
    fn open(&self, source: &SourceFile) -> ImportResult<SheetHandle> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true) // 允许行长度不一致
            .from_reader(source.bytes());

        // 读取表头
        let headers: Vec<String> = reader
            .headers()?
            .iter()
            .map(|h| h.trim().trim_start_matches('\u{feff}').to_string())
            .collect();

        // 读取所有行（空串视为 null）
        let mut rows = Vec::new();
        for result in reader.records() {
            let record = result?;
            rows.push(
                record
                    .iter()
                    .map(|value| {
                        if value.is_empty() {
                            CellValue::Null
                        } else {
                            CellValue::String(value.to_string())
                        }
                    })
                    .collect(),
            );
        }

        debug!(columns = headers.len(), rows = rows.len(), "CSV 读取完成");
        Ok(SheetHandle::new(source.name(), headers, rows, Vec::new()))
    }
}

// ==========================================
// 通用表格读取器（根据扩展名自动选择）
// ==========================================
pub struct UniversalSheetReader;

impl SheetReader for UniversalSheetReader {
    fn open(&self, source: &SourceFile) -> ImportResult<SheetHandle> {
        let ext = source.extension();

        match ext.as_str() {
            "csv" => CsvSheetReader.open(source),
            "xlsx" | "xlsm" => XlsxSheetReader.open(source),
            _ => Err(ImportError::UnsupportedFormat(ext)),
        }
    }
}
