// ==========================================
// 售后合单窗口发货判定 - 文件解析器实现
// ==========================================
// 职责: 阶段 0 文件读取与解析
// 支持: Excel (.xlsx/.xls) / CSV (.csv) / JSON (.json, 对象数组)
// ==========================================

use crate::importer::error::ImportError;
use crate::importer::importer_trait::FileParser;
use calamine::{open_workbook_auto, Data, Reader};
use chrono::{Duration, NaiveDate};
use csv::ReaderBuilder;
use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

fn ensure_exists(path: &Path) -> Result<(), ImportError> {
    if !path.exists() {
        return Err(ImportError::FileNotFound(path.display().to_string()));
    }
    Ok(())
}

fn is_blank_row(row: &HashMap<String, String>) -> bool {
    row.values().all(|v| v.is_empty())
}

// ==========================================
// CSV Parser 实现
// ==========================================
pub struct CsvParser;

impl FileParser for CsvParser {
    fn parse_to_raw_records(
        &self,
        file_path: &Path,
    ) -> Result<Vec<HashMap<String, String>>, Box<dyn std::error::Error>> {
        ensure_exists(file_path)?;

        let file = File::open(file_path).map_err(ImportError::from)?;
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true) // 允许行长度不一致
            .from_reader(file);

        let headers: Vec<String> = reader
            .headers()
            .map_err(ImportError::from)?
            .iter()
            .map(|h| h.trim().trim_start_matches('\u{feff}').to_string())
            .collect();

        let mut records = Vec::new();
        for result in reader.records() {
            let record = result.map_err(ImportError::from)?;
            let mut row_map = HashMap::new();

            for (col_idx, value) in record.iter().enumerate() {
                if let Some(header) = headers.get(col_idx) {
                    row_map.insert(header.clone(), value.trim().to_string());
                }
            }

            if is_blank_row(&row_map) {
                continue;
            }
            records.push(row_map);
        }

        Ok(records)
    }
}

// ==========================================
// Excel Parser 实现
// ==========================================
// 只读取第一个工作表,第一行为表头
pub struct ExcelParser;

impl ExcelParser {
    /// Excel 序列日期 → "YYYY-MM-DD HH:MM:SS"（1900 日期系统）
    fn excel_serial_to_string(serial: f64) -> Option<String> {
        let base = NaiveDate::from_ymd_opt(1899, 12, 30)?.and_hms_opt(0, 0, 0)?;
        let days = serial.trunc() as i64;
        let seconds = ((serial - serial.trunc()) * 86_400.0).round() as i64;
        let ts = base + Duration::days(days) + Duration::seconds(seconds);
        Some(ts.format("%Y-%m-%d %H:%M:%S").to_string())
    }

    fn cell_to_string(cell: &Data) -> String {
        match cell {
            Data::DateTime(dt) => Self::excel_serial_to_string(dt.as_f64())
                .unwrap_or_else(|| dt.as_f64().to_string()),
            Data::Empty => String::new(),
            other => other.to_string().trim().to_string(),
        }
    }
}

impl FileParser for ExcelParser {
    fn parse_to_raw_records(
        &self,
        file_path: &Path,
    ) -> Result<Vec<HashMap<String, String>>, Box<dyn std::error::Error>> {
        ensure_exists(file_path)?;

        let mut workbook = open_workbook_auto(file_path).map_err(ImportError::from)?;

        let sheet_names = workbook.sheet_names();
        let sheet_name = sheet_names
            .first()
            .cloned()
            .ok_or_else(|| ImportError::ExcelParseError("Excel 文件无工作表".to_string()))?;

        let range = workbook
            .worksheet_range(&sheet_name)
            .map_err(ImportError::from)?;

        let mut rows = range.rows();
        let header_row = rows
            .next()
            .ok_or_else(|| ImportError::ExcelParseError("Excel 文件无数据行".to_string()))?;

        let headers: Vec<String> = header_row.iter().map(Self::cell_to_string).collect();

        let mut records = Vec::new();
        for data_row in rows {
            let mut row_map = HashMap::new();
            for (col_idx, cell) in data_row.iter().enumerate() {
                if let Some(header) = headers.get(col_idx) {
                    row_map.insert(header.clone(), Self::cell_to_string(cell));
                }
            }

            if is_blank_row(&row_map) {
                continue;
            }
            records.push(row_map);
        }

        Ok(records)
    }
}

// ==========================================
// JSON Parser 实现
// ==========================================
// 输入: 对象数组（源表导出格式）
// 标量转字符串; null / 空串跳过; 数组与对象保留为 JSON 文本
pub struct JsonParser;

impl JsonParser {
    fn value_to_string(value: &serde_json::Value) -> Option<String> {
        match value {
            serde_json::Value::Null => None,
            serde_json::Value::String(s) => {
                let trimmed = s.trim();
                (!trimmed.is_empty()).then(|| trimmed.to_string())
            }
            serde_json::Value::Number(n) => Some(n.to_string()),
            serde_json::Value::Bool(b) => Some(b.to_string()),
            other => Some(other.to_string()),
        }
    }
}

impl FileParser for JsonParser {
    fn parse_to_raw_records(
        &self,
        file_path: &Path,
    ) -> Result<Vec<HashMap<String, String>>, Box<dyn std::error::Error>> {
        ensure_exists(file_path)?;

        let file = File::open(file_path).map_err(ImportError::from)?;
        let value: serde_json::Value =
            serde_json::from_reader(BufReader::new(file)).map_err(ImportError::from)?;

        let items = value
            .as_array()
            .ok_or_else(|| ImportError::JsonParseError("顶层必须是对象数组".to_string()))?;

        let mut records = Vec::new();
        for (idx, item) in items.iter().enumerate() {
            let object = item.as_object().ok_or_else(|| {
                ImportError::JsonParseError(format!("第 {} 个元素不是对象", idx + 1))
            })?;

            let row_map: HashMap<String, String> = object
                .iter()
                .filter_map(|(k, v)| Self::value_to_string(v).map(|s| (k.trim().to_string(), s)))
                .collect();

            if row_map.is_empty() {
                continue;
            }
            records.push(row_map);
        }

        Ok(records)
    }
}

// ==========================================
// 通用文件解析器（根据扩展名自动选择）
// ==========================================
pub struct UniversalFileParser;

impl FileParser for UniversalFileParser {
    fn parse_to_raw_records(
        &self,
        file_path: &Path,
    ) -> Result<Vec<HashMap<String, String>>, Box<dyn std::error::Error>> {
        let ext = file_path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();

        match ext.as_str() {
            "csv" => CsvParser.parse_to_raw_records(file_path),
            "xlsx" | "xls" => ExcelParser.parse_to_raw_records(file_path),
            "json" => JsonParser.parse_to_raw_records(file_path),
            _ => Err(Box::new(ImportError::UnsupportedFormat(ext))),
        }
    }
}
