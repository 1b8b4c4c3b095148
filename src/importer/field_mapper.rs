// ==========================================
// 售后合单窗口发货判定 - 字段映射器实现
// ==========================================
// 职责: 源字段（别名）→ 标准字段映射 + 时间换算
// 红线: 字段别名只在此处解析,引擎只认规范化 Order
// ==========================================

use crate::domain::order::RawOrderRecord;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::importer_trait::FieldMapper;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};
use std::collections::HashMap;

// ===== 列名别名 =====
const ORDER_ID_ALIASES: &[&str] = &["id", "order_id", "pedido_id"];
const CREATED_AT_ALIASES: &[&str] = &[
    "created_at",
    "data_venda",
    "createdAt",
    "order_date",
    "data_pedido",
];
const TRACKING_ALIASES: &[&str] = &["codigo_rastreio", "tracking_code", "trackingCode", "rastreio"];
const SHIPPED_AT_ALIASES: &[&str] = &["data_envio", "shipped_at", "shippedAt"];
const STATUS_ALIASES: &[&str] = &["status_envio", "shipping_status", "status"];
const DESCRIPTION_ALIASES: &[&str] = &["descricao_pacote", "package_description", "descricao"];
const GROUPED_CODES_ALIASES: &[&str] = &["codigos_agrupados", "grouped_codes"];

// 带时区偏移的格式（Postgres 导出常见 "+00"）
const OFFSET_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f%#z", "%Y-%m-%dT%H:%M:%S%.f%#z"];

// 无时区的本地时间格式
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
];

// 仅日期（视为本地 00:00）
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y%m%d", "%d/%m/%Y"];

pub struct OrderFieldMapper {
    local_offset: FixedOffset,
}

impl OrderFieldMapper {
    /// # 参数
    /// - local_offset: 本地时区（星期几按本地墙钟判定）
    pub fn new(local_offset: FixedOffset) -> Self {
        Self { local_offset }
    }

    /// 按别名顺序取第一个非空值
    fn get_string(&self, row: &HashMap<String, String>, aliases: &[&str]) -> Option<String> {
        aliases.iter().find_map(|alias| {
            row.get(*alias)
                .map(|v| v.trim())
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        })
    }

    /// 解析时间戳为本地墙钟时间
    ///
    /// - 带偏移: 换算到本地时区
    /// - 无偏移: 视为本地时间
    /// - 仅日期: 本地 00:00
    pub fn parse_timestamp(&self, value: &str) -> Option<NaiveDateTime> {
        let value = value.trim();

        if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
            return Some(dt.with_timezone(&self.local_offset).naive_local());
        }
        for fmt in OFFSET_FORMATS {
            if let Ok(dt) = DateTime::parse_from_str(value, fmt) {
                return Some(dt.with_timezone(&self.local_offset).naive_local());
            }
        }
        for fmt in NAIVE_FORMATS {
            if let Ok(dt) = NaiveDateTime::parse_from_str(value, fmt) {
                return Some(dt);
            }
        }
        for fmt in DATE_FORMATS {
            if let Ok(date) = NaiveDate::parse_from_str(value, fmt) {
                return Some(date.and_time(NaiveTime::MIN));
            }
        }
        None
    }

    fn parse_datetime(
        &self,
        row: &HashMap<String, String>,
        aliases: &[&str],
        field: &str,
        row_number: usize,
    ) -> ImportResult<Option<NaiveDateTime>> {
        match self.get_string(row, aliases) {
            None => Ok(None),
            Some(value) => self
                .parse_timestamp(&value)
                .map(Some)
                .ok_or(ImportError::DateFormatError {
                    row: row_number,
                    field: field.to_string(),
                    value,
                }),
        }
    }

    /// 合单号: JSON 数组 / Postgres 数组字面量 / 逗号分隔
    fn parse_grouped_codes(&self, row: &HashMap<String, String>) -> Vec<String> {
        let Some(raw) = self.get_string(row, GROUPED_CODES_ALIASES) else {
            return Vec::new();
        };

        if let Ok(serde_json::Value::Array(items)) = serde_json::from_str::<serde_json::Value>(&raw) {
            return items
                .iter()
                .filter_map(|item| match item {
                    serde_json::Value::String(s) => Some(s.trim().to_string()),
                    serde_json::Value::Null => None,
                    other => Some(other.to_string()),
                })
                .filter(|s| !s.is_empty())
                .collect();
        }

        raw.trim_matches(|c| c == '{' || c == '}')
            .split(',')
            .map(|s| s.trim().trim_matches('"').to_string())
            .filter(|s| !s.is_empty())
            .collect()
    }
}

impl FieldMapper for OrderFieldMapper {
    fn extract_order_id(&self, row: &HashMap<String, String>) -> Option<String> {
        self.get_string(row, ORDER_ID_ALIASES)
    }

    fn map_to_raw_order(
        &self,
        row: &HashMap<String, String>,
        row_number: usize,
    ) -> ImportResult<RawOrderRecord> {
        Ok(RawOrderRecord {
            // 主键
            order_id: self.extract_order_id(row),

            // 时间信息
            created_at: self.parse_datetime(row, CREATED_AT_ALIASES, "created_at", row_number)?,
            shipped_at: self.parse_datetime(row, SHIPPED_AT_ALIASES, "shipped_at", row_number)?,

            // 发货标记
            tracking_code: self.get_string(row, TRACKING_ALIASES),
            shipping_status: self.get_string(row, STATUS_ALIASES),

            // 包裹信息
            package_description: self.get_string(row, DESCRIPTION_ALIASES),
            grouped_codes: self.parse_grouped_codes(row),

            // 元信息
            row_number,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mapper() -> OrderFieldMapper {
        OrderFieldMapper::new(FixedOffset::west_opt(3 * 3600).unwrap())
    }

    fn row(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn ts(d: u32, h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 1, d)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    #[test]
    fn test_aliases_resolve_in_order() {
        let record = mapper()
            .map_to_raw_order(
                &row(&[
                    ("pedido_id", "P9"),
                    ("data_venda", "2026-01-29 10:00:00"),
                    ("rastreio", " BR1 "),
                    ("status_envio", "Enviado"),
                    ("descricao", "Kit"),
                ]),
                3,
            )
            .unwrap();

        assert_eq!(record.order_id.as_deref(), Some("P9"));
        assert_eq!(record.created_at, Some(ts(29, 10, 0)));
        assert_eq!(record.tracking_code.as_deref(), Some("BR1"));
        assert_eq!(record.shipping_status.as_deref(), Some("Enviado"));
        assert_eq!(record.package_description.as_deref(), Some("Kit"));
        assert_eq!(record.row_number, 3);
    }

    #[test]
    fn test_first_non_empty_alias_wins() {
        let record = mapper()
            .map_to_raw_order(&row(&[("id", ""), ("order_id", "P2")]), 1)
            .unwrap();
        assert_eq!(record.order_id.as_deref(), Some("P2"));
    }

    #[test]
    fn test_offset_timestamps_convert_to_local() {
        let m = mapper();
        // UTC 01:30 周五 = 本地 22:30 周四
        assert_eq!(m.parse_timestamp("2026-01-30T01:30:00Z"), Some(ts(29, 22, 30)));
        assert_eq!(m.parse_timestamp("2026-01-30 01:30:00+00"), Some(ts(29, 22, 30)));
        assert_eq!(
            m.parse_timestamp("2026-01-30 01:30:00.123+00:00").map(|t| t.date()),
            Some(ts(29, 0, 0).date())
        );
    }

    #[test]
    fn test_naive_and_date_only_values_are_local() {
        let m = mapper();
        assert_eq!(m.parse_timestamp("2026-01-29T15:30:00"), Some(ts(29, 15, 30)));
        assert_eq!(m.parse_timestamp("2026-01-29"), Some(ts(29, 0, 0)));
        assert_eq!(m.parse_timestamp("20260129"), Some(ts(29, 0, 0)));
        assert_eq!(m.parse_timestamp("29/01/2026"), Some(ts(29, 0, 0)));
        assert_eq!(m.parse_timestamp("29/01/2026 08:15"), Some(ts(29, 8, 15)));
        assert_eq!(m.parse_timestamp("ontem"), None);
    }

    #[test]
    fn test_unparseable_created_at_is_mapping_error() {
        let err = mapper()
            .map_to_raw_order(&row(&[("id", "P1"), ("created_at", "not-a-date")]), 7)
            .unwrap_err();
        assert_eq!(err.field(), "created_at");
        assert!(matches!(err, ImportError::DateFormatError { row: 7, .. }));
    }

    #[test]
    fn test_grouped_codes_formats() {
        let m = mapper();
        let json = m
            .map_to_raw_order(&row(&[("codigos_agrupados", r#"["A1", 22, ""]"#)]), 1)
            .unwrap();
        assert_eq!(json.grouped_codes, vec!["A1".to_string(), "22".to_string()]);

        let csv = m
            .map_to_raw_order(&row(&[("grouped_codes", "A1, A2,,")]), 1)
            .unwrap();
        assert_eq!(csv.grouped_codes, vec!["A1".to_string(), "A2".to_string()]);

        let pg = m
            .map_to_raw_order(&row(&[("codigos_agrupados", "{A1,A2}")]), 1)
            .unwrap();
        assert_eq!(pg.grouped_codes, vec!["A1".to_string(), "A2".to_string()]);
    }
}
