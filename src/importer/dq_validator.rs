// ==========================================
// 售后合单窗口发货判定 - 数据质量校验器实现
// ==========================================
// 职责: DQ 校验 + DQ 报告生成
// 红线: created_at 缺失的订单不得进入判定引擎
// ==========================================

use crate::domain::import::{DqLevel, DqReport, DqSummary, DqViolation};
use crate::domain::order::RawOrderRecord;
use crate::domain::types::ShippingStatus;
use crate::importer::importer_trait::DqValidator;
use chrono::{Duration, NaiveDateTime};
use std::collections::HashSet;

pub struct OrderDqValidator {
    now: NaiveDateTime, // 导入时刻（本地）
}

impl OrderDqValidator {
    pub fn new(now: NaiveDateTime) -> Self {
        Self { now }
    }

    fn violation(record: &RawOrderRecord, level: DqLevel, field: &str, message: String) -> DqViolation {
        DqViolation {
            row_number: record.row_number,
            order_id: record.order_id.clone(),
            level,
            field: field.to_string(),
            message,
        }
    }
}

impl DqValidator for OrderDqValidator {
    fn validate_primary_key(&self, records: &[RawOrderRecord]) -> Vec<DqViolation> {
        let mut violations = Vec::new();
        let mut seen_ids = HashSet::new();

        for record in records {
            let Some(id) = record.order_id.as_ref() else {
                violations.push(Self::violation(
                    record,
                    DqLevel::Error,
                    "order_id",
                    "主键缺失".to_string(),
                ));
                continue;
            };

            // 同批次重复: 保留首条
            if !seen_ids.insert(id.clone()) {
                violations.push(Self::violation(
                    record,
                    DqLevel::Conflict,
                    "order_id",
                    "重复订单号（同批次内）".to_string(),
                ));
            }
        }

        violations
    }

    fn validate_required_fields(&self, record: &RawOrderRecord) -> Vec<DqViolation> {
        let mut violations = Vec::new();

        if record.created_at.is_none() {
            violations.push(Self::violation(
                record,
                DqLevel::Error,
                "created_at",
                "下单时间缺失，无法计算安全发货日".to_string(),
            ));
        }

        violations
    }

    fn validate_timeline(&self, record: &RawOrderRecord) -> Vec<DqViolation> {
        let mut violations = Vec::new();

        if let Some(created_at) = record.created_at {
            if created_at > self.now + Duration::days(1) {
                violations.push(Self::violation(
                    record,
                    DqLevel::Warning,
                    "created_at",
                    format!("下单时间在未来: {}", created_at),
                ));
            }

            if let Some(shipped_at) = record.shipped_at {
                if shipped_at < created_at {
                    violations.push(Self::violation(
                        record,
                        DqLevel::Warning,
                        "shipped_at",
                        format!("发货时间 {} 早于下单时间 {}", shipped_at, created_at),
                    ));
                }
            }
        }

        let status_shipped = record
            .shipping_status
            .as_deref()
            .map(ShippingStatus::from_source)
            == Some(ShippingStatus::Shipped);
        if status_shipped && record.tracking_code.is_none() {
            violations.push(Self::violation(
                record,
                DqLevel::Info,
                "tracking_code",
                "状态为已发货但无物流单号".to_string(),
            ));
        }

        violations
    }

    fn generate_dq_report(&self, batch_id: String, violations: Vec<DqViolation>) -> DqReport {
        let count = |level: DqLevel| violations.iter().filter(|v| v.level == level).count();

        let summary = DqSummary {
            total_rows: 0, // 外部填充
            success: 0,    // 外部填充
            errors: count(DqLevel::Error),
            conflicts: count(DqLevel::Conflict),
            warnings: count(DqLevel::Warning),
            infos: count(DqLevel::Info),
        };

        DqReport {
            batch_id,
            summary,
            violations,
        }
    }
}
