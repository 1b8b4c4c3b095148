// ==========================================
// 售后合单窗口发货判定 - 导入结果与数据质量模型
// ==========================================
// 用途: 导入管道的 DQ 报告与批次结果
// ==========================================

use serde::{Deserialize, Serialize};

// ==========================================
// DqLevel - 数据质量等级
// ==========================================
// ERROR/CONFLICT 拒绝入库,WARNING/INFO 仅记录
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DqLevel {
    Error,
    Conflict,
    Warning,
    Info,
}

impl DqLevel {
    pub fn rejects_row(&self) -> bool {
        matches!(self, DqLevel::Error | DqLevel::Conflict)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DqViolation {
    pub row_number: usize,
    pub order_id: Option<String>,
    pub level: DqLevel,
    pub field: String,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DqSummary {
    pub total_rows: usize,
    pub success: usize,
    pub errors: usize,
    pub conflicts: usize,
    pub warnings: usize,
    pub infos: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DqReport {
    pub batch_id: String,
    pub summary: DqSummary,
    pub violations: Vec<DqViolation>,
}

// ==========================================
// ImportResult - 导入批次结果
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportResult {
    pub batch_id: String,
    pub total_rows: usize,
    pub imported_rows: usize,
    pub rejected_rows: usize,
    pub dq_report: DqReport,
    pub elapsed_ms: u64,
}
