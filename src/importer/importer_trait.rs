// ==========================================
// 售后合单窗口发货判定 - 订单导入 Trait
// ==========================================
// 职责: 定义导入管道各阶段接口（不包含实现）
// 管道: 文件解析 → 字段映射 → DQ 校验 → 落库
// ==========================================

use crate::domain::import::{DqReport, DqViolation};
use crate::domain::order::RawOrderRecord;
use crate::importer::error::ImportResult;
use std::collections::HashMap;
use std::error::Error;
use std::path::Path;

// ==========================================
// FileParser Trait
// ==========================================
// 用途: 文件解析接口（阶段 0）
// 实现者: CsvParser, ExcelParser, JsonParser, UniversalFileParser
pub trait FileParser: Send + Sync {
    /// 解析文件为原始行记录（HashMap<列名, 值>）
    ///
    /// # 返回
    /// - Ok(Vec<HashMap<String, String>>): 行记录列表（已跳过全空行）
    /// - Err: 文件读取错误、格式错误
    fn parse_to_raw_records(
        &self,
        file_path: &Path,
    ) -> Result<Vec<HashMap<String, String>>, Box<dyn Error>>;
}

// ==========================================
// FieldMapper Trait
// ==========================================
// 用途: 字段映射接口（阶段 1）
// 实现者: OrderFieldMapper
pub trait FieldMapper: Send + Sync {
    /// 仅提取订单号（映射失败时用于 DQ 报告定位）
    fn extract_order_id(&self, row: &HashMap<String, String>) -> Option<String>;

    /// 将原始行记录映射为 RawOrderRecord
    ///
    /// # 参数
    /// - row: 原始行记录
    /// - row_number: 行号（用于 DQ 报告）
    ///
    /// # 返回
    /// - Err: 时间字段无法解析
    fn map_to_raw_order(
        &self,
        row: &HashMap<String, String>,
        row_number: usize,
    ) -> ImportResult<RawOrderRecord>;
}

// ==========================================
// DqValidator Trait
// ==========================================
// 用途: 数据质量校验接口（阶段 2）
// 实现者: OrderDqValidator
pub trait DqValidator: Send + Sync {
    /// 校验主键（order_id 非空且批次内唯一）
    ///
    /// 传入的记录应已通过单行校验,首条即保留条
    fn validate_primary_key(&self, records: &[RawOrderRecord]) -> Vec<DqViolation>;

    /// 校验必填字段（created_at）
    fn validate_required_fields(&self, record: &RawOrderRecord) -> Vec<DqViolation>;

    /// 校验时间线与发货标记一致性
    fn validate_timeline(&self, record: &RawOrderRecord) -> Vec<DqViolation>;

    /// 生成 DQ 报告（total_rows / success 由调用方填充）
    fn generate_dq_report(&self, batch_id: String, violations: Vec<DqViolation>) -> DqReport;
}
