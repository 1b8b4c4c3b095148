// ==========================================
// 售后合单窗口发货判定 - 订单导入器
// ==========================================
// 职责: 编排导入管道（解析 → 映射 → DQ → 落库）
// 红线: ERROR / CONFLICT 行不得入库
// ==========================================

use crate::config::WindowConfigReader;
use crate::domain::import::{DqLevel, DqReport, DqViolation, ImportResult};
use crate::domain::order::{Order, RawOrderRecord};
use crate::importer::dq_validator::OrderDqValidator;
use crate::importer::error::ImportError;
use crate::importer::field_mapper::OrderFieldMapper;
use crate::importer::file_parser::UniversalFileParser;
use crate::importer::importer_trait::{DqValidator, FieldMapper, FileParser};
use crate::repository::OrderRepository;
use chrono::Utc;
use std::collections::{HashMap, HashSet};
use std::error::Error;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

// ==========================================
// NormalizedBatch - 规范化结果（未落库）
// ==========================================
#[derive(Debug, Clone)]
pub struct NormalizedBatch {
    pub orders: Vec<Order>,
    pub dq_report: DqReport,
}

// ==========================================
// OrderImporter - 订单导入器
// ==========================================
pub struct OrderImporter<C>
where
    C: WindowConfigReader,
{
    config: Arc<C>,
    order_repo: Arc<OrderRepository>,
    file_parser: Box<dyn FileParser>,
}

impl<C> OrderImporter<C>
where
    C: WindowConfigReader,
{
    /// 创建导入器（按扩展名自动选择解析器）
    pub fn new(config: Arc<C>, order_repo: Arc<OrderRepository>) -> Self {
        Self {
            config,
            order_repo,
            file_parser: Box::new(UniversalFileParser),
        }
    }

    /// 从文件导入订单
    ///
    /// # 返回
    /// - Ok(ImportResult): 批次结果（含 DQ 报告）
    /// - Err: 文件读取错误、数据库错误
    #[instrument(skip(self, file_path), fields(file_path = %file_path.display()))]
    pub async fn import_file(&self, file_path: &Path) -> Result<ImportResult, Box<dyn Error>> {
        let start_time = Instant::now();

        // === 步骤 1: 解析文件 ===
        let raw_rows = self.file_parser.parse_to_raw_records(file_path)?;
        info!(total_rows = raw_rows.len(), "文件解析完成");

        // === 步骤 2-3: 字段映射 + DQ 校验 ===
        let batch = self.normalize_rows(raw_rows).await?;

        // === 步骤 4: 落库 ===
        let imported_rows = self
            .order_repo
            .upsert_batch(&batch.orders)
            .map_err(ImportError::from)?;

        let elapsed = start_time.elapsed();
        let summary = &batch.dq_report.summary;
        info!(
            batch_id = %batch.dq_report.batch_id,
            total = summary.total_rows,
            imported = imported_rows,
            errors = summary.errors,
            conflicts = summary.conflicts,
            elapsed_ms = elapsed.as_millis() as u64,
            "订单导入完成"
        );

        Ok(ImportResult {
            batch_id: batch.dq_report.batch_id.clone(),
            total_rows: summary.total_rows,
            imported_rows,
            rejected_rows: summary.total_rows - batch.orders.len(),
            elapsed_ms: elapsed.as_millis() as u64,
            dq_report: batch.dq_report,
        })
    }

    /// 规范化原始行（不落库）
    ///
    /// 时区与导入时刻取自配置
    pub async fn normalize_rows(
        &self,
        rows: Vec<HashMap<String, String>>,
    ) -> Result<NormalizedBatch, Box<dyn Error>> {
        let offset = self.config.get_local_offset().await?;
        let now_local = Utc::now().with_timezone(&offset).naive_local();

        let mapper = OrderFieldMapper::new(offset);
        let validator = OrderDqValidator::new(now_local);
        Ok(Self::normalize_with(rows, &mapper, &validator))
    }

    /// 规范化管道（纯同步,便于替换映射器/校验器）
    pub fn normalize_with(
        rows: Vec<HashMap<String, String>>,
        mapper: &dyn FieldMapper,
        validator: &dyn DqValidator,
    ) -> NormalizedBatch {
        let batch_id = Uuid::new_v4().to_string();
        let total_rows = rows.len();

        // === 字段映射 ===
        let mut records = Vec::with_capacity(total_rows);
        let mut violations: Vec<DqViolation> = Vec::new();
        for (idx, row) in rows.iter().enumerate() {
            let row_number = idx + 1;
            match mapper.map_to_raw_order(row, row_number) {
                Ok(record) => records.push(record),
                Err(e) => {
                    warn!(row_number, error = %e, "字段映射失败");
                    violations.push(DqViolation {
                        row_number,
                        order_id: mapper.extract_order_id(row),
                        level: DqLevel::Error,
                        field: e.field().to_string(),
                        message: e.to_string(),
                    });
                }
            }
        }
        debug!(mapped = records.len(), failed = violations.len(), "字段映射完成");

        // === DQ 校验: 单行 ===
        for record in &records {
            violations.extend(validator.validate_required_fields(record));
            violations.extend(validator.validate_timeline(record));
        }

        // === DQ 校验: 主键 ===
        // 单行已被拒的记录不参与去重,同号的有效行才能被保留
        let row_rejected = Self::rejected_rows(&violations);
        let candidates: Vec<RawOrderRecord> = records
            .into_iter()
            .filter(|r| !row_rejected.contains(&r.row_number))
            .collect();
        violations.extend(validator.validate_primary_key(&candidates));
        violations.sort_by_key(|v| v.row_number);

        let rejected = Self::rejected_rows(&violations);
        let orders: Vec<Order> = candidates
            .into_iter()
            .filter(|r| !rejected.contains(&r.row_number))
            .filter_map(|r| r.into_order())
            .collect();

        let mut dq_report = validator.generate_dq_report(batch_id, violations);
        dq_report.summary.total_rows = total_rows;
        dq_report.summary.success = orders.len();

        NormalizedBatch { orders, dq_report }
    }

    fn rejected_rows(violations: &[DqViolation]) -> HashSet<usize> {
        violations
            .iter()
            .filter(|v| v.level.rejects_row())
            .map(|v| v.row_number)
            .collect()
    }
}
