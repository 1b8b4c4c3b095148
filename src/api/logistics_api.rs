// ==========================================
// 售后合单窗口发货判定 - 物流 API
// ==========================================
// 职责: 订单分桶查询、分页搜索、物流单号维护、订单导入
// 架构: API 层 → Engine / Repository / Importer
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::config::WindowConfigReader;
use crate::domain::filter::{DateRange, OrderFilters, Pagination, PAGE_SIZE_OPTIONS};
use crate::domain::import::ImportResult;
use crate::domain::order::{BucketSummary, CategorizedOrders, ClassifiedOrder, Order};
use crate::domain::types::ShipBucket;
use crate::engine::{ShipmentWindowCore, ShipmentWindowEngine};
use crate::importer::{ImportError, OrderImporter};
use crate::repository::OrderRepository;
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use tracing::instrument;

// ==========================================
// OrderPageResponse - 分页列表响应
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderPageResponse {
    pub reference_date: NaiveDate,
    pub ready_count: usize,   // 搜索过滤后的 READY 数
    pub waiting_count: usize, // 搜索过滤后的 WAITING 数
    pub active_tab: ShipBucket,
    pub items: Vec<ClassifiedOrder>,
    pub pagination: Pagination,
}

// ==========================================
// LogisticsApi - 物流 API
// ==========================================
pub struct LogisticsApi<C>
where
    C: WindowConfigReader,
{
    config: Arc<C>,
    order_repo: Arc<OrderRepository>,
    engine: ShipmentWindowEngine<C>,
    importer: OrderImporter<C>,
}

impl<C> LogisticsApi<C>
where
    C: WindowConfigReader,
{
    /// 创建新的LogisticsApi实例
    ///
    /// # 参数
    /// - config: 配置读取器
    /// - order_repo: 订单仓储
    pub fn new(config: Arc<C>, order_repo: Arc<OrderRepository>) -> Self {
        Self {
            engine: ShipmentWindowEngine::new(config.clone()),
            importer: OrderImporter::new(config.clone(), order_repo.clone()),
            config,
            order_repo,
        }
    }

    // ==========================================
    // 分桶查询
    // ==========================================

    /// 拉取订单并分桶
    ///
    /// # 参数
    /// - reference_date: 参考日（YYYY-MM-DD 或 ISO-8601,无法解析直接报错）
    /// - range: 下单时间区间（None 表示不过滤）
    #[instrument(skip(self))]
    pub async fn get_categorized_orders(
        &self,
        reference_date: &str,
        range: Option<DateRange>,
    ) -> ApiResult<CategorizedOrders> {
        let reference = ShipmentWindowCore::parse_reference_date(reference_date)?;
        let orders = self.fetch_orders(range.as_ref()).await?;
        self.partition(orders, reference).await
    }

    /// 分桶计数
    pub async fn get_bucket_summary(
        &self,
        reference_date: &str,
        range: Option<DateRange>,
    ) -> ApiResult<BucketSummary> {
        Ok(self
            .get_categorized_orders(reference_date, range)
            .await?
            .summary())
    }

    /// 按配置默认分页大小构造查询参数
    pub async fn default_filters(
        &self,
        reference_date: &str,
        active_tab: ShipBucket,
    ) -> ApiResult<OrderFilters> {
        let mut filters = OrderFilters::new(reference_date, active_tab);
        filters.page_size = self
            .config
            .get_default_page_size()
            .await
            .map_err(|e| ApiError::InternalError(format!("读取分页配置失败: {}", e)))?;
        Ok(filters)
    }

    /// 分页列表（搜索 + tab + 分页）
    ///
    /// # 说明
    /// - 搜索先于分桶执行,两个 tab 的计数都基于搜索结果
    /// - 页码超界时钳制到最后一页
    #[instrument(skip(self, filters), fields(tab = %filters.active_tab, page = filters.page))]
    pub async fn list_orders_page(&self, filters: &OrderFilters) -> ApiResult<OrderPageResponse> {
        if !PAGE_SIZE_OPTIONS.contains(&filters.page_size) {
            return Err(ApiError::InvalidInput(format!(
                "page_size 必须是 {:?} 之一，实际 {}",
                PAGE_SIZE_OPTIONS, filters.page_size
            )));
        }
        if filters.page == 0 {
            return Err(ApiError::InvalidInput("page 从 1 开始".to_string()));
        }

        let reference = ShipmentWindowCore::parse_reference_date(&filters.reference_date)?;
        let term = filters.search_term.trim().to_lowercase();
        let orders: Vec<Order> = self
            .fetch_orders(filters.date_range.as_ref())
            .await?
            .into_iter()
            .filter(|o| term.is_empty() || Self::matches_search(o, &term))
            .collect();

        let categorized = self.partition(orders, reference).await?;
        let bucket = categorized.bucket(filters.active_tab);
        let pagination = Pagination::compute(filters.page, filters.page_size, bucket.len());
        let items = bucket[pagination.slice_range()].to_vec();

        Ok(OrderPageResponse {
            reference_date: reference,
            ready_count: categorized.ready.len(),
            waiting_count: categorized.waiting.len(),
            active_tab: filters.active_tab,
            items,
            pagination,
        })
    }

    // ==========================================
    // 物流单号维护
    // ==========================================

    /// 录入物流单号（订单随即变为已发货）
    #[instrument(skip(self))]
    pub async fn update_tracking(&self, order_id: &str, tracking_code: &str) -> ApiResult<()> {
        let order_id = Self::require_order_id(order_id)?;
        let offset = self
            .config
            .get_local_offset()
            .await
            .map_err(|e| ApiError::InternalError(format!("读取时区配置失败: {}", e)))?;
        let shipped_at = Utc::now().with_timezone(&offset).naive_local();

        self.order_repo
            .update_tracking(order_id, tracking_code, shipped_at)?;
        tracing::info!(order_id, "物流单号已录入");
        Ok(())
    }

    /// 清除物流单号（订单回到待发货）
    #[instrument(skip(self))]
    pub async fn clear_tracking(&self, order_id: &str) -> ApiResult<()> {
        let order_id = Self::require_order_id(order_id)?;
        self.order_repo.clear_tracking(order_id)?;
        tracing::info!(order_id, "物流单号已清除");
        Ok(())
    }

    // ==========================================
    // 导入
    // ==========================================

    /// 从文件导入订单（.csv / .xlsx / .xls / .json）
    #[instrument(skip(self))]
    pub async fn import_orders(&self, file_path: &str) -> ApiResult<ImportResult> {
        if file_path.trim().is_empty() {
            return Err(ApiError::InvalidInput("文件路径不能为空".to_string()));
        }

        self.importer
            .import_file(Path::new(file_path))
            .await
            .map_err(|e| match e.downcast::<ImportError>() {
                Ok(import_err) => ApiError::from(*import_err),
                Err(other) => ApiError::ImportError(other.to_string()),
            })
    }

    // ==========================================
    // 内部辅助
    // ==========================================

    async fn fetch_orders(&self, range: Option<&DateRange>) -> ApiResult<Vec<Order>> {
        let limit = self
            .config
            .get_order_fetch_limit()
            .await
            .map_err(|e| ApiError::InternalError(format!("读取拉取上限失败: {}", e)))?;
        Ok(self.order_repo.list_orders(range, limit)?)
    }

    async fn partition(&self, orders: Vec<Order>, reference: NaiveDate) -> ApiResult<CategorizedOrders> {
        self.engine
            .partition(orders, reference)
            .await
            .map_err(|e| ApiError::InternalError(format!("订单分桶失败: {}", e)))
    }

    fn require_order_id(order_id: &str) -> ApiResult<&str> {
        let trimmed = order_id.trim();
        if trimmed.is_empty() {
            return Err(ApiError::InvalidInput("order_id 不能为空".to_string()));
        }
        Ok(trimmed)
    }

    /// 搜索匹配（不区分大小写的子串匹配）
    fn matches_search(order: &Order, term_lower: &str) -> bool {
        let hit = |s: &str| s.to_lowercase().contains(term_lower);

        hit(&order.order_id)
            || order.tracking_code.as_deref().is_some_and(hit)
            || order.package_description.as_deref().is_some_and(hit)
            || order.grouped_codes.iter().any(|c| hit(c.as_str()))
    }
}
