// ==========================================
// 售后合单窗口发货判定 - 发货窗口引擎
// ==========================================
// 红线: 已发货订单恒为 READY
// ==========================================
// 职责: 读取窗口策略 + 调用纯函数完成分桶
// 输入: 规范化订单 + 参考日
// 输出: ClassifiedOrder / CategorizedOrders（不落库）
// ==========================================

use crate::config::WindowConfigReader;
use crate::domain::order::{CategorizedOrders, ClassifiedOrder, Order};
use crate::domain::window_policy::WindowPolicy;
use crate::engine::ShipmentWindowCore;
use chrono::NaiveDate;
use std::error::Error;
use std::sync::Arc;
use tracing::instrument;

// ==========================================
// ShipmentWindowEngine - 发货窗口引擎
// ==========================================
// 红线: 不直接读写订单表,只计算和返回判定结果
pub struct ShipmentWindowEngine<C>
where
    C: WindowConfigReader,
{
    config: Arc<C>,
}

impl<C> ShipmentWindowEngine<C>
where
    C: WindowConfigReader,
{
    /// 创建新的 ShipmentWindowEngine 实例
    ///
    /// # 参数
    /// - config: 配置读取器
    pub fn new(config: Arc<C>) -> Self {
        Self { config }
    }

    /// 读取当前窗口策略
    pub async fn load_policy(&self) -> Result<WindowPolicy, Box<dyn Error>> {
        self.config.get_window_policy().await
    }

    /// 评估单个订单
    ///
    /// # 参数
    /// - order: 规范化订单
    /// - reference_date: 参考日（由调用方给定,引擎不读系统时钟）
    #[instrument(skip(self, order), fields(order_id = %order.order_id))]
    pub async fn evaluate_single(
        &self,
        order: &Order,
        reference_date: NaiveDate,
    ) -> Result<ClassifiedOrder, Box<dyn Error>> {
        let policy = self.load_policy().await?;
        let classified = ShipmentWindowCore::classify(order, reference_date, &policy);

        tracing::debug!(
            bucket = %classified.bucket,
            safe_ship_date = %classified.safe_ship_date,
            dispatched = classified.dispatched,
            "订单判定完成"
        );

        Ok(classified)
    }

    /// 全量分桶
    ///
    /// 策略只在进入判定前读取一次,判定过程中不再挂起
    #[instrument(skip(self, orders), fields(order_count = orders.len()))]
    pub async fn partition(
        &self,
        orders: Vec<Order>,
        reference_date: NaiveDate,
    ) -> Result<CategorizedOrders, Box<dyn Error>> {
        let policy = self.load_policy().await?;
        let categorized = ShipmentWindowCore::partition(orders, reference_date, &policy);

        tracing::info!(
            reference_date = %reference_date,
            ready_count = categorized.ready.len(),
            waiting_count = categorized.waiting.len(),
            "订单分桶完成"
        );

        Ok(categorized)
    }
}
