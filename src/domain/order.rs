// ==========================================
// 售后合单窗口发货判定 - 订单领域模型
// ==========================================
// 红线: 判定引擎只读取 created_at 与发货标记,不读任何原始字段
// 用途: 导入层写入规范化订单,引擎层只读
// ==========================================

use crate::domain::types::{ShipBucket, ShippingStatus};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

// ==========================================
// Order - 规范化订单
// ==========================================
// 对齐: shipment_order 表
// created_at 为本地墙钟时间（导入时已按配置时区换算）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    // ===== 主键 =====
    pub order_id: String,

    // ===== 时间信息 =====
    pub created_at: NaiveDateTime, // 下单时间（本地）,创建后不可变

    // ===== 发货标记 =====
    pub tracking_code: Option<String>,    // 物流单号
    pub shipped_at: Option<NaiveDateTime>, // 发货时间（本地）
    pub shipping_status: ShippingStatus,  // 发货状态

    // ===== 包裹信息 =====
    pub package_description: Option<String>, // 包裹描述
    pub grouped_codes: Vec<String>,           // 合单的原始订单号

    // ===== 审计字段 =====
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// 创建仅含必填字段的待发货订单
    pub fn new(order_id: impl Into<String>, created_at: NaiveDateTime) -> Self {
        Self {
            order_id: order_id.into(),
            created_at,
            tracking_code: None,
            shipped_at: None,
            shipping_status: ShippingStatus::Pending,
            package_description: None,
            grouped_codes: Vec::new(),
            updated_at: Utc::now(),
        }
    }

    /// 非空白的物流单号
    pub fn tracking_code_trimmed(&self) -> Option<&str> {
        self.tracking_code
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

// ==========================================
// RawOrderRecord - 导入中间结构体
// ==========================================
// 用途: 导入管道中间产物（文件解析 → 字段映射 → 此结构）
// 生命周期: 仅在导入流程内
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawOrderRecord {
    pub order_id: Option<String>,
    pub created_at: Option<NaiveDateTime>,
    pub tracking_code: Option<String>,
    pub shipped_at: Option<NaiveDateTime>,
    pub shipping_status: Option<String>,
    pub package_description: Option<String>,
    pub grouped_codes: Vec<String>,

    // 元信息
    pub row_number: usize, // 原始文件行号（用于 DQ 报告）
}

impl RawOrderRecord {
    /// 转换为规范化订单
    ///
    /// 主键或下单时间缺失时返回 None（这类记录在 DQ 阶段已被拒绝）
    pub fn into_order(self) -> Option<Order> {
        let order_id = self.order_id?;
        let created_at = self.created_at?;
        let shipping_status = self
            .shipping_status
            .as_deref()
            .map(ShippingStatus::from_source)
            .unwrap_or(ShippingStatus::Pending);

        Some(Order {
            order_id,
            created_at,
            tracking_code: self.tracking_code,
            shipped_at: self.shipped_at,
            shipping_status,
            package_description: self.package_description,
            grouped_codes: self.grouped_codes,
            updated_at: Utc::now(),
        })
    }
}

// ==========================================
// ClassifiedOrder - 单订单判定结果
// ==========================================
// 派生结果,不落库
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifiedOrder {
    pub order: Order,
    pub safe_ship_date: NaiveDate, // 安全发货日（窗口关闭日）
    pub bucket: ShipBucket,
    pub dispatched: bool,          // 是否已有发货标记
    pub reasons: Vec<String>,      // 决策原因（可解释性）
}

// ==========================================
// CategorizedOrders - 全量分桶结果
// ==========================================
// 不变式: ready.len() + waiting.len() == 输入订单数
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategorizedOrders {
    pub reference_date: NaiveDate,
    pub ready: Vec<ClassifiedOrder>,
    pub waiting: Vec<ClassifiedOrder>,
}

impl CategorizedOrders {
    pub fn total(&self) -> usize {
        self.ready.len() + self.waiting.len()
    }

    /// 取指定分桶
    pub fn bucket(&self, bucket: ShipBucket) -> &[ClassifiedOrder] {
        match bucket {
            ShipBucket::Ready => &self.ready,
            ShipBucket::Waiting => &self.waiting,
        }
    }

    pub fn summary(&self) -> BucketSummary {
        BucketSummary {
            reference_date: self.reference_date,
            ready_count: self.ready.len(),
            waiting_count: self.waiting.len(),
            dispatched_count: self.ready.iter().filter(|c| c.dispatched).count(),
        }
    }
}

// ==========================================
// BucketSummary - 分桶计数
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketSummary {
    pub reference_date: NaiveDate,
    pub ready_count: usize,
    pub waiting_count: usize,
    pub dispatched_count: usize, // READY 中已发货的数量
}
