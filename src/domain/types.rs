// ==========================================
// 售后合单窗口发货判定 - 领域类型定义
// ==========================================
// 红线: 分桶只有 READY / WAITING 两种结果,已发货订单恒为 READY
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 发货分桶 (Ship Bucket)
// ==========================================
// 派生结果,每次评估重新计算,不落库
// 序列化格式: SCREAMING_SNAKE_CASE
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ShipBucket {
    Ready,   // 可发货
    Waiting, // 售后窗口内,等待合单
}

impl fmt::Display for ShipBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShipBucket::Ready => write!(f, "READY"),
            ShipBucket::Waiting => write!(f, "WAITING"),
        }
    }
}

impl ShipBucket {
    /// 从字符串解析分桶（前端 tab 值: ready / waiting）
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "ready" => Some(ShipBucket::Ready),
            "waiting" => Some(ShipBucket::Waiting),
            _ => None,
        }
    }
}

// ==========================================
// 发货状态 (Shipping Status)
// ==========================================
// 与 shipment_order.shipping_status 列一致
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ShippingStatus {
    Pending, // 待发货
    Shipped, // 已发货
}

impl fmt::Display for ShippingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShippingStatus::Pending => write!(f, "PENDING"),
            ShippingStatus::Shipped => write!(f, "SHIPPED"),
        }
    }
}

impl ShippingStatus {
    /// 从源系统状态文本解析
    ///
    /// 源表混用葡语/英文/大小写（Pendente / Enviado / shipped ...），
    /// 无法识别的值一律视为 PENDING。
    pub fn from_source(s: &str) -> Self {
        match s.trim().to_uppercase().as_str() {
            "SHIPPED" | "ENVIADO" | "ENVIADA" | "DESPACHADO" | "DISPATCHED" => {
                ShippingStatus::Shipped
            }
            _ => ShippingStatus::Pending,
        }
    }
}

// ==========================================
// 日期区间预设 (Date Range Preset)
// ==========================================
// 订单拉取的创建时间过滤区间
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DateRangePreset {
    Last7Days,
    Last15Days,
    Last30Days,
    Custom,
}

impl DateRangePreset {
    /// 预设对应的回看天数（Custom 无固定天数）
    pub fn lookback_days(&self) -> Option<i64> {
        match self {
            DateRangePreset::Last7Days => Some(7),
            DateRangePreset::Last15Days => Some(15),
            DateRangePreset::Last30Days => Some(30),
            DateRangePreset::Custom => None,
        }
    }
}

impl fmt::Display for DateRangePreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DateRangePreset::Last7Days => write!(f, "7d"),
            DateRangePreset::Last15Days => write!(f, "15d"),
            DateRangePreset::Last30Days => write!(f, "30d"),
            DateRangePreset::Custom => write!(f, "custom"),
        }
    }
}
