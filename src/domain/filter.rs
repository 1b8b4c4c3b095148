// ==========================================
// 售后合单窗口发货判定 - 查询过滤与分页
// ==========================================
// 职责: 订单列表的日期区间、搜索、分桶 tab、分页参数
// ==========================================

use crate::domain::types::{DateRangePreset, ShipBucket};
use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

/// 允许的分页大小
pub const PAGE_SIZE_OPTIONS: [usize; 4] = [10, 25, 50, 100];

// ==========================================
// DateRange - 下单时间区间 [start, end_exclusive)
// ==========================================
// 半开区间: 带小数秒的时间戳也落在当天内
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDateTime,
    pub end_exclusive: NaiveDateTime,
}

impl DateRange {
    /// 按预设生成区间: [today - n 的 00:00, today + 1 的 00:00)
    ///
    /// Custom 预设没有默认区间,返回 None
    pub fn from_preset(preset: DateRangePreset, today: NaiveDate) -> Option<Self> {
        let days = preset.lookback_days()?;
        Some(Self::custom(today - Duration::days(days), today))
    }

    /// 自定义区间（起止日期会被规范为整天边界）
    pub fn custom(start: NaiveDate, end: NaiveDate) -> Self {
        let (start, end) = if start <= end { (start, end) } else { (end, start) };
        Self {
            start: start.and_time(NaiveTime::MIN),
            end_exclusive: next_midnight(end),
        }
    }

    pub fn contains(&self, ts: NaiveDateTime) -> bool {
        ts >= self.start && ts < self.end_exclusive
    }
}

fn next_midnight(date: NaiveDate) -> NaiveDateTime {
    date.succ_opt()
        .map(|next| next.and_time(NaiveTime::MIN))
        .unwrap_or(NaiveDateTime::MAX)
}

// ==========================================
// OrderFilters - 列表查询参数
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderFilters {
    pub reference_date: String, // 调用方给定的参考日（ISO-8601）
    pub search_term: String,
    pub active_tab: ShipBucket,
    pub page: usize, // 从 1 开始
    pub page_size: usize,
    pub date_range: Option<DateRange>,
}

impl OrderFilters {
    pub fn new(reference_date: impl Into<String>, active_tab: ShipBucket) -> Self {
        Self {
            reference_date: reference_date.into(),
            search_term: String::new(),
            active_tab,
            page: 1,
            page_size: PAGE_SIZE_OPTIONS[1],
            date_range: None,
        }
    }
}

// ==========================================
// Pagination - 分页状态
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub page: usize,
    pub page_size: usize,
    pub total_items: usize,
    pub total_pages: usize,
}

impl Pagination {
    /// 计算分页（页码超界时钳制到最后一页）
    pub fn compute(page: usize, page_size: usize, total_items: usize) -> Self {
        let page_size = page_size.max(1);
        let total_pages = total_items.div_ceil(page_size).max(1);
        Self {
            page: page.clamp(1, total_pages),
            page_size,
            total_items,
            total_pages,
        }
    }

    /// 当前页在全集中的切片范围
    pub fn slice_range(&self) -> std::ops::Range<usize> {
        let start = ((self.page - 1) * self.page_size).min(self.total_items);
        let end = (start + self.page_size).min(self.total_items);
        start..end
    }
}
