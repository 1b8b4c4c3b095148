// ==========================================
// 售后合单窗口发货判定 - Shipment Window Core 纯函数库
// ==========================================
// 职责: 安全发货日计算、发货标记判定、READY/WAITING 分桶
// 红线: 无状态、无副作用、无 I/O 操作
// 红线: 已发货订单恒为 READY,跳过日期判定
// ==========================================

use crate::domain::order::{CategorizedOrders, ClassifiedOrder, Order};
use crate::domain::types::{ShipBucket, ShippingStatus};
use crate::domain::window_policy::{WindowPolicy, MAX_WINDOW_OFFSET_DAYS};
use crate::engine::error::{WindowError, WindowResult};
use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime};

// ==========================================
// ShipmentWindowCore - 纯函数工具类
// ==========================================
pub struct ShipmentWindowCore;

impl ShipmentWindowCore {
    /// 星期编号（周日=0 ... 周六=6）
    pub fn day_of_week_index(ts: NaiveDateTime) -> u32 {
        ts.weekday().num_days_from_sunday()
    }

    /// 归一到当天 00:00
    pub fn start_of_day(ts: NaiveDateTime) -> NaiveDateTime {
        ts.date().and_time(NaiveTime::MIN)
    }

    /// 日期加天数（越界时饱和到日期上下限）
    pub fn add_days(date: NaiveDate, days: i64) -> NaiveDate {
        Duration::try_days(days)
            .and_then(|delta| date.checked_add_signed(delta))
            .unwrap_or(if days < 0 { NaiveDate::MIN } else { NaiveDate::MAX })
    }

    /// 计算下单时刻对应的窗口天数
    ///
    /// # 规则（默认策略）
    /// - 周四(4) → +4（下周一关窗）
    /// - 周五(5) → +4（下周二关窗）
    /// - 其余 → +2
    pub fn window_offset_days(created_at: NaiveDateTime, policy: &WindowPolicy) -> i64 {
        policy.offset_for(Self::day_of_week_index(created_at))
    }

    /// 计算安全发货日
    ///
    /// # 规则
    /// - safe_ship_date = date(created_at) + offset(星期(created_at))
    /// - 与下单时分秒无关
    ///
    /// # 示例
    /// ```
    /// use chrono::NaiveDate;
    /// use shipment_window::domain::WindowPolicy;
    /// use shipment_window::engine::ShipmentWindowCore;
    ///
    /// // 2026-01-29 周四 → +4 天 = 2026-02-02 周一
    /// let created = NaiveDate::from_ymd_opt(2026, 1, 29).unwrap().and_hms_opt(15, 30, 0).unwrap();
    /// let safe = ShipmentWindowCore::calculate_safe_ship_date(created, &WindowPolicy::default());
    /// assert_eq!(safe, NaiveDate::from_ymd_opt(2026, 2, 2).unwrap());
    /// ```
    pub fn calculate_safe_ship_date(created_at: NaiveDateTime, policy: &WindowPolicy) -> NaiveDate {
        let offset = Self::window_offset_days(created_at, policy);
        Self::add_days(created_at.date(), offset)
    }

    /// 安全发货日的 00:00 时刻
    pub fn calculate_safe_ship_datetime(
        created_at: NaiveDateTime,
        policy: &WindowPolicy,
    ) -> NaiveDateTime {
        Self::calculate_safe_ship_date(created_at, policy).and_time(NaiveTime::MIN)
    }

    /// 判定订单是否已发货
    ///
    /// 任一发货标记存在即视为已发货:
    /// - 非空白物流单号
    /// - 发货时间
    /// - 发货状态为 SHIPPED
    pub fn is_dispatched(
        tracking_code: Option<&str>,
        shipped_at: Option<NaiveDateTime>,
        shipping_status: ShippingStatus,
    ) -> bool {
        let has_tracking = tracking_code.map(|c| !c.trim().is_empty()).unwrap_or(false);
        has_tracking || shipped_at.is_some() || shipping_status == ShippingStatus::Shipped
    }

    /// 订单是否仍在售后窗口内（不考虑发货标记）
    ///
    /// reference 当天 < 安全发货日 → 仍在窗口内
    pub fn is_within_post_sale_window(
        created_at: NaiveDateTime,
        reference: NaiveDateTime,
        policy: &WindowPolicy,
    ) -> bool {
        Self::start_of_day(reference) < Self::calculate_safe_ship_datetime(created_at, policy)
    }

    /// 判定分桶
    ///
    /// # 规则
    /// 1. 已发货 → READY（吸收态,不看日期）
    /// 2. reference_date >= safe_ship_date → READY（当天即关窗）
    /// 3. 否则 → WAITING
    ///
    /// # 返回
    /// - (ShipBucket, Vec<String>): 分桶 + 决策原因
    pub fn determine_bucket(
        dispatched: bool,
        safe_ship_date: NaiveDate,
        reference_date: NaiveDate,
    ) -> (ShipBucket, Vec<String>) {
        let mut reasons = Vec::new();

        // 规则 1: 已发货优先
        if dispatched {
            reasons.push("DISPATCHED: dispatch marker present".to_string());
            return (ShipBucket::Ready, reasons);
        }

        // 规则 2/3: 日期比较（均为整天,等同 start-of-day 比较）
        if reference_date >= safe_ship_date {
            reasons.push(format!(
                "READY: reference {} >= safe_ship_date {}",
                reference_date, safe_ship_date
            ));
            (ShipBucket::Ready, reasons)
        } else {
            let remaining = (safe_ship_date - reference_date).num_days();
            reasons.push(format!(
                "WAITING: reference {} < safe_ship_date {} ({} day(s) left)",
                reference_date, safe_ship_date, remaining
            ));
            (ShipBucket::Waiting, reasons)
        }
    }

    /// 评估单个订单
    pub fn classify(order: &Order, reference_date: NaiveDate, policy: &WindowPolicy) -> ClassifiedOrder {
        let safe_ship_date = Self::calculate_safe_ship_date(order.created_at, policy);
        let dispatched = Self::is_dispatched(
            order.tracking_code.as_deref(),
            order.shipped_at,
            order.shipping_status,
        );
        let (bucket, reasons) = Self::determine_bucket(dispatched, safe_ship_date, reference_date);

        ClassifiedOrder {
            order: order.clone(),
            safe_ship_date,
            bucket,
            dispatched,
            reasons,
        }
    }

    /// 全量分桶
    ///
    /// 每个订单恰好落入一个桶,桶内保持输入顺序
    pub fn partition<I>(orders: I, reference_date: NaiveDate, policy: &WindowPolicy) -> CategorizedOrders
    where
        I: IntoIterator<Item = Order>,
    {
        let mut ready = Vec::new();
        let mut waiting = Vec::new();

        for order in orders {
            let classified = Self::classify(&order, reference_date, policy);
            match classified.bucket {
                ShipBucket::Ready => ready.push(classified),
                ShipBucket::Waiting => waiting.push(classified),
            }
        }

        CategorizedOrders {
            reference_date,
            ready,
            waiting,
        }
    }

    /// 解析调用方给定的参考日
    ///
    /// # 支持格式
    /// - YYYY-MM-DD / YYYYMMDD
    /// - RFC 3339（取其自身时区下的日期）
    /// - YYYY-MM-DDTHH:MM:SS / YYYY-MM-DD HH:MM:SS
    ///
    /// # 返回
    /// - Err(WindowError::InvalidReferenceDate): 无法解析,不回退到今天
    pub fn parse_reference_date(value: &str) -> WindowResult<NaiveDate> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(WindowError::InvalidReferenceDate(value.to_string()));
        }

        if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
            return Ok(date);
        }
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y%m%d") {
            return Ok(date);
        }
        if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
            return Ok(dt.date_naive());
        }
        for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
            if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, fmt) {
                return Ok(dt.date());
            }
        }

        Err(WindowError::InvalidReferenceDate(value.to_string()))
    }

    /// 解析窗口策略配置值（逗号分隔,周日起,如 "2,2,2,2,4,4,2"）
    ///
    /// # 返回
    /// - Err(WindowError::InvalidPolicy): 数量不是 7、非整数或超出 0..=366
    pub fn parse_policy(value: &str) -> WindowResult<WindowPolicy> {
        let offsets = value
            .split(',')
            .map(|s| {
                s.trim().parse::<i64>().map_err(|_| {
                    WindowError::InvalidPolicy(format!("'{}' 不是整数", s.trim()))
                })
            })
            .collect::<WindowResult<Vec<i64>>>()?;

        if offsets.len() != 7 {
            return Err(WindowError::InvalidPolicy(format!(
                "需要 7 个偏移值，实际 {} 个",
                offsets.len()
            )));
        }
        if let Some(bad) = offsets
            .iter()
            .find(|d| !(0..=MAX_WINDOW_OFFSET_DAYS).contains(*d))
        {
            return Err(WindowError::InvalidPolicy(format!(
                "偏移值 {} 超出 0..={}",
                bad, MAX_WINDOW_OFFSET_DAYS
            )));
        }

        WindowPolicy::from_offsets(&offsets)
            .ok_or_else(|| WindowError::InvalidPolicy(value.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn ts(y: i32, m: u32, day: u32, h: u32, min: u32) -> NaiveDateTime {
        d(y, m, day).and_hms_opt(h, min, 0).unwrap()
    }

    fn policy() -> WindowPolicy {
        WindowPolicy::default()
    }

    // ==========================================
    // 策略解析 / 日期越界
    // ==========================================

    #[test]
    fn test_parse_policy_accepts_padded_values() {
        let policy = ShipmentWindowCore::parse_policy(" 3,2,2,2,4,4,3 ").unwrap();
        assert_eq!(policy.offset_for(0), 3);
        assert_eq!(policy.offset_for(4), 4);
    }

    #[test]
    fn test_parse_policy_rejects_malformed() {
        for raw in ["2,2,2", "2,2,2,2,4,4,x", "2,2,2,2,4,4,-1", "", "100000000,2,2,2,4,4,2"] {
            assert!(
                matches!(
                    ShipmentWindowCore::parse_policy(raw),
                    Err(WindowError::InvalidPolicy(_))
                ),
                "{:?} should be rejected",
                raw
            );
        }
    }

    #[test]
    fn test_add_days_saturates_instead_of_panicking() {
        assert_eq!(ShipmentWindowCore::add_days(NaiveDate::MAX, 1), NaiveDate::MAX);
        assert_eq!(ShipmentWindowCore::add_days(d(2026, 1, 29), i64::MAX), NaiveDate::MAX);
        assert_eq!(ShipmentWindowCore::add_days(NaiveDate::MIN, -1), NaiveDate::MIN);
        assert_eq!(ShipmentWindowCore::add_days(d(2026, 1, 29), 4), d(2026, 2, 2));
    }

    // ==========================================
    // 星期编号
    // ==========================================

    #[test]
    fn test_day_of_week_index_sunday_is_zero() {
        // 2026-02-01 是周日
        assert_eq!(ShipmentWindowCore::day_of_week_index(ts(2026, 2, 1, 9, 0)), 0);
        // 2026-01-29 是周四
        assert_eq!(ShipmentWindowCore::day_of_week_index(ts(2026, 1, 29, 9, 0)), 4);
        // 2026-01-31 是周六
        assert_eq!(ShipmentWindowCore::day_of_week_index(ts(2026, 1, 31, 9, 0)), 6);
    }

    // ==========================================
    // 安全发货日
    // ==========================================

    #[test]
    fn test_safe_ship_date_thursday_plus_four() {
        let created = ts(2026, 1, 29, 10, 0);
        assert_eq!(
            ShipmentWindowCore::calculate_safe_ship_date(created, &policy()),
            d(2026, 2, 2)
        );
    }

    #[test]
    fn test_safe_ship_date_friday_plus_four() {
        let created = ts(2026, 1, 30, 18, 45);
        assert_eq!(
            ShipmentWindowCore::calculate_safe_ship_date(created, &policy()),
            d(2026, 2, 3)
        );
    }

    #[test]
    fn test_safe_ship_date_monday_plus_two() {
        let created = ts(2026, 1, 26, 8, 0);
        assert_eq!(
            ShipmentWindowCore::calculate_safe_ship_date(created, &policy()),
            d(2026, 1, 28)
        );
    }

    #[test]
    fn test_safe_ship_date_sunday_plus_two() {
        let created = ts(2026, 2, 1, 23, 59);
        assert_eq!(
            ShipmentWindowCore::calculate_safe_ship_date(created, &policy()),
            d(2026, 2, 3)
        );
    }

    #[test]
    fn test_safe_ship_date_saturday_and_wednesday_plus_two() {
        assert_eq!(
            ShipmentWindowCore::calculate_safe_ship_date(ts(2026, 1, 31, 12, 0), &policy()),
            d(2026, 2, 2)
        );
        assert_eq!(
            ShipmentWindowCore::calculate_safe_ship_date(ts(2026, 1, 28, 12, 0), &policy()),
            d(2026, 1, 30)
        );
    }

    #[test]
    fn test_safe_ship_date_ignores_time_of_day() {
        let early = ts(2026, 1, 27, 0, 0);
        let late = ts(2026, 1, 27, 23, 59);
        assert_eq!(
            ShipmentWindowCore::calculate_safe_ship_date(early, &policy()),
            ShipmentWindowCore::calculate_safe_ship_date(late, &policy())
        );
    }

    #[test]
    fn test_safe_ship_datetime_is_midnight() {
        let safe = ShipmentWindowCore::calculate_safe_ship_datetime(ts(2026, 1, 27, 17, 3), &policy());
        assert_eq!(safe, ts(2026, 1, 29, 0, 0));
    }

    #[test]
    fn test_safe_ship_date_custom_policy() {
        let custom = WindowPolicy::from_offsets(&[1, 1, 1, 1, 1, 1, 1]).unwrap();
        assert_eq!(
            ShipmentWindowCore::calculate_safe_ship_date(ts(2026, 1, 29, 10, 0), &custom),
            d(2026, 1, 30)
        );
    }

    // ==========================================
    // 发货标记
    // ==========================================

    #[test]
    fn test_is_dispatched_markers() {
        assert!(ShipmentWindowCore::is_dispatched(Some("BR1"), None, ShippingStatus::Pending));
        assert!(ShipmentWindowCore::is_dispatched(
            None,
            Some(ts(2026, 1, 30, 9, 0)),
            ShippingStatus::Pending
        ));
        assert!(ShipmentWindowCore::is_dispatched(None, None, ShippingStatus::Shipped));
        assert!(!ShipmentWindowCore::is_dispatched(Some("  "), None, ShippingStatus::Pending));
        assert!(!ShipmentWindowCore::is_dispatched(None, None, ShippingStatus::Pending));
    }

    // ==========================================
    // 分桶判定
    // ==========================================

    #[test]
    fn test_determine_bucket_tie_resolves_ready() {
        let (bucket, reasons) = ShipmentWindowCore::determine_bucket(false, d(2026, 2, 2), d(2026, 2, 2));
        assert_eq!(bucket, ShipBucket::Ready);
        assert!(reasons[0].starts_with("READY"));
    }

    #[test]
    fn test_determine_bucket_waiting_reports_days_left() {
        let (bucket, reasons) = ShipmentWindowCore::determine_bucket(false, d(2026, 2, 2), d(2026, 1, 29));
        assert_eq!(bucket, ShipBucket::Waiting);
        assert!(reasons[0].contains("4 day(s) left"));
    }

    #[test]
    fn test_determine_bucket_dispatched_short_circuits() {
        // 参考日远早于安全发货日
        let (bucket, reasons) = ShipmentWindowCore::determine_bucket(true, d(2026, 2, 2), d(2020, 1, 1));
        assert_eq!(bucket, ShipBucket::Ready);
        assert!(reasons[0].starts_with("DISPATCHED"));
    }

    #[test]
    fn test_thursday_scenario() {
        let order = Order::new("P-THU", ts(2026, 1, 29, 14, 0));

        let same_day = ShipmentWindowCore::classify(&order, d(2026, 1, 29), &policy());
        assert_eq!(same_day.safe_ship_date, d(2026, 2, 2));
        assert_eq!(same_day.bucket, ShipBucket::Waiting);

        let sunday = ShipmentWindowCore::classify(&order, d(2026, 2, 1), &policy());
        assert_eq!(sunday.bucket, ShipBucket::Waiting);

        let monday = ShipmentWindowCore::classify(&order, d(2026, 2, 2), &policy());
        assert_eq!(monday.bucket, ShipBucket::Ready);
    }

    #[test]
    fn test_tuesday_scenario_equality_is_ready() {
        let order = Order::new("P-TUE", ts(2026, 1, 27, 9, 0));
        let result = ShipmentWindowCore::classify(&order, d(2026, 1, 29), &policy());
        assert_eq!(result.safe_ship_date, d(2026, 1, 29));
        assert_eq!(result.bucket, ShipBucket::Ready);
    }

    #[test]
    fn test_within_post_sale_window_uses_start_of_day() {
        let created = ts(2026, 1, 27, 9, 0); // 安全发货日 2026-01-29
        assert!(ShipmentWindowCore::is_within_post_sale_window(
            created,
            ts(2026, 1, 28, 23, 59),
            &policy()
        ));
        // 参考时刻 23:59 与安全发货日 00:00 同一天 → 已出窗口
        assert!(!ShipmentWindowCore::is_within_post_sale_window(
            created,
            ts(2026, 1, 29, 23, 59),
            &policy()
        ));
    }

    #[test]
    fn test_partition_is_total_and_preserves_order() {
        let mut shipped = Order::new("P3", ts(2026, 1, 29, 10, 0));
        shipped.tracking_code = Some("BR999".to_string());

        let orders = vec![
            Order::new("P1", ts(2026, 1, 27, 10, 0)), // 01-29 → READY
            Order::new("P2", ts(2026, 1, 29, 10, 0)), // 02-02 → WAITING
            shipped,                                  // 已发货 → READY
            Order::new("P4", ts(2026, 1, 20, 10, 0)), // 01-22 → READY
        ];

        let result = ShipmentWindowCore::partition(orders, d(2026, 1, 29), &policy());
        assert_eq!(result.total(), 4);

        let ready_ids: Vec<_> = result.ready.iter().map(|c| c.order.order_id.as_str()).collect();
        let waiting_ids: Vec<_> = result.waiting.iter().map(|c| c.order.order_id.as_str()).collect();
        assert_eq!(ready_ids, vec!["P1", "P3", "P4"]);
        assert_eq!(waiting_ids, vec!["P2"]);

        let summary = result.summary();
        assert_eq!(summary.ready_count, 3);
        assert_eq!(summary.waiting_count, 1);
        assert_eq!(summary.dispatched_count, 1);
    }

    #[test]
    fn test_partition_empty_input() {
        let result = ShipmentWindowCore::partition(Vec::new(), d(2026, 1, 29), &policy());
        assert_eq!(result.total(), 0);
    }

    // ==========================================
    // 参考日解析
    // ==========================================

    #[test]
    fn test_parse_reference_date_formats() {
        let expected = d(2026, 1, 29);
        assert_eq!(ShipmentWindowCore::parse_reference_date("2026-01-29"), Ok(expected));
        assert_eq!(ShipmentWindowCore::parse_reference_date("20260129"), Ok(expected));
        assert_eq!(
            ShipmentWindowCore::parse_reference_date("2026-01-29T23:59:00-03:00"),
            Ok(expected)
        );
        assert_eq!(
            ShipmentWindowCore::parse_reference_date("2026-01-29 08:00:00"),
            Ok(expected)
        );
    }

    #[test]
    fn test_parse_reference_date_rejects_garbage() {
        assert!(matches!(
            ShipmentWindowCore::parse_reference_date("2026-02-30"),
            Err(WindowError::InvalidReferenceDate(_))
        ));
        assert!(ShipmentWindowCore::parse_reference_date("").is_err());
        assert!(ShipmentWindowCore::parse_reference_date("Invalid Date").is_err());
    }
}
