// ==========================================
// 售后合单窗口发货判定 - 窗口策略
// ==========================================
// 红线: 星期编号固定为 周日=0 ... 周六=6
// 默认: 周四/周五 +4 天,其余 +2 天
// ==========================================

use serde::{Deserialize, Serialize};

/// 默认窗口偏移（周日起）
pub const DEFAULT_WINDOW_OFFSETS: [i64; 7] = [2, 2, 2, 2, 4, 4, 2];

/// 单日窗口天数上限
pub const MAX_WINDOW_OFFSET_DAYS: i64 = 366;

/// 售后合单窗口策略
///
/// 按下单日星期几给出窗口天数。七个取值逐一配置,
/// 不是“工作日/周末”二分。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowPolicy {
    weekday_offsets: [i64; 7],
}

impl Default for WindowPolicy {
    fn default() -> Self {
        Self {
            weekday_offsets: DEFAULT_WINDOW_OFFSETS,
        }
    }
}

impl WindowPolicy {
    /// 从七个偏移值构造（周日起）
    ///
    /// # 返回
    /// - None: 数量不是 7 或含超出 0..=366 的值
    pub fn from_offsets(offsets: &[i64]) -> Option<Self> {
        if offsets.len() != 7
            || offsets
                .iter()
                .any(|d| !(0..=MAX_WINDOW_OFFSET_DAYS).contains(d))
        {
            return None;
        }
        let mut weekday_offsets = [0i64; 7];
        weekday_offsets.copy_from_slice(offsets);
        Some(Self { weekday_offsets })
    }

    /// 指定星期（周日=0）的窗口天数
    pub fn offset_for(&self, weekday_from_sunday: u32) -> i64 {
        self.weekday_offsets[(weekday_from_sunday % 7) as usize]
    }

    pub fn offsets(&self) -> &[i64; 7] {
        &self.weekday_offsets
    }

    /// 序列化为配置值
    pub fn to_config_value(&self) -> String {
        self.weekday_offsets
            .iter()
            .map(|d| d.to_string())
            .collect::<Vec<_>>()
            .join(",")
    }
}
