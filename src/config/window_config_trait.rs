// ==========================================
// 售后合单窗口发货判定 - 窗口配置读取 Trait
// ==========================================
// 职责: 定义引擎/导入/API 所需的配置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use crate::domain::window_policy::WindowPolicy;
use async_trait::async_trait;
use chrono::FixedOffset;
use std::error::Error;

// ==========================================
// WindowConfigReader Trait
// ==========================================
// 实现者: ConfigManager（从 config_kv 表读取）
#[async_trait]
pub trait WindowConfigReader: Send + Sync {
    // ===== 窗口策略 =====

    /// 获取售后合单窗口策略
    ///
    /// # 默认值
    /// - 2,2,2,2,4,4,2（周日起）
    async fn get_window_policy(&self) -> Result<WindowPolicy, Box<dyn Error>>;

    // ===== 时区 =====

    /// 获取本地时区相对 UTC 的偏移（分钟）
    ///
    /// # 默认值
    /// - -180（America/Sao_Paulo）
    ///
    /// # 用途
    /// - 导入时把带时区的时间戳换算为本地墙钟时间,星期几以本地为准
    async fn get_local_utc_offset_minutes(&self) -> Result<i32, Box<dyn Error>>;

    /// 获取本地时区（由偏移分钟换算）
    async fn get_local_offset(&self) -> Result<FixedOffset, Box<dyn Error>> {
        let minutes = self.get_local_utc_offset_minutes().await?;
        FixedOffset::east_opt(minutes * 60)
            .ok_or_else(|| format!("时区偏移超出范围: {} 分钟", minutes).into())
    }

    // ===== 订单拉取 =====

    /// 获取单次拉取订单上限
    ///
    /// # 默认值
    /// - 5000
    async fn get_order_fetch_limit(&self) -> Result<usize, Box<dyn Error>>;

    /// 获取默认分页大小
    ///
    /// # 默认值
    /// - 25
    async fn get_default_page_size(&self) -> Result<usize, Box<dyn Error>>;
}
