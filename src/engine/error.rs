// ==========================================
// 售后合单窗口发货判定 - 引擎层错误类型
// ==========================================
// 工具: thiserror 派生宏
// ==========================================

use thiserror::Error;

/// 引擎层错误类型
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WindowError {
    /// 参考日无法解析（调用方错误,快速失败,不做默认值回退）
    #[error("参考日无效: '{0}'（期望 YYYY-MM-DD 或 ISO-8601 时间戳）")]
    InvalidReferenceDate(String),

    #[error("窗口策略配置无效: {0}")]
    InvalidPolicy(String),
}

/// Result 类型别名
pub type WindowResult<T> = Result<T, WindowError>;
