// ==========================================
// 售后合单窗口发货判定 - API 层
// ==========================================
// 职责: 提供业务 API 接口,供 CLI 调用
// ==========================================

pub mod error;
pub mod logistics_api;

// 重导出核心类型
pub use error::{ApiError, ApiResult};
pub use logistics_api::{LogisticsApi, OrderPageResponse};
