// ==========================================
// 售后合单窗口发货判定 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型、窗口策略
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod filter;
pub mod import;
pub mod order;
pub mod types;
pub mod window_policy;

// 重导出核心类型
pub use filter::{DateRange, OrderFilters, Pagination, PAGE_SIZE_OPTIONS};
pub use import::{DqLevel, DqReport, DqSummary, DqViolation, ImportResult};
pub use order::{BucketSummary, CategorizedOrders, ClassifiedOrder, Order, RawOrderRecord};
pub use types::{DateRangePreset, ShipBucket, ShippingStatus};
pub use window_policy::{WindowPolicy, DEFAULT_WINDOW_OFFSETS, MAX_WINDOW_OFFSET_DAYS};
