// ==========================================
// 售后合单窗口发货判定 - 核心库
// ==========================================
// 技术栈: Rust + SQLite
// 系统定位: 售后合单窗口内的订单暂缓发货,窗口关闭后转为可发货
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 窗口判定规则
pub mod engine;

// 导入层 - 外部数据
pub mod importer;

// 配置层 - 系统配置
pub mod config;

// 数据库基础设施（连接初始化/建表）
pub mod db;

// 日志系统
pub mod logging;

// API 层 - 业务接口
pub mod api;

// 应用层 - 组装
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{DateRangePreset, ShipBucket, ShippingStatus};

// 领域实体
pub use domain::{
    BucketSummary, CategorizedOrders, ClassifiedOrder, DateRange, Order, OrderFilters, WindowPolicy,
};

// 引擎
pub use engine::{ShipmentWindowCore, ShipmentWindowEngine, WindowError};

// API
pub use api::{ApiError, LogisticsApi, OrderPageResponse};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "售后合单窗口发货判定";
