// ==========================================
// 售后合单窗口发货判定 - 引擎层
// ==========================================
// 职责: 实现窗口判定规则,不拼 SQL
// 红线: Engine 不拼 SQL, 所有判定必须输出 reason
// ==========================================

pub mod error;
pub mod shipment_window;
pub mod shipment_window_core;

// 重导出核心引擎
pub use error::{WindowError, WindowResult};
pub use shipment_window::ShipmentWindowEngine;
pub use shipment_window_core::ShipmentWindowCore;
