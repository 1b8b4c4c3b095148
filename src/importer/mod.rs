// ==========================================
// 售后合单窗口发货判定 - 导入层
// ==========================================
// 职责: 外部订单数据导入,生成规范化订单
// 支持: Excel, CSV, JSON
// ==========================================

pub mod dq_validator;
pub mod error;
pub mod field_mapper;
pub mod file_parser;
pub mod importer_trait;
pub mod order_importer;

// 重导出核心类型
pub use dq_validator::OrderDqValidator;
pub use error::{ImportError, ImportResult};
pub use field_mapper::OrderFieldMapper;
pub use file_parser::{CsvParser, ExcelParser, JsonParser, UniversalFileParser};
pub use order_importer::{NormalizedBatch, OrderImporter};

// 重导出 Trait 接口
pub use importer_trait::{DqValidator, FieldMapper, FileParser};
