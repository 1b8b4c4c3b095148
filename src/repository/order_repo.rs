// ==========================================
// 售后合单窗口发货判定 - 订单仓储
// ==========================================
// 红线: Repository 不含业务逻辑（不做分桶判定）
// 职责: shipment_order 表的 CRUD 与物流单号维护
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::filter::DateRange;
use crate::domain::order::Order;
use crate::domain::types::ShippingStatus;
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::{NaiveDateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex};

const ORDER_COLUMNS: &str = "order_id, created_at, tracking_code, shipped_at, shipping_status, \
                             package_description, grouped_codes, updated_at";

// ==========================================
// OrderRepository - 订单仓储
// ==========================================
pub struct OrderRepository {
    conn: Arc<Mutex<Connection>>,
}

impl OrderRepository {
    /// 创建新的 OrderRepository 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建仓储实例
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    // ==========================================
    // 枚举类型转换辅助方法
    // ==========================================

    fn status_to_str(status: ShippingStatus) -> &'static str {
        match status {
            ShippingStatus::Pending => "PENDING",
            ShippingStatus::Shipped => "SHIPPED",
        }
    }

    fn str_to_status(s: &str) -> ShippingStatus {
        match s {
            "SHIPPED" => ShippingStatus::Shipped,
            _ => ShippingStatus::Pending,
        }
    }

    fn map_row(row: &Row<'_>) -> rusqlite::Result<Order> {
        let order_id: String = row.get(0)?;
        let status: String = row.get(4)?;
        let grouped_raw: String = row.get(6)?;
        // 损坏的 JSON 视为无合单号,不阻断整批读取
        let grouped_codes: Vec<String> = match serde_json::from_str(&grouped_raw) {
            Ok(codes) => codes,
            Err(e) => {
                tracing::warn!(
                    order_id = %order_id,
                    raw_value = %grouped_raw,
                    error = %e,
                    "grouped_codes 列无法解析，按空列表处理"
                );
                Vec::new()
            }
        };

        Ok(Order {
            order_id,
            created_at: row.get(1)?,
            tracking_code: row.get(2)?,
            shipped_at: row.get(3)?,
            shipping_status: Self::str_to_status(&status),
            package_description: row.get(5)?,
            grouped_codes,
            updated_at: row.get(7)?,
        })
    }

    fn not_found(order_id: &str) -> RepositoryError {
        RepositoryError::NotFound {
            entity: "ShipmentOrder".to_string(),
            id: order_id.to_string(),
        }
    }

    // ==========================================
    // 写入
    // ==========================================

    /// 批量写入订单（按 order_id upsert）
    ///
    /// # 返回
    /// - Ok(usize): 写入的记录数
    ///
    /// # 说明
    /// - 单事务提交,任一失败整批回滚
    /// - 已有的发货标记（物流单号/发货时间/SHIPPED）不会被导入清除,只能经 clear_tracking 重置
    pub fn upsert_batch(&self, orders: &[Order]) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let tx = conn
            .unchecked_transaction()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        let mut count = 0;
        {
            let mut stmt = tx.prepare(
                r#"
                INSERT INTO shipment_order (
                    order_id, created_at, tracking_code, shipped_at, shipping_status,
                    package_description, grouped_codes, updated_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                ON CONFLICT(order_id) DO UPDATE SET
                    created_at = excluded.created_at,
                    tracking_code = COALESCE(excluded.tracking_code, shipment_order.tracking_code),
                    shipped_at = COALESCE(excluded.shipped_at, shipment_order.shipped_at),
                    shipping_status = CASE
                        WHEN shipment_order.shipping_status = 'SHIPPED' THEN 'SHIPPED'
                        ELSE excluded.shipping_status
                    END,
                    package_description = excluded.package_description,
                    grouped_codes = excluded.grouped_codes,
                    updated_at = excluded.updated_at
                "#,
            )?;

            for order in orders {
                let grouped = serde_json::to_string(&order.grouped_codes)?;
                count += stmt.execute(params![
                    order.order_id,
                    order.created_at,
                    order.tracking_code,
                    order.shipped_at,
                    Self::status_to_str(order.shipping_status),
                    order.package_description,
                    grouped,
                    order.updated_at,
                ])?;
            }
        }

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
        Ok(count)
    }

    /// 写入物流单号并标记为已发货
    ///
    /// # 错误
    /// - ValidationError: 单号为空白
    /// - NotFound: 订单不存在
    pub fn update_tracking(
        &self,
        order_id: &str,
        tracking_code: &str,
        shipped_at: NaiveDateTime,
    ) -> RepositoryResult<()> {
        let code = tracking_code.trim();
        if code.is_empty() {
            return Err(RepositoryError::ValidationError(
                "tracking_code 不能为空".to_string(),
            ));
        }

        let conn = self.get_conn()?;
        let affected = conn.execute(
            "UPDATE shipment_order
             SET tracking_code = ?2, shipped_at = ?3, shipping_status = 'SHIPPED', updated_at = ?4
             WHERE order_id = ?1",
            params![order_id, code, shipped_at, Utc::now()],
        )?;

        if affected == 0 {
            return Err(Self::not_found(order_id));
        }
        Ok(())
    }

    /// 清除物流单号与发货时间,状态回到 PENDING
    pub fn clear_tracking(&self, order_id: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            "UPDATE shipment_order
             SET tracking_code = NULL, shipped_at = NULL, shipping_status = 'PENDING', updated_at = ?2
             WHERE order_id = ?1",
            params![order_id, Utc::now()],
        )?;

        if affected == 0 {
            return Err(Self::not_found(order_id));
        }
        Ok(())
    }

    // ==========================================
    // 查询
    // ==========================================

    pub fn find_by_id(&self, order_id: &str) -> RepositoryResult<Option<Order>> {
        let conn = self.get_conn()?;
        let sql = format!("SELECT {} FROM shipment_order WHERE order_id = ?1", ORDER_COLUMNS);
        let order = conn
            .query_row(&sql, params![order_id], Self::map_row)
            .optional()?;
        Ok(order)
    }

    /// 拉取订单列表（按下单时间倒序）
    ///
    /// # 参数
    /// - range: 下单时间区间（半开区间,None 表示不过滤）
    /// - limit: 上限
    pub fn list_orders(&self, range: Option<&DateRange>, limit: usize) -> RepositoryResult<Vec<Order>> {
        let conn = self.get_conn()?;
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);

        let orders = match range {
            Some(range) => {
                let sql = format!(
                    "SELECT {} FROM shipment_order
                     WHERE created_at >= ?1 AND created_at < ?2
                     ORDER BY created_at DESC, order_id ASC
                     LIMIT ?3",
                    ORDER_COLUMNS
                );
                let mut stmt = conn.prepare(&sql)?;
                let rows = stmt.query_map(params![range.start, range.end_exclusive, limit], Self::map_row)?;
                rows.collect::<rusqlite::Result<Vec<_>>>()?
            }
            None => {
                let sql = format!(
                    "SELECT {} FROM shipment_order
                     ORDER BY created_at DESC, order_id ASC
                     LIMIT ?1",
                    ORDER_COLUMNS
                );
                let mut stmt = conn.prepare(&sql)?;
                let rows = stmt.query_map(params![limit], Self::map_row)?;
                rows.collect::<rusqlite::Result<Vec<_>>>()?
            }
        };

        tracing::debug!(count = orders.len(), "订单列表已加载");
        Ok(orders)
    }

    pub fn count(&self) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let n: i64 = conn.query_row("SELECT COUNT(*) FROM shipment_order", [], |row| row.get(0))?;
        Ok(n as usize)
    }
}
