// ==========================================
// 售后合单窗口发货判定 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、写入
// 存储: config_kv 表 (key-value + scope)
// ==========================================

use crate::config::window_config_trait::WindowConfigReader;
use crate::db::open_sqlite_connection;
use crate::domain::filter::PAGE_SIZE_OPTIONS;
use crate::domain::window_policy::WindowPolicy;
use crate::engine::ShipmentWindowCore;
use async_trait::async_trait;
use rusqlite::{params, Connection};
use serde_json::json;
use std::collections::HashMap;
use std::error::Error;
use std::sync::{Arc, Mutex};

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> Result<Self, Box<dyn Error>> {
        let conn = open_sqlite_connection(db_path)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 说明：为保证连接行为一致，会对传入连接再次应用统一 PRAGMA（幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Result<Self, Box<dyn Error>> {
        {
            let conn_guard = conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
            crate::db::configure_sqlite_connection(&conn_guard)?;
        }

        Ok(Self { conn })
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    fn get_config_value(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let result = conn.query_row(
            "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
            params![key],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(Box::new(e)),
        }
    }

    /// 从 config_kv 表读取配置值，带默认值
    fn get_config_or_default(&self, key: &str, default: &str) -> Result<String, Box<dyn Error>> {
        Ok(self.get_config_value(key)?.unwrap_or_else(|| default.to_string()))
    }

    /// 读取 global scope 的配置值（公开方法，供 CLI 复用）
    pub fn get_global_config_value(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        self.get_config_value(key)
    }

    /// 写入 global scope 配置（UPSERT）
    ///
    /// 窗口策略写入前先校验,非法值直接拒绝（InvalidPolicy）
    pub fn set_global_config_value(&self, key: &str, value: &str) -> Result<(), Box<dyn Error>> {
        if key == config_keys::WINDOW_OFFSETS {
            ShipmentWindowCore::parse_policy(value)?;
        }

        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value, updated_at)
             VALUES ('global', ?1, ?2, datetime('now'))
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2, updated_at = datetime('now')",
            params![key, value],
        )?;
        tracing::info!(config_key = key, value = value, "配置已更新");
        Ok(())
    }

    /// 获取所有 global 配置的快照（JSON格式）
    pub fn get_config_snapshot(&self) -> Result<String, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let mut stmt =
            conn.prepare("SELECT key, value FROM config_kv WHERE scope_id = 'global' ORDER BY key")?;

        let mut config_map: HashMap<String, String> = HashMap::new();
        let rows = stmt.query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?;

        for row in rows {
            let (key, value) = row?;
            config_map.insert(key, value);
        }

        Ok(serde_json::to_string(&json!(config_map))?)
    }
}

// ==========================================
// WindowConfigReader Trait 实现
// ==========================================
#[async_trait]
impl WindowConfigReader for ConfigManager {
    async fn get_window_policy(&self) -> Result<WindowPolicy, Box<dyn Error>> {
        let default = WindowPolicy::default();
        let value = match self.get_config_value(config_keys::WINDOW_OFFSETS)? {
            Some(v) => v,
            None => return Ok(default),
        };

        match ShipmentWindowCore::parse_policy(&value) {
            Ok(policy) => Ok(policy),
            Err(e) => {
                tracing::warn!(
                    config_key = config_keys::WINDOW_OFFSETS,
                    raw_value = %value,
                    error = %e,
                    "窗口策略配置无效，使用默认策略"
                );
                Ok(default)
            }
        }
    }

    async fn get_local_utc_offset_minutes(&self) -> Result<i32, Box<dyn Error>> {
        let value = self.get_config_or_default(config_keys::LOCAL_UTC_OFFSET_MINUTES, "-180")?;
        match value.trim().parse::<i32>() {
            Ok(m) if (-14 * 60..=14 * 60).contains(&m) => Ok(m),
            _ => {
                tracing::warn!(
                    config_key = config_keys::LOCAL_UTC_OFFSET_MINUTES,
                    raw_value = %value,
                    "时区偏移配置无效，使用 -180"
                );
                Ok(-180)
            }
        }
    }

    async fn get_order_fetch_limit(&self) -> Result<usize, Box<dyn Error>> {
        let value = self.get_config_or_default(config_keys::ORDER_FETCH_LIMIT, "5000")?;
        Ok(value.trim().parse::<usize>().ok().filter(|&n| n > 0).unwrap_or(5000))
    }

    async fn get_default_page_size(&self) -> Result<usize, Box<dyn Error>> {
        let value = self.get_config_or_default(config_keys::DEFAULT_PAGE_SIZE, "25")?;
        Ok(value
            .trim()
            .parse::<usize>()
            .ok()
            .filter(|n| PAGE_SIZE_OPTIONS.contains(n))
            .unwrap_or(25))
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 窗口策略（周日起 7 个偏移天数）
    pub const WINDOW_OFFSETS: &str = "window_offsets";

    // 本地时区偏移（分钟）
    pub const LOCAL_UTC_OFFSET_MINUTES: &str = "local_utc_offset_minutes";

    // 订单拉取
    pub const ORDER_FETCH_LIMIT: &str = "order_fetch_limit";
    pub const DEFAULT_PAGE_SIZE: &str = "default_page_size";
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_schema;
    use tempfile::NamedTempFile;

    fn setup() -> (NamedTempFile, ConfigManager) {
        let temp_file = NamedTempFile::new().unwrap();
        let db_path = temp_file.path().to_str().unwrap().to_string();
        let conn = open_sqlite_connection(&db_path).unwrap();
        init_schema(&conn).unwrap();
        let manager = ConfigManager::from_connection(Arc::new(Mutex::new(conn))).unwrap();
        (temp_file, manager)
    }

    /// 绕过写入校验直接落库（模拟外部改表）
    fn write_raw(manager: &ConfigManager, key: &str, value: &str) {
        let conn = manager.conn.lock().unwrap();
        conn.execute(
            "INSERT OR REPLACE INTO config_kv (scope_id, key, value, updated_at)
             VALUES ('global', ?1, ?2, datetime('now'))",
            params![key, value],
        )
        .unwrap();
    }

    #[tokio::test]
    async fn test_defaults_when_table_empty() {
        let (_tmp, manager) = setup();
        assert_eq!(manager.get_window_policy().await.unwrap(), WindowPolicy::default());
        assert_eq!(manager.get_local_utc_offset_minutes().await.unwrap(), -180);
        assert_eq!(manager.get_order_fetch_limit().await.unwrap(), 5000);
        assert_eq!(manager.get_default_page_size().await.unwrap(), 25);
    }

    #[tokio::test]
    async fn test_override_window_policy() {
        let (_tmp, manager) = setup();
        manager
            .set_global_config_value(config_keys::WINDOW_OFFSETS, "3,2,2,2,4,4,3")
            .unwrap();
        let policy = manager.get_window_policy().await.unwrap();
        assert_eq!(policy.offset_for(0), 3);
        assert_eq!(policy.offset_for(6), 3);
    }

    #[tokio::test]
    async fn test_malformed_values_fall_back() {
        let (_tmp, manager) = setup();
        write_raw(&manager, config_keys::WINDOW_OFFSETS, "2,2");
        manager
            .set_global_config_value(config_keys::LOCAL_UTC_OFFSET_MINUTES, "99999")
            .unwrap();
        manager.set_global_config_value(config_keys::DEFAULT_PAGE_SIZE, "33").unwrap();

        assert_eq!(manager.get_window_policy().await.unwrap(), WindowPolicy::default());
        assert_eq!(manager.get_local_utc_offset_minutes().await.unwrap(), -180);
        assert_eq!(manager.get_default_page_size().await.unwrap(), 25);
    }

    #[tokio::test]
    async fn test_oversized_window_offset_falls_back() {
        let (_tmp, manager) = setup();
        write_raw(&manager, config_keys::WINDOW_OFFSETS, "100000000,2,2,2,4,4,2");
        assert_eq!(manager.get_window_policy().await.unwrap(), WindowPolicy::default());
    }

    #[test]
    fn test_invalid_window_offsets_rejected_on_write() {
        let (_tmp, manager) = setup();
        manager
            .set_global_config_value(config_keys::WINDOW_OFFSETS, "2,2,2,2,4,4,2")
            .unwrap();

        let err = manager
            .set_global_config_value(config_keys::WINDOW_OFFSETS, "100000000,2,2,2,4,4,2")
            .unwrap_err();
        assert!(err.to_string().contains("窗口策略配置无效"));
        assert_eq!(
            manager
                .get_global_config_value(config_keys::WINDOW_OFFSETS)
                .unwrap()
                .as_deref(),
            Some("2,2,2,2,4,4,2")
        );
    }

    #[tokio::test]
    async fn test_local_offset_from_minutes() {
        let (_tmp, manager) = setup();
        manager
            .set_global_config_value(config_keys::LOCAL_UTC_OFFSET_MINUTES, "60")
            .unwrap();
        let offset = manager.get_local_offset().await.unwrap();
        assert_eq!(offset.local_minus_utc(), 3600);
    }

    #[test]
    fn test_config_snapshot_contains_written_keys() {
        let (_tmp, manager) = setup();
        manager.set_global_config_value(config_keys::ORDER_FETCH_LIMIT, "100").unwrap();
        let snapshot = manager.get_config_snapshot().unwrap();
        let map: HashMap<String, String> = serde_json::from_str(&snapshot).unwrap();
        assert_eq!(map.get("order_fetch_limit"), Some(&"100".to_string()));
    }
}
