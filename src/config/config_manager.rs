// ==========================================
// 农作物种植监测系统 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value + scope)
// ==========================================

use crate::config::lifecycle_config_trait::{ConfigResult, LifecycleConfigReader};
use crate::db::open_sqlite_connection;
use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::json;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

const GLOBAL_SCOPE: &str = "global";

/// 列表每页上限
pub const MAX_LIST_PAGE_SIZE: usize = 1000;

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
    pub fn new(db_path: &str) -> ConfigResult<Self> {
        let conn = open_sqlite_connection(db_path)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 说明：为保证连接行为一致，会对传入连接再次应用统一 PRAGMA（幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> ConfigResult<Self> {
        {
            let conn_guard = conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
            crate::db::configure_sqlite_connection(&conn_guard)?;
        }

        Ok(Self { conn })
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    pub fn get_config_value(&self, key: &str) -> ConfigResult<Option<String>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let value = conn
            .query_row(
                "SELECT value FROM config_kv WHERE scope_id = ?1 AND key = ?2",
                params![GLOBAL_SCOPE, key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    /// 写入 global scope 的配置值（存在则覆盖）
    pub fn set_config_value(&self, key: &str, value: &str) -> ConfigResult<()> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value) VALUES (?1, ?2, ?3)
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?3, updated_at = datetime('now')",
            params![GLOBAL_SCOPE, key, value],
        )?;
        tracing::info!(config_key = key, value = value, "配置已更新");
        Ok(())
    }

    /// 从 config_kv 表读取配置值，带默认值
    fn get_config_or_default(&self, key: &str, default: &str) -> ConfigResult<String> {
        Ok(self.get_config_value(key)?.unwrap_or_else(|| default.to_string()))
    }

    /// 获取所有配置的快照（JSON格式）
    pub fn get_config_snapshot(&self) -> ConfigResult<String> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let mut stmt =
            conn.prepare("SELECT key, value FROM config_kv WHERE scope_id = ?1 ORDER BY key")?;

        let mut config_map: HashMap<String, String> = HashMap::new();
        let rows = stmt.query_map(params![GLOBAL_SCOPE], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        for row in rows {
            let (key, value) = row?;
            config_map.insert(key, value);
        }

        Ok(serde_json::to_string(&json!(config_map))?)
    }
}

// ==========================================
// LifecycleConfigReader Trait 实现
// ==========================================
#[async_trait]
impl LifecycleConfigReader for ConfigManager {
    async fn get_sweep_interval_hours(&self) -> ConfigResult<u64> {
        let value = self.get_config_or_default(config_keys::SWEEP_INTERVAL_HOURS, "24")?;
        match value.trim().parse::<u64>() {
            Ok(hours) if hours > 0 => Ok(hours),
            _ => {
                tracing::warn!(
                    config_key = config_keys::SWEEP_INTERVAL_HOURS,
                    raw_value = %value,
                    "执行间隔配置无效，使用默认值 24"
                );
                Ok(24)
            }
        }
    }

    async fn get_list_page_size(&self) -> ConfigResult<usize> {
        let value = self.get_config_or_default(config_keys::LIST_PAGE_SIZE, "9")?;
        match value.trim().parse::<usize>() {
            Ok(size) if size > MAX_LIST_PAGE_SIZE => {
                tracing::warn!(
                    config_key = config_keys::LIST_PAGE_SIZE,
                    raw_value = %value,
                    "分页大小超过上限，按 {} 处理",
                    MAX_LIST_PAGE_SIZE
                );
                Ok(MAX_LIST_PAGE_SIZE)
            }
            Ok(size) if size > 0 => Ok(size),
            _ => Ok(9),
        }
    }

    async fn get_notify_ready_for_harvest(&self) -> ConfigResult<bool> {
        let value = self.get_config_or_default(config_keys::NOTIFY_READY_FOR_HARVEST, "true")?;
        match value.trim().to_lowercase().as_str() {
            "false" | "0" | "no" => Ok(false),
            _ => Ok(true),
        }
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 批量转待收获
    pub const SWEEP_INTERVAL_HOURS: &str = "sweep_interval_hours";
    pub const NOTIFY_READY_FOR_HARVEST: &str = "notify_ready_for_harvest";

    // 列表分页
    pub const LIST_PAGE_SIZE: &str = "list_page_size";
}
