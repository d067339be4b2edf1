// ==========================================
// 农作物种植监测系统 - 操作日志数据仓储
// ==========================================
// 红线: 所有写入必须记录
// 红线: Repository 不做业务逻辑,只做数据映射
// ==========================================

use crate::db::DATETIME_FORMAT;
use crate::domain::action_log::{ActionLog, ActionType};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::planting_repo::parse_datetime;
use rusqlite::types::Type;
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex};

// ==========================================
// ActionLogRepository - 操作日志仓储
// ==========================================
pub struct ActionLogRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ActionLogRepository {
    /// 创建新的操作日志仓储
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 插入操作日志（独立写入，用于不涉及种植记录的操作）
    pub fn insert(&self, log: &ActionLog) -> RepositoryResult<String> {
        let conn = self.get_conn()?;
        insert_action_log(&conn, log)?;
        Ok(log.action_id.clone())
    }

    /// 查询种植记录的操作日志（按时间倒序）
    pub fn find_by_planting(&self, planting_id: &str) -> RepositoryResult<Vec<ActionLog>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(
            r#"SELECT action_id, action_type, action_ts, actor,
                      planting_id, payload_json, detail
               FROM action_log
               WHERE planting_id = ?
               ORDER BY action_ts DESC, rowid DESC"#,
        )?;

        let logs = stmt
            .query_map(params![planting_id], map_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(logs)
    }

    /// 查询最近的操作日志
    pub fn find_recent(&self, limit: usize) -> RepositoryResult<Vec<ActionLog>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(
            r#"SELECT action_id, action_type, action_ts, actor,
                      planting_id, payload_json, detail
               FROM action_log
               ORDER BY action_ts DESC, rowid DESC
               LIMIT ?"#,
        )?;

        let logs = stmt
            .query_map(params![limit as i64], map_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(logs)
    }
}

/// 在给定连接/事务内写入操作日志
pub(crate) fn insert_action_log(conn: &Connection, log: &ActionLog) -> RepositoryResult<()> {
    conn.execute(
        r#"INSERT INTO action_log (
            action_id, action_type, action_ts, actor,
            planting_id, payload_json, detail
        ) VALUES (?, ?, ?, ?, ?, ?, ?)"#,
        params![
            log.action_id,
            log.action_type.as_str(),
            log.action_ts.format(DATETIME_FORMAT).to_string(),
            log.actor,
            log.planting_id,
            log.payload_json.as_ref().map(|v| v.to_string()),
            log.detail,
        ],
    )?;
    Ok(())
}

fn map_row(row: &rusqlite::Row) -> rusqlite::Result<ActionLog> {
    let action_type_str: String = row.get(1)?;
    let action_type = ActionType::from_str(&action_type_str).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            1,
            Type::Text,
            format!("未知操作类型: {}", action_type_str).into(),
        )
    })?;

    Ok(ActionLog {
        action_id: row.get(0)?,
        action_type,
        action_ts: parse_datetime(row, 2)?,
        actor: row.get(3)?,
        planting_id: row.get(4)?,
        payload_json: row
            .get::<_, Option<String>>(5)?
            .and_then(|s| serde_json::from_str(&s).ok()),
        detail: row.get(6)?,
    })
}
