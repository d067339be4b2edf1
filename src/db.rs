// ==========================================
// 农作物种植监测系统 - SQLite 连接初始化
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为
// - 统一 busy_timeout，减少并发写入时的偶发 busy 错误
// - 幂等建表（schema_version 记录当前版本）
// ==========================================

use rusqlite::Connection;
use rusqlite::OptionalExtension;
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 当前代码所期望的 schema_version
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

/// 日期存储格式
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// 时间戳存储格式
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明：
/// - foreign_keys 需要“每个连接”单独开启
/// - busy_timeout 需要“每个连接”单独配置
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 初始化数据库 schema（幂等）
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS config_kv (
            scope_id TEXT NOT NULL,
            key TEXT NOT NULL,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL DEFAULT (datetime('now')),
            PRIMARY KEY (scope_id, key)
        );

        CREATE TABLE IF NOT EXISTS variety (
            variety_id TEXT PRIMARY KEY,
            crop_name TEXT NOT NULL,
            name TEXT NOT NULL,
            maturity_days INTEGER,
            UNIQUE(crop_name, name)
        );

        CREATE TABLE IF NOT EXISTS crop_planting (
            planting_id TEXT PRIMARY KEY,
            farmer_id TEXT NOT NULL,
            variety_id TEXT REFERENCES variety(variety_id),
            technician_id TEXT NOT NULL,
            planting_date TEXT NOT NULL,
            expected_harvest_date TEXT,
            area_planted INTEGER NOT NULL CHECK (area_planted >= 0),
            harvested_area INTEGER NOT NULL DEFAULT 0 CHECK (harvested_area >= 0),
            damaged_area INTEGER NOT NULL DEFAULT 0 CHECK (damaged_area >= 0),
            remaining_area INTEGER NOT NULL CHECK (remaining_area >= 0),
            status TEXT NOT NULL CHECK (status IN ('standing', 'harvest', 'partially harvested', 'harvested')),
            growth_stage TEXT,
            remarks TEXT NOT NULL,
            municipality TEXT NOT NULL,
            barangay TEXT NOT NULL,
            revision INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            CHECK (area_planted = harvested_area + damaged_area + remaining_area)
        );

        CREATE INDEX IF NOT EXISTS idx_crop_planting_status
            ON crop_planting(status, expected_harvest_date);
        CREATE INDEX IF NOT EXISTS idx_crop_planting_technician
            ON crop_planting(technician_id);

        CREATE TABLE IF NOT EXISTS crop_inspection (
            inspection_id TEXT PRIMARY KEY,
            planting_id TEXT NOT NULL REFERENCES crop_planting(planting_id) ON DELETE CASCADE,
            technician_id TEXT NOT NULL,
            inspection_date TEXT NOT NULL,
            remarks TEXT NOT NULL,
            damaged_area INTEGER NOT NULL CHECK (damaged_area > 0),
            growth_stage TEXT,
            created_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_crop_inspection_planting
            ON crop_inspection(planting_id, inspection_date);

        CREATE TABLE IF NOT EXISTS harvest_report (
            report_id TEXT PRIMARY KEY,
            planting_id TEXT NOT NULL REFERENCES crop_planting(planting_id) ON DELETE CASCADE,
            technician_id TEXT NOT NULL,
            harvest_date TEXT NOT NULL,
            area_harvested INTEGER NOT NULL CHECK (area_harvested > 0),
            total_yield REAL NOT NULL,
            profit REAL NOT NULL DEFAULT 0,
            damage_quantity REAL NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_harvest_report_planting
            ON harvest_report(planting_id, harvest_date);

        CREATE TABLE IF NOT EXISTS action_log (
            action_id TEXT PRIMARY KEY,
            action_type TEXT NOT NULL,
            action_ts TEXT NOT NULL,
            actor TEXT NOT NULL,
            planting_id TEXT,
            payload_json TEXT,
            detail TEXT
        );

        CREATE INDEX IF NOT EXISTS idx_action_log_planting
            ON action_log(planting_id, action_ts);
        "#,
    )?;

    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
        [CURRENT_SCHEMA_VERSION],
    )?;

    Ok(())
}

/// 读取 schema_version（若表不存在则返回 None）
pub fn read_schema_version(conn: &Connection) -> rusqlite::Result<Option<i64>> {
    let has_table: bool = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version' LIMIT 1",
            [],
            |_row| Ok(true),
        )
        .optional()?
        .unwrap_or(false);

    if !has_table {
        return Ok(None);
    }

    let v: Option<i64> = conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
    Ok(v)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_schema_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        configure_sqlite_connection(&conn).unwrap();

        assert_eq!(read_schema_version(&conn).unwrap(), None);

        init_schema(&conn).unwrap();
        init_schema(&conn).unwrap();

        assert_eq!(read_schema_version(&conn).unwrap(), Some(CURRENT_SCHEMA_VERSION));
    }

    #[test]
    fn test_area_balance_enforced_by_schema() {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();

        let result = conn.execute(
            r#"INSERT INTO crop_planting (
                planting_id, farmer_id, technician_id, planting_date,
                area_planted, harvested_area, damaged_area, remaining_area,
                status, remarks, municipality, barangay, created_at, updated_at
            ) VALUES ('P1', 'F1', 'T1', '2025-04-01', 1000, 0, 0, 900,
                      'standing', '', '', '', '2025-04-01 00:00:00', '2025-04-01 00:00:00')"#,
            [],
        );
        assert!(result.is_err());
    }
}
