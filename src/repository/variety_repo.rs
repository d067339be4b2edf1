// ==========================================
// 农作物种植监测系统 - 品种主数据仓储
// ==========================================
// 唯一键: (crop_name, name)
// ==========================================

use crate::domain::variety::Variety;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::{Arc, Mutex};

/// 品种写入结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted,
    Updated,
}

// ==========================================
// VarietyRepository - 品种仓储
// ==========================================
pub struct VarietyRepository {
    conn: Arc<Mutex<Connection>>,
}

impl VarietyRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 按ID查询
    pub fn find_by_id(&self, variety_id: &str) -> RepositoryResult<Option<Variety>> {
        let conn = self.get_conn()?;
        let variety = conn
            .query_row(
                "SELECT variety_id, crop_name, name, maturity_days FROM variety WHERE variety_id = ?",
                params![variety_id],
                map_row,
            )
            .optional()?;
        Ok(variety)
    }

    /// 按 (作物, 品种名) 查询
    pub fn find_by_name(&self, crop_name: &str, name: &str) -> RepositoryResult<Option<Variety>> {
        let conn = self.get_conn()?;
        let variety = conn
            .query_row(
                r#"SELECT variety_id, crop_name, name, maturity_days
                   FROM variety
                   WHERE crop_name = ? AND name = ?"#,
                params![crop_name, name],
                map_row,
            )
            .optional()?;
        Ok(variety)
    }

    /// 全部品种（按作物、品种名排序）
    pub fn list(&self) -> RepositoryResult<Vec<Variety>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"SELECT variety_id, crop_name, name, maturity_days
               FROM variety
               ORDER BY crop_name, name"#,
        )?;
        let varieties = stmt
            .query_map([], map_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(varieties)
    }

    /// 批量写入品种（单事务）
    ///
    /// (crop_name, name) 已存在时只更新 maturity_days，保留原 variety_id
    pub fn upsert_batch(&self, varieties: &[Variety]) -> RepositoryResult<Vec<UpsertOutcome>> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;
        let mut outcomes = Vec::with_capacity(varieties.len());

        for variety in varieties {
            let updated = tx.execute(
                "UPDATE variety SET maturity_days = ? WHERE crop_name = ? AND name = ?",
                params![variety.maturity_days, &variety.crop_name, &variety.name],
            )?;

            if updated > 0 {
                outcomes.push(UpsertOutcome::Updated);
            } else {
                tx.execute(
                    "INSERT INTO variety (variety_id, crop_name, name, maturity_days) VALUES (?, ?, ?, ?)",
                    params![
                        &variety.variety_id,
                        &variety.crop_name,
                        &variety.name,
                        variety.maturity_days
                    ],
                )?;
                outcomes.push(UpsertOutcome::Inserted);
            }
        }

        tx.commit()?;
        Ok(outcomes)
    }
}

fn map_row(row: &rusqlite::Row) -> rusqlite::Result<Variety> {
    Ok(Variety {
        variety_id: row.get(0)?,
        crop_name: row.get(1)?,
        name: row.get(2)?,
        maturity_days: row.get(3)?,
    })
}
