// ==========================================
// 农作物种植监测系统 - 种植记录数据仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// 并发控制: 所有面积/状态更新带 revision 检查（单行单写者）
// ==========================================

use crate::db::{DATETIME_FORMAT, DATE_FORMAT};
use crate::domain::action_log::{ActionLog, ActionType};
use crate::domain::area::Area;
use crate::domain::planting::{CropPlanting, PlantingFilter, StatusCounts};
use crate::domain::types::{GrowthStage, PlantingStatus};
use crate::repository::action_log_repo::insert_action_log;
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::{NaiveDate, NaiveDateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::{Arc, Mutex};

pub(crate) const PLANTING_COLUMNS: &str = r#"planting_id, farmer_id, variety_id, technician_id,
       planting_date, expected_harvest_date,
       area_planted, harvested_area, damaged_area, remaining_area,
       status, growth_stage, remarks, municipality, barangay,
       revision, created_at, updated_at"#;

// ==========================================
// SweepOutcome - 批量转待收获结果
// ==========================================
#[derive(Debug, Default)]
pub struct SweepOutcome {
    /// 已提交的记录（revision 已更新）
    pub promoted: Vec<CropPlanting>,
    /// 因 revision 变化被跳过的记录ID
    pub conflicts: Vec<String>,
}

// ==========================================
// CropPlantingRepository - 种植记录仓储
// ==========================================
pub struct CropPlantingRepository {
    conn: Arc<Mutex<Connection>>,
}

impl CropPlantingRepository {
    /// 创建新的CropPlantingRepository实例
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    // ==========================================
    // 写入操作
    // ==========================================

    /// 新建种植记录（同一事务写入操作日志）
    pub fn insert(&self, planting: &CropPlanting, log: &ActionLog) -> RepositoryResult<String> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        tx.execute(
            r#"INSERT INTO crop_planting (
                planting_id, farmer_id, variety_id, technician_id,
                planting_date, expected_harvest_date,
                area_planted, harvested_area, damaged_area, remaining_area,
                status, growth_stage, remarks, municipality, barangay,
                revision, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
            params![
                &planting.planting_id,
                &planting.farmer_id,
                &planting.variety_id,
                &planting.technician_id,
                planting.planting_date.format(DATE_FORMAT).to_string(),
                planting.expected_harvest_date.map(|d| d.format(DATE_FORMAT).to_string()),
                planting.area_planted.hundredths(),
                planting.harvested_area.hundredths(),
                planting.damaged_area.hundredths(),
                planting.remaining_area.hundredths(),
                planting.status.to_db_str(),
                planting.growth_stage.map(|s| s.to_db_str()),
                &planting.remarks,
                &planting.municipality,
                &planting.barangay,
                planting.revision,
                planting.created_at.format(DATETIME_FORMAT).to_string(),
                planting.updated_at.format(DATETIME_FORMAT).to_string(),
            ],
        )?;
        insert_action_log(&tx, log)?;

        tx.commit()?;
        Ok(planting.planting_id.clone())
    }

    /// 更新面积/状态（带乐观锁检查）
    ///
    /// # 返回
    /// - 新的 revision
    pub fn update(&self, planting: &CropPlanting) -> RepositoryResult<i32> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;
        let revision = update_planting_in_tx(&tx, planting)?;
        tx.commit()?;
        Ok(revision)
    }

    /// 批量转为待收获（单事务，逐行 revision 检查）
    ///
    /// revision 冲突的记录跳过并计入 conflicts，其余记录与操作日志一并提交。
    pub fn promote_to_harvest(
        &self,
        plantings: &[CropPlanting],
        actor: &str,
    ) -> RepositoryResult<SweepOutcome> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;
        let mut outcome = SweepOutcome::default();

        for planting in plantings {
            match update_planting_in_tx(&tx, planting) {
                Ok(revision) => {
                    let log = ActionLog::now(
                        ActionType::PromoteToHarvest,
                        actor,
                        Some(&planting.planting_id),
                        None,
                        planting
                            .expected_harvest_date
                            .map(|d| format!("expected_harvest_date={}", d.format(DATE_FORMAT))),
                    );
                    insert_action_log(&tx, &log)?;

                    let mut committed = planting.clone();
                    committed.revision = revision;
                    outcome.promoted.push(committed);
                }
                Err(RepositoryError::OptimisticLockFailure { planting_id, .. }) => {
                    outcome.conflicts.push(planting_id);
                }
                Err(e) => return Err(e),
            }
        }

        tx.commit()?;
        Ok(outcome)
    }

    // ==========================================
    // 查询操作
    // ==========================================

    /// 按ID查询
    pub fn find_by_id(&self, planting_id: &str) -> RepositoryResult<Option<CropPlanting>> {
        let conn = self.get_conn()?;
        find_planting_in(&conn, planting_id)
    }

    /// 按ID查询（不存在则返回 NotFound）
    pub fn get(&self, planting_id: &str) -> RepositoryResult<CropPlanting> {
        self.find_by_id(planting_id)?
            .ok_or_else(|| RepositoryError::not_found("CropPlanting", planting_id))
    }

    /// 条件查询（按种植日期倒序）
    pub fn list(&self, filter: &PlantingFilter) -> RepositoryResult<Vec<CropPlanting>> {
        let conn = self.get_conn()?;

        let sql = format!(
            r#"SELECT {}
               FROM crop_planting
               WHERE (?1 IS NULL OR status = ?1)
                 AND (?2 IS NULL OR technician_id = ?2)
                 AND (?3 IS NULL OR farmer_id = ?3)
               ORDER BY planting_date DESC, created_at DESC"#,
            PLANTING_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let plantings = stmt
            .query_map(
                params![
                    filter.status.map(|s| s.to_db_str()),
                    &filter.technician_id,
                    &filter.farmer_id,
                ],
                map_planting_row,
            )?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(plantings)
    }

    /// 按状态统计
    pub fn count_by_status(&self, technician_id: Option<&str>) -> RepositoryResult<StatusCounts> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(
            r#"SELECT status, COUNT(*)
               FROM crop_planting
               WHERE (?1 IS NULL OR technician_id = ?1)
               GROUP BY status"#,
        )?;
        let rows = stmt.query_map(params![technician_id], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
        })?;

        let mut counts = StatusCounts::default();
        for row in rows {
            let (status, count) = row?;
            match PlantingStatus::from_db_str(&status) {
                Some(status) => counts.add(status, count),
                None => tracing::warn!(status = %status, "未知种植状态，已忽略"),
            }
        }
        Ok(counts)
    }

    /// 查询到期应转为待收获的记录
    pub fn find_due_for_harvest(&self, today: NaiveDate) -> RepositoryResult<Vec<CropPlanting>> {
        let conn = self.get_conn()?;

        let sql = format!(
            r#"SELECT {}
               FROM crop_planting
               WHERE status != 'harvest'
                 AND expected_harvest_date IS NOT NULL
                 AND expected_harvest_date <= ?1
                 AND remaining_area > 0
               ORDER BY expected_harvest_date ASC"#,
            PLANTING_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let plantings = stmt
            .query_map(params![today.format(DATE_FORMAT).to_string()], map_planting_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(plantings)
    }
}

// ==========================================
// 事务内共享操作（供巡查/收获仓储复用）
// ==========================================

/// 事务内按ID查询
pub(crate) fn find_planting_in(conn: &Connection, planting_id: &str) -> RepositoryResult<Option<CropPlanting>> {
    let sql = format!("SELECT {} FROM crop_planting WHERE planting_id = ?", PLANTING_COLUMNS);
    let planting = conn
        .query_row(&sql, params![planting_id], map_planting_row)
        .optional()?;
    Ok(planting)
}

/// 事务内更新种植记录（带乐观锁检查）
///
/// # 错误
/// - `RepositoryError::OptimisticLockFailure`: revision不匹配（其他请求已更新）
/// - `RepositoryError::NotFound`: planting_id不存在
pub(crate) fn update_planting_in_tx(conn: &Connection, planting: &CropPlanting) -> RepositoryResult<i32> {
    let rows_affected = conn.execute(
        r#"UPDATE crop_planting
           SET harvested_area = ?, damaged_area = ?, remaining_area = ?,
               status = ?, growth_stage = ?, updated_at = ?,
               revision = revision + 1
           WHERE planting_id = ? AND revision = ?"#,
        params![
            planting.harvested_area.hundredths(),
            planting.damaged_area.hundredths(),
            planting.remaining_area.hundredths(),
            planting.status.to_db_str(),
            planting.growth_stage.map(|s| s.to_db_str()),
            Utc::now().naive_utc().format(DATETIME_FORMAT).to_string(),
            &planting.planting_id,
            planting.revision,
        ],
    )?;

    if rows_affected == 0 {
        // 判断是记录不存在还是revision冲突
        let actual: Option<i32> = conn
            .query_row(
                "SELECT revision FROM crop_planting WHERE planting_id = ?",
                params![&planting.planting_id],
                |row| row.get(0),
            )
            .optional()?;

        return match actual {
            Some(actual) => Err(RepositoryError::OptimisticLockFailure {
                planting_id: planting.planting_id.clone(),
                expected: planting.revision,
                actual,
            }),
            None => Err(RepositoryError::not_found("CropPlanting", &planting.planting_id)),
        };
    }

    Ok(planting.revision + 1)
}

/// 映射数据库行到CropPlanting对象
pub(crate) fn map_planting_row(row: &rusqlite::Row) -> rusqlite::Result<CropPlanting> {
    let status_str: String = row.get(10)?;
    let status = PlantingStatus::from_db_str(&status_str).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            10,
            Type::Text,
            format!("未知种植状态: {}", status_str).into(),
        )
    })?;

    Ok(CropPlanting {
        planting_id: row.get(0)?,
        farmer_id: row.get(1)?,
        variety_id: row.get(2)?,
        technician_id: row.get(3)?,
        planting_date: parse_date(row, 4)?,
        expected_harvest_date: parse_optional_date(row, 5)?,
        area_planted: Area::from_hundredths(row.get(6)?),
        harvested_area: Area::from_hundredths(row.get(7)?),
        damaged_area: Area::from_hundredths(row.get(8)?),
        remaining_area: Area::from_hundredths(row.get(9)?),
        status,
        growth_stage: row
            .get::<_, Option<String>>(11)?
            .and_then(|s| GrowthStage::from_db_str(&s)),
        remarks: row.get(12)?,
        municipality: row.get(13)?,
        barangay: row.get(14)?,
        revision: row.get(15)?,
        created_at: parse_datetime(row, 16)?,
        updated_at: parse_datetime(row, 17)?,
    })
}

/// 游标分页的 LIMIT / OFFSET（多取一条用于判断下一页）
pub(crate) fn page_bounds(limit: usize, cursor: usize) -> RepositoryResult<(i64, i64)> {
    let limit = limit
        .checked_add(1)
        .and_then(|l| i64::try_from(l).ok())
        .ok_or(RepositoryError::QueryOutOfRange {
            field: "limit",
            value: limit,
        })?;
    let offset = i64::try_from(cursor).map_err(|_| RepositoryError::QueryOutOfRange {
        field: "cursor",
        value: cursor,
    })?;
    Ok((limit, offset))
}

pub(crate) fn parse_date(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<NaiveDate> {
    let s: String = row.get(idx)?;
    NaiveDate::parse_from_str(&s, DATE_FORMAT)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

pub(crate) fn parse_optional_date(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<Option<NaiveDate>> {
    row.get::<_, Option<String>>(idx)?
        .map(|s| {
            NaiveDate::parse_from_str(&s, DATE_FORMAT)
                .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
        })
        .transpose()
}

pub(crate) fn parse_datetime(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<NaiveDateTime> {
    let s: String = row.get(idx)?;
    NaiveDateTime::parse_from_str(&s, DATETIME_FORMAT)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}
