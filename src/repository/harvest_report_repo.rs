// ==========================================
// 农作物种植监测系统 - 收获报告数据仓储
// ==========================================
// 红线: 收获报告只追加；与种植记录面积/状态更新同一事务提交
// ==========================================

use crate::db::{DATETIME_FORMAT, DATE_FORMAT};
use crate::domain::action_log::ActionLog;
use crate::domain::area::Area;
use crate::domain::field_event::{EventQuery, HarvestReport};
use crate::domain::planting::CropPlanting;
use crate::repository::action_log_repo::insert_action_log;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::planting_repo::{
    page_bounds, parse_date, parse_datetime, update_planting_in_tx,
};
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::{Arc, Mutex};

// ==========================================
// HarvestReportRepository - 收获报告仓储
// ==========================================
pub struct HarvestReportRepository {
    conn: Arc<Mutex<Connection>>,
}

impl HarvestReportRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 登记收获（原子操作）
    ///
    /// # 返回
    /// - 种植记录新的 revision
    pub fn record(
        &self,
        report: &HarvestReport,
        updated_planting: &CropPlanting,
        log: &ActionLog,
    ) -> RepositoryResult<i32> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        let revision = update_planting_in_tx(&tx, updated_planting)?;

        tx.execute(
            r#"INSERT INTO harvest_report (
                report_id, planting_id, technician_id, harvest_date,
                area_harvested, total_yield, profit, damage_quantity, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
            params![
                &report.report_id,
                &report.planting_id,
                &report.technician_id,
                report.harvest_date.format(DATE_FORMAT).to_string(),
                report.area_harvested.hundredths(),
                report.total_yield,
                report.profit,
                report.damage_quantity,
                report.created_at.format(DATETIME_FORMAT).to_string(),
            ],
        )?;
        insert_action_log(&tx, log)?;

        tx.commit()?;
        Ok(revision)
    }

    pub fn find_by_id(&self, report_id: &str) -> RepositoryResult<Option<HarvestReport>> {
        let conn = self.get_conn()?;

        let report = conn
            .query_row(
                r#"SELECT report_id, planting_id, technician_id, harvest_date,
                          area_harvested, total_yield, profit, damage_quantity, created_at
                   FROM harvest_report
                   WHERE report_id = ?"#,
                params![report_id],
                map_row,
            )
            .optional()?;
        Ok(report)
    }

    /// 条件查询（按收获日期倒序，游标分页）
    ///
    /// - owner_technician_id: 仅返回该技术员负责的种植记录下的事件
    ///
    /// 返回至多 limit + 1 条，由调用方判断是否存在下一页
    pub fn list(
        &self,
        query: &EventQuery,
        owner_technician_id: Option<&str>,
        limit: usize,
    ) -> RepositoryResult<Vec<HarvestReport>> {
        let (limit, offset) = page_bounds(limit, query.cursor)?;
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(
            r#"SELECT report_id, planting_id, technician_id, harvest_date,
                      area_harvested, total_yield, profit, damage_quantity, created_at
               FROM harvest_report
               WHERE (?1 IS NULL OR planting_id = ?1)
                 AND (?2 IS NULL OR technician_id = ?2)
                 AND (?3 IS NULL OR harvest_date >= ?3)
                 AND (?4 IS NULL OR harvest_date <= ?4)
                 AND (?7 IS NULL OR planting_id IN (
                        SELECT planting_id FROM crop_planting WHERE technician_id = ?7))
               ORDER BY harvest_date DESC, created_at DESC
               LIMIT ?5 OFFSET ?6"#,
        )?;

        let reports = stmt
            .query_map(
                params![
                    &query.planting_id,
                    &query.technician_id,
                    query.date_from.map(|d| d.format(DATE_FORMAT).to_string()),
                    query.date_to.map(|d| d.format(DATE_FORMAT).to_string()),
                    limit,
                    offset,
                    owner_technician_id,
                ],
                map_row,
            )?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(reports)
    }

    /// 种植记录累计收获面积（用于核对）
    pub fn total_harvested_area(&self, planting_id: &str) -> RepositoryResult<Area> {
        let conn = self.get_conn()?;
        let total: i64 = conn.query_row(
            "SELECT COALESCE(SUM(area_harvested), 0) FROM harvest_report WHERE planting_id = ?",
            params![planting_id],
            |row| row.get(0),
        )?;
        Ok(Area::from_hundredths(total))
    }
}

fn map_row(row: &rusqlite::Row) -> rusqlite::Result<HarvestReport> {
    Ok(HarvestReport {
        report_id: row.get(0)?,
        planting_id: row.get(1)?,
        technician_id: row.get(2)?,
        harvest_date: parse_date(row, 3)?,
        area_harvested: Area::from_hundredths(row.get(4)?),
        total_yield: row.get(5)?,
        profit: row.get(6)?,
        damage_quantity: row.get(7)?,
        created_at: parse_datetime(row, 8)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::action_log::ActionType;
    use crate::domain::types::PlantingStatus;
    use crate::repository::planting_repo::tests::{make_planting, setup_test_db};
    use crate::repository::planting_repo::CropPlantingRepository;
    use chrono::{NaiveDate, Utc};

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 7, d).unwrap()
    }

    fn harvest(
        repo: &HarvestReportRepository,
        mut planting: CropPlanting,
        id: &str,
        date: NaiveDate,
        hundredths: i64,
    ) -> CropPlanting {
        let area = Area::from_hundredths(hundredths);
        planting.harvested_area = planting.harvested_area + area;
        planting.remaining_area = planting.remaining_area - area;
        planting.status = PlantingStatus::PartiallyHarvested;
        let report = HarvestReport {
            report_id: id.to_string(),
            planting_id: planting.planting_id.clone(),
            technician_id: "T001".to_string(),
            harvest_date: date,
            area_harvested: area,
            total_yield: 2.5,
            profit: 0.0,
            damage_quantity: 0.0,
            created_at: Utc::now().naive_utc(),
        };
        let log = ActionLog::now(ActionType::RecordHarvest, "T001", Some(&planting.planting_id), None, None);
        planting.revision = repo.record(&report, &planting, &log).unwrap();
        planting
    }

    #[test]
    fn test_list_filters_and_totals() {
        let conn = setup_test_db();
        let plantings = CropPlantingRepository::new(conn.clone());
        let repo = HarvestReportRepository::new(conn);

        let mut a = make_planting("PA", "T001", PlantingStatus::Harvest, None);
        let b = make_planting("PB", "T002", PlantingStatus::Harvest, None);
        for p in [&a, &b] {
            let log = ActionLog::now(ActionType::CreatePlanting, "T001", Some(&p.planting_id), None, None);
            plantings.insert(p, &log).unwrap();
        }
        a = harvest(&repo, a, "H1", day(20), 100);
        a = harvest(&repo, a, "H2", day(25), 150);
        harvest(&repo, b, "H3", day(22), 50);

        let stored = plantings.get("PA").unwrap();
        assert_eq!(stored.revision, a.revision);
        assert_eq!(stored.harvested_area, Area::from_hundredths(250));
        assert!(stored.is_balanced());

        let ranged = repo
            .list(
                &EventQuery {
                    date_from: Some(day(21)),
                    date_to: Some(day(25)),
                    ..Default::default()
                },
                None,
                10,
            )
            .unwrap();
        let ids: Vec<&str> = ranged.iter().map(|r| r.report_id.as_str()).collect();
        assert_eq!(ids, vec!["H2", "H3"]);

        let owned = repo.list(&EventQuery::default(), Some("T001"), 10).unwrap();
        let ids: Vec<&str> = owned.iter().map(|r| r.report_id.as_str()).collect();
        assert_eq!(ids, vec!["H2", "H1"]);

        assert!(repo.find_by_id("H1").unwrap().is_some());
        assert_eq!(repo.total_harvested_area("PA").unwrap(), Area::from_hundredths(250));
    }

    #[test]
    fn test_stale_planting_leaves_no_report() {
        let conn = setup_test_db();
        let plantings = CropPlantingRepository::new(conn.clone());
        let repo = HarvestReportRepository::new(conn);

        let planting = make_planting("PA", "T001", PlantingStatus::Harvest, None);
        let log = ActionLog::now(ActionType::CreatePlanting, "T001", Some("PA"), None, None);
        plantings.insert(&planting, &log).unwrap();
        let stale = planting.clone();
        harvest(&repo, planting, "H1", day(20), 100);

        let mut updated = stale.clone();
        updated.harvested_area = Area::from_hundredths(100);
        updated.remaining_area = updated.remaining_area - Area::from_hundredths(100);
        let report = HarvestReport {
            report_id: "H-stale".to_string(),
            planting_id: "PA".to_string(),
            technician_id: "T001".to_string(),
            harvest_date: day(21),
            area_harvested: Area::from_hundredths(100),
            total_yield: 1.0,
            profit: 0.0,
            damage_quantity: 0.0,
            created_at: Utc::now().naive_utc(),
        };
        let log = ActionLog::now(ActionType::RecordHarvest, "T001", Some("PA"), None, None);
        assert!(matches!(
            repo.record(&report, &updated, &log),
            Err(RepositoryError::OptimisticLockFailure { .. })
        ));
        assert!(repo.find_by_id("H-stale").unwrap().is_none());
    }
}
