// ==========================================
// 农作物种植监测系统 - 巡查记录数据仓储
// ==========================================
// 红线: 巡查记录只追加；与种植记录面积更新同一事务提交
// ==========================================

use crate::db::{DATETIME_FORMAT, DATE_FORMAT};
use crate::domain::action_log::ActionLog;
use crate::domain::area::Area;
use crate::domain::field_event::{EventQuery, Inspection};
use crate::domain::planting::CropPlanting;
use crate::domain::types::GrowthStage;
use crate::repository::action_log_repo::insert_action_log;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::planting_repo::{
    page_bounds, parse_date, parse_datetime, update_planting_in_tx,
};
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::{Arc, Mutex};

// ==========================================
// InspectionRepository - 巡查记录仓储
// ==========================================
pub struct InspectionRepository {
    conn: Arc<Mutex<Connection>>,
}

impl InspectionRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 登记巡查（原子操作）
    ///
    /// # 红线
    /// - 种植记录更新（revision 检查）、巡查插入、操作日志必须同一事务
    /// - revision 冲突时整体回滚，不留下巡查记录
    ///
    /// # 返回
    /// - 种植记录新的 revision
    pub fn record(
        &self,
        inspection: &Inspection,
        updated_planting: &CropPlanting,
        log: &ActionLog,
    ) -> RepositoryResult<i32> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        let revision = update_planting_in_tx(&tx, updated_planting)?;

        tx.execute(
            r#"INSERT INTO crop_inspection (
                inspection_id, planting_id, technician_id, inspection_date,
                remarks, damaged_area, growth_stage, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)"#,
            params![
                &inspection.inspection_id,
                &inspection.planting_id,
                &inspection.technician_id,
                inspection.inspection_date.format(DATE_FORMAT).to_string(),
                &inspection.remarks,
                inspection.damaged_area.hundredths(),
                inspection.growth_stage.map(|s| s.to_db_str()),
                inspection.created_at.format(DATETIME_FORMAT).to_string(),
            ],
        )?;
        insert_action_log(&tx, log)?;

        tx.commit()?;
        Ok(revision)
    }

    /// 按ID查询
    pub fn find_by_id(&self, inspection_id: &str) -> RepositoryResult<Option<Inspection>> {
        let conn = self.get_conn()?;

        let inspection = conn
            .query_row(
                r#"SELECT inspection_id, planting_id, technician_id, inspection_date,
                          remarks, damaged_area, growth_stage, created_at
                   FROM crop_inspection
                   WHERE inspection_id = ?"#,
                params![inspection_id],
                map_row,
            )
            .optional()?;
        Ok(inspection)
    }

    /// 条件查询（按巡查日期倒序，游标分页）
    ///
    /// - owner_technician_id: 仅返回该技术员负责的种植记录下的事件
    ///
    /// 返回至多 limit + 1 条，由调用方判断是否存在下一页
    pub fn list(
        &self,
        query: &EventQuery,
        owner_technician_id: Option<&str>,
        limit: usize,
    ) -> RepositoryResult<Vec<Inspection>> {
        let (limit, offset) = page_bounds(limit, query.cursor)?;
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(
            r#"SELECT inspection_id, planting_id, technician_id, inspection_date,
                      remarks, damaged_area, growth_stage, created_at
               FROM crop_inspection
               WHERE (?1 IS NULL OR planting_id = ?1)
                 AND (?2 IS NULL OR technician_id = ?2)
                 AND (?3 IS NULL OR inspection_date >= ?3)
                 AND (?4 IS NULL OR inspection_date <= ?4)
                 AND (?7 IS NULL OR planting_id IN (
                        SELECT planting_id FROM crop_planting WHERE technician_id = ?7))
               ORDER BY inspection_date DESC, created_at DESC
               LIMIT ?5 OFFSET ?6"#,
        )?;

        let inspections = stmt
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

        Ok(inspections)
    }

    /// 种植记录累计受损面积（用于核对）
    pub fn total_damaged_area(&self, planting_id: &str) -> RepositoryResult<Area> {
        let conn = self.get_conn()?;
        let total: i64 = conn.query_row(
            "SELECT COALESCE(SUM(damaged_area), 0) FROM crop_inspection WHERE planting_id = ?",
            params![planting_id],
            |row| row.get(0),
        )?;
        Ok(Area::from_hundredths(total))
    }
}

fn map_row(row: &rusqlite::Row) -> rusqlite::Result<Inspection> {
    Ok(Inspection {
        inspection_id: row.get(0)?,
        planting_id: row.get(1)?,
        technician_id: row.get(2)?,
        inspection_date: parse_date(row, 3)?,
        remarks: row.get(4)?,
        damaged_area: Area::from_hundredths(row.get(5)?),
        growth_stage: row
            .get::<_, Option<String>>(6)?
            .and_then(|s| GrowthStage::from_db_str(&s)),
        created_at: parse_datetime(row, 7)?,
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
        NaiveDate::from_ymd_opt(2025, 5, d).unwrap()
    }

    /// 向种植记录追加一条巡查，返回更新后的种植记录
    fn inspect(repo: &InspectionRepository, mut planting: CropPlanting, id: &str, date: NaiveDate) -> CropPlanting {
        let damaged = Area::from_hundredths(10);
        planting.damaged_area = planting.damaged_area + damaged;
        planting.remaining_area = planting.remaining_area - damaged;
        let inspection = Inspection {
            inspection_id: id.to_string(),
            planting_id: planting.planting_id.clone(),
            technician_id: planting.technician_id.clone(),
            inspection_date: date,
            remarks: "aphids".to_string(),
            damaged_area: damaged,
            growth_stage: Some(GrowthStage::Vegetative),
            created_at: Utc::now().naive_utc(),
        };
        let log = ActionLog::now(ActionType::RecordInspection, "T001", Some(&planting.planting_id), None, None);
        planting.revision = repo.record(&inspection, &planting, &log).unwrap();
        planting
    }

    #[test]
    fn test_list_filters_and_totals() {
        let conn = setup_test_db();
        let plantings = CropPlantingRepository::new(conn.clone());
        let repo = InspectionRepository::new(conn);

        let mut a = make_planting("PA", "T001", PlantingStatus::Standing, None);
        let mut b = make_planting("PB", "T002", PlantingStatus::Standing, None);
        for p in [&a, &b] {
            let log = ActionLog::now(ActionType::CreatePlanting, "T001", Some(&p.planting_id), None, None);
            plantings.insert(p, &log).unwrap();
        }
        a = inspect(&repo, a, "I1", day(1));
        a = inspect(&repo, a, "I2", day(5));
        a = inspect(&repo, a, "I3", day(9));
        b = inspect(&repo, b, "I4", day(5));
        assert_eq!(a.revision, 3);
        assert_eq!(b.revision, 1);

        // 按种植记录 + 日期区间
        let ranged = repo
            .list(
                &EventQuery {
                    planting_id: Some("PA".to_string()),
                    date_from: Some(day(2)),
                    date_to: Some(day(9)),
                    ..Default::default()
                },
                None,
                10,
            )
            .unwrap();
        let ids: Vec<&str> = ranged.iter().map(|i| i.inspection_id.as_str()).collect();
        assert_eq!(ids, vec!["I3", "I2"]);

        // 按负责技术员
        let owned = repo.list(&EventQuery::default(), Some("T002"), 10).unwrap();
        assert_eq!(owned.len(), 1);
        assert_eq!(owned[0].inspection_id, "I4");
        assert_eq!(owned[0].growth_stage, Some(GrowthStage::Vegetative));

        // limit + 1 条，游标偏移
        let first = repo.list(&EventQuery::default(), None, 2).unwrap();
        assert_eq!(first.len(), 3);
        let rest = repo
            .list(&EventQuery { cursor: 2, ..Default::default() }, None, 2)
            .unwrap();
        assert_eq!(rest.len(), 2);

        assert_eq!(repo.total_damaged_area("PA").unwrap(), Area::from_hundredths(30));
        assert_eq!(repo.total_damaged_area("none").unwrap(), Area::ZERO);
    }

    #[test]
    fn test_list_rejects_out_of_range_paging() {
        let repo = InspectionRepository::new(setup_test_db());
        assert!(matches!(
            repo.list(&EventQuery { cursor: usize::MAX, ..Default::default() }, None, 9),
            Err(RepositoryError::QueryOutOfRange { field: "cursor", .. })
        ));
        assert!(matches!(
            repo.list(&EventQuery::default(), None, usize::MAX),
            Err(RepositoryError::QueryOutOfRange { field: "limit", .. })
        ));
    }
}
