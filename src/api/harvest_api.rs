// ==========================================
// 农作物种植监测系统 - 收获登记 API
// ==========================================
// 职责: 登记收获（扣减剩余面积、推进状态）、收获报告列表
// 红线: 收获报告、种植记录、操作日志同一事务提交（revision 保护）
// ==========================================
// 状态: harvest / partially harvested → partially harvested / harvested
// ==========================================

use std::sync::Arc;

use chrono::Utc;
use serde_json::json;
use tracing::{info, instrument, warn};

use crate::api::error::{ApiError, ApiResult};
use crate::api::validator::{
    require_capability, require_non_negative, require_planting_access, require_valid_event_query,
};
use crate::config::LifecycleConfigReader;
use crate::domain::access::{Actor, Capability};
use crate::domain::action_log::{ActionLog, ActionType};
use crate::domain::area::Area;
use crate::domain::field_event::{EventPage, EventQuery, HarvestReport, NewHarvestReport};
use crate::engine::events::{OptionalEventPublisher, PlantingEvent, PlantingEventType};
use crate::engine::lifecycle::PlantingLifecycle;
use crate::repository::harvest_report_repo::HarvestReportRepository;
use crate::repository::planting_repo::CropPlantingRepository;

// ==========================================
// HarvestApi - 收获登记 API
// ==========================================
pub struct HarvestApi {
    planting_repo: Arc<CropPlantingRepository>,
    report_repo: Arc<HarvestReportRepository>,
    config: Arc<dyn LifecycleConfigReader>,
    publisher: Arc<OptionalEventPublisher>,
}

impl HarvestApi {
    pub fn new(
        planting_repo: Arc<CropPlantingRepository>,
        report_repo: Arc<HarvestReportRepository>,
        config: Arc<dyn LifecycleConfigReader>,
        publisher: Arc<OptionalEventPublisher>,
    ) -> Self {
        Self {
            planting_repo,
            report_repo,
            config,
            publisher,
        }
    }

    /// 登记收获
    ///
    /// # 错误
    /// - `ApiError::InvalidAmount`: 收获面积 ≤ 0
    /// - `ApiError::NotHarvestable`: 状态不是 harvest / partially harvested
    /// - `ApiError::ExceedsRemainingArea`: 收获面积超过剩余面积
    /// - `ApiError::ConflictRetry`: 种植记录已被其他请求修改
    #[instrument(skip(self, actor, request), fields(actor = %actor.actor_id, planting_id = %request.planting_id))]
    pub fn record(&self, actor: &Actor, request: NewHarvestReport) -> ApiResult<HarvestReport> {
        require_capability(actor, Capability::CreateHarvestReports)?;

        let profit = request.profit.unwrap_or(0.0);
        let damage_quantity = request.damage_quantity.unwrap_or(0.0);
        require_non_negative("total_yield", request.total_yield)?;
        require_non_negative("profit", profit)?;
        require_non_negative("damage_quantity", damage_quantity)?;

        let mut planting = self.planting_repo.get(&request.planting_id)?;
        require_planting_access(actor, &planting)?;

        let area_harvested = Area::from_hectares(request.area_harvested_ha);
        let status = PlantingLifecycle::apply_harvest(&mut planting, area_harvested)?;

        let report = HarvestReport {
            report_id: uuid::Uuid::new_v4().to_string(),
            planting_id: planting.planting_id.clone(),
            technician_id: actor.actor_id.clone(),
            harvest_date: request.harvest_date,
            area_harvested,
            total_yield: request.total_yield,
            profit,
            damage_quantity,
            created_at: Utc::now().naive_utc(),
        };

        let log = ActionLog::now(
            ActionType::RecordHarvest,
            &actor.actor_id,
            Some(&planting.planting_id),
            Some(json!({
                "report_id": report.report_id,
                "area_harvested": area_harvested,
                "remaining_area": planting.remaining_area,
                "total_yield": report.total_yield,
                "status": status,
            })),
            Some(status.to_db_str().to_string()),
        );

        let revision = self.report_repo.record(&report, &planting, &log)?;

        info!(
            report_id = %report.report_id,
            harvested = %area_harvested,
            remaining = %planting.remaining_area,
            status = %status,
            revision = revision,
            "收获已登记"
        );

        let event = PlantingEvent {
            planting_id: planting.planting_id.clone(),
            event_type: PlantingEventType::HarvestRecorded,
            technician_id: planting.technician_id.clone(),
            remaining_area: planting.remaining_area,
            event_date: report.harvest_date,
            location: Some(format!("{}, {}", planting.barangay, planting.municipality)),
        };
        if let Err(e) = self.publisher.publish(event) {
            warn!(planting_id = %planting.planting_id, error = %e, "收获事件发布失败");
        }

        Ok(report)
    }

    /// 收获报告列表（按收获日期倒序，游标分页）
    pub async fn list(&self, actor: &Actor, query: EventQuery) -> ApiResult<EventPage<HarvestReport>> {
        require_capability(actor, Capability::ViewReports)?;
        require_valid_event_query(&query)?;

        let page_size = self
            .config
            .get_list_page_size()
            .await
            .map_err(|e| ApiError::ConfigError(e.to_string()))?;

        let rows = self
            .report_repo
            .list(&query, actor.scoped_technician(), page_size)?;
        Ok(EventPage::from_rows(rows, query.cursor, page_size))
    }
}
