// ==========================================
// 农作物种植监测系统 - 巡查登记 API
// ==========================================
// 职责: 登记巡查（扣减受损面积）、巡查列表
// 红线: 巡查记录、种植记录、操作日志同一事务提交（revision 保护）
// ==========================================
// 状态: 仅 standing 状态可巡查；受损不改变状态
// ==========================================

use std::sync::Arc;

use chrono::Utc;
use serde_json::json;
use tracing::{info, instrument, warn};

use crate::api::error::{ApiError, ApiResult};
use crate::api::validator::{
    require_capability, require_non_blank, require_planting_access, require_valid_event_query,
};
use crate::config::LifecycleConfigReader;
use crate::domain::access::{Actor, Capability};
use crate::domain::action_log::{ActionLog, ActionType};
use crate::domain::area::Area;
use crate::domain::field_event::{EventPage, EventQuery, Inspection, NewInspection};
use crate::engine::events::{OptionalEventPublisher, PlantingEvent, PlantingEventType};
use crate::engine::lifecycle::PlantingLifecycle;
use crate::repository::inspection_repo::InspectionRepository;
use crate::repository::planting_repo::CropPlantingRepository;

// ==========================================
// InspectionApi - 巡查登记 API
// ==========================================
pub struct InspectionApi {
    planting_repo: Arc<CropPlantingRepository>,
    inspection_repo: Arc<InspectionRepository>,
    config: Arc<dyn LifecycleConfigReader>,
    publisher: Arc<OptionalEventPublisher>,
}

impl InspectionApi {
    pub fn new(
        planting_repo: Arc<CropPlantingRepository>,
        inspection_repo: Arc<InspectionRepository>,
        config: Arc<dyn LifecycleConfigReader>,
        publisher: Arc<OptionalEventPublisher>,
    ) -> Self {
        Self {
            planting_repo,
            inspection_repo,
            config,
            publisher,
        }
    }

    /// 登记巡查
    ///
    /// # 流程
    /// 1. 能力检查（CreateInspections）与数据范围检查
    /// 2. 状态检查（必须 standing）
    /// 3. 扣减受损面积（> 0 且 ≤ 剩余面积）
    /// 4. 同一事务写入巡查、种植记录（revision 检查）、操作日志
    ///
    /// # 错误
    /// - `ApiError::NotInspectable`: 状态不是 standing
    /// - `ApiError::InvalidAmount` / `ApiError::ExceedsRemainingArea`: 面积校验失败
    /// - `ApiError::ConflictRetry`: 种植记录已被其他请求修改
    #[instrument(skip(self, actor, request), fields(actor = %actor.actor_id, planting_id = %request.planting_id))]
    pub fn record(&self, actor: &Actor, request: NewInspection) -> ApiResult<Inspection> {
        require_capability(actor, Capability::CreateInspections)?;
        require_non_blank("remarks", &request.remarks)?;

        let mut planting = self.planting_repo.get(&request.planting_id)?;
        require_planting_access(actor, &planting)?;

        if !planting.is_inspectable() {
            return Err(ApiError::NotInspectable {
                status: planting.status,
            });
        }

        let damaged_area = Area::from_hectares(request.damaged_area_ha);
        PlantingLifecycle::apply_damage(&mut planting, damaged_area)?;
        if let Some(stage) = request.growth_stage {
            planting.growth_stage = Some(stage);
        }

        let inspection = Inspection {
            inspection_id: uuid::Uuid::new_v4().to_string(),
            planting_id: planting.planting_id.clone(),
            technician_id: actor.actor_id.clone(),
            inspection_date: request.inspection_date,
            remarks: request.remarks,
            damaged_area,
            growth_stage: request.growth_stage,
            created_at: Utc::now().naive_utc(),
        };

        let log = ActionLog::now(
            ActionType::RecordInspection,
            &actor.actor_id,
            Some(&planting.planting_id),
            Some(json!({
                "inspection_id": inspection.inspection_id,
                "damaged_area": damaged_area,
                "remaining_area": planting.remaining_area,
                "growth_stage": inspection.growth_stage,
            })),
            None,
        );

        let revision = self.inspection_repo.record(&inspection, &planting, &log)?;

        info!(
            inspection_id = %inspection.inspection_id,
            damaged = %damaged_area,
            remaining = %planting.remaining_area,
            revision = revision,
            "巡查已登记"
        );

        let event = PlantingEvent {
            planting_id: planting.planting_id.clone(),
            event_type: PlantingEventType::InspectionRecorded,
            technician_id: planting.technician_id.clone(),
            remaining_area: planting.remaining_area,
            event_date: inspection.inspection_date,
            location: Some(format!("{}, {}", planting.barangay, planting.municipality)),
        };
        if let Err(e) = self.publisher.publish(event) {
            warn!(planting_id = %planting.planting_id, error = %e, "巡查事件发布失败");
        }

        Ok(inspection)
    }

    /// 巡查列表（按巡查日期倒序，游标分页）
    pub async fn list(&self, actor: &Actor, query: EventQuery) -> ApiResult<EventPage<Inspection>> {
        require_capability(actor, Capability::ViewInspections)?;
        require_valid_event_query(&query)?;

        let page_size = self
            .config
            .get_list_page_size()
            .await
            .map_err(|e| ApiError::ConfigError(e.to_string()))?;

        let rows = self
            .inspection_repo
            .list(&query, actor.scoped_technician(), page_size)?;
        Ok(EventPage::from_rows(rows, query.cursor, page_size))
    }
}
