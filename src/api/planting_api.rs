// ==========================================
// 农作物种植监测系统 - 种植记录 API
// ==========================================
// 职责: 种植记录新建、查询、状态统计；品种查询
// 红线: 所有写入记录操作日志；按操作人数据范围过滤
// ==========================================

use std::sync::Arc;

use serde_json::json;
use tracing::{info, instrument};

use crate::api::error::{ApiError, ApiResult};
use crate::api::validator::{require_capability, require_non_blank, require_planting_access};
use crate::domain::access::{AccessScope, Actor, Capability};
use crate::domain::action_log::{ActionLog, ActionType};
use crate::domain::planting::{CropPlanting, NewPlanting, PlantingFilter, StatusCounts};
use crate::domain::variety::Variety;
use crate::engine::lifecycle::PlantingLifecycle;
use crate::repository::planting_repo::CropPlantingRepository;
use crate::repository::variety_repo::VarietyRepository;

// ==========================================
// PlantingApi - 种植记录 API
// ==========================================
pub struct PlantingApi {
    planting_repo: Arc<CropPlantingRepository>,
    variety_repo: Arc<VarietyRepository>,
}

impl PlantingApi {
    pub fn new(
        planting_repo: Arc<CropPlantingRepository>,
        variety_repo: Arc<VarietyRepository>,
    ) -> Self {
        Self {
            planting_repo,
            variety_repo,
        }
    }

    // ==========================================
    // 写入接口
    // ==========================================

    /// 新建种植记录
    ///
    /// # 规则
    /// - 需要 ManagePlantings
    /// - 仅本人范围的操作人只能为自己新建；全局范围可指定负责技术员
    /// - 预计收获日期由品种成熟天数推算
    #[instrument(skip(self, actor, request), fields(actor = %actor.actor_id, farmer_id = %request.farmer_id))]
    pub fn create_planting(&self, actor: &Actor, request: NewPlanting) -> ApiResult<CropPlanting> {
        require_capability(actor, Capability::ManagePlantings)?;
        require_non_blank("farmer_id", &request.farmer_id)?;

        let technician_id = match (actor.scope, request.technician_id.as_deref()) {
            (AccessScope::Assigned, Some(other)) if other != actor.actor_id => {
                return Err(ApiError::PermissionDenied(format!(
                    "actor={} 不能为其他技术员新建种植记录: {}",
                    actor.actor_id, other
                )));
            }
            (_, Some(assigned)) => assigned.to_string(),
            (_, None) => actor.actor_id.clone(),
        };

        let maturity_days = match request.variety_id.as_deref() {
            Some(variety_id) => {
                let variety = self
                    .variety_repo
                    .find_by_id(variety_id)?
                    .ok_or_else(|| ApiError::NotFound(format!("Variety(id={})不存在", variety_id)))?;
                variety.maturity_days
            }
            None => None,
        };

        let planting = PlantingLifecycle::create(&request, &technician_id, maturity_days)?;

        let log = ActionLog::now(
            ActionType::CreatePlanting,
            &actor.actor_id,
            Some(&planting.planting_id),
            Some(json!({
                "farmer_id": planting.farmer_id,
                "technician_id": planting.technician_id,
                "area_planted": planting.area_planted,
                "status": planting.status,
                "expected_harvest_date": planting.expected_harvest_date,
            })),
            None,
        );
        self.planting_repo.insert(&planting, &log)?;

        info!(
            planting_id = %planting.planting_id,
            area_planted = %planting.area_planted,
            status = %planting.status,
            "种植记录已创建"
        );
        Ok(planting)
    }

    // ==========================================
    // 查询接口
    // ==========================================

    /// 查询种植记录详情
    pub fn get_planting(&self, actor: &Actor, planting_id: &str) -> ApiResult<CropPlanting> {
        require_capability(actor, Capability::ViewPlantings)?;
        let planting = self.planting_repo.get(planting_id)?;
        require_planting_access(actor, &planting)?;
        Ok(planting)
    }

    /// 查询种植记录列表（本人范围强制按技术员过滤）
    pub fn list_plantings(&self, actor: &Actor, filter: PlantingFilter) -> ApiResult<Vec<CropPlanting>> {
        require_capability(actor, Capability::ViewPlantings)?;

        let mut filter = filter;
        if let Some(own) = actor.scoped_technician() {
            filter.technician_id = Some(own.to_string());
        }
        Ok(self.planting_repo.list(&filter)?)
    }

    /// 按状态统计（状态徽标）
    pub fn count_by_status(&self, actor: &Actor) -> ApiResult<StatusCounts> {
        require_capability(actor, Capability::ViewPlantings)?;
        Ok(self.planting_repo.count_by_status(actor.scoped_technician())?)
    }

    /// 品种列表
    pub fn list_varieties(&self, actor: &Actor) -> ApiResult<Vec<Variety>> {
        require_capability(actor, Capability::ViewPlantings)?;
        Ok(self.variety_repo.list()?)
    }
}
