// ==========================================
// 农作物种植监测系统 - 到期转待收获 API
// ==========================================
// 职责: 定时将到期的种植记录转为 harvest，并发布待收获通知事件
// 并发: 先读候选，再在单事务内逐行 revision 条件更新；冲突行留待下次执行
// 幂等: 重复执行不会重复转换
// ==========================================

use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::api::error::{ApiError, ApiResult};
use crate::api::validator::require_capability;
use crate::config::LifecycleConfigReader;
use crate::domain::access::{Actor, Capability};
use crate::domain::planting::CropPlanting;
use crate::engine::events::{OptionalEventPublisher, PlantingEvent, PlantingEventType};
use crate::engine::lifecycle::PlantingLifecycle;
use crate::repository::planting_repo::CropPlantingRepository;

/// 单次执行结果
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepReport {
    /// 已转为 harvest 的记录数
    pub promoted: usize,
    /// 因 revision 冲突跳过的记录数
    pub skipped_conflicts: usize,
    /// 已发布通知事件数
    pub notified: usize,
    pub promoted_ids: Vec<String>,
}

// ==========================================
// StatusSweepApi
// ==========================================
pub struct StatusSweepApi {
    planting_repo: Arc<CropPlantingRepository>,
    config: Arc<dyn LifecycleConfigReader>,
    publisher: Arc<OptionalEventPublisher>,
}

impl StatusSweepApi {
    pub fn new(
        planting_repo: Arc<CropPlantingRepository>,
        config: Arc<dyn LifecycleConfigReader>,
        publisher: Arc<OptionalEventPublisher>,
    ) -> Self {
        Self {
            planting_repo,
            config,
            publisher,
        }
    }

    /// 执行一次到期转待收获
    ///
    /// # 条件
    /// status != harvest 且 expected_harvest_date ≤ today 且 remaining_area > 0
    #[instrument(skip(self, actor), fields(actor = %actor.actor_id))]
    pub async fn run(&self, actor: &Actor, today: NaiveDate) -> ApiResult<SweepReport> {
        require_capability(actor, Capability::RunStatusSweep)?;

        let candidates = self.due_candidates(today)?;
        if candidates.is_empty() {
            info!(today = %today, "无到期记录");
            return Ok(SweepReport::default());
        }

        self.promote_and_notify(actor, today, candidates).await
    }

    /// 读取到期候选并在内存中转为 harvest（尚未落库）
    fn due_candidates(&self, today: NaiveDate) -> ApiResult<Vec<CropPlanting>> {
        let mut candidates = self.planting_repo.find_due_for_harvest(today)?;
        candidates.retain(|p| PlantingLifecycle::is_due_for_harvest(p, today));
        let changed = PlantingLifecycle::sweep_due_for_harvest(today, &mut candidates);
        debug!(candidates = changed, "到期候选记录");
        Ok(candidates)
    }

    /// 按 revision 条件落库，并为成功转换的记录发布通知
    async fn promote_and_notify(
        &self,
        actor: &Actor,
        today: NaiveDate,
        candidates: Vec<CropPlanting>,
    ) -> ApiResult<SweepReport> {
        let outcome = self
            .planting_repo
            .promote_to_harvest(&candidates, &actor.actor_id)?;

        for planting_id in &outcome.conflicts {
            warn!(planting_id = %planting_id, "种植记录已被其他请求修改，留待下次执行");
        }

        let notify = self
            .config
            .get_notify_ready_for_harvest()
            .await
            .map_err(|e| ApiError::ConfigError(e.to_string()))?;

        let mut notified = 0;
        if notify {
            for planting in &outcome.promoted {
                let event = PlantingEvent {
                    planting_id: planting.planting_id.clone(),
                    event_type: PlantingEventType::ReadyForHarvest,
                    technician_id: planting.technician_id.clone(),
                    remaining_area: planting.remaining_area,
                    event_date: today,
                    location: Some(format!("{}, {}", planting.barangay, planting.municipality)),
                };
                match self.publisher.publish(event) {
                    Ok(_) => notified += 1,
                    Err(e) => warn!(planting_id = %planting.planting_id, error = %e, "待收获通知发布失败"),
                }
            }
        }

        let report = SweepReport {
            promoted: outcome.promoted.len(),
            skipped_conflicts: outcome.conflicts.len(),
            notified,
            promoted_ids: outcome
                .promoted
                .iter()
                .map(|p| p.planting_id.clone())
                .collect(),
        };

        info!(
            today = %today,
            promoted = report.promoted,
            skipped_conflicts = report.skipped_conflicts,
            notified = report.notified,
            "到期转待收获完成"
        );
        Ok(report)
    }

    /// 执行间隔（小时）
    pub async fn interval_hours(&self) -> ApiResult<u64> {
        self.config
            .get_sweep_interval_hours()
            .await
            .map_err(|e| ApiError::ConfigError(e.to_string()))
    }
}
