// ==========================================
// 农作物种植监测系统 - 种植生命周期引擎
// ==========================================
// 职责: 种植记录创建、受损/收获面积核算、状态流转、到期巡检规则
// 红线: 无 I/O；校验全部通过后才修改记录（失败时记录保持原样）
// 红线: area_planted == harvested_area + damaged_area + remaining_area
// ==========================================
// 状态机:
//   standing → harvest               (到期巡检)
//   harvest → partially harvested    (部分收获)
//   harvest/partially → harvested    (剩余面积归零，终态)
// ==========================================

use crate::domain::area::Area;
use crate::domain::planting::{CropPlanting, NewPlanting};
use crate::domain::types::PlantingStatus;
use crate::domain::variety::expected_harvest_date;
use crate::engine::error::{LifecycleError, LifecycleResult};
use chrono::{NaiveDate, Utc};
use tracing::{debug, instrument};

// ==========================================
// PlantingLifecycle - 纯规则工具类
// ==========================================
pub struct PlantingLifecycle;

impl PlantingLifecycle {
    /// 创建种植记录
    ///
    /// # 规则
    /// - remaining_area = area_planted，harvested_area = damaged_area = 0
    /// - status 默认 standing，可由调用方指定（partially harvested 不允许作为初始状态）
    /// - expected_harvest_date = planting_date + maturity_days（未知则为 None）
    pub fn create(
        request: &NewPlanting,
        technician_id: &str,
        maturity_days: Option<i32>,
    ) -> LifecycleResult<CropPlanting> {
        let area_planted = Area::from_hectares(request.area_planted_ha);
        if area_planted.is_negative() {
            return Err(LifecycleError::InvalidAmount {
                field: "area_planted",
                value: area_planted,
            });
        }

        let status = request.initial_status.unwrap_or(PlantingStatus::Standing);
        if !status.is_valid_initial() {
            return Err(LifecycleError::InvalidStatus { status });
        }

        let now = Utc::now().naive_utc();
        Ok(CropPlanting {
            planting_id: uuid::Uuid::new_v4().to_string(),
            farmer_id: request.farmer_id.clone(),
            variety_id: request.variety_id.clone(),
            technician_id: technician_id.to_string(),
            planting_date: request.planting_date,
            expected_harvest_date: expected_harvest_date(request.planting_date, maturity_days),
            area_planted,
            harvested_area: Area::ZERO,
            damaged_area: Area::ZERO,
            remaining_area: area_planted,
            status,
            growth_stage: None,
            remarks: request.remarks.clone(),
            municipality: request.municipality.clone(),
            barangay: request.barangay.clone(),
            revision: 0,
            created_at: now,
            updated_at: now,
        })
    }

    /// 登记受损面积
    ///
    /// 受损不改变状态；受损面积耗尽剩余面积时也不自动转为 harvested。
    #[instrument(skip(planting), fields(planting_id = %planting.planting_id, damaged = %damaged_area))]
    pub fn apply_damage(planting: &mut CropPlanting, damaged_area: Area) -> LifecycleResult<()> {
        Self::check_amount("damaged_area", damaged_area, planting.remaining_area)?;

        planting.damaged_area += damaged_area;
        planting.remaining_area -= damaged_area;

        debug!(remaining = %planting.remaining_area, "受损面积已扣减");
        Ok(())
    }

    /// 登记收获面积
    ///
    /// # 校验顺序
    /// 1. 面积必须 > 0
    /// 2. 状态必须为 harvest / partially harvested
    /// 3. 面积不得超过剩余面积
    ///
    /// # 返回
    /// - 收获后的新状态
    #[instrument(skip(planting), fields(planting_id = %planting.planting_id, harvested = %area_harvested))]
    pub fn apply_harvest(
        planting: &mut CropPlanting,
        area_harvested: Area,
    ) -> LifecycleResult<PlantingStatus> {
        if !area_harvested.is_positive() {
            return Err(LifecycleError::InvalidAmount {
                field: "area_harvested",
                value: area_harvested,
            });
        }
        if !planting.status.is_harvestable() {
            return Err(LifecycleError::NotHarvestable {
                status: planting.status,
            });
        }
        Self::check_amount("area_harvested", area_harvested, planting.remaining_area)?;

        planting.harvested_area += area_harvested;
        planting.remaining_area -= area_harvested;
        planting.status = if planting.remaining_area.is_zero() {
            PlantingStatus::Harvested
        } else {
            PlantingStatus::PartiallyHarvested
        };

        debug!(remaining = %planting.remaining_area, status = %planting.status, "收获面积已扣减");
        Ok(planting.status)
    }

    /// 是否到期应转为待收获
    ///
    /// 条件: status != harvest 且 expected_harvest_date ≤ today 且 remaining_area > 0
    pub fn is_due_for_harvest(planting: &CropPlanting, today: NaiveDate) -> bool {
        planting.status != PlantingStatus::Harvest
            && planting
                .expected_harvest_date
                .map_or(false, |date| date <= today)
            && planting.remaining_area.is_positive()
    }

    /// 将到期记录转为待收获（幂等）
    ///
    /// # 返回
    /// - 状态发生变化的记录数
    pub fn sweep_due_for_harvest(today: NaiveDate, plantings: &mut [CropPlanting]) -> usize {
        let mut changed = 0;
        for planting in plantings.iter_mut() {
            if Self::is_due_for_harvest(planting, today) {
                planting.status = PlantingStatus::Harvest;
                changed += 1;
            }
        }
        changed
    }

    /// 通用面积校验：> 0 且 ≤ 剩余面积
    fn check_amount(field: &'static str, amount: Area, remaining: Area) -> LifecycleResult<()> {
        if !amount.is_positive() {
            return Err(LifecycleError::InvalidAmount {
                field,
                value: amount,
            });
        }
        if amount > remaining {
            return Err(LifecycleError::ExceedsRemainingArea {
                requested: amount,
                remaining,
            });
        }
        Ok(())
    }
}
