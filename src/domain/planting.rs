// ==========================================
// 农作物种植监测系统 - 种植记录领域模型
// ==========================================
// 依据: crop_plantings 表
// 红线: area_planted == harvested_area + damaged_area + remaining_area
// ==========================================

use crate::domain::area::Area;
use crate::domain::types::{GrowthStage, PlantingStatus};
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

// ==========================================
// CropPlanting - 种植记录（聚合根）
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CropPlanting {
    // ===== 主键与关联 =====
    pub planting_id: String,        // 种植ID
    pub farmer_id: String,          // 农户ID
    pub variety_id: Option<String>, // 品种ID
    pub technician_id: String,      // 负责技术员

    // ===== 日期 =====
    pub planting_date: NaiveDate,                 // 种植日期
    pub expected_harvest_date: Option<NaiveDate>, // 预计收获日期（品种成熟天数推算）

    // ===== 面积核算 =====
    pub area_planted: Area,   // 种植面积（创建后不可变）
    pub harvested_area: Area, // 已收获面积（单调不减）
    pub damaged_area: Area,   // 受损面积（单调不减）
    pub remaining_area: Area, // 剩余面积

    // ===== 状态 =====
    pub status: PlantingStatus,
    pub growth_stage: Option<GrowthStage>,

    // ===== 描述信息 =====
    pub remarks: String,
    pub municipality: String,
    pub barangay: String,

    // ===== 审计与并发控制 =====
    pub revision: i32, // 乐观锁：修订号
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl CropPlanting {
    /// 面积守恒检查
    pub fn is_balanced(&self) -> bool {
        self.area_planted == self.harvested_area + self.damaged_area + self.remaining_area
            && !self.remaining_area.is_negative()
    }

    /// 是否可以登记收获
    pub fn can_be_harvested(&self) -> bool {
        self.status.is_harvestable() && self.remaining_area.is_positive()
    }

    /// 是否可以登记巡查
    pub fn is_inspectable(&self) -> bool {
        self.status.is_inspectable()
    }

    /// 收获进度（百分比）
    pub fn harvest_progress(&self) -> f64 {
        if self.area_planted.is_zero() {
            return 0.0;
        }
        self.harvested_area.hundredths() as f64 / self.area_planted.hundredths() as f64 * 100.0
    }
}

// ==========================================
// NewPlanting - 新建种植请求
// ==========================================
// 数值已由调用方完成格式校验
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPlanting {
    pub farmer_id: String,
    pub variety_id: Option<String>,
    /// 指定负责技术员（仅全局权限可指定，否则为操作人本人）
    pub technician_id: Option<String>,
    pub planting_date: NaiveDate,
    pub area_planted_ha: f64,
    pub initial_status: Option<PlantingStatus>,
    pub remarks: String,
    pub municipality: String,
    pub barangay: String,
}

// ==========================================
// PlantingFilter - 种植列表过滤条件
// ==========================================
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlantingFilter {
    pub status: Option<PlantingStatus>,
    pub technician_id: Option<String>,
    pub farmer_id: Option<String>,
}

// ==========================================
// StatusCounts - 状态统计（状态徽标）
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCounts {
    pub standing: i64,
    pub harvest: i64,
    pub partially_harvested: i64,
    pub harvested: i64,
}

impl StatusCounts {
    pub fn add(&mut self, status: PlantingStatus, count: i64) {
        match status {
            PlantingStatus::Standing => self.standing += count,
            PlantingStatus::Harvest => self.harvest += count,
            PlantingStatus::PartiallyHarvested => self.partially_harvested += count,
            PlantingStatus::Harvested => self.harvested += count,
        }
    }

    pub fn total(&self) -> i64 {
        self.standing + self.harvest + self.partially_harvested + self.harvested
    }
}
