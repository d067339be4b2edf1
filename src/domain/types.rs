// ==========================================
// 农作物种植监测系统 - 领域类型定义
// ==========================================
// 依据: crop_plantings.status 枚举
// 红线: 状态只能沿 standing → harvest → partially harvested → harvested 推进
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 种植状态 (Planting Status)
// ==========================================
// 序列化格式: 与数据库存储一致（小写，含空格）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlantingStatus {
    #[serde(rename = "standing")]
    Standing, // 生长中
    #[serde(rename = "harvest")]
    Harvest, // 待收获
    #[serde(rename = "partially harvested")]
    PartiallyHarvested, // 部分收获
    #[serde(rename = "harvested")]
    Harvested, // 已收获（终态）
}

impl fmt::Display for PlantingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_db_str())
    }
}

impl PlantingStatus {
    /// 全部状态（用于状态统计）
    pub const ALL: [PlantingStatus; 4] = [
        PlantingStatus::Standing,
        PlantingStatus::Harvest,
        PlantingStatus::PartiallyHarvested,
        PlantingStatus::Harvested,
    ];

    /// 从数据库字符串解析状态
    pub fn from_db_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "standing" => Some(PlantingStatus::Standing),
            "harvest" => Some(PlantingStatus::Harvest),
            "partially harvested" => Some(PlantingStatus::PartiallyHarvested),
            "harvested" => Some(PlantingStatus::Harvested),
            _ => None,
        }
    }

    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            PlantingStatus::Standing => "standing",
            PlantingStatus::Harvest => "harvest",
            PlantingStatus::PartiallyHarvested => "partially harvested",
            PlantingStatus::Harvested => "harvested",
        }
    }

    /// 是否允许登记收获
    pub fn is_harvestable(&self) -> bool {
        matches!(
            self,
            PlantingStatus::Harvest | PlantingStatus::PartiallyHarvested
        )
    }

    /// 是否允许登记巡查
    pub fn is_inspectable(&self) -> bool {
        *self == PlantingStatus::Standing
    }

    /// 是否允许作为新建时的初始状态
    pub fn is_valid_initial(&self) -> bool {
        !matches!(self, PlantingStatus::PartiallyHarvested)
    }

    pub fn is_terminal(&self) -> bool {
        *self == PlantingStatus::Harvested
    }
}

// ==========================================
// 生长阶段 (Growth Stage)
// ==========================================
// 由巡查显式记录，不从备注文本推断
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GrowthStage {
    Seedling,     // 苗期
    Vegetative,   // 营养生长期
    Reproductive, // 生殖生长期
    Maturity,     // 成熟期
}

impl fmt::Display for GrowthStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_db_str())
    }
}

impl GrowthStage {
    pub fn from_db_str(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "SEEDLING" => Some(GrowthStage::Seedling),
            "VEGETATIVE" => Some(GrowthStage::Vegetative),
            "REPRODUCTIVE" => Some(GrowthStage::Reproductive),
            "MATURITY" => Some(GrowthStage::Maturity),
            _ => None,
        }
    }

    pub fn to_db_str(&self) -> &'static str {
        match self {
            GrowthStage::Seedling => "SEEDLING",
            GrowthStage::Vegetative => "VEGETATIVE",
            GrowthStage::Reproductive => "REPRODUCTIVE",
            GrowthStage::Maturity => "MATURITY",
        }
    }
}
