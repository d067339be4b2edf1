// ==========================================
// 农作物种植监测系统 - 领域模型层
// ==========================================
// 职责: 定义领域实体、值对象、类型
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod access;
pub mod action_log;
pub mod area;
pub mod field_event;
pub mod planting;
pub mod types;
pub mod variety;

// 重导出核心类型
pub use access::{AccessScope, Actor, Capability, CapabilitySet};
pub use action_log::{ActionLog, ActionType};
pub use area::Area;
pub use field_event::{
    EventPage, EventQuery, HarvestReport, Inspection, NewHarvestReport, NewInspection,
};
pub use planting::{CropPlanting, NewPlanting, PlantingFilter, StatusCounts};
pub use types::{GrowthStage, PlantingStatus};
pub use variety::Variety;
