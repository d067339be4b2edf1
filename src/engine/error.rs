// ==========================================
// 农作物种植监测系统 - 生命周期规则错误
// ==========================================
// 红线: 校验失败直接返回，不做截断/修正
// ==========================================

use crate::domain::area::Area;
use crate::domain::types::PlantingStatus;
use thiserror::Error;

/// 生命周期规则错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LifecycleError {
    /// 面积非正或为负
    #[error("无效面积: {field}={value}")]
    InvalidAmount { field: &'static str, value: Area },

    /// 超出剩余面积（InvalidAmount 的特例，附带剩余面积上下文）
    #[error("面积超出剩余面积: requested={requested}, remaining={remaining}")]
    ExceedsRemainingArea { requested: Area, remaining: Area },

    #[error("当前状态不可收获: status={status}")]
    NotHarvestable { status: PlantingStatus },

    #[error("当前状态不可巡查: status={status}")]
    NotInspectable { status: PlantingStatus },

    #[error("无效的初始状态: status={status}")]
    InvalidStatus { status: PlantingStatus },
}

impl LifecycleError {
    /// 是否属于面积类错误（含超出剩余面积）
    pub fn is_invalid_amount(&self) -> bool {
        matches!(
            self,
            LifecycleError::InvalidAmount { .. } | LifecycleError::ExceedsRemainingArea { .. }
        )
    }
}

/// Result 类型别名
pub type LifecycleResult<T> = Result<T, LifecycleError>;
