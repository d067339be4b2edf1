// ==========================================
// 农作物种植监测系统 - 操作权限与输入校验
// ==========================================
// 职责: API 入口处的能力检查、数据范围检查、数值输入检查
// 红线: 校验失败直接返回，不修正输入
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::domain::access::{Actor, Capability};
use crate::domain::field_event::EventQuery;
use crate::domain::planting::CropPlanting;

/// 要求操作人具备指定能力
pub fn require_capability(actor: &Actor, capability: Capability) -> ApiResult<()> {
    if actor.can(capability) {
        Ok(())
    } else {
        Err(ApiError::PermissionDenied(format!(
            "actor={} 缺少能力 {}",
            actor.actor_id,
            capability.as_str()
        )))
    }
}

/// 要求操作人可以访问该种植记录
pub fn require_planting_access(actor: &Actor, planting: &CropPlanting) -> ApiResult<()> {
    if actor.can_access(&planting.technician_id) {
        Ok(())
    } else {
        Err(ApiError::PermissionDenied(format!(
            "actor={} 无权访问种植记录 planting_id={}",
            actor.actor_id, planting.planting_id
        )))
    }
}

/// 数值必须为有限且非负
pub fn require_non_negative(field: &str, value: f64) -> ApiResult<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ApiError::InvalidInput(format!("{}必须为非负数: {}", field, value)))
    }
}

/// 事件列表查询条件：日期区间合法，游标在 SQLite 整数范围内
pub fn require_valid_event_query(query: &EventQuery) -> ApiResult<()> {
    if !query.has_valid_range() {
        return Err(ApiError::InvalidInput("结束日期不能早于开始日期".to_string()));
    }
    if i64::try_from(query.cursor).is_err() {
        return Err(ApiError::InvalidInput(format!("游标超出范围: {}", query.cursor)));
    }
    Ok(())
}

/// 文本必须非空
pub fn require_non_blank(field: &str, value: &str) -> ApiResult<()> {
    if value.trim().is_empty() {
        Err(ApiError::InvalidInput(format!("{}不能为空", field)))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_capability() {
        let admin = Actor::admin("A001");
        assert!(require_capability(&admin, Capability::RunStatusSweep).is_ok());
        assert!(matches!(
            require_capability(&admin, Capability::CreateInspections),
            Err(ApiError::PermissionDenied(_))
        ));
    }

    #[test]
    fn test_numeric_and_text_checks() {
        assert!(require_non_negative("total_yield", 0.0).is_ok());
        assert!(require_non_negative("total_yield", -1.0).is_err());
        assert!(require_non_negative("profit", f64::NAN).is_err());
        assert!(require_non_blank("remarks", "  ").is_err());
        assert!(require_non_blank("remarks", "leaf blight").is_ok());
    }

    #[test]
    fn test_event_query_cursor_bounds() {
        let mut query = EventQuery {
            cursor: i64::MAX as usize,
            ..Default::default()
        };
        assert!(require_valid_event_query(&query).is_ok());

        query.cursor = usize::MAX;
        assert!(matches!(
            require_valid_event_query(&query),
            Err(ApiError::InvalidInput(_))
        ));
    }
}
