// ==========================================
// 农作物种植监测系统 - API层错误类型
// ==========================================
// 职责: 定义API层错误类型，转换引擎/仓储错误为用户可读的错误消息
// 红线: 所有错误信息必须包含显式原因
// ==========================================

use crate::domain::area::Area;
use crate::domain::types::PlantingStatus;
use crate::engine::error::LifecycleError;
use crate::repository::error::RepositoryError;
use thiserror::Error;

/// API层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 面积核算/状态规则错误（与 LifecycleError 一一对应）
    // ==========================================
    #[error("无效面积: {field}={value}")]
    InvalidAmount { field: &'static str, value: Area },

    #[error("面积超出剩余面积: requested={requested}, remaining={remaining}")]
    ExceedsRemainingArea { requested: Area, remaining: Area },

    #[error("当前状态不可收获: status={status}")]
    NotHarvestable { status: PlantingStatus },

    #[error("当前状态不可巡查: status={status}")]
    NotInspectable { status: PlantingStatus },

    #[error("无效的状态: status={status}")]
    InvalidStatus { status: PlantingStatus },

    // ==========================================
    // 并发控制错误
    // ==========================================
    /// 种植记录已被其他请求修改，调用方可重新读取后重试
    #[error("种植记录已被其他请求修改，请重试: planting_id={planting_id}, expected_revision={expected}, actual_revision={actual}")]
    ConflictRetry {
        planting_id: String,
        expected: i32,
        actual: i32,
    },

    // ==========================================
    // 权限/业务规则错误
    // ==========================================
    #[error("权限不足: {0}")]
    PermissionDenied(String),

    #[error("无效输入: {0}")]
    InvalidInput(String),

    #[error("资源未找到: {0}")]
    NotFound(String),

    #[error("业务规则违反: {0}")]
    BusinessRuleViolation(String),

    // ==========================================
    // 数据访问/配置错误
    // ==========================================
    #[error("数据库错误: {0}")]
    DatabaseError(String),

    #[error("数据库连接失败: {0}")]
    DatabaseConnectionError(String),

    #[error("配置读取失败: {0}")]
    ConfigError(String),
}

impl ApiError {
    /// 是否可由调用方重新读取后重试
    pub fn is_retryable(&self) -> bool {
        matches!(self, ApiError::ConflictRetry { .. })
    }

    /// 是否属于面积类错误（含超出剩余面积）
    pub fn is_invalid_amount(&self) -> bool {
        matches!(
            self,
            ApiError::InvalidAmount { .. } | ApiError::ExceedsRemainingArea { .. }
        )
    }
}

// ==========================================
// 从 LifecycleError 转换
// ==========================================
impl From<LifecycleError> for ApiError {
    fn from(err: LifecycleError) -> Self {
        match err {
            LifecycleError::InvalidAmount { field, value } => ApiError::InvalidAmount { field, value },
            LifecycleError::ExceedsRemainingArea {
                requested,
                remaining,
            } => ApiError::ExceedsRemainingArea {
                requested,
                remaining,
            },
            LifecycleError::NotHarvestable { status } => ApiError::NotHarvestable { status },
            LifecycleError::NotInspectable { status } => ApiError::NotInspectable { status },
            LifecycleError::InvalidStatus { status } => ApiError::InvalidStatus { status },
        }
    }
}

// ==========================================
// 从 RepositoryError 转换
// ==========================================
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            // 并发控制错误
            RepositoryError::OptimisticLockFailure {
                planting_id,
                expected,
                actual,
            } => ApiError::ConflictRetry {
                planting_id,
                expected,
                actual,
            },

            // 数据库错误
            RepositoryError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{}(id={})不存在", entity, id))
            }
            RepositoryError::LockError(msg) => {
                ApiError::DatabaseConnectionError(format!("数据库锁获取失败: {}", msg))
            }
            RepositoryError::ConstraintViolation { kind, message } => {
                ApiError::BusinessRuleViolation(format!("{}违反: {}", kind, message))
            }
            RepositoryError::DatabaseQueryError(msg) => ApiError::DatabaseError(msg),
            RepositoryError::QueryOutOfRange { field, value } => {
                ApiError::InvalidInput(format!("{}超出范围: {}", field, value))
            }
        }
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repository_error_conversion() {
        // NotFound错误转换
        let repo_err = RepositoryError::NotFound {
            entity: "CropPlanting".to_string(),
            id: "P001".to_string(),
        };
        let api_err: ApiError = repo_err.into();
        match api_err {
            ApiError::NotFound(msg) => {
                assert!(msg.contains("CropPlanting"));
                assert!(msg.contains("P001"));
            }
            _ => panic!("Expected NotFound"),
        }

        // OptimisticLockFailure转换
        let repo_err = RepositoryError::OptimisticLockFailure {
            planting_id: "P001".to_string(),
            expected: 1,
            actual: 2,
        };
        let api_err: ApiError = repo_err.into();
        assert!(api_err.is_retryable());
        match api_err {
            ApiError::ConflictRetry {
                planting_id,
                expected,
                actual,
            } => {
                assert_eq!(planting_id, "P001");
                assert_eq!(expected, 1);
                assert_eq!(actual, 2);
            }
            _ => panic!("Expected ConflictRetry"),
        }
    }

    #[test]
    fn test_lifecycle_error_conversion() {
        let api_err: ApiError = LifecycleError::ExceedsRemainingArea {
            requested: Area::from_hectares(6.0),
            remaining: Area::from_hectares(5.0),
        }
        .into();
        assert!(api_err.is_invalid_amount());
        assert!(!api_err.is_retryable());
        assert!(api_err.to_string().contains("6.00 ha"));

        let api_err: ApiError = LifecycleError::NotHarvestable {
            status: PlantingStatus::Standing,
        }
        .into();
        assert!(matches!(
            api_err,
            ApiError::NotHarvestable {
                status: PlantingStatus::Standing
            }
        ));
    }
}
