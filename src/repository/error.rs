// ==========================================
// 农作物种植监测系统 - 仓储层错误类型
// ==========================================
// 工具: thiserror 派生宏
// 并发控制: 种植记录按 revision 乐观锁
// ==========================================

use std::fmt;
use thiserror::Error;

/// SQLite 约束类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintKind {
    Unique,
    ForeignKey,
    Check,
}

impl fmt::Display for ConstraintKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ConstraintKind::Unique => "唯一约束",
            ConstraintKind::ForeignKey => "外键约束",
            ConstraintKind::Check => "检查约束",
        };
        f.write_str(name)
    }
}

/// 仓储层错误类型
#[derive(Error, Debug)]
pub enum RepositoryError {
    /// 种植记录 revision 已变化（或被并发修改），本次事务已回滚
    #[error("乐观锁冲突: planting_id={planting_id}, expected_revision={expected}, actual_revision={actual}")]
    OptimisticLockFailure {
        planting_id: String,
        expected: i32,
        actual: i32,
    },

    #[error("记录未找到: {entity} with id={id}")]
    NotFound { entity: String, id: String },

    #[error("数据库锁获取失败: {0}")]
    LockError(String),

    #[error("{kind}违反: {message}")]
    ConstraintViolation { kind: ConstraintKind, message: String },

    #[error("数据库查询失败: {0}")]
    DatabaseQueryError(String),

    #[error("查询参数超出范围: {field}={value}")]
    QueryOutOfRange { field: &'static str, value: usize },
}

impl RepositoryError {
    pub fn not_found(entity: &str, id: &str) -> Self {
        RepositoryError::NotFound {
            entity: entity.to_string(),
            id: id.to_string(),
        }
    }
}

impl From<rusqlite::Error> for RepositoryError {
    fn from(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::SqliteFailure(_, Some(msg)) => {
                let kind = if msg.contains("UNIQUE") {
                    Some(ConstraintKind::Unique)
                } else if msg.contains("FOREIGN KEY") {
                    Some(ConstraintKind::ForeignKey)
                } else if msg.contains("CHECK") {
                    Some(ConstraintKind::Check)
                } else {
                    None
                };
                match kind {
                    Some(kind) => RepositoryError::ConstraintViolation { kind, message: msg },
                    None => RepositoryError::DatabaseQueryError(msg),
                }
            }
            rusqlite::Error::QueryReturnedNoRows => RepositoryError::NotFound {
                entity: "Unknown".to_string(),
                id: "Unknown".to_string(),
            },
            _ => RepositoryError::DatabaseQueryError(err.to_string()),
        }
    }
}

/// Result 类型别名
pub type RepositoryResult<T> = Result<T, RepositoryError>;
