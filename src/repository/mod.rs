// ==========================================
// 农作物种植监测系统 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================
// 职责: 提供数据访问接口,屏蔽数据库细节
// 约束: 所有查询使用参数化,防止 SQL 注入
// ==========================================

pub mod action_log_repo;
pub mod error;
pub mod harvest_report_repo;
pub mod inspection_repo;
pub mod planting_repo;
pub mod variety_repo;

// 重导出核心仓储
pub use action_log_repo::ActionLogRepository;
pub use error::{ConstraintKind, RepositoryError, RepositoryResult};
pub use harvest_report_repo::HarvestReportRepository;
pub use inspection_repo::InspectionRepository;
pub use planting_repo::{CropPlantingRepository, SweepOutcome};
pub use variety_repo::{UpsertOutcome, VarietyRepository};
