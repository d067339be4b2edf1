// ==========================================
// 农作物种植监测系统 - API 层
// ==========================================
// 职责: 提供业务 API 接口，供定时任务与上层调用
// ==========================================

pub mod error;
pub mod harvest_api;
pub mod inspection_api;
pub mod planting_api;
pub mod sweep_api;
pub mod validator;

// 重导出核心类型
pub use error::{ApiError, ApiResult};
pub use harvest_api::HarvestApi;
pub use inspection_api::InspectionApi;
pub use planting_api::PlantingApi;
pub use sweep_api::{StatusSweepApi, SweepReport};
