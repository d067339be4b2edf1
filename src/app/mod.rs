// ==========================================
// 农作物种植监测系统 - 应用层
// ==========================================
// 职责: 组装仓储、配置与API，供定时任务及上层调用
// ==========================================

pub mod state;

// 重导出
pub use state::{get_default_db_path, AppState};
