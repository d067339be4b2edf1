// ==========================================
// 农作物种植监测系统 - 导入层
// ==========================================
// 职责: 外部主数据导入（品种目录）
// 支持: CSV
// ==========================================

pub mod error;
pub mod variety_importer;

// 重导出核心类型
pub use error::{ImportError, ImportResult};
pub use variety_importer::{VarietyImportSummary, VarietyImporter};
