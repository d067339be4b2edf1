// ==========================================
// 农作物种植监测系统 - 导入模块错误类型
// ==========================================
// 工具: thiserror 派生宏
// 说明: 行级问题（缺名称、天数非法）只跳过并告警，不产生错误
// ==========================================

use std::path::PathBuf;

use crate::repository::error::RepositoryError;
use thiserror::Error;

/// 导入模块错误类型
#[derive(Error, Debug)]
pub enum ImportError {
    #[error("品种目录文件不存在: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("文件格式不支持: .{0}（品种目录仅支持 .csv）")]
    UnsupportedFormat(String),

    #[error("文件读取失败: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV 解析失败: {0}")]
    Csv(#[from] csv::Error),

    #[error("缺少必需列: {0}")]
    MissingColumn(&'static str),

    #[error("品种目录写入失败: {0}")]
    Repository(#[from] RepositoryError),
}

/// Result 类型别名
pub type ImportResult<T> = Result<T, ImportError>;
