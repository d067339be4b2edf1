// ==========================================
// 农作物种植监测系统 - 应用状态
// ==========================================
// 职责: 管理应用级别的共享状态和API实例
// ==========================================

use std::sync::{Arc, Mutex};

use crate::api::{HarvestApi, InspectionApi, PlantingApi, StatusSweepApi};
use crate::config::config_manager::ConfigManager;
use crate::config::LifecycleConfigReader;
use crate::db::{init_schema, open_sqlite_connection};
use crate::engine::events::{OptionalEventPublisher, PlantingEventPublisher};
use crate::importer::VarietyImporter;
use crate::repository::{
    action_log_repo::ActionLogRepository, harvest_report_repo::HarvestReportRepository,
    inspection_repo::InspectionRepository, planting_repo::CropPlantingRepository,
    variety_repo::VarietyRepository,
};

/// 应用状态
///
/// 包含所有API实例和共享资源（单一共享连接）
pub struct AppState {
    /// 数据库路径
    pub db_path: String,

    /// 种植记录API
    pub planting_api: Arc<PlantingApi>,

    /// 巡查登记API
    pub inspection_api: Arc<InspectionApi>,

    /// 收获登记API
    pub harvest_api: Arc<HarvestApi>,

    /// 到期转待收获API
    pub sweep_api: Arc<StatusSweepApi>,

    /// 品种目录导入
    pub variety_importer: Arc<VarietyImporter>,

    /// 配置管理器
    pub config_manager: Arc<ConfigManager>,

    /// 操作日志仓储（用于审计追踪）
    pub action_log_repo: Arc<ActionLogRepository>,
}

impl AppState {
    /// 创建新的AppState实例（不配置通知发布者）
    pub fn new(db_path: String) -> Result<Self, String> {
        Self::with_event_publisher(db_path, None)
    }

    /// 创建AppState并注入通知发布者
    ///
    /// # 说明
    /// 该方法会：
    /// 1. 打开共享连接并初始化 schema（幂等）
    /// 2. 初始化所有Repository
    /// 3. 创建所有API实例
    pub fn with_event_publisher(
        db_path: String,
        publisher: Option<Arc<dyn PlantingEventPublisher>>,
    ) -> Result<Self, String> {
        tracing::info!("初始化AppState，数据库路径: {}", db_path);

        let conn = open_sqlite_connection(&db_path).map_err(|e| format!("无法打开数据库: {}", e))?;
        init_schema(&conn).map_err(|e| format!("数据库初始化失败: {}", e))?;
        let conn = Arc::new(Mutex::new(conn));

        // ==========================================
        // 初始化Repository层
        // ==========================================
        let planting_repo = Arc::new(CropPlantingRepository::new(conn.clone()));
        let inspection_repo = Arc::new(InspectionRepository::new(conn.clone()));
        let report_repo = Arc::new(HarvestReportRepository::new(conn.clone()));
        let variety_repo = Arc::new(VarietyRepository::new(conn.clone()));
        let action_log_repo = Arc::new(ActionLogRepository::new(conn.clone()));

        // ==========================================
        // 配置与事件
        // ==========================================
        let config_manager = Arc::new(
            ConfigManager::from_connection(conn.clone())
                .map_err(|e| format!("无法创建ConfigManager: {}", e))?,
        );
        let config: Arc<dyn LifecycleConfigReader> = config_manager.clone();
        let publisher = Arc::new(OptionalEventPublisher::from_option(publisher));
        if !publisher.is_configured() {
            tracing::info!("未配置通知发布者，种植事件将被跳过");
        }

        // ==========================================
        // 初始化API层
        // ==========================================
        let planting_api = Arc::new(PlantingApi::new(planting_repo.clone(), variety_repo.clone()));
        let inspection_api = Arc::new(InspectionApi::new(
            planting_repo.clone(),
            inspection_repo,
            config.clone(),
            publisher.clone(),
        ));
        let harvest_api = Arc::new(HarvestApi::new(
            planting_repo.clone(),
            report_repo,
            config.clone(),
            publisher.clone(),
        ));
        let sweep_api = Arc::new(StatusSweepApi::new(planting_repo, config, publisher));
        let variety_importer = Arc::new(VarietyImporter::new(variety_repo, action_log_repo.clone()));

        tracing::info!("AppState初始化完成");

        Ok(Self {
            db_path,
            planting_api,
            inspection_api,
            harvest_api,
            sweep_api,
            variety_importer,
            config_manager,
            action_log_repo,
        })
    }

    /// 获取数据库路径
    pub fn get_db_path(&self) -> &str {
        &self.db_path
    }
}

/// 获取默认数据库路径
///
/// 优先级: FARM_MONITOR_DB_PATH 环境变量 > 用户数据目录 > 当前目录
pub fn get_default_db_path() -> String {
    use std::path::PathBuf;

    // 允许通过环境变量显式指定 DB 路径（便于调试/测试/CI）
    if let Ok(path) = std::env::var("FARM_MONITOR_DB_PATH") {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./farm_monitor.db");

    if let Some(data_dir) = dirs::data_dir() {
        // 开发环境使用独立目录，避免污染生产数据
        #[cfg(debug_assertions)]
        {
            path = data_dir.join("farm-monitor-dev");
        }

        #[cfg(not(debug_assertions))]
        {
            path = data_dir.join("farm-monitor");
        }

        // 确保目录存在；失败时回退到当前目录
        if std::fs::create_dir_all(&path).is_ok() {
            path = path.join("farm_monitor.db");
        } else {
            path = PathBuf::from("./farm_monitor.db");
        }
    }

    path.to_string_lossy().to_string()
}
