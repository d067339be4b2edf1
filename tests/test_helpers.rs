// ==========================================
// 测试辅助函数
// ==========================================
// 职责: 提供测试所需的数据库初始化、测试数据生成等功能
// ==========================================

#![allow(dead_code)]

use chrono::NaiveDate;
use farm_monitor::app::AppState;
use farm_monitor::db::{init_schema, open_sqlite_connection};
use farm_monitor::domain::{Actor, CropPlanting, NewPlanting, Variety};
use farm_monitor::engine::{PlantingEvent, PlantingEventPublisher};
use farm_monitor::repository::VarietyRepository;
use std::error::Error;
use std::sync::{Arc, Mutex};
use tempfile::NamedTempFile;

pub const VARIETY_ID: &str = "V-YELLOW-110";

/// 创建临时测试数据库并初始化 schema
///
/// # 返回
/// - NamedTempFile: 临时数据库文件（需要保持存活）
/// - String: 数据库文件路径
pub fn create_test_db() -> Result<(NamedTempFile, String), Box<dyn Error>> {
    let temp_file = NamedTempFile::new()?;
    let db_path = temp_file.path().to_str().ok_or("无效路径")?.to_string();

    let conn = open_sqlite_connection(&db_path)?;
    init_schema(&conn)?;

    Ok((temp_file, db_path))
}

/// 打开一个独立连接（用于直接校验表内容）
pub fn open_conn(db_path: &str) -> Arc<Mutex<rusqlite::Connection>> {
    Arc::new(Mutex::new(open_sqlite_connection(db_path).unwrap()))
}

/// 记录所有事件的发布者
#[derive(Default)]
pub struct RecordingPublisher {
    pub events: Mutex<Vec<PlantingEvent>>,
}

impl RecordingPublisher {
    pub fn taken(&self) -> Vec<PlantingEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl PlantingEventPublisher for RecordingPublisher {
    fn publish(&self, event: PlantingEvent) -> Result<String, Box<dyn Error + Send + Sync>> {
        let id = format!("evt-{}", event.planting_id);
        self.events.lock().unwrap().push(event);
        Ok(id)
    }
}

/// 创建测试环境（AppState + 记录事件的发布者 + 一个 110 天品种）
pub fn setup_app() -> (NamedTempFile, AppState, Arc<RecordingPublisher>) {
    let (temp_file, db_path) = create_test_db().unwrap();
    let publisher = Arc::new(RecordingPublisher::default());
    let state = AppState::with_event_publisher(db_path.clone(), Some(publisher.clone())).unwrap();

    let variety_repo = VarietyRepository::new(open_conn(&db_path));
    variety_repo
        .upsert_batch(&[Variety {
            variety_id: VARIETY_ID.to_string(),
            crop_name: "Yellow".to_string(),
            name: "Pioneer 30T80".to_string(),
            maturity_days: Some(110),
        }])
        .unwrap();

    (temp_file, state, publisher)
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// 2025-04-01 种植，预计 2025-07-20 收获
pub fn new_planting(area_planted_ha: f64) -> NewPlanting {
    NewPlanting {
        farmer_id: "F001".to_string(),
        variety_id: Some(VARIETY_ID.to_string()),
        technician_id: None,
        planting_date: date(2025, 4, 1),
        area_planted_ha,
        initial_status: None,
        remarks: "wet season".to_string(),
        municipality: "Banaybanay".to_string(),
        barangay: "Poblacion".to_string(),
    }
}

/// 技术员新建种植记录
pub fn plant(state: &AppState, technician: &Actor, area_planted_ha: f64) -> CropPlanting {
    state
        .planting_api
        .create_planting(technician, new_planting(area_planted_ha))
        .unwrap()
}

/// 面积守恒
pub fn assert_balanced(planting: &CropPlanting) {
    assert_eq!(
        planting.area_planted,
        planting.harvested_area + planting.damaged_area + planting.remaining_area,
        "面积不守恒: {:?}",
        planting
    );
}
