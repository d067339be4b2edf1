// ==========================================
// 农作物种植监测系统 - 操作日志领域模型
// ==========================================
// 红线: 所有写入必须记录，且与业务写入同一事务
// 用途: 审计追踪
// ==========================================

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;

// ==========================================
// ActionLog - 操作日志
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionLog {
    pub action_id: String,           // 日志ID
    pub action_type: ActionType,     // 操作类型
    pub action_ts: NaiveDateTime,    // 操作时间戳
    pub actor: String,               // 操作人
    pub planting_id: Option<String>, // 关联种植记录
    pub payload_json: Option<JsonValue>, // 操作参数 (JSON)
    pub detail: Option<String>,      // 详细描述
}

// ==========================================
// ActionType - 操作类型
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionType {
    CreatePlanting,   // 新建种植
    RecordInspection, // 登记巡查
    RecordHarvest,    // 登记收获
    PromoteToHarvest, // 到期转为待收获
    ImportVarieties,  // 导入品种
}

impl ActionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionType::CreatePlanting => "CreatePlanting",
            ActionType::RecordInspection => "RecordInspection",
            ActionType::RecordHarvest => "RecordHarvest",
            ActionType::PromoteToHarvest => "PromoteToHarvest",
            ActionType::ImportVarieties => "ImportVarieties",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "CreatePlanting" => Some(ActionType::CreatePlanting),
            "RecordInspection" => Some(ActionType::RecordInspection),
            "RecordHarvest" => Some(ActionType::RecordHarvest),
            "PromoteToHarvest" => Some(ActionType::PromoteToHarvest),
            "ImportVarieties" => Some(ActionType::ImportVarieties),
            _ => None,
        }
    }
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ActionLog {
    /// 以当前时间创建日志
    pub fn now(
        action_type: ActionType,
        actor: &str,
        planting_id: Option<&str>,
        payload_json: Option<JsonValue>,
        detail: Option<String>,
    ) -> Self {
        Self {
            action_id: uuid::Uuid::new_v4().to_string(),
            action_type,
            action_ts: chrono::Utc::now().naive_utc(),
            actor: actor.to_string(),
            planting_id: planting_id.map(str::to_string),
            payload_json,
            detail,
        }
    }
}
