// ==========================================
// 农作物种植监测系统 - 种植事件发布
// ==========================================
// 职责: 定义种植事件发布 trait，实现依赖倒置
// 说明: 引擎层只定义 trait，通知投递（邮件/站内信）由外部实现
// ==========================================

use crate::domain::area::Area;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::sync::Arc;

// ==========================================
// 种植事件类型
// ==========================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlantingEventType {
    /// 到期转为待收获
    ReadyForHarvest,
    /// 登记巡查
    InspectionRecorded,
    /// 登记收获
    HarvestRecorded,
}

impl PlantingEventType {
    pub fn as_str(&self) -> &str {
        match self {
            PlantingEventType::ReadyForHarvest => "ReadyForHarvest",
            PlantingEventType::InspectionRecorded => "InspectionRecorded",
            PlantingEventType::HarvestRecorded => "HarvestRecorded",
        }
    }
}

/// 种植事件
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlantingEvent {
    pub planting_id: String,
    pub event_type: PlantingEventType,
    /// 负责技术员（通知接收人）
    pub technician_id: String,
    /// 事件发生后的剩余面积
    pub remaining_area: Area,
    pub event_date: NaiveDate,
    pub location: Option<String>,
}

// ==========================================
// 事件发布 Trait
// ==========================================

/// 种植事件发布者
///
/// 发布失败不影响已提交的业务写入，由调用方记录告警
pub trait PlantingEventPublisher: Send + Sync {
    fn publish(&self, event: PlantingEvent) -> Result<String, Box<dyn Error + Send + Sync>>;
}

/// 空操作事件发布者
#[derive(Debug, Clone, Default)]
pub struct NoOpEventPublisher;

impl PlantingEventPublisher for NoOpEventPublisher {
    fn publish(&self, event: PlantingEvent) -> Result<String, Box<dyn Error + Send + Sync>> {
        tracing::debug!(
            "NoOpEventPublisher: 跳过事件发布 - planting_id={}, event_type={}",
            event.planting_id,
            event.event_type.as_str()
        );
        Ok(String::new())
    }
}

/// 可选的事件发布者包装
pub struct OptionalEventPublisher {
    inner: Option<Arc<dyn PlantingEventPublisher>>,
}

impl OptionalEventPublisher {
    pub fn with_publisher(publisher: Arc<dyn PlantingEventPublisher>) -> Self {
        Self {
            inner: Some(publisher),
        }
    }

    pub fn none() -> Self {
        Self { inner: None }
    }

    pub fn from_option(publisher: Option<Arc<dyn PlantingEventPublisher>>) -> Self {
        Self { inner: publisher }
    }

    /// 发布事件（如果有发布者）
    pub fn publish(&self, event: PlantingEvent) -> Result<String, Box<dyn Error + Send + Sync>> {
        match &self.inner {
            Some(publisher) => publisher.publish(event),
            None => {
                tracing::debug!(
                    "OptionalEventPublisher: 未配置发布者，跳过事件 - planting_id={}, event_type={}",
                    event.planting_id,
                    event.event_type.as_str()
                );
                Ok(String::new())
            }
        }
    }

    pub fn is_configured(&self) -> bool {
        self.inner.is_some()
    }
}

impl Default for OptionalEventPublisher {
    fn default() -> Self {
        Self::none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct RecordingPublisher {
        events: Mutex<Vec<PlantingEvent>>,
    }

    impl PlantingEventPublisher for RecordingPublisher {
        fn publish(&self, event: PlantingEvent) -> Result<String, Box<dyn Error + Send + Sync>> {
            let id = event.planting_id.clone();
            self.events.lock().unwrap().push(event);
            Ok(id)
        }
    }

    fn sample_event() -> PlantingEvent {
        PlantingEvent {
            planting_id: "P001".to_string(),
            event_type: PlantingEventType::ReadyForHarvest,
            technician_id: "T001".to_string(),
            remaining_area: Area::from_hectares(2.5),
            event_date: NaiveDate::from_ymd_opt(2025, 7, 20).unwrap(),
            location: Some("Poblacion, Banaybanay".to_string()),
        }
    }

    #[test]
    fn test_optional_publisher_without_inner() {
        let publisher = OptionalEventPublisher::none();
        assert!(!publisher.is_configured());
        assert_eq!(publisher.publish(sample_event()).unwrap(), "");
    }

    #[test]
    fn test_optional_publisher_forwards() {
        let inner = Arc::new(RecordingPublisher {
            events: Mutex::new(Vec::new()),
        });
        let publisher = OptionalEventPublisher::with_publisher(inner.clone());

        assert_eq!(publisher.publish(sample_event()).unwrap(), "P001");
        assert_eq!(inner.events.lock().unwrap().len(), 1);
    }
}
