// ==========================================
// 农作物种植监测系统 - 引擎层
// ==========================================
// 职责: 实现种植生命周期规则,不拼 SQL
// 红线: Engine 不拼 SQL, 校验失败必须给出原因
// ==========================================

pub mod error;
pub mod events;
pub mod lifecycle;

// 重导出核心引擎
pub use error::{LifecycleError, LifecycleResult};
pub use events::{
    NoOpEventPublisher, OptionalEventPublisher, PlantingEvent, PlantingEventPublisher,
    PlantingEventType,
};
pub use lifecycle::PlantingLifecycle;
