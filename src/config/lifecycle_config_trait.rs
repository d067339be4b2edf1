// ==========================================
// 农作物种植监测系统 - 生命周期配置读取 Trait
// ==========================================
// 职责: 定义巡查/收获/批量转待收获所需的配置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use async_trait::async_trait;
use std::error::Error;

/// 配置读取结果
pub type ConfigResult<T> = Result<T, Box<dyn Error + Send + Sync>>;

// ==========================================
// LifecycleConfigReader Trait
// ==========================================
// 实现者: ConfigManager（从 config_kv 表读取）
#[async_trait]
pub trait LifecycleConfigReader: Send + Sync {
    /// 批量转待收获的执行间隔（小时）
    ///
    /// # 默认值
    /// - 24
    async fn get_sweep_interval_hours(&self) -> ConfigResult<u64>;

    /// 巡查/收获列表分页大小
    ///
    /// # 默认值
    /// - 9
    async fn get_list_page_size(&self) -> ConfigResult<usize>;

    /// 转为待收获时是否发布通知事件
    ///
    /// # 默认值
    /// - true
    async fn get_notify_ready_for_harvest(&self) -> ConfigResult<bool>;
}
