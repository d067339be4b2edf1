// ==========================================
// 农作物种植监测系统 - 操作权限
// ==========================================
// 职责: 以显式能力集合描述操作人权限，随每次调用传入
// 红线: 不读取全局角色状态
// ==========================================

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

// ==========================================
// Capability - 单项能力
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    ViewPlantings,        // 查看种植记录
    ManagePlantings,      // 新建/维护种植记录
    ViewInspections,      // 查看巡查记录
    CreateInspections,    // 登记巡查
    ViewReports,          // 查看收获报告
    CreateHarvestReports, // 登记收获
    RunStatusSweep,       // 执行收获状态巡检
}

impl Capability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::ViewPlantings => "view_plantings",
            Capability::ManagePlantings => "manage_plantings",
            Capability::ViewInspections => "view_inspections",
            Capability::CreateInspections => "create_inspections",
            Capability::ViewReports => "view_reports",
            Capability::CreateHarvestReports => "create_harvest_reports",
            Capability::RunStatusSweep => "run_status_sweep",
        }
    }
}

// ==========================================
// CapabilitySet - 能力集合
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapabilitySet(BTreeSet<Capability>);

impl CapabilitySet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, capability: Capability) -> Self {
        self.0.insert(capability);
        self
    }

    pub fn contains(&self, capability: Capability) -> bool {
        self.0.contains(&capability)
    }

    /// 管理员预设：可查看全部，但不直接维护种植、不登记巡查
    pub fn admin() -> Self {
        Self::new()
            .with(Capability::ViewPlantings)
            .with(Capability::ViewInspections)
            .with(Capability::ViewReports)
            .with(Capability::CreateHarvestReports)
            .with(Capability::RunStatusSweep)
    }

    /// 技术员预设：维护自己负责的种植、登记巡查与收获
    pub fn technician() -> Self {
        Self::new()
            .with(Capability::ViewPlantings)
            .with(Capability::ManagePlantings)
            .with(Capability::ViewInspections)
            .with(Capability::CreateInspections)
            .with(Capability::ViewReports)
            .with(Capability::CreateHarvestReports)
    }

    /// 协调员预设：只读
    pub fn coordinator() -> Self {
        Self::new()
            .with(Capability::ViewPlantings)
            .with(Capability::ViewInspections)
            .with(Capability::ViewReports)
    }
}

impl FromIterator<Capability> for CapabilitySet {
    fn from_iter<I: IntoIterator<Item = Capability>>(iter: I) -> Self {
        CapabilitySet(iter.into_iter().collect())
    }
}

// ==========================================
// AccessScope - 数据可见范围
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccessScope {
    All,      // 全部记录
    Assigned, // 仅本人负责的记录
}

// ==========================================
// Actor - 操作人
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub actor_id: String,
    pub capabilities: CapabilitySet,
    pub scope: AccessScope,
}

impl Actor {
    pub fn new(actor_id: impl Into<String>, capabilities: CapabilitySet, scope: AccessScope) -> Self {
        Self {
            actor_id: actor_id.into(),
            capabilities,
            scope,
        }
    }

    pub fn admin(actor_id: impl Into<String>) -> Self {
        Self::new(actor_id, CapabilitySet::admin(), AccessScope::All)
    }

    pub fn technician(actor_id: impl Into<String>) -> Self {
        Self::new(actor_id, CapabilitySet::technician(), AccessScope::Assigned)
    }

    pub fn coordinator(actor_id: impl Into<String>) -> Self {
        Self::new(actor_id, CapabilitySet::coordinator(), AccessScope::All)
    }

    pub fn can(&self, capability: Capability) -> bool {
        self.capabilities.contains(capability)
    }

    /// 是否可以访问指定技术员负责的记录
    pub fn can_access(&self, technician_id: &str) -> bool {
        match self.scope {
            AccessScope::All => true,
            AccessScope::Assigned => self.actor_id == technician_id,
        }
    }

    /// 列表查询时需要强制附加的技术员过滤条件
    pub fn scoped_technician(&self) -> Option<&str> {
        match self.scope {
            AccessScope::All => None,
            AccessScope::Assigned => Some(self.actor_id.as_str()),
        }
    }
}
