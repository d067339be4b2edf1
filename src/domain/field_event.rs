// ==========================================
// 农作物种植监测系统 - 巡查与收获事件
// ==========================================
// 依据: crop_inspections / harvest_reports 表
// 红线: 事件只追加，不修改；面积在创建时一次性扣减
// ==========================================

use crate::domain::area::Area;
use crate::domain::types::GrowthStage;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

// ==========================================
// Inspection - 巡查记录
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Inspection {
    pub inspection_id: String,
    pub planting_id: String,
    pub technician_id: String,
    pub inspection_date: NaiveDate,
    pub remarks: String,
    pub damaged_area: Area, // 本次受损面积（>0）
    pub growth_stage: Option<GrowthStage>,
    pub created_at: NaiveDateTime,
}

// ==========================================
// HarvestReport - 收获报告
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HarvestReport {
    pub report_id: String,
    pub planting_id: String,
    pub technician_id: String,
    pub harvest_date: NaiveDate,
    pub area_harvested: Area, // 本次收获面积（>0，≤ 剩余面积）
    pub total_yield: f64,     // 总产量
    pub profit: f64,          // 收益（默认0）
    pub damage_quantity: f64, // 损耗数量（默认0）
    pub created_at: NaiveDateTime,
}

// ==========================================
// EventPage - 游标分页结果
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventPage<T> {
    pub data: Vec<T>,
    /// 下一页游标（None 表示没有更多数据）
    pub next_cursor: Option<usize>,
}

// ==========================================
// EventQuery - 事件列表查询条件
// ==========================================
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventQuery {
    pub planting_id: Option<String>,
    pub technician_id: Option<String>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    pub cursor: usize,
}

impl EventQuery {
    /// 日期区间是否合法（dateTo 不得早于 dateFrom）
    pub fn has_valid_range(&self) -> bool {
        match (self.date_from, self.date_to) {
            (Some(from), Some(to)) => to >= from,
            _ => true,
        }
    }
}

impl<T> EventPage<T> {
    /// 由仓储返回的 page_size + 1 条结果构造分页
    ///
    /// 游标溢出时视为没有下一页
    pub fn from_rows(mut rows: Vec<T>, cursor: usize, page_size: usize) -> Self {
        let next_cursor = if rows.len() > page_size {
            rows.truncate(page_size);
            cursor.checked_add(page_size)
        } else {
            None
        };
        Self {
            data: rows,
            next_cursor,
        }
    }
}

// ==========================================
// NewInspection - 登记巡查请求
// ==========================================
// 数值已由调用方完成格式校验
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewInspection {
    pub planting_id: String,
    pub inspection_date: NaiveDate,
    pub damaged_area_ha: f64,
    pub remarks: String,
    pub growth_stage: Option<GrowthStage>,
}

// ==========================================
// NewHarvestReport - 登记收获请求
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewHarvestReport {
    pub planting_id: String,
    pub harvest_date: NaiveDate,
    pub area_harvested_ha: f64,
    pub total_yield: f64,
    pub profit: Option<f64>,
    pub damage_quantity: Option<f64>,
}
