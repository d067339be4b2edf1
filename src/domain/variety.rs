// ==========================================
// 农作物种植监测系统 - 品种主数据
// ==========================================

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

// ==========================================
// Variety - 作物品种
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variety {
    pub variety_id: String,
    pub crop_name: String,          // 作物名称（如 White / Yellow）
    pub name: String,               // 品种名称
    pub maturity_days: Option<i32>, // 成熟天数（未知为 None）
}

impl Variety {
    /// 根据种植日期推算预计收获日期
    pub fn expected_harvest_date(&self, planting_date: NaiveDate) -> Option<NaiveDate> {
        expected_harvest_date(planting_date, self.maturity_days)
    }
}

/// 预计收获日期 = 种植日期 + 成熟天数
///
/// 成熟天数缺失或为负时返回 None
pub fn expected_harvest_date(planting_date: NaiveDate, maturity_days: Option<i32>) -> Option<NaiveDate> {
    match maturity_days {
        Some(days) if days >= 0 => planting_date.checked_add_signed(Duration::days(days as i64)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expected_harvest_date() {
        let planted = NaiveDate::from_ymd_opt(2025, 4, 1).unwrap();
        assert_eq!(
            expected_harvest_date(planted, Some(110)),
            NaiveDate::from_ymd_opt(2025, 7, 20)
        );
        assert_eq!(expected_harvest_date(planted, Some(0)), Some(planted));
        assert_eq!(expected_harvest_date(planted, None), None);
        assert_eq!(expected_harvest_date(planted, Some(-3)), None);
    }
}
