// ==========================================
// 农作物种植监测系统 - 面积值对象
// ==========================================
// 存储: 以 0.01 公顷为单位的整数（对齐 decimal(10,2)）
// 红线: 面积加减必须精确，不允许浮点误差破坏面积守恒
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Sub, SubAssign};

/// 每公顷对应的最小单位数
const UNITS_PER_HECTARE: i64 = 100;

// ==========================================
// Area - 面积（公顷，两位小数）
// ==========================================
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Area(i64);

impl Area {
    pub const ZERO: Area = Area(0);

    /// 从最小单位（0.01 公顷）构造
    pub const fn from_hundredths(units: i64) -> Self {
        Area(units)
    }

    /// 从公顷数值构造，四舍五入到两位小数
    pub fn from_hectares(hectares: f64) -> Self {
        Area((hectares * UNITS_PER_HECTARE as f64).round() as i64)
    }

    /// 最小单位数（用于落库）
    pub const fn hundredths(self) -> i64 {
        self.0
    }

    /// 转换为公顷
    pub fn as_hectares(self) -> f64 {
        self.0 as f64 / UNITS_PER_HECTARE as f64
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }

    pub fn is_positive(self) -> bool {
        self.0 > 0
    }

    pub fn is_negative(self) -> bool {
        self.0 < 0
    }
}

impl fmt::Display for Area {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(
            f,
            "{}{}.{:02} ha",
            sign,
            abs / UNITS_PER_HECTARE as u64,
            abs % UNITS_PER_HECTARE as u64
        )
    }
}

impl Add for Area {
    type Output = Area;

    fn add(self, rhs: Area) -> Area {
        Area(self.0 + rhs.0)
    }
}

impl AddAssign for Area {
    fn add_assign(&mut self, rhs: Area) {
        self.0 += rhs.0;
    }
}

impl Sub for Area {
    type Output = Area;

    fn sub(self, rhs: Area) -> Area {
        Area(self.0 - rhs.0)
    }
}

impl SubAssign for Area {
    fn sub_assign(&mut self, rhs: Area) {
        self.0 -= rhs.0;
    }
}
