// ==========================================
// 赛事分组排程引擎 - 分组策略定义
// ==========================================
// 用途：
// - 生成时由调用方选择（keep_divisions_pure 布尔值映射而来）；
// - 规划器与分配器都只按策略分支，新增策略不改动填充循环。

use serde::{Deserialize, Serialize};

/// 热次分组策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AllocationStrategy {
    /// 不区分组别,全部报名按名单顺序填充
    Mixed,
    /// 每个热次只包含一个组别
    PureByDivision,
}

impl AllocationStrategy {
    pub fn from_keep_divisions_pure(keep_divisions_pure: bool) -> Self {
        if keep_divisions_pure {
            AllocationStrategy::PureByDivision
        } else {
            AllocationStrategy::Mixed
        }
    }

    pub fn keeps_divisions_pure(&self) -> bool {
        matches!(self, AllocationStrategy::PureByDivision)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AllocationStrategy::Mixed => "mixed",
            AllocationStrategy::PureByDivision => "pure_by_division",
        }
    }

    pub fn title_cn(&self) -> &'static str {
        match self {
            AllocationStrategy::Mixed => "混合分组",
            AllocationStrategy::PureByDivision => "按组别分组",
        }
    }
}

impl Default for AllocationStrategy {
    fn default() -> Self {
        AllocationStrategy::PureByDivision
    }
}

impl std::fmt::Display for AllocationStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AllocationStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "mixed" => Ok(AllocationStrategy::Mixed),
            "pure_by_division" | "pure-by-division" | "pure" => {
                Ok(AllocationStrategy::PureByDivision)
            }
            other => Err(format!("未知分组策略: {}", other)),
        }
    }
}
