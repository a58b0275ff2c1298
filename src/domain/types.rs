// ==========================================
// 赛事分组排程引擎 - 领域类型定义
// ==========================================
// 职责: 容量口径、检录状态等枚举
// 序列化格式: SCREAMING_SNAKE_CASE (与数据库一致)
// ==========================================

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 容量口径 (Capacity Kind)
// ==========================================
// HEADCOUNT: 场地只限制每组人数,不分道
// LANES: 场地按道次计容量,分配时顺序编道
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CapacityKind {
    Headcount,
    Lanes,
}

impl CapacityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CapacityKind::Headcount => "HEADCOUNT",
            CapacityKind::Lanes => "LANES",
        }
    }
}

impl Default for CapacityKind {
    fn default() -> Self {
        CapacityKind::Headcount
    }
}

impl fmt::Display for CapacityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for CapacityKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "HEADCOUNT" => Ok(CapacityKind::Headcount),
            "LANES" => Ok(CapacityKind::Lanes),
            other => Err(format!("未知容量口径: {}", other)),
        }
    }
}

// ==========================================
// 检录状态 (Check-in State)
// ==========================================
// 两态: 未检录 <-> 已检录
// 由 heat_assignment.check_in_at 是否为空派生,不单独落库
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CheckInState {
    NotCheckedIn,
    CheckedIn { at: NaiveDateTime },
}

impl CheckInState {
    pub fn from_timestamp(check_in_at: Option<NaiveDateTime>) -> Self {
        match check_in_at {
            Some(at) => CheckInState::CheckedIn { at },
            None => CheckInState::NotCheckedIn,
        }
    }

    pub fn is_checked_in(&self) -> bool {
        matches!(self, CheckInState::CheckedIn { .. })
    }
}

impl fmt::Display for CheckInState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CheckInState::NotCheckedIn => write!(f, "NOT_CHECKED_IN"),
            CheckInState::CheckedIn { .. } => write!(f, "CHECKED_IN"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_capacity_kind_parse() {
        assert_eq!("lanes".parse::<CapacityKind>().unwrap(), CapacityKind::Lanes);
        assert_eq!(" HEADCOUNT ".parse::<CapacityKind>().unwrap(), CapacityKind::Headcount);
        assert!("rows".parse::<CapacityKind>().is_err());
    }

    #[test]
    fn test_check_in_state_from_timestamp() {
        assert_eq!(CheckInState::from_timestamp(None), CheckInState::NotCheckedIn);

        let at = NaiveDate::from_ymd_opt(2026, 3, 14)
            .unwrap()
            .and_hms_opt(8, 45, 0)
            .unwrap();
        let state = CheckInState::from_timestamp(Some(at));
        assert!(state.is_checked_in());
        assert_eq!(state.to_string(), "CHECKED_IN");
    }
}
