// ==========================================
// 赛事分组排程引擎 - 热次与分配领域模型
// ==========================================
// 热次/分配只由生成流程创建,只由清空或下一次生成删除
// check_in_at 只由检录跟踪器修改
// ==========================================

use crate::domain::capacity::HeatWindow;
use crate::domain::types::CheckInState;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

// ==========================================
// HeatSlot - 规划热次 (尚未落库,无 id)
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeatSlot {
    pub heat_number: i32,                    // 1 起,按赛项连续编号
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
    pub target_division_id: Option<String>, // None = 混合组
}

impl HeatSlot {
    pub fn window(&self) -> HeatWindow {
        HeatWindow {
            start: self.start_time,
            end: self.end_time,
        }
    }
}

// ==========================================
// PlannedAssignment - 规划分配 (绑定到 heat_number)
// ==========================================
// 热次落库拿到 heat_id 后再转为 HeatAssignment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannedAssignment {
    pub heat_number: i32,
    pub registration_id: String,
    pub lane_number: Option<i32>,
}

// ==========================================
// Heat - 热次
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Heat {
    pub heat_id: String,
    pub event_id: String,
    pub floor_id: String,
    pub heat_number: i32,
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
    pub target_division_id: Option<String>,
}

impl Heat {
    pub fn window(&self) -> HeatWindow {
        HeatWindow {
            start: self.start_time,
            end: self.end_time,
        }
    }

    pub fn is_mixed(&self) -> bool {
        self.target_division_id.is_none()
    }
}

// ==========================================
// HeatAssignment - 热次分配
// ==========================================
// 约束: 每个 (event_id, registration_id) 同一时刻只有一条
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeatAssignment {
    pub assignment_id: String,
    pub heat_id: String,
    pub event_id: String,
    pub registration_id: String,
    pub lane_number: Option<i32>,
    pub check_in_at: Option<NaiveDateTime>,
}

impl HeatAssignment {
    pub fn check_in_state(&self) -> CheckInState {
        CheckInState::from_timestamp(self.check_in_at)
    }
}

// ==========================================
// HeatWithAssignments - 热次 + 分配 (展示用)
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeatWithAssignments {
    pub heat: Heat,
    pub floor_name: Option<String>,
    pub division_label: Option<String>, // None = 混合组
    pub assignments: Vec<HeatAssignment>,
}

impl HeatWithAssignments {
    pub fn athlete_count(&self) -> usize {
        self.assignments.len()
    }

    pub fn checked_in_count(&self) -> usize {
        self.assignments
            .iter()
            .filter(|a| a.check_in_at.is_some())
            .count()
    }
}
