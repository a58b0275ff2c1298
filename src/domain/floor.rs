// ==========================================
// 赛事分组排程引擎 - 场地与赛项领域模型
// ==========================================
// 场地由外部 CRUD 维护,引擎只读
// ==========================================

use crate::domain::capacity::CapacityModel;
use crate::domain::types::CapacityKind;
use serde::{Deserialize, Serialize};

// ==========================================
// Floor - 比赛场地
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Floor {
    pub floor_id: String,
    pub competition_id: String,
    pub name: String,
    pub capacity: i32,               // 每组人数上限 (LANES 口径下即道次数)
    pub capacity_kind: CapacityKind,
    pub position: i32,               // 展示顺序
}

impl Floor {
    /// 场地容量模型,capacity <= 0 时为 None
    pub fn capacity_model(&self) -> Option<CapacityModel> {
        CapacityModel::new(self.capacity, self.capacity_kind)
    }
}

// ==========================================
// CompetitionEvent - 赛项 (一次计分的训练项目)
// ==========================================
// 引擎只关心 id 与顺序,不关心计分规则
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompetitionEvent {
    pub event_id: String,
    pub competition_id: String,
    pub name: String,
    pub position: i32,
}
