// ==========================================
// 赛事分组排程引擎 - 报名与组别领域模型
// ==========================================
// 报名名单在生成时作为不可变快照传入
// ==========================================

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

// ==========================================
// Registration - 报名记录
// ==========================================
// team_size > 1 表示团队报名,按一个分配单位计
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Registration {
    pub registration_id: String,
    pub competition_id: String,
    pub competitor_id: String,
    pub division_id: String,
    pub team_size: i32,
    pub team_name: Option<String>,
    pub created_at: NaiveDateTime, // 名单顺序依据
}

impl Registration {
    pub fn is_team(&self) -> bool {
        self.team_size > 1
    }
}

// ==========================================
// Division - 组别
// ==========================================
// position 越小越靠前 (1 号位为主打组别)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Division {
    pub division_id: String,
    pub competition_id: String,
    pub label: String,
    pub position: i32,
}
