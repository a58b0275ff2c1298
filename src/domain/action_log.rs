// ==========================================
// 赛事分组排程引擎 - 操作日志领域模型
// ==========================================
// 红线: 所有写操作必须留痕
// 用途: 审计追踪 (谁在何时生成/清空热次、检录/撤销检录)
// ==========================================

use chrono::{NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;
use uuid::Uuid;

// ==========================================
// ActionLog - 操作日志
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionLog {
    pub action_id: String,
    pub event_id: Option<String>,        // 关联赛项 (检录操作可能只知道 assignment)
    pub action_type: String,             // 存储为字符串
    pub action_ts: NaiveDateTime,
    pub actor: String,
    pub payload_json: Option<JsonValue>, // 操作参数
    pub detail: Option<String>,
}

impl ActionLog {
    /// 构造一条新日志（action_id 自动生成, action_ts 取当前 UTC）
    pub fn new(
        action_type: ActionType,
        actor: &str,
        event_id: Option<&str>,
        payload_json: Option<JsonValue>,
        detail: Option<String>,
    ) -> Self {
        Self {
            action_id: Uuid::new_v4().to_string(),
            event_id: event_id.map(|s| s.to_string()),
            action_type: action_type.to_string(),
            action_ts: Utc::now().naive_utc(),
            actor: actor.to_string(),
            payload_json,
            detail,
        }
    }
}

// ==========================================
// ActionType - 操作类型
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionType {
    GenerateHeats, // 生成热次
    ClearHeats,    // 清空热次
    CheckIn,       // 检录
    UndoCheckIn,   // 撤销检录
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionType::GenerateHeats => write!(f, "GenerateHeats"),
            ActionType::ClearHeats => write!(f, "ClearHeats"),
            ActionType::CheckIn => write!(f, "CheckIn"),
            ActionType::UndoCheckIn => write!(f, "UndoCheckIn"),
        }
    }
}
