// ==========================================
// 赛事分组排程引擎 - 检录 API
// ==========================================
// 职责: 检录 / 撤销检录
// 检录端使用独立连接,多终端并发检录互不阻塞
// ==========================================

use std::sync::Arc;

use serde_json::json;

use crate::api::error::ApiResult;
use crate::api::heat_api::{record_action, require_id};
use crate::domain::action_log::{ActionLog, ActionType};
use crate::domain::heat::HeatAssignment;
use crate::engine::CheckInTracker;
use crate::repository::action_log_repo::ActionLogRepository;

/// 检录API
pub struct CheckInApi {
    tracker: Arc<CheckInTracker>,
    action_log_repo: Arc<ActionLogRepository>,
}

impl CheckInApi {
    /// 创建新的CheckInApi实例
    pub fn new(tracker: Arc<CheckInTracker>, action_log_repo: Arc<ActionLogRepository>) -> Self {
        Self {
            tracker,
            action_log_repo,
        }
    }

    /// 检录
    ///
    /// # 返回
    /// - Ok(HeatAssignment): 检录后的分配（重复检录返回原检录时间）
    /// - Err(ApiError::AssignmentNotFound): 分配已失效,请刷新
    pub fn check_in(&self, assignment_id: &str, operator: &str) -> ApiResult<HeatAssignment> {
        let assignment_id = require_id(assignment_id, "分配ID")?;
        let operator = require_id(operator, "操作人")?;

        let assignment = self.tracker.check_in(assignment_id)?;
        self.audit(ActionType::CheckIn, &assignment, operator);
        Ok(assignment)
    }

    /// 撤销检录
    pub fn undo_check_in(&self, assignment_id: &str, operator: &str) -> ApiResult<HeatAssignment> {
        let assignment_id = require_id(assignment_id, "分配ID")?;
        let operator = require_id(operator, "操作人")?;

        let assignment = self.tracker.undo_check_in(assignment_id)?;
        self.audit(ActionType::UndoCheckIn, &assignment, operator);
        Ok(assignment)
    }

    fn audit(&self, action_type: ActionType, assignment: &HeatAssignment, operator: &str) {
        record_action(
            &self.action_log_repo,
            &ActionLog::new(
                action_type,
                operator,
                Some(assignment.event_id.as_str()),
                Some(json!({
                    "assignment_id": assignment.assignment_id,
                    "heat_id": assignment.heat_id,
                    "registration_id": assignment.registration_id,
                    "check_in_at": assignment.check_in_at.map(|ts| ts.to_string()),
                })),
                None,
            ),
        );
    }
}
