// ==========================================
// 赛事分组排程引擎 - 检录跟踪器
// ==========================================
// 状态机: 未检录 (check_in_at = NULL) <-> 已检录 (check_in_at = 时间戳)
// 检录/撤销均为单条分配的细粒度写入,互不排序
// 分配已被重新生成删除时返回 AssignmentNotFound,不重试
// ==========================================

use crate::domain::heat::HeatAssignment;
use crate::engine::error::{HeatEngineError, HeatEngineResult};
use crate::repository::schedule_store::HeatScheduleStore;
use chrono::{NaiveDateTime, Timelike, Utc};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

// ==========================================
// CheckInTracker - 检录跟踪器
// ==========================================
pub struct CheckInTracker {
    store: Arc<dyn HeatScheduleStore>,
}

impl CheckInTracker {
    pub fn new(store: Arc<dyn HeatScheduleStore>) -> Self {
        Self { store }
    }

    /// 检录（使用当前 UTC 时间,与操作日志同一时钟）
    pub fn check_in(&self, assignment_id: &str) -> HeatEngineResult<HeatAssignment> {
        self.check_in_at(assignment_id, Utc::now().naive_utc())
    }

    /// 检录（指定时间）
    ///
    /// 已检录的分配直接返回,时间戳保持首次检录时间
    #[instrument(skip(self))]
    pub fn check_in_at(
        &self,
        assignment_id: &str,
        now: NaiveDateTime,
    ) -> HeatEngineResult<HeatAssignment> {
        let assignment = self.load(assignment_id)?;
        if assignment.check_in_state().is_checked_in() {
            debug!(assignment_id = assignment_id, "已检录,忽略重复检录");
            return Ok(assignment);
        }

        // 存储精度为秒
        let now = now.with_nanosecond(0).unwrap_or(now);
        self.write(assignment_id, Some(now))?;

        info!(
            assignment_id = assignment_id,
            registration_id = %assignment.registration_id,
            "检录完成"
        );
        Ok(HeatAssignment {
            check_in_at: Some(now),
            ..assignment
        })
    }

    /// 撤销检录
    ///
    /// 未检录的分配直接返回
    #[instrument(skip(self))]
    pub fn undo_check_in(&self, assignment_id: &str) -> HeatEngineResult<HeatAssignment> {
        let assignment = self.load(assignment_id)?;
        if !assignment.check_in_state().is_checked_in() {
            debug!(assignment_id = assignment_id, "未检录,忽略撤销");
            return Ok(assignment);
        }

        self.write(assignment_id, None)?;

        info!(
            assignment_id = assignment_id,
            registration_id = %assignment.registration_id,
            "已撤销检录"
        );
        Ok(HeatAssignment {
            check_in_at: None,
            ..assignment
        })
    }

    fn load(&self, assignment_id: &str) -> HeatEngineResult<HeatAssignment> {
        self.store.get_assignment(assignment_id)?.ok_or_else(|| {
            warn!(assignment_id = assignment_id, "分配不存在,可能已被重新生成");
            HeatEngineError::AssignmentNotFound {
                assignment_id: assignment_id.to_string(),
            }
        })
    }

    fn write(&self, assignment_id: &str, check_in_at: Option<NaiveDateTime>) -> HeatEngineResult<()> {
        let rows = self.store.update_check_in(assignment_id, check_in_at)?;
        if rows == 0 {
            // 读取与写入之间被清空/重新生成
            warn!(assignment_id = assignment_id, "写入检录时分配已被删除");
            return Err(HeatEngineError::AssignmentNotFound {
                assignment_id: assignment_id.to_string(),
            });
        }
        Ok(())
    }
}
