// ==========================================
// 赛事分组排程引擎 - 排程协作方 Repository Trait
// ==========================================
// 职责: 定义引擎读取名单/组别/场地、读写热次排程的窄接口
// 实现者: RegistrationRepository / FloorRepository / HeatScheduleRepository（rusqlite）
// 红线: Repository 不含业务规则，只做数据 CRUD
// ==========================================

use crate::domain::floor::{CompetitionEvent, Floor};
use crate::domain::heat::{Heat, HeatAssignment, HeatWithAssignments};
use crate::domain::registration::{Division, Registration};
use crate::repository::error::RepositoryResult;
use chrono::NaiveDateTime;

// ==========================================
// RosterReader - 报名名单读取
// ==========================================
pub trait RosterReader: Send + Sync {
    /// 查询赛项所属赛事的报名名单（按报名先后顺序）
    fn list_registrations(&self, event_id: &str) -> RepositoryResult<Vec<Registration>>;
}

// ==========================================
// DivisionReader - 组别读取
// ==========================================
pub trait DivisionReader: Send + Sync {
    /// 查询赛项所属赛事的组别（按 position 升序）
    fn list_divisions(&self, event_id: &str) -> RepositoryResult<Vec<Division>>;
}

// ==========================================
// FloorReader - 场地/赛项读取
// ==========================================
pub trait FloorReader: Send + Sync {
    /// 查询赛项
    fn find_event(&self, event_id: &str) -> RepositoryResult<Option<CompetitionEvent>>;

    /// 查询属于该赛项所属赛事的场地
    ///
    /// # 返回
    /// - Ok(None): 场地不存在或不属于该赛事
    fn find_floor_for_event(&self, event_id: &str, floor_id: &str) -> RepositoryResult<Option<Floor>>;
}

// ==========================================
// HeatScheduleStore - 热次排程存储
// ==========================================
pub trait HeatScheduleStore: Send + Sync {
    /// 整体替换赛项排程（单事务：删除该赛项全部热次/分配 → 插入新热次 → 插入新分配）
    ///
    /// # 返回
    /// - Ok(ScheduleDeleteCount): 被替换掉的旧排程行数
    /// - Err: 事务失败（整体回滚）
    fn replace_schedule(
        &self,
        event_id: &str,
        heats: &[Heat],
        assignments: &[HeatAssignment],
    ) -> RepositoryResult<ScheduleDeleteCount>;

    /// 删除赛项全部热次/分配
    fn delete_schedule(&self, event_id: &str) -> RepositoryResult<ScheduleDeleteCount>;

    /// 查询赛项热次（含分配）
    fn find_heats_with_assignments(&self, event_id: &str) -> RepositoryResult<Vec<HeatWithAssignments>>;

    /// 查询单个分配
    fn get_assignment(&self, assignment_id: &str) -> RepositoryResult<Option<HeatAssignment>>;

    /// 写入检录时间（None 表示撤销）
    ///
    /// # 返回
    /// - Ok(rows): 受影响行数，0 表示分配已不存在
    fn update_check_in(
        &self,
        assignment_id: &str,
        check_in_at: Option<NaiveDateTime>,
    ) -> RepositoryResult<usize>;
}

/// 删除计数
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ScheduleDeleteCount {
    pub heats: usize,
    pub assignments: usize,
}
