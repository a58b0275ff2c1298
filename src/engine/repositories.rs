// ==========================================
// 赛事分组排程引擎 - 引擎层仓储聚合
// ==========================================
// 职责: 聚合排程编排器所需的协作方接口
// 目标: 编排器只依赖窄接口,测试时可整体替换
// ==========================================

use std::sync::Arc;

use crate::repository::{DivisionReader, FloorReader, HeatScheduleStore, RosterReader};

/// 热次排程仓储集合
///
/// # 包含的仓储
/// - `roster`: 报名名单读取
/// - `divisions`: 组别读取
/// - `floors`: 赛项/场地读取
/// - `schedule`: 热次排程读写
#[derive(Clone)]
pub struct HeatScheduleRepositories {
    /// 报名名单
    pub roster: Arc<dyn RosterReader>,
    /// 组别
    pub divisions: Arc<dyn DivisionReader>,
    /// 赛项/场地
    pub floors: Arc<dyn FloorReader>,
    /// 热次排程
    pub schedule: Arc<dyn HeatScheduleStore>,
}

impl HeatScheduleRepositories {
    /// 创建新的仓储集合
    pub fn new(
        roster: Arc<dyn RosterReader>,
        divisions: Arc<dyn DivisionReader>,
        floors: Arc<dyn FloorReader>,
        schedule: Arc<dyn HeatScheduleStore>,
    ) -> Self {
        Self {
            roster,
            divisions,
            floors,
            schedule,
        }
    }

    /// 获取报名名单读取器
    pub fn roster(&self) -> &Arc<dyn RosterReader> {
        &self.roster
    }

    /// 获取组别读取器
    pub fn divisions(&self) -> &Arc<dyn DivisionReader> {
        &self.divisions
    }

    /// 获取场地读取器
    pub fn floors(&self) -> &Arc<dyn FloorReader> {
        &self.floors
    }

    /// 获取热次排程存储
    pub fn schedule(&self) -> &Arc<dyn HeatScheduleStore> {
        &self.schedule
    }
}
