// ==========================================
// 赛事分组排程引擎 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================
// 职责: 提供数据访问接口,屏蔽数据库细节
// 约束: 所有查询使用参数化,防止 SQL 注入
// ==========================================

pub mod action_log_repo;
pub mod error;
pub mod floor_repo;
pub mod heat_repo;
pub mod registration_repo;
pub mod schedule_store;

// 重导出核心仓储
pub use action_log_repo::ActionLogRepository;
pub use error::{RepositoryError, RepositoryResult};
pub use floor_repo::FloorRepository;
pub use heat_repo::{AthleteHeatEntity, HeatScheduleRepository, ScheduledHeatEntity};
pub use registration_repo::RegistrationRepository;
pub use schedule_store::{
    DivisionReader, FloorReader, HeatScheduleStore, RosterReader, ScheduleDeleteCount,
};
