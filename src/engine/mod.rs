// ==========================================
// 赛事分组排程引擎 - 引擎层
// ==========================================
// 职责: 热次规划、报名分配、检录状态机、生成编排
// 红线: Engine 不拼 SQL, 只通过 Repository Trait 读写
// ==========================================

pub mod allocator;
pub mod check_in;
pub mod error;
pub mod heat_planner;
pub mod orchestrator;
pub mod repositories;
pub mod strategy;

// 重导出核心引擎
pub use allocator::{verify_allocation, HeatAllocator};
pub use check_in::CheckInTracker;
pub use error::{HeatEngineError, HeatEngineResult};
pub use heat_planner::{division_groups, HeatPlanner};
pub use orchestrator::{
    GenerateHeatsRequest, GeneratedSchedule, GenerationLimits, HeatScheduleOrchestrator,
};
pub use repositories::HeatScheduleRepositories;
pub use strategy::AllocationStrategy;
