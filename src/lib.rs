// ==========================================
// 赛事分组排程引擎 - 核心库
// ==========================================
// 职责: 按场地容量把报名分入热次、分配时间/道次、跟踪检录状态
// 技术栈: Rust + SQLite
// 定位: 服务端权威操作,调用方已完成权限校验
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 规划/分配/检录
pub mod engine;

// 配置层 - 默认参数与上限
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一/建表）
pub mod db;

// 日志系统
pub mod logging;

// API 层 - 业务接口
pub mod api;

// 应用层 - 组装
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{CapacityKind, CheckInState};

// 领域实体
pub use domain::{
    ActionLog, ActionType, CapacityModel, CompetitionEvent, Division, Floor, Heat,
    HeatAssignment, HeatSlot, HeatTiming, HeatWithAssignments, Registration,
};

// 引擎
pub use engine::{
    AllocationStrategy, CheckInTracker, GenerateHeatsRequest, HeatAllocator, HeatPlanner,
    HeatScheduleOrchestrator,
};

// API
pub use api::{ApiError, ApiResult, CheckInApi, HeatApi, ScheduleApi};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "赛事分组排程引擎";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
        assert!(!APP_NAME.is_empty());
    }
}
