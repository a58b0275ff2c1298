// ==========================================
// 赛事分组排程引擎 - API 层
// ==========================================
// 职责: 提供业务 API 接口,供 CLI / 上层服务调用
// 约束: 调用方已完成权限校验; 所有操作显式传入ID,不读取隐式会话状态
// ==========================================

pub mod check_in_api;
pub mod error;
pub mod heat_api;
pub mod schedule_api;

// 重导出核心类型
pub use check_in_api::CheckInApi;
pub use error::{ApiError, ApiResult};
pub use heat_api::HeatApi;
pub use schedule_api::{
    AthleteHeatSchedule, ScheduleApi, ScheduleDay, ScheduledHeatSummary, MIXED_DIVISION_LABEL,
};
