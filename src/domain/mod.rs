// ==========================================
// 赛事分组排程引擎 - 领域模型层
// ==========================================
// 职责: 定义领域实体、值类型
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod action_log;
pub mod capacity;
pub mod floor;
pub mod heat;
pub mod registration;
pub mod types;

// 重导出核心类型
pub use action_log::{ActionLog, ActionType};
pub use capacity::{CapacityModel, HeatTiming, HeatWindow};
pub use floor::{CompetitionEvent, Floor};
pub use heat::{Heat, HeatAssignment, HeatSlot, HeatWithAssignments, PlannedAssignment};
pub use registration::{Division, Registration};
pub use types::{CapacityKind, CheckInState};
