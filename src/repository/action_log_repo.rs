// ==========================================
// 赛事分组排程引擎 - 操作日志数据仓储
// ==========================================
// 红线: 所有写操作必须留痕
// ==========================================

mod core;
mod queries;


pub use core::ActionLogRepository;
