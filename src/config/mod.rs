// ==========================================
// 赛事分组排程引擎 - 配置层
// ==========================================
// 职责: 生成参数默认值与输入上限
// 存储: config_kv 表
// ==========================================

pub mod config_manager;
pub mod heat_config_trait;

// 重导出核心配置管理器
pub use config_manager::{config_keys, ConfigManager};
pub use heat_config_trait::HeatConfigReader;
