// ==========================================
// 赛事分组排程引擎 - 热次配置读取 Trait
// ==========================================
// 职责: 定义热次生成所需的配置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use async_trait::async_trait;
use std::error::Error;

// ==========================================
// HeatConfigReader Trait
// ==========================================
// 用途: 调用方省略生成参数时的默认值来源
// 实现者: ConfigManager（从 config_kv 表读取）
#[async_trait]
pub trait HeatConfigReader: Send + Sync {
    // ===== 默认生成参数 =====

    /// 获取默认热次时长（分钟）
    ///
    /// # 默认值
    /// - 15
    async fn get_default_heat_duration_minutes(&self) -> Result<i64, Box<dyn Error>>;

    /// 获取默认换场间隔（分钟）
    ///
    /// # 默认值
    /// - 5
    async fn get_default_transition_minutes(&self) -> Result<i64, Box<dyn Error>>;

    /// 获取默认是否按组别分热次
    ///
    /// # 返回
    /// - true: PureByDivision
    /// - false: Mixed
    ///
    /// # 默认值
    /// - true
    async fn get_default_keep_divisions_pure(&self) -> Result<bool, Box<dyn Error>>;

    // ===== 输入上限 =====

    /// 获取热次时长上限（分钟）
    ///
    /// # 默认值
    /// - 120
    async fn get_max_heat_duration_minutes(&self) -> Result<i64, Box<dyn Error>>;

    /// 获取换场间隔上限（分钟）
    ///
    /// # 默认值
    /// - 60
    async fn get_max_transition_minutes(&self) -> Result<i64, Box<dyn Error>>;
}
