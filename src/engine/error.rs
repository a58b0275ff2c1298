// ==========================================
// 赛事分组排程引擎 - 引擎层错误类型
// ==========================================
// 工具: thiserror 派生宏
// 约束: 引擎内部不重试,一律上抛
// ==========================================

use crate::repository::error::RepositoryError;
use thiserror::Error;

/// 引擎层错误类型
#[derive(Error, Debug)]
pub enum HeatEngineError {
    /// 生成参数或场地配置不合法（在规划前拒绝）
    #[error("配置无效: {0}")]
    InvalidConfiguration(String),

    /// 检录引用的分配已不存在（通常是与重新生成并发）
    #[error("分配不存在或已失效: {assignment_id}")]
    AssignmentNotFound { assignment_id: String },

    /// 规划与分配结果不一致（落库前拦截）
    #[error("分配结果校验失败: {0}")]
    AllocationInvariant(String),

    #[error(transparent)]
    Store(#[from] RepositoryError),
}

/// Result 类型别名
pub type HeatEngineResult<T> = Result<T, HeatEngineError>;
