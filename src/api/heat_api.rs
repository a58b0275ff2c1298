// ==========================================
// 赛事分组排程引擎 - 热次排程 API
// ==========================================
// 职责: 生成/清空热次、查询赛项热次与未分配报名
// 红线: 所有写操作必须记录 ActionLog (审计失败只告警,不影响主操作)
// ==========================================

use std::sync::Arc;

use chrono::NaiveDateTime;
use serde_json::json;
use tracing::{info, warn};

use crate::api::error::{ApiError, ApiResult};
use crate::config::{ConfigManager, HeatConfigReader};
use crate::domain::action_log::{ActionLog, ActionType};
use crate::domain::heat::HeatWithAssignments;
use crate::domain::registration::Registration;
use crate::engine::{
    AllocationStrategy, GenerateHeatsRequest, GeneratedSchedule, HeatScheduleOrchestrator,
};
use crate::repository::action_log_repo::ActionLogRepository;
use crate::repository::heat_repo::HeatScheduleRepository;
use crate::repository::registration_repo::RegistrationRepository;
use crate::repository::schedule_store::{HeatScheduleStore, ScheduleDeleteCount};

/// 写入操作日志（失败只告警）
pub(crate) fn record_action(action_log_repo: &ActionLogRepository, log: &ActionLog) {
    if let Err(e) = action_log_repo.insert(log) {
        warn!(
            action_type = %log.action_type,
            event_id = ?log.event_id,
            error = %e,
            "操作日志写入失败"
        );
    }
}

/// 校验必填ID
pub(crate) fn require_id<'a>(value: &'a str, name: &str) -> ApiResult<&'a str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ApiError::InvalidInput(format!("{}不能为空", name)));
    }
    Ok(trimmed)
}

// ==========================================
// HeatApi - 热次排程 API
// ==========================================

/// 热次排程API
///
/// 职责：
/// 1. 生成热次（显式参数 / 配置默认值）
/// 2. 清空赛项热次
/// 3. 查询赛项热次、未分配报名
/// 4. ActionLog记录
pub struct HeatApi {
    orchestrator: Arc<HeatScheduleOrchestrator>,
    heat_repo: Arc<HeatScheduleRepository>,
    registration_repo: Arc<RegistrationRepository>,
    action_log_repo: Arc<ActionLogRepository>,
    config: Arc<ConfigManager>,
}

impl HeatApi {
    /// 创建新的HeatApi实例
    pub fn new(
        orchestrator: Arc<HeatScheduleOrchestrator>,
        heat_repo: Arc<HeatScheduleRepository>,
        registration_repo: Arc<RegistrationRepository>,
        action_log_repo: Arc<ActionLogRepository>,
        config: Arc<ConfigManager>,
    ) -> Self {
        Self {
            orchestrator,
            heat_repo,
            registration_repo,
            action_log_repo,
            config,
        }
    }

    /// 生成赛项热次（全量替换）
    ///
    /// # 参数
    /// - event_id: 赛项ID
    /// - floor_id: 场地ID
    /// - start_time: 第一个热次开始时间
    /// - heat_duration_minutes: 热次时长（1..=上限）
    /// - transition_minutes: 换场间隔（0..=上限）
    /// - keep_divisions_pure: 是否按组别分热次
    /// - operator: 操作人
    ///
    /// # 返回
    /// - Ok(GeneratedSchedule): 新热次（含分配）
    /// - Err(ApiError::InvalidConfiguration): 参数或场地不合法
    #[allow(clippy::too_many_arguments)]
    pub fn generate_heats(
        &self,
        event_id: &str,
        floor_id: &str,
        start_time: NaiveDateTime,
        heat_duration_minutes: i64,
        transition_minutes: i64,
        keep_divisions_pure: bool,
        operator: &str,
    ) -> ApiResult<GeneratedSchedule> {
        let event_id = require_id(event_id, "赛项ID")?;
        let floor_id = require_id(floor_id, "场地ID")?;
        let operator = require_id(operator, "操作人")?;

        let request = GenerateHeatsRequest {
            event_id: event_id.to_string(),
            floor_id: floor_id.to_string(),
            start_time,
            heat_duration_minutes,
            transition_minutes,
            strategy: AllocationStrategy::from_keep_divisions_pure(keep_divisions_pure),
        };

        let result = self.orchestrator.generate(&request)?;

        let config_snapshot = match self.config.get_config_snapshot() {
            Ok(raw) => serde_json::from_str::<serde_json::Value>(&raw).ok(),
            Err(e) => {
                warn!(error = %e, "配置快照读取失败");
                None
            }
        };

        record_action(
            &self.action_log_repo,
            &ActionLog::new(
                ActionType::GenerateHeats,
                operator,
                Some(event_id),
                Some(json!({
                    "floor_id": floor_id,
                    "start_time": start_time.to_string(),
                    "heat_duration_minutes": heat_duration_minutes,
                    "transition_minutes": transition_minutes,
                    "strategy": request.strategy.as_str(),
                    "heat_count": result.heat_count(),
                    "assignment_count": result.assignment_count(),
                    "replaced_heats": result.replaced.heats,
                    "replaced_assignments": result.replaced.assignments,
                    "config_snapshot": config_snapshot,
                })),
                Some(format!(
                    "{}: {}个热次, {}名选手",
                    request.strategy.title_cn(),
                    result.heat_count(),
                    result.assignment_count()
                )),
            ),
        );

        Ok(result)
    }

    /// 生成赛项热次（省略的参数取配置默认值）
    #[allow(clippy::too_many_arguments)]
    pub async fn generate_heats_with_defaults(
        &self,
        event_id: &str,
        floor_id: &str,
        start_time: NaiveDateTime,
        heat_duration_minutes: Option<i64>,
        transition_minutes: Option<i64>,
        keep_divisions_pure: Option<bool>,
        operator: &str,
    ) -> ApiResult<GeneratedSchedule> {
        let heat_duration_minutes = match heat_duration_minutes {
            Some(v) => v,
            None => self
                .config
                .get_default_heat_duration_minutes()
                .await
                .map_err(|e| ApiError::InternalError(format!("读取默认热次时长失败: {}", e)))?,
        };
        let transition_minutes = match transition_minutes {
            Some(v) => v,
            None => self
                .config
                .get_default_transition_minutes()
                .await
                .map_err(|e| ApiError::InternalError(format!("读取默认换场间隔失败: {}", e)))?,
        };
        let keep_divisions_pure = match keep_divisions_pure {
            Some(v) => v,
            None => self
                .config
                .get_default_keep_divisions_pure()
                .await
                .map_err(|e| ApiError::InternalError(format!("读取默认分组策略失败: {}", e)))?,
        };

        self.generate_heats(
            event_id,
            floor_id,
            start_time,
            heat_duration_minutes,
            transition_minutes,
            keep_divisions_pure,
            operator,
        )
    }

    /// 清空赛项全部热次/分配
    ///
    /// # 返回
    /// - Ok(ScheduleDeleteCount): 删除的热次/分配数量
    pub fn clear_heats(&self, event_id: &str, operator: &str) -> ApiResult<ScheduleDeleteCount> {
        let event_id = require_id(event_id, "赛项ID")?;
        let operator = require_id(operator, "操作人")?;

        let deleted = self.orchestrator.clear(event_id)?;

        record_action(
            &self.action_log_repo,
            &ActionLog::new(
                ActionType::ClearHeats,
                operator,
                Some(event_id),
                Some(json!({
                    "heats": deleted.heats,
                    "assignments": deleted.assignments,
                })),
                None,
            ),
        );

        info!(event_id = event_id, heats = deleted.heats, "清空热次完成");
        Ok(deleted)
    }

    /// 查询赛项热次（按 heat_number 排序,分配按道次/填充顺序）
    pub fn get_heats_for_event(&self, event_id: &str) -> ApiResult<Vec<HeatWithAssignments>> {
        let event_id = require_id(event_id, "赛项ID")?;
        Ok(self.heat_repo.find_heats_with_assignments(event_id)?)
    }

    /// 查询尚未分配热次的报名（上次生成之后新增的报名）
    pub fn list_unassigned_registrations(&self, event_id: &str) -> ApiResult<Vec<Registration>> {
        let event_id = require_id(event_id, "赛项ID")?;
        Ok(self.registration_repo.list_unassigned(event_id)?)
    }
}
