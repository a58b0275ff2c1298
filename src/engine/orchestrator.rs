// ==========================================
// 赛事分组排程引擎 - 排程生成编排器
// ==========================================
// 用途: 协调 规划器 → 分配器 → 存储 的执行顺序
// 红线: 校验先于规划; 落库为单事务全量替换 (整个赛项,不限场地)
// ==========================================

use crate::domain::capacity::HeatTiming;
use crate::domain::heat::{Heat, HeatAssignment, HeatWithAssignments};
use crate::engine::allocator::{verify_allocation, HeatAllocator};
use crate::engine::error::{HeatEngineError, HeatEngineResult};
use crate::engine::heat_planner::HeatPlanner;
use crate::engine::repositories::HeatScheduleRepositories;
use crate::engine::strategy::AllocationStrategy;
use crate::repository::schedule_store::ScheduleDeleteCount;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, info, instrument};
use uuid::Uuid;

// ==========================================
// GenerateHeatsRequest - 生成参数
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerateHeatsRequest {
    pub event_id: String,
    pub floor_id: String,
    pub start_time: NaiveDateTime,
    pub heat_duration_minutes: i64,
    pub transition_minutes: i64,
    pub strategy: AllocationStrategy,
}

// ==========================================
// GenerationLimits - 生成参数上限
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationLimits {
    pub max_heat_duration_minutes: i64,
    pub max_transition_minutes: i64,
}

impl Default for GenerationLimits {
    fn default() -> Self {
        Self {
            max_heat_duration_minutes: 120,
            max_transition_minutes: 60,
        }
    }
}

// ==========================================
// GeneratedSchedule - 生成结果
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedSchedule {
    pub event_id: String,
    pub floor_id: String,
    pub strategy: AllocationStrategy,
    pub heats: Vec<HeatWithAssignments>,
    /// 被替换掉的旧排程行数
    pub replaced: ScheduleDeleteCount,
}

impl GeneratedSchedule {
    pub fn heat_count(&self) -> usize {
        self.heats.len()
    }

    pub fn assignment_count(&self) -> usize {
        self.heats.iter().map(|h| h.assignments.len()).sum()
    }
}

// ==========================================
// HeatScheduleOrchestrator - 排程生成编排器
// ==========================================
pub struct HeatScheduleOrchestrator {
    repos: HeatScheduleRepositories,
    planner: HeatPlanner,
    allocator: HeatAllocator,
    limits: GenerationLimits,
}

impl HeatScheduleOrchestrator {
    /// 创建新的编排器实例
    pub fn new(repos: HeatScheduleRepositories) -> Self {
        Self::with_limits(repos, GenerationLimits::default())
    }

    /// 创建编排器实例（指定参数上限）
    pub fn with_limits(repos: HeatScheduleRepositories, limits: GenerationLimits) -> Self {
        Self {
            repos,
            planner: HeatPlanner::new(),
            allocator: HeatAllocator::new(),
            limits,
        }
    }

    pub fn limits(&self) -> GenerationLimits {
        self.limits
    }

    /// 重新生成赛项热次排程
    ///
    /// # 流程
    /// 1. 校验参数、赛项、场地与容量
    /// 2. 读取报名名单与组别顺序
    /// 3. 规划热次 → 分配报名 → 校验分配结果
    /// 4. 单事务替换该赛项全部热次/分配
    ///
    /// # 返回
    /// - Ok: 新热次（含分配）; 名单为空时热次列表为空
    /// - Err(InvalidConfiguration): 参数或场地不合法,未做任何写入
    /// - Err(Store): 事务失败,原排程保持不变
    #[instrument(skip(self, request), fields(
        event_id = %request.event_id,
        floor_id = %request.floor_id,
        strategy = %request.strategy
    ))]
    pub fn generate(&self, request: &GenerateHeatsRequest) -> HeatEngineResult<GeneratedSchedule> {
        info!(start_time = %request.start_time, "开始生成热次排程");

        // ==========================================
        // 步骤1: 参数与配置校验
        // ==========================================
        self.validate_timing(request)?;

        let event_id = request.event_id.trim();
        let floor_id = request.floor_id.trim();
        if event_id.is_empty() || floor_id.is_empty() {
            return Err(HeatEngineError::InvalidConfiguration(
                "赛项ID与场地ID不能为空".to_string(),
            ));
        }

        let event = self.repos.floors().find_event(event_id)?.ok_or_else(|| {
            HeatEngineError::InvalidConfiguration(format!("赛项不存在: {}", event_id))
        })?;

        let floor = self
            .repos
            .floors()
            .find_floor_for_event(event_id, floor_id)?
            .ok_or_else(|| {
                HeatEngineError::InvalidConfiguration(format!(
                    "场地{}不存在或不属于赛事{}",
                    floor_id, event.competition_id
                ))
            })?;

        let capacity = floor.capacity_model().ok_or_else(|| {
            HeatEngineError::InvalidConfiguration(format!(
                "场地{}容量必须大于0 (当前: {})",
                floor.floor_id, floor.capacity
            ))
        })?;

        // ==========================================
        // 步骤2: 读取名单与组别
        // ==========================================
        let registrations = self.repos.roster().list_registrations(event_id)?;
        let divisions = self.repos.divisions().list_divisions(event_id)?;
        debug!(
            registrations_count = registrations.len(),
            divisions_count = divisions.len(),
            "步骤2: 名单读取完成"
        );

        // ==========================================
        // 步骤3: 规划 + 分配 + 校验
        // ==========================================
        let timing = HeatTiming::new(
            request.start_time,
            request.heat_duration_minutes,
            request.transition_minutes,
        );
        let slots = self.planner.plan(
            &registrations,
            &divisions,
            floor_id,
            &capacity,
            &timing,
            request.strategy,
        )?;
        let planned = self.allocator.allocate(&registrations, &slots, &capacity);
        verify_allocation(&registrations, &slots, &planned, &capacity)?;
        debug!(
            heats = slots.len(),
            assignments = planned.len(),
            "步骤3: 规划与分配完成"
        );

        // ==========================================
        // 步骤4: 绑定 heat_id 并落库
        // ==========================================
        let heats: Vec<Heat> = slots
            .iter()
            .map(|slot| Heat {
                heat_id: Uuid::new_v4().to_string(),
                event_id: event_id.to_string(),
                floor_id: floor.floor_id.clone(),
                heat_number: slot.heat_number,
                start_time: slot.start_time,
                end_time: slot.end_time,
                target_division_id: slot.target_division_id.clone(),
            })
            .collect();

        let heat_id_by_number: HashMap<i32, &str> = heats
            .iter()
            .map(|h| (h.heat_number, h.heat_id.as_str()))
            .collect();

        let mut assignments: Vec<HeatAssignment> = Vec::with_capacity(planned.len());
        for item in &planned {
            let heat_id = heat_id_by_number.get(&item.heat_number).ok_or_else(|| {
                HeatEngineError::AllocationInvariant(format!("热次{}不存在", item.heat_number))
            })?;
            assignments.push(HeatAssignment {
                assignment_id: Uuid::new_v4().to_string(),
                heat_id: heat_id.to_string(),
                event_id: event_id.to_string(),
                registration_id: item.registration_id.clone(),
                lane_number: item.lane_number,
                check_in_at: None,
            });
        }

        let replaced = self
            .repos
            .schedule()
            .replace_schedule(event_id, &heats, &assignments)?;

        // ==========================================
        // 步骤5: 组装返回结果
        // ==========================================
        let label_by_division: HashMap<&str, &str> = divisions
            .iter()
            .map(|d| (d.division_id.as_str(), d.label.as_str()))
            .collect();

        let mut by_heat: HashMap<String, Vec<HeatAssignment>> = HashMap::new();
        for assignment in assignments {
            by_heat
                .entry(assignment.heat_id.clone())
                .or_default()
                .push(assignment);
        }

        let result_heats: Vec<HeatWithAssignments> = heats
            .into_iter()
            .map(|heat| {
                let division_label = heat
                    .target_division_id
                    .as_deref()
                    .and_then(|id| label_by_division.get(id))
                    .map(|label| label.to_string());
                let assignments = by_heat.remove(&heat.heat_id).unwrap_or_default();
                HeatWithAssignments {
                    heat,
                    floor_name: Some(floor.name.clone()),
                    division_label,
                    assignments,
                }
            })
            .collect();

        let result = GeneratedSchedule {
            event_id: event_id.to_string(),
            floor_id: floor.floor_id.clone(),
            strategy: request.strategy,
            heats: result_heats,
            replaced,
        };

        info!(
            heat_count = result.heat_count(),
            assignment_count = result.assignment_count(),
            replaced_heats = replaced.heats,
            replaced_assignments = replaced.assignments,
            "热次排程生成完成"
        );

        Ok(result)
    }

    /// 清空赛项全部热次/分配
    #[instrument(skip(self))]
    pub fn clear(&self, event_id: &str) -> HeatEngineResult<ScheduleDeleteCount> {
        let event_id = event_id.trim();
        if event_id.is_empty() {
            return Err(HeatEngineError::InvalidConfiguration(
                "赛项ID不能为空".to_string(),
            ));
        }

        let deleted = self.repos.schedule().delete_schedule(event_id)?;
        info!(
            heats = deleted.heats,
            assignments = deleted.assignments,
            "赛项热次已清空"
        );
        Ok(deleted)
    }

    fn validate_timing(&self, request: &GenerateHeatsRequest) -> HeatEngineResult<()> {
        let max_duration = self.limits.max_heat_duration_minutes;
        if request.heat_duration_minutes <= 0 || request.heat_duration_minutes > max_duration {
            return Err(HeatEngineError::InvalidConfiguration(format!(
                "热次时长必须在1到{}分钟之间 (当前: {})",
                max_duration, request.heat_duration_minutes
            )));
        }

        let max_transition = self.limits.max_transition_minutes;
        if request.transition_minutes < 0 || request.transition_minutes > max_transition {
            return Err(HeatEngineError::InvalidConfiguration(format!(
                "换场间隔必须在0到{}分钟之间 (当前: {})",
                max_transition, request.transition_minutes
            )));
        }

        Ok(())
    }
}
