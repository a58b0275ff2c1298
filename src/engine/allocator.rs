// ==========================================
// 赛事分组排程引擎 - 组别感知分配器
// ==========================================
// 职责: 把报名按名单顺序贪心填入规划好的热次
// 输入: 报名名单 + HeatSlot 列表 + 容量模型
// 输出: PlannedAssignment (按 heat_number 绑定,落库时再换成 heat_id)
// 红线: 每个报名恰好出现一次; 单热次人数不超过容量
// ==========================================

use crate::domain::capacity::CapacityModel;
use crate::domain::heat::{HeatSlot, PlannedAssignment};
use crate::domain::registration::Registration;
use crate::engine::error::{HeatEngineError, HeatEngineResult};
use std::collections::{HashMap, VecDeque};
use tracing::{debug, instrument};

// ==========================================
// HeatAllocator - 分配器
// ==========================================
pub struct HeatAllocator {
    // 无状态引擎，不需要注入依赖
}

impl HeatAllocator {
    pub fn new() -> Self {
        Self {}
    }

    /// 分配报名到热次
    ///
    /// 规则：
    /// 1) 指定组别的热次: 只取该组别中尚未分配的报名,按名单顺序取满容量
    /// 2) 混合热次: 从剩余全部报名中按名单顺序取满容量
    /// 3) 场地按道次计容量时,热次内按填充顺序编道次 1..n; 否则 lane_number = None
    ///
    /// # 返回
    /// 按热次顺序、填充顺序排列的分配列表
    #[instrument(skip(self, registrations, slots), fields(
        registrations_count = registrations.len(),
        slots_count = slots.len(),
        capacity = capacity.athletes_per_heat()
    ))]
    pub fn allocate(
        &self,
        registrations: &[Registration],
        slots: &[HeatSlot],
        capacity: &CapacityModel,
    ) -> Vec<PlannedAssignment> {
        let per_heat = capacity.athletes_per_heat();

        // 各组别待分配队列（保持名单顺序）
        let mut by_division: HashMap<&str, VecDeque<usize>> = HashMap::new();
        for (idx, registration) in registrations.iter().enumerate() {
            by_division
                .entry(registration.division_id.as_str())
                .or_default()
                .push_back(idx);
        }

        let mut assigned = vec![false; registrations.len()];
        let mut pool_cursor = 0usize;
        let mut assignments = Vec::with_capacity(registrations.len());

        for slot in slots {
            let mut members: Vec<usize> = Vec::with_capacity(per_heat);

            match slot.target_division_id.as_deref() {
                Some(division_id) => {
                    if let Some(queue) = by_division.get_mut(division_id) {
                        while members.len() < per_heat {
                            match queue.pop_front() {
                                Some(idx) if !assigned[idx] => members.push(idx),
                                Some(_) => continue,
                                None => break,
                            }
                        }
                    }
                }
                None => {
                    while members.len() < per_heat && pool_cursor < registrations.len() {
                        if !assigned[pool_cursor] {
                            members.push(pool_cursor);
                        }
                        pool_cursor += 1;
                    }
                }
            }

            if members.is_empty() {
                debug!(heat_number = slot.heat_number, "热次未分配到报名");
            }

            for (position, idx) in members.into_iter().enumerate() {
                assigned[idx] = true;
                assignments.push(PlannedAssignment {
                    heat_number: slot.heat_number,
                    registration_id: registrations[idx].registration_id.clone(),
                    lane_number: capacity.assigns_lanes().then_some(position as i32 + 1),
                });
            }
        }

        assignments
    }
}

impl Default for HeatAllocator {
    fn default() -> Self {
        Self::new()
    }
}

/// 校验分配结果（落库前执行）
///
/// 检查项:
/// - 每个报名恰好分配一次,不存在名单外的报名
/// - 分配引用的 heat_number 必须存在
/// - 单热次人数不超过容量
/// - 指定组别的热次只包含该组别的报名
pub fn verify_allocation(
    registrations: &[Registration],
    slots: &[HeatSlot],
    assignments: &[PlannedAssignment],
    capacity: &CapacityModel,
) -> HeatEngineResult<()> {
    let division_of: HashMap<&str, &str> = registrations
        .iter()
        .map(|r| (r.registration_id.as_str(), r.division_id.as_str()))
        .collect();
    let slot_of: HashMap<i32, &HeatSlot> = slots.iter().map(|s| (s.heat_number, s)).collect();

    let mut seen: HashMap<&str, i32> = HashMap::new();
    let mut per_heat: HashMap<i32, usize> = HashMap::new();

    for assignment in assignments {
        let registration_id = assignment.registration_id.as_str();
        let division_id = division_of.get(registration_id).ok_or_else(|| {
            HeatEngineError::AllocationInvariant(format!("报名{}不在名单中", registration_id))
        })?;

        if let Some(previous) = seen.insert(registration_id, assignment.heat_number) {
            return Err(HeatEngineError::AllocationInvariant(format!(
                "报名{}被重复分配到热次{}和{}",
                registration_id, previous, assignment.heat_number
            )));
        }

        let slot = slot_of.get(&assignment.heat_number).ok_or_else(|| {
            HeatEngineError::AllocationInvariant(format!(
                "热次{}不存在",
                assignment.heat_number
            ))
        })?;

        if let Some(target) = slot.target_division_id.as_deref() {
            if target != *division_id {
                return Err(HeatEngineError::AllocationInvariant(format!(
                    "热次{}限定组别{},但分配了组别{}的报名{}",
                    slot.heat_number, target, division_id, registration_id
                )));
            }
        }

        let count = per_heat.entry(assignment.heat_number).or_insert(0);
        *count += 1;
        if *count > capacity.athletes_per_heat() {
            return Err(HeatEngineError::AllocationInvariant(format!(
                "热次{}人数超过容量{}",
                assignment.heat_number,
                capacity.athletes_per_heat()
            )));
        }
    }

    if seen.len() != registrations.len() {
        let missing: Vec<&str> = registrations
            .iter()
            .map(|r| r.registration_id.as_str())
            .filter(|id| !seen.contains_key(id))
            .collect();
        return Err(HeatEngineError::AllocationInvariant(format!(
            "{}个报名未分配: {}",
            missing.len(),
            missing.join(",")
        )));
    }

    Ok(())
}
