// ==========================================
// 赛事分组排程引擎 - 热次规划器
// ==========================================
// 职责: 按人数与容量计算热次数量与时间窗
// 输入: 报名名单 + 组别顺序 + 容量模型 + 热次节奏 + 分组策略
// 输出: HeatSlot 列表 (heat_number 1..n 连续)
// 红线: 只看各组人数,不看具体报名身份
// ==========================================

use crate::domain::capacity::{CapacityModel, HeatTiming};
use crate::domain::heat::HeatSlot;
use crate::domain::registration::{Division, Registration};
use crate::engine::error::{HeatEngineError, HeatEngineResult};
use crate::engine::strategy::AllocationStrategy;
use std::collections::{HashMap, HashSet};
use tracing::{debug, instrument};

// ==========================================
// HeatPlanner - 热次规划器
// ==========================================
pub struct HeatPlanner {
    // 无状态引擎，不需要注入依赖
}

impl HeatPlanner {
    pub fn new() -> Self {
        Self {}
    }

    /// 规划热次
    ///
    /// 规则：
    /// 1) Mixed: 全部报名视为一组,产生 ceil(N/C) 个热次,target_division_id = None
    /// 2) PureByDivision: 按组别 position 升序分组,每组 ceil(n/C) 个热次,
    ///    跨组连续编号,时间节奏不因换组额外留空
    /// 3) 人数为 0 的组别不产生热次; N = 0 时返回空列表
    /// 4) 任一热次时间窗溢出时返回 InvalidConfiguration
    ///
    /// # 参数
    /// - `registrations`: 报名名单
    /// - `divisions`: 组别（按 position 排序）
    /// - `floor_id`: 场地ID（仅用于日志）
    /// - `capacity`: 容量模型
    /// - `timing`: 开始时间 + 热次时长 + 换场间隔
    /// - `strategy`: 分组策略
    #[instrument(skip(self, registrations, divisions, timing), fields(
        registrations_count = registrations.len(),
        capacity = capacity.athletes_per_heat(),
        strategy = %strategy
    ))]
    pub fn plan(
        &self,
        registrations: &[Registration],
        divisions: &[Division],
        floor_id: &str,
        capacity: &CapacityModel,
        timing: &HeatTiming,
        strategy: AllocationStrategy,
    ) -> HeatEngineResult<Vec<HeatSlot>> {
        let groups: Vec<(Option<String>, usize)> = match strategy {
            AllocationStrategy::Mixed => {
                if registrations.is_empty() {
                    Vec::new()
                } else {
                    vec![(None, registrations.len())]
                }
            }
            AllocationStrategy::PureByDivision => division_groups(registrations, divisions)
                .into_iter()
                .map(|(division_id, size)| (Some(division_id), size))
                .collect(),
        };

        let mut slots: Vec<HeatSlot> = Vec::new();
        for (target_division_id, size) in groups {
            let needed = capacity.heats_needed(size);
            debug!(
                division_id = target_division_id.as_deref().unwrap_or("MIXED"),
                size = size,
                heats = needed,
                "组别热次规划"
            );

            for _ in 0..needed {
                let index = slots.len();
                let window = timing.window(index).ok_or_else(|| {
                    HeatEngineError::InvalidConfiguration(format!(
                        "第{}个热次时间超出范围 (时长: {}分钟, 换场: {}分钟)",
                        index + 1,
                        timing.heat_duration_minutes,
                        timing.transition_minutes
                    ))
                })?;
                slots.push(HeatSlot {
                    heat_number: index as i32 + 1,
                    start_time: window.start,
                    end_time: window.end,
                    target_division_id: target_division_id.clone(),
                });
            }
        }

        Ok(slots)
    }
}

impl Default for HeatPlanner {
    fn default() -> Self {
        Self::new()
    }
}

/// 按组别统计报名人数
///
/// # 返回
/// (division_id, 人数) 列表,顺序:
/// - 组别表中的组别按 position 升序
/// - 组别表中不存在的 division_id 排在最后,按名单首次出现顺序
/// - 人数为 0 的组别不出现
pub fn division_groups(registrations: &[Registration], divisions: &[Division]) -> Vec<(String, usize)> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    let mut first_seen: Vec<&str> = Vec::new();
    for registration in registrations {
        let count = counts.entry(registration.division_id.as_str()).or_insert(0);
        if *count == 0 {
            first_seen.push(registration.division_id.as_str());
        }
        *count += 1;
    }

    let mut ordered: Vec<&Division> = divisions.iter().collect();
    ordered.sort_by_key(|d| d.position);

    let mut groups = Vec::new();
    let mut known: HashSet<&str> = HashSet::new();
    for division in ordered {
        if !known.insert(division.division_id.as_str()) {
            continue;
        }
        if let Some(&size) = counts.get(division.division_id.as_str()) {
            groups.push((division.division_id.clone(), size));
        }
    }

    for division_id in first_seen {
        if known.contains(division_id) {
            continue;
        }
        let size = counts.get(division_id).copied().unwrap_or(0);
        groups.push((division_id.to_string(), size));
    }

    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::CapacityKind;
    use chrono::{NaiveDate, NaiveDateTime};

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 3, 14)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    fn roster(groups: &[(&str, usize)]) -> Vec<Registration> {
        let mut out = Vec::new();
        let mut seq = 0;
        for (division_id, count) in groups {
            for _ in 0..*count {
                seq += 1;
                out.push(Registration {
                    registration_id: format!("reg-{:03}", seq),
                    competition_id: "comp-1".to_string(),
                    competitor_id: format!("user-{}", seq),
                    division_id: division_id.to_string(),
                    team_size: 1,
                    team_name: None,
                    created_at: at(8, 0) + chrono::Duration::seconds(seq as i64),
                });
            }
        }
        out
    }

    fn division(id: &str, position: i32) -> Division {
        Division {
            division_id: id.to_string(),
            competition_id: "comp-1".to_string(),
            label: id.to_uppercase(),
            position,
        }
    }

    fn capacity(c: i32) -> CapacityModel {
        CapacityModel::new(c, CapacityKind::Headcount).unwrap()
    }

    #[test]
    fn test_mixed_23_athletes_capacity_10() {
        let planner = HeatPlanner::new();
        let registrations = roster(&[("a", 12), ("b", 11)]);
        let timing = HeatTiming::new(at(9, 0), 15, 5);

        let slots = planner.plan(
            &registrations,
            &[],
            "floor-1",
            &capacity(10),
            &timing,
            AllocationStrategy::Mixed,
        )
        .unwrap();

        assert_eq!(slots.len(), 3);
        let times: Vec<(NaiveDateTime, NaiveDateTime)> =
            slots.iter().map(|s| (s.start_time, s.end_time)).collect();
        assert_eq!(
            times,
            vec![
                (at(9, 0), at(9, 15)),
                (at(9, 20), at(9, 35)),
                (at(9, 40), at(9, 55)),
            ]
        );
        assert!(slots.iter().all(|s| s.target_division_id.is_none()));
        assert_eq!(
            slots.iter().map(|s| s.heat_number).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
    }

    #[test]
    fn test_pure_groups_follow_division_position() {
        let planner = HeatPlanner::new();
        // 名单中 B 先报名, 但 A 的 position 更靠前
        let registrations = roster(&[("b", 4), ("a", 12)]);
        let divisions = vec![division("b", 2), division("a", 1)];
        let timing = HeatTiming::new(at(9, 0), 15, 5);

        let slots = planner.plan(
            &registrations,
            &divisions,
            "floor-1",
            &capacity(10),
            &timing,
            AllocationStrategy::PureByDivision,
        )
        .unwrap();

        let targets: Vec<Option<&str>> = slots
            .iter()
            .map(|s| s.target_division_id.as_deref())
            .collect();
        assert_eq!(targets, vec![Some("a"), Some("a"), Some("b")]);
        assert_eq!(
            slots.iter().map(|s| s.heat_number).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
        // 换组不额外留空
        assert_eq!(slots[2].start_time, at(9, 40));
    }

    #[test]
    fn test_empty_roster_yields_no_slots() {
        let planner = HeatPlanner::new();
        let timing = HeatTiming::new(at(9, 0), 15, 5);
        for strategy in [AllocationStrategy::Mixed, AllocationStrategy::PureByDivision] {
            let slots = planner
                .plan(&[], &[division("a", 1)], "floor-1", &capacity(5), &timing, strategy)
                .unwrap();
            assert!(slots.is_empty());
        }
    }

    #[test]
    fn test_team_counts_as_one_unit() {
        let planner = HeatPlanner::new();
        let mut registrations = roster(&[("a", 6), ("b", 4)]);
        for r in registrations.iter_mut().filter(|r| r.division_id == "a") {
            r.team_size = 3;
        }
        let divisions = vec![division("a", 1), division("b", 2)];
        let timing = HeatTiming::new(at(9, 0), 15, 5);

        // a: 6 支队伍(18 人) 容量 5 => 2 个热次; b: 4 人 => 1 个热次
        let slots = planner
            .plan(
                &registrations,
                &divisions,
                "floor-1",
                &capacity(5),
                &timing,
                AllocationStrategy::PureByDivision,
            )
            .unwrap();
        assert_eq!(slots.len(), 3);
        assert_eq!(
            division_groups(&registrations, &divisions),
            vec![("a".to_string(), 6), ("b".to_string(), 4)]
        );
    }

    #[test]
    fn test_window_overflow_is_invalid_configuration() {
        let planner = HeatPlanner::new();
        let registrations = roster(&[("a", 3)]);
        let timing = HeatTiming::new(at(9, 0), 1_000_000_000_000_000, 5);

        let result = planner.plan(
            &registrations,
            &[division("a", 1)],
            "floor-1",
            &capacity(10),
            &timing,
            AllocationStrategy::Mixed,
        );
        assert!(matches!(result, Err(HeatEngineError::InvalidConfiguration(_))));

        // 空名单不计算时间窗
        let empty = planner
            .plan(&[], &[], "floor-1", &capacity(10), &timing, AllocationStrategy::Mixed)
            .unwrap();
        assert!(empty.is_empty());
    }

    #[test]
    fn test_division_groups_skip_empty_and_append_unknown() {
        let registrations = roster(&[("ghost", 2), ("a", 3)]);
        let divisions = vec![division("a", 1), division("empty", 2)];

        let groups = division_groups(&registrations, &divisions);
        assert_eq!(
            groups,
            vec![("a".to_string(), 3), ("ghost".to_string(), 2)]
        );
    }
}
