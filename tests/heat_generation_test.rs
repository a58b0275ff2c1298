// ==========================================
// 热次生成集成测试
// ==========================================
// 测试范围:
// 1. 容量守恒 / 组别纯度 / 不重不漏 / 时间不重叠
// 2. 重新生成为全量替换（跨场地）
// 3. 空名单、非法配置
// 4. 未分配报名查询、操作日志
// ==========================================

mod test_helpers;

use std::collections::{HashMap, HashSet};

use competition_heats::api::ApiError;
use competition_heats::HeatWithAssignments;
use test_helpers::*;

fn generate(
    state: &competition_heats::app::AppState,
    event_id: &str,
    floor_id: &str,
    keep_divisions_pure: bool,
) -> Vec<HeatWithAssignments> {
    state
        .heat_api
        .generate_heats(
            event_id,
            floor_id,
            at(14, 9, 0),
            15,
            5,
            keep_divisions_pure,
            "admin",
        )
        .expect("生成失败")
        .heats
}

fn assigned_ids(heats: &[HeatWithAssignments]) -> Vec<String> {
    heats
        .iter()
        .flat_map(|h| h.assignments.iter().map(|a| a.registration_id.clone()))
        .collect()
}

// ==========================================
// 示例场景
// ==========================================

#[test]
fn test_混合模式_23人_容量10() {
    let (_tmp, _path, seeder, state) = create_test_env().unwrap();
    seeder.floor("floor-ten", "comp-1", "Ten", 10, "HEADCOUNT").unwrap();
    seeder.registrations("comp-1", "div-rx", 12).unwrap();
    seeder.registrations("comp-1", "div-scaled", 11).unwrap();

    let heats = generate(&state, "evt-1", "floor-ten", false);

    assert_eq!(heats.len(), 3);
    let counts: Vec<usize> = heats.iter().map(|h| h.athlete_count()).collect();
    assert_eq!(counts, vec![10, 10, 3]);

    let windows: Vec<_> = heats
        .iter()
        .map(|h| (h.heat.start_time, h.heat.end_time))
        .collect();
    assert_eq!(
        windows,
        vec![
            (at(14, 9, 0), at(14, 9, 15)),
            (at(14, 9, 20), at(14, 9, 35)),
            (at(14, 9, 40), at(14, 9, 55)),
        ]
    );
    assert!(heats.iter().all(|h| h.heat.is_mixed()));
    assert!(heats
        .iter()
        .flat_map(|h| h.assignments.iter())
        .all(|a| a.lane_number.is_none()));
}

#[test]
fn test_纯组别模式_12加4() {
    let (_tmp, _path, seeder, state) = create_test_env().unwrap();
    seeder.registrations("comp-1", "div-scaled", 4).unwrap();
    seeder.registrations("comp-1", "div-rx", 12).unwrap();

    let heats = generate(&state, "evt-1", "floor-main", true);

    let summary: Vec<(i32, Option<&str>, usize)> = heats
        .iter()
        .map(|h| {
            (
                h.heat.heat_number,
                h.heat.target_division_id.as_deref(),
                h.athlete_count(),
            )
        })
        .collect();
    assert_eq!(
        summary,
        vec![
            (1, Some("div-rx"), 10),
            (2, Some("div-rx"), 2),
            (3, Some("div-scaled"), 4),
        ]
    );
    assert_eq!(heats[0].division_label.as_deref(), Some("RX"));

    // 道次场地: 每个热次内道次从 1 连续编号
    for heat in &heats {
        let lanes: Vec<i32> = heat.assignments.iter().filter_map(|a| a.lane_number).collect();
        let expected: Vec<i32> = (1..=heat.assignments.len() as i32).collect();
        assert_eq!(lanes, expected);
    }
}

// ==========================================
// 性质测试
// ==========================================

#[test]
fn test_容量守恒与不重不漏() {
    let (_tmp, _path, seeder, state) = create_test_env().unwrap();

    let mut expected: HashSet<String> = HashSet::new();
    for (n, pure) in [(1usize, false), (6, false), (7, true), (25, false), (31, true)] {
        let roster_rx = seeder.registrations("comp-1", "div-rx", n).unwrap();
        let roster_scaled = seeder.registrations("comp-1", "div-scaled", n / 2).unwrap();
        expected.extend(roster_rx);
        expected.extend(roster_scaled);

        // floor-side 容量 6
        let heats = generate(&state, "evt-1", "floor-side", pure);
        let ids = assigned_ids(&heats);

        assert_eq!(ids.len(), expected.len(), "每个报名恰好一条分配");
        let unique: HashSet<String> = ids.iter().cloned().collect();
        assert_eq!(unique, expected);
        assert!(heats.iter().all(|h| h.athlete_count() <= 6));

        if !pure {
            assert_eq!(heats.len(), expected.len().div_ceil(6));
        }
    }
}

#[test]
fn test_团队报名按一个分配单位计() {
    let (_tmp, _path, seeder, state) = create_test_env().unwrap();
    let solo = seeder.registrations("comp-1", "div-rx", 7).unwrap();
    let rx_teams = seeder.team_registrations("comp-1", "div-rx", 6, 3).unwrap();
    let scaled_teams = seeder.team_registrations("comp-1", "div-scaled", 4, 4).unwrap();
    let registration_count = solo.len() + rx_teams.len() + scaled_teams.len();

    // 17 条报名, 41 人; floor-main 容量 10
    let heats = generate(&state, "evt-1", "floor-main", false);
    assert_eq!(heats.len(), registration_count.div_ceil(10));
    let counts: Vec<usize> = heats.iter().map(|h| h.athlete_count()).collect();
    assert_eq!(counts, vec![10, 7]);

    let ids = assigned_ids(&heats);
    for team in rx_teams.iter().chain(scaled_teams.iter()) {
        assert_eq!(ids.iter().filter(|id| *id == team).count(), 1, "{}", team);
    }
    assert_eq!(ids.len(), registration_count);

    // 每条报名一个道次
    let lanes: Vec<i32> = heats[0].assignments.iter().filter_map(|a| a.lane_number).collect();
    assert_eq!(lanes, (1..=10).collect::<Vec<i32>>());

    // 纯组别: RX 13 条 => 10 + 3, Scaled 4 支队伍 => 1 个热次
    let heats = generate(&state, "evt-1", "floor-main", true);
    let counts: Vec<usize> = heats.iter().map(|h| h.athlete_count()).collect();
    assert_eq!(counts, vec![10, 3, 4]);
    assert_eq!(heats[2].division_label.as_deref(), Some("Scaled"));

    let unassigned = state.heat_api.list_unassigned_registrations("evt-1").unwrap();
    assert!(unassigned.is_empty());
}

#[test]
fn test_组别纯度() {
    let (_tmp, _path, seeder, state) = create_test_env().unwrap();
    let rx = seeder.registrations("comp-1", "div-rx", 9).unwrap();
    let scaled = seeder.registrations("comp-1", "div-scaled", 8).unwrap();
    // 组别表中不存在的组别: 排在最后
    let ghost = seeder.registrations("comp-1", "div-ghost", 2).unwrap();

    let division_of: HashMap<String, &str> = rx
        .iter()
        .map(|id| (id.clone(), "div-rx"))
        .chain(scaled.iter().map(|id| (id.clone(), "div-scaled")))
        .chain(ghost.iter().map(|id| (id.clone(), "div-ghost")))
        .collect();

    let heats = generate(&state, "evt-1", "floor-side", true);

    for heat in &heats {
        let target = heat.heat.target_division_id.as_deref().expect("纯组别热次必须指定组别");
        for a in &heat.assignments {
            assert_eq!(division_of[&a.registration_id], target);
        }
    }

    let order: Vec<&str> = heats
        .iter()
        .filter_map(|h| h.heat.target_division_id.as_deref())
        .collect();
    assert_eq!(
        order,
        vec!["div-rx", "div-rx", "div-scaled", "div-scaled", "div-ghost"]
    );
    assert!(heats[4].division_label.is_none());
}

#[test]
fn test_时间不重叠且间隔等于换场时间() {
    let (_tmp, _path, seeder, state) = create_test_env().unwrap();
    seeder.registrations("comp-1", "div-rx", 20).unwrap();
    seeder.registrations("comp-1", "div-scaled", 5).unwrap();

    let result = state
        .heat_api
        .generate_heats("evt-1", "floor-side", at(14, 10, 0), 12, 3, true, "admin")
        .unwrap();

    for pair in result.heats.windows(2) {
        let (a, b) = (&pair[0].heat, &pair[1].heat);
        assert!(a.end_time <= b.start_time);
        assert_eq!(a.window().gap_until(&b.window()), 3);
        assert_eq!(b.heat_number, a.heat_number + 1);
    }
}

// ==========================================
// 重新生成
// ==========================================

#[test]
fn test_重新生成为全量替换() {
    let (_tmp, _path, seeder, state) = create_test_env().unwrap();
    seeder.registrations("comp-1", "div-rx", 14).unwrap();

    let first = generate(&state, "evt-1", "floor-main", false);
    let first_heat_ids: HashSet<String> = first.iter().map(|h| h.heat.heat_id.clone()).collect();
    let first_assignment_ids: HashSet<String> = first
        .iter()
        .flat_map(|h| h.assignments.iter().map(|a| a.assignment_id.clone()))
        .collect();

    // 换场地重新生成: 旧场地的热次也必须被清掉
    let second = generate(&state, "evt-1", "floor-side", false);
    let stored = state.heat_api.get_heats_for_event("evt-1").unwrap();

    assert_eq!(stored.len(), second.len());
    assert!(stored.iter().all(|h| h.heat.floor_id == "floor-side"));

    let stored_heat_ids: HashSet<String> = stored.iter().map(|h| h.heat.heat_id.clone()).collect();
    let stored_assignment_ids: HashSet<String> = stored
        .iter()
        .flat_map(|h| h.assignments.iter().map(|a| a.assignment_id.clone()))
        .collect();
    assert!(stored_heat_ids.is_disjoint(&first_heat_ids));
    assert!(stored_assignment_ids.is_disjoint(&first_assignment_ids));
    assert_eq!(stored_assignment_ids.len(), 14);
}

#[test]
fn test_不同赛项互不影响() {
    let (_tmp, _path, seeder, state) = create_test_env().unwrap();
    seeder.registrations("comp-1", "div-rx", 5).unwrap();

    generate(&state, "evt-1", "floor-main", true);
    generate(&state, "evt-2", "floor-main", true);
    state.heat_api.clear_heats("evt-2", "admin").unwrap();

    assert_eq!(state.heat_api.get_heats_for_event("evt-1").unwrap().len(), 1);
    assert!(state.heat_api.get_heats_for_event("evt-2").unwrap().is_empty());
}

// ==========================================
// 边界与错误
// ==========================================

#[test]
fn test_空名单生成零热次() {
    let (_tmp, _path, seeder, state) = create_test_env().unwrap();
    seeder.registrations("comp-1", "div-rx", 3).unwrap();
    generate(&state, "evt-1", "floor-main", true);

    // 另一个赛事没有报名
    seeder.event("evt-empty", "comp-3", "Empty", 1).unwrap();
    seeder.floor("floor-empty", "comp-3", "Empty Floor", 8, "HEADCOUNT").unwrap();

    let result = state
        .heat_api
        .generate_heats("evt-empty", "floor-empty", at(14, 9, 0), 15, 5, true, "admin")
        .unwrap();
    assert_eq!(result.heat_count(), 0);
    assert_eq!(result.assignment_count(), 0);
    assert_eq!(state.heat_api.get_heats_for_event("evt-1").unwrap().len(), 1);
}

#[test]
fn test_非法配置在写入前拒绝() {
    let (_tmp, _path, seeder, state) = create_test_env().unwrap();
    seeder.registrations("comp-1", "div-rx", 8).unwrap();
    seeder.floor("floor-broken", "comp-1", "Broken", 0, "HEADCOUNT").unwrap();
    generate(&state, "evt-1", "floor-main", true);

    let cases: Vec<(&str, &str, i64, i64)> = vec![
        ("evt-1", "floor-main", 0, 5),
        ("evt-1", "floor-main", 121, 5),
        ("evt-1", "floor-main", 15, -1),
        ("evt-1", "floor-main", 15, 61),
        ("evt-1", "floor-broken", 15, 5),
        ("evt-1", "floor-foreign", 15, 5),
        ("evt-1", "floor-missing", 15, 5),
        ("evt-missing", "floor-main", 15, 5),
    ];

    for (event_id, floor_id, duration, transition) in cases {
        let err = state
            .heat_api
            .generate_heats(event_id, floor_id, at(14, 9, 0), duration, transition, true, "admin")
            .unwrap_err();
        assert!(
            matches!(err, ApiError::InvalidConfiguration(_)),
            "{} {} {} {} => {:?}",
            event_id,
            floor_id,
            duration,
            transition,
            err
        );
    }

    // 原排程保持不变
    let stored = state.heat_api.get_heats_for_event("evt-1").unwrap();
    assert_eq!(stored.iter().map(|h| h.athlete_count()).sum::<usize>(), 8);

    let err = state
        .heat_api
        .generate_heats("  ", "floor-main", at(14, 9, 0), 15, 5, true, "admin")
        .unwrap_err();
    assert!(matches!(err, ApiError::InvalidInput(_)));
}

// ==========================================
// 查询与审计
// ==========================================

#[test]
fn test_生成后新增报名出现在未分配列表() {
    let (_tmp, _path, seeder, state) = create_test_env().unwrap();
    seeder.registrations("comp-1", "div-rx", 4).unwrap();
    generate(&state, "evt-1", "floor-main", true);
    assert!(state.heat_api.list_unassigned_registrations("evt-1").unwrap().is_empty());

    let late = seeder.registrations("comp-1", "div-scaled", 2).unwrap();
    let unassigned: Vec<String> = state
        .heat_api
        .list_unassigned_registrations("evt-1")
        .unwrap()
        .into_iter()
        .map(|r| r.registration_id)
        .collect();
    assert_eq!(unassigned, late);
}

#[test]
fn test_写操作记录操作日志() {
    let (_tmp, _path, seeder, state) = create_test_env().unwrap();
    seeder.registrations("comp-1", "div-rx", 3).unwrap();

    generate(&state, "evt-1", "floor-main", true);
    let deleted = state.heat_api.clear_heats("evt-1", "admin").unwrap();
    assert_eq!(deleted.heats, 1);
    assert_eq!(deleted.assignments, 3);

    let logs = state.action_log_repo.find_by_event_id("evt-1").unwrap();
    let types: HashSet<String> = logs.iter().map(|l| l.action_type.clone()).collect();
    assert!(types.contains("GenerateHeats"));
    assert!(types.contains("ClearHeats"));

    let generate_log = logs
        .iter()
        .find(|l| l.action_type == "GenerateHeats")
        .unwrap();
    let payload = generate_log.payload_json.as_ref().unwrap();
    assert_eq!(payload["strategy"], "pure_by_division");
    assert_eq!(payload["assignment_count"], 3);
}
