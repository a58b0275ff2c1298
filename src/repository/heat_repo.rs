// ==========================================
// 赛事分组排程引擎 - 热次排程数据仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// 红线: 替换排程必须单事务完成 (全删全建,不可见半成品)
// ==========================================

use crate::db::{format_ts, parse_ts};
use crate::domain::heat::{Heat, HeatAssignment, HeatWithAssignments};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::schedule_store::{HeatScheduleStore, ScheduleDeleteCount};
use chrono::NaiveDateTime;
use rusqlite::{
    params, Connection, OptionalExtension, Result as SqliteResult, Row, Transaction,
    TransactionBehavior,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

const ASSIGNMENT_COLUMNS: &str =
    "a.assignment_id, a.heat_id, a.event_id, a.registration_id, a.lane_number, a.check_in_at";

// ==========================================
// 读模型
// ==========================================

/// 选手个人赛程行
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AthleteHeatEntity {
    pub assignment_id: String,
    pub event_id: String,
    pub event_name: String,
    pub event_position: i32,
    pub heat_id: String,
    pub heat_number: i32,
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
    pub floor_id: String,
    pub floor_name: Option<String>,
    pub lane_number: Option<i32>,
    pub check_in_at: Option<NaiveDateTime>,
}

/// 赛事总赛程行
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduledHeatEntity {
    pub heat_id: String,
    pub heat_number: i32,
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
    pub event_id: String,
    pub event_name: String,
    pub event_position: i32,
    pub floor_name: Option<String>,
    pub division_label: Option<String>,
    pub athlete_count: i64,
}

// ==========================================
// HeatScheduleRepository - 热次排程仓储
// ==========================================
pub struct HeatScheduleRepository {
    conn: Arc<Mutex<Connection>>,
}

impl HeatScheduleRepository {
    /// 创建新的HeatScheduleRepository实例
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 使用独立连接创建实例
    ///
    /// 检录端使用独立连接,不与生成/查询共用同一把连接锁
    pub fn open(db_path: &str) -> RepositoryResult<Self> {
        let conn = crate::db::open_sqlite_connection(db_path)
            .map_err(|e| RepositoryError::DatabaseConnectionError(e.to_string()))?;
        Ok(Self::new(Arc::new(Mutex::new(conn))))
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    // ==========================================
    // 事务内写入
    // ==========================================

    fn delete_in_tx(tx: &Transaction, event_id: &str) -> RepositoryResult<ScheduleDeleteCount> {
        let assignments = tx.execute(
            "DELETE FROM heat_assignment WHERE event_id = ?1",
            params![event_id],
        )?;
        let heats = tx.execute("DELETE FROM heat WHERE event_id = ?1", params![event_id])?;
        Ok(ScheduleDeleteCount { heats, assignments })
    }

    fn write_schedule(
        tx: &Transaction,
        event_id: &str,
        heats: &[Heat],
        assignments: &[HeatAssignment],
    ) -> RepositoryResult<ScheduleDeleteCount> {
        let deleted = Self::delete_in_tx(tx, event_id)?;

        {
            let mut stmt = tx.prepare(
                r#"
                INSERT INTO heat (
                    heat_id, event_id, floor_id, heat_number,
                    start_time, end_time, target_division_id
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                "#,
            )?;
            for heat in heats {
                if heat.event_id != event_id {
                    return Err(RepositoryError::ValidationError(format!(
                        "热次{}不属于赛项{}",
                        heat.heat_id, event_id
                    )));
                }
                stmt.execute(params![
                    heat.heat_id,
                    heat.event_id,
                    heat.floor_id,
                    heat.heat_number,
                    format_ts(&heat.start_time),
                    format_ts(&heat.end_time),
                    heat.target_division_id,
                ])?;
            }
        }

        {
            let mut stmt = tx.prepare(
                r#"
                INSERT INTO heat_assignment (
                    assignment_id, heat_id, event_id, registration_id,
                    lane_number, check_in_at, seq_no
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                "#,
            )?;
            for (seq_no, assignment) in assignments.iter().enumerate() {
                if assignment.event_id != event_id {
                    return Err(RepositoryError::ValidationError(format!(
                        "分配{}不属于赛项{}",
                        assignment.assignment_id, event_id
                    )));
                }
                stmt.execute(params![
                    assignment.assignment_id,
                    assignment.heat_id,
                    assignment.event_id,
                    assignment.registration_id,
                    assignment.lane_number,
                    assignment.check_in_at.as_ref().map(format_ts),
                    seq_no as i64,
                ])?;
            }
        }

        Ok(deleted)
    }

    // ==========================================
    // 查询
    // ==========================================

    /// 查询选手在全部赛项中的热次（按开始时间排序）
    pub fn find_athlete_schedule(
        &self,
        registration_id: &str,
    ) -> RepositoryResult<Vec<AthleteHeatEntity>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT a.assignment_id, e.event_id, e.name, e.position,
                   h.heat_id, h.heat_number, h.start_time, h.end_time,
                   h.floor_id, f.name, a.lane_number, a.check_in_at
            FROM heat_assignment a
            JOIN heat h ON h.heat_id = a.heat_id
            JOIN competition_event e ON e.event_id = h.event_id
            LEFT JOIN competition_floor f ON f.floor_id = h.floor_id
            WHERE a.registration_id = ?1
            ORDER BY h.start_time, e.position
            "#,
        )?;

        let rows = stmt
            .query_map(params![registration_id], |row| {
                let start: String = row.get(6)?;
                let end: String = row.get(7)?;
                let check_in: Option<String> = row.get(11)?;
                Ok(AthleteHeatEntity {
                    assignment_id: row.get(0)?,
                    event_id: row.get(1)?,
                    event_name: row.get(2)?,
                    event_position: row.get(3)?,
                    heat_id: row.get(4)?,
                    heat_number: row.get(5)?,
                    start_time: parse_ts(6, &start)?,
                    end_time: parse_ts(7, &end)?,
                    floor_id: row.get(8)?,
                    floor_name: row.get(9)?,
                    lane_number: row.get(10)?,
                    check_in_at: check_in.map(|s| parse_ts(11, &s)).transpose()?,
                })
            })?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(rows)
    }

    /// 查询赛事全部热次（按开始时间、赛项顺序、热次号排序）
    pub fn find_competition_heats(
        &self,
        competition_id: &str,
    ) -> RepositoryResult<Vec<ScheduledHeatEntity>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT h.heat_id, h.heat_number, h.start_time, h.end_time,
                   e.event_id, e.name, e.position, f.name, d.label,
                   (SELECT COUNT(*) FROM heat_assignment a WHERE a.heat_id = h.heat_id)
            FROM heat h
            JOIN competition_event e ON e.event_id = h.event_id
            LEFT JOIN competition_floor f ON f.floor_id = h.floor_id
            LEFT JOIN division d ON d.division_id = h.target_division_id
            WHERE e.competition_id = ?1
            ORDER BY h.start_time, e.position, h.heat_number
            "#,
        )?;

        let rows = stmt
            .query_map(params![competition_id], |row| {
                let start: String = row.get(2)?;
                let end: String = row.get(3)?;
                Ok(ScheduledHeatEntity {
                    heat_id: row.get(0)?,
                    heat_number: row.get(1)?,
                    start_time: parse_ts(2, &start)?,
                    end_time: parse_ts(3, &end)?,
                    event_id: row.get(4)?,
                    event_name: row.get(5)?,
                    event_position: row.get(6)?,
                    floor_name: row.get(7)?,
                    division_label: row.get(8)?,
                    athlete_count: row.get(9)?,
                })
            })?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(rows)
    }

    /// 统计赛项热次数
    pub fn count_heats(&self, event_id: &str) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        let count = conn.query_row(
            "SELECT COUNT(*) FROM heat WHERE event_id = ?1",
            params![event_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}

impl HeatScheduleStore for HeatScheduleRepository {
    fn replace_schedule(
        &self,
        event_id: &str,
        heats: &[Heat],
        assignments: &[HeatAssignment],
    ) -> RepositoryResult<ScheduleDeleteCount> {
        let mut conn = self.get_conn()?;

        // IMMEDIATE: 事务开始即取写锁,并发生成按提交顺序串行,后提交者覆盖
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        // 出错时 tx 析构即回滚
        let deleted = Self::write_schedule(&tx, event_id, heats, assignments)
            .map_err(RepositoryError::into_transaction_error)?;

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        Ok(deleted)
    }

    fn delete_schedule(&self, event_id: &str) -> RepositoryResult<ScheduleDeleteCount> {
        let mut conn = self.get_conn()?;
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        let deleted =
            Self::delete_in_tx(&tx, event_id).map_err(RepositoryError::into_transaction_error)?;

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
        Ok(deleted)
    }

    fn find_heats_with_assignments(&self, event_id: &str) -> RepositoryResult<Vec<HeatWithAssignments>> {
        let conn = self.get_conn()?;

        let mut heat_stmt = conn.prepare(
            r#"
            SELECT h.heat_id, h.event_id, h.floor_id, h.heat_number,
                   h.start_time, h.end_time, h.target_division_id,
                   f.name, d.label
            FROM heat h
            LEFT JOIN competition_floor f ON f.floor_id = h.floor_id
            LEFT JOIN division d ON d.division_id = h.target_division_id
            WHERE h.event_id = ?1
            ORDER BY h.heat_number
            "#,
        )?;
        let heats = heat_stmt
            .query_map(params![event_id], |row| {
                let heat = map_heat_row(row)?;
                let floor_name: Option<String> = row.get(7)?;
                let division_label: Option<String> = row.get(8)?;
                Ok((heat, floor_name, division_label))
            })?
            .collect::<SqliteResult<Vec<_>>>()?;

        if heats.is_empty() {
            return Ok(Vec::new());
        }

        let sql = format!(
            r#"
            SELECT {}
            FROM heat_assignment a
            WHERE a.event_id = ?1
            ORDER BY a.heat_id, COALESCE(a.lane_number, 0), a.seq_no
            "#,
            ASSIGNMENT_COLUMNS
        );
        let mut assignment_stmt = conn.prepare(&sql)?;
        let assignments = assignment_stmt
            .query_map(params![event_id], map_assignment_row)?
            .collect::<SqliteResult<Vec<_>>>()?;

        let mut by_heat: HashMap<String, Vec<HeatAssignment>> = HashMap::new();
        for assignment in assignments {
            by_heat
                .entry(assignment.heat_id.clone())
                .or_default()
                .push(assignment);
        }

        Ok(heats
            .into_iter()
            .map(|(heat, floor_name, division_label)| {
                let assignments = by_heat.remove(&heat.heat_id).unwrap_or_default();
                HeatWithAssignments {
                    heat,
                    floor_name,
                    division_label,
                    assignments,
                }
            })
            .collect())
    }

    fn get_assignment(&self, assignment_id: &str) -> RepositoryResult<Option<HeatAssignment>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM heat_assignment a WHERE a.assignment_id = ?1",
            ASSIGNMENT_COLUMNS
        );
        let assignment = conn
            .query_row(&sql, params![assignment_id], map_assignment_row)
            .optional()?;
        Ok(assignment)
    }

    fn update_check_in(
        &self,
        assignment_id: &str,
        check_in_at: Option<NaiveDateTime>,
    ) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let rows = conn.execute(
            "UPDATE heat_assignment SET check_in_at = ?2 WHERE assignment_id = ?1",
            params![assignment_id, check_in_at.as_ref().map(format_ts)],
        )?;
        Ok(rows)
    }
}

fn map_heat_row(row: &Row) -> SqliteResult<Heat> {
    let start: String = row.get(4)?;
    let end: String = row.get(5)?;
    Ok(Heat {
        heat_id: row.get(0)?,
        event_id: row.get(1)?,
        floor_id: row.get(2)?,
        heat_number: row.get(3)?,
        start_time: parse_ts(4, &start)?,
        end_time: parse_ts(5, &end)?,
        target_division_id: row.get(6)?,
    })
}

fn map_assignment_row(row: &Row) -> SqliteResult<HeatAssignment> {
    let check_in: Option<String> = row.get(5)?;
    Ok(HeatAssignment {
        assignment_id: row.get(0)?,
        heat_id: row.get(1)?,
        event_id: row.get(2)?,
        registration_id: row.get(3)?,
        lane_number: row.get(4)?,
        check_in_at: check_in.map(|s| parse_ts(5, &s)).transpose()?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn setup_test_db() -> Arc<Mutex<Connection>> {
        let conn = Connection::open_in_memory().unwrap();
        crate::db::configure_sqlite_connection(&conn).unwrap();
        crate::db::ensure_schema(&conn).unwrap();
        conn.execute_batch(
            r#"
            INSERT INTO competition_event VALUES ('evt-1', 'comp-1', 'Event 1', 1);
            INSERT INTO competition_floor VALUES ('floor-a', 'comp-1', 'Floor A', 2, 'LANES', 1);
            INSERT INTO division VALUES ('div-rx', 'comp-1', 'RX', 1);
            INSERT INTO registration VALUES ('reg-1', 'comp-1', 'u1', 'div-rx', 1, NULL, '2026-01-01 10:00:00');
            INSERT INTO registration VALUES ('reg-2', 'comp-1', 'u2', 'div-rx', 1, NULL, '2026-01-01 10:01:00');
            INSERT INTO registration VALUES ('reg-3', 'comp-1', 'u3', 'div-rx', 1, NULL, '2026-01-01 10:02:00');
            "#,
        )
        .unwrap();
        Arc::new(Mutex::new(conn))
    }

    fn ts(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 3, 14)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    fn heat(id: &str, number: i32, start: NaiveDateTime) -> Heat {
        Heat {
            heat_id: id.to_string(),
            event_id: "evt-1".to_string(),
            floor_id: "floor-a".to_string(),
            heat_number: number,
            start_time: start,
            end_time: start + chrono::Duration::minutes(10),
            target_division_id: Some("div-rx".to_string()),
        }
    }

    fn assignment(id: &str, heat_id: &str, reg: &str, lane: i32) -> HeatAssignment {
        HeatAssignment {
            assignment_id: id.to_string(),
            heat_id: heat_id.to_string(),
            event_id: "evt-1".to_string(),
            registration_id: reg.to_string(),
            lane_number: Some(lane),
            check_in_at: None,
        }
    }

    #[test]
    fn test_replace_schedule_then_read_back() {
        let repo = HeatScheduleRepository::new(setup_test_db());

        let heats = vec![heat("h1", 1, ts(9, 0)), heat("h2", 2, ts(9, 15))];
        let assignments = vec![
            assignment("a1", "h1", "reg-1", 1),
            assignment("a2", "h1", "reg-2", 2),
            assignment("a3", "h2", "reg-3", 1),
        ];

        let deleted = repo.replace_schedule("evt-1", &heats, &assignments).unwrap();
        assert_eq!(deleted, ScheduleDeleteCount::default());

        let loaded = repo.find_heats_with_assignments("evt-1").unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].heat.heat_number, 1);
        assert_eq!(loaded[0].floor_name.as_deref(), Some("Floor A"));
        assert_eq!(loaded[0].division_label.as_deref(), Some("RX"));
        assert_eq!(loaded[0].athlete_count(), 2);
        assert_eq!(loaded[1].assignments[0].registration_id, "reg-3");
    }

    #[test]
    fn test_replace_schedule_replaces_previous_rows() {
        let repo = HeatScheduleRepository::new(setup_test_db());

        repo.replace_schedule(
            "evt-1",
            &[heat("h1", 1, ts(9, 0))],
            &[assignment("a1", "h1", "reg-1", 1)],
        )
        .unwrap();

        let deleted = repo
            .replace_schedule(
                "evt-1",
                &[heat("h9", 1, ts(11, 0))],
                &[assignment("a9", "h9", "reg-1", 1)],
            )
            .unwrap();
        assert_eq!(deleted, ScheduleDeleteCount { heats: 1, assignments: 1 });

        let loaded = repo.find_heats_with_assignments("evt-1").unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].heat.heat_id, "h9");
        assert!(repo.get_assignment("a1").unwrap().is_none());
    }

    #[test]
    fn test_failed_replace_rolls_back() {
        let repo = HeatScheduleRepository::new(setup_test_db());

        repo.replace_schedule(
            "evt-1",
            &[heat("h1", 1, ts(9, 0))],
            &[assignment("a1", "h1", "reg-1", 1)],
        )
        .unwrap();

        // 同一报名重复分配 -> 唯一约束失败, 整体回滚
        let result = repo.replace_schedule(
            "evt-1",
            &[heat("h2", 1, ts(10, 0))],
            &[
                assignment("a2", "h2", "reg-2", 1),
                assignment("a3", "h2", "reg-2", 2),
            ],
        );
        assert!(matches!(
            result,
            Err(RepositoryError::UniqueConstraintViolation(_))
        ));

        let loaded = repo.find_heats_with_assignments("evt-1").unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].heat.heat_id, "h1");
        assert!(repo.get_assignment("a1").unwrap().is_some());
    }

    #[test]
    fn test_update_check_in_and_delete_schedule() {
        let repo = HeatScheduleRepository::new(setup_test_db());
        repo.replace_schedule(
            "evt-1",
            &[heat("h1", 1, ts(9, 0))],
            &[assignment("a1", "h1", "reg-1", 1)],
        )
        .unwrap();

        assert_eq!(repo.update_check_in("a1", Some(ts(8, 45))).unwrap(), 1);
        let checked = repo.get_assignment("a1").unwrap().unwrap();
        assert_eq!(checked.check_in_at, Some(ts(8, 45)));

        assert_eq!(repo.update_check_in("a1", None).unwrap(), 1);
        assert!(repo.get_assignment("a1").unwrap().unwrap().check_in_at.is_none());

        let deleted = repo.delete_schedule("evt-1").unwrap();
        assert_eq!(deleted, ScheduleDeleteCount { heats: 1, assignments: 1 });
        assert_eq!(repo.update_check_in("a1", Some(ts(9, 0))).unwrap(), 0);
        assert_eq!(repo.count_heats("evt-1").unwrap(), 0);
    }

    #[test]
    fn test_athlete_and_competition_views() {
        let repo = HeatScheduleRepository::new(setup_test_db());
        repo.replace_schedule(
            "evt-1",
            &[heat("h1", 1, ts(9, 0)), heat("h2", 2, ts(9, 15))],
            &[
                assignment("a1", "h1", "reg-1", 1),
                assignment("a2", "h2", "reg-2", 1),
            ],
        )
        .unwrap();

        let athlete = repo.find_athlete_schedule("reg-2").unwrap();
        assert_eq!(athlete.len(), 1);
        assert_eq!(athlete[0].heat_number, 2);
        assert_eq!(athlete[0].event_name, "Event 1");

        let all = repo.find_competition_heats("comp-1").unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].athlete_count, 1);
        assert_eq!(all[1].start_time, ts(9, 15));
    }
}
