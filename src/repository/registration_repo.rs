// ==========================================
// 赛事分组排程引擎 - 报名名单/组别数据仓储
// ==========================================
// 名单与组别由外部报名系统维护,此处只读
// 名单顺序: created_at, registration_id (稳定)
// ==========================================

use crate::db::parse_ts;
use crate::domain::registration::{Division, Registration};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::schedule_store::{DivisionReader, RosterReader};
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult, Row};
use std::sync::{Arc, Mutex};

const REGISTRATION_COLUMNS: &str = r#"
    r.registration_id, r.competition_id, r.competitor_id, r.division_id,
    r.team_size, r.team_name, r.created_at
"#;

// ==========================================
// RegistrationRepository - 报名仓储
// ==========================================
pub struct RegistrationRepository {
    conn: Arc<Mutex<Connection>>,
}

impl RegistrationRepository {
    /// 创建新的RegistrationRepository实例
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 按ID查询报名
    pub fn find_by_id(&self, registration_id: &str) -> RepositoryResult<Option<Registration>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM registration r WHERE r.registration_id = ?1",
            REGISTRATION_COLUMNS
        );
        let registration = conn
            .query_row(&sql, params![registration_id], map_registration_row)
            .optional()?;
        Ok(registration)
    }

    /// 查询在该赛项中尚未分配热次的报名
    ///
    /// 用途: 上次生成之后名单新增的选手
    pub fn list_unassigned(&self, event_id: &str) -> RepositoryResult<Vec<Registration>> {
        let conn = self.get_conn()?;
        let sql = format!(
            r#"
            SELECT {}
            FROM registration r
            JOIN competition_event e ON e.competition_id = r.competition_id
            WHERE e.event_id = ?1
              AND NOT EXISTS (
                  SELECT 1 FROM heat_assignment a
                  WHERE a.event_id = e.event_id AND a.registration_id = r.registration_id
              )
            ORDER BY r.created_at, r.registration_id
            "#,
            REGISTRATION_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let registrations = stmt
            .query_map(params![event_id], map_registration_row)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(registrations)
    }
}

impl RosterReader for RegistrationRepository {
    fn list_registrations(&self, event_id: &str) -> RepositoryResult<Vec<Registration>> {
        let conn = self.get_conn()?;
        let sql = format!(
            r#"
            SELECT {}
            FROM registration r
            JOIN competition_event e ON e.competition_id = r.competition_id
            WHERE e.event_id = ?1
            ORDER BY r.created_at, r.registration_id
            "#,
            REGISTRATION_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let registrations = stmt
            .query_map(params![event_id], map_registration_row)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(registrations)
    }
}

impl DivisionReader for RegistrationRepository {
    fn list_divisions(&self, event_id: &str) -> RepositoryResult<Vec<Division>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT d.division_id, d.competition_id, d.label, d.position
            FROM division d
            JOIN competition_event e ON e.competition_id = d.competition_id
            WHERE e.event_id = ?1
            ORDER BY d.position, d.division_id
            "#,
        )?;
        let divisions = stmt
            .query_map(params![event_id], |row| {
                Ok(Division {
                    division_id: row.get(0)?,
                    competition_id: row.get(1)?,
                    label: row.get(2)?,
                    position: row.get(3)?,
                })
            })?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(divisions)
    }
}

fn map_registration_row(row: &Row) -> SqliteResult<Registration> {
    let created_at_str: String = row.get(6)?;
    Ok(Registration {
        registration_id: row.get(0)?,
        competition_id: row.get(1)?,
        competitor_id: row.get(2)?,
        division_id: row.get(3)?,
        team_size: row.get(4)?,
        team_name: row.get(5)?,
        created_at: parse_ts(6, &created_at_str)?,
    })
}
