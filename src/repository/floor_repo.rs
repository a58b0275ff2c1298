// ==========================================
// 赛事分组排程引擎 - 场地/赛项数据仓储
// ==========================================
// 场地由外部 CRUD 维护,此处只读
// 红线: Repository 不含业务逻辑
// ==========================================

use crate::domain::floor::{CompetitionEvent, Floor};
use crate::domain::types::CapacityKind;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::schedule_store::FloorReader;
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult, Row};
use std::sync::{Arc, Mutex};

const FLOOR_COLUMNS: &str =
    "f.floor_id, f.competition_id, f.name, f.capacity, f.capacity_kind, f.position";

// ==========================================
// FloorRepository - 场地仓储
// ==========================================
pub struct FloorRepository {
    conn: Arc<Mutex<Connection>>,
}

impl FloorRepository {
    /// 创建新的FloorRepository实例
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }
}

impl FloorReader for FloorRepository {
    fn find_event(&self, event_id: &str) -> RepositoryResult<Option<CompetitionEvent>> {
        let conn = self.get_conn()?;
        let event = conn
            .query_row(
                r#"
                SELECT event_id, competition_id, name, position
                FROM competition_event
                WHERE event_id = ?1
                "#,
                params![event_id],
                map_event_row,
            )
            .optional()?;
        Ok(event)
    }

    fn find_floor_for_event(&self, event_id: &str, floor_id: &str) -> RepositoryResult<Option<Floor>> {
        let conn = self.get_conn()?;
        let sql = format!(
            r#"
            SELECT {}
            FROM competition_floor f
            JOIN competition_event e ON e.competition_id = f.competition_id
            WHERE e.event_id = ?1 AND f.floor_id = ?2
            "#,
            FLOOR_COLUMNS
        );
        let floor = conn
            .query_row(&sql, params![event_id, floor_id], map_floor_row)
            .optional()?;
        Ok(floor)
    }
}

fn map_floor_row(row: &Row) -> SqliteResult<Floor> {
    let kind_raw: String = row.get(4)?;
    let capacity_kind = kind_raw.parse::<CapacityKind>().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(
            4,
            rusqlite::types::Type::Text,
            Box::new(RepositoryError::ValidationError(e)),
        )
    })?;

    Ok(Floor {
        floor_id: row.get(0)?,
        competition_id: row.get(1)?,
        name: row.get(2)?,
        capacity: row.get(3)?,
        capacity_kind,
        position: row.get(5)?,
    })
}

fn map_event_row(row: &Row) -> SqliteResult<CompetitionEvent> {
    Ok(CompetitionEvent {
        event_id: row.get(0)?,
        competition_id: row.get(1)?,
        name: row.get(2)?,
        position: row.get(3)?,
    })
}
