// ==========================================
// 测试辅助函数
// ==========================================
// 职责: 提供测试所需的数据库初始化、测试数据生成等功能
// 说明: 场地/组别/报名由外部系统维护,测试中直接写表
// ==========================================
#![allow(dead_code)]

use chrono::{NaiveDate, NaiveDateTime};
use competition_heats::app::AppState;
use competition_heats::db::{ensure_schema, open_sqlite_connection};
use rusqlite::{params, Connection};
use std::error::Error;
use tempfile::NamedTempFile;

/// 创建临时测试数据库并初始化 schema
///
/// # 返回
/// - NamedTempFile: 临时数据库文件（需要保持存活）
/// - String: 数据库文件路径
pub fn create_test_db() -> Result<(NamedTempFile, String), Box<dyn Error>> {
    competition_heats::logging::init_test();

    let temp_file = NamedTempFile::new()?;
    let db_path = temp_file
        .path()
        .to_str()
        .ok_or("临时文件路径不是合法 UTF-8")?
        .to_string();

    let conn = open_sqlite_connection(&db_path)?;
    ensure_schema(&conn)?;

    Ok((temp_file, db_path))
}

/// 创建测试数据库 + 标准赛事数据 + AppState
pub fn create_test_env() -> Result<(NamedTempFile, String, Seeder, AppState), Box<dyn Error>> {
    let (temp_file, db_path) = create_test_db()?;
    let seeder = Seeder::open(&db_path)?;
    seeder.standard_competition()?;
    let state = AppState::new(db_path.clone())?;
    Ok((temp_file, db_path, seeder, state))
}

/// 固定日期的时间点
pub fn at(day: u32, h: u32, m: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2026, 3, day)
        .and_then(|d| d.and_hms_opt(h, m, 0))
        .expect("测试时间非法")
}

// ==========================================
// Seeder - 测试数据写入
// ==========================================
pub struct Seeder {
    conn: Connection,
    seq: std::cell::Cell<u32>,
}

impl Seeder {
    pub fn open(db_path: &str) -> Result<Self, Box<dyn Error>> {
        Ok(Self {
            conn: open_sqlite_connection(db_path)?,
            seq: std::cell::Cell::new(0),
        })
    }

    /// 标准赛事:
    /// - comp-1: 赛项 evt-1 / evt-2; 场地 floor-main(10, 道次) / floor-side(6, 人数)
    /// - comp-1 组别: div-rx(RX, 1) / div-scaled(Scaled, 2)
    /// - comp-2: 场地 floor-foreign
    pub fn standard_competition(&self) -> Result<(), Box<dyn Error>> {
        self.event("evt-1", "comp-1", "Event 1", 1)?;
        self.event("evt-2", "comp-1", "Event 2", 2)?;
        self.floor("floor-main", "comp-1", "Main Floor", 10, "LANES")?;
        self.floor("floor-side", "comp-1", "Side Floor", 6, "HEADCOUNT")?;
        self.floor("floor-foreign", "comp-2", "Foreign Floor", 10, "HEADCOUNT")?;
        self.division("div-rx", "comp-1", "RX", 1)?;
        self.division("div-scaled", "comp-1", "Scaled", 2)?;
        Ok(())
    }

    pub fn event(&self, event_id: &str, competition_id: &str, name: &str, position: i32) -> Result<(), Box<dyn Error>> {
        self.conn.execute(
            "INSERT INTO competition_event (event_id, competition_id, name, position) VALUES (?1, ?2, ?3, ?4)",
            params![event_id, competition_id, name, position],
        )?;
        Ok(())
    }

    pub fn floor(
        &self,
        floor_id: &str,
        competition_id: &str,
        name: &str,
        capacity: i32,
        capacity_kind: &str,
    ) -> Result<(), Box<dyn Error>> {
        self.conn.execute(
            "INSERT INTO competition_floor (floor_id, competition_id, name, capacity, capacity_kind, position)
             VALUES (?1, ?2, ?3, ?4, ?5, 0)",
            params![floor_id, competition_id, name, capacity, capacity_kind],
        )?;
        Ok(())
    }

    pub fn division(&self, division_id: &str, competition_id: &str, label: &str, position: i32) -> Result<(), Box<dyn Error>> {
        self.conn.execute(
            "INSERT INTO division (division_id, competition_id, label, position) VALUES (?1, ?2, ?3, ?4)",
            params![division_id, competition_id, label, position],
        )?;
        Ok(())
    }

    /// 按报名先后写入 count 条个人报名
    ///
    /// # 返回
    /// 新报名ID（名单顺序）
    pub fn registrations(
        &self,
        competition_id: &str,
        division_id: &str,
        count: usize,
    ) -> Result<Vec<String>, Box<dyn Error>> {
        self.team_registrations(competition_id, division_id, count, 1)
    }

    /// 按报名先后写入 count 条报名,每条 team_size 人
    pub fn team_registrations(
        &self,
        competition_id: &str,
        division_id: &str,
        count: usize,
        team_size: i32,
    ) -> Result<Vec<String>, Box<dyn Error>> {
        let mut ids = Vec::with_capacity(count);
        for _ in 0..count {
            let seq = self.seq.get() + 1;
            self.seq.set(seq);

            let registration_id = format!("reg-{:04}", seq);
            let team_name = (team_size > 1).then(|| format!("Team {}", seq));
            let created_at = at(1, 8, 0) + chrono::Duration::seconds(seq as i64);
            self.conn.execute(
                "INSERT INTO registration (registration_id, competition_id, competitor_id, division_id, team_size, team_name, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    registration_id,
                    competition_id,
                    format!("user-{}", seq),
                    division_id,
                    team_size,
                    team_name,
                    created_at.format("%Y-%m-%d %H:%M:%S").to_string()
                ],
            )?;
            ids.push(registration_id);
        }
        Ok(ids)
    }

    pub fn conn(&self) -> &Connection {
        &self.conn
    }
}
