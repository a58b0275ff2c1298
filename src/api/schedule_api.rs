// ==========================================
// 赛事分组排程引擎 - 赛程查询 API
// ==========================================
// 职责: 选手个人赛程、赛事按日汇总赛程
// 只读,不写 ActionLog
// ==========================================

use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::api::error::{ApiError, ApiResult};
use crate::api::heat_api::require_id;
use crate::repository::heat_repo::{AthleteHeatEntity, HeatScheduleRepository, ScheduledHeatEntity};
use crate::repository::registration_repo::RegistrationRepository;

/// 混合热次的组别显示名
pub const MIXED_DIVISION_LABEL: &str = "Mixed";

// ==========================================
// DTO 定义
// ==========================================

/// 选手个人赛程条目
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AthleteHeatSchedule {
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
    pub checked_in: bool,
}

impl From<AthleteHeatEntity> for AthleteHeatSchedule {
    fn from(entity: AthleteHeatEntity) -> Self {
        Self {
            checked_in: entity.check_in_at.is_some(),
            assignment_id: entity.assignment_id,
            event_id: entity.event_id,
            event_name: entity.event_name,
            event_position: entity.event_position,
            heat_id: entity.heat_id,
            heat_number: entity.heat_number,
            start_time: entity.start_time,
            end_time: entity.end_time,
            floor_id: entity.floor_id,
            floor_name: entity.floor_name,
            lane_number: entity.lane_number,
            check_in_at: entity.check_in_at,
        }
    }
}

/// 汇总赛程中的单个热次
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduledHeatSummary {
    pub heat_id: String,
    pub heat_number: i32,
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
    pub floor_name: String,
    pub event_id: String,
    pub event_name: String,
    pub event_position: i32,
    pub division_label: String,
    pub athlete_count: i64,
}

impl From<ScheduledHeatEntity> for ScheduledHeatSummary {
    fn from(entity: ScheduledHeatEntity) -> Self {
        Self {
            heat_id: entity.heat_id,
            heat_number: entity.heat_number,
            start_time: entity.start_time,
            end_time: entity.end_time,
            floor_name: entity.floor_name.unwrap_or_default(),
            event_id: entity.event_id,
            event_name: entity.event_name,
            event_position: entity.event_position,
            division_label: entity
                .division_label
                .unwrap_or_else(|| MIXED_DIVISION_LABEL.to_string()),
            athlete_count: entity.athlete_count,
        }
    }
}

/// 按日汇总的赛程
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleDay {
    pub date: NaiveDate,
    pub heats: Vec<ScheduledHeatSummary>,
}

impl ScheduleDay {
    pub fn athlete_count(&self) -> i64 {
        self.heats.iter().map(|h| h.athlete_count).sum()
    }
}

// ==========================================
// ScheduleApi - 赛程查询 API
// ==========================================
pub struct ScheduleApi {
    heat_repo: Arc<HeatScheduleRepository>,
    registration_repo: Arc<RegistrationRepository>,
}

impl ScheduleApi {
    /// 创建新的ScheduleApi实例
    pub fn new(
        heat_repo: Arc<HeatScheduleRepository>,
        registration_repo: Arc<RegistrationRepository>,
    ) -> Self {
        Self {
            heat_repo,
            registration_repo,
        }
    }

    /// 查询选手个人赛程（按开始时间排序）
    ///
    /// # 返回
    /// - Ok(Vec): 选手在各赛项的热次; 尚未生成时为空
    /// - Err(ApiError::NotFound): 报名不存在
    pub fn get_athlete_schedule(&self, registration_id: &str) -> ApiResult<Vec<AthleteHeatSchedule>> {
        let registration_id = require_id(registration_id, "报名ID")?;

        if self.registration_repo.find_by_id(registration_id)?.is_none() {
            return Err(ApiError::NotFound(format!(
                "Registration(id={})不存在",
                registration_id
            )));
        }

        let rows = self.heat_repo.find_athlete_schedule(registration_id)?;
        Ok(rows.into_iter().map(AthleteHeatSchedule::from).collect())
    }

    /// 查询赛事赛程汇总（按日期分组,日期升序,日内按开始时间）
    pub fn get_competition_schedule_summary(&self, competition_id: &str) -> ApiResult<Vec<ScheduleDay>> {
        let competition_id = require_id(competition_id, "赛事ID")?;
        let rows = self.heat_repo.find_competition_heats(competition_id)?;
        Ok(group_by_date(rows))
    }
}

/// 按开始日期分组（输入已按开始时间排序）
fn group_by_date(rows: Vec<ScheduledHeatEntity>) -> Vec<ScheduleDay> {
    let mut days: Vec<ScheduleDay> = Vec::new();
    for row in rows {
        let date = row.start_time.date();
        match days.last_mut() {
            Some(day) if day.date == date => day.heats.push(row.into()),
            _ => days.push(ScheduleDay {
                date,
                heats: vec![row.into()],
            }),
        }
    }
    days
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(heat_number: i32, start: &str, division_label: Option<&str>) -> ScheduledHeatEntity {
        let start_time = NaiveDateTime::parse_from_str(start, "%Y-%m-%d %H:%M:%S").unwrap();
        ScheduledHeatEntity {
            heat_id: format!("h{}", heat_number),
            heat_number,
            start_time,
            end_time: start_time + chrono::Duration::minutes(15),
            event_id: "evt-1".to_string(),
            event_name: "Event 1".to_string(),
            event_position: 1,
            floor_name: Some("Main".to_string()),
            division_label: division_label.map(|s| s.to_string()),
            athlete_count: 3,
        }
    }

    #[test]
    fn test_group_by_date() {
        let days = group_by_date(vec![
            row(1, "2026-03-14 09:00:00", Some("RX")),
            row(2, "2026-03-14 09:20:00", None),
            row(1, "2026-03-15 08:00:00", Some("RX")),
        ]);

        assert_eq!(days.len(), 2);
        assert_eq!(days[0].date, NaiveDate::from_ymd_opt(2026, 3, 14).unwrap());
        assert_eq!(days[0].heats.len(), 2);
        assert_eq!(days[0].heats[1].division_label, MIXED_DIVISION_LABEL);
        assert_eq!(days[0].athlete_count(), 6);
        assert_eq!(days[1].heats[0].floor_name, "Main");
    }

    #[test]
    fn test_group_by_date_empty() {
        assert!(group_by_date(Vec::new()).is_empty());
    }
}
