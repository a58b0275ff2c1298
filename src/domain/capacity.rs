// ==========================================
// 赛事分组排程引擎 - 容量模型
// ==========================================
// 职责: 场地每组容量 + 热次时间窗的纯值类型
// 红线: 仅做算术,不做校验之外的业务判断
// ==========================================

use crate::domain::types::CapacityKind;
use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};

// ==========================================
// CapacityModel - 场地容量
// ==========================================
// 只能通过 new 构造,保证 athletes_per_heat > 0
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapacityModel {
    athletes_per_heat: usize,
    kind: CapacityKind,
}

impl CapacityModel {
    /// 构造容量模型
    ///
    /// # 返回
    /// - Some: capacity > 0
    /// - None: capacity <= 0 (配置错误,由调用方转为 InvalidConfiguration)
    pub fn new(capacity: i32, kind: CapacityKind) -> Option<Self> {
        if capacity <= 0 {
            return None;
        }
        Some(Self {
            athletes_per_heat: capacity as usize,
            kind,
        })
    }

    pub fn athletes_per_heat(&self) -> usize {
        self.athletes_per_heat
    }

    /// 是否按道次编号
    pub fn assigns_lanes(&self) -> bool {
        self.kind == CapacityKind::Lanes
    }

    /// 所需热次数 = ceil(athlete_count / capacity)
    pub fn heats_needed(&self, athlete_count: usize) -> usize {
        athlete_count.div_ceil(self.athletes_per_heat)
    }
}

// ==========================================
// HeatTiming - 热次节奏
// ==========================================
// slot[i].start = start_time + i * (heat_duration + transition)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeatTiming {
    pub start_time: NaiveDateTime,
    pub heat_duration_minutes: i64,
    pub transition_minutes: i64,
}

impl HeatTiming {
    pub fn new(start_time: NaiveDateTime, heat_duration_minutes: i64, transition_minutes: i64) -> Self {
        Self {
            start_time,
            heat_duration_minutes,
            transition_minutes,
        }
    }

    /// 相邻热次开始时间间隔（分钟）,溢出时为 None
    pub fn cadence_minutes(&self) -> Option<i64> {
        self.heat_duration_minutes.checked_add(self.transition_minutes)
    }

    /// 第 index 个热次（0 起）的时间窗
    ///
    /// # 返回
    /// - None: 分钟数溢出或超出日期范围
    pub fn window(&self, index: usize) -> Option<HeatWindow> {
        let offset = self
            .cadence_minutes()?
            .checked_mul(i64::try_from(index).ok()?)?;
        let start = self
            .start_time
            .checked_add_signed(Duration::try_minutes(offset)?)?;
        let end = start.checked_add_signed(Duration::try_minutes(self.heat_duration_minutes)?)?;
        Some(HeatWindow { start, end })
    }
}

// ==========================================
// HeatWindow - 热次时间窗 [start, end)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeatWindow {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl HeatWindow {
    pub fn duration_minutes(&self) -> i64 {
        (self.end - self.start).num_minutes()
    }

    /// 本热次结束到 next 开始的间隔（分钟）,负数表示重叠
    pub fn gap_until(&self, next: &HeatWindow) -> i64 {
        (next.start - self.end).num_minutes()
    }
}
