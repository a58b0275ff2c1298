// ==========================================
// 赛事分组排程引擎 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value + scope)
// ==========================================

use crate::config::heat_config_trait::HeatConfigReader;
use crate::db::open_sqlite_connection;
use async_trait::async_trait;
use rusqlite::{params, Connection};
use serde_json::json;
use std::collections::BTreeMap;
use std::error::Error;
use std::sync::{Arc, Mutex};

/// 热次时长默认值（分钟）
pub const DEFAULT_HEAT_DURATION_MINUTES: i64 = 15;
/// 换场间隔默认值（分钟）
pub const DEFAULT_TRANSITION_MINUTES: i64 = 5;
pub const DEFAULT_KEEP_DIVISIONS_PURE: bool = true;
pub const DEFAULT_MAX_HEAT_DURATION_MINUTES: i64 = 120;
pub const DEFAULT_MAX_TRANSITION_MINUTES: i64 = 60;
/// 上限配置本身的硬上限（24 小时）
pub const HARD_LIMIT_CEILING_MINUTES: i64 = 24 * 60;

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> Result<Self, Box<dyn Error>> {
        let conn = open_sqlite_connection(db_path)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 说明：为保证连接行为一致，会对传入连接再次应用统一 PRAGMA（幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Result<Self, Box<dyn Error>> {
        {
            let conn_guard = conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
            crate::db::configure_sqlite_connection(&conn_guard)?;
        }

        Ok(Self { conn })
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    fn get_config_value(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let result = conn.query_row(
            "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
            params![key],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(Box::new(e)),
        }
    }

    /// 写入 global scope 的配置值（存在则覆盖）
    pub fn set_global_config_value(&self, key: &str, value: &str) -> Result<(), Box<dyn Error>> {
        let key = key.trim();
        if key.is_empty() {
            return Err("配置键不能为空".into());
        }

        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value) VALUES ('global', ?1, ?2)
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2, updated_at = datetime('now')",
            params![key, value],
        )?;

        tracing::debug!(config_key = key, value = value, "配置已更新");
        Ok(())
    }

    /// 从 config_kv 表读取配置值，带默认值
    fn get_config_or_default(&self, key: &str, default: &str) -> Result<String, Box<dyn Error>> {
        Ok(self.get_config_value(key)?.unwrap_or_else(|| default.to_string()))
    }

    /// 读取整数配置（格式错误时回落到默认值）
    fn get_i64_or_default(&self, key: &str, default: i64) -> Result<i64, Box<dyn Error>> {
        let value = self.get_config_or_default(key, &default.to_string())?;
        Ok(value.trim().parse::<i64>().unwrap_or_else(|_| {
            tracing::warn!(config_key = key, raw_value = %value, "配置格式错误，使用默认值");
            default
        }))
    }

    /// 读取上限配置
    ///
    /// - 小于 floor: 视为非法,使用默认值
    /// - 超过 HARD_LIMIT_CEILING_MINUTES: 截断到硬上限
    fn get_limit_or_default(&self, key: &str, default: i64, floor: i64) -> Result<i64, Box<dyn Error>> {
        let value = self.get_i64_or_default(key, default)?;
        if value < floor {
            tracing::warn!(config_key = key, value = value, "上限配置非法，使用默认值");
            return Ok(default);
        }
        if value > HARD_LIMIT_CEILING_MINUTES {
            tracing::warn!(
                config_key = key,
                value = value,
                ceiling = HARD_LIMIT_CEILING_MINUTES,
                "上限配置超过硬上限，已截断"
            );
            return Ok(HARD_LIMIT_CEILING_MINUTES);
        }
        Ok(value)
    }

    /// 获取所有配置的快照（JSON格式）
    ///
    /// # 用途
    /// - 生成热次时写入操作日志,便于追溯当时的默认值与上限
    pub fn get_config_snapshot(&self) -> Result<String, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let mut stmt = conn.prepare(
            "SELECT key, value FROM config_kv WHERE scope_id = 'global' ORDER BY key",
        )?;

        let mut config_map: BTreeMap<String, String> = BTreeMap::new();
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        for row in rows {
            let (key, value) = row?;
            config_map.insert(key, value);
        }

        Ok(serde_json::to_string(&json!(config_map))?)
    }

    /// 同步读取生成参数上限
    ///
    /// # 返回
    /// - (max_heat_duration_minutes, max_transition_minutes)
    pub fn get_generation_limits(&self) -> Result<(i64, i64), Box<dyn Error>> {
        let max_duration = self.get_limit_or_default(
            config_keys::MAX_HEAT_DURATION_MINUTES,
            DEFAULT_MAX_HEAT_DURATION_MINUTES,
            1,
        )?;
        let max_transition = self.get_limit_or_default(
            config_keys::MAX_TRANSITION_MINUTES,
            DEFAULT_MAX_TRANSITION_MINUTES,
            0,
        )?;
        Ok((max_duration, max_transition))
    }
}

// ==========================================
// HeatConfigReader Trait 实现
// ==========================================
#[async_trait]
impl HeatConfigReader for ConfigManager {
    async fn get_default_heat_duration_minutes(&self) -> Result<i64, Box<dyn Error>> {
        self.get_i64_or_default(
            config_keys::DEFAULT_HEAT_DURATION_MINUTES,
            DEFAULT_HEAT_DURATION_MINUTES,
        )
    }

    async fn get_default_transition_minutes(&self) -> Result<i64, Box<dyn Error>> {
        self.get_i64_or_default(
            config_keys::DEFAULT_TRANSITION_MINUTES,
            DEFAULT_TRANSITION_MINUTES,
        )
    }

    async fn get_default_keep_divisions_pure(&self) -> Result<bool, Box<dyn Error>> {
        let value = self.get_config_or_default(config_keys::DEFAULT_KEEP_DIVISIONS_PURE, "true")?;
        match value.trim().to_lowercase().as_str() {
            "true" | "1" | "yes" => Ok(true),
            "false" | "0" | "no" => Ok(false),
            _ => Ok(DEFAULT_KEEP_DIVISIONS_PURE),
        }
    }

    async fn get_max_heat_duration_minutes(&self) -> Result<i64, Box<dyn Error>> {
        self.get_limit_or_default(
            config_keys::MAX_HEAT_DURATION_MINUTES,
            DEFAULT_MAX_HEAT_DURATION_MINUTES,
            1,
        )
    }

    async fn get_max_transition_minutes(&self) -> Result<i64, Box<dyn Error>> {
        self.get_limit_or_default(
            config_keys::MAX_TRANSITION_MINUTES,
            DEFAULT_MAX_TRANSITION_MINUTES,
            0,
        )
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 默认生成参数
    pub const DEFAULT_HEAT_DURATION_MINUTES: &str = "default_heat_duration_minutes";
    pub const DEFAULT_TRANSITION_MINUTES: &str = "default_transition_minutes";
    pub const DEFAULT_KEEP_DIVISIONS_PURE: &str = "default_keep_divisions_pure";

    // 输入上限
    pub const MAX_HEAT_DURATION_MINUTES: &str = "max_heat_duration_minutes";
    pub const MAX_TRANSITION_MINUTES: &str = "max_transition_minutes";
}
