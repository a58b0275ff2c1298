// ==========================================
// 赛事分组排程引擎 - 应用状态
// ==========================================
// 职责: 管理应用级别的共享状态和API实例
// 连接: 主连接承载生成/查询; 检录使用独立连接 (文件库 WAL 模式下互不阻塞)
// ==========================================

use std::sync::{Arc, Mutex};

use crate::api::{CheckInApi, HeatApi, ScheduleApi};
use crate::config::config_manager::ConfigManager;
use crate::db::{ensure_schema, open_sqlite_connection};
use crate::engine::{
    CheckInTracker, GenerationLimits, HeatScheduleOrchestrator, HeatScheduleRepositories,
};
use crate::repository::{
    ActionLogRepository, FloorRepository, HeatScheduleRepository, RegistrationRepository,
};

/// 应用状态
///
/// 包含所有API实例和共享资源
pub struct AppState {
    /// 数据库路径
    pub db_path: String,

    /// 热次排程API
    pub heat_api: Arc<HeatApi>,

    /// 检录API
    pub check_in_api: Arc<CheckInApi>,

    /// 赛程查询API
    pub schedule_api: Arc<ScheduleApi>,

    /// 配置管理器
    pub config_manager: Arc<ConfigManager>,

    /// 操作日志仓储（用于审计追踪）
    pub action_log_repo: Arc<ActionLogRepository>,
}

impl AppState {
    /// 创建新的AppState实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径（":memory:" 表示内存库,检录共用主连接）
    ///
    /// # 返回
    /// - Ok(AppState): 应用状态实例
    /// - Err(String): 初始化错误
    pub fn new(db_path: String) -> Result<Self, String> {
        tracing::info!("初始化AppState，数据库路径: {}", db_path);

        let conn = open_sqlite_connection(&db_path)
            .map_err(|e| format!("无法打开数据库: {}", e))?;
        ensure_schema(&conn).map_err(|e| format!("数据库建表失败: {}", e))?;
        let conn = Arc::new(Mutex::new(conn));

        // 内存库无法跨连接共享
        let check_in_conn = if db_path == ":memory:" {
            conn.clone()
        } else {
            let c = open_sqlite_connection(&db_path)
                .map_err(|e| format!("无法打开检录连接: {}", e))?;
            Arc::new(Mutex::new(c))
        };

        // ==========================================
        // 初始化Repository层
        // ==========================================
        let floor_repo = Arc::new(FloorRepository::new(conn.clone()));
        let registration_repo = Arc::new(RegistrationRepository::new(conn.clone()));
        let heat_repo = Arc::new(HeatScheduleRepository::new(conn.clone()));
        let action_log_repo = Arc::new(ActionLogRepository::new(conn.clone()));

        let check_in_heat_repo = Arc::new(HeatScheduleRepository::new(check_in_conn.clone()));
        let check_in_action_log_repo = Arc::new(ActionLogRepository::new(check_in_conn));

        // ==========================================
        // 初始化Engine层
        // ==========================================
        let config_manager = Arc::new(
            ConfigManager::from_connection(conn.clone())
                .map_err(|e| format!("无法创建ConfigManager: {}", e))?,
        );

        let limits = match config_manager.get_generation_limits() {
            Ok((max_heat_duration_minutes, max_transition_minutes)) => GenerationLimits {
                max_heat_duration_minutes,
                max_transition_minutes,
            },
            Err(e) => {
                tracing::warn!("读取生成参数上限失败，使用默认值: {}", e);
                GenerationLimits::default()
            }
        };

        let repos = HeatScheduleRepositories::new(
            registration_repo.clone(),
            registration_repo.clone(),
            floor_repo,
            heat_repo.clone(),
        );
        let orchestrator = Arc::new(HeatScheduleOrchestrator::with_limits(repos, limits));
        let tracker = Arc::new(CheckInTracker::new(check_in_heat_repo));

        // ==========================================
        // 初始化API层
        // ==========================================
        let heat_api = Arc::new(HeatApi::new(
            orchestrator,
            heat_repo.clone(),
            registration_repo.clone(),
            action_log_repo.clone(),
            config_manager.clone(),
        ));
        let check_in_api = Arc::new(CheckInApi::new(tracker, check_in_action_log_repo));
        let schedule_api = Arc::new(ScheduleApi::new(heat_repo, registration_repo));

        tracing::info!("AppState初始化完成");

        Ok(Self {
            db_path,
            heat_api,
            check_in_api,
            schedule_api,
            config_manager,
            action_log_repo,
        })
    }
}

/// 获取默认数据库路径
///
/// 优先级: 环境变量 COMPETITION_HEATS_DB_PATH > 用户数据目录 > 当前目录
pub fn get_default_db_path() -> String {
    use std::path::PathBuf;

    if let Ok(path) = std::env::var("COMPETITION_HEATS_DB_PATH") {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./competition_heats.db");

    if let Some(data_dir) = dirs::data_dir() {
        let dir = data_dir.join("competition-heats");
        // 目录创建失败时回落到当前目录
        if std::fs::create_dir_all(&dir).is_ok() {
            path = dir.join("competition_heats.db");
        }
    }

    path.to_string_lossy().to_string()
}
