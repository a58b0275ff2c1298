// ==========================================
// 赛事分组排程引擎 - 命令行入口
// ==========================================
// 用法:
//   competition-heats generate <event_id> <floor_id> <start_time> [duration] [transition] [mixed|pure]
//   competition-heats schedule <event_id>
//   competition-heats summary <competition_id>
//   competition-heats athlete <registration_id>
//   competition-heats check-in <assignment_id>
//   competition-heats undo-check-in <assignment_id>
//   competition-heats clear <event_id>
//   competition-heats log <event_id>
//
// start_time 格式: "YYYY-MM-DD HH:MM"
// 数据库路径: COMPETITION_HEATS_DB_PATH 或用户数据目录
// 日志格式: COMPETITION_HEATS_LOG_FORMAT=json 时输出 JSON 行
// 结果以 JSON 输出到 stdout, 日志输出到 stderr
// ==========================================

use chrono::NaiveDateTime;
use competition_heats::app::{get_default_db_path, AppState};
use competition_heats::engine::AllocationStrategy;
use competition_heats::logging;
use serde::Serialize;
use std::error::Error;

const USAGE: &str = "用法: competition-heats <generate|schedule|summary|athlete|check-in|undo-check-in|clear|log> <id> [参数...]";

fn print_json<T: Serialize>(value: &T) -> Result<(), Box<dyn Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn operator() -> String {
    std::env::var("USER")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| "cli".to_string())
}

fn parse_start_time(raw: &str) -> Result<NaiveDateTime, Box<dyn Error>> {
    NaiveDateTime::parse_from_str(raw.trim(), "%Y-%m-%d %H:%M")
        .or_else(|_| NaiveDateTime::parse_from_str(raw.trim(), "%Y-%m-%d %H:%M:%S"))
        .map_err(|e| format!("开始时间格式错误 ({}): {}", raw, e).into())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    match std::env::var("COMPETITION_HEATS_LOG_FORMAT").as_deref() {
        Ok("json") => logging::init_json(),
        _ => logging::init(),
    }

    tracing::info!("==================================================");
    tracing::info!("赛事分组排程引擎");
    tracing::info!("系统版本: {}", competition_heats::VERSION);
    tracing::info!("==================================================");

    let args: Vec<String> = std::env::args().skip(1).collect();
    let (command, id) = match (args.first(), args.get(1)) {
        (Some(command), Some(id)) => (command.as_str(), id.as_str()),
        _ => {
            eprintln!("{}", USAGE);
            std::process::exit(2);
        }
    };

    let db_path = get_default_db_path();
    tracing::info!("使用数据库: {}", db_path);
    let state = AppState::new(db_path)?;
    let operator = operator();

    match command {
        "generate" => {
            let floor_id = args.get(2).ok_or(USAGE)?;
            let start_time = parse_start_time(args.get(3).ok_or(USAGE)?)?;
            let duration = args.get(4).map(|s| s.parse::<i64>()).transpose()?;
            let transition = args.get(5).map(|s| s.parse::<i64>()).transpose()?;
            let keep_divisions_pure = args
                .get(6)
                .map(|s| s.parse::<AllocationStrategy>())
                .transpose()?
                .map(|strategy| strategy.keeps_divisions_pure());

            let result = state
                .heat_api
                .generate_heats_with_defaults(
                    id,
                    floor_id,
                    start_time,
                    duration,
                    transition,
                    keep_divisions_pure,
                    &operator,
                )
                .await?;
            print_json(&result)?;
        }
        "schedule" => print_json(&state.heat_api.get_heats_for_event(id)?)?,
        "summary" => print_json(
            &state
                .schedule_api
                .get_competition_schedule_summary(id)?,
        )?,
        "athlete" => print_json(&state.schedule_api.get_athlete_schedule(id)?)?,
        "check-in" => print_json(&state.check_in_api.check_in(id, &operator)?)?,
        "undo-check-in" => print_json(&state.check_in_api.undo_check_in(id, &operator)?)?,
        "clear" => print_json(&state.heat_api.clear_heats(id, &operator)?)?,
        "log" => print_json(&state.action_log_repo.find_by_event_id(id)?)?,
        other => {
            eprintln!("未知命令: {}\n{}", other, USAGE);
            std::process::exit(2);
        }
    }

    Ok(())
}
