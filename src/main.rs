// ==========================================
// 农作物种植监测系统 - 定时任务入口
// ==========================================
// 用法:
//   farm-monitor [--db <path>] [--once] [--json-log] [--import-varieties <csv>]
//
// 默认按 sweep_interval_hours（config_kv，默认 24 小时）循环执行
// 到期转待收获；--once 只执行一次后退出。
// ==========================================

use anyhow::{anyhow, Context};
use chrono::Local;
use farm_monitor::app::{get_default_db_path, AppState};
use farm_monitor::domain::access::{AccessScope, Actor, Capability, CapabilitySet};
use farm_monitor::logging;
use std::time::Duration;

const SCHEDULER_ACTOR: &str = "scheduler";

#[derive(Debug, Default)]
struct CliArgs {
    db_path: Option<String>,
    once: bool,
    json_log: bool,
    import_varieties: Option<String>,
}

fn parse_args() -> anyhow::Result<CliArgs> {
    let mut parsed = CliArgs::default();
    let mut args = std::env::args().skip(1);

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--once" => parsed.once = true,
            "--json-log" => parsed.json_log = true,
            "--db" => {
                parsed.db_path = Some(args.next().ok_or_else(|| anyhow!("--db 需要数据库路径"))?);
            }
            "--import-varieties" => {
                parsed.import_varieties =
                    Some(args.next().ok_or_else(|| anyhow!("--import-varieties 需要 CSV 路径"))?);
            }
            other => return Err(anyhow!("未知参数: {}", other)),
        }
    }
    Ok(parsed)
}

/// 定时任务操作人：仅具备执行巡检的能力
fn scheduler_actor() -> Actor {
    Actor::new(
        SCHEDULER_ACTOR,
        CapabilitySet::new().with(Capability::RunStatusSweep),
        AccessScope::All,
    )
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = parse_args()?;
    if args.json_log {
        logging::init_json();
    } else {
        logging::init();
    }

    tracing::info!("==================================================");
    tracing::info!("{} - 到期转待收获定时任务", farm_monitor::APP_NAME);
    tracing::info!("系统版本: {}", farm_monitor::VERSION);
    tracing::info!("==================================================");

    let db_path = args.db_path.clone().unwrap_or_else(get_default_db_path);
    tracing::info!("使用数据库: {}", db_path);

    let state = AppState::new(db_path).map_err(|e| anyhow!(e)).context("无法初始化AppState")?;

    if let Some(csv_path) = &args.import_varieties {
        let summary = state
            .variety_importer
            .import_csv(csv_path, SCHEDULER_ACTOR)
            .with_context(|| format!("品种目录导入失败: {}", csv_path))?;
        tracing::info!(
            inserted = summary.inserted,
            updated = summary.updated,
            skipped = summary.skipped,
            "品种目录已导入"
        );
    }

    let actor = scheduler_actor();

    if args.once {
        let report = state.sweep_api.run(&actor, Local::now().date_naive()).await?;
        tracing::info!(promoted = report.promoted, skipped = report.skipped_conflicts, "执行完成");
        return Ok(());
    }

    let hours = state.sweep_api.interval_hours().await?;
    tracing::info!("执行间隔: {} 小时", hours);
    let mut ticker = tokio::time::interval(Duration::from_secs(hours * 3600));

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                // 单次失败只记录，不中断循环
                match state.sweep_api.run(&actor, Local::now().date_naive()).await {
                    Ok(report) => tracing::debug!(?report, "本轮执行结果"),
                    Err(e) => tracing::error!(error = %e, "到期转待收获执行失败"),
                }
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("收到退出信号，停止定时任务");
                break;
            }
        }
    }

    Ok(())
}
