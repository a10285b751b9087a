// ==========================================
// 托盘库存分配引擎 - 命令行入口
// ==========================================
// 子命令:
// - run:     CSV 快照 → 分配方案 JSON (不落库)
// - commit:  需求行 CSV + SQLite 库存 → 分配并提交
// - pallets: 出库托盘拆分 (整托 + 余托)
// ==========================================

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use anyhow::{bail, Context};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};

use pallet_allocation::app::{get_default_db_path, AppState};
use pallet_allocation::engine::{AllocationOrchestrator, AllocationSummaryEngine, RemainderPalletCalculator};
use pallet_allocation::importer::SnapshotImporter;
use pallet_allocation::{logging, AllocationConfig, AllocationPlan};

#[derive(Parser)]
#[command(name = "pallet-allocation")]
#[command(author, version, about = "托盘库存分配引擎 (BATCH / FEFO / FIFO)")]
struct Cli {
    /// 以 JSON 行格式输出日志
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 执行分配并输出方案 JSON (不落库)
    Run {
        /// 库存快照 CSV
        #[arg(short, long)]
        inventory: PathBuf,

        /// 需求行 CSV
        #[arg(short, long)]
        demand: PathBuf,

        /// 物料配置 CSV
        #[arg(long)]
        item_config: Option<PathBuf>,

        /// 参考日期 (YYYY-MM-DD, 默认当天)
        #[arg(long)]
        reference_date: Option<NaiveDate>,

        /// 关闭 FIFO 兜底
        #[arg(long)]
        no_fifo_last_resort: bool,

        /// 格式化输出
        #[arg(long)]
        pretty: bool,
    },
    /// 分配并提交到 SQLite (记录落库 + 库存扣减)
    Commit {
        /// 仓库ID
        #[arg(short, long)]
        warehouse: String,

        /// 需求行 CSV
        #[arg(short, long)]
        demand: PathBuf,

        /// 物料配置 CSV
        #[arg(long)]
        item_config: Option<PathBuf>,

        /// 提交前先导入的库存快照 CSV
        #[arg(short, long)]
        inventory: Option<PathBuf>,

        /// 数据库路径 (默认: PALLET_ALLOCATION_DB_PATH 或用户数据目录)
        #[arg(long)]
        db: Option<String>,
    },
    /// 出库托盘拆分
    Pallets {
        /// 分配量
        #[arg(short, long)]
        quantity: f64,

        /// 单位重量
        #[arg(short, long)]
        weight_per_unit: f64,

        /// 每托件数
        #[arg(short, long)]
        units_per_pallet: f64,

        /// 托盘标签前缀
        #[arg(long, default_value = "PLT")]
        base_id: String,
    },
}

fn main() {
    let cli = Cli::parse();

    if cli.log_json {
        logging::init_json();
    } else {
        logging::init();
    }

    if let Err(e) = run(cli) {
        tracing::error!("命令执行失败: {e:#}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Run {
            inventory,
            demand,
            item_config,
            reference_date,
            no_fifo_last_resort,
            pretty,
        } => {
            let request = SnapshotImporter::new()
                .import_request(&inventory, &demand, item_config.as_deref())
                .context("快照导入失败")?;

            let config = AllocationConfig {
                reference_date,
                enable_fifo_last_resort: !no_fifo_last_resort,
                ..Default::default()
            };

            let plan = AllocationOrchestrator::new(config)
                .execute(&request)
                .context("分配输入校验失败")?;

            report(&plan);
            print_json(&plan, pretty)?;
        }
        Commands::Commit {
            warehouse,
            demand,
            item_config,
            inventory,
            db,
        } => {
            let db_path = db.unwrap_or_else(get_default_db_path);
            let state = AppState::new(db_path).map_err(anyhow::Error::msg)?;
            tracing::info!(db = %state.db_path, warehouse = %warehouse, "提交模式");
            let importer = SnapshotImporter::new();

            if let Some(path) = inventory {
                let units = importer.import_inventory(&path).context("库存快照导入失败")?;
                let count = state.allocation_api.import_inventory(&warehouse, &units)?;
                tracing::info!(warehouse = %warehouse, count, "库存快照已写入");
            }

            let mut request = pallet_allocation::AllocationRequest {
                demand_lines: importer.import_demand_lines(&demand).context("需求行导入失败")?,
                ..Default::default()
            };
            if let Some(path) = item_config {
                request.item_configs = importer.import_item_configs(&path).context("物料配置导入失败")?;
            }

            let outcome = state.allocation_api.allocate_and_commit(&warehouse, &request)?;
            report(&outcome.plan);
            print_json(&outcome, true)?;

            if !outcome.is_committed() {
                bail!(
                    "分配未提交: {}",
                    outcome.reason.as_deref().unwrap_or("未知原因")
                );
            }
        }
        Commands::Pallets {
            quantity,
            weight_per_unit,
            units_per_pallet,
            base_id,
        } => {
            let pallets = RemainderPalletCalculator::new().calculate(
                quantity,
                weight_per_unit,
                units_per_pallet,
                &base_id,
            )?;
            print_json(&pallets, true)?;
        }
    }
    Ok(())
}

/// 逐行结论 + 汇总写日志
fn report(plan: &AllocationPlan) {
    let summary_engine = AllocationSummaryEngine::new();
    for result in &plan.results {
        tracing::info!("{}", summary_engine.describe_line(result));
    }
    tracing::info!(status = %plan.summary.status, "{}", plan.summary.status_message);
}

fn print_json<T: serde::Serialize>(value: &T, pretty: bool) -> anyhow::Result<()> {
    let json = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{}", json);
    Ok(())
}
