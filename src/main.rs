// ==========================================
// 售后合单窗口发货判定 - 命令行入口
// ==========================================
// 职责: 解析命令行,调用 LogisticsApi,输出 JSON
// 输出: stdout JSON,日志走 stderr
// ==========================================

use anyhow::anyhow;
use chrono::Utc;
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use shipment_window::app::{get_default_db_path, AppState};
use shipment_window::config::WindowConfigReader;
use shipment_window::domain::ShipBucket;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "shipment-window",
    version,
    about = "售后合单窗口发货判定: 待发/可发分桶",
    long_about = None
)]
struct Cli {
    /// 数据库路径（默认取平台数据目录）
    #[arg(long, env = "SHIPMENT_WINDOW_DB", global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// 从 .csv / .xlsx / .xls / .json 导入订单
    Import {
        file: PathBuf,
    },

    /// 两个桶的计数
    Summary {
        /// 参考日（默认本地今天）
        reference_date: Option<String>,
    },

    /// 分页列出某个桶的订单
    List {
        tab: TabArg,

        /// 参考日（默认本地今天）
        reference_date: Option<String>,

        #[arg(long, default_value_t = 1)]
        page: usize,

        /// 10 / 25 / 50 / 100,默认取配置
        #[arg(long)]
        page_size: Option<usize>,

        #[arg(long, short)]
        search: Option<String>,
    },

    /// 录入物流单号
    Ship {
        order_id: String,
        tracking_code: String,
    },

    /// 清除物流单号
    Unship {
        order_id: String,
    },

    /// 查看或修改配置（无参数: 全量快照）
    Config {
        key: Option<String>,
        value: Option<String>,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum TabArg {
    Ready,
    Waiting,
}

impl From<TabArg> for ShipBucket {
    fn from(tab: TabArg) -> Self {
        match tab {
            TabArg::Ready => ShipBucket::Ready,
            TabArg::Waiting => ShipBucket::Waiting,
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// 本地时区下的今天（未指定参考日时使用）
async fn today(state: &AppState) -> anyhow::Result<String> {
    let offset = state
        .config_manager
        .get_local_offset()
        .await
        .map_err(|e| anyhow!("读取时区配置失败: {}", e))?;
    Ok(Utc::now()
        .with_timezone(&offset)
        .date_naive()
        .format("%Y-%m-%d")
        .to_string())
}

async fn reference_or_today(state: &AppState, arg: Option<String>) -> anyhow::Result<String> {
    match arg {
        Some(date) => Ok(date),
        None => today(state).await,
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    shipment_window::logging::init();

    let db_path = cli
        .db
        .map(|p| p.to_string_lossy().into_owned())
        .unwrap_or_else(get_default_db_path);
    tracing::info!(version = shipment_window::VERSION, db_path = %db_path, "启动");
    let state = AppState::new(db_path).map_err(|e| anyhow!(e))?;
    let api = state.logistics_api.clone();

    match cli.command {
        Commands::Import { file } => {
            print_json(&api.import_orders(&file.to_string_lossy()).await?)?;
        }
        Commands::Summary { reference_date } => {
            let reference = reference_or_today(&state, reference_date).await?;
            print_json(&api.get_bucket_summary(&reference, None).await?)?;
        }
        Commands::List {
            tab,
            reference_date,
            page,
            page_size,
            search,
        } => {
            let reference = reference_or_today(&state, reference_date).await?;
            let mut filters = api.default_filters(&reference, tab.into()).await?;
            filters.page = page;
            if let Some(size) = page_size {
                filters.page_size = size;
            }
            if let Some(term) = search {
                filters.search_term = term;
            }
            print_json(&api.list_orders_page(&filters).await?)?;
        }
        Commands::Ship {
            order_id,
            tracking_code,
        } => {
            api.update_tracking(&order_id, &tracking_code).await?;
            print_json(&serde_json::json!({
                "order_id": order_id,
                "tracking_code": tracking_code.trim(),
            }))?;
        }
        Commands::Unship { order_id } => {
            api.clear_tracking(&order_id).await?;
            print_json(&serde_json::json!({ "order_id": order_id, "tracking_code": null }))?;
        }
        Commands::Config { key, value } => match (key, value) {
            (None, _) => {
                let snapshot = state
                    .config_manager
                    .get_config_snapshot()
                    .map_err(|e| anyhow!("读取配置失败: {}", e))?;
                println!("{}", snapshot);
            }
            (Some(key), None) => {
                let value = state
                    .config_manager
                    .get_global_config_value(&key)
                    .map_err(|e| anyhow!("读取配置失败: {}", e))?;
                print_json(&serde_json::json!({ "key": key, "value": value }))?;
            }
            (Some(key), Some(value)) => {
                state
                    .config_manager
                    .set_global_config_value(&key, &value)
                    .map_err(|e| anyhow!("写入配置失败: {}", e))?;
                print_json(&serde_json::json!({ "key": key, "value": value }))?;
            }
        },
    }

    Ok(())
}
