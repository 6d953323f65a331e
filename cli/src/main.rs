mod cli;
mod config;
mod interrupt;
mod progress;
mod report;

use std::sync::Arc;
use std::time::Duration;

use adapters::coupon::HttpCouponClient;
use anyhow::Context;
use clap::Parser;
use common::logger::{LogFormat, init_logger};
use executor::{BatchReport, CouponBench, RunError};
use tracing::info;

use cli::{Cli, Command, RunArgs};
use config::AppConfig;
use progress::Progress;

const PROGRESS_REFRESH: Duration = Duration::from_millis(200);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logger("coupon-bench", LogFormat::from_flag(cli.json_logs));

    let cfg = cli.resolve(AppConfig::from_env());
    info!(
        api_url = %cfg.api_url,
        users = cfg.users,
        coupon_id = %cfg.coupon_id,
        coupon_limit = cfg.coupon_limit,
        "configuration loaded"
    );

    let client = HttpCouponClient::new(cfg.client_config()).context("building http client")?;
    let bench = Arc::new(CouponBench::new(Arc::new(client)));

    match &cli.command {
        Command::Ping => ping(&bench, &cfg).await,
        Command::Users { .. } => users(&bench, &cfg).await,
        Command::CreateCoupon(_) => create_coupon(&bench, &cfg).await,
        Command::Run(args) => run(bench, &cfg, args).await,
    }
}

async fn ping(bench: &CouponBench, cfg: &AppConfig) -> anyhow::Result<()> {
    bench
        .ping()
        .await
        .with_context(|| format!("coupon service at {} is not reachable", cfg.api_url))?;

    println!("coupon service at {} is reachable", cfg.api_url);
    Ok(())
}

async fn users(bench: &CouponBench, cfg: &AppConfig) -> anyhow::Result<()> {
    let n = bench
        .generate_users(cfg.users)
        .await
        .context("generating users")?;

    println!("generated {n} users");
    print!("{}", report::user_preview(&bench.registry().snapshot()));
    Ok(())
}

async fn create_coupon(bench: &CouponBench, cfg: &AppConfig) -> anyhow::Result<()> {
    let spec = bench
        .create_coupon(&cfg.coupon_id, cfg.coupon_limit)
        .await
        .with_context(|| format!("creating coupon {}", cfg.coupon_id))?;

    println!(
        "created coupon {} with {} units, valid {} .. {}",
        spec.coupon_id,
        spec.quantity,
        spec.start_date.format("%Y-%m-%d"),
        spec.end_date.format("%Y-%m-%d"),
    );
    Ok(())
}

async fn run(bench: Arc<CouponBench>, cfg: &AppConfig, args: &RunArgs) -> anyhow::Result<()> {
    users(&bench, cfg).await?;

    if args.create_coupon {
        create_coupon(&bench, cfg).await?;
    }

    let progress = Progress::spawn(Arc::clone(bench.registry()), PROGRESS_REFRESH);
    let interrupt = interrupt::cancel_on(Arc::clone(&bench), tokio::signal::ctrl_c);

    let res = bench.start_test(&cfg.coupon_id).await;
    interrupt.abort();
    progress.finish().await;

    let summary = match res {
        Ok(summary) => summary,
        Err(RunError::Cancelled) => {
            println!("test cancelled; every user is back to ready");
            return Ok(());
        }
        Err(e) => return Err(e).context("running coupon test"),
    };

    let report = BatchReport::new(&summary, cfg.coupon_limit);
    println!();
    print!("{}", report::summary(&report, &cfg.coupon_id));

    if args.details {
        println!();
        print!("{}", report::details(&summary, &bench.registry().snapshot()));
    }

    if let Some(path) = &args.json_out {
        report::write_json(path, &summary, &report)?;
        println!("results written to {}", path.display());
    }

    Ok(())
}
