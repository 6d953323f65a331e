use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::config::AppConfig;

#[derive(Debug, Parser)]
#[clap(name = "coupon-bench", version, about = "Load tester for the coupon issuance API")]
pub struct Cli {
    /// Coupon service root (overrides COUPON_BENCH_API_URL)
    #[clap(long, global = true)]
    pub api_url: Option<String>,

    /// Emit logs as JSON lines
    #[clap(long, global = true, env = "COUPON_BENCH_LOG_JSON")]
    pub json_logs: bool,

    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Check that the coupon service answers
    Ping,

    /// Generate users and list them
    Users {
        /// Number of users, 1..=10000
        #[clap(long)]
        count: Option<usize>,
    },

    /// Create a coupon valid for the next 30 days
    CreateCoupon(CouponArgs),

    /// Generate users and fire one claim per user at the coupon
    Run(RunArgs),
}

#[derive(Debug, Args)]
pub struct CouponArgs {
    #[clap(long)]
    pub coupon_id: Option<String>,

    /// Coupon quantity, 1..=10000
    #[clap(long)]
    pub limit: Option<usize>,
}

#[derive(Debug, Args)]
pub struct RunArgs {
    /// Number of users, 1..=10000
    #[clap(long)]
    pub count: Option<usize>,

    #[clap(flatten)]
    pub coupon: CouponArgs,

    /// Create the coupon before the run
    #[clap(long)]
    pub create_coupon: bool,

    /// Print every user's outcome
    #[clap(long)]
    pub details: bool,

    /// Write the summary and report as JSON
    #[clap(long)]
    pub json_out: Option<PathBuf>,
}

impl Cli {
    /// Layers the command-line flags over `base` (env or defaults).
    pub fn resolve(&self, mut base: AppConfig) -> AppConfig {
        if let Some(url) = &self.api_url {
            base.set_api_url(url.as_str());
        }

        let (count, coupon) = match &self.command {
            Command::Ping => (None, None),
            Command::Users { count } => (*count, None),
            Command::CreateCoupon(c) => (None, Some(c)),
            Command::Run(r) => (r.count, Some(&r.coupon)),
        };

        if let Some(n) = count {
            base.set_users(n);
        }
        if let Some(c) = coupon {
            if let Some(id) = &c.coupon_id {
                base.set_coupon_id(id.as_str());
            }
            if let Some(n) = c.limit {
                base.set_coupon_limit(n);
            }
        }

        base
    }
}
