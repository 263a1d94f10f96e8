use anyhow::Context;
use chrono::Utc;
use clap::{ArgAction, Parser};
use tracing::info;
use validator::Validate;

use order_sheet_sync as sync;
use sync::services::sheets::google::GoogleSheetsClient;
use sync::services::shopify_orders::ShopifyOrderClient;

#[derive(Parser)]
#[command(
    name = "order-sheet-sync",
    about = "Overwrite a Google Sheets tab with recent Shopify orders",
    version
)]
struct Cli {
    #[arg(long, help = "Trailing window size in days (overrides DAYS_BACK)")]
    days_back: Option<u32>,
    #[arg(long, help = "Target tab name (overrides TAB_NAME)")]
    tab_name: Option<String>,
    #[arg(long, help = "Orders per page, 1-250 (overrides PAGE_SIZE)")]
    page_size: Option<u32>,
    #[arg(
        long,
        action = ArgAction::SetTrue,
        help = "Fetch and transform orders without touching the sheet"
    )]
    dry_run: bool,
    #[arg(long, action = ArgAction::SetTrue, help = "Emit logs as JSON lines")]
    json_logs: bool,
}

impl Cli {
    fn apply(&self, cfg: &mut sync::config::AppConfig) {
        if let Some(days_back) = self.days_back {
            cfg.days_back = days_back;
        }
        if let Some(tab_name) = &self.tab_name {
            cfg.tab_name = tab_name.clone();
        }
        if let Some(page_size) = self.page_size {
            cfg.page_size = page_size;
        }
        if self.json_logs {
            cfg.log_json = true;
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut cfg = sync::config::load_config().context("failed to load configuration")?;
    cli.apply(&mut cfg);
    cfg.validate().context("invalid command line overrides")?;
    sync::config::init_tracing(cfg.log_level(), cfg.log_json);

    let source =
        ShopifyOrderClient::from_config(&cfg).context("failed to build Shopify client")?;

    let report = if cli.dry_run {
        sync::run_sync(&cfg, &source, None, Utc::now()).await
    } else {
        // Credentials are checked before any order is fetched.
        let sheets = GoogleSheetsClient::from_config(&cfg)
            .context("failed to initialize Google Sheets client")?;
        sync::run_sync(&cfg, &source, Some(&sheets), Utc::now()).await
    }
    .context("order sync failed")?;

    info!(
        orders = report.orders_fetched,
        malformed_cells = report.malformed_cells,
        "Sync finished"
    );
    println!("{}", report.summary());
    Ok(())
}
