use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::{DateTime, Utc};
use clap::Args;
use serde::Serialize;

use shopkit_core::attribution::revenue::{CampaignRevenue, RevenueAggregator};
use shopkit_core::attribution::{AttributionModel, AttributionPolicy};
use shopkit_core::config::{AppConfig, ConfigOverrides, LoadOptions};
use shopkit_core::domain::order::PlacedOrder;
use shopkit_core::errors::ApplicationError;

use crate::commands::CommandResult;

const COMMAND: &str = "revenue";

#[derive(Clone, Debug, Args)]
pub struct RevenueArgs {
    #[arg(long, help = "JSON file holding an array of placed orders with their touchpoints")]
    pub orders: PathBuf,
    #[arg(long, help = "Attribution model: last_touch | first_touch | linear")]
    pub model: Option<AttributionModel>,
    #[arg(long, help = "End of the reporting windows (RFC 3339); defaults to the current time")]
    pub now: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RevenueReport {
    model: &'static str,
    generated_at: DateTime<Utc>,
    orders: usize,
    campaigns: Vec<CampaignRevenue>,
}

pub fn run(args: RevenueArgs) -> CommandResult {
    let config = match AppConfig::load(LoadOptions {
        overrides: ConfigOverrides {
            attribution_model: args.model,
            ..ConfigOverrides::default()
        },
        ..LoadOptions::default()
    }) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                COMMAND,
                "config_validation",
                format!("configuration issue: {error}"),
                2,
            );
        }
    };

    let orders = match load_orders(&args.orders) {
        Ok(orders) => orders,
        Err(error) => {
            return CommandResult::failure(COMMAND, "orders_input", format!("{error:#}"), 3);
        }
    };

    let now = args.now.unwrap_or_else(Utc::now);
    let model = config.attribution.model;
    let aggregator = RevenueAggregator::new(model);

    match aggregator.aggregate(&orders, now) {
        Ok(campaigns) => CommandResult::json(
            COMMAND,
            &RevenueReport { model: model.name(), generated_at: now, orders: orders.len(), campaigns },
        ),
        Err(error) => CommandResult::from_interface(
            COMMAND,
            ApplicationError::from(error)
                .into_interface(format!("cli-revenue-{}", now.timestamp_millis())),
        ),
    }
}

fn load_orders(path: &Path) -> anyhow::Result<Vec<PlacedOrder>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("could not read orders file `{}`", path.display()))?;
    let orders: Vec<PlacedOrder> = serde_json::from_str(&raw)
        .with_context(|| format!("orders file `{}` is not a JSON array of orders", path.display()))?;

    tracing::debug!(
        event_name = "cli.revenue.orders_loaded",
        path = %path.display(),
        orders = orders.len(),
        "orders loaded"
    );
    Ok(orders)
}
