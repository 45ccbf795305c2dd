use std::path::PathBuf;

use chrono::{DateTime, Utc};
use clap::Args;
use rust_decimal::Decimal;

use shopkit_core::config::{AppConfig, ConfigOverrides, LoadOptions};
use shopkit_core::domain::schedule::{BillingSchedule, ChannelId, ScheduleId};
use shopkit_core::errors::ApplicationError;
use shopkit_core::subscription::discount::{PercentageDiscount, RecurringDiscount};
use shopkit_core::subscription::pricing::{PricingOverrides, PricingRequest};
use shopkit_core::subscription::{DeterministicSubscriptionPricingEngine, SubscriptionPricingEngine};
use shopkit_db::{InMemoryScheduleRepository, ScheduleCatalog, ScheduleRepository};

use crate::commands::CommandResult;

const COMMAND: &str = "price";

#[derive(Clone, Debug, Default, Args)]
pub struct PriceArgs {
    #[arg(long, help = "Billing schedule id to price against")]
    pub schedule_id: String,
    #[arg(long, help = "Schedule catalog (TOML); defaults to catalog.schedules_path")]
    pub catalog: Option<PathBuf>,
    #[arg(long, help = "Sales channel; defaults to catalog.default_channel")]
    pub channel: Option<String>,
    #[arg(long, help = "Variant price including tax, in minor units")]
    pub variant_price: Option<i64>,
    #[arg(long, help = "Customer-chosen downpayment including tax, in minor units")]
    pub downpayment: Option<i64>,
    #[arg(long, help = "Custom subscription start date (RFC 3339)")]
    pub start_date: Option<DateTime<Utc>>,
    #[arg(long, help = "Evaluation instant (RFC 3339); defaults to the current time")]
    pub now: Option<DateTime<Utc>>,
    #[arg(long, help = "Percentage taken off every recurring payment")]
    pub discount_percent: Option<Decimal>,
}

pub fn run(args: PriceArgs) -> CommandResult {
    let config = match AppConfig::load(LoadOptions {
        overrides: ConfigOverrides {
            schedules_path: args.catalog.clone(),
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

    let Some(catalog_path) = config.catalog.schedules_path.clone() else {
        return CommandResult::failure(
            COMMAND,
            "catalog_missing",
            "no schedule catalog configured; pass --catalog or set catalog.schedules_path",
            3,
        );
    };

    let default_channel = ChannelId(config.catalog.default_channel.clone());
    let catalog = match ScheduleCatalog::load(&catalog_path, &default_channel) {
        Ok(catalog) => catalog,
        Err(error) => return CommandResult::failure(COMMAND, "catalog_load", error.to_string(), 3),
    };

    let channel = args.channel.clone().map(ChannelId).unwrap_or(default_channel);
    let schedule_id = ScheduleId(args.schedule_id.clone());
    let schedule = match lookup_schedule(&catalog, &channel, &schedule_id) {
        Ok(schedule) => schedule,
        Err((error_class, message, exit_code)) => {
            return CommandResult::failure(COMMAND, error_class, message, exit_code);
        }
    };

    let now = args.now.unwrap_or_else(Utc::now);
    let correlation_id = format!("cli-price-{}", now.timestamp_millis());

    let discount = match args.discount_percent.map(PercentageDiscount::new).transpose() {
        Ok(discount) => discount,
        Err(error) => {
            return CommandResult::from_interface(
                COMMAND,
                ApplicationError::from(error).into_interface(correlation_id),
            );
        }
    };

    let request = PricingRequest {
        variant_price_with_tax: args.variant_price,
        schedule: schedule.as_ref(),
        overrides: PricingOverrides {
            downpayment_with_tax: args.downpayment,
            start_date: args.start_date,
        },
        discount: discount.as_ref().map(|discount| discount as &dyn RecurringDiscount),
        now,
    };

    let engine = DeterministicSubscriptionPricingEngine::new(config.pricing_settings());
    match engine.price(&request) {
        Ok(result) => CommandResult::json(COMMAND, &result),
        Err(error) => CommandResult::from_interface(
            COMMAND,
            ApplicationError::from(error).into_interface(correlation_id),
        ),
    }
}

/// Seeds an in-memory repository from the catalog and looks the schedule up
/// through it. An unknown id yields `None`, which the engine rejects.
fn lookup_schedule(
    catalog: &ScheduleCatalog,
    channel: &ChannelId,
    id: &ScheduleId,
) -> Result<Option<BillingSchedule>, (&'static str, String, u8)> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|error| ("runtime_init", format!("failed to initialize async runtime: {error}"), 4u8))?;

    runtime.block_on(async {
        let repository = InMemoryScheduleRepository::default();
        catalog
            .seed(&repository)
            .await
            .map_err(|error| ("catalog_seed", error.to_string(), 3u8))?;
        repository
            .find(channel, id)
            .await
            .map_err(|error| ("schedule_lookup", error.to_string(), 7u8))
    })
}
