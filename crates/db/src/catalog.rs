//! File-backed schedule catalog.
//!
//! A catalog is a TOML document with one `[[schedules]]` table per billing
//! schedule. Entries without a `channel` key belong to the default channel
//! passed to [`ScheduleCatalog::parse`].

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use shopkit_core::domain::schedule::{BillingSchedule, ChannelId};
use shopkit_core::errors::PricingError;

use crate::repositories::{RepositoryError, ScheduleRepository};

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("could not read schedule catalog `{path}`: {source}")]
    Read { path: PathBuf, source: std::io::Error },
    #[error("could not parse schedule catalog: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("schedule entry #{index} is malformed: {source}")]
    Entry { index: usize, source: toml::de::Error },
    #[error("schedule `{id}` in channel `{channel}` is invalid: {source}")]
    InvalidSchedule { id: String, channel: String, source: PricingError },
    #[error("schedule `{id}` is declared twice in channel `{channel}`")]
    Duplicate { id: String, channel: String },
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

#[derive(Debug, Default, Deserialize)]
struct RawCatalog {
    #[serde(default)]
    schedules: Vec<toml::Table>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ScheduleCatalog {
    schedules: Vec<BillingSchedule>,
}

impl ScheduleCatalog {
    pub fn load(path: &Path, default_channel: &ChannelId) -> Result<Self, CatalogError> {
        let raw = fs::read_to_string(path)
            .map_err(|source| CatalogError::Read { path: path.to_path_buf(), source })?;
        let catalog = Self::parse(&raw, default_channel)?;

        tracing::debug!(
            event_name = "catalog.schedules.loaded",
            path = %path.display(),
            schedules = catalog.len(),
            "schedule catalog loaded"
        );
        Ok(catalog)
    }

    /// Parses and validates every entry. Fails on the first invalid schedule.
    pub fn parse(raw: &str, default_channel: &ChannelId) -> Result<Self, CatalogError> {
        let document: RawCatalog = toml::from_str(raw)?;
        let mut seen = HashSet::new();
        let mut schedules = Vec::with_capacity(document.schedules.len());

        for (index, mut entry) in document.schedules.into_iter().enumerate() {
            if !entry.contains_key("channel") {
                entry.insert("channel".to_string(), toml::Value::String(default_channel.0.clone()));
            }
            let schedule: BillingSchedule = toml::Value::Table(entry)
                .try_into()
                .map_err(|source| CatalogError::Entry { index, source })?;

            schedule.validate().map_err(|source| CatalogError::InvalidSchedule {
                id: schedule.id.0.clone(),
                channel: schedule.channel.0.clone(),
                source,
            })?;
            if !seen.insert((schedule.channel.clone(), schedule.id.clone())) {
                return Err(CatalogError::Duplicate {
                    id: schedule.id.0.clone(),
                    channel: schedule.channel.0.clone(),
                });
            }
            schedules.push(schedule);
        }

        Ok(Self { schedules })
    }

    pub fn schedules(&self) -> &[BillingSchedule] {
        &self.schedules
    }

    pub fn len(&self) -> usize {
        self.schedules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schedules.is_empty()
    }

    /// Stores every catalog schedule, replacing entries with the same key.
    pub async fn seed(&self, repository: &dyn ScheduleRepository) -> Result<usize, CatalogError> {
        for schedule in &self.schedules {
            repository.save(schedule.clone()).await?;
        }

        tracing::info!(
            event_name = "catalog.schedules.seeded",
            schedules = self.schedules.len(),
            "schedule catalog seeded"
        );
        Ok(self.schedules.len())
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use shopkit_core::domain::schedule::{ChannelId, IntervalUnit, ScheduleId, StartMoment};
    use shopkit_core::errors::PricingError;

    use crate::repositories::{InMemoryScheduleRepository, ScheduleRepository};

    use super::{CatalogError, ScheduleCatalog};

    const CATALOG: &str = r#"
[[schedules]]
id = "6-month"
name = "6 months, billed monthly"
duration_interval = "month"
duration_count = 6
billing_interval = "month"
billing_count = 1
start_moment = "start_of_billing_interval"
downpayment_with_tax = 19900
use_proration = true

[[schedules]]
id = "yearly-up-front"
channel = "eu-store"
name = "Yearly, paid up front"
duration_interval = "month"
duration_count = 12
billing_interval = "month"
billing_count = 12
start_moment = "fixed_start_date"
fixed_start_date = "2024-03-01T13:00:00Z"
auto_renew = false
"#;

    fn default_channel() -> ChannelId {
        ChannelId("default-channel".to_string())
    }

    #[test]
    fn entries_without_channel_use_the_default() {
        let catalog = ScheduleCatalog::parse(CATALOG, &default_channel()).expect("catalog parses");

        assert_eq!(catalog.len(), 2);
        let [monthly, yearly] = catalog.schedules() else {
            panic!("expected two schedules");
        };
        assert_eq!(monthly.id, ScheduleId("6-month".to_string()));
        assert_eq!(monthly.channel, default_channel());
        assert_eq!(monthly.duration_interval, IntervalUnit::Month);
        assert!(monthly.use_proration);
        assert!(monthly.auto_renew);

        assert_eq!(yearly.channel, ChannelId("eu-store".to_string()));
        assert_eq!(yearly.start_moment, StartMoment::FixedStartDate);
        assert!(yearly.paid_up_front());
        assert!(!yearly.auto_renew);
    }

    #[test]
    fn invalid_schedule_names_the_offending_entry() {
        let raw = r#"
[[schedules]]
id = "weekly-billed-monthly"
name = "Broken"
duration_interval = "week"
duration_count = 4
billing_interval = "month"
billing_count = 1
start_moment = "time_of_purchase"
"#;

        let error = ScheduleCatalog::parse(raw, &default_channel()).expect_err("must fail");
        assert!(matches!(
            error,
            CatalogError::InvalidSchedule {
                ref id,
                source: PricingError::BillingCoarserThanDuration,
                ..
            } if id == "weekly-billed-monthly"
        ));
    }

    #[test]
    fn duplicate_ids_within_a_channel_are_rejected() {
        let entry = r#"
[[schedules]]
id = "6-month"
name = "6 months, billed monthly"
duration_interval = "month"
duration_count = 6
billing_interval = "month"
billing_count = 1
start_moment = "time_of_purchase"
"#;
        let raw = format!("{entry}{entry}");

        let error = ScheduleCatalog::parse(&raw, &default_channel()).expect_err("must fail");
        assert!(matches!(error, CatalogError::Duplicate { ref id, .. } if id == "6-month"));
    }

    #[test]
    fn malformed_entry_reports_its_position() {
        let raw = r#"
[[schedules]]
id = "missing-fields"
name = "Nothing else"
"#;

        let error = ScheduleCatalog::parse(raw, &default_channel()).expect_err("must fail");
        assert!(matches!(error, CatalogError::Entry { index: 0, .. }));
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let dir = TempDir::new().expect("temp dir");
        let error = ScheduleCatalog::load(&dir.path().join("absent.toml"), &default_channel())
            .expect_err("must fail");
        assert!(matches!(error, CatalogError::Read { .. }));
    }

    #[tokio::test]
    async fn loaded_catalog_seeds_the_repository() {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("schedules.toml");
        fs::write(&path, CATALOG).expect("write catalog");

        let catalog = ScheduleCatalog::load(&path, &default_channel()).expect("catalog loads");
        let repo = InMemoryScheduleRepository::default();
        let seeded = catalog.seed(&repo).await.expect("seed succeeds");

        assert_eq!(seeded, 2);
        let stored =
            repo.list_for_channel(&ChannelId("eu-store".to_string())).await.expect("list eu");
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].id, ScheduleId("yearly-up-front".to_string()));
    }
}
