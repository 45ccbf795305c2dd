use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::dates::{self, WeekStart};
use crate::domain::schedule::{BillingSchedule, IntervalUnit, StartMoment};
use crate::errors::PricingError;
use crate::subscription::discount::RecurringDiscount;

/// Duration months are converted to billing weeks at this fixed ratio.
pub const WEEKS_PER_MONTH: i128 = 4;

const DAYS_PER_YEAR: i128 = 365;

/// Per-order adjustments supplied at checkout.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingOverrides {
    pub downpayment_with_tax: Option<i64>,
    /// Treated as "today" for start date resolution and proration.
    pub start_date: Option<DateTime<Utc>>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PricingSettings {
    pub week_start: WeekStart,
}

pub struct PricingRequest<'a> {
    pub variant_price_with_tax: Option<i64>,
    pub schedule: Option<&'a BillingSchedule>,
    pub overrides: PricingOverrides,
    pub discount: Option<&'a dyn RecurringDiscount>,
    pub now: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricingResult {
    pub downpayment_with_tax: i64,
    pub total_prorated_amount_with_tax: i64,
    pub prorated_days: i64,
    pub day_rate_with_tax: i64,
    pub recurring_price_with_tax: i64,
    pub interval: IntervalUnit,
    pub interval_count: u32,
    pub amount_due_now_with_tax: i64,
    pub subscription_start_date: DateTime<Utc>,
    pub subscription_end_date: Option<DateTime<Utc>>,
    pub paid_up_front: bool,
    pub discount_percent: Option<Decimal>,
    pub discount_amount: i64,
    pub discounted_recurring_price_with_tax: i64,
}

/// Number of billing cycles in one duration, kept as an exact fraction so
/// that cadences like "every 3 weeks for 2 months" do not accumulate rounding.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BillingsPerDuration {
    numerator: i128,
    denominator: i128,
}

impl BillingsPerDuration {
    pub fn for_schedule(schedule: &BillingSchedule) -> Result<Self, PricingError> {
        if schedule.duration_count == 0 || schedule.billing_count == 0 {
            return Err(PricingError::InvalidSchedule(
                "duration_count and billing_count must be greater than zero".to_string(),
            ));
        }

        let duration = i128::from(schedule.duration_count);
        let billing = i128::from(schedule.billing_count);
        let numerator = match (schedule.duration_interval, schedule.billing_interval) {
            (IntervalUnit::Week, IntervalUnit::Week) | (IntervalUnit::Month, IntervalUnit::Month) => {
                duration
            }
            (IntervalUnit::Month, IntervalUnit::Week) => WEEKS_PER_MONTH * duration,
            (IntervalUnit::Week, IntervalUnit::Month) => {
                return Err(PricingError::BillingCoarserThanDuration)
            }
        };

        Ok(Self { numerator, denominator: billing })
    }

    pub fn to_decimal(self) -> Decimal {
        Decimal::from_i128_with_scale(self.numerator, 0)
            / Decimal::from_i128_with_scale(self.denominator, 0)
    }
}

/// Total value of one duration, `variant_price * billings + downpayment`,
/// held as `scaled / billings.denominator`.
#[derive(Clone, Copy, Debug)]
struct SubscriptionTotal {
    scaled: i128,
    denominator: i128,
}

impl SubscriptionTotal {
    fn new(
        variant_price: i64,
        schedule_downpayment: i64,
        billings: BillingsPerDuration,
    ) -> Result<Self, PricingError> {
        let scaled = i128::from(variant_price)
            .checked_mul(billings.numerator)
            .and_then(|value| {
                i128::from(schedule_downpayment)
                    .checked_mul(billings.denominator)
                    .and_then(|downpayment| value.checked_add(downpayment))
            })
            .ok_or(PricingError::AmountOverflow("total subscription price"))?;
        Ok(Self { scaled, denominator: billings.denominator })
    }

    fn exceeded_by(self, amount: i64) -> bool {
        i128::from(amount).saturating_mul(self.denominator) > self.scaled
    }

    fn floor(self) -> i64 {
        to_minor_units(self.scaled.div_euclid(self.denominator)).unwrap_or(i64::MAX)
    }
}

pub fn calculate_pricing(
    request: &PricingRequest<'_>,
    settings: &PricingSettings,
) -> Result<PricingResult, PricingError> {
    let variant_price = request.variant_price_with_tax.ok_or(PricingError::MissingVariantPrice)?;
    if variant_price <= 0 {
        return Err(PricingError::NonPositiveVariantPrice(variant_price));
    }
    let schedule = request.schedule.ok_or(PricingError::MissingSchedule)?;
    let paid_up_front = schedule.paid_up_front();

    let downpayment =
        request.overrides.downpayment_with_tax.unwrap_or(schedule.downpayment_with_tax);
    if paid_up_front && (schedule.downpayment_with_tax != 0 || downpayment != 0) {
        return Err(PricingError::DownpaymentOnPaidUpFront);
    }
    if schedule.start_moment == StartMoment::FixedStartDate
        && request.overrides.start_date.is_some()
    {
        return Err(PricingError::StartDateOverrideOnFixedSchedule);
    }

    let billings = BillingsPerDuration::for_schedule(schedule)?;
    let total = SubscriptionTotal::new(variant_price, schedule.downpayment_with_tax, billings)?;
    if total.exceeded_by(downpayment) {
        return Err(PricingError::DownpaymentAboveTotal { downpayment, total: total.floor() });
    }
    if downpayment < schedule.downpayment_with_tax {
        return Err(PricingError::DownpaymentBelowMinimum {
            downpayment,
            minimum: schedule.downpayment_with_tax,
        });
    }

    let today = request.overrides.start_date.unwrap_or(request.now);
    let scheduled_start = resolve_start_date(schedule, today, settings.week_start)?;
    let day_rate = day_rate(total, schedule)?;

    let (prorated_days, total_prorated_amount) = if schedule.use_proration {
        let days = dates::days_between(dates::start_of_day(today), scheduled_start);
        let amount =
            days.checked_mul(day_rate).ok_or(PricingError::AmountOverflow("proration"))?;
        (days, amount)
    } else {
        (0, 0)
    };

    let (amount_due_now, recurring_price, subscription_start_date) = if paid_up_front {
        let next_cycle = dates::add_intervals(
            scheduled_start,
            schedule.duration_interval,
            i64::from(schedule.duration_count),
        )?;
        let due = variant_price
            .checked_add(total_prorated_amount)
            .ok_or(PricingError::AmountOverflow("amount due now"))?;
        (due, variant_price, next_cycle)
    } else {
        let due = downpayment
            .checked_add(total_prorated_amount)
            .ok_or(PricingError::AmountOverflow("amount due now"))?;
        (due, recurring_price(total, downpayment, billings)?, scheduled_start)
    };

    let subscription_end_date = if schedule.auto_renew {
        None
    } else {
        Some(dates::add_intervals(
            scheduled_start,
            schedule.duration_interval,
            i64::from(schedule.duration_count),
        )?)
    };

    let (discount_percent, discount_amount) = match request.discount {
        Some(discount) => (
            discount.discount_percent(),
            discount.discount_amount(recurring_price).clamp(0, recurring_price),
        ),
        None => (None, 0),
    };

    tracing::debug!(
        event_name = "subscription.pricing.calculated",
        schedule_id = %schedule.id.0,
        channel = %schedule.channel.0,
        paid_up_front,
        prorated_days,
        amount_due_now,
        recurring_price,
        "subscription pricing calculated"
    );

    Ok(PricingResult {
        downpayment_with_tax: if paid_up_front { 0 } else { downpayment },
        total_prorated_amount_with_tax: total_prorated_amount,
        prorated_days,
        day_rate_with_tax: day_rate,
        recurring_price_with_tax: recurring_price,
        interval: schedule.billing_interval,
        interval_count: schedule.billing_count,
        amount_due_now_with_tax: amount_due_now,
        subscription_start_date,
        subscription_end_date,
        paid_up_front,
        discount_percent,
        discount_amount,
        discounted_recurring_price_with_tax: recurring_price - discount_amount,
    })
}

/// First billing date for a purchase made at `now`, before any paid-up-front shift.
pub fn resolve_start_date(
    schedule: &BillingSchedule,
    now: DateTime<Utc>,
    week_start: WeekStart,
) -> Result<DateTime<Utc>, PricingError> {
    let interval = schedule.billing_interval;
    let start = match (schedule.start_moment, interval) {
        (StartMoment::TimeOfPurchase, _) => return Ok(now),
        (StartMoment::FixedStartDate, _) => {
            return schedule.fixed_start_date.ok_or(PricingError::UnhandledCombination {
                start_moment: schedule.start_moment,
                interval,
            })
        }
        (StartMoment::StartOfBillingInterval, IntervalUnit::Week) => {
            dates::start_of_week(dates::add_weeks(now, 1)?, week_start)?
        }
        (StartMoment::StartOfBillingInterval, IntervalUnit::Month) => {
            dates::start_of_month(dates::add_months(now, 1)?)?
        }
        (StartMoment::EndOfBillingInterval, IntervalUnit::Week) => {
            dates::end_of_week(now, week_start)?
        }
        (StartMoment::EndOfBillingInterval, IntervalUnit::Month) => dates::end_of_month(now)?,
    };

    Ok(dates::at_billing_hour(start))
}

/// `round((intervals_per_year / duration_count) * total / 365)`, half up.
fn day_rate(total: SubscriptionTotal, schedule: &BillingSchedule) -> Result<i64, PricingError> {
    let numerator = i128::from(schedule.duration_interval.intervals_per_year())
        .checked_mul(total.scaled)
        .ok_or(PricingError::AmountOverflow("day rate"))?;
    let denominator = total.denominator * i128::from(schedule.duration_count) * DAYS_PER_YEAR;

    to_minor_units(div_round_half_up(numerator, denominator))
        .ok_or(PricingError::AmountOverflow("day rate"))
}

/// `floor((total - downpayment) / billings)`, so recurring charges never add up
/// to more than the subscription total.
fn recurring_price(
    total: SubscriptionTotal,
    downpayment: i64,
    billings: BillingsPerDuration,
) -> Result<i64, PricingError> {
    let remaining = total
        .scaled
        .checked_sub(i128::from(downpayment) * total.denominator)
        .ok_or(PricingError::AmountOverflow("recurring price"))?;

    to_minor_units(remaining.div_euclid(billings.numerator))
        .ok_or(PricingError::AmountOverflow("recurring price"))
}

fn div_round_half_up(numerator: i128, denominator: i128) -> i128 {
    (2 * numerator + denominator).div_euclid(2 * denominator)
}

fn to_minor_units(value: i128) -> Option<i64> {
    i64::try_from(value).ok()
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Utc};
    use rust_decimal::Decimal;

    use crate::dates::WeekStart;
    use crate::domain::schedule::{BillingSchedule, ChannelId, IntervalUnit, ScheduleId, StartMoment};
    use crate::errors::PricingError;
    use crate::subscription::discount::PercentageDiscount;

    use super::{
        calculate_pricing, BillingsPerDuration, PricingOverrides, PricingRequest, PricingResult,
        PricingSettings,
    };

    fn at(raw: &str) -> DateTime<Utc> {
        raw.parse().expect("valid timestamp")
    }

    // 2024-01-15 is a Monday.
    fn now() -> DateTime<Utc> {
        at("2024-01-15T10:30:00Z")
    }

    fn six_month_membership() -> BillingSchedule {
        BillingSchedule {
            id: ScheduleId("6-month-membership".to_string()),
            channel: ChannelId("default-channel".to_string()),
            name: "6 months, billed monthly".to_string(),
            duration_interval: IntervalUnit::Month,
            duration_count: 6,
            billing_interval: IntervalUnit::Month,
            billing_count: 1,
            start_moment: StartMoment::StartOfBillingInterval,
            fixed_start_date: None,
            downpayment_with_tax: 19_900,
            use_proration: true,
            auto_renew: true,
        }
    }

    fn yearly_up_front() -> BillingSchedule {
        BillingSchedule {
            id: ScheduleId("yearly".to_string()),
            name: "Paid up front, yearly".to_string(),
            duration_count: 12,
            billing_count: 12,
            downpayment_with_tax: 0,
            start_moment: StartMoment::TimeOfPurchase,
            use_proration: false,
            auto_renew: false,
            ..six_month_membership()
        }
    }

    fn price(
        variant_price: i64,
        schedule: &BillingSchedule,
        overrides: PricingOverrides,
    ) -> Result<PricingResult, PricingError> {
        calculate_pricing(
            &PricingRequest {
                variant_price_with_tax: Some(variant_price),
                schedule: Some(schedule),
                overrides,
                discount: None,
                now: now(),
            },
            &PricingSettings::default(),
        )
    }

    #[test]
    fn monthly_schedule_with_downpayment_and_proration() {
        let result = price(5_000, &six_month_membership(), PricingOverrides::default())
            .expect("pricing succeeds");

        assert_eq!(result.recurring_price_with_tax, 5_000);
        assert_eq!(result.downpayment_with_tax, 19_900);
        assert_eq!(result.subscription_start_date, at("2024-02-01T13:00:00Z"));
        assert_eq!(result.day_rate_with_tax, 273);
        assert_eq!(result.prorated_days, 17);
        assert_eq!(result.total_prorated_amount_with_tax, 17 * 273);
        assert_eq!(result.amount_due_now_with_tax, 19_900 + 17 * 273);
        assert_eq!(result.subscription_end_date, None);
        assert_eq!(result.interval, IntervalUnit::Month);
        assert_eq!(result.interval_count, 1);
        assert!(!result.paid_up_front);
    }

    #[test]
    fn higher_downpayment_lowers_recurring_price_with_floor() {
        let result = price(
            5_000,
            &six_month_membership(),
            PricingOverrides { downpayment_with_tax: Some(29_900), ..PricingOverrides::default() },
        )
        .expect("pricing succeeds");

        // floor((49_900 - 29_900) / 6)
        assert_eq!(result.recurring_price_with_tax, 3_333);
        assert_eq!(result.amount_due_now_with_tax, 29_900 + 17 * 273);
    }

    #[test]
    fn downpayment_bounds_are_enforced() {
        let schedule = six_month_membership();

        let above = price(
            5_000,
            &schedule,
            PricingOverrides { downpayment_with_tax: Some(50_000), ..PricingOverrides::default() },
        );
        assert_eq!(
            above,
            Err(PricingError::DownpaymentAboveTotal { downpayment: 50_000, total: 49_900 })
        );

        let below = price(
            5_000,
            &schedule,
            PricingOverrides { downpayment_with_tax: Some(10_000), ..PricingOverrides::default() },
        );
        assert_eq!(
            below,
            Err(PricingError::DownpaymentBelowMinimum { downpayment: 10_000, minimum: 19_900 })
        );

        let exactly_total = price(
            5_000,
            &schedule,
            PricingOverrides { downpayment_with_tax: Some(49_900), ..PricingOverrides::default() },
        )
        .expect("downpayment equal to the total is allowed");
        assert_eq!(exactly_total.recurring_price_with_tax, 0);
    }

    #[test]
    fn paid_up_front_charges_full_price_and_moves_start_to_next_cycle() {
        let result =
            price(60_000, &yearly_up_front(), PricingOverrides::default()).expect("pricing succeeds");

        assert!(result.paid_up_front);
        assert_eq!(result.recurring_price_with_tax, 60_000);
        assert_eq!(result.amount_due_now_with_tax, 60_000);
        assert_eq!(result.downpayment_with_tax, 0);
        assert_eq!(result.subscription_start_date, at("2025-01-15T10:30:00Z"));
        assert_eq!(result.subscription_end_date, Some(at("2025-01-15T10:30:00Z")));
    }

    #[test]
    fn paid_up_front_prorates_against_the_original_start_date() {
        let schedule = BillingSchedule {
            start_moment: StartMoment::StartOfBillingInterval,
            use_proration: true,
            ..yearly_up_front()
        };
        let result = price(60_000, &schedule, PricingOverrides::default()).expect("pricing succeeds");

        // round(12 / 12 * 60_000 / 365)
        assert_eq!(result.day_rate_with_tax, 164);
        assert_eq!(result.prorated_days, 17);
        assert_eq!(result.amount_due_now_with_tax, 60_000 + 17 * 164);
        assert_eq!(result.subscription_start_date, at("2025-02-01T13:00:00Z"));
    }

    #[test]
    fn paid_up_front_rejects_any_downpayment() {
        let overridden = price(
            60_000,
            &yearly_up_front(),
            PricingOverrides { downpayment_with_tax: Some(100), ..PricingOverrides::default() },
        );
        assert_eq!(overridden, Err(PricingError::DownpaymentOnPaidUpFront));

        let configured = BillingSchedule { downpayment_with_tax: 500, ..yearly_up_front() };
        assert_eq!(
            price(60_000, &configured, PricingOverrides::default()),
            Err(PricingError::DownpaymentOnPaidUpFront)
        );
    }

    #[test]
    fn weekly_duration_billed_monthly_is_rejected() {
        for (duration_count, billing_count) in [(1, 1), (8, 1), (52, 12)] {
            let schedule = BillingSchedule {
                duration_interval: IntervalUnit::Week,
                duration_count,
                billing_interval: IntervalUnit::Month,
                billing_count,
                downpayment_with_tax: 0,
                ..six_month_membership()
            };
            assert_eq!(
                price(1_000, &schedule, PricingOverrides::default()),
                Err(PricingError::BillingCoarserThanDuration)
            );
        }
    }

    #[test]
    fn monthly_duration_billed_weekly_uses_four_weeks_per_month() {
        let schedule = BillingSchedule {
            duration_count: 3,
            billing_interval: IntervalUnit::Week,
            billing_count: 1,
            downpayment_with_tax: 0,
            start_moment: StartMoment::TimeOfPurchase,
            ..six_month_membership()
        };
        let billings = BillingsPerDuration::for_schedule(&schedule).expect("valid cadence");
        assert_eq!(billings.to_decimal(), Decimal::new(12, 0));

        let result = price(1_000, &schedule, PricingOverrides::default()).expect("pricing succeeds");
        assert_eq!(result.recurring_price_with_tax, 1_000);
        // round(12 / 3 * 12_000 / 365)
        assert_eq!(result.day_rate_with_tax, 132);
        assert_eq!(result.prorated_days, 0);
        assert_eq!(result.amount_due_now_with_tax, 0);
        assert_eq!(result.subscription_start_date, now());
    }

    #[test]
    fn fractional_billing_cadence_does_not_lose_a_minor_unit() {
        let schedule = BillingSchedule {
            duration_count: 2,
            billing_interval: IntervalUnit::Week,
            billing_count: 3,
            downpayment_with_tax: 0,
            ..six_month_membership()
        };

        let result = price(900, &schedule, PricingOverrides::default()).expect("pricing succeeds");
        assert_eq!(result.recurring_price_with_tax, 900);
    }

    #[test]
    fn fixed_start_date_is_used_verbatim_and_rejects_overrides() {
        let fixed = at("2024-03-01T09:15:00Z");
        let schedule = BillingSchedule {
            start_moment: StartMoment::FixedStartDate,
            fixed_start_date: Some(fixed),
            ..six_month_membership()
        };

        let result = price(5_000, &schedule, PricingOverrides::default()).expect("pricing succeeds");
        assert_eq!(result.subscription_start_date, fixed);
        assert_eq!(result.prorated_days, 46);

        let overridden = price(
            5_000,
            &schedule,
            PricingOverrides {
                start_date: Some(at("2024-01-20T00:00:00Z")),
                ..PricingOverrides::default()
            },
        );
        assert_eq!(overridden, Err(PricingError::StartDateOverrideOnFixedSchedule));
    }

    #[test]
    fn fixed_start_in_the_past_yields_negative_proration() {
        let schedule = BillingSchedule {
            start_moment: StartMoment::FixedStartDate,
            fixed_start_date: Some(at("2024-01-10T13:00:00Z")),
            ..six_month_membership()
        };

        let result = price(5_000, &schedule, PricingOverrides::default()).expect("pricing succeeds");
        assert_eq!(result.prorated_days, -5);
        assert_eq!(result.total_prorated_amount_with_tax, -5 * 273);
    }

    #[test]
    fn fixed_start_moment_without_date_is_an_unhandled_combination() {
        let schedule =
            BillingSchedule { start_moment: StartMoment::FixedStartDate, ..six_month_membership() };

        assert_eq!(
            price(5_000, &schedule, PricingOverrides::default()),
            Err(PricingError::UnhandledCombination {
                start_moment: StartMoment::FixedStartDate,
                interval: IntervalUnit::Month,
            })
        );
    }

    #[test]
    fn weekly_start_moments_resolve_to_week_boundaries_at_billing_hour() {
        let weekly = BillingSchedule {
            duration_interval: IntervalUnit::Week,
            duration_count: 4,
            billing_interval: IntervalUnit::Week,
            billing_count: 1,
            downpayment_with_tax: 0,
            ..six_month_membership()
        };

        let next_start = price(1_000, &weekly, PricingOverrides::default()).expect("pricing succeeds");
        assert_eq!(next_start.subscription_start_date, at("2024-01-22T13:00:00Z"));
        assert_eq!(next_start.prorated_days, 7);

        let end_of_week =
            BillingSchedule { start_moment: StartMoment::EndOfBillingInterval, ..weekly.clone() };
        let result = price(1_000, &end_of_week, PricingOverrides::default()).expect("pricing succeeds");
        assert_eq!(result.subscription_start_date, at("2024-01-21T13:00:00Z"));
        assert_eq!(result.prorated_days, 6);

        let sunday_weeks = calculate_pricing(
            &PricingRequest {
                variant_price_with_tax: Some(1_000),
                schedule: Some(&weekly),
                overrides: PricingOverrides::default(),
                discount: None,
                now: now(),
            },
            &PricingSettings { week_start: WeekStart::Sunday },
        )
        .expect("pricing succeeds");
        assert_eq!(sunday_weeks.subscription_start_date, at("2024-01-21T13:00:00Z"));
    }

    #[test]
    fn end_of_billing_month_start() {
        let schedule = BillingSchedule {
            start_moment: StartMoment::EndOfBillingInterval,
            ..six_month_membership()
        };
        let result = price(5_000, &schedule, PricingOverrides::default()).expect("pricing succeeds");

        assert_eq!(result.subscription_start_date, at("2024-01-31T13:00:00Z"));
        assert_eq!(result.prorated_days, 16);
    }

    #[test]
    fn start_date_override_acts_as_today() {
        let result = price(
            5_000,
            &six_month_membership(),
            PricingOverrides {
                start_date: Some(at("2024-01-31T09:00:00Z")),
                ..PricingOverrides::default()
            },
        )
        .expect("pricing succeeds");

        assert_eq!(result.subscription_start_date, at("2024-02-01T13:00:00Z"));
        assert_eq!(result.prorated_days, 1);
        assert_eq!(result.amount_due_now_with_tax, 19_900 + 273);
    }

    #[test]
    fn proration_scales_linearly_with_prorated_days() {
        let schedule = six_month_membership();
        let settings = PricingSettings::default();
        let price_at = |today: &str| {
            calculate_pricing(
                &PricingRequest {
                    variant_price_with_tax: Some(5_000),
                    schedule: Some(&schedule),
                    overrides: PricingOverrides::default(),
                    discount: None,
                    now: at(today),
                },
                &settings,
            )
            .expect("pricing succeeds")
        };

        let ten_days = price_at("2024-01-22T08:00:00Z");
        let twenty_days = price_at("2024-01-12T08:00:00Z");

        assert_eq!(ten_days.prorated_days, 10);
        assert_eq!(twenty_days.prorated_days, 20);
        assert_eq!(ten_days.day_rate_with_tax, twenty_days.day_rate_with_tax);
        assert_eq!(
            twenty_days.total_prorated_amount_with_tax,
            2 * ten_days.total_prorated_amount_with_tax
        );
    }

    #[test]
    fn proration_disabled_reports_zero_days_and_charges_nothing() {
        let schedule = BillingSchedule { use_proration: false, ..six_month_membership() };
        let result = price(5_000, &schedule, PricingOverrides::default()).expect("pricing succeeds");

        assert_eq!(result.prorated_days, 0);
        assert_eq!(result.total_prorated_amount_with_tax, 0);
        assert_eq!(result.amount_due_now_with_tax, 19_900);
        assert_eq!(result.subscription_start_date, at("2024-02-01T13:00:00Z"));
    }

    #[test]
    fn paid_up_front_without_proration_reports_no_gap() {
        let schedule = BillingSchedule {
            start_moment: StartMoment::StartOfBillingInterval,
            ..yearly_up_front()
        };
        let result = price(60_000, &schedule, PricingOverrides::default()).expect("pricing succeeds");

        assert_eq!(result.prorated_days, 0);
        assert_eq!(result.total_prorated_amount_with_tax, 0);
        assert_eq!(result.amount_due_now_with_tax, 60_000);
    }

    #[test]
    fn non_renewing_schedule_gets_end_date_after_full_duration() {
        let schedule = BillingSchedule { auto_renew: false, ..six_month_membership() };
        let result = price(5_000, &schedule, PricingOverrides::default()).expect("pricing succeeds");

        assert_eq!(result.subscription_end_date, Some(at("2024-08-01T13:00:00Z")));
    }

    #[test]
    fn discount_applies_to_recurring_price_only() {
        let schedule = six_month_membership();
        let discount = PercentageDiscount::new(Decimal::new(10, 0)).expect("valid percentage");
        let result = calculate_pricing(
            &PricingRequest {
                variant_price_with_tax: Some(5_000),
                schedule: Some(&schedule),
                overrides: PricingOverrides::default(),
                discount: Some(&discount),
                now: now(),
            },
            &PricingSettings::default(),
        )
        .expect("pricing succeeds");

        assert_eq!(result.recurring_price_with_tax, 5_000);
        assert_eq!(result.discount_percent, Some(Decimal::new(10, 0)));
        assert_eq!(result.discount_amount, 500);
        assert_eq!(result.discounted_recurring_price_with_tax, 4_500);
        assert_eq!(result.amount_due_now_with_tax, 19_900 + 17 * 273);
    }

    #[test]
    fn missing_inputs_fail_fast() {
        let schedule = six_month_membership();
        let missing_price = calculate_pricing(
            &PricingRequest {
                variant_price_with_tax: None,
                schedule: Some(&schedule),
                overrides: PricingOverrides::default(),
                discount: None,
                now: now(),
            },
            &PricingSettings::default(),
        );
        assert_eq!(missing_price, Err(PricingError::MissingVariantPrice));

        let missing_schedule = calculate_pricing(
            &PricingRequest {
                variant_price_with_tax: Some(5_000),
                schedule: None,
                overrides: PricingOverrides::default(),
                discount: None,
                now: now(),
            },
            &PricingSettings::default(),
        );
        assert_eq!(missing_schedule, Err(PricingError::MissingSchedule));
    }

    #[test]
    fn result_serializes_with_graphql_field_names() {
        let result = price(5_000, &six_month_membership(), PricingOverrides::default())
            .expect("pricing succeeds");
        let json = serde_json::to_value(&result).expect("serializes");

        for field in [
            "downpaymentWithTax",
            "totalProratedAmountWithTax",
            "proratedDays",
            "dayRateWithTax",
            "recurringPriceWithTax",
            "amountDueNowWithTax",
            "subscriptionStartDate",
            "subscriptionEndDate",
            "discountPercent",
            "discountAmount",
            "discountedRecurringPriceWithTax",
        ] {
            assert!(json.get(field).is_some(), "missing field {field}");
        }
    }
}
