//! Day-by-day accumulation of a rate series over an investment period.
//!
//! Each business day compounds the annual rate published on the nearest prior
//! date, converted to a daily factor with the 252 business days a year
//! convention. Factors are kept in fixed-point decimals so that the same inputs
//! always yield the same digits.

use std::collections::{BTreeSet, HashMap};

use chrono::{Days, NaiveDate, NaiveDateTime};
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::calendar;
use crate::error::{CalculationError, ValidationError};
use crate::quotation::Quotation;

pub const BUSINESS_DAYS_PER_YEAR: u32 = 252;

/// How far back a business day may look for a published rate.
pub const LOOKBACK_DAYS: u64 = 7;

pub const DAILY_FACTOR_SCALE: u32 = 8;
pub const ACCUMULATED_FACTOR_SCALE: u32 = 16;
pub const UPDATED_VALUE_SCALE: u32 = 8;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculationRequest {
    pub principal: Decimal,
    #[serde(deserialize_with = "calendar::deserialize")]
    pub start_date: NaiveDate,
    #[serde(deserialize_with = "calendar::deserialize")]
    pub end_date: NaiveDate,
}

impl CalculationRequest {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate(self.principal, self.start_date, self.end_date)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculationResult {
    pub principal: Decimal,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub accumulated_factor: Decimal,
    pub updated_value: Decimal,
    pub business_days_count: usize,
    /// Business days that found no rate within the lookback window.
    pub days_without_rate: Vec<NaiveDate>,
    /// Business days whose rate was at or below -100%.
    pub days_with_invalid_rate: Vec<NaiveDate>,
}

fn validate(
    principal: Decimal,
    start_date: NaiveDate,
    end_date: NaiveDate,
) -> Result<(), ValidationError> {
    if principal <= Decimal::ZERO {
        return Err(ValidationError::InvalidPrincipal);
    }
    if end_date <= start_date {
        return Err(ValidationError::EndNotAfterStart);
    }
    Ok(())
}

/// Accumulates `quotations` over `[start_date, end_date)` and applies the
/// factor to `principal`.
///
/// The quotations are expected to be a single series and to reach at least
/// [`LOOKBACK_DAYS`] before `start_date`. Days whose rate cannot be resolved
/// are reported in [`CalculationResult::days_without_rate`], days whose rate
/// has no daily factor in [`CalculationResult::days_with_invalid_rate`]; both
/// are skipped.
pub fn compute(
    principal: Decimal,
    start_date: NaiveDate,
    end_date: NaiveDate,
    quotations: &[Quotation],
) -> Result<CalculationResult, CalculationError> {
    validate(principal, start_date, end_date)?;

    if quotations.is_empty() {
        return Err(CalculationError::DataUnavailable);
    }

    let rates = rates_by_date(quotations);
    let business_days = business_days(quotations, start_date, end_date);

    let mut factor = Decimal::ONE;
    let mut days_without_rate = Vec::new();
    let mut days_with_invalid_rate = Vec::new();

    for day in &business_days {
        let Some(annual_rate) = previous_rate(*day, &rates) else {
            days_without_rate.push(*day);
            continue;
        };
        match daily_factor(annual_rate) {
            Some(daily) => {
                factor = factor
                    .checked_mul(daily)
                    .ok_or(CalculationError::Overflow)?;
            }
            None => days_with_invalid_rate.push(*day),
        }
    }

    let accumulated_factor = truncate(factor, ACCUMULATED_FACTOR_SCALE);
    let updated_value = principal
        .checked_mul(accumulated_factor)
        .map(|value| truncate(value, UPDATED_VALUE_SCALE))
        .ok_or(CalculationError::Overflow)?;

    Ok(CalculationResult {
        principal,
        start_date,
        end_date,
        accumulated_factor,
        updated_value,
        business_days_count: business_days.len(),
        days_without_rate,
        days_with_invalid_rate,
    })
}

/// One rate per calendar date. Among same-date quotations the latest timestamp
/// wins, and on equal timestamps the later one in the input.
fn rates_by_date(quotations: &[Quotation]) -> HashMap<NaiveDate, Decimal> {
    let mut latest: HashMap<NaiveDate, (NaiveDateTime, Decimal)> = HashMap::new();

    for quotation in quotations {
        latest
            .entry(quotation.date())
            .and_modify(|(quoted_at, rate)| {
                if quotation.quoted_at >= *quoted_at {
                    *quoted_at = quotation.quoted_at;
                    *rate = quotation.rate;
                }
            })
            .or_insert((quotation.quoted_at, quotation.rate));
    }

    latest
        .into_iter()
        .map(|(date, (_, rate))| (date, rate))
        .collect()
}

/// Distinct quotation dates in the half-open range, ascending.
fn business_days(
    quotations: &[Quotation],
    start_date: NaiveDate,
    end_date: NaiveDate,
) -> BTreeSet<NaiveDate> {
    quotations
        .iter()
        .map(Quotation::date)
        .filter(|date| *date >= start_date && *date < end_date)
        .collect()
}

/// Rate of the nearest date before `day`, at most [`LOOKBACK_DAYS`] back.
fn previous_rate(day: NaiveDate, rates: &HashMap<NaiveDate, Decimal>) -> Option<Decimal> {
    (1..=LOOKBACK_DAYS)
        .filter_map(|back| day.checked_sub_days(Days::new(back)))
        .find_map(|date| rates.get(&date).copied())
}

/// `(1 + rate/100)^(1/252)` rounded half away from zero to 8 digits.
///
/// The power is taken in `f64`; the result is re-quantized before it touches
/// any other decimal. Rates at or below -100% have no real daily factor and
/// yield `None`.
pub fn daily_factor(annual_rate: Decimal) -> Option<Decimal> {
    if annual_rate <= -Decimal::ONE_HUNDRED {
        return None;
    }

    let base = 1.0 + (annual_rate / Decimal::ONE_HUNDRED).to_f64()?;
    let factor = base.powf(1.0 / f64::from(BUSINESS_DAYS_PER_YEAR));
    if !factor.is_finite() {
        return None;
    }

    Decimal::from_f64(factor).map(|factor| {
        factor.round_dp_with_strategy(DAILY_FACTOR_SCALE, RoundingStrategy::MidpointAwayFromZero)
    })
}

fn truncate(value: Decimal, scale: u32) -> Decimal {
    value.round_dp_with_strategy(scale, RoundingStrategy::ToZero)
}
