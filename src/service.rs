use chrono::Days;
use log::{info, warn};

use crate::calculator::{self, CalculationRequest, CalculationResult, LOOKBACK_DAYS};
use crate::error::{CalculationError, ServiceError};
use crate::quotation::DEFAULT_SERIES;
use crate::store::QuotationStore;

/// Fetches a series from the store and runs the accumulation over it.
pub struct CalculatorService<S> {
    store: S,
    series_id: String,
}

impl<S: QuotationStore> CalculatorService<S> {
    pub fn new(store: S) -> Self {
        Self::with_series(store, DEFAULT_SERIES)
    }

    pub fn with_series(store: S, series_id: impl Into<String>) -> Self {
        Self {
            store,
            series_id: series_id.into(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub async fn calculate(
        &self,
        request: &CalculationRequest,
    ) -> Result<CalculationResult, ServiceError> {
        info!(
            "Starting calculation: principal {}, start {}, end {}",
            request.principal, request.start_date, request.end_date
        );

        request.validate()?;

        // Reach far enough back for the first day's lookback.
        let fetch_from = request
            .start_date
            .checked_sub_days(Days::new(LOOKBACK_DAYS))
            .unwrap_or(request.start_date);

        let quotations = self
            .store
            .fetch_series(&self.series_id, fetch_from, request.end_date)
            .await?;
        info!(
            "Found {} {} quotations between {} and {}",
            quotations.len(),
            self.series_id,
            fetch_from,
            request.end_date
        );

        let result = calculator::compute(
            request.principal,
            request.start_date,
            request.end_date,
            &quotations,
        )
        .inspect_err(|err| {
            if *err == CalculationError::DataUnavailable {
                warn!(
                    "No {} quotations between {} and {}",
                    self.series_id, fetch_from, request.end_date
                );
            }
        })?;

        for day in &result.days_with_invalid_rate {
            warn!("Rate before {} has no daily factor, day not compounded", day);
        }
        for day in &result.days_without_rate {
            warn!(
                "No rate within {} days before {}, day not compounded",
                LOOKBACK_DAYS, day
            );
        }

        info!(
            "Calculation done: factor {}, updated value {}, business days {}",
            result.accumulated_factor, result.updated_value, result.business_days_count
        );

        Ok(result)
    }
}
