use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Identifier of the rate series the calculator is indexed to.
pub const DEFAULT_SERIES: &str = "SQI";

/// One published daily rate of a series, as stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Quotation {
    pub id: Uuid,
    pub quoted_at: NaiveDateTime,
    pub series_id: String,
    /// Annualized percentage, e.g. 13.25 for 13.25% a year.
    pub rate: Decimal,
}

impl Quotation {
    pub fn new(quoted_at: NaiveDateTime, series_id: impl Into<String>, rate: Decimal) -> Self {
        Self {
            id: Uuid::new_v4(),
            quoted_at,
            series_id: series_id.into(),
            rate,
        }
    }

    /// Calendar date of the quotation, time-of-day dropped.
    pub fn date(&self) -> NaiveDate {
        self.quoted_at.date()
    }

    pub fn belongs_to(&self, series_id: &str) -> bool {
        normalize_series_id(&self.series_id) == normalize_series_id(series_id)
    }
}

/// Series ids match regardless of case and surrounding whitespace.
pub fn normalize_series_id(series_id: &str) -> String {
    series_id.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn at(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, 30, 0)
            .unwrap()
    }

    #[test]
    fn date_drops_time_of_day() {
        let quotation = Quotation::new(at(2024, 3, 15, 18), "SQI", dec!(10.40));
        assert_eq!(quotation.date(), NaiveDate::from_ymd_opt(2024, 3, 15).unwrap());
    }

    #[test]
    fn series_match_ignores_case_and_padding() {
        let quotation = Quotation::new(at(2024, 3, 15, 0), " sqi ", dec!(10.40));
        assert!(quotation.belongs_to("SQI"));
        assert!(quotation.belongs_to("  Sqi"));
        assert!(!quotation.belongs_to("CDI"));
    }
}
