use std::future::Future;

use chrono::{Days, NaiveDate, NaiveDateTime, NaiveTime};
use sqlx::PgPool;

use crate::error::StoreError;
use crate::quotation::{Quotation, normalize_series_id};

/// Source of published quotations.
pub trait QuotationStore {
    /// Quotations of `series_id` dated within `[start_date, end_date]`,
    /// ordered by timestamp.
    fn fetch_series(
        &self,
        series_id: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> impl Future<Output = Result<Vec<Quotation>, StoreError>> + Send;

    /// Every quotation of every series, ordered by timestamp.
    fn fetch_all(&self) -> impl Future<Output = Result<Vec<Quotation>, StoreError>> + Send;

    fn count(&self) -> impl Future<Output = Result<i64, StoreError>> + Send;

    /// The earliest `limit` quotations, for diagnostics.
    fn sample(
        &self,
        limit: i64,
    ) -> impl Future<Output = Result<Vec<Quotation>, StoreError>> + Send;
}

/// First instant of `date` and first instant of the following day.
fn day_bounds(start_date: NaiveDate, end_date: NaiveDate) -> (NaiveDateTime, NaiveDateTime) {
    let from = start_date.and_time(NaiveTime::MIN);
    let until = end_date
        .checked_add_days(Days::new(1))
        .map(|next| next.and_time(NaiveTime::MIN))
        .unwrap_or(NaiveDateTime::MAX);
    (from, until)
}

pub struct PgQuotationStore {
    pool: PgPool,
}

impl PgQuotationStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl QuotationStore for PgQuotationStore {
    async fn fetch_series(
        &self,
        series_id: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<Quotation>, StoreError> {
        let (from, until) = day_bounds(start_date, end_date);

        let rows = sqlx::query_as::<_, Quotation>(
            r#"
            SELECT id, quoted_at, series_id, rate
            FROM quotation
            WHERE lower(trim(series_id)) = $1
              AND quoted_at >= $2
              AND quoted_at < $3
            ORDER BY quoted_at
            "#,
        )
        .bind(normalize_series_id(series_id))
        .bind(from)
        .bind(until)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn fetch_all(&self) -> Result<Vec<Quotation>, StoreError> {
        let rows = sqlx::query_as::<_, Quotation>(
            "SELECT id, quoted_at, series_id, rate FROM quotation ORDER BY quoted_at",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn count(&self) -> Result<i64, StoreError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM quotation")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    async fn sample(&self, limit: i64) -> Result<Vec<Quotation>, StoreError> {
        let rows = sqlx::query_as::<_, Quotation>(
            r#"
            SELECT id, quoted_at, series_id, rate
            FROM quotation
            ORDER BY quoted_at
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}

/// Quotations held in memory, filtered the same way the database is.
#[derive(Debug, Default, Clone)]
pub struct MemoryQuotationStore {
    quotations: Vec<Quotation>,
}

impl MemoryQuotationStore {
    pub fn new(quotations: Vec<Quotation>) -> Self {
        Self { quotations }
    }

    pub fn push(&mut self, quotation: Quotation) {
        self.quotations.push(quotation);
    }

    fn sorted(mut quotations: Vec<Quotation>) -> Vec<Quotation> {
        // stable, so same-instant duplicates keep insertion order
        quotations.sort_by_key(|quotation| quotation.quoted_at);
        quotations
    }
}

impl QuotationStore for MemoryQuotationStore {
    async fn fetch_series(
        &self,
        series_id: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<Quotation>, StoreError> {
        let (from, until) = day_bounds(start_date, end_date);

        let matching = self
            .quotations
            .iter()
            .filter(|quotation| quotation.belongs_to(series_id))
            .filter(|quotation| quotation.quoted_at >= from && quotation.quoted_at < until)
            .cloned()
            .collect();

        Ok(Self::sorted(matching))
    }

    async fn fetch_all(&self) -> Result<Vec<Quotation>, StoreError> {
        Ok(Self::sorted(self.quotations.clone()))
    }

    async fn count(&self) -> Result<i64, StoreError> {
        Ok(self.quotations.len() as i64)
    }

    async fn sample(&self, limit: i64) -> Result<Vec<Quotation>, StoreError> {
        let limit = usize::try_from(limit).unwrap_or(0);
        let mut rows = Self::sorted(self.quotations.clone());
        rows.truncate(limit);
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn store() -> MemoryQuotationStore {
        let mut store = MemoryQuotationStore::default();
        for (quoted_at, series_id, rate) in [
            (ymd(2024, 1, 3).and_hms_opt(23, 59, 0), "SQI", dec!(13.00)),
            (ymd(2024, 1, 1).and_hms_opt(10, 0, 0), "sqi ", dec!(12.90)),
            (ymd(2024, 1, 2).and_hms_opt(0, 0, 0), "CDI", dec!(11.65)),
            (ymd(2023, 12, 31).and_hms_opt(0, 0, 0), "SQI", dec!(12.80)),
            (ymd(2024, 1, 4).and_hms_opt(0, 0, 0), "SQI", dec!(13.10)),
        ] {
            store.push(Quotation::new(quoted_at.unwrap(), series_id, rate));
        }
        store
    }

    #[tokio::test]
    async fn fetch_series_covers_whole_end_day() {
        let rows = store()
            .fetch_series(" Sqi", ymd(2024, 1, 1), ymd(2024, 1, 3))
            .await
            .unwrap();

        let rates: Vec<_> = rows.iter().map(|q| q.rate).collect();
        assert_eq!(rates, vec![dec!(12.90), dec!(13.00)]);
    }

    #[tokio::test]
    async fn fetch_all_is_ordered() {
        let store = store();
        let rows = store.fetch_all().await.unwrap();

        assert_eq!(store.count().await.unwrap(), 5);
        assert!(rows.windows(2).all(|pair| pair[0].quoted_at <= pair[1].quoted_at));
        assert_eq!(rows[0].date(), ymd(2023, 12, 31));
    }

    #[tokio::test]
    async fn sample_takes_earliest_rows() {
        let rows = store().sample(2).await.unwrap();
        let dates: Vec<_> = rows.iter().map(Quotation::date).collect();
        assert_eq!(dates, vec![ymd(2023, 12, 31), ymd(2024, 1, 1)]);

        assert!(store().sample(-1).await.unwrap().is_empty());
    }

    #[test]
    fn day_bounds_are_half_open_over_days() {
        let (from, until) = day_bounds(ymd(2024, 2, 28), ymd(2024, 2, 29));
        assert_eq!(from, ymd(2024, 2, 28).and_hms_opt(0, 0, 0).unwrap());
        assert_eq!(until, ymd(2024, 3, 1).and_hms_opt(0, 0, 0).unwrap());
    }
}
