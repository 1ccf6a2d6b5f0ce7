use std::time::Instant;

use chrono::{Days, NaiveDate};
use futures::future::try_join_all;
use ulid::Ulid;

use crate::limits::MAX_QUERY_DAYS;
use crate::model::*;
use crate::observability::{self, AVAILABILITY_DURATION_SECONDS, AVAILABILITY_QUERIES_TOTAL};
use crate::ports::fetch_availability;

use super::{BookingLedger, StoreError};

impl BookingLedger {
    /// Slot grid for one organization and date, as of the ledger's clock.
    pub async fn availability(&self, organization_id: &str, date: NaiveDate) -> Result<Availability, StoreError> {
        let started = Instant::now();
        let result = fetch_availability(self, organization_id, date, self.clock.now()).await;
        metrics::histogram!(AVAILABILITY_DURATION_SECONDS).record(started.elapsed().as_secs_f64());
        let outcome = match &result {
            Ok(a) => observability::outcome_label(a),
            Err(e) => observability::rejection_label(e),
        };
        metrics::counter!(AVAILABILITY_QUERIES_TOTAL, "outcome" => outcome).increment(1);
        result
    }

    /// Availability for `days` consecutive dates starting at `from`, in date order.
    pub async fn availability_for_days(
        &self,
        organization_id: &str,
        from: NaiveDate,
        days: u32,
    ) -> Result<Vec<(NaiveDate, Availability)>, StoreError> {
        if days > MAX_QUERY_DAYS {
            return Err(StoreError::LimitExceeded("too many days in one query"));
        }
        // Fail fast on an unknown organization instead of once per day.
        self.organization(organization_id)?;

        let dates: Vec<NaiveDate> = (0..days)
            .map_while(|offset| from.checked_add_days(Days::new(u64::from(offset))))
            .collect();
        let results = try_join_all(dates.iter().map(|&date| self.availability(organization_id, date))).await?;
        Ok(dates.into_iter().zip(results).collect())
    }

    /// All bookings on a date, cancelled ones included, sorted by start.
    pub async fn bookings_for_day(&self, organization_id: &str, date: NaiveDate) -> Vec<BookingRecord> {
        match self.get_day(organization_id, date) {
            Some(day) => day.read().await.bookings.clone(),
            None => Vec::new(),
        }
    }

    /// Active bookings on a date.
    pub async fn active_count(&self, organization_id: &str, date: NaiveDate) -> usize {
        match self.get_day(organization_id, date) {
            Some(day) => day.read().await.active_count(),
            None => 0,
        }
    }

    pub async fn get_booking(&self, id: Ulid) -> Result<BookingRecord, StoreError> {
        let day = self.day_for_booking(&id)?;
        let guard = day.read().await;
        guard
            .bookings
            .iter()
            .find(|b| b.id == id)
            .cloned()
            .ok_or(StoreError::NotFound(id))
    }

    /// Registered organization ids, sorted.
    pub fn organizations(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.organizations.iter().map(|e| e.key().clone()).collect();
        ids.sort();
        ids
    }
}
