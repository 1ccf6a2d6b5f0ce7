//! Collaborator interfaces the engine's callers depend on.
//!
//! The engine itself never awaits. Callers fetch policy and commitments
//! through these traits first, then hand the materialized data to
//! [`crate::engine::compute_availability`].

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};

use crate::engine::compute_availability;
use crate::ledger::StoreError;
use crate::model::{Availability, BookingPolicy, ExistingCommitment, WeeklySchedule};

/// Supplies per-organization working hours and booking rules.
#[async_trait]
pub trait PolicyProvider: Send + Sync {
    /// `None` means the organization has not configured hours; the engine
    /// then applies its default day.
    async fn weekly_schedule(&self, organization_id: &str) -> Result<Option<WeeklySchedule>, StoreError>;

    async fn booking_policy(&self, organization_id: &str) -> Result<BookingPolicy, StoreError>;
}

/// Supplies already-booked rides.
#[async_trait]
pub trait CommitmentSource: Send + Sync {
    /// Rides on `date` in an active state only; cancelled and completed rides are excluded.
    async fn existing_commitments(
        &self,
        organization_id: &str,
        date: NaiveDate,
    ) -> Result<Vec<ExistingCommitment>, StoreError>;
}

/// Fetch everything the engine needs, then run it.
pub async fn fetch_availability<S>(
    source: &S,
    organization_id: &str,
    date: NaiveDate,
    now: NaiveDateTime,
) -> Result<Availability, StoreError>
where
    S: PolicyProvider + CommitmentSource + ?Sized,
{
    let policy = source.booking_policy(organization_id).await?;
    let schedule = source.weekly_schedule(organization_id).await?;
    let commitments = source.existing_commitments(organization_id, date).await?;
    Ok(compute_availability(
        date,
        organization_id,
        &policy,
        schedule.as_ref(),
        &commitments,
        now,
    ))
}
