//! In-memory booking store and organization policy provider.
//!
//! The ledger is where the advisory engine answer becomes authoritative:
//! [`BookingLedger::book`] re-runs every check under the day's write lock, so
//! two clients that both saw a slot as free cannot both take its last vehicle.

mod error;
mod mutations;
mod queries;

pub use error::StoreError;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use ulid::Ulid;

use crate::clock::{Clock, SystemClock};
use crate::model::*;
use crate::notify::NotifyHub;
use crate::ports::{CommitmentSource, PolicyProvider};

/// Everything the engine needs to know about one organization.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrganizationPolicy {
    #[serde(default)]
    pub policy: BookingPolicy,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schedule: Option<WeeklySchedule>,
}

/// A client's request to claim a slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingRequest {
    pub organization_id: String,
    pub date: NaiveDate,
    pub start: TimeOfDay,
    /// Defaults to the organization's slot duration.
    #[serde(default)]
    pub duration_minutes: Option<u32>,
    #[serde(default)]
    pub label: Option<String>,
}

/// All bookings of one organization on one date, sorted by start.
#[derive(Debug, Clone)]
pub struct DayBook {
    pub organization_id: String,
    pub date: NaiveDate,
    pub bookings: Vec<BookingRecord>,
}

impl DayBook {
    pub fn new(organization_id: String, date: NaiveDate) -> Self {
        Self {
            organization_id,
            date,
            bookings: Vec::new(),
        }
    }

    /// Insert maintaining sort order by start.
    pub fn insert_booking(&mut self, record: BookingRecord) {
        let pos = self
            .bookings
            .partition_point(|b| b.start <= record.start);
        self.bookings.insert(pos, record);
    }

    pub fn booking_mut(&mut self, id: Ulid) -> Option<&mut BookingRecord> {
        self.bookings.iter_mut().find(|b| b.id == id)
    }

    /// Rides that still hold a vehicle.
    pub fn active_commitments(&self) -> Vec<ExistingCommitment> {
        self.bookings
            .iter()
            .filter(|b| b.status.is_active())
            .map(BookingRecord::commitment)
            .collect()
    }

    pub fn active_count(&self) -> usize {
        self.bookings.iter().filter(|b| b.status.is_active()).count()
    }
}

pub type SharedDayBook = Arc<RwLock<DayBook>>;

type DayKey = (String, NaiveDate);

pub struct BookingLedger {
    pub(super) organizations: DashMap<String, OrganizationPolicy>,
    pub(super) days: DashMap<DayKey, SharedDayBook>,
    /// Reverse lookup: booking id → (organization, date)
    pub(super) booking_index: DashMap<Ulid, DayKey>,
    pub notify: Arc<NotifyHub>,
    pub(super) clock: Arc<dyn Clock>,
}

impl BookingLedger {
    pub fn new(clock: Arc<dyn Clock>, notify: Arc<NotifyHub>) -> Self {
        Self {
            organizations: DashMap::new(),
            days: DashMap::new(),
            booking_index: DashMap::new(),
            notify,
            clock,
        }
    }

    pub fn with_system_clock() -> Self {
        Self::new(Arc::new(SystemClock), Arc::new(NotifyHub::new()))
    }

    pub fn organization(&self, organization_id: &str) -> Result<OrganizationPolicy, StoreError> {
        self.organizations
            .get(organization_id)
            .map(|e| e.value().clone())
            .ok_or_else(|| StoreError::UnknownOrganization(organization_id.to_string()))
    }

    pub fn get_day(&self, organization_id: &str, date: NaiveDate) -> Option<SharedDayBook> {
        self.days
            .get(&(organization_id.to_string(), date))
            .map(|e| e.value().clone())
    }

    /// Day book for `(organization, date)`, created empty on first use.
    pub(super) fn day_or_create(&self, organization_id: &str, date: NaiveDate) -> SharedDayBook {
        self.days
            .entry((organization_id.to_string(), date))
            .or_insert_with(|| {
                Arc::new(RwLock::new(DayBook::new(organization_id.to_string(), date)))
            })
            .value()
            .clone()
    }

    pub(super) fn day_for_booking(&self, id: &Ulid) -> Result<SharedDayBook, StoreError> {
        let (org, date) = self
            .booking_index
            .get(id)
            .map(|e| e.value().clone())
            .ok_or(StoreError::NotFound(*id))?;
        self.get_day(&org, date).ok_or(StoreError::NotFound(*id))
    }
}

#[async_trait]
impl PolicyProvider for BookingLedger {
    async fn weekly_schedule(&self, organization_id: &str) -> Result<Option<WeeklySchedule>, StoreError> {
        Ok(self.organization(organization_id)?.schedule)
    }

    async fn booking_policy(&self, organization_id: &str) -> Result<BookingPolicy, StoreError> {
        Ok(self.organization(organization_id)?.policy)
    }
}

#[async_trait]
impl CommitmentSource for BookingLedger {
    async fn existing_commitments(
        &self,
        organization_id: &str,
        date: NaiveDate,
    ) -> Result<Vec<ExistingCommitment>, StoreError> {
        match self.get_day(organization_id, date) {
            Some(day) => Ok(day.read().await.active_commitments()),
            None => Ok(Vec::new()),
        }
    }
}
