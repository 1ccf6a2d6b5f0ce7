use std::time::Instant;

use dashmap::mapref::entry::Entry;
use tracing::{debug, info};
use ulid::Ulid;

use crate::engine::{
    check_advance_window, check_capacity, check_timing, occupancy, resolve_day_schedule, Candidate, PolicyError,
};
use crate::limits::*;
use crate::model::*;
use crate::observability::{self, BOOKINGS_TOTAL, BOOKING_DURATION_SECONDS, ORGANIZATIONS_ACTIVE};

use super::{BookingLedger, BookingRequest, OrganizationPolicy, StoreError};

impl BookingLedger {
    /// Register or replace an organization's policy. Takes effect on the next query.
    pub fn register_organization(&self, organization_id: &str, config: OrganizationPolicy) -> Result<(), StoreError> {
        if organization_id.is_empty() {
            return Err(StoreError::InvalidInput("empty organization id"));
        }
        if organization_id.len() > MAX_ORGANIZATION_ID_LEN {
            return Err(StoreError::LimitExceeded("organization id too long"));
        }
        if !self.organizations.contains_key(organization_id) && self.organizations.len() >= MAX_ORGANIZATIONS {
            return Err(StoreError::LimitExceeded("too many organizations"));
        }
        config.policy.validate().map_err(StoreError::InvalidInput)?;
        if let Some(schedule) = &config.schedule {
            schedule.validate().map_err(StoreError::InvalidInput)?;
        }

        self.organizations.insert(organization_id.to_string(), config);
        metrics::gauge!(ORGANIZATIONS_ACTIVE).set(self.organizations.len() as f64);
        info!(organization_id, "organization policy updated");
        self.notify.send(
            organization_id,
            &BookingEvent::PolicyUpdated {
                organization_id: organization_id.to_string(),
            },
        );
        Ok(())
    }

    /// Claim a slot. Re-runs every availability check with the ledger's clock; the
    /// capacity check runs under the day's write lock, so it cannot go stale
    /// between check and insert.
    pub async fn book(&self, request: BookingRequest) -> Result<BookingRecord, StoreError> {
        let started = Instant::now();
        let result = self.book_inner(request).await;
        metrics::histogram!(BOOKING_DURATION_SECONDS).record(started.elapsed().as_secs_f64());
        let outcome = match &result {
            Ok(_) => "accepted",
            Err(e) => observability::rejection_label(e),
        };
        metrics::counter!(BOOKINGS_TOTAL, "outcome" => outcome).increment(1);
        result
    }

    async fn book_inner(&self, request: BookingRequest) -> Result<BookingRecord, StoreError> {
        let BookingRequest {
            organization_id,
            date,
            start,
            duration_minutes,
            label,
        } = request;

        if let Some(ref l) = label
            && l.len() > MAX_LABEL_LEN
        {
            return Err(StoreError::LimitExceeded("label too long"));
        }
        let org = self.organization(&organization_id)?;
        let policy = &org.policy;
        let duration = duration_minutes.unwrap_or(policy.slot_duration_minutes);
        if duration == 0 {
            return Err(StoreError::InvalidInput("ride duration must be positive"));
        }
        if duration > MAX_DURATION_MINUTES {
            return Err(StoreError::LimitExceeded("ride duration too long"));
        }

        let now = self.clock.now();
        check_advance_window(date, now.date(), policy)?;
        let day = resolve_day_schedule(org.schedule.as_ref(), date);
        if !day.enabled {
            return Err(PolicyError::ClosedThisDay.into());
        }
        if !day.admits(start) {
            return Err(StoreError::OutsideWorkingHours(start));
        }

        let candidate = Candidate {
            date,
            start,
            duration_minutes: duration,
        };
        // Past and notice rejections must not allocate a day book.
        if let Err(reason) = check_timing(&candidate, policy, now) {
            debug!(organization_id, %date, %start, "booking rejected: {reason}");
            return Err(reason.into());
        }

        let book = self.day_or_create(&organization_id, date);
        let mut guard = book.write().await;
        if guard.bookings.len() >= MAX_BOOKINGS_PER_DAY {
            return Err(StoreError::LimitExceeded("too many bookings on this day"));
        }

        let occupied = occupancy(&guard.active_commitments(), policy);
        if let Err(reason) = check_capacity(&candidate, policy, &occupied) {
            debug!(organization_id, %date, %start, "booking rejected: {reason}");
            return Err(reason.into());
        }

        let record = BookingRecord {
            id: Ulid::new(),
            organization_id: organization_id.clone(),
            date,
            start,
            duration_minutes: duration,
            status: BookingStatus::Pending,
            label,
        };
        guard.insert_booking(record.clone());
        self.booking_index
            .insert(record.id, (organization_id.clone(), date));
        drop(guard);

        info!(organization_id, %date, %start, id = %record.id, "booking accepted");
        self.notify.send(
            &organization_id,
            &BookingEvent::Booked {
                id: record.id,
                organization_id: organization_id.clone(),
                date,
                start,
            },
        );
        Ok(record)
    }

    /// Load a record as-is, without policy checks. For imports and replays.
    pub async fn restore(&self, record: BookingRecord) -> Result<(), StoreError> {
        if self.booking_index.contains_key(&record.id) {
            return Err(StoreError::AlreadyExists(record.id));
        }
        if record.organization_id.is_empty() {
            return Err(StoreError::InvalidInput("empty organization id"));
        }
        if record.organization_id.len() > MAX_ORGANIZATION_ID_LEN {
            return Err(StoreError::LimitExceeded("organization id too long"));
        }
        if record.duration_minutes > MAX_DURATION_MINUTES {
            return Err(StoreError::LimitExceeded("ride duration too long"));
        }

        let book = self.day_or_create(&record.organization_id, record.date);
        let mut guard = book.write().await;
        if guard.bookings.len() >= MAX_BOOKINGS_PER_DAY {
            return Err(StoreError::LimitExceeded("too many bookings on this day"));
        }
        // Claim the id under the day lock; the early check above is only a fast path.
        match self.booking_index.entry(record.id) {
            Entry::Occupied(_) => return Err(StoreError::AlreadyExists(record.id)),
            Entry::Vacant(slot) => {
                slot.insert((record.organization_id.clone(), record.date));
            }
        }
        guard.insert_booking(record);
        Ok(())
    }

    pub async fn cancel(&self, id: Ulid) -> Result<BookingRecord, StoreError> {
        self.update_status(id, BookingStatus::Cancelled).await
    }

    /// Move a booking to `status`. Leaving an active state frees its vehicle.
    pub async fn update_status(&self, id: Ulid, status: BookingStatus) -> Result<BookingRecord, StoreError> {
        let book = self.day_for_booking(&id)?;
        let mut guard = book.write().await;
        let record = guard.booking_mut(id).ok_or(StoreError::NotFound(id))?;
        if record.status == status {
            return Ok(record.clone());
        }
        if matches!(record.status, BookingStatus::Cancelled | BookingStatus::Completed) {
            return Err(StoreError::InvalidInput("booking is already closed"));
        }
        record.status = status;
        let updated = record.clone();
        drop(guard);

        info!(
            organization_id = %updated.organization_id,
            %id,
            ?status,
            "booking status changed"
        );
        self.notify.send(
            &updated.organization_id,
            &BookingEvent::StatusChanged {
                id,
                organization_id: updated.organization_id.clone(),
                date: updated.date,
                status,
            },
        );
        Ok(updated)
    }
}
