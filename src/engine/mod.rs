//! The availability engine: pure slot computation over already-fetched inputs.
//!
//! Nothing in this module performs I/O, awaits, or reads the system clock.
//! Its answers are advisory: the authoritative check for a write is re-run by
//! the booking store at write time (see [`crate::ledger::BookingLedger::book`]).

pub mod capacity;
pub mod conflict;
mod error;
pub mod hours;
pub mod ranking;
pub mod slots;

pub use capacity::{hourly_utilization, occupancy, peak_concurrency, saturated_spans, Occupancy};
pub use conflict::{check_advance_window, check_capacity, check_slot, check_timing, Candidate};
pub use error::PolicyError;
pub use hours::resolve_day_schedule;
pub use ranking::{
    availability_stats, available_count, is_time_available, next_available_slot, optimal_slots,
    priority_for, slot_at, slots_by_period, AvailabilityStats, DayPeriods,
};
pub use slots::generate_slots;

use chrono::{NaiveDate, NaiveDateTime};
use tracing::{debug, trace};

use crate::model::*;

/// Compute the slot grid for one organization and date.
///
/// Identical inputs always produce an identical result. `now` is the
/// organization's local civil time; it decides past and notice checks and
/// anchors the advance-booking window.
pub fn compute_availability(
    date: NaiveDate,
    organization_id: &str,
    policy: &BookingPolicy,
    weekly_schedule: Option<&WeeklySchedule>,
    existing_commitments: &[ExistingCommitment],
    now: NaiveDateTime,
) -> Availability {
    if let Err(e) = check_advance_window(date, now.date(), policy) {
        debug!(organization_id, %date, "availability rejected: {e}");
        return Availability::rejected(e, None);
    }

    let day = resolve_day_schedule(weekly_schedule, date);
    if !day.enabled {
        debug!(organization_id, %date, "availability rejected: closed");
        return Availability::rejected(PolicyError::ClosedThisDay, Some(day));
    }

    let occupied = occupancy(existing_commitments, policy);
    let utilization = hourly_utilization(&occupied, &day.hours());
    let capacity = policy.vehicle_capacity;

    let slots: Vec<TimeSlot> = generate_slots(&day, policy.slot_duration_minutes)
        .into_iter()
        .map(|time| {
            let candidate = Candidate {
                date,
                start: time,
                duration_minutes: policy.slot_duration_minutes,
            };
            let used = conflict::used_capacity(&candidate, policy, &occupied);
            let available_capacity = capacity.saturating_sub(used);
            match check_slot(&candidate, policy, &occupied, now) {
                Ok(()) => {
                    let hour_used = utilization.get(&time.hour()).copied().unwrap_or(0);
                    TimeSlot {
                        time,
                        available: true,
                        reason: None,
                        priority: priority_for(hour_used, capacity),
                        estimated_duration: policy.slot_duration_minutes,
                        available_capacity,
                    }
                }
                Err(reason) => TimeSlot {
                    time,
                    available: false,
                    reason: Some(reason),
                    priority: Priority::Low,
                    estimated_duration: policy.slot_duration_minutes,
                    available_capacity,
                },
            }
        })
        .collect();

    trace!(
        organization_id,
        %date,
        slots = slots.len(),
        available = available_count(&slots),
        "availability computed"
    );

    Availability {
        slots,
        policy_error: None,
        fully_booked: saturated_spans(&occupied, capacity),
        working_hours: Some(day),
        utilization,
    }
}
