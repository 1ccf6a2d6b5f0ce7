use chrono::{Days, NaiveDate, NaiveDateTime, TimeDelta};

use crate::model::*;

use super::capacity::{Occupancy, contenders};
use super::PolicyError;

/// One prospective ride: where it starts and how long it runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Candidate {
    pub date: NaiveDate,
    pub start: TimeOfDay,
    pub duration_minutes: u32,
}

impl Candidate {
    pub fn starts_at(&self) -> NaiveDateTime {
        self.date.and_time(self.start.to_naive_time())
    }

    pub fn span(&self) -> Span {
        let start = self.start.minutes();
        Span::new(start, start.saturating_add(clamp_minutes(self.duration_minutes)))
    }

    /// `[start − before, end + after)`, the span compared against commitments.
    pub fn buffered_span(&self, policy: &BookingPolicy) -> Span {
        self.span()
            .buffered(policy.buffer_before_minutes, policy.buffer_after_minutes)
    }
}

/// Rejects dates beyond `today + max_advance_booking_days`. Checked once per query.
pub fn check_advance_window(date: NaiveDate, today: NaiveDate, policy: &BookingPolicy) -> Result<(), PolicyError> {
    let max_days = policy.max_advance_booking_days;
    match today.checked_add_days(Days::new(u64::from(max_days))) {
        Some(last_bookable) if date > last_bookable => Err(PolicyError::TooFarInAdvance { max_days }),
        _ => Ok(()),
    }
}

/// Decide one slot. Checks run in a fixed order and the first failure wins:
/// past → minimum notice → capacity.
///
/// `occupied` must come from [`super::capacity::occupancy`] with the same policy.
pub fn check_slot(
    candidate: &Candidate,
    policy: &BookingPolicy,
    occupied: &[Occupancy],
    now: NaiveDateTime,
) -> Result<(), BlockReason> {
    check_timing(candidate, policy, now)?;
    check_capacity(candidate, policy, occupied)
}

/// Past and minimum-notice steps alone. Independent of existing commitments.
pub fn check_timing(candidate: &Candidate, policy: &BookingPolicy, now: NaiveDateTime) -> Result<(), BlockReason> {
    let starts_at = candidate.starts_at();
    if starts_at < now {
        return Err(BlockReason::PastTime);
    }

    let hours = policy.minimum_notice_hours;
    match TimeDelta::try_hours(i64::from(hours)).and_then(|d| now.checked_add_signed(d)) {
        Some(earliest) if starts_at < earliest => {
            return Err(BlockReason::InsufficientNotice { hours });
        }
        Some(_) => {}
        // Notice period runs past the end of the calendar.
        None => return Err(BlockReason::InsufficientNotice { hours }),
    }
    Ok(())
}

/// Capacity step alone. With a single vehicle the reason names the contending ride.
pub fn check_capacity(candidate: &Candidate, policy: &BookingPolicy, occupied: &[Occupancy]) -> Result<(), BlockReason> {
    let span = candidate.buffered_span(policy);
    let capacity = policy.vehicle_capacity;
    let mut hits = contenders(occupied, &span);

    if capacity <= 1 {
        // Fast path: the first contending ride decides.
        return match hits.next() {
            Some(o) => Err(BlockReason::Booked {
                start: o.ride.start,
                end: o.ride.end,
            }),
            None if capacity == 0 => Err(BlockReason::VehiclesOccupied { used: 0, capacity }),
            None => Ok(()),
        };
    }

    let used = hits.count() as u32;
    if used >= capacity {
        return Err(BlockReason::VehiclesOccupied { used, capacity });
    }
    Ok(())
}

/// Number of commitments contending with the candidate's buffered span.
pub fn used_capacity(candidate: &Candidate, policy: &BookingPolicy, occupied: &[Occupancy]) -> u32 {
    contenders(occupied, &candidate.buffered_span(policy)).count() as u32
}
