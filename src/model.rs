use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};
use ulid::Ulid;

use crate::engine::PolicyError;

/// Minutes since local midnight. Signed: buffered spans may reach before 00:00 or past 24:00.
pub type Minutes = i32;

pub const MINUTES_PER_DAY: Minutes = 24 * 60;

// ── Time of day ──────────────────────────────────────────────────

/// Wall-clock time in the organization's local civil time. No date, no zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TimeOfDay {
    hour: u8,
    minute: u8,
}

impl TimeOfDay {
    pub fn new(hour: u8, minute: u8) -> Option<Self> {
        (hour < 24 && minute < 60).then_some(Self { hour, minute })
    }

    /// Inverse of [`TimeOfDay::minutes`]. `None` outside `[0, 24:00)`.
    pub fn from_minutes(minutes: Minutes) -> Option<Self> {
        if !(0..MINUTES_PER_DAY).contains(&minutes) {
            return None;
        }
        Some(Self {
            hour: (minutes / 60) as u8,
            minute: (minutes % 60) as u8,
        })
    }

    pub fn hour(&self) -> u8 {
        self.hour
    }

    pub fn minute(&self) -> u8 {
        self.minute
    }

    pub fn minutes(&self) -> Minutes {
        Minutes::from(self.hour) * 60 + Minutes::from(self.minute)
    }

    pub fn to_naive_time(self) -> NaiveTime {
        NaiveTime::from_hms_opt(u32::from(self.hour), u32::from(self.minute), 0)
            .unwrap_or(NaiveTime::MIN)
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

/// Render a minute offset as `HH:MM`, wrapping around midnight.
pub fn format_minutes(minutes: Minutes) -> String {
    let m = minutes.rem_euclid(MINUTES_PER_DAY);
    format!("{:02}:{:02}", m / 60, m % 60)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseTimeError(String);

impl fmt::Display for ParseTimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid time of day: {:?} (expected HH:MM or HH:MM:SS)", self.0)
    }
}

impl std::error::Error for ParseTimeError {}

impl FromStr for TimeOfDay {
    type Err = ParseTimeError;

    /// Accepts `HH:MM` and database-style `HH:MM:SS`; seconds are dropped.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseTimeError(s.to_string());
        let mut parts = s.trim().split(':');
        let hour: u8 = parts.next().and_then(|p| p.parse().ok()).ok_or_else(err)?;
        let minute: u8 = parts.next().and_then(|p| p.parse().ok()).ok_or_else(err)?;
        if let Some(sec) = parts.next() {
            let sec: u8 = sec.parse().map_err(|_| err())?;
            if sec >= 60 {
                return Err(err());
            }
        }
        if parts.next().is_some() {
            return Err(err());
        }
        TimeOfDay::new(hour, minute).ok_or_else(err)
    }
}

impl TryFrom<String> for TimeOfDay {
    type Error = ParseTimeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<TimeOfDay> for String {
    fn from(t: TimeOfDay) -> Self {
        t.to_string()
    }
}

// ── Span ─────────────────────────────────────────────────────────

/// Half-open interval `[start, end)` in minutes since midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub start: Minutes,
    pub end: Minutes,
}

impl Span {
    pub fn new(start: Minutes, end: Minutes) -> Self {
        debug_assert!(start <= end, "Span start must not be after end");
        Self { start, end }
    }

    pub fn duration(&self) -> Minutes {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    /// The one overlap rule: `[a,b)` and `[c,d)` overlap iff `a < d && c < b`.
    pub fn overlaps(&self, other: &Span) -> bool {
        self.start < other.end && other.start < self.end
    }

    pub fn contains_instant(&self, t: Minutes) -> bool {
        self.start <= t && t < self.end
    }

    /// Widen by `before` on the left and `after` on the right.
    pub fn buffered(&self, before: u32, after: u32) -> Span {
        Span::new(
            self.start.saturating_sub(clamp_minutes(before)),
            self.end.saturating_add(clamp_minutes(after)),
        )
    }
}

pub(crate) fn clamp_minutes(m: u32) -> Minutes {
    Minutes::try_from(m).unwrap_or(Minutes::MAX)
}

// ── Working hours ────────────────────────────────────────────────

fn enabled_by_default() -> bool {
    true
}

/// Working hours for one weekday, with an optional break.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DaySchedule {
    pub start: TimeOfDay,
    pub end: TimeOfDay,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub break_start: Option<TimeOfDay>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub break_end: Option<TimeOfDay>,
    #[serde(default = "enabled_by_default", alias = "active")]
    pub enabled: bool,
}

impl DaySchedule {
    pub fn new(start: TimeOfDay, end: TimeOfDay) -> Self {
        Self {
            start,
            end,
            break_start: None,
            break_end: None,
            enabled: true,
        }
    }

    /// Default used when an organization has not configured a day: 08:00–18:00.
    pub fn standard() -> Self {
        Self::new(
            TimeOfDay { hour: 8, minute: 0 },
            TimeOfDay { hour: 18, minute: 0 },
        )
    }

    pub fn closed() -> Self {
        Self {
            enabled: false,
            ..Self::standard()
        }
    }

    pub fn with_break(mut self, start: TimeOfDay, end: TimeOfDay) -> Self {
        self.break_start = Some(start);
        self.break_end = Some(end);
        self
    }

    pub fn hours(&self) -> Span {
        Span {
            start: self.start.minutes(),
            end: self.end.minutes(),
        }
    }

    /// The break as a half-open span, if one is configured and non-empty.
    pub fn break_span(&self) -> Option<Span> {
        match (self.break_start, self.break_end) {
            (Some(s), Some(e)) if s < e => Some(Span::new(s.minutes(), e.minutes())),
            _ => None,
        }
    }

    /// Whether a ride may start at `t`: inside working hours and outside the break.
    pub fn admits(&self, t: TimeOfDay) -> bool {
        let m = t.minutes();
        self.enabled
            && self.hours().contains_instant(m)
            && !self.break_span().is_some_and(|b| b.contains_instant(m))
    }

    pub fn validate(&self) -> Result<(), &'static str> {
        if !self.enabled {
            return Ok(());
        }
        if self.start >= self.end {
            return Err("working hours must start before they end");
        }
        match (self.break_start, self.break_end) {
            (None, None) => Ok(()),
            (Some(bs), Some(be)) => {
                if bs >= be {
                    Err("break must start before it ends")
                } else if bs < self.start || be > self.end {
                    Err("break must lie within working hours")
                } else {
                    Ok(())
                }
            }
            _ => Err("break needs both a start and an end"),
        }
    }
}

/// Working hours per weekday. Unset days fall back to [`DaySchedule::standard`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeeklySchedule {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub monday: Option<DaySchedule>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tuesday: Option<DaySchedule>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wednesday: Option<DaySchedule>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thursday: Option<DaySchedule>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub friday: Option<DaySchedule>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub saturday: Option<DaySchedule>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sunday: Option<DaySchedule>,
}

impl WeeklySchedule {
    /// Same hours every day of the week.
    pub fn uniform(day: DaySchedule) -> Self {
        Self {
            monday: Some(day.clone()),
            tuesday: Some(day.clone()),
            wednesday: Some(day.clone()),
            thursday: Some(day.clone()),
            friday: Some(day.clone()),
            saturday: Some(day.clone()),
            sunday: Some(day),
        }
    }

    pub fn day(&self, weekday: Weekday) -> Option<&DaySchedule> {
        match weekday {
            Weekday::Mon => self.monday.as_ref(),
            Weekday::Tue => self.tuesday.as_ref(),
            Weekday::Wed => self.wednesday.as_ref(),
            Weekday::Thu => self.thursday.as_ref(),
            Weekday::Fri => self.friday.as_ref(),
            Weekday::Sat => self.saturday.as_ref(),
            Weekday::Sun => self.sunday.as_ref(),
        }
    }

    pub fn set(&mut self, weekday: Weekday, day: DaySchedule) {
        let slot = match weekday {
            Weekday::Mon => &mut self.monday,
            Weekday::Tue => &mut self.tuesday,
            Weekday::Wed => &mut self.wednesday,
            Weekday::Thu => &mut self.thursday,
            Weekday::Fri => &mut self.friday,
            Weekday::Sat => &mut self.saturday,
            Weekday::Sun => &mut self.sunday,
        };
        *slot = Some(day);
    }

    pub fn validate(&self) -> Result<(), &'static str> {
        [
            &self.monday,
            &self.tuesday,
            &self.wednesday,
            &self.thursday,
            &self.friday,
            &self.saturday,
            &self.sunday,
        ]
        .into_iter()
        .flatten()
        .try_for_each(DaySchedule::validate)
    }
}

// ── Policy and commitments ───────────────────────────────────────

/// Per-organization booking rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BookingPolicy {
    pub slot_duration_minutes: u32,
    /// Buffer held before each ride.
    pub buffer_before_minutes: u32,
    /// Buffer held after each ride.
    pub buffer_after_minutes: u32,
    pub minimum_notice_hours: u32,
    pub max_advance_booking_days: u32,
    /// Vehicles that can be on the road at once.
    pub vehicle_capacity: u32,
}

impl Default for BookingPolicy {
    fn default() -> Self {
        Self {
            slot_duration_minutes: 30,
            buffer_before_minutes: 15,
            buffer_after_minutes: 15,
            minimum_notice_hours: 2,
            max_advance_booking_days: 30,
            vehicle_capacity: 5,
        }
    }
}

impl BookingPolicy {
    pub fn validate(&self) -> Result<(), &'static str> {
        use crate::limits::*;
        if self.vehicle_capacity == 0 {
            return Err("vehicle capacity must be at least 1");
        }
        if self.vehicle_capacity > MAX_VEHICLE_CAPACITY {
            return Err("vehicle capacity too large");
        }
        if self.slot_duration_minutes == 0 {
            return Err("slot duration must be positive");
        }
        if self.slot_duration_minutes > MAX_DURATION_MINUTES {
            return Err("slot duration too long");
        }
        if self.buffer_before_minutes > MAX_DURATION_MINUTES
            || self.buffer_after_minutes > MAX_DURATION_MINUTES
        {
            return Err("buffer too long");
        }
        if self.max_advance_booking_days > MAX_ADVANCE_BOOKING_DAYS {
            return Err("advance booking window too long");
        }
        Ok(())
    }
}

/// An already-booked ride on the queried date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExistingCommitment {
    pub start_time: TimeOfDay,
    pub duration_minutes: u32,
}

impl ExistingCommitment {
    pub fn new(start_time: TimeOfDay, duration_minutes: u32) -> Self {
        Self {
            start_time,
            duration_minutes,
        }
    }

    pub fn span(&self) -> Span {
        let start = self.start_time.minutes();
        Span::new(start, start.saturating_add(clamp_minutes(self.duration_minutes)))
    }
}

// ── Query results ────────────────────────────────────────────────

/// Advisory desirability of an available slot. Ordered `Low < Medium < High`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
}

/// Why a slot cannot be booked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(into = "String")]
pub enum BlockReason {
    PastTime,
    InsufficientNotice { hours: u32 },
    /// Contending booking, unbuffered, in minutes since midnight.
    Booked { start: Minutes, end: Minutes },
    VehiclesOccupied { used: u32, capacity: u32 },
}

impl fmt::Display for BlockReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockReason::PastTime => write!(f, "past time"),
            BlockReason::InsufficientNotice { hours } => {
                write!(f, "insufficient notice (min. {hours}h lead time)")
            }
            BlockReason::Booked { start, end } => write!(
                f,
                "booked ({} - {})",
                format_minutes(*start),
                format_minutes(*end)
            ),
            BlockReason::VehiclesOccupied { used, capacity } => {
                write!(f, "all vehicles occupied ({used}/{capacity})")
            }
        }
    }
}

impl From<BlockReason> for String {
    fn from(r: BlockReason) -> Self {
        r.to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimeSlot {
    pub time: TimeOfDay,
    pub available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<BlockReason>,
    pub priority: Priority,
    pub estimated_duration: u32,
    pub available_capacity: u32,
}

/// Result of one availability query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Availability {
    pub slots: Vec<TimeSlot>,
    #[serde(skip_serializing_if = "Option::is_none", serialize_with = "display_opt")]
    pub policy_error: Option<PolicyError>,
    /// Resolved working hours; absent when the advance window rejected the query.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub working_hours: Option<DaySchedule>,
    /// Hour of day → peak vehicles in use during that hour.
    pub utilization: BTreeMap<u8, u32>,
    /// Buffered ranges, in minutes since midnight, in which every vehicle is taken
    /// at the same instant. A slot can still be unavailable outside these ranges:
    /// the slot check counts every ride overlapping its whole buffered span, so
    /// back-to-back rides inside one long slot fill it without ever running at once.
    pub fully_booked: Vec<Span>,
}

impl Availability {
    pub fn rejected(error: PolicyError, working_hours: Option<DaySchedule>) -> Self {
        Self {
            slots: Vec::new(),
            policy_error: Some(error),
            working_hours,
            utilization: BTreeMap::new(),
            fully_booked: Vec::new(),
        }
    }
}

fn display_opt<S, T>(value: &Option<T>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
    T: fmt::Display,
{
    match value {
        Some(v) => serializer.collect_str(v),
        None => serializer.serialize_none(),
    }
}

// ── Bookings ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    Pending,
    Planned,
    Confirmed,
    InProgress,
    Completed,
    Cancelled,
}

impl BookingStatus {
    /// Whether a booking in this state still holds a vehicle.
    pub fn is_active(self) -> bool {
        matches!(
            self,
            BookingStatus::Pending
                | BookingStatus::Planned
                | BookingStatus::Confirmed
                | BookingStatus::InProgress
        )
    }
}

/// A ride as the ledger stores it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingRecord {
    pub id: Ulid,
    pub organization_id: String,
    pub date: NaiveDate,
    pub start: TimeOfDay,
    pub duration_minutes: u32,
    pub status: BookingStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl BookingRecord {
    pub fn commitment(&self) -> ExistingCommitment {
        ExistingCommitment::new(self.start, self.duration_minutes)
    }
}

/// Change-feed events, one channel per organization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BookingEvent {
    Booked {
        id: Ulid,
        organization_id: String,
        date: NaiveDate,
        start: TimeOfDay,
    },
    StatusChanged {
        id: Ulid,
        organization_id: String,
        date: NaiveDate,
        status: BookingStatus,
    },
    PolicyUpdated {
        organization_id: String,
    },
}
