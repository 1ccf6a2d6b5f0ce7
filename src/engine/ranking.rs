//! Advisory ranking and read-only helpers over a computed slot list.
//!
//! Nothing here changes whether a slot is available; these only order,
//! group and summarize what [`super::compute_availability`] produced.

use serde::Serialize;

use crate::model::{Priority, TimeOfDay, TimeSlot};

/// Priority from the utilization ratio `used / capacity` of the slot's hour:
/// above 0.7 → low, above 0.4 → medium, otherwise high.
pub fn priority_for(used: u32, capacity: u32) -> Priority {
    if capacity == 0 {
        return Priority::Low;
    }
    let ratio = f64::from(used) / f64::from(capacity);
    if ratio > 0.7 {
        Priority::Low
    } else if ratio > 0.4 {
        Priority::Medium
    } else {
        Priority::High
    }
}

/// Up to `count` available slots, best priority first, earlier first within a priority.
pub fn optimal_slots(slots: &[TimeSlot], count: usize) -> Vec<TimeSlot> {
    let mut best: Vec<TimeSlot> = slots.iter().filter(|s| s.available).cloned().collect();
    // Stable: keeps time order among equal priorities.
    best.sort_by(|a, b| b.priority.cmp(&a.priority));
    best.truncate(count);
    best
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DayPeriods {
    /// 06:00–12:00
    pub morning: Vec<TimeSlot>,
    /// 12:00–17:00
    pub afternoon: Vec<TimeSlot>,
    /// 17:00–22:00
    pub evening: Vec<TimeSlot>,
}

/// Group slots by part of day. Slots before 06:00 or from 22:00 fall in no group.
pub fn slots_by_period(slots: &[TimeSlot]) -> DayPeriods {
    let mut periods = DayPeriods::default();
    for slot in slots {
        match slot.time.hour() {
            6..=11 => periods.morning.push(slot.clone()),
            12..=16 => periods.afternoon.push(slot.clone()),
            17..=21 => periods.evening.push(slot.clone()),
            _ => {}
        }
    }
    periods
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AvailabilityStats {
    pub total: usize,
    pub available: usize,
    pub unavailable: usize,
    /// Percentage, 0–100.
    pub availability_rate: f64,
    pub high_priority_slots: usize,
}

pub fn availability_stats(slots: &[TimeSlot]) -> AvailabilityStats {
    let total = slots.len();
    let available = available_count(slots);
    let high_priority_slots = slots
        .iter()
        .filter(|s| s.available && s.priority == Priority::High)
        .count();
    AvailabilityStats {
        total,
        available,
        unavailable: total - available,
        availability_rate: if total > 0 {
            available as f64 / total as f64 * 100.0
        } else {
            0.0
        },
        high_priority_slots,
    }
}

pub fn next_available_slot(slots: &[TimeSlot]) -> Option<&TimeSlot> {
    slots.iter().find(|s| s.available)
}

pub fn available_count(slots: &[TimeSlot]) -> usize {
    slots.iter().filter(|s| s.available).count()
}

pub fn slot_at(slots: &[TimeSlot], time: TimeOfDay) -> Option<&TimeSlot> {
    slots.iter().find(|s| s.time == time)
}

pub fn is_time_available(slots: &[TimeSlot], time: TimeOfDay) -> bool {
    slot_at(slots, time).is_some_and(|s| s.available)
}
