use crate::model::{DaySchedule, Minutes, TimeOfDay, clamp_minutes};

/// Candidate start times for a day, ascending.
///
/// A slot is emitted every `slot_duration_minutes` from `start`, strictly before `end`.
/// Starts inside `[break_start, break_end)` are skipped and generation resumes at
/// `break_end`. A slot may run past `end`; bookability is decided by the checker.
/// Degenerate input (`start >= end`, zero duration) yields nothing.
pub fn generate_slots(day: &DaySchedule, slot_duration_minutes: u32) -> Vec<TimeOfDay> {
    let hours = day.hours();
    if hours.is_empty() || slot_duration_minutes == 0 {
        return Vec::new();
    }
    let step: Minutes = clamp_minutes(slot_duration_minutes);
    let pause = day.break_span();

    let mut slots = Vec::with_capacity((hours.duration() / step + 1) as usize);
    let mut current = hours.start;
    while current < hours.end {
        if let Some(b) = pause
            && b.contains_instant(current)
        {
            current = b.end;
            continue;
        }
        // `current` < end <= 23:59, so this always converts.
        if let Some(t) = TimeOfDay::from_minutes(current) {
            slots.push(t);
        }
        current = current.saturating_add(step);
    }
    slots
}
