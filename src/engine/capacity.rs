use std::collections::BTreeMap;

use crate::model::*;

/// A commitment as the checker sees it: the ride itself plus its buffer-widened span.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Occupancy {
    pub ride: Span,
    pub effective: Span,
}

/// Buffered spans for all commitments, sorted by effective start.
/// Commitments whose effective span is empty hold no vehicle and are dropped.
pub fn occupancy(commitments: &[ExistingCommitment], policy: &BookingPolicy) -> Vec<Occupancy> {
    let mut occupied: Vec<Occupancy> = commitments
        .iter()
        .map(|c| {
            let ride = c.span();
            Occupancy {
                ride,
                effective: ride.buffered(policy.buffer_before_minutes, policy.buffer_after_minutes),
            }
        })
        .filter(|o| !o.effective.is_empty())
        .collect();
    occupied.sort_by_key(|o| (o.effective.start, o.effective.end));
    occupied
}

/// Commitments contending with a buffered candidate span, in start order.
pub fn contenders<'a>(occupied: &'a [Occupancy], candidate: &Span) -> impl Iterator<Item = &'a Occupancy> {
    // Everything at index >= right_bound starts at or after candidate.end → can't overlap.
    let right_bound = occupied.partition_point(|o| o.effective.start < candidate.end);
    occupied[..right_bound]
        .iter()
        .filter(move |o| o.effective.overlaps(candidate))
}

/// Sweep line: the most commitments simultaneously active inside `window`.
pub fn peak_concurrency(occupied: &[Occupancy], window: &Span) -> u32 {
    let mut events: Vec<(Minutes, i32)> = Vec::new();
    for o in contenders(occupied, window) {
        events.push((o.effective.start.max(window.start), 1));
        events.push((o.effective.end.min(window.end), -1));
    }
    // Ends sort before starts at the same instant: half-open spans that touch don't stack.
    events.sort_by(|a, b| a.0.cmp(&b.0).then(a.1.cmp(&b.1)));

    let mut count: i32 = 0;
    let mut peak: i32 = 0;
    for (_, delta) in &events {
        count += delta;
        peak = peak.max(count);
    }
    peak as u32
}

/// Peak vehicles in use per hour of the working day.
pub fn hourly_utilization(occupied: &[Occupancy], hours: &Span) -> BTreeMap<u8, u32> {
    let mut utilization = BTreeMap::new();
    if hours.is_empty() {
        return utilization;
    }
    let first = hours.start / 60;
    let last = (hours.end - 1) / 60;
    for hour in first..=last.min(23) {
        let bucket = Span::new(hour * 60, hour * 60 + 60);
        let used = peak_concurrency(occupied, &bucket);
        if used > 0 {
            utilization.insert(hour as u8, used);
        }
    }
    utilization
}

/// Merge sorted overlapping/adjacent spans into disjoint spans.
pub fn merge_overlapping(sorted: &[Span]) -> Vec<Span> {
    let mut merged: Vec<Span> = Vec::new();
    for &span in sorted {
        if let Some(last) = merged.last_mut()
            && span.start <= last.end
        {
            last.end = last.end.max(span.end);
            continue;
        }
        merged.push(span);
    }
    merged
}

/// Time ranges in which every vehicle is taken (effective count >= capacity).
pub fn saturated_spans(occupied: &[Occupancy], capacity: u32) -> Vec<Span> {
    if occupied.is_empty() {
        return Vec::new();
    }
    if capacity <= 1 {
        let spans: Vec<Span> = occupied.iter().map(|o| o.effective).collect();
        return merge_overlapping(&spans);
    }

    let mut events: Vec<(Minutes, i32)> = Vec::with_capacity(occupied.len() * 2);
    for o in occupied {
        events.push((o.effective.start, 1));
        events.push((o.effective.end, -1));
    }
    events.sort_by(|a, b| a.0.cmp(&b.0).then(a.1.cmp(&b.1)));

    let mut result = Vec::new();
    let mut count: u32 = 0;
    let mut saturated_start: Option<Minutes> = None;

    for (time, delta) in &events {
        if *delta > 0 {
            count += 1;
        } else {
            count -= 1;
        }

        if count >= capacity && saturated_start.is_none() {
            saturated_start = Some(*time);
        } else if count < capacity
            && let Some(start) = saturated_start.take()
            && *time > start
        {
            result.push(Span::new(start, *time));
        }
    }

    result
}
