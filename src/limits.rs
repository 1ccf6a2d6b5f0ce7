//! Hard caps enforced at the ledger boundary.

pub const MAX_ORGANIZATIONS: usize = 10_000;
pub const MAX_ORGANIZATION_ID_LEN: usize = 128;
pub const MAX_LABEL_LEN: usize = 1024;
pub const MAX_BOOKINGS_PER_DAY: usize = 10_000;

/// Upper bound for slot durations, buffers and ride durations (one day).
pub const MAX_DURATION_MINUTES: u32 = 24 * 60;
pub const MAX_ADVANCE_BOOKING_DAYS: u32 = 366;
pub const MAX_VEHICLE_CAPACITY: u32 = 10_000;

/// Widest multi-day availability request.
pub const MAX_QUERY_DAYS: u32 = 62;
