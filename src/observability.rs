use std::net::SocketAddr;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

use crate::ledger::StoreError;
use crate::model::Availability;

// ── RED metrics (request-driven) ────────────────────────────────

/// Counter: availability queries. Labels: outcome.
pub const AVAILABILITY_QUERIES_TOTAL: &str = "ridebook_availability_queries_total";

/// Histogram: availability query latency in seconds.
pub const AVAILABILITY_DURATION_SECONDS: &str = "ridebook_availability_duration_seconds";

/// Counter: booking attempts. Labels: outcome.
pub const BOOKINGS_TOTAL: &str = "ridebook_bookings_total";

/// Histogram: booking latency in seconds, lock wait included.
pub const BOOKING_DURATION_SECONDS: &str = "ridebook_booking_duration_seconds";

// ── USE metrics (resource utilization) ──────────────────────────

/// Gauge: registered organizations.
pub const ORGANIZATIONS_ACTIVE: &str = "ridebook_organizations_active";

/// Install Prometheus metrics exporter on the given port. No-op if port is None.
pub fn init(port: Option<u16>) -> Result<(), BuildError> {
    let Some(port) = port else { return Ok(()) };
    let addr: SocketAddr = ([0, 0, 0, 0], port).into();
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!("metrics endpoint: http://0.0.0.0:{port}/metrics");
    Ok(())
}

/// Outcome label for a computed availability.
pub fn outcome_label(availability: &Availability) -> &'static str {
    match &availability.policy_error {
        Some(_) => "not_bookable",
        None if availability.slots.iter().any(|s| s.available) => "open",
        None => "full",
    }
}

/// Outcome label for a failed ledger call.
pub fn rejection_label(err: &StoreError) -> &'static str {
    match err {
        StoreError::NotFound(_) => "not_found",
        StoreError::AlreadyExists(_) => "already_exists",
        StoreError::UnknownOrganization(_) => "unknown_organization",
        StoreError::Policy(_) => "not_bookable",
        StoreError::SlotUnavailable(_) => "slot_unavailable",
        StoreError::OutsideWorkingHours(_) => "outside_hours",
        StoreError::InvalidInput(_) => "invalid_input",
        StoreError::LimitExceeded(_) => "limit_exceeded",
    }
}
