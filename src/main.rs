use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};
use serde::Deserialize;
use tracing::info;

use ridebook::clock::{Clock, FixedClock, SystemClock};
use ridebook::config::Settings;
use ridebook::engine::availability_stats;
use ridebook::ledger::{BookingLedger, OrganizationPolicy};
use ridebook::model::{BookingPolicy, BookingRecord, WeeklySchedule};
use ridebook::notify::NotifyHub;

/// Input file: organizations with their rules, plus already-booked rides.
#[derive(Debug, Deserialize)]
struct Fixture {
    /// Pins the clock; the host's local time when absent.
    #[serde(default)]
    now: Option<NaiveDateTime>,
    organizations: Vec<FixtureOrganization>,
    #[serde(default)]
    bookings: Vec<BookingRecord>,
}

#[derive(Debug, Deserialize)]
struct FixtureOrganization {
    id: String,
    #[serde(default)]
    policy: Option<BookingPolicy>,
    #[serde(default)]
    schedule: Option<WeeklySchedule>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let settings = Settings::from_env()?;
    ridebook::observability::init(settings.metrics_port)?;

    let mut args = std::env::args().skip(1);
    let Some(path) = args.next() else {
        eprintln!("usage: ridebook <fixture.json> [YYYY-MM-DD]");
        std::process::exit(2);
    };
    let fixture: Fixture = serde_json::from_str(&std::fs::read_to_string(&path)?)?;

    let clock: Arc<dyn Clock> = match fixture.now {
        Some(now) => Arc::new(FixedClock(now)),
        None => Arc::new(SystemClock),
    };
    let date: NaiveDate = match args.next() {
        Some(raw) => raw.parse()?,
        None => clock.now().date(),
    };

    let ledger = BookingLedger::new(clock, Arc::new(NotifyHub::new()));
    for org in fixture.organizations {
        let config = OrganizationPolicy {
            policy: org.policy.unwrap_or_else(|| settings.default_policy.clone()),
            schedule: org.schedule,
        };
        ledger.register_organization(&org.id, config)?;
    }
    let restored = fixture.bookings.len();
    for record in fixture.bookings {
        ledger.restore(record).await?;
    }
    info!("loaded {} organizations, {restored} bookings from {path}", ledger.organizations().len());

    let mut report = BTreeMap::new();
    for org in ledger.organizations() {
        let availability = ledger.availability(&org, date).await?;
        let stats = availability_stats(&availability.slots);
        info!(
            organization_id = %org,
            %date,
            available = stats.available,
            total = stats.total,
            "availability"
        );
        report.insert(org, availability);
    }
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
