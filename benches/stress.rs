use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use chrono::{Days, NaiveDate, NaiveDateTime};

use ridebook::clock::FixedClock;
use ridebook::engine::compute_availability;
use ridebook::ledger::{BookingLedger, BookingRequest, OrganizationPolicy};
use ridebook::model::*;
use ridebook::notify::NotifyHub;

fn percentile(sorted: &[Duration], p: f64) -> Duration {
    if sorted.is_empty() {
        return Duration::ZERO;
    }
    let idx = ((sorted.len() as f64) * p / 100.0) as usize;
    sorted[idx.min(sorted.len() - 1)]
}

fn print_latency(label: &str, latencies: &mut [Duration]) {
    if latencies.is_empty() {
        println!("  {label}: no samples");
        return;
    }
    latencies.sort();
    let total: Duration = latencies.iter().sum();
    let avg = total / latencies.len() as u32;
    println!("  {label}:");
    println!(
        "    n={}, avg={:.3}ms, p50={:.3}ms, p95={:.3}ms, p99={:.3}ms, max={:.3}ms",
        latencies.len(),
        avg.as_secs_f64() * 1000.0,
        percentile(latencies, 50.0).as_secs_f64() * 1000.0,
        percentile(latencies, 95.0).as_secs_f64() * 1000.0,
        percentile(latencies, 99.0).as_secs_f64() * 1000.0,
        latencies[latencies.len() - 1].as_secs_f64() * 1000.0,
    );
}

fn t(h: u8, m: u8) -> TimeOfDay {
    TimeOfDay::new(h, m).unwrap()
}

fn base_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 3, 3).unwrap()
}

fn bench_now() -> NaiveDateTime {
    base_date().and_hms_opt(0, 0, 0).unwrap()
}

/// Round-the-clock fleet so every slot of the day is a valid booking target.
fn policy(capacity: u32) -> OrganizationPolicy {
    OrganizationPolicy {
        policy: BookingPolicy {
            slot_duration_minutes: 15,
            buffer_before_minutes: 5,
            buffer_after_minutes: 5,
            minimum_notice_hours: 0,
            max_advance_booking_days: 365,
            vehicle_capacity: capacity,
        },
        schedule: Some(WeeklySchedule::uniform(DaySchedule::new(t(0, 0), t(23, 45)))),
    }
}

fn setup(organizations: usize, capacity: u32) -> Arc<BookingLedger> {
    let ledger = BookingLedger::new(Arc::new(FixedClock(bench_now())), Arc::new(NotifyHub::new()));
    for i in 0..organizations {
        ledger
            .register_organization(&format!("org_{i}"), policy(capacity))
            .unwrap();
    }
    println!("  created {organizations} organizations (capacity {capacity})");
    Arc::new(ledger)
}

fn request(org: &str, day: u64, slot: u32) -> BookingRequest {
    let minutes = (slot % 95) as Minutes * 15;
    BookingRequest {
        organization_id: org.to_string(),
        date: base_date() + Days::new(1 + day),
        start: TimeOfDay::from_minutes(minutes).unwrap(),
        duration_minutes: Some(10),
        label: None,
    }
}

fn phase0_engine_only() {
    let p = policy(5).policy;
    let week = WeeklySchedule::uniform(DaySchedule::standard());
    let commitments: Vec<ExistingCommitment> = (0..200)
        .map(|i| ExistingCommitment::new(TimeOfDay::from_minutes(480 + (i * 3) % 600).unwrap(), 30))
        .collect();
    let date = base_date() + Days::new(1);

    let n = 5000;
    let mut latencies = Vec::with_capacity(n);
    let start = Instant::now();
    for _ in 0..n {
        let s = Instant::now();
        let a = compute_availability(date, "bench", &p, Some(&week), &commitments, bench_now());
        latencies.push(s.elapsed());
        std::hint::black_box(a);
    }
    let elapsed = start.elapsed();
    println!(
        "  {n} computations over {} commitments in {:.2}s = {:.0} ops/sec",
        commitments.len(),
        elapsed.as_secs_f64(),
        n as f64 / elapsed.as_secs_f64()
    );
    print_latency("compute_availability", &mut latencies);
}

async fn phase1_sequential(ledger: &BookingLedger) {
    let n = 2000;
    let mut latencies = Vec::with_capacity(n);
    let start = Instant::now();

    for i in 0..n {
        let s = Instant::now();
        ledger
            .book(request("org_0", (i / 95) as u64, i as u32))
            .await
            .unwrap();
        latencies.push(s.elapsed());
    }

    let elapsed = start.elapsed();
    let ops = n as f64 / elapsed.as_secs_f64();
    println!("  {n} bookings in {:.2}s = {ops:.0} ops/sec", elapsed.as_secs_f64());
    print_latency("write latency", &mut latencies);
}

async fn phase2_concurrent(ledger: Arc<BookingLedger>, organizations: usize) {
    let n_tasks = 10;
    let n_per_task = 200;

    let start = Instant::now();
    let mut handles = Vec::new();

    for i in 0..n_tasks {
        let ledger = ledger.clone();
        let org = format!("org_{}", 1 + i % (organizations - 1));
        handles.push(tokio::spawn(async move {
            let mut accepted = 0usize;
            for j in 0..n_per_task {
                if ledger.book(request(&org, (j / 95) as u64, j as u32)).await.is_ok() {
                    accepted += 1;
                }
            }
            accepted
        }));
    }

    let mut accepted = 0;
    for h in handles {
        accepted += h.await.unwrap();
    }

    let elapsed = start.elapsed();
    let total = n_tasks * n_per_task;
    let ops = total as f64 / elapsed.as_secs_f64();
    println!(
        "  {n_tasks} tasks x {n_per_task} bookings = {total} total ({accepted} accepted) in {:.2}s = {ops:.0} ops/sec",
        elapsed.as_secs_f64()
    );
}

async fn phase3_read_under_load(ledger: Arc<BookingLedger>) {
    // Writers keep one date busy while readers query it.
    let stop = Arc::new(AtomicBool::new(false));
    let mut writer_handles = Vec::new();
    for w in 0..5u32 {
        let ledger = ledger.clone();
        let stop = stop.clone();
        writer_handles.push(tokio::spawn(async move {
            let mut i = 0u32;
            while !stop.load(Ordering::Relaxed) {
                let _ = ledger.book(request("org_0", 0, w * 19 + i)).await;
                i += 1;
                tokio::task::yield_now().await;
            }
        }));
    }

    let n_readers = 10;
    let reads_per_reader = 500;
    let date = base_date() + Days::new(1);
    let mut reader_handles = Vec::new();

    for _ in 0..n_readers {
        let ledger = ledger.clone();
        reader_handles.push(tokio::spawn(async move {
            let mut latencies = Vec::with_capacity(reads_per_reader);
            for _ in 0..reads_per_reader {
                let s = Instant::now();
                ledger.availability("org_0", date).await.unwrap();
                latencies.push(s.elapsed());
            }
            latencies
        }));
    }

    let mut all_latencies = Vec::new();
    for h in reader_handles {
        all_latencies.extend(h.await.unwrap());
    }

    stop.store(true, Ordering::Relaxed);
    for h in writer_handles {
        let _ = h.await;
    }

    print_latency("availability query", &mut all_latencies);
}

async fn phase4_last_vehicle_race(capacity: u32) {
    let ledger = setup(1, capacity);
    let n_contenders = 500;
    let success = Arc::new(AtomicUsize::new(0));

    let start = Instant::now();
    let mut handles = Vec::new();
    for _ in 0..n_contenders {
        let ledger = ledger.clone();
        let success = success.clone();
        handles.push(tokio::spawn(async move {
            if ledger.book(request("org_0", 0, 40)).await.is_ok() {
                success.fetch_add(1, Ordering::Relaxed);
            }
        }));
    }
    for h in handles {
        let _ = h.await;
    }

    let elapsed = start.elapsed();
    let ok = success.load(Ordering::Relaxed);
    println!(
        "  {n_contenders} contenders for one slot: {ok}/{capacity} vehicles taken in {:.2}s",
        elapsed.as_secs_f64()
    );
    assert_eq!(ok, capacity as usize, "capacity overrun");
}

#[tokio::main]
async fn main() {
    let organizations = 11;

    println!("=== ridebook stress benchmark ===\n");

    println!("[phase 0] engine throughput");
    phase0_engine_only();

    println!("\n[setup]");
    let ledger = setup(organizations, 10);

    println!("\n[phase 1] sequential write throughput");
    phase1_sequential(&ledger).await;

    println!("\n[phase 2] concurrent write throughput");
    phase2_concurrent(ledger.clone(), organizations).await;

    println!("\n[phase 3] read latency under write load");
    phase3_read_under_load(ledger).await;

    println!("\n[phase 4] last-vehicle race");
    phase4_last_vehicle_race(5).await;

    println!("\n=== benchmark complete ===");
}
