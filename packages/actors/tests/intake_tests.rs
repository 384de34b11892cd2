use std::collections::{HashMap, HashSet};
use std::error::Error;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;

use chrono::Utc;
use school_core::{Registration, RegistrationRecord, RegistrationStatus, SchoolEvent};
use tokio::time::timeout;

use actors::{
    GatewayError, GatewayFuture, IntakeConfig, IntakeError, IntakeService, RegistrationGateway,
    SubmitOutcome, start_intake,
};

/// In-memory gateway with scriptable insert failures.
#[derive(Default)]
struct MemoryGateway {
    inner: Arc<GatewayInner>,
}

#[derive(Default)]
struct GatewayInner {
    next_id: AtomicI64,
    emails: Mutex<HashMap<String, i64>>,
    failures: Mutex<FailureScript>,
}

#[derive(Default)]
struct FailureScript {
    /// Every insert fails while set.
    fail_all: bool,
    /// Emails whose next insert fails once, then succeeds.
    fail_once: HashSet<String>,
}

impl MemoryGateway {
    fn new() -> Self {
        Self::default()
    }

    fn fail_all(&self, failing: bool) {
        self.inner.failures.lock().unwrap().fail_all = failing;
    }

    fn fail_once(&self, email: &str) {
        self.inner
            .failures
            .lock()
            .unwrap()
            .fail_once
            .insert(email.to_string());
    }

    fn handle(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl RegistrationGateway for MemoryGateway {
    fn insert(&self, registration: Registration) -> GatewayFuture<RegistrationRecord> {
        let inner = self.inner.clone();
        Box::pin(async move {
            {
                let mut failures = inner.failures.lock().unwrap();
                if failures.fail_all || failures.fail_once.remove(&registration.email) {
                    return Err(GatewayError::Storage("injected failure".to_string()));
                }
            }

            let mut emails = inner.emails.lock().unwrap();
            if emails.contains_key(&registration.email) {
                return Err(GatewayError::Constraint(format!(
                    "email already registered: {}",
                    registration.email
                )));
            }

            let id = inner.next_id.fetch_add(1, Ordering::SeqCst) + 1;
            emails.insert(registration.email.clone(), id);

            let now = Utc::now();
            Ok(RegistrationRecord {
                id,
                registration,
                status: RegistrationStatus::Pending,
                created_at: now,
                updated_at: now,
            })
        })
    }

    fn find_by_email(&self, email: String) -> GatewayFuture<Option<i64>> {
        let inner = self.inner.clone();
        Box::pin(async move { Ok(inner.emails.lock().unwrap().get(&email).copied()) })
    }
}

fn registration(email: &str) -> Registration {
    Registration {
        first_name: "Eric".to_string(),
        last_name: "Mugisha".to_string(),
        date_of_birth: "2011-06-02".to_string(),
        gender: "male".to_string(),
        email: email.to_string(),
        phone: "+250700000010".to_string(),
        address: "Huye".to_string(),
        program: "primary".to_string(),
        grade: "4".to_string(),
        parent_name: None,
        parent_phone: None,
        previous_school: None,
        medical_info: None,
        newsletter: false,
    }
}

async fn start_test_intake(
    gateway: &MemoryGateway,
    tick_interval: Duration,
) -> Result<Arc<IntakeService>, Box<dyn Error>> {
    let intake = start_intake(
        Arc::new(gateway.handle()),
        IntakeConfig {
            tick_interval,
            metrics_capacity: 8,
        },
    )
    .await?;
    Ok(intake)
}

const FAST_TICK: Duration = Duration::from_millis(10);
/// Effectively disables the drain worker for tests that inspect the queue.
const PARKED_TICK: Duration = Duration::from_secs(3600);

async fn next_event(
    rx: &mut tokio::sync::mpsc::UnboundedReceiver<SchoolEvent>,
) -> Result<SchoolEvent, Box<dyn Error>> {
    Ok(timeout(Duration::from_secs(2), rx.recv())
        .await?
        .ok_or("event channel closed")?)
}

fn event_email(event: &SchoolEvent) -> String {
    match event {
        SchoolEvent::Registration { registration } => registration.registration.email.clone(),
    }
}

#[tokio::test]
async fn immediate_insert_records_metric_and_broadcasts() -> Result<(), Box<dyn Error>> {
    let gateway = MemoryGateway::new();
    let intake = start_test_intake(&gateway, FAST_TICK).await?;
    let (_sub, mut rx) = intake.hub().subscribe();

    let outcome = intake.submit(registration("fast@example.com")).await?;
    let id = match outcome {
        SubmitOutcome::Inserted { id, .. } => id,
        other => panic!("expected immediate insert, got {other:?}"),
    };
    assert_eq!(id, 1);

    let metrics = intake.metrics().snapshot(10);
    assert_eq!(metrics.len(), 1);
    assert!(metrics[0].is_success());
    assert_eq!(metrics[0].registration_id, Some(1));
    assert_eq!(metrics[0].email, "fast@example.com");

    let event = next_event(&mut rx).await?;
    assert_eq!(event_email(&event), "fast@example.com");

    Ok(())
}

#[tokio::test]
async fn duplicate_email_short_circuits() -> Result<(), Box<dyn Error>> {
    let gateway = MemoryGateway::new();
    let intake = start_test_intake(&gateway, FAST_TICK).await?;

    intake.submit(registration("dup@example.com")).await?;
    let second = intake.submit(registration("dup@example.com")).await;
    assert!(matches!(second, Err(IntakeError::DuplicateEmail)));

    // The rejected submission never reached the insert: no new metric,
    // nothing queued.
    assert_eq!(intake.metrics().len(), 1);
    assert_eq!(intake.queue_len().await?, 0);

    Ok(())
}

#[tokio::test]
async fn queued_jobs_report_positions_and_preview() -> Result<(), Box<dyn Error>> {
    let gateway = MemoryGateway::new();
    let intake = start_test_intake(&gateway, PARKED_TICK).await?;

    gateway.fail_all(true);
    let emails = ["a@example.com", "b@example.com", "c@example.com"];
    for (i, email) in emails.iter().enumerate() {
        let outcome = intake.submit(registration(email)).await?;
        let queue_position = match outcome {
            SubmitOutcome::Queued { queue_position, .. } => queue_position,
            other => panic!("expected queued outcome, got {other:?}"),
        };
        assert_eq!(queue_position, i + 1);
    }

    assert_eq!(intake.queue_len().await?, 3);

    // Preview is oldest first and honors the limit.
    let preview = intake.queue_preview(2).await?;
    assert_eq!(preview.len(), 2);
    assert_eq!(preview[0].email, "a@example.com");
    assert_eq!(preview[1].email, "b@example.com");

    // One failure metric per immediate attempt.
    let metrics = intake.metrics().snapshot(10);
    assert_eq!(metrics.len(), 3);
    assert!(metrics.iter().all(|m| !m.is_success()));

    Ok(())
}

#[tokio::test]
async fn failed_insert_falls_back_to_queue_and_drains() -> Result<(), Box<dyn Error>> {
    let gateway = MemoryGateway::new();
    let intake = start_test_intake(&gateway, FAST_TICK).await?;
    let (_sub, mut rx) = intake.hub().subscribe();

    gateway.fail_once("slow@example.com");
    let outcome = intake.submit(registration("slow@example.com")).await?;
    let job_id = match outcome {
        SubmitOutcome::Queued { job_id, .. } => job_id,
        other => panic!("expected queued outcome, got {other:?}"),
    };

    // The worker's retry succeeds and broadcasts the committed row.
    let event = next_event(&mut rx).await?;
    assert_eq!(event_email(&event), "slow@example.com");
    assert_eq!(intake.queue_len().await?, 0);

    // Two metrics for the submission, both carrying its job id:
    // the failed immediate attempt and the successful retry.
    let metrics = intake.metrics().snapshot(10);
    assert_eq!(metrics.len(), 2);
    assert!(metrics[0].is_success());
    assert!(!metrics[1].is_success());
    assert_eq!(metrics[0].job_id, job_id);
    assert_eq!(metrics[1].job_id, job_id);

    Ok(())
}

#[tokio::test]
async fn queued_jobs_drain_in_submission_order() -> Result<(), Box<dyn Error>> {
    let gateway = MemoryGateway::new();
    let intake = start_test_intake(&gateway, FAST_TICK).await?;
    let (_sub, mut rx) = intake.hub().subscribe();

    let emails = ["a@example.com", "b@example.com", "c@example.com"];
    for email in emails {
        gateway.fail_once(email);
        let outcome = intake.submit(registration(email)).await?;
        assert!(matches!(outcome, SubmitOutcome::Queued { .. }));
    }

    for expected in emails {
        let event = next_event(&mut rx).await?;
        assert_eq!(event_email(&event), expected);
    }

    assert_eq!(intake.queue_len().await?, 0);

    Ok(())
}

#[tokio::test]
async fn dropped_job_is_not_retried() -> Result<(), Box<dyn Error>> {
    let gateway = MemoryGateway::new();
    let intake = start_test_intake(&gateway, FAST_TICK).await?;

    gateway.fail_all(true);
    intake.submit(registration("doomed@example.com")).await?;

    // The worker's retry also fails; the job is dropped with a metric.
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(intake.queue_len().await?, 0);

    let metrics = intake.metrics().snapshot(10);
    assert_eq!(metrics.len(), 2);
    assert!(metrics.iter().all(|m| !m.is_success()));

    // Nothing further happens once the queue is empty.
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(intake.metrics().len(), 2);

    Ok(())
}

#[tokio::test]
async fn shutdown_stops_queue_and_worker() -> Result<(), Box<dyn Error>> {
    let gateway = MemoryGateway::new();
    let intake = start_test_intake(&gateway, PARKED_TICK).await?;

    gateway.fail_all(true);
    intake.submit(registration("pending@example.com")).await?;
    assert_eq!(intake.queue_len().await?, 1);

    intake.shutdown();

    // The mailbox is serial: the shutdown message is processed before any
    // later request, so the queue is unreachable from here on.
    let stopped = intake.queue_len().await;
    assert!(stopped.is_err());

    Ok(())
}

#[tokio::test]
async fn job_ids_are_unique_and_monotonic() -> Result<(), Box<dyn Error>> {
    let gateway = MemoryGateway::new();
    let intake = start_test_intake(&gateway, FAST_TICK).await?;

    for n in 1..=4 {
        intake
            .submit(registration(&format!("u{n}@example.com")))
            .await?;
    }

    // Newest first: job ids descend.
    let ids: Vec<u64> = intake
        .metrics()
        .snapshot(10)
        .iter()
        .map(|m| m.job_id.0)
        .collect();
    assert_eq!(ids, vec![4, 3, 2, 1]);

    Ok(())
}
