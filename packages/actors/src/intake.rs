//! The intake path: duplicate check, timed immediate insert, queue fallback.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use ractor::{Actor, ActorRef};
use school_core::{
    DEFAULT_METRICS_CAPACITY, InsertMetric, JobId, JobPreview, MetricsRing, Registration,
    RegistrationJob, SchoolEvent,
};

use crate::gateway::RegistrationGateway;
use crate::hub::BroadcastHub;
use crate::messages::{QueueMessage, WorkerMessage};
use crate::queue_actor::RegistrationQueueActor;
use crate::worker_actor::{DrainWorker, WorkerArgs};

/// Outcome of a registration submission.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// The immediate insert committed a row.
    Inserted { id: i64, duration_ms: u64 },
    /// The immediate insert failed; the job waits in the fallback queue.
    Queued { job_id: JobId, queue_position: usize },
}

/// Errors surfaced to the submitter.
#[derive(Debug, thiserror::Error)]
pub enum IntakeError {
    /// A registration with this email already exists.
    #[error("Email already registered")]
    DuplicateEmail,

    /// The queue actor could not be reached.
    #[error("Intake unavailable: {0}")]
    Unavailable(String),
}

/// Configuration for the intake core.
#[derive(Debug, Clone)]
pub struct IntakeConfig {
    /// Drain cadence of the queue worker.
    pub tick_interval: Duration,
    /// Capacity of the metrics ring.
    pub metrics_capacity: usize,
}

impl Default for IntakeConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_millis(150),
            metrics_capacity: DEFAULT_METRICS_CAPACITY,
        }
    }
}

/// Entry point for registration submissions.
///
/// Owns the gateway, the queue actor reference, the metrics ring, the
/// broadcast hub, and the monotonic job-id counter. Built once at startup
/// via [`start_intake`] and shared behind an `Arc`.
pub struct IntakeService {
    gateway: Arc<dyn RegistrationGateway>,
    queue: ActorRef<QueueMessage>,
    worker: ActorRef<WorkerMessage>,
    metrics: Arc<MetricsRing>,
    hub: Arc<BroadcastHub>,
    next_job_id: AtomicU64,
}

impl IntakeService {
    /// Submit a validated registration.
    ///
    /// Exactly one metric is recorded per call that reaches the insert,
    /// and exactly one event is broadcast per committed row.
    pub async fn submit(&self, registration: Registration) -> Result<SubmitOutcome, IntakeError> {
        // Advisory duplicate check. A gateway failure here must not block
        // the submission; the unique index still guards the insert itself.
        match self
            .gateway
            .find_by_email(registration.email.clone())
            .await
        {
            Ok(Some(existing)) => {
                tracing::info!(
                    "Rejected duplicate registration for {} (existing id {existing})",
                    registration.email
                );
                return Err(IntakeError::DuplicateEmail);
            }
            Ok(None) => {}
            Err(error) => {
                tracing::warn!("Duplicate check failed, proceeding with insert: {error}");
            }
        }

        let job_id = self.next_job_id();
        let start = Instant::now();
        let insert = self.gateway.insert(registration.clone()).await;
        let duration_ms = start.elapsed().as_millis() as u64;

        match insert {
            Ok(record) => {
                let id = record.id;
                tracing::info!(
                    "Registration {id} committed in {duration_ms}ms ({})",
                    record.registration.email
                );
                self.metrics.record(InsertMetric::success(
                    job_id,
                    record.registration.email.clone(),
                    duration_ms,
                    id,
                ));
                self.hub
                    .publish(&SchoolEvent::Registration { registration: record });
                Ok(SubmitOutcome::Inserted { id, duration_ms })
            }
            Err(error) => {
                tracing::error!(
                    "Immediate insert failed for {} after {duration_ms}ms: {error}",
                    registration.email
                );
                self.metrics.record(InsertMetric::failure(
                    job_id,
                    registration.email.clone(),
                    duration_ms,
                    error.to_string(),
                ));

                let job = RegistrationJob::new(job_id, registration);
                let queue_position = match ractor::rpc::call(
                    &self.queue,
                    |reply| QueueMessage::Enqueue {
                        job: Box::new(job),
                        reply,
                    },
                    None,
                )
                .await
                {
                    Ok(ractor::rpc::CallResult::Success(position)) => position,
                    other => {
                        return Err(IntakeError::Unavailable(format!(
                            "queue enqueue failed: {other:?}"
                        )));
                    }
                };

                Ok(SubmitOutcome::Queued {
                    job_id,
                    queue_position,
                })
            }
        }
    }

    /// Current number of jobs in the fallback queue.
    pub async fn queue_len(&self) -> Result<usize, IntakeError> {
        match ractor::rpc::call(&self.queue, |reply| QueueMessage::Len { reply }, None).await {
            Ok(ractor::rpc::CallResult::Success(len)) => Ok(len),
            other => Err(IntakeError::Unavailable(format!(
                "queue length failed: {other:?}"
            ))),
        }
    }

    /// Bounded preview of pending jobs, oldest first.
    pub async fn queue_preview(&self, limit: usize) -> Result<Vec<JobPreview>, IntakeError> {
        match ractor::rpc::call(
            &self.queue,
            |reply| QueueMessage::Snapshot { limit, reply },
            None,
        )
        .await
        {
            Ok(ractor::rpc::CallResult::Success(preview)) => Ok(preview),
            other => Err(IntakeError::Unavailable(format!(
                "queue snapshot failed: {other:?}"
            ))),
        }
    }

    /// The insert-attempt metrics ring.
    pub fn metrics(&self) -> &MetricsRing {
        &self.metrics
    }

    /// The live event hub.
    pub fn hub(&self) -> &Arc<BroadcastHub> {
        &self.hub
    }

    /// Stop the drain worker and the queue actor.
    ///
    /// Jobs still pending in the queue are lost; the queue actor logs how
    /// many it dropped.
    pub fn shutdown(&self) {
        if self.worker.send_message(WorkerMessage::Shutdown).is_err() {
            tracing::debug!("Drain worker already stopped");
        }
        if self.queue.send_message(QueueMessage::Shutdown).is_err() {
            tracing::debug!("Registration queue already stopped");
        }
    }

    fn next_job_id(&self) -> JobId {
        JobId(self.next_job_id.fetch_add(1, Ordering::Relaxed) + 1)
    }
}

/// Spawn the queue actor and drain worker and wire up the intake service.
pub async fn start_intake(
    gateway: Arc<dyn RegistrationGateway>,
    config: IntakeConfig,
) -> Result<Arc<IntakeService>, ractor::SpawnErr> {
    let metrics = Arc::new(MetricsRing::new(config.metrics_capacity));
    let hub = Arc::new(BroadcastHub::new());

    let (queue, _queue_handle) = Actor::spawn(None, RegistrationQueueActor, ()).await?;

    let (worker, _worker_handle) = Actor::spawn(
        None,
        DrainWorker,
        WorkerArgs {
            queue: queue.clone(),
            gateway: gateway.clone(),
            metrics: metrics.clone(),
            hub: hub.clone(),
            tick_interval: config.tick_interval,
        },
    )
    .await?;

    Ok(Arc::new(IntakeService {
        gateway,
        queue,
        worker,
        metrics,
        hub,
        next_job_id: AtomicU64::new(0),
    }))
}
