//! Drain worker actor retrying queued registration inserts.

use std::sync::Arc;
use std::time::{Duration, Instant};

use ractor::{Actor, ActorProcessingErr, ActorRef};
use school_core::{InsertMetric, MetricsRing, SchoolEvent};

use crate::gateway::RegistrationGateway;
use crate::hub::BroadcastHub;
use crate::messages::{QueueMessage, WorkerMessage};

/// How long a tick waits on the queue actor before giving up.
const TAKE_TIMEOUT: Duration = Duration::from_secs(5);

/// State for the drain worker actor.
pub struct DrainWorkerState {
    queue: ActorRef<QueueMessage>,
    gateway: Arc<dyn RegistrationGateway>,
    metrics: Arc<MetricsRing>,
    hub: Arc<BroadcastHub>,
}

/// Drain worker arguments.
pub struct WorkerArgs {
    pub queue: ActorRef<QueueMessage>,
    pub gateway: Arc<dyn RegistrationGateway>,
    pub metrics: Arc<MetricsRing>,
    pub hub: Arc<BroadcastHub>,
    pub tick_interval: Duration,
}

/// Worker actor that drains the fallback queue, one job per tick.
///
/// Ticks are processed serially through the actor mailbox, so at most one
/// queue-originated insert is in flight at any time.
pub struct DrainWorker;

impl Actor for DrainWorker {
    type Msg = WorkerMessage;
    type State = DrainWorkerState;
    type Arguments = WorkerArgs;

    async fn pre_start(
        &self,
        myself: ActorRef<Self::Msg>,
        args: Self::Arguments,
    ) -> Result<Self::State, ActorProcessingErr> {
        tracing::info!(
            "Starting drain worker (tick every {}ms)",
            args.tick_interval.as_millis()
        );

        // Start the tick loop
        let myself_clone = myself.clone();
        let tick_interval = args.tick_interval;
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(tick_interval);
            loop {
                interval.tick().await;
                if myself_clone.send_message(WorkerMessage::Tick).is_err() {
                    break;
                }
            }
        });

        Ok(DrainWorkerState {
            queue: args.queue,
            gateway: args.gateway,
            metrics: args.metrics,
            hub: args.hub,
        })
    }

    async fn handle(
        &self,
        myself: ActorRef<Self::Msg>,
        message: Self::Msg,
        state: &mut Self::State,
    ) -> Result<(), ActorProcessingErr> {
        match message {
            WorkerMessage::Tick => {
                let result = ractor::rpc::call(
                    &state.queue,
                    |reply| QueueMessage::TakeNext { reply },
                    Some(TAKE_TIMEOUT),
                )
                .await;

                let job = match result {
                    Ok(ractor::rpc::CallResult::Success(Some(job))) => job,
                    Ok(ractor::rpc::CallResult::Success(None)) => return Ok(()),
                    other => {
                        tracing::warn!("Registration queue unavailable: {other:?}");
                        return Ok(());
                    }
                };

                let start = Instant::now();
                let insert = state.gateway.insert(job.payload.clone()).await;
                let duration_ms = start.elapsed().as_millis() as u64;

                match insert {
                    Ok(record) => {
                        tracing::info!(
                            "Job {} drained into registration {} in {}ms",
                            job.id,
                            record.id,
                            duration_ms
                        );
                        state.metrics.record(InsertMetric::success(
                            job.id,
                            record.registration.email.clone(),
                            duration_ms,
                            record.id,
                        ));
                        state
                            .hub
                            .publish(&SchoolEvent::Registration { registration: record });
                    }
                    Err(error) => {
                        // No requeue: a job whose retry fails is dropped.
                        tracing::error!("Queued insert failed for job {}: {error}", job.id);
                        state.metrics.record(InsertMetric::failure(
                            job.id,
                            job.payload.email.clone(),
                            duration_ms,
                            error.to_string(),
                        ));
                    }
                }
            }

            WorkerMessage::Shutdown => {
                tracing::info!("Shutting down drain worker");
                myself.stop(None);
            }
        }

        Ok(())
    }
}
