//! Queue actor owning the in-memory registration fallback queue.

use std::collections::VecDeque;

use ractor::{Actor, ActorProcessingErr, ActorRef};
use school_core::RegistrationJob;

use crate::messages::QueueMessage;

/// State for the registration queue actor.
#[derive(Default)]
pub struct RegistrationQueueState {
    /// Pending jobs in arrival order.
    pending: VecDeque<RegistrationJob>,
}

/// Actor owning the FIFO queue of registrations awaiting a retry insert.
///
/// The actor mailbox serializes enqueues from the intake path against
/// dequeues from the drain worker, so neither side can observe a torn
/// queue or reorder jobs.
pub struct RegistrationQueueActor;

impl Actor for RegistrationQueueActor {
    type Msg = QueueMessage;
    type State = RegistrationQueueState;
    type Arguments = ();

    async fn pre_start(
        &self,
        _myself: ActorRef<Self::Msg>,
        _args: Self::Arguments,
    ) -> Result<Self::State, ActorProcessingErr> {
        tracing::info!("Starting registration queue");
        Ok(RegistrationQueueState::default())
    }

    async fn handle(
        &self,
        myself: ActorRef<Self::Msg>,
        message: Self::Msg,
        state: &mut Self::State,
    ) -> Result<(), ActorProcessingErr> {
        match message {
            QueueMessage::Enqueue { job, reply } => {
                tracing::info!("Job {} queued for retry ({})", job.id, job.payload.email);
                state.pending.push_back(*job);
                let _ = reply.send(state.pending.len());
            }

            QueueMessage::TakeNext { reply } => {
                let _ = reply.send(state.pending.pop_front());
            }

            QueueMessage::Len { reply } => {
                let _ = reply.send(state.pending.len());
            }

            QueueMessage::Snapshot { limit, reply } => {
                let preview = state
                    .pending
                    .iter()
                    .take(limit)
                    .map(RegistrationJob::preview)
                    .collect();
                let _ = reply.send(preview);
            }

            QueueMessage::Shutdown => {
                if !state.pending.is_empty() {
                    tracing::warn!(
                        "Shutting down registration queue with {} pending jobs",
                        state.pending.len()
                    );
                }
                myself.stop(None);
            }
        }

        Ok(())
    }
}
