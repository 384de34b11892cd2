//! Message types for actor communication.

use ractor::RpcReplyPort;
use school_core::{JobPreview, RegistrationJob};

/// Messages for the RegistrationQueueActor.
#[derive(Debug)]
pub enum QueueMessage {
    /// Append a job to the tail of the queue. Replies with the job's
    /// 1-based position.
    Enqueue {
        job: Box<RegistrationJob>,
        reply: RpcReplyPort<usize>,
    },

    /// Detach and return the job at the head of the queue, if any.
    TakeNext {
        reply: RpcReplyPort<Option<RegistrationJob>>,
    },

    /// Current number of pending jobs.
    Len { reply: RpcReplyPort<usize> },

    /// Bounded preview of pending jobs, oldest first.
    Snapshot {
        limit: usize,
        reply: RpcReplyPort<Vec<JobPreview>>,
    },

    /// Shutdown the queue gracefully.
    Shutdown,
}

/// Messages for the DrainWorker.
#[derive(Debug)]
pub enum WorkerMessage {
    /// Periodic tick: attempt to drain one job.
    Tick,

    /// Shutdown the worker.
    Shutdown,
}
