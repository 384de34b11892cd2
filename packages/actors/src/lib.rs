//! Actor system for the registration intake core.
//!
//! This crate provides the Ractor-based intake path, fallback queue,
//! drain worker, and event fan-out.
//!
//! # Architecture
//!
//! - `IntakeService` - Entry point: duplicate check, timed immediate
//!   insert, queue fallback
//! - `RegistrationQueueActor` - Owns the in-memory FIFO of jobs whose
//!   immediate insert failed
//! - `DrainWorker` - Tick-driven actor retrying one queued job per tick
//! - `BroadcastHub` - Fans committed registrations out to live subscribers
//! - `RegistrationGateway` - Seam to the persistence layer
//!
//! # Usage
//!
//! ```ignore
//! use std::sync::Arc;
//! use actors::{IntakeConfig, SurrealGateway, start_intake};
//!
//! let intake = start_intake(Arc::new(SurrealGateway), IntakeConfig::default()).await?;
//! let outcome = intake.submit(registration).await?;
//! ```

mod gateway;
mod hub;
mod intake;
mod messages;
mod queue_actor;
mod worker_actor;

pub use gateway::{GatewayError, GatewayFuture, RegistrationGateway, SurrealGateway};
pub use hub::{BroadcastHub, SubscriberId};
pub use intake::{IntakeConfig, IntakeError, IntakeService, SubmitOutcome, start_intake};
pub use messages::{QueueMessage, WorkerMessage};
pub use queue_actor::RegistrationQueueActor;
pub use worker_actor::{DrainWorker, WorkerArgs};

/// Re-export ractor types for convenience.
pub use ractor::{Actor, ActorRef, RpcReplyPort};
