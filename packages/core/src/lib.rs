//! Core domain types for the school administration backend.
//!
//! This crate contains shared types used across all packages:
//! - Registration payloads, records, and statuses
//! - RegistrationJob for intake work waiting in the fallback queue
//! - InsertMetric and MetricsRing for insert-attempt accounting
//! - Events for real-time updates
//! - ContactMessage for the public contact form

mod contact;
mod events;
mod job;
mod metrics;
mod registration;

pub use contact::{ContactMessage, MessageStatus};
pub use events::SchoolEvent;
pub use job::{JobId, JobPreview, RegistrationJob};
pub use metrics::{DEFAULT_METRICS_CAPACITY, InsertMetric, MetricsRing};
pub use registration::{InvalidStatus, Registration, RegistrationRecord, RegistrationStatus};
