//! HTTP route handlers.

pub mod admin;
pub mod events;
pub mod public;
