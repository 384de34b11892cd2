//! Shared state handed to every handler.

use std::sync::Arc;

use actors::IntakeService;

use crate::config::Config;

/// Application state, built once at startup.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub intake: Arc<IntakeService>,
}
