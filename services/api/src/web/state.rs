//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::config::Config;
use course_summary_core::ports::{DatabaseService, SummaryGenerationService};
use std::sync::Arc;

/// The shared application state, created once at startup and passed to all handlers.
///
/// The summarizer is held here as an injected trait object rather than a
/// module-level singleton so tests can swap in a fake.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<dyn DatabaseService>,
    pub summarizer: Arc<dyn SummaryGenerationService>,
    pub config: Arc<Config>,
}
