//! Application State

use std::sync::Arc;

use chrono::{DateTime, Utc};
use pulse_engine::PulseAgent;

use crate::scheduler::ScheduleConfig;

/// Shared state for the status server
#[derive(Clone)]
pub struct AppState {
    /// The running agent (ledger, last outcomes)
    pub agent: Arc<PulseAgent>,

    pub schedule: Arc<ScheduleConfig>,

    /// Posts go to the in-memory recorder instead of X
    pub dry_run: bool,

    pub started_at: DateTime<Utc>,
}
