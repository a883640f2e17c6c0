//! Application state shared across handlers

use chrono::{DateTime, Utc};

use crate::inference::ChurnService;

/// Read-only after startup, so handlers share it without locks.
#[derive(Debug)]
pub struct AppState {
    pub service: ChurnService,
    pub max_batch_size: usize,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(service: ChurnService, max_batch_size: usize) -> Self {
        Self {
            service,
            max_batch_size,
            started_at: Utc::now(),
        }
    }

    pub fn uptime_secs(&self) -> i64 {
        Utc::now().signed_duration_since(self.started_at).num_seconds()
    }
}
