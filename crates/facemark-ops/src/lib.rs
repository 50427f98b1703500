//! Operational helpers: logging setup and the in-memory activity log.

use std::{collections::VecDeque, sync::Arc};

use facemark_types::{
    activity::{ActivityEvent, ActivityKind},
    config::OpsConfig,
    FacemarkError, Result,
};
use tokio::sync::Mutex;
use tracing::debug;
use tracing_subscriber::{fmt, EnvFilter};

pub fn init_tracing(config: &OpsConfig) -> Result<()> {
    let filter = EnvFilter::try_new(config.log_level.clone())
        .or_else(|_| EnvFilter::try_new("info"))
        .map_err(|err| FacemarkError::Ops(format!("failed to create log filter: {err}")))?;

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|err| FacemarkError::Ops(format!("tracing init error: {err}")))?;
    Ok(())
}

pub const MAX_ACTIVITY_EVENTS: usize = 512;

/// Most recent activity of the current process; nothing is persisted and the
/// oldest events are dropped once the log is full.
#[derive(Clone)]
pub struct ActivityLog {
    events: Arc<Mutex<VecDeque<ActivityEvent>>>,
    capacity: usize,
}

impl Default for ActivityLog {
    fn default() -> Self {
        Self::with_capacity(MAX_ACTIVITY_EVENTS)
    }
}

impl ActivityLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            events: Arc::new(Mutex::new(VecDeque::with_capacity(capacity))),
            capacity,
        }
    }

    pub async fn record(&self, event: ActivityEvent) {
        debug!("Activity {:?}: {:?}", event.kind, event.payload);
        let mut events = self.events.lock().await;
        if events.len() == self.capacity {
            events.pop_front();
        }
        events.push_back(event);
    }

    pub async fn snapshot(&self) -> Vec<ActivityEvent> {
        self.events.lock().await.iter().cloned().collect()
    }

    pub async fn count(&self, kind: ActivityKind) -> usize {
        self.events
            .lock()
            .await
            .iter()
            .filter(|event| event.kind == kind)
            .count()
    }
}
