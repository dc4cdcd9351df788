use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

use super::{
    ActionAck, ActionOutcome, ActionTransport, ActionTrigger, DispatchError, EndpointTable,
    DISPATCHER_AGENT,
};
use crate::db::SharedStore;
use crate::models::{ActionKind, ActionStatus};

pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(2);

/// Bounded retry with a fixed delay between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            delay: DEFAULT_RETRY_DELAY,
        }
    }
}

/// Fire-and-forget action delivery with retries.
///
/// `trigger` returns at once; a detached task on `runtime` performs the
/// outbound calls and writes exactly one terminal record under
/// [`DISPATCHER_AGENT`]. In-flight deliveries are not tracked, so a
/// process exit drops them.
pub struct ActionDispatcher {
    store: Arc<dyn SharedStore>,
    transport: Arc<dyn ActionTransport>,
    endpoints: Arc<EndpointTable>,
    retry: RetryPolicy,
    runtime: Handle,
}

impl ActionDispatcher {
    pub fn new(
        store: Arc<dyn SharedStore>,
        transport: Arc<dyn ActionTransport>,
        endpoints: EndpointTable,
        retry: RetryPolicy,
        runtime: Handle,
    ) -> Self {
        Self {
            store,
            transport,
            endpoints: Arc::new(endpoints),
            retry,
            runtime,
        }
    }

    /// Start a background delivery and hand back its join handle.
    /// The handle resolves to the record that was written.
    pub fn spawn(&self, action: ActionKind, payload: serde_json::Value) -> JoinHandle<serde_json::Value> {
        let store = Arc::clone(&self.store);
        let transport = Arc::clone(&self.transport);
        let endpoints = Arc::clone(&self.endpoints);
        let retry = self.retry;

        self.runtime.spawn(async move {
            let record = match deliver(transport.as_ref(), &endpoints, retry, action, payload).await {
                Ok(outcome) | Err(Delivery::Exhausted(outcome)) => outcome.into_record(),
                Err(Delivery::Unroutable(e)) => {
                    tracing::warn!(action = %action, error = %e, "Action not routable");
                    json!({ "error": e.to_string() })
                }
            };

            // SQLite writes block; keep them off the async workers.
            let row = record.clone();
            match tokio::task::spawn_blocking(move || store.record_fields(DISPATCHER_AGENT, &row)).await {
                Ok(Ok(_)) => {}
                Ok(Err(e)) => {
                    tracing::warn!(action = %action, error = %e, "Failed to record action outcome");
                }
                Err(e) => {
                    tracing::warn!(action = %action, error = %e, "Action outcome write task failed");
                }
            }
            record
        })
    }
}

impl ActionTrigger for ActionDispatcher {
    fn trigger(&self, action: ActionKind, payload: serde_json::Value) -> ActionAck {
        tracing::info!(action = %action, "Action triggered");
        drop(self.spawn(action, payload));
        ActionAck::triggered(action)
    }
}

enum Delivery {
    Unroutable(DispatchError),
    Exhausted(ActionOutcome),
}

async fn deliver(
    transport: &dyn ActionTransport,
    endpoints: &EndpointTable,
    retry: RetryPolicy,
    action: ActionKind,
    payload: serde_json::Value,
) -> Result<ActionOutcome, Delivery> {
    let url = endpoints
        .url_for(action)
        .ok_or_else(|| Delivery::Unroutable(DispatchError::UnknownActionKind(action.to_string())))?;

    let max_attempts = retry.max_attempts.max(1);
    let mut attempts = 0;

    loop {
        attempts += 1;
        let error = match transport.post_json(url, &payload).await {
            Ok(200) => {
                tracing::info!(action = %action, attempts, "Action delivered");
                return Ok(ActionOutcome {
                    status: ActionStatus::Success,
                    action,
                    payload,
                    attempts,
                });
            }
            Ok(status) => DispatchError::Status(status),
            Err(e) => e,
        };

        if attempts >= max_attempts {
            let exhausted = DispatchError::Exhausted { action, attempts };
            tracing::warn!(action = %action, last_error = %error, "{exhausted}");
            return Err(Delivery::Exhausted(ActionOutcome {
                status: ActionStatus::Failed,
                action,
                payload,
                attempts,
            }));
        }

        tracing::debug!(
            action = %action,
            attempt = attempts,
            error = %error,
            "Action attempt failed, retrying"
        );
        tokio::time::sleep(retry.delay).await;
    }
}
