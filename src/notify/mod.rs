//! Notification fan-out.
//!
//! Ties the taxonomy, recipient resolution, per-recipient dispatch, and the
//! alert log together into the ingestion pipeline. Dispatches to distinct
//! recipients run concurrently and fail independently; the pipeline waits
//! for all of them before logging and reporting the aggregate.

mod resolver;
mod transport;

pub use resolver::*;
pub use transport::*;

use crate::alerts::{Alert, AlertLog, NewAlert, Severity};
use crate::config::ServerConfig;
use crate::db::{DbError, Store};
use crate::taxonomy::{self, CrimeCode};

use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::task::JoinSet;

/// Outcome of a single dispatch attempt.
#[derive(Debug, Clone, Serialize)]
pub struct DispatchResult {
    pub address: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// A crime event accepted for ingestion.
#[derive(Debug, Clone)]
pub struct CrimeEvent {
    pub code: CrimeCode,
    pub summary: Option<String>,
    pub explicit_targets: Vec<String>,
}

/// Result of running an event through the ingestion pipeline.
#[derive(Debug)]
pub enum IngestOutcome {
    /// The event was not notify-worthy; nothing was dispatched or logged.
    Skipped { crime_type: String },
    /// The event required notification but no recipients could be resolved.
    NoRecipients { crime_type: String },
    /// Notifications were dispatched and the event was logged.
    Dispatched {
        alert: Alert,
        results: Vec<DispatchResult>,
    },
}

/// Ingestion error types.
#[derive(Error, Debug)]
pub enum IngestError {
    #[error("user store error: {0}")]
    Store(#[from] DbError),
}

/// Dispatch one message per target, concurrently, and collect the results
/// in target order.
///
/// Every attempt is bounded by `timeout` and failures are captured into the
/// result rather than propagated, so one bad recipient can neither stall
/// nor abort its siblings.
pub async fn dispatch_all(
    transport: Arc<dyn Transport>,
    targets: &[String],
    message: &OutgoingMessage,
    timeout: Duration,
) -> Vec<DispatchResult> {
    let mut set = JoinSet::new();

    for (index, target) in targets.iter().enumerate() {
        let transport = transport.clone();
        let target = target.clone();
        let message = message.clone();

        set.spawn(async move {
            let result = match tokio::time::timeout(timeout, transport.send(&target, &message)).await
            {
                Ok(Ok(())) => DispatchResult {
                    address: target,
                    success: true,
                    error: None,
                },
                Ok(Err(e)) => {
                    tracing::warn!("Dispatch to {} failed: {}", target, e);
                    DispatchResult {
                        address: target,
                        success: false,
                        error: Some(e.to_string()),
                    }
                }
                Err(_) => {
                    tracing::warn!("Dispatch to {} timed out", target);
                    DispatchResult {
                        address: target,
                        success: false,
                        error: Some(TransportError::Timeout(timeout).to_string()),
                    }
                }
            };
            (index, result)
        });
    }

    let mut results: Vec<Option<DispatchResult>> = vec![None; targets.len()];
    while let Some(joined) = set.join_next().await {
        match joined {
            Ok((index, result)) => results[index] = Some(result),
            Err(e) => tracing::error!("Dispatch task failed: {}", e),
        }
    }

    results
        .into_iter()
        .enumerate()
        .map(|(index, result)| {
            result.unwrap_or_else(|| DispatchResult {
                address: targets[index].clone(),
                success: false,
                error: Some("dispatch task failed".to_string()),
            })
        })
        .collect()
}

/// Run one event through the ingestion pipeline:
/// classify, decide notify-worthiness, resolve recipients, dispatch to all,
/// and record the alert.
pub async fn process_event(
    transport: Arc<dyn Transport>,
    store: &Store,
    alerts: &AlertLog,
    config: &ServerConfig,
    event: CrimeEvent,
) -> Result<IngestOutcome, IngestError> {
    let crime_type = taxonomy::classify(&event.code);

    if !taxonomy::should_notify(&event.code, config.notify_policy) {
        tracing::info!("Event {} is not notify-worthy, skipping", event.code);
        return Ok(IngestOutcome::Skipped { crime_type });
    }

    let targets = resolve_targets(&event.explicit_targets, config, store)?;
    if targets.is_empty() {
        tracing::warn!("No recipients resolvable for notify-worthy event {}", event.code);
        return Ok(IngestOutcome::NoRecipients { crime_type });
    }

    let message = OutgoingMessage::new(&crime_type, event.summary.as_deref());
    let results = dispatch_all(transport, &targets, &message, config.dispatch_timeout()).await;
    let sent = results.iter().filter(|r| r.success).count();

    let alert = alerts.append(NewAlert {
        crime_type_id: event.code.to_string(),
        crime_type: crime_type.clone(),
        summary: message.body.clone(),
        severity: Severity::for_event(&crime_type, &message.body),
        notifications_sent: sent,
    });

    tracing::info!(
        "Alert {}: {}/{} notifications delivered",
        alert.id,
        sent,
        results.len()
    );

    Ok(IngestOutcome::Dispatched { alert, results })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::taxonomy::NotifyPolicy;

    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Transport that fails for a fixed set of addresses and counts calls.
    struct ScriptedTransport {
        fail: Vec<String>,
        delay: Option<Duration>,
        calls: AtomicUsize,
    }

    impl ScriptedTransport {
        fn succeeding() -> Self {
            Self::failing(&[])
        }

        fn failing(addresses: &[&str]) -> Self {
            Self {
                fail: addresses.iter().map(|s| s.to_string()).collect(),
                delay: None,
                calls: AtomicUsize::new(0),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Transport for ScriptedTransport {
        async fn send(&self, to: &str, _message: &OutgoingMessage) -> Result<(), TransportError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            if self.fail.iter().any(|a| a == to) {
                return Err(TransportError::Status {
                    status: 422,
                    body: "rejected recipient".to_string(),
                });
            }
            Ok(())
        }
    }

    fn event(code: CrimeCode, targets: &[&str]) -> CrimeEvent {
        CrimeEvent {
            code,
            summary: None,
            explicit_targets: targets.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn empty_store() -> Store {
        Store::new(":memory:").unwrap()
    }

    #[tokio::test]
    async fn test_sentinel_never_dispatches_or_logs() {
        let transport = Arc::new(ScriptedTransport::succeeding());
        let store = empty_store();
        let alerts = AlertLog::new();
        let config = ServerConfig::default();

        let outcome = process_event(
            transport.clone(),
            &store,
            &alerts,
            &config,
            CrimeEvent {
                code: CrimeCode::Text("No criminal activity detected".to_string()),
                summary: Some("x".to_string()),
                explicit_targets: vec!["a@x.com".to_string()],
            },
        )
        .await
        .unwrap();

        assert!(matches!(outcome, IngestOutcome::Skipped { .. }));
        assert_eq!(transport.calls(), 0);
        assert!(alerts.is_empty());
    }

    #[tokio::test]
    async fn test_all_dispatches_succeed() {
        let transport = Arc::new(ScriptedTransport::succeeding());
        let store = empty_store();
        let alerts = AlertLog::new();
        let config = ServerConfig::default();

        let outcome = process_event(
            transport.clone(),
            &store,
            &alerts,
            &config,
            event(CrimeCode::Numeric(8), &["a@x.com", "b@x.com", "c@x.com"]),
        )
        .await
        .unwrap();

        let (alert, results) = match outcome {
            IngestOutcome::Dispatched { alert, results } => (alert, results),
            other => panic!("unexpected outcome: {:?}", other),
        };

        assert_eq!(results.len(), 3);
        assert!(results.iter().all(|r| r.success));
        assert_eq!(alert.notifications_sent, 3);
        assert_eq!(alert.crime_type, "Robbery");
        assert_eq!(transport.calls(), 3);
        assert_eq!(alerts.len(), 1);
    }

    #[tokio::test]
    async fn test_partial_failure_is_isolated_and_counted() {
        let transport = Arc::new(ScriptedTransport::failing(&["b@x.com"]));
        let store = empty_store();
        let alerts = AlertLog::new();
        let config = ServerConfig::default();

        let outcome = process_event(
            transport.clone(),
            &store,
            &alerts,
            &config,
            event(CrimeCode::Numeric(1), &["a@x.com", "b@x.com"]),
        )
        .await
        .unwrap();

        let (alert, results) = match outcome {
            IngestOutcome::Dispatched { alert, results } => (alert, results),
            other => panic!("unexpected outcome: {:?}", other),
        };

        // Results keep recipient order
        assert_eq!(results[0].address, "a@x.com");
        assert!(results[0].success);
        assert!(results[0].error.is_none());

        assert_eq!(results[1].address, "b@x.com");
        assert!(!results[1].success);
        assert!(results[1].error.as_deref().unwrap_or("").contains("422"));

        assert_eq!(alert.notifications_sent, 1);
        assert_eq!(alerts.len(), 1);
    }

    #[tokio::test]
    async fn test_all_failures_still_log_the_alert() {
        let transport = Arc::new(ScriptedTransport::failing(&["a@x.com", "b@x.com"]));
        let store = empty_store();
        let alerts = AlertLog::new();
        let config = ServerConfig::default();

        let outcome = process_event(
            transport,
            &store,
            &alerts,
            &config,
            event(CrimeCode::Numeric(8), &["a@x.com", "b@x.com"]),
        )
        .await
        .unwrap();

        let (alert, results) = match outcome {
            IngestOutcome::Dispatched { alert, results } => (alert, results),
            other => panic!("unexpected outcome: {:?}", other),
        };

        assert!(results.iter().all(|r| !r.success));
        assert_eq!(alert.notifications_sent, 0);
        assert_eq!(alerts.len(), 1);
    }

    #[tokio::test]
    async fn test_no_resolvable_recipients() {
        let transport = Arc::new(ScriptedTransport::succeeding());
        let store = empty_store();
        let alerts = AlertLog::new();
        let config = ServerConfig::default();

        let outcome = process_event(
            transport.clone(),
            &store,
            &alerts,
            &config,
            event(CrimeCode::Numeric(1), &[]),
        )
        .await
        .unwrap();

        assert!(matches!(outcome, IngestOutcome::NoRecipients { .. }));
        assert_eq!(transport.calls(), 0);
        assert!(alerts.is_empty());
    }

    #[tokio::test]
    async fn test_slow_recipient_times_out_as_failure() {
        let transport = Arc::new(ScriptedTransport {
            fail: Vec::new(),
            delay: Some(Duration::from_millis(500)),
            calls: AtomicUsize::new(0),
        });
        let store = empty_store();
        let alerts = AlertLog::new();
        let config = ServerConfig {
            dispatch_timeout: 0.05,
            ..ServerConfig::default()
        };

        let outcome = process_event(
            transport,
            &store,
            &alerts,
            &config,
            event(CrimeCode::Numeric(8), &["slow@x.com"]),
        )
        .await
        .unwrap();

        let (alert, results) = match outcome {
            IngestOutcome::Dispatched { alert, results } => (alert, results),
            other => panic!("unexpected outcome: {:?}", other),
        };

        assert!(!results[0].success);
        assert!(results[0].error.as_deref().unwrap_or("").contains("timed out"));
        assert_eq!(alert.notifications_sent, 0);
    }

    #[tokio::test]
    async fn test_unrecognized_code_respects_policy() {
        let store = empty_store();
        let config_open = ServerConfig::default();
        let config_closed = ServerConfig {
            notify_policy: NotifyPolicy::FailClosed,
            ..ServerConfig::default()
        };

        let transport = Arc::new(ScriptedTransport::succeeding());
        let alerts = AlertLog::new();
        let outcome = process_event(
            transport.clone(),
            &store,
            &alerts,
            &config_open,
            event(CrimeCode::Numeric(99), &["a@x.com"]),
        )
        .await
        .unwrap();
        assert!(matches!(outcome, IngestOutcome::Dispatched { .. }));
        assert_eq!(transport.calls(), 1);

        let transport = Arc::new(ScriptedTransport::succeeding());
        let alerts = AlertLog::new();
        let outcome = process_event(
            transport.clone(),
            &store,
            &alerts,
            &config_closed,
            event(CrimeCode::Numeric(99), &["a@x.com"]),
        )
        .await
        .unwrap();
        assert!(matches!(outcome, IngestOutcome::Skipped { .. }));
        assert_eq!(transport.calls(), 0);
        assert!(alerts.is_empty());
    }

    #[tokio::test]
    async fn test_severity_recorded_from_markers() {
        let transport = Arc::new(ScriptedTransport::succeeding());
        let store = empty_store();
        let alerts = AlertLog::new();
        let config = ServerConfig::default();

        process_event(
            transport.clone(),
            &store,
            &alerts,
            &config,
            event(
                CrimeCode::Text("Violence detected".to_string()),
                &["a@x.com"],
            ),
        )
        .await
        .unwrap();

        process_event(
            transport,
            &store,
            &alerts,
            &config,
            event(
                CrimeCode::Text("Shoplifting detected".to_string()),
                &["a@x.com"],
            ),
        )
        .await
        .unwrap();

        let listed = alerts.list(10);
        assert_eq!(listed[0].severity, crate::alerts::Severity::Warning);
        assert_eq!(listed[1].severity, crate::alerts::Severity::Error);
    }

    #[tokio::test]
    async fn test_default_summary_carries_crime_name() {
        let transport = Arc::new(ScriptedTransport::succeeding());
        let store = empty_store();
        let alerts = AlertLog::new();
        let config = ServerConfig::default();

        let outcome = process_event(
            transport,
            &store,
            &alerts,
            &config,
            event(CrimeCode::Numeric(8), &["a@x.com"]),
        )
        .await
        .unwrap();

        let alert = match outcome {
            IngestOutcome::Dispatched { alert, .. } => alert,
            other => panic!("unexpected outcome: {:?}", other),
        };

        assert!(alert.summary.contains("Robbery"));
        assert_eq!(alert.crime_type_id, "8");
    }
}
