//! Recipient resolution for notification fan-out.

use crate::config::ServerConfig;
use crate::db::{DbError, Store};

/// Resolve the notification target list for an event.
///
/// Precedence, first non-empty source wins: explicit request targets, the
/// configured address list, then every registered user address. Sources are
/// never merged. An empty result means there is nobody to notify; the
/// caller decides whether that is acceptable.
pub fn resolve_targets(
    explicit: &[String],
    config: &ServerConfig,
    store: &Store,
) -> Result<Vec<String>, DbError> {
    let explicit: Vec<String> = explicit
        .iter()
        .map(|a| a.trim())
        .filter(|a| !a.is_empty())
        .map(|a| a.to_string())
        .collect();
    if !explicit.is_empty() {
        return Ok(explicit);
    }

    if !config.notification_emails.is_empty() {
        return Ok(config.notification_emails.clone());
    }

    store.notification_addresses()
}
