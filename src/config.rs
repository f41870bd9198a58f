//! Configuration module for CrimeWatch.
//!
//! Loads configuration from environment variables with sensible defaults.

use std::env;
use std::time::Duration;

use crate::taxonomy::NotifyPolicy;

/// Server configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// HTTP port for the web server (default: 8080)
    pub http_port: u16,
    /// Path to the SQLite user store file (default: "crimewatch.db")
    pub db_path: String,
    /// Statically configured notification addresses, used when a request
    /// carries no explicit recipients (default: empty)
    pub notification_emails: Vec<String>,
    /// Policy for crime codes the taxonomy does not recognize
    /// (default: fail-open)
    pub notify_policy: NotifyPolicy,
    /// Per-recipient dispatch timeout in seconds (default: 10.0)
    pub dispatch_timeout: f64,
    /// Messaging provider endpoint (default: EmailJS send API)
    pub email_api_url: String,
    /// Messaging provider service id
    pub email_service_id: String,
    /// Messaging provider template id
    pub email_template_id: String,
    /// Messaging provider user id
    pub email_user_id: String,
    /// Messaging provider private key
    pub email_private_key: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_port: 8080,
            db_path: "crimewatch.db".to_string(),
            notification_emails: Vec::new(),
            notify_policy: NotifyPolicy::FailOpen,
            dispatch_timeout: 10.0,
            email_api_url: "https://api.emailjs.com/api/v1.0/email/send".to_string(),
            email_service_id: String::new(),
            email_template_id: String::new(),
            email_user_id: String::new(),
            email_private_key: String::new(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `CRIMEWATCH_HTTP_PORT`: HTTP port (default: 8080)
    /// - `CRIMEWATCH_DB_PATH`: user store file path (default: "crimewatch.db")
    /// - `CRIMEWATCH_NOTIFICATION_EMAILS`: comma-separated fallback recipients
    /// - `CRIMEWATCH_NOTIFY_POLICY`: "fail-open" or "fail-closed"
    /// - `CRIMEWATCH_DISPATCH_TIMEOUT_SECS`: per-recipient timeout in seconds
    /// - `CRIMEWATCH_EMAIL_API_URL`: messaging provider endpoint
    /// - `CRIMEWATCH_EMAIL_SERVICE_ID`, `CRIMEWATCH_EMAIL_TEMPLATE_ID`,
    ///   `CRIMEWATCH_EMAIL_USER_ID`, `CRIMEWATCH_EMAIL_PRIVATE_KEY`:
    ///   messaging provider credentials
    pub fn load() -> Self {
        let mut cfg = Self::default();

        if let Ok(port_str) = env::var("CRIMEWATCH_HTTP_PORT") {
            if let Ok(port) = port_str.parse() {
                cfg.http_port = port;
            }
        }

        if let Ok(db_path) = env::var("CRIMEWATCH_DB_PATH") {
            cfg.db_path = db_path;
        }

        if let Ok(list) = env::var("CRIMEWATCH_NOTIFICATION_EMAILS") {
            cfg.notification_emails = parse_address_list(&list);
        }

        if let Ok(policy) = env::var("CRIMEWATCH_NOTIFY_POLICY") {
            cfg.notify_policy = match policy.as_str() {
                "fail-closed" => NotifyPolicy::FailClosed,
                _ => NotifyPolicy::FailOpen,
            };
        }

        if let Ok(timeout_str) = env::var("CRIMEWATCH_DISPATCH_TIMEOUT_SECS") {
            if let Ok(timeout) = timeout_str.parse() {
                cfg.dispatch_timeout = timeout;
            }
        }

        if let Ok(url) = env::var("CRIMEWATCH_EMAIL_API_URL") {
            cfg.email_api_url = url;
        }
        if let Ok(id) = env::var("CRIMEWATCH_EMAIL_SERVICE_ID") {
            cfg.email_service_id = id;
        }
        if let Ok(id) = env::var("CRIMEWATCH_EMAIL_TEMPLATE_ID") {
            cfg.email_template_id = id;
        }
        if let Ok(id) = env::var("CRIMEWATCH_EMAIL_USER_ID") {
            cfg.email_user_id = id;
        }
        if let Ok(key) = env::var("CRIMEWATCH_EMAIL_PRIVATE_KEY") {
            cfg.email_private_key = key;
        }

        cfg
    }

    /// Per-recipient dispatch timeout as a `Duration`.
    pub fn dispatch_timeout(&self) -> Duration {
        let secs = if self.dispatch_timeout <= 0.0 {
            10.0
        } else {
            self.dispatch_timeout
        };
        Duration::from_secs_f64(secs)
    }
}

/// Split a comma-separated address list, dropping empty entries.
fn parse_address_list(list: &str) -> Vec<String> {
    list.split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect()
}
