//! Crime taxonomy for the two detection-source families.
//!
//! Two classifiers feed this service: a frame classifier emitting small
//! integer codes and a scene classifier emitting free-text status strings.
//! Both are folded into one `CrimeCode` so the rest of the pipeline is
//! family-agnostic.

mod numeric;
mod text;

use serde::{Deserialize, Serialize};
use std::fmt;

/// A crime code as emitted by a detection source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CrimeCode {
    /// Frame-classifier output (small integer code).
    Numeric(i64),
    /// Scene-classifier output (status string).
    Text(String),
}

impl fmt::Display for CrimeCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CrimeCode::Numeric(code) => write!(f, "{}", code),
            CrimeCode::Text(code) => write!(f, "{}", code),
        }
    }
}

/// Policy for crime codes the taxonomy does not recognize.
///
/// The detection models occasionally emit codes outside their published
/// set; whether those warrant notification is an operator decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyPolicy {
    /// Unrecognized codes are treated as notify-worthy.
    FailOpen,
    /// Unrecognized codes are dropped without notification.
    FailClosed,
}

/// Resolve a code to its human-readable crime name.
///
/// Total function: unmapped numeric codes resolve to "Unknown Crime",
/// unmapped text codes resolve to the raw code string.
pub fn classify(code: &CrimeCode) -> String {
    match code {
        CrimeCode::Numeric(n) => numeric::display_name(*n)
            .unwrap_or("Unknown Crime")
            .to_string(),
        CrimeCode::Text(s) => text::display_name(s)
            .map(|name| name.to_string())
            .unwrap_or_else(|| s.clone()),
    }
}

/// Decide whether a code warrants notification.
///
/// Each family has exactly one sentinel meaning "no criminal activity";
/// the sentinel never notifies. Every other recognized code does.
/// Unrecognized codes follow the configured policy.
pub fn should_notify(code: &CrimeCode, policy: NotifyPolicy) -> bool {
    let (recognized, sentinel) = match code {
        CrimeCode::Numeric(n) => (numeric::display_name(*n).is_some(), numeric::is_sentinel(*n)),
        CrimeCode::Text(s) => (text::display_name(s).is_some(), text::is_sentinel(s)),
    };

    if sentinel {
        return false;
    }
    if recognized {
        return true;
    }
    policy == NotifyPolicy::FailOpen
}
