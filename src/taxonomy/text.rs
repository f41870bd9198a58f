//! Text crime family (scene-classifier output).

/// Sentinel status meaning no criminal activity was detected.
pub const NO_ACTIVITY: &str = "No criminal activity detected";

/// Resolve a scene-classifier status string to its crime name, if recognized.
pub fn display_name(code: &str) -> Option<&'static str> {
    match code {
        "No criminal activity detected" => Some("No Crime"),
        "Robbery detected" => Some("Robbery"),
        "Violence detected" => Some("Violence"),
        "Shoplifting detected" => Some("Shoplifting"),
        "Drug abuse detected" => Some("Drug Abuse"),
        "Arson detected" => Some("Arson"),
        _ => None,
    }
}

/// Whether this status is the family's "no activity" sentinel.
pub fn is_sentinel(code: &str) -> bool {
    code == NO_ACTIVITY
}
