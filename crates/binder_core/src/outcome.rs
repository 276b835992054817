use std::fmt;

/// Result of fetching and extracting one chapter. Exactly one variant per
/// item; no variant carries a partial content string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Page fetched and a content region extracted.
    Success { title: String, content: String },
    /// Anti-automation challenge instead of content (HTTP 403).
    Blocked,
    /// Any other non-success HTTP status.
    TransportStatus { code: u16 },
    /// Page fetched but no candidate content selector matched.
    ContentMissing,
    /// Network or body-read failure; message preserved verbatim.
    TransportFailure { message: String },
}

impl FetchOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, FetchOutcome::Success { .. })
    }

    /// Blocked outcomes go to the skipped list, everything else that is not
    /// a success goes to the incomplete list.
    pub fn is_blocked(&self) -> bool {
        matches!(self, FetchOutcome::Blocked)
    }

    /// Stable reason string recorded in the failure report. `None` for
    /// successes. These strings are user-facing; the retry parser only
    /// relies on the URL marker, never on reason text.
    pub fn failure_reason(&self) -> Option<String> {
        match self {
            FetchOutcome::Success { .. } => None,
            FetchOutcome::Blocked => Some("CAPTCHA/blocked".to_string()),
            FetchOutcome::TransportStatus { code } => Some(format!("HTTP status {code}")),
            FetchOutcome::ContentMissing => Some("no content region matched".to_string()),
            FetchOutcome::TransportFailure { message } => {
                Some(format!("transport failure: {message}"))
            }
        }
    }
}

impl fmt::Display for FetchOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchOutcome::Success { title, .. } => write!(f, "success ({title})"),
            FetchOutcome::Blocked => write!(f, "blocked"),
            FetchOutcome::TransportStatus { code } => write!(f, "http status {code}"),
            FetchOutcome::ContentMissing => write!(f, "content missing"),
            FetchOutcome::TransportFailure { message } => write!(f, "transport failure: {message}"),
        }
    }
}
