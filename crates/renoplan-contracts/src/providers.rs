use std::time::Duration;

/// Minimum binary payload accepted as a real image. Anything smaller is
/// treated as an error page and rejected.
pub const MIN_IMAGE_PAYLOAD_BYTES: usize = 1000;

/// HTTP status a hosted provider returns while its model is still loading.
/// The chain may retry once on this signal before moving on.
pub const WARMUP_STATUS: u16 = 503;

/// Static description of one image provider in the fallback chain.
/// Ordering in the chain is fixed and significant; the list is read-only
/// and shared across submissions.
#[derive(Debug, Clone)]
pub struct ProviderSpec {
    pub name: &'static str,
    pub endpoint: String,
    pub requires_credential: bool,
    pub timeout: Duration,
    pub retry_on_unavailable: bool,
    pub prompt_limit: usize,
}

/// Outcome of the image stage. `Absent` is a normal terminal state, not an
/// error: the plan is still rendered without an image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageResult {
    Bytes { bytes: Vec<u8> },
    Url { url: String },
    Absent { reason: String },
}

impl ImageResult {
    pub fn is_absent(&self) -> bool {
        matches!(self, ImageResult::Absent { .. })
    }
}

/// Why a single provider attempt failed. Attempts are absorbed by the chain
/// and logged; only the aggregate outcome reaches the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    MissingCredential,
    WarmingUp,
    Timeout,
    BadStatus(u16),
    UndersizedPayload(usize),
    Transport,
    Malformed,
}

impl FailureKind {
    pub fn label(&self) -> &'static str {
        match self {
            FailureKind::MissingCredential => "missing_credential",
            FailureKind::WarmingUp => "warming_up",
            FailureKind::Timeout => "timeout",
            FailureKind::BadStatus(_) => "bad_status",
            FailureKind::UndersizedPayload(_) => "undersized_payload",
            FailureKind::Transport => "transport",
            FailureKind::Malformed => "malformed",
        }
    }
}

#[derive(Debug, Clone)]
pub struct AttemptFailure {
    pub kind: FailureKind,
    pub detail: String,
}

impl AttemptFailure {
    pub fn new(kind: FailureKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            detail: detail.into(),
        }
    }
}

/// Deployment choice for the keyless fallback provider: download and
/// validate the bytes locally, or hand the caller the provider URL as-is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImageDelivery {
    #[default]
    FetchBytes,
    UrlOnly,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_is_distinguishable() {
        let absent = ImageResult::Absent {
            reason: "unavailable".to_string(),
        };
        assert!(absent.is_absent());
        assert!(!ImageResult::Url {
            url: "https://example.com/x.png".to_string()
        }
        .is_absent());
    }

    #[test]
    fn failure_kinds_have_stable_labels() {
        assert_eq!(FailureKind::WarmingUp.label(), "warming_up");
        assert_eq!(FailureKind::BadStatus(429).label(), "bad_status");
        assert_eq!(FailureKind::UndersizedPayload(12).label(), "undersized_payload");
    }
}
