use std::fmt;

/// Failure taxonomy for the remote fetchers. Carried through `anyhow` and
/// downcast at the boundary where errors are converted to empty results.
#[derive(Debug, Clone)]
pub enum FetchError {
    /// Network or HTTP-status failure.
    Transport {
        endpoint: &'static str,
        status: Option<u16>,
        detail: String,
    },
    /// Upstream responded but the payload had an unexpected shape.
    MalformedPayload {
        endpoint: &'static str,
        detail: String,
    },
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchError::Transport {
                endpoint,
                status,
                detail,
            } => match status {
                Some(code) => write!(f, "{endpoint} fetch failed (HTTP {code}): {detail}"),
                None => write!(f, "{endpoint} fetch failed: {detail}"),
            },
            FetchError::MalformedPayload { endpoint, detail } => {
                write!(f, "{endpoint} payload malformed: {detail}")
            }
        }
    }
}

impl std::error::Error for FetchError {}
