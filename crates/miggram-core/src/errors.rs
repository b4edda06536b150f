/// Remote error code the platform returns when another `getUpdates` consumer
/// (or a webhook) is already active for the same token.
pub const POLL_CONFLICT_CODE: i64 = 409;

/// Core error type for the client.
///
/// Adapter crates map their specific errors into this type so the runtime can
/// tell retryable transport trouble apart from remote rejections.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("request timed out: {0}")]
    Timeout(String),

    /// The API answered with `ok: false`.
    #[error("remote error{}: {description}", fmt_code(.code))]
    Remote {
        code: Option<i64>,
        description: String,
    },

    /// An update payload lacked fields needed to build a decorated record.
    #[error("malformed update payload: {0}")]
    Decoration(String),

    #[error("external error: {0}")]
    External(String),
}

impl Error {
    pub fn remote(code: Option<i64>, description: impl Into<String>) -> Self {
        Error::Remote {
            code,
            description: description.into(),
        }
    }

    /// Another poller is already consuming updates for this token.
    pub fn is_poll_conflict(&self) -> bool {
        matches!(
            self,
            Error::Remote {
                code: Some(POLL_CONFLICT_CODE),
                ..
            }
        )
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::Transport(_) | Error::Timeout(_)) || self.is_poll_conflict()
    }

    /// `error_code` of a remote rejection, if this is one.
    pub fn remote_code(&self) -> Option<i64> {
        match self {
            Error::Remote { code, .. } => *code,
            _ => None,
        }
    }
}

fn fmt_code(code: &Option<i64>) -> String {
    code.map(|c| format!(" {c}")).unwrap_or_default()
}

pub type Result<T> = std::result::Result<T, Error>;
