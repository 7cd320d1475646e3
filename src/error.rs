use thiserror::Error;

/// Coarse classification used in log output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Transport,
    Parse,
    Config,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ErrorKind::Transport => "transport",
            ErrorKind::Parse => "parse",
            ErrorKind::Config => "config",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{url} returned HTTP {status}")]
    Status { status: u16, url: String },

    #[error("invalid JSON payload: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid CSV table: {0}")]
    Csv(#[from] csv::Error),

    #[error("unexpected payload: {0}")]
    Parse(String),

    #[error("unknown indicator '{0}'")]
    UnknownIndicator(String),

    #[error("derivation of '{name}' exceeds depth {depth} (cycle or chain too long)")]
    DerivationTooDeep { name: String, depth: usize },

    #[error("indicator '{0}' is declared more than once")]
    DuplicateIndicator(String),

    #[error("no credentials configured for {0}")]
    MissingCredentials(&'static str),

    #[error("{source_name} cannot serve query {query}")]
    Unsupported { source_name: String, query: String },

    #[error("invalid setting: {0}")]
    Settings(String),
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Http(_) | Error::Status { .. } => ErrorKind::Transport,
            Error::Json(_) | Error::Csv(_) | Error::Parse(_) => ErrorKind::Parse,
            Error::UnknownIndicator(_)
            | Error::DerivationTooDeep { .. }
            | Error::DuplicateIndicator(_)
            | Error::MissingCredentials(_)
            | Error::Unsupported { .. }
            | Error::Settings(_) => ErrorKind::Config,
        }
    }

    pub(crate) fn parse(msg: impl Into<String>) -> Self {
        Error::Parse(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
