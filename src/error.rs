use thiserror::Error;

#[derive(Error, Debug)]
pub enum CircleError {
    #[error("Unsupported repo url format {url}")]
    UnsupportedRemote { url: String },

    #[error("{0}")]
    MissingCredential(String),

    #[error("Couldn't locate branch {0}")]
    BranchNotFound(String),

    #[error("No CircleCI builds found.")]
    NoBuildFound,

    #[error("No recent builds.")]
    NoRecentBuilds,

    #[error("HEAD is detached; pass --branch to pick a branch")]
    DetachedHead,

    #[error("Repository has no '{0}' remote")]
    NoRemote(String),

    #[error("API request failed with status {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Git error: {0}")]
    Git(#[from] git2::Error),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CircleError>;
