#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    #[error("Unknown feature key: {0}")]
    UnknownFeature(String),
    #[error("Unknown limit key: {0}")]
    UnknownLimit(String),
    #[error("Unknown plan: {0}")]
    UnknownPlan(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[cfg(feature = "client")]
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("{operation} failed (status {status:?}): {detail}")]
    Api {
        operation: &'static str,
        status: Option<u16>,
        detail: String,
    },
    #[error("Invalid session payload: {0}")]
    Decode(#[from] serde_json::Error),
}
