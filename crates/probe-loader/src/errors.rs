use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum LoaderError {
    #[error("navigation failed: {0}")]
    Navigation(String),
    #[error("context host unavailable: {0}")]
    HostUnavailable(String),
}
