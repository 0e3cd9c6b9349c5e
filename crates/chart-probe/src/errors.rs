use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChartProbeError {
    #[error("stage not available: {0}")]
    StageUnavailable(String),
    #[error("malformed stage dump: {0}")]
    MalformedDump(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl ChartProbeError {
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}
