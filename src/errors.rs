use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("config error: {0}")]
    Config(#[from] crate::config::ConfigError),
    #[error("process error: {0}")]
    Process(#[from] crate::stream::ProcessError),
    #[error("metrics error: {0}")]
    Metrics(#[from] crate::metrics::MetricsError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
