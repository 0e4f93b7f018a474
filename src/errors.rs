/// Error types for the dashboard service.
/// The rebase engine never fails: anything it cannot compute is a `None`
/// field. Errors only come from loading the dataset and reading config.
#[derive(Debug, thiserror::Error)]
pub enum DashboardError {
    #[error("io error: {0}")]
    Io(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("invalid dataset: {0}")]
    InvalidData(String),

    #[error("config error: {0}")]
    Config(String),
}

impl From<std::io::Error> for DashboardError {
    fn from(e: std::io::Error) -> Self {
        DashboardError::Io(e.to_string())
    }
}

impl From<serde_json::Error> for DashboardError {
    fn from(e: serde_json::Error) -> Self {
        DashboardError::Parse(e.to_string())
    }
}

pub type DashboardResult<T> = Result<T, DashboardError>;
