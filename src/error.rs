use thiserror::Error;

/// Errors raised while loading the store dataset or evaluating dashboard views.
#[derive(Debug, Error)]
pub enum DashboardError {
    #[error("data source '{source_id}' is unavailable: {reason}")]
    DataUnavailable { source_id: String, reason: String },
    #[error("column '{0}' does not exist in the loaded dataset")]
    UnknownColumn(String),
    #[error("no rows to aggregate for column '{0}'")]
    EmptyAggregation(String),
    #[error("unknown question '{0}'")]
    UnknownQuestion(String),
    #[error("unknown analysis type '{0}'")]
    UnknownAnalysis(String),
}

impl DashboardError {
    pub fn unavailable(source_id: impl Into<String>, reason: impl ToString) -> Self {
        DashboardError::DataUnavailable {
            source_id: source_id.into(),
            reason: reason.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, DashboardError>;
