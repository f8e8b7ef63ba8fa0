use thiserror::Error;

#[derive(Debug, Error)]
pub enum TrialMoaError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid pattern in rule '{rule}': {reason}")]
    InvalidPattern { rule: String, reason: String },

    #[error("Malformed record at row {row}: {reason}")]
    MalformedRecord { row: usize, reason: String },

    #[error("Derived field '{field}' already set on trial {trial_id}")]
    DerivedFieldAlreadySet { trial_id: String, field: &'static str },

    #[error("Trial {trial_id} is missing derived field '{field}'")]
    IncompleteRecord { trial_id: String, field: &'static str },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl TrialMoaError {
    /// True for errors that must abort a run before any record is processed.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            TrialMoaError::Io(_)
                | TrialMoaError::Yaml(_)
                | TrialMoaError::Json(_)
                | TrialMoaError::Config(_)
                | TrialMoaError::InvalidPattern { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, TrialMoaError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_errors_are_fatal() {
        assert!(TrialMoaError::Config("no rules".into()).is_fatal());
        assert!(TrialMoaError::InvalidPattern { rule: "r".into(), reason: "bad".into() }.is_fatal());
    }

    #[test]
    fn test_record_errors_are_not_fatal() {
        let err = TrialMoaError::MalformedRecord { row: 5, reason: "missing identifier".into() };
        assert!(!err.is_fatal());
        assert_eq!(err.to_string(), "Malformed record at row 5: missing identifier");
    }
}
