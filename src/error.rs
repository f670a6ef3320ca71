//! Error types for graph construction and cycle detection

use thiserror::Error;

/// Errors raised while building graphs or searching them for cycles
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DetectorError {
    /// The edge sequence was empty (or absent)
    #[error("edge list cannot be empty")]
    EmptyInput,

    /// A single edge record failed validation
    #[error("invalid edge at index {index}: {reason}")]
    Validation { index: usize, reason: String },

    /// Detector configuration outside its domain
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Requested source token is not a node of the graph
    #[error("source token {0} is not in the graph")]
    SourceNotFound(String),

    /// Cycle reconstruction expanded more nodes than allowed
    #[error("cycle search from {node} exhausted its budget of {budget} expansions")]
    SearchBudgetExhausted { node: String, budget: usize },

    /// Unexpected failure while reconstructing or scoring a candidate
    #[error("internal error: {0}")]
    Internal(String),
}

impl DetectorError {
    pub(crate) fn validation(index: usize, reason: impl Into<String>) -> Self {
        DetectorError::Validation {
            index,
            reason: reason.into(),
        }
    }

    /// Malformed input; fatal to the build call
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            DetectorError::EmptyInput | DetectorError::Validation { .. }
        )
    }

    /// Non-fatal condition; the detector returns an empty result
    pub fn is_warning(&self) -> bool {
        matches!(self, DetectorError::SourceNotFound(_))
    }
}

pub type Result<T> = std::result::Result<T, DetectorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classes() {
        assert!(DetectorError::EmptyInput.is_validation());
        assert!(DetectorError::validation(3, "bad").is_validation());
        assert!(DetectorError::SourceNotFound("SOL".into()).is_warning());
        assert!(!DetectorError::Internal("nan".into()).is_validation());
        assert!(!DetectorError::Internal("nan".into()).is_warning());
    }

    #[test]
    fn test_validation_message_carries_index() {
        let err = DetectorError::validation(7, "empty to_token");
        assert_eq!(err.to_string(), "invalid edge at index 7: empty to_token");
    }
}
