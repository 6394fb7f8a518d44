//! Error types for IIR filter design and application.

use std::fmt;

/// Result type for filter operations.
pub type FilterResult<T> = Result<T, FilterError>;

/// Errors that can occur while designing or applying a filter.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterError {
    /// Filter order is zero.
    InvalidOrder { order: usize },

    /// A design parameter required by the chosen family was not supplied.
    MissingParameter {
        parameter: &'static str,
        family: &'static str,
    },

    /// Invalid parameter value (cutoff, sample rate, ripple, shape, dtype).
    InvalidParameter { parameter: String, message: String },

    /// Closed-form design failed for the requested combination.
    DesignError { context: String },

    /// Coefficients could not be realized as a real, stable filter.
    NumericalInstability { context: String },

    /// Per-example sequence length disagrees with the batch size.
    BatchSizeMismatch {
        expected: usize,
        actual: usize,
        context: String,
    },

    /// Signal is not longer than the edge padding.
    SignalTooShort { length: usize, required: usize },

    /// Error from underlying numr operation.
    NumrError(String),
}

impl FilterError {
    pub(crate) fn invalid(parameter: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidParameter {
            parameter: parameter.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for FilterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidOrder { order } => {
                write!(f, "Invalid filter order {}: order must be >= 1", order)
            }
            Self::MissingParameter { parameter, family } => {
                write!(f, "{} filter requires parameter '{}'", family, parameter)
            }
            Self::InvalidParameter { parameter, message } => {
                write!(f, "Invalid parameter '{}': {}", parameter, message)
            }
            Self::DesignError { context } => write!(f, "Filter design failed: {}", context),
            Self::NumericalInstability { context } => {
                write!(f, "Numerical instability: {}", context)
            }
            Self::BatchSizeMismatch {
                expected,
                actual,
                context,
            } => write!(
                f,
                "{}: batch size mismatch (expected {}, got {})",
                context, expected, actual
            ),
            Self::SignalTooShort { length, required } => write!(
                f,
                "Signal of length {} is too short: must be longer than {} samples",
                length, required
            ),
            Self::NumrError(msg) => write!(f, "numr error: {}", msg),
        }
    }
}

impl std::error::Error for FilterError {}

impl From<numr::error::Error> for FilterError {
    fn from(err: numr::error::Error) -> Self {
        Self::NumrError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        let err = FilterError::MissingParameter {
            parameter: "rp",
            family: "Chebyshev Type I",
        };
        assert_eq!(
            err.to_string(),
            "Chebyshev Type I filter requires parameter 'rp'"
        );

        let err = FilterError::SignalTooShort {
            length: 10,
            required: 27,
        };
        assert!(err.to_string().contains("longer than 27"));

        let err = FilterError::BatchSizeMismatch {
            expected: 4,
            actual: 3,
            context: "cutoff".to_string(),
        };
        assert!(err.to_string().starts_with("cutoff"));
    }
}
