use std::fmt::{self, Display};
use std::io;

/// Provides `SirError` and maps other errors to
/// convert to a `SirError`
#[derive(Debug)]
#[allow(clippy::module_name_repetitions)]
pub enum SirError {
    IoError(io::Error),
    JsonError(serde_json::Error),
    CsvError(csv::Error),
    InvalidParameter(String),
    SolverError(String),
    ReportError(String),
}

impl From<io::Error> for SirError {
    fn from(error: io::Error) -> Self {
        SirError::IoError(error)
    }
}

impl From<serde_json::Error> for SirError {
    fn from(error: serde_json::Error) -> Self {
        SirError::JsonError(error)
    }
}

impl From<csv::Error> for SirError {
    fn from(error: csv::Error) -> Self {
        SirError::CsvError(error)
    }
}

impl std::error::Error for SirError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SirError::IoError(error) => Some(error),
            SirError::JsonError(error) => Some(error),
            SirError::CsvError(error) => Some(error),
            _ => None,
        }
    }
}

impl Display for SirError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SirError::IoError(error) => write!(f, "I/O error: {error}"),
            SirError::JsonError(error) => write!(f, "JSON error: {error}"),
            SirError::CsvError(error) => write!(f, "CSV error: {error}"),
            SirError::InvalidParameter(msg) => write!(f, "Invalid parameter: {msg}"),
            SirError::SolverError(msg) => write!(f, "Solver error: {msg}"),
            SirError::ReportError(msg) => write!(f, "Report error: {msg}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn io_error_converts_and_keeps_source() {
        let error: SirError = io::Error::new(io::ErrorKind::NotFound, "missing.json").into();
        assert!(matches!(error, SirError::IoError(_)));
        assert!(error.source().is_some());
        assert!(error.to_string().contains("missing.json"));
    }

    #[test]
    fn json_error_converts() {
        let parse_error = serde_json::from_str::<f64>("not a number").unwrap_err();
        let error: SirError = parse_error.into();
        assert!(matches!(error, SirError::JsonError(_)));
    }

    #[test]
    fn display_names_the_failing_parameter() {
        let error = SirError::InvalidParameter("gamma must be non-negative".to_string());
        assert_eq!(
            error.to_string(),
            "Invalid parameter: gamma must be non-negative"
        );
        assert!(error.source().is_none());
    }
}
