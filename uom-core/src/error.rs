//! Classified errors for UI consumption
//!
//! Every failure a consumer sees is one of a closed set of kinds, carrying a
//! user-facing message, ordered remediation suggestions and a retry flag.
//! The retry flag is a property of the kind and cannot be set separately.

use std::fmt;
use serde::{Deserialize, Serialize};

/// Standard error codes (machine-readable)
pub mod codes {
    pub const DATA_UNAVAILABLE: &str = "DATA_UNAVAILABLE";
    pub const UNKNOWN_UNIT_REFERENCE: &str = "UNKNOWN_UNIT_REFERENCE";
    pub const INCOMPATIBLE_CATEGORIES: &str = "INCOMPATIBLE_CATEGORIES";
    pub const MISSING_SELECTION: &str = "MISSING_SELECTION";
    pub const INVALID_DATA: &str = "INVALID_DATA";
    pub const UNKNOWN: &str = "UNKNOWN";
}

/// The fixed error taxonomy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    /// The catalog failed to load (network/server fault)
    DataUnavailable,
    /// An id or symbol does not resolve against a loaded catalog
    UnknownUnitReference,
    /// Conversion requested across categories
    IncompatibleCategories,
    /// A required unit was not chosen
    MissingSelection,
    /// A unit record has a non-positive, non-finite or missing factor
    InvalidData,
    Unknown,
}

impl ErrorKind {
    pub const ALL: [ErrorKind; 6] = [
        ErrorKind::DataUnavailable,
        ErrorKind::UnknownUnitReference,
        ErrorKind::IncompatibleCategories,
        ErrorKind::MissingSelection,
        ErrorKind::InvalidData,
        ErrorKind::Unknown,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            ErrorKind::DataUnavailable => codes::DATA_UNAVAILABLE,
            ErrorKind::UnknownUnitReference => codes::UNKNOWN_UNIT_REFERENCE,
            ErrorKind::IncompatibleCategories => codes::INCOMPATIBLE_CATEGORIES,
            ErrorKind::MissingSelection => codes::MISSING_SELECTION,
            ErrorKind::InvalidData => codes::INVALID_DATA,
            ErrorKind::Unknown => codes::UNKNOWN,
        }
    }

    /// Whether repeating the identical call can succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, ErrorKind::DataUnavailable | ErrorKind::Unknown)
    }

    pub fn default_message(&self) -> &'static str {
        match self {
            ErrorKind::DataUnavailable => "Unit data could not be loaded.",
            ErrorKind::UnknownUnitReference => "The selected unit could not be found.",
            ErrorKind::IncompatibleCategories => "These units cannot be converted into each other.",
            ErrorKind::MissingSelection => "Please select a unit.",
            ErrorKind::InvalidData => "This unit has an invalid conversion factor.",
            ErrorKind::Unknown => "Something went wrong. Please try again.",
        }
    }

    pub fn default_suggestions(&self) -> &'static [&'static str] {
        match self {
            ErrorKind::DataUnavailable => &[
                "Check your network connection",
                "Try again in a few moments",
            ],
            ErrorKind::UnknownUnitReference => &["Choose a different unit"],
            ErrorKind::IncompatibleCategories => &["Select units from the same category"],
            ErrorKind::MissingSelection => &["Select a unit"],
            ErrorKind::InvalidData => &[
                "Contact support to correct the unit definition",
                "Choose a different unit in the meantime",
            ],
            ErrorKind::Unknown => &[
                "Try again",
                "Contact support if the problem persists",
            ],
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Engine operation during which a fault was observed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    Load,
    Resolve,
    Search,
    Convert,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::Load => "load",
            Operation::Resolve => "resolve",
            Operation::Search => "search",
            Operation::Convert => "convert",
        };
        f.write_str(name)
    }
}

/// A fault normalized to the fixed taxonomy
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassifiedError {
    kind: ErrorKind,
    user_message: String,
    suggestions: Vec<String>,
    retryable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    operation: Option<Operation>,
    /// Technical detail for logs, never shown as the primary message
    #[serde(skip_serializing_if = "Option::is_none")]
    detail: Option<String>,
}

impl ClassifiedError {
    /// Create an error with the kind's default message and suggestions
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            user_message: kind.default_message().to_string(),
            suggestions: kind.default_suggestions().iter().map(|s| s.to_string()).collect(),
            retryable: kind.is_retryable(),
            operation: None,
            detail: None,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    pub fn user_message(&self) -> &str {
        &self.user_message
    }

    pub fn suggestions(&self) -> &[String] {
        &self.suggestions
    }

    pub fn is_retryable(&self) -> bool {
        self.retryable
    }

    pub fn operation(&self) -> Option<Operation> {
        self.operation
    }

    pub fn detail(&self) -> Option<&str> {
        self.detail.as_deref()
    }

    /// Builder: replace the user-facing message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.user_message = message.into();
        self
    }

    /// Builder: put a suggestion ahead of the defaults
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.insert(0, suggestion.into());
        self
    }

    /// Builder: attach technical detail
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    /// Builder: record the operation in flight
    pub fn with_operation(mut self, operation: Operation) -> Self {
        self.operation = Some(operation);
        self
    }

    // ========== Common Error Constructors ==========

    pub fn data_unavailable(detail: impl Into<String>) -> Self {
        Self::new(ErrorKind::DataUnavailable).with_detail(detail)
    }

    pub fn unknown_unit(reference: impl fmt::Display) -> Self {
        Self::new(ErrorKind::UnknownUnitReference)
            .with_message(format!("Unit '{}' was not found.", reference))
    }

    pub fn incompatible_categories(from_category: &str, to_category: &str) -> Self {
        Self::new(ErrorKind::IncompatibleCategories)
            .with_message(format!(
                "Cannot convert {} units into {} units.",
                from_category, to_category
            ))
    }

    pub fn missing_selection(what: &str) -> Self {
        Self::new(ErrorKind::MissingSelection)
            .with_message(format!("Please select a {}.", what))
    }

    pub fn invalid_data(unit_name: &str, factor: Option<f64>) -> Self {
        let detail = match factor {
            Some(f) => format!("to_base_factor = {}", f),
            None => "to_base_factor is missing".to_string(),
        };
        Self::new(ErrorKind::InvalidData)
            .with_message(format!("Unit '{}' has an invalid conversion factor.", unit_name))
            .with_detail(detail)
    }

    pub fn unknown(detail: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unknown).with_detail(detail)
    }
}

impl fmt::Display for ClassifiedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.kind.code(), self.user_message)?;
        if let Some(ref detail) = self.detail {
            write!(f, " ({})", detail)?;
        }
        Ok(())
    }
}

impl std::error::Error for ClassifiedError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_follows_kind() {
        for kind in ErrorKind::ALL {
            let err = ClassifiedError::new(kind);
            assert_eq!(err.is_retryable(), kind.is_retryable());
            assert!(!err.user_message().is_empty());
            assert!(!err.suggestions().is_empty());
        }
        assert!(!ClassifiedError::new(ErrorKind::IncompatibleCategories).is_retryable());
        assert!(!ClassifiedError::new(ErrorKind::UnknownUnitReference).is_retryable());
        assert!(ClassifiedError::new(ErrorKind::DataUnavailable).is_retryable());
        assert!(ClassifiedError::new(ErrorKind::Unknown).is_retryable());
    }

    #[test]
    fn test_builders_keep_retry_flag() {
        let err = ClassifiedError::unknown_unit(999999)
            .with_detail("lookup by id")
            .with_operation(Operation::Resolve)
            .with_suggestion("Refresh the unit list");
        assert_eq!(err.kind(), ErrorKind::UnknownUnitReference);
        assert!(!err.is_retryable());
        assert_eq!(err.user_message(), "Unit '999999' was not found.");
        assert_eq!(err.suggestions()[0], "Refresh the unit list");
        assert_eq!(err.operation(), Some(Operation::Resolve));
    }

    #[test]
    fn test_invalid_data_detail() {
        let err = ClassifiedError::invalid_data("Bale", Some(-1.0));
        assert_eq!(err.detail(), Some("to_base_factor = -1"));
        let err = ClassifiedError::invalid_data("Bale", None);
        assert_eq!(err.detail(), Some("to_base_factor is missing"));
    }

    #[test]
    fn test_display() {
        let err = ClassifiedError::data_unavailable("HTTP 503");
        let display = format!("{}", err);
        assert!(display.contains("DATA_UNAVAILABLE"));
        assert!(display.contains("HTTP 503"));
    }

    #[test]
    fn test_serialize() {
        let err = ClassifiedError::incompatible_categories("Weight", "Length");
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["kind"], "INCOMPATIBLE_CATEGORIES");
        assert_eq!(json["retryable"], false);
        assert!(json.get("detail").is_none());
    }
}
