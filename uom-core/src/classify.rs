//! Error classifier: total mapping from raw faults to the fixed taxonomy

use crate::{ClassifiedError, ErrorKind, Fault, Operation};

/// Keyword table for free-text validation messages. First match wins.
const MESSAGE_RULES: &[(ErrorKind, &[&str])] = &[
    (
        ErrorKind::IncompatibleCategories,
        &["incompatible", "different categor", "same category", "cannot convert between"],
    ),
    (
        ErrorKind::UnknownUnitReference,
        &["not found", "unknown unit", "does not exist", "no such unit", "invalid pk"],
    ),
    (
        ErrorKind::MissingSelection,
        &[
            "please select",
            "must select",
            "select a unit",
            "no unit selected",
            "not selected",
            "is required",
            "may not be blank",
            "may not be null",
            "missing unit",
        ],
    ),
    (
        ErrorKind::InvalidData,
        &["factor", "non-positive", "not finite", "invalid data", "must be greater than zero"],
    ),
];

/// Classify a free-text message by keyword
pub fn classify_message(message: &str) -> ErrorKind {
    let lowered = message.to_lowercase();
    MESSAGE_RULES
        .iter()
        .find(|(_, needles)| needles.iter().any(|n| lowered.contains(n)))
        .map(|(kind, _)| *kind)
        .unwrap_or(ErrorKind::Unknown)
}

/// Map any fault observed during `operation` to exactly one classified error
pub fn classify(fault: &Fault, operation: Operation) -> ClassifiedError {
    let kind = match fault {
        Fault::Network(_) | Fault::Timeout | Fault::Io(_) => ErrorKind::DataUnavailable,
        Fault::Http { status, message } => classify_status(*status, message.as_deref(), operation),
        // A garbled feed is a server-side fault; the next fetch may succeed
        Fault::Parse(_) => match operation {
            Operation::Load => ErrorKind::DataUnavailable,
            _ => ErrorKind::Unknown,
        },
        Fault::Validation(message) => classify_message(message),
        Fault::DataQuality(_) => ErrorKind::InvalidData,
        Fault::Other(message) => classify_message(message),
    };

    ClassifiedError::new(kind)
        .with_detail(fault.to_string())
        .with_operation(operation)
}

fn classify_status(status: u16, message: Option<&str>, operation: Operation) -> ErrorKind {
    match status {
        // No response at all
        0 => ErrorKind::DataUnavailable,
        408 | 429 | 500..=599 => ErrorKind::DataUnavailable,
        404 => match operation {
            Operation::Load => ErrorKind::DataUnavailable,
            _ => ErrorKind::UnknownUnitReference,
        },
        400 | 422 => message.map(classify_message).unwrap_or(ErrorKind::Unknown),
        _ => ErrorKind::Unknown,
    }
}

impl Fault {
    /// Shorthand for `classify(self, operation)`
    pub fn classify(&self, operation: Operation) -> ClassifiedError {
        classify(self, operation)
    }
}
