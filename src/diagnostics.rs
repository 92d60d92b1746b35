//! Diagnostics shared by every parser and generator.
//!
//! Each public operation accumulates warnings and errors into a [`Diagnostics`]
//! bundle and hands them back inside a result object. Nothing is thrown across
//! a component boundary: callers look at `success` and the two lists.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Broad family a diagnostic belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCategory {
    /// Malformed input text (unbalanced tags, bad start/end characters)
    Structural,
    /// Well-formed text missing a domain root marker or namespace
    Format,
    /// A single activity, transition, element or type could not be read
    Element,
    /// Template resource missing or failing to compile/render
    Template,
    /// Valid input that produces no output under the current policy
    Policy,
    /// Caller-supplied input rejected before any work starts
    Input,
}

/// Machine-readable diagnostic code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiagnosticCode {
    XmlInvalid,
    ParseError,
    InvalidBwp,
    InvalidXsd,
    MissingNamespace,
    MissingXsNamespace,
    NoProcessDef,
    NoSchemaDef,
    MissingActivityId,
    ActivityParseError,
    InvalidTransition,
    MissingElementName,
    ElementParseError,
    MissingTypeName,
    GenerationError,
    NoHttpActivities,
    MissingProcessName,
    NoActivities,
    UnsupportedFileType,
    ConversionError,
    NoFilesFound,
}

impl DiagnosticCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiagnosticCode::XmlInvalid => "XML_INVALID",
            DiagnosticCode::ParseError => "PARSE_ERROR",
            DiagnosticCode::InvalidBwp => "INVALID_BWP",
            DiagnosticCode::InvalidXsd => "INVALID_XSD",
            DiagnosticCode::MissingNamespace => "MISSING_NAMESPACE",
            DiagnosticCode::MissingXsNamespace => "MISSING_XS_NAMESPACE",
            DiagnosticCode::NoProcessDef => "NO_PROCESS_DEF",
            DiagnosticCode::NoSchemaDef => "NO_SCHEMA_DEF",
            DiagnosticCode::MissingActivityId => "MISSING_ACTIVITY_ID",
            DiagnosticCode::ActivityParseError => "ACTIVITY_PARSE_ERROR",
            DiagnosticCode::InvalidTransition => "INVALID_TRANSITION",
            DiagnosticCode::MissingElementName => "MISSING_ELEMENT_NAME",
            DiagnosticCode::ElementParseError => "ELEMENT_PARSE_ERROR",
            DiagnosticCode::MissingTypeName => "MISSING_TYPE_NAME",
            DiagnosticCode::GenerationError => "GENERATION_ERROR",
            DiagnosticCode::NoHttpActivities => "NO_HTTP_ACTIVITIES",
            DiagnosticCode::MissingProcessName => "MISSING_PROCESS_NAME",
            DiagnosticCode::NoActivities => "NO_ACTIVITIES",
            DiagnosticCode::UnsupportedFileType => "UNSUPPORTED_FILE_TYPE",
            DiagnosticCode::ConversionError => "CONVERSION_ERROR",
            DiagnosticCode::NoFilesFound => "NO_FILES_FOUND",
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            DiagnosticCode::XmlInvalid | DiagnosticCode::ParseError => ErrorCategory::Structural,
            DiagnosticCode::InvalidBwp
            | DiagnosticCode::InvalidXsd
            | DiagnosticCode::MissingNamespace
            | DiagnosticCode::MissingXsNamespace
            | DiagnosticCode::NoProcessDef
            | DiagnosticCode::NoSchemaDef => ErrorCategory::Format,
            DiagnosticCode::MissingActivityId
            | DiagnosticCode::ActivityParseError
            | DiagnosticCode::InvalidTransition
            | DiagnosticCode::MissingElementName
            | DiagnosticCode::ElementParseError
            | DiagnosticCode::MissingTypeName => ErrorCategory::Element,
            DiagnosticCode::GenerationError => ErrorCategory::Template,
            DiagnosticCode::NoHttpActivities => ErrorCategory::Policy,
            DiagnosticCode::MissingProcessName
            | DiagnosticCode::NoActivities
            | DiagnosticCode::UnsupportedFileType
            | DiagnosticCode::ConversionError
            | DiagnosticCode::NoFilesFound => ErrorCategory::Input,
        }
    }
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single warning or error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub message: String,
    /// Where the problem was found (e.g. "activity", "XML structure")
    pub source: String,
    pub code: DiagnosticCode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
}

impl Diagnostic {
    pub fn new(message: impl Into<String>, source: impl Into<String>, code: DiagnosticCode) -> Self {
        Self {
            message: message.into(),
            source: source.into(),
            code,
            stack: None,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {} ({})", self.code, self.message, self.source)
    }
}

/// Ordered warning/error accumulator.
///
/// Owned by one parser or generator instance and cleared at the start of
/// every call, so results never leak between conversions.
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    warnings: Vec<Diagnostic>,
    errors: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_warning(&mut self, message: impl Into<String>, source: impl Into<String>, code: DiagnosticCode) {
        self.warnings.push(Diagnostic::new(message, source, code));
    }

    pub fn add_error(
        &mut self,
        message: impl Into<String>,
        source: impl Into<String>,
        code: DiagnosticCode,
        stack: Option<String>,
    ) {
        self.errors.push(Diagnostic {
            message: message.into(),
            source: source.into(),
            code,
            stack,
        });
    }

    pub fn clear(&mut self) {
        self.warnings.clear();
        self.errors.clear();
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn warnings(&self) -> &[Diagnostic] {
        &self.warnings
    }

    pub fn errors(&self) -> &[Diagnostic] {
        &self.errors
    }

    /// Wrap parsed data together with a snapshot of the diagnostics.
    pub fn parse_result<T>(&self, data: Option<T>) -> ParseResult<T> {
        let success = self.errors.is_empty() && data.is_some();
        ParseResult {
            data,
            warnings: self.warnings.clone(),
            errors: self.errors.clone(),
            success,
        }
    }

    pub fn validation_result(&self) -> ValidationResult {
        ValidationResult {
            valid: self.errors.is_empty(),
            errors: self.errors.clone(),
            warnings: self.warnings.clone(),
        }
    }
}

/// Outcome of a parse operation.
#[derive(Debug, Clone, Serialize)]
pub struct ParseResult<T> {
    pub data: Option<T>,
    pub warnings: Vec<Diagnostic>,
    pub errors: Vec<Diagnostic>,
    /// True iff there are no errors and `data` is present
    pub success: bool,
}

impl<T> ParseResult<T> {
    /// Count diagnostics carrying the given code, across both lists.
    pub fn count_code(&self, code: DiagnosticCode) -> usize {
        self.warnings
            .iter()
            .chain(self.errors.iter())
            .filter(|d| d.code == code)
            .count()
    }
}

/// Outcome of a validate-only operation.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationResult {
    pub valid: bool,
    pub errors: Vec<Diagnostic>,
    pub warnings: Vec<Diagnostic>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_result_requires_data_and_no_errors() {
        let mut diagnostics = Diagnostics::new();
        diagnostics.add_warning("just a warning", "root", DiagnosticCode::MissingNamespace);

        let ok = diagnostics.parse_result(Some(1));
        assert!(ok.success);
        assert_eq!(ok.warnings.len(), 1);

        let missing: ParseResult<i32> = diagnostics.parse_result(None);
        assert!(!missing.success);

        diagnostics.add_error("bad", "root", DiagnosticCode::InvalidBwp, None);
        let failed = diagnostics.parse_result(Some(1));
        assert!(!failed.success);
        assert_eq!(failed.count_code(DiagnosticCode::InvalidBwp), 1);
    }

    #[test]
    fn test_clear_resets_both_lists() {
        let mut diagnostics = Diagnostics::new();
        diagnostics.add_warning("w", "s", DiagnosticCode::NoHttpActivities);
        diagnostics.add_error("e", "s", DiagnosticCode::XmlInvalid, None);
        diagnostics.clear();

        let result = diagnostics.validation_result();
        assert!(result.valid);
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_code_serialization_and_category() {
        let json = serde_json::to_string(&DiagnosticCode::NoHttpActivities).unwrap();
        assert_eq!(json, "\"NO_HTTP_ACTIVITIES\"");
        assert_eq!(DiagnosticCode::NoHttpActivities.as_str(), "NO_HTTP_ACTIVITIES");
        assert_eq!(DiagnosticCode::XmlInvalid.category(), ErrorCategory::Structural);
        assert_eq!(DiagnosticCode::MissingActivityId.category(), ErrorCategory::Element);
    }
}
