//! Parsers for BusinessWorks process definitions and XML Schema documents.
//!
//! Both parsers run the same pipeline: a cheap structural check, a root
//! marker check, tree loading, then per-element extraction where one bad
//! element becomes a warning instead of failing the whole document.

pub mod process_parser;
pub mod schema_parser;
pub mod xml_tree;

pub use process_parser::ProcessParser;
pub use schema_parser::SchemaParser;
pub use xml_tree::{local_name, structural_check, StructureReport, TreeError, XmlNode, XmlTree, XmlValue};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::diagnostics::{DiagnosticCode, Diagnostics};

/// Options shared by the parsers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParserConfig {
    /// Report the loader's real message and a trace on PARSE_ERROR
    #[serde(default)]
    pub verbose: bool,
    /// Keep going after a PARSE_ERROR instead of stopping a batch
    #[serde(default = "default_continue_on_error")]
    pub continue_on_error: bool,
}

fn default_continue_on_error() -> bool {
    true
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            verbose: false,
            continue_on_error: default_continue_on_error(),
        }
    }
}

/// Why a single activity, transition, element or type was skipped.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ElementError {
    #[error("Activity missing name/id")]
    MissingActivityName,

    #[error("Failed to parse activity: {0}")]
    MalformedActivity(String),

    #[error("Transition missing from/to attributes")]
    MissingTransitionEnds,

    #[error("Element missing name")]
    MissingElementName,

    #[error("Failed to parse element {element}: invalid {attribute} '{value}'")]
    InvalidOccurs {
        element: String,
        attribute: &'static str,
        value: String,
    },

    #[error("{0} type missing name")]
    MissingTypeName(&'static str),
}

impl ElementError {
    pub fn code(&self) -> DiagnosticCode {
        match self {
            ElementError::MissingActivityName => DiagnosticCode::MissingActivityId,
            ElementError::MalformedActivity(_) => DiagnosticCode::ActivityParseError,
            ElementError::MissingTransitionEnds => DiagnosticCode::InvalidTransition,
            ElementError::MissingElementName => DiagnosticCode::MissingElementName,
            ElementError::InvalidOccurs { .. } => DiagnosticCode::ElementParseError,
            ElementError::MissingTypeName(_) => DiagnosticCode::MissingTypeName,
        }
    }

    /// Where the element was found, as reported in the diagnostic.
    pub fn source(&self) -> &'static str {
        match self {
            ElementError::MissingActivityName | ElementError::MalformedActivity(_) => "activity",
            ElementError::MissingTransitionEnds => "transition",
            ElementError::MissingElementName | ElementError::InvalidOccurs { .. } => "element",
            ElementError::MissingTypeName("Complex") => "complexType",
            ElementError::MissingTypeName(_) => "simpleType",
        }
    }

    /// Record this failure as a warning and log it.
    pub(crate) fn report(self, diagnostics: &mut Diagnostics) {
        tracing::warn!(code = %self.code(), "{}", self);
        diagnostics.add_warning(self.to_string(), self.source(), self.code());
    }
}

/// Diagnostic for a document that could not be loaded into a tree.
pub(crate) fn report_tree_error(
    error: &TreeError,
    config: &ParserConfig,
    source: &str,
    diagnostics: &mut Diagnostics,
) {
    tracing::debug!(source, "tree load failed: {}", error);
    let (message, stack) = if config.verbose {
        (error.to_string(), Some(format!("{:?}\n    at {}", error, source)))
    } else {
        ("Parsing error occurred".to_string(), None)
    };
    diagnostics.add_error(message, source, DiagnosticCode::ParseError, stack);
}
