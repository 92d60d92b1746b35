//! # tibco-converter: BusinessWorks to Spring Boot conversion
//!
//! Reads TIBCO BusinessWorks process definitions (`.bwp`, `.process`) and XML
//! Schema documents (`.xsd`) into typed models, and generates Spring Boot
//! REST controllers from the processes that receive HTTP requests.
//!
//! ## Features
//!
//! - **Tolerant parsing**: one malformed activity, transition or element is
//!   reported as a warning and skipped; the rest of the document still loads
//! - **Typed activity settings**: HTTP, JDBC, JMS, file, sub-process and Java
//!   activities expose the settings their kind uses
//! - **Template-driven generation**: Tera templates with Java naming filters
//! - **Effort analysis**: complexity scores and dependency lists per process
//!
//! ## Example
//!
//! ```no_run
//! use tibco_converter::codegen::{ControllerGenerator, GenerationConfig};
//! use tibco_converter::parsers::ProcessParser;
//!
//! let text = std::fs::read_to_string("OrderService.bwp").unwrap();
//! let parsed = ProcessParser::default().parse(&text);
//!
//! if let Some(process) = parsed.data {
//!     let generated = ControllerGenerator::default().generate(&process, &GenerationConfig::default());
//!     for file in generated.files {
//!         println!("{}", file.path);
//!     }
//! }
//! ```

pub mod diagnostics;
pub mod model;
pub mod parsers;

// Code generation framework
pub mod codegen;

// File and directory drivers
pub mod analysis;
pub mod convert;

// Re-export key types
pub use diagnostics::{Diagnostic, DiagnosticCode, ErrorCategory, ParseResult, ValidationResult};
pub use model::{Process, Schema};
pub use parsers::{ParserConfig, ProcessParser, SchemaParser};
pub use codegen::{ControllerGenerator, GeneratedFile, GenerationConfig};
pub use convert::{ConversionResult, Converter};
