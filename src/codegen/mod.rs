//! Spring Boot code generation.
//!
//! Turns extracted process models into Java sources. Rendering goes through
//! Tera templates resolved by logical name from a template directory; the
//! helpers in [`utils`] are available to templates as filters.

pub mod controller;
pub mod endpoints;
pub mod fs_utils;
pub mod project_config;
pub mod template_engine;
pub mod utils;

// Re-export key types
pub use controller::{ControllerGenerator, FileKind, GeneratedFile, GenerationResult, GeneratorConfig};
pub use endpoints::{synthesize_endpoints, Endpoint, HeuristicInference, PayloadTypeInference};
pub use fs_utils::write_generated_files;
pub use project_config::{GenerationConfig, GenerationOptions, TemplateNames};
pub use template_engine::{TemplateEngine, TemplateEngineConfig, TemplateError};
