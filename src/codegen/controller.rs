//! Spring Boot REST controller generation.
//!
//! One controller per process, and only for processes that receive HTTP
//! requests. Each HTTP receiver becomes one handler method; see
//! [`super::endpoints`] for how the method contract is derived.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use tracing::{debug, error, info};

use super::endpoints::{synthesize_endpoints, Endpoint, HeuristicInference, PayloadTypeInference};
use super::project_config::GenerationConfig;
use super::template_engine::{TemplateEngine, TemplateEngineConfig, TemplateError};
use super::utils::{format_java_code, generate_imports, package_declaration, sanitize_class_name, sanitize_package_name};
use crate::diagnostics::{Diagnostic, DiagnosticCode, Diagnostics, ValidationResult};
use crate::model::process::{ActivityKind, Process};

const CONTROLLER_IMPORTS: &[&str] = &[
    "org.springframework.web.bind.annotation.*",
    "org.springframework.http.ResponseEntity",
    "org.springframework.beans.factory.annotation.Autowired",
];

const VALIDATION_IMPORTS: &[&str] = &["javax.validation.Valid", "javax.validation.constraints.*"];

const LOMBOK_IMPORT: &str = "lombok.extern.slf4j.Slf4j";

const MAP_IMPORT: &str = "java.util.Map";

/// Kind of a generated source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FileKind {
    Controller,
    Service,
    Repository,
    Dto,
    Config,
    Test,
}

impl fmt::Display for FileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FileKind::Controller => "CONTROLLER",
            FileKind::Service => "SERVICE",
            FileKind::Repository => "REPOSITORY",
            FileKind::Dto => "DTO",
            FileKind::Config => "CONFIG",
            FileKind::Test => "TEST",
        };
        f.write_str(name)
    }
}

/// A generated source file, path relative to the output root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedFile {
    pub path: String,
    pub content: String,
    pub kind: FileKind,
}

#[derive(Debug, Clone, Serialize)]
pub struct GenerationResult {
    pub files: Vec<GeneratedFile>,
    pub warnings: Vec<Diagnostic>,
    pub errors: Vec<Diagnostic>,
    /// True iff there are no errors
    pub success: bool,
}

/// Generator options
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorConfig {
    /// Report template failures with their real message and a trace
    pub verbose: bool,
    /// Run generated Java through [`format_java_code`]
    pub format_code: bool,
    /// Template directory; the templates shipped with the crate when unset
    pub template_dir: Option<PathBuf>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            verbose: false,
            format_code: true,
            template_dir: None,
        }
    }
}

/// Endpoint plus the rendered Java parameter list for its handler.
#[derive(Serialize)]
struct EndpointView<'a> {
    #[serde(flatten)]
    endpoint: &'a Endpoint,
    parameters: Vec<String>,
}

#[derive(Serialize)]
struct ControllerContext<'a> {
    package_name: String,
    package_declaration: String,
    class_name: String,
    import_block: String,
    process_name: &'a str,
    description: Option<&'a str>,
    endpoints: Vec<EndpointView<'a>>,
    has_validation: bool,
    use_lombok: bool,
    spring_boot_version: &'a str,
}

pub struct ControllerGenerator {
    config: GeneratorConfig,
    engine: TemplateEngine,
    inference: Box<dyn PayloadTypeInference + Send>,
    diagnostics: Diagnostics,
}

impl Default for ControllerGenerator {
    fn default() -> Self {
        Self::new(GeneratorConfig::default())
    }
}

impl ControllerGenerator {
    pub fn new(config: GeneratorConfig) -> Self {
        let engine_config = match &config.template_dir {
            Some(dir) => TemplateEngineConfig::with_template_dir(dir.clone()),
            None => TemplateEngineConfig::default(),
        };

        Self {
            config,
            engine: TemplateEngine::new(engine_config),
            inference: Box::new(HeuristicInference),
            diagnostics: Diagnostics::new(),
        }
    }

    /// Replace the payload type heuristics.
    pub fn with_inference(mut self, inference: impl PayloadTypeInference + Send + 'static) -> Self {
        self.inference = Box::new(inference);
        self
    }

    pub fn supported_kinds(&self) -> &'static [FileKind] {
        &[FileKind::Controller]
    }

    /// Generate the controller for a process.
    ///
    /// Produces no files, plus a `NO_HTTP_ACTIVITIES` warning, when the
    /// process has no HTTP receiver. A template failure produces no files and
    /// a `GENERATION_ERROR`.
    pub fn generate(&mut self, process: &Process, config: &GenerationConfig) -> GenerationResult {
        self.diagnostics.clear();
        debug!("Generating controller for process: {}", process.name);

        if !process.has_activity_kind(ActivityKind::HttpReceiver) {
            self.diagnostics.add_warning(
                "Process has no HTTP activities, skipping controller generation",
                process.name.as_str(),
                DiagnosticCode::NoHttpActivities,
            );
            return self.result(Vec::new());
        }

        match self.generate_controller(process, config) {
            Ok(file) => {
                info!(path = %file.path, "Generated controller");
                self.result(vec![file])
            }
            Err(e) => {
                error!(process = %process.name, "Controller generation failed: {}", e);
                let (message, stack) = if self.config.verbose {
                    (e.to_string(), Some(format!("{:?}", e)))
                } else {
                    ("Generation error occurred".to_string(), None)
                };
                self.diagnostics.add_error(
                    message,
                    "ControllerGenerator::generate",
                    DiagnosticCode::GenerationError,
                    stack,
                );
                self.result(Vec::new())
            }
        }
    }

    /// Check that a process can be handed to [`Self::generate`].
    pub fn validate(&mut self, process: &Process) -> ValidationResult {
        self.diagnostics.clear();

        if process.name.is_empty() {
            self.diagnostics.add_error(
                "Process name is required",
                "process",
                DiagnosticCode::MissingProcessName,
                None,
            );
        }

        if process.activities.is_empty() {
            self.diagnostics.add_error(
                "Process must have activities",
                "process",
                DiagnosticCode::NoActivities,
                None,
            );
        }

        self.diagnostics.validation_result()
    }

    fn generate_controller(
        &mut self,
        process: &Process,
        config: &GenerationConfig,
    ) -> Result<GeneratedFile, TemplateError> {
        let class_name = format!("{}Controller", sanitize_class_name(&process.name));
        let package_name = sanitize_package_name(&format!("{}.controller", config.package_name));
        let endpoints = synthesize_endpoints(process, self.inference.as_ref());
        let options = &config.options;

        let context = ControllerContext {
            package_declaration: package_declaration(&package_name),
            import_block: generate_imports(&controller_imports(&endpoints, options.use_validation, options.use_lombok)),
            endpoints: endpoints
                .iter()
                .map(|endpoint| EndpointView {
                    parameters: handler_parameters(endpoint, options.use_validation),
                    endpoint,
                })
                .collect(),
            package_name: package_name.clone(),
            class_name: class_name.clone(),
            process_name: &process.name,
            description: process.description.as_deref(),
            has_validation: options.use_validation,
            use_lombok: options.use_lombok,
            spring_boot_version: &config.spring_boot_version,
        };

        let rendered = self.engine.render(&config.templates.controller, &context)?;
        let content = if self.config.format_code {
            format_java_code(&rendered)
        } else {
            rendered
        };

        Ok(GeneratedFile {
            path: format!("{}/{}.java", package_name.replace('.', "/"), class_name),
            content,
            kind: FileKind::Controller,
        })
    }

    fn result(&self, files: Vec<GeneratedFile>) -> GenerationResult {
        GenerationResult {
            files,
            warnings: self.diagnostics.warnings().to_vec(),
            errors: self.diagnostics.errors().to_vec(),
            success: !self.diagnostics.has_errors(),
        }
    }
}

fn controller_imports(endpoints: &[Endpoint], use_validation: bool, use_lombok: bool) -> Vec<&'static str> {
    let mut imports = CONTROLLER_IMPORTS.to_vec();

    if use_validation && endpoints.iter().any(|e| e.has_request_body) {
        imports.extend_from_slice(VALIDATION_IMPORTS);
    }

    if endpoints.iter().any(|e| e.has_path_variables || e.has_query_params) {
        imports.push(MAP_IMPORT);
    }

    if use_lombok {
        imports.push(LOMBOK_IMPORT);
    }

    imports
}

fn handler_parameters(endpoint: &Endpoint, use_validation: bool) -> Vec<String> {
    let mut parameters = Vec::new();

    if endpoint.has_path_variables {
        parameters.push("@PathVariable Map<String, String> pathVariables".to_string());
    }

    if endpoint.has_query_params {
        parameters.push("@RequestParam Map<String, String> queryParams".to_string());
    }

    if endpoint.has_request_body {
        let valid = if use_validation { "@Valid " } else { "" };
        parameters.push(format!("{}@RequestBody {} request", valid, endpoint.request_type));
    }

    parameters
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::process::{Activity, ActivityConfig, ActivitySettings, Position};
    use std::fs;
    use tempfile::TempDir;

    fn receiver(name: &str, method: &str, path: &str) -> Activity {
        Activity {
            id: name.to_string(),
            name: name.to_string(),
            kind: ActivityKind::HttpReceiver,
            config: ActivityConfig {
                settings: ActivitySettings::HttpReceiver {
                    method: Some(method.to_string()),
                    path: Some(path.to_string()),
                    description: None,
                },
                extra: Default::default(),
            },
            input_mappings: Vec::new(),
            output_mappings: Vec::new(),
            position: Position::default(),
        }
    }

    #[test]
    fn test_imports_follow_options() {
        let mut process = Process::new("P");
        process.activities.push(receiver("Create", "POST", "/things"));
        let endpoints = synthesize_endpoints(&process, &HeuristicInference);

        let all = controller_imports(&endpoints, true, true);
        assert!(all.contains(&"javax.validation.Valid"));
        assert!(all.contains(&LOMBOK_IMPORT));
        assert!(!all.contains(&MAP_IMPORT));

        let bare = controller_imports(&endpoints, false, false);
        assert_eq!(bare, CONTROLLER_IMPORTS.to_vec());
    }

    #[test]
    fn test_handler_parameters() {
        let mut process = Process::new("P");
        process.activities.push(receiver("Update", "PUT", "/things/{id}"));
        let endpoint = &synthesize_endpoints(&process, &HeuristicInference)[0];

        assert_eq!(
            handler_parameters(endpoint, true),
            vec![
                "@PathVariable Map<String, String> pathVariables".to_string(),
                "@Valid @RequestBody RequestDTO request".to_string(),
            ]
        );
    }

    #[test]
    fn test_missing_template_is_generation_error() {
        let dir = TempDir::new().unwrap();
        let mut generator = ControllerGenerator::new(GeneratorConfig {
            verbose: true,
            template_dir: Some(dir.path().to_path_buf()),
            ..Default::default()
        });

        let mut process = Process::new("P");
        process.activities.push(receiver("Get", "GET", "/x"));

        let result = generator.generate(&process, &GenerationConfig::default());
        assert!(!result.success);
        assert!(result.files.is_empty());
        assert_eq!(result.errors[0].code, DiagnosticCode::GenerationError);
        assert!(result.errors[0].message.contains("not found"));
    }

    #[test]
    fn test_custom_template_name_and_formatting() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("mini.tera"),
            "{{ package_declaration }}\r\n\r\n\r\n\r\nclass {{ class_name }} {}\r\n",
        )
        .unwrap();

        let mut generator = ControllerGenerator::new(GeneratorConfig {
            template_dir: Some(dir.path().to_path_buf()),
            ..Default::default()
        });
        let mut config = GenerationConfig::default();
        config.package_name = "com.Acme".to_string();
        config.templates.controller = "mini".to_string();

        let mut process = Process::new("orders");
        process.activities.push(receiver("Get", "GET", "/x"));

        let result = generator.generate(&process, &config);
        assert!(result.success, "{:?}", result.errors);
        let file = &result.files[0];
        assert_eq!(file.path, "com/acme/controller/OrdersController.java");
        assert_eq!(file.content, "package com.acme.controller;\n\nclass OrdersController {}\n");
        assert_eq!(file.kind, FileKind::Controller);
    }

    #[test]
    fn test_validate() {
        let mut generator = ControllerGenerator::default();
        let result = generator.validate(&Process::new(""));
        let codes: Vec<_> = result.errors.iter().map(|e| e.code).collect();
        assert_eq!(codes, vec![DiagnosticCode::MissingProcessName, DiagnosticCode::NoActivities]);
        assert_eq!(generator.supported_kinds(), &[FileKind::Controller]);
    }
}
