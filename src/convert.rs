//! High-level conversion driver.
//!
//! Dispatches source files to the right parser by extension, feeds parsed
//! processes to the controller generator, and aggregates per-file results
//! over whole directory trees.
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use tibco_converter::codegen::GenerationConfig;
//! use tibco_converter::convert::Converter;
//!
//! let mut converter = Converter::default();
//! let result = converter.convert_path(Path::new("processes/"), &GenerationConfig::default());
//! println!("{} files generated", result.statistics.files_generated);
//! ```

use serde::Serialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::codegen::{ControllerGenerator, GeneratedFile, GenerationConfig, GeneratorConfig};
use crate::diagnostics::{Diagnostic, DiagnosticCode};
use crate::model::process::Process;
use crate::parsers::{ParserConfig, ProcessParser, SchemaParser};

/// Extensions of BusinessWorks process definitions.
pub const PROCESS_EXTENSIONS: &[&str] = &["bwp", "process"];

pub const SCHEMA_EXTENSION: &str = "xsd";

/// What a source file contains, judged by its extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SourceKind {
    Process,
    Schema,
}

impl SourceKind {
    /// Case-insensitive extension lookup; `None` for anything unsupported.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        if PROCESS_EXTENSIONS.contains(&ext.as_str()) {
            Some(SourceKind::Process)
        } else if ext == SCHEMA_EXTENSION {
            Some(SourceKind::Schema)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ConversionStatistics {
    pub processes_converted: usize,
    pub activities_converted: usize,
    pub files_generated: usize,
    pub duration_ms: u64,
}

/// Aggregated outcome of converting one file or a directory tree.
#[derive(Debug, Clone, Serialize)]
pub struct ConversionResult {
    pub success: bool,
    pub generated_files: Vec<GeneratedFile>,
    pub warnings: Vec<Diagnostic>,
    pub errors: Vec<Diagnostic>,
    pub statistics: ConversionStatistics,
}

impl ConversionResult {
    fn new() -> Self {
        Self {
            success: true,
            generated_files: Vec::new(),
            warnings: Vec::new(),
            errors: Vec::new(),
            statistics: ConversionStatistics::default(),
        }
    }

    fn error(message: impl Into<String>, source: impl Into<String>, code: DiagnosticCode) -> Self {
        let mut result = Self::new();
        result.errors.push(Diagnostic::new(message, source, code));
        result.success = false;
        result
    }

    fn merge(&mut self, other: ConversionResult) {
        self.generated_files.extend(other.generated_files);
        self.warnings.extend(other.warnings);
        self.errors.extend(other.errors);
        self.statistics.processes_converted += other.statistics.processes_converted;
        self.statistics.activities_converted += other.statistics.activities_converted;
    }

    fn finish(mut self, started: Instant) -> Self {
        self.statistics.files_generated = self.generated_files.len();
        self.statistics.duration_ms = started.elapsed().as_millis() as u64;
        self.success = self.errors.is_empty();
        self
    }
}

/// Validation outcome for a single file.
#[derive(Debug, Clone, Serialize)]
pub struct FileValidation {
    pub path: String,
    pub kind: Option<SourceKind>,
    pub valid: bool,
    pub warnings: Vec<Diagnostic>,
    pub errors: Vec<Diagnostic>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ValidationSummary {
    pub total_files: usize,
    pub valid_files: usize,
    pub invalid_files: usize,
    pub warnings: usize,
    pub errors: usize,
    pub files: Vec<FileValidation>,
}

impl ValidationSummary {
    fn record(&mut self, file: FileValidation) {
        self.total_files += 1;
        if file.valid {
            self.valid_files += 1;
        } else {
            self.invalid_files += 1;
        }
        self.warnings += file.warnings.len();
        self.errors += file.errors.len();
        self.files.push(file);
    }
}

/// Parses sources and generates code for them.
///
/// Holds one parser per format and one generator, so template compilation is
/// shared across every file of a batch.
pub struct Converter {
    parser_config: ParserConfig,
    process_parser: ProcessParser,
    schema_parser: SchemaParser,
    generator: ControllerGenerator,
}

impl Default for Converter {
    fn default() -> Self {
        Self::new(ParserConfig::default(), GeneratorConfig::default())
    }
}

impl Converter {
    pub fn new(parser_config: ParserConfig, generator_config: GeneratorConfig) -> Self {
        Self {
            process_parser: ProcessParser::new(parser_config.clone()),
            schema_parser: SchemaParser::new(parser_config.clone()),
            generator: ControllerGenerator::new(generator_config),
            parser_config,
        }
    }

    /// Parse an already-loaded process definition.
    pub fn parse_process(&mut self, text: &str) -> Result<Process, Vec<Diagnostic>> {
        let parsed = self.process_parser.parse(text);
        match parsed.data {
            Some(process) if parsed.success => Ok(process),
            _ => Err(parsed.errors),
        }
    }

    /// Convert one source document.
    ///
    /// `path` selects the parser by extension and labels diagnostics. Process
    /// definitions produce a controller; schemas are parsed and checked but
    /// produce no files yet.
    pub fn convert_source(&mut self, path: &Path, text: &str, config: &GenerationConfig) -> ConversionResult {
        let started = Instant::now();
        let label = path.display().to_string();

        let kind = match SourceKind::from_path(path) {
            Some(kind) => kind,
            None => {
                let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
                return ConversionResult::error(
                    format!("Unsupported file type: .{}", ext),
                    label,
                    DiagnosticCode::UnsupportedFileType,
                )
                .finish(started);
            }
        };

        let mut result = ConversionResult::new();

        match kind {
            SourceKind::Process => {
                let parsed = self.process_parser.parse(text);
                result.warnings.extend(parsed.warnings);
                result.errors.extend(parsed.errors);

                if let Some(process) = parsed.data.filter(|_| result.errors.is_empty()) {
                    result.statistics.processes_converted = 1;
                    result.statistics.activities_converted = process.activities.len();

                    if config.options.generate_controllers {
                        let generated = self.generator.generate(&process, config);
                        result.generated_files.extend(generated.files);
                        result.warnings.extend(generated.warnings);
                        result.errors.extend(generated.errors);
                    } else {
                        debug!(process = %process.name, "Controller generation disabled");
                    }
                }
            }
            SourceKind::Schema => {
                let parsed = self.schema_parser.parse(text);
                if let Some(schema) = &parsed.data {
                    debug!(
                        elements = schema.elements.len(),
                        types = schema.types.len(),
                        "Parsed schema {}", label
                    );
                }
                result.warnings.extend(parsed.warnings);
                result.errors.extend(parsed.errors);
            }
        }

        result.finish(started)
    }

    /// Read and convert one file.
    pub fn convert_file(&mut self, path: &Path, config: &GenerationConfig) -> ConversionResult {
        info!("Converting {}", path.display());

        if SourceKind::from_path(path).is_none() {
            return self.convert_source(path, "", config);
        }

        match fs::read_to_string(path) {
            Ok(text) => self.convert_source(path, &text, config),
            Err(e) => ConversionResult::error(
                format!("Failed to read file: {}", e),
                path.display().to_string(),
                DiagnosticCode::ConversionError,
            ),
        }
    }

    /// Convert a single file, or every convertible file under a directory.
    ///
    /// An empty directory succeeds with a `NO_FILES_FOUND` warning. Without
    /// `continue_on_error`, the batch stops at the first file with errors.
    pub fn convert_path(&mut self, path: &Path, config: &GenerationConfig) -> ConversionResult {
        if !path.is_dir() {
            return self.convert_file(path, config);
        }

        let started = Instant::now();
        let label = path.display().to_string();

        let files = match find_convertible_files(path) {
            Ok(files) => files,
            Err(e) => {
                return ConversionResult::error(
                    format!("Failed to read directory: {}", e),
                    label,
                    DiagnosticCode::ConversionError,
                )
                .finish(started)
            }
        };

        let mut result = ConversionResult::new();

        if files.is_empty() {
            result.warnings.push(Diagnostic::new(
                "No convertible files found in directory",
                label,
                DiagnosticCode::NoFilesFound,
            ));
            return result.finish(started);
        }

        for file in &files {
            let file_result = self.convert_file(file, config);
            let failed = !file_result.success;
            result.merge(file_result);

            if failed && !self.parser_config.continue_on_error {
                warn!("Stopping after errors in {}", file.display());
                break;
            }
        }

        result.finish(started)
    }

    /// Validate a file, or every convertible file under a directory, without
    /// building models or generating code.
    pub fn validate_path(&mut self, path: &Path) -> Result<ValidationSummary, String> {
        let files = if path.is_dir() {
            find_convertible_files(path)
                .map_err(|e| format!("Failed to read directory {}: {}", path.display(), e))?
        } else {
            vec![path.to_path_buf()]
        };

        let mut summary = ValidationSummary::default();
        for file in files {
            let validation = self.validate_file(&file);
            summary.record(validation);
        }

        Ok(summary)
    }

    fn validate_file(&mut self, path: &Path) -> FileValidation {
        let kind = SourceKind::from_path(path);
        let label = path.display().to_string();

        let (warnings, errors) = match (kind, fs::read_to_string(path)) {
            (None, _) => {
                let diagnostic = Diagnostic::new("Unsupported file type", label.clone(), DiagnosticCode::UnsupportedFileType);
                (Vec::new(), vec![diagnostic])
            }
            (Some(_), Err(e)) => {
                let diagnostic = Diagnostic::new(
                    format!("Failed to read file: {}", e),
                    label.clone(),
                    DiagnosticCode::ConversionError,
                );
                (Vec::new(), vec![diagnostic])
            }
            (Some(SourceKind::Process), Ok(text)) => {
                let validation = self.process_parser.validate(&text);
                (validation.warnings, validation.errors)
            }
            (Some(SourceKind::Schema), Ok(text)) => {
                let validation = self.schema_parser.validate(&text);
                (validation.warnings, validation.errors)
            }
        };

        FileValidation {
            path: label,
            kind,
            valid: errors.is_empty(),
            warnings,
            errors,
        }
    }
}

/// Every `.bwp`, `.process` and `.xsd` file below `dir`, sorted by path.
pub fn find_convertible_files(dir: &Path) -> io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    collect_files(dir, &mut files)?;
    files.sort();
    Ok(files)
}

fn collect_files(dir: &Path, files: &mut Vec<PathBuf>) -> io::Result<()> {
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            collect_files(&path, files)?;
        } else if SourceKind::from_path(&path).is_some() {
            files.push(path);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const PROCESS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<pd:ProcessDefinition xmlns:pd="http://xmlns.tibco.com/bw/process/2003">
    <pd:name>Ping</pd:name>
    <pd:activity name="Receive">
        <pd:type>com.tibco.plugin.http.activities.HttpReceiveActivity</pd:type>
        <config>
            <method>GET</method>
            <path>/ping</path>
        </config>
    </pd:activity>
</pd:ProcessDefinition>"#;

    #[test]
    fn test_source_kind_by_extension() {
        assert_eq!(SourceKind::from_path(Path::new("a/Order.BWP")), Some(SourceKind::Process));
        assert_eq!(SourceKind::from_path(Path::new("a.process")), Some(SourceKind::Process));
        assert_eq!(SourceKind::from_path(Path::new("types.xsd")), Some(SourceKind::Schema));
        assert_eq!(SourceKind::from_path(Path::new("notes.txt")), None);
        assert_eq!(SourceKind::from_path(Path::new("Makefile")), None);
    }

    #[test]
    fn test_unsupported_file_type() {
        let mut converter = Converter::default();
        let result = converter.convert_source(Path::new("readme.md"), "", &GenerationConfig::default());

        assert!(!result.success);
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].code, DiagnosticCode::UnsupportedFileType);
        assert_eq!(result.errors[0].message, "Unsupported file type: .md");
    }

    #[test]
    fn test_process_source_generates_controller() {
        let mut converter = Converter::default();
        let result = converter.convert_source(Path::new("ping.bwp"), PROCESS, &GenerationConfig::default());

        assert!(result.success, "{:?}", result.errors);
        assert_eq!(result.statistics.processes_converted, 1);
        assert_eq!(result.statistics.activities_converted, 1);
        assert_eq!(result.statistics.files_generated, 1);
        assert_eq!(
            result.generated_files[0].path,
            "com/example/converted/controller/PingController.java"
        );
    }

    #[test]
    fn test_controllers_can_be_disabled() {
        let mut config = GenerationConfig::default();
        config.options.generate_controllers = false;

        let mut converter = Converter::default();
        let result = converter.convert_source(Path::new("ping.bwp"), PROCESS, &config);

        assert!(result.success);
        assert!(result.generated_files.is_empty());
        assert_eq!(result.statistics.processes_converted, 1);
    }

    #[test]
    fn test_empty_directory_warns() {
        let dir = TempDir::new().unwrap();
        let mut converter = Converter::default();
        let result = converter.convert_path(dir.path(), &GenerationConfig::default());

        assert!(result.success);
        assert_eq!(result.warnings.len(), 1);
        assert_eq!(result.warnings[0].code, DiagnosticCode::NoFilesFound);
    }

    #[test]
    fn test_find_convertible_files_recurses() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("nested/deeper")).unwrap();
        fs::write(dir.path().join("b.bwp"), "").unwrap();
        fs::write(dir.path().join("nested/a.xsd"), "").unwrap();
        fs::write(dir.path().join("nested/deeper/c.process"), "").unwrap();
        fs::write(dir.path().join("nested/skip.txt"), "").unwrap();

        let files = find_convertible_files(dir.path()).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.strip_prefix(dir.path()).unwrap().to_string_lossy().replace('\\', "/"))
            .collect();
        assert_eq!(names, vec!["b.bwp", "nested/a.xsd", "nested/deeper/c.process"]);
    }

    #[test]
    fn test_stop_on_first_failure_without_continue() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.bwp"), "<broken>").unwrap();
        fs::write(dir.path().join("b.bwp"), PROCESS).unwrap();

        let mut converter = Converter::default();
        let result = converter.convert_path(dir.path(), &GenerationConfig::default());
        assert!(!result.success);
        assert_eq!(result.statistics.files_generated, 1);

        let mut strict = Converter::new(
            ParserConfig {
                continue_on_error: false,
                ..Default::default()
            },
            GeneratorConfig::default(),
        );
        let result = strict.convert_path(dir.path(), &GenerationConfig::default());
        assert!(!result.success);
        assert!(result.generated_files.is_empty());
    }

    #[test]
    fn test_validate_path_counts_files() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("good.bwp"), PROCESS).unwrap();
        fs::write(dir.path().join("bad.xsd"), "<root/>").unwrap();

        let mut converter = Converter::default();
        let summary = converter.validate_path(dir.path()).unwrap();

        assert_eq!(summary.total_files, 2);
        assert_eq!(summary.valid_files, 1);
        assert_eq!(summary.invalid_files, 1);
        let bad = summary.files.iter().find(|f| !f.valid).unwrap();
        assert_eq!(bad.kind, Some(SourceKind::Schema));
        assert_eq!(bad.errors[0].code, DiagnosticCode::InvalidXsd);
    }
}
