//! Generation configuration.
//!
//! Drives where generated sources go, which Java package they live in, and
//! which artifact kinds get produced. Loadable from a YAML file; the CLI
//! overrides individual fields from its flags.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Top-level generation configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct GenerationConfig {
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
    #[serde(default = "default_package_name")]
    pub package_name: String,
    #[serde(default = "default_spring_boot_version")]
    pub spring_boot_version: String,
    #[serde(default)]
    pub options: GenerationOptions,
    #[serde(default)]
    pub templates: TemplateNames,
}

fn default_output_dir() -> String {
    "./output".to_string()
}

fn default_package_name() -> String {
    "com.example.converted".to_string()
}

fn default_spring_boot_version() -> String {
    "3.1.0".to_string()
}

fn enabled() -> bool {
    true
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            package_name: default_package_name(),
            spring_boot_version: default_spring_boot_version(),
            options: GenerationOptions::default(),
            templates: TemplateNames::default(),
        }
    }
}

/// Which artifacts to generate and how
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct GenerationOptions {
    #[serde(default = "enabled")]
    pub generate_controllers: bool,
    #[serde(default = "enabled")]
    pub generate_services: bool,
    #[serde(default = "enabled")]
    pub generate_repositories: bool,
    #[serde(default = "enabled")]
    pub generate_dtos: bool,
    #[serde(default = "enabled")]
    pub generate_configurations: bool,
    #[serde(default)]
    pub generate_tests: bool,
    #[serde(default = "enabled")]
    pub use_lombok: bool,
    #[serde(default = "enabled")]
    pub use_validation: bool,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            generate_controllers: true,
            generate_services: true,
            generate_repositories: true,
            generate_dtos: true,
            generate_configurations: true,
            generate_tests: false,
            use_lombok: true,
            use_validation: true,
        }
    }
}

/// Logical template name per artifact kind
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct TemplateNames {
    #[serde(default = "default_controller_template")]
    pub controller: String,
    #[serde(default = "default_service_template")]
    pub service: String,
    #[serde(default = "default_repository_template")]
    pub repository: String,
    #[serde(default = "default_dto_template")]
    pub dto: String,
    #[serde(default = "default_config_template")]
    pub config: String,
    #[serde(default = "default_test_template")]
    pub test: String,
}

fn default_controller_template() -> String {
    "controller".to_string()
}

fn default_service_template() -> String {
    "service".to_string()
}

fn default_repository_template() -> String {
    "repository".to_string()
}

fn default_dto_template() -> String {
    "dto".to_string()
}

fn default_config_template() -> String {
    "config".to_string()
}

fn default_test_template() -> String {
    "test".to_string()
}

impl Default for TemplateNames {
    fn default() -> Self {
        Self {
            controller: default_controller_template(),
            service: default_service_template(),
            repository: default_repository_template(),
            dto: default_dto_template(),
            config: default_config_template(),
            test: default_test_template(),
        }
    }
}

impl GenerationConfig {
    /// Load generation configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, String> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;

        Self::from_yaml(&contents)
            .map_err(|e| format!("Failed to parse {}: {}", path.display(), e))
    }

    pub fn from_yaml(contents: &str) -> Result<Self, String> {
        serde_yaml::from_str(contents).map_err(|e| e.to_string())
    }

    /// Check that required fields are present
    pub fn validate(&self) -> Result<(), String> {
        if self.output_dir.trim().is_empty() {
            return Err("output_dir is required".to_string());
        }

        if self.package_name.trim().is_empty() {
            return Err("package_name is required".to_string());
        }

        if super::utils::sanitize_package_name(&self.package_name).is_empty() {
            return Err(format!(
                "package_name '{}' has no usable characters",
                self.package_name
            ));
        }

        if self.options.generate_controllers && self.templates.controller.trim().is_empty() {
            return Err("templates.controller is required when controllers are generated".to_string());
        }

        Ok(())
    }
}
