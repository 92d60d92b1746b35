//! Tera-backed template rendering for generated Java sources.
//!
//! Templates live as `<name>.tera` files in a template directory and are
//! compiled on first use. Compiled templates are cached inside the engine, so
//! an engine shared between threads needs external locking; separate engines
//! are independent.
//!
//! Filters available to every template:
//!
//! | filter | input | output |
//! |---|---|---|
//! | `camel_case`, `pascal_case`, `snake_case`, `kebab_case` | string | string |
//! | `pluralize`, `getter`, `setter` | string | string |
//! | `java_type` | XSD type name | Java type |
//! | `validation_annotations` | `{required, restrictions}` | annotation lines |
//! | `http_method_annotation` | HTTP verb | `@GetMapping` etc. |
//! | `spring_imports` | list of feature names | import lines |
//!
//! Testers `same_as(x)` and `different_from(x)` compare values for branching.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::error::Error as StdError;
use std::fs;
use std::path::{Path, PathBuf};
use tera::{Context, Tera, Value};
use thiserror::Error;
use tracing::debug;

use super::utils;
use crate::model::schema::Restriction;

/// Default template file extension, without the dot.
pub const TEMPLATE_EXTENSION: &str = "tera";

/// Templates shipped with the crate.
pub fn default_template_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("templates")
}

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("Template '{name}' not found at {}", path.display())]
    NotFound { name: String, path: PathBuf },

    #[error("Failed to read template {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to compile template '{name}': {message}")]
    Compile { name: String, message: String },

    #[error("Failed to render template '{name}': {message}")]
    Render { name: String, message: String },

    #[error("Failed to build template context: {0}")]
    Context(String),
}

/// Template engine configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateEngineConfig {
    pub template_dir: PathBuf,
    pub extension: String,
    pub cache_templates: bool,
}

impl Default for TemplateEngineConfig {
    fn default() -> Self {
        Self {
            template_dir: default_template_dir(),
            extension: TEMPLATE_EXTENSION.to_string(),
            cache_templates: true,
        }
    }
}

impl TemplateEngineConfig {
    pub fn with_template_dir(template_dir: impl Into<PathBuf>) -> Self {
        Self {
            template_dir: template_dir.into(),
            ..Default::default()
        }
    }
}

pub struct TemplateEngine {
    config: TemplateEngineConfig,
    tera: Tera,
    /// File names already compiled into `tera`
    loaded: HashSet<String>,
}

impl TemplateEngine {
    pub fn new(config: TemplateEngineConfig) -> Self {
        Self {
            config,
            tera: build_tera(),
            loaded: HashSet::new(),
        }
    }

    pub fn config(&self) -> &TemplateEngineConfig {
        &self.config
    }

    /// Render a template by logical name.
    ///
    /// # Arguments
    ///
    /// * `name` - Template name, with or without the extension
    /// * `context` - Any serializable value; its fields become template variables
    pub fn render<C: Serialize>(&mut self, name: &str, context: &C) -> Result<String, TemplateError> {
        let file_name = self.file_name(name);
        self.load(&file_name, name)?;

        let context =
            Context::from_serialize(context).map_err(|e| TemplateError::Context(flatten_error(&e)))?;

        self.tera
            .render(&file_name, &context)
            .map_err(|e| TemplateError::Render {
                name: name.to_string(),
                message: flatten_error(&e),
            })
    }

    /// Drop every compiled template; the next render reads from disk again.
    pub fn clear_cache(&mut self) {
        self.tera = build_tera();
        self.loaded.clear();
    }

    pub fn template_exists(&self, name: &str) -> bool {
        self.template_path(name).is_file()
    }

    /// Logical names of the templates in the template directory, sorted.
    /// An unreadable directory lists nothing.
    pub fn list_templates(&self) -> Vec<String> {
        let suffix = format!(".{}", self.config.extension);
        let Ok(entries) = fs::read_dir(&self.config.template_dir) else {
            return Vec::new();
        };

        let mut names: Vec<String> = entries
            .filter_map(Result::ok)
            .filter_map(|entry| {
                entry
                    .file_name()
                    .to_str()
                    .and_then(|file| file.strip_suffix(&suffix))
                    .map(str::to_string)
            })
            .collect();
        names.sort();
        names
    }

    fn file_name(&self, name: &str) -> String {
        let suffix = format!(".{}", self.config.extension);
        if name.ends_with(&suffix) {
            name.to_string()
        } else {
            format!("{}{}", name, suffix)
        }
    }

    fn template_path(&self, name: &str) -> PathBuf {
        self.config.template_dir.join(self.file_name(name))
    }

    fn load(&mut self, file_name: &str, name: &str) -> Result<(), TemplateError> {
        if self.config.cache_templates && self.loaded.contains(file_name) {
            return Ok(());
        }

        let path = self.config.template_dir.join(file_name);
        let source = read_template(&path, name)?;
        debug!(template = name, path = %path.display(), "Compiling template");

        self.tera
            .add_raw_template(file_name, &source)
            .map_err(|e| TemplateError::Compile {
                name: name.to_string(),
                message: flatten_error(&e),
            })?;
        self.loaded.insert(file_name.to_string());
        Ok(())
    }
}

fn read_template(path: &Path, name: &str) -> Result<String, TemplateError> {
    if !path.is_file() {
        return Err(TemplateError::NotFound {
            name: name.to_string(),
            path: path.to_path_buf(),
        });
    }
    fs::read_to_string(path).map_err(|source| TemplateError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Tera nests the useful message a few levels down its source chain.
fn flatten_error(error: &tera::Error) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

fn build_tera() -> Tera {
    let mut tera = Tera::default();
    tera.autoescape_on(vec![]);

    tera.register_filter("camel_case", string_filter("camel_case", utils::to_camel_case));
    tera.register_filter("pascal_case", string_filter("pascal_case", utils::to_pascal_case));
    tera.register_filter("snake_case", string_filter("snake_case", utils::to_snake_case));
    tera.register_filter("kebab_case", string_filter("kebab_case", utils::to_kebab_case));
    tera.register_filter("pluralize", string_filter("pluralize", utils::pluralize));
    tera.register_filter("getter", string_filter("getter", utils::getter_name));
    tera.register_filter("setter", string_filter("setter", utils::setter_name));
    tera.register_filter(
        "java_type",
        string_filter("java_type", |s| utils::java_type(s).to_string()),
    );
    tera.register_filter(
        "http_method_annotation",
        string_filter("http_method_annotation", |s| {
            utils::http_method_annotation(s).to_string()
        }),
    );
    tera.register_filter("validation_annotations", validation_annotations_filter);
    tera.register_filter("spring_imports", spring_imports_filter);

    tera.register_tester(
        "same_as",
        |value: Option<&Value>, args: &[Value]| -> tera::Result<bool> {
            Ok(value == Some(single_arg("same_as", args)?))
        },
    );
    tera.register_tester(
        "different_from",
        |value: Option<&Value>, args: &[Value]| -> tera::Result<bool> {
            Ok(value != Some(single_arg("different_from", args)?))
        },
    );

    tera
}

fn string_filter(
    name: &'static str,
    convert: fn(&str) -> String,
) -> impl Fn(&Value, &HashMap<String, Value>) -> tera::Result<Value> + Sync + Send {
    move |value: &Value, _: &HashMap<String, Value>| {
        let text = value
            .as_str()
            .ok_or_else(|| tera::Error::msg(format!("Filter `{}` expects a string, got {}", name, value)))?;
        Ok(Value::String(convert(text)))
    }
}

/// Shape accepted by `validation_annotations`: an element or property.
#[derive(Debug, Deserialize)]
struct AnnotatedField {
    #[serde(default)]
    required: bool,
    #[serde(default)]
    restrictions: Vec<Restriction>,
}

fn validation_annotations_filter(value: &Value, _: &HashMap<String, Value>) -> tera::Result<Value> {
    let field: AnnotatedField = serde_json::from_value(value.clone()).map_err(|e| {
        tera::Error::msg(format!("Filter `validation_annotations` expects a field object: {}", e))
    })?;
    Ok(Value::String(utils::validation_annotations(
        field.required,
        &field.restrictions,
    )))
}

fn spring_imports_filter(value: &Value, _: &HashMap<String, Value>) -> tera::Result<Value> {
    let features: Vec<String> = serde_json::from_value(value.clone()).map_err(|e| {
        tera::Error::msg(format!("Filter `spring_imports` expects a list of feature names: {}", e))
    })?;
    Ok(Value::String(utils::spring_imports(&features)))
}

fn single_arg<'a>(tester: &str, args: &'a [Value]) -> tera::Result<&'a Value> {
    match args {
        [value] => Ok(value),
        _ => Err(tera::Error::msg(format!(
            "Tester `{}` takes exactly one argument, got {}",
            tester,
            args.len()
        ))),
    }
}
