//! Helper functions used while generating Java sources.
//!
//! Everything here is pure string work. The template engine exposes most of
//! these as filters; the controller generator calls the rest directly.

use convert_case::{Case, Casing};
use regex::Regex;
use std::collections::BTreeSet;
use std::sync::OnceLock;

use crate::model::schema::{Restriction, RestrictionKind};

/// Convert a string to camelCase
pub fn to_camel_case(s: &str) -> String {
    s.to_case(Case::Camel)
}

/// Convert a string to PascalCase
pub fn to_pascal_case(s: &str) -> String {
    s.to_case(Case::Pascal)
}

/// Convert a string to snake_case
pub fn to_snake_case(s: &str) -> String {
    s.to_case(Case::Snake)
}

/// Convert a string to kebab-case
pub fn to_kebab_case(s: &str) -> String {
    s.to_case(Case::Kebab)
}

/// Naive English plural: `y` becomes `ies`, sibilants take `es`.
pub fn pluralize(word: &str) -> String {
    if let Some(stem) = word.strip_suffix('y') {
        format!("{}ies", stem)
    } else if word.ends_with('s') || word.ends_with("sh") || word.ends_with("ch") {
        format!("{}es", word)
    } else {
        format!("{}s", word)
    }
}

fn upper_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn lower_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// `orderId` -> `getOrderId`
pub fn getter_name(field: &str) -> String {
    format!("get{}", upper_first(field))
}

/// `orderId` -> `setOrderId`
pub fn setter_name(field: &str) -> String {
    format!("set{}", upper_first(field))
}

/// Map an XML Schema type name to a Java type.
///
/// A leading `xs:` or `xsd:` prefix is ignored; anything unmapped is a `String`.
pub fn java_type(xsd_type: &str) -> &'static str {
    let local = xsd_type
        .strip_prefix("xs:")
        .or_else(|| xsd_type.strip_prefix("xsd:"))
        .unwrap_or(xsd_type);

    match local {
        "string" => "String",
        "int" | "integer" => "Integer",
        "long" => "Long",
        "double" => "Double",
        "float" => "Float",
        "boolean" => "Boolean",
        "date" => "LocalDate",
        "dateTime" => "LocalDateTime",
        "time" => "LocalTime",
        "decimal" => "BigDecimal",
        "base64Binary" => "byte[]",
        "anyURI" => "String",
        _ => "String",
    }
}

/// Bean-validation annotations for a field, one per line.
///
/// Lines after the first are indented to sit under a field in a class body.
pub fn validation_annotations(required: bool, restrictions: &[Restriction]) -> String {
    let mut annotations = Vec::new();

    if required {
        annotations.push("@NotNull".to_string());
    }

    for restriction in restrictions {
        let value = &restriction.value;
        match restriction.kind {
            RestrictionKind::MinLength => annotations.push(format!("@Size(min = {})", value)),
            RestrictionKind::MaxLength => annotations.push(format!("@Size(max = {})", value)),
            RestrictionKind::Length => {
                annotations.push(format!("@Size(min = {}, max = {})", value, value))
            }
            RestrictionKind::Pattern => annotations.push(format!(
                "@Pattern(regexp = \"{}\")",
                escape_java_string(&value.to_string())
            )),
            RestrictionKind::Enumeration => {}
        }
    }

    annotations.join("\n    ")
}

/// Spring request-mapping annotation for an HTTP verb.
pub fn http_method_annotation(method: &str) -> &'static str {
    match method.to_ascii_uppercase().as_str() {
        "GET" => "@GetMapping",
        "POST" => "@PostMapping",
        "PUT" => "@PutMapping",
        "DELETE" => "@DeleteMapping",
        "PATCH" => "@PatchMapping",
        _ => "@RequestMapping",
    }
}

/// Import target for a Spring feature name.
pub fn spring_import(feature: &str) -> Option<&'static str> {
    match feature {
        "web" => Some("org.springframework.web.bind.annotation.*"),
        "jpa" => Some("org.springframework.data.jpa.repository.*"),
        "service" => Some("org.springframework.stereotype.Service"),
        "component" => Some("org.springframework.stereotype.Component"),
        "autowired" => Some("org.springframework.beans.factory.annotation.Autowired"),
        "validation" => Some("javax.validation.constraints.*"),
        "lombok" => Some("lombok.*"),
        _ => None,
    }
}

/// Import statements for a list of Spring features, in the given order.
/// Unknown features are skipped.
pub fn spring_imports<S: AsRef<str>>(features: &[S]) -> String {
    features
        .iter()
        .filter_map(|feature| spring_import(feature.as_ref()))
        .map(|target| format!("import {};", target))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Escape a string for use inside a Java string literal
pub fn escape_java_string(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
        .replace('\r', "\\r")
        .replace('\t', "\\t")
}

fn identifier_chars(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
        .collect()
}

/// Make a Java class name: identifier characters only, starting with an
/// upper-case letter.
///
/// # Example
///
/// ```
/// use tibco_converter::codegen::utils::sanitize_class_name;
///
/// assert_eq!(sanitize_class_name("order-service"), "Orderservice");
/// assert_eq!(sanitize_class_name("2fa"), "Generated2fa");
/// ```
pub fn sanitize_class_name(name: &str) -> String {
    let mut sanitized = identifier_chars(name);
    if !sanitized.starts_with(|c: char| c.is_ascii_alphabetic()) {
        sanitized = format!("Generated{}", sanitized);
    }
    upper_first(&sanitized)
}

/// Make a Java method name: identifier characters only, starting with a
/// lower-case letter.
pub fn sanitize_method_name(name: &str) -> String {
    let mut sanitized = identifier_chars(name);
    if !sanitized.starts_with(|c: char| c.is_ascii_alphabetic()) {
        sanitized = format!("generated{}", sanitized);
    }
    lower_first(&sanitized)
}

/// Lower-case a package name, keep `[a-z0-9.]`, collapse dot runs and trim
/// leading/trailing dots.
pub fn sanitize_package_name(name: &str) -> String {
    let lowered: String = name
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '.')
        .collect();

    lowered
        .split('.')
        .filter(|segment| !segment.is_empty())
        .collect::<Vec<_>>()
        .join(".")
}

/// Deduplicated, sorted import block.
pub fn generate_imports<S: AsRef<str>>(imports: &[S]) -> String {
    imports
        .iter()
        .map(AsRef::as_ref)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(|target| format!("import {};", target))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn package_declaration(package: &str) -> String {
    format!("package {};", sanitize_package_name(package))
}

fn blank_runs() -> &'static Regex {
    static BLANK_RUNS: OnceLock<Regex> = OnceLock::new();
    BLANK_RUNS.get_or_init(|| Regex::new(r"\n(?:[ \t]*\n){2,}").expect("valid regex"))
}

/// Light cleanup of generated Java: LF line endings and no more than one
/// blank line in a row.
pub fn format_java_code(content: &str) -> String {
    let normalized = content.replace("\r\n", "\n");
    blank_runs().replace_all(&normalized, "\n\n").into_owned()
}
