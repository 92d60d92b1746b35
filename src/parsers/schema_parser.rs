//! XML Schema parser.
//!
//! Extracts top-level and nested element declarations, named complex and
//! simple types, and imports. External imports are recorded, never resolved.

use tracing::debug;

use super::xml_tree::{self, XmlTree, XmlValue};
use super::{report_tree_error, ElementError, ParserConfig};
use crate::diagnostics::{DiagnosticCode, Diagnostics, ParseResult, ValidationResult};
use crate::model::schema::{
    Element, Import, MaxOccurs, Restriction, RestrictionKind, RestrictionValue, Schema, SchemaType,
    TypeKind,
};

pub const XML_SCHEMA_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema";

const ROOT_MARKERS: &[&str] = &["xs:schema", "xsd:schema", "schema"];

const ROOT_CANDIDATES: &[&str] = &["xs:schema", "xsd:schema", "schema"];

/// Child groupings of a complex type that hold its properties, in read order.
const PROPERTY_GROUPS: &[&str] = &["sequence", "choice", "all"];

/// Facets scanned under a restriction, in output order. The numeric bounds
/// map to [`RestrictionKind::Pattern`].
const FACETS: &[&str] = &[
    "pattern",
    "length",
    "minLength",
    "maxLength",
    "enumeration",
    "minInclusive",
    "maxInclusive",
    "minExclusive",
    "maxExclusive",
];

#[derive(Debug, Default)]
pub struct SchemaParser {
    config: ParserConfig,
    diagnostics: Diagnostics,
}

impl SchemaParser {
    pub fn new(config: ParserConfig) -> Self {
        Self {
            config,
            diagnostics: Diagnostics::new(),
        }
    }

    /// Parse schema markup into a [`Schema`].
    pub fn parse(&mut self, raw: &str) -> ParseResult<Schema> {
        self.diagnostics.clear();
        debug!("Starting schema parsing");

        self.check(raw);
        if self.diagnostics.has_errors() {
            return self.diagnostics.parse_result(None);
        }

        let tree = match XmlTree::parse(raw) {
            Ok(tree) => tree,
            Err(e) => {
                report_tree_error(&e, &self.config, "SchemaParser::parse", &mut self.diagnostics);
                return self.diagnostics.parse_result(None);
            }
        };

        let Some(root) = find_root(tree.document()) else {
            self.diagnostics.add_error(
                "No schema definition found in XSD file",
                "root",
                DiagnosticCode::NoSchemaDef,
                None,
            );
            return self.diagnostics.parse_result(None);
        };

        let schema = Schema {
            target_namespace: root.field("targetNamespace").map(str::to_string),
            elements: self.extract_elements(root),
            types: self.extract_types(root),
            imports: extract_imports(root),
        };

        debug!(
            "Schema parsing completed. Found {} elements and {} types",
            schema.elements.len(),
            schema.types.len()
        );
        self.diagnostics.parse_result(Some(schema))
    }

    pub fn validate(&mut self, raw: &str) -> ValidationResult {
        self.diagnostics.clear();
        self.check(raw);
        self.diagnostics.validation_result()
    }

    fn check(&mut self, raw: &str) {
        for error in xml_tree::structural_check(raw).errors {
            self.diagnostics
                .add_error(error, "XML structure", DiagnosticCode::XmlInvalid, None);
        }

        if !ROOT_MARKERS.iter().any(|marker| raw.contains(marker)) {
            self.diagnostics.add_error(
                "Not a valid XSD file - missing schema element",
                "root",
                DiagnosticCode::InvalidXsd,
                None,
            );
        }

        let declares_xs = xml_tree::namespaces(raw)
            .values()
            .any(|uri| uri == XML_SCHEMA_NAMESPACE);
        if !declares_xs {
            self.diagnostics.add_warning(
                "Missing XML Schema namespace declaration",
                "namespaces",
                DiagnosticCode::MissingXsNamespace,
            );
        }
    }

    /// Every element reachable from `scope` that is not nested in another match.
    fn extract_elements(&mut self, scope: &XmlValue) -> Vec<Element> {
        let mut elements = Vec::new();
        for value in scope.nodes_named("element") {
            match extract_element(value) {
                Ok(element) => elements.push(element),
                Err(e) => e.report(&mut self.diagnostics),
            }
        }
        elements
    }

    fn extract_types(&mut self, root: &XmlValue) -> Vec<SchemaType> {
        let mut types = Vec::new();

        for value in root.nodes_named("complexType") {
            let Some(name) = value.field("name") else {
                ElementError::MissingTypeName("Complex").report(&mut self.diagnostics);
                continue;
            };

            let mut properties = Vec::new();
            for group in PROPERTY_GROUPS {
                if let Some(grouping) = value.child(group) {
                    properties.extend(self.extract_elements(grouping));
                }
            }

            types.push(SchemaType {
                name: name.to_string(),
                kind: TypeKind::Complex,
                base_type: base_type(value),
                properties,
                restrictions: Vec::new(),
            });
        }

        for value in root.nodes_named("simpleType") {
            let Some(name) = value.field("name") else {
                ElementError::MissingTypeName("Simple").report(&mut self.diagnostics);
                continue;
            };

            types.push(SchemaType {
                name: name.to_string(),
                kind: TypeKind::Simple,
                base_type: base_type(value),
                properties: Vec::new(),
                restrictions: extract_restrictions(value),
            });
        }

        types
    }
}

fn find_root(document: &XmlValue) -> Option<&XmlValue> {
    ROOT_CANDIDATES
        .iter()
        .filter_map(|candidate| document.value_at(candidate))
        .find(|value| value.as_node().is_some())
        .or_else(|| {
            document
                .nodes_named("schema")
                .find(|value| value.as_node().is_some())
        })
}

fn extract_element(value: &XmlValue) -> Result<Element, ElementError> {
    let name = value.field("name").ok_or(ElementError::MissingElementName)?;

    let invalid = |attribute: &'static str, raw: &str| ElementError::InvalidOccurs {
        element: name.to_string(),
        attribute,
        value: raw.to_string(),
    };

    let min_raw = value.field("minOccurs").unwrap_or("1");
    let min_occurs: u32 = min_raw
        .trim()
        .parse()
        .map_err(|_| invalid("minOccurs", min_raw))?;

    let max_occurs = match value.field("maxOccurs") {
        Some(raw) => MaxOccurs::parse(raw).map_err(|_| invalid("maxOccurs", raw))?,
        None => MaxOccurs::default(),
    };

    let documentation = value
        .child("annotation")
        .and_then(|annotation| annotation.child("documentation"))
        .and_then(XmlValue::as_text)
        .filter(|text| !text.is_empty())
        .map(str::to_string);

    Ok(Element {
        name: name.to_string(),
        type_name: value.field("type").unwrap_or("string").to_string(),
        required: min_occurs > 0,
        min_occurs,
        max_occurs,
        documentation,
    })
}

/// Base type from an extension, else from a restriction. The first container
/// found decides, even when it carries no `base`.
fn base_type(value: &XmlValue) -> Option<String> {
    let extension = value
        .child("extension")
        .or_else(|| value.child("complexContent").and_then(|c| c.child("extension")));
    if let Some(extension) = extension {
        return extension.field("base").map(str::to_string);
    }

    value
        .child("restriction")
        .or_else(|| value.child("simpleContent").and_then(|c| c.child("restriction")))
        .and_then(|restriction| restriction.field("base"))
        .map(str::to_string)
}

fn extract_restrictions(value: &XmlValue) -> Vec<Restriction> {
    let Some(restriction) = value.child("restriction") else {
        return Vec::new();
    };

    let mut restrictions = Vec::new();
    for facet in FACETS {
        let kind = RestrictionKind::from_facet(facet);
        for instance in restriction.nodes_named(facet) {
            let Some(raw) = instance
                .attribute("value")
                .or_else(|| instance.child("value").and_then(XmlValue::as_text))
            else {
                continue;
            };
            // An empty pattern would validate nothing
            if raw.is_empty() && kind == RestrictionKind::Pattern {
                debug!(facet, "Skipping empty pattern restriction");
                continue;
            }
            restrictions.push(Restriction {
                kind,
                value: RestrictionValue::from_text(raw),
            });
        }
    }
    restrictions
}

fn extract_imports(root: &XmlValue) -> Vec<Import> {
    root.nodes_named("import")
        .filter_map(|value| {
            Some(Import {
                namespace: value.field("namespace")?.to_string(),
                schema_location: value.field("schemaLocation")?.to_string(),
            })
        })
        .collect()
}
