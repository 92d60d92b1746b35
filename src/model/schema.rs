//! Schema model extracted from an XML Schema document.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::ParseIntError;

/// Literal used for an unbounded `maxOccurs`.
pub const UNBOUNDED: &str = "unbounded";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schema {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_namespace: Option<String>,
    #[serde(default)]
    pub elements: Vec<Element>,
    #[serde(default)]
    pub types: Vec<SchemaType>,
    #[serde(default)]
    pub imports: Vec<Import>,
}

impl Schema {
    pub fn element(&self, name: &str) -> Option<&Element> {
        self.elements.iter().find(|e| e.name == name)
    }

    pub fn schema_type(&self, name: &str) -> Option<&SchemaType> {
        self.types.iter().find(|t| t.name == name)
    }
}

/// An element declaration, either top level or a property of a complex type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Element {
    pub name: String,
    /// Declared type, possibly prefixed (`xs:string`); `string` when absent
    #[serde(rename = "type")]
    pub type_name: String,
    /// Always `min_occurs > 0`
    pub required: bool,
    pub min_occurs: u32,
    pub max_occurs: MaxOccurs,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub documentation: Option<String>,
}

impl Element {
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
            required: true,
            min_occurs: 1,
            max_occurs: MaxOccurs::default(),
            documentation: None,
        }
    }
}

/// Upper occurrence bound: a number, or the `unbounded` sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "OccursRepr", try_from = "OccursRepr")]
pub enum MaxOccurs {
    Bounded(u32),
    Unbounded,
}

impl Default for MaxOccurs {
    fn default() -> Self {
        MaxOccurs::Bounded(1)
    }
}

impl MaxOccurs {
    pub fn parse(value: &str) -> Result<Self, ParseIntError> {
        let value = value.trim();
        if value == UNBOUNDED {
            return Ok(MaxOccurs::Unbounded);
        }
        value.parse().map(MaxOccurs::Bounded)
    }

    pub fn is_many(&self) -> bool {
        !matches!(self, MaxOccurs::Bounded(0) | MaxOccurs::Bounded(1))
    }
}

impl fmt::Display for MaxOccurs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MaxOccurs::Bounded(n) => write!(f, "{}", n),
            MaxOccurs::Unbounded => f.write_str(UNBOUNDED),
        }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum OccursRepr {
    Count(u32),
    Literal(String),
}

impl From<MaxOccurs> for OccursRepr {
    fn from(value: MaxOccurs) -> Self {
        match value {
            MaxOccurs::Bounded(n) => OccursRepr::Count(n),
            MaxOccurs::Unbounded => OccursRepr::Literal(UNBOUNDED.to_string()),
        }
    }
}

impl TryFrom<OccursRepr> for MaxOccurs {
    type Error = String;

    fn try_from(value: OccursRepr) -> Result<Self, Self::Error> {
        match value {
            OccursRepr::Count(n) => Ok(MaxOccurs::Bounded(n)),
            OccursRepr::Literal(s) => {
                MaxOccurs::parse(&s).map_err(|e| format!("invalid maxOccurs '{}': {}", s, e))
            }
        }
    }
}

/// A named simple or complex type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaType {
    pub name: String,
    pub kind: TypeKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_type: Option<String>,
    /// Populated for complex types only
    #[serde(default)]
    pub properties: Vec<Element>,
    /// Populated for simple types only
    #[serde(default)]
    pub restrictions: Vec<Restriction>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TypeKind {
    Simple,
    Complex,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Restriction {
    pub kind: RestrictionKind,
    pub value: RestrictionValue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RestrictionKind {
    Pattern,
    Length,
    MinLength,
    MaxLength,
    Enumeration,
}

impl RestrictionKind {
    /// Map a facet tag to a kind. Facets without a kind of their own, such
    /// as the numeric bounds, fall back to `Pattern`.
    pub fn from_facet(facet: &str) -> Self {
        match facet {
            "length" => RestrictionKind::Length,
            "minLength" => RestrictionKind::MinLength,
            "maxLength" => RestrictionKind::MaxLength,
            "enumeration" => RestrictionKind::Enumeration,
            _ => RestrictionKind::Pattern,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RestrictionValue {
    Number(f64),
    Text(String),
}

impl RestrictionValue {
    /// Numbers are recognised only in canonical form, so `"007"` and `"1e3"`
    /// stay text and round-trip unchanged.
    pub fn from_text(value: &str) -> Self {
        match value.parse::<f64>() {
            Ok(n) if n.is_finite() && n.to_string() == value => RestrictionValue::Number(n),
            _ => RestrictionValue::Text(value.to_string()),
        }
    }
}

impl fmt::Display for RestrictionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RestrictionValue::Number(n) => write!(f, "{}", n),
            RestrictionValue::Text(s) => f.write_str(s),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Import {
    pub namespace: String,
    pub schema_location: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_max_occurs_parse() {
        assert_eq!(MaxOccurs::parse("unbounded"), Ok(MaxOccurs::Unbounded));
        assert_eq!(MaxOccurs::parse("5"), Ok(MaxOccurs::Bounded(5)));
        assert!(MaxOccurs::parse("many").is_err());
        assert!(MaxOccurs::Unbounded.is_many());
        assert!(!MaxOccurs::Bounded(1).is_many());
    }

    #[test]
    fn test_max_occurs_serializes_as_number_or_sentinel() {
        assert_eq!(serde_json::to_value(MaxOccurs::Bounded(3)).unwrap(), serde_json::json!(3));
        assert_eq!(
            serde_json::to_value(MaxOccurs::Unbounded).unwrap(),
            serde_json::json!("unbounded")
        );

        let back: MaxOccurs = serde_json::from_value(serde_json::json!("unbounded")).unwrap();
        assert_eq!(back, MaxOccurs::Unbounded);
        assert!(serde_json::from_value::<MaxOccurs>(serde_json::json!("lots")).is_err());
    }

    #[test]
    fn test_restriction_value_canonical_numbers() {
        assert_eq!(RestrictionValue::from_text("5"), RestrictionValue::Number(5.0));
        assert_eq!(RestrictionValue::from_text("2.5"), RestrictionValue::Number(2.5));
        assert_eq!(
            RestrictionValue::from_text("007"),
            RestrictionValue::Text("007".to_string())
        );
        assert_eq!(
            RestrictionValue::from_text("[A-Z]+"),
            RestrictionValue::Text("[A-Z]+".to_string())
        );
        assert_eq!(RestrictionValue::Number(10.0).to_string(), "10");
    }

    #[test]
    fn test_facet_lookup_defaults_to_pattern() {
        assert_eq!(RestrictionKind::from_facet("maxLength"), RestrictionKind::MaxLength);
        assert_eq!(RestrictionKind::from_facet("pattern"), RestrictionKind::Pattern);
        assert_eq!(RestrictionKind::from_facet("minInclusive"), RestrictionKind::Pattern);
        assert_eq!(RestrictionKind::from_facet("totalDigits"), RestrictionKind::Pattern);
    }
}
