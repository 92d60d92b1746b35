//! BusinessWorks process definition parser.
//!
//! Extracts a [`Process`] from `.bwp`/`.process` markup. Activities and
//! transitions are read one at a time; a broken one is reported as a warning
//! and skipped so the rest of the process still comes through.

use indexmap::IndexMap;
use tracing::debug;

use super::xml_tree::{self, local_name, XmlTree, XmlValue, ATTRIBUTE_PREFIX, TEXT_KEY};
use super::{report_tree_error, ElementError, ParserConfig};
use crate::diagnostics::{DiagnosticCode, Diagnostics, ParseResult, ValidationResult};
use crate::model::process::{
    Activity, ActivityConfig, ActivityKind, FaultHandler, Group, Mapping, MappingKind, Position,
    Process, Starter, Transition, TransitionKind, Variable, UNNAMED_PROCESS,
};

/// Marker every process definition must contain.
const ROOT_MARKER: &str = "pd:ProcessDefinition";

/// Root element names tried in order before falling back to a deep search.
const ROOT_CANDIDATES: &[&str] = &["pd:ProcessDefinition", "ProcessDefinition", "process", "bw:process"];

/// Attributes of the activity element that describe the activity rather than
/// configure it.
const STRUCTURAL_KEYS: &[&str] = &["name", "type", "x", "y"];

const BINDING_CONTAINERS: &[&str] = &["inputBindings", "outputBindings"];

/// Parser for process definitions.
///
/// Holds its diagnostics between calls; every `parse`/`validate` starts from
/// a clean slate.
#[derive(Debug, Default)]
pub struct ProcessParser {
    config: ParserConfig,
    diagnostics: Diagnostics,
}

impl ProcessParser {
    pub fn new(config: ParserConfig) -> Self {
        Self {
            config,
            diagnostics: Diagnostics::new(),
        }
    }

    /// Parse process markup into a [`Process`].
    ///
    /// # Arguments
    ///
    /// * `raw` - The full text of a `.bwp` or `.process` file
    ///
    /// # Returns
    ///
    /// A [`ParseResult`] whose `data` is present unless the document failed
    /// the structural checks, could not be loaded, or had no process root.
    pub fn parse(&mut self, raw: &str) -> ParseResult<Process> {
        self.diagnostics.clear();
        debug!("Starting process parsing");

        self.check(raw);
        if self.diagnostics.has_errors() {
            return self.diagnostics.parse_result(None);
        }

        let tree = match XmlTree::parse(raw) {
            Ok(tree) => tree,
            Err(e) => {
                report_tree_error(&e, &self.config, "ProcessParser::parse", &mut self.diagnostics);
                return self.diagnostics.parse_result(None);
            }
        };
        debug!("Process markup loaded");

        let Some(root) = find_root(tree.document()) else {
            self.diagnostics.add_error(
                "No process definition found in BWP file",
                "root",
                DiagnosticCode::NoProcessDef,
                None,
            );
            return self.diagnostics.parse_result(None);
        };

        let process = self.extract_process(root);
        debug!(
            process = %process.name,
            "Process parsing completed. Found {} activities",
            process.activities.len()
        );
        self.diagnostics.parse_result(Some(process))
    }

    /// Run the structural and marker checks without building a model.
    pub fn validate(&mut self, raw: &str) -> ValidationResult {
        self.diagnostics.clear();
        self.check(raw);
        self.diagnostics.validation_result()
    }

    fn check(&mut self, raw: &str) {
        let report = xml_tree::structural_check(raw);
        for error in report.errors {
            self.diagnostics
                .add_error(error, "XML structure", DiagnosticCode::XmlInvalid, None);
        }

        if !raw.contains(ROOT_MARKER) {
            self.diagnostics.add_error(
                "Not a valid BWP file - missing ProcessDefinition element",
                "root",
                DiagnosticCode::InvalidBwp,
                None,
            );
        }

        let namespaces = xml_tree::namespaces(raw);
        if !namespaces.contains_key("pd") && !namespaces.contains_key("default") {
            self.diagnostics.add_warning(
                "Missing pd namespace declaration",
                "namespaces",
                DiagnosticCode::MissingNamespace,
            );
        }
    }

    fn extract_process(&mut self, root: &XmlValue) -> Process {
        let name = root.field("name").unwrap_or(UNNAMED_PROCESS).to_string();
        let description = root
            .field("description")
            .or_else(|| root.field("documentation"))
            .map(str::to_string);

        let mut activities = Vec::new();
        for element in root.nodes_named("activity") {
            match extract_activity(element) {
                Ok(activity) => activities.push(activity),
                Err(e) => e.report(&mut self.diagnostics),
            }
        }

        let mut transitions = Vec::new();
        for element in root.nodes_named("transition") {
            match extract_transition(element) {
                Ok(transition) => transitions.push(transition),
                Err(e) => e.report(&mut self.diagnostics),
            }
        }

        Process {
            name,
            description,
            activities,
            transitions,
            variables: extract_variables(root),
            groups: extract_groups(root),
            starter: extract_starter(root),
            fault_handlers: extract_fault_handlers(root),
            global_variables: extract_global_variables(root),
        }
    }
}

fn find_root(document: &XmlValue) -> Option<&XmlValue> {
    ROOT_CANDIDATES
        .iter()
        .filter_map(|candidate| document.value_at(candidate))
        .find(|value| value.as_node().is_some())
        .or_else(|| {
            document
                .nodes_named("ProcessDefinition")
                .find(|value| value.as_node().is_some())
        })
}

fn extract_activity(element: &XmlValue) -> Result<Activity, ElementError> {
    if element.as_node().is_none() {
        return Err(ElementError::MalformedActivity(
            "activity is not a structured element".to_string(),
        ));
    }

    let id = element
        .field("name")
        .ok_or(ElementError::MissingActivityName)?
        .to_string();

    let kind = ActivityKind::from_type_id(element.field("type").unwrap_or_default());
    let input_mappings = extract_mappings(element, "inputBindings")?;
    let output_mappings = extract_mappings(element, "outputBindings")?;

    Ok(Activity {
        name: id.clone(),
        id,
        kind,
        config: ActivityConfig::from_bag(kind, config_bag(element)),
        input_mappings,
        output_mappings,
        position: Position {
            x: coordinate(element, "x"),
            y: coordinate(element, "y"),
        },
    })
}

/// Mappings under a bindings container. A missing container means none.
fn extract_mappings(element: &XmlValue, container: &str) -> Result<Vec<Mapping>, ElementError> {
    match element.child(container) {
        None => Ok(Vec::new()),
        Some(XmlValue::List(_)) => Err(ElementError::MalformedActivity(format!(
            "{} appears more than once",
            container
        ))),
        Some(bindings) => Ok(bindings
            .child("mapping")
            .map(|mappings| mappings.items().iter().map(mapping_from).collect())
            .unwrap_or_default()),
    }
}

fn mapping_from(item: &XmlValue) -> Mapping {
    Mapping {
        source: item.field("source").unwrap_or_default().to_string(),
        target: item.field("target").unwrap_or_default().to_string(),
        kind: MappingKind::Direct,
        config: Some(item.clone()),
    }
}

fn coordinate(element: &XmlValue, axis: &str) -> i64 {
    element
        .field(axis)
        .and_then(|raw| raw.trim().parse::<f64>().ok())
        .filter(|value| value.is_finite())
        .map(|value| value.trunc() as i64)
        .unwrap_or(0)
}

/// Collect the raw configuration of an activity.
///
/// Reads the `config` child, else the `configuration` child, else the activity
/// itself. Attributes and scalar children are copied along with the binding
/// containers; other structured children are left out.
fn config_bag(element: &XmlValue) -> IndexMap<String, XmlValue> {
    let explicit = ["config", "configuration"]
        .iter()
        .find_map(|tag| element.child(tag).filter(|value| value.as_node().is_some()));
    let (source, on_activity) = match explicit {
        Some(config) => (config, false),
        None => (element, true),
    };

    let mut bag = IndexMap::new();
    let Some(node) = source.as_node() else {
        return bag;
    };

    for (key, value) in node.entries() {
        if key == TEXT_KEY {
            continue;
        }
        let (name, keep) = match key.strip_prefix(ATTRIBUTE_PREFIX) {
            Some(attribute) => (attribute, true),
            None => {
                let local = local_name(key);
                let keep = matches!(value, XmlValue::Text(_)) || BINDING_CONTAINERS.contains(&local);
                (local, keep)
            }
        };
        if !keep || (on_activity && STRUCTURAL_KEYS.contains(&name)) {
            continue;
        }
        bag.insert(name.to_string(), value.clone());
    }
    bag
}

fn extract_transition(element: &XmlValue) -> Result<Transition, ElementError> {
    let (Some(from), Some(to)) = (element.field("from"), element.field("to")) else {
        return Err(ElementError::MissingTransitionEnds);
    };

    let kind = TransitionKind::parse(
        element
            .field("type")
            .or_else(|| element.field("conditionType")),
    );
    let mut transition = Transition::new(from, to, kind);
    transition.condition = element
        .field("condition")
        .or_else(|| element.field("xpath"))
        .map(str::to_string);
    Ok(transition)
}

fn extract_variables(_root: &XmlValue) -> Vec<Variable> {
    Vec::new()
}

fn extract_groups(_root: &XmlValue) -> Vec<Group> {
    Vec::new()
}

fn extract_starter(_root: &XmlValue) -> Option<Starter> {
    None
}

fn extract_fault_handlers(_root: &XmlValue) -> Vec<FaultHandler> {
    Vec::new()
}

fn extract_global_variables(_root: &XmlValue) -> Vec<String> {
    Vec::new()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::process::ActivitySettings;

    const NS: &str = r#"xmlns:pd="http://xmlns.tibco.com/bw/process/2003""#;

    fn wrap(body: &str) -> String {
        format!(r#"<pd:ProcessDefinition {} name="Orders">{}</pd:ProcessDefinition>"#, NS, body)
    }

    #[test]
    fn test_parse_activity_with_config_child() {
        let raw = wrap(
            r#"<pd:activity name="Receive" type="com.tibco.plugin.http.activities.HttpReceiveActivity" x="40" y="abc">
                 <config><method>get</method><path>/items/{id}</path><timeout>30</timeout></config>
               </pd:activity>"#,
        );

        let result = ProcessParser::default().parse(&raw);
        assert!(result.success, "{:?}", result.errors);

        let process = result.data.unwrap();
        assert_eq!(process.name, "Orders");
        let activity = &process.activities[0];
        assert_eq!(activity.id, "Receive");
        assert_eq!(activity.kind, ActivityKind::HttpReceiver);
        assert_eq!(activity.position, Position { x: 40, y: 0 });
        assert_eq!(
            activity.config.settings,
            ActivitySettings::HttpReceiver {
                method: Some("get".to_string()),
                path: Some("/items/{id}".to_string()),
                description: None,
            }
        );
        assert_eq!(activity.config.extra_text("timeout"), Some("30"));
    }

    #[test]
    fn test_config_from_activity_excludes_structural_attributes() {
        let raw = wrap(r#"<pd:activity name="Wait" type="com.tibco.pe.core.SleepActivity" interval="500" note="n"/>"#);

        let process = ProcessParser::default().parse(&raw).data.unwrap();
        let config = &process.activities[0].config;
        assert_eq!(
            config.settings,
            ActivitySettings::Sleep {
                interval: Some("500".to_string())
            }
        );
        assert_eq!(config.extra.keys().collect::<Vec<_>>(), vec!["note"]);
    }

    #[test]
    fn test_type_read_from_child_element() {
        let raw = wrap(
            r#"<pd:activity name="Map"><pd:type>com.tibco.pe.core.MapperActivity</pd:type></pd:activity>"#,
        );
        let process = ProcessParser::default().parse(&raw).data.unwrap();
        assert_eq!(process.activities[0].kind, ActivityKind::Mapper);
    }

    #[test]
    fn test_mappings_single_and_list() {
        let raw = wrap(
            r#"<pd:activity name="A">
                 <inputBindings><mapping source="$start/a" target="OrderRequest.body"/></inputBindings>
                 <outputBindings>
                   <mapping><source>x</source><target>y</target></mapping>
                   <mapping target="only-target"/>
                 </outputBindings>
               </pd:activity>"#,
        );
        let process = ProcessParser::default().parse(&raw).data.unwrap();
        let activity = &process.activities[0];

        assert_eq!(activity.input_mappings.len(), 1);
        assert_eq!(activity.input_mappings[0].target, "OrderRequest.body");
        assert_eq!(activity.output_mappings.len(), 2);
        assert_eq!(activity.output_mappings[0].source, "x");
        assert_eq!(activity.output_mappings[1].source, "");
        assert!(activity
            .input_mappings
            .iter()
            .all(|m| m.kind == MappingKind::Direct && m.config.is_some()));
    }

    #[test]
    fn test_transition_defaults_and_condition_type() {
        let raw = wrap(
            r#"<pd:activity name="A"/>
               <pd:transition><pd:from>A</pd:from><pd:to>B</pd:to><pd:conditionType>error</pd:conditionType></pd:transition>
               <pd:transition from="B" to="C"/>
               <pd:transition from="C"/>"#,
        );
        let result = ProcessParser::default().parse(&raw);
        let process = result.data.as_ref().unwrap();

        assert_eq!(process.transitions.len(), 2);
        assert_eq!(process.transitions[0].id, "A->B");
        assert_eq!(process.transitions[0].kind, TransitionKind::Error);
        assert_eq!(process.transitions[1].kind, TransitionKind::Success);
        assert_eq!(result.count_code(DiagnosticCode::InvalidTransition), 1);
    }

    #[test]
    fn test_fallback_root_and_unnamed_process() {
        let raw = format!(
            r#"<wrapper {}><pd:ProcessDefinition><pd:description>demo</pd:description></pd:ProcessDefinition></wrapper>"#,
            NS
        );
        let result = ProcessParser::default().parse(&raw);
        assert!(result.success);
        let process = result.data.unwrap();
        assert_eq!(process.name, UNNAMED_PROCESS);
        assert_eq!(process.description.as_deref(), Some("demo"));
        assert!(process.variables.is_empty());
        assert!(process.starter.is_none());
    }

    #[test]
    fn test_missing_namespace_is_only_a_warning() {
        let raw = r#"<pd:ProcessDefinition name="P"><pd:activity name="A"/></pd:ProcessDefinition>"#;
        let result = ProcessParser::default().parse(raw);
        assert!(result.success);
        assert_eq!(result.count_code(DiagnosticCode::MissingNamespace), 1);
    }

    #[test]
    fn test_validate_reports_without_model() {
        let mut parser = ProcessParser::default();
        let result = parser.validate("<root><child/></root>");
        assert!(!result.valid);
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].code, DiagnosticCode::InvalidBwp);
    }
}
