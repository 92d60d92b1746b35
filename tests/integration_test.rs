//! Integration tests for parsing, generation and the conversion driver

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tibco_converter::analysis::{analyze_path, Difficulty};
use tibco_converter::codegen::{write_generated_files, ControllerGenerator, FileKind, GenerationConfig};
use tibco_converter::convert::Converter;
use tibco_converter::model::{ActivityKind, ActivitySettings, MaxOccurs, RestrictionKind, RestrictionValue, TransitionKind};
use tibco_converter::{DiagnosticCode, ProcessParser, SchemaParser};

fn fixture_path(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures").join(name)
}

fn fixture(name: &str) -> String {
    fs::read_to_string(fixture_path(name)).unwrap()
}

#[test]
fn test_parse_order_service() {
    let result = ProcessParser::default().parse(&fixture("order_service.bwp"));
    assert!(result.success, "{:?}", result.errors);

    let process = result.data.as_ref().unwrap();
    assert_eq!(process.name, "Order Service");
    assert_eq!(process.description.as_deref(), Some("Accepts and looks up customer orders"));

    // the nameless activity is skipped with a warning
    let names: Vec<_> = process.activities.iter().map(|a| a.name.as_str()).collect();
    assert_eq!(names, vec!["GetOrder", "CreateOrder", "CallInventory", "SaveOrder", "Audit"]);
    assert_eq!(result.count_code(DiagnosticCode::MissingActivityId), 1);

    let get = process.activity("GetOrder").unwrap();
    assert_eq!(get.position.x, 120);
    assert_eq!(get.position.y, 80);

    let save = process.activity("SaveOrder").unwrap();
    assert_eq!(save.kind, ActivityKind::JdbcUpdate);
    assert_eq!(
        save.config.settings,
        ActivitySettings::Jdbc {
            connection: Some("/Shared/OrdersDb.sharedjdbc".to_string()),
            statement: Some("INSERT INTO orders (id, total) VALUES (?, ?)".to_string()),
        }
    );

    assert_eq!(process.transitions.len(), 3);
    assert_eq!(process.transitions[0].kind, TransitionKind::Always);
    assert_eq!(process.transitions[2].kind, TransitionKind::Error);
    assert_eq!(result.count_code(DiagnosticCode::InvalidTransition), 1);
}

#[test]
fn test_repeated_bindings_skip_only_that_activity() {
    let raw = r#"<pd:ProcessDefinition xmlns:pd="http://xmlns.tibco.com/bw/process/2003">
        <pd:name>Bindings</pd:name>
        <pd:activity name="Receive">
            <pd:type>com.tibco.plugin.http.activities.HttpReceiveActivity</pd:type>
        </pd:activity>
        <pd:activity name="Twice">
            <pd:type>com.tibco.pe.core.MapperActivity</pd:type>
            <inputBindings><mapping source="$start/a" target="a"/></inputBindings>
            <inputBindings><mapping source="$start/b" target="b"/></inputBindings>
        </pd:activity>
        <pd:activity name="Save">
            <pd:type>com.tibco.plugin.jdbc.activities.JDBCUpdateActivity</pd:type>
            <inputBindings><mapping source="$Twice/a" target="id"/></inputBindings>
        </pd:activity>
    </pd:ProcessDefinition>"#;

    let result = ProcessParser::default().parse(raw);
    assert!(result.success, "{:?}", result.errors);
    assert_eq!(result.count_code(DiagnosticCode::ActivityParseError), 1);

    let process = result.data.as_ref().unwrap();
    let names: Vec<_> = process.activities.iter().map(|a| a.name.as_str()).collect();
    assert_eq!(names, vec!["Receive", "Save"]);
    assert_eq!(process.activity("Save").unwrap().input_mappings.len(), 1);
}

#[test]
fn test_extraction_is_idempotent() {
    let raw = fixture("order_service.bwp");
    let mut parser = ProcessParser::default();

    let first = parser.parse(&raw);
    let second = parser.parse(&raw);

    assert_eq!(first.data, second.data);
    assert_eq!(first.warnings, second.warnings);
    assert_eq!(first.errors, second.errors);
}

#[test]
fn test_missing_root_marker() {
    let result = ProcessParser::default().parse(r#"<process name="x"><activity name="a"/></process>"#);

    assert!(!result.success);
    assert!(result.data.is_none());
    assert_eq!(result.count_code(DiagnosticCode::InvalidBwp), 1);

    let result = SchemaParser::default().parse("<types><type name=\"a\"/></types>");
    assert!(result.data.is_none());
    assert_eq!(result.count_code(DiagnosticCode::InvalidXsd), 1);
}

#[test]
fn test_unbalanced_markup_short_circuits() {
    let raw = r#"<pd:ProcessDefinition xmlns:pd="http://xmlns.tibco.com/bw/process/2003">
        <pd:activity name="A">
    </pd:ProcessDefinition>"#;

    let mut parser = ProcessParser::default();
    let validation = parser.validate(raw);
    assert!(!validation.valid);
    assert!(validation.errors.iter().all(|e| e.code == DiagnosticCode::XmlInvalid));

    let result = parser.parse(raw);
    assert!(result.data.is_none());
    assert_eq!(result.count_code(DiagnosticCode::NoProcessDef), 0);
}

#[test]
fn test_parse_orders_schema() {
    let result = SchemaParser::default().parse(&fixture("orders.xsd"));
    assert!(result.success, "{:?}", result.errors);
    assert_eq!(result.count_code(DiagnosticCode::MissingElementName), 1);
    assert_eq!(result.count_code(DiagnosticCode::MissingXsNamespace), 0);

    let schema = result.data.unwrap();
    assert_eq!(schema.target_namespace.as_deref(), Some("http://acme.com/orders"));
    assert_eq!(schema.imports.len(), 1);
    assert_eq!(schema.imports[0].schema_location, "common.xsd");

    let order = schema.element("Order").unwrap();
    assert_eq!(order.type_name, "OrderType");
    assert_eq!(order.documentation.as_deref(), Some("A customer order"));

    let tag = schema.element("Tag").unwrap();
    assert!(!tag.required);
    assert_eq!(tag.max_occurs, MaxOccurs::Unbounded);

    let order_type = schema.schema_type("OrderType").unwrap();
    let properties: Vec<_> = order_type.properties.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(properties, vec!["id", "lines"]);
    assert_eq!(order_type.properties[1].max_occurs, MaxOccurs::Unbounded);

    let currency = schema.schema_type("CurrencyCode").unwrap();
    assert_eq!(currency.base_type.as_deref(), Some("xs:string"));
    assert_eq!(currency.restrictions[0].kind, RestrictionKind::Pattern);
    assert_eq!(currency.restrictions[0].value, RestrictionValue::Text("[A-Z]+".to_string()));
    assert_eq!(currency.restrictions[1].kind, RestrictionKind::Length);
    assert_eq!(currency.restrictions[1].value, RestrictionValue::Number(3.0));
}

#[test]
fn test_generate_controller_with_shipped_template() {
    let process = ProcessParser::default()
        .parse(&fixture("order_service.bwp"))
        .data
        .unwrap();

    let result = ControllerGenerator::default().generate(&process, &GenerationConfig::default());
    assert!(result.success, "{:?}", result.errors);
    assert_eq!(result.files.len(), 1);

    let file = &result.files[0];
    assert_eq!(file.kind, FileKind::Controller);
    assert_eq!(file.path, "com/example/converted/controller/OrderServiceController.java");

    let java = &file.content;
    assert!(java.starts_with("package com.example.converted.controller;\n"));
    assert!(java.contains("import javax.validation.Valid;"));
    assert!(java.contains("import java.util.Map;"));
    assert!(java.contains("import lombok.extern.slf4j.Slf4j;"));
    assert!(java.contains("@Slf4j\n@RestController\npublic class OrderServiceController {"));
    assert!(java.contains(" * Accepts and looks up customer orders"));

    assert!(java.contains("@GetMapping(\"/orders/{id}\")"));
    assert!(java.contains(
        "public ResponseEntity<ResponseDTO> getOrder(@PathVariable Map<String, String> pathVariables, @RequestParam Map<String, String> queryParams) {"
    ));
    assert!(java.contains("     * Look up one order"));

    assert!(java.contains("@PostMapping(\"/orders\")"));
    assert!(java.contains(
        "public ResponseEntity<ReservationRequestDTO> createOrder(@Valid @RequestBody OrderRequestDTO request) {"
    ));
    assert!(java.contains("return ResponseEntity.status(201).build();"));
    assert!(java.trim_end().ends_with('}'));
    assert!(!java.contains("\n\n\n"));
}

#[test]
fn test_generate_without_lombok_or_validation() {
    let process = ProcessParser::default()
        .parse(&fixture("order_service.bwp"))
        .data
        .unwrap();

    let mut config = GenerationConfig::default();
    config.package_name = "com.acme.orders".to_string();
    config.options.use_lombok = false;
    config.options.use_validation = false;

    let result = ControllerGenerator::default().generate(&process, &config);
    let java = &result.files[0].content;

    assert_eq!(result.files[0].path, "com/acme/orders/controller/OrderServiceController.java");
    assert!(!java.contains("Slf4j"));
    assert!(!java.contains("log.info"));
    assert!(!java.contains("javax.validation"));
    assert!(java.contains("createOrder(@RequestBody OrderRequestDTO request)"));
}

#[test]
fn test_no_http_receiver_generates_nothing() {
    let process = ProcessParser::default().parse(&fixture("no_http.bwp")).data.unwrap();

    let result = ControllerGenerator::default().generate(&process, &GenerationConfig::default());
    assert!(result.success);
    assert!(result.files.is_empty());
    assert_eq!(result.warnings.len(), 1);
    assert_eq!(result.warnings[0].code, DiagnosticCode::NoHttpActivities);
    assert_eq!(result.warnings[0].source, "Nightly Export");
}

#[test]
fn test_convert_directory_and_write() {
    let input = TempDir::new().unwrap();
    fs::create_dir_all(input.path().join("schemas")).unwrap();
    fs::copy(fixture_path("order_service.bwp"), input.path().join("order_service.bwp")).unwrap();
    fs::copy(fixture_path("no_http.bwp"), input.path().join("no_http.bwp")).unwrap();
    fs::copy(fixture_path("orders.xsd"), input.path().join("schemas/orders.xsd")).unwrap();
    fs::write(input.path().join("README.txt"), "ignored").unwrap();

    let config = GenerationConfig::default();
    let mut converter = Converter::default();
    let result = converter.convert_path(input.path(), &config);

    assert!(result.success, "{:?}", result.errors);
    assert_eq!(result.statistics.processes_converted, 2);
    assert_eq!(result.statistics.activities_converted, 8);
    assert_eq!(result.statistics.files_generated, 1);
    assert!(result.warnings.iter().any(|w| w.code == DiagnosticCode::NoHttpActivities));

    let output = TempDir::new().unwrap();
    let written = write_generated_files(output.path(), &result.generated_files, false).unwrap();
    assert_eq!(written.len(), 1);
    assert!(output
        .path()
        .join("com/example/converted/controller/OrderServiceController.java")
        .is_file());
}

#[test]
fn test_analyze_fixtures() {
    let dir = TempDir::new().unwrap();
    fs::copy(fixture_path("order_service.bwp"), dir.path().join("order_service.bwp")).unwrap();
    fs::copy(fixture_path("no_http.bwp"), dir.path().join("no_http.bwp")).unwrap();
    fs::copy(fixture_path("orders.xsd"), dir.path().join("orders.xsd")).unwrap();
    fs::write(dir.path().join("broken.bwp"), "<pd:ProcessDefinition>").unwrap();

    let report = analyze_path(&mut Converter::default(), dir.path()).unwrap();

    assert_eq!(report.processes.len(), 2);
    assert_eq!(report.errors.len(), 1);
    assert!(report.errors[0].contains("broken.bwp"));

    let orders = report.processes.iter().find(|p| p.name == "Order Service").unwrap();
    assert_eq!(orders.http_endpoints, 3);
    assert_eq!(orders.database_operations, 1);
    assert_eq!(orders.dependencies, vec!["Process: /Shared/Audit.process"]);

    // JavaCode activity in the nightly export
    assert_eq!(report.summary.conversion_difficulty, Difficulty::High);
    assert_eq!(report.summary.total_activities, 8);
}
