//! HTTP endpoint contracts derived from HTTP receiver activities.

use serde::Serialize;

use super::utils::sanitize_method_name;
use crate::model::process::{Activity, ActivityKind, ActivitySettings, Process};

pub const DEFAULT_HTTP_METHOD: &str = "POST";
pub const DEFAULT_REQUEST_TYPE: &str = "RequestDTO";
pub const DEFAULT_RESPONSE_TYPE: &str = "ResponseDTO";

/// One controller method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Endpoint {
    /// Upper-case HTTP verb
    pub method: String,
    pub path: String,
    pub method_name: String,
    pub request_type: String,
    pub response_type: String,
    pub description: String,
    pub has_request_body: bool,
    pub has_path_variables: bool,
    pub has_query_params: bool,
}

/// Guesses payload types from an activity's mappings.
///
/// The controller generator only sees this trait, so a smarter strategy
/// (schema lookups, explicit annotations) can replace the default heuristics.
pub trait PayloadTypeInference {
    fn request_type(&self, activity: &Activity) -> String;

    fn response_type(&self, activity: &Activity, process: &Process) -> String;

    fn has_query_params(&self, activity: &Activity) -> bool;
}

/// Name-matching heuristics over mapping paths.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicInference;

impl PayloadTypeInference for HeuristicInference {
    /// First input mapping targeting something called `*Request*`.
    fn request_type(&self, activity: &Activity) -> String {
        activity
            .input_mappings
            .iter()
            .find(|m| m.target.contains("Request"))
            .map(|m| dto_name(&m.target))
            .unwrap_or_else(|| DEFAULT_REQUEST_TYPE.to_string())
    }

    /// First output mapping sourced from `*Response*`, else the request type
    /// of an HTTP sender reached by one transition.
    fn response_type(&self, activity: &Activity, process: &Process) -> String {
        if let Some(mapping) = activity
            .output_mappings
            .iter()
            .find(|m| m.source.contains("Response"))
        {
            return dto_name(&mapping.source);
        }

        process
            .outgoing(&activity.id)
            .filter_map(|transition| process.activity(&transition.to))
            .find(|next| next.kind == ActivityKind::HttpSender)
            .map(|sender| self.request_type(sender))
            .unwrap_or_else(|| DEFAULT_RESPONSE_TYPE.to_string())
    }

    fn has_query_params(&self, activity: &Activity) -> bool {
        activity
            .input_mappings
            .iter()
            .any(|m| m.source.contains("queryParam"))
    }
}

/// `OrderRequest.body.Customer` -> `CustomerDTO`
fn dto_name(path: &str) -> String {
    let last = path.rsplit('.').next().unwrap_or(path);
    format!("{}DTO", last)
}

/// Endpoints for every HTTP receiver in the process, in activity order.
pub fn synthesize_endpoints(process: &Process, inference: &dyn PayloadTypeInference) -> Vec<Endpoint> {
    process
        .activities_of_kind(ActivityKind::HttpReceiver)
        .map(|activity| endpoint_for(activity, process, inference))
        .collect()
}

/// Build the endpoint for one receiver activity.
pub fn endpoint_for(activity: &Activity, process: &Process, inference: &dyn PayloadTypeInference) -> Endpoint {
    let (method, path) = match &activity.config.settings {
        ActivitySettings::HttpReceiver { method, path, .. } => (method.as_deref(), path.as_deref()),
        _ => (None, None),
    };

    let method = method.unwrap_or(DEFAULT_HTTP_METHOD).to_ascii_uppercase();
    let path = path
        .map(str::to_string)
        .unwrap_or_else(|| format!("/{}", sanitize_method_name(&process.name)));

    let description = activity
        .config
        .description()
        .map(str::to_string)
        .unwrap_or_else(|| format!("Handle {} request for {}", method, path));

    Endpoint {
        has_request_body: method == "POST" || method == "PUT",
        has_path_variables: path.contains('{'),
        has_query_params: inference.has_query_params(activity),
        method_name: sanitize_method_name(&activity.name),
        request_type: inference.request_type(activity),
        response_type: inference.response_type(activity, process),
        description,
        method,
        path,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::process::{
        ActivityConfig, Mapping, MappingKind, Position, Transition, TransitionKind,
    };

    fn activity(name: &str, kind: ActivityKind, settings: ActivitySettings) -> Activity {
        Activity {
            id: name.to_string(),
            name: name.to_string(),
            kind,
            config: ActivityConfig {
                settings,
                extra: Default::default(),
            },
            input_mappings: Vec::new(),
            output_mappings: Vec::new(),
            position: Position::default(),
        }
    }

    fn receiver(name: &str, method: Option<&str>, path: Option<&str>) -> Activity {
        activity(
            name,
            ActivityKind::HttpReceiver,
            ActivitySettings::HttpReceiver {
                method: method.map(str::to_string),
                path: path.map(str::to_string),
                description: None,
            },
        )
    }

    fn mapping(source: &str, target: &str) -> Mapping {
        Mapping {
            source: source.to_string(),
            target: target.to_string(),
            kind: MappingKind::Direct,
            config: None,
        }
    }

    #[test]
    fn test_defaults() {
        let mut process = Process::new("Order Service");
        process.activities.push(receiver("Receive Order", None, None));

        let endpoints = synthesize_endpoints(&process, &HeuristicInference);
        assert_eq!(
            endpoints,
            vec![Endpoint {
                method: "POST".to_string(),
                path: "/orderService".to_string(),
                method_name: "receiveOrder".to_string(),
                request_type: DEFAULT_REQUEST_TYPE.to_string(),
                response_type: DEFAULT_RESPONSE_TYPE.to_string(),
                description: "Handle POST request for /orderService".to_string(),
                has_request_body: true,
                has_path_variables: false,
                has_query_params: false,
            }]
        );
    }

    #[test]
    fn test_get_with_path_variable() {
        let mut process = Process::new("Items");
        process
            .activities
            .push(receiver("GetItem", Some("get"), Some("/items/{id}")));

        let endpoint = &synthesize_endpoints(&process, &HeuristicInference)[0];
        assert_eq!(endpoint.method, "GET");
        assert_eq!(endpoint.path, "/items/{id}");
        assert!(endpoint.has_path_variables);
        assert!(!endpoint.has_request_body);
        assert_eq!(endpoint.description, "Handle GET request for /items/{id}");
    }

    #[test]
    fn test_types_from_mappings() {
        let mut process = Process::new("P");
        let mut receive = receiver("Receive", Some("PUT"), Some("/orders"));
        receive.input_mappings = vec![
            mapping("$_queryParam/id", "orderId"),
            mapping("$body", "api.OrderRequest"),
        ];
        receive.output_mappings = vec![mapping("svc.OrderResponse", "out")];
        process.activities.push(receive);

        let endpoint = &synthesize_endpoints(&process, &HeuristicInference)[0];
        assert_eq!(endpoint.request_type, "OrderRequestDTO");
        assert_eq!(endpoint.response_type, "OrderResponseDTO");
        assert!(endpoint.has_query_params);
    }

    #[test]
    fn test_response_type_from_next_http_sender() {
        let mut process = Process::new("P");
        process.activities.push(receiver("Receive", None, None));
        let mut sender = activity(
            "CallBackend",
            ActivityKind::HttpSender,
            ActivitySettings::HttpSender { method: None, url: None },
        );
        sender.input_mappings = vec![mapping("$x", "backend.QuoteRequest")];
        process.activities.push(sender);
        process
            .transitions
            .push(Transition::new("Receive", "CallBackend", TransitionKind::Success));

        let endpoint = &synthesize_endpoints(&process, &HeuristicInference)[0];
        assert_eq!(endpoint.response_type, "QuoteRequestDTO");
    }

    #[test]
    fn test_only_receivers_become_endpoints() {
        let mut process = Process::new("P");
        process.activities.push(activity(
            "Send",
            ActivityKind::HttpSender,
            ActivitySettings::HttpSender { method: None, url: None },
        ));
        assert!(synthesize_endpoints(&process, &HeuristicInference).is_empty());
    }
}
