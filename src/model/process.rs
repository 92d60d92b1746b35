//! Process model extracted from a BusinessWorks process definition.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::parsers::xml_tree::XmlValue;

/// Name used when a process definition carries none.
pub const UNNAMED_PROCESS: &str = "UnnamedProcess";

/// A BusinessWorks process: activities wired together by transitions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Process {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub activities: Vec<Activity>,
    #[serde(default)]
    pub transitions: Vec<Transition>,
    #[serde(default)]
    pub variables: Vec<Variable>,
    #[serde(default)]
    pub groups: Vec<Group>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub starter: Option<Starter>,
    #[serde(default)]
    pub fault_handlers: Vec<FaultHandler>,
    #[serde(default)]
    pub global_variables: Vec<String>,
}

impl Process {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Look up an activity by id. Ids are not guaranteed unique; the first wins.
    pub fn activity(&self, id: &str) -> Option<&Activity> {
        self.activities.iter().find(|a| a.id == id)
    }

    pub fn activities_of_kind(&self, kind: ActivityKind) -> impl Iterator<Item = &Activity> {
        self.activities.iter().filter(move |a| a.kind == kind)
    }

    pub fn has_activity_kind(&self, kind: ActivityKind) -> bool {
        self.activities.iter().any(|a| a.kind == kind)
    }

    /// Transitions leaving the given activity, in document order.
    pub fn outgoing<'a>(&'a self, activity_id: &'a str) -> impl Iterator<Item = &'a Transition> {
        self.transitions.iter().filter(move |t| t.from == activity_id)
    }
}

/// A single step in the process graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    /// Same as `name`: activities are identified by their name attribute
    pub id: String,
    pub name: String,
    pub kind: ActivityKind,
    pub config: ActivityConfig,
    #[serde(default)]
    pub input_mappings: Vec<Mapping>,
    #[serde(default)]
    pub output_mappings: Vec<Mapping>,
    /// Designer coordinates; advisory only
    #[serde(default)]
    pub position: Position,
}

impl Activity {
    pub fn mapping_count(&self) -> usize {
        self.input_mappings.len() + self.output_mappings.len()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub x: i64,
    pub y: i64,
}

/// Closed set of activity kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActivityKind {
    HttpReceiver,
    HttpSender,
    JdbcQuery,
    JdbcUpdate,
    JdbcCall,
    JmsQueueSender,
    JmsQueueReceiver,
    JmsTopicPublisher,
    JmsTopicSubscriber,
    ReadFile,
    WriteFile,
    Mapper,
    JavaCode,
    CallProcess,
    Null,
    Sleep,
    Catch,
    Rethrow,
}

impl ActivityKind {
    pub const ALL: [ActivityKind; 18] = [
        ActivityKind::HttpReceiver,
        ActivityKind::HttpSender,
        ActivityKind::JdbcQuery,
        ActivityKind::JdbcUpdate,
        ActivityKind::JdbcCall,
        ActivityKind::JmsQueueSender,
        ActivityKind::JmsQueueReceiver,
        ActivityKind::JmsTopicPublisher,
        ActivityKind::JmsTopicSubscriber,
        ActivityKind::ReadFile,
        ActivityKind::WriteFile,
        ActivityKind::Mapper,
        ActivityKind::JavaCode,
        ActivityKind::CallProcess,
        ActivityKind::Null,
        ActivityKind::Sleep,
        ActivityKind::Catch,
        ActivityKind::Rethrow,
    ];

    /// Resolve a fully qualified BusinessWorks activity class.
    ///
    /// Unknown identifiers resolve to [`ActivityKind::Null`].
    pub fn from_type_id(type_id: &str) -> Self {
        match type_id.trim() {
            "com.tibco.plugin.http.activities.HttpReceiveActivity" => ActivityKind::HttpReceiver,
            "com.tibco.plugin.http.activities.HttpSendActivity" => ActivityKind::HttpSender,
            "com.tibco.plugin.jdbc.activities.JDBCQueryActivity" => ActivityKind::JdbcQuery,
            "com.tibco.plugin.jdbc.activities.JDBCUpdateActivity" => ActivityKind::JdbcUpdate,
            "com.tibco.plugin.jdbc.activities.JDBCCallActivity" => ActivityKind::JdbcCall,
            "com.tibco.plugin.jms.activities.JMSQueueSendActivity" => ActivityKind::JmsQueueSender,
            "com.tibco.plugin.jms.activities.JMSQueueReceiveActivity" => ActivityKind::JmsQueueReceiver,
            "com.tibco.plugin.jms.activities.JMSTopicPublishActivity" => ActivityKind::JmsTopicPublisher,
            "com.tibco.plugin.jms.activities.JMSTopicSubscribeActivity" => ActivityKind::JmsTopicSubscriber,
            "com.tibco.plugin.file.activities.FileReadActivity" => ActivityKind::ReadFile,
            "com.tibco.plugin.file.activities.FileWriteActivity" => ActivityKind::WriteFile,
            "com.tibco.pe.core.MapperActivity" => ActivityKind::Mapper,
            "com.tibco.pe.core.JavaCodeActivity" => ActivityKind::JavaCode,
            "com.tibco.pe.core.CallProcessActivity" => ActivityKind::CallProcess,
            "com.tibco.pe.core.NullActivity" => ActivityKind::Null,
            "com.tibco.pe.core.SleepActivity" => ActivityKind::Sleep,
            "com.tibco.pe.core.CatchActivity" => ActivityKind::Catch,
            "com.tibco.pe.core.RethrowActivity" => ActivityKind::Rethrow,
            _ => ActivityKind::Null,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityKind::HttpReceiver => "HTTP_RECEIVER",
            ActivityKind::HttpSender => "HTTP_SENDER",
            ActivityKind::JdbcQuery => "JDBC_QUERY",
            ActivityKind::JdbcUpdate => "JDBC_UPDATE",
            ActivityKind::JdbcCall => "JDBC_CALL",
            ActivityKind::JmsQueueSender => "JMS_QUEUE_SENDER",
            ActivityKind::JmsQueueReceiver => "JMS_QUEUE_RECEIVER",
            ActivityKind::JmsTopicPublisher => "JMS_TOPIC_PUBLISHER",
            ActivityKind::JmsTopicSubscriber => "JMS_TOPIC_SUBSCRIBER",
            ActivityKind::ReadFile => "READ_FILE",
            ActivityKind::WriteFile => "WRITE_FILE",
            ActivityKind::Mapper => "MAPPER",
            ActivityKind::JavaCode => "JAVA_CODE",
            ActivityKind::CallProcess => "CALL_PROCESS",
            ActivityKind::Null => "NULL",
            ActivityKind::Sleep => "SLEEP",
            ActivityKind::Catch => "CATCH",
            ActivityKind::Rethrow => "RETHROW",
        }
    }

    pub fn is_http(&self) -> bool {
        matches!(self, ActivityKind::HttpReceiver | ActivityKind::HttpSender)
    }

    pub fn is_jdbc(&self) -> bool {
        matches!(
            self,
            ActivityKind::JdbcQuery | ActivityKind::JdbcUpdate | ActivityKind::JdbcCall
        )
    }

    pub fn is_jms(&self) -> bool {
        matches!(
            self,
            ActivityKind::JmsQueueSender
                | ActivityKind::JmsQueueReceiver
                | ActivityKind::JmsTopicPublisher
                | ActivityKind::JmsTopicSubscriber
        )
    }

    pub fn is_file(&self) -> bool {
        matches!(self, ActivityKind::ReadFile | ActivityKind::WriteFile)
    }
}

impl fmt::Display for ActivityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Activity configuration: typed settings for the kind plus whatever else the
/// source carried.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActivityConfig {
    pub settings: ActivitySettings,
    /// Attributes and inline children the settings did not consume
    #[serde(default)]
    pub extra: IndexMap<String, XmlValue>,
}

impl ActivityConfig {
    /// Split a raw configuration bag into kind-specific settings and extras.
    ///
    /// Each setting takes the first non-empty key from its alias list; the
    /// consumed key is removed from the bag and everything left over becomes
    /// `extra`.
    pub fn from_bag(kind: ActivityKind, mut bag: IndexMap<String, XmlValue>) -> Self {
        let mut take = |keys: &[&str]| take_first(&mut bag, keys);

        let settings = match kind {
            ActivityKind::HttpReceiver => ActivitySettings::HttpReceiver {
                method: take(&["method", "httpMethod"]),
                path: take(&["path", "resourcePath"]),
                description: take(&["description"]),
            },
            ActivityKind::HttpSender => ActivitySettings::HttpSender {
                method: take(&["method", "httpMethod"]),
                url: take(&["url", "host"]),
            },
            ActivityKind::JdbcQuery | ActivityKind::JdbcUpdate | ActivityKind::JdbcCall => {
                ActivitySettings::Jdbc {
                    connection: take(&["jdbcSharedConfig", "connection"]),
                    statement: take(&["statement", "sql"]),
                }
            }
            ActivityKind::JmsQueueSender
            | ActivityKind::JmsQueueReceiver
            | ActivityKind::JmsTopicPublisher
            | ActivityKind::JmsTopicSubscriber => ActivitySettings::Jms {
                connection: take(&["ConnectionReference", "connection"]),
                destination: take(&["destination", "queue", "topic"]),
            },
            ActivityKind::ReadFile | ActivityKind::WriteFile => ActivitySettings::File {
                file_name: take(&["fileName"]),
                encoding: take(&["encoding"]),
            },
            ActivityKind::CallProcess => ActivitySettings::CallProcess {
                process_name: take(&["processName", "process"]),
            },
            ActivityKind::JavaCode => ActivitySettings::JavaCode {
                class_name: take(&["className"]),
            },
            ActivityKind::Sleep => ActivitySettings::Sleep {
                interval: take(&["interval", "IntervalInMillisec"]),
            },
            ActivityKind::Mapper | ActivityKind::Null | ActivityKind::Catch | ActivityKind::Rethrow => {
                ActivitySettings::None
            }
        };

        Self { settings, extra: bag }
    }

    /// Text of an unconsumed configuration entry.
    pub fn extra_text(&self, key: &str) -> Option<&str> {
        self.extra.get(key).and_then(XmlValue::as_text)
    }

    /// Free-text description, whether typed or left in the extras.
    pub fn description(&self) -> Option<&str> {
        match &self.settings {
            ActivitySettings::HttpReceiver { description: Some(d), .. } => Some(d),
            _ => self.extra_text("description").filter(|d| !d.is_empty()),
        }
    }
}

fn take_first(bag: &mut IndexMap<String, XmlValue>, keys: &[&str]) -> Option<String> {
    for key in keys {
        let text = bag
            .get(*key)
            .and_then(XmlValue::as_text)
            .filter(|s| !s.is_empty())
            .map(str::to_string);
        if text.is_some() {
            bag.shift_remove(*key);
            return text;
        }
    }
    None
}

/// Settings a given activity kind actually uses.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "family", rename_all = "snake_case")]
pub enum ActivitySettings {
    HttpReceiver {
        method: Option<String>,
        path: Option<String>,
        description: Option<String>,
    },
    HttpSender {
        method: Option<String>,
        url: Option<String>,
    },
    Jdbc {
        connection: Option<String>,
        statement: Option<String>,
    },
    Jms {
        connection: Option<String>,
        destination: Option<String>,
    },
    File {
        file_name: Option<String>,
        encoding: Option<String>,
    },
    CallProcess {
        process_name: Option<String>,
    },
    JavaCode {
        class_name: Option<String>,
    },
    Sleep {
        interval: Option<String>,
    },
    #[default]
    None,
}

/// Edge between two activities.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transition {
    /// Always `"<from>-><to>"`
    pub id: String,
    pub from: String,
    pub to: String,
    /// Guard expression, kept opaque
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
    pub kind: TransitionKind,
}

impl Transition {
    pub fn new(from: impl Into<String>, to: impl Into<String>, kind: TransitionKind) -> Self {
        let from = from.into();
        let to = to.into();
        Self {
            id: format!("{}->{}", from, to),
            from,
            to,
            condition: None,
            kind,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransitionKind {
    #[default]
    Success,
    Error,
    Always,
}

impl TransitionKind {
    /// Unspecified or unrecognised values fall back to `Success`.
    pub fn parse(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some(v) if v.eq_ignore_ascii_case("error") => TransitionKind::Error,
            Some(v) if v.eq_ignore_ascii_case("always") => TransitionKind::Always,
            _ => TransitionKind::Success,
        }
    }
}

/// Data mapping on an activity's input or output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mapping {
    /// Source expression, kept opaque
    pub source: String,
    /// Target path, kept opaque
    pub target: String,
    pub kind: MappingKind,
    /// The originating element, echoed as-is
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<XmlValue>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MappingKind {
    #[default]
    Direct,
    Expression,
    Function,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Variable {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
    pub scope: VariableScope,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VariableScope {
    Process,
    Group,
    Activity,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Group {
    pub id: String,
    pub name: String,
    pub kind: GroupKind,
    pub activities: Vec<String>,
    #[serde(default)]
    pub config: IndexMap<String, XmlValue>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GroupKind {
    Scope,
    Transaction,
    CriticalSection,
    Repeat,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Starter {
    pub kind: StarterKind,
    #[serde(default)]
    pub config: IndexMap<String, XmlValue>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StarterKind {
    Http,
    Jms,
    File,
    Timer,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FaultHandler {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fault_type: Option<String>,
    pub activities: Vec<String>,
    pub catch_all: bool,
}
