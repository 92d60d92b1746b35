//! Conversion effort analysis for process definitions.
//!
//! Scores how much work a process will take to port, without generating
//! anything. Scores are heuristic: activity count, control flow, mapping
//! volume and custom Java code.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::convert::{find_convertible_files, Converter, SourceKind};
use crate::model::process::{Activity, ActivityKind, ActivitySettings, Process};

/// Average complexity above which a batch is rated HIGH.
pub const HIGH_COMPLEXITY_THRESHOLD: u32 = 20;

/// Average complexity above which a batch is rated MEDIUM.
pub const MEDIUM_COMPLEXITY_THRESHOLD: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Difficulty {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActivityAnalysis {
    pub name: String,
    pub kind: ActivityKind,
    pub complexity: u32,
    pub has_custom_code: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcessAnalysis {
    pub name: String,
    pub file_path: String,
    pub activities: Vec<ActivityAnalysis>,
    pub complexity: u32,
    pub dependencies: Vec<String>,
    pub http_endpoints: usize,
    pub database_operations: usize,
    pub jms_operations: usize,
    pub file_operations: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisSummary {
    pub total_processes: usize,
    pub total_activities: usize,
    pub average_complexity: u32,
    pub activity_kind_distribution: BTreeMap<ActivityKind, usize>,
    pub conversion_difficulty: Difficulty,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub processes: Vec<ProcessAnalysis>,
    pub summary: AnalysisSummary,
    pub errors: Vec<String>,
}

fn kind_weight(kind: ActivityKind) -> f64 {
    match kind {
        ActivityKind::JavaCode => 5.0,
        ActivityKind::Mapper | ActivityKind::JdbcCall => 3.0,
        ActivityKind::JdbcQuery
        | ActivityKind::JdbcUpdate
        | ActivityKind::HttpReceiver
        | ActivityKind::HttpSender
        | ActivityKind::JmsQueueSender
        | ActivityKind::JmsQueueReceiver
        | ActivityKind::JmsTopicPublisher
        | ActivityKind::JmsTopicSubscriber
        | ActivityKind::CallProcess => 2.0,
        // No kind weighs less than 1
        ActivityKind::ReadFile
        | ActivityKind::WriteFile
        | ActivityKind::Catch
        | ActivityKind::Rethrow
        | ActivityKind::Null
        | ActivityKind::Sleep => 1.0,
    }
}

pub fn activity_complexity(activity: &Activity) -> u32 {
    let score = 1.0 + kind_weight(activity.kind) + 0.2 * activity.mapping_count() as f64;
    score.round() as u32
}

pub fn process_complexity(process: &Process) -> u32 {
    let java = process.activities_of_kind(ActivityKind::JavaCode).count();
    let mappings: usize = process.activities.iter().map(Activity::mapping_count).sum();

    let score = process.activities.len() as f64
        + 0.5 * process.transitions.len() as f64
        + 3.0 * java as f64
        + 0.2 * mappings as f64;
    score.round() as u32
}

/// Global variables and called sub-processes, first-seen order, no repeats.
pub fn dependencies(process: &Process) -> Vec<String> {
    let called = process
        .activities_of_kind(ActivityKind::CallProcess)
        .filter_map(|activity| match &activity.config.settings {
            ActivitySettings::CallProcess { process_name } => process_name.as_deref(),
            _ => None,
        })
        .map(|name| format!("Process: {}", name));

    let mut seen = Vec::new();
    for dependency in process
        .global_variables
        .iter()
        .map(|gv| format!("Global Variable: {}", gv))
        .chain(called)
    {
        if !seen.contains(&dependency) {
            seen.push(dependency);
        }
    }
    seen
}

pub fn analyze_process(process: &Process, file_path: &str) -> ProcessAnalysis {
    let count = |pred: fn(&ActivityKind) -> bool| process.activities.iter().filter(|a| pred(&a.kind)).count();

    ProcessAnalysis {
        name: process.name.clone(),
        file_path: file_path.to_string(),
        activities: process
            .activities
            .iter()
            .map(|activity| ActivityAnalysis {
                name: activity.name.clone(),
                kind: activity.kind,
                complexity: activity_complexity(activity),
                has_custom_code: activity.kind == ActivityKind::JavaCode,
            })
            .collect(),
        complexity: process_complexity(process),
        dependencies: dependencies(process),
        http_endpoints: count(ActivityKind::is_http),
        database_operations: count(ActivityKind::is_jdbc),
        jms_operations: count(ActivityKind::is_jms),
        file_operations: count(ActivityKind::is_file),
    }
}

pub fn summarize(processes: &[ProcessAnalysis]) -> AnalysisSummary {
    let total_activities = processes.iter().map(|p| p.activities.len()).sum();

    let average_complexity = if processes.is_empty() {
        0
    } else {
        let total: u32 = processes.iter().map(|p| p.complexity).sum();
        (f64::from(total) / processes.len() as f64).round() as u32
    };

    let mut distribution = BTreeMap::new();
    for activity in processes.iter().flat_map(|p| &p.activities) {
        *distribution.entry(activity.kind).or_insert(0) += 1;
    }

    let has_custom_code = processes
        .iter()
        .flat_map(|p| &p.activities)
        .any(|a| a.has_custom_code);

    let conversion_difficulty = if average_complexity > HIGH_COMPLEXITY_THRESHOLD || has_custom_code {
        Difficulty::High
    } else if average_complexity > MEDIUM_COMPLEXITY_THRESHOLD {
        Difficulty::Medium
    } else {
        Difficulty::Low
    };

    AnalysisSummary {
        total_processes: processes.len(),
        total_activities,
        average_complexity,
        activity_kind_distribution: distribution,
        conversion_difficulty,
    }
}

/// Analyze one process file, or every process file under a directory.
///
/// Schemas are skipped. Per-file failures land in the report's `errors`.
pub fn analyze_path(converter: &mut Converter, path: &Path) -> Result<AnalysisReport, String> {
    let files = if path.is_dir() {
        find_convertible_files(path)
            .map_err(|e| format!("Failed to read directory {}: {}", path.display(), e))?
            .into_iter()
            .filter(|file| SourceKind::from_path(file) == Some(SourceKind::Process))
            .collect()
    } else {
        vec![path.to_path_buf()]
    };

    let mut processes = Vec::new();
    let mut errors = Vec::new();

    for file in files {
        let label = file.display().to_string();

        if SourceKind::from_path(&file) != Some(SourceKind::Process) {
            errors.push(format!("Unsupported file type: {}", label));
            continue;
        }

        let text = match fs::read_to_string(&file) {
            Ok(text) => text,
            Err(e) => {
                errors.push(format!("Error analyzing {}: {}", label, e));
                continue;
            }
        };

        match converter.parse_process(&text) {
            Ok(process) => processes.push(analyze_process(&process, &label)),
            Err(diagnostics) => {
                let messages: Vec<_> = diagnostics.iter().map(|d| d.message.as_str()).collect();
                errors.push(format!("Failed to parse {}: {}", label, messages.join(", ")));
            }
        }
    }

    Ok(AnalysisReport {
        summary: summarize(&processes),
        processes,
        errors,
    })
}
