//! tibco-converter CLI - convert BusinessWorks processes to Spring Boot sources
//!
//! Parses `.bwp`/`.process` process definitions and `.xsd` schemas, and
//! generates Spring Boot REST controllers for processes that receive HTTP.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process;
use tracing_subscriber::EnvFilter;

use tibco_converter::analysis::{analyze_path, AnalysisReport};
use tibco_converter::codegen::{write_generated_files, GenerationConfig, GeneratorConfig};
use tibco_converter::convert::{ConversionResult, Converter, ValidationSummary};
use tibco_converter::parsers::ParserConfig;

#[derive(Parser)]
#[command(name = "tibco-converter")]
#[command(version, about = "Convert TIBCO BusinessWorks processes to Spring Boot applications", long_about = None)]
struct Cli {
    /// Enable debug logging and detailed error messages
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a process file or a directory of processes
    Convert {
        /// Input .bwp/.process/.xsd file or directory
        input: PathBuf,

        /// YAML generation config; flags below override it
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Output directory for generated sources
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Java package name
        #[arg(short, long)]
        package: Option<String>,

        /// Spring Boot version
        #[arg(long)]
        spring_version: Option<String>,

        /// Directory holding .tera templates
        #[arg(long)]
        templates: Option<PathBuf>,

        /// Skip REST controller generation
        #[arg(long)]
        no_controllers: bool,

        /// Do not use Lombok annotations
        #[arg(long)]
        no_lombok: bool,

        /// Do not use validation annotations
        #[arg(long)]
        no_validation: bool,

        /// Generate unit tests
        #[arg(long)]
        tests: bool,

        /// Overwrite existing files
        #[arg(long)]
        overwrite: bool,

        /// Show what would be generated without writing files
        #[arg(long)]
        dry_run: bool,

        /// Stop at the first file with errors
        #[arg(long)]
        fail_fast: bool,
    },

    /// Validate process and schema files without generating code
    Validate {
        /// Input file or directory
        input: PathBuf,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Analyze processes and estimate conversion effort
    Analyze {
        /// Input .bwp/.process file or directory
        input: PathBuf,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,

        /// Write the JSON report to this file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Write a generation config file with default settings
    Init {
        /// Path of the config file to create
        #[arg(default_value = "tibco-converter.yaml")]
        path: PathBuf,

        /// Java package name
        #[arg(short, long)]
        package: Option<String>,

        /// Replace an existing file
        #[arg(long)]
        force: bool,
    },
}

struct ConvertArgs {
    input: PathBuf,
    config: Option<PathBuf>,
    output: Option<PathBuf>,
    package: Option<String>,
    spring_version: Option<String>,
    templates: Option<PathBuf>,
    no_controllers: bool,
    no_lombok: bool,
    no_validation: bool,
    tests: bool,
    overwrite: bool,
    dry_run: bool,
    fail_fast: bool,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Convert {
            input,
            config,
            output,
            package,
            spring_version,
            templates,
            no_controllers,
            no_lombok,
            no_validation,
            tests,
            overwrite,
            dry_run,
            fail_fast,
        } => convert(
            ConvertArgs {
                input,
                config,
                output,
                package,
                spring_version,
                templates,
                no_controllers,
                no_lombok,
                no_validation,
                tests,
                overwrite,
                dry_run,
                fail_fast,
            },
            cli.verbose,
        ),
        Commands::Validate { input, json } => validate(input, json),
        Commands::Analyze { input, json, output } => analyze(input, json, output),
        Commands::Init { path, package, force } => init(path, package, force),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

/// Log to stderr so JSON reports on stdout stay parseable.
fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "info" };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)))
        .with_writer(std::io::stderr)
        .init();
}

fn require_input(input: &Path) -> Result<(), String> {
    if input.exists() {
        Ok(())
    } else {
        Err(format!("Input path does not exist: {}", input.display()))
    }
}

/// Convert processes and write the generated sources
fn convert(args: ConvertArgs, verbose: bool) -> Result<(), String> {
    require_input(&args.input)?;

    let mut config = match &args.config {
        Some(path) => {
            let config = GenerationConfig::from_file(path)?;
            println!("  ✓ Loaded config from {}", path.display());
            config
        }
        None => GenerationConfig::default(),
    };

    if let Some(output) = &args.output {
        config.output_dir = output.display().to_string();
    }
    if let Some(package) = args.package {
        config.package_name = package;
    }
    if let Some(version) = args.spring_version {
        config.spring_boot_version = version;
    }
    if args.no_controllers {
        config.options.generate_controllers = false;
    }
    if args.no_lombok {
        config.options.use_lombok = false;
    }
    if args.no_validation {
        config.options.use_validation = false;
    }
    if args.tests {
        config.options.generate_tests = true;
    }
    config.validate()?;

    let parser_config = ParserConfig {
        verbose,
        continue_on_error: !args.fail_fast,
    };
    let generator_config = GeneratorConfig {
        verbose,
        template_dir: args.templates,
        ..Default::default()
    };

    println!("🔄 Converting {}...", args.input.display());

    let mut converter = Converter::new(parser_config, generator_config);
    let result = converter.convert_path(&args.input, &config);

    if !args.dry_run && !result.generated_files.is_empty() {
        let output_dir = PathBuf::from(&config.output_dir);
        let written = write_generated_files(&output_dir, &result.generated_files, args.overwrite)?;
        println!("  ✓ Wrote {} files to {}", written.len(), output_dir.display());
    }

    print_conversion(&result, args.dry_run, verbose);

    if result.success {
        println!("✨ Conversion completed successfully!");
        Ok(())
    } else {
        Err(format!("Conversion completed with {} errors", result.errors.len()))
    }
}

fn print_conversion(result: &ConversionResult, dry_run: bool, verbose: bool) {
    let stats = &result.statistics;

    println!();
    println!("📊 Conversion Results");
    println!("{}", "=".repeat(50));
    println!("  Processes converted: {}", stats.processes_converted);
    println!("  Activities converted: {}", stats.activities_converted);
    println!("  Files generated: {}", stats.files_generated);
    println!("  Duration: {}ms", stats.duration_ms);

    if !result.generated_files.is_empty() {
        println!();
        println!("Generated files:");
        let status = if dry_run { "[DRY RUN]" } else { "[CREATED]" };
        for file in &result.generated_files {
            println!("  {} {} ({})", status, file.path, file.kind);
        }
    }

    if !result.warnings.is_empty() {
        println!();
        println!("⚠ Warnings:");
        for warning in &result.warnings {
            println!("  {}: {} ({})", warning.code, warning.message, warning.source);
        }
    }

    if !result.errors.is_empty() {
        println!();
        println!("✗ Errors:");
        for error in &result.errors {
            println!("  {}: {} ({})", error.code, error.message, error.source);
            if let (true, Some(stack)) = (verbose, &error.stack) {
                println!("    {}", stack);
            }
        }
    }
}

/// Validate process and schema files
fn validate(input: PathBuf, json: bool) -> Result<(), String> {
    require_input(&input)?;

    let mut converter = Converter::default();
    let summary = converter.validate_path(&input)?;

    if json {
        let report = serde_json::to_string_pretty(&summary)
            .map_err(|e| format!("Failed to serialize report: {}", e))?;
        println!("{}", report);
    } else {
        print_validation(&summary);
    }

    if summary.invalid_files > 0 {
        return Err(format!("Validation failed for {} files", summary.invalid_files));
    }

    if !json {
        println!("✨ All files validated successfully!");
    }
    Ok(())
}

fn print_validation(summary: &ValidationSummary) {
    println!("🔍 Validation Results");
    println!("{}", "=".repeat(50));
    println!("  Total files: {}", summary.total_files);
    println!("  Valid files: {}", summary.valid_files);
    println!("  Invalid files: {}", summary.invalid_files);
    println!("  Total warnings: {}", summary.warnings);
    println!("  Total errors: {}", summary.errors);

    for file in &summary.files {
        let mark = if file.valid { "✓" } else { "✗" };
        println!();
        println!("  {} {}", mark, file.path);
        for error in &file.errors {
            println!("      error {}: {}", error.code, error.message);
        }
        for warning in &file.warnings {
            println!("      warning {}: {}", warning.code, warning.message);
        }
    }
}

/// Analyze processes and report conversion effort
fn analyze(input: PathBuf, json: bool, output: Option<PathBuf>) -> Result<(), String> {
    require_input(&input)?;

    let mut converter = Converter::default();
    let report = analyze_path(&mut converter, &input)?;

    let rendered = serde_json::to_string_pretty(&report)
        .map_err(|e| format!("Failed to serialize report: {}", e))?;

    if json {
        println!("{}", rendered);
    } else {
        print_analysis(&report);
    }

    if let Some(path) = output {
        std::fs::write(&path, &rendered)
            .map_err(|e| format!("Failed to write {}: {}", path.display(), e))?;
        if !json {
            println!("  ✓ Report saved to {}", path.display());
        }
    }

    Ok(())
}

fn print_analysis(report: &AnalysisReport) {
    let summary = &report.summary;

    println!("🔍 Analysis Results");
    println!("{}", "=".repeat(50));
    println!("  Total processes: {}", summary.total_processes);
    println!("  Total activities: {}", summary.total_activities);
    println!("  Average complexity: {}", summary.average_complexity);
    println!("  Conversion difficulty: {:?}", summary.conversion_difficulty);

    if !summary.activity_kind_distribution.is_empty() {
        println!();
        println!("Activity kinds:");
        for (kind, count) in &summary.activity_kind_distribution {
            println!("  {:<24} {}", kind.as_str(), count);
        }
    }

    for process in &report.processes {
        println!();
        println!("  {} ({})", process.name, process.file_path);
        println!("    Complexity: {}", process.complexity);
        println!(
            "    HTTP: {}  JDBC: {}  JMS: {}  File: {}",
            process.http_endpoints, process.database_operations, process.jms_operations, process.file_operations
        );
        for dependency in &process.dependencies {
            println!("    → {}", dependency);
        }
    }

    if !report.errors.is_empty() {
        println!();
        println!("✗ Errors:");
        for error in &report.errors {
            println!("  {}", error);
        }
    }
}

/// Write a default generation config
fn init(path: PathBuf, package: Option<String>, force: bool) -> Result<(), String> {
    if path.exists() && !force {
        return Err(format!("{} already exists (use --force to replace it)", path.display()));
    }

    let mut config = GenerationConfig::default();
    if let Some(package) = package {
        config.package_name = package;
    }
    config.validate()?;

    let yaml = serde_yaml::to_string(&config).map_err(|e| format!("Failed to serialize config: {}", e))?;
    std::fs::write(&path, yaml).map_err(|e| format!("Failed to write {}: {}", path.display(), e))?;

    println!("✨ Wrote {}", path.display());
    println!("  Next: tibco-converter convert <processes> --config {}", path.display());
    Ok(())
}
