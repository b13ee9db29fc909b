//! BMI CLI - Command-line interface for the BMI engine
//!
//! Commands:
//! - calc: Calculate BMI for a single measurement
//! - batch: Process newline-delimited JSON measurements
//! - history: Inspect, export or clear a saved history file
//! - categories: Print the band tables of every classification policy

use clap::{Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{self, BufRead, BufReader, Read, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use bmi_engine::classify::band_table;
use bmi_engine::export::{
    append_history_log, export_csv_file, export_text_file, measurement_log_line, text_report,
    write_csv,
};
use bmi_engine::presentation::{band_reference, personalized_tips};
use bmi_engine::units::{check_plausible, parse_positive};
use bmi_engine::{
    ActivityLevel, BmiEngine, BmiResult, ClassificationPolicy, EngineConfig, EngineError, Gender,
    Height, History, Measurement, ProfileDraft, Weight, ENGINE_VERSION,
};

/// BMI - Body Mass Index calculator and history tool
#[derive(Parser)]
#[command(name = "bmi")]
#[command(version = ENGINE_VERSION)]
#[command(about = "Calculate, classify and track Body Mass Index", long_about = None)]
struct Cli {
    /// Engine configuration file (JSON)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log debug events to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Calculate BMI for a single measurement
    Calc {
        /// Height value (feet when --height-unit is ft-in)
        #[arg(long)]
        height: String,

        /// Additional inches when --height-unit is ft-in
        #[arg(long, default_value = "0")]
        inches: String,

        #[arg(long, value_enum, default_value = "cm")]
        height_unit: HeightUnitArg,

        /// Weight value
        #[arg(long)]
        weight: String,

        #[arg(long, value_enum, default_value = "kg")]
        weight_unit: WeightUnitArg,

        /// Age in years (under 18 selects the child table)
        #[arg(long)]
        age: Option<u32>,

        /// Force a classification policy instead of choosing by age
        #[arg(long, value_enum)]
        policy: Option<PolicyArg>,

        /// Reject implausible heights and weights
        #[arg(long)]
        strict: bool,

        /// Output JSON even when stdout is a terminal
        #[arg(long)]
        json: bool,

        /// Record the result into this history file (requires a complete profile)
        #[arg(long)]
        history: Option<PathBuf>,

        /// Append a one-line record to this flat log file
        #[arg(long)]
        log: Option<PathBuf>,

        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        gender: Option<String>,

        #[arg(long)]
        activity: Option<String>,
    },

    /// Process newline-delimited JSON measurements
    Batch {
        /// Input file path (use - for stdin)
        #[arg(short, long, default_value = "-")]
        input: PathBuf,

        /// Output file path (use - for stdout)
        #[arg(short, long, default_value = "-")]
        output: PathBuf,

        /// Skip invalid records instead of failing
        #[arg(long)]
        keep_going: bool,
    },

    /// Inspect, export or clear a saved history file
    History {
        /// History file (JSON)
        #[arg(long)]
        file: PathBuf,

        #[command(subcommand)]
        action: HistoryAction,
    },

    /// Print the band tables of every classification policy
    Categories {
        /// Only print this policy
        #[arg(long, value_enum)]
        policy: Option<PolicyArg>,
    },
}

#[derive(Subcommand)]
enum HistoryAction {
    /// Print recent entries
    Show {
        /// Only entries for this person
        #[arg(long)]
        person: Option<String>,
    },
    /// List recorded persons
    Persons,
    /// Print the BMI trend as date,bmi lines
    Trend {
        #[arg(long)]
        person: Option<String>,
    },
    /// Export the history
    Export {
        #[arg(long, value_enum, default_value = "csv")]
        format: ExportFormat,

        /// Output file path (use - for stdout)
        #[arg(short, long, default_value = "-")]
        output: PathBuf,
    },
    /// Remove every entry
    Clear,
}

#[derive(Clone, Copy, ValueEnum)]
enum HeightUnitArg {
    Cm,
    M,
    #[value(name = "in")]
    Inches,
    FtIn,
}

#[derive(Clone, Copy, ValueEnum)]
enum WeightUnitArg {
    Kg,
    Lbs,
}

#[derive(Clone, Copy, ValueEnum)]
enum PolicyArg {
    Simple,
    Extended,
    Child,
}

impl From<PolicyArg> for ClassificationPolicy {
    fn from(arg: PolicyArg) -> Self {
        match arg {
            PolicyArg::Simple => ClassificationPolicy::SimpleAdult,
            PolicyArg::Extended => ClassificationPolicy::ExtendedAdult,
            PolicyArg::Child => ClassificationPolicy::Child,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum ExportFormat {
    Csv,
    Text,
}

/// One line of batch input
#[derive(Deserialize)]
struct BatchRecord {
    #[serde(flatten)]
    measurement: Measurement,
    age: Option<u32>,
}

/// One line of batch output
#[derive(Serialize)]
struct BatchOutput<'a> {
    line: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<&'a BmiResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e))
                    .unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: bool) {
    let level = if verbose { "bmi_engine=debug" } else { "bmi_engine=warn" };
    let mut filter = EnvFilter::from_default_env();
    if let Ok(directive) = level.parse() {
        filter = filter.add_directive(directive);
    }

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<(), BmiCliError> {
    let config = match &cli.config {
        Some(path) => EngineConfig::from_json(&fs::read_to_string(path)?)?,
        None => EngineConfig::default(),
    };
    let engine = BmiEngine::new(config);

    match cli.command {
        Commands::Calc {
            height,
            inches,
            height_unit,
            weight,
            weight_unit,
            age,
            policy,
            strict,
            json,
            history,
            log,
            name,
            gender,
            activity,
        } => {
            let measurement =
                parse_measurement(&height, &inches, height_unit, &weight, weight_unit)?;
            if strict {
                check_plausible(&measurement)?;
            }

            // Validate the profile before computing so a failed record leaves no trace
            let profile = match &history {
                Some(_) => Some(
                    ProfileDraft {
                        name,
                        age,
                        gender: gender.as_deref().map(str::parse::<Gender>).transpose()?,
                        activity: activity
                            .as_deref()
                            .map(str::parse::<ActivityLevel>)
                            .transpose()?,
                    }
                    .finish()?,
                ),
                None => None,
            };

            let result = calculate_and_log(
                &engine,
                &measurement,
                age,
                policy.map(ClassificationPolicy::from),
                log.as_deref(),
            )?;

            if let (Some(path), Some(profile)) = (history.as_deref(), profile.as_ref()) {
                let mut store = load_history(path)?;
                store.record(profile, &result);
                save_history(path, &store)?;
            }

            if json || !atty::is(atty::Stream::Stdout) {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                print_result(&engine, &result);
            }
            Ok(())
        }

        Commands::Batch {
            input,
            output,
            keep_going,
        } => cmd_batch(&engine, &input, &output, keep_going),

        Commands::History { file, action } => cmd_history(&file, action),

        Commands::Categories { policy } => {
            let policies = match policy {
                Some(p) => vec![p.into()],
                None => vec![
                    ClassificationPolicy::SimpleAdult,
                    ClassificationPolicy::ExtendedAdult,
                    ClassificationPolicy::Child,
                ],
            };

            for policy in policies {
                println!("{}", policy.as_str());
                for (lower, label) in band_table(policy) {
                    match lower {
                        Some(lower) => println!("  >= {:<5} {}", lower, label),
                        None => println!("  {:<8} {}", "", label),
                    }
                }
            }
            println!();
            println!("{}", band_reference());
            Ok(())
        }
    }
}

fn parse_measurement(
    height: &str,
    inches: &str,
    height_unit: HeightUnitArg,
    weight: &str,
    weight_unit: WeightUnitArg,
) -> Result<Measurement, BmiCliError> {
    let height = match height_unit {
        HeightUnitArg::Cm => Height::Centimeters(parse_positive("height", height)?),
        HeightUnitArg::M => Height::Meters(parse_positive("height", height)?),
        HeightUnitArg::Inches => Height::Inches(parse_positive("height", height)?),
        HeightUnitArg::FtIn => {
            let feet = parse_number("height", height)?;
            let inches = parse_number("inches", inches)?;
            Height::FeetInches { feet, inches }
        }
    };

    let weight = match weight_unit {
        WeightUnitArg::Kg => Weight::Kilograms(parse_positive("weight", weight)?),
        WeightUnitArg::Lbs => Weight::Pounds(parse_positive("weight", weight)?),
    };

    Ok(Measurement::new(height, weight))
}

// Feet and inches are range-checked as a pair during conversion
fn parse_number(field: &str, text: &str) -> Result<f64, BmiCliError> {
    let value: f64 = text.trim().parse().map_err(|_| {
        EngineError::InvalidMeasurement(format!("{} must be a number (got '{}')", field, text))
    })?;
    Ok(value)
}

/// Run one calculation and append it to the flat log when one is given
fn calculate_and_log(
    engine: &BmiEngine,
    measurement: &Measurement,
    age: Option<u32>,
    policy: Option<ClassificationPolicy>,
    log: Option<&Path>,
) -> Result<BmiResult, BmiCliError> {
    let result = match policy {
        Some(policy) => engine.calculate_with_policy(measurement, age, policy)?,
        None => engine.calculate(measurement, age)?,
    };

    if let Some(path) = log {
        let line = measurement_log_line(measurement, result.bmi, result.category_label);
        append_history_log(path, &line)?;
    }

    Ok(result)
}

fn print_result(engine: &BmiEngine, result: &BmiResult) {
    println!("BMI:       {:.1}", result.bmi);
    println!("Category:  {}", result.category_label);
    println!("Ideal:     {}", engine.ideal_range_display(result));
    println!("Tip:       {}", result.presentation.tip);
    println!();
    for block in personalized_tips(result.category) {
        println!("{}", block);
        println!();
    }
}

fn cmd_batch(
    engine: &BmiEngine,
    input: &Path,
    output: &Path,
    keep_going: bool,
) -> Result<(), BmiCliError> {
    let reader: Box<dyn BufRead> = if input.to_string_lossy() == "-" {
        Box::new(BufReader::new(io::stdin()))
    } else {
        Box::new(BufReader::new(fs::File::open(input)?))
    };

    let mut writer: Box<dyn Write> = if output.to_string_lossy() == "-" {
        Box::new(io::stdout())
    } else {
        Box::new(fs::File::create(output)?)
    };

    let mut failures = 0usize;

    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let line_number = index + 1;

        let outcome = serde_json::from_str::<BatchRecord>(trimmed)
            .map_err(EngineError::from)
            .and_then(|record| engine.calculate(&record.measurement, record.age));

        let record = match &outcome {
            Ok(result) => BatchOutput {
                line: line_number,
                result: Some(result),
                error: None,
            },
            Err(e) if keep_going => {
                failures += 1;
                tracing::warn!(line = line_number, error = %e, "skipping invalid record");
                BatchOutput {
                    line: line_number,
                    result: None,
                    error: Some(e.to_string()),
                }
            }
            Err(e) => return Err(BmiCliError::Batch(line_number, e.to_string())),
        };

        writeln!(writer, "{}", serde_json::to_string(&record)?)?;
    }

    writer.flush()?;

    if failures > 0 {
        tracing::warn!(failures, "batch finished with invalid records");
    }
    Ok(())
}

fn cmd_history(file: &Path, action: HistoryAction) -> Result<(), BmiCliError> {
    let mut history = load_history(file)?;

    match action {
        HistoryAction::Show { person } => {
            let entries: Vec<_> = match person.as_deref() {
                Some(name) => history.entries_for(name),
                None => history.recent().iter().collect(),
            };
            if entries.is_empty() {
                println!("No history found.");
            }
            for entry in entries {
                println!(
                    "{}  {:<16} {:>3}  {:<6} {:<17} {:>5.1}  {}",
                    entry.date_string(),
                    entry.name,
                    entry.age,
                    entry.gender.as_str(),
                    entry.activity.short_label(),
                    entry.bmi,
                    entry.category.label()
                );
            }
        }
        HistoryAction::Persons => {
            for name in history.persons() {
                println!("{}", name);
            }
        }
        HistoryAction::Trend { person } => {
            for point in history.trend(person.as_deref()) {
                println!(
                    "{},{:.1}",
                    point.recorded_at.format(bmi_engine::history::DATE_FORMAT),
                    point.bmi
                );
            }
        }
        HistoryAction::Export { format, output } => {
            if history.is_empty() {
                return Err(BmiCliError::EmptyHistory);
            }
            let to_stdout = output.to_string_lossy() == "-";
            match (format, to_stdout) {
                (ExportFormat::Csv, true) => write_csv(&history, io::stdout())?,
                (ExportFormat::Csv, false) => export_csv_file(&history, &output)?,
                (ExportFormat::Text, true) => print!("{}", text_report(&history)),
                (ExportFormat::Text, false) => export_text_file(&history, &output)?,
            }
        }
        HistoryAction::Clear => {
            history.clear();
            save_history(file, &history)?;
        }
    }

    Ok(())
}

fn load_history(path: &Path) -> Result<History, BmiCliError> {
    if !path.exists() {
        return Ok(History::new());
    }
    let mut json = String::new();
    fs::File::open(path)?.read_to_string(&mut json)?;
    if json.trim().is_empty() {
        return Ok(History::new());
    }
    Ok(History::from_json(&json)?)
}

fn save_history(path: &Path, history: &History) -> Result<(), BmiCliError> {
    fs::write(path, history.to_json()?)?;
    Ok(())
}

// Error types

#[derive(Debug)]
enum BmiCliError {
    Io(io::Error),
    Engine(EngineError),
    Json(serde_json::Error),
    Batch(usize, String),
    EmptyHistory,
}

impl From<io::Error> for BmiCliError {
    fn from(e: io::Error) -> Self {
        BmiCliError::Io(e)
    }
}

impl From<EngineError> for BmiCliError {
    fn from(e: EngineError) -> Self {
        BmiCliError::Engine(e)
    }
}

impl From<serde_json::Error> for BmiCliError {
    fn from(e: serde_json::Error) -> Self {
        BmiCliError::Json(e)
    }
}

#[derive(Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<BmiCliError> for CliError {
    fn from(e: BmiCliError) -> Self {
        match e {
            BmiCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            BmiCliError::Engine(e) => {
                let (code, hint) = match &e {
                    EngineError::InvalidMeasurement(_) => (
                        "INVALID_MEASUREMENT",
                        "Height and weight must be positive numbers",
                    ),
                    EngineError::MissingField(_) => (
                        "MISSING_FIELD",
                        "Recording history needs --name, --age, --gender and --activity",
                    ),
                    EngineError::ParseError(_) => ("PARSE_ERROR", "Check the option values"),
                    EngineError::JsonError(_) => ("JSON_ERROR", "Check JSON syntax"),
                    EngineError::CsvError(_) => ("CSV_ERROR", "Check the export destination"),
                    EngineError::IoError(_) => ("IO_ERROR", "Check file paths and permissions"),
                };
                CliError {
                    code: code.to_string(),
                    message: e.to_string(),
                    hint: Some(hint.to_string()),
                }
            }
            BmiCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            BmiCliError::Batch(line, message) => CliError {
                code: "BATCH_ERROR".to_string(),
                message: format!("line {}: {}", line, message),
                hint: Some("Use --keep-going to skip invalid records".to_string()),
            },
            BmiCliError::EmptyHistory => CliError {
                code: "EMPTY_HISTORY".to_string(),
                message: "No data to export".to_string(),
                hint: Some("Record a calculation with 'bmi calc --history' first".to_string()),
            },
        }
    }
}
