use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{Level, event};

use pathinfer_core::{
    Algorithm, AppInfo, BeliefUpdate, EvidenceVector, InferenceSession, LOCATION_NODE,
    ModelFormat, ProbabilisticRecord, SlicePlan, SliceScheduler, TemporalNetwork, parse_records,
};
use pathinfer_dbn::DynamicNetwork;

use crate::config::{AppConfig, OutputFormat};
use crate::logging::init_logging;
use crate::report::SliceReport;

/// Most probable path of a tagged vehicle between two noisy sightings.
#[derive(Debug, Parser)]
#[command(
    name = "pathinfer",
    author,
    version,
    about = "Per-slice location posteriors between two probabilistic observations"
)]
pub struct Cli {
    /// Two `#`-separated records of the form `plate;Loc:p,...;start;end`.
    #[arg(value_name = "RECORDS")]
    pub records: String,

    /// Slice width in seconds.
    #[arg(value_name = "INTERVAL")]
    pub interval: u32,

    /// Algorithm code 0-16; a non-numeric or out-of-range code selects Lauritzen.
    #[arg(value_name = "ALGORITHM", allow_hyphen_values = true)]
    pub algorithm: String,

    /// Path to the YAML configuration file.
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Override the model definition path.
    #[arg(long, value_name = "PATH")]
    pub model: Option<PathBuf>,

    /// Override the model serialization (json or yaml).
    #[arg(long, value_name = "FORMAT", value_parser = parse_model_format)]
    pub model_format: Option<ModelFormat>,

    /// Output format (text or json).
    #[arg(long, value_name = "FORMAT", value_parser = parse_output_format)]
    pub output: Option<OutputFormat>,

    /// Print the model and both parsed records to stderr before inference.
    #[arg(long)]
    pub describe: bool,

    /// Override the tracing level (trace, debug, info, warn, error).
    #[arg(long, value_name = "LEVEL")]
    pub log_level: Option<String>,
}

fn parse_model_format(value: &str) -> Result<ModelFormat, String> {
    ModelFormat::from_str(value).ok_or_else(|| format!("unknown model format '{value}'"))
}

fn parse_output_format(value: &str) -> Result<OutputFormat, String> {
    OutputFormat::from_str(value).ok_or_else(|| format!("unknown output format '{value}'"))
}

impl Cli {
    /// Loads the configuration file, if any, and applies flag overrides.
    pub fn resolve_config(&self) -> Result<AppConfig> {
        let mut config = match self.config.as_ref() {
            Some(path) => AppConfig::from_path(path)?,
            None => AppConfig::default(),
        };

        if let Some(model) = self.model.clone() {
            config.model.path = model;
        }

        if let Some(format) = self.model_format {
            config.model.format = Some(format);
        }

        if let Some(output) = self.output {
            config.output.format = output;
        }

        if let Some(level) = self.log_level.clone() {
            config.logging.tracing_level = level;
        }

        config.validate()?;
        Ok(config)
    }
}

fn select_algorithm(arg: &str) -> Algorithm {
    let algorithm = Algorithm::from_arg(arg);
    if arg.trim().parse::<u8>().ok() != Some(algorithm.code()) {
        event!(
            target: "pathinfer_cli",
            Level::DEBUG,
            requested = arg,
            selected = algorithm.name(),
            "algorithm code unknown; using default"
        );
    }
    algorithm
}

/// Runs one inference and writes a line per slice to stdout.
pub fn run(cli: Cli) -> Result<()> {
    let config = cli.resolve_config()?;
    let _logging = init_logging(&config.logging)?;

    let algorithm = select_algorithm(&cli.algorithm);
    let (first, second) = parse_records(&cli.records)?;
    let plan = SliceScheduler::new(cli.interval).plan(&first, &second);

    let mut session = InferenceSession::<DynamicNetwork>::load_with(
        &config.model.path,
        config.model.resolved_format(),
        algorithm,
        &config.engine_options(),
    )?;
    session.set_buffer_shape(config.inference.buffer_shape);
    session.set_slice_count(plan.slices)?;

    if cli.describe {
        describe(&session, &first, &second, &plan);
    }

    let order = session.location_outcome_order();
    let first_evidence = EvidenceVector::from_record(&first, &order);
    let second_evidence = EvidenceVector::from_record(&second, &order);
    for (label, evidence) in [("first", &first_evidence), ("second", &second_evidence)] {
        if evidence.is_vacuous() {
            event!(
                target: "pathinfer_cli",
                Level::WARN,
                record = label,
                "record names none of the model's locations"
            );
        }
    }
    session.inject_evidence(LOCATION_NODE, 0, &first_evidence)?;
    session.inject_evidence(LOCATION_NODE, plan.last_slice(), &second_evidence)?;

    if let BeliefUpdate::Failed { reason } = session.run()? {
        event!(
            target: "pathinfer_cli",
            Level::INFO,
            reason = %reason,
            "reporting fallback distributions"
        );
    }

    let stdout = io::stdout();
    let mut out = stdout.lock();
    for slice in 0..plan.slices {
        let marginals = session.marginals(LOCATION_NODE, slice)?;
        let line = SliceReport::new(slice, &order, marginals).render(config.output.format)?;
        writeln!(out, "{line}").context("writing results to stdout")?;
    }
    out.flush().context("flushing stdout")?;
    Ok(())
}

fn describe<N: TemporalNetwork>(
    session: &InferenceSession<N>,
    first: &ProbabilisticRecord,
    second: &ProbabilisticRecord,
    plan: &SlicePlan,
) {
    eprintln!("{} {}", AppInfo::name(), AppInfo::version());
    eprintln!("{}", session.describe());
    eprintln!("First Record:\n{first}");
    eprintln!("Second Record:\n{second}");
    eprintln!(
        "Slices: {} (gap slice: {})",
        plan.slices,
        if plan.gap_slice { "yes" } else { "no" }
    );
}
