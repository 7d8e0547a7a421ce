//! scap-ds - split and build SCAP source data streams

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{ArgAction, Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use scap_ds::{Composer, DecomposeReport, Error, dom};

#[derive(Parser)]
#[command(name = "scap-ds")]
#[command(version, about = "Split and build SCAP source data streams", long_about = None)]
#[command(after_help = "EXAMPLES:
    scap-ds decompose ssg-rhel7-ds.xml -o out          Extract the first data-stream
    scap-ds decompose ds.xml -d my_datastream          Extract a specific data-stream
    scap-ds compose ssg-rhel7-xccdf.xml -d ds1 --embed Build a collection")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Command {
    /// Split a data-stream collection into component files
    Decompose {
        /// Data-stream collection file
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        /// Data-stream id (default: first data-stream)
        #[arg(short, long)]
        datastream: Option<String>,

        /// Target directory
        #[arg(short, long, default_value = ".")]
        output: PathBuf,

        /// Print a JSON summary instead of text
        #[arg(long)]
        json: bool,
    },
    /// Build a data-stream collection referencing component files
    Compose {
        /// Component files
        #[arg(value_name = "FILES", required = true)]
        files: Vec<String>,

        /// Id of the data-stream to create
        #[arg(short, long)]
        datastream: String,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Embed each file's content as a component
        #[arg(long)]
        embed: bool,
    },
}

#[derive(Serialize)]
struct Summary {
    written: Vec<String>,
    errors: Vec<String>,
}

impl From<&DecomposeReport> for Summary {
    fn from(report: &DecomposeReport) -> Self {
        Self {
            written: report
                .written
                .iter()
                .map(|p| p.display().to_string())
                .collect(),
            errors: report.errors.iter().map(|e| e.to_string()).collect(),
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Command::Decompose {
            input,
            datastream,
            output,
            json,
        } => run_decompose(&input, datastream.as_deref(), &output, json),
        Command::Compose {
            files,
            datastream,
            output,
            embed,
        } => run_compose(&files, &datastream, output, embed),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run_decompose(
    input: &std::path::Path,
    datastream: Option<&str>,
    output: &std::path::Path,
    json: bool,
) -> Result<ExitCode, Error> {
    let report = scap_ds::decompose(input, datastream, output)?;

    if json {
        let summary = Summary::from(&report);
        match serde_json::to_string_pretty(&summary) {
            Ok(s) => println!("{s}"),
            Err(e) => eprintln!("error: {e}"),
        }
    } else {
        for path in &report.written {
            println!("{}", path.display());
        }
        if !report.is_clean() {
            eprintln!(
                "{} reference(s) could not be extracted",
                report.errors.len()
            );
        }
    }

    Ok(if report.is_clean() {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(2)
    })
}

fn run_compose(
    files: &[String],
    datastream: &str,
    output: Option<PathBuf>,
    embed: bool,
) -> Result<ExitCode, Error> {
    let mut composer = Composer::new(datastream);

    for file in files {
        composer.add_component_with_ref(file, file)?;
        if embed {
            let content = dom::parse_bytes(&std::fs::read(file)?).map_err(|e| Error::Source {
                path: PathBuf::from(file),
                source: Box::new(e),
            })?;
            composer.embed_component(file, &content)?;
        }
    }

    let collection = composer.finish();
    match output {
        Some(path) => collection.write_to_path(path)?,
        None => print!("{}", collection.to_xml_string()?),
    }

    Ok(ExitCode::SUCCESS)
}
