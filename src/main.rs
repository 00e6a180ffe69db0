// Command-line entry point for relapse_viz.

use std::ffi::OsStr;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use rayon::prelude::*;
use tracing_subscriber::EnvFilter;

use relapse_viz::api::dto::JsonExporter;
use relapse_viz::application::RenderUsecase;
use relapse_viz::domain::identity::DEFAULT_SEED;
use relapse_viz::domain::translator::TranslateOptions;
use relapse_viz::infrastructure::concurrency::init_thread_pool;
use relapse_viz::infrastructure::config::{Config, OutputFormat};
use relapse_viz::infrastructure::{GraphvizRenderer, RelapseParser, SvgExporter};
use relapse_viz::ports::dot_exporter::DotExporter;
use relapse_viz::ports::OutputExporter;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Relapse grammar file (can specify multiple)
    #[arg(short, long, required = true)]
    input: Vec<PathBuf>,

    /// Output file, or output directory when several inputs are given.
    /// Without it a single result goes to stdout and several results are
    /// written next to their inputs.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum)]
    format: Option<OutputFormat>,

    /// Also draw keywords, whitespace and comments
    #[arg(long, overrides_with = "no_full")]
    full: bool,

    /// Draw only the structural tree, even if the config file sets `full`
    #[arg(long, overrides_with = "full")]
    no_full: bool,

    /// Seed for node identifiers
    #[arg(long)]
    seed: Option<u64>,

    /// Graphviz program used for SVG output
    #[arg(long = "dot")]
    dot_command: Option<String>,

    /// TOML file with defaults for the options above
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Worker threads for several inputs
    #[arg(long)]
    threads: Option<usize>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

/// Command-line flags merged over the config file.
struct Settings {
    options: TranslateOptions,
    format: OutputFormat,
    dot_command: String,
    threads: Option<usize>,
}

impl Settings {
    fn resolve(cli: &Cli) -> Result<Self> {
        let config = match &cli.config {
            Some(path) => Config::load(path)?,
            None => Config::default(),
        };
        Ok(Settings {
            options: TranslateOptions {
                full: match (cli.full, cli.no_full) {
                    (true, _) => true,
                    (_, true) => false,
                    _ => config.full,
                },
                seed: cli.seed.or(config.seed).unwrap_or(DEFAULT_SEED),
            },
            format: cli.format.or(config.format).unwrap_or_default(),
            dot_command: cli
                .dot_command
                .clone()
                .or(config.dot_command)
                .unwrap_or_else(|| GraphvizRenderer::default().command),
            threads: cli.threads.or(config.threads),
        })
    }

    fn exporter(&self) -> Box<dyn OutputExporter> {
        match self.format {
            OutputFormat::Dot => Box::new(DotExporter),
            OutputFormat::Json => Box::new(JsonExporter),
            OutputFormat::Svg => Box::new(SvgExporter {
                renderer: GraphvizRenderer {
                    command: self.dot_command.clone(),
                },
            }),
        }
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Where the rendering of `input` goes when several inputs are processed.
/// An input that already carries the output extension gets a second one,
/// so a grammar is never overwritten by its own rendering.
fn output_path(input: &Path, output_dir: Option<&Path>, format: OutputFormat) -> PathBuf {
    let ext = format.extension();
    let target = if input.extension() == Some(OsStr::new(ext)) {
        let mut name = input.as_os_str().to_owned();
        name.push(".");
        name.push(ext);
        PathBuf::from(name)
    } else {
        input.with_extension(ext)
    };
    match (output_dir, target.file_name()) {
        (Some(dir), Some(name)) => dir.join(name),
        _ => target,
    }
}

fn run(cli: Cli) -> Result<()> {
    let settings = Settings::resolve(&cli)?;
    let exporter = settings.exporter();
    let usecase = RenderUsecase {
        parser: &RelapseParser,
        exporter: exporter.as_ref(),
        options: settings.options,
    };

    if let [input] = cli.input.as_slice() {
        return match &cli.output {
            Some(output) => usecase.run_file(input, output),
            None => {
                let source = std::fs::read_to_string(input)
                    .with_context(|| format!("Cannot read {}", input.display()))?;
                let bytes = usecase
                    .run(&source)
                    .with_context(|| input.display().to_string())?;
                std::io::stdout()
                    .write_all(&bytes)
                    .context("Cannot write to stdout")
            }
        };
    }

    if let Some(dir) = &cli.output {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Cannot create output directory {}", dir.display()))?;
    }
    let workers = init_thread_pool(settings.threads)?;
    tracing::info!(files = cli.input.len(), workers, "rendering grammars");

    let failures: Vec<anyhow::Error> = cli
        .input
        .par_iter()
        .filter_map(|input| {
            let output = output_path(input, cli.output.as_deref(), settings.format);
            usecase.run_file(input, &output).err()
        })
        .collect();

    for err in &failures {
        tracing::error!("{:#}", err);
    }
    if failures.is_empty() {
        Ok(())
    } else {
        anyhow::bail!("{} of {} grammars failed", failures.len(), cli.input.len())
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {:#}", err);
            ExitCode::FAILURE
        }
    }
}
