use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use miette::IntoDiagnostic;
use tracing_subscriber::EnvFilter;

use glucose_ml_catalog::cancel::CancelToken;
use glucose_ml_catalog::catalog::CatalogFilter;
use glucose_ml_catalog::config::{ConfigLoader, ResolvedConfig, SourceLocation};
use glucose_ml_catalog::error::CatalogError;
use glucose_ml_catalog::output::{JsonOutput, OutputMode, TextOutput};
use glucose_ml_catalog::resolver::{ProgressSink, Resolver};
use glucose_ml_catalog::sources::{FileFetcher, HttpFetcher, SourceFetcher};

#[derive(Parser)]
#[command(name = "gml-catalog")]
#[command(about = "Browse clinical glucose-monitoring datasets from their static JSON sources")]
#[command(version, author)]
struct Cli {
    #[arg(long, global = true)]
    config: Option<String>,

    #[arg(long, global = true, conflicts_with = "base_url")]
    data_dir: Option<String>,

    #[arg(long, global = true)]
    base_url: Option<String>,

    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Resolve and show one dataset")]
    Detail(DetailArgs),
    #[command(about = "List datasets, optionally filtered")]
    List(ListArgs),
}

#[derive(Args)]
struct DetailArgs {
    id: String,
}

#[derive(Args)]
struct ListArgs {
    #[arg(long = "data-type")]
    data_types: Vec<String>,

    #[arg(long = "population")]
    populations: Vec<String>,

    #[arg(long)]
    duration: Option<String>,

    #[arg(long)]
    sample_size: Option<String>,

    #[arg(long)]
    access: Option<String>,
}

fn main() -> ExitCode {
    if let Err(report) = run() {
        if let Some(CatalogError::Cancelled) = report.downcast_ref::<CatalogError>() {
            return ExitCode::from(130);
        }
        eprintln!("{report:?}");
        if let Some(error) = report.downcast_ref::<CatalogError>() {
            return ExitCode::from(map_exit_code(error));
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn map_exit_code(error: &CatalogError) -> u8 {
    match error {
        CatalogError::DatasetNotFound(_) => 2,
        CatalogError::InvalidFilter(_) => 2,
        CatalogError::DatasetNotLoadable { .. }
        | CatalogError::MalformedSource { .. }
        | CatalogError::SourceUnavailable { .. }
        | CatalogError::Http(_) => 3,
        CatalogError::Cancelled => 130,
        _ => 1,
    }
}

fn run() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let output_mode = if cli.json {
        OutputMode::Json
    } else {
        OutputMode::Text
    };

    let mut config = ConfigLoader::resolve(cli.config.as_deref())?;
    if let Some(url) = cli.base_url {
        config.location = SourceLocation::BaseUrl(url);
    } else if let Some(dir) = cli.data_dir {
        config.location = SourceLocation::Directory(dir.into());
    }

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .into_diagnostic()?;
    runtime.block_on(dispatch(cli.command, config, output_mode))
}

async fn dispatch(
    command: Commands,
    config: ResolvedConfig,
    output_mode: OutputMode,
) -> miette::Result<()> {
    match config.location.clone() {
        SourceLocation::Directory(dir) => {
            let resolver = Resolver::new(FileFetcher::new(dir), config.paths);
            run_command(command, resolver, output_mode).await
        }
        SourceLocation::BaseUrl(url) => {
            let fetcher = HttpFetcher::new(&url, config.timeout)?;
            let resolver = Resolver::new(fetcher, config.paths);
            run_command(command, resolver, output_mode).await
        }
    }
}

async fn run_command<F: SourceFetcher>(
    command: Commands,
    resolver: Resolver<F>,
    output_mode: OutputMode,
) -> miette::Result<()> {
    let cancel = CancelToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_interrupt.cancel();
        }
    });

    let sink: &dyn ProgressSink = match output_mode {
        OutputMode::Text => &TextOutput,
        OutputMode::Json => &JsonOutput,
    };

    match command {
        Commands::Detail(args) => {
            let detail = resolver.resolve(&args.id, &cancel, sink).await?;
            match output_mode {
                OutputMode::Text => TextOutput::print_detail(&detail).into_diagnostic(),
                OutputMode::Json => JsonOutput::print_detail(&detail).into_diagnostic(),
            }
        }
        Commands::List(args) => {
            let filter = CatalogFilter::from_labels(
                &args.data_types,
                &args.populations,
                args.duration.as_deref(),
                args.sample_size.as_deref(),
                args.access.as_deref(),
            )?;
            let result = resolver.list(&filter, &cancel, sink).await?;
            match output_mode {
                OutputMode::Text => TextOutput::print_list(&result).into_diagnostic(),
                OutputMode::Json => JsonOutput::print_list(&result).into_diagnostic(),
            }
        }
    }
}
