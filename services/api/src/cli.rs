use crate::demo::{
    run_demo, run_import_scores, run_summary, DemoArgs, ImportScoresArgs, SummaryArgs,
};
use crate::server;
use clap::{Args, Parser, Subcommand};
use outcome_tracker::error::AppError;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "Outcome Tracker",
    about = "Serve and inspect learning and program outcome scores from the command line",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Print the outcome summary of one student from a dataset
    Summary(SummaryArgs),
    /// Apply a gradebook CSV to a dataset and print the refreshed summary
    ImportScores(ImportScoresArgs),
    /// Walk through LO, PO and summary scoring on a bundled sample cohort
    Demo(DemoArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
    /// JSON dataset to load instead of APP_DATASET
    #[arg(long)]
    pub(crate) dataset: Option<PathBuf>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Summary(args) => run_summary(args),
        Command::ImportScores(args) => run_import_scores(args),
        Command::Demo(args) => run_demo(args),
    }
}
