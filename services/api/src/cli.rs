use crate::pipeline;
use crate::server;
use clap::{Args, Parser, Subcommand, ValueEnum};
use decision_match::config::PathsConfig;
use decision_match::error::AppError;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "decision-match",
    about = "Score, label and match job openings with candidates, and serve the baseline model",
    version
)]
struct Cli {
    #[command(flatten)]
    dirs: DirArgs,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP prediction service (default command)
    Serve(ServeArgs),
    /// Flatten Jobs.json, Prospects.json and Applicants.json into interim CSVs
    Ingest,
    /// Compute TF-IDF similarity for every prospected (job, candidate) pair
    Score,
    /// Derive pair labels from scores or statuses
    Label(LabelArgs),
    /// Train the baseline on a stratified holdout and save model, threshold and metrics
    Train,
    /// Cross-validate on explicitly labeled pairs and save the refitted model
    TrainCv,
    /// Analyse interview answers and write the markdown report
    Interviews,
    /// Compare score distributions of the training and validation samples
    Drift,
    /// Run ingest, score, label, train and the interview report in sequence
    RunAll(LabelArgs),
}

/// Directory overrides, applied on top of the environment configuration.
#[derive(Args, Debug, Default, Clone)]
pub(crate) struct DirArgs {
    /// Directory holding the raw inputs and the generated tables
    #[arg(long, global = true)]
    pub(crate) data_dir: Option<PathBuf>,
    /// Directory for trained models, thresholds and metrics
    #[arg(long, global = true)]
    pub(crate) models_dir: Option<PathBuf>,
    /// Directory for reports and charts
    #[arg(long, global = true)]
    pub(crate) docs_dir: Option<PathBuf>,
    /// Directory holding weak_labels.yaml
    #[arg(long, global = true)]
    pub(crate) configs_dir: Option<PathBuf>,
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

#[derive(ValueEnum, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) enum StrategyArg {
    /// Similarity rank per job, nudged by status
    #[default]
    Score,
    /// Explicit statuses and comments only
    Status,
}

#[derive(Args, Debug, Default, Clone)]
pub(crate) struct LabelArgs {
    #[arg(long, value_enum, default_value_t = StrategyArg::Score)]
    pub(crate) strategy: StrategyArg,
    /// Maximum positives per job
    #[arg(long)]
    pub(crate) top_k: Option<usize>,
    /// Floor for the per-job score threshold
    #[arg(long)]
    pub(crate) min_score: Option<f64>,
    /// Score quantile used as the per-job threshold, in [0, 1]
    #[arg(long)]
    pub(crate) quantile: Option<f64>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    let dirs = cli.dirs;
    match command {
        Command::Serve(args) => server::run(args, dirs).await,
        Command::Ingest => batch(&dirs, |paths| pipeline::ingest(paths).map(drop)),
        Command::Score => batch(&dirs, |paths| pipeline::score(paths).map(drop)),
        Command::Label(args) => batch(&dirs, |paths| pipeline::label(paths, &args).map(drop)),
        Command::Train => batch(&dirs, |paths| pipeline::train(paths).map(drop)),
        Command::TrainCv => batch(&dirs, |paths| pipeline::train_cv(paths).map(drop)),
        Command::Interviews => batch(&dirs, |paths| pipeline::interviews(paths).map(drop)),
        Command::Drift => batch(&dirs, |paths| pipeline::drift(paths).map(drop)),
        Command::RunAll(args) => batch(&dirs, |paths| pipeline::run_all(paths, &args)),
    }
}

fn batch(
    dirs: &DirArgs,
    stage: impl FnOnce(&PathsConfig) -> Result<(), AppError>,
) -> Result<(), AppError> {
    let config = pipeline::load_config(dirs)?;
    stage(&config.paths)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_subcommand_means_serve() {
        let cli = Cli::try_parse_from(["decision-match"]).expect("parses");
        assert!(cli.command.is_none());
    }

    #[test]
    fn label_flags_and_global_dirs_parse() {
        let cli = Cli::try_parse_from([
            "decision-match",
            "label",
            "--strategy",
            "status",
            "--top-k",
            "3",
            "--data-dir",
            "/tmp/data",
        ])
        .expect("parses");
        assert_eq!(cli.dirs.data_dir, Some(PathBuf::from("/tmp/data")));
        match cli.command {
            Some(Command::Label(args)) => {
                assert_eq!(args.strategy, StrategyArg::Status);
                assert_eq!(args.top_k, Some(3));
                assert_eq!(args.quantile, None);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn train_cv_uses_kebab_case() {
        let cli = Cli::try_parse_from(["decision-match", "train-cv"]).expect("parses");
        assert!(matches!(cli.command, Some(Command::TrainCv)));
    }
}
