//! Limitsync CLI
//!
//! Sets CPU and memory limits on Kubernetes Deployments from a CSV file

mod output;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use limitsync_core::kubernetes::K8sClient;
use limitsync_core::{LimitsyncConfig, Reconciler, RecordSource, RunSummary, ShutdownCoordinator};
use output::OutputFormat;
use std::io::IsTerminal;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Config file (searched in standard locations when omitted)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// CSV file of name,namespace,cpu,memory rows
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Kubeconfig file
    #[arg(long)]
    kubeconfig: Option<PathBuf>,

    /// Kubeconfig context to use
    #[arg(long)]
    context: Option<String>,

    /// Timeout for each API call, in seconds
    #[arg(short, long)]
    timeout: Option<u64>,

    /// Exit non-zero when any record was not applied
    #[arg(long)]
    fail_on_error: bool,

    /// Summary format; with json or yaml, status lines go to stderr
    #[arg(short, long, value_enum, default_value = "table")]
    output: OutputFormat,

    /// Disable colored output
    #[arg(long)]
    no_color: bool,

    /// Log level for diagnostics on stderr
    #[arg(long)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate shell completions
    Completions {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
    /// Print a sample configuration file
    SampleConfig,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Completions { shell }) => {
            generate_completions(shell);
            return Ok(ExitCode::SUCCESS);
        }
        Some(Commands::SampleConfig) => {
            print!("{}", LimitsyncConfig::generate_sample()?);
            return Ok(ExitCode::SUCCESS);
        }
        None => {}
    }

    if cli.no_color || !std::io::stdout().is_terminal() {
        colored::control::set_override(false);
    }

    let mut config = LimitsyncConfig::load(cli.config.as_deref())?;
    apply_flags(&mut config, &cli);
    config.validate()?;

    let _log_guard = config
        .logging
        .init()
        .map_err(|e| anyhow!("Failed to initialize logging: {}", e))?;

    let kubeconfig = config.kubeconfig_path()?;
    let client = K8sClient::from_kubeconfig_file(&kubeconfig, config.cluster.context.as_deref())
        .await
        .with_context(|| format!("Failed to load kubeconfig {}", kubeconfig.display()))?;

    tracing::info!(
        context = client.context_name(),
        server = client.api_server(),
        "Connected to cluster"
    );

    let records = RecordSource::open(&config.input.path)
        .with_context(|| format!("Failed to open input file {}", config.input.path.display()))?;

    let coordinator = ShutdownCoordinator::new();
    let signals = coordinator.clone();
    tokio::spawn(async move {
        if let Err(e) = signals.wait_for_signal().await {
            tracing::warn!(error = %e, "Failed to install signal handlers");
        }
    });

    let reconciler = Reconciler::new(client)
        .with_call_timeout(config.call_timeout())
        .with_shutdown(coordinator.subscribe());

    let format = cli.output;
    let summary = reconciler
        .run(records, |outcome| output::print_outcome(outcome, format))
        .await;

    output::print_summary(&summary, format)?;

    if run_failed(&summary, config.reconcile.fail_on_error) {
        Ok(ExitCode::FAILURE)
    } else {
        Ok(ExitCode::SUCCESS)
    }
}

/// Command-line flags take precedence over the environment and config file
fn apply_flags(config: &mut LimitsyncConfig, cli: &Cli) {
    if let Some(input) = &cli.input {
        config.input.path = input.clone();
    }
    if let Some(kubeconfig) = &cli.kubeconfig {
        config.cluster.kubeconfig = Some(kubeconfig.clone());
    }
    if let Some(context) = &cli.context {
        config.cluster.context = Some(context.clone());
    }
    if let Some(secs) = cli.timeout {
        config.reconcile.call_timeout_secs = secs;
    }
    if cli.fail_on_error {
        config.reconcile.fail_on_error = true;
    }
    if let Some(level) = &cli.log_level {
        config.logging.level = level.clone();
    }
}

/// A broken input stream always fails the run; record failures only when asked
fn run_failed(summary: &RunSummary, fail_on_error: bool) -> bool {
    summary.input_error.is_some() || (fail_on_error && summary.has_failures())
}

/// Generate shell completions
fn generate_completions(shell: clap_complete::Shell) {
    use clap::CommandFactory;
    use clap_complete::generate;
    use std::io;

    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();

    generate(shell, &mut cmd, name, &mut io::stdout());
}
