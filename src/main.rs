use anyhow::Context;
use clap::{Parser, Subcommand};
use draft_wizard::collab::{JsonContextStore, ResourceSource, StaticResources, TracingReporter};
use draft_wizard::config::WizardConfig;
use draft_wizard::core::{WizardError, WizardRunner};
use draft_wizard::terminal::TerminalHost;
use draft_wizard::wizards::{dockerfile, flow_file, workflow};
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

const CANCELLED_EXIT: u8 = 130;

#[derive(Parser)]
#[command(name = "draft-wizard", about = "Step-by-step prompts for Draft scaffolding")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,

    /// Wizard settings file (YAML).
    #[arg(long, global = true, env = "DRAFT_WIZARD_CONFIG")]
    config: Option<PathBuf>,

    /// Where answers are remembered between runs.
    #[arg(long, global = true, default_value = ".draft/context.json")]
    context: PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    /// Collect answers for a Dockerfile and deployment files.
    Create,
    /// Collect answers for a GitHub Actions deployment workflow.
    Workflow {
        /// Directory manifest paths are resolved against.
        #[arg(long, default_value = ".")]
        workspace: PathBuf,
        /// YAML file listing resource groups, clusters and registries.
        #[arg(long)]
        resources: Option<PathBuf>,
    },
    /// Run a wizard declared in a YAML file.
    Flow { file: PathBuf },
}

fn init_telemetry(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    let registry = tracing_subscriber::registry().with(filter);

    if cli.json_logs {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}

fn load_resources(path: Option<&PathBuf>) -> anyhow::Result<Arc<dyn ResourceSource>> {
    let Some(path) = path else {
        return Ok(Arc::new(StaticResources::sample()));
    };
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read resources {}", path.display()))?;
    let resources: StaticResources = serde_yaml::from_str(&raw)
        .with_context(|| format!("failed to parse resources {}", path.display()))?;
    Ok(Arc::new(resources))
}

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn run(cli: Cli) -> anyhow::Result<Result<(), WizardError>> {
    let config = WizardConfig::load_optional(cli.config.as_deref())?;
    let reporter = TracingReporter;
    let host = TerminalHost::new().context("failed to open the terminal")?;

    match cli.command {
        Commands::Create => {
            let context = JsonContextStore::open(&cli.context)
                .with_context(|| format!("failed to open context {}", cli.context.display()))?;
            let mut runner = WizardRunner::new(host).with_name(dockerfile::NAME);
            let outcome = dockerfile::run(&mut runner, &config, &context, &reporter).await;
            drop(runner);
            Ok(match outcome {
                Ok(created) => print_json(&created).map(Ok)?,
                Err(error) => Err(error),
            })
        }
        Commands::Workflow {
            workspace,
            resources,
        } => {
            let resources = load_resources(resources.as_ref())?;
            let settings = Arc::new(workflow::WorkflowSettings::new(&config, workspace, resources));
            let mut runner = WizardRunner::new(host).with_name(workflow::NAME);
            let outcome = workflow::run(&mut runner, settings, &reporter).await;
            drop(runner);
            Ok(match outcome {
                Ok(generated) => print_json(&generated).map(Ok)?,
                Err(error) => Err(error),
            })
        }
        Commands::Flow { file } => {
            let plan = flow_file::FlowPlan::load(&file, &config)?;
            info!(
                title = plan.title(),
                steps = plan.len(),
                "running declared flow"
            );
            let mut runner = WizardRunner::new(host).with_name(plan.title().to_string());
            let outcome = flow_file::run(&mut runner, plan).await;
            drop(runner);
            Ok(match outcome {
                Ok(answers) => print_json(&answers).map(Ok)?,
                Err(error) => Err(error),
            })
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_telemetry(&cli);

    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            eprintln!("Error: failed to start runtime: {error}");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run(cli)) {
        Ok(Ok(())) => ExitCode::SUCCESS,
        Ok(Err(WizardError::Cancelled)) => ExitCode::from(CANCELLED_EXIT),
        Ok(Err(error)) => {
            eprintln!("Error: {error}");
            ExitCode::FAILURE
        }
        Err(error) => {
            eprintln!("Error: {error:#}");
            ExitCode::FAILURE
        }
    }
}
