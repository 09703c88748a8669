use clap::Parser;
use stackrig::cli::{Cli, Commands, LifecycleCommands};
use stackrig::commands;
use stackrig::config::{load_config, resolve::resolve_config};
use stackrig::orchestrator::outcome::{BatchResult, UnitState};
use stackrig::orchestrator::OrchestrationCore;

#[tokio::main]
async fn main() {
    // Initialize tracing subscriber with env-filter support. Diagnostics
    // go to stderr; stdout carries only operation output, which --json
    // consumers parse.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let json = cli.global.json;

    let result = match cli.command {
        Commands::Init => commands::init::run().map(|()| true),
        command => run_with_core(cli.global.config_file, command, json).await,
    };

    match result {
        Ok(ok) => {
            if !ok {
                std::process::exit(1);
            }
        }
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Build the core from the resolved config, then dispatch. Returns
/// whether the operation's outcomes warrant exit code 0.
async fn run_with_core(
    config_file: Option<std::path::PathBuf>,
    command: Commands,
    json: bool,
) -> anyhow::Result<bool> {
    let config_path = resolve_config(config_file.as_deref())?;
    let config = load_config(&config_path)?;
    let base_dir = config_path
        .parent()
        .unwrap_or_else(|| std::path::Path::new("."))
        .to_path_buf();
    let core = OrchestrationCore::new(config, base_dir)?;

    match command {
        Commands::Start { ports } => {
            let batch = batch_over(&core, ports, Op::Start).await;
            commands::print_batch(&batch, json);
            Ok(commands::batch_exit_ok(&batch))
        }
        Commands::Stop { ports } => {
            let batch = batch_over(&core, ports, Op::Stop).await;
            commands::print_batch(&batch, json);
            Ok(commands::batch_exit_ok(&batch))
        }
        Commands::Health { ports } => {
            let batch = batch_over(&core, ports, Op::Health).await;
            commands::print_batch(&batch, json);
            Ok(commands::batch_exit_ok(&batch))
        }
        Commands::Refresh { port } => {
            let outcome = core.refresh(port).await;
            commands::print_outcome(&outcome, json);
            Ok(outcome.state == UnitState::Up)
        }
        Commands::Status => {
            commands::status::run(&core, json).await?;
            Ok(true)
        }
        Commands::Blockchain { command } => {
            let (outcome, wanted) = match command {
                LifecycleCommands::Start => (core.start_blockchain().await, UnitState::Up),
                LifecycleCommands::Stop => (core.stop_blockchain().await, UnitState::Down),
                LifecycleCommands::Status => (core.health_blockchain().await, UnitState::Up),
            };
            commands::print_outcome(&outcome, json);
            Ok(outcome.state == wanted)
        }
        Commands::Database { command } => {
            let (outcome, wanted) = match command {
                LifecycleCommands::Start => (core.start_database().await, UnitState::Up),
                LifecycleCommands::Stop => (core.stop_database().await, UnitState::Down),
                LifecycleCommands::Status => (core.health_database().await, UnitState::Up),
            };
            commands::print_outcome(&outcome, json);
            Ok(outcome.state == wanted)
        }
        Commands::Create { command } => {
            commands::tools::run(&core, command).await?;
            Ok(true)
        }
        Commands::Validate => {
            // Reaching this point means config + registry already built.
            println!(
                "Configuration OK: {} units registered",
                core.registry().len()
            );
            Ok(true)
        }
        Commands::Init => unreachable!("handled before config resolution"),
    }
}

enum Op {
    Start,
    Stop,
    Health,
}

async fn batch_over(core: &OrchestrationCore, ports: Vec<u16>, op: Op) -> BatchResult {
    match (&op, ports.is_empty()) {
        (Op::Start, true) => core.start_all().await,
        (Op::Stop, true) => core.stop_all().await,
        (Op::Health, true) => core.health_all().await,
        _ => {
            let mut batch = BatchResult::new();
            for port in ports {
                let (outcome, wanted) = match op {
                    Op::Start => (core.start_unit(port).await, UnitState::Up),
                    Op::Stop => (core.stop_unit(port).await, UnitState::Down),
                    Op::Health => (core.health_check(port).await, UnitState::Up),
                };
                batch.record(outcome, wanted);
            }
            batch
        }
    }
}
