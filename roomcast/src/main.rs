use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use roomcast_compiler::{compile_all, streams};
use roomcast_config::ConfigModel;
use roomcast_deploy::plan::resolve_overlaps;
use roomcast_deploy::{
    manage_clients, ClientAction, DeployConfig, FsArtifactWriter, Reconciler, Systemctl,
};
use tracing::{debug, info, warn};

pub mod cli;
pub mod logging;

use cli::{ClientsArgs, Cli, Command, DeployArgs};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = cli.validate() {
        eprintln!("error: {:#}", e);
        return ExitCode::from(2);
    }

    if let Err(e) = logging::init_logging(cli.log_mode, &cli.log_level.to_lowercase()) {
        eprintln!("error: {}", e);
        return ExitCode::from(2);
    }

    match run(cli).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

/// Run one subcommand; `Ok(false)` means it finished with fatal errors
async fn run(cli: Cli) -> Result<bool> {
    let model = load_model(&cli)?;

    match &cli.command {
        Command::Alsa => {
            let compiled = compile_all(&model).context("Compilation failed")?;
            print!("{}", compiled.asound_conf());
            Ok(true)
        }
        Command::Snapserver => {
            let compiled = compile_all(&model).context("Compilation failed")?;
            print!("{}", compiled.snapserver_conf());
            Ok(true)
        }
        Command::Targets => {
            print_targets(&model)?;
            Ok(true)
        }
        Command::Check => {
            check(&model)?;
            Ok(true)
        }
        Command::Deploy(args) => deploy(&model, args).await,
        Command::Clients(args) => clients(&model, args).await,
    }
}

fn load_model(cli: &Cli) -> Result<ConfigModel> {
    debug!(path = %cli.config.display(), "loading speaker model");
    ConfigModel::load(&cli.config)
        .with_context(|| format!("Failed to load {}", cli.config.display()))
}

fn print_targets(model: &ConfigModel) -> Result<()> {
    let config = streams::compile(model).context("Compilation failed")?;

    for topology in &config.topology {
        let rooms: Vec<String> = topology
            .rooms
            .iter()
            .map(|room| format!("{} ({})", room, model.room_display_name(room)))
            .collect();
        println!("{} [{}]", topology.stream, topology.server_stream_id);
        if rooms.is_empty() {
            println!("  (no rooms)");
        }
        for room in rooms {
            println!("  {}", room);
        }
    }

    let (_, warnings) = resolve_overlaps(&config.topology);
    for warning in warnings {
        warn!("{}", warning);
    }
    Ok(())
}

fn check(model: &ConfigModel) -> Result<()> {
    let compiled = compile_all(model).context("Compilation failed")?;
    let devices = compiled.routing.devices().len();
    let endpoints = compiled.routing.endpoints().count();

    println!(
        "ok: {} amplifiers, {} speakers, {} rooms, {} zones, {} streams",
        model.amplifiers.len(),
        model.speakers.len(),
        model.rooms.len(),
        model.zones.len(),
        model.snapcast.streams.len()
    );
    println!(
        "routing: {} devices, {} endpoints; server: {} sources",
        devices,
        endpoints,
        compiled.streams.sources.len()
    );
    Ok(())
}

async fn deploy(model: &ConfigModel, args: &DeployArgs) -> Result<bool> {
    let config = DeployConfig::from(args);
    info!(
        asound = %config.asound_path.display(),
        snapserver = %config.snapserver_path.display(),
        server = %config.server,
        "starting deployment"
    );

    let report = Reconciler::system(config)
        .run(model)
        .await
        .context("Deployment aborted")?;

    print!("{}", report);
    Ok(report.is_success())
}

async fn clients(model: &ConfigModel, args: &ClientsArgs) -> Result<bool> {
    let config = DeployConfig::from(args);
    let systemctl = Systemctl::new(config.use_sudo);
    let writer = FsArtifactWriter::with_sudo(config.use_sudo);

    let outcomes = manage_clients(
        args.action,
        model,
        &config,
        &systemctl,
        &writer,
        Some(&systemctl),
    )
    .await
    .with_context(|| format!("clients {} failed", args.action))?;

    let mut success = true;
    for outcome in outcomes {
        match outcome.result {
            Ok(Some(status)) => println!("{}: {}", outcome.unit, status),
            Ok(None) if args.action == ClientAction::Install => {
                println!("installed {}", outcome.unit)
            }
            Ok(None) => println!("{}: {} ok", outcome.unit, args.action),
            Err(e) => {
                success = false;
                println!("{}: {}", outcome.unit, e);
            }
        }
    }
    Ok(success)
}
