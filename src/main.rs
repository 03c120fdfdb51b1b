use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::{sync::watch, task::JoinHandle};
use tracing::{error, info, Level};

use crate::{
    config::Config,
    control::{control_channel, timer_channel, ControlSender, TimerSender},
    dispatcher::Dispatcher,
    effects::{EffectCommand, Lights},
    emulator::Emulator,
    fsm::StateMachine,
    opc::OpcClient,
    receiver::{run_status_loop, StatusReceiver},
    status::StatusMapper,
};

mod config;
mod control;
mod dispatcher;
mod effects;
mod emulator;
mod fsm;
mod opc;
mod pixels;
mod receiver;
mod signal;
mod status;

#[derive(Parser)]
#[command(name = "statuslights")]
#[command(about = "Drives status LED rings from controller status reports", long_about = None)]
struct Cli {
    /// TOML configuration file. Stock layout and addresses when omitted.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// More output; repeat for trace level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Listen for status and show it on the lights (default)
    Run,

    /// Run a single effect until Ctrl-C
    Effect {
        /// Effect name, e.g. chase or heartbeatSine
        name: String,

        /// Positional arguments as a JSON array, e.g. '[[0,0,128], 0.2]'
        args: Option<String>,
    },

    /// Send a scripted sequence of status reports
    Emulate {
        /// Where status reports are sent
        #[arg(short, long, default_value = "127.0.0.1:6665")]
        target: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt().with_max_level(level).init();

    let config = Config::load(cli.config.as_deref()).context("loading configuration")?;

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run(config).await,
        Commands::Effect { name, args } => run_effect(config, &name, args.as_deref()).await,
        Commands::Emulate { target } => {
            let mut emulator = Emulator::connect(&target).await?;
            emulator.run_script().await
        }
    }
}

/// Starts the rendering worker on its own task. The returned sender is the
/// only way to talk to it.
fn spawn_worker(config: &Config) -> Result<(ControlSender, TimerSender, JoinHandle<()>)> {
    let layout = config.layout().context("building pixel layout")?;
    info!(
        pixels = layout.total(),
        rings = layout.ring_count(),
        sink = %config.opc.addr,
        "starting rendering worker"
    );
    let (control_tx, control) = control_channel();
    let (timer_tx, timer) = timer_channel();

    let sink = OpcClient::new(config.opc.addr.clone());
    let lights = Lights::new(sink, layout, timer, config.render_settings());
    let mut dispatcher = Dispatcher::new(lights, control);

    let worker = tokio::spawn(async move { dispatcher.run().await });
    Ok((control_tx, timer_tx, worker))
}

async fn run(config: Config) -> Result<()> {
    let (control_tx, timer_tx, worker) = spawn_worker(&config)?;

    let receiver = StatusReceiver::bind(&config.status.listen).await?;
    let mapper = StatusMapper::new(StateMachine::with_signatures(control_tx.clone()), timer_tx);
    let (stop_tx, stop) = watch::channel(false);
    let poller = tokio::spawn(run_status_loop(
        receiver,
        mapper,
        config.recv_timeout(),
        stop,
    ));

    wait_for_ctrl_c().await;

    stop_tx.send(true).ok();
    if let Err(e) = poller.await? {
        error!("status loop failed: {e:#}");
    }

    shut_down(control_tx, worker).await
}

async fn run_effect(config: Config, name: &str, args: Option<&str>) -> Result<()> {
    let args = match args {
        Some(args) => {
            serde_json::from_str(args).context("effect arguments must be a JSON array")?
        }
        None => Vec::new(),
    };
    let command = EffectCommand::from_parts(name, args)?;

    // kept alive so the timer feed stays open
    let (control_tx, _timer_tx, worker) = spawn_worker(&config)?;
    info!(effect = command.name(), "running effect until Ctrl-C");
    control_tx.send(command).context("rendering worker is gone")?;

    wait_for_ctrl_c().await;
    shut_down(control_tx, worker).await
}

async fn wait_for_ctrl_c() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("ctrl-c received, turning lights off"),
        Err(err) => error!("Unable to listen for shutdown signal: {}", err),
    }
}

/// Blanks the lights, stops the worker and waits for it to finish.
async fn shut_down(control_tx: ControlSender, worker: JoinHandle<()>) -> Result<()> {
    for command in [EffectCommand::AllOff, EffectCommand::Kill] {
        control_tx
            .send(command)
            .context("rendering worker stopped early")?;
    }

    worker.await?;
    Ok(())
}
