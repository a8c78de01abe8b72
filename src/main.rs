use clap::Parser;
use log::{error, info, warn};
use std::process::ExitCode;
use std::sync::Arc;
use tokio::signal;
use tokio::sync::oneshot;
use tokio::signal::unix::{SignalKind, signal as unix_signal};
use tokio_util::sync::CancellationToken;
use water_level_monitor::ACCESSORY_NAME;
use water_level_monitor::config::{self, Cli, Config};
use water_level_monitor::error::{MonitorError, Result};
use water_level_monitor::input::simulation::run_level_simulation;
use water_level_monitor::input::{FloatSwitch, SimulatedFloatSwitch};
use water_level_monitor::instance_lock::InstanceLock;
use water_level_monitor::matter::{LeakAccessory, MatterTransport, run_matter_stack, stack_ready};
use water_level_monitor::monitor::{
    LevelStateMachine, Scheduler, SensorReader, SystemClock, scheduler,
};

/// Exit code for configuration errors (invalid notification window etc.)
const EXIT_CONFIG: u8 = 2;

fn init_logger() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();
}

fn main() -> ExitCode {
    // Before the runtime starts any worker threads
    config::load_dotenv();
    init_logger();

    let config = match Config::from_cli(Cli::parse()) {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            return ExitCode::from(EXIT_CONFIG);
        }
    };

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to start async runtime: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run(config)) {
        Ok(()) => {
            info!("Program stopped");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(config: Config) -> Result<()> {
    info!("Starting {}...", ACCESSORY_NAME);
    info!("Configuration loaded:");
    info!("  Float switch pin: {}", config.sensor.pin);
    info!(
        "  Check interval: {} seconds",
        config.monitor.poll_interval.as_secs()
    );
    match &config.monitor.window {
        Some(window) => info!("  Notification window: {}", window),
        None => info!("  Notification window: always"),
    }
    info!("  Pairing port: {}", config.accessory.port);

    let _lock = InstanceLock::acquire()?;

    if config.sensor.simulate {
        warn!("Using simulated float switch, GPIO is not touched");
        let (switch, handle) = SimulatedFloatSwitch::new();
        let toggle_every = config.monitor.poll_interval.saturating_mul(2);
        let simulation = run_level_simulation(handle, toggle_every);
        let result = supervise(switch, &config).await;
        simulation.abort();
        result
    } else {
        let switch = FloatSwitch::open(config.sensor.pin, config.sensor.active_high)?;
        supervise(switch, &config).await
    }
}

/// Expose the accessory, run the scheduler and wait for a shutdown signal.
///
/// The reader is dropped (and the GPIO pin released) on every return path.
async fn supervise<R>(reader: R, config: &Config) -> Result<()>
where
    R: SensorReader + 'static,
{
    let accessory = Arc::new(LeakAccessory::new());
    let transport = MatterTransport::bind(&config.accessory)?;
    info!(
        "Accessory reachable on UDP port {} via '{}'",
        transport.port(),
        transport.interface_name()
    );

    // Matter uses blocking I/O internally with embassy, so it runs on a dedicated thread
    let matter_accessory = accessory.clone();
    let (ready_tx, ready_rx) = oneshot::channel();
    std::thread::Builder::new()
        .name("matter-stack".into())
        .stack_size(550 * 1024) // 550KB stack for Matter operations (matches rs-matter examples)
        .spawn(move || {
            if let Err(e) = futures_lite::future::block_on(run_matter_stack(
                transport,
                matter_accessory,
                ready_tx,
            )) {
                error!("Matter stack error: {:?}", e);
            }
        })
        .map_err(|e| MonitorError::TransportUnavailable(format!("Matter thread: {}", e)))?;

    // The scheduler only starts against a serving accessory
    stack_ready(ready_rx).await?;
    info!("Matter stack started on dedicated thread");

    let machine = LevelStateMachine::new(reader, accessory, config.monitor.window);
    let scheduler = Scheduler::new(config.monitor.poll_interval);
    let shutdown = CancellationToken::new();

    let scheduler_shutdown = shutdown.clone();
    let scheduler_task = scheduler::join(tokio::spawn(async move {
        let mut machine = machine;
        let ticks = scheduler
            .run(&mut machine, &SystemClock, scheduler_shutdown)
            .await;
        (machine, ticks)
    }));
    tokio::pin!(scheduler_task);

    info!("{} is running", ACCESSORY_NAME);
    info!("  - Open the Home app and add the accessory");
    info!("  - Press Ctrl+C to exit");

    // The scheduler only returns on its own if it panicked
    let (machine, ticks) = tokio::select! {
        _ = wait_for_shutdown() => {
            shutdown.cancel();
            scheduler_task.await?
        }
        finished = &mut scheduler_task => finished?,
    };
    info!("Completed {} water level checks", ticks);
    let (reader, _accessory) = machine.into_parts();
    drop(reader);

    Ok(())
}

/// Wait for SIGINT (Ctrl+C) or SIGTERM.
async fn wait_for_shutdown() {
    let mut sigterm = match unix_signal(SignalKind::terminate()) {
        Ok(sigterm) => sigterm,
        Err(e) => {
            error!("Failed to listen for SIGTERM: {}", e);
            if let Err(e) = signal::ctrl_c().await {
                error!("Failed to listen for shutdown signal: {}", e);
            }
            return;
        }
    };

    tokio::select! {
        result = signal::ctrl_c() => match result {
            Ok(()) => info!("Received shutdown signal"),
            Err(e) => error!("Failed to listen for shutdown signal: {}", e),
        },
        _ = sigterm.recv() => info!("Received SIGTERM"),
    }
}
