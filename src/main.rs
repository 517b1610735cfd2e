use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{Level, info, warn};

use notchy::config::{Config, ConfigLoader};
use notchy::events::Event;
use notchy::logging::{self, LoggingConfig};
use notchy::monitor::EventMonitor;
use notchy::notifications::NotificationManager;
use notchy::service::ServiceManager;
use notchy::sources::LoginMonitor;
use notchy::surface::{ConsoleSurface, NotchSurface};
use notchy::system::{CpuSampler, StandardFileSystem, TopCpuSampler, full_user_name};

#[derive(Parser)]
#[command(name = "notchy")]
#[command(about = "Prioritized notch events with auto-dismiss and display orchestration")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the daemon (default)
    Run,
    /// Validate and summarise the configuration file
    CheckConfig,
    /// Post one custom event and wait until it is gone
    Post {
        #[arg(short, long)]
        title: String,
        #[arg(short, long)]
        message: Option<String>,
        /// 0-100, higher preempts lower
        #[arg(short, long, default_value_t = 50)]
        priority: u8,
        /// Seconds until auto-dismiss (default 5); 0 keeps it until Ctrl+C
        #[arg(short, long)]
        dismiss_after: Option<f64>,
    },
    /// Show the welcome event now
    Welcome,
    /// List audio output devices, marking AirPods matches
    ListDevices,
    /// Print one CPU usage sample
    SampleCpu,
    /// Send a test system notification
    TestNotification,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let loader = ConfigLoader::for_path(cli.config.as_deref())?;
    let config = loader.load_config()?;
    let is_daemon = matches!(cli.command, None | Some(Commands::Run));

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        logging::parse_level(&config.general.log_level)
    };
    let mut logging_config = LoggingConfig::from_settings(level, &config.logging);
    // Only the daemon writes log files
    logging_config.file_output &= is_daemon;

    let (_guard, log_dir) = logging::initialize_logging(logging_config)?;
    if let Some(dir) = &log_dir {
        info!("Logging to {}", dir.display());
        if let Err(e) = logging::cleanup_old_logs(dir, config.logging.keep_days) {
            warn!("Failed to clean up old logs: {:#}", e);
        }
    }

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run_daemon(loader.get_config_path().to_path_buf()).await,
        Commands::CheckConfig => check_config(&loader, &config),
        Commands::Post {
            title,
            message,
            priority,
            dismiss_after,
        } => {
            let mut builder = Event::custom(title).message(message).priority(priority);
            if let Some(secs) = dismiss_after {
                builder = match dismiss_delay(secs)? {
                    Some(delay) => builder.dismiss_after(Some(delay)),
                    None => builder.auto_dismiss(false).dismiss_after(None),
                };
            }
            show_until_dismissed(&config, builder.build()).await
        }
        Commands::Welcome => {
            let login = LoginMonitor::new(
                StandardFileSystem,
                &config.login,
                config.login.state_path()?,
                full_user_name(),
            );
            let monitor = spawn_console_monitor(&config);
            login.trigger_welcome(&monitor).await;
            wait_until_empty(&monitor).await
        }
        Commands::ListDevices => list_devices(&config),
        Commands::SampleCpu => sample_cpu().await,
        Commands::TestNotification => NotificationManager::new(&config.notifications)
            .test_notification(),
    }
}

/// Seconds from `--dismiss-after`; zero or less means manual dismiss
fn dismiss_delay(secs: f64) -> Result<Option<Duration>> {
    if secs.is_nan() {
        bail!("--dismiss-after must be a number of seconds");
    }
    if secs <= 0.0 {
        return Ok(None);
    }
    let delay = Duration::try_from_secs_f64(secs)
        .with_context(|| format!("--dismiss-after {} is out of range", secs))?;
    Ok(Some(delay))
}

async fn run_daemon(config_path: PathBuf) -> Result<()> {
    info!("Starting daemon mode");

    println!("Notchy daemon started");
    println!("  Press Ctrl+C to stop, send SIGHUP to reload configuration");

    let mut manager = ServiceManager::new(config_path)?;
    manager.start().await?;

    println!("Daemon stopped");
    Ok(())
}

fn check_config(loader: &ConfigLoader<StandardFileSystem>, config: &Config) -> Result<()> {
    info!("Validating configuration");

    println!("Configuration: {}", loader.get_config_path().display());
    println!("  ✓ Parsed and validated");
    println!(
        "  Dismiss policy: {:?} (compact animation {}ms)",
        config.events.dismiss_policy, config.events.compact_animation_ms
    );
    println!(
        "  CPU monitor: {} (threshold {}%, every {}s, sustained {}s, cooldown {}s)",
        enabled(config.cpu.enabled),
        config.cpu.threshold,
        config.cpu.check_interval_secs,
        config.cpu.min_sustained_secs,
        config.cpu.alert_cooldown_secs
    );
    println!(
        "  Login welcome: {} (cooldown {}h)",
        enabled(config.login.enabled),
        config.login.cooldown_hours
    );
    println!(
        "  AirPods monitor: {} (every {}ms, names: {})",
        enabled(config.airpods.enabled),
        config.airpods.poll_interval_ms,
        config.airpods.device_names.join(", ")
    );
    println!(
        "  Notification mirroring: {}",
        enabled(config.notifications.mirror_to_system)
    );

    Ok(())
}

fn enabled(flag: bool) -> &'static str {
    if flag { "enabled" } else { "disabled" }
}

fn spawn_console_monitor(config: &Config) -> EventMonitor {
    let surface: Arc<dyn NotchSurface> =
        Arc::new(ConsoleSurface::new(config.events.compact_animation()));
    EventMonitor::spawn(surface, config.events.dismiss_policy)
}

async fn show_until_dismissed(config: &Config, event: Event) -> Result<()> {
    println!("Posting {}", event);
    let monitor = spawn_console_monitor(config);
    monitor.post_event(event).await;
    wait_until_empty(&monitor).await
}

/// Wait for the queue to drain; Ctrl+C dismisses everything
async fn wait_until_empty(monitor: &EventMonitor) -> Result<()> {
    let mut events = monitor.subscribe();

    tokio::select! {
        drained = events.wait_for(|events| events.is_empty()) => {
            drained.context("Event monitor stopped unexpectedly")?;
        }
        interrupted = tokio::signal::ctrl_c() => {
            interrupted?;
            println!("Dismissing all events");
            monitor.dismiss_all().await;
        }
    }

    monitor.shutdown().await;
    Ok(())
}

fn list_devices(config: &Config) -> Result<()> {
    info!("Listing audio output devices");

    let names = notchy::audio::output_device_names()?;

    println!("Audio output devices:");
    if names.is_empty() {
        println!("  No audio output devices found!");
        return Ok(());
    }

    for (i, name) in names.iter().enumerate() {
        let marker = if notchy::audio::is_airpods_device(name, &config.airpods.device_names) {
            " (AirPods)"
        } else {
            ""
        };
        println!("  {}. {}{}", i + 1, name, marker);
    }

    Ok(())
}

async fn sample_cpu() -> Result<()> {
    let usage = tokio::task::spawn_blocking(|| TopCpuSampler.sample_cpu_usage()).await??;
    println!("CPU usage: {:.1}%", usage);
    Ok(())
}
