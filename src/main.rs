use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser;
use colored::Colorize;
use std::sync::Arc;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use dockmon::app::App;
use dockmon::cli::{Cli, Commands, ConfigCommands, VERSION_WITH_BUILD};
use dockmon::core::aggregate::{container_totals, latest_per_key, latest_sample, top_n};
use dockmon::core::alerts::evaluate;
use dockmon::core::{ApiClient, ContainerRegistry, LogCounts, LogFilter, MonitorBackend, RankBy, StatusFilter};
use dockmon::screens::watch::format_entry;
use dockmon::screens::run_watch;
use dockmon::utils::{app_config::API_URL_ENV, format_megabytes, AppConfig};
use dockmon::widgets::usage_color;

/// The TUI owns the terminal, so it logs to a daily file under the config
/// directory. CLI commands log warnings to stderr.
fn init_logging(tui: bool) -> Result<Option<WorkerGuard>> {
    if tui {
        let log_dir = AppConfig::config_dir()?.join("logs");
        std::fs::create_dir_all(&log_dir)
            .with_context(|| format!("Failed to create log directory {}", log_dir.display()))?;

        let (writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::daily(&log_dir, "dockmon.log"));
        let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().with_writer(writer).with_ansi(false))
            .init();

        Ok(Some(guard))
    } else {
        let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
            .init();

        Ok(None)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    let _guard = init_logging(cli.command.is_none())?;
    info!(version = VERSION_WITH_BUILD, "dockmon starting");

    let config = AppConfig::load()?.with_overrides(std::env::var(API_URL_ENV).ok(), cli.api_url);

    if let Some(Commands::Config { command }) = cli.command {
        return handle_config(command, &config);
    }

    let api = ApiClient::new(&config.api_config()?)?;
    let backend_url = api.base_url().to_string();
    let backend: Arc<dyn MonitorBackend> = Arc::new(api);

    match cli.command {
        None => {
            // No command - run interactive TUI
            let mut app = App::new(backend, backend_url, &config);
            app.run().await?;
        }
        Some(Commands::Status { filter }) => {
            handle_status(backend.as_ref(), filter).await?;
        }
        Some(Commands::Top { by, count }) => {
            handle_top(backend.as_ref(), by, count).await?;
        }
        Some(Commands::Alerts) => {
            handle_alerts(backend.as_ref(), config.alert_threshold()).await?;
        }
        Some(Commands::Logs { container, date, level, tail }) => {
            let tail = tail.unwrap_or_else(|| config.log_tail_lines());
            handle_logs(backend.as_ref(), &container, date, level, tail).await?;
        }
        Some(Commands::Watch { container, level }) => {
            run_watch(backend, container, level, &config).await?;
        }
        Some(Commands::Config { .. }) => {}
    }

    Ok(())
}

async fn handle_status(backend: &dyn MonitorBackend, filter: StatusFilter) -> Result<()> {
    use futures::future::join;

    let (inventory, metrics) = join(backend.containers(), backend.metrics()).await;
    let inventory = inventory.context("Failed to fetch the container inventory")?;
    let metrics = metrics.context("Failed to fetch metrics")?;

    let mut registry = ContainerRegistry::new();
    registry.apply_inventory(Ok(inventory));
    let latest = latest_per_key(&metrics.container_metrics);
    let rows = registry.rows(&latest, filter);

    println!("{} ({})\n", "Containers".bold(), filter);
    println!("{:<28} {:<10} {:<16} {:>8} {:>12} {:>8}", "Name", "Status", "Uptime", "CPU", "Memory", "Mem %");
    println!("{}", "-".repeat(88));

    for row in &rows {
        let status = format!("{:<10}", row.status.to_string());
        let status = if row.status.is_running() { status.green() } else { status.red() };
        let cpu = format!("{:>7.1}%", row.cpu_percent).color(term_color(row.cpu_percent));
        println!(
            "{:<28} {} {:<16} {} {:>12} {:>7.1}%",
            row.name,
            status,
            row.uptime_display,
            cpu,
            format_megabytes(row.memory_mb),
            row.memory_percent,
        );
    }

    println!(
        "\n{} containers shown, {} running of {} total",
        rows.len(),
        registry.running_count(),
        registry.inventory.len()
    );

    Ok(())
}

async fn handle_top(backend: &dyn MonitorBackend, by: RankBy, count: usize) -> Result<()> {
    let metrics = backend.metrics().await.context("Failed to fetch metrics")?;
    let latest = latest_per_key(&metrics.container_metrics);

    if latest.is_empty() {
        println!("No container metrics available yet");
        return Ok(());
    }

    println!("{} {}\n", "Top containers by".bold(), by);
    println!("{:<4} {:<28} {:>8} {:>12} {:>8}", "#", "Name", "CPU", "Memory", "Mem %");
    println!("{}", "-".repeat(64));

    for (rank, sample) in top_n(latest.values().copied(), by, count).into_iter().enumerate() {
        println!(
            "{:<4} {:<28} {:>7.1}% {:>12} {:>7.1}%",
            rank + 1,
            sample.container_name,
            sample.cpu_percent,
            format_megabytes(sample.memory_used_mb),
            sample.memory_percent,
        );
    }

    let totals = container_totals(latest.values().copied());
    println!(
        "\nAll containers: {:.1}% CPU, {} memory",
        totals.cpu_percent,
        format_megabytes(totals.memory_used_mb)
    );

    Ok(())
}

async fn handle_alerts(backend: &dyn MonitorBackend, threshold: f64) -> Result<()> {
    let metrics = backend.metrics().await.context("Failed to fetch metrics")?;
    let host = latest_sample(&metrics.host_metrics);
    let latest = latest_per_key(&metrics.container_metrics);
    let alerts = evaluate(host, latest.values().copied(), threshold);

    if alerts.is_empty() {
        println!("{} No resource usage above {:.0}%", "✓".green(), threshold);
        return Ok(());
    }

    println!("{} active alert(s)\n", alerts.len().to_string().yellow().bold());
    for alert in &alerts {
        println!("{} {}: {}", "⚠".yellow(), alert.title.bold(), alert.message);
    }

    Ok(())
}

async fn handle_logs(
    backend: &dyn MonitorBackend,
    container: &str,
    date: Option<chrono::NaiveDate>,
    level: LogFilter,
    tail: usize,
) -> Result<()> {
    let date = date.unwrap_or_else(|| Local::now().date_naive());
    let entries = backend
        .logs(container, date, tail)
        .await
        .with_context(|| format!("Failed to fetch logs for {}", container))?;

    if entries.is_empty() {
        println!("No logs for {} on {}", container, date);
        return Ok(());
    }

    // The backend streams the day oldest first, which is reading order here
    for entry in entries.iter().filter(|e| level.matches(e)) {
        println!("{}", format_entry(entry));
    }

    let counts = LogCounts::tally(&entries);
    println!(
        "\n{} {} lines: {} errors, {} warnings, {} info",
        date,
        counts.total(),
        counts.error.to_string().red(),
        counts.warning.to_string().yellow(),
        counts.info.to_string().cyan(),
    );

    Ok(())
}

fn handle_config(command: ConfigCommands, config: &AppConfig) -> Result<()> {
    match command {
        ConfigCommands::View => {
            println!("Configuration:\n");
            print!("{}", toml::to_string_pretty(config).context("Failed to serialize config")?);
            match config.api_config() {
                Ok(api) => println!("\nBackend: {} (timeout {})", api.base_url, humantime::format_duration(api.timeout)),
                Err(e) => println!("\n{} {}", "✗ Backend URL invalid:".red(), e),
            }
        }
        ConfigCommands::Path => {
            println!("{}", AppConfig::config_path()?.display());
        }
    }

    Ok(())
}

fn term_color(percent: f64) -> colored::Color {
    match usage_color(percent) {
        ratatui::style::Color::Red => colored::Color::Red,
        ratatui::style::Color::Yellow => colored::Color::Yellow,
        _ => colored::Color::Green,
    }
}
