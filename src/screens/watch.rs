/// Watch mode - real-time log tail in the plain terminal
///
/// Drives the same [`LogSession`] as the TUI log viewer in real-time mode,
/// but executes each request inline and prints new lines as they arrive.

use anyhow::{anyhow, Result};
use chrono::Local;
use colored::{ColoredString, Colorize};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::mpsc::unbounded_channel;
use tracing::{debug, info};

use crate::core::api::MonitorBackend;
use crate::core::log_parser::{LogCounts, LogFilter};
use crate::core::log_session::{ApplyOutcome, ContainerRef, LogRequest, LogSession, RequestKind};
use crate::core::models::{LogEntry, LogLevel};
use crate::core::poller::LogTicker;
use crate::utils::{format_clock, AppConfig};

/// One colored line for terminal output
pub fn format_entry(entry: &LogEntry) -> String {
    let time = entry.timestamp.as_deref().map(format_clock).unwrap_or_else(|| "--:--:--".to_string());
    let level = entry.effective_level();
    format!("{} {} {}", time.dimmed(), level_label(level), entry.message)
}

fn level_label(level: LogLevel) -> ColoredString {
    match level {
        LogLevel::Error => level.label().red().bold(),
        LogLevel::Warning => level.label().yellow().bold(),
        LogLevel::Info => level.label().cyan(),
    }
}

pub async fn run_watch(backend: Arc<dyn MonitorBackend>, container: String, filter: LogFilter, config: &AppConfig) -> Result<()> {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };
    let counts = watch_until(backend, container, filter, config, ctrl_c).await?;

    println!(
        "\n{} lines received: {} errors, {} warnings, {} info",
        counts.total(),
        counts.error.to_string().red(),
        counts.warning.to_string().yellow(),
        counts.info.to_string().cyan(),
    );

    Ok(())
}

/// Tail `container` until `shutdown` completes, even with a poll in flight
async fn watch_until<F>(
    backend: Arc<dyn MonitorBackend>,
    container: String,
    filter: LogFilter,
    config: &AppConfig,
    shutdown: F,
) -> Result<LogCounts>
where
    F: Future<Output = ()>,
{
    tokio::pin!(shutdown);

    let mut session = LogSession::new(config.log_tail_lines());
    session.set_filter(filter);
    session.toggle_real_time();

    let today = Local::now().date_naive();
    // The first tail poll already returns the most recent lines, so the
    // day window is not needed here
    let first_tail = session
        .open(ContainerRef::named(container.clone()), today)
        .into_iter()
        .find(|r| matches!(r.kind, RequestKind::Tail { .. }))
        .ok_or_else(|| anyhow!("Could not start a live tail for {}", container))?;

    println!("{} {} (Ctrl+C to stop)\n", "Watching".green().bold(), container.bold());
    info!(container = %container, "Watch started");
    if !poll_until(&mut session, backend.as_ref(), first_tail, &mut shutdown).await {
        return Ok(session.counts());
    }

    let (tick_tx, mut tick_rx) = unbounded_channel();
    let mut ticker = LogTicker::new(tick_tx, config.intervals());
    ticker.sync(session.active_timer());

    loop {
        tokio::select! {
            Some(kind) = tick_rx.recv() => {
                if let Some(request) = session.tick(kind) {
                    if !poll_until(&mut session, backend.as_ref(), request, &mut shutdown).await {
                        break;
                    }
                }
            }
            _ = &mut shutdown => {
                break;
            }
        }
    }

    ticker.sync(None);
    Ok(session.counts())
}

/// Poll once; `false` when `shutdown` fired first
async fn poll_until<S>(session: &mut LogSession, backend: &dyn MonitorBackend, request: LogRequest, shutdown: &mut S) -> bool
where
    S: Future<Output = ()> + Unpin,
{
    tokio::select! {
        _ = poll_and_print(session, backend, request) => true,
        _ = shutdown => false,
    }
}

/// Execute one tail request, apply it and print the new batch in arrival order
async fn poll_and_print(session: &mut LogSession, backend: &dyn MonitorBackend, request: LogRequest) {
    let response = request.execute(backend).await;

    match session.apply(response) {
        ApplyOutcome::Prepended(count) => {
            for entry in session.entries()[..count].iter().filter(|e| session.filter().matches(e)) {
                println!("{}", format_entry(entry));
            }
        }
        ApplyOutcome::Kept => eprintln!("{}", "Live log poll failed, retrying...".yellow()),
        other => debug!(?other, "Ignored watch response"),
    }
}
