use anyhow::Result;
use chrono::Local;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Frame, Terminal};
use std::io;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tracing::{debug, info};

use crate::core::alerts;
use crate::core::api::{ApiError, MonitorBackend};
use crate::core::log_parser::LogFilter;
use crate::core::log_session::{ApplyOutcome, ContainerRef, LogRequest, LogResponse, LogSession, TimerKind};
use crate::core::models::{ContainerInventoryEntry, ContainerStats, MetricsResponse};
use crate::core::poller::{spawn_inventory_poller, spawn_metrics_poller, spawn_stats_poller, LogTicker, PollHandle};
use crate::core::{ContainerRegistry, LatestCache, SnapshotStore, StatusFilter};
use crate::screens::{Dashboard, DashboardView};
use crate::utils::{AppConfig, Intervals};

/// Lines moved by PgUp/PgDn in the log viewer
const PAGE_SIZE: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Dashboard,
    Host,
    Containers,
    Rankings,
}

impl Screen {
    pub const ALL: [Screen; 4] = [Screen::Dashboard, Screen::Host, Screen::Containers, Screen::Rankings];

    pub fn title(&self) -> &'static str {
        match self {
            Screen::Dashboard => "Dashboard",
            Screen::Host => "Host",
            Screen::Containers => "Containers",
            Screen::Rankings => "Rankings",
        }
    }

    pub fn next(&self) -> Self {
        match self {
            Screen::Dashboard => Screen::Host,
            Screen::Host => Screen::Containers,
            Screen::Containers => Screen::Rankings,
            Screen::Rankings => Screen::Dashboard,
        }
    }
}

pub struct App {
    dashboard: Dashboard,
    backend: Arc<dyn MonitorBackend>,
    backend_url: String,
    intervals: Intervals,
    alert_threshold: f64,

    current_screen: Screen,
    selected_index: usize,
    status_filter: StatusFilter,
    should_quit: bool,
    show_help: bool,
    status_message: Option<String>,

    snapshots: SnapshotStore,
    latest: LatestCache,
    registry: ContainerRegistry,
    log_session: LogSession,
    log_ticker: LogTicker,
    log_scroll: usize,

    // Background updates
    metrics_tx: UnboundedSender<Result<MetricsResponse, ApiError>>,
    metrics_rx: UnboundedReceiver<Result<MetricsResponse, ApiError>>,
    inventory_tx: UnboundedSender<Result<Vec<ContainerInventoryEntry>, ApiError>>,
    inventory_rx: UnboundedReceiver<Result<Vec<ContainerInventoryEntry>, ApiError>>,
    stats_tx: UnboundedSender<Result<ContainerStats, ApiError>>,
    stats_rx: UnboundedReceiver<Result<ContainerStats, ApiError>>,
    log_tick_rx: UnboundedReceiver<TimerKind>,
    log_tx: UnboundedSender<LogResponse>,
    log_rx: UnboundedReceiver<LogResponse>,
    pollers: Vec<PollHandle>,
}

impl App {
    pub fn new(backend: Arc<dyn MonitorBackend>, backend_url: String, config: &AppConfig) -> Self {
        let intervals = config.intervals();

        let (metrics_tx, metrics_rx) = unbounded_channel();
        let (inventory_tx, inventory_rx) = unbounded_channel();
        let (stats_tx, stats_rx) = unbounded_channel();
        let (log_tick_tx, log_tick_rx) = unbounded_channel();
        let (log_tx, log_rx) = unbounded_channel();

        Self {
            dashboard: Dashboard::new(),
            backend,
            backend_url,
            intervals,
            alert_threshold: config.alert_threshold(),
            current_screen: Screen::Dashboard,
            selected_index: 0,
            status_filter: StatusFilter::All,
            should_quit: false,
            show_help: false,
            status_message: None,
            snapshots: SnapshotStore::new(),
            latest: LatestCache::default(),
            registry: ContainerRegistry::new(),
            log_session: LogSession::new(config.log_tail_lines()),
            log_ticker: LogTicker::new(log_tick_tx, intervals),
            log_scroll: 0,
            metrics_tx,
            metrics_rx,
            inventory_tx,
            inventory_rx,
            stats_tx,
            stats_rx,
            log_tick_rx,
            log_tx,
            log_rx,
            pollers: Vec::new(),
        }
    }

    pub async fn run(&mut self) -> Result<()> {
        // Setup terminal
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        self.start_pollers();
        let result = self.run_loop(&mut terminal).await;
        self.stop_pollers();

        // Restore terminal
        disable_raw_mode()?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
        terminal.show_cursor()?;

        result
    }

    /// Spawn the metrics, inventory and stats pollers (each fires immediately)
    fn start_pollers(&mut self) {
        info!(backend = %self.backend_url, "Starting pollers");
        self.pollers = vec![
            spawn_metrics_poller(self.backend.clone(), self.intervals.metrics, self.metrics_tx.clone()),
            spawn_inventory_poller(self.backend.clone(), self.intervals.inventory, self.inventory_tx.clone()),
            spawn_stats_poller(self.backend.clone(), self.intervals.stats, self.stats_tx.clone()),
        ];
    }

    fn stop_pollers(&mut self) {
        self.pollers.clear();
        self.log_ticker.sync(None);
    }

    async fn run_loop<B: ratatui::backend::Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<()> {
        loop {
            self.process_updates();

            terminal.draw(|f| self.render(f))?;

            if event::poll(Duration::from_millis(100))? {
                if let Event::Key(key_event) = event::read()? {
                    if key_event.kind == KeyEventKind::Press {
                        self.handle_key(key_event);
                    }
                }
            }

            if self.should_quit {
                break;
            }
        }

        Ok(())
    }

    /// Drain every background channel (non-blocking) and line up the log timer
    fn process_updates(&mut self) {
        while let Ok(result) = self.metrics_rx.try_recv() {
            self.snapshots.apply(result);
        }
        self.latest.sync(self.snapshots.version(), &self.snapshots.host_metrics, &self.snapshots.container_metrics);

        while let Ok(result) = self.inventory_rx.try_recv() {
            self.registry.apply_inventory(result);
        }

        while let Ok(result) = self.stats_rx.try_recv() {
            self.registry.apply_stats(result);
        }

        while let Ok(kind) = self.log_tick_rx.try_recv() {
            if let Some(request) = self.log_session.tick(kind) {
                self.dispatch(request);
            }
        }

        while let Ok(response) = self.log_rx.try_recv() {
            self.apply_log_response(response);
        }

        self.log_ticker.sync(self.log_session.active_timer());
    }

    fn apply_log_response(&mut self, response: LogResponse) {
        let outcome = self.log_session.apply(response);
        debug!(?outcome, "Log response");
        if let ApplyOutcome::Replaced(_) | ApplyOutcome::Emptied = outcome {
            self.clamp_log_scroll();
        }
    }

    /// Run a log request in the background; the response comes back on `log_rx`
    fn dispatch(&self, request: LogRequest) {
        let backend = self.backend.clone();
        let tx = self.log_tx.clone();
        tokio::spawn(async move {
            let response = request.execute(backend.as_ref()).await;
            let _ = tx.send(response);
        });
    }

    fn refetch_metrics(&mut self) {
        let backend = self.backend.clone();
        let tx = self.metrics_tx.clone();
        tokio::spawn(async move {
            let _ = tx.send(backend.metrics().await);
        });
        self.snapshots.touch();
        self.set_status("Refreshing metrics...");
    }

    fn render(&self, frame: &mut Frame) {
        let rows = self.registry.rows(&self.latest.by_name(), self.status_filter);
        let alerts = alerts::evaluate(self.latest.host(), self.latest.containers(), self.alert_threshold);

        let view = DashboardView {
            screen: self.current_screen,
            backend_url: &self.backend_url,
            snapshots: &self.snapshots,
            latest: &self.latest,
            registry: &self.registry,
            rows: &rows,
            status_filter: self.status_filter,
            selected_index: self.selected_index,
            alerts: &alerts,
            log_session: &self.log_session,
            log_scroll: self.log_scroll,
            status_message: self.status_message.as_deref(),
            show_help: self.show_help,
            now: Local::now(),
        };

        self.dashboard.render(frame, &view);
    }

    // ------------------------------------------------------------------
    // Keys
    // ------------------------------------------------------------------

    fn handle_key(&mut self, key_event: KeyEvent) {
        let key = key_event.code;

        if self.show_help {
            if matches!(key, KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q')) {
                self.show_help = false;
            }
            return;
        }

        if self.log_session.is_open() {
            self.handle_log_key(key);
            return;
        }

        self.clear_status();

        match key {
            KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
            KeyCode::Char('?') | KeyCode::F(1) => self.show_help = true,
            KeyCode::Char(c @ '1'..='4') => {
                let index = c as usize - '1' as usize;
                self.switch_screen(Screen::ALL[index]);
            }
            KeyCode::Tab => self.switch_screen(self.current_screen.next()),
            KeyCode::Char('r') => self.refetch_metrics(),
            KeyCode::Char('f') if self.current_screen == Screen::Containers => {
                self.status_filter = self.status_filter.next();
                self.selected_index = 0;
            }
            KeyCode::Up if self.current_screen == Screen::Containers => {
                self.selected_index = self.selected_index.saturating_sub(1);
            }
            KeyCode::Down if self.current_screen == Screen::Containers => {
                let count = self.visible_rows_count();
                if self.selected_index + 1 < count {
                    self.selected_index += 1;
                }
            }
            KeyCode::Enter if self.current_screen == Screen::Containers => self.open_selected_logs(),
            _ => {}
        }
    }

    fn handle_log_key(&mut self, key: KeyCode) {
        match key {
            KeyCode::Esc => {
                self.log_session.close();
                self.log_scroll = 0;
            }
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char('?') => self.show_help = true,
            KeyCode::Char('t') => {
                if let Some(request) = self.log_session.toggle_real_time() {
                    self.dispatch(request);
                }
                self.log_scroll = 0;
            }
            KeyCode::Char('a') => self.log_session.toggle_auto_refresh(),
            KeyCode::Char('e') => self.set_log_filter(LogFilter::Error),
            KeyCode::Char('w') => self.set_log_filter(LogFilter::Warning),
            KeyCode::Char('i') => self.set_log_filter(LogFilter::Info),
            KeyCode::Char('l') => self.set_log_filter(LogFilter::All),
            KeyCode::Char('[') => self.shift_log_date(1),
            KeyCode::Char(']') => self.shift_log_date(-1),
            KeyCode::Up => self.log_scroll = self.log_scroll.saturating_sub(1),
            KeyCode::Down => {
                self.log_scroll += 1;
                self.clamp_log_scroll();
            }
            KeyCode::PageUp => self.log_scroll = self.log_scroll.saturating_sub(PAGE_SIZE),
            KeyCode::PageDown => {
                self.log_scroll += PAGE_SIZE;
                self.clamp_log_scroll();
            }
            KeyCode::Home => self.log_scroll = 0,
            _ => {}
        }
    }

    fn switch_screen(&mut self, screen: Screen) {
        self.current_screen = screen;
        self.selected_index = 0;
    }

    fn visible_rows_count(&self) -> usize {
        self.registry.rows(&self.latest.by_name(), self.status_filter).len()
    }

    fn open_selected_logs(&mut self) {
        let rows = self.registry.rows(&self.latest.by_name(), self.status_filter);
        let Some(row) = rows.get(self.selected_index) else {
            return;
        };

        let container = ContainerRef {
            name: row.name.clone(),
            id: Some(row.id.clone()),
        };
        info!(container = %container.name, "Opening logs");

        let today = Local::now().date_naive();
        for request in self.log_session.open(container, today) {
            self.dispatch(request);
        }
        self.log_scroll = 0;
    }

    /// Move the date selection; positive = older
    fn shift_log_date(&mut self, step: isize) {
        let Some(current) = self.log_session.date() else {
            return;
        };
        let dates = self.log_session.available_dates(Local::now().date_naive());
        let index = dates.iter().position(|d| *d == current).unwrap_or(0) as isize;
        let target = (index + step).clamp(0, dates.len() as isize - 1) as usize;

        if dates[target] != current {
            if let Some(request) = self.log_session.select_date(dates[target]) {
                self.dispatch(request);
            }
            self.log_scroll = 0;
        }
    }

    fn set_log_filter(&mut self, filter: LogFilter) {
        self.log_session.set_filter(filter);
        self.log_scroll = 0;
    }

    fn clamp_log_scroll(&mut self) {
        let visible = self.log_session.visible_entries().len();
        self.log_scroll = self.log_scroll.min(visible.saturating_sub(1));
    }

    fn set_status(&mut self, message: &str) {
        self.status_message = Some(message.to_string());
    }

    fn clear_status(&mut self) {
        self.status_message = None;
    }
}
