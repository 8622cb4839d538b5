/// Main dashboard screen
///
/// Stateless renderer: the run loop owns all data and hands a borrowed
/// [`DashboardView`] to [`Dashboard::render`] every frame.

use chrono::{DateTime, Local, NaiveDate};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, List, ListItem, Paragraph, Row, Sparkline, Table, Wrap},
    Frame,
};

use crate::app::Screen;
use crate::core::aggregate::{LatestCache, RankBy};
use crate::core::alerts::Alert;
use crate::core::log_session::{LogMode, LogSession, SessionState};
use crate::core::models::ContainerMetricSample;
use crate::core::registry::{ContainerRegistry, ContainerRow, StatusFilter};
use crate::core::snapshot::SnapshotStore;
use crate::utils::{format_bytes, format_clock, format_elapsed, format_megabytes, parse_timestamp, RANKING_TOP, SUMMARY_TOP};
use crate::widgets::{centered_rect, level_color, status_color, usage_color, usage_gauge, usage_span};

/// Points shown in the host sparklines
const SPARKLINE_POINTS: usize = 120;

/// Everything a frame needs, borrowed from the app
pub struct DashboardView<'a> {
    pub screen: Screen,
    pub backend_url: &'a str,
    pub snapshots: &'a SnapshotStore,
    pub latest: &'a LatestCache,
    pub registry: &'a ContainerRegistry,
    pub rows: &'a [ContainerRow],
    pub status_filter: StatusFilter,
    pub selected_index: usize,
    pub alerts: &'a [Alert],
    pub log_session: &'a LogSession,
    pub log_scroll: usize,
    pub status_message: Option<&'a str>,
    pub show_help: bool,
    pub now: DateTime<Local>,
}

impl DashboardView<'_> {
    fn today(&self) -> NaiveDate {
        self.now.date_naive()
    }
}

pub struct Dashboard {
    title: String,
}

impl Default for Dashboard {
    fn default() -> Self {
        Self::new()
    }
}

impl Dashboard {
    pub fn new() -> Self {
        Self {
            title: format!("dockmon v{}", env!("CARGO_PKG_VERSION")),
        }
    }

    pub fn render(&self, frame: &mut Frame, view: &DashboardView) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(4), // Title + status
                Constraint::Length(3), // Menu
                Constraint::Min(0),    // Content
                Constraint::Length(3), // Footer
            ])
            .split(frame.size());

        self.render_header(frame, chunks[0], view);
        frame.render_widget(self.render_menu(view.screen), chunks[1]);

        if view.snapshots.loading && view.snapshots.is_empty() {
            let loading = Paragraph::new("Loading metrics...")
                .alignment(Alignment::Center)
                .style(Style::default().fg(Color::Gray))
                .block(Block::default().borders(Borders::ALL));
            frame.render_widget(loading, chunks[2]);
        } else {
            match view.screen {
                Screen::Dashboard => self.render_overview(frame, chunks[2], view),
                Screen::Host => self.render_host(frame, chunks[2], view),
                Screen::Containers => self.render_containers(frame, chunks[2], view),
                Screen::Rankings => self.render_rankings(frame, chunks[2], view),
            }
        }

        self.render_footer(frame, chunks[3], view);

        if view.log_session.is_open() {
            self.render_log_viewer(frame, view);
        }

        if view.show_help {
            self.render_help(frame);
        }
    }

    fn render_header(&self, frame: &mut Frame, area: Rect, view: &DashboardView) {
        let updated = match view.snapshots.last_updated {
            Some(at) => format!("updated {}", format_elapsed(at, view.now)),
            None => "waiting for first update".to_string(),
        };

        let title_line = Line::from(vec![
            Span::styled(&self.title, Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)),
            Span::raw("  "),
            Span::styled(view.backend_url, Style::default().fg(Color::Gray)),
            Span::raw("  |  "),
            Span::styled(updated, Style::default().fg(Color::Gray)),
        ]);

        let status_line = match &view.snapshots.error {
            Some(error) => Line::from(Span::styled(
                format!("Error: {}", error),
                Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            )),
            None if view.alerts.is_empty() => Line::from(Span::styled("All systems nominal", Style::default().fg(Color::Green))),
            None => Line::from(Span::styled(
                format!("{} active alert(s)", view.alerts.len()),
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            )),
        };

        let header = Paragraph::new(vec![title_line, status_line]).block(Block::default().borders(Borders::ALL));
        frame.render_widget(header, area);
    }

    fn render_menu(&self, current: Screen) -> Paragraph<'static> {
        let mut spans = Vec::new();
        for (i, screen) in Screen::ALL.iter().enumerate() {
            if i > 0 {
                spans.push(Span::raw(" "));
            }
            let label = format!("[{}] {}", i + 1, screen.title());
            if *screen == current {
                spans.push(Span::styled(
                    format!(" {} ", label),
                    Style::default().bg(Color::Blue).fg(Color::White).add_modifier(Modifier::BOLD),
                ));
            } else {
                spans.push(Span::styled(label, Style::default().fg(Color::Gray)));
            }
        }

        Paragraph::new(Line::from(spans)).block(Block::default().borders(Borders::ALL))
    }

    fn render_footer(&self, frame: &mut Frame, area: Rect, view: &DashboardView) {
        let text = if let Some(status) = view.status_message {
            status.to_string()
        } else if view.log_session.is_open() {
            "[↑↓/PgUp/PgDn] Scroll | [t] Real-time | [a] Auto-refresh | [e]rror [w]arn [i]nfo a[l]l | [ ] Date | [Esc] Close".to_string()
        } else {
            match view.screen {
                Screen::Containers => "[1-4/Tab] Screen | [↑↓] Select | [Enter] Logs | [f] Filter | [r] Refresh | [?] Help | [q]uit".to_string(),
                _ => "[1-4/Tab] Screen | [r] Refresh | [?] Help | [q]uit".to_string(),
            }
        };

        let footer = Paragraph::new(text)
            .alignment(Alignment::Center)
            .style(if view.status_message.is_some() {
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            })
            .block(Block::default().borders(Borders::ALL));

        frame.render_widget(footer, area);
    }

    // ------------------------------------------------------------------
    // Screens
    // ------------------------------------------------------------------

    fn render_overview(&self, frame: &mut Frame, area: Rect, view: &DashboardView) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Length(SUMMARY_TOP as u16 + 4), Constraint::Min(0)])
            .split(area);

        // Summary cards
        let cards = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(25); 4])
            .split(chunks[0]);

        match view.latest.host() {
            Some(host) => {
                frame.render_widget(usage_gauge("Host CPU", host.cpu_percent, format!("{:.1}%", host.cpu_percent)), cards[0]);
                frame.render_widget(
                    usage_gauge(
                        "Host RAM",
                        host.memory_percent,
                        format!("{:.1}% of {}", host.memory_percent, format_megabytes(host.memory_total_mb)),
                    ),
                    cards[1],
                );
            }
            None => {
                frame.render_widget(card("Host CPU", "N/A".to_string(), Color::Gray), cards[0]);
                frame.render_widget(card("Host RAM", "N/A".to_string(), Color::Gray), cards[1]);
            }
        }

        let running = view.registry.running_count();
        let total = view.registry.inventory.len();
        let running_color = if running == total { Color::Green } else { Color::Yellow };
        frame.render_widget(card("Containers", format!("{}/{} running", running, total), running_color), cards[2]);
        frame.render_widget(
            card("Disk usage", format!("{:.2} GB", view.registry.stats.total_size_gb), Color::White),
            cards[3],
        );

        // Top consumers
        let tops = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(chunks[1]);
        frame.render_widget(ranking_table("Top CPU", &view.latest.top(RankBy::Cpu, SUMMARY_TOP), RankBy::Cpu), tops[0]);
        frame.render_widget(
            ranking_table("Top RAM", &view.latest.top(RankBy::Memory, SUMMARY_TOP), RankBy::Memory),
            tops[1],
        );

        frame.render_widget(alerts_list(view.alerts), chunks[2]);
    }

    fn render_host(&self, frame: &mut Frame, area: Rect, view: &DashboardView) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(7), Constraint::Min(0)])
            .split(area);

        let details = match view.latest.host() {
            Some(host) => vec![
                Line::from(vec![
                    Span::styled("CPU: ", Style::default().fg(Color::Gray)),
                    usage_span(host.cpu_percent),
                    Span::raw("   "),
                    Span::styled("RAM: ", Style::default().fg(Color::Gray)),
                    usage_span(host.memory_percent),
                    Span::raw(format!(
                        " ({} / {})",
                        format_megabytes(host.memory_used_mb),
                        format_megabytes(host.memory_total_mb)
                    )),
                ]),
                Line::from(vec![
                    Span::styled("Disk: ", Style::default().fg(Color::Gray)),
                    Span::raw(format!("read {:.1} KB  write {:.2} MB", host.disk_read_kb, host.disk_write_mb)),
                ]),
                Line::from(vec![
                    Span::styled("Network: ", Style::default().fg(Color::Gray)),
                    Span::raw(format!("in {:.2} Mbit  out {:.2} Mbit", host.network_in_mbit, host.network_out_mbit)),
                ]),
                Line::from(vec![
                    Span::styled("Sampled at: ", Style::default().fg(Color::Gray)),
                    Span::raw(format_clock(&host.timestamp)),
                ]),
                Line::from(Span::styled(
                    format!("{} samples retained by the backend", view.snapshots.host_metrics.len()),
                    Style::default().fg(Color::DarkGray),
                )),
            ],
            None => vec![Line::from(Span::styled("No host metrics yet", Style::default().fg(Color::Gray)))],
        };

        let info = Paragraph::new(details).block(Block::default().borders(Borders::ALL).title("Host"));
        frame.render_widget(info, chunks[0]);

        let (cpu, memory) = host_series(view.snapshots);
        let charts = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(chunks[1]);

        let cpu_chart = Sparkline::default()
            .block(Block::default().borders(Borders::ALL).title("CPU %"))
            .data(&cpu)
            .max(100)
            .style(Style::default().fg(Color::Cyan));
        frame.render_widget(cpu_chart, charts[0]);

        let memory_chart = Sparkline::default()
            .block(Block::default().borders(Borders::ALL).title("RAM %"))
            .data(&memory)
            .max(100)
            .style(Style::default().fg(Color::Magenta));
        frame.render_widget(memory_chart, charts[1]);
    }

    fn render_containers(&self, frame: &mut Frame, area: Rect, view: &DashboardView) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Min(0)])
            .split(area);

        let mut filter_spans = vec![Span::styled("Filter: ", Style::default().fg(Color::Gray))];
        for filter in [StatusFilter::All, StatusFilter::Running, StatusFilter::Stopped] {
            let style = if filter == view.status_filter {
                Style::default().bg(Color::Blue).fg(Color::White).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::Gray)
            };
            filter_spans.push(Span::styled(format!(" {} ", filter), style));
        }
        filter_spans.push(Span::raw("   |   "));
        filter_spans.push(Span::styled(
            format!(
                "{} containers, {:.2} GB total",
                view.registry.stats.container_count, view.registry.stats.total_size_gb
            ),
            Style::default().fg(Color::Cyan),
        ));

        let summary = Paragraph::new(Line::from(filter_spans)).block(Block::default().borders(Borders::ALL).title("Status"));
        frame.render_widget(summary, chunks[0]);

        let header = Row::new(vec!["Name", "Status", "Uptime", "CPU", "Memory", "Mem %", "Image"])
            .style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))
            .bottom_margin(1);

        let rows: Vec<Row> = view
            .rows
            .iter()
            .enumerate()
            .map(|(idx, row)| {
                let uptime = if row.uptime_display.is_empty() { "-".to_string() } else { row.uptime_display.clone() };
                let table_row = Row::new(vec![
                    Cell::from(row.name.clone()),
                    Cell::from(Span::styled(row.status.to_string(), Style::default().fg(status_color(&row.status)))),
                    Cell::from(uptime),
                    Cell::from(Span::styled(
                        format!("{:.1}%", row.cpu_percent),
                        Style::default().fg(usage_color(row.cpu_percent)),
                    )),
                    Cell::from(format_megabytes(row.memory_mb)),
                    Cell::from(Span::styled(
                        format!("{:.1}%", row.memory_percent),
                        Style::default().fg(usage_color(row.memory_percent)),
                    )),
                    Cell::from(row.image.clone()),
                ]);

                if idx == view.selected_index {
                    table_row.style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD))
                } else {
                    table_row
                }
            })
            .collect();

        let table = Table::new(
            rows,
            [
                Constraint::Length(24), // Name
                Constraint::Length(10), // Status
                Constraint::Length(14), // Uptime
                Constraint::Length(8),  // CPU
                Constraint::Length(10), // Memory
                Constraint::Length(8),  // Mem %
                Constraint::Min(15),    // Image
            ],
        )
        .header(header)
        .block(Block::default().borders(Borders::ALL).title(format!("Containers ({})", view.rows.len())));

        frame.render_widget(table, chunks[1]);
    }

    fn render_rankings(&self, frame: &mut Frame, area: Rect, view: &DashboardView) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(area);

        frame.render_widget(
            ranking_table("Top containers by CPU", &view.latest.top(RankBy::Cpu, RANKING_TOP), RankBy::Cpu),
            chunks[0],
        );
        frame.render_widget(
            ranking_table("Top containers by memory", &view.latest.top(RankBy::Memory, RANKING_TOP), RankBy::Memory),
            chunks[1],
        );
    }

    // ------------------------------------------------------------------
    // Overlays
    // ------------------------------------------------------------------

    fn render_log_viewer(&self, frame: &mut Frame, view: &DashboardView) {
        let session = view.log_session;
        let area = centered_rect(frame.size(), frame.size().width.saturating_sub(4), frame.size().height.saturating_sub(2));
        frame.render_widget(Clear, area);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Length(3), Constraint::Min(0), Constraint::Length(3)])
            .split(area);

        // Header: container, mode, filter
        let name = session.container_name().unwrap_or_default();
        let (mode_label, mode_color) = match session.mode() {
            LogMode::RealTime => ("LIVE", Color::Green),
            LogMode::Static if session.auto_refresh() => ("AUTO-REFRESH", Color::Cyan),
            LogMode::Static => ("PAUSED", Color::Yellow),
        };
        let header = Paragraph::new(Line::from(vec![
            Span::styled(format!("Logs: {}", name), Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)),
            Span::raw("  "),
            Span::styled(format!("[{}]", mode_label), Style::default().fg(mode_color).add_modifier(Modifier::BOLD)),
            Span::raw("  Filter: "),
            Span::styled(session.filter().to_string(), Style::default().fg(Color::Yellow)),
        ]))
        .block(Block::default().borders(Borders::ALL));
        frame.render_widget(header, chunks[0]);

        // Date picker
        let selected = session.date();
        let mut date_spans = Vec::new();
        for date in session.available_dates(view.today()) {
            let mut label = date.format("%m-%d").to_string();
            if let Some(size) = session.size_for(date) {
                label.push_str(&format!(" ({})", format_bytes(size)));
            }
            let style = if Some(date) == selected {
                Style::default().bg(Color::Blue).fg(Color::White).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::Gray)
            };
            date_spans.push(Span::styled(format!(" {} ", label), style));
        }
        let dates = Paragraph::new(Line::from(date_spans)).block(Block::default().borders(Borders::ALL).title("Date"));
        frame.render_widget(dates, chunks[1]);

        // Entries, newest first
        let visible = session.visible_entries();
        let body_height = chunks[2].height.saturating_sub(2) as usize;
        let items: Vec<ListItem> = if session.state() == SessionState::Loading {
            vec![ListItem::new(Span::styled("Loading logs...", Style::default().fg(Color::Gray)))]
        } else if visible.is_empty() {
            vec![ListItem::new(Span::styled("No logs for this selection", Style::default().fg(Color::Gray)))]
        } else {
            visible
                .iter()
                .skip(view.log_scroll)
                .take(body_height)
                .map(|entry| {
                    let level = entry.effective_level();
                    let time = entry.timestamp.as_deref().map(format_clock).unwrap_or_else(|| "--:--:--".to_string());
                    ListItem::new(Line::from(vec![
                        Span::styled(format!("{} ", time), Style::default().fg(Color::DarkGray)),
                        Span::styled(format!("{} ", level.label()), Style::default().fg(level_color(level)).add_modifier(Modifier::BOLD)),
                        Span::raw(entry.message.clone()),
                    ]))
                })
                .collect()
        };
        let title = format!("{} of {} entries", visible.len(), session.entries().len());
        frame.render_widget(List::new(items).block(Block::default().borders(Borders::ALL).title(title)), chunks[2]);

        // Footer counts
        let counts = session.counts();
        let footer = Paragraph::new(Line::from(vec![
            Span::styled(format!("Errors: {}", counts.error), Style::default().fg(Color::Red)),
            Span::raw("  "),
            Span::styled(format!("Warnings: {}", counts.warning), Style::default().fg(Color::Yellow)),
            Span::raw("  "),
            Span::styled(format!("Info: {}", counts.info), Style::default().fg(Color::Cyan)),
        ]))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));
        frame.render_widget(footer, chunks[3]);
    }

    fn render_help(&self, frame: &mut Frame) {
        let area = centered_rect(frame.size(), 70, 22);

        let section = |title: &'static str| {
            Line::from(Span::styled(title, Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)))
        };

        let help_text = vec![
            Line::from(Span::styled(
                "dockmon - Keyboard Shortcuts",
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
            section("Navigation:"),
            Line::from("  [1-4]          Dashboard, Host, Containers, Rankings"),
            Line::from("  [Tab]          Next screen"),
            Line::from("  [↑ ↓]          Select container"),
            Line::from("  [r]            Refetch metrics now"),
            Line::from("  [q]            Quit"),
            Line::from(""),
            section("Containers:"),
            Line::from("  [f]            Cycle all / running / stopped"),
            Line::from("  [Enter]        Open logs for the selected container"),
            Line::from(""),
            section("Log viewer:"),
            Line::from("  [t]            Toggle real-time tail"),
            Line::from("  [a]            Toggle auto-refresh"),
            Line::from("  [e/w/i/l]      Errors, warnings, info, all"),
            Line::from("  [[] / []]      Older / newer day"),
            Line::from("  [Esc]          Close"),
            Line::from(""),
            Line::from(Span::styled(
                "Press [?] or [Esc] to close this help",
                Style::default().fg(Color::Gray).add_modifier(Modifier::ITALIC),
            )),
        ];

        frame.render_widget(Clear, area);
        let help = Paragraph::new(help_text)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::Cyan))
                    .title(Span::styled(" Help ", Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))),
            )
            .wrap(Wrap { trim: false });
        frame.render_widget(help, area);
    }
}

fn card(title: &str, value: String, color: Color) -> Paragraph<'_> {
    Paragraph::new(Span::styled(value, Style::default().fg(color).add_modifier(Modifier::BOLD)))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL).title(title))
}

fn ranking_table<'a>(title: &'a str, top: &[&ContainerMetricSample], by: RankBy) -> Table<'a> {
    let header = Row::new(vec!["#", "Container", "CPU", "Memory"])
        .style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD));

    let rows: Vec<Row> = top
        .iter()
        .enumerate()
        .map(|(i, sample)| {
            let highlight = Style::default().add_modifier(Modifier::BOLD);
            let (cpu_style, mem_style) = match by {
                RankBy::Cpu => (highlight.fg(usage_color(sample.cpu_percent)), Style::default()),
                RankBy::Memory => (Style::default(), highlight.fg(usage_color(sample.memory_percent))),
            };
            Row::new(vec![
                Cell::from(format!("{}", i + 1)),
                Cell::from(sample.container_name.clone()),
                Cell::from(Span::styled(format!("{:.1}%", sample.cpu_percent), cpu_style)),
                Cell::from(Span::styled(format_megabytes(sample.memory_used_mb), mem_style)),
            ])
        })
        .collect();

    Table::new(rows, [Constraint::Length(3), Constraint::Min(16), Constraint::Length(8), Constraint::Length(10)])
        .header(header)
        .block(Block::default().borders(Borders::ALL).title(title))
}

fn alerts_list(alerts: &[Alert]) -> List<'static> {
    let items: Vec<ListItem> = if alerts.is_empty() {
        vec![ListItem::new(Span::styled("No active alerts", Style::default().fg(Color::Green)))]
    } else {
        alerts
            .iter()
            .map(|alert| {
                ListItem::new(Line::from(vec![
                    Span::styled("⚠ ", Style::default().fg(Color::Yellow)),
                    Span::styled(format!("{}: ", alert.title), Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)),
                    Span::raw(alert.message.clone()),
                ]))
            })
            .collect()
    };

    List::new(items).block(Block::default().borders(Borders::ALL).title(format!("Alerts ({})", alerts.len())))
}

/// Host CPU and RAM percentages in time order, last `SPARKLINE_POINTS` samples
fn host_series(snapshots: &SnapshotStore) -> (Vec<u64>, Vec<u64>) {
    let mut samples: Vec<_> = snapshots.host_metrics.iter().collect();
    samples.sort_by_key(|s| parse_timestamp(&s.timestamp));

    let skip = samples.len().saturating_sub(SPARKLINE_POINTS);
    let to_point = |v: f64| if v.is_finite() { v.clamp(0.0, 100.0).round() as u64 } else { 0 };

    samples
        .iter()
        .skip(skip)
        .map(|s| (to_point(s.cpu_percent), to_point(s.memory_percent)))
        .unzip()
}
