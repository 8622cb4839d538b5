/// Log viewer session
///
/// A pure state machine: user actions and timer ticks return the requests
/// to issue, and the caller feeds responses back through [`LogSession::apply`].
/// Nothing here performs I/O, so every ordering of responses can be tested
/// without a runtime.
///
/// Each request carries a [`RequestTag`]:
/// - `generation` changes on open, date change and close; any response from
///   an older generation is dropped.
/// - `mode_epoch` changes on every Static/RealTime switch; refresh and tail
///   responses from the other mode are dropped.
/// - `seq` orders window fetches; a window response older than the last
///   applied one is dropped, so a slow refresh cannot overwrite newer data.

use chrono::NaiveDate;
use std::collections::HashMap;
use tracing::{debug, warn};

use crate::core::api::{ApiError, MonitorBackend};
use crate::core::log_parser::{message_bytes, LogCounts, LogFilter};
use crate::core::models::{LiveLogs, LogEntry};
use crate::utils::{parse_timestamp, recent_dates, LOG_HISTORY_DAYS, LOG_TAIL_LINES};

/// Container whose logs are shown
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerRef {
    pub name: String,
    pub id: Option<String>,
}

impl ContainerRef {
    pub fn named(name: impl Into<String>) -> Self {
        Self { name: name.into(), id: None }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Closed,
    Loading,
    Loaded,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogMode {
    #[default]
    Static,
    RealTime,
}

/// The one timer a session may need at a time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerKind {
    StaticRefresh,
    RealTimeTail,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestTag {
    pub generation: u64,
    pub mode_epoch: u64,
    pub seq: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestKind {
    /// Full day window; `initial` for open/date change, otherwise a refresh
    Window { date: NaiveDate, tail: usize, initial: bool },
    /// Incremental fetch of lines newer than `since`
    Tail { since: Option<String> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRequest {
    pub tag: RequestTag,
    pub container: String,
    pub kind: RequestKind,
}

impl LogRequest {
    pub async fn execute(self, backend: &dyn MonitorBackend) -> LogResponse {
        let outcome = match self.kind {
            RequestKind::Window { date, tail, initial } => LogOutcome::Window {
                date,
                initial,
                result: backend.logs(&self.container, date, tail).await,
            },
            RequestKind::Tail { since } => LogOutcome::Tail {
                result: backend.live_logs(&self.container, since).await,
            },
        };

        LogResponse { tag: self.tag, outcome }
    }
}

#[derive(Debug)]
pub enum LogOutcome {
    Window {
        date: NaiveDate,
        initial: bool,
        result: Result<Vec<LogEntry>, ApiError>,
    },
    Tail {
        result: Result<LiveLogs, ApiError>,
    },
}

#[derive(Debug)]
pub struct LogResponse {
    pub tag: RequestTag,
    pub outcome: LogOutcome,
}

/// What [`LogSession::apply`] did with a response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// Window applied, entries replaced (count)
    Replaced(usize),
    /// Tail batch prepended (count)
    Prepended(usize),
    /// Initial window failed; entries cleared
    Emptied,
    /// Refresh or tail failed; entries untouched
    Kept,
    /// Superseded response, ignored
    Discarded,
}

#[derive(Debug, Clone)]
pub struct LogSession {
    container: Option<ContainerRef>,
    date: Option<NaiveDate>,
    state: SessionState,
    mode: LogMode,
    auto_refresh: bool,
    filter: LogFilter,
    entries: Vec<LogEntry>,
    last_seen: Option<String>,
    size_per_date: HashMap<NaiveDate, u64>,
    tail_lines: usize,

    generation: u64,
    mode_epoch: u64,
    next_seq: u64,
    last_window_seq: u64,
    tail_in_flight: bool,
}

impl Default for LogSession {
    fn default() -> Self {
        Self::new(LOG_TAIL_LINES)
    }
}

impl LogSession {
    pub fn new(tail_lines: usize) -> Self {
        Self {
            container: None,
            date: None,
            state: SessionState::Closed,
            mode: LogMode::Static,
            auto_refresh: true,
            filter: LogFilter::All,
            entries: Vec::new(),
            last_seen: None,
            size_per_date: HashMap::new(),
            tail_lines,
            generation: 0,
            mode_epoch: 0,
            next_seq: 0,
            last_window_seq: 0,
            tail_in_flight: false,
        }
    }

    // ------------------------------------------------------------------
    // Actions
    // ------------------------------------------------------------------

    /// Show the logs of `container` for `date`.
    ///
    /// Returns the window fetch, plus an immediate tail poll when already
    /// in real-time mode.
    pub fn open(&mut self, container: ContainerRef, date: NaiveDate) -> Vec<LogRequest> {
        let switched = self.container.as_ref().map(|c| c.name != container.name).unwrap_or(true);
        if switched {
            self.size_per_date.clear();
        }

        debug!(container = %container.name, %date, "Opening log session");
        self.container = Some(container);
        self.last_seen = None;

        let mut requests = vec![self.start_window(date)];
        if self.mode == LogMode::RealTime {
            requests.extend(self.tail_request());
        }
        requests
    }

    /// Reload the current container for another day. `None` when closed.
    pub fn select_date(&mut self, date: NaiveDate) -> Option<LogRequest> {
        if self.container.is_none() {
            return None;
        }
        Some(self.start_window(date))
    }

    pub fn close(&mut self) {
        self.container = None;
        self.date = None;
        self.entries.clear();
        self.filter = LogFilter::All;
        self.last_seen = None;
        self.size_per_date.clear();
        self.state = SessionState::Closed;
        self.bump_generation();
    }

    /// Flip Static/RealTime. Entering RealTime polls the tail right away.
    pub fn toggle_real_time(&mut self) -> Option<LogRequest> {
        self.mode_epoch += 1;
        self.tail_in_flight = false;

        match self.mode {
            LogMode::Static => {
                self.mode = LogMode::RealTime;
                self.tail_request()
            }
            LogMode::RealTime => {
                self.mode = LogMode::Static;
                self.last_seen = None;
                None
            }
        }
    }

    pub fn set_auto_refresh(&mut self, enabled: bool) {
        self.auto_refresh = enabled;
    }

    pub fn toggle_auto_refresh(&mut self) {
        self.auto_refresh = !self.auto_refresh;
    }

    pub fn set_filter(&mut self, filter: LogFilter) {
        self.filter = filter;
    }

    /// Timer the session wants running right now
    pub fn active_timer(&self) -> Option<TimerKind> {
        if self.state == SessionState::Closed {
            return None;
        }
        match self.mode {
            LogMode::RealTime => Some(TimerKind::RealTimeTail),
            LogMode::Static if self.auto_refresh => Some(TimerKind::StaticRefresh),
            LogMode::Static => None,
        }
    }

    /// A timer fired. Ticks from a timer that is no longer wanted are ignored.
    pub fn tick(&mut self, kind: TimerKind) -> Option<LogRequest> {
        if self.active_timer() != Some(kind) {
            return None;
        }

        match kind {
            TimerKind::StaticRefresh => {
                let date = self.date?;
                let tail = self.tail_lines;
                self.request(RequestKind::Window { date, tail, initial: false })
            }
            TimerKind::RealTimeTail => self.tail_request(),
        }
    }

    /// Apply a response. Superseded responses are discarded.
    pub fn apply(&mut self, response: LogResponse) -> ApplyOutcome {
        let tag = response.tag;
        if tag.generation != self.generation || self.container.is_none() {
            debug!(?tag, "Discarding log response from a previous view");
            return ApplyOutcome::Discarded;
        }

        match response.outcome {
            LogOutcome::Window { date, initial, result } => self.apply_window(tag, date, initial, result),
            LogOutcome::Tail { result } => self.apply_tail(tag, result),
        }
    }

    fn apply_window(
        &mut self,
        tag: RequestTag,
        date: NaiveDate,
        initial: bool,
        result: Result<Vec<LogEntry>, ApiError>,
    ) -> ApplyOutcome {
        if tag.seq <= self.last_window_seq {
            return ApplyOutcome::Discarded;
        }
        if !initial && tag.mode_epoch != self.mode_epoch {
            return ApplyOutcome::Discarded;
        }

        match result {
            Ok(mut entries) => {
                // The backend streams a day oldest first
                entries.reverse();
                self.last_window_seq = tag.seq;
                self.size_per_date.insert(date, message_bytes(&entries));
                self.entries = entries;
                self.state = SessionState::Loaded;
                ApplyOutcome::Replaced(self.entries.len())
            }
            Err(e) if initial => {
                warn!(container = %self.container_name().unwrap_or_default(), %date, "Failed to load logs: {}", e);
                self.last_window_seq = tag.seq;
                self.entries.clear();
                self.state = SessionState::Loaded;
                ApplyOutcome::Emptied
            }
            Err(e) => {
                warn!(container = %self.container_name().unwrap_or_default(), %date, "Log refresh failed: {}", e);
                ApplyOutcome::Kept
            }
        }
    }

    fn apply_tail(&mut self, tag: RequestTag, result: Result<LiveLogs, ApiError>) -> ApplyOutcome {
        if tag.mode_epoch != self.mode_epoch {
            return ApplyOutcome::Discarded;
        }
        self.tail_in_flight = false;

        match result {
            Ok(live) => {
                // `since` is inclusive and truncated to whole seconds, so the
                // batch can repeat lines that were already shown
                let seen = self.last_seen.as_deref().and_then(parse_timestamp);
                let fresh: Vec<LogEntry> = live
                    .logs
                    .into_iter()
                    .filter(|entry| match (seen, entry.timestamp.as_deref().and_then(parse_timestamp)) {
                        (Some(seen), Some(ts)) => ts > seen,
                        _ => true,
                    })
                    .collect();
                let count = fresh.len();
                // Batch keeps its own order and goes in front of older lines
                self.entries.splice(0..0, fresh);
                self.advance_last_seen(live.latest_timestamp);
                ApplyOutcome::Prepended(count)
            }
            Err(e) => {
                warn!(container = %self.container_name().unwrap_or_default(), "Live log poll failed: {}", e);
                ApplyOutcome::Kept
            }
        }
    }

    // ------------------------------------------------------------------
    // Views
    // ------------------------------------------------------------------

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_open(&self) -> bool {
        self.state != SessionState::Closed
    }

    pub fn mode(&self) -> LogMode {
        self.mode
    }

    pub fn auto_refresh(&self) -> bool {
        self.auto_refresh
    }

    pub fn filter(&self) -> LogFilter {
        self.filter
    }

    pub fn container(&self) -> Option<&ContainerRef> {
        self.container.as_ref()
    }

    pub fn container_name(&self) -> Option<String> {
        self.container.as_ref().map(|c| c.name.clone())
    }

    pub fn date(&self) -> Option<NaiveDate> {
        self.date
    }

    pub fn last_seen(&self) -> Option<&str> {
        self.last_seen.as_deref()
    }

    /// All entries, newest batch first
    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    pub fn visible_entries(&self) -> Vec<&LogEntry> {
        self.entries.iter().filter(|e| self.filter.matches(e)).collect()
    }

    pub fn counts(&self) -> LogCounts {
        LogCounts::tally(&self.entries)
    }

    /// Message bytes of the last successful fetch for `date`
    pub fn size_for(&self, date: NaiveDate) -> Option<u64> {
        self.size_per_date.get(&date).copied()
    }

    /// Dates offered by the date picker, today first
    pub fn available_dates(&self, today: NaiveDate) -> Vec<NaiveDate> {
        recent_dates(today, LOG_HISTORY_DAYS)
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn start_window(&mut self, date: NaiveDate) -> LogRequest {
        self.bump_generation();
        self.date = Some(date);
        self.entries.clear();
        self.state = SessionState::Loading;

        let tag = self.next_tag();
        LogRequest {
            tag,
            container: self.container_name().unwrap_or_default(),
            kind: RequestKind::Window { date, tail: self.tail_lines, initial: true },
        }
    }

    fn tail_request(&mut self) -> Option<LogRequest> {
        if self.tail_in_flight || self.container.is_none() {
            return None;
        }
        self.tail_in_flight = true;
        let since = self.last_seen.clone();
        self.request(RequestKind::Tail { since })
    }

    fn request(&mut self, kind: RequestKind) -> Option<LogRequest> {
        let container = self.container_name()?;
        Some(LogRequest { tag: self.next_tag(), container, kind })
    }

    fn next_tag(&mut self) -> RequestTag {
        self.next_seq += 1;
        RequestTag {
            generation: self.generation,
            mode_epoch: self.mode_epoch,
            seq: self.next_seq,
        }
    }

    fn bump_generation(&mut self) {
        self.generation += 1;
        self.tail_in_flight = false;
    }

    /// Never moves backwards; a missing timestamp leaves it unchanged
    fn advance_last_seen(&mut self, latest: Option<String>) {
        let Some(latest) = latest else {
            return;
        };

        let newer = match self.last_seen.as_deref() {
            None => true,
            Some(current) => parse_timestamp(&latest) >= parse_timestamp(current),
        };
        if newer {
            self.last_seen = Some(latest);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::api::MockMonitorBackend;
    use crate::core::models::LogLevel;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    fn line(message: &str) -> LogEntry {
        LogEntry {
            timestamp: None,
            message: message.to_string(),
            level: None,
            details: None,
        }
    }

    fn window_ok(req: &LogRequest, messages: &[&str]) -> LogResponse {
        let RequestKind::Window { date, initial, .. } = req.kind.clone() else {
            panic!("expected a window request, got {:?}", req.kind);
        };
        LogResponse {
            tag: req.tag,
            outcome: LogOutcome::Window {
                date,
                initial,
                result: Ok(messages.iter().map(|m| line(m)).collect()),
            },
        }
    }

    fn window_err(req: &LogRequest) -> LogResponse {
        let RequestKind::Window { date, initial, .. } = req.kind.clone() else {
            panic!("expected a window request, got {:?}", req.kind);
        };
        LogResponse {
            tag: req.tag,
            outcome: LogOutcome::Window {
                date,
                initial,
                result: Err(ApiError::Backend("Container not found".to_string())),
            },
        }
    }

    fn tail_ok(req: &LogRequest, messages: &[&str], latest: Option<&str>) -> LogResponse {
        assert!(matches!(req.kind, RequestKind::Tail { .. }));
        LogResponse {
            tag: req.tag,
            outcome: LogOutcome::Tail {
                result: Ok(LiveLogs {
                    logs: messages.iter().map(|m| line(m)).collect(),
                    latest_timestamp: latest.map(str::to_string),
                    error: None,
                }),
            },
        }
    }

    fn stamped(message: &str, timestamp: &str) -> LogEntry {
        LogEntry {
            timestamp: Some(timestamp.to_string()),
            ..line(message)
        }
    }

    fn tail_with(req: &LogRequest, result: Result<LiveLogs, ApiError>) -> LogResponse {
        assert!(matches!(req.kind, RequestKind::Tail { .. }));
        LogResponse {
            tag: req.tag,
            outcome: LogOutcome::Tail { result },
        }
    }

    fn messages(session: &LogSession) -> Vec<&str> {
        session.entries().iter().map(|e| e.message.as_str()).collect()
    }

    fn open(session: &mut LogSession, name: &str, date: NaiveDate) -> LogRequest {
        session.open(ContainerRef::named(name), date).remove(0)
    }

    #[test]
    fn test_open_stores_container_before_response() {
        let mut session = LogSession::default();
        let req = open(&mut session, "web", day(1));

        assert_eq!(session.state(), SessionState::Loading);
        assert_eq!(session.container_name().as_deref(), Some("web"));
        assert_eq!(req.container, "web");
        assert_eq!(req.kind, RequestKind::Window { date: day(1), tail: 500, initial: true });
    }

    #[test]
    fn test_open_success_records_size() {
        let mut session = LogSession::default();
        let req = open(&mut session, "web", day(1));

        let outcome = session.apply(window_ok(&req, &["abc", "é"]));
        assert_eq!(outcome, ApplyOutcome::Replaced(2));
        assert_eq!(session.state(), SessionState::Loaded);
        assert_eq!(session.size_for(day(1)), Some(5));
        assert_eq!(session.size_for(day(2)), None);
    }

    #[test]
    fn test_late_response_for_previous_date_is_discarded() {
        let mut session = LogSession::default();
        let first = open(&mut session, "web", day(1));
        let second = session.select_date(day(2)).unwrap();

        assert_eq!(session.apply(window_ok(&second, &["jan 2"])), ApplyOutcome::Replaced(1));
        assert_eq!(session.apply(window_ok(&first, &["jan 1"])), ApplyOutcome::Discarded);

        assert_eq!(messages(&session), vec!["jan 2"]);
        assert_eq!(session.date(), Some(day(2)));
        assert_eq!(session.size_for(day(1)), None);
    }

    #[test]
    fn test_select_date_clears_entries_immediately() {
        let mut session = LogSession::default();
        let req = open(&mut session, "web", day(1));
        session.apply(window_ok(&req, &["old"]));

        session.select_date(day(2));
        assert!(session.entries().is_empty());
        assert_eq!(session.state(), SessionState::Loading);
    }

    #[test]
    fn test_select_date_when_closed() {
        let mut session = LogSession::default();
        assert!(session.select_date(day(2)).is_none());
    }

    #[test]
    fn test_initial_failure_empties() {
        let mut session = LogSession::default();
        let req = open(&mut session, "web", day(1));

        assert_eq!(session.apply(window_err(&req)), ApplyOutcome::Emptied);
        assert!(session.entries().is_empty());
        assert_eq!(session.state(), SessionState::Loaded);
    }

    #[test]
    fn test_refresh_failure_keeps_entries() {
        let mut session = LogSession::default();
        let req = open(&mut session, "web", day(1));
        session.apply(window_ok(&req, &["a", "b"]));

        let refresh = session.tick(TimerKind::StaticRefresh).unwrap();
        assert_eq!(refresh.kind, RequestKind::Window { date: day(1), tail: 500, initial: false });
        assert_eq!(session.apply(window_err(&refresh)), ApplyOutcome::Kept);
        assert_eq!(messages(&session), vec!["b", "a"]);

        let next = session.tick(TimerKind::StaticRefresh).unwrap();
        assert_eq!(session.apply(window_ok(&next, &["a", "b", "c"])), ApplyOutcome::Replaced(3));
    }

    #[test]
    fn test_slow_refresh_cannot_overwrite_newer_one() {
        let mut session = LogSession::default();
        let req = open(&mut session, "web", day(1));
        session.apply(window_ok(&req, &["a"]));

        let slow = session.tick(TimerKind::StaticRefresh).unwrap();
        let fast = session.tick(TimerKind::StaticRefresh).unwrap();
        session.apply(window_ok(&fast, &["a", "b"]));

        assert_eq!(session.apply(window_ok(&slow, &["a"])), ApplyOutcome::Discarded);
        assert_eq!(messages(&session), vec!["b", "a"]);
    }

    #[test]
    fn test_real_time_prepends_in_batch_order() {
        let mut session = LogSession::default();
        let req = open(&mut session, "web", day(1));
        session.apply(window_ok(&req, &["p1", "p2"]));

        let first = session.toggle_real_time().unwrap();
        assert_eq!(first.kind, RequestKind::Tail { since: None });
        session.apply(tail_ok(&first, &["L1", "L2"], Some("2024-01-01T10:00:02Z")));

        let second = session.tick(TimerKind::RealTimeTail).unwrap();
        assert_eq!(second.kind, RequestKind::Tail { since: Some("2024-01-01T10:00:02Z".to_string()) });
        session.apply(tail_ok(&second, &["L3"], Some("2024-01-01T10:00:05Z")));

        assert_eq!(messages(&session), vec!["L3", "L1", "L2", "p2", "p1"]);
        assert_eq!(session.last_seen(), Some("2024-01-01T10:00:05Z"));
    }

    #[test]
    fn test_day_window_is_stored_newest_first() {
        let mut session = LogSession::default();
        let req = open(&mut session, "web", day(1));
        let response = LogResponse {
            tag: req.tag,
            outcome: LogOutcome::Window {
                date: day(1),
                initial: true,
                result: Ok(vec![stamped("boot", "2024-01-01T08:00:00Z"), stamped("later", "2024-01-01T09:00:00Z")]),
            },
        };

        assert_eq!(session.apply(response), ApplyOutcome::Replaced(2));
        assert_eq!(messages(&session), vec!["later", "boot"]);

        // Live lines land above the newest line of the day
        let tail = session.toggle_real_time().unwrap();
        let live = LiveLogs {
            logs: vec![stamped("live", "2024-01-01T09:30:00Z")],
            latest_timestamp: Some("2024-01-01T09:30:00Z".to_string()),
            error: None,
        };
        session.apply(tail_with(&tail, Ok(live)));
        assert_eq!(messages(&session), vec!["live", "later", "boot"]);
    }

    #[test]
    fn test_tail_skips_lines_already_seen() {
        let mut session = LogSession::default();
        open(&mut session, "web", day(1));
        let latest = "2024-01-01T10:00:05.5Z";

        let first = session.toggle_real_time().unwrap();
        let batch = LiveLogs {
            logs: vec![stamped("L1", latest)],
            latest_timestamp: Some(latest.to_string()),
            error: None,
        };
        assert_eq!(session.apply(tail_with(&first, Ok(batch.clone()))), ApplyOutcome::Prepended(1));

        // Quiet container: the inclusive `since` returns the same line again
        let second = session.tick(TimerKind::RealTimeTail).unwrap();
        assert_eq!(session.apply(tail_with(&second, Ok(batch))), ApplyOutcome::Prepended(0));
        assert_eq!(messages(&session), vec!["L1"]);

        let third = session.tick(TimerKind::RealTimeTail).unwrap();
        let batch = LiveLogs {
            logs: vec![stamped("L1", latest), stamped("L2", "2024-01-01T10:00:06Z"), line("no timestamp")],
            latest_timestamp: Some("2024-01-01T10:00:06Z".to_string()),
            error: None,
        };
        assert_eq!(session.apply(tail_with(&third, Ok(batch))), ApplyOutcome::Prepended(2));
        assert_eq!(messages(&session), vec!["L2", "no timestamp", "L1"]);
        assert_eq!(session.last_seen(), Some("2024-01-01T10:00:06Z"));
    }

    #[test]
    fn test_failed_tail_poll_keeps_entries() {
        let mut session = LogSession::default();
        let req = open(&mut session, "web", day(1));
        session.apply(window_ok(&req, &["a"]));

        let first = session.toggle_real_time().unwrap();
        session.apply(tail_ok(&first, &["L1"], Some("2024-01-01T10:00:05Z")));

        let second = session.tick(TimerKind::RealTimeTail).unwrap();
        let failed = tail_with(&second, Err(ApiError::Backend("Container not found".to_string())));
        assert_eq!(session.apply(failed), ApplyOutcome::Kept);
        assert_eq!(messages(&session), vec!["L1", "a"]);
        assert_eq!(session.last_seen(), Some("2024-01-01T10:00:05Z"));

        // The failed poll no longer counts as in flight
        assert!(session.tick(TimerKind::RealTimeTail).is_some());
    }

    #[test]
    fn test_static_refresh_from_before_real_time_is_discarded() {
        let mut session = LogSession::default();
        let req = open(&mut session, "web", day(1));
        session.apply(window_ok(&req, &["a"]));

        let refresh = session.tick(TimerKind::StaticRefresh).unwrap();
        session.toggle_real_time();

        assert_eq!(session.apply(window_ok(&refresh, &["a", "b"])), ApplyOutcome::Discarded);
        assert_eq!(messages(&session), vec!["a"]);
        assert_eq!(session.mode(), LogMode::RealTime);
    }

    #[test]
    fn test_last_seen_never_rewinds() {
        let mut session = LogSession::default();
        open(&mut session, "web", day(1));

        let first = session.toggle_real_time().unwrap();
        session.apply(tail_ok(&first, &["L1"], Some("2024-01-01T10:00:05Z")));

        let second = session.tick(TimerKind::RealTimeTail).unwrap();
        session.apply(tail_ok(&second, &["old"], Some("2024-01-01T10:00:01Z")));
        assert_eq!(session.last_seen(), Some("2024-01-01T10:00:05Z"));

        let third = session.tick(TimerKind::RealTimeTail).unwrap();
        session.apply(tail_ok(&third, &[], None));
        assert_eq!(session.last_seen(), Some("2024-01-01T10:00:05Z"));
    }

    #[test]
    fn test_one_tail_poll_in_flight() {
        let mut session = LogSession::default();
        open(&mut session, "web", day(1));

        let first = session.toggle_real_time().unwrap();
        assert!(session.tick(TimerKind::RealTimeTail).is_none());

        session.apply(tail_ok(&first, &[], None));
        assert!(session.tick(TimerKind::RealTimeTail).is_some());
    }

    #[test]
    fn test_leaving_real_time_clears_last_seen_and_drops_tail() {
        let mut session = LogSession::default();
        open(&mut session, "web", day(1));

        let first = session.toggle_real_time().unwrap();
        session.apply(tail_ok(&first, &["L1"], Some("2024-01-01T10:00:05Z")));
        let pending = session.tick(TimerKind::RealTimeTail).unwrap();

        assert!(session.toggle_real_time().is_none());
        assert_eq!(session.mode(), LogMode::Static);
        assert!(session.last_seen().is_none());
        assert_eq!(session.apply(tail_ok(&pending, &["late"], None)), ApplyOutcome::Discarded);
        assert_eq!(messages(&session), vec!["L1"]);
    }

    #[test]
    fn test_timer_follows_mode_and_auto_refresh() {
        let mut session = LogSession::default();
        assert_eq!(session.active_timer(), None);

        open(&mut session, "web", day(1));
        assert_eq!(session.active_timer(), Some(TimerKind::StaticRefresh));

        session.set_auto_refresh(false);
        assert_eq!(session.active_timer(), None);
        assert!(session.tick(TimerKind::StaticRefresh).is_none());

        session.toggle_real_time();
        assert_eq!(session.active_timer(), Some(TimerKind::RealTimeTail));
        assert!(session.tick(TimerKind::StaticRefresh).is_none());

        session.close();
        assert_eq!(session.active_timer(), None);
    }

    #[test]
    fn test_open_in_real_time_polls_tail_immediately() {
        let mut session = LogSession::default();
        open(&mut session, "web", day(1));
        session.toggle_real_time();

        let requests = session.open(ContainerRef::named("db"), day(1));
        assert_eq!(requests.len(), 2);
        assert!(matches!(requests[1].kind, RequestKind::Tail { since: None }));
    }

    #[test]
    fn test_close_resets_view_and_discards_pending() {
        let mut session = LogSession::default();
        let req = open(&mut session, "web", day(1));
        session.set_filter(LogFilter::Error);

        session.close();
        assert_eq!(session.state(), SessionState::Closed);
        assert_eq!(session.filter(), LogFilter::All);
        assert!(session.container().is_none());
        assert_eq!(session.apply(window_ok(&req, &["late"])), ApplyOutcome::Discarded);
        assert!(session.entries().is_empty());
    }

    #[test]
    fn test_filter_and_counts() {
        let mut session = LogSession::default();
        let req = open(&mut session, "web", day(1));
        let mut tagged = line("plain text");
        tagged.level = Some(LogLevel::Error);
        let response = LogResponse {
            tag: req.tag,
            outcome: LogOutcome::Window {
                date: day(1),
                initial: true,
                result: Ok(vec![line("GET / 502"), line("deprecated call"), line("ready"), tagged]),
            },
        };
        session.apply(response);

        session.set_filter(LogFilter::Error);
        assert_eq!(session.visible_entries().len(), 2);
        assert_eq!(session.counts(), LogCounts { error: 2, warning: 1, info: 1 });
        assert_eq!(session.entries().len(), 4);
    }

    #[test]
    fn test_available_dates() {
        let session = LogSession::default();
        let dates = session.available_dates(day(10));
        assert_eq!(dates.len(), 10);
        assert_eq!(dates[0], day(10));
        assert_eq!(dates[9], day(1));
    }

    #[tokio::test]
    async fn test_execute_routes_to_backend() {
        let mut backend = MockMonitorBackend::new();
        backend
            .expect_logs()
            .withf(|name, date, tail| name == "web" && *date == NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() && *tail == 500)
            .times(1)
            .returning(|_, _, _| Ok(vec![]));
        backend
            .expect_live_logs()
            .withf(|name, since| name == "web" && since.as_deref() == Some("2024-01-01T00:00:00Z"))
            .times(1)
            .returning(|_, _| Ok(LiveLogs::default()));

        let mut session = LogSession::default();
        let req = open(&mut session, "web", day(1));
        let response = req.execute(&backend).await;
        assert_eq!(session.apply(response), ApplyOutcome::Replaced(0));

        session.last_seen = Some("2024-01-01T00:00:00Z".to_string());
        let tail = session.toggle_real_time().unwrap();
        let response = tail.execute(&backend).await;
        assert!(matches!(response.outcome, LogOutcome::Tail { result: Ok(_) }));
        assert_eq!(session.apply(response), ApplyOutcome::Prepended(0));
    }
}
