pub mod dashboard;
pub mod watch;

// The TUI is a single dashboard with four tabs (Dashboard, Host, Containers,
// Rankings) and a log viewer overlay; `watch` is the plain-terminal tail used
// by the `watch` subcommand.

pub use dashboard::{Dashboard, DashboardView};
pub use watch::run_watch;
