//! Terminal client for a Docker monitor backend
//!
//! Polls host/container metrics, the container inventory and container logs
//! from the backend's HTTP API and renders them as a TUI dashboard or as
//! one-shot CLI reports.

pub mod app;
pub mod cli;
pub mod core;
pub mod screens;
pub mod utils;
pub mod widgets;
