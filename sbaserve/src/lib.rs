//! Server wiring for the sealed-bid auction engine: CLI parsing and layered
//! configuration. The binary in `main.rs` assembles the database, engine,
//! event hub, HTTP server, job worker, and fallback poller from these.

mod cli;
mod config;

pub use cli::Cli;
pub use config::AppConfig;
