//! Core module — server configuration, state and wiring
//!
//! - [`Config`] - server configuration
//! - [`ServerState`] - shared state handed to every handler and task
//! - [`Server`] - HTTP server and background task startup

pub mod config;
pub mod server;
pub mod state;

pub use config::Config;
pub use server::Server;
pub use state::ServerState;
