//! # Agenda
//!
//! A multi-tenant booking server for school rooms and equipment, usable both as a
//! standalone binary and as a library.
//!
//! ## Library Usage
//!
//! ```toml
//! [dependencies]
//! agenda = { version = "0.0.1", default-features = false }
//! ```
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use agenda::config::{Integrations, ServerConfig};
//! use agenda::mail::LogMailer;
//! use agenda::server::{AppState, create_router};
//! use agenda::store::SqliteStore;
//!
//! let config = ServerConfig::default();
//! let integrations = Integrations::from_env();
//! let store = SqliteStore::new(integrations.database_path(&config.data_dir)).unwrap();
//! store.initialize().unwrap();
//!
//! let state = Arc::new(AppState::new(
//!     Arc::new(store),
//!     Arc::new(LogMailer::new(integrations.mail.default_sender.clone())),
//!     &config,
//!     &integrations,
//! ));
//! let router = create_router(state);
//! // Serve with axum...
//! ```
//!
//! ## Feature Flags
//!
//! - `cli` (default): Includes the `admin` CLI module. Disable with `default-features = false`.

pub mod auth;
pub mod backup;
pub mod billing;
#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod error;
pub mod mail;
pub mod oauth;
pub mod scheduling;
pub mod server;
pub mod store;
pub mod types;
