//! Care-services back-office console library.
//!
//! The console drives CRUD panels for councils, clients, services,
//! statements, notes and user accounts against a REST API, gating every
//! panel action through a client-local permission map.
//!
//! Layout follows a hexagonal split:
//! - [`domain`] holds permissions, the action gate, records, the statement
//!   ledger and the generic resource panel, plus the ports they drive.
//! - [`outbound`] holds adapters for those ports (HTTP API, session file, export files).
//! - [`inbound`] holds the command-line front end and terminal feedback.
//! - [`config`] loads console settings.

pub mod config;
pub mod domain;
pub mod inbound;
pub mod outbound;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use config::ConsoleSettings;
