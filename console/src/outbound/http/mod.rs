//! REST API adapters.
//!
//! One reqwest client implements the resource, authentication and export
//! ports against a single base URL.

mod client;
mod dto;

pub use client::HttpConsoleApi;
