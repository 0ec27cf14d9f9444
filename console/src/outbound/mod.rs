//! Adapters for the driven ports.

pub mod export_file;
pub mod http;
pub mod session_file;

pub use export_file::write_download;
pub use http::HttpConsoleApi;
pub use session_file::FileSessionStore;
