//! Domain ports and supporting types for the hexagonal boundary.

mod macros;
pub(crate) use macros::define_port_error;

mod auth_api;
mod export_api;
mod resource_api;
mod session_store;
mod user_feedback;

#[cfg(test)]
pub use auth_api::MockAuthApi;
pub use auth_api::{AuthApi, FixtureAuthApi, LoginGrant};
#[cfg(test)]
pub use export_api::MockExportApi;
pub use export_api::{
    Download, ExportApi, ExportFormat, ExportRequest, filename_from_disposition,
};
#[cfg(test)]
pub use resource_api::MockResourceApi;
pub use resource_api::{ApiError, ResourceApi, ResourcePath};
#[cfg(test)]
pub use session_store::MockSessionStore;
pub use session_store::{MemorySessionStore, SessionStore, SessionStoreError, StoredSession};
#[cfg(test)]
pub use user_feedback::MockUserFeedback;
pub use user_feedback::{FixtureFeedback, UserFeedback};
