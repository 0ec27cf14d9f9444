//! Records exchanged with the API.
//!
//! Inbound records are built from raw JSON with [`ApiRecord::from_value`];
//! outbound payloads are plain `Serialize` drafts.

mod client;
mod contact;
mod council;
pub mod normalize;
mod note;
mod service;
mod statement;
mod user_account;

use serde_json::Value;

pub use client::Client;
pub use contact::{Address, CurrentMarker, Kin, KinDraft, PostalAddress};
pub use council::{Council, CouncilDraft, CouncilStatus};
pub use note::{Note, NoteDraft};
pub use service::{Service, SetupFee};
pub use statement::{Statement, StatementDraft};
pub use user_account::{UserAccount, UserDraft};

/// Record read leniently from an API payload.
pub trait ApiRecord: Sized {
    /// Build the record; missing or malformed fields take their defaults.
    fn from_value(value: &Value) -> Self;

    /// Build every record of a collection response.
    ///
    /// See [`normalize::collection`] for the accepted shapes.
    #[must_use]
    fn list_from_value(value: &Value, envelope: Option<&str>) -> Vec<Self> {
        normalize::collection(value, envelope)
            .iter()
            .map(Self::from_value)
            .collect()
    }
}
