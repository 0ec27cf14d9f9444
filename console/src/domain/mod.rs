//! Domain primitives, ports and services of the console.
//!
//! Purpose: model the permission layer, the records exchanged with the API
//! and the panels that drive them, independently of HTTP and the terminal.
//!
//! Public surface:
//! - Error / ErrorCode: driver-facing error payload.
//! - AuthorizationContext, ActionGate: who may do what, and the wrapper that
//!   enforces it.
//! - ResourcePanel and the six schemas: list/view/edit state per resource.
//! - SessionService: login, restore, refresh, validation and logout.

pub mod auth;
pub mod client_profile;
pub mod date_filter;
pub mod error;
pub mod gate;
pub mod history;
pub mod ledger;
pub mod panel;
pub mod permissions;
pub mod ports;
pub mod records;
pub mod session;
pub mod session_service;

pub use self::auth::{BearerToken, LoginCredentials, LoginValidationError};
pub use self::client_profile::{ClientProfile, add_address, add_kin, load_client_profile};
pub use self::date_filter::{DateRange, RecordFilter, parse_flexible_date};
pub use self::error::{Error, ErrorCode, ErrorValidationError};
pub use self::gate::{ActionGate, Denial, GateOutcome};
pub use self::history::{HistoryEntry, HistorySplit};
pub use self::panel::{
    ClientSchema, CouncilSchema, EditTarget, NoteSchema, PanelError, PanelMode, ResourcePanel,
    ResourceSchema, ServiceSchema, StatementSchema, UserSchema, ValidationError,
};
pub use self::permissions::{Action, ActionSet, PermissionMap, Resource, UnknownName};
pub use self::session::{AuthorizationContext, Role, SessionInvalid, SessionUser, SessionUserError};
pub use self::session_service::{ActiveSession, SessionService};

/// Result alias for driver-facing operations.
pub type ConsoleResult<T> = Result<T, Error>;
