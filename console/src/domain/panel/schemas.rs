//! The six resource schemas.

use chrono::NaiveDate;
use pagination::PageSize;
use serde_json::{Value, json};

use tracing::warn;

use super::PanelError;
use super::schema::{EditTarget, PageAnchor, ResourceSchema, ValidationError, require_text};
use crate::domain::gate::ActionGate;
use crate::domain::ledger::{self, BEFORE_START_MESSAGE};
use crate::domain::permissions::{Action, Resource};
use crate::domain::ports::{ResourceApi, ResourcePath};
use crate::domain::records::{
    ApiRecord, Client, Council, CouncilDraft, CouncilStatus, Note, NoteDraft, Service, Statement,
    StatementDraft, UserAccount, UserDraft,
};

/// Rows per page on the notes panel.
pub const NOTES_PAGE_SIZE: usize = 30;

/// Councils: `councils`.
#[derive(Debug, Clone, Copy, Default)]
pub struct CouncilSchema;

impl ResourceSchema for CouncilSchema {
    type Record = Council;
    type Draft = CouncilDraft;

    const RESOURCE: Resource = Resource::Council;

    fn collection(&self) -> ResourcePath {
        ResourcePath::new("councils")
    }

    fn record_id(record: &Council) -> &str {
        &record.id
    }

    fn record_date(record: &Council) -> Option<NaiveDate> {
        record.created_at
    }

    fn search_text(record: &Council) -> String {
        format!("{} {} {}", record.name, record.city, record.postcode)
    }

    fn validate(&self, draft: &CouncilDraft, _target: &EditTarget) -> Result<(), ValidationError> {
        require_text(&draft.name, "Council name is required")
    }

    fn status_body(&self, enabled: bool) -> Option<Value> {
        Some(json!({ "status": CouncilStatus::from_enabled(enabled).as_str() }))
    }

    fn delete_prompt(record: &Council) -> String {
        format!("Delete \"{}\"?", record.name)
    }
}

impl CouncilSchema {
    /// Councils open for new clients, from `councils/enabled`.
    ///
    /// # Errors
    ///
    /// Returns [`PanelError::Denied`] without a request when viewing
    /// councils is not allowed, or [`PanelError::Api`] after alerting.
    pub async fn enabled(
        api: &dyn ResourceApi,
        gate: &ActionGate,
    ) -> Result<Vec<Council>, PanelError> {
        gate.authorize(Resource::Council, Action::View)?;
        let body = api
            .get(&ResourcePath::new("councils").child("enabled"))
            .await
            .map_err(|err| {
                warn!(error = %err, "enabled councils unavailable");
                gate.feedback().alert(&err.to_string());
                PanelError::Api(err)
            })?;
        Ok(Council::list_from_value(&body, None))
    }
}

/// Clients: `clients`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClientSchema;

impl ResourceSchema for ClientSchema {
    type Record = Client;
    type Draft = Client;

    const RESOURCE: Resource = Resource::Client;

    fn collection(&self) -> ResourcePath {
        ResourcePath::new("clients")
    }

    fn record_id(record: &Client) -> &str {
        &record.id
    }

    fn search_text(record: &Client) -> String {
        format!("{} {}", record.full_name(), record.id)
    }

    fn validate(&self, draft: &Client, _target: &EditTarget) -> Result<(), ValidationError> {
        require_text(&draft.first_name, "First Name and Last Name are required.")?;
        require_text(&draft.last_name, "First Name and Last Name are required.")
    }

    fn delete_prompt(_record: &Client) -> String {
        "This action cannot be undone.\nDelete client and all related services?".to_owned()
    }
}

/// Services: `services`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ServiceSchema;

impl ResourceSchema for ServiceSchema {
    type Record = Service;
    type Draft = Service;

    const RESOURCE: Resource = Resource::Service;

    fn collection(&self) -> ResourcePath {
        ResourcePath::new("services")
    }

    fn envelope(&self) -> Option<&'static str> {
        Some("services")
    }

    fn record_id(record: &Service) -> &str {
        &record.id
    }

    fn record_date(record: &Service) -> Option<NaiveDate> {
        record.start_date
    }

    fn search_text(record: &Service) -> String {
        format!(
            "{} {} {} {}",
            record.id, record.client_id, record.reference, record.service_type
        )
    }

    fn validate(&self, draft: &Service, _target: &EditTarget) -> Result<(), ValidationError> {
        require_text(&draft.client_id, "Client ID is required")?;
        require_text(&draft.reference, "Reference is required")?;
        if draft.start_date.is_none() {
            return Err(ValidationError::new("Start Date is required"));
        }
        require_text(&draft.service_type, "Service Type is required")?;
        require_text(draft.setup_fee.as_str(), "Setup Fee is required")?;
        require_text(&draft.referred_by, "Referred By is required")
    }

    fn delete_prompt(_record: &Service) -> String {
        "Delete this service?".to_owned()
    }
}

/// Statements of one service: `services/{id}/statements`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatementSchema {
    service_id: String,
    service_start: Option<NaiveDate>,
}

impl StatementSchema {
    /// Schema for the statements of `service`.
    #[must_use]
    pub fn for_service(service: &Service) -> Self {
        Self {
            service_id: service.id.clone(),
            service_start: service.start_date,
        }
    }

    /// Schema for a service known only by id; no start-date check applies.
    #[must_use]
    pub fn for_service_id(service_id: impl Into<String>) -> Self {
        Self {
            service_id: service_id.into(),
            service_start: None,
        }
    }

    /// Fetch `services/{service_id}` and build the schema for its
    /// statements, returning the service alongside.
    ///
    /// # Errors
    ///
    /// Returns [`PanelError::Denied`] without a request when viewing
    /// statements is not allowed, or [`PanelError::Api`] after alerting.
    pub async fn fetch(
        api: &dyn ResourceApi,
        gate: &ActionGate,
        service_id: &str,
    ) -> Result<(Self, Service), PanelError> {
        gate.authorize(Resource::Statement, Action::View)?;
        let path = ResourcePath::new("services").child(service_id);
        let body = api.get(&path).await.map_err(|err| {
            warn!(service_id, error = %err, "service lookup failed");
            gate.feedback().alert(&err.to_string());
            PanelError::Api(err)
        })?;
        let service = Service::from_value(body.get("service").unwrap_or(&body));
        let schema = Self {
            service_id: service_id.to_owned(),
            service_start: service.start_date,
        };
        Ok((schema, service))
    }

    /// Owning service.
    #[must_use]
    pub fn service_id(&self) -> &str {
        &self.service_id
    }
}

impl ResourceSchema for StatementSchema {
    type Record = Statement;
    type Draft = StatementDraft;

    const RESOURCE: Resource = Resource::Statement;

    fn collection(&self) -> ResourcePath {
        ResourcePath::new("services")
            .child(self.service_id.as_str())
            .child("statements")
    }

    fn envelope(&self) -> Option<&'static str> {
        Some("statements")
    }

    fn record_id(record: &Statement) -> &str {
        &record.id
    }

    fn order(&self, records: &mut [Statement]) {
        ledger::sort_by_date(records);
    }

    fn record_date(record: &Statement) -> Option<NaiveDate> {
        record.date
    }

    fn search_text(record: &Statement) -> String {
        record.description.clone()
    }

    fn validate(&self, draft: &StatementDraft, _target: &EditTarget) -> Result<(), ValidationError> {
        require_text(&draft.description, "Description is required")?;
        match self.service_start {
            Some(start) if draft.date < start => Err(ValidationError::new(BEFORE_START_MESSAGE)),
            _ => Ok(()),
        }
    }

    fn after_create(&self) -> PageAnchor {
        PageAnchor::Last
    }

    fn delete_prompt(_record: &Statement) -> String {
        "Delete this statement?".to_owned()
    }
}

/// Notes of one service: `services/{id}/notes`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteSchema {
    service_id: String,
}

impl NoteSchema {
    /// Schema for the notes of `service_id`.
    pub fn for_service(service_id: impl Into<String>) -> Self {
        Self {
            service_id: service_id.into(),
        }
    }
}

impl ResourceSchema for NoteSchema {
    type Record = Note;
    type Draft = NoteDraft;

    const RESOURCE: Resource = Resource::Notes;

    fn collection(&self) -> ResourcePath {
        ResourcePath::new("services")
            .child(self.service_id.as_str())
            .child("notes")
    }

    fn envelope(&self) -> Option<&'static str> {
        Some("notes")
    }

    fn page_size(&self) -> PageSize {
        PageSize::new(NOTES_PAGE_SIZE).unwrap_or_default()
    }

    fn record_id(record: &Note) -> &str {
        &record.id
    }

    fn order(&self, records: &mut [Note]) {
        // Newest first; undated notes sink to the bottom.
        records.sort_by(|a, b| {
            (b.effective_date(), b.created_at).cmp(&(a.effective_date(), a.created_at))
        });
    }

    fn record_date(record: &Note) -> Option<NaiveDate> {
        record.note_date
    }

    fn search_text(record: &Note) -> String {
        record.description.clone()
    }

    fn validate(&self, draft: &NoteDraft, _target: &EditTarget) -> Result<(), ValidationError> {
        require_text(&draft.description, "Note description required")
    }

    fn delete_prompt(_record: &Note) -> String {
        "Delete this note?".to_owned()
    }
}

/// User accounts: `users`, keyed by username.
#[derive(Debug, Clone, Copy, Default)]
pub struct UserSchema;

impl ResourceSchema for UserSchema {
    type Record = UserAccount;
    type Draft = UserDraft;

    const RESOURCE: Resource = Resource::User;

    fn collection(&self) -> ResourcePath {
        ResourcePath::new("users")
    }

    fn record_id(record: &UserAccount) -> &str {
        &record.username
    }

    fn search_text(record: &UserAccount) -> String {
        format!("{} {} {}", record.username, record.display_name, record.emp_id)
    }

    fn validate(&self, draft: &UserDraft, target: &EditTarget) -> Result<(), ValidationError> {
        require_text(&draft.username, "Username is required")?;
        if *target == EditTarget::New {
            require_text(draft.emp_name.as_deref().unwrap_or_default(), "Employee name is required")?;
            require_text(draft.emp_id.as_deref().unwrap_or_default(), "Employee ID is required")?;
            let password = draft.password.as_ref().map(|p| p.as_str()).unwrap_or_default();
            if password.is_empty() {
                return Err(ValidationError::new("Password is required for new users"));
            }
        }
        Ok(())
    }

    fn status_body(&self, enabled: bool) -> Option<Value> {
        Some(json!({ "enabled": enabled }))
    }

    fn delete_prompt(record: &UserAccount) -> String {
        format!(
            "Delete user {}? This action cannot be undone.",
            record.username
        )
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use crate::domain::records::SetupFee;
    use rstest::rstest;
    use zeroize::Zeroizing;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("date")
    }

    #[rstest]
    fn nested_collections_address_the_service() {
        let service = Service {
            id: "SV-7".to_owned(),
            ..Service::default()
        };
        assert_eq!(
            StatementSchema::for_service(&service).collection().to_string(),
            "services/SV-7/statements"
        );
        assert_eq!(
            NoteSchema::for_service("SV-7").record_path("3").to_string(),
            "services/SV-7/notes/3"
        );
        assert_eq!(NoteSchema::for_service("SV-7").page_size().get(), NOTES_PAGE_SIZE);
    }

    #[rstest]
    fn statement_validation_applies_the_start_date() {
        let service = Service {
            id: "SV-1".to_owned(),
            start_date: Some(day(2024, 1, 10)),
            ..Service::default()
        };
        let schema = StatementSchema::for_service(&service);
        let mut draft = StatementDraft {
            date: day(2024, 1, 9),
            description: "Pension Setup".to_owned(),
            credit: rust_decimal::Decimal::ZERO,
            debit: rust_decimal::Decimal::ONE,
            entered_by: String::new(),
        };
        assert_eq!(
            schema.validate(&draft, &EditTarget::New),
            Err(ValidationError::new(BEFORE_START_MESSAGE))
        );
        draft.date = day(2024, 1, 10);
        assert_eq!(schema.validate(&draft, &EditTarget::New), Ok(()));
    }

    #[rstest]
    fn notes_order_newest_first_with_undated_last() {
        let mut notes = Note::list_from_value(
            &serde_json::json!([
                { "id": "old", "note_date": "2024-01-01" },
                { "id": "none" },
                { "id": "new", "note_date": "2024-03-01" },
                { "id": "created", "created_at": "2024-02-01T00:00:00" }
            ]),
            None,
        );
        NoteSchema::for_service("SV-1").order(&mut notes);
        let ids: Vec<&str> = notes.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, ["new", "created", "old", "none"]);
    }

    #[rstest]
    #[case::create_without_password(EditTarget::New, None, false)]
    #[case::create_with_password(EditTarget::New, Some("pw"), true)]
    #[case::update_without_password(EditTarget::Existing("amy".to_owned()), None, true)]
    fn user_passwords_are_required_on_create(
        #[case] target: EditTarget,
        #[case] password: Option<&str>,
        #[case] ok: bool,
    ) {
        let draft = UserDraft {
            username: "amy".to_owned(),
            emp_name: Some("Amy".to_owned()),
            emp_id: Some("E1".to_owned()),
            password: password.map(|p| Zeroizing::new(p.to_owned())),
            ..UserDraft::default()
        };
        assert_eq!(UserSchema.validate(&draft, &target).is_ok(), ok);
    }

    #[rstest]
    #[case(true, serde_json::json!({ "status": "Enabled" }))]
    #[case(false, serde_json::json!({ "status": "Disabled" }))]
    fn council_status_bodies(#[case] enabled: bool, #[case] body: Value) {
        assert_eq!(CouncilSchema.status_body(enabled), Some(body));
        assert_eq!(ClientSchema.status_body(enabled), None);
    }

    #[rstest]
    fn service_validation_reports_the_first_missing_field() {
        let draft = Service {
            client_id: "0000000001".to_owned(),
            reference: "YI-1".to_owned(),
            start_date: Some(day(2024, 1, 1)),
            service_type: "Payroll Only".to_owned(),
            setup_fee: SetupFee::Unspecified,
            ..Service::default()
        };
        assert_eq!(
            ServiceSchema.validate(&draft, &EditTarget::New),
            Err(ValidationError::new("Setup Fee is required"))
        );
    }

    #[rstest]
    #[tokio::test]
    async fn statement_schema_fetch_reads_the_service_start() {
        use std::sync::Arc;

        use crate::domain::ports::{FixtureFeedback, MockResourceApi};
        use crate::domain::session::{AuthorizationContext, SessionUser};

        let mut api = MockResourceApi::new();
        api.expect_get()
            .withf(|path| path.to_string() == "services/SV-7")
            .times(1)
            .returning(|_| Ok(json!({ "serviceId": "SV-7", "startDate": "01/03/2024" })));
        let context = AuthorizationContext::for_user(SessionUser::super_admin("root"));
        let gate = ActionGate::new(Arc::new(context), Arc::new(FixtureFeedback));

        let (schema, service) = StatementSchema::fetch(&api, &gate, "SV-7").await.expect("fetch");

        assert_eq!(schema.service_id(), "SV-7");
        assert_eq!(service.start_date, Some(day(2024, 3, 1)));
    }

    #[rstest]
    #[tokio::test]
    async fn enabled_councils_need_council_view() {
        use std::sync::Arc;

        use crate::domain::permissions::PermissionMap;
        use crate::domain::ports::{FixtureFeedback, MockResourceApi};
        use crate::domain::session::{AuthorizationContext, SessionUser};

        let mut api = MockResourceApi::new();
        api.expect_get().never();
        let context = AuthorizationContext::for_user(SessionUser::staff("amy", PermissionMap::empty()));
        let gate = ActionGate::new(Arc::new(context), Arc::new(FixtureFeedback));

        let err = CouncilSchema::enabled(&api, &gate).await.expect_err("denied");
        assert!(matches!(err, PanelError::Denied(_)));
    }
}
