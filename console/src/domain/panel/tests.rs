//! Regression coverage for this module.

use std::sync::{Arc, Mutex};

use chrono::NaiveDate;
use mockall::Sequence;
use rstest::{fixture, rstest};
use rust_decimal::Decimal;
use serde_json::{Value, json};

use super::*;
use crate::domain::date_filter::RecordFilter;
use crate::domain::permissions::{ActionSet, PermissionMap};
use crate::domain::ports::{MockResourceApi, MockUserFeedback};
use crate::domain::records::{Client, CouncilDraft, Service, StatementDraft};
use crate::domain::session::{AuthorizationContext, SessionUser};
use crate::test_support::{RecordingResourceApi, ScriptedFeedback, staff_gate};

fn gate(map: PermissionMap, feedback: MockUserFeedback) -> ActionGate {
    let ctx = AuthorizationContext::for_user(SessionUser::staff("amy", map));
    ActionGate::new(Arc::new(ctx), Arc::new(feedback))
}

fn only(resource: Resource, actions: &[Action]) -> PermissionMap {
    let set = actions
        .iter()
        .fold(ActionSet::NONE, |set, action| set.with(*action, true));
    PermissionMap::empty().with(resource, set)
}

fn quiet() -> MockUserFeedback {
    let mut feedback = MockUserFeedback::new();
    feedback.expect_alert().never();
    feedback
}

#[fixture]
fn clients() -> Value {
    json!([
        { "id": "0000000001", "first_name": "Ada", "last_name": "Byron" },
        { "client_id": "0000000002", "firstName": "Alan", "lastName": "Turing" }
    ])
}

fn statements(count: usize) -> Value {
    let start = NaiveDate::from_ymd_opt(2024, 1, 1).expect("date");
    let rows: Vec<Value> = (0..count)
        .map(|n| {
            let date = start + chrono::Days::new(u64::try_from(n).expect("small"));
            json!({ "_id": format!("st-{n}"), "date": date.to_string(), "description": "Monthly Fee", "debit": "10.00" })
        })
        .collect();
    json!({ "statements": rows })
}

#[rstest]
#[tokio::test]
async fn denied_edit_makes_no_api_call(clients: Value) {
    let mut api = MockResourceApi::new();
    api.expect_get().times(1).return_once(move |_| Ok(clients));
    api.expect_put().never();
    let mut feedback = MockUserFeedback::new();
    feedback
        .expect_alert()
        .withf(|message| message == "Access denied: you do not have permission to edit client.")
        .times(1)
        .return_const(());
    let mut panel = ResourcePanel::new(
        ClientSchema,
        Arc::new(api),
        gate(only(Resource::Client, &[Action::View]), feedback),
    );

    panel.load().await.expect("load");
    let err = panel.begin_edit("0000000001").expect_err("edit is denied");

    assert!(matches!(err, PanelError::Denied(_)));
    assert_eq!(panel.mode(), &PanelMode::Listing);
    assert_eq!(panel.page_rows().len(), 2);
}

#[rstest]
#[tokio::test]
async fn validation_failure_sends_nothing() {
    let mut api = MockResourceApi::new();
    api.expect_post().never();
    let mut feedback = MockUserFeedback::new();
    feedback
        .expect_alert()
        .withf(|message| message == "Council name is required")
        .times(1)
        .return_const(());
    let mut panel = ResourcePanel::new(
        CouncilSchema,
        Arc::new(api),
        gate(only(Resource::Council, &[Action::Add]), feedback),
    );

    panel.begin_add().expect("add permitted");
    let err = panel
        .save(&CouncilDraft::default())
        .await
        .expect_err("blank name");

    assert!(matches!(err, PanelError::Validation(_)));
    assert_eq!(
        panel.mode(),
        &PanelMode::Editing {
            target: EditTarget::New
        }
    );
}

#[rstest]
#[tokio::test]
async fn declined_delete_sends_nothing(clients: Value) {
    let mut api = MockResourceApi::new();
    api.expect_get().times(1).return_once(move |_| Ok(clients));
    api.expect_delete().never();
    let mut feedback = MockUserFeedback::new();
    feedback.expect_alert().never();
    feedback
        .expect_confirm()
        .withf(|prompt| prompt.starts_with("This action cannot be undone."))
        .times(1)
        .return_const(false);
    let mut panel = ResourcePanel::new(
        ClientSchema,
        Arc::new(api),
        gate(
            only(Resource::Client, &[Action::View, Action::Delete]),
            feedback,
        ),
    );

    panel.load().await.expect("load");
    let deleted = panel.delete("0000000002").await.expect("no failure");

    assert!(!deleted);
    assert_eq!(panel.records().len(), 2);
}

#[rstest]
#[tokio::test]
async fn statement_add_jumps_to_the_last_page() {
    let mut seq = Sequence::new();
    let mut api = MockResourceApi::new();
    api.expect_get()
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_| Ok(statements(250)));
    api.expect_post()
        .withf(|path, body| {
            path.to_string() == "services/SV-1/statements" && body["debit"] == json!(10.0)
        })
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_, _| Ok(json!({ "message": "Statement added" })));
    api.expect_get()
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_| Ok(statements(251)));
    let pages = Arc::new(Mutex::new(Vec::new()));
    let seen = Arc::clone(&pages);
    let service = Service {
        id: "SV-1".to_owned(),
        start_date: NaiveDate::from_ymd_opt(2024, 1, 1),
        ..Service::default()
    };
    let mut panel = ResourcePanel::with_page_listener(
        StatementSchema::for_service(&service),
        Arc::new(api),
        gate(
            only(Resource::Statement, &[Action::View, Action::Add]),
            quiet(),
        ),
        Box::new(move |window| {
            if let Ok(mut pages) = seen.lock() {
                pages.push(window.page());
            }
        }),
    );

    panel.load().await.expect("load");
    assert_eq!(panel.label(), "Rows 1-100 of 250");
    panel.begin_add().expect("add permitted");
    let draft = StatementDraft {
        date: NaiveDate::from_ymd_opt(2024, 9, 8).expect("date"),
        description: "Monthly Fee".to_owned(),
        credit: Decimal::ZERO,
        debit: Decimal::TEN,
        entered_by: "amy".to_owned(),
    };
    panel.save(&draft).await.expect("saved");

    assert_eq!(panel.window().page(), 3);
    assert_eq!(panel.label(), "Rows 201-251 of 251");
    assert_eq!(panel.mode(), &PanelMode::Listing);
    assert_eq!(*pages.lock().expect("pages"), vec![1, 1, 3]);
}

#[rstest]
#[tokio::test]
async fn failed_load_alerts_and_keeps_the_prior_mode(clients: Value) {
    let mut seq = Sequence::new();
    let mut api = MockResourceApi::new();
    api.expect_get()
        .times(1)
        .in_sequence(&mut seq)
        .return_once(move |_| Ok(clients));
    api.expect_get()
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_| Err(ApiError::transport("connection refused")));
    let mut feedback = MockUserFeedback::new();
    feedback
        .expect_alert()
        .withf(|message| message == "API request failed: connection refused")
        .times(1)
        .return_const(());
    let mut panel = ResourcePanel::new(
        ClientSchema,
        Arc::new(api),
        gate(only(Resource::Client, &[Action::View]), feedback),
    );

    panel.load().await.expect("first load");
    panel.view("0000000002").expect("viewable");
    let err = panel.load().await.expect_err("second load fails");

    assert!(matches!(err, PanelError::Api(_)));
    assert_eq!(
        panel.mode(),
        &PanelMode::Viewing {
            id: "0000000002".to_owned()
        }
    );
    assert_eq!(panel.records().len(), 2);
}

#[rstest]
#[tokio::test]
async fn filters_reset_to_the_first_page() {
    let mut api = MockResourceApi::new();
    api.expect_get().returning(|_| Ok(statements(250)));
    let service = Service {
        id: "SV-1".to_owned(),
        ..Service::default()
    };
    let mut panel = ResourcePanel::new(
        StatementSchema::for_service(&service),
        Arc::new(api),
        gate(only(Resource::Statement, &[Action::View]), quiet()),
    );

    panel.load().await.expect("load");
    panel.go_to_page(3);
    let window = panel.apply_filter(RecordFilter::dates(
        NaiveDate::from_ymd_opt(2024, 1, 10),
        NaiveDate::from_ymd_opt(2024, 1, 19),
    ));

    assert_eq!(window.page(), 1);
    assert_eq!(window.total_items(), 10);
    assert_eq!(panel.ledger().summary.total_debit, Decimal::new(100, 0));
    assert_eq!(panel.clear_filter().total_items(), 250);
}

#[rstest]
#[tokio::test]
async fn user_status_is_patched_with_the_enabled_flag() {
    let mut api = MockResourceApi::new();
    api.expect_get()
        .returning(|_| Ok(json!([{ "username": "bob", "enabled": true }])));
    api.expect_patch()
        .withf(|path, body| path.to_string() == "users/bob/status" && *body == json!({ "enabled": false }))
        .times(1)
        .returning(|_, _| Ok(json!({ "message": "ok" })));
    let mut panel = ResourcePanel::new(
        UserSchema,
        Arc::new(api),
        gate(only(Resource::User, &[Action::View, Action::Edit]), quiet()),
    );

    panel.load().await.expect("load");
    panel.set_enabled("bob", false).await.expect("patched");
}

#[rstest]
#[tokio::test]
async fn clients_have_no_status_toggle() {
    let mut api = MockResourceApi::new();
    api.expect_patch().never();
    let mut feedback = MockUserFeedback::new();
    feedback.expect_alert().times(1).return_const(());
    let mut panel = ResourcePanel::new(
        ClientSchema,
        Arc::new(api),
        gate(only(Resource::Client, &[Action::Edit]), feedback),
    );

    let err = panel.set_enabled("1", true).await.expect_err("no status");
    assert!(matches!(err, PanelError::Validation(_)));
}

#[rstest]
#[tokio::test]
async fn save_outside_the_editor_is_rejected() {
    let api = MockResourceApi::new();
    let mut panel = ResourcePanel::new(
        ClientSchema,
        Arc::new(api),
        gate(PermissionMap::all(), quiet()),
    );

    let err = panel
        .save(&Client::default())
        .await
        .expect_err("not editing");
    assert_eq!(err.to_string(), "cannot save while loading");
}

#[rstest]
#[tokio::test]
async fn reload_failure_after_a_create_still_reports_success() {
    let mut seq = Sequence::new();
    let mut api = MockResourceApi::new();
    api.expect_post()
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_, _| Ok(json!({ "message": "Council created" })));
    api.expect_get()
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_| Err(ApiError::transport("connection reset")));
    let mut feedback = MockUserFeedback::new();
    feedback
        .expect_alert()
        .withf(|message| message == "API request failed: connection reset")
        .times(1)
        .return_const(());
    let mut panel = ResourcePanel::new(
        CouncilSchema,
        Arc::new(api),
        gate(only(Resource::Council, &[Action::View, Action::Add]), feedback),
    );

    panel.begin_add().expect("add permitted");
    let draft = CouncilDraft {
        name: "Leeds City Council".to_owned(),
        ..CouncilDraft::default()
    };
    let response = panel.save(&draft).await.expect("the council was created");

    assert_eq!(response["message"], "Council created");
    assert_eq!(panel.mode(), &PanelMode::Listing);
    assert!(panel.is_stale());
}

fn named_client(first: &str, last: &str) -> Client {
    Client {
        first_name: first.to_owned(),
        last_name: last.to_owned(),
        ..Client::default()
    }
}

#[rstest]
#[case::create(None, EditTarget::New)]
#[case::update(
    Some("0000000001"),
    EditTarget::Existing("0000000001".to_owned())
)]
#[tokio::test]
async fn failed_saves_keep_the_editor_open(
    clients: Value,
    #[case] existing: Option<&str>,
    #[case] target: EditTarget,
) {
    let api = Arc::new(RecordingResourceApi::new());
    api.serve("clients", clients);
    let feedback = Arc::new(ScriptedFeedback::default());
    let mut panel = ResourcePanel::new(
        ClientSchema,
        Arc::clone(&api) as Arc<dyn ResourceApi>,
        staff_gate(PermissionMap::all(), Arc::clone(&feedback)),
    );

    panel.load().await.expect("load");
    match existing {
        Some(id) => {
            panel.begin_edit(id).expect("edit permitted");
        }
        None => panel.begin_add().expect("add permitted"),
    }
    api.fail_next(ApiError::rejected(422_u16, "Email already registered"));
    let err = panel
        .save(&named_client("Grace", "Hopper"))
        .await
        .expect_err("write rejected");

    assert!(matches!(err, PanelError::Api(ApiError::Rejected { status: 422, .. })));
    assert_eq!(panel.mode(), &PanelMode::Editing { target });
    assert_eq!(feedback.alerts().len(), 1);
    assert_eq!(api.writes().len(), 1);
    assert!(!panel.is_stale());
}

#[rstest]
#[tokio::test]
async fn failed_delete_keeps_the_list(clients: Value) {
    let api = Arc::new(RecordingResourceApi::new());
    api.serve("clients", clients);
    let feedback = Arc::new(ScriptedFeedback::answering([true]));
    let mut panel = ResourcePanel::new(
        ClientSchema,
        Arc::clone(&api) as Arc<dyn ResourceApi>,
        staff_gate(PermissionMap::all(), Arc::clone(&feedback)),
    );

    panel.load().await.expect("load");
    api.fail_next(ApiError::transport("connection reset"));
    let err = panel.delete("0000000002").await.expect_err("delete fails");

    assert!(matches!(err, PanelError::Api(ApiError::Transport { .. })));
    assert_eq!(panel.mode(), &PanelMode::Listing);
    assert_eq!(panel.records().len(), 2);
    assert_eq!(feedback.prompts().len(), 1);
    assert_eq!(
        feedback.alerts(),
        vec!["API request failed: connection reset".to_owned()]
    );
    let writes = api.writes();
    assert_eq!(writes.len(), 1);
    assert_eq!(writes.first().map(|call| call.method), Some("DELETE"));
}

#[rstest]
#[tokio::test]
async fn failed_status_change_keeps_the_prior_mode() {
    let api = Arc::new(RecordingResourceApi::new());
    api.serve("users", json!([{ "username": "bob", "enabled": true }]));
    let feedback = Arc::new(ScriptedFeedback::default());
    let mut panel = ResourcePanel::new(
        UserSchema,
        Arc::clone(&api) as Arc<dyn ResourceApi>,
        staff_gate(PermissionMap::all(), Arc::clone(&feedback)),
    );

    panel.load().await.expect("load");
    panel.view("bob").expect("viewable");
    api.fail_next(ApiError::forbidden("Cannot disable yourself"));
    let err = panel.set_enabled("bob", false).await.expect_err("refused");

    assert!(matches!(err, PanelError::Api(ApiError::Forbidden { .. })));
    assert_eq!(
        panel.mode(),
        &PanelMode::Viewing {
            id: "bob".to_owned()
        }
    );
    assert_eq!(feedback.alerts().len(), 1);
}
