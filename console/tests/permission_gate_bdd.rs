//! Behaviour tests for permission-gated panel actions.
//!
//! These scenarios check that the action gate refuses denied actions before
//! any request is sent, and that super administrators bypass the map.

use std::cell::RefCell;
use std::future::Future;
use std::sync::Arc;

use care_console::domain::records::Client;
use care_console::domain::{
    Action, ActionGate, ActionSet, AuthorizationContext, ClientSchema, PanelError, PermissionMap,
    Resource, ResourcePanel, SessionUser,
};
use care_console::test_support::{RecordingResourceApi, ScriptedFeedback, staff_gate};
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use serde_json::json;
use tokio::runtime::Builder;

struct GateWorld {
    api: Arc<RecordingResourceApi>,
    feedback: RefCell<Arc<ScriptedFeedback>>,
    gate: RefCell<Option<ActionGate>>,
    outcome: RefCell<Option<Result<bool, PanelError>>>,
}

impl GateWorld {
    fn new() -> Self {
        Self {
            api: Arc::new(RecordingResourceApi::new()),
            feedback: RefCell::new(Arc::new(ScriptedFeedback::default())),
            gate: RefCell::new(None),
            outcome: RefCell::new(None),
        }
    }

    fn sign_in(&self, user: SessionUser, feedback: ScriptedFeedback) {
        let feedback = Arc::new(feedback);
        let context = AuthorizationContext::for_user(user);
        let gate = ActionGate::new(Arc::new(context), Arc::clone(&feedback) as _);
        *self.feedback.borrow_mut() = feedback;
        *self.gate.borrow_mut() = Some(gate);
    }

    fn panel(&self) -> ResourcePanel<ClientSchema> {
        let gate = self.gate.borrow().clone().expect("signed in");
        ResourcePanel::new(ClientSchema, Arc::clone(&self.api) as _, gate)
    }

    fn record(&self, outcome: Result<bool, PanelError>) {
        *self.outcome.borrow_mut() = Some(outcome);
    }
}

fn block_on<F: Future>(future: F) -> F::Output {
    Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("runtime")
        .block_on(future)
}

#[fixture]
fn world() -> GateWorld {
    GateWorld::new()
}

#[given("a staff user who may view but not edit clients")]
fn a_staff_user_who_may_view_clients(world: &GateWorld) {
    let feedback = Arc::new(ScriptedFeedback::default());
    let map = PermissionMap::empty().with(Resource::Client, ActionSet::NONE.with(Action::View, true));
    *world.gate.borrow_mut() = Some(staff_gate(map, Arc::clone(&feedback)));
    *world.feedback.borrow_mut() = feedback;
}

#[given("a super administrator")]
fn a_super_administrator(world: &GateWorld) {
    world.sign_in(SessionUser::super_admin("root"), ScriptedFeedback::default());
}

#[given("a super administrator who declines every prompt")]
fn a_super_administrator_who_declines(world: &GateWorld) {
    world.sign_in(
        SessionUser::super_admin("root"),
        ScriptedFeedback::answering([false]),
    );
}

#[given("the API lists client {id}")]
fn the_api_lists_client(world: &GateWorld, id: String) {
    world.api.serve(
        "clients",
        json!([{ "id": id, "first_name": "Ada", "last_name": "Lovelace" }]),
    );
}

#[when("the operator saves an edit to client {id}")]
fn the_operator_saves_an_edit(world: &GateWorld, id: String) {
    let mut panel = world.panel();
    let outcome = block_on(async {
        panel.load().await?;
        panel.begin_edit(&id)?;
        let draft = Client {
            id: id.clone(),
            first_name: "Ada".to_owned(),
            last_name: "King".to_owned(),
            ..Client::default()
        };
        panel.save(&draft).await.map(|_| true)
    });
    world.record(outcome);
}

#[when("the operator deletes client {id}")]
fn the_operator_deletes_client(world: &GateWorld, id: String) {
    let mut panel = world.panel();
    let outcome = block_on(async {
        panel.load().await?;
        panel.delete(&id).await
    });
    world.record(outcome);
}

#[then("the operator sees the alert {message}")]
fn the_operator_sees_the_alert(world: &GateWorld, message: String) {
    assert_eq!(world.feedback.borrow().alerts(), vec![message]);
    let outcome = world.outcome.borrow();
    assert!(matches!(
        outcome.as_ref().expect("outcome"),
        Err(PanelError::Denied(_))
    ));
}

#[then("no write request was sent")]
fn no_write_request_was_sent(world: &GateWorld) {
    assert!(world.api.writes().is_empty(), "{:?}", world.api.writes());
}

#[then("one write request was sent to {path}")]
fn one_write_request_was_sent(world: &GateWorld, path: String) {
    let writes = world.api.writes();
    assert_eq!(writes.len(), 1, "{writes:?}");
    assert_eq!(writes.first().map(|call| call.path.as_str()), Some(path.as_str()));
}

#[then("the operator was asked to confirm once")]
fn the_operator_was_asked_to_confirm_once(world: &GateWorld) {
    assert_eq!(world.feedback.borrow().prompts().len(), 1);
    let outcome = world.outcome.borrow();
    assert!(matches!(outcome.as_ref().expect("outcome"), Ok(false)));
}

#[scenario(
    path = "tests/features/permission_gate.feature",
    name = "A denied client edit makes no request"
)]
fn a_denied_client_edit_makes_no_request(world: GateWorld) {
    drop(world);
}

#[scenario(
    path = "tests/features/permission_gate.feature",
    name = "A super administrator passes every check"
)]
fn a_super_administrator_passes_every_check(world: GateWorld) {
    drop(world);
}

#[scenario(
    path = "tests/features/permission_gate.feature",
    name = "A declined delete sends nothing"
)]
fn a_declined_delete_sends_nothing(world: GateWorld) {
    drop(world);
}
