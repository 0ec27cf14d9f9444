//! Behaviour tests for statement paging and date filtering.
//!
//! These scenarios drive the statements panel over a recorded API and check
//! the page label the operator sees.

use std::cell::RefCell;
use std::sync::Arc;

use care_console::domain::records::Service;
use care_console::domain::{
    AuthorizationContext, ActionGate, RecordFilter, ResourcePanel, SessionUser, StatementSchema,
    parse_flexible_date,
};
use care_console::test_support::{RecordingResourceApi, ScriptedFeedback};
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use serde_json::{Value, json};
use tokio::runtime::Builder;

const SERVICE_ID: &str = "SV-0000000001-1";

struct PagingWorld {
    api: Arc<RecordingResourceApi>,
    panel: RefCell<Option<ResourcePanel<StatementSchema>>>,
}

impl PagingWorld {
    fn new() -> Self {
        Self {
            api: Arc::new(RecordingResourceApi::new()),
            panel: RefCell::new(None),
        }
    }

    fn serve(&self, statements: Vec<Value>) {
        self.api.serve(
            &format!("services/{SERVICE_ID}/statements"),
            json!({ "statements": statements }),
        );
    }

    fn with_panel<T>(&self, f: impl FnOnce(&mut ResourcePanel<StatementSchema>) -> T) -> T {
        let mut panel = self.panel.borrow_mut();
        f(panel.as_mut().expect("statements panel loaded"))
    }
}

#[fixture]
fn world() -> PagingWorld {
    PagingWorld::new()
}

#[given("a service with {count} statements")]
fn a_service_with_statements(world: &PagingWorld, count: usize) {
    let statements = (1..=count)
        .map(|n| json!({ "_id": n.to_string(), "description": format!("Line {n}"), "credit": 1, "debit": 0 }))
        .collect();
    world.serve(statements);
}

#[given("a service with statements dated {dates}")]
fn a_service_with_statements_dated(world: &PagingWorld, dates: String) {
    let statements = dates
        .split(',')
        .map(str::trim)
        .enumerate()
        .map(|(n, date)| json!({ "_id": n.to_string(), "date": date, "description": "Fee", "debit": 10 }))
        .collect();
    world.serve(statements);
}

#[when("the statements panel loads")]
fn the_statements_panel_loads(world: &PagingWorld) {
    let service = Service {
        id: SERVICE_ID.to_owned(),
        ..Service::default()
    };
    let context = AuthorizationContext::for_user(SessionUser::super_admin("root"));
    let gate = ActionGate::new(Arc::new(context), Arc::new(ScriptedFeedback::default()));
    let mut panel = ResourcePanel::new(
        StatementSchema::for_service(&service),
        Arc::clone(&world.api) as _,
        gate,
    );
    Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("runtime")
        .block_on(panel.load())
        .expect("statements load");
    *world.panel.borrow_mut() = Some(panel);
}

#[when("the operator moves to the next page {times} times")]
fn the_operator_moves_to_the_next_page(world: &PagingWorld, times: usize) {
    world.with_panel(|panel| {
        for _ in 0..times {
            assert!(panel.next_page(), "next page should move");
        }
    });
}

#[when("the operator filters from {from} to {to}")]
fn the_operator_filters(world: &PagingWorld, from: String, to: String) {
    let filter = RecordFilter::dates(parse_flexible_date(&from), parse_flexible_date(&to));
    world.with_panel(|panel| panel.apply_filter(filter));
}

#[then("the page label reads {label}")]
fn the_page_label_reads(world: &PagingWorld, label: String) {
    assert_eq!(world.with_panel(|panel| panel.label()), label);
}

#[then("moving to the next page changes nothing")]
fn moving_to_the_next_page_changes_nothing(world: &PagingWorld) {
    world.with_panel(|panel| {
        let before = panel.window();
        assert!(!panel.next_page());
        assert_eq!(panel.window(), before);
    });
}

#[then("{count} statements are visible")]
fn statements_are_visible(world: &PagingWorld, count: usize) {
    assert_eq!(world.with_panel(|panel| panel.visible().len()), count);
}

#[scenario(
    path = "tests/features/statement_paging.feature",
    name = "Two hundred and fifty statements span three pages"
)]
fn statements_span_three_pages(world: PagingWorld) {
    drop(world);
}

#[scenario(
    path = "tests/features/statement_paging.feature",
    name = "The date filter keeps both boundary days"
)]
fn the_date_filter_keeps_both_boundary_days(world: PagingWorld) {
    drop(world);
}
