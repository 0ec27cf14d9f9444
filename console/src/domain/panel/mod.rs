//! Generic list/view/edit panel shared by every resource.
//!
//! A [`ResourcePanel`] owns the cached collection, the filtered view and the
//! pager for one [`ResourceSchema`]. Every row action passes the
//! [`ActionGate`] before the API is touched, and every failure is reported to
//! the operator through the gate's [`crate::domain::ports::UserFeedback`]
//! before it is returned.

mod schema;
mod schemas;

use std::fmt;
use std::sync::Arc;

use pagination::{PageWindow, Pager, paginate};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

pub use schema::{EditTarget, PageAnchor, ResourceSchema, ValidationError, require_text};
pub use schemas::{
    ClientSchema, CouncilSchema, NOTES_PAGE_SIZE, NoteSchema, ServiceSchema, StatementSchema,
    UserSchema,
};

use super::Error;
use super::date_filter::RecordFilter;
use super::gate::{ActionGate, Denial};
use super::ledger::Ledger;
use super::permissions::{Action, Resource};
use super::ports::{ApiError, Download, ExportApi, ExportRequest, ResourceApi};
use super::records::{ApiRecord, Statement};

/// Callback receiving every page change.
pub type PageListener = Box<dyn FnMut(&PageWindow) + Send + Sync>;

/// Where the panel is in its `Loading → Listing ⇄ {Viewing, Editing}` cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum PanelMode {
    /// Nothing has been loaded yet, or a load is in flight.
    Loading,
    /// Showing the current page.
    Listing,
    /// Showing one record.
    Viewing {
        /// Record identifier.
        id: String,
    },
    /// Editing a new or existing record.
    Editing {
        /// Record being edited.
        target: EditTarget,
    },
}

impl PanelMode {
    const fn name(&self) -> &'static str {
        match self {
            Self::Loading => "loading",
            Self::Listing => "listing",
            Self::Viewing { .. } => "viewing",
            Self::Editing { .. } => "editing",
        }
    }
}

/// Failures of panel operations.
#[derive(Debug, thiserror::Error)]
pub enum PanelError {
    /// The gate refused the action.
    #[error(transparent)]
    Denied(#[from] Denial),
    /// The API call failed.
    #[error(transparent)]
    Api(#[from] ApiError),
    /// The draft failed validation; nothing was sent.
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// The operation does not apply in the current mode.
    #[error("cannot {operation} while {mode}")]
    InvalidMode {
        /// Operation attempted.
        operation: &'static str,
        /// Mode the panel was in.
        mode: &'static str,
    },
    /// No cached record has this identifier.
    #[error("no {resource} record with id `{id}`")]
    UnknownRecord {
        /// Panel resource.
        resource: Resource,
        /// Identifier requested.
        id: String,
    },
    /// The draft could not be encoded as JSON.
    #[error("could not encode the {resource} payload: {message}")]
    Payload {
        /// Panel resource.
        resource: Resource,
        /// Encoder failure.
        message: String,
    },
}

impl From<PanelError> for Error {
    fn from(err: PanelError) -> Self {
        match err {
            PanelError::Denied(denial) => Error::forbidden(denial.to_string()).with_details(
                serde_json::json!({ "resource": denial.resource, "action": denial.action }),
            ),
            PanelError::Api(api) => api.into(),
            PanelError::Validation(invalid) => Error::invalid_request(invalid.to_string()),
            err @ PanelError::InvalidMode { .. } => Error::invalid_request(err.to_string()),
            err @ PanelError::UnknownRecord { .. } => Error::not_found(err.to_string()),
            err @ PanelError::Payload { .. } => Error::internal(err.to_string()),
        }
    }
}

/// List/view/edit state for one resource.
pub struct ResourcePanel<S: ResourceSchema> {
    schema: S,
    api: Arc<dyn ResourceApi>,
    gate: ActionGate,
    records: Vec<S::Record>,
    visible: Vec<usize>,
    filter: RecordFilter,
    pager: Pager<PageListener>,
    mode: PanelMode,
    stale: bool,
}

impl<S: ResourceSchema + fmt::Debug> fmt::Debug for ResourcePanel<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourcePanel")
            .field("schema", &self.schema)
            .field("records", &self.records.len())
            .field("visible", &self.visible.len())
            .field("filter", &self.filter)
            .field("window", &self.pager.window())
            .field("mode", &self.mode)
            .field("stale", &self.stale)
            .finish_non_exhaustive()
    }
}

impl<S: ResourceSchema> ResourcePanel<S> {
    /// Empty panel in [`PanelMode::Loading`].
    pub fn new(schema: S, api: Arc<dyn ResourceApi>, gate: ActionGate) -> Self {
        Self::with_page_listener(schema, api, gate, Box::new(|_| {}))
    }

    /// Empty panel whose page changes are reported to `listener`.
    ///
    /// The listener sees the initial empty render immediately.
    pub fn with_page_listener(
        schema: S,
        api: Arc<dyn ResourceApi>,
        gate: ActionGate,
        listener: PageListener,
    ) -> Self {
        let pager = paginate(0, schema.page_size(), listener);
        Self {
            schema,
            api,
            gate,
            records: Vec::new(),
            visible: Vec::new(),
            filter: RecordFilter::default(),
            pager,
            mode: PanelMode::Loading,
            stale: false,
        }
    }

    /// Schema in use.
    pub const fn schema(&self) -> &S {
        &self.schema
    }

    /// Current mode.
    pub const fn mode(&self) -> &PanelMode {
        &self.mode
    }

    /// True when a write succeeded but the follow-up reload failed, so the
    /// cached list may be missing that change.
    pub const fn is_stale(&self) -> bool {
        self.stale
    }

    /// Every cached record in display order, ignoring the filter.
    pub fn records(&self) -> &[S::Record] {
        &self.records
    }

    /// Active filter.
    pub const fn filter(&self) -> &RecordFilter {
        &self.filter
    }

    /// Fetch the collection and show page 1.
    ///
    /// # Errors
    ///
    /// Returns [`PanelError::Denied`] without a request when viewing is not
    /// allowed, or [`PanelError::Api`] after alerting; the prior mode is kept.
    pub async fn load(&mut self) -> Result<(), PanelError> {
        self.gate.authorize(S::RESOURCE, Action::View)?;
        self.refresh(Reload::First).await
    }

    /// Open `id` read-only.
    ///
    /// # Errors
    ///
    /// Fails when viewing is denied or the record is not cached.
    pub fn view(&mut self, id: &str) -> Result<&S::Record, PanelError> {
        self.gate.authorize(S::RESOURCE, Action::View)?;
        let index = self.position(id)?;
        self.mode = PanelMode::Viewing { id: id.to_owned() };
        self.records.get(index).ok_or_else(|| self.unknown(id))
    }

    /// Open the editor for a new record.
    ///
    /// # Errors
    ///
    /// Fails when adding is denied.
    pub fn begin_add(&mut self) -> Result<(), PanelError> {
        self.gate.authorize(S::RESOURCE, Action::Add)?;
        self.mode = PanelMode::Editing {
            target: EditTarget::New,
        };
        Ok(())
    }

    /// Open the editor on `id`, returning the record to prefill from.
    ///
    /// # Errors
    ///
    /// Fails when editing is denied or the record is not cached.
    pub fn begin_edit(&mut self, id: &str) -> Result<&S::Record, PanelError> {
        self.gate.authorize(S::RESOURCE, Action::Edit)?;
        let index = self.position(id)?;
        self.mode = PanelMode::Editing {
            target: EditTarget::Existing(id.to_owned()),
        };
        self.records.get(index).ok_or_else(|| self.unknown(id))
    }

    /// Close any viewer or editor.
    pub fn cancel(&mut self) {
        if !matches!(self.mode, PanelMode::Loading) {
            self.mode = PanelMode::Listing;
        }
    }

    /// Submit the open editor.
    ///
    /// Returns the API response body. On success the collection is reloaded
    /// and the panel returns to [`PanelMode::Listing`]; on failure it stays in
    /// the editor. A failed reload after an accepted write is alerted and
    /// marks the list stale but does not fail the save.
    ///
    /// # Errors
    ///
    /// Fails outside the editor, when the gate refuses the editor's action,
    /// when validation fails (nothing is sent) or when the write fails.
    pub async fn save(&mut self, draft: &S::Draft) -> Result<Value, PanelError> {
        let PanelMode::Editing { target } = &self.mode else {
            return Err(PanelError::InvalidMode {
                operation: "save",
                mode: self.mode.name(),
            });
        };
        let target = target.clone();
        let action = match target {
            EditTarget::New => Action::Add,
            EditTarget::Existing(_) => Action::Edit,
        };
        self.gate.authorize(S::RESOURCE, action)?;
        if let Err(err) = self.schema.validate(draft, &target) {
            info!(resource = %S::RESOURCE, reason = %err, "draft rejected");
            self.gate.feedback().alert(&err.to_string());
            return Err(err.into());
        }
        let body = serde_json::to_value(draft).map_err(|err| PanelError::Payload {
            resource: S::RESOURCE,
            message: err.to_string(),
        })?;
        let (sent, anchor) = match &target {
            EditTarget::New => (
                self.api.post(&self.schema.collection(), &body).await,
                self.schema.after_create(),
            ),
            EditTarget::Existing(id) => (
                self.api.put(&self.schema.record_path(id), &body).await,
                PageAnchor::Keep,
            ),
        };
        let response = self.reported(sent)?;
        debug!(resource = %S::RESOURCE, %action, "record saved");
        self.mode = PanelMode::Listing;
        self.reload_after_write(anchor.into()).await;
        Ok(response)
    }

    /// Delete `id` after the operator confirms.
    ///
    /// Returns `false` when the confirmation is declined; nothing is sent.
    ///
    /// # Errors
    ///
    /// Fails when deleting is denied, the record is not cached or the
    /// delete request fails. A failed reload afterwards only marks the list
    /// stale.
    pub async fn delete(&mut self, id: &str) -> Result<bool, PanelError> {
        self.gate.authorize(S::RESOURCE, Action::Delete)?;
        let index = self.position(id)?;
        let prompt = self
            .records
            .get(index)
            .map(S::delete_prompt)
            .ok_or_else(|| self.unknown(id))?;
        if !self.gate.feedback().confirm(&prompt) {
            debug!(resource = %S::RESOURCE, id, "delete declined");
            return Ok(false);
        }
        let sent = self.api.delete(&self.schema.record_path(id)).await;
        self.reported(sent)?;
        info!(resource = %S::RESOURCE, id, "record deleted");
        self.mode = PanelMode::Listing;
        self.reload_after_write(Reload::Keep).await;
        Ok(true)
    }

    /// Enable or disable `id`.
    ///
    /// # Errors
    ///
    /// Fails when editing is denied, the resource has no status, the record
    /// is not cached or the status request fails. A failed reload afterwards
    /// only marks the list stale.
    pub async fn set_enabled(&mut self, id: &str, enabled: bool) -> Result<(), PanelError> {
        self.gate.authorize(S::RESOURCE, Action::Edit)?;
        let Some(body) = self.schema.status_body(enabled) else {
            let err = ValidationError::new(format!("{} records have no status", S::RESOURCE));
            self.gate.feedback().alert(&err.to_string());
            return Err(err.into());
        };
        self.position(id)?;
        let path = self.schema.record_path(id).child("status");
        let sent = self.api.patch(&path, &body).await;
        self.reported(sent)?;
        info!(resource = %S::RESOURCE, id, enabled, "status changed");
        self.reload_after_write(Reload::Keep).await;
        Ok(())
    }

    /// Replace the filter and show page 1 of the matches.
    pub fn apply_filter(&mut self, filter: RecordFilter) -> PageWindow {
        self.filter = filter;
        self.refilter();
        self.pager.reset(self.visible.len(), 1)
    }

    /// Remove the filter and show page 1.
    pub fn clear_filter(&mut self) -> PageWindow {
        self.apply_filter(RecordFilter::default())
    }

    /// Advance one page; returns whether the page changed.
    pub fn next_page(&mut self) -> bool {
        self.pager.next()
    }

    /// Go back one page; returns whether the page changed.
    pub fn previous_page(&mut self) -> bool {
        self.pager.previous()
    }

    /// Jump to `page`, clamped.
    pub fn go_to_page(&mut self, page: usize) -> PageWindow {
        self.pager.go_to(page)
    }

    /// Current page window.
    pub fn window(&self) -> PageWindow {
        self.pager.window()
    }

    /// Pager label, e.g. `Rows 101-200 of 250`.
    pub fn label(&self) -> String {
        self.pager.label()
    }

    /// Records that pass the filter, in display order.
    pub fn visible(&self) -> Vec<&S::Record> {
        self.visible
            .iter()
            .filter_map(|&index| self.records.get(index))
            .collect()
    }

    /// Records on the current page.
    pub fn page_rows(&self) -> Vec<&S::Record> {
        self.pager
            .window()
            .slice(&self.visible)
            .iter()
            .filter_map(|&index| self.records.get(index))
            .collect()
    }

    /// Download a file produced by the API.
    ///
    /// # Errors
    ///
    /// Fails when viewing is denied or the download fails.
    pub async fn export(
        &self,
        exporter: &dyn ExportApi,
        request: &ExportRequest,
    ) -> Result<Download, PanelError> {
        self.gate.authorize(S::RESOURCE, Action::View)?;
        let fetched = exporter.download(request).await;
        self.reported(fetched)
    }

    async fn refresh(&mut self, reload: Reload) -> Result<(), PanelError> {
        let prior = std::mem::replace(&mut self.mode, PanelMode::Loading);
        let body = match self.api.get(&self.schema.collection()).await {
            Ok(body) => body,
            Err(err) => {
                warn!(resource = %S::RESOURCE, error = %err, "load failed");
                self.mode = prior;
                self.gate.feedback().alert(&err.to_string());
                return Err(err.into());
            }
        };
        let mut records = S::Record::list_from_value(&body, self.schema.envelope());
        self.schema.order(&mut records);
        self.records = records;
        self.refilter();
        let total = self.visible.len();
        let window = match reload {
            Reload::First => self.pager.reset(total, 1),
            Reload::Keep => self.pager.set_total_items(total),
            Reload::Last => self.pager.reset(total, usize::MAX),
        };
        self.mode = PanelMode::Listing;
        self.stale = false;
        debug!(
            resource = %S::RESOURCE,
            records = self.records.len(),
            page = window.page(),
            "collection loaded"
        );
        Ok(())
    }

    async fn reload_after_write(&mut self, reload: Reload) {
        if let Err(err) = self.refresh(reload).await {
            warn!(resource = %S::RESOURCE, error = %err, "reload after write failed");
            self.stale = true;
        }
    }

    fn refilter(&mut self) {
        let filter = &self.filter;
        self.visible = self
            .records
            .iter()
            .enumerate()
            .filter(|(_, record)| filter.matches(S::record_date(record), &S::search_text(record)))
            .map(|(index, _)| index)
            .collect();
    }

    fn position(&self, id: &str) -> Result<usize, PanelError> {
        self.records
            .iter()
            .position(|record| S::record_id(record) == id)
            .ok_or_else(|| self.unknown(id))
    }

    fn unknown(&self, id: &str) -> PanelError {
        PanelError::UnknownRecord {
            resource: S::RESOURCE,
            id: id.to_owned(),
        }
    }

    fn reported<T>(&self, result: Result<T, ApiError>) -> Result<T, PanelError> {
        result.map_err(|err| {
            warn!(resource = %S::RESOURCE, error = %err, "request failed");
            self.gate.feedback().alert(&err.to_string());
            PanelError::Api(err)
        })
    }
}

impl ResourcePanel<StatementSchema> {
    /// Running balances and totals over the filtered statements.
    pub fn ledger(&self) -> Ledger {
        let rows: Vec<Statement> = self.visible().into_iter().cloned().collect();
        Ledger::of(&rows)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Reload {
    First,
    Keep,
    Last,
}

impl From<PageAnchor> for Reload {
    fn from(anchor: PageAnchor) -> Self {
        match anchor {
            PageAnchor::Keep => Self::Keep,
            PageAnchor::Last => Self::Last,
        }
    }
}

#[cfg(test)]
mod tests;
