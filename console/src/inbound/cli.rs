//! Command-line front end: argument model and command dispatch.
//!
//! The binary parses [`Cli`], settles the session and hands every other
//! command to [`Console`], which drives one panel per invocation and writes
//! the outcome through a [`Printer`].

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};
use mockable::Clock;
use pagination::PageWindow;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::debug;

use crate::config::ConsoleSettings;
use crate::domain::ledger::{EntryBuilder, StatementEntry};
use crate::domain::ports::{ExportApi, ExportFormat, ExportRequest, ResourceApi};
use crate::domain::records::{KinDraft, PostalAddress};
use crate::domain::{
    Action, ActionGate, ClientSchema, ConsoleResult, CouncilSchema, DateRange, Error, NoteSchema,
    PanelError, RecordFilter, Resource, ResourcePanel, ResourceSchema, ServiceSchema,
    StatementSchema, UserSchema, add_address, add_kin, load_client_profile, parse_flexible_date,
};
use crate::outbound::write_download;

/// `care-console` arguments.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "care-console",
    about = "Permission-gated back office for councils, clients, services and staff",
    version
)]
pub struct Cli {
    /// API base URL; overrides `CARE_CONSOLE_API_BASE_URL`.
    #[arg(long = "api-base-url", value_name = "url", global = true)]
    pub api_base_url: Option<String>,
    /// Session file; overrides `CARE_CONSOLE_SESSION_FILE`.
    #[arg(long = "session-file", value_name = "path", global = true)]
    pub session_file: Option<PathBuf>,
    /// Accept confirmation prompts without asking.
    #[arg(long = "yes", short = 'y', global = true)]
    pub assume_yes: bool,
    /// Print results as JSON documents.
    #[arg(long, global = true)]
    pub json: bool,
    /// Command to run.
    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Fold command-line overrides into `settings`.
    pub fn apply_overrides(&self, settings: &mut ConsoleSettings) {
        if let Some(url) = &self.api_base_url {
            settings.api_base_url = Some(url.clone());
        }
        if let Some(path) = &self.session_file {
            settings.session_file = Some(path.clone());
        }
        settings.assume_yes |= self.assume_yes;
    }
}

/// Top-level commands.
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Sign in and store the session.
    Login {
        /// Account name.
        #[arg(long)]
        username: String,
        /// Password; read from standard input when omitted.
        #[arg(long)]
        password: Option<String>,
    },
    /// Forget the stored session.
    Logout,
    /// Refresh and show the signed-in user.
    Whoami,
    /// Commands that need a signed-in session.
    #[command(flatten)]
    Console(ConsoleCommand),
}

/// Commands run by [`Console`].
#[derive(Debug, Clone, Subcommand)]
pub enum ConsoleCommand {
    /// List one page of a resource.
    List {
        /// Resource to list.
        resource: ResourceKind,
        /// Owning service, for statements and notes.
        #[command(flatten)]
        scope: Scope,
        /// Narrow the list.
        #[command(flatten)]
        filter: FilterArgs,
        /// One-based page; out-of-range values are clamped.
        #[arg(long, default_value_t = 1)]
        page: usize,
    },
    /// Show one record.
    Show {
        /// Resource kind.
        resource: ResourceKind,
        /// Record identifier.
        id: String,
        /// Owning service, for statements and notes.
        #[command(flatten)]
        scope: Scope,
    },
    /// Create a record from a JSON draft.
    Create {
        /// Resource kind.
        resource: ResourceKind,
        /// Draft fields as JSON.
        #[arg(long, value_name = "json")]
        data: String,
        /// Owning service, for statements and notes.
        #[command(flatten)]
        scope: Scope,
    },
    /// Replace a record from a JSON draft.
    Update {
        /// Resource kind.
        resource: ResourceKind,
        /// Record identifier.
        id: String,
        /// Draft fields as JSON.
        #[arg(long, value_name = "json")]
        data: String,
        /// Owning service, for statements and notes.
        #[command(flatten)]
        scope: Scope,
    },
    /// Delete a record after confirmation.
    Delete {
        /// Resource kind.
        resource: ResourceKind,
        /// Record identifier.
        id: String,
        /// Owning service, for statements and notes.
        #[command(flatten)]
        scope: Scope,
    },
    /// Enable a council or user account.
    Enable {
        /// Resource kind.
        resource: ResourceKind,
        /// Record identifier.
        id: String,
    },
    /// Disable a council or user account.
    Disable {
        /// Resource kind.
        resource: ResourceKind,
        /// Record identifier.
        id: String,
    },
    /// Councils open for new clients.
    EnabledCouncils,
    /// Statement ledger of a service with running balances.
    Ledger {
        /// Service identifier.
        #[arg(long)]
        service: String,
        /// Date window.
        #[command(flatten)]
        dates: DateArgs,
    },
    /// Add a typed statement line to a service.
    AddEntry {
        /// Service identifier.
        #[arg(long)]
        service: String,
        /// Entry as JSON tagged by `kind`.
        #[arg(long, value_name = "json")]
        entry: String,
        /// Line date; today when omitted.
        #[arg(long, value_parser = parse_date_arg)]
        date: Option<NaiveDate>,
    },
    /// Download a statement or report.
    Export {
        /// Report to fetch.
        #[command(subcommand)]
        report: ExportCommand,
        /// Directory the file is written to.
        #[arg(long, value_name = "dir", default_value = ".", global = true)]
        out: PathBuf,
    },
    /// Show a client with address and next-of-kin history.
    Profile {
        /// Client identifier.
        client: String,
    },
    /// Append an address to a client.
    AddAddress {
        /// Client identifier.
        client: String,
        /// Address fields as JSON.
        #[arg(long, value_name = "json")]
        data: String,
    },
    /// Append a next-of-kin entry to a client.
    AddKin {
        /// Client identifier.
        client: String,
        /// Kin fields as JSON.
        #[arg(long, value_name = "json")]
        data: String,
    },
}

/// Downloadable reports.
#[derive(Debug, Clone, Subcommand)]
pub enum ExportCommand {
    /// Full statement of a service.
    Statement {
        /// Service identifier.
        #[arg(long)]
        service: String,
        /// File format.
        #[arg(long, value_enum, default_value_t = FormatArg::Pdf)]
        format: FormatArg,
    },
    /// Statement CSV for a date window.
    StatementReport {
        /// Service identifier.
        #[arg(long)]
        service: String,
        /// Date window.
        #[command(flatten)]
        dates: DateArgs,
    },
    /// Notes CSV for a date window.
    Notes {
        /// Service identifier.
        #[arg(long)]
        service: String,
        /// Date window.
        #[command(flatten)]
        dates: DateArgs,
    },
}

/// Resources a record command can address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ResourceKind {
    /// Funding councils.
    Councils,
    /// Care clients.
    Clients,
    /// Client services.
    Services,
    /// Statement lines of one service.
    Statements,
    /// Notes of one service.
    Notes,
    /// Staff accounts.
    Users,
}

impl ResourceKind {
    const fn name(self) -> &'static str {
        match self {
            Self::Councils => "councils",
            Self::Clients => "clients",
            Self::Services => "services",
            Self::Statements => "statements",
            Self::Notes => "notes",
            Self::Users => "users",
        }
    }

    const fn resource(self) -> Resource {
        match self {
            Self::Councils => Resource::Council,
            Self::Clients => Resource::Client,
            Self::Services => Resource::Service,
            Self::Statements => Resource::Statement,
            Self::Notes => Resource::Notes,
            Self::Users => Resource::User,
        }
    }
}

/// Statement download format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FormatArg {
    /// Printable statement.
    Pdf,
    /// Spreadsheet.
    Csv,
}

impl From<FormatArg> for ExportFormat {
    fn from(value: FormatArg) -> Self {
        match value {
            FormatArg::Pdf => Self::Pdf,
            FormatArg::Csv => Self::Csv,
        }
    }
}

/// Owning service of nested resources.
#[derive(Debug, Clone, Default, Args)]
pub struct Scope {
    /// Service identifier.
    #[arg(long = "service", value_name = "id")]
    pub service: Option<String>,
}

/// Inclusive date window; either side may be open.
#[derive(Debug, Clone, Copy, Default, Args)]
pub struct DateArgs {
    /// First day kept.
    #[arg(long, value_parser = parse_date_arg)]
    pub from: Option<NaiveDate>,
    /// Last day kept.
    #[arg(long, value_parser = parse_date_arg)]
    pub to: Option<NaiveDate>,
}

impl DateArgs {
    fn range(self) -> DateRange {
        DateRange::new(self.from, self.to)
    }
}

/// List filter.
#[derive(Debug, Clone, Default, Args)]
pub struct FilterArgs {
    /// Case-insensitive text search.
    #[arg(long)]
    pub search: Option<String>,
    /// Date window.
    #[command(flatten)]
    pub dates: DateArgs,
}

impl FilterArgs {
    fn to_filter(&self) -> RecordFilter {
        let mut filter = self
            .search
            .as_deref()
            .map(RecordFilter::search)
            .unwrap_or_default();
        filter.range = self.dates.range();
        filter
    }
}

fn parse_date_arg(raw: &str) -> Result<NaiveDate, String> {
    parse_flexible_date(raw).ok_or_else(|| format!("`{raw}` is not a date"))
}

/// Writes command results as text lines or JSON documents.
#[derive(Debug)]
pub struct Printer<W> {
    out: W,
    json: bool,
}

impl<W: Write> Printer<W> {
    /// Printer over `out`; `json` selects JSON documents.
    pub const fn new(out: W, json: bool) -> Self {
        Self { out, json }
    }

    /// Underlying writer.
    pub fn into_inner(self) -> W {
        self.out
    }

    /// Write one text line, regardless of mode.
    ///
    /// # Errors
    ///
    /// Fails when the writer fails.
    pub fn line(&mut self, text: &str) -> ConsoleResult<()> {
        writeln!(self.out, "{text}").map_err(|err| Error::internal(format!("write failed: {err}")))
    }

    /// Write `value` as JSON in JSON mode, otherwise the `text` lines.
    ///
    /// # Errors
    ///
    /// Fails when `value` cannot be encoded or the writer fails.
    pub fn emit<T: Serialize>(&mut self, value: &T, text: &[String]) -> ConsoleResult<()> {
        if self.json {
            let document = serde_json::to_string_pretty(value)
                .map_err(|err| Error::internal(format!("cannot encode output: {err}")))?;
            return self.line(&document);
        }
        text.iter().try_for_each(|line| self.line(line))
    }
}

fn compact<T: Serialize>(value: &T) -> ConsoleResult<String> {
    serde_json::to_string(value).map_err(|err| Error::internal(format!("cannot encode row: {err}")))
}

fn pretty<T: Serialize>(value: &T) -> ConsoleResult<String> {
    serde_json::to_string_pretty(value)
        .map_err(|err| Error::internal(format!("cannot encode record: {err}")))
}

fn parse_json<T: DeserializeOwned>(raw: &str, what: &str) -> ConsoleResult<T> {
    serde_json::from_str(raw).map_err(|err| Error::invalid_request(format!("invalid {what}: {err}")))
}

fn acknowledgement(response: &Value, fallback: &str) -> String {
    response
        .get("message")
        .and_then(Value::as_str)
        .unwrap_or(fallback)
        .to_owned()
}

#[derive(Serialize)]
struct PageView<'a, T> {
    window: PageWindow,
    rows: Vec<&'a T>,
}

enum RecordAction {
    List { filter: RecordFilter, page: usize },
    Show(String),
    Create(String),
    Update { id: String, data: String },
    Delete(String),
    SetStatus { id: String, enabled: bool },
}

impl RecordAction {
    const fn required(&self) -> Action {
        match self {
            Self::List { .. } | Self::Show(_) => Action::View,
            Self::Create(_) => Action::Add,
            Self::Update { .. } | Self::SetStatus { .. } => Action::Edit,
            Self::Delete(_) => Action::Delete,
        }
    }
}

/// Runs console commands for one signed-in operator.
pub struct Console {
    api: Arc<dyn ResourceApi>,
    exporter: Arc<dyn ExportApi>,
    gate: ActionGate,
    clock: Arc<dyn Clock + Send + Sync>,
}

impl std::fmt::Debug for Console {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Console").finish_non_exhaustive()
    }
}

impl Console {
    /// Console over the given ports; `clock` dates undated statement lines.
    pub fn new(
        api: Arc<dyn ResourceApi>,
        exporter: Arc<dyn ExportApi>,
        gate: ActionGate,
        clock: Arc<dyn Clock + Send + Sync>,
    ) -> Self {
        Self {
            api,
            exporter,
            gate,
            clock,
        }
    }

    /// Run `command`, writing its outcome to `printer`.
    ///
    /// # Errors
    ///
    /// Returns the driver error for denials, validation failures and API
    /// failures; the operator has already been alerted where the panel does
    /// so.
    pub async fn run<W: Write>(
        &self,
        command: ConsoleCommand,
        printer: &mut Printer<W>,
    ) -> ConsoleResult<()> {
        match command {
            ConsoleCommand::List {
                resource,
                scope,
                filter,
                page,
            } => {
                let action = RecordAction::List {
                    filter: filter.to_filter(),
                    page,
                };
                self.records(resource, scope, action, printer).await
            }
            ConsoleCommand::Show {
                resource,
                id,
                scope,
            } => {
                self.records(resource, scope, RecordAction::Show(id), printer)
                    .await
            }
            ConsoleCommand::Create {
                resource,
                data,
                scope,
            } => {
                self.records(resource, scope, RecordAction::Create(data), printer)
                    .await
            }
            ConsoleCommand::Update {
                resource,
                id,
                data,
                scope,
            } => {
                let action = RecordAction::Update { id, data };
                self.records(resource, scope, action, printer).await
            }
            ConsoleCommand::Delete {
                resource,
                id,
                scope,
            } => {
                self.records(resource, scope, RecordAction::Delete(id), printer)
                    .await
            }
            ConsoleCommand::Enable { resource, id } => {
                let action = RecordAction::SetStatus { id, enabled: true };
                self.records(resource, Scope::default(), action, printer)
                    .await
            }
            ConsoleCommand::Disable { resource, id } => {
                let action = RecordAction::SetStatus { id, enabled: false };
                self.records(resource, Scope::default(), action, printer)
                    .await
            }
            ConsoleCommand::EnabledCouncils => {
                let councils = CouncilSchema::enabled(self.api.as_ref(), &self.gate).await?;
                let text = councils
                    .iter()
                    .map(|council| format!("{}  {}", council.id, council.name))
                    .collect::<Vec<_>>();
                printer.emit(&councils, &text)
            }
            ConsoleCommand::Ledger { service, dates } => {
                self.ledger(&service, dates, printer).await
            }
            ConsoleCommand::AddEntry {
                service,
                entry,
                date,
            } => self.add_entry(&service, &entry, date, printer).await,
            ConsoleCommand::Export { report, out } => self.export(report, &out, printer).await,
            ConsoleCommand::Profile { client } => self.profile(&client, printer).await,
            ConsoleCommand::AddAddress { client, data } => {
                let address: PostalAddress = parse_json(&data, "address")?;
                let response =
                    add_address(self.api.as_ref(), &self.gate, &client, &address).await?;
                printer.emit(&response, &[acknowledgement(&response, "address added")])
            }
            ConsoleCommand::AddKin { client, data } => {
                let kin: KinDraft = parse_json(&data, "next of kin")?;
                let response = add_kin(self.api.as_ref(), &self.gate, &client, &kin).await?;
                printer.emit(&response, &[acknowledgement(&response, "next of kin added")])
            }
        }
    }

    async fn records<W: Write>(
        &self,
        resource: ResourceKind,
        scope: Scope,
        action: RecordAction,
        printer: &mut Printer<W>,
    ) -> ConsoleResult<()> {
        // Row actions also need the list itself, so `view` is checked by the
        // load that follows; the attempted action is checked first.
        self.gate
            .authorize(resource.resource(), action.required())
            .map_err(PanelError::from)?;
        match resource {
            ResourceKind::Councils => self.drive(CouncilSchema, action, printer).await,
            ResourceKind::Clients => self.drive(ClientSchema, action, printer).await,
            ResourceKind::Services => self.drive(ServiceSchema, action, printer).await,
            ResourceKind::Users => self.drive(UserSchema, action, printer).await,
            ResourceKind::Statements => {
                let service = required_service(resource, scope)?;
                let (schema, _) =
                    StatementSchema::fetch(self.api.as_ref(), &self.gate, &service).await?;
                self.drive(schema, action, printer).await
            }
            ResourceKind::Notes => {
                let service = required_service(resource, scope)?;
                self.drive(NoteSchema::for_service(service), action, printer)
                    .await
            }
        }
    }

    fn panel<S: ResourceSchema>(&self, schema: S) -> ResourcePanel<S> {
        ResourcePanel::new(schema, Arc::clone(&self.api), self.gate.clone())
    }

    async fn drive<S, W>(
        &self,
        schema: S,
        action: RecordAction,
        printer: &mut Printer<W>,
    ) -> ConsoleResult<()>
    where
        S: ResourceSchema,
        S::Draft: DeserializeOwned,
        W: Write,
    {
        let mut panel = self.panel(schema);
        panel.load().await?;
        let resource = S::RESOURCE;
        match action {
            RecordAction::List { filter, page } => {
                if !filter.is_empty() {
                    panel.apply_filter(filter);
                }
                let window = panel.go_to_page(page);
                let rows = panel.page_rows();
                let mut text = rows.iter().map(compact).collect::<ConsoleResult<Vec<_>>>()?;
                text.push(window.label());
                printer.emit(&PageView { window, rows }, &text)
            }
            RecordAction::Show(id) => {
                let record = panel.view(&id)?;
                printer.emit(record, &[pretty(record)?])
            }
            RecordAction::Create(data) => {
                let draft: S::Draft = parse_json(&data, &format!("{resource} data"))?;
                panel.begin_add()?;
                let response = panel.save(&draft).await?;
                printer.emit(&response, &[acknowledgement(&response, "created")])
            }
            RecordAction::Update { id, data } => {
                let draft: S::Draft = parse_json(&data, &format!("{resource} data"))?;
                panel.begin_edit(&id)?;
                let response = panel.save(&draft).await?;
                printer.emit(&response, &[acknowledgement(&response, "updated")])
            }
            RecordAction::Delete(id) => {
                let deleted = panel.delete(&id).await?;
                let text = if deleted {
                    format!("deleted {id}")
                } else {
                    "delete cancelled".to_owned()
                };
                printer.emit(&json!({ "id": id, "deleted": deleted }), &[text])
            }
            RecordAction::SetStatus { id, enabled } => {
                panel.set_enabled(&id, enabled).await?;
                let state = if enabled { "enabled" } else { "disabled" };
                printer.emit(
                    &json!({ "id": id, "enabled": enabled }),
                    &[format!("{id} {state}")],
                )
            }
        }
    }

    async fn ledger<W: Write>(
        &self,
        service_id: &str,
        dates: DateArgs,
        printer: &mut Printer<W>,
    ) -> ConsoleResult<()> {
        let (schema, _) = StatementSchema::fetch(self.api.as_ref(), &self.gate, service_id).await?;
        let mut panel = self.panel(schema);
        panel.load().await?;
        panel.apply_filter(RecordFilter {
            range: dates.range(),
            text: None,
        });
        let ledger = panel.ledger();
        let mut text: Vec<String> = ledger
            .rows
            .iter()
            .map(|row| {
                let date = row
                    .statement
                    .date
                    .map(|day| day.format("%d/%m/%Y").to_string())
                    .unwrap_or_default();
                format!(
                    "{date:<10}  {:<40}  {:>10}  {:>10}  {:>10}",
                    row.statement.description,
                    row.statement.credit,
                    row.statement.debit,
                    row.balance
                )
            })
            .collect();
        text.push(format!(
            "Total credit {}  Total debit {}  {} {}",
            ledger.summary.total_credit,
            ledger.summary.total_debit,
            ledger.summary.standing,
            ledger.summary.amount()
        ));
        printer.emit(&ledger, &text)
    }

    async fn add_entry<W: Write>(
        &self,
        service_id: &str,
        raw_entry: &str,
        date: Option<NaiveDate>,
        printer: &mut Printer<W>,
    ) -> ConsoleResult<()> {
        let entry: StatementEntry = parse_json(raw_entry, "statement entry")?;
        let (schema, service) =
            StatementSchema::fetch(self.api.as_ref(), &self.gate, service_id).await?;
        let builder = EntryBuilder::new(&service, self.clock.as_ref());
        let draft = builder
            .build(&entry, date, self.gate.context().actor_name())
            .map_err(|err| {
                self.gate.feedback().alert(&err.to_string());
                Error::invalid_request(err.to_string())
            })?;
        debug!(service_id, kind = %entry.kind(), "adding statement line");
        let mut panel = self.panel(schema);
        panel.load().await?;
        panel.begin_add()?;
        let response = panel.save(&draft).await?;
        printer.emit(&response, &[acknowledgement(&response, "statement added")])
    }

    async fn export<W: Write>(
        &self,
        report: ExportCommand,
        directory: &Path,
        printer: &mut Printer<W>,
    ) -> ConsoleResult<()> {
        let download = match report {
            ExportCommand::Statement { service, format } => {
                let request = ExportRequest::Statement {
                    service_id: service.clone(),
                    format: format.into(),
                };
                let panel = self.panel(StatementSchema::for_service_id(service));
                panel.export(self.exporter.as_ref(), &request).await?
            }
            ExportCommand::StatementReport { service, dates } => {
                let request = ExportRequest::StatementReport {
                    service_id: service.clone(),
                    range: dates.range(),
                };
                let panel = self.panel(StatementSchema::for_service_id(service));
                panel.export(self.exporter.as_ref(), &request).await?
            }
            ExportCommand::Notes { service, dates } => {
                let request = ExportRequest::NotesReport {
                    service_id: service.clone(),
                    range: dates.range(),
                };
                let panel = self.panel(NoteSchema::for_service(service));
                panel.export(self.exporter.as_ref(), &request).await?
            }
        };
        let path = write_download(directory, &download)
            .map_err(|err| Error::internal(format!("cannot save {}: {err}", download.filename)))?;
        printer.emit(
            &json!({ "path": path, "bytes": download.bytes.len() }),
            &[format!("saved {}", path.display())],
        )
    }

    async fn profile<W: Write>(&self, client_id: &str, printer: &mut Printer<W>) -> ConsoleResult<()> {
        let profile = load_client_profile(self.api.as_ref(), &self.gate, client_id).await?;
        let mut text = vec![format!("{} ({})", profile.client.full_name(), client_id)];
        let describe = |label: &str, line: Option<String>| {
            format!("{label}: {}", line.unwrap_or_else(|| "none".to_owned()))
        };
        text.push(describe(
            "Current address",
            profile
                .addresses
                .current
                .as_ref()
                .map(|address| address.postal.one_line()),
        ));
        text.push(describe(
            "Next of kin",
            profile
                .kins
                .current
                .as_ref()
                .map(|kin| format!("{} {}", kin.name, kin.postal.one_line())),
        ));
        text.push(format!(
            "Previous addresses: {}  Previous next of kin: {}",
            profile.addresses.history.len(),
            profile.kins.history.len()
        ));
        printer.emit(&profile, &text)
    }
}

fn required_service(resource: ResourceKind, scope: Scope) -> ConsoleResult<String> {
    scope.service.ok_or_else(|| {
        Error::invalid_request(format!("--service is required for {}", resource.name()))
    })
}
