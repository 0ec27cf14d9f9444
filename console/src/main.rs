//! `care-console` entry point: settings, session and command dispatch.
#![cfg_attr(not(any(test, doctest)), deny(clippy::unwrap_used))]
#![cfg_attr(not(any(test, doctest)), deny(clippy::expect_used))]

use std::ffi::OsString;
use std::io::{self, Write};
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use mockable::DefaultClock;
use ortho_config::OrthoConfig;
use tokio::runtime::Builder;
use tracing::warn;
use tracing_subscriber::{EnvFilter, fmt};
use zeroize::Zeroizing;

use care_console::ConsoleSettings;
use care_console::domain::ports::UserFeedback;
use care_console::domain::{ActionGate, ConsoleResult, Error, SessionService};
use care_console::inbound::{Cli, Command, Console, Printer, StdioFeedback};
use care_console::outbound::{FileSessionStore, HttpConsoleApi};

fn main() -> ExitCode {
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .with_writer(io::stderr)
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }
    if let Err(e) = color_eyre::install() {
        warn!(error = %e, "panic reporter install failed");
    }

    let cli = Cli::parse();
    let runtime = match Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(e) => return report(&Error::internal(format!("create Tokio runtime: {e}"))),
    };
    match runtime.block_on(run(cli)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => report(&err),
    }
}

fn report(err: &Error) -> ExitCode {
    if let Err(write_err) = writeln!(io::stderr().lock(), "error: {}", err.message()) {
        drop(write_err);
    }
    ExitCode::from(err.code().exit_status())
}

async fn run(cli: Cli) -> ConsoleResult<()> {
    let mut settings = ConsoleSettings::load_from_iter([OsString::from("care-console")])
        .map_err(|e| Error::internal(format!("cannot load settings: {e}")))?;
    cli.apply_overrides(&mut settings);

    let base = settings
        .api_base_url()
        .map_err(|e| Error::invalid_request(e.to_string()))?;
    let http = HttpConsoleApi::new(base, settings.request_timeout())
        .map_err(|e| Error::internal(format!("cannot build HTTP client: {e}")))?;
    let terminal = Arc::new(StdioFeedback::stdio(settings.assume_yes));
    let feedback: Arc<dyn UserFeedback> = terminal.clone();
    let sessions = SessionService::new(
        Arc::new(http.clone()),
        Arc::new(FileSessionStore::new(settings.session_file())),
        Arc::clone(&feedback),
    );
    let mut printer = Printer::new(io::stdout().lock(), cli.json);

    match cli.command {
        Command::Login { username, password } => {
            let password = match password {
                Some(given) => Zeroizing::new(given),
                None => Zeroizing::new(
                    terminal
                        .ask("Password: ")
                        .map_err(|e| Error::invalid_request(format!("cannot read password: {e}")))?,
                ),
            };
            let active = sessions.login(&username, &password).await?;
            let user = &active.stored.user;
            printer.emit(
                user,
                &[format!("Signed in as {} ({})", user.username, user.role.as_str())],
            )
        }
        Command::Logout => {
            sessions.logout()?;
            printer.line("Signed out")
        }
        Command::Whoami => {
            let active = sessions.resume().await?;
            let user = &active.stored.user;
            printer.emit(
                user,
                &[format!(
                    "{} ({}), {}",
                    user.display_name,
                    user.username,
                    user.role.as_str()
                )],
            )
        }
        Command::Console(command) => {
            let active = sessions.resume().await?;
            let api = Arc::new(http.with_token(active.stored.token.clone()));
            let gate = ActionGate::new(active.context, feedback);
            let console = Console::new(api.clone(), api, gate, Arc::new(DefaultClock));
            console.run(command, &mut printer).await
        }
    }
}
