//! slawatch-cli: command surface over the SLA engine.

pub mod backend;
pub mod cli;
pub mod logging;
pub mod render;

use std::env;
use std::io::Write;
use std::path::Path;

use clap::error::ErrorKind;
use clap::Parser;
use slawatch_core::ticket::parse_timestamp;
use slawatch_core::{
    aggregate_clients, analyze, build_overdue_alert, classify_all, decode_tickets, risk_clients,
    top_clients, SourceSystem, Ticket,
};

pub use backend::{FilesystemTicketBackend, InMemoryTicketBackend, TicketBackend};
use cli::{Cli, Command};
use render::{CatalogView, ClientReport};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

pub fn run_from_env() -> i32 {
    run_from_env_with_backend(&FilesystemTicketBackend)
}

pub fn run_from_env_with_backend(backend: &dyn TicketBackend) -> i32 {
    let args: Vec<String> = env::args().skip(1).collect();
    let mut stdout = std::io::stdout();
    let mut stderr = std::io::stderr();
    run_with_backend(&args, backend, &mut stdout, &mut stderr)
}

pub fn run_for_test(args: &[&str], backend: &dyn TicketBackend) -> CommandOutput {
    let owned_args: Vec<String> = args.iter().map(|arg| (*arg).to_string()).collect();
    let mut stdout = Vec::new();
    let mut stderr = Vec::new();
    let exit_code = run_with_backend(&owned_args, backend, &mut stdout, &mut stderr);
    CommandOutput {
        stdout: String::from_utf8_lossy(&stdout).into_owned(),
        stderr: String::from_utf8_lossy(&stderr).into_owned(),
        exit_code,
    }
}

pub fn run_with_backend(
    args: &[String],
    backend: &dyn TicketBackend,
    stdout: &mut dyn Write,
    stderr: &mut dyn Write,
) -> i32 {
    match execute(args, backend, stdout) {
        Ok(()) => 0,
        Err(message) => {
            let _ = writeln!(stderr, "{message}");
            1
        }
    }
}

fn execute(
    args: &[String],
    backend: &dyn TicketBackend,
    stdout: &mut dyn Write,
) -> Result<(), String> {
    let argv = std::iter::once("slawatch".to_string()).chain(args.iter().cloned());
    let cli = match Cli::try_parse_from(argv) {
        Ok(cli) => cli,
        Err(err) if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            write!(stdout, "{err}").map_err(|err| err.to_string())?;
            return Ok(());
        }
        Err(err) => return Err(err.to_string().trim_end().to_string()),
    };

    let config = backend
        .load_config(cli.config.as_deref())
        .map_err(|err| err.to_string())?;
    backend.install_logging(&config.logging)?;
    tracing::debug!(config = ?cli.config, level = %config.logging.level, "config loaded");
    let catalogs = config.catalogs().map_err(|err| err.to_string())?;
    let now = match cli.now.as_deref() {
        Some(raw) => parse_timestamp(raw).ok_or_else(|| format!("invalid --now value {raw:?}"))?,
        None => backend.now(),
    };
    tracing::debug!(%now, json = cli.json, "running command");

    match cli.command {
        Command::Classify { file, overdue_only } => {
            let tickets = load_tickets(backend, &file)?;
            let mut classified = classify_all(&tickets, now, &catalogs);
            if overdue_only {
                classified.retain(|ticket| ticket.overdue.is_overdue);
            }
            if cli.json {
                render::write_json(stdout, &classified)
            } else {
                render::classified_table(stdout, &classified, tickets.len())
            }
        }
        Command::Analyze { file } => {
            let tickets = load_tickets(backend, &file)?;
            let analysis = analyze(&tickets, now, &catalogs);
            if cli.json {
                render::write_json(stdout, &analysis)
            } else {
                render::analysis_report(stdout, &analysis)
            }
        }
        Command::Clients { files, limit } => {
            let mut tickets = Vec::new();
            for file in &files {
                tickets.extend(load_tickets(backend, file)?);
            }
            let limit = limit.unwrap_or(config.reporting.top_clients_limit);
            if limit == 0 {
                return Err("--limit must be at least 1".to_string());
            }
            let clients = aggregate_clients(&tickets);
            let report = ClientReport {
                top: top_clients(&clients, limit),
                risk_score_threshold: config.reporting.risk_score_threshold,
                at_risk: risk_clients(
                    &clients,
                    config.reporting.risk_score_threshold,
                    config.reporting.risk_clients_limit,
                ),
            };
            if cli.json {
                render::write_json(stdout, &report)
            } else {
                render::client_report(stdout, &report)
            }
        }
        Command::Alerts { file, source } => {
            let tickets = load_tickets(backend, &file)?;
            let alerts = match source {
                Some(source) => vec![build_overdue_alert(
                    source,
                    &tickets,
                    now,
                    &catalogs,
                    &config.alerts.recipients,
                    config.alerts.include_stagnant,
                )],
                None => SourceSystem::ALL
                    .into_iter()
                    .map(|source| {
                        build_overdue_alert(
                            source,
                            &tickets,
                            now,
                            &catalogs,
                            &config.alerts.recipients,
                            config.alerts.include_stagnant,
                        )
                    })
                    .filter(|alert| !alert.is_empty())
                    .collect(),
            };
            if cli.json {
                render::write_json(stdout, &alerts)
            } else {
                render::alert_digests(stdout, &alerts)
            }
        }
        Command::Thresholds { source } => {
            let views = match source {
                Some(source) => vec![CatalogView::from_catalog(catalogs.for_source(source))],
                None => [
                    &catalogs.case_management,
                    &catalogs.issue_tracker,
                    &catalogs.itsm,
                ]
                .into_iter()
                .map(CatalogView::from_catalog)
                .collect(),
            };
            if cli.json {
                render::write_json(stdout, &views)
            } else {
                render::threshold_tables(stdout, &views)
            }
        }
    }
}

fn load_tickets(backend: &dyn TicketBackend, path: &Path) -> Result<Vec<Ticket>, String> {
    let text = backend.read_file(path).map_err(|err| err.to_string())?;
    let tickets = decode_tickets(&text).map_err(|err| format!("{}: {err}", path.display()))?;
    tracing::debug!(path = %path.display(), tickets = tickets.len(), "tickets loaded");
    Ok(tickets)
}
