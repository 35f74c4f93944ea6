//! Table and JSON output for each command.

use std::io::Write;

use chrono::{DateTime, Utc};
use serde::Serialize;
use slawatch_core::analysis::BucketCount;
use slawatch_core::{
    Analysis, ClassifiedTicket, ClientAnalytics, EscalationLevel, OverdueAlert, ThresholdCatalog,
};
use tabwriter::TabWriter;

fn io_error(err: std::io::Error) -> String {
    err.to_string()
}

pub fn write_json<T: Serialize + ?Sized>(stdout: &mut dyn Write, value: &T) -> Result<(), String> {
    serde_json::to_writer_pretty(&mut *stdout, value).map_err(|err| err.to_string())?;
    writeln!(stdout).map_err(io_error)
}

pub fn classified_table(
    stdout: &mut dyn Write,
    tickets: &[ClassifiedTicket],
    total: usize,
) -> Result<(), String> {
    if tickets.is_empty() {
        return writeln!(stdout, "No tickets matched.").map_err(io_error);
    }

    let mut tw = TabWriter::new(&mut *stdout).padding(2);
    writeln!(tw, "ID\tSOURCE\tSTATUS\tLEVEL\tHOURS\tDAYS").map_err(io_error)?;
    for classified in tickets {
        let ticket = &classified.ticket;
        writeln!(
            tw,
            "{}\t{}\t{}\t{}\t{}\t{}",
            ticket.id,
            ticket.source,
            dash_if_empty(&ticket.status),
            classified.overdue.level,
            classified.overdue.hours_overdue,
            classified.overdue.days_overdue,
        )
        .map_err(io_error)?;
    }
    tw.flush().map_err(io_error)?;

    let overdue = tickets
        .iter()
        .filter(|classified| classified.overdue.is_overdue)
        .count();
    writeln!(stdout).map_err(io_error)?;
    writeln!(stdout, "{overdue} of {total} tickets overdue").map_err(io_error)
}

pub fn analysis_report(stdout: &mut dyn Write, analysis: &Analysis) -> Result<(), String> {
    let mut tw = TabWriter::new(&mut *stdout).padding(2);
    writeln!(tw, "Tickets:\t{}", analysis.total).map_err(io_error)?;
    writeln!(tw, "Overdue:\t{}", analysis.overdue).map_err(io_error)?;
    writeln!(tw, "On time:\t{}", analysis.on_time).map_err(io_error)?;
    writeln!(
        tw,
        "SLA compliance:\t{:.1}%",
        analysis.team.sla_compliance_pct
    )
    .map_err(io_error)?;
    writeln!(
        tw,
        "Average age:\t{:.1}h",
        analysis.team.average_age_hours
    )
    .map_err(io_error)?;
    writeln!(
        tw,
        "Top performer:\t{}",
        analysis.team.top_performer.as_deref().unwrap_or("-")
    )
    .map_err(io_error)?;
    writeln!(
        tw,
        "Most overdue:\t{}",
        analysis.team.most_overdue.as_deref().unwrap_or("-")
    )
    .map_err(io_error)?;
    tw.flush().map_err(io_error)?;

    writeln!(stdout).map_err(io_error)?;
    let mut tw = TabWriter::new(&mut *stdout).padding(2);
    writeln!(tw, "ESCALATION\tCOUNT").map_err(io_error)?;
    let histogram = analysis.escalation;
    for (level, count) in [
        (EscalationLevel::Severe, histogram.severe),
        (EscalationLevel::Critical, histogram.critical),
        (EscalationLevel::Warning, histogram.warning),
        (EscalationLevel::Stagnant, histogram.stagnant),
    ] {
        writeln!(tw, "{level}\t{count}").map_err(io_error)?;
    }
    tw.flush().map_err(io_error)?;

    let breakdowns = [
        ("severity", &analysis.by_severity),
        ("priority", &analysis.by_priority),
        ("type", &analysis.by_type),
    ];
    if breakdowns.iter().any(|(_, buckets)| !buckets.is_empty()) {
        writeln!(stdout).map_err(io_error)?;
        let mut tw = TabWriter::new(&mut *stdout).padding(2);
        writeln!(tw, "BREAKDOWN\tBUCKET\tTOTAL\tOVERDUE").map_err(io_error)?;
        for (name, buckets) in breakdowns {
            for (label, BucketCount { total, overdue }) in buckets {
                writeln!(tw, "{name}\t{label}\t{total}\t{overdue}").map_err(io_error)?;
            }
        }
        tw.flush().map_err(io_error)?;
    }

    if !analysis.owners.is_empty() {
        writeln!(stdout).map_err(io_error)?;
        let mut tw = TabWriter::new(&mut *stdout).padding(2);
        writeln!(tw, "OWNER\tTOTAL\tON TIME\tOVERDUE\tCOMPLIANCE").map_err(io_error)?;
        for owner in &analysis.owners {
            writeln!(
                tw,
                "{}\t{}\t{}\t{}\t{:.1}%",
                owner.owner,
                owner.total,
                owner.on_time(),
                owner.overdue,
                owner.sla_compliance_pct
            )
            .map_err(io_error)?;
        }
        tw.flush().map_err(io_error)?;
    }
    Ok(())
}

#[derive(Debug, Serialize)]
pub struct ClientReport<'a> {
    pub top: &'a [ClientAnalytics],
    pub risk_score_threshold: f64,
    pub at_risk: Vec<&'a ClientAnalytics>,
}

pub fn client_report(stdout: &mut dyn Write, report: &ClientReport<'_>) -> Result<(), String> {
    if report.top.is_empty() {
        return writeln!(stdout, "No client activity.").map_err(io_error);
    }

    let mut tw = TabWriter::new(&mut *stdout).padding(2);
    writeln!(tw, "CLIENT\tTOTAL\tINCIDENTS\tCHANGES\tRISK\tLAST ACTIVITY").map_err(io_error)?;
    for client in report.top {
        writeln!(
            tw,
            "{}\t{}\t{}\t{}\t{:.1}\t{}",
            client.client,
            client.total,
            client.incidents,
            client.changes,
            client.risk_score,
            format_time(client.last_activity),
        )
        .map_err(io_error)?;
    }
    tw.flush().map_err(io_error)?;

    writeln!(stdout).map_err(io_error)?;
    if report.at_risk.is_empty() {
        return writeln!(
            stdout,
            "No clients above risk score {:.1}.",
            report.risk_score_threshold
        )
        .map_err(io_error);
    }
    writeln!(
        stdout,
        "At-risk clients (risk score above {:.1}):",
        report.risk_score_threshold
    )
    .map_err(io_error)?;
    let mut tw = TabWriter::new(&mut *stdout).padding(2);
    writeln!(tw, "CLIENT\tRISK\tINCIDENTS\tTOTAL").map_err(io_error)?;
    for client in &report.at_risk {
        writeln!(
            tw,
            "{}\t{:.1}\t{}\t{}",
            client.client, client.risk_score, client.incidents, client.total
        )
        .map_err(io_error)?;
    }
    tw.flush().map_err(io_error)
}

pub fn alert_digests(stdout: &mut dyn Write, alerts: &[OverdueAlert]) -> Result<(), String> {
    if alerts.iter().all(OverdueAlert::is_empty) && alerts.len() != 1 {
        return writeln!(stdout, "No overdue tickets.").map_err(io_error);
    }

    for (index, alert) in alerts.iter().enumerate() {
        if index > 0 {
            writeln!(stdout).map_err(io_error)?;
        }
        if alert.is_empty() {
            writeln!(stdout, "{}: no overdue tickets", alert.source_label).map_err(io_error)?;
            continue;
        }
        writeln!(
            stdout,
            "{}: {} overdue (severe {}, critical {}, warning {}, stagnant {})",
            alert.source_label,
            alert.tickets.len(),
            alert.count_at(EscalationLevel::Severe),
            alert.count_at(EscalationLevel::Critical),
            alert.count_at(EscalationLevel::Warning),
            alert.count_at(EscalationLevel::Stagnant),
        )
        .map_err(io_error)?;
        if !alert.recipients.is_empty() {
            writeln!(stdout, "Recipients: {}", alert.recipients.join(", ")).map_err(io_error)?;
        }

        let mut tw = TabWriter::new(&mut *stdout).padding(2);
        writeln!(tw, "ID\tLEVEL\tHOURS\tDAYS\tOWNER\tSTATUS").map_err(io_error)?;
        for classified in &alert.tickets {
            let ticket = &classified.ticket;
            writeln!(
                tw,
                "{}\t{}\t{}\t{}\t{}\t{}",
                ticket.id,
                classified.overdue.level,
                classified.overdue.hours_overdue,
                classified.overdue.days_overdue,
                ticket.owner.as_deref().map(dash_if_empty).unwrap_or("-"),
                dash_if_empty(&ticket.status),
            )
            .map_err(io_error)?;
        }
        tw.flush().map_err(io_error)?;
    }
    Ok(())
}

#[derive(Debug, Serialize)]
pub struct CatalogView {
    pub family: &'static str,
    pub stagnation_hours: i64,
    pub closed_statuses: Vec<&'static str>,
    pub entries: Vec<EntryView>,
}

#[derive(Debug, Serialize)]
pub struct EntryView {
    pub key: String,
    pub warning: i64,
    pub critical: i64,
    pub severe: i64,
}

impl CatalogView {
    pub fn from_catalog(catalog: &ThresholdCatalog) -> Self {
        let mut entries = catalog
            .entries()
            .into_iter()
            .map(|(key, entry)| EntryView {
                key: key.to_string(),
                warning: entry.warning,
                critical: entry.critical,
                severe: entry.severe,
            })
            .collect::<Vec<_>>();
        let fallback = catalog.default_entry();
        entries.push(EntryView {
            key: "default".to_string(),
            warning: fallback.warning,
            critical: fallback.critical,
            severe: fallback.severe,
        });
        Self {
            family: catalog.family().as_str(),
            stagnation_hours: catalog.stagnation_hours(),
            closed_statuses: catalog
                .closed_statuses()
                .iter()
                .map(|status| status.as_str())
                .collect(),
            entries,
        }
    }
}

pub fn threshold_tables(stdout: &mut dyn Write, views: &[CatalogView]) -> Result<(), String> {
    for (index, view) in views.iter().enumerate() {
        if index > 0 {
            writeln!(stdout).map_err(io_error)?;
        }
        writeln!(
            stdout,
            "{} (stagnation {}h; closed: {})",
            view.family,
            view.stagnation_hours,
            view.closed_statuses.join(", ")
        )
        .map_err(io_error)?;
        let mut tw = TabWriter::new(&mut *stdout).padding(2);
        writeln!(tw, "KEY\tWARNING\tCRITICAL\tSEVERE").map_err(io_error)?;
        for entry in &view.entries {
            writeln!(
                tw,
                "{}\t{}\t{}\t{}",
                entry.key, entry.warning, entry.critical, entry.severe
            )
            .map_err(io_error)?;
        }
        tw.flush().map_err(io_error)?;
    }
    Ok(())
}

fn format_time(value: Option<DateTime<Utc>>) -> String {
    match value {
        Some(value) => value.format("%Y-%m-%d %H:%M").to_string(),
        None => "-".to_string(),
    }
}

fn dash_if_empty(value: &str) -> &str {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        "-"
    } else {
        trimmed
    }
}
