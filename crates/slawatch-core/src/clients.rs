//! Cross-source client analytics and risk scoring.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::source::SourceSystem;
use crate::ticket::Ticket;

pub const DEFAULT_TOP_CLIENTS: usize = 15;
pub const DEFAULT_RISK_THRESHOLD: f64 = 70.0;
pub const DEFAULT_RISK_CLIENTS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SourceCounts {
    pub case_management: usize,
    pub issue_tracker: usize,
    pub itsm_change: usize,
    pub itsm_incident: usize,
}

impl SourceCounts {
    fn bump(&mut self, source: SourceSystem) {
        match source {
            SourceSystem::CaseManagement => self.case_management += 1,
            SourceSystem::IssueTracker => self.issue_tracker += 1,
            SourceSystem::ItsmChange => self.itsm_change += 1,
            SourceSystem::ItsmIncident => self.itsm_incident += 1,
        }
    }

    fn add(&mut self, other: &SourceCounts) {
        self.case_management += other.case_management;
        self.issue_tracker += other.issue_tracker;
        self.itsm_change += other.itsm_change;
        self.itsm_incident += other.itsm_incident;
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientAnalytics {
    pub client: String,
    pub total: usize,
    pub incidents: usize,
    pub changes: usize,
    pub by_source: SourceCounts,
    /// Latest creation timestamp seen for the client.
    pub last_activity: Option<DateTime<Utc>>,
    pub risk_score: f64,
}

impl ClientAnalytics {
    fn new(client: String) -> Self {
        Self {
            client,
            total: 0,
            incidents: 0,
            changes: 0,
            by_source: SourceCounts::default(),
            last_activity: None,
            risk_score: 0.0,
        }
    }

    fn refresh_risk(&mut self) {
        self.risk_score = risk_score(self.incidents, self.total);
    }
}

/// `incidents / max(total, 1) * 100`, capped at 100.
pub fn risk_score(incidents: usize, total: usize) -> f64 {
    (incidents as f64 / total.max(1) as f64 * 100.0).min(100.0)
}

/// Client accumulator keyed by case-insensitive client name.
#[derive(Debug, Clone, Default)]
pub struct ClientLedger {
    clients: Vec<ClientAnalytics>,
    index: HashMap<String, usize>,
}

impl ClientLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds one ticket. Tickets without a client name are skipped.
    pub fn fold(&mut self, ticket: &Ticket) {
        let Some(name) = ticket
            .client
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
        else {
            tracing::trace!(ticket = %ticket.id, "ticket has no client, skipped");
            return;
        };

        let client = self.entry(name);
        client.total += 1;
        if ticket.source.is_incident() {
            client.incidents += 1;
        }
        if ticket.source.is_change() {
            client.changes += 1;
        }
        client.by_source.bump(ticket.source);
        if let Some(created_at) = ticket.created_at {
            client.last_activity = Some(match client.last_activity {
                Some(seen) => seen.max(created_at),
                None => created_at,
            });
        }
        client.refresh_risk();
    }

    pub fn merge(&mut self, other: ClientLedger) {
        for incoming in other.clients {
            let client = self.entry(&incoming.client);
            client.total += incoming.total;
            client.incidents += incoming.incidents;
            client.changes += incoming.changes;
            client.by_source.add(&incoming.by_source);
            client.last_activity = match (client.last_activity, incoming.last_activity) {
                (Some(a), Some(b)) => Some(a.max(b)),
                (a, b) => a.or(b),
            };
            client.refresh_risk();
        }
    }

    /// Clients sorted by descending ticket count; ties keep first-seen order.
    pub fn finish(self) -> Vec<ClientAnalytics> {
        let mut clients = self.clients;
        clients.sort_by(|a, b| b.total.cmp(&a.total));
        clients
    }

    fn entry(&mut self, name: &str) -> &mut ClientAnalytics {
        let key = name.to_lowercase();
        let index = match self.index.get(&key) {
            Some(index) => *index,
            None => {
                self.clients.push(ClientAnalytics::new(name.to_string()));
                let index = self.clients.len() - 1;
                self.index.insert(key, index);
                index
            }
        };
        &mut self.clients[index]
    }
}

/// Groups tickets from every source by client.
#[must_use]
pub fn aggregate_clients(tickets: &[Ticket]) -> Vec<ClientAnalytics> {
    let mut ledger = ClientLedger::new();
    for ticket in tickets {
        ledger.fold(ticket);
    }
    let clients = ledger.finish();
    tracing::debug!(clients = clients.len(), "client aggregation complete");
    clients
}

/// Leading clients by volume. Expects the output of [`aggregate_clients`].
pub fn top_clients(clients: &[ClientAnalytics], limit: usize) -> &[ClientAnalytics] {
    &clients[..clients.len().min(limit)]
}

/// Clients whose risk score is above `threshold`, in volume order.
pub fn risk_clients(
    clients: &[ClientAnalytics],
    threshold: f64,
    limit: usize,
) -> Vec<&ClientAnalytics> {
    clients
        .iter()
        .filter(|client| client.risk_score > threshold)
        .take(limit)
        .collect()
}
