//! Batch analysis: workload, breakdowns, escalation histogram and team
//! performance, built in one pass over classified tickets.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::catalog::CatalogSet;
use crate::classify::{classify_with, EscalationLevel, OverdueInfo};
use crate::source::SourceSystem;
use crate::status::{
    normalize_itsm_priority, normalize_priority, normalize_severity, normalize_type, ItsmPriority,
    Severity,
};
use crate::ticket::Ticket;

const UNASSIGNED: &str = "Unassigned";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BucketCount {
    pub total: usize,
    pub overdue: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EscalationHistogram {
    pub severe: usize,
    pub critical: usize,
    pub warning: usize,
    pub stagnant: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OwnerWorkload {
    pub owner: String,
    pub total: usize,
    pub overdue: usize,
    /// `(total - overdue) / total`, as a percentage.
    pub sla_compliance_pct: f64,
}

impl OwnerWorkload {
    pub fn on_time(&self) -> usize {
        self.total - self.overdue
    }

    pub fn overdue_ratio(&self) -> f64 {
        ratio(self.overdue, self.total)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TeamPerformance {
    pub sla_compliance_pct: f64,
    pub average_age_hours: f64,
    pub top_performer: Option<String>,
    pub most_overdue: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Analysis {
    pub total: usize,
    pub overdue: usize,
    pub on_time: usize,
    pub by_severity: BTreeMap<String, BucketCount>,
    pub by_priority: BTreeMap<String, BucketCount>,
    pub by_type: BTreeMap<String, BucketCount>,
    pub escalation: EscalationHistogram,
    /// Owners in first-seen order.
    pub owners: Vec<OwnerWorkload>,
    pub team: TeamPerformance,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct OwnerTally {
    owner: String,
    total: usize,
    overdue: usize,
}

/// Running totals behind [`analyze`]. Partial accumulators built over
/// disjoint slices of a batch can be merged; merging keeps the first-seen
/// owner order of the left side, then the right.
#[derive(Debug, Clone, Default)]
pub struct AnalysisAccumulator {
    total: usize,
    overdue: usize,
    by_severity: BTreeMap<String, BucketCount>,
    by_priority: BTreeMap<String, BucketCount>,
    by_type: BTreeMap<String, BucketCount>,
    escalation: EscalationHistogram,
    owners: Vec<OwnerTally>,
    owner_index: HashMap<String, usize>,
    age_hours_sum: i64,
    aged_tickets: usize,
}

impl AnalysisAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one ticket and its classification to every bucket it belongs to.
    pub fn fold(&mut self, ticket: &Ticket, info: &OverdueInfo, now: DateTime<Utc>) {
        self.total += 1;
        if info.is_overdue {
            self.overdue += 1;
        }

        if let Some(label) = severity_label(ticket) {
            bump(&mut self.by_severity, label, info.is_overdue);
        }
        if let Some(label) = priority_label(ticket) {
            bump(&mut self.by_priority, label, info.is_overdue);
        }
        if let Some(label) = type_label(ticket) {
            bump(&mut self.by_type, label, info.is_overdue);
        }

        match info.level {
            EscalationLevel::Severe => self.escalation.severe += 1,
            EscalationLevel::Critical => self.escalation.critical += 1,
            EscalationLevel::Warning => self.escalation.warning += 1,
            EscalationLevel::Stagnant => self.escalation.stagnant += 1,
            EscalationLevel::None => {}
        }

        let (key, display) = owner_identity(ticket.owner.as_deref());
        let tally = self.owner_tally(key, display);
        tally.total += 1;
        if info.is_overdue {
            tally.overdue += 1;
        }

        if let Some(created_at) = ticket.created_at {
            self.age_hours_sum += (now - created_at).num_seconds().div_euclid(3_600);
            self.aged_tickets += 1;
        }
    }

    pub fn merge(&mut self, other: AnalysisAccumulator) {
        self.total += other.total;
        self.overdue += other.overdue;
        merge_buckets(&mut self.by_severity, other.by_severity);
        merge_buckets(&mut self.by_priority, other.by_priority);
        merge_buckets(&mut self.by_type, other.by_type);
        self.escalation.severe += other.escalation.severe;
        self.escalation.critical += other.escalation.critical;
        self.escalation.warning += other.escalation.warning;
        self.escalation.stagnant += other.escalation.stagnant;

        let mut other_keys = other
            .owner_index
            .into_iter()
            .map(|(key, index)| (index, key))
            .collect::<Vec<_>>();
        other_keys.sort_by_key(|(index, _)| *index);
        for (index, key) in other_keys {
            let incoming = &other.owners[index];
            let tally = self.owner_tally(key, incoming.owner.clone());
            tally.total += incoming.total;
            tally.overdue += incoming.overdue;
        }

        self.age_hours_sum += other.age_hours_sum;
        self.aged_tickets += other.aged_tickets;
    }

    pub fn finish(self) -> Analysis {
        let owners = self
            .owners
            .into_iter()
            .map(|tally| OwnerWorkload {
                sla_compliance_pct: compliance_pct(tally.total, tally.overdue),
                owner: tally.owner,
                total: tally.total,
                overdue: tally.overdue,
            })
            .collect::<Vec<_>>();

        let team = TeamPerformance {
            sla_compliance_pct: compliance_pct(self.total, self.overdue),
            average_age_hours: if self.aged_tickets == 0 {
                0.0
            } else {
                self.age_hours_sum as f64 / self.aged_tickets as f64
            },
            top_performer: select_owner(&owners, |candidate, best| candidate < best),
            most_overdue: select_owner(&owners, |candidate, worst| candidate > worst),
        };

        Analysis {
            total: self.total,
            overdue: self.overdue,
            on_time: self.total - self.overdue,
            by_severity: self.by_severity,
            by_priority: self.by_priority,
            by_type: self.by_type,
            escalation: self.escalation,
            owners,
            team,
        }
    }

    fn owner_tally(&mut self, key: String, display: String) -> &mut OwnerTally {
        let index = match self.owner_index.get(&key) {
            Some(index) => *index,
            None => {
                self.owners.push(OwnerTally {
                    owner: display,
                    total: 0,
                    overdue: 0,
                });
                let index = self.owners.len() - 1;
                self.owner_index.insert(key, index);
                index
            }
        };
        &mut self.owners[index]
    }
}

/// Classifies every ticket once and folds it into a fresh accumulator.
#[must_use]
pub fn analyze(tickets: &[Ticket], now: DateTime<Utc>, catalogs: &CatalogSet) -> Analysis {
    let mut acc = AnalysisAccumulator::new();
    for ticket in tickets {
        let info = classify_with(ticket, now, catalogs);
        acc.fold(ticket, &info, now);
    }
    let analysis = acc.finish();
    tracing::debug!(
        total = analysis.total,
        overdue = analysis.overdue,
        owners = analysis.owners.len(),
        "analysis complete"
    );
    analysis
}

/// Owner picked by overdue ratio; `better(candidate, current)` decides
/// replacement, so ties keep the owner seen first.
fn select_owner(owners: &[OwnerWorkload], better: impl Fn(f64, f64) -> bool) -> Option<String> {
    let mut selected: Option<&OwnerWorkload> = None;
    for owner in owners.iter().filter(|owner| owner.total > 0) {
        selected = match selected {
            Some(current) if !better(owner.overdue_ratio(), current.overdue_ratio()) => {
                Some(current)
            }
            _ => Some(owner),
        };
    }
    selected.map(|owner| owner.owner.clone())
}

fn owner_identity(owner: Option<&str>) -> (String, String) {
    let display = owner.map(str::trim).unwrap_or("");
    if display.is_empty() {
        return (UNASSIGNED.to_ascii_lowercase(), UNASSIGNED.to_string());
    }
    (display.to_lowercase(), display.to_string())
}

fn severity_label(ticket: &Ticket) -> Option<&'static str> {
    if ticket.source != SourceSystem::CaseManagement {
        return None;
    }
    Some(match normalize_severity(ticket.severity.as_deref().unwrap_or("")) {
        Severity::S1 => "S1",
        Severity::S2 => "S2",
        Severity::S3 => "S3",
        Severity::Other => "other",
    })
}

fn priority_label(ticket: &Ticket) -> Option<&'static str> {
    let raw = ticket.priority.as_deref().unwrap_or("");
    match ticket.source {
        SourceSystem::CaseManagement => None,
        SourceSystem::IssueTracker => Some(normalize_priority(raw).as_str()),
        SourceSystem::ItsmChange | SourceSystem::ItsmIncident => {
            Some(match normalize_itsm_priority(raw) {
                ItsmPriority::P1 => "P1",
                ItsmPriority::P2 => "P2",
                ItsmPriority::P3 => "P3",
                ItsmPriority::Other => "other",
            })
        }
    }
}

fn type_label(ticket: &Ticket) -> Option<&'static str> {
    match ticket.source {
        SourceSystem::CaseManagement => None,
        SourceSystem::IssueTracker => {
            Some(normalize_type(ticket.issue_type.as_deref().unwrap_or("")).as_str())
        }
        SourceSystem::ItsmIncident => Some("incident"),
        SourceSystem::ItsmChange => Some("change"),
    }
}

fn bump(buckets: &mut BTreeMap<String, BucketCount>, label: &str, overdue: bool) {
    let bucket = buckets.entry(label.to_string()).or_default();
    bucket.total += 1;
    if overdue {
        bucket.overdue += 1;
    }
}

fn merge_buckets(into: &mut BTreeMap<String, BucketCount>, from: BTreeMap<String, BucketCount>) {
    for (label, count) in from {
        let bucket = into.entry(label).or_default();
        bucket.total += count.total;
        bucket.overdue += count.overdue;
    }
}

fn ratio(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64
    }
}

fn compliance_pct(total: usize, overdue: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        ratio(total - overdue, total) * 100.0
    }
}
