//! Overdue classification of a single ticket against a threshold catalog.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::catalog::{CatalogSet, ItsmKind, ThresholdCatalog, ThresholdKey};
use crate::source::SourceSystem;
use crate::status::{
    is_closed, is_strict_issue_type, normalize_itsm_priority, normalize_priority,
    normalize_severity,
};
use crate::ticket::Ticket;

const SECS_PER_HOUR: i64 = 3_600;
const SECS_PER_DAY: i64 = 86_400;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EscalationLevel {
    #[default]
    None,
    Warning,
    Critical,
    Severe,
    /// Touched long after creation but not old enough for the time ladder.
    Stagnant,
}

impl EscalationLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Warning => "warning",
            Self::Critical => "critical",
            Self::Severe => "severe",
            Self::Stagnant => "stagnant",
        }
    }

    /// Ordering used when listing overdue tickets, most urgent first.
    pub fn urgency_rank(self) -> u8 {
        match self {
            Self::Severe => 0,
            Self::Critical => 1,
            Self::Warning => 2,
            Self::Stagnant => 3,
            Self::None => 4,
        }
    }
}

impl fmt::Display for EscalationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classification outcome. Recomputed on every query, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct OverdueInfo {
    pub is_overdue: bool,
    pub level: EscalationLevel,
    pub hours_overdue: i64,
    pub days_overdue: i64,
}

impl OverdueInfo {
    pub const NOT_OVERDUE: Self = Self {
        is_overdue: false,
        level: EscalationLevel::None,
        hours_overdue: 0,
        days_overdue: 0,
    };
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifiedTicket {
    #[serde(flatten)]
    pub ticket: Ticket,
    pub overdue: OverdueInfo,
}

/// Threshold key for `ticket`, derived from the fields its source uses.
pub fn classification_key(ticket: &Ticket) -> ThresholdKey {
    match ticket.source {
        SourceSystem::CaseManagement => {
            ThresholdKey::Severity(normalize_severity(ticket.severity.as_deref().unwrap_or("")))
        }
        SourceSystem::IssueTracker => ThresholdKey::Issue {
            priority: normalize_priority(ticket.priority.as_deref().unwrap_or("")),
            strict: is_strict_issue_type(ticket.issue_type.as_deref().unwrap_or("")),
        },
        SourceSystem::ItsmIncident | SourceSystem::ItsmChange => {
            let kind = if ticket.source == SourceSystem::ItsmIncident {
                ItsmKind::Incident
            } else {
                ItsmKind::Change
            };
            ThresholdKey::Itsm {
                kind,
                priority: normalize_itsm_priority(ticket.priority.as_deref().unwrap_or("")),
            }
        }
    }
}

/// Classifies `ticket` at `now` against `catalog`.
///
/// Order of checks:
/// 1. missing creation or last-activity timestamp: not overdue
/// 2. closed status: not overdue, whatever the age
/// 3. overdue when the older of the two ages reaches the warning boundary,
///    or when the creation-to-update gap exceeds the stagnation boundary
/// 4. stagnant only when not also overdue by time; the reported duration is
///    then the gap, not the age
/// 5. otherwise severe, critical, warning, first match wins
pub fn classify(ticket: &Ticket, now: DateTime<Utc>, catalog: &ThresholdCatalog) -> OverdueInfo {
    let (Some(created_at), Some(updated_at)) = (ticket.created_at, ticket.updated_at) else {
        tracing::trace!(ticket = %ticket.id, "missing timestamps, not classified");
        return OverdueInfo::NOT_OVERDUE;
    };

    if is_closed(&ticket.status, catalog) {
        return OverdueInfo::NOT_OVERDUE;
    }

    let secs_since_created = (now - created_at).num_seconds();
    let secs_since_updated = (now - updated_at).num_seconds();
    let max_hours = floor_div(secs_since_created, SECS_PER_HOUR)
        .max(floor_div(secs_since_updated, SECS_PER_HOUR));
    let max_days = floor_div(secs_since_created, SECS_PER_DAY)
        .max(floor_div(secs_since_updated, SECS_PER_DAY));
    let gap_hours = floor_div((updated_at - created_at).num_seconds(), SECS_PER_HOUR);

    let is_stagnant = gap_hours > catalog.stagnation_hours();

    let key = classification_key(ticket);
    if !catalog.contains(&key) {
        tracing::trace!(ticket = %ticket.id, %key, "unknown threshold key, using default entry");
    }
    let thresholds = catalog.lookup(&key);

    let overdue_by_time = max_hours >= thresholds.warning;
    if !overdue_by_time && !is_stagnant {
        return OverdueInfo::NOT_OVERDUE;
    }

    if is_stagnant && !overdue_by_time {
        return OverdueInfo {
            is_overdue: true,
            level: EscalationLevel::Stagnant,
            hours_overdue: gap_hours,
            days_overdue: floor_div(gap_hours, 24),
        };
    }

    let level = if max_hours >= thresholds.severe {
        EscalationLevel::Severe
    } else if max_hours >= thresholds.critical {
        EscalationLevel::Critical
    } else {
        EscalationLevel::Warning
    };
    OverdueInfo {
        is_overdue: true,
        level,
        hours_overdue: max_hours,
        days_overdue: max_days,
    }
}

/// Classifies `ticket` with the catalog its source maps to.
pub fn classify_with(ticket: &Ticket, now: DateTime<Utc>, catalogs: &CatalogSet) -> OverdueInfo {
    classify(ticket, now, catalogs.for_source(ticket.source))
}

/// Full classified list, in input order.
pub fn classify_all(
    tickets: &[Ticket],
    now: DateTime<Utc>,
    catalogs: &CatalogSet,
) -> Vec<ClassifiedTicket> {
    tickets
        .iter()
        .map(|ticket| ClassifiedTicket {
            ticket: ticket.clone(),
            overdue: classify_with(ticket, now, catalogs),
        })
        .collect()
}

fn floor_div(value: i64, divisor: i64) -> i64 {
    value.div_euclid(divisor)
}
