//! Overdue alert digests handed to the e-mail collaborator.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::catalog::CatalogSet;
use crate::classify::{classify_all, ClassifiedTicket, EscalationLevel};
use crate::source::SourceSystem;
use crate::ticket::Ticket;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverdueAlert {
    pub source: SourceSystem,
    pub source_label: String,
    pub recipients: Vec<String>,
    pub generated_at: DateTime<Utc>,
    pub tickets: Vec<ClassifiedTicket>,
}

impl OverdueAlert {
    pub fn is_empty(&self) -> bool {
        self.tickets.is_empty()
    }

    pub fn count_at(&self, level: EscalationLevel) -> usize {
        self.tickets
            .iter()
            .filter(|ticket| ticket.overdue.level == level)
            .count()
    }
}

/// Collects the overdue tickets of `source` from `tickets`, most urgent
/// first: by level, then hours overdue descending, then id.
pub fn build_overdue_alert(
    source: SourceSystem,
    tickets: &[Ticket],
    now: DateTime<Utc>,
    catalogs: &CatalogSet,
    recipients: &[String],
    include_stagnant: bool,
) -> OverdueAlert {
    let from_source = tickets
        .iter()
        .filter(|ticket| ticket.source == source)
        .cloned()
        .collect::<Vec<_>>();
    let mut overdue = classify_all(&from_source, now, catalogs)
        .into_iter()
        .filter(|classified| classified.overdue.is_overdue)
        .filter(|classified| {
            include_stagnant || classified.overdue.level != EscalationLevel::Stagnant
        })
        .collect::<Vec<_>>();
    overdue.sort_by(|a, b| {
        a.overdue
            .level
            .urgency_rank()
            .cmp(&b.overdue.level.urgency_rank())
            .then(b.overdue.hours_overdue.cmp(&a.overdue.hours_overdue))
            .then(a.ticket.id.cmp(&b.ticket.id))
    });

    tracing::debug!(
        source = %source,
        overdue = overdue.len(),
        recipients = recipients.len(),
        "overdue alert built"
    );

    OverdueAlert {
        source,
        source_label: source.label().to_string(),
        recipients: recipients.to_vec(),
        generated_at: now,
        tickets: overdue,
    }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Duration, TimeZone, Utc};

    use super::build_overdue_alert;
    use crate::catalog::builtin_catalogs;
    use crate::classify::EscalationLevel;
    use crate::source::SourceSystem;
    use crate::ticket::Ticket;

    fn now() -> DateTime<Utc> {
        match Utc.with_ymd_and_hms(2026, 5, 12, 12, 0, 0).single() {
            Some(now) => now,
            None => panic!("valid reference time"),
        }
    }

    fn change(id: &str, priority: &str, created: i64, updated: i64) -> Ticket {
        Ticket {
            created_at: Some(now() - Duration::hours(created)),
            updated_at: Some(now() - Duration::hours(updated)),
            priority: Some(priority.to_string()),
            status: "Scheduled".to_string(),
            ..Ticket::new(id, SourceSystem::ItsmChange)
        }
    }

    fn tickets() -> Vec<Ticket> {
        vec![
            change("CHG-1", "P1", 10, 1),
            change("CHG-2", "P1", 80, 1),
            change("CHG-3", "P3", 60, 5),
            change("CHG-4", "P1", 2, 1),
            change("CHG-5", "P1", 30, 30),
            Ticket {
                source: SourceSystem::ItsmIncident,
                ..change("INC-1", "P1", 80, 1)
            },
        ]
    }

    #[test]
    fn keeps_only_overdue_tickets_of_the_source_most_urgent_first() {
        let recipients = vec!["ops@example.com".to_string()];
        let alert = build_overdue_alert(
            SourceSystem::ItsmChange,
            &tickets(),
            now(),
            builtin_catalogs(),
            &recipients,
            true,
        );
        let ids = alert
            .tickets
            .iter()
            .map(|ticket| ticket.ticket.id.as_str())
            .collect::<Vec<_>>();
        assert_eq!(ids, vec!["CHG-2", "CHG-5", "CHG-1", "CHG-3"]);
        assert_eq!(alert.source_label, "ITSM changes");
        assert_eq!(alert.recipients, recipients);
        assert_eq!(alert.count_at(EscalationLevel::Stagnant), 1);
    }

    #[test]
    fn stagnant_tickets_can_be_left_out() {
        let alert = build_overdue_alert(
            SourceSystem::ItsmChange,
            &tickets(),
            now(),
            builtin_catalogs(),
            &[],
            false,
        );
        assert_eq!(alert.count_at(EscalationLevel::Stagnant), 0);
        assert_eq!(alert.tickets.len(), 3);
    }

    #[test]
    fn no_overdue_tickets_yields_an_empty_alert() {
        let alert = build_overdue_alert(
            SourceSystem::CaseManagement,
            &tickets(),
            now(),
            builtin_catalogs(),
            &[],
            true,
        );
        assert!(alert.is_empty());
    }
}
