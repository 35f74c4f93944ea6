//! slawatch-core: SLA classification and analytics over normalized tickets.
//!
//! Tickets from the case-management tool, the issue tracker and the two ITSM
//! modules are classified against per-source threshold catalogs and rolled up
//! into owner, team and client analytics. Every entry point is a pure
//! function of a ticket batch and an explicit reference time.

pub mod alert;
pub mod analysis;
pub mod catalog;
pub mod classify;
pub mod clients;
pub mod config;
pub mod error;
pub mod source;
pub mod status;
pub mod ticket;

pub use alert::{build_overdue_alert, OverdueAlert};
pub use analysis::{analyze, Analysis, AnalysisAccumulator};
pub use catalog::{builtin_catalogs, CatalogSet, ThresholdCatalog, ThresholdEntry, ThresholdKey};
pub use classify::{
    classify, classify_all, classify_with, ClassifiedTicket, EscalationLevel, OverdueInfo,
};
pub use clients::{aggregate_clients, risk_clients, top_clients, ClientAnalytics, ClientLedger};
pub use config::Config;
pub use error::SlaError;
pub use source::SourceSystem;
pub use ticket::{decode_tickets, Ticket};

/// Crate identity label used by smoke tests.
pub fn crate_label() -> &'static str {
    "slawatch-core"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_label_is_stable() {
        assert_eq!(crate_label(), "slawatch-core");
    }

    #[test]
    fn modules_are_accessible() {
        let _ = EscalationLevel::Stagnant;
        let _ = SourceSystem::ItsmChange;
        let _ = OverdueInfo::NOT_OVERDUE;
        let _ = Config::default();
        let _ = builtin_catalogs().for_source(SourceSystem::IssueTracker);
        let _ = SlaError::InvalidConfig("test".into());
    }
}
