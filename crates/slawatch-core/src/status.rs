//! Normalization of free-text status, priority, severity and type labels.
//!
//! Exports mix English and French labels with arbitrary casing, accents and
//! decorations ("1 - Critical", "En cours (Attribué)"). Every normalizer
//! folds the input first and then matches it against a phrase table. Unknown
//! priorities fall back to medium and unknown types to other so a ticket
//! always resolves to some threshold entry.

use std::fmt;

use serde::{Deserialize, Serialize};
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use crate::catalog::ThresholdCatalog;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CanonicalStatus {
    New,
    Open,
    InProgress,
    Pending,
    Resolved,
    Done,
    Closed,
    Cancelled,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Highest,
    Critical,
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueType {
    Bug,
    Story,
    Epic,
    Task,
    Subtask,
    Other,
}

/// Case-management severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Severity {
    S1,
    S2,
    S3,
    Other,
}

/// ITSM priority; anything past P3 shares the default row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ItsmPriority {
    P1,
    P2,
    P3,
    Other,
}

impl CanonicalStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Open => "open",
            Self::InProgress => "in_progress",
            Self::Pending => "pending",
            Self::Resolved => "resolved",
            Self::Done => "done",
            Self::Closed => "closed",
            Self::Cancelled => "cancelled",
            Self::Other => "other",
        }
    }
}

impl Priority {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Highest => "highest",
            Self::Critical => "critical",
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }
}

impl IssueType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Bug => "bug",
            Self::Story => "story",
            Self::Epic => "epic",
            Self::Task => "task",
            Self::Subtask => "subtask",
            Self::Other => "other",
        }
    }
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::S1 => "S1",
            Self::S2 => "S2",
            Self::S3 => "S3",
            Self::Other => "default",
        }
    }
}

impl ItsmPriority {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::P1 => "P1",
            Self::P2 => "P2",
            Self::P3 => "P3",
            Self::Other => "default",
        }
    }
}

impl fmt::Display for CanonicalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

const STATUS_PHRASES: &[(&str, CanonicalStatus)] = &[
    ("closed", CanonicalStatus::Closed),
    ("close", CanonicalStatus::Closed),
    ("clos", CanonicalStatus::Closed),
    ("ferme", CanonicalStatus::Closed),
    ("fermee", CanonicalStatus::Closed),
    ("cloture", CanonicalStatus::Closed),
    ("cloturee", CanonicalStatus::Closed),
    ("cancelled", CanonicalStatus::Cancelled),
    ("canceled", CanonicalStatus::Cancelled),
    ("annule", CanonicalStatus::Cancelled),
    ("annulee", CanonicalStatus::Cancelled),
    ("won't do", CanonicalStatus::Cancelled),
    ("wont do", CanonicalStatus::Cancelled),
    ("rejected", CanonicalStatus::Cancelled),
    ("rejete", CanonicalStatus::Cancelled),
    ("duplicate", CanonicalStatus::Cancelled),
    ("doublon", CanonicalStatus::Cancelled),
    ("resolved", CanonicalStatus::Resolved),
    ("resolu", CanonicalStatus::Resolved),
    ("resolue", CanonicalStatus::Resolved),
    ("solved", CanonicalStatus::Resolved),
    ("fixed", CanonicalStatus::Resolved),
    ("corrige", CanonicalStatus::Resolved),
    ("done", CanonicalStatus::Done),
    ("complete", CanonicalStatus::Done),
    ("completed", CanonicalStatus::Done),
    ("termine", CanonicalStatus::Done),
    ("terminee", CanonicalStatus::Done),
    ("fini", CanonicalStatus::Done),
    ("new", CanonicalStatus::New),
    ("nouveau", CanonicalStatus::New),
    ("nouvelle", CanonicalStatus::New),
    ("to do", CanonicalStatus::New),
    ("todo", CanonicalStatus::New),
    ("a faire", CanonicalStatus::New),
    ("backlog", CanonicalStatus::New),
    ("draft", CanonicalStatus::New),
    ("brouillon", CanonicalStatus::New),
    ("open", CanonicalStatus::Open),
    ("opened", CanonicalStatus::Open),
    ("reopened", CanonicalStatus::Open),
    ("ouvert", CanonicalStatus::Open),
    ("ouverte", CanonicalStatus::Open),
    ("rouvert", CanonicalStatus::Open),
    ("assigned", CanonicalStatus::Open),
    ("assigne", CanonicalStatus::Open),
    ("attribue", CanonicalStatus::Open),
    ("in progress", CanonicalStatus::InProgress),
    ("work in progress", CanonicalStatus::InProgress),
    ("wip", CanonicalStatus::InProgress),
    ("en cours", CanonicalStatus::InProgress),
    ("in review", CanonicalStatus::InProgress),
    ("en revue", CanonicalStatus::InProgress),
    ("scheduled", CanonicalStatus::InProgress),
    ("planifie", CanonicalStatus::InProgress),
    ("implement", CanonicalStatus::InProgress),
    ("pending", CanonicalStatus::Pending),
    ("waiting", CanonicalStatus::Pending),
    ("on hold", CanonicalStatus::Pending),
    ("en attente", CanonicalStatus::Pending),
    ("awaiting customer", CanonicalStatus::Pending),
    ("attente client", CanonicalStatus::Pending),
    ("suspended", CanonicalStatus::Pending),
    ("suspendu", CanonicalStatus::Pending),
];

const PRIORITY_PHRASES: &[(&str, Priority)] = &[
    ("highest", Priority::Highest),
    ("blocker", Priority::Highest),
    ("bloquant", Priority::Highest),
    ("bloquante", Priority::Highest),
    ("very high", Priority::Highest),
    ("tres haute", Priority::Highest),
    ("urgent", Priority::Highest),
    ("urgente", Priority::Highest),
    ("critical", Priority::Critical),
    ("critique", Priority::Critical),
    ("high", Priority::High),
    ("haute", Priority::High),
    ("elevee", Priority::High),
    ("eleve", Priority::High),
    ("major", Priority::High),
    ("majeure", Priority::High),
    ("majeur", Priority::High),
    ("important", Priority::High),
    ("medium", Priority::Medium),
    ("moyenne", Priority::Medium),
    ("moyen", Priority::Medium),
    ("normal", Priority::Medium),
    ("normale", Priority::Medium),
    ("lowest", Priority::Low),
    ("low", Priority::Low),
    ("basse", Priority::Low),
    ("tres basse", Priority::Low),
    ("faible", Priority::Low),
    ("minor", Priority::Low),
    ("mineure", Priority::Low),
    ("mineur", Priority::Low),
    ("trivial", Priority::Low),
];

const TYPE_PHRASES: &[(&str, IssueType)] = &[
    ("bug", IssueType::Bug),
    ("defect", IssueType::Bug),
    ("defaut", IssueType::Bug),
    ("anomalie", IssueType::Bug),
    ("bogue", IssueType::Bug),
    ("story", IssueType::Story),
    ("user story", IssueType::Story),
    ("histoire", IssueType::Story),
    ("recit", IssueType::Story),
    ("epic", IssueType::Epic),
    ("epique", IssueType::Epic),
    ("sub task", IssueType::Subtask),
    ("subtask", IssueType::Subtask),
    ("sous tache", IssueType::Subtask),
    ("task", IssueType::Task),
    ("tache", IssueType::Task),
];

const ITSM_PRIORITY_WORDS: &[(&str, ItsmPriority)] = &[
    ("critical", ItsmPriority::P1),
    ("critique", ItsmPriority::P1),
    ("high", ItsmPriority::P2),
    ("haute", ItsmPriority::P2),
    ("elevee", ItsmPriority::P2),
    ("moderate", ItsmPriority::P3),
    ("medium", ItsmPriority::P3),
    ("moyenne", ItsmPriority::P3),
];

/// Folds a label: strips accents, lowercases, turns `_`/`-` into spaces and
/// collapses whitespace.
pub fn fold(raw: &str) -> String {
    let stripped = raw
        .nfd()
        .filter(|ch| !is_combining_mark(*ch))
        .flat_map(char::to_lowercase)
        .map(|ch| if ch == '_' || ch == '-' { ' ' } else { ch })
        .collect::<String>();
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub fn normalize_status(raw: &str) -> CanonicalStatus {
    match_phrase(&fold(raw), STATUS_PHRASES).unwrap_or(CanonicalStatus::Other)
}

/// Whether `raw` falls in the catalog's closed-status set.
pub fn is_closed(raw: &str, catalog: &ThresholdCatalog) -> bool {
    catalog.is_closed_status(normalize_status(raw))
}

pub fn normalize_priority(raw: &str) -> Priority {
    let folded = fold(raw);
    match_phrase(strip_rank_prefix(&folded), PRIORITY_PHRASES).unwrap_or(Priority::Medium)
}

pub fn normalize_type(raw: &str) -> IssueType {
    match_phrase(&fold(raw), TYPE_PHRASES).unwrap_or(IssueType::Other)
}

/// Issue types held to the stricter issue-tracker thresholds.
pub fn is_strict_issue_type(raw: &str) -> bool {
    match normalize_type(raw) {
        IssueType::Bug | IssueType::Story | IssueType::Epic => true,
        IssueType::Task | IssueType::Subtask => false,
        IssueType::Other => match_phrase(&fold(raw), &[("incident", ())]).is_some(),
    }
}

pub fn normalize_severity(raw: &str) -> Severity {
    let folded = fold(raw);
    let mut rest = folded.as_str();
    for prefix in ["severity", "severite", "sev", "niveau", "level", "s"] {
        if let Some(stripped) = rest.strip_prefix(prefix) {
            rest = stripped.trim_start();
            break;
        }
    }
    match leading_digit(rest) {
        Some(1) => Severity::S1,
        Some(2) => Severity::S2,
        Some(3) => Severity::S3,
        _ => Severity::Other,
    }
}

pub fn normalize_itsm_priority(raw: &str) -> ItsmPriority {
    let folded = fold(raw);
    let rest = folded.strip_prefix('p').unwrap_or(&folded);
    match leading_digit(rest) {
        Some(1) => ItsmPriority::P1,
        Some(2) => ItsmPriority::P2,
        Some(3) => ItsmPriority::P3,
        Some(_) => ItsmPriority::Other,
        None => match_phrase(&folded, ITSM_PRIORITY_WORDS).unwrap_or(ItsmPriority::Other),
    }
}

fn match_phrase<T: Copy>(folded: &str, table: &[(&str, T)]) -> Option<T> {
    if let Some((_, value)) = table.iter().find(|(phrase, _)| *phrase == folded) {
        return Some(*value);
    }
    table.iter().find_map(|(phrase, value)| {
        let rest = folded.strip_prefix(phrase)?;
        match rest.chars().next() {
            Some(ch) if !ch.is_alphanumeric() && ch != '\'' => Some(*value),
            _ => None,
        }
    })
}

/// Drops decorations like `1 - ` or `p2 ` in front of a priority word.
fn strip_rank_prefix(folded: &str) -> &str {
    let rest = folded.strip_prefix('p').unwrap_or(folded);
    let digits = rest.chars().take_while(char::is_ascii_digit).count();
    if digits == 0 {
        return folded;
    }
    let rest = rest[digits..].trim_start_matches([' ', ':', '.', ')', '(']);
    if rest.is_empty() {
        folded
    } else {
        rest
    }
}

fn leading_digit(value: &str) -> Option<u32> {
    let digits = value
        .chars()
        .take_while(char::is_ascii_digit)
        .collect::<String>();
    digits.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::{
        fold, is_strict_issue_type, normalize_itsm_priority, normalize_priority,
        normalize_severity, normalize_status, normalize_type, CanonicalStatus, IssueType,
        ItsmPriority, Priority, Severity,
    };

    #[test]
    fn fold_strips_accents_case_and_separators() {
        assert_eq!(fold("  Fermé "), "ferme");
        assert_eq!(fold("Sous-Tâche"), "sous tache");
        assert_eq!(fold("IN_PROGRESS"), "in progress");
        assert_eq!(fold("Très   Haute"), "tres haute");
    }

    #[test]
    fn status_matches_english_and_french() {
        assert_eq!(normalize_status("Closed"), CanonicalStatus::Closed);
        assert_eq!(normalize_status("fermé"), CanonicalStatus::Closed);
        assert_eq!(normalize_status("Clôturé"), CanonicalStatus::Closed);
        assert_eq!(normalize_status("Résolu"), CanonicalStatus::Resolved);
        assert_eq!(normalize_status("Ouvert"), CanonicalStatus::Open);
        assert_eq!(normalize_status("En cours (Attribué)"), CanonicalStatus::InProgress);
        assert_eq!(normalize_status("Won't Do"), CanonicalStatus::Cancelled);
        assert_eq!(normalize_status("Terminé"), CanonicalStatus::Done);
        assert_eq!(normalize_status("En attente"), CanonicalStatus::Pending);
    }

    #[test]
    fn status_prefix_match_respects_word_boundaries() {
        assert_eq!(normalize_status("Closed - Resolved"), CanonicalStatus::Closed);
        assert_eq!(normalize_status("closedish"), CanonicalStatus::Other);
        assert_eq!(normalize_status(""), CanonicalStatus::Other);
    }

    #[test]
    fn priority_defaults_to_medium() {
        assert_eq!(normalize_priority("Highest"), Priority::Highest);
        assert_eq!(normalize_priority("Critique"), Priority::Critical);
        assert_eq!(normalize_priority("haute"), Priority::High);
        assert_eq!(normalize_priority("2 - High"), Priority::High);
        assert_eq!(normalize_priority("Basse"), Priority::Low);
        assert_eq!(normalize_priority("Très haute"), Priority::Highest);
        assert_eq!(normalize_priority("whatever"), Priority::Medium);
        assert_eq!(normalize_priority(""), Priority::Medium);
    }

    #[test]
    fn type_defaults_to_other() {
        assert_eq!(normalize_type("Bug"), IssueType::Bug);
        assert_eq!(normalize_type("Sub-task"), IssueType::Subtask);
        assert_eq!(normalize_type("Sous-tâche"), IssueType::Subtask);
        assert_eq!(normalize_type("Tâche"), IssueType::Task);
        assert_eq!(normalize_type("Épique"), IssueType::Epic);
        assert_eq!(normalize_type("Spike"), IssueType::Other);
    }

    #[test]
    fn strict_issue_types_include_incident() {
        assert!(is_strict_issue_type("Bug"));
        assert!(is_strict_issue_type("Story"));
        assert!(is_strict_issue_type("Epic"));
        assert!(is_strict_issue_type("Incident"));
        assert!(!is_strict_issue_type("Task"));
        assert!(!is_strict_issue_type("Spike"));
    }

    #[test]
    fn severity_accepts_numeric_spellings() {
        assert_eq!(normalize_severity("1"), Severity::S1);
        assert_eq!(normalize_severity("S2"), Severity::S2);
        assert_eq!(normalize_severity("Sev 3"), Severity::S3);
        assert_eq!(normalize_severity("Sévérité 1 - Critique"), Severity::S1);
        assert_eq!(normalize_severity("4"), Severity::Other);
        assert_eq!(normalize_severity("unknown"), Severity::Other);
    }

    #[test]
    fn itsm_priority_accepts_numbers_and_words() {
        assert_eq!(normalize_itsm_priority("1 - Critical"), ItsmPriority::P1);
        assert_eq!(normalize_itsm_priority("P2"), ItsmPriority::P2);
        assert_eq!(normalize_itsm_priority("Moderate"), ItsmPriority::P3);
        assert_eq!(normalize_itsm_priority("4 - Low"), ItsmPriority::Other);
        assert_eq!(normalize_itsm_priority(""), ItsmPriority::Other);
    }
}
