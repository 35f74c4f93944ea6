//! Threshold catalogs: per-source escalation boundaries in hours.
//!
//! Catalogs are plain immutable data. The built-in tables are constructed
//! once per process; a configuration file may derive adjusted copies at
//! startup, but nothing mutates a catalog after construction.

use std::collections::HashMap;
use std::fmt;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

use crate::error::SlaError;
use crate::source::{CatalogFamily, SourceSystem};
use crate::status::{CanonicalStatus, ItsmPriority, Priority, Severity};

/// Escalation boundaries in hours: warning <= critical <= severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThresholdEntry {
    pub warning: i64,
    pub critical: i64,
    pub severe: i64,
}

impl ThresholdEntry {
    pub const fn new(warning: i64, critical: i64, severe: i64) -> Self {
        Self {
            warning,
            critical,
            severe,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItsmKind {
    Incident,
    Change,
}

impl ItsmKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Incident => "incident",
            Self::Change => "change",
        }
    }
}

/// Classification key a ticket is looked up by. The shape depends on the
/// catalog family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ThresholdKey {
    Severity(Severity),
    /// `strict` marks the high-priority issue types (bug, incident, story, epic).
    Issue { priority: Priority, strict: bool },
    Itsm { kind: ItsmKind, priority: ItsmPriority },
}

impl ThresholdKey {
    /// Parses the textual key used in configuration files: `S1`, `default`,
    /// `high/strict`, `low/regular`, `incident/P1`, `change/default`.
    pub fn parse(family: CatalogFamily, text: &str) -> Result<Self, SlaError> {
        let invalid = || SlaError::InvalidThresholdKey {
            family: family.as_str(),
            key: text.to_string(),
        };
        let normalized = text.trim().to_ascii_lowercase();
        match family {
            CatalogFamily::CaseManagement => match normalized.as_str() {
                "s1" => Ok(Self::Severity(Severity::S1)),
                "s2" => Ok(Self::Severity(Severity::S2)),
                "s3" => Ok(Self::Severity(Severity::S3)),
                "default" => Ok(Self::Severity(Severity::Other)),
                _ => Err(invalid()),
            },
            CatalogFamily::IssueTracker => {
                let (priority, class) = normalized.split_once('/').ok_or_else(invalid)?;
                let priority = match priority {
                    "highest" => Priority::Highest,
                    "critical" => Priority::Critical,
                    "high" => Priority::High,
                    "medium" => Priority::Medium,
                    "low" => Priority::Low,
                    _ => return Err(invalid()),
                };
                let strict = match class {
                    "strict" => true,
                    "regular" => false,
                    _ => return Err(invalid()),
                };
                Ok(Self::Issue { priority, strict })
            }
            CatalogFamily::Itsm => {
                let (kind, priority) = normalized.split_once('/').ok_or_else(invalid)?;
                let kind = match kind {
                    "incident" => ItsmKind::Incident,
                    "change" => ItsmKind::Change,
                    _ => return Err(invalid()),
                };
                let priority = match priority {
                    "p1" => ItsmPriority::P1,
                    "p2" => ItsmPriority::P2,
                    "p3" => ItsmPriority::P3,
                    "default" => ItsmPriority::Other,
                    _ => return Err(invalid()),
                };
                Ok(Self::Itsm { kind, priority })
            }
        }
    }
}

impl fmt::Display for ThresholdKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Severity(severity) => f.write_str(severity.as_str()),
            Self::Issue { priority, strict } => {
                let class = if *strict { "strict" } else { "regular" };
                write!(f, "{}/{class}", priority.as_str())
            }
            Self::Itsm { kind, priority } => write!(f, "{}/{}", kind.as_str(), priority.as_str()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThresholdCatalog {
    family: CatalogFamily,
    entries: HashMap<ThresholdKey, ThresholdEntry>,
    default_entry: ThresholdEntry,
    stagnation_hours: i64,
    closed_statuses: Vec<CanonicalStatus>,
}

impl ThresholdCatalog {
    pub fn new(
        family: CatalogFamily,
        entries: impl IntoIterator<Item = (ThresholdKey, ThresholdEntry)>,
        default_entry: ThresholdEntry,
        stagnation_hours: i64,
        closed_statuses: Vec<CanonicalStatus>,
    ) -> Self {
        Self {
            family,
            entries: entries.into_iter().collect(),
            default_entry,
            stagnation_hours,
            closed_statuses,
        }
    }

    /// Case-management catalog, keyed by severity.
    pub fn case_management() -> Self {
        Self::new(
            CatalogFamily::CaseManagement,
            [
                (
                    ThresholdKey::Severity(Severity::S1),
                    ThresholdEntry::new(2, 6, 12),
                ),
                (
                    ThresholdKey::Severity(Severity::S2),
                    ThresholdEntry::new(4, 12, 24),
                ),
                (
                    ThresholdKey::Severity(Severity::S3),
                    ThresholdEntry::new(8, 24, 48),
                ),
            ],
            ThresholdEntry::new(12, 48, 96),
            24,
            vec![
                CanonicalStatus::Resolved,
                CanonicalStatus::Closed,
                CanonicalStatus::Cancelled,
            ],
        )
    }

    /// Issue-tracker catalog, keyed by priority and type class.
    pub fn issue_tracker() -> Self {
        let strict = [
            (Priority::Highest, ThresholdEntry::new(4, 12, 24)),
            (Priority::Critical, ThresholdEntry::new(4, 12, 24)),
            (Priority::High, ThresholdEntry::new(12, 24, 72)),
            (Priority::Medium, ThresholdEntry::new(24, 72, 168)),
            (Priority::Low, ThresholdEntry::new(72, 168, 336)),
        ];
        let regular = [
            (Priority::Highest, ThresholdEntry::new(8, 24, 48)),
            (Priority::Critical, ThresholdEntry::new(8, 24, 48)),
            (Priority::High, ThresholdEntry::new(24, 48, 120)),
            (Priority::Medium, ThresholdEntry::new(48, 120, 240)),
            (Priority::Low, ThresholdEntry::new(120, 240, 480)),
        ];
        let entries = strict
            .into_iter()
            .map(|(priority, entry)| {
                (
                    ThresholdKey::Issue {
                        priority,
                        strict: true,
                    },
                    entry,
                )
            })
            .chain(regular.into_iter().map(|(priority, entry)| {
                (
                    ThresholdKey::Issue {
                        priority,
                        strict: false,
                    },
                    entry,
                )
            }));
        Self::new(
            CatalogFamily::IssueTracker,
            entries,
            ThresholdEntry::new(48, 120, 240),
            72,
            vec![
                CanonicalStatus::Done,
                CanonicalStatus::Resolved,
                CanonicalStatus::Closed,
                CanonicalStatus::Cancelled,
            ],
        )
    }

    /// ITSM catalog, keyed by ticket kind and priority.
    pub fn itsm() -> Self {
        let rows = [
            (ItsmKind::Incident, ItsmPriority::P1, ThresholdEntry::new(2, 4, 8)),
            (ItsmKind::Incident, ItsmPriority::P2, ThresholdEntry::new(8, 24, 48)),
            (ItsmKind::Incident, ItsmPriority::P3, ThresholdEntry::new(24, 72, 168)),
            (ItsmKind::Incident, ItsmPriority::Other, ThresholdEntry::new(48, 168, 336)),
            (ItsmKind::Change, ItsmPriority::P1, ThresholdEntry::new(8, 24, 72)),
            (ItsmKind::Change, ItsmPriority::P2, ThresholdEntry::new(24, 72, 168)),
            (ItsmKind::Change, ItsmPriority::P3, ThresholdEntry::new(72, 168, 336)),
            (ItsmKind::Change, ItsmPriority::Other, ThresholdEntry::new(168, 336, 720)),
        ];
        Self::new(
            CatalogFamily::Itsm,
            rows.into_iter()
                .map(|(kind, priority, entry)| (ThresholdKey::Itsm { kind, priority }, entry)),
            ThresholdEntry::new(48, 168, 336),
            48,
            vec![
                CanonicalStatus::Resolved,
                CanonicalStatus::Closed,
                CanonicalStatus::Cancelled,
                CanonicalStatus::Done,
            ],
        )
    }

    pub fn family(&self) -> CatalogFamily {
        self.family
    }

    /// Entry for `key`, or the default entry when the key is not in the table.
    pub fn lookup(&self, key: &ThresholdKey) -> ThresholdEntry {
        self.entries
            .get(key)
            .copied()
            .unwrap_or(self.default_entry)
    }

    pub fn contains(&self, key: &ThresholdKey) -> bool {
        self.entries.contains_key(key)
    }

    pub fn default_entry(&self) -> ThresholdEntry {
        self.default_entry
    }

    pub fn stagnation_hours(&self) -> i64 {
        self.stagnation_hours
    }

    pub fn closed_statuses(&self) -> &[CanonicalStatus] {
        &self.closed_statuses
    }

    pub fn is_closed_status(&self, status: CanonicalStatus) -> bool {
        self.closed_statuses.contains(&status)
    }

    /// Table rows in a stable order, for display.
    pub fn entries(&self) -> Vec<(ThresholdKey, ThresholdEntry)> {
        let mut rows = self
            .entries
            .iter()
            .map(|(key, entry)| (*key, *entry))
            .collect::<Vec<_>>();
        rows.sort_by(|a, b| a.0.cmp(&b.0));
        rows
    }

    /// Copy of this catalog with the given adjustments applied.
    pub fn with_overrides(
        &self,
        stagnation_hours: Option<i64>,
        entries: &[(ThresholdKey, ThresholdEntry)],
        default_entry: Option<ThresholdEntry>,
    ) -> Self {
        let mut derived = self.clone();
        if let Some(hours) = stagnation_hours {
            derived.stagnation_hours = hours;
        }
        for (key, entry) in entries {
            // The case-management default row lives outside the table.
            if *key == ThresholdKey::Severity(Severity::Other) {
                derived.default_entry = *entry;
            } else {
                derived.entries.insert(*key, *entry);
            }
        }
        if let Some(entry) = default_entry {
            derived.default_entry = entry;
        }
        derived
    }
}

/// One catalog per source family.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogSet {
    pub case_management: ThresholdCatalog,
    pub issue_tracker: ThresholdCatalog,
    pub itsm: ThresholdCatalog,
}

impl CatalogSet {
    pub fn builtin() -> Self {
        Self {
            case_management: ThresholdCatalog::case_management(),
            issue_tracker: ThresholdCatalog::issue_tracker(),
            itsm: ThresholdCatalog::itsm(),
        }
    }

    pub fn for_family(&self, family: CatalogFamily) -> &ThresholdCatalog {
        match family {
            CatalogFamily::CaseManagement => &self.case_management,
            CatalogFamily::IssueTracker => &self.issue_tracker,
            CatalogFamily::Itsm => &self.itsm,
        }
    }

    pub fn for_source(&self, source: SourceSystem) -> &ThresholdCatalog {
        self.for_family(source.family())
    }
}

impl Default for CatalogSet {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Process-wide built-in catalogs.
pub fn builtin_catalogs() -> &'static CatalogSet {
    static CATALOGS: OnceLock<CatalogSet> = OnceLock::new();
    CATALOGS.get_or_init(CatalogSet::builtin)
}
