//! Origin systems a ticket can come from.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::SlaError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SourceSystem {
    /// Customer case-management tool (cases keyed by severity).
    CaseManagement,
    /// Issue tracker (issues keyed by priority and issue type).
    IssueTracker,
    /// ITSM change-request module.
    ItsmChange,
    /// ITSM incident module.
    ItsmIncident,
}

/// Threshold catalogs are shared by sources of the same family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CatalogFamily {
    CaseManagement,
    IssueTracker,
    Itsm,
}

impl SourceSystem {
    pub const ALL: [SourceSystem; 4] = [
        SourceSystem::CaseManagement,
        SourceSystem::IssueTracker,
        SourceSystem::ItsmChange,
        SourceSystem::ItsmIncident,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::CaseManagement => "case-management",
            Self::IssueTracker => "issue-tracker",
            Self::ItsmChange => "itsm-change",
            Self::ItsmIncident => "itsm-incident",
        }
    }

    /// Human-readable label used in alert digests and report headers.
    pub fn label(self) -> &'static str {
        match self {
            Self::CaseManagement => "Case management",
            Self::IssueTracker => "Issue tracker",
            Self::ItsmChange => "ITSM changes",
            Self::ItsmIncident => "ITSM incidents",
        }
    }

    pub fn family(self) -> CatalogFamily {
        match self {
            Self::CaseManagement => CatalogFamily::CaseManagement,
            Self::IssueTracker => CatalogFamily::IssueTracker,
            Self::ItsmChange | Self::ItsmIncident => CatalogFamily::Itsm,
        }
    }

    /// Tickets counted as incidents in client risk scoring.
    pub fn is_incident(self) -> bool {
        matches!(self, Self::CaseManagement | Self::ItsmIncident)
    }

    pub fn is_change(self) -> bool {
        self == Self::ItsmChange
    }
}

impl CatalogFamily {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::CaseManagement => "case-management",
            Self::IssueTracker => "issue-tracker",
            Self::Itsm => "itsm",
        }
    }
}

impl fmt::Display for SourceSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceSystem {
    type Err = SlaError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase().replace(['_', ' '], "-");
        match normalized.as_str() {
            "case-management" | "cases" | "case" => Ok(Self::CaseManagement),
            "issue-tracker" | "issues" | "issue" => Ok(Self::IssueTracker),
            "itsm-change" | "change" | "changes" => Ok(Self::ItsmChange),
            "itsm-incident" | "incident" | "incidents" => Ok(Self::ItsmIncident),
            _ => Err(SlaError::UnknownSource(value.to_string())),
        }
    }
}
