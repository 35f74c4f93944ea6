//! Configuration for slawatch.
//!
//! A YAML file with four sections (`logging`, `reporting`, `alerts`,
//! `thresholds`), all optional, layered with a few environment overrides.
//! Threshold overrides derive new catalogs from the built-in tables at
//! startup; without them the built-in tables apply unchanged.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::catalog::{CatalogSet, ThresholdCatalog, ThresholdEntry, ThresholdKey};
use crate::clients::{DEFAULT_RISK_CLIENTS, DEFAULT_RISK_THRESHOLD, DEFAULT_TOP_CLIENTS};
use crate::error::SlaError;
use crate::source::CatalogFamily;

pub const CONFIG_FILE_NAME: &str = "config.yaml";
pub const ENV_LOG_LEVEL: &str = "SLAWATCH_LOG_LEVEL";
pub const ENV_LOG_FORMAT: &str = "SLAWATCH_LOG_FORMAT";
pub const ENV_ALERT_RECIPIENTS: &str = "SLAWATCH_ALERT_RECIPIENTS";

// ---------------------------------------------------------------------------
// Root config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub logging: LoggingConfig,
    pub reporting: ReportingConfig,
    pub alerts: AlertConfig,
    pub thresholds: ThresholdOverrides,
}

impl Config {
    /// Reads and parses a config file. An empty file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, SlaError> {
        let text = std::fs::read_to_string(path).map_err(|source| SlaError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text, path)
    }

    /// Parses config text; `path` is only used in error messages.
    pub fn parse(text: &str, path: &Path) -> Result<Self, SlaError> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(text).map_err(|source| SlaError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Loads `explicit` if given, else the first config file found in the
    /// search path, else defaults; then applies environment overrides and
    /// validates.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self, SlaError> {
        let path = explicit.map(Path::to_path_buf).or_else(find_config_file);
        let mut config = match &path {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };
        config.apply_env(|name| std::env::var(name).ok());
        config.validate()?;
        Ok(config)
    }

    /// Applies `SLAWATCH_*` overrides read through `lookup`.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(level) = lookup(ENV_LOG_LEVEL).filter(|value| !value.trim().is_empty()) {
            self.logging.level = level.trim().to_string();
        }
        if let Some(format) = lookup(ENV_LOG_FORMAT).filter(|value| !value.trim().is_empty()) {
            self.logging.format = format.trim().to_string();
        }
        if let Some(recipients) = lookup(ENV_ALERT_RECIPIENTS) {
            self.alerts.recipients = recipients
                .split(',')
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .map(str::to_string)
                .collect();
        }
    }

    /// Validates the entire configuration.
    pub fn validate(&self) -> Result<(), SlaError> {
        let invalid = |message: String| Err(SlaError::InvalidConfig(message));

        // Logging
        match self.logging.level.trim().to_ascii_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => {
                return invalid(
                    "logging.level must be one of trace, debug, info, warn, error".into(),
                )
            }
        }
        match self.logging.format.trim().to_ascii_lowercase().as_str() {
            "console" | "json" => {}
            _ => return invalid("logging.format must be one of console, json".into()),
        }

        // Reporting
        if self.reporting.top_clients_limit < 1 {
            return invalid("reporting.top_clients_limit must be at least 1".into());
        }
        if self.reporting.risk_clients_limit < 1 {
            return invalid("reporting.risk_clients_limit must be at least 1".into());
        }
        if !(0.0..=100.0).contains(&self.reporting.risk_score_threshold) {
            return invalid("reporting.risk_score_threshold must be between 0 and 100".into());
        }

        // Alerts
        for (i, recipient) in self.alerts.recipients.iter().enumerate() {
            let recipient = recipient.trim();
            let valid = recipient
                .split_once('@')
                .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.'));
            if !valid {
                return invalid(format!(
                    "alerts.recipients[{i}] is not an e-mail address: {recipient:?}"
                ));
            }
        }

        // Thresholds
        self.catalogs().map(|_| ())
    }

    /// Effective threshold catalogs: built-in tables plus any overrides.
    pub fn catalogs(&self) -> Result<CatalogSet, SlaError> {
        Ok(CatalogSet {
            case_management: apply_override(
                ThresholdCatalog::case_management(),
                self.thresholds.case_management.as_ref(),
            )?,
            issue_tracker: apply_override(
                ThresholdCatalog::issue_tracker(),
                self.thresholds.issue_tracker.as_ref(),
            )?,
            itsm: apply_override(ThresholdCatalog::itsm(), self.thresholds.itsm.as_ref())?,
        })
    }
}

// ---------------------------------------------------------------------------
// Section configs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: "console".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReportingConfig {
    pub top_clients_limit: usize,
    pub risk_score_threshold: f64,
    pub risk_clients_limit: usize,
}

impl Default for ReportingConfig {
    fn default() -> Self {
        Self {
            top_clients_limit: DEFAULT_TOP_CLIENTS,
            risk_score_threshold: DEFAULT_RISK_THRESHOLD,
            risk_clients_limit: DEFAULT_RISK_CLIENTS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AlertConfig {
    pub recipients: Vec<String>,
    pub include_stagnant: bool,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            recipients: Vec::new(),
            include_stagnant: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ThresholdOverrides {
    pub case_management: Option<CatalogOverride>,
    pub issue_tracker: Option<CatalogOverride>,
    pub itsm: Option<CatalogOverride>,
}

/// Adjustments to one catalog. Entry keys use [`ThresholdKey::parse`]
/// syntax; `default` targets the catalog's default entry.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CatalogOverride {
    pub stagnation_hours: Option<i64>,
    pub entries: BTreeMap<String, ThresholdEntry>,
}

fn apply_override(
    base: ThresholdCatalog,
    overrides: Option<&CatalogOverride>,
) -> Result<ThresholdCatalog, SlaError> {
    let Some(overrides) = overrides else {
        return Ok(base);
    };
    let family = base.family();
    let section = format!("thresholds.{}", section_name(family));

    if let Some(hours) = overrides.stagnation_hours {
        if hours < 1 {
            return Err(SlaError::InvalidConfig(format!(
                "{section}.stagnation_hours must be at least 1"
            )));
        }
    }

    let mut entries = Vec::new();
    let mut default_entry = None;
    for (text, entry) in &overrides.entries {
        if entry.warning < 1 || entry.warning > entry.critical || entry.critical > entry.severe {
            return Err(SlaError::InvalidConfig(format!(
                "{section}.entries.{text} must satisfy 1 <= warning <= critical <= severe"
            )));
        }
        if family != CatalogFamily::CaseManagement && text.trim().eq_ignore_ascii_case("default")
        {
            default_entry = Some(*entry);
            continue;
        }
        entries.push((ThresholdKey::parse(family, text)?, *entry));
    }

    Ok(base.with_overrides(overrides.stagnation_hours, &entries, default_entry))
}

fn section_name(family: CatalogFamily) -> &'static str {
    match family {
        CatalogFamily::CaseManagement => "case_management",
        CatalogFamily::IssueTracker => "issue_tracker",
        CatalogFamily::Itsm => "itsm",
    }
}

/// Search for a configuration file in the standard locations.
/// Returns `None` if no config file is found.
pub fn find_config_file() -> Option<PathBuf> {
    config_search_paths()
        .into_iter()
        .map(|dir| dir.join(CONFIG_FILE_NAME))
        .find(|candidate| candidate.is_file())
}

/// Returns the list of directories to search for config files.
fn config_search_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();

    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        if !xdg.trim().is_empty() {
            paths.push(Path::new(&xdg).join("slawatch"));
        }
    }

    if let Some(home) = std::env::var_os("HOME").filter(|home| !home.is_empty()) {
        paths.push(PathBuf::from(home).join(".config/slawatch"));
    }

    // Current directory
    paths.push(PathBuf::from("."));

    paths
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::path::Path;

    use super::{Config, ENV_ALERT_RECIPIENTS, ENV_LOG_LEVEL};
    use crate::catalog::{ThresholdEntry, ThresholdKey};
    use crate::status::{Priority, Severity};

    fn parse(text: &str) -> Config {
        match Config::parse(text, Path::new("config.yaml")) {
            Ok(config) => config,
            Err(err) => panic!("parse failed: {err}"),
        }
    }

    #[test]
    fn config_defaults() {
        let cfg = Config::default();
        assert_eq!(cfg.logging.level, "info");
        assert_eq!(cfg.logging.format, "console");
        assert_eq!(cfg.reporting.top_clients_limit, 15);
        assert_eq!(cfg.reporting.risk_score_threshold, 70.0);
        assert_eq!(cfg.reporting.risk_clients_limit, 5);
        assert!(cfg.alerts.include_stagnant);
    }

    #[test]
    fn config_default_validates() {
        assert!(Config::default().validate().is_ok(), "default config must validate");
    }

    #[test]
    fn empty_file_is_default() {
        assert_eq!(parse("\n"), Config::default());
    }

    #[test]
    fn partial_sections_keep_defaults() {
        let cfg = parse("reporting:\n  top_clients_limit: 10\n");
        assert_eq!(cfg.reporting.top_clients_limit, 10);
        assert_eq!(cfg.reporting.risk_clients_limit, 5);
        assert_eq!(cfg.logging.level, "info");
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let result = Config::parse("reportng:\n  top: 1\n", Path::new("config.yaml"));
        match result {
            Ok(_) => panic!("typo must be rejected"),
            Err(err) => assert!(err.to_string().starts_with("parse config config.yaml")),
        }
    }

    #[test]
    fn validate_rejects_bad_log_level() {
        let mut cfg = Config::default();
        cfg.logging.level = "verbose".into();
        match cfg.validate() {
            Ok(()) => panic!("bad level must fail"),
            Err(err) => assert!(err.to_string().contains("logging.level")),
        }
    }

    #[test]
    fn validate_rejects_bad_recipient() {
        let mut cfg = Config::default();
        cfg.alerts.recipients = vec!["ops@example.com".into(), "nobody".into()];
        match cfg.validate() {
            Ok(()) => panic!("bad recipient must fail"),
            Err(err) => assert!(err.to_string().contains("alerts.recipients[1]")),
        }
    }

    #[test]
    fn validate_rejects_out_of_range_risk_threshold() {
        let mut cfg = Config::default();
        cfg.reporting.risk_score_threshold = 120.0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn env_overrides_apply() {
        let mut cfg = Config::default();
        cfg.apply_env(|name| match name {
            ENV_LOG_LEVEL => Some(" debug ".to_string()),
            ENV_ALERT_RECIPIENTS => Some("a@example.com, ,b@example.com".to_string()),
            _ => None,
        });
        assert_eq!(cfg.logging.level, "debug");
        assert_eq!(cfg.logging.format, "console");
        assert_eq!(
            cfg.alerts.recipients,
            vec!["a@example.com".to_string(), "b@example.com".to_string()]
        );
    }

    #[test]
    fn threshold_overrides_build_catalogs() {
        let cfg = parse(
            "thresholds:\n  case_management:\n    stagnation_hours: 36\n    entries:\n      S1: { warning: 1, critical: 3, severe: 6 }\n      default: { warning: 10, critical: 40, severe: 80 }\n  issue_tracker:\n    entries:\n      high/regular: { warning: 20, critical: 40, severe: 100 }\n",
        );
        let catalogs = match cfg.catalogs() {
            Ok(catalogs) => catalogs,
            Err(err) => panic!("catalogs failed: {err}"),
        };
        assert_eq!(catalogs.case_management.stagnation_hours(), 36);
        assert_eq!(
            catalogs
                .case_management
                .lookup(&ThresholdKey::Severity(Severity::S1)),
            ThresholdEntry::new(1, 3, 6)
        );
        assert_eq!(
            catalogs.case_management.default_entry(),
            ThresholdEntry::new(10, 40, 80)
        );
        assert_eq!(
            catalogs.issue_tracker.lookup(&ThresholdKey::Issue {
                priority: Priority::High,
                strict: false
            }),
            ThresholdEntry::new(20, 40, 100)
        );
        assert_eq!(catalogs.itsm.stagnation_hours(), 48);
    }

    #[test]
    fn threshold_overrides_are_validated() {
        let unordered = parse(
            "thresholds:\n  itsm:\n    entries:\n      incident/P1: { warning: 5, critical: 4, severe: 8 }\n",
        );
        match unordered.validate() {
            Ok(()) => panic!("unordered entry must fail"),
            Err(err) => assert!(err
                .to_string()
                .contains("thresholds.itsm.entries.incident/P1")),
        }

        let bad_key =
            parse("thresholds:\n  itsm:\n    entries:\n      P1: { warning: 1, critical: 2, severe: 3 }\n");
        assert!(bad_key.validate().is_err());
    }

    #[test]
    fn load_reads_file_from_disk() {
        let mut file = match tempfile::NamedTempFile::new() {
            Ok(file) => file,
            Err(err) => panic!("tempfile: {err}"),
        };
        if let Err(err) = writeln!(file, "logging:\n  format: json\n") {
            panic!("write: {err}");
        }
        match Config::load(file.path()) {
            Ok(cfg) => assert_eq!(cfg.logging.format, "json"),
            Err(err) => panic!("load failed: {err}"),
        }
        assert!(Config::load(Path::new("/nonexistent/slawatch.yaml")).is_err());
    }
}
