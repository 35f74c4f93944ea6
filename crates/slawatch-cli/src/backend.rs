//! Where the CLI gets its inputs: ticket files, configuration, the clock
//! and the log sink.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use slawatch_core::config::LoggingConfig;
use slawatch_core::{Config, SlaError};

pub trait TicketBackend {
    fn read_file(&self, path: &Path) -> Result<String, SlaError>;
    fn load_config(&self, explicit: Option<&Path>) -> Result<Config, SlaError>;
    fn now(&self) -> DateTime<Utc>;
    fn install_logging(&self, logging: &LoggingConfig) -> Result<(), String>;
}

/// Production backend: real files, environment-aware config, wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct FilesystemTicketBackend;

impl TicketBackend for FilesystemTicketBackend {
    fn read_file(&self, path: &Path) -> Result<String, SlaError> {
        std::fs::read_to_string(path).map_err(|source| SlaError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    fn load_config(&self, explicit: Option<&Path>) -> Result<Config, SlaError> {
        Config::resolve(explicit)
    }

    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn install_logging(&self, logging: &LoggingConfig) -> Result<(), String> {
        crate::logging::init_logging(logging)
    }
}

/// Test backend with fixed files, a fixed clock and no log output.
#[derive(Debug, Clone)]
pub struct InMemoryTicketBackend {
    files: HashMap<PathBuf, String>,
    config: Config,
    now: DateTime<Utc>,
}

impl InMemoryTicketBackend {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            files: HashMap::new(),
            config: Config::default(),
            now,
        }
    }

    pub fn with_file(mut self, path: impl Into<PathBuf>, contents: impl Into<String>) -> Self {
        self.files.insert(path.into(), contents.into());
        self
    }

    /// Config returned when no `--config` path is given.
    pub fn with_config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }
}

impl TicketBackend for InMemoryTicketBackend {
    fn read_file(&self, path: &Path) -> Result<String, SlaError> {
        self.files.get(path).cloned().ok_or_else(|| SlaError::Io {
            path: path.to_path_buf(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
        })
    }

    fn load_config(&self, explicit: Option<&Path>) -> Result<Config, SlaError> {
        let config = match explicit {
            Some(path) => Config::parse(&self.read_file(path)?, path)?,
            None => self.config.clone(),
        };
        config.validate()?;
        Ok(config)
    }

    fn now(&self) -> DateTime<Utc> {
        self.now
    }

    fn install_logging(&self, _logging: &LoggingConfig) -> Result<(), String> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::path::Path;

    use chrono::{TimeZone, Utc};
    use slawatch_core::Config;

    use super::{FilesystemTicketBackend, InMemoryTicketBackend, TicketBackend};

    #[test]
    fn in_memory_missing_file_is_an_io_error() {
        let now = match Utc.with_ymd_and_hms(2026, 1, 5, 9, 0, 0).single() {
            Some(now) => now,
            None => panic!("valid time"),
        };
        let backend = InMemoryTicketBackend::new(now);
        match backend.read_file(Path::new("missing.json")) {
            Err(err) => assert!(err.to_string().starts_with("read missing.json")),
            Ok(text) => panic!("unexpected contents: {text}"),
        }
        assert_eq!(backend.now(), now);
    }

    #[test]
    fn filesystem_backend_reads_files_and_explicit_config() {
        let dir = match tempfile::tempdir() {
            Ok(dir) => dir,
            Err(err) => panic!("tempdir: {err}"),
        };
        let config_path = dir.path().join("config.yaml");
        let mut file = match std::fs::File::create(&config_path) {
            Ok(file) => file,
            Err(err) => panic!("create config: {err}"),
        };
        if let Err(err) = writeln!(file, "reporting:\n  top_clients_limit: 3") {
            panic!("write config: {err}");
        }

        let backend = FilesystemTicketBackend;
        let text = match backend.read_file(&config_path) {
            Ok(text) => text,
            Err(err) => panic!("read: {err}"),
        };
        assert!(text.contains("top_clients_limit"));
        match Config::load(&config_path) {
            Ok(config) => assert_eq!(config.reporting.top_clients_limit, 3),
            Err(err) => panic!("load: {err}"),
        }
    }
}
