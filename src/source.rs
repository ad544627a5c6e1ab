use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::db::VersionProbe;
use crate::error::{Error, Result};
use crate::rule_set::{load_yaml, RuleSet};

/// Where new rule sets come from.
///
/// Called only from the refresh path, never while classifying. Both calls
/// may block on I/O.
pub trait RuleSource: Send + Sync {
    /// Version token of the rule set the source would currently deliver.
    fn fetch_version(&self) -> Result<String>;

    /// Fetch and build the full rule set.
    fn fetch_rule_set(&self) -> Result<RuleSet>;
}

/// Monotonic time used to decide whether the rules are stale.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Rule source backed by a YAML rule database on disk.
///
/// The version is read from a separate version file when one is configured,
/// otherwise from the `version` key of the database itself.
#[derive(Debug, Clone)]
pub struct FileRuleSource {
    path: PathBuf,
    version_path: Option<PathBuf>,
}

impl FileRuleSource {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            version_path: None,
        }
    }

    /// Read the version token from `path` instead of the database.
    pub fn with_version_file(mut self, path: impl AsRef<Path>) -> Self {
        self.version_path = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RuleSource for FileRuleSource {
    fn fetch_version(&self) -> Result<String> {
        let version = match &self.version_path {
            Some(path) => std::fs::read_to_string(path)?,
            None => load_yaml::<VersionProbe>(&self.path)?.version,
        };
        let version = version.trim();
        if version.is_empty() {
            return Err(Error::Fetch(format!(
                "empty version token for {}",
                self.path.display()
            )));
        }
        Ok(version.to_string())
    }

    fn fetch_rule_set(&self) -> Result<RuleSet> {
        RuleSet::from_yaml_file(&self.path)
    }
}
