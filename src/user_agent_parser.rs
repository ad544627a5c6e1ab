use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crate::error::Result;
use crate::matcher::classify;
use crate::rule_set::RuleSet;
use crate::source::{Clock, RuleSource};
use crate::store::RuleStore;
use crate::types::UserAgent;
use crate::updater::{Updater, UpdaterConfig};

/// Entry point for classifying user-agent strings.
pub trait UserAgentStringParser: Send + Sync {
    /// Classify one user-agent string. Never fails and never blocks on
    /// rule updates.
    fn classify(&self, user_agent: &str) -> UserAgent;

    /// Version token of the rules currently in use.
    fn data_version(&self) -> String;

    /// Stop background activity. Returns immediately.
    fn shutdown(&self);
}

/// Parser over a fixed rule set.
#[derive(Debug)]
pub struct UserAgentParser {
    store: RuleStore,
}

impl UserAgentParser {
    pub fn new(rules: RuleSet) -> Self {
        Self {
            store: RuleStore::new(rules),
        }
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::new(RuleSet::from_yaml_file(path)?))
    }

    pub fn store(&self) -> &RuleStore {
        &self.store
    }
}

impl UserAgentStringParser for UserAgentParser {
    fn classify(&self, user_agent: &str) -> UserAgent {
        classify(user_agent, &self.store.snapshot())
    }

    fn data_version(&self) -> String {
        self.store.version()
    }

    fn shutdown(&self) {}
}

/// Parser whose rules refresh themselves from a [`RuleSource`].
///
/// Every `classify` call doubles as a cheap staleness check; the actual
/// refresh runs on a background thread.
#[derive(Debug)]
pub struct UpdatingUserAgentParser {
    updater: Updater,
}

impl UpdatingUserAgentParser {
    pub fn new(rules: RuleSet, source: Arc<dyn RuleSource>, config: UpdaterConfig) -> Result<Self> {
        let store = Arc::new(RuleStore::new(rules));
        Ok(Self {
            updater: Updater::new(store, source, config)?,
        })
    }

    pub fn with_clock(
        rules: RuleSet,
        source: Arc<dyn RuleSource>,
        clock: Arc<dyn Clock>,
        config: UpdaterConfig,
    ) -> Result<Self> {
        let store = Arc::new(RuleStore::new(rules));
        Ok(Self {
            updater: Updater::with_clock(store, source, clock, config)?,
        })
    }

    /// Fails with `InvalidConfiguration` below the minimum interval; the
    /// previous interval stays in effect.
    pub fn set_refresh_interval(&self, interval: Duration) -> Result<()> {
        self.updater.set_interval(interval)
    }

    pub fn refresh_interval(&self) -> Duration {
        self.updater.interval()
    }

    pub fn store(&self) -> &Arc<RuleStore> {
        self.updater.store()
    }

    pub fn updater(&self) -> &Updater {
        &self.updater
    }
}

impl UserAgentStringParser for UpdatingUserAgentParser {
    fn classify(&self, user_agent: &str) -> UserAgent {
        self.updater.maybe_refresh();
        classify(user_agent, &self.store().snapshot())
    }

    fn data_version(&self) -> String {
        self.store().version()
    }

    fn shutdown(&self) {
        self.updater.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    const RULES: &str = r#"
version: "20240101-01"
browsers:
  - { id: 1, family: Firefox, name: Firefox, type: Browser, patterns: [{ regex: 'Firefox/([\d.]+)' }] }
"#;

    struct NeverNewer;

    impl RuleSource for NeverNewer {
        fn fetch_version(&self) -> Result<String> {
            Err(Error::Fetch("offline".into()))
        }

        fn fetch_rule_set(&self) -> Result<RuleSet> {
            Err(Error::Fetch("offline".into()))
        }
    }

    #[test]
    fn static_parser_classifies() {
        let parser = UserAgentParser::new(RuleSet::from_yaml_str(RULES).unwrap());
        let ua = parser.classify("Mozilla/5.0 Gecko/20100101 Firefox/7.0.1");
        assert_eq!(ua.name, "Firefox");
        assert_eq!(ua.version_number.to_version_string(), "7.0.1");
        assert_eq!(parser.data_version(), "20240101-01");
        parser.shutdown();
        assert_eq!(parser.classify("Firefox/8").name, "Firefox");
    }

    #[test]
    fn failing_source_never_reaches_classify() {
        let parser = UpdatingUserAgentParser::new(
            RuleSet::from_yaml_str(RULES).unwrap(),
            Arc::new(NeverNewer),
            UpdaterConfig::default(),
        )
        .unwrap();
        for _ in 0..10 {
            assert_eq!(parser.classify("Firefox/9.0").name, "Firefox");
        }
        assert_eq!(parser.data_version(), "20240101-01");
        assert!(parser.updater().last_update_check().is_some());
    }

    #[test]
    fn refresh_interval_is_validated() {
        let parser = UpdatingUserAgentParser::new(
            RuleSet::from_yaml_str(RULES).unwrap(),
            Arc::new(NeverNewer),
            UpdaterConfig::default(),
        )
        .unwrap();
        let before = parser.refresh_interval();
        assert!(parser.set_refresh_interval(Duration::from_millis(1)).is_err());
        assert_eq!(parser.refresh_interval(), before);
    }

    #[test]
    fn parsers_are_usable_as_trait_objects() {
        let parsers: Vec<Box<dyn UserAgentStringParser>> = vec![
            Box::new(UserAgentParser::new(RuleSet::from_yaml_str(RULES).unwrap())),
            Box::new(
                UpdatingUserAgentParser::new(
                    RuleSet::from_yaml_str(RULES).unwrap(),
                    Arc::new(NeverNewer),
                    UpdaterConfig::default(),
                )
                .unwrap(),
            ),
        ];
        for parser in &parsers {
            assert!(parser.classify("").is_unrecognized());
            parser.shutdown();
        }
    }
}
