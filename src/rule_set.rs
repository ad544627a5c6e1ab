use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use indexmap::IndexMap;
use rayon::prelude::*;
use tracing::{debug, warn};

use crate::db::RuleDatabase;
use crate::error::{Error, Result};
use crate::pattern::Pattern;
use crate::pattern_set::PatternSet;
use crate::rules::*;
use crate::types::{BrowserEngineFamily, Category};
use crate::version::VersionNumber;

/// An immutable, fully compiled rule database.
///
/// Built once by [`RuleSet::new`] and shared behind an `Arc`; it is the unit
/// the store swaps atomically. Pattern sets hold indices into the rule
/// vectors, which are sorted by id.
pub struct RuleSet {
    version: String,
    version_number: VersionNumber,
    browsers: Vec<BrowserRule>,
    engines: Vec<EngineRule>,
    operating_systems: Vec<OperatingSystemRule>,
    devices: Vec<DeviceRule>,
    robots: Vec<RobotRule>,
    browser_patterns: PatternSet<usize>,
    engine_patterns: PatternSet<usize>,
    os_patterns: PatternSet<usize>,
    device_patterns: PatternSet<usize>,
    robot_patterns: PatternSet<usize>,
    robot_by_user_agent: HashMap<String, usize>,
    os_by_id: HashMap<u32, usize>,
    /// First engine rule (lowest id) of each family.
    engine_by_family: IndexMap<BrowserEngineFamily, usize>,
    /// First device rule (lowest id) of each category.
    device_by_category: IndexMap<Category, usize>,
}

impl RuleSet {
    /// Validate and compile a rule database.
    ///
    /// Fails on an empty version token, empty names, duplicate ids within a
    /// category, patterns that do not compile, and robots with nothing to
    /// match. Dangling cross references are logged and dropped.
    pub fn new(database: RuleDatabase) -> Result<Self> {
        let RuleDatabase {
            version,
            browsers,
            engines,
            operating_systems,
            devices,
            robots,
        } = database;

        let version = version.trim().to_string();
        if version.is_empty() {
            return Err(Error::InvalidRule("empty version token".into()));
        }

        // Compile every category in parallel; each rule compiles its own
        // patterns.
        let ((browsers, engines), (operating_systems, (devices, robots))) = rayon::join(
            || {
                rayon::join(
                    || compile_all(browsers, BrowserRule::compile),
                    || compile_all(engines, EngineRule::compile),
                )
            },
            || {
                rayon::join(
                    || compile_all(operating_systems, OperatingSystemRule::compile),
                    || {
                        rayon::join(
                            || compile_all(devices, DeviceRule::compile),
                            || compile_all(robots, RobotRule::compile),
                        )
                    },
                )
            },
        );
        let mut browsers = sorted_by_id("browser", browsers?)?;
        let engines = sorted_by_id("engine", engines?)?;
        let operating_systems = sorted_by_id("operating system", operating_systems?)?;
        let devices = sorted_by_id("device", devices?)?;
        let robots = sorted_by_id("robot", robots?)?;

        let os_by_id: HashMap<u32, usize> = operating_systems
            .iter()
            .enumerate()
            .map(|(idx, os)| (os.id, idx))
            .collect();
        for browser in &mut browsers {
            if let Some(os_id) = browser.operating_system {
                if !os_by_id.contains_key(&os_id) {
                    warn!(browser = browser.id, os = os_id, "operating system hint not found, ignoring");
                    browser.operating_system = None;
                }
            }
        }

        let mut engine_by_family = IndexMap::new();
        for (idx, engine) in engines.iter().enumerate() {
            engine_by_family.entry(engine.family).or_insert(idx);
        }
        let mut device_by_category = IndexMap::new();
        for (idx, device) in devices.iter().enumerate() {
            device_by_category.entry(device.category).or_insert(idx);
        }
        let mut robot_by_user_agent = HashMap::new();
        for (idx, robot) in robots.iter().enumerate() {
            if let Some(ua) = &robot.user_agent {
                robot_by_user_agent.entry(ua.clone()).or_insert(idx);
            }
        }

        let ((browser_patterns, engine_patterns), (os_patterns, (device_patterns, robot_patterns))) =
            rayon::join(
                || rayon::join(|| pattern_set(&browsers), || pattern_set(&engines)),
                || {
                    rayon::join(
                        || pattern_set(&operating_systems),
                        || rayon::join(|| pattern_set(&devices), || pattern_set(&robots)),
                    )
                },
            );

        let rule_set = Self {
            version_number: VersionNumber::parse(&version),
            version,
            browsers,
            engines,
            operating_systems,
            devices,
            robots,
            browser_patterns: browser_patterns?,
            engine_patterns: engine_patterns?,
            os_patterns: os_patterns?,
            device_patterns: device_patterns?,
            robot_patterns: robot_patterns?,
            robot_by_user_agent,
            os_by_id,
            engine_by_family,
            device_by_category,
        };
        debug!(
            version = %rule_set.version,
            browser_patterns = rule_set.browser_patterns.len(),
            engine_patterns = rule_set.engine_patterns.len(),
            os_patterns = rule_set.os_patterns.len(),
            device_patterns = rule_set.device_patterns.len(),
            robot_patterns = rule_set.robot_patterns.len(),
            unfiltered = rule_set.unfiltered_patterns(),
            "rule set built"
        );
        Ok(rule_set)
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let database: RuleDatabase = serde_yaml::from_str(yaml)?;
        Self::new(database)
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        Self::new(load_yaml(path.as_ref())?)
    }

    /// Version token as published by the rule source.
    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn version_number(&self) -> &VersionNumber {
        &self.version_number
    }

    pub fn browsers(&self) -> &[BrowserRule] {
        &self.browsers
    }

    pub fn engines(&self) -> &[EngineRule] {
        &self.engines
    }

    pub fn operating_systems(&self) -> &[OperatingSystemRule] {
        &self.operating_systems
    }

    pub fn devices(&self) -> &[DeviceRule] {
        &self.devices
    }

    pub fn robots(&self) -> &[RobotRule] {
        &self.robots
    }

    pub(crate) fn browser_patterns(&self) -> &PatternSet<usize> {
        &self.browser_patterns
    }

    pub(crate) fn engine_patterns(&self) -> &PatternSet<usize> {
        &self.engine_patterns
    }

    pub(crate) fn os_patterns(&self) -> &PatternSet<usize> {
        &self.os_patterns
    }

    pub(crate) fn device_patterns(&self) -> &PatternSet<usize> {
        &self.device_patterns
    }

    pub(crate) fn robot_patterns(&self) -> &PatternSet<usize> {
        &self.robot_patterns
    }

    pub(crate) fn robot_by_user_agent(&self, user_agent: &str) -> Option<&RobotRule> {
        self.robot_by_user_agent
            .get(user_agent)
            .map(|&idx| &self.robots[idx])
    }

    pub(crate) fn operating_system_by_id(&self, id: u32) -> Option<&OperatingSystemRule> {
        self.os_by_id.get(&id).map(|&idx| &self.operating_systems[idx])
    }

    pub(crate) fn engine_by_family(&self, family: BrowserEngineFamily) -> Option<&EngineRule> {
        self.engine_by_family.get(&family).map(|&idx| &self.engines[idx])
    }

    pub(crate) fn device_by_category(&self, category: Category) -> Option<&DeviceRule> {
        self.device_by_category.get(&category).map(|&idx| &self.devices[idx])
    }

    fn unfiltered_patterns(&self) -> usize {
        self.browser_patterns.unfiltered_len()
            + self.engine_patterns.unfiltered_len()
            + self.os_patterns.unfiltered_len()
            + self.device_patterns.unfiltered_len()
            + self.robot_patterns.unfiltered_len()
    }
}

impl fmt::Debug for RuleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuleSet")
            .field("version", &self.version)
            .field("browsers", &self.browsers.len())
            .field("engines", &self.engines.len())
            .field("operating_systems", &self.operating_systems.len())
            .field("devices", &self.devices.len())
            .field("robots", &self.robots.len())
            .finish()
    }
}

pub(crate) fn load_yaml<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_yaml::from_str(&content)?)
}

fn compile_all<E, R>(entries: Vec<E>, compile: fn(E) -> Result<R>) -> Result<Vec<R>>
where
    E: Send,
    R: Send,
{
    entries.into_par_iter().map(compile).collect()
}

fn sorted_by_id<R: Rule>(kind: &str, mut rules: Vec<R>) -> Result<Vec<R>> {
    rules.sort_by_key(|r| r.id());
    if let Some(pair) = rules.windows(2).find(|w| w[0].id() == w[1].id()) {
        return Err(Error::InvalidRule(format!("duplicate {kind} id {}", pair[0].id())));
    }
    Ok(rules)
}

/// One pattern set per category; entry data is the index of the owning rule.
fn pattern_set<R: Rule>(rules: &[R]) -> Result<PatternSet<usize>> {
    let items: Vec<(Arc<Pattern>, u32, usize)> = rules
        .iter()
        .enumerate()
        .flat_map(|(idx, rule)| rule.patterns().iter().map(move |p| (p.clone(), rule.id(), idx)))
        .collect();
    PatternSet::build(items)
}

#[cfg(test)]
mod tests {
    use super::*;

    const YAML: &str = r#"
version: "20240301-02"
engines:
  - { id: 2, family: WebKit, info_url: "https://webkit.org", patterns: [{ regex: 'AppleWebKit/([\d.]+)', position: 50 }] }
  - { id: 1, family: Blink, patterns: [{ regex: 'Chrome/', position: 40 }] }
  - { id: 3, family: WebKit, info_url: "second" }
operating_systems:
  - { id: 10, family: Linux, name: Linux }
browsers:
  - id: 5
    family: Chrome
    name: Chrome
    type: Browser
    engine: Blink
    operating_system: 99
    patterns: [{ regex: 'Chrome/([\d.]+)' }]
devices:
  - { id: 1, name: Other }
robots:
  - { id: 1, family: Googlebot, name: Googlebot/2.1, user_agent: "Googlebot/2.1" }
"#;

    #[test]
    fn builds_and_sorts_by_id() {
        let rules = RuleSet::from_yaml_str(YAML).unwrap();
        assert_eq!(rules.version(), "20240301-02");
        assert_eq!(rules.version_number().to_version_string(), "20240301-02");
        assert_eq!(
            rules.engines().iter().map(|e| e.id).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
        assert_eq!(rules.engine_patterns().len(), 2);
    }

    #[test]
    fn first_engine_of_a_family_wins_lookup() {
        let rules = RuleSet::from_yaml_str(YAML).unwrap();
        let webkit = rules.engine_by_family(BrowserEngineFamily::WebKit).unwrap();
        assert_eq!(webkit.id, 2);
        assert_eq!(webkit.info_url, "https://webkit.org");
        assert!(rules.engine_by_family(BrowserEngineFamily::Gecko).is_none());
    }

    #[test]
    fn dangling_os_hint_is_dropped() {
        let rules = RuleSet::from_yaml_str(YAML).unwrap();
        assert_eq!(rules.browsers()[0].operating_system, None);
    }

    #[test]
    fn robot_exact_lookup() {
        let rules = RuleSet::from_yaml_str(YAML).unwrap();
        assert!(rules.robot_by_user_agent("Googlebot/2.1").is_some());
        assert!(rules.robot_by_user_agent("googlebot/2.1").is_none());
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let yaml = "version: '1'\ndevices: [{ id: 1, name: Other }, { id: 1, name: Tablet }]";
        assert!(matches!(RuleSet::from_yaml_str(yaml), Err(Error::InvalidRule(_))));
    }

    #[test]
    fn empty_version_is_rejected() {
        assert!(matches!(
            RuleSet::from_yaml_str("version: ' '"),
            Err(Error::InvalidRule(_))
        ));
    }

    #[test]
    fn bad_pattern_is_rejected() {
        let yaml = "version: '1'\ndevices: [{ id: 1, name: Other, patterns: [{ regex: '(' }] }]";
        assert!(RuleSet::from_yaml_str(yaml).is_err());
    }

    #[test]
    fn malformed_document_is_a_yaml_error() {
        assert!(matches!(
            RuleSet::from_yaml_str("browsers: 12"),
            Err(Error::YAML(_))
        ));
    }
}
