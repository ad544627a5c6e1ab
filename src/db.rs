use serde::Deserialize;

// ---------------------------------------------------------------------------
// Rule database document
//
// Format: one YAML mapping with a version token and one list per category.
// Definitions are plain data; `RuleSet::new` validates and compiles them.
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RuleDatabase {
    pub version: String,
    #[serde(default)]
    pub browsers: Vec<BrowserEntry>,
    #[serde(default)]
    pub engines: Vec<EngineEntry>,
    #[serde(default)]
    pub operating_systems: Vec<OperatingSystemEntry>,
    #[serde(default)]
    pub devices: Vec<DeviceEntry>,
    #[serde(default)]
    pub robots: Vec<RobotEntry>,
}

/// Only the version token of a rule database, so a source can probe the
/// version without deserializing every rule.
#[derive(Debug, Deserialize)]
pub(crate) struct VersionProbe {
    pub version: String,
}

// ---------------------------------------------------------------------------
// Patterns
// ---------------------------------------------------------------------------

fn default_extraction_group() -> usize {
    1
}

fn default_case_insensitive() -> bool {
    true
}

/// Definition of a single pattern. Every category entry owns a list of these.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PatternEntry {
    pub regex: String,
    #[serde(default)]
    pub position: i32,
    /// Capture group holding the version; missing groups yield `UNKNOWN`.
    #[serde(default = "default_extraction_group")]
    pub extraction_group: usize,
    #[serde(default = "default_case_insensitive")]
    pub case_insensitive: bool,
}

impl PatternEntry {
    pub fn new(regex: impl Into<String>, position: i32) -> Self {
        Self {
            regex: regex.into(),
            position,
            extraction_group: default_extraction_group(),
            case_insensitive: default_case_insensitive(),
        }
    }

    pub fn with_extraction_group(mut self, group: usize) -> Self {
        self.extraction_group = group;
        self
    }

    pub fn case_sensitive(mut self) -> Self {
        self.case_insensitive = false;
        self
    }
}

// ---------------------------------------------------------------------------
// Browsers
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct BrowserEntry {
    pub id: u32,
    /// Family name, resolved to a `UserAgentFamily`.
    pub family: String,
    pub name: String,
    #[serde(default)]
    pub producer: String,
    #[serde(default)]
    pub producer_url: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub icon: String,
    /// Type name, resolved to a `UserAgentType`.
    #[serde(rename = "type", default)]
    pub type_name: String,
    /// Default engine family name, used when no engine pattern matches.
    #[serde(default)]
    pub engine: Option<String>,
    /// Id of the operating system this browser implies.
    #[serde(default)]
    pub operating_system: Option<u32>,
    #[serde(default)]
    pub patterns: Vec<PatternEntry>,
}

// ---------------------------------------------------------------------------
// Browser engines
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct EngineEntry {
    pub id: u32,
    pub family: String,
    #[serde(default)]
    pub info_url: String,
    #[serde(default)]
    pub patterns: Vec<PatternEntry>,
}

// ---------------------------------------------------------------------------
// Operating systems
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct OperatingSystemEntry {
    pub id: u32,
    pub family: String,
    pub name: String,
    #[serde(default)]
    pub producer: String,
    #[serde(default)]
    pub producer_url: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub patterns: Vec<PatternEntry>,
}

// ---------------------------------------------------------------------------
// Device categories
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct DeviceEntry {
    pub id: u32,
    /// Category name, resolved to a `Category`.
    pub name: String,
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub info_url: String,
    #[serde(default)]
    pub patterns: Vec<PatternEntry>,
}

// ---------------------------------------------------------------------------
// Robots
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct RobotEntry {
    pub id: u32,
    pub family: String,
    pub name: String,
    #[serde(default)]
    pub producer: String,
    #[serde(default)]
    pub producer_url: String,
    #[serde(default)]
    pub url: String,
    /// Complete user-agent string matched literally.
    #[serde(default)]
    pub user_agent: Option<String>,
    #[serde(default)]
    pub patterns: Vec<PatternEntry>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pattern_defaults() {
        let p: PatternEntry = serde_yaml::from_str("regex: 'Chrome/(\\d+)'").unwrap();
        assert_eq!(p, PatternEntry::new(r"Chrome/(\d+)", 0));
        assert_eq!(p.extraction_group, 1);
        assert!(p.case_insensitive);
    }

    #[test]
    fn minimal_document() {
        let db: RuleDatabase = serde_yaml::from_str(
            r#"
version: "20240101-01"
browsers:
  - id: 1
    family: Chrome
    name: Chrome
    type: Browser
    engine: Blink
    patterns:
      - { regex: 'Chrome/([\d.]+)', position: 3 }
"#,
        )
        .unwrap();
        assert_eq!(db.version, "20240101-01");
        assert_eq!(db.browsers[0].type_name, "Browser");
        assert_eq!(db.browsers[0].engine.as_deref(), Some("Blink"));
        assert_eq!(db.browsers[0].patterns[0].position, 3);
        assert!(db.robots.is_empty());
    }

    #[test]
    fn version_probe_ignores_rules() {
        let probe: VersionProbe =
            serde_yaml::from_str("version: '2'\nbrowsers: [{ not: valid }]").unwrap();
        assert_eq!(probe.version, "2");
    }
}
