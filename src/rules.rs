use std::sync::Arc;

use tracing::warn;

use crate::db;
use crate::error::{Error, Result};
use crate::pattern::Pattern;
use crate::types::*;
use crate::version::VersionNumber;

// ---------------------------------------------------------------------------
// Compiled rules carried inside a RuleSet
// ---------------------------------------------------------------------------

/// Common view over the compiled rules of every category.
pub trait Rule {
    fn id(&self) -> u32;
    fn patterns(&self) -> &[Arc<Pattern>];
}

macro_rules! impl_rule {
    ($($ty:ty),+) => {
        $(
            impl Rule for $ty {
                fn id(&self) -> u32 {
                    self.id
                }

                fn patterns(&self) -> &[Arc<Pattern>] {
                    &self.patterns
                }
            }
        )+
    };
}

fn compile_patterns(entries: Vec<db::PatternEntry>) -> Result<Vec<Arc<Pattern>>> {
    entries
        .into_iter()
        .map(|e| Pattern::compile(e).map(Arc::new))
        .collect()
}

fn require_name(kind: &str, id: u32, name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(Error::InvalidRule(format!("{kind} {id} has an empty name")));
    }
    Ok(())
}

#[derive(Debug)]
pub struct BrowserRule {
    pub id: u32,
    pub family: UserAgentFamily,
    pub name: String,
    pub producer: String,
    pub producer_url: String,
    pub url: String,
    pub icon: String,
    pub kind: UserAgentType,
    pub type_name: String,
    /// Engine assumed when no engine pattern matches.
    pub engine: Option<BrowserEngineFamily>,
    /// Id of the operating system this browser implies.
    pub operating_system: Option<u32>,
    pub patterns: Vec<Arc<Pattern>>,
}

impl BrowserRule {
    pub(crate) fn compile(e: db::BrowserEntry) -> Result<Self> {
        require_name("browser", e.id, &e.name)?;
        let engine = e.engine.as_deref().and_then(|name| {
            let family = BrowserEngineFamily::resolve(name);
            if family == BrowserEngineFamily::Unknown {
                warn!(browser = e.id, engine = name, "unknown engine family, ignoring");
                None
            } else {
                Some(family)
            }
        });
        Ok(Self {
            id: e.id,
            family: UserAgentFamily::resolve(&e.family),
            kind: UserAgentType::resolve(&e.type_name),
            type_name: e.type_name,
            engine,
            operating_system: e.operating_system,
            patterns: compile_patterns(e.patterns)?,
            name: e.name,
            producer: e.producer,
            producer_url: e.producer_url,
            url: e.url,
            icon: e.icon,
        })
    }
}

#[derive(Debug)]
pub struct EngineRule {
    pub id: u32,
    pub family: BrowserEngineFamily,
    pub info_url: String,
    pub patterns: Vec<Arc<Pattern>>,
}

impl EngineRule {
    pub(crate) fn compile(e: db::EngineEntry) -> Result<Self> {
        require_name("engine", e.id, &e.family)?;
        let family = BrowserEngineFamily::resolve(&e.family);
        if family == BrowserEngineFamily::Unknown {
            warn!(engine = e.id, family = %e.family, "unknown engine family");
        }
        Ok(Self {
            id: e.id,
            family,
            info_url: e.info_url,
            patterns: compile_patterns(e.patterns)?,
        })
    }

    pub(crate) fn to_engine(&self, version_number: VersionNumber) -> BrowserEngine {
        BrowserEngine {
            family: self.family,
            info_url: self.info_url.clone(),
            version_number,
        }
    }
}

#[derive(Debug)]
pub struct OperatingSystemRule {
    pub id: u32,
    pub family: OperatingSystemFamily,
    pub family_name: String,
    pub name: String,
    pub producer: String,
    pub producer_url: String,
    pub url: String,
    pub icon: String,
    pub patterns: Vec<Arc<Pattern>>,
}

impl OperatingSystemRule {
    pub(crate) fn compile(e: db::OperatingSystemEntry) -> Result<Self> {
        require_name("operating system", e.id, &e.name)?;
        Ok(Self {
            id: e.id,
            family: OperatingSystemFamily::resolve(&e.family),
            family_name: e.family,
            name: e.name,
            producer: e.producer,
            producer_url: e.producer_url,
            url: e.url,
            icon: e.icon,
            patterns: compile_patterns(e.patterns)?,
        })
    }

    pub(crate) fn to_operating_system(&self, version_number: VersionNumber) -> OperatingSystem {
        OperatingSystem {
            family: self.family,
            family_name: self.family_name.clone(),
            icon: self.icon.clone(),
            name: self.name.clone(),
            producer: self.producer.clone(),
            producer_url: self.producer_url.clone(),
            url: self.url.clone(),
            version_number,
        }
    }
}

#[derive(Debug)]
pub struct DeviceRule {
    pub id: u32,
    pub category: Category,
    pub name: String,
    pub icon: String,
    pub info_url: String,
    pub patterns: Vec<Arc<Pattern>>,
}

impl DeviceRule {
    pub(crate) fn compile(e: db::DeviceEntry) -> Result<Self> {
        require_name("device", e.id, &e.name)?;
        Ok(Self {
            id: e.id,
            category: Category::resolve(&e.name),
            name: e.name,
            icon: e.icon,
            info_url: e.info_url,
            patterns: compile_patterns(e.patterns)?,
        })
    }

    pub(crate) fn to_device_category(&self) -> DeviceCategory {
        DeviceCategory {
            category: self.category,
            icon: self.icon.clone(),
            info_url: self.info_url.clone(),
            name: self.name.clone(),
        }
    }
}

#[derive(Debug)]
pub struct RobotRule {
    pub id: u32,
    pub family: UserAgentFamily,
    pub name: String,
    pub producer: String,
    pub producer_url: String,
    pub url: String,
    /// Complete user-agent string matched literally.
    pub user_agent: Option<String>,
    pub patterns: Vec<Arc<Pattern>>,
}

impl RobotRule {
    pub(crate) fn compile(e: db::RobotEntry) -> Result<Self> {
        require_name("robot", e.id, &e.name)?;
        let user_agent = e.user_agent.filter(|ua| !ua.is_empty());
        if user_agent.is_none() && e.patterns.is_empty() {
            return Err(Error::InvalidRule(format!(
                "robot {} needs a user agent string or a pattern",
                e.id
            )));
        }
        Ok(Self {
            id: e.id,
            family: UserAgentFamily::resolve(&e.family),
            name: e.name,
            producer: e.producer,
            producer_url: e.producer_url,
            url: e.url,
            user_agent,
            patterns: compile_patterns(e.patterns)?,
        })
    }
}

impl_rule!(BrowserRule, EngineRule, OperatingSystemRule, DeviceRule, RobotRule);

#[cfg(test)]
mod tests {
    use super::*;

    fn browser(name: &str, engine: Option<&str>) -> db::BrowserEntry {
        db::BrowserEntry {
            id: 7,
            family: "Opera Mini".into(),
            name: name.into(),
            producer: String::new(),
            producer_url: String::new(),
            url: String::new(),
            icon: String::new(),
            type_name: "Mobile Browser".into(),
            engine: engine.map(str::to_string),
            operating_system: None,
            patterns: vec![db::PatternEntry::new(r"Opera Mini/(\d+)", 0)],
        }
    }

    #[test]
    fn browser_families_are_resolved() {
        let rule = BrowserRule::compile(browser("Opera Mini", Some("presto"))).unwrap();
        assert_eq!(rule.family, UserAgentFamily::OperaMini);
        assert_eq!(rule.kind, UserAgentType::MobileBrowser);
        assert_eq!(rule.engine, Some(BrowserEngineFamily::Presto));
        assert_eq!(rule.patterns.len(), 1);
    }

    #[test]
    fn unknown_engine_degrades_to_none() {
        let rule = BrowserRule::compile(browser("Opera Mini", Some("Quantum"))).unwrap();
        assert_eq!(rule.engine, None);
    }

    #[test]
    fn empty_name_is_rejected() {
        let err = BrowserRule::compile(browser("  ", None)).unwrap_err();
        assert!(matches!(err, Error::InvalidRule(_)));
    }

    #[test]
    fn robot_needs_something_to_match() {
        let entry = db::RobotEntry {
            id: 1,
            family: "Googlebot".into(),
            name: "Googlebot/2.1".into(),
            producer: String::new(),
            producer_url: String::new(),
            url: String::new(),
            user_agent: Some(String::new()),
            patterns: Vec::new(),
        };
        assert!(matches!(
            RobotRule::compile(entry.clone()),
            Err(Error::InvalidRule(_))
        ));

        let rule = RobotRule::compile(db::RobotEntry {
            user_agent: Some("Googlebot/2.1 (+http://www.google.com/bot.html)".into()),
            ..entry
        })
        .unwrap();
        assert_eq!(rule.family, UserAgentFamily::Googlebot);
    }

    #[test]
    fn device_category_comes_from_name() {
        let rule = DeviceRule::compile(db::DeviceEntry {
            id: 3,
            name: "Smart TV".into(),
            icon: "smarttv.png".into(),
            info_url: String::new(),
            patterns: Vec::new(),
        })
        .unwrap();
        assert_eq!(rule.to_device_category().category, Category::SmartTv);
        assert_eq!(rule.to_device_category().icon, "smarttv.png");
    }
}
