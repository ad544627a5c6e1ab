use super::{BrowserEngineFamily, Category, OperatingSystemFamily, UserAgentFamily, UserAgentType};
use crate::version::VersionNumber;

/// Classification result for one user-agent string.
///
/// Owned and immutable: it does not borrow from the rule set that produced
/// it, so it stays valid after the rules are swapped.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UserAgent {
    pub family: UserAgentFamily,
    pub name: String,
    pub producer: String,
    pub producer_url: String,
    pub kind: UserAgentType,
    pub type_name: String,
    pub url: String,
    pub version_number: VersionNumber,
    pub operating_system: OperatingSystem,
    pub browser_engine: BrowserEngine,
    pub device_category: DeviceCategory,
}

impl UserAgent {
    /// Nothing matched in any dimension.
    pub const EMPTY: UserAgent = UserAgent {
        family: UserAgentFamily::Unknown,
        name: String::new(),
        producer: String::new(),
        producer_url: String::new(),
        kind: UserAgentType::Unknown,
        type_name: String::new(),
        url: String::new(),
        version_number: VersionNumber::UNKNOWN,
        operating_system: OperatingSystem::EMPTY,
        browser_engine: BrowserEngine::UNKNOWN,
        device_category: DeviceCategory::EMPTY,
    };

    pub fn is_robot(&self) -> bool {
        self.kind == UserAgentType::Robot
    }

    /// True when neither a browser nor a robot was recognised. Other
    /// dimensions may still carry information.
    pub fn is_unrecognized(&self) -> bool {
        self.kind == UserAgentType::Unknown && self.name.is_empty()
    }

    pub fn operating_system(&self) -> &OperatingSystem {
        &self.operating_system
    }

    pub fn browser_engine(&self) -> &BrowserEngine {
        &self.browser_engine
    }

    pub fn device_category(&self) -> &DeviceCategory {
        &self.device_category
    }
}

impl Default for UserAgent {
    fn default() -> Self {
        Self::EMPTY
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OperatingSystem {
    pub family: OperatingSystemFamily,
    pub family_name: String,
    pub icon: String,
    pub name: String,
    pub producer: String,
    pub producer_url: String,
    pub url: String,
    pub version_number: VersionNumber,
}

impl OperatingSystem {
    pub const EMPTY: OperatingSystem = OperatingSystem {
        family: OperatingSystemFamily::Unknown,
        family_name: String::new(),
        icon: String::new(),
        name: String::new(),
        producer: String::new(),
        producer_url: String::new(),
        url: String::new(),
        version_number: VersionNumber::UNKNOWN,
    };

    pub fn is_empty(&self) -> bool {
        *self == Self::EMPTY
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BrowserEngine {
    pub family: BrowserEngineFamily,
    pub info_url: String,
    pub version_number: VersionNumber,
}

impl BrowserEngine {
    pub const UNKNOWN: BrowserEngine = BrowserEngine {
        family: BrowserEngineFamily::Unknown,
        info_url: String::new(),
        version_number: VersionNumber::UNKNOWN,
    };
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DeviceCategory {
    pub category: Category,
    pub icon: String,
    pub info_url: String,
    pub name: String,
}

impl DeviceCategory {
    pub const EMPTY: DeviceCategory = DeviceCategory {
        category: Category::Unknown,
        icon: String::new(),
        info_url: String::new(),
        name: String::new(),
    };

    /// Category without any display metadata, named after the category.
    pub fn bare(category: Category) -> Self {
        Self {
            category,
            icon: String::new(),
            info_url: String::new(),
            name: category.name().to_string(),
        }
    }
}
