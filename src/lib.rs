mod db;
mod error;
mod literal;
mod matcher;
mod pattern;
mod pattern_set;
mod rule_set;
mod rules;
mod source;
mod store;
mod types;
mod updater;
mod user_agent_parser;
mod version;

pub use db::{
    BrowserEntry, DeviceEntry, EngineEntry, OperatingSystemEntry, PatternEntry, RobotEntry,
    RuleDatabase,
};
pub use error::{Error, Result};
pub use matcher::classify;
pub use pattern::Pattern;
pub use rule_set::RuleSet;
pub use rules::{BrowserRule, DeviceRule, EngineRule, OperatingSystemRule, RobotRule, Rule};
pub use source::{Clock, FileRuleSource, RuleSource, SystemClock};
pub use store::RuleStore;
pub use types::*;
pub use updater::{RefreshOutcome, Updater, UpdaterConfig};
pub use user_agent_parser::{UpdatingUserAgentParser, UserAgentParser, UserAgentStringParser};
pub use version::VersionNumber;
