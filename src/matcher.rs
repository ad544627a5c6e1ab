use crate::rule_set::RuleSet;
use crate::rules::BrowserRule;
use crate::types::*;
use crate::version::VersionNumber;

/// Classify `user_agent` against `rules`.
///
/// Never fails: anything that does not match degrades to the empty
/// sentinels, except the device category which is at least `Other`.
pub fn classify(user_agent: &str, rules: &RuleSet) -> UserAgent {
    if let Some(robot) = classify_robot(user_agent, rules) {
        return robot;
    }

    let browser = rules
        .browser_patterns()
        .match_first(user_agent)
        .map(|m| (&rules.browsers()[*m.data], m.version()));
    let browser_rule = browser.as_ref().map(|(rule, _)| *rule);

    let browser_engine = detect_engine(user_agent, rules, browser_rule);
    let operating_system = detect_operating_system(user_agent, rules, browser_rule);
    let device_category = detect_device(user_agent, rules, browser_rule);

    match browser {
        Some((rule, version_number)) => UserAgent {
            family: rule.family,
            name: rule.name.clone(),
            producer: rule.producer.clone(),
            producer_url: rule.producer_url.clone(),
            kind: rule.kind,
            type_name: rule.type_name.clone(),
            url: rule.url.clone(),
            version_number,
            operating_system,
            browser_engine,
            device_category,
        },
        None => UserAgent {
            operating_system,
            browser_engine,
            device_category,
            ..UserAgent::EMPTY
        },
    }
}

fn classify_robot(user_agent: &str, rules: &RuleSet) -> Option<UserAgent> {
    let (robot, version_number) = match rules.robot_by_user_agent(user_agent) {
        Some(robot) => (robot, VersionNumber::UNKNOWN),
        None => {
            let m = rules.robot_patterns().match_first(user_agent)?;
            (&rules.robots()[*m.data], m.version())
        }
    };
    let version_number = if version_number.is_unknown() {
        VersionNumber::parse_last(&robot.name)
    } else {
        version_number
    };

    Some(UserAgent {
        family: robot.family,
        name: robot.name.clone(),
        producer: robot.producer.clone(),
        producer_url: robot.producer_url.clone(),
        kind: UserAgentType::Robot,
        type_name: UserAgentType::Robot.name().to_string(),
        url: robot.url.clone(),
        version_number,
        operating_system: OperatingSystem::EMPTY,
        browser_engine: BrowserEngine::UNKNOWN,
        device_category: device_for(rules, Category::Other),
    })
}

/// Engine patterns win over the browser's declared default engine.
fn detect_engine(user_agent: &str, rules: &RuleSet, browser: Option<&BrowserRule>) -> BrowserEngine {
    if let Some(m) = rules.engine_patterns().match_first(user_agent) {
        return rules.engines()[*m.data].to_engine(m.version());
    }
    match browser.and_then(|b| b.engine) {
        Some(family) => match rules.engine_by_family(family) {
            Some(engine) => engine.to_engine(VersionNumber::UNKNOWN),
            None => BrowserEngine {
                family,
                ..BrowserEngine::UNKNOWN
            },
        },
        None => BrowserEngine::UNKNOWN,
    }
}

fn detect_operating_system(
    user_agent: &str,
    rules: &RuleSet,
    browser: Option<&BrowserRule>,
) -> OperatingSystem {
    if let Some(m) = rules.os_patterns().match_first(user_agent) {
        return rules.operating_systems()[*m.data].to_operating_system(m.version());
    }
    browser
        .and_then(|b| b.operating_system)
        .and_then(|id| rules.operating_system_by_id(id))
        .map(|os| os.to_operating_system(VersionNumber::UNKNOWN))
        .unwrap_or(OperatingSystem::EMPTY)
}

fn detect_device(user_agent: &str, rules: &RuleSet, browser: Option<&BrowserRule>) -> DeviceCategory {
    if let Some(m) = rules.device_patterns().match_first(user_agent) {
        return rules.devices()[*m.data].to_device_category();
    }
    let category = match browser.map(|b| b.kind) {
        Some(UserAgentType::MobileBrowser | UserAgentType::WapBrowser) => Category::Smartphone,
        Some(UserAgentType::Browser | UserAgentType::OfflineBrowser) => Category::PersonalComputer,
        _ => Category::Other,
    };
    device_for(rules, category)
}

fn device_for(rules: &RuleSet, category: Category) -> DeviceCategory {
    rules
        .device_by_category(category)
        .map(|d| d.to_device_category())
        .unwrap_or_else(|| DeviceCategory::bare(category))
}
