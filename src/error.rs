#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    IO(#[from] std::io::Error),
    #[error(transparent)]
    YAML(#[from] serde_yaml::Error),
    #[error(transparent)]
    Regex(#[from] fancy_regex::Error),
    #[error(transparent)]
    AhoCorasick(#[from] aho_corasick::BuildError),
    /// A rule definition failed validation while building a `RuleSet`.
    #[error("invalid rule: {0}")]
    InvalidRule(String),
    /// A configuration value was rejected; the previous value stays in effect.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
    /// The rule source could not produce a version token or rule data.
    #[error("failed to fetch rules: {0}")]
    Fetch(String),
}

pub type Result<T> = std::result::Result<T, Error>;
