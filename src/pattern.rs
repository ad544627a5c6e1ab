use std::cmp::Ordering;
use std::fmt;

use crate::db::PatternEntry;
use crate::error::Result;
use crate::version::VersionNumber;

/// A compiled, immutable pattern.
///
/// Patterns are totally ordered by `(position, regex source, extraction
/// group)`, which is the precedence used when several patterns of one
/// category match the same input.
pub struct Pattern {
    source: String,
    position: i32,
    extraction_group: usize,
    case_insensitive: bool,
    regex: CompiledRegex,
}

impl Pattern {
    pub fn compile(entry: PatternEntry) -> Result<Self> {
        let regex = CompiledRegex::new(&entry.regex, entry.case_insensitive)?;
        Ok(Self {
            source: entry.regex,
            position: entry.position,
            extraction_group: entry.extraction_group,
            case_insensitive: entry.case_insensitive,
            regex,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn position(&self) -> i32 {
        self.position
    }

    pub fn extraction_group(&self) -> usize {
        self.extraction_group
    }

    pub fn is_case_insensitive(&self) -> bool {
        self.case_insensitive
    }

    /// True when the pattern needed the backtracking engine.
    pub fn is_fancy(&self) -> bool {
        matches!(self.regex, CompiledRegex::Fancy(_))
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }

    pub(crate) fn captures<'t>(&self, text: &'t str) -> Option<Captures<'t>> {
        self.regex.captures(text)
    }

    /// Version held by the extraction group of `captures`, or `UNKNOWN`.
    pub(crate) fn extract_version(&self, captures: &Captures<'_>) -> VersionNumber {
        captures
            .get_str(self.extraction_group)
            .map(VersionNumber::parse)
            .unwrap_or(VersionNumber::UNKNOWN)
    }
}

impl fmt::Debug for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pattern")
            .field("source", &self.source)
            .field("position", &self.position)
            .field("extraction_group", &self.extraction_group)
            .field("case_insensitive", &self.case_insensitive)
            .finish()
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Pattern {}

impl Ord for Pattern {
    fn cmp(&self, other: &Self) -> Ordering {
        self.position
            .cmp(&other.position)
            .then_with(|| self.source.cmp(&other.source))
            .then_with(|| self.extraction_group.cmp(&other.extraction_group))
            .then_with(|| self.case_insensitive.cmp(&other.case_insensitive))
    }
}

impl PartialOrd for Pattern {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

// ---------------------------------------------------------------------------
// CompiledRegex: `regex` when possible, `fancy_regex` for PCRE-isms
// ---------------------------------------------------------------------------

enum CompiledRegex {
    Standard(regex::Regex),
    Fancy(fancy_regex::Regex),
}

impl CompiledRegex {
    fn new(source: &str, case_insensitive: bool) -> Result<Self> {
        let full = if case_insensitive {
            format!("(?i){source}")
        } else {
            source.to_string()
        };
        if let Ok(re) = regex::Regex::new(&full) {
            return Ok(Self::Standard(re));
        }
        // Look-around and back-references need the backtracking engine.
        Ok(Self::Fancy(fancy_regex::Regex::new(&full)?))
    }

    fn is_match(&self, text: &str) -> bool {
        match self {
            Self::Standard(re) => re.is_match(text),
            Self::Fancy(re) => re.is_match(text).unwrap_or(false),
        }
    }

    fn captures<'t>(&self, text: &'t str) -> Option<Captures<'t>> {
        match self {
            Self::Standard(re) => re.captures(text).map(Captures::Standard),
            // A backtrack-limit error is treated as no match.
            Self::Fancy(re) => re.captures(text).ok().flatten().map(Captures::Fancy),
        }
    }
}

// ---------------------------------------------------------------------------
// Captures: unified enum over regex::Captures and fancy_regex::Captures
// ---------------------------------------------------------------------------

/// Lightweight wrapper so callers don't need to know which regex engine
/// produced the match.
pub(crate) enum Captures<'t> {
    Standard(regex::Captures<'t>),
    Fancy(fancy_regex::Captures<'t>),
}

impl<'t> Captures<'t> {
    /// Matched text for group `i`, or `None` if the group didn't participate
    /// in the match or matched the empty string.
    pub fn get_str(&self, i: usize) -> Option<&'t str> {
        let s = match self {
            Captures::Standard(c) => c.get(i).map(|m| m.as_str()),
            Captures::Fancy(c) => c.get(i).map(|m| m.as_str()),
        };
        s.filter(|s| !s.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compile(regex: &str, position: i32) -> Pattern {
        Pattern::compile(PatternEntry::new(regex, position)).unwrap()
    }

    #[test]
    fn standard_and_fancy_engines() {
        let p = compile(r"Chrome/(\d+(?:\.\d+)*)", 0);
        assert!(!p.is_fancy());
        assert!(p.is_match("chrome/12.0"));

        let p = compile(r"Android(?!.*Mobile)", 0);
        assert!(p.is_fancy());
        assert!(p.is_match("Linux; Android 4.0; Tablet"));
        assert!(!p.is_match("Linux; Android 4.0; Mobile"));
    }

    #[test]
    fn case_sensitivity_is_configurable() {
        let p = Pattern::compile(PatternEntry::new("Chrome", 0).case_sensitive()).unwrap();
        assert!(p.is_match("Chrome"));
        assert!(!p.is_match("chrome"));
    }

    #[test]
    fn invalid_pattern_is_an_error() {
        assert!(Pattern::compile(PatternEntry::new("(unclosed", 0)).is_err());
    }

    #[test]
    fn version_extraction() {
        let p = compile(r"Firefox/(\d+(?:\.\d+)*)", 0);
        let caps = p.captures("Gecko/20100101 Firefox/7.0.1").unwrap();
        assert_eq!(p.extract_version(&caps).to_version_string(), "7.0.1");

        let p = Pattern::compile(PatternEntry::new("Firefox", 0).with_extraction_group(3)).unwrap();
        let caps = p.captures("Firefox").unwrap();
        assert_eq!(p.extract_version(&caps), VersionNumber::UNKNOWN);
    }

    #[test]
    fn empty_group_is_absent() {
        let p = compile(r"Chrome/(\d*)", 0);
        let caps = p.captures("Chrome/$").unwrap();
        assert_eq!(caps.get_str(1), None);
    }

    #[test]
    fn ordering_is_position_then_source() {
        let a = compile("b", 1);
        let b = compile("a", 2);
        let c = compile("a", 1);
        let mut all = [&a, &b, &c];
        all.sort();
        assert_eq!(
            all.iter().map(|p| (p.position(), p.source())).collect::<Vec<_>>(),
            vec![(1, "a"), (1, "b"), (2, "a")]
        );
    }
}
