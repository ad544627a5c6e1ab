use std::cmp::Ordering;
use std::fmt;

/// A version extracted from a user-agent fragment, e.g. `13.0.782.112` or
/// `20120509-01`.
///
/// Numeric groups are stored with leading zeros stripped so that equality,
/// hashing and ordering agree. Whatever follows the numeric run (`b2`, `-01`,
/// ` beta`) is kept verbatim as the extension; digit runs inside it still
/// order numerically (`-10` after `-9`, `rc10` after `rc9`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VersionNumber {
    groups: Vec<String>,
    extension: String,
}

impl VersionNumber {
    /// Sentinel for "no version could be extracted". Orders below every
    /// parsed version.
    pub const UNKNOWN: VersionNumber = VersionNumber {
        groups: Vec::new(),
        extension: String::new(),
    };

    /// Parse the first numeric run of `text`. Never fails: input without any
    /// digit yields [`VersionNumber::UNKNOWN`].
    pub fn parse(text: &str) -> Self {
        match find_numeric_runs(text).next() {
            Some((start, end)) => Self::from_run(text, start, end),
            None => Self::UNKNOWN,
        }
    }

    /// Parse the last numeric run of `text` (`Googlebot/2.1` → `2.1`).
    pub fn parse_last(text: &str) -> Self {
        match find_numeric_runs(text).last() {
            Some((start, end)) => Self::from_run(text, start, end),
            None => Self::UNKNOWN,
        }
    }

    fn from_run(text: &str, start: usize, end: usize) -> Self {
        let groups = text[start..end]
            .split(['.', '_'])
            .map(normalize_group)
            .collect();

        let rest = &text[end..];
        let ext_len = rest
            .find(|c: char| !is_extension_char(c))
            .unwrap_or(rest.len());
        let extension = rest[..ext_len].trim().to_string();

        Self { groups, extension }
    }

    pub fn is_unknown(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn groups(&self) -> &[String] {
        &self.groups
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    pub fn major(&self) -> &str {
        self.group(0)
    }

    pub fn minor(&self) -> &str {
        self.group(1)
    }

    pub fn bugfix(&self) -> &str {
        self.group(2)
    }

    fn group(&self, index: usize) -> &str {
        self.groups.get(index).map(String::as_str).unwrap_or("")
    }

    /// Dotted groups followed by the extension; empty for `UNKNOWN`.
    pub fn to_version_string(&self) -> String {
        let mut s = self.groups.join(".");
        s.push_str(&self.extension);
        s
    }
}

impl Default for VersionNumber {
    fn default() -> Self {
        Self::UNKNOWN
    }
}

impl fmt::Display for VersionNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_version_string())
    }
}

impl Ord for VersionNumber {
    fn cmp(&self, other: &Self) -> Ordering {
        for (a, b) in self.groups.iter().zip(&other.groups) {
            match compare_numeric(a, b) {
                Ordering::Equal => {}
                ord => return ord,
            }
        }
        self.groups
            .len()
            .cmp(&other.groups.len())
            .then_with(|| compare_extension(&self.extension, &other.extension))
            .then_with(|| self.extension.cmp(&other.extension))
    }
}

impl PartialOrd for VersionNumber {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Numeric comparison of two normalized digit strings without parsing them,
/// so arbitrarily long groups (build stamps) never overflow.
fn compare_numeric(a: &str, b: &str) -> Ordering {
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

fn trim_zeros(digits: &str) -> &str {
    let trimmed = digits.trim_start_matches('0');
    if trimmed.is_empty() && !digits.is_empty() {
        "0"
    } else {
        trimmed
    }
}

fn normalize_group(group: &str) -> String {
    trim_zeros(group).to_string()
}

/// Compare extensions run by run: digit runs as numbers, the rest as text.
/// Running out of runs first sorts lower.
fn compare_extension(a: &str, b: &str) -> Ordering {
    let mut xs = extension_runs(a);
    let mut ys = extension_runs(b);
    loop {
        let ord = match (xs.next(), ys.next()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) if is_digits(x) && is_digits(y) => {
                compare_numeric(trim_zeros(x), trim_zeros(y))
            }
            (Some(x), Some(y)) => x.cmp(y),
        };
        if ord != Ordering::Equal {
            return ord;
        }
    }
}

fn is_digits(run: &str) -> bool {
    run.bytes().all(|b| b.is_ascii_digit())
}

/// Maximal runs of ASCII digits and of everything else, in order.
fn extension_runs(extension: &str) -> impl Iterator<Item = &str> + '_ {
    let mut rest = extension;
    std::iter::from_fn(move || {
        let digit = rest.chars().next()?.is_ascii_digit();
        let len = rest
            .find(|c: char| c.is_ascii_digit() != digit)
            .unwrap_or(rest.len());
        let (run, tail) = rest.split_at(len);
        rest = tail;
        Some(run)
    })
}

fn is_extension_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.' | '[' | ']' | ' ')
}

/// Byte ranges of every `\d+([._]\d+)*` run in `text`.
fn find_numeric_runs(text: &str) -> impl Iterator<Item = (usize, usize)> + '_ {
    let bytes = text.as_bytes();
    let mut pos = 0;
    std::iter::from_fn(move || {
        while pos < bytes.len() && !bytes[pos].is_ascii_digit() {
            pos += 1;
        }
        if pos >= bytes.len() {
            return None;
        }
        let start = pos;
        loop {
            while pos < bytes.len() && bytes[pos].is_ascii_digit() {
                pos += 1;
            }
            let separator = pos < bytes.len() && matches!(bytes[pos], b'.' | b'_');
            if separator && pos + 1 < bytes.len() && bytes[pos + 1].is_ascii_digit() {
                pos += 1;
                continue;
            }
            break;
        }
        Some((start, pos))
    })
}
