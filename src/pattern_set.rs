use std::sync::Arc;

use aho_corasick::AhoCorasick;

use crate::error::Result;
use crate::literal::extract_literals;
use crate::pattern::{Captures, Pattern};
use crate::version::VersionNumber;

/// Literal prefixes shorter than this are too unselective to prefilter on.
const MIN_LITERAL_LEN: usize = 3;

/// Result of a successful match.
pub(crate) struct MatchResult<'a, 't, T> {
    pub data: &'a T,
    pub pattern: &'a Pattern,
    pub captures: Captures<'t>,
}

impl<T> MatchResult<'_, '_, T> {
    pub fn version(&self) -> VersionNumber {
        self.pattern.extract_version(&self.captures)
    }
}

struct Entry<T> {
    pattern: Arc<Pattern>,
    data: T,
}

/// Ordered first-match engine for one category.
///
/// Entries are sorted by pattern order, then by the owning rule id, so the
/// winner never depends on the order definitions were supplied in. An
/// Aho-Corasick automaton over literal prefixes narrows down which entries
/// are worth running; entries without usable literals are always tried.
pub(crate) struct PatternSet<T> {
    entries: Vec<Entry<T>>,
    automaton: Option<AhoCorasick>,
    /// Automaton pattern index → entry indices sharing that literal.
    literal_to_entries: Vec<Vec<usize>>,
    /// Entry indices that must be tried on every input, ascending.
    always: Vec<usize>,
}

impl<T> PatternSet<T> {
    /// Build from `(pattern, owner id, data)` triples.
    pub fn build(items: Vec<(Arc<Pattern>, u32, T)>) -> Result<Self> {
        let mut items = items;
        items.sort_by(|(pa, ida, _), (pb, idb, _)| pa.cmp(pb).then(ida.cmp(idb)));

        let mut literals: Vec<String> = Vec::new();
        let mut literal_to_entries: Vec<Vec<usize>> = Vec::new();
        let mut always = Vec::new();
        let mut entries = Vec::with_capacity(items.len());

        for (idx, (pattern, _, data)) in items.into_iter().enumerate() {
            let lits = if pattern.is_fancy() {
                Vec::new()
            } else {
                extract_literals(pattern.source(), MIN_LITERAL_LEN)
            };
            if lits.is_empty() {
                always.push(idx);
            }
            for lit in lits {
                match literals.iter().position(|l| *l == lit) {
                    Some(pos) => literal_to_entries[pos].push(idx),
                    None => {
                        literals.push(lit);
                        literal_to_entries.push(vec![idx]);
                    }
                }
            }
            entries.push(Entry { pattern, data });
        }

        let automaton = if literals.is_empty() {
            None
        } else {
            Some(
                AhoCorasick::builder()
                    .ascii_case_insensitive(true)
                    .build(&literals)?,
            )
        };

        Ok(Self {
            entries,
            automaton,
            literal_to_entries,
            always,
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Number of entries that bypass the prefilter.
    pub fn unfiltered_len(&self) -> usize {
        self.always.len()
    }

    /// Find the first matching entry in pattern order.
    pub fn match_first<'a, 't>(&'a self, text: &'t str) -> Option<MatchResult<'a, 't, T>> {
        match (&self.automaton, text.is_ascii()) {
            (Some(ac), true) => {
                let mut candidates = self.always.clone();
                for m in ac.find_overlapping_iter(text) {
                    candidates.extend_from_slice(&self.literal_to_entries[m.pattern().as_usize()]);
                }
                candidates.sort_unstable();
                candidates.dedup();
                candidates.into_iter().find_map(|idx| self.try_entry(idx, text))
            }
            // Non-ASCII input can match through Unicode case folding the
            // automaton does not model.
            _ => (0..self.entries.len()).find_map(|idx| self.try_entry(idx, text)),
        }
    }

    fn try_entry<'a, 't>(&'a self, idx: usize, text: &'t str) -> Option<MatchResult<'a, 't, T>> {
        let entry = &self.entries[idx];
        entry.pattern.captures(text).map(|captures| MatchResult {
            data: &entry.data,
            pattern: &entry.pattern,
            captures,
        })
    }

    #[cfg(test)]
    fn match_first_exhaustive<'a, 't>(&'a self, text: &'t str) -> Option<MatchResult<'a, 't, T>> {
        (0..self.entries.len()).find_map(|idx| self.try_entry(idx, text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::PatternEntry;

    fn set(defs: &[(&str, i32, u32)]) -> PatternSet<&'static str> {
        let names = ["a", "b", "c", "d", "e", "f"];
        PatternSet::build(
            defs.iter()
                .enumerate()
                .map(|(i, (re, pos, id))| {
                    (
                        Arc::new(Pattern::compile(PatternEntry::new(*re, *pos)).unwrap()),
                        *id,
                        names[i],
                    )
                })
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn lowest_position_wins() {
        let s = set(&[(r"Safari/(\d+)", 50, 1), (r"Chrome/(\d+)", 10, 2)]);
        let m = s.match_first("Chrome/60 Safari/537").unwrap();
        assert_eq!(*m.data, "b");
        assert_eq!(m.version().to_version_string(), "60");
    }

    #[test]
    fn equal_position_breaks_tie_on_source() {
        let s = set(&[("Mozilla", 5, 1), ("Gecko", 5, 2)]);
        assert_eq!(*s.match_first("Mozilla Gecko").unwrap().data, "b");
    }

    #[test]
    fn identical_patterns_break_tie_on_owner_id() {
        let s = set(&[("Bot", 1, 9), ("Bot", 1, 3)]);
        assert_eq!(*s.match_first("Bot").unwrap().data, "b");
    }

    #[test]
    fn input_order_does_not_matter() {
        let forward = set(&[("Opera", 3, 1), ("Presto", 2, 2), (r"\d", 1, 3)]);
        let backward = set(&[(r"\d", 1, 3), ("Presto", 2, 2), ("Opera", 3, 1)]);
        for ua in ["Opera/9.80 Presto/2.12", "Opera Presto", "Opera", "none"] {
            let f = forward.match_first(ua).map(|m| m.pattern.source().to_string());
            let b = backward.match_first(ua).map(|m| m.pattern.source().to_string());
            assert_eq!(f, b, "{ua}");
        }
    }

    #[test]
    fn prefilter_agrees_with_exhaustive_scan() {
        let s = set(&[
            (r"MSIE (\d+)", 40, 1),
            (r"Trident/7\.0;.*rv:(\d+)", 41, 2),
            (r"(?:Mobile )?Safari/(\d+)", 50, 3),
            (r"Android(?!.*Mobile)", 5, 4),
            (r"\bv(\d+)", 60, 5),
            ("chrome", 20, 6),
        ]);
        assert!(s.unfiltered_len() >= 2);
        for ua in [
            "Mozilla/4.0 (compatible; MSIE 6.0; Windows NT 5.1)",
            "Mozilla/5.0 (Windows NT 6.1; Trident/7.0; rv:11.0) like Gecko",
            "Mozilla/5.0 (Linux; Android 4.4) Mobile Safari/537.36",
            "Mozilla/5.0 (Linux; Android 4.4) Safari/537.36",
            "CHROME v12",
            "Ünïcödé CHROME",
            "",
        ] {
            let fast = s.match_first(ua).map(|m| *m.data);
            let slow = s.match_first_exhaustive(ua).map(|m| *m.data);
            assert_eq!(fast, slow, "{ua}");
        }
    }

    #[test]
    fn no_match() {
        let s = set(&[("Chrome", 1, 1)]);
        assert!(s.match_first("qwertzuiopasdfghjklyxcvbnm").is_none());
        assert!(s.match_first("").is_none());
    }
}
