use regex_syntax::hir::literal::{ExtractKind, Extractor};
use regex_syntax::ParserBuilder;

/// Extract the literal prefixes of a regex pattern for use as Aho-Corasick
/// pre-filter candidates.
///
/// Every match of the pattern starts with one of the returned literals, so an
/// input containing none of them cannot match. An empty vec means no such
/// guarantee could be established and the pattern must always be tried:
/// unparseable patterns (look-around, back-references), unbounded or
/// too-large prefix sets, any prefix shorter than `min_len` bytes, or any
/// non-ASCII prefix (the automaton only folds ASCII case).
pub(crate) fn extract_literals(pattern: &str, min_len: usize) -> Vec<String> {
    let hir = match ParserBuilder::new().build().parse(pattern) {
        Ok(h) => h,
        Err(_) => return Vec::new(),
    };

    let mut extractor = Extractor::new();
    extractor.kind(ExtractKind::Prefix);

    let seq = extractor.extract(&hir);
    let literals = match seq.literals() {
        Some(lits) if !lits.is_empty() => lits,
        _ => return Vec::new(),
    };

    let mut out = Vec::with_capacity(literals.len());
    for lit in literals {
        match std::str::from_utf8(lit.as_bytes()) {
            Ok(s) if s.len() >= min_len && s.is_ascii() => out.push(s.to_ascii_lowercase()),
            _ => return Vec::new(),
        }
    }
    out.sort();
    out.dedup();
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_literal() {
        let lits = extract_literals("Firefox", 3);
        assert_eq!(lits, vec!["firefox"]);
    }

    #[test]
    fn alternation() {
        let lits = extract_literals("Firefox|Chrome", 3);
        assert!(lits.contains(&"firefox".to_string()));
        assert!(lits.contains(&"chrome".to_string()));
    }

    #[test]
    fn too_short_returns_empty() {
        let lits = extract_literals(r"\d+\.\d+", 3);
        assert!(lits.is_empty());
    }

    #[test]
    fn one_short_alternative_disables_the_prefilter() {
        assert!(extract_literals("Firefox|IE", 3).is_empty());
    }

    #[test]
    fn optional_prefix_keeps_both_branches() {
        let lits = extract_literals("(?:Mobile )?Safari", 3);
        assert!(lits.contains(&"safari".to_string()));
        assert!(lits.contains(&"mobile safari".to_string()));
    }

    #[test]
    fn optional_everything_is_always_candidate() {
        assert!(extract_literals(r"(?:Chrome)?\d", 3).is_empty());
    }

    #[test]
    fn lookaround_is_always_candidate() {
        assert!(extract_literals("Android(?!.*Mobile)", 3).is_empty());
    }
}
