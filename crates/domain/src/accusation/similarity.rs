//! Word-overlap heuristic for free-text answers.

use std::collections::BTreeSet;

/// Lowercase alphanumeric words of `text`.
pub fn words(text: &str) -> BTreeSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// Jaccard index of the two word sets, in `[0, 1]`. Symmetric; two texts
/// without any words score 0.
pub fn similarity(a: &str, b: &str) -> f64 {
    let a = words(a);
    let b = words(b);
    let union = a.union(&b).count();
    if union == 0 {
        return 0.0;
    }
    a.intersection(&b).count() as f64 / union as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_texts_match_fully() {
        assert_eq!(similarity("Gambling debts", "gambling DEBTS!"), 1.0);
    }

    #[test]
    fn disjoint_texts_do_not_match() {
        assert_eq!(similarity("revenge", "gambling debts"), 0.0);
    }

    #[test]
    fn empty_texts_do_not_match() {
        assert_eq!(similarity("", ""), 0.0);
        assert_eq!(similarity("...", "debts"), 0.0);
    }

    #[test]
    fn similarity_is_symmetric() {
        let pairs = [
            ("He needed money", "he needed money to pay off his debts"),
            ("smashed the case", "the case was smashed with a hammer"),
            ("", "anything"),
        ];
        for (a, b) in pairs {
            assert_eq!(similarity(a, b), similarity(b, a));
        }
    }

    #[test]
    fn partial_overlap_is_intersection_over_union() {
        // {he, needed, money} vs {he, needed, cash}: 2 / 4
        assert_eq!(similarity("He needed money", "he needed cash"), 0.5);
    }
}
