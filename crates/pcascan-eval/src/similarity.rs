//! Address similarity scoring

use crate::normalize::{normalize_address, street_key};
use similar::TextDiff;
use std::collections::HashSet;

/// Minimum word overlap for a partial containment score
const WORD_OVERLAP_FLOOR: f64 = 0.8;

/// Character-level edit similarity in `[0.0, 1.0]`
///
/// Two empty strings are identical.
pub fn edit_ratio(a: &str, b: &str) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 1.0;
    }
    f64::from(TextDiff::from_chars(a, b).ratio())
}

/// Containment score in `[0.0, 1.0]`
///
/// 1.0 when one string contains the other. Otherwise the fraction of the
/// shorter string's words found in the longer one, kept only when it
/// reaches 0.8. The shorter side is chosen by character length.
pub fn containment_score(a: &str, b: &str) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    if a.contains(b) || b.contains(a) {
        return 1.0;
    }

    let (shorter, longer) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    let shorter: HashSet<&str> = shorter.split_whitespace().collect();
    let longer: HashSet<&str> = longer.split_whitespace().collect();
    if shorter.is_empty() {
        return 0.0;
    }

    let overlap = shorter.intersection(&longer).count() as f64 / shorter.len() as f64;
    if overlap >= WORD_OVERLAP_FLOOR {
        overlap
    } else {
        0.0
    }
}

/// Similarity of two raw addresses, compared on their street keys
pub fn address_score(a: &str, b: &str) -> f64 {
    let key_a = street_key(&normalize_address(a));
    let key_b = street_key(&normalize_address(b));
    edit_ratio(&key_a, &key_b).max(containment_score(&key_a, &key_b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edit_ratio_bounds() {
        assert_eq!(edit_ratio("", ""), 1.0);
        assert_eq!(edit_ratio("ABC", "ABC"), 1.0);
        assert_eq!(edit_ratio("ABC", ""), 0.0);
        let r = edit_ratio("100 MAIN ST", "100 MAIN STREET");
        assert!(r > 0.8 && r < 1.0);
    }

    #[test]
    fn test_containment_substring() {
        assert_eq!(containment_score("100 MAIN", "100 MAIN STREET"), 1.0);
        assert_eq!(containment_score("", "100 MAIN"), 0.0);
    }

    #[test]
    fn test_containment_word_overlap_floor() {
        // 4 of 5 words shared
        let score = containment_score("1 A B C D", "1 A B C E F");
        assert!((score - 0.8).abs() < 1e-9);
        // 1 of 2 words shared
        assert_eq!(containment_score("1 X", "1 Y"), 0.0);
    }

    #[test]
    fn test_containment_shorter_side_by_length() {
        // The 13-character side has fewer characters but more words: 4 of 6
        let score = containment_score("LOT AAAAAAAAAAAAAAAAAA B C D", "LOT B C D E F");
        assert_eq!(score, 0.0);
        // Same pair with roles swapped scores the same
        assert_eq!(containment_score("LOT B C D E F", "LOT AAAAAAAAAAAAAAAAAA B C D"), 0.0);
    }

    #[test]
    fn test_address_score_uses_street_key() {
        let score = address_score("100 Main Street, Toronto", "100 MAIN STREET UNIT 4, Etobicoke");
        assert_eq!(score, 1.0);
        assert!(address_score("100 Main St", "42 Birchmount Road") < 0.5);
    }
}
