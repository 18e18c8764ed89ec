//! Address and PCA identifier normalization
//!
//! Addresses from the model and from labellers differ in case, punctuation,
//! unit notation and trailing city/province/postal code. Normalization
//! reduces both sides to a comparable form; the street key keeps only the
//! street number and the first one or two words of the street name.

use regex::Regex;
use std::collections::BTreeSet;
use std::sync::LazyLock;

static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));
static UNIT_WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(?:UNIT|SUITE)\b").expect("valid unit word regex"));
static HASH_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"#\d+").expect("valid hash number regex"));
static POSTAL_CODE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b[A-Z]\d[A-Z]\s*\d[A-Z]\d\b").expect("valid postal code regex")
});
static STREET_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+[A-Z]?)").expect("valid street number regex"));
static STREET_KEY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d+[A-Z]?)\s+([A-Z]+(?:\s+[A-Z]+)?)").expect("valid street key regex")
});
static UNIT_RANGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:UNITS?|SUITES?)\s*#?\s*(\d+)(?:\s*(?:TO|-)\s*(\d+))?")
        .expect("valid unit range regex")
});
static PCA_HASH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"#(\d+)").expect("valid PCA hash regex"));
static PCA_WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bPCA\s+(\d+)").expect("valid PCA word regex"));
static LEADING_DIGITS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)").expect("valid leading digits regex"));

/// Canadian province and territory abbreviations
const PROVINCES: [&str; 13] = [
    "AB", "BC", "MB", "NB", "NL", "NS", "NT", "NU", "ON", "PE", "QC", "SK", "YT",
];

/// Widest unit range expanded into individual numbers
const MAX_UNIT_SPAN: u32 = 1_000;

/// Uppercase, drop commas and periods, collapse whitespace
fn simplify(addr: &str) -> String {
    let upper = addr.to_uppercase().replace([',', '.'], "");
    WHITESPACE.replace_all(upper.trim(), " ").into_owned()
}

/// Normalize an address for comparison
///
/// ```
/// use pcascan_eval::normalize_address;
///
/// assert_eq!(
///     normalize_address("100 Main St., Unit 3, Toronto, ON M5V 2T6"),
///     "100 MAIN ST 3 TORONTO"
/// );
/// ```
pub fn normalize_address(addr: &str) -> String {
    let simplified = simplify(addr);
    let without_units = UNIT_WORD.replace_all(&simplified, "");
    let without_hash = HASH_NUMBER.replace_all(&without_units, "");
    let without_postal = POSTAL_CODE.replace_all(&without_hash, "");

    without_postal
        .split_whitespace()
        .filter(|token| !PROVINCES.contains(token))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Leading street number of a normalized address, e.g. `100` or `12A`
pub fn street_number(normalized: &str) -> Option<&str> {
    STREET_NUMBER
        .captures(normalized)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
}

/// Street number plus up to two following words, or the whole normalized
/// address when it does not start with a number
pub fn street_key(normalized: &str) -> String {
    match STREET_KEY.captures(normalized) {
        Some(caps) => format!("{} {}", &caps[1], &caps[2]),
        None => normalized.to_string(),
    }
}

/// Unit numbers named in a raw address
///
/// `UNIT 3`, `UNITS 3-5`, `SUITE #12` and `UNITS 3 TO 5` are recognized.
pub fn unit_numbers(addr: &str) -> BTreeSet<u32> {
    let simplified = simplify(addr);
    let mut units = BTreeSet::new();

    for caps in UNIT_RANGE.captures_iter(&simplified) {
        let Some(start) = caps.get(1).and_then(|m| m.as_str().parse::<u32>().ok()) else {
            continue;
        };
        let end = caps.get(2).and_then(|m| m.as_str().parse::<u32>().ok());

        match end {
            Some(end) => {
                let (lo, hi) = (start.min(end), start.max(end));
                if hi - lo <= MAX_UNIT_SPAN {
                    units.extend(lo..=hi);
                } else {
                    units.insert(lo);
                    units.insert(hi);
                }
            }
            None => {
                units.insert(start);
            }
        }
    }

    units
}

/// Whether two raw addresses could refer to the same place
///
/// Street numbers must agree when both are present. Unit sets must
/// intersect when both sides name units; otherwise the addresses are
/// compatible.
pub fn addresses_compatible(a: &str, b: &str) -> bool {
    let norm_a = normalize_address(a);
    let norm_b = normalize_address(b);

    if let (Some(num_a), Some(num_b)) = (street_number(&norm_a), street_number(&norm_b)) {
        if num_a != num_b {
            return false;
        }
    }

    let units_a = unit_numbers(a);
    let units_b = unit_numbers(b);
    if units_a.is_empty() || units_b.is_empty() {
        return true;
    }
    !units_a.is_disjoint(&units_b)
}

/// PCA identifier from free text
///
/// Tried in order: the whole string is a number, `#N`, `PCA N`, leading
/// digits. Returns `None` when nothing matches; such rows never match.
pub fn pca_identifier(text: &str) -> Option<String> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    if text.chars().all(|c| c.is_ascii_digit()) {
        return Some(text.to_string());
    }

    [&*PCA_HASH, &*PCA_WORD, &*LEADING_DIGITS]
        .iter()
        .find_map(|re| re.captures(text).and_then(|c| c.get(1)))
        .map(|m| m.as_str().to_string())
}
