//! Field normalization for messy export data.
//!
//! The raw book and borrower exports come from spreadsheets: inconsistent
//! whitespace, shouting-case titles, author fields holding anywhere from
//! zero to half a dozen names behind assorted separators. These helpers
//! clean one field at a time; record assembly lives in the catalog and
//! borrower readers.

use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

// The word "and" between author names, any casing, e.g. "Tolkien and Lewis".
static AND_SEPARATOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\s+and\s+").expect("static pattern"));

/// Collapse runs of whitespace to a single space and trim the ends.
pub fn normalize_whitespace(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Capitalize letters at word boundaries — but only when the input is
/// uniformly lower- or upper-case. Mixed casing ("McDonald", "van Dyke")
/// is assumed to be intentional and left alone.
///
/// Any non-alphabetic character starts a new word, so hyphenated and
/// apostrophe names come out as "Anne-Marie O'Brien".
pub fn title_case(value: &str) -> String {
    let value = normalize_whitespace(value);
    let has_upper = value.chars().any(char::is_uppercase);
    let has_lower = value.chars().any(char::is_lowercase);
    if has_upper && has_lower {
        return value;
    }
    let mut cased = String::with_capacity(value.len());
    let mut boundary = true;
    for ch in value.chars() {
        if ch.is_alphabetic() {
            if boundary {
                cased.extend(ch.to_uppercase());
            } else {
                cased.extend(ch.to_lowercase());
            }
            boundary = false;
        } else {
            cased.push(ch);
            boundary = true;
        }
    }
    cased
}

/// Split a raw author field into cleaned, unique names.
///
/// Handles `;`, `,`, `|`, `&`, and the word "and" as separators, then
/// de-duplicates case-insensitively while preserving first-seen order.
pub fn split_authors(field: &str) -> Vec<String> {
    let raw = AND_SEPARATOR.replace_all(field, ",");
    let raw = raw.replace('&', ",");
    let mut seen = HashSet::new();
    let mut names = Vec::new();
    for part in raw.split([';', ',', '|']) {
        let name = title_case(part);
        if !name.is_empty() && seen.insert(name.to_lowercase()) {
            names.push(name);
        }
    }
    names
}

/// Strip the dashes from a formatted SSN, leaving bare digits.
pub fn normalize_ssn(value: &str) -> String {
    normalize_whitespace(value).replace('-', "")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("  two   words ", "two words")]
    #[case("tabs\tand\nnewlines", "tabs and newlines")]
    #[case("", "")]
    #[case("   ", "")]
    fn test_normalize_whitespace(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(normalize_whitespace(input), expected);
    }

    #[rstest]
    #[case("the great gatsby", "The Great Gatsby")]
    #[case("THE GREAT GATSBY", "The Great Gatsby")]
    #[case("The Great Gatsby", "The Great Gatsby")]
    // Hyphens and apostrophes start new words too.
    #[case("anne-marie o'brien", "Anne-Marie O'Brien")]
    #[case("JEAN-LUC PICARD", "Jean-Luc Picard")]
    // Mixed casing is treated as intentional.
    #[case("Ronald McDonald", "Ronald McDonald")]
    #[case("Anne-Marie O'Brien", "Anne-Marie O'Brien")]
    #[case("", "")]
    fn test_title_case(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(title_case(input), expected);
    }

    #[rstest]
    #[case("J. R. R. Tolkien and C. S. Lewis", vec!["J. R. R. Tolkien", "C. S. Lewis"])]
    #[case("tolkien & lewis", vec!["Tolkien", "Lewis"])]
    #[case("a; b| c, d", vec!["A", "B", "C", "D"])]
    // Case-insensitive de-duplication keeps the first spelling seen.
    #[case("George Orwell, GEORGE ORWELL, george orwell", vec!["George Orwell"])]
    #[case("Brandon Sanderson", vec!["Brandon Sanderson"])]
    // "and" inside a name needs surrounding whitespace to be a separator.
    #[case("Alexandra Grande", vec!["Alexandra Grande"])]
    #[case("", Vec::<&str>::new())]
    #[case(" ;, | ", Vec::<&str>::new())]
    fn test_split_authors(#[case] input: &str, #[case] expected: Vec<&str>) {
        assert_eq!(split_authors(input), expected);
    }

    #[rstest]
    #[case("123-45-6789", "123456789")]
    #[case("123456789", "123456789")]
    #[case(" 123-45-6789 ", "123456789")]
    fn test_normalize_ssn(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(normalize_ssn(input), expected);
    }
}
