//! Company-name cleanup and identifier sanitization.
//!
//! `shorten_company_name` is the computed fallback for the `short_name`
//! template variable: it strips a trailing legal suffix, drops punctuation,
//! and title-cases the remainder. The transform is pure and locale-unaware;
//! its output feeds both rendering and the public upload identifier, so the
//! suffix list and stripping order must stay stable.

/// Legal suffixes dropped from the end of a company name.
const LEGAL_SUFFIXES: &[&str] = &[
    "inc",
    "llc",
    "ltd",
    "co",
    "company",
    "group",
    "plc",
    "corp",
    "corporation",
];

/// Shorten a company name for logo-style display.
///
/// Steps, in order:
/// 1. Trim and split on whitespace.
/// 2. If the last token, lowercased and stripped of trailing `.`/`,`,
///    matches a legal suffix, drop it. The check runs on the original
///    token before any character stripping.
/// 3. Remove every character outside `[A-Za-z0-9 ]`.
/// 4. Title-case each remaining word and join with single spaces.
///
/// ```
/// use maqueta::naming::shorten_company_name;
/// assert_eq!(shorten_company_name("Acme Roofing, Inc."), "Acme Roofing");
/// ```
pub fn shorten_company_name(name: &str) -> String {
    let mut words: Vec<&str> = name.trim().split_whitespace().collect();

    if let Some(last) = words.last() {
        let bare = last.to_lowercase();
        let bare = bare.trim_matches(|c| c == '.' || c == ',');
        if LEGAL_SUFFIXES.contains(&bare) {
            words.pop();
        }
    }

    let cleaned: String = words
        .join(" ")
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == ' ')
        .collect();

    cleaned
        .split_whitespace()
        .map(capitalize)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Uppercase the first character, lowercase the rest (Python `str.capitalize`).
fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(|c| c.to_lowercase())).collect(),
        None => String::new(),
    }
}

/// Sanitize a value for use inside a public upload identifier.
///
/// Keeps ASCII alphanumerics, maps runs of anything else to single dashes,
/// lowercases, and trims dashes from both ends.
pub fn sanitize_identifier(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut pending_dash = false;
    for c in value.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !out.is_empty() {
                out.push('-');
            }
            pending_dash = false;
            out.push(c.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_drops_legal_suffix_with_punctuation() {
        assert_eq!(shorten_company_name("Acme Roofing, Inc."), "Acme Roofing");
        assert_eq!(shorten_company_name("Globex Corp"), "Globex");
        assert_eq!(shorten_company_name("Initech ltd,"), "Initech");
    }

    #[test]
    fn test_strips_non_alphanumeric() {
        assert_eq!(shorten_company_name("bob's plumbing co"), "Bobs Plumbing");
        assert_eq!(shorten_company_name("A&B Heating + Air"), "Ab Heating Air");
    }

    #[test]
    fn test_title_cases_every_word() {
        assert_eq!(shorten_company_name("JUST ONE WORD"), "Just One Word");
        assert_eq!(shorten_company_name("  mixed   Case llc "), "Mixed Case");
    }

    #[test]
    fn test_suffix_only_matches_last_token() {
        // "Co" mid-name is kept; only a trailing suffix is dropped.
        assert_eq!(shorten_company_name("Co Op Market"), "Co Op Market");
        assert_eq!(shorten_company_name("Company of Heroes Inc"), "Company Of Heroes");
    }

    #[test]
    fn test_empty_and_suffix_only() {
        assert_eq!(shorten_company_name(""), "");
        assert_eq!(shorten_company_name("   "), "");
        assert_eq!(shorten_company_name("LLC"), "");
    }

    #[test]
    fn test_suffix_check_precedes_character_strip() {
        // "In.c" does not match a suffix even though stripping dots later
        // would make it "Inc".
        assert_eq!(shorten_company_name("Acme In.c"), "Acme Inc");
    }

    #[test]
    fn test_sanitize_identifier() {
        assert_eq!(sanitize_identifier("Acme Roofing"), "acme-roofing");
        assert_eq!(sanitize_identifier("  weird__name!! "), "weird-name");
        assert_eq!(sanitize_identifier("ALLCAPS123"), "allcaps123");
        assert_eq!(sanitize_identifier("***"), "");
    }
}
