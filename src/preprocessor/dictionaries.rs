// src/preprocessor/dictionaries.rs - Built-in substitution tables
//
// Both tables map a base to the characters that stand in for it. Bases are
// what gets written; aliases are what appears in chat.

use std::collections::BTreeMap;

fn table(entries: &[(&str, &[&str])]) -> BTreeMap<String, Vec<String>> {
    entries
        .iter()
        .map(|(base, aliases)| {
            (
                base.to_string(),
                aliases.iter().map(|alias| alias.to_string()).collect(),
            )
        })
        .collect()
}

/// Digits and symbols commonly typed in place of letters.
pub fn default_leet_speak() -> BTreeMap<String, Vec<String>> {
    table(&[
        ("a", &["4", "@"]),
        ("b", &["8"]),
        ("c", &["(", "[", "{"]),
        ("e", &["3"]),
        ("g", &["6", "9"]),
        ("i", &["1", "!"]),
        ("o", &["0"]),
        ("s", &["5", "$"]),
        ("t", &["7", "+"]),
    ])
}

/// Lookalike characters from other scripts, and ligatures that NFKD leaves
/// alone.
///
/// Aliases are lowercase: the preprocessor lowercases before looking them up.
pub fn default_confusables() -> BTreeMap<String, Vec<String>> {
    table(&[
        // Cyrillic
        ("a", &["\u{0430}", "\u{03B1}"]),
        ("b", &["\u{0432}", "\u{03B2}"]),
        ("c", &["\u{0441}", "\u{03F2}"]),
        ("e", &["\u{0435}", "\u{0454}"]),
        ("h", &["\u{043D}", "\u{04BB}"]),
        ("i", &["\u{0456}", "\u{03B9}"]),
        ("j", &["\u{0458}"]),
        ("k", &["\u{043A}", "\u{03BA}"]),
        ("l", &["|", "\u{04CF}", "\u{01C0}"]),
        ("m", &["\u{043C}"]),
        ("n", &["\u{03B7}"]),
        ("o", &["\u{043E}", "\u{03BF}", "\u{03C3}"]),
        ("p", &["\u{0440}", "\u{03C1}"]),
        ("s", &["\u{0455}"]),
        ("t", &["\u{0442}", "\u{03C4}"]),
        ("u", &["\u{03C5}"]),
        ("v", &["\u{03BD}"]),
        ("w", &["\u{0461}", "\u{03C9}"]),
        ("x", &["\u{0445}", "\u{03C7}"]),
        ("y", &["\u{0443}", "\u{03B3}"]),
        // Ligatures
        ("ae", &["\u{00E6}"]),
        ("oe", &["\u{0153}"]),
        ("ss", &["\u{00DF}"]),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn assert_aliases_unique(table: &BTreeMap<String, Vec<String>>) {
        let mut seen = HashSet::new();
        for (base, aliases) in table {
            for alias in aliases {
                assert_eq!(alias.chars().count(), 1, "alias {alias:?} of {base:?}");
                assert!(seen.insert(alias.clone()), "alias {alias:?} appears twice");
            }
        }
    }

    #[test]
    fn test_default_tables_are_well_formed() {
        assert_aliases_unique(&default_leet_speak());
        assert_aliases_unique(&default_confusables());

        for base in default_leet_speak().keys() {
            assert!(base.chars().all(|c| c.is_ascii_lowercase()));
        }
        for (base, aliases) in default_confusables() {
            assert!(base.chars().all(|c| c.is_ascii_lowercase()));
            for alias in aliases {
                let c = alias.chars().next().unwrap();
                assert_eq!(c.to_lowercase().collect::<String>(), alias, "{alias:?} is not lowercase");
            }
        }
    }

    #[test]
    fn test_leet_and_confusables_do_not_overlap() {
        let leet: HashSet<String> = default_leet_speak().into_values().flatten().collect();
        let confusables: HashSet<String> = default_confusables().into_values().flatten().collect();
        assert!(leet.is_disjoint(&confusables));
    }
}
