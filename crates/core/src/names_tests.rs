// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn name_at_concatenates_pascal_case() {
    assert_eq!(name_at(0, 24), "AlphaGlade");
    assert_eq!(name_at(3, 43), "BetaRidge");
}

#[test]
fn name_at_wraps_indices() {
    let wrapped = name_at(NAME_ADJECTIVES.len(), NAME_NOUNS.len());
    assert_eq!(wrapped, name_at(0, 0));
}

#[test]
fn dictionary_words_are_pascal_case() {
    for word in NAME_ADJECTIVES.iter().chain(NAME_NOUNS) {
        let mut chars = word.chars();
        assert!(chars.next().unwrap().is_ascii_uppercase(), "{word}");
        assert!(chars.all(|c| c.is_ascii_lowercase()), "{word}");
    }
}

#[test]
fn recognizes_dictionary_names() {
    assert!(is_dictionary_name("AlphaGlade"));
    assert!(is_dictionary_name("SwiftReef"));
    assert!(!is_dictionary_name("alphaglade"));
    assert!(!is_dictionary_name("Alpha"));
    assert!(!is_dictionary_name("AlphaBogus"));
}

#[test]
fn seq_gen_walks_dictionary_without_repeats() {
    let gen = SeqNameGen::new();
    let mut seen = std::collections::HashSet::new();
    for _ in 0..NAME_NOUNS.len() * 2 {
        assert!(seen.insert(gen.candidate()));
    }
}
