// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use squad_core::names::is_dictionary_name;

#[test]
fn candidates_come_from_the_dictionary() {
    let names = RandomNameGen::new();
    for _ in 0..50 {
        assert!(is_dictionary_name(&names.candidate()));
    }
}

#[test]
fn candidates_vary() {
    let names = RandomNameGen::new();
    let mut seen = std::collections::HashSet::new();
    for _ in 0..100 {
        seen.insert(names.candidate());
    }
    assert!(seen.len() > 10);
}
