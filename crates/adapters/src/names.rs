// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Random agent name generation.

use rand::Rng;
use squad_core::names::{name_at, NameGen, NAME_ADJECTIVES, NAME_NOUNS};

/// Draws uniformly from the two-word dictionary.
#[derive(Clone, Copy, Default)]
pub struct RandomNameGen;

impl RandomNameGen {
    pub fn new() -> Self {
        Self
    }
}

impl NameGen for RandomNameGen {
    fn candidate(&self) -> String {
        let mut rng = rand::rng();
        name_at(
            rng.random_range(0..NAME_ADJECTIVES.len()),
            rng.random_range(0..NAME_NOUNS.len()),
        )
    }
}

#[cfg(test)]
#[path = "names_tests.rs"]
mod tests;
