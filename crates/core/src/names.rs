// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Two-word agent name dictionary and generation.
//!
//! Agent names are two concatenated PascalCase English words (`AlphaGlade`,
//! `BetaRidge`). Generation is behind a trait so the registry can stay
//! deterministic under test.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// First word of an agent name.
pub const NAME_ADJECTIVES: &[&str] = &[
    "Alpha", "Amber", "Ashen", "Beta", "Bold", "Brass", "Brave", "Bright", "Bronze", "Calm",
    "Cedar", "Civic", "Clear", "Cobalt", "Copper", "Coral", "Crimson", "Delta", "Dusty", "Eager",
    "Early", "Ember", "Fabled", "Fleet", "Gamma", "Gentle", "Golden", "Granite", "Hazel", "Indigo",
    "Iron", "Ivory", "Jade", "Keen", "Lively", "Lunar", "Maple", "Mellow", "Noble", "Ochre",
    "Opal", "Pewter", "Quiet", "Rapid", "Rustic", "Sable", "Silver", "Solar", "Steady", "Swift",
    "Tidal", "Umber", "Vivid", "Wry",
];

/// Second word of an agent name.
pub const NAME_NOUNS: &[&str] = &[
    "Anchor", "Arbor", "Atlas", "Basin", "Beacon", "Bluff", "Briar", "Brook", "Canyon", "Cedar",
    "Cliff", "Comet", "Cove", "Crag", "Creek", "Dale", "Delta", "Drift", "Dune", "Falcon",
    "Fern", "Fjord", "Forge", "Gale", "Glade", "Glen", "Grove", "Harbor", "Heath", "Hollow",
    "Inlet", "Knoll", "Lagoon", "Ledge", "Marsh", "Mesa", "Moor", "Orchard", "Peak", "Pine",
    "Prairie", "Quarry", "Reef", "Ridge", "River", "Shoal", "Summit", "Thicket", "Tundra", "Vale",
];

/// Compose the name at the given dictionary indices (wrapping).
pub fn name_at(adjective: usize, noun: usize) -> String {
    format!(
        "{}{}",
        NAME_ADJECTIVES[adjective % NAME_ADJECTIVES.len()],
        NAME_NOUNS[noun % NAME_NOUNS.len()]
    )
}

/// Whether a string is a well-formed dictionary name.
pub fn is_dictionary_name(name: &str) -> bool {
    NAME_ADJECTIVES
        .iter()
        .any(|adj| name.starts_with(adj) && NAME_NOUNS.contains(&&name[adj.len()..]))
}

/// Produces candidate agent names.
///
/// Callers retry on collision, so implementations only need to cover the
/// dictionary space, not guarantee uniqueness.
pub trait NameGen: Clone + Send + Sync + 'static {
    fn candidate(&self) -> String;
}

/// Deterministic generator for tests: walks the dictionary in order.
#[derive(Clone)]
pub struct SeqNameGen {
    next: Arc<AtomicUsize>,
}

impl SeqNameGen {
    pub fn new() -> Self {
        Self {
            next: Arc::new(AtomicUsize::new(0)),
        }
    }
}

impl Default for SeqNameGen {
    fn default() -> Self {
        Self::new()
    }
}

impl NameGen for SeqNameGen {
    fn candidate(&self) -> String {
        let n = self.next.fetch_add(1, Ordering::SeqCst);
        name_at(n / NAME_NOUNS.len(), n % NAME_NOUNS.len())
    }
}

#[cfg(test)]
#[path = "names_tests.rs"]
mod tests;
