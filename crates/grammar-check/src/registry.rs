//! The list of grammars a run verifies.

use crate::language::LanguageFn;
use crate::languages;
use std::collections::HashSet;

/// Source label of the grammars shipped inside this crate.
pub const BUNDLED: &str = "bundled";

/// One language to verify: where it comes from and how to load it.
#[derive(Debug, Clone)]
pub struct GrammarDescriptor {
    /// Language identifier, e.g. `fift`.
    pub id: String,
    /// Where the artifact comes from, e.g. `bundled`.
    pub source: String,
    /// Loads the artifact.
    pub accessor: LanguageFn,
}

impl GrammarDescriptor {
    /// Describes the language `id` from `source`, loaded by `accessor`.
    #[must_use]
    pub fn new(id: impl Into<String>, source: impl Into<String>, accessor: LanguageFn) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            accessor,
        }
    }
}

/// An ordered list of grammar descriptors.
///
/// Ids need not be unique; every entry is verified on its own.
#[derive(Debug, Clone, Default)]
pub struct GrammarRegistry {
    entries: Vec<GrammarDescriptor>,
}

impl GrammarRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The grammars shipped with this crate, in a fixed order.
    #[must_use]
    pub fn bundled() -> Self {
        languages::ALL
            .iter()
            .fold(Self::new(), |registry, (id, accessor)| {
                registry.register(GrammarDescriptor::new(*id, BUNDLED, *accessor))
            })
    }

    /// Appends `descriptor`.
    #[must_use]
    pub fn register(mut self, descriptor: GrammarDescriptor) -> Self {
        self.entries.push(descriptor);
        self
    }

    /// Descriptors in registration order.
    pub fn iter(&self) -> std::slice::Iter<'_, GrammarDescriptor> {
        self.entries.iter()
    }

    /// Number of entries, duplicates included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Ids in registration order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|d| d.id.as_str())
    }

    /// Ids registered more than once, each reported once, in order of first
    /// repetition.
    #[must_use]
    pub fn duplicate_ids(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        let mut dupes = Vec::new();
        for id in self.ids() {
            if !seen.insert(id) && !dupes.contains(&id) {
                dupes.push(id);
            }
        }
        dupes
    }

    /// Keeps only entries whose id is in `ids`.
    #[must_use]
    pub fn retain_ids<S: AsRef<str>>(mut self, ids: &[S]) -> Self {
        self.entries
            .retain(|d| ids.iter().any(|id| id.as_ref() == d.id));
        self
    }
}

impl<'a> IntoIterator for &'a GrammarRegistry {
    type Item = &'a GrammarDescriptor;
    type IntoIter = std::slice::Iter<'a, GrammarDescriptor>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language::LanguageHandle;

    #[test]
    fn test_bundled_order() {
        let registry = GrammarRegistry::bundled();
        assert_eq!(
            registry.ids().collect::<Vec<_>>(),
            vec!["fift", "func", "tlb", "tolk"]
        );
        assert!(registry.iter().all(|d| d.source == BUNDLED));
        assert!(registry.duplicate_ids().is_empty());
    }

    #[test]
    fn test_duplicates_are_kept() {
        let registry = GrammarRegistry::new()
            .register(GrammarDescriptor::new("fift", "a", LanguageHandle::empty))
            .register(GrammarDescriptor::new("func", "a", LanguageHandle::empty))
            .register(GrammarDescriptor::new("fift", "b", LanguageHandle::empty))
            .register(GrammarDescriptor::new("fift", "c", LanguageHandle::empty));
        assert_eq!(registry.len(), 4);
        assert_eq!(registry.duplicate_ids(), vec!["fift"]);
    }

    #[test]
    fn test_retain_ids() {
        let registry = GrammarRegistry::bundled().retain_ids(&["tolk", "fift", "nope"]);
        assert_eq!(registry.ids().collect::<Vec<_>>(), vec!["fift", "tolk"]);

        let none = GrammarRegistry::bundled().retain_ids::<&str>(&[]);
        assert!(none.is_empty());
    }
}
