//! Loaded grammars and the handles that share them.

use crate::grammar::Grammar;
use std::fmt;
use std::sync::Arc;

/// Newest table ABI version the runtime understands.
pub const ABI_VERSION: u32 = 15;

/// Oldest table ABI version the runtime still accepts.
pub const MIN_COMPATIBLE_ABI_VERSION: u32 = 13;

/// The zero-argument entry point every grammar artifact exposes.
pub type LanguageFn = fn() -> LanguageHandle;

/// A grammar that passed loading: decoded, ABI-compatible and non-empty.
#[derive(Debug)]
pub struct Language {
    abi_version: u32,
    start: String,
    grammar: Grammar,
}

impl Language {
    pub(crate) fn new(abi_version: u32, start: String, grammar: Grammar) -> Self {
        Self {
            abi_version,
            start,
            grammar,
        }
    }

    /// The language name recorded in the table.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.grammar.name
    }

    /// The ABI version the table was generated for.
    #[must_use]
    pub fn abi_version(&self) -> u32 {
        self.abi_version
    }

    /// The rule a parse starts from.
    #[must_use]
    pub fn start_rule(&self) -> &str {
        &self.start
    }

    /// The rule graph.
    #[must_use]
    pub fn grammar(&self) -> &Grammar {
        &self.grammar
    }

    /// Number of rules in the grammar.
    #[must_use]
    pub fn rule_count(&self) -> usize {
        self.grammar.rules.len()
    }
}

/// Shared, immutable reference to a loaded [`Language`].
///
/// An empty handle is the failure value of a grammar accessor. Cloning a
/// non-empty handle shares the same table, so one handle can back any number
/// of parsers on any number of threads.
#[derive(Clone, Default)]
pub struct LanguageHandle(Option<Arc<Language>>);

impl LanguageHandle {
    /// The empty handle.
    #[must_use]
    pub fn empty() -> Self {
        Self(None)
    }

    /// Returns `true` if no grammar is loaded behind this handle.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_none()
    }

    /// The loaded language, if any.
    #[must_use]
    pub fn language(&self) -> Option<&Language> {
        self.0.as_deref()
    }

    /// The language name, if any.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.language().map(Language::name)
    }

    /// Returns `true` if both handles share the same loaded table.
    #[must_use]
    pub fn same_table(&self, other: &Self) -> bool {
        match (&self.0, &other.0) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl From<Language> for LanguageHandle {
    fn from(language: Language) -> Self {
        Self(Some(Arc::new(language)))
    }
}

impl fmt::Debug for LanguageHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.language() {
            Some(language) => f
                .debug_struct("LanguageHandle")
                .field("name", &language.name())
                .field("abi_version", &language.abi_version)
                .field("rules", &language.rule_count())
                .finish(),
            None => f.write_str("LanguageHandle(empty)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::parse_table;

    fn handle() -> LanguageHandle {
        let table = parse_table(
            r#"{"abi_version": 14, "start": "root", "grammar": {"name": "mini", "rules": {
                "root": {"type": "STRING", "value": "x"}
            }}}"#,
        )
        .unwrap();
        Language::new(table.abi_version, table.start, table.grammar).into()
    }

    #[test]
    fn test_empty_handle() {
        let empty = LanguageHandle::empty();
        assert!(empty.is_empty());
        assert!(empty.name().is_none());
        assert!(!empty.same_table(&LanguageHandle::default()));
        assert_eq!(format!("{empty:?}"), "LanguageHandle(empty)");
    }

    #[test]
    fn test_clones_share_the_table() {
        let a = handle();
        let b = a.clone();
        assert!(a.same_table(&b));
        assert!(!a.same_table(&handle()));
        assert_eq!(b.name(), Some("mini"));
        assert_eq!(b.language().unwrap().start_rule(), "root");
        assert_eq!(b.language().unwrap().rule_count(), 1);
    }

    #[test]
    fn test_handle_is_shareable_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<LanguageHandle>();

        let shared = handle();
        std::thread::scope(|s| {
            for _ in 0..4 {
                s.spawn(|| assert_eq!(shared.name(), Some("mini")));
            }
        });
    }
}
