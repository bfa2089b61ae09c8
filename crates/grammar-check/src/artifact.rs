//! Precompiled grammar tables and their loader.
//!
//! A [`GrammarArtifact`] is the embedded table of one language. Loading it
//! either yields a non-empty [`LanguageHandle`] or the empty handle; the
//! reason for an empty handle is only logged, never returned, because callers
//! treat emptiness as the single failure signal.

use crate::grammar::{parse_table, GrammarError};
use crate::language::{Language, LanguageHandle, ABI_VERSION, MIN_COMPATIBLE_ABI_VERSION};

/// Why a table could not be turned into a [`Language`].
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// The artifact carries no table at all.
    #[error("grammar table is missing")]
    Missing,

    /// The table could not be decoded.
    #[error(transparent)]
    Decode(#[from] GrammarError),

    /// The table was generated for a runtime ABI outside the supported range.
    #[error(
        "table ABI version {found} is outside the supported range {min}..={max}",
        min = MIN_COMPATIBLE_ABI_VERSION,
        max = ABI_VERSION
    )]
    IncompatibleAbi {
        /// ABI version recorded in the table.
        found: u32,
    },

    /// The table describes a different language than the artifact claims.
    #[error("table is for language '{found}', expected '{expected}'")]
    NameMismatch {
        /// Name the artifact was registered under.
        expected: String,
        /// Name recorded in the table.
        found: String,
    },

    /// The table has no rules.
    #[error("grammar table has no rules")]
    Empty,

    /// The declared start rule does not exist.
    #[error("start rule '{0}' is not defined")]
    MissingStartRule(String),
}

/// The embedded, precompiled table of one language.
#[derive(Debug, Clone, Copy)]
pub struct GrammarArtifact {
    name: &'static str,
    table: &'static str,
}

impl GrammarArtifact {
    /// Wraps the JSON table `table` for the language `name`.
    #[must_use]
    pub const fn new(name: &'static str, table: &'static str) -> Self {
        Self { name, table }
    }

    /// The language name the artifact is published under.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Decodes and checks the table.
    ///
    /// # Errors
    ///
    /// Returns a [`LoadError`] if the table is missing, undecodable, built for
    /// an incompatible ABI, mislabelled or empty.
    pub fn try_load(&self) -> Result<Language, LoadError> {
        if self.table.trim().is_empty() {
            return Err(LoadError::Missing);
        }
        let table = parse_table(self.table)?;

        if !(MIN_COMPATIBLE_ABI_VERSION..=ABI_VERSION).contains(&table.abi_version) {
            return Err(LoadError::IncompatibleAbi {
                found: table.abi_version,
            });
        }
        if table.grammar.name != self.name {
            return Err(LoadError::NameMismatch {
                expected: self.name.to_string(),
                found: table.grammar.name,
            });
        }
        if table.grammar.rules.is_empty() {
            return Err(LoadError::Empty);
        }
        if table.grammar.rule(&table.start).is_none() {
            return Err(LoadError::MissingStartRule(table.start));
        }

        Ok(Language::new(table.abi_version, table.start, table.grammar))
    }

    /// Loads the table, collapsing every failure into the empty handle.
    #[must_use]
    pub fn load(&self) -> LanguageHandle {
        match self.try_load() {
            Ok(language) => {
                tracing::debug!(
                    language = self.name,
                    abi = language.abi_version(),
                    rules = language.rule_count(),
                    "grammar table loaded"
                );
                language.into()
            }
            Err(e) => {
                tracing::warn!(language = self.name, error = %e, "grammar table rejected");
                LanguageHandle::empty()
            }
        }
    }
}
