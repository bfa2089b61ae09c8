//! The parsing runtime.
//!
//! A [`Parser`] is bound to one [`LanguageHandle`] at a time. Binding compiles
//! the handle's grammar into a private matcher table, so parsers never share
//! mutable state and the handle itself is only read.
//!
//! [`RuntimeAdapter`] is the seam the verification runner constructs parsers
//! through; [`PackratRuntime`] adapts [`Parser`] to it.

use crate::language::LanguageHandle;
use crate::validate::ValidationError;
use std::fmt;

mod engine;
mod table;
mod tree;

pub use tree::{Node, Tree, ERROR_KIND};

use engine::Session;
use table::ParseTable;

/// Why a language could not be bound to a parser.
#[derive(Debug, thiserror::Error)]
pub enum LanguageError {
    /// The handle carries no grammar.
    #[error("language handle is empty")]
    EmptyHandle,

    /// The grammar relies on an external scanner this runtime does not have.
    #[error("grammar needs an external scanner for {0} token(s)")]
    ExternalScanner(usize),

    /// The grammar failed structural validation.
    #[error(transparent)]
    Invalid(#[from] ValidationError),

    /// A `PATTERN` terminal is not a valid regular expression.
    #[error("invalid pattern in rule '{rule}': {source}")]
    InvalidPattern {
        /// Rule containing the pattern.
        rule: String,
        /// The regex compiler's diagnostic.
        source: regex::Error,
    },

    /// A rule lacks a field its type requires.
    #[error("malformed {kind} rule in '{rule}'")]
    MalformedRule {
        /// Rule containing the malformed node.
        rule: String,
        /// Type name of the malformed node.
        kind: &'static str,
    },
}

/// Produces syntax trees for the language it is bound to.
#[derive(Default)]
pub struct Parser {
    language: LanguageHandle,
    table: Option<ParseTable>,
}

impl Parser {
    /// Creates a parser with no language.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a parser bound to `handle`.
    ///
    /// # Errors
    ///
    /// See [`Parser::set_language`].
    pub fn for_language(handle: &LanguageHandle) -> Result<Self, LanguageError> {
        let mut parser = Self::new();
        parser.set_language(handle)?;
        Ok(parser)
    }

    /// Binds the parser to `handle`, replacing any previous language.
    ///
    /// On error the parser keeps its previous language.
    ///
    /// # Errors
    ///
    /// Returns a [`LanguageError`] if the handle is empty or its grammar cannot
    /// be compiled.
    pub fn set_language(&mut self, handle: &LanguageHandle) -> Result<(), LanguageError> {
        let language = handle.language().ok_or(LanguageError::EmptyHandle)?;
        let table = ParseTable::compile(language)?;
        tracing::debug!(
            language = language.name(),
            rules = table.rules.len(),
            "parser bound"
        );
        self.table = Some(table);
        self.language = handle.clone();
        Ok(())
    }

    /// The bound language; empty if none was set.
    #[must_use]
    pub fn language(&self) -> &LanguageHandle {
        &self.language
    }

    /// Parses `text`. Returns `None` if no language is bound.
    #[must_use]
    pub fn parse(&self, text: &str) -> Option<Tree> {
        let table = self.table.as_ref()?;
        let root = Session::new(table, text).run();
        Some(Tree::new(root, self.language.clone()))
    }
}

impl fmt::Debug for Parser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Parser")
            .field("language", &self.language)
            .finish_non_exhaustive()
    }
}

/// Builds parsers from language handles.
pub trait RuntimeAdapter: Sync {
    /// The parser type this runtime produces.
    type Parser;
    /// The construction error.
    type Error: std::error::Error;

    /// Builds a parser bound to `handle` without modifying the handle.
    ///
    /// # Errors
    ///
    /// Returns an error if no usable parser can be built from the handle.
    fn construct(&self, handle: &LanguageHandle) -> Result<Self::Parser, Self::Error>;
}

/// The runtime backed by this crate's [`Parser`].
#[derive(Debug, Clone, Copy, Default)]
pub struct PackratRuntime;

impl RuntimeAdapter for PackratRuntime {
    type Parser = Parser;
    type Error = LanguageError;

    fn construct(&self, handle: &LanguageHandle) -> Result<Parser, LanguageError> {
        Parser::for_language(handle)
    }
}
