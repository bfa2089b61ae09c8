//! Compiled grammar tables.
//!
//! A grammar artifact ships one JSON table: a small envelope carrying the
//! runtime ABI version the table was generated for and the start rule, around
//! the tree-sitter rule graph of the language. This module decodes that table
//! with [`facet_json`] into strongly typed structures.

use facet::Facet;
use std::collections::HashMap;

mod rules;

pub use rules::{Rule, RuleType};

/// The decoded form of a grammar artifact.
#[derive(Debug, Clone, Facet)]
pub struct LanguageTable {
    /// Runtime ABI version the table was generated against.
    pub abi_version: u32,

    /// Name of the rule a parse starts from.
    pub start: String,

    /// The language's rule graph.
    pub grammar: Grammar,
}

/// The rule graph of one language, mirroring tree-sitter's `grammar.json`.
#[derive(Debug, Clone, Facet)]
pub struct Grammar {
    /// Short name of the language (e.g. `"fift"`).
    pub name: String,

    /// Map of all rule identifiers to their definitions.
    pub rules: HashMap<String, Rule>,

    /// Rules that may appear between any two tokens, such as whitespace or
    /// comments. When absent, whitespace is the only extra.
    #[facet(default)]
    pub extras: Option<Vec<Rule>>,

    /// Tokens produced by an external scanner.
    #[facet(default)]
    pub externals: Vec<Rule>,

    /// Rules the generator inlines into their callers.
    #[facet(default)]
    pub inline: Vec<String>,

    /// Conflict groups the generator was told to expect.
    #[facet(default)]
    pub conflicts: Vec<Vec<String>>,

    /// Rule used for keyword extraction.
    #[facet(default)]
    pub word: Option<String>,

    /// Rules grouped as supertypes.
    #[facet(default)]
    pub supertypes: Vec<String>,
}

/// Errors raised while decoding a grammar table.
#[derive(Debug, thiserror::Error)]
pub enum GrammarError {
    /// The input was not valid JSON or did not match the table layout.
    #[error("JSON parse error: {0}")]
    JsonParse(String),
}

/// Decodes a JSON grammar table.
///
/// # Errors
///
/// Returns [`GrammarError::JsonParse`] if the text is not valid JSON or does
/// not have the shape of a [`LanguageTable`].
pub fn parse_table(json: &str) -> Result<LanguageTable, GrammarError> {
    facet_json::from_str(json).map_err(|e| GrammarError::JsonParse(e.to_string()))
}

impl Grammar {
    /// Looks up a rule by name.
    #[must_use]
    pub fn rule(&self, name: &str) -> Option<&Rule> {
        self.rules.get(name)
    }

    /// Rule names in lexical order, for reproducible diagnostics.
    #[must_use]
    pub fn rule_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.rules.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Returns `true` if the grammar depends on an external scanner.
    #[must_use]
    pub fn has_externals(&self) -> bool {
        !self.externals.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_table() {
        let json = r#"{
            "abi_version": 14,
            "start": "source_file",
            "grammar": {
                "name": "test",
                "rules": {
                    "source_file": {
                        "type": "SYMBOL",
                        "name": "expression"
                    },
                    "expression": {
                        "type": "CHOICE",
                        "members": [
                            {"type": "STRING", "value": "hello"},
                            {"type": "PATTERN", "value": "[0-9]+"}
                        ]
                    }
                }
            }
        }"#;

        let table = parse_table(json).unwrap();
        assert_eq!(table.abi_version, 14);
        assert_eq!(table.start, "source_file");
        assert_eq!(table.grammar.name, "test");
        assert_eq!(
            table.grammar.rule_names(),
            vec!["expression", "source_file"]
        );
        assert!(table.grammar.extras.is_none());
        assert!(!table.grammar.has_externals());
    }

    #[test]
    fn test_parse_precedence() {
        let json = r#"{
            "abi_version": 14,
            "start": "expr",
            "grammar": {
                "name": "test",
                "rules": {
                    "expr": {
                        "type": "PREC_LEFT",
                        "value": "1",
                        "content": {
                            "type": "SEQ",
                            "members": [
                                {"type": "SYMBOL", "name": "expr"},
                                {"type": "STRING", "value": "+"},
                                {"type": "SYMBOL", "name": "expr"}
                            ]
                        }
                    }
                }
            }
        }"#;

        let table = parse_table(json).unwrap();
        let expr = table.grammar.rule("expr").unwrap();
        assert_eq!(expr.precedence(), Some(1));
        assert_eq!(expr.rule_type, RuleType::PrecLeft);
    }

    #[test]
    fn test_rejects_truncated_table() {
        let err = parse_table(r#"{"abi_version": 14, "start": "#).unwrap_err();
        assert!(err.to_string().starts_with("JSON parse error"));
    }
}
