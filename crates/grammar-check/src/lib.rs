//! Conformance checks for the TON language grammars.
//!
//! Every bundled grammar ships as a precompiled table. This crate loads each
//! table into a [`LanguageHandle`], builds a [`Parser`] from it and reports,
//! per language, whether both steps succeeded.
#![cfg_attr(docsrs, feature(doc_cfg))]
#![allow(clippy::multiple_crate_versions)]

/// The declarative grammar format the tables are written in.
///
/// Tables are JSON documents holding a tree-sitter rule graph plus the ABI
/// version and start rule they were generated for.
pub mod grammar;

/// Structural checks on a rule graph.
///
/// Undefined symbol references are errors. Unreachable rules and left
/// recursion are reported as diagnostics, since grammars in the wild carry both.
pub mod validate;

/// Loading tables into language handles.
pub mod artifact;

/// Language handles and the ABI range the runtime accepts.
pub mod language;

/// The bundled languages.
pub mod languages;

/// The parsing runtime and the adapter the runner builds parsers through.
pub mod parser;

/// The ordered list of languages a run checks.
pub mod registry;

/// The verification runner and per-language results.
pub mod verify;

/// Aggregated results, rendered for humans and as JSON.
pub mod report;

pub use artifact::{GrammarArtifact, LoadError};
pub use grammar::{parse_table, Grammar, GrammarError, LanguageTable, Rule, RuleType};
pub use language::{Language, LanguageFn, LanguageHandle, ABI_VERSION, MIN_COMPATIBLE_ABI_VERSION};
pub use parser::{LanguageError, Node, PackratRuntime, Parser, RuntimeAdapter, Tree};
pub use registry::{GrammarDescriptor, GrammarRegistry};
pub use report::VerificationReport;
pub use validate::{validate, Diagnostics, ValidationError};
pub use verify::{CheckState, Failure, FailureKind, Outcome, Runner, VerificationResult};
