//! Structural checks over a grammar before the runtime compiles it.
//!
//! Undefined symbol references make a table unusable and are reported as a
//! [`ValidationError`]. Unreachable and left-recursive rules are not fatal:
//! they are returned as [`Diagnostics`] and logged.

use crate::grammar::{Grammar, Rule, RuleType};
use std::collections::{BTreeSet, HashMap, HashSet};

/// A fatal grammar defect.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// A `SYMBOL` names a rule the grammar does not define.
    #[error("undefined symbol '{symbol}' referenced in rule '{rule}'")]
    UndefinedSymbol {
        /// The missing rule name.
        symbol: String,
        /// The rule containing the reference, or `extras`.
        rule: String,
    },

    /// The start rule is not part of the grammar.
    #[error("start rule '{0}' is not defined")]
    MissingStart(String),
}

/// Non-fatal findings about a grammar.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diagnostics {
    /// Rules that cannot be reached from the start rule or the extras.
    pub unreachable: Vec<String>,
    /// Rules that can derive themselves in leftmost position.
    pub left_recursive: Vec<String>,
}

/// Validates `grammar` for parsing from the `start` rule.
///
/// # Errors
///
/// Returns a [`ValidationError`] if the start rule is missing or a symbol
/// reference cannot be resolved.
pub fn validate(grammar: &Grammar, start: &str) -> Result<Diagnostics, ValidationError> {
    if grammar.rule(start).is_none() {
        return Err(ValidationError::MissingStart(start.to_string()));
    }
    check_undefined_symbols(grammar)?;

    let diagnostics = Diagnostics {
        unreachable: unreachable_rules(grammar, start),
        left_recursive: left_recursive_rules(grammar),
    };
    for rule in &diagnostics.unreachable {
        tracing::warn!(grammar = %grammar.name, rule = %rule, "unreachable rule");
    }
    for rule in &diagnostics.left_recursive {
        tracing::debug!(grammar = %grammar.name, rule = %rule, "left-recursive rule");
    }
    Ok(diagnostics)
}

fn check_undefined_symbols(grammar: &Grammar) -> Result<(), ValidationError> {
    let mut refs = Vec::new();
    for name in grammar.rule_names() {
        refs.clear();
        grammar.rules[name].referenced_symbols(&mut refs);
        if let Some(missing) = refs.iter().find(|s| grammar.rule(s).is_none()) {
            return Err(ValidationError::UndefinedSymbol {
                symbol: (*missing).to_string(),
                rule: name.to_string(),
            });
        }
    }

    refs.clear();
    for extra in grammar.extras.iter().flatten() {
        extra.referenced_symbols(&mut refs);
    }
    match refs.iter().find(|s| grammar.rule(s).is_none()) {
        Some(missing) => Err(ValidationError::UndefinedSymbol {
            symbol: (*missing).to_string(),
            rule: "extras".to_string(),
        }),
        None => Ok(()),
    }
}

fn unreachable_rules(grammar: &Grammar, start: &str) -> Vec<String> {
    let mut to_visit = vec![start];
    for extra in grammar.extras.iter().flatten() {
        extra.referenced_symbols(&mut to_visit);
    }

    let mut reachable = HashSet::new();
    while let Some(name) = to_visit.pop() {
        if !reachable.insert(name) {
            continue;
        }
        if let Some(rule) = grammar.rule(name) {
            rule.referenced_symbols(&mut to_visit);
        }
    }

    grammar
        .rule_names()
        .into_iter()
        .filter(|name| {
            !reachable.contains(name) && !grammar.inline.iter().any(|i| i.as_str() == *name)
        })
        .map(str::to_string)
        .collect()
}

fn left_recursive_rules(grammar: &Grammar) -> Vec<String> {
    let corners: HashMap<&str, Vec<&str>> = grammar
        .rules
        .iter()
        .map(|(name, rule)| {
            let mut out = Vec::new();
            left_corners(rule, &mut out);
            (name.as_str(), out)
        })
        .collect();

    let mut found = BTreeSet::new();
    for &name in corners.keys() {
        let mut seen = HashSet::new();
        let mut stack = corners[name].clone();
        while let Some(next) = stack.pop() {
            if next == name {
                found.insert(name.to_string());
                break;
            }
            if seen.insert(next) {
                if let Some(more) = corners.get(next) {
                    stack.extend(more);
                }
            }
        }
    }
    found.into_iter().collect()
}

/// Symbols that can start a match of `rule`.
fn left_corners<'a>(rule: &'a Rule, out: &mut Vec<&'a str>) {
    match rule.rule_type {
        RuleType::Symbol => out.extend(rule.symbol_name()),
        RuleType::Seq => {
            for member in &rule.members {
                left_corners(member, out);
                if !is_nullable(member) {
                    break;
                }
            }
        }
        RuleType::Choice => {
            for member in &rule.members {
                left_corners(member, out);
            }
        }
        RuleType::Repeat
        | RuleType::Repeat1
        | RuleType::Prec
        | RuleType::PrecLeft
        | RuleType::PrecRight
        | RuleType::PrecDynamic
        | RuleType::Field
        | RuleType::Alias
        | RuleType::Reserved => {
            if let Some(content) = &rule.content {
                left_corners(content, out);
            }
        }
        RuleType::Blank
        | RuleType::String
        | RuleType::Pattern
        | RuleType::Token
        | RuleType::ImmediateToken => {}
    }
}

/// Conservative: symbols are never treated as nullable.
fn is_nullable(rule: &Rule) -> bool {
    match rule.rule_type {
        RuleType::Blank | RuleType::Repeat => true,
        RuleType::Choice => rule.members.iter().any(is_nullable),
        RuleType::Seq => rule.members.iter().all(is_nullable),
        RuleType::Prec
        | RuleType::PrecLeft
        | RuleType::PrecRight
        | RuleType::PrecDynamic
        | RuleType::Field
        | RuleType::Alias
        | RuleType::Reserved
        | RuleType::Repeat1 => rule.content.as_deref().is_some_and(is_nullable),
        RuleType::String
        | RuleType::Pattern
        | RuleType::Symbol
        | RuleType::Token
        | RuleType::ImmediateToken => false,
    }
}
