//! Compilation of a loaded grammar into the matcher table the parser runs.

use super::LanguageError;
use crate::grammar::{Rule, RuleType};
use crate::language::Language;
use crate::validate::{validate, ValidationError};
use regex::Regex;
use std::collections::HashMap;

/// Whitespace, the extra every grammar gets when it declares none.
const DEFAULT_EXTRA: &str = r"\s";

#[derive(Debug)]
pub(crate) enum Matcher {
    Blank,
    Literal(String),
    Pattern(Regex),
    Symbol(usize),
    Seq(Vec<Matcher>),
    Choice(Vec<Matcher>),
    Repeat(Box<Matcher>),
    Repeat1(Box<Matcher>),
    Field(String, Box<Matcher>),
    Alias {
        name: String,
        named: bool,
        content: Box<Matcher>,
    },
    Token {
        immediate: bool,
        content: Box<Matcher>,
    },
}

#[derive(Debug)]
pub(crate) struct CompiledRule {
    pub(crate) name: String,
    /// Rules starting with `_` splice their children into the parent.
    pub(crate) hidden: bool,
    /// Rules whose body is a single token produce a leaf node.
    pub(crate) lexical: bool,
    pub(crate) body: Matcher,
}

#[derive(Debug)]
pub(crate) struct ParseTable {
    pub(crate) rules: Vec<CompiledRule>,
    pub(crate) start: usize,
    pub(crate) extras: Vec<Matcher>,
}

impl ParseTable {
    pub(crate) fn compile(language: &Language) -> Result<Self, LanguageError> {
        let grammar = language.grammar();
        if grammar.has_externals() {
            return Err(LanguageError::ExternalScanner(grammar.externals.len()));
        }
        validate(grammar, language.start_rule())?;

        let names = grammar.rule_names();
        let index: HashMap<&str, usize> = names.iter().enumerate().map(|(i, n)| (*n, i)).collect();
        let compiler = Compiler { index: &index };

        let mut rules = Vec::with_capacity(names.len());
        for name in &names {
            let body = compiler.compile(&grammar.rules[*name], name)?;
            rules.push(CompiledRule {
                name: (*name).to_string(),
                hidden: name.starts_with('_'),
                lexical: matches!(
                    body,
                    Matcher::Literal(_) | Matcher::Pattern(_) | Matcher::Token { .. }
                ),
                body,
            });
        }

        let extras = match &grammar.extras {
            Some(extras) => extras
                .iter()
                .map(|rule| compiler.compile(rule, "extras"))
                .collect::<Result<Vec<_>, _>>()?,
            None => vec![Compiler::pattern(DEFAULT_EXTRA, "extras")?],
        };

        let start = compiler.symbol(language.start_rule(), "start")?;
        Ok(Self {
            rules,
            start,
            extras,
        })
    }
}

struct Compiler<'a> {
    index: &'a HashMap<&'a str, usize>,
}

impl Compiler<'_> {
    fn compile(&self, rule: &Rule, owner: &str) -> Result<Matcher, LanguageError> {
        let matcher = match rule.rule_type {
            RuleType::Blank => Matcher::Blank,
            RuleType::String => {
                let text = rule.string_value().ok_or_else(|| malformed(rule, owner))?;
                Matcher::Literal(text.to_string())
            }
            RuleType::Pattern => {
                let source = rule.pattern_value().ok_or_else(|| malformed(rule, owner))?;
                Self::pattern(source, owner)?
            }
            RuleType::Symbol => {
                let name = rule.symbol_name().ok_or_else(|| malformed(rule, owner))?;
                Matcher::Symbol(self.symbol(name, owner)?)
            }
            RuleType::Seq | RuleType::Choice => {
                if rule.members.is_empty() {
                    return Err(malformed(rule, owner));
                }
                let members = rule
                    .members
                    .iter()
                    .map(|m| self.compile(m, owner))
                    .collect::<Result<Vec<_>, _>>()?;
                if rule.rule_type == RuleType::Seq {
                    Matcher::Seq(members)
                } else {
                    Matcher::Choice(members)
                }
            }
            RuleType::Repeat => Matcher::Repeat(self.content(rule, owner)?),
            RuleType::Repeat1 => Matcher::Repeat1(self.content(rule, owner)?),
            // Precedence only resolves conflicts between parse states; the
            // interpreter has none.
            RuleType::Prec
            | RuleType::PrecLeft
            | RuleType::PrecRight
            | RuleType::PrecDynamic
            | RuleType::Reserved => *self.content(rule, owner)?,
            RuleType::Field => {
                let name = rule.name.clone().ok_or_else(|| malformed(rule, owner))?;
                Matcher::Field(name, self.content(rule, owner)?)
            }
            RuleType::Alias => {
                let (name, named) = rule.alias_target().ok_or_else(|| malformed(rule, owner))?;
                Matcher::Alias {
                    name: name.to_string(),
                    named,
                    content: self.content(rule, owner)?,
                }
            }
            RuleType::Token | RuleType::ImmediateToken => Matcher::Token {
                immediate: rule.rule_type == RuleType::ImmediateToken,
                content: self.content(rule, owner)?,
            },
        };
        Ok(matcher)
    }

    fn content(&self, rule: &Rule, owner: &str) -> Result<Box<Matcher>, LanguageError> {
        let content = rule
            .content
            .as_deref()
            .ok_or_else(|| malformed(rule, owner))?;
        Ok(Box::new(self.compile(content, owner)?))
    }

    fn symbol(&self, name: &str, owner: &str) -> Result<usize, LanguageError> {
        self.index.get(name).copied().ok_or_else(|| {
            ValidationError::UndefinedSymbol {
                symbol: name.to_string(),
                rule: owner.to_string(),
            }
            .into()
        })
    }

    fn pattern(source: &str, owner: &str) -> Result<Matcher, LanguageError> {
        // Anchor at the slice start so a match never skips input.
        Regex::new(&format!(r"\A(?:{source})"))
            .map(Matcher::Pattern)
            .map_err(|err| LanguageError::InvalidPattern {
                rule: owner.to_string(),
                source: err,
            })
    }
}

fn malformed(rule: &Rule, owner: &str) -> LanguageError {
    LanguageError::MalformedRule {
        rule: owner.to_string(),
        kind: rule.type_name(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_patterns_match_only_at_the_start() {
        let Matcher::Pattern(re) = Compiler::pattern("[a-z]+", "word").unwrap() else {
            panic!("expected a pattern matcher");
        };
        assert!(re.find("1abc").is_none());
        assert_eq!(re.find("abc1").unwrap().end(), 3);

        // Alternation stays inside the anchor.
        let Matcher::Pattern(re) = Compiler::pattern("x|[0-9]+", "word").unwrap() else {
            panic!("expected a pattern matcher");
        };
        assert!(re.find("a1").is_none());
    }

    #[test]
    fn test_invalid_pattern_names_its_rule() {
        let err = Compiler::pattern("(", "number").unwrap_err();
        assert!(matches!(err, LanguageError::InvalidPattern { ref rule, .. } if rule == "number"));
    }
}
