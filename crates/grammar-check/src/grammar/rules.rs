//! Rule graph nodes of a compiled grammar table.
//!
//! Rules follow the tree-sitter JSON rule schema. The only departure is that
//! scalar `value` payloads are always stored as strings, so precedence levels
//! such as `"10"` are parsed on demand by [`Rule::precedence`].

use facet::Facet;

/// A single node of the rule graph.
///
/// Which optional fields are populated depends on [`RuleType`]: `SYMBOL` and
/// `FIELD` use `name`, unary wrappers use `content`, `SEQ` and `CHOICE` use
/// `members`, and terminals plus `ALIAS` and precedence wrappers use `value`.
#[derive(Debug, Clone, Facet)]
pub struct Rule {
    /// Rule kind, stored under the `type` key.
    #[facet(rename = "type")]
    pub rule_type: RuleType,

    /// Literal text, pattern source, alias name or precedence level.
    #[facet(default)]
    pub value: Option<String>,

    /// Referenced symbol (`SYMBOL`) or field label (`FIELD`).
    #[facet(default)]
    pub name: Option<String>,

    /// Wrapped rule for unary constructs such as `REPEAT` or `PREC`.
    #[facet(default)]
    pub content: Option<Box<Rule>>,

    /// Child rules of `SEQ` and `CHOICE`.
    #[facet(default)]
    pub members: Vec<Rule>,

    /// Whether an `ALIAS` produces a named node.
    #[facet(default)]
    pub named: Option<bool>,
}

/// Every rule kind a grammar table may contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Facet)]
#[repr(u8)]
pub enum RuleType {
    /// An empty (ε) production.
    #[facet(rename = "BLANK")]
    Blank,
    /// Matches its `value` verbatim.
    #[facet(rename = "STRING")]
    String,
    /// Matches the regex in `value`.
    #[facet(rename = "PATTERN")]
    Pattern,
    /// Matches the rule called `name`.
    #[facet(rename = "SYMBOL")]
    Symbol,
    /// One of several alternatives.
    #[facet(rename = "CHOICE")]
    Choice,
    /// A sequence of member rules.
    #[facet(rename = "SEQ")]
    Seq,
    /// Zero or more repetitions.
    #[facet(rename = "REPEAT")]
    Repeat,
    /// One or more repetitions.
    #[facet(rename = "REPEAT1")]
    Repeat1,
    /// Precedence level for `content`.
    #[facet(rename = "PREC")]
    Prec,
    /// Left-associative precedence for `content`.
    #[facet(rename = "PREC_LEFT")]
    PrecLeft,
    /// Right-associative precedence for `content`.
    #[facet(rename = "PREC_RIGHT")]
    PrecRight,
    /// Runtime conflict-resolution precedence for `content`.
    #[facet(rename = "PREC_DYNAMIC")]
    PrecDynamic,
    /// Labels the nodes of `content` with the field `name`.
    #[facet(rename = "FIELD")]
    Field,
    /// An alternate node name for a subrule.
    #[facet(rename = "ALIAS")]
    Alias,
    /// A subrule lexed as one token.
    #[facet(rename = "TOKEN")]
    Token,
    /// A token that must follow the previous one without trivia.
    #[facet(rename = "IMMEDIATE_TOKEN")]
    ImmediateToken,
    /// A reserved-word context wrapper.
    #[facet(rename = "RESERVED")]
    Reserved,
}

impl Rule {
    /// The `type` string this rule was decoded from.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self.rule_type {
            RuleType::Blank => "BLANK",
            RuleType::String => "STRING",
            RuleType::Pattern => "PATTERN",
            RuleType::Symbol => "SYMBOL",
            RuleType::Choice => "CHOICE",
            RuleType::Seq => "SEQ",
            RuleType::Repeat => "REPEAT",
            RuleType::Repeat1 => "REPEAT1",
            RuleType::Prec => "PREC",
            RuleType::PrecLeft => "PREC_LEFT",
            RuleType::PrecRight => "PREC_RIGHT",
            RuleType::PrecDynamic => "PREC_DYNAMIC",
            RuleType::Field => "FIELD",
            RuleType::Alias => "ALIAS",
            RuleType::Token => "TOKEN",
            RuleType::ImmediateToken => "IMMEDIATE_TOKEN",
            RuleType::Reserved => "RESERVED",
        }
    }

    /// Returns `true` if this rule is a lexical terminal.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self.rule_type, RuleType::String | RuleType::Pattern)
    }

    /// Returns the referenced symbol name of a `SYMBOL` rule.
    #[must_use]
    pub fn symbol_name(&self) -> Option<&str> {
        match self.rule_type {
            RuleType::Symbol => self.name.as_deref(),
            _ => None,
        }
    }

    /// Returns the precedence level of a precedence wrapper.
    ///
    /// Named precedences (`"binary_addition"`) have no numeric level and
    /// yield `None`.
    #[must_use]
    pub fn precedence(&self) -> Option<i32> {
        match self.rule_type {
            RuleType::Prec | RuleType::PrecLeft | RuleType::PrecRight | RuleType::PrecDynamic => {
                self.value.as_deref().and_then(|v| v.parse().ok())
            }
            _ => None,
        }
    }

    /// Returns the literal text of a `STRING` rule.
    #[must_use]
    pub fn string_value(&self) -> Option<&str> {
        match self.rule_type {
            RuleType::String => self.value.as_deref(),
            _ => None,
        }
    }

    /// Returns the pattern source of a `PATTERN` rule.
    #[must_use]
    pub fn pattern_value(&self) -> Option<&str> {
        match self.rule_type {
            RuleType::Pattern => self.value.as_deref(),
            _ => None,
        }
    }

    /// Returns the node name and namedness an `ALIAS` rule produces.
    #[must_use]
    pub fn alias_target(&self) -> Option<(&str, bool)> {
        match self.rule_type {
            RuleType::Alias => self
                .value
                .as_deref()
                .map(|v| (v, self.named.unwrap_or(false))),
            _ => None,
        }
    }

    /// Iterates over the direct sub-rules: `members` first, then `content`.
    pub fn children(&self) -> impl Iterator<Item = &Rule> {
        self.members.iter().chain(self.content.as_deref())
    }

    /// Collects every symbol referenced anywhere below this rule.
    pub fn referenced_symbols<'a>(&'a self, out: &mut Vec<&'a str>) {
        if let Some(name) = self.symbol_name() {
            out.push(name);
        }
        for child in self.children() {
            child.referenced_symbols(out);
        }
    }
}
