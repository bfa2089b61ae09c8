//! Syntax trees produced by [`Parser::parse`](super::Parser::parse).

use crate::language::LanguageHandle;
use std::ops::Range;

/// Kind of the node that covers input the grammar did not recognise.
pub const ERROR_KIND: &str = "ERROR";

/// One node of a syntax tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub(crate) kind: String,
    pub(crate) named: bool,
    pub(crate) extra: bool,
    pub(crate) field: Option<String>,
    pub(crate) range: Range<usize>,
    pub(crate) children: Vec<Node>,
}

impl Node {
    pub(crate) fn leaf(kind: &str, named: bool, range: Range<usize>) -> Self {
        Self::branch(kind, named, range, Vec::new())
    }

    pub(crate) fn branch(
        kind: &str,
        named: bool,
        range: Range<usize>,
        children: Vec<Node>,
    ) -> Self {
        Self {
            kind: kind.to_string(),
            named,
            extra: false,
            field: None,
            range,
            children,
        }
    }

    pub(crate) fn into_extra(mut self) -> Self {
        self.extra = true;
        self
    }

    /// The rule name for named nodes, the literal text for anonymous ones.
    #[must_use]
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Returns `true` for nodes produced by named rules or named aliases.
    #[must_use]
    pub fn is_named(&self) -> bool {
        self.named
    }

    /// Returns `true` for nodes matched as grammar extras, such as comments.
    #[must_use]
    pub fn is_extra(&self) -> bool {
        self.extra
    }

    /// Returns `true` if this is an error node.
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.kind == ERROR_KIND
    }

    /// Returns `true` if this node or any descendant is an error node.
    #[must_use]
    pub fn has_error(&self) -> bool {
        self.is_error() || self.children.iter().any(Node::has_error)
    }

    /// The field label the parent assigned to this node.
    #[must_use]
    pub fn field_name(&self) -> Option<&str> {
        self.field.as_deref()
    }

    /// Byte range covered by the node.
    #[must_use]
    pub fn byte_range(&self) -> Range<usize> {
        self.range.clone()
    }

    /// The source text covered by the node.
    ///
    /// # Panics
    ///
    /// Panics if `source` is not the text the tree was parsed from.
    #[must_use]
    pub fn text<'s>(&self, source: &'s str) -> &'s str {
        &source[self.range.clone()]
    }

    /// All direct children.
    #[must_use]
    pub fn children(&self) -> &[Node] {
        &self.children
    }

    /// Direct children that are named.
    pub fn named_children(&self) -> impl Iterator<Item = &Node> {
        self.children.iter().filter(|c| c.named)
    }

    /// The first direct child labelled `field`.
    #[must_use]
    pub fn child_by_field_name(&self, field: &str) -> Option<&Node> {
        self.children
            .iter()
            .find(|c| c.field.as_deref() == Some(field))
    }

    /// This node and all its descendants in pre-order.
    #[must_use]
    pub fn descendants(&self) -> Vec<&Node> {
        let mut out = Vec::new();
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            out.push(node);
            stack.extend(node.children.iter().rev());
        }
        out
    }

    /// Renders the named structure as an S-expression, e.g.
    /// `(declaration name: (identifier))`.
    #[must_use]
    pub fn to_sexp(&self) -> String {
        let mut out = String::new();
        self.write_sexp(&mut out);
        out
    }

    fn write_sexp(&self, out: &mut String) {
        out.push('(');
        out.push_str(&self.kind);
        for child in self.named_children() {
            out.push(' ');
            if let Some(field) = &child.field {
                out.push_str(field);
                out.push_str(": ");
            }
            child.write_sexp(out);
        }
        out.push(')');
    }
}

/// The result of one parse.
#[derive(Debug, Clone)]
pub struct Tree {
    root: Node,
    language: LanguageHandle,
}

impl Tree {
    pub(crate) fn new(root: Node, language: LanguageHandle) -> Self {
        Self { root, language }
    }

    /// The root node.
    #[must_use]
    pub fn root_node(&self) -> &Node {
        &self.root
    }

    /// The language the tree was parsed with.
    #[must_use]
    pub fn language(&self) -> &LanguageHandle {
        &self.language
    }

    /// Returns `true` if part of the input was not recognised.
    #[must_use]
    pub fn has_error(&self) -> bool {
        self.root.has_error()
    }
}
