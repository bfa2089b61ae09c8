//! Packrat interpreter over a [`ParseTable`].

use super::table::{Matcher, ParseTable};
use super::tree::{Node, ERROR_KIND};
use std::collections::{HashMap, HashSet};
use std::mem;
use std::ops::Range;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct Mode {
    /// Skip extras before terminals.
    skip_extras: bool,
    /// Build nodes for what is matched.
    emit: bool,
}

const SYNTACTIC: Mode = Mode {
    skip_extras: true,
    emit: true,
};

const LEXICAL: Mode = Mode {
    skip_extras: false,
    emit: false,
};

type Key = (usize, usize, Mode);

#[derive(Debug, Clone)]
struct Match {
    /// Offset of the first consumed token; `None` for empty matches.
    start: Option<usize>,
    end: usize,
    nodes: Vec<Node>,
}

impl Match {
    fn empty(at: usize) -> Self {
        Self {
            start: None,
            end: at,
            nodes: Vec::new(),
        }
    }

    fn append(&mut self, next: Match) {
        self.start = self.start.or(next.start);
        self.end = next.end;
        self.nodes.extend(next.nodes);
    }

    fn span_start(&self) -> usize {
        self.start.unwrap_or(self.end)
    }
}

pub(crate) struct Session<'t> {
    table: &'t ParseTable,
    text: &'t str,
    memo: HashMap<Key, Option<Match>>,
    active: HashSet<Key>,
}

impl<'t> Session<'t> {
    pub(crate) fn new(table: &'t ParseTable, text: &'t str) -> Self {
        Self {
            table,
            text,
            memo: HashMap::new(),
            active: HashSet::new(),
        }
    }

    /// Parses the whole text from the start rule.
    ///
    /// Input that is not fully consumed yields an `ERROR` root holding
    /// whatever prefix did match.
    pub(crate) fn run(mut self) -> Node {
        let len = self.text.len();
        let table = self.table;
        let start = &table.rules[table.start];

        let Some(mut parsed) = self.symbol(table.start, 0, SYNTACTIC) else {
            return Node::leaf(ERROR_KIND, true, 0..len);
        };
        let (end, trailing) = self.skip_extras(parsed.end, SYNTACTIC);
        parsed.nodes.extend(trailing);

        if end != len {
            return Node::branch(ERROR_KIND, true, 0..len, parsed.nodes);
        }

        match sole_primary(&parsed.nodes) {
            Some(index) if parsed.nodes[index].kind() == start.name => {
                let mut root = parsed.nodes.remove(index);
                let mut children: Vec<Node> = parsed.nodes.drain(..index).collect();
                children.append(&mut root.children);
                children.append(&mut parsed.nodes);
                root.children = children;
                root.range = 0..len;
                root
            }
            _ => Node::branch(&start.name, true, 0..len, parsed.nodes),
        }
    }

    fn eval(&mut self, matcher: &'t Matcher, at: usize, mode: Mode) -> Option<Match> {
        match matcher {
            Matcher::Blank => Some(Match::empty(at)),
            Matcher::Literal(literal) => {
                let (from, mut nodes) = self.skip_extras(at, mode);
                if !self.text[from..].starts_with(literal.as_str()) {
                    return None;
                }
                let end = from + literal.len();
                if mode.emit {
                    nodes.push(Node::leaf(literal, false, from..end));
                }
                Some(Match {
                    start: Some(from),
                    end,
                    nodes,
                })
            }
            Matcher::Pattern(pattern) => {
                let (from, nodes) = self.skip_extras(at, mode);
                let found = pattern.find(&self.text[from..])?;
                Some(Match {
                    start: Some(from),
                    end: from + found.end(),
                    nodes,
                })
            }
            Matcher::Symbol(id) => self.symbol(*id, at, mode),
            Matcher::Seq(members) => {
                let mut acc = Match::empty(at);
                for member in members {
                    let next = self.eval(member, acc.end, mode)?;
                    acc.append(next);
                }
                Some(acc)
            }
            Matcher::Choice(members) => {
                let mut best: Option<Match> = None;
                for member in members {
                    if let Some(candidate) = self.eval(member, at, mode) {
                        if best.as_ref().is_none_or(|b| candidate.end > b.end) {
                            best = Some(candidate);
                        }
                    }
                }
                best
            }
            Matcher::Repeat(content) => Some(self.repeat(content, Match::empty(at), mode)),
            Matcher::Repeat1(content) => {
                let first = self.eval(content, at, mode)?;
                Some(self.repeat(content, first, mode))
            }
            Matcher::Field(field, content) => {
                let mut found = self.eval(content, at, mode)?;
                for node in found.nodes.iter_mut().filter(|n| !n.is_extra()) {
                    node.field.get_or_insert_with(|| field.clone());
                }
                Some(found)
            }
            Matcher::Alias {
                name,
                named,
                content,
            } => {
                let mut found = self.eval(content, at, mode)?;
                if mode.emit {
                    if let Some(index) = sole_primary(&found.nodes) {
                        let node = &mut found.nodes[index];
                        node.kind.clone_from(name);
                        node.named = *named;
                    } else {
                        let range = found.span_start()..found.end;
                        found.nodes = wrap(name, *named, range, mem::take(&mut found.nodes));
                    }
                }
                Some(found)
            }
            Matcher::Token { immediate, content } => {
                let (from, nodes) = if *immediate {
                    (at, Vec::new())
                } else {
                    self.skip_extras(at, mode)
                };
                let token = self.eval(content, from, LEXICAL)?;
                Some(Match {
                    start: Some(from),
                    end: token.end,
                    nodes,
                })
            }
        }
    }

    fn repeat(&mut self, content: &'t Matcher, mut acc: Match, mode: Mode) -> Match {
        while let Some(next) = self.eval(content, acc.end, mode) {
            if next.end == acc.end {
                break;
            }
            acc.append(next);
        }
        acc
    }

    fn symbol(&mut self, id: usize, at: usize, mode: Mode) -> Option<Match> {
        let key = (id, at, mode);
        if let Some(hit) = self.memo.get(&key) {
            return hit.clone();
        }
        // Re-entering a rule at the same offset is left recursion; fail the
        // branch instead of looping.
        if !self.active.insert(key) {
            return None;
        }

        let table = self.table;
        let rule = &table.rules[id];
        let result = self.eval(&rule.body, at, mode).map(|mut found| {
            if mode.emit && !rule.hidden {
                let range = found.span_start()..found.end;
                let mut nodes = mem::take(&mut found.nodes);
                if rule.lexical {
                    nodes.retain(Node::is_extra);
                }
                found.nodes = wrap(&rule.name, true, range, nodes);
            }
            found
        });

        self.active.remove(&key);
        self.memo.insert(key, result.clone());
        result
    }

    fn skip_extras(&mut self, at: usize, mode: Mode) -> (usize, Vec<Node>) {
        let mut nodes = Vec::new();
        if !mode.skip_extras {
            return (at, nodes);
        }
        let extra_mode = Mode {
            skip_extras: false,
            emit: mode.emit,
        };

        let table = self.table;
        let mut pos = at;
        'scan: loop {
            for extra in &table.extras {
                if let Some(found) = self.eval(extra, pos, extra_mode) {
                    if found.end > pos {
                        pos = found.end;
                        nodes.extend(found.nodes.into_iter().map(Node::into_extra));
                        continue 'scan;
                    }
                }
            }
            break;
        }
        (pos, nodes)
    }
}

/// Index of the only non-extra node, if there is exactly one.
fn sole_primary(nodes: &[Node]) -> Option<usize> {
    let mut primary = nodes
        .iter()
        .enumerate()
        .filter(|(_, n)| !n.is_extra())
        .map(|(i, _)| i);
    match (primary.next(), primary.next()) {
        (Some(index), None) => Some(index),
        _ => None,
    }
}

/// Wraps `nodes` into one `kind` node, leaving leading extras outside.
fn wrap(kind: &str, named: bool, range: Range<usize>, mut nodes: Vec<Node>) -> Vec<Node> {
    let lead = nodes.iter().take_while(|n| n.is_extra()).count();
    let mut out: Vec<Node> = nodes.drain(..lead).collect();
    out.push(Node::branch(kind, named, range, nodes));
    out
}
