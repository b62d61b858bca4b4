//! Arena-backed syntax tree over a borrowed SQL document.

use crate::error::ParseError;
use crate::types::{Dialect, Span};

use super::builder::TreeBuilder;
use super::{NodeKind, SyntaxTree};

/// Index of a node inside a [`SqlTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone)]
pub(crate) struct NodeData {
    pub(crate) kind: NodeKind,
    pub(crate) span: Span,
    pub(crate) parent: Option<NodeId>,
    /// Position within the parent's child list.
    pub(crate) slot: usize,
    pub(crate) children: Vec<NodeId>,
}

/// Structural syntax tree for a SQL document.
///
/// Every token of the source, whitespace and comments included, is a leaf, so
/// concatenating the leaves of any node reproduces its source text exactly.
#[derive(Debug, Clone)]
pub struct SqlTree<'a> {
    source: &'a str,
    nodes: Vec<NodeData>,
}

impl<'a> SqlTree<'a> {
    /// Tokenizes `sql` with the given dialect and builds the structural tree.
    ///
    /// Incomplete SQL still produces a tree; only tokenizer failures are errors.
    pub fn parse(sql: &'a str, dialect: Dialect) -> Result<Self, ParseError> {
        let nodes = TreeBuilder::new(sql, dialect)
            .map_err(|err| err.with_dialect(dialect))?
            .build();
        Ok(Self { source: sql, nodes })
    }

    pub fn source(&self) -> &'a str {
        self.source
    }

    /// Number of nodes, leaves included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    fn data(&self, node: NodeId) -> &NodeData {
        &self.nodes[node.index()]
    }

    /// Renders the tree as an indented outline; handy when debugging builders.
    pub fn outline(&self) -> String {
        let mut out = String::new();
        self.write_outline(self.root(), 0, &mut out);
        out
    }

    fn write_outline(&self, node: NodeId, depth: usize, out: &mut String) {
        let data = self.data(node);
        if data.kind == NodeKind::Whitespace {
            return;
        }
        out.push_str(&"  ".repeat(depth));
        out.push_str(&format!(
            "{:?} {}..{}",
            data.kind, data.span.start, data.span.end
        ));
        if data.children.is_empty() {
            out.push_str(&format!(" {:?}", self.text(node)));
        }
        out.push('\n');
        for child in &data.children {
            self.write_outline(*child, depth + 1, out);
        }
    }
}

impl SyntaxTree for SqlTree<'_> {
    type Node = NodeId;

    fn root(&self) -> NodeId {
        NodeId(0)
    }

    fn kind(&self, node: NodeId) -> NodeKind {
        self.data(node).kind
    }

    fn text(&self, node: NodeId) -> &str {
        let span = self.data(node).span;
        self.source.get(span.start..span.end).unwrap_or_default()
    }

    fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.data(node).children.clone()
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.data(node).parent
    }

    fn prev_sibling(&self, node: NodeId) -> Option<NodeId> {
        let data = self.data(node);
        let parent = self.data(data.parent?);
        data.slot
            .checked_sub(1)
            .and_then(|slot| parent.children.get(slot).copied())
    }

    fn next_sibling(&self, node: NodeId) -> Option<NodeId> {
        let data = self.data(node);
        let parent = self.data(data.parent?);
        parent.children.get(data.slot + 1).copied()
    }

    fn range(&self, node: NodeId) -> Span {
        self.data(node).span
    }

    fn node_at(&self, offset: usize) -> Option<NodeId> {
        if offset > self.source.len() {
            return None;
        }
        // A caret after the last character sits on the last token.
        let offset = if offset == self.source.len() {
            offset.checked_sub(1)?
        } else {
            offset
        };

        let leaf = self.deepest_at(offset);
        if !self.is_statement_gap(leaf) {
            return Some(leaf);
        }

        // A caret on a statement terminator or on trivia between statements
        // belongs to the statement just before it.
        let root = self.data(self.root());
        let preceding = root.children[..self.data(leaf).slot]
            .iter()
            .rev()
            .copied()
            .find(|child| !self.is_statement_gap(*child) && !self.data(*child).span.is_empty());
        match preceding {
            Some(node) => Some(self.deepest_at(self.data(node).span.end - 1)),
            None => Some(leaf),
        }
    }
}

impl SqlTree<'_> {
    fn deepest_at(&self, offset: usize) -> NodeId {
        let mut current = self.root();
        loop {
            let next = self
                .data(current)
                .children
                .iter()
                .copied()
                .find(|child| self.data(*child).span.contains(offset));
            match next {
                Some(child) => current = child,
                None => return current,
            }
        }
    }

    /// Whether `node` is a root-level `;` or trivia token.
    fn is_statement_gap(&self, node: NodeId) -> bool {
        let data = self.data(node);
        if data.parent != Some(self.root()) || !data.children.is_empty() {
            return false;
        }
        match data.kind {
            NodeKind::Whitespace => true,
            NodeKind::Other => self.text(node) == ";",
            _ => false,
        }
    }
}
