//! Syntax tree capability consumed by the analyzer and builder.
//!
//! The core never depends on a particular parser. Anything that can answer the
//! questions in [`SyntaxTree`] (kind, text, children, parent, siblings, range and
//! "node at offset") can be analyzed. [`SqlTree`] is the provider shipped with
//! this crate, built on the `sqlparser` tokenizer.

mod builder;
mod position;
mod sql;

use std::fmt::Debug;
use std::hash::Hash;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::types::Span;

pub use position::line_col_to_offset;
pub use sql::{NodeId, SqlTree};

/// Node type tags inspected by the analyzer.
///
/// Anything not relevant to CTE structure is `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum NodeKind {
    WithClause,
    WithQueryWrapper,
    NamedQueryDefinition,
    SelectStatement,
    QueryExpression,
    FromClause,
    TableReference,
    JoinExpression,
    Identifier,
    LeftParen,
    RightParen,
    Comma,
    WithKeyword,
    Whitespace,
    Other,
}

impl NodeKind {
    /// Kinds that can be the target of an extraction.
    pub fn is_query(self) -> bool {
        matches!(
            self,
            Self::SelectStatement | Self::QueryExpression | Self::NamedQueryDefinition
        )
    }

    /// Kinds under which identifiers are treated as relation references.
    pub fn is_relation_context(self) -> bool {
        matches!(
            self,
            Self::FromClause | Self::TableReference | Self::JoinExpression
        )
    }
}

/// Read-only view of a parsed document.
///
/// Implementations must be immutable for the lifetime of any analysis that
/// borrows them. Node handles are cheap copies; all ranges are byte offsets
/// into the original document.
pub trait SyntaxTree {
    type Node: Copy + Eq + Hash + Debug;

    fn root(&self) -> Self::Node;

    fn kind(&self, node: Self::Node) -> NodeKind;

    /// Literal source text covered by `node`.
    fn text(&self, node: Self::Node) -> &str;

    /// Direct children in document order.
    fn children(&self, node: Self::Node) -> Vec<Self::Node>;

    fn parent(&self, node: Self::Node) -> Option<Self::Node>;

    fn prev_sibling(&self, node: Self::Node) -> Option<Self::Node>;

    fn next_sibling(&self, node: Self::Node) -> Option<Self::Node>;

    /// Half-open source range of `node`.
    fn range(&self, node: Self::Node) -> Span;

    /// Deepest node containing `offset`, if any.
    ///
    /// An offset on a statement terminator, or on trivia between statements,
    /// resolves to the last token of the preceding statement.
    fn node_at(&self, offset: usize) -> Option<Self::Node>;

    /// `node` followed by each of its ancestors up to the root.
    fn ancestors(&self, node: Self::Node) -> Ancestors<'_, Self>
    where
        Self: Sized,
    {
        Ancestors {
            tree: self,
            next: Some(node),
        }
    }

    /// Pre-order walk of `node`'s subtree, `node` included.
    fn descendants(&self, node: Self::Node) -> Descendants<'_, Self>
    where
        Self: Sized,
    {
        Descendants {
            tree: self,
            stack: vec![node],
        }
    }

    fn first_child_of_kind(&self, node: Self::Node, kind: NodeKind) -> Option<Self::Node> {
        self.children(node)
            .into_iter()
            .find(|child| self.kind(*child) == kind)
    }

    /// Following siblings of `node`, nearest first.
    fn following_siblings(&self, node: Self::Node) -> Siblings<'_, Self>
    where
        Self: Sized,
    {
        Siblings {
            tree: self,
            next: self.next_sibling(node),
        }
    }
}

/// Iterator returned by [`SyntaxTree::ancestors`].
pub struct Ancestors<'t, T: SyntaxTree> {
    tree: &'t T,
    next: Option<T::Node>,
}

impl<T: SyntaxTree> Iterator for Ancestors<'_, T> {
    type Item = T::Node;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = self.tree.parent(current);
        Some(current)
    }
}

/// Iterator returned by [`SyntaxTree::descendants`].
pub struct Descendants<'t, T: SyntaxTree> {
    tree: &'t T,
    stack: Vec<T::Node>,
}

impl<T: SyntaxTree> Iterator for Descendants<'_, T> {
    type Item = T::Node;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.stack.pop()?;
        let children = self.tree.children(current);
        self.stack.extend(children.into_iter().rev());
        Some(current)
    }
}

/// Iterator returned by [`SyntaxTree::following_siblings`].
pub struct Siblings<'t, T: SyntaxTree> {
    tree: &'t T,
    next: Option<T::Node>,
}

impl<T: SyntaxTree> Iterator for Siblings<'_, T> {
    type Item = T::Node;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = self.tree.next_sibling(current);
        Some(current)
    }
}
