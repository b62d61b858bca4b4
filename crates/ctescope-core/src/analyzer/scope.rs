//! Locating the enclosing `WITH` scope, its CTEs and the target query.

use crate::error::NotApplicable;
use crate::tree::{NodeKind, SyntaxTree};

use super::CteEntry;

/// Finds the `WITH` clause nearest to `caret`.
///
/// Walks up from the node at `caret`. A with-clause ancestor is returned as is;
/// a with-query-wrapper ancestor (cursor in the main statement) yields its
/// nested with-clause.
pub fn locate_scope<T: SyntaxTree>(tree: &T, caret: usize) -> Result<T::Node, NotApplicable> {
    let start = tree.node_at(caret).ok_or(NotApplicable::NoScope)?;

    for node in tree.ancestors(start) {
        match tree.kind(node) {
            NodeKind::WithClause => return Ok(node),
            NodeKind::WithQueryWrapper => {
                if let Some(clause) = tree.first_child_of_kind(node, NodeKind::WithClause) {
                    return Ok(clause);
                }
            }
            _ => {}
        }
    }

    Err(NotApplicable::NoScope)
}

/// Lists the CTE definitions directly under `scope`, in document order.
pub fn enumerate_ctes<T: SyntaxTree>(
    tree: &T,
    scope: T::Node,
) -> Result<Vec<CteEntry<T::Node>>, NotApplicable> {
    let entries: Vec<_> = tree
        .children(scope)
        .into_iter()
        .filter(|child| tree.kind(*child) == NodeKind::NamedQueryDefinition)
        .enumerate()
        .map(|(index, definition)| CteEntry {
            name: cte_name(tree, definition),
            definition,
            index,
        })
        .collect();

    if entries.is_empty() {
        return Err(NotApplicable::NoCtes);
    }
    Ok(entries)
}

/// Text of a definition's first child, its name.
pub(crate) fn cte_name<T: SyntaxTree>(tree: &T, definition: T::Node) -> String {
    tree.children(definition)
        .first()
        .map(|name| tree.text(*name).to_string())
        .unwrap_or_default()
}

/// Picks the query the cursor is in.
///
/// The innermost select, subquery or CTE definition containing `caret` wins,
/// without crossing the scope boundary. The body query of a CTE stands for the
/// CTE itself. When the cursor sits in the `WITH` clause outside any CTE, the
/// statement following the clause is used.
pub fn locate_target_query<T: SyntaxTree>(tree: &T, caret: usize, scope: T::Node) -> T::Node {
    let wrapper = tree
        .parent(scope)
        .filter(|parent| tree.kind(*parent) == NodeKind::WithQueryWrapper);

    if let Some(start) = tree.node_at(caret) {
        for node in tree.ancestors(start) {
            if node == scope || Some(node) == wrapper {
                break;
            }
            if tree.kind(node).is_query() {
                return promote_cte_body(tree, node);
            }
        }
    }

    fallback_target(tree, scope)
}

fn promote_cte_body<T: SyntaxTree>(tree: &T, node: T::Node) -> T::Node {
    if tree.kind(node) != NodeKind::SelectStatement {
        return node;
    }
    match tree.parent(node) {
        Some(parent) if tree.kind(parent) == NodeKind::NamedQueryDefinition => parent,
        _ => node,
    }
}

fn fallback_target<T: SyntaxTree>(tree: &T, scope: T::Node) -> T::Node {
    let is_select = |node: &T::Node| tree.kind(*node) == NodeKind::SelectStatement;

    if let Some(select) = tree.following_siblings(scope).find(is_select) {
        return select;
    }

    let Some(parent) = tree.parent(scope) else {
        return scope;
    };
    tree.children(parent)
        .into_iter()
        .filter(|child| *child != scope)
        .find(is_select)
        .unwrap_or(parent)
}
